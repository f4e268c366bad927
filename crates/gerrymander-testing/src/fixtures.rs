//! Sample server output.

use filetime::FileTime;
use serde_json::{Value, json};
use std::path::Path;
use std::time::{Duration, SystemTime};

/// A `gerrit query --current-patch-set --all-approvals --files` row.
pub fn change(number: u64, project: &str, subject: &str) -> Value {
    json!({
        "project": project,
        "branch": "master",
        "id": format!("I{:040x}", number),
        "number": number.to_string(),
        "subject": subject,
        "owner": {"name": "Alice Example", "email": "alice@example.org", "username": "alice"},
        "url": format!("https://review.example.org/{}", number),
        "createdOn": 1_700_000_000u64 + number,
        "lastUpdated": 1_700_100_000u64 + number,
        "sortKey": format!("{:016x}", 0x2000_0000u64 - number),
        "open": true,
        "status": "NEW",
        "currentPatchSet": {
            "number": "2",
            "revision": "0123456789abcdef0123456789abcdef01234567",
            "ref": format!("refs/changes/{:02}/{}/2", number % 100, number),
            "uploader": {"name": "Alice Example", "username": "alice"},
            "createdOn": 1_700_050_000u64 + number,
            "approvals": [
                {"type": "Verified", "description": "Verified", "value": "1", "by": {"name": "CI", "username": "zuul"}},
                {"type": "Code-Review", "description": "Code-Review", "value": "-1", "by": {"name": "Bob", "username": "bob"}}
            ],
            "files": [
                {"file": "/COMMIT_MSG", "type": "ADDED"},
                {"file": format!("{}/api.py", project), "type": "MODIFIED"}
            ]
        }
    })
}

/// Trailing statistics row of a query page.
pub fn stats(row_count: usize, more_changes: bool) -> Value {
    json!({
        "type": "stats",
        "rowCount": row_count,
        "runTimeMilliseconds": 7,
        "moreChanges": more_changes
    })
}

pub fn error(message: &str) -> Value {
    json!({"type": "error", "message": message})
}

/// Set a file's modification time to `age` ago.
pub fn backdate(path: &Path, age: Duration) {
    let then = SystemTime::now() - age;
    filetime::set_file_mtime(path, FileTime::from_system_time(then))
        .expect("Failed to set mtime");
}

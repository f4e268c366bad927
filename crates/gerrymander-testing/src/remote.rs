//! Scripted remote endpoint.
//!
//! The transport is pointed at `sh <script>` instead of `ssh`. Every call
//! bumps a counter, appends its arguments to `calls.log` and replays
//! `responses/<N>.out` on stdout, `responses/<N>.err` on stderr and exits
//! with the status in `responses/<N>.code` (0 when absent). A call with no
//! prepared response prints nothing and succeeds, which reads as an empty
//! page.

use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const SCRIPT: &str = r#"#!/bin/sh
dir='@DIR@'
n=$(cat "$dir/counter" 2>/dev/null || echo 0)
n=$((n + 1))
echo "$n" > "$dir/counter"
printf '%s\n' "$*" >> "$dir/calls.log"
if [ -f "$dir/responses/$n.out" ]; then cat "$dir/responses/$n.out"; fi
if [ -f "$dir/responses/$n.err" ]; then cat "$dir/responses/$n.err" >&2; fi
if [ -f "$dir/responses/$n.code" ]; then exit "$(cat "$dir/responses/$n.code")"; fi
exit 0
"#;

pub struct FakeRemote {
    temp_dir: TempDir,
    script: PathBuf,
}

impl Default for FakeRemote {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeRemote {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let root = temp_dir.path();
        fs::create_dir_all(root.join("responses")).expect("Failed to create responses dir");

        let script = root.join("fake-ssh.sh");
        let body = SCRIPT.replace("@DIR@", &root.display().to_string());
        fs::write(&script, body).expect("Failed to write fake ssh script");

        Self { temp_dir, script }
    }

    pub fn dir(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Value for `ssh_command`. The script is run through `sh` so it never
    /// needs the executable bit.
    pub fn ssh_command(&self) -> Vec<String> {
        vec!["sh".to_string(), self.script.display().to_string()]
    }

    /// Raw stdout for the `call`-th invocation (1-based).
    pub fn respond(&self, call: usize, stdout: &str) -> &Self {
        self.write_response(call, "out", stdout);
        self
    }

    /// Stdout made of one compact JSON document per line.
    pub fn respond_json<I>(&self, call: usize, lines: I) -> &Self
    where
        I: IntoIterator<Item = Value>,
    {
        let mut out = String::new();
        for line in lines {
            out.push_str(&line.to_string());
            out.push('\n');
        }
        self.respond(call, &out)
    }

    /// Make the `call`-th invocation write `stderr` and exit with `code`.
    pub fn fail(&self, call: usize, stderr: &str, code: i32) -> &Self {
        self.write_response(call, "err", stderr);
        self.write_response(call, "code", &code.to_string());
        self
    }

    /// Argument lists of every invocation so far, oldest first.
    pub fn calls(&self) -> Vec<String> {
        fs::read_to_string(self.dir().join("calls.log"))
            .map(|log| log.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls().len()
    }

    fn write_response(&self, call: usize, kind: &str, content: &str) {
        let path = self
            .dir()
            .join("responses")
            .join(format!("{}.{}", call, kind));
        fs::write(path, content).expect("Failed to write response");
    }
}

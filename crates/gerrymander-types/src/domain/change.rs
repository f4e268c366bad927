use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::account::Account;
use crate::util::lenient_i64;
use crate::{Record, Result};

pub const APPROVAL_VERIFIED: &str = "Verified";
pub const APPROVAL_CODE_REVIEW: &str = "Code-Review";
pub const APPROVAL_WORKFLOW: &str = "Workflow";

/// A change as returned by `gerrit query --format=JSON`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Change {
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub number: Option<i64>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub owner: Option<Account>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub created_on: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub last_updated: Option<i64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub patch_sets: Vec<PatchSet>,
    /// Sent instead of `patchSets` when queried with `--current-patch-set`
    #[serde(default, rename = "currentPatchSet", skip_serializing_if = "Option::is_none")]
    pub current: Option<PatchSet>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub depends_on: Vec<Dependency>,
}

impl Change {
    /// Build a change from a decoded query row.
    pub fn from_record(record: &Record) -> Result<Self> {
        Ok(serde_json::from_value(Value::Object(record.clone()))?)
    }

    /// Patch sets arrive oldest first; the last one is current.
    pub fn current_patch_set(&self) -> Option<&PatchSet> {
        self.current.as_ref().or(self.patch_sets.last())
    }

    pub fn first_patch_set(&self) -> Option<&PatchSet> {
        self.patch_sets.first()
    }

    /// Only a single dependency is tracked.
    pub fn depends(&self) -> Option<&str> {
        self.depends_on.first().and_then(|d| d.id.as_deref())
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_on.and_then(|ts| DateTime::from_timestamp(ts, 0))
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.last_updated.and_then(|ts| DateTime::from_timestamp(ts, 0))
    }

    /// File paths touched by the current patch set.
    pub fn current_files(&self) -> impl Iterator<Item = &str> {
        self.current_patch_set()
            .into_iter()
            .flat_map(|ps| ps.files.iter().map(|f| f.file.as_str()))
    }

    /// Compact approval summary of the current patch set, e.g. `V+1,R+2,+A`.
    pub fn approval_summary(&self) -> String {
        self.current_patch_set()
            .map(|ps| {
                ps.approvals
                    .iter()
                    .filter_map(Approval::code)
                    .collect::<Vec<_>>()
                    .join(",")
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchSet {
    #[serde(default, deserialize_with = "lenient_i64")]
    pub number: Option<i64>,
    #[serde(default)]
    pub revision: Option<String>,
    #[serde(default, rename = "ref")]
    pub git_ref: Option<String>,
    #[serde(default)]
    pub uploader: Option<Account>,
    #[serde(default)]
    pub author: Option<Account>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub created_on: Option<i64>,
    #[serde(default)]
    pub approvals: Vec<Approval>,
    #[serde(default)]
    pub files: Vec<FileChange>,
}

impl PatchSet {
    pub fn is_reviewer_nacked(&self) -> bool {
        self.approvals.iter().any(Approval::is_reviewer_nack)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Approval {
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub value: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub granted_on: Option<i64>,
    #[serde(default)]
    pub by: Option<Account>,
}

impl Approval {
    pub fn value(&self) -> i64 {
        self.value.unwrap_or(0)
    }

    pub fn is_nack(&self) -> bool {
        self.value() < 0
    }

    pub fn is_reviewer_nack(&self) -> bool {
        self.kind.as_deref() == Some(APPROVAL_CODE_REVIEW) && self.is_nack()
    }

    /// Short vote code: `+A` for workflow approval, `R+2`/`R-1`/`R=0` for
    /// code review and `V+1`/`V-1`/`V=0` for verification.
    pub fn code(&self) -> Option<String> {
        let value = self.value();
        let prefix = match self.kind.as_deref()? {
            APPROVAL_WORKFLOW => {
                return (value > 0).then(|| "+A".to_string());
            }
            APPROVAL_CODE_REVIEW => "R",
            APPROVAL_VERIFIED => "V",
            _ => return None,
        };
        Some(match value {
            v if v > 0 => format!("{}+{}", prefix, v),
            v if v < 0 => format!("{}{}", prefix, v),
            _ => format!("{}=0", prefix),
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileChange {
    #[serde(default)]
    pub file: String,
    #[serde(default, rename = "type")]
    pub action: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Comment {
    #[serde(default, deserialize_with = "lenient_i64")]
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub reviewer: Option<Account>,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dependency {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub number: Option<i64>,
}

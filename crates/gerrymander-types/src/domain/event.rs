use serde_json::Value;
use std::fmt;

use super::account::Account;
use super::change::{Approval, Change, PatchSet};
use crate::{Record, Result};

/// Event types emitted by `gerrit stream-events` that we understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    CommentAdded,
    PatchSetCreated,
    ChangeMerged,
    ChangeAbandoned,
    ChangeRestored,
    RefUpdated,
    ReviewerAdded,
    TopicChanged,
}

impl EventKind {
    pub fn from_type(kind: &str) -> Option<Self> {
        Some(match kind {
            "comment-added" => EventKind::CommentAdded,
            "patchset-created" => EventKind::PatchSetCreated,
            "change-merged" => EventKind::ChangeMerged,
            "change-abandoned" => EventKind::ChangeAbandoned,
            "change-restored" => EventKind::ChangeRestored,
            "ref-updated" => EventKind::RefUpdated,
            "reviewer-added" => EventKind::ReviewerAdded,
            "topic-changed" => EventKind::TopicChanged,
            _ => return None,
        })
    }

    /// Field holding the account responsible for the event.
    fn actor_field(self) -> &'static str {
        match self {
            EventKind::CommentAdded => "author",
            EventKind::PatchSetCreated => "uploader",
            EventKind::ChangeMerged | EventKind::RefUpdated => "submitter",
            EventKind::ChangeAbandoned => "abandoner",
            EventKind::ChangeRestored => "restorer",
            EventKind::ReviewerAdded => "reviewer",
            EventKind::TopicChanged => "changer",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EventKind::CommentAdded => "comment added",
            EventKind::PatchSetCreated => "patch set created",
            EventKind::ChangeMerged => "change merged",
            EventKind::ChangeAbandoned => "change abandoned",
            EventKind::ChangeRestored => "change restored",
            EventKind::RefUpdated => "ref updated",
            EventKind::ReviewerAdded => "reviewer added",
            EventKind::TopicChanged => "topic changed",
        };
        write!(f, "{}", label)
    }
}

#[derive(Debug, Clone)]
pub struct Event {
    pub kind: EventKind,
    pub change: Option<Change>,
    pub patch_set: Option<PatchSet>,
    pub user: Option<Account>,
    pub comment: Option<String>,
    pub approvals: Vec<Approval>,
}

impl Event {
    /// Decode a stream-events record. Unknown event types yield `Ok(None)`.
    pub fn from_record(record: &Record) -> Result<Option<Self>> {
        let Some(type_name) = record.get("type").and_then(Value::as_str) else {
            tracing::debug!("event record without a type field");
            return Ok(None);
        };
        let Some(kind) = EventKind::from_type(type_name) else {
            tracing::debug!(event_type = type_name, "ignoring unknown event");
            return Ok(None);
        };

        let change = match (kind, record.get("change")) {
            (EventKind::RefUpdated, _) | (_, None) => None,
            (_, Some(value)) => Some(serde_json::from_value(value.clone())?),
        };
        let patch_set = match kind {
            EventKind::CommentAdded | EventKind::PatchSetCreated | EventKind::ChangeMerged => {
                record
                    .get("patchSet")
                    .map(|v| serde_json::from_value(v.clone()))
                    .transpose()?
            }
            _ => None,
        };
        let user = record
            .get(kind.actor_field())
            .map(|v| serde_json::from_value(v.clone()))
            .transpose()?;
        let comment = record
            .get("comment")
            .and_then(Value::as_str)
            .map(str::to_string);
        let approvals = match record.get("approvals") {
            Some(value) => serde_json::from_value(value.clone())?,
            None => Vec::new(),
        };

        Ok(Some(Event {
            kind,
            change,
            patch_set,
            user,
            comment,
            approvals,
        }))
    }

    pub fn is_user_in_list(&self, users: &[String]) -> bool {
        self.user.as_ref().is_some_and(|u| u.is_in_list(users))
    }

    pub fn project(&self) -> Option<&str> {
        self.change.as_ref().and_then(|c| c.project.as_deref())
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;

/// A Gerrit user as it appears in `owner`, `uploader`, `by`, `author`, ...
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

impl Account {
    /// True when the display name or username appears in `users`.
    pub fn is_in_list(&self, users: &[String]) -> bool {
        let matches = |field: &Option<String>| {
            field
                .as_deref()
                .is_some_and(|value| users.iter().any(|u| u == value))
        };
        matches(&self.name) || matches(&self.username)
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = self
            .username
            .as_deref()
            .or(self.name.as_deref())
            .or(self.email.as_deref())
            .unwrap_or("unknown");
        write!(f, "{}", label)
    }
}

use std::fmt;

/// The ordered tokens of one remote `gerrit` subcommand call, e.g.
/// `["query", "--format=JSON", "limit:500 AND ( project:nova )"]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Invocation {
    tokens: Vec<String>,
}

impl Invocation {
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tokens: tokens.into_iter().map(Into::into).collect(),
        }
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Space-joined form, as logged and as fed to the cache key.
    pub fn canonical(&self) -> String {
        self.tokens.join(" ")
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical())
    }
}

impl From<Vec<String>> for Invocation {
    fn from(tokens: Vec<String>) -> Self {
        Self { tokens }
    }
}

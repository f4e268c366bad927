use std::collections::BTreeMap;

use crate::{Error, Invocation, Result};

/// Leading term value that negates the whole term.
pub const NEGATE: &str = "!";

/// How much patch set detail to request per change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PatchSets {
    #[default]
    None,
    Current,
    All,
}

/// A `gerrit query` request, independent of paging.
///
/// Terms are OR-ed within a name and AND-ed across names:
/// `{"project": ["nova", "glance"], "status": ["open"]}` becomes
/// `( project:nova OR project:glance ) AND ( status:open )`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    terms: BTreeMap<String, Vec<String>>,
    raw: Option<String>,
    patch_sets: PatchSets,
    approvals: bool,
    files: bool,
    comments: bool,
    dependencies: bool,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add values for a search operator. Start the values with [`NEGATE`]
    /// to exclude instead of include.
    pub fn term<I, S>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.terms
            .entry(name.into())
            .or_default()
            .extend(values.into_iter().map(Into::into));
        self
    }

    /// Free-form query text, parenthesised and AND-ed with the terms.
    pub fn raw(mut self, query: impl Into<String>) -> Self {
        self.raw = Some(query.into());
        self
    }

    pub fn patch_sets(mut self, patch_sets: PatchSets) -> Self {
        self.patch_sets = patch_sets;
        self
    }

    pub fn approvals(mut self, enabled: bool) -> Self {
        self.approvals = enabled;
        self
    }

    pub fn files(mut self, enabled: bool) -> Self {
        self.files = enabled;
        self
    }

    pub fn comments(mut self, enabled: bool) -> Self {
        self.comments = enabled;
        self
    }

    pub fn dependencies(mut self, enabled: bool) -> Self {
        self.dependencies = enabled;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.patch_sets == PatchSets::None {
            if self.approvals {
                return Err(Error::InvalidQuery(
                    "approvals cannot be requested without patches".to_string(),
                ));
            }
            if self.files {
                return Err(Error::InvalidQuery(
                    "files cannot be requested without patches".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Tokens for one page of results.
    pub fn page(&self, limit: Option<usize>, start: Option<usize>, resume: Option<&str>) -> Invocation {
        let mut args = vec!["query".to_string(), "--format=JSON".to_string()];
        match self.patch_sets {
            PatchSets::None => {}
            PatchSets::Current => args.push("--current-patch-set".to_string()),
            PatchSets::All => args.push("--patch-sets".to_string()),
        }
        if self.approvals {
            args.push("--all-approvals".to_string());
        }
        if self.files {
            args.push("--files".to_string());
        }
        if self.comments {
            args.push("--comments".to_string());
        }
        if self.dependencies {
            args.push("--dependencies".to_string());
        }
        if let Some(start) = start {
            args.push("--start".to_string());
            args.push(start.to_string());
        }

        let clauses = self.clauses(limit, resume);
        if !clauses.is_empty() {
            args.push(clauses.join(" AND "));
        }
        Invocation::from(args)
    }

    fn clauses(&self, limit: Option<usize>, resume: Option<&str>) -> Vec<String> {
        let mut clauses = Vec::new();
        if let Some(limit) = limit {
            clauses.push(format!("limit:{}", limit));
        }
        if let Some(key) = resume {
            clauses.push(format!("resume_sortkey:{}", key));
        }
        if let Some(raw) = &self.raw {
            clauses.push(format!("({})", raw));
        }

        for (name, values) in &self.terms {
            let (negate, values) = match values.split_first() {
                Some((first, rest)) if first == NEGATE => (true, rest),
                _ => (false, values.as_slice()),
            };
            if values.is_empty() {
                continue;
            }

            let clause = values
                .iter()
                .map(|value| format!("{}:{}", name, value))
                .collect::<Vec<_>>()
                .join(" OR ");
            if negate {
                clauses.push(format!("( NOT ( {} ) )", clause));
            } else {
                clauses.push(format!("( {} )", clause));
            }
        }
        clauses
    }
}

use gerrymander_types::{QueryLine, Record, classify_query_line, sort_key};

use crate::client::Client;
use crate::query::Query;
use crate::{Error, Result};

/// Largest `limit:` the driver ever asks the server for.
pub const MAX_PAGE_SIZE: usize = 500;

/// Drives a [`Query`] across as many pages as it takes to reach the
/// caller's limit or exhaust the result set.
pub struct Paginator<'c, C: Client + ?Sized> {
    client: &'c mut C,
    page_size: usize,
}

/// What one page told us about the next one.
#[derive(Debug, Default)]
struct PageState {
    rows: usize,
    more_changes: bool,
}

impl<'c, C: Client + ?Sized> Paginator<'c, C> {
    pub fn new(client: &'c mut C) -> Self {
        Self {
            client,
            page_size: MAX_PAGE_SIZE,
        }
    }

    /// Records requested per page, clamped to `1..=MAX_PAGE_SIZE`.
    pub fn page_size(mut self, size: usize) -> Self {
        self.page_size = size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    /// Run `query`, passing each change row to `sink` in server order.
    /// Returns the number of rows delivered, which is never more than
    /// `limit`.
    pub fn run<F>(&mut self, query: &Query, limit: Option<usize>, mut sink: F) -> Result<usize>
    where
        F: FnMut(Record) -> Result<()>,
    {
        query.validate()?;

        let mut delivered = 0usize;
        let mut cursor: Option<String> = None;
        let mut start: Option<usize> = None;

        loop {
            let want = match limit {
                Some(limit) => self.page_size.min(limit.saturating_sub(delivered)),
                None => self.page_size,
            };
            if want == 0 {
                break;
            }

            let invocation = query.page(Some(want), start, cursor.as_deref());
            let mut page = PageState::default();

            self.client.run(&invocation, &mut |record: Record| {
                match classify_query_line(&record) {
                    QueryLine::Stats { more_changes } => {
                        page.more_changes = more_changes;
                        return Ok(());
                    }
                    QueryLine::Error { message } => {
                        return Err(Error::Remote(message.to_string()));
                    }
                    QueryLine::Row => {}
                }

                if let Some(key) = sort_key(&record) {
                    cursor = Some(key.to_string());
                }
                page.rows += 1;

                if limit.is_some_and(|limit| delivered >= limit) {
                    return Ok(());
                }
                delivered += 1;
                sink(record)
            })?;

            tracing::debug!(
                rows = page.rows,
                delivered,
                more_changes = page.more_changes,
                cursor = cursor.as_deref().unwrap_or(""),
                "query page complete"
            );

            if page.rows == 0 {
                break;
            }
            if limit.is_some_and(|limit| delivered >= limit) {
                break;
            }
            if cursor.is_none() && !page.more_changes {
                break;
            }
            start = page.more_changes.then_some(delivered);
        }

        Ok(delivered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Invocation;
    use crate::query::PatchSets;
    use serde_json::{Value, json};

    /// Answers each page from a canned list and remembers what it was asked.
    struct Scripted {
        pages: Vec<Vec<Value>>,
        calls: Vec<Invocation>,
    }

    impl Scripted {
        fn new(pages: Vec<Vec<Value>>) -> Self {
            Self {
                pages,
                calls: Vec::new(),
            }
        }
    }

    impl Client for Scripted {
        fn run(
            &mut self,
            invocation: &Invocation,
            sink: &mut dyn FnMut(Record) -> Result<()>,
        ) -> Result<()> {
            let page = self.pages.get(self.calls.len()).cloned().unwrap_or_default();
            self.calls.push(invocation.clone());
            for value in page {
                if let Value::Object(record) = value {
                    sink(record)?;
                }
            }
            Ok(())
        }
    }

    fn rows(range: std::ops::Range<usize>) -> Vec<Value> {
        range
            .map(|n| json!({"number": n, "sortKey": format!("k{n:04}")}))
            .collect()
    }

    fn numbers(records: &[Record]) -> Vec<u64> {
        records.iter().filter_map(|r| r["number"].as_u64()).collect()
    }

    fn clauses(invocation: &Invocation) -> &str {
        invocation.tokens().last().map(String::as_str).unwrap_or("")
    }

    #[test]
    fn test_single_short_page_stops_on_missing_more() {
        let mut page = rows(0..3);
        page.push(json!({"type": "stats", "rowCount": 3}));
        let mut client = Scripted::new(vec![page]);

        let mut seen = Vec::new();
        let n = Paginator::new(&mut client)
            .run(&Query::new(), Some(10), |r| {
                seen.push(r);
                Ok(())
            })
            .unwrap();

        assert_eq!(n, 3);
        assert_eq!(numbers(&seen), vec![0, 1, 2]);
        // the first page carried a cursor, so a second (empty) page was requested
        assert_eq!(client.calls.len(), 2);
        assert_eq!(clauses(&client.calls[0]), "limit:10");
        assert_eq!(clauses(&client.calls[1]), "limit:7 AND resume_sortkey:k0002");
    }

    #[test]
    fn test_page_size_bounds_each_request() {
        let mut client = Scripted::new(vec![rows(0..500), rows(500..1000), rows(1000..1200)]);

        let n = Paginator::new(&mut client)
            .run(&Query::new(), Some(1200), |_| Ok(()))
            .unwrap();

        assert_eq!(n, 1200);
        let limits: Vec<&str> = client.calls.iter().map(clauses).collect();
        assert_eq!(limits[0], "limit:500");
        assert_eq!(limits[1], "limit:500 AND resume_sortkey:k0499");
        assert_eq!(limits[2], "limit:200 AND resume_sortkey:k0999");
        assert_eq!(client.calls.len(), 3);
    }

    #[test]
    fn test_unlimited_runs_until_empty_page() {
        let mut client = Scripted::new(vec![rows(0..500), rows(500..740)]);

        let n = Paginator::new(&mut client)
            .run(&Query::new(), None, |_| Ok(()))
            .unwrap();

        assert_eq!(n, 740);
        assert_eq!(client.calls.len(), 3);
        assert!(client.calls.iter().all(|c| clauses(c).starts_with("limit:500")));
    }

    #[test]
    fn test_delivered_is_min_of_limit_and_available() {
        for (limit, available) in [(1, 5), (5, 5), (7, 5), (501, 1000), (1000, 501)] {
            let mut client = Scripted::new(vec![
                rows(0..available.min(500)),
                rows(500..available.max(500)),
            ]);
            let mut count = 0;
            let n = Paginator::new(&mut client)
                .run(&Query::new(), Some(limit), |_| {
                    count += 1;
                    Ok(())
                })
                .unwrap();
            assert_eq!(n, limit.min(available), "limit {limit} available {available}");
            assert_eq!(count, n);
        }
    }

    #[test]
    fn test_rows_beyond_limit_are_dropped() {
        // a server that ignores limit: and returns everything
        let mut client = Scripted::new(vec![rows(0..50)]);
        let n = Paginator::new(&mut client)
            .run(&Query::new(), Some(20), |_| Ok(()))
            .unwrap();
        assert_eq!(n, 20);
        assert_eq!(client.calls.len(), 1);
    }

    #[test]
    fn test_record_without_cursor_keeps_previous_cursor() {
        let mut client = Scripted::new(vec![vec![
            json!({"number": 1, "sortKey": "k1"}),
            json!({"number": 2}),
        ]]);
        Paginator::new(&mut client)
            .run(&Query::new(), Some(10), |_| Ok(()))
            .unwrap();
        assert_eq!(clauses(&client.calls[1]), "limit:8 AND resume_sortkey:k1");
    }

    #[test]
    fn test_more_changes_continues_with_offset() {
        let mut first: Vec<Value> = (0..2).map(|n| json!({"number": n})).collect();
        first.push(json!({"type": "stats", "rowCount": 2, "moreChanges": true}));
        let mut second: Vec<Value> = (2..3).map(|n| json!({"number": n})).collect();
        second.push(json!({"type": "stats", "rowCount": 1, "moreChanges": false}));

        let mut client = Scripted::new(vec![first, second]);
        let n = Paginator::new(&mut client)
            .page_size(2)
            .run(&Query::new(), None, |_| Ok(()))
            .unwrap();

        assert_eq!(n, 3);
        assert_eq!(client.calls.len(), 2);
        assert!(!client.calls[0].tokens().contains(&"--start".to_string()));
        let tokens = client.calls[1].tokens();
        let pos = tokens.iter().position(|t| t == "--start").unwrap();
        assert_eq!(tokens[pos + 1], "2");
    }

    #[test]
    fn test_error_record_aborts() {
        let mut client = Scripted::new(vec![vec![
            json!({"number": 1, "sortKey": "k1"}),
            json!({"type": "error", "message": "boom"}),
        ]]);
        let mut seen = 0;
        let err = Paginator::new(&mut client)
            .run(&Query::new(), None, |_| {
                seen += 1;
                Ok(())
            })
            .unwrap_err();

        assert!(matches!(&err, Error::Remote(msg) if msg == "boom"));
        assert_eq!(seen, 1);
    }

    #[test]
    fn test_invalid_query_is_rejected_before_any_call() {
        let mut client = Scripted::new(Vec::new());
        let err = Paginator::new(&mut client)
            .run(&Query::new().files(true), None, |_| Ok(()))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidQuery(_)));
        assert!(client.calls.is_empty());

        let query = Query::new().patch_sets(PatchSets::Current).files(true);
        Paginator::new(&mut client).run(&query, Some(1), |_| Ok(())).unwrap();
        assert_eq!(client.calls.len(), 1);
    }

    #[test]
    fn test_page_size_is_clamped() {
        let mut client = Scripted::new(vec![rows(0..1)]);
        Paginator::new(&mut client)
            .page_size(0)
            .run(&Query::new(), None, |_| Ok(()))
            .unwrap();
        assert_eq!(clauses(&client.calls[0]), "limit:1");

        let mut client = Scripted::new(Vec::new());
        Paginator::new(&mut client)
            .page_size(10_000)
            .run(&Query::new(), None, |_| Ok(()))
            .unwrap();
        assert_eq!(clauses(&client.calls[0]), "limit:500");
    }
}

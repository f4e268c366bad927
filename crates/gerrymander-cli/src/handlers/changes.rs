use crate::args::ChangesArgs;
use crate::output::change_writer;
use anyhow::{Context, Result};
use gerrymander_client::{Paginator, PatchSets, Query};
use gerrymander_core::Config;
use gerrymander_types::Change;
use is_terminal::IsTerminal;
use regex::Regex;
use std::io;

pub fn handle(config: &Config, args: &ChangesArgs) -> Result<()> {
    let filters = file_filters(&args.file)?;
    let projects = args.projects.resolve(config)?;
    let query = build_query(args, &projects, !filters.is_empty());
    let mut client = super::client(config, &args.cache)?;

    let color =
        args.color || (io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none());
    let stdout = io::stdout();
    let mut writer = change_writer(args.format, stdout.lock(), color);

    let mut shown = 0usize;
    let delivered = Paginator::new(&mut *client)
        .run(&query, args.limit, |record| {
            let change = Change::from_record(&record)?;
            if !touches_files(&change, &filters) {
                return Ok(());
            }
            shown += 1;
            writer.write(&change)?;
            Ok(())
        })
        .context("Failed to query changes")?;

    writer.finish()?;
    tracing::debug!(delivered, shown, "listed changes");
    Ok(())
}

fn build_query(args: &ChangesArgs, projects: &[String], with_files: bool) -> Query {
    let mut query = Query::new()
        .patch_sets(PatchSets::Current)
        .approvals(true)
        .files(with_files);

    let terms: [(&str, &[String]); 6] = [
        ("project", projects),
        ("owner", args.owner.as_slice()),
        ("status", args.status.as_slice()),
        ("branch", args.branch.as_slice()),
        ("topic", args.topic.as_slice()),
        ("reviewer", args.reviewer.as_slice()),
    ];
    for (name, values) in terms {
        if !values.is_empty() {
            query = query.term(name, values.iter().cloned());
        }
    }
    if !args.message.is_empty() {
        query = query.term("message", args.message.iter().map(|m| quote(m)));
    }

    if let Some(raw) = &args.query {
        query = query.raw(raw.clone());
    }
    query
}

fn quote(value: &str) -> String {
    if value.contains(char::is_whitespace) {
        format!("\"{}\"", value)
    } else {
        value.to_string()
    }
}

fn file_filters(patterns: &[String]) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|p| Regex::new(p).with_context(|| format!("Invalid --file pattern '{}'", p)))
        .collect()
}

/// True when no filters are given or the current patch set touches a path
/// matching one of them. Gerrit's magic entries (`/COMMIT_MSG`,
/// `/MERGE_LIST`) never match.
fn touches_files(change: &Change, filters: &[Regex]) -> bool {
    filters.is_empty()
        || change
            .current_files()
            .filter(|path| !path.starts_with('/'))
            .any(|path| filters.iter().any(|re| re.is_match(path)))
}

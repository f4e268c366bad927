//! Report rendering.
//!
//! `json` and `csv` write each change as soon as it arrives. `plain` has
//! to see every row before it can size its columns, so it buffers until
//! [`ChangeWriter::finish`].

use crate::types::OutputFormat;
use gerrymander_types::{Change, Event};
use owo_colors::OwoColorize;
use std::io::{self, Write};

const HEADERS: [&str; 7] = [
    "Change", "Project", "Branch", "Owner", "Status", "Approvals", "Subject",
];

/// One change as a report row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRow {
    pub number: String,
    pub project: String,
    pub branch: String,
    pub owner: String,
    pub status: String,
    pub approvals: String,
    pub subject: String,
    pub url: String,
}

impl ChangeRow {
    pub fn from_change(change: &Change) -> Self {
        let text = |field: &Option<String>| field.clone().unwrap_or_default();
        Self {
            number: change.number.map(|n| n.to_string()).unwrap_or_default(),
            project: text(&change.project),
            branch: text(&change.branch),
            owner: change
                .owner
                .as_ref()
                .map(|owner| owner.to_string())
                .unwrap_or_default(),
            status: text(&change.status),
            approvals: change.approval_summary(),
            subject: text(&change.subject),
            url: text(&change.url),
        }
    }

    fn cells(&self) -> [&str; 7] {
        [
            &self.number,
            &self.project,
            &self.branch,
            &self.owner,
            &self.status,
            &self.approvals,
            &self.subject,
        ]
    }
}

pub trait ChangeWriter {
    fn write(&mut self, change: &Change) -> io::Result<()>;
    fn finish(self: Box<Self>) -> io::Result<()>;
}

pub fn change_writer<'w, W: Write + 'w>(
    format: OutputFormat,
    out: W,
    color: bool,
) -> Box<dyn ChangeWriter + 'w> {
    match format {
        OutputFormat::Plain => Box::new(PlainTable {
            out,
            color,
            rows: Vec::new(),
        }),
        OutputFormat::Json => Box::new(JsonLines { out }),
        OutputFormat::Csv => Box::new(CsvRows {
            out: csv::Writer::from_writer(out),
            wrote_header: false,
        }),
    }
}

struct JsonLines<W: Write> {
    out: W,
}

impl<W: Write> ChangeWriter for JsonLines<W> {
    fn write(&mut self, change: &Change) -> io::Result<()> {
        serde_json::to_writer(&mut self.out, change)?;
        writeln!(self.out)
    }

    fn finish(mut self: Box<Self>) -> io::Result<()> {
        self.out.flush()
    }
}

struct CsvRows<W: Write> {
    out: csv::Writer<W>,
    wrote_header: bool,
}

impl<W: Write> ChangeWriter for CsvRows<W> {
    fn write(&mut self, change: &Change) -> io::Result<()> {
        if !self.wrote_header {
            self.out.write_record(HEADERS.iter().chain(["Url"].iter()))?;
            self.wrote_header = true;
        }
        let row = ChangeRow::from_change(change);
        self.out
            .write_record(row.cells().iter().chain([row.url.as_str()].iter()))?;
        // Keep rows flowing to the reader while later pages load
        self.out.flush()
    }

    fn finish(mut self: Box<Self>) -> io::Result<()> {
        if !self.wrote_header {
            self.out.write_record(HEADERS.iter().chain(["Url"].iter()))?;
        }
        self.out.flush()
    }
}

struct PlainTable<W: Write> {
    out: W,
    color: bool,
    rows: Vec<ChangeRow>,
}

impl<W: Write> ChangeWriter for PlainTable<W> {
    fn write(&mut self, change: &Change) -> io::Result<()> {
        self.rows.push(ChangeRow::from_change(change));
        Ok(())
    }

    fn finish(mut self: Box<Self>) -> io::Result<()> {
        let mut widths = HEADERS.map(str::len);
        for row in &self.rows {
            for (width, cell) in widths.iter_mut().zip(row.cells()) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let header = pad_line(&HEADERS, &widths);
        if self.color {
            writeln!(self.out, "{}", header.bold())?;
        } else {
            writeln!(self.out, "{}", header)?;
        }

        for row in &self.rows {
            let cells = row.cells();
            let mut line = String::new();
            for (i, (cell, width)) in cells.iter().zip(widths).enumerate() {
                if i > 0 {
                    line.push_str("  ");
                }
                let padded = if i + 1 == cells.len() {
                    cell.to_string()
                } else {
                    format!("{:<width$}", cell, width = width)
                };
                if self.color && i == 5 {
                    line.push_str(&colorize_approvals(&padded, &row.approvals));
                } else {
                    line.push_str(&padded);
                }
            }
            writeln!(self.out, "{}", line)?;
        }

        writeln!(self.out)?;
        writeln!(self.out, "{} changes", self.rows.len())?;
        self.out.flush()
    }
}

fn pad_line(cells: &[&str; 7], widths: &[usize; 7]) -> String {
    let last = cells.len() - 1;
    cells
        .iter()
        .zip(widths)
        .enumerate()
        .map(|(i, (cell, width))| {
            if i == last {
                cell.to_string()
            } else {
                format!("{:<width$}", cell, width = *width)
            }
        })
        .collect::<Vec<_>>()
        .join("  ")
}

/// Red when anyone voted against, green when there are only positive votes.
fn colorize_approvals(padded: &str, summary: &str) -> String {
    let codes: Vec<&str> = summary.split(',').filter(|c| !c.is_empty()).collect();
    if codes.iter().any(|c| c.contains('-')) {
        padded.red().to_string()
    } else if codes.iter().any(|c| c.contains('+')) {
        padded.green().to_string()
    } else {
        padded.to_string()
    }
}

/// Single-line summary of a stream event.
pub fn event_line(event: &Event) -> String {
    let who = event
        .user
        .as_ref()
        .map(|user| user.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let mut line = match &event.change {
        Some(change) => format!(
            "{} {} {} by {}: {}",
            change.project.as_deref().unwrap_or("-"),
            change.number.map(|n| n.to_string()).unwrap_or_else(|| "-".to_string()),
            event.kind,
            who,
            change.subject.as_deref().unwrap_or("")
        ),
        None => format!("{} by {}", event.kind, who),
    };

    let votes: Vec<String> = event.approvals.iter().filter_map(|a| a.code()).collect();
    if !votes.is_empty() {
        line.push_str(&format!(" [{}]", votes.join(",")));
    }
    line
}

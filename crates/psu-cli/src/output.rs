//! Formatted output helpers for CLI commands.
//!
//! Every listing can be printed as an aligned table, as pretty JSON of the
//! underlying records, or through a user template rendered once per record.

use std::convert::Infallible;
use std::str::FromStr;

use anyhow::Context;
use chrono::DateTime;
use minijinja::{Environment, UndefinedBehavior};
use psu_common::types::{Endpoint, EndpointGroup, Pair, Stack, Status};
use serde::Serialize;
use serde_json::Value;

/// Help text shared by every `--format` flag.
pub const FORMAT_HELP: &str =
    "Output format: table, json, or a template over the JSON fields, e.g. '{{ Id }} {{ Name }}'";

/// Output format selected with `--format`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Aligned columns.
    #[default]
    Table,
    /// Pretty-printed JSON.
    Json,
    /// Template source, rendered once per record.
    Template(String),
}

impl FromStr for OutputFormat {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "table" => Self::Table,
            "json" => Self::Json,
            template => Self::Template(template.to_string()),
        })
    }
}

/// Prints `value` as JSON, through a template, or as the table built by
/// `table`.
///
/// # Errors
///
/// Returns an error if JSON serialization fails or the template does not
/// parse or render.
pub fn emit<T, F>(format: &OutputFormat, value: &T, table: F) -> anyhow::Result<()>
where
    T: Serialize + ?Sized,
    F: FnOnce() -> String,
{
    match format {
        OutputFormat::Table => println!("{}", table()),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Template(source) => {
            for line in render_template(source, &serde_json::to_value(value)?)? {
                println!("{line}");
            }
        }
    }
    Ok(())
}

/// Renders `source` once per record. An array yields one line per element;
/// anything else is a single record. Top-level fields are template
/// variables, and referencing a missing one is an error.
///
/// # Errors
///
/// Returns an error if the template does not parse or a record fails to
/// render.
pub fn render_template(source: &str, value: &Value) -> anyhow::Result<Vec<String>> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    let template = env
        .template_from_str(source)
        .context("invalid --format template")?;
    let records: Vec<&Value> = match value {
        Value::Array(items) => items.iter().collect(),
        record => vec![record],
    };
    records
        .into_iter()
        .map(|record| {
            template
                .render(record)
                .context("failed to render --format template")
        })
        .collect()
}

/// Renders rows under headers, each column padded to its widest cell.
#[must_use]
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let header: Vec<String> = headers.iter().map(|h| (*h).to_string()).collect();
    std::iter::once(&header)
        .chain(rows)
        .map(|row| render_row(row, &widths))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_row(cells: &[String], widths: &[usize]) -> String {
    let last = cells.len().saturating_sub(1);
    cells
        .iter()
        .zip(widths)
        .enumerate()
        .map(|(i, (cell, width))| {
            if i == last {
                cell.clone()
            } else {
                format!("{cell:<width$}")
            }
        })
        .collect::<Vec<_>>()
        .join("  ")
}

/// Formats a Unix timestamp as UTC, `-` when unset.
#[must_use]
pub fn format_timestamp(seconds: i64) -> String {
    if seconds == 0 {
        return "-".to_string();
    }
    DateTime::from_timestamp(seconds, 0).map_or_else(
        || seconds.to_string(),
        |date| date.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}

/// Formats env pairs as `K=V, K=V`.
#[must_use]
pub fn format_env(env: &[Pair]) -> String {
    env.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Table of stacks.
#[must_use]
pub fn stacks_table(stacks: &[Stack]) -> String {
    let rows: Vec<Vec<String>> = stacks
        .iter()
        .map(|s| {
            vec![
                s.id.to_string(),
                s.name.clone(),
                s.kind.to_string(),
                s.endpoint_id.to_string(),
                s.swarm_cluster_id().unwrap_or("-").to_string(),
                format_timestamp(s.creation_date),
            ]
        })
        .collect();
    render_table(
        &["ID", "NAME", "TYPE", "ENDPOINT", "SWARM ID", "CREATED"],
        &rows,
    )
}

/// Key/value view of one stack.
#[must_use]
pub fn stack_details(stack: &Stack) -> String {
    let rows = vec![
        vec!["Id".to_string(), stack.id.to_string()],
        vec!["Name".to_string(), stack.name.clone()],
        vec!["Type".to_string(), stack.kind.to_string()],
        vec!["Endpoint".to_string(), stack.endpoint_id.to_string()],
        vec![
            "Swarm ID".to_string(),
            stack.swarm_cluster_id().unwrap_or("-").to_string(),
        ],
        vec!["Entry point".to_string(), stack.entry_point.clone()],
        vec!["Env".to_string(), format_env(&stack.env)],
        vec!["Created".to_string(), format_timestamp(stack.creation_date)],
        vec!["Created by".to_string(), stack.created_by.clone()],
    ];
    render_table(&["FIELD", "VALUE"], &rows)
}

/// Table of endpoints.
#[must_use]
pub fn endpoints_table(endpoints: &[Endpoint]) -> String {
    let rows: Vec<Vec<String>> = endpoints
        .iter()
        .map(|e| {
            vec![
                e.id.to_string(),
                e.name.clone(),
                e.kind.to_string(),
                e.url.clone(),
                e.public_url.clone(),
                e.group_id.to_string(),
            ]
        })
        .collect();
    render_table(
        &["ID", "NAME", "TYPE", "URL", "PUBLIC URL", "GROUP ID"],
        &rows,
    )
}

/// Table of endpoint groups.
#[must_use]
pub fn endpoint_groups_table(groups: &[EndpointGroup]) -> String {
    let rows: Vec<Vec<String>> = groups
        .iter()
        .map(|g| vec![g.id.to_string(), g.name.clone(), g.description.clone()])
        .collect();
    render_table(&["ID", "NAME", "DESCRIPTION"], &rows)
}

/// Key/value view of server status.
#[must_use]
pub fn status_details(status: &Status) -> String {
    let flag = |value: Option<bool>| value.map_or_else(|| "-".to_string(), |v| v.to_string());
    let rows = vec![
        vec!["Version".to_string(), status.version.clone()],
        vec!["Instance ID".to_string(), status.instance_id.clone()],
        vec!["Authentication".to_string(), flag(status.authentication)],
        vec![
            "Endpoint management".to_string(),
            flag(status.endpoint_management),
        ],
        vec!["Analytics".to_string(), flag(status.analytics)],
    ];
    render_table(&["FIELD", "VALUE"], &rows)
}

//! Printing a job outcome.

use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use serde::Serialize;
use statcsv_core::JobOutcome;

/// Machine-readable form of a [`JobOutcome`].
#[derive(Debug, Serialize)]
pub struct OutcomeReport<'a> {
    pub file_type: &'static str,
    pub source_bucket: &'a str,
    pub source_key: &'a str,
    pub primary_key: &'a str,
    pub verified: bool,
    pub artifacts: Vec<ArtifactReport<'a>>,
}

#[derive(Debug, Serialize)]
pub struct ArtifactReport<'a> {
    pub suffix: &'a str,
    pub key: &'a str,
    pub rows: usize,
    pub columns: usize,
}

impl<'a> From<&'a JobOutcome> for OutcomeReport<'a> {
    fn from(outcome: &'a JobOutcome) -> Self {
        Self {
            file_type: outcome.file_type.as_str(),
            source_bucket: &outcome.source.bucket,
            source_key: &outcome.source.key,
            primary_key: &outcome.primary_key,
            verified: outcome.verified,
            artifacts: outcome
                .artifacts
                .iter()
                .map(|artifact| ArtifactReport {
                    suffix: &artifact.suffix,
                    key: &artifact.key,
                    rows: artifact.rows,
                    columns: artifact.columns,
                })
                .collect(),
        }
    }
}

pub fn print_json(outcome: &JobOutcome) -> serde_json::Result<()> {
    println!("{}", serde_json::to_string_pretty(&OutcomeReport::from(outcome))?);
    Ok(())
}

pub fn print_summary(outcome: &JobOutcome, bucket: &str) {
    println!(
        "Source: s3://{}/{} ({})",
        outcome.source.bucket, outcome.source.key, outcome.file_type
    );
    println!("Bucket: {bucket}");
    println!("{}", summary_table(outcome));
}

/// One row per written CSV.
#[must_use]
pub fn summary_table(outcome: &JobOutcome) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Table"),
        header_cell("Key"),
        header_cell("Rows"),
        header_cell("Columns"),
    ]);
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(140);
    align_column(&mut table, 2, CellAlignment::Right);
    align_column(&mut table, 3, CellAlignment::Right);
    for artifact in &outcome.artifacts {
        let name = if artifact.suffix.is_empty() {
            Cell::new("data").fg(Color::Green).add_attribute(Attribute::Bold)
        } else {
            Cell::new(artifact.suffix.trim_start_matches('-')).fg(Color::Cyan)
        };
        table.add_row(vec![
            name,
            Cell::new(&artifact.key),
            Cell::new(artifact.rows),
            Cell::new(artifact.columns),
        ]);
    }
    table
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label).add_attribute(Attribute::Bold)
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

//! Export functionality for report aggregates
//!
//! Provides simple, testable export with proper error handling.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::currency::format_chf;
use crate::models::TeamConfig;
use crate::report::{FeatureAggregate, InitiativeAggregate, ReportData};

/// Export feature aggregates to CSV format matching the breakdown table
///
/// CSV columns: Key, Summary, Initiative, one column per configured team,
/// Total SP. Rows keep the report order (total points descending).
pub fn export_features_to_csv(
    features: &[FeatureAggregate],
    config: &TeamConfig,
    path: &Path,
) -> Result<()> {
    // Create parent directory if needed
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let file = File::create(path)
        .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;

    let mut writer = BufWriter::new(file);

    let team_headers: Vec<&str> = config.team_names().collect();
    writeln!(
        writer,
        "Key,Summary,Initiative,{},Total SP",
        team_headers.join(",")
    )
    .context("Failed to write CSV header")?;

    for feature in features {
        let team_cells: Vec<String> = team_headers
            .iter()
            .map(|team| {
                feature
                    .points_by_team
                    .get(*team)
                    .map(|p| format_points(*p))
                    .unwrap_or_default()
            })
            .collect();

        writeln!(
            writer,
            "\"{}\",\"{}\",\"{}\",{},{}",
            feature.key,
            escape(&feature.summary),
            escape(&feature.initiative),
            team_cells.join(","),
            format_points(feature.total_points)
        )
        .with_context(|| format!("Failed to write row for feature {}", feature.key))?;
    }

    writer.flush().context("Failed to flush CSV writer")?;

    Ok(())
}

/// Export initiative aggregates to CSV format
///
/// CSV columns: Priority, Initiative, Budget, Planned, Percent of Budget.
/// Budget and planned are formatted CHF, matching the on-screen table.
pub fn export_initiatives_to_csv(aggregates: &[InitiativeAggregate], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let file = File::create(path)
        .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;

    let mut writer = BufWriter::new(file);

    writeln!(writer, "Priority,Initiative,Budget,Planned,Percent of Budget")
        .context("Failed to write CSV header")?;

    for aggregate in aggregates {
        let priority = aggregate
            .priority
            .map(|p| p.to_string())
            .unwrap_or_else(|| "-".to_string());

        writeln!(
            writer,
            "{},\"{}\",\"{}\",\"{}\",{:.1}",
            priority,
            escape(&aggregate.name),
            format_chf(aggregate.budget),
            format_chf(aggregate.planned),
            aggregate.percent_of_budget()
        )
        .with_context(|| format!("Failed to write row for initiative {}", aggregate.name))?;
    }

    writer.flush().context("Failed to flush CSV writer")?;

    Ok(())
}

/// Export the full report as pretty-printed JSON
pub fn export_report_to_json(report: &ReportData, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let file = File::create(path)
        .with_context(|| format!("Failed to create JSON file: {}", path.display()))?;

    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, report)
        .with_context(|| format!("Failed to write JSON report: {}", path.display()))?;

    Ok(())
}

/// Trim points to one decimal, dropping a trailing ".0"
fn format_points(points: f64) -> String {
    let text = format!("{:.1}", points);
    text.strip_suffix(".0").map(str::to_string).unwrap_or(text)
}

fn escape(text: &str) -> String {
    text.replace('"', "\"\"")
}

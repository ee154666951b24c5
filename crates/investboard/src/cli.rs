//! Table rendering for the report and the planner board
//!
//! Human-facing formatters only; machine output is plain serde_json in main.

use comfy_table::{Cell, Color, ContentArrangement, Table};
use investboard_core::currency::format_chf;
use investboard_core::models::TeamConfig;
use investboard_core::planner::PlannerBoard;
use investboard_core::report::ReportData;
use std::collections::HashMap;

// ============================================================================
// Report tables
// ============================================================================

/// Render the full report: initiative table, team summary, feature breakdown
pub fn format_report(report: &ReportData, config: &TeamConfig, no_color: bool) -> String {
    let mut sections = Vec::new();

    sections.push("Roadmap Alignment".to_string());
    sections.push(format_initiative_table(report, no_color));
    sections.push(String::new());

    sections.push("Teams".to_string());
    sections.push(format_team_table(report, config, no_color));
    sections.push(format!(
        "Total Investment: {}",
        format_chf(report.total_investment)
    ));
    sections.push(String::new());

    sections.push("Detailed Breakdown".to_string());
    sections.push(format_feature_table(report, config, no_color));

    sections.join("\n")
}

fn format_initiative_table(report: &ReportData, no_color: bool) -> String {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    set_header(
        &mut table,
        vec!["Priority", "Initiative", "Roadmap", "Planned Invest", "% of Planned"],
        no_color,
    );

    for aggregate in &report.initiatives {
        let percent = aggregate.percent_of_budget();
        let percent_cell = if no_color {
            Cell::new(format!("{:.1}%", percent))
        } else {
            Cell::new(format!("{:.1}%", percent)).fg(percent_color(percent))
        };

        table.add_row(vec![
            Cell::new(
                aggregate
                    .priority
                    .map(|p| p.to_string())
                    .unwrap_or_else(|| "-".to_string()),
            ),
            Cell::new(&aggregate.name),
            Cell::new(format_chf(aggregate.budget)),
            Cell::new(format_chf(aggregate.planned)),
            percent_cell,
        ]);
    }

    table.to_string()
}

fn format_team_table(report: &ReportData, config: &TeamConfig, no_color: bool) -> String {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    set_header(
        &mut table,
        vec!["Team", "Rate (CHF/SP)", "Story Points", "Investment"],
        no_color,
    );

    for team in &report.teams {
        table.add_row(vec![
            Cell::new(&team.name),
            Cell::new(format!("{:.0}", config.cost_per_point(&team.name))),
            Cell::new(format_points(team.total_points)),
            Cell::new(format_chf(team.total_value)),
        ]);
    }

    table.to_string()
}

fn format_feature_table(report: &ReportData, config: &TeamConfig, no_color: bool) -> String {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);

    let mut header = vec!["Key", "Summary", "Initiative"];
    let team_names: Vec<&str> = config.team_names().collect();
    header.extend(team_names.iter().copied());
    header.push("Total SP");
    set_header(&mut table, header, no_color);

    for feature in &report.features {
        let mut row = vec![
            Cell::new(&feature.key),
            Cell::new(&feature.summary),
            Cell::new(&feature.initiative),
        ];
        for team in &team_names {
            let cell = feature
                .points_by_team
                .get(*team)
                .map(|p| format_points(*p))
                .unwrap_or_else(|| "-".to_string());
            row.push(Cell::new(cell));
        }
        row.push(Cell::new(format_points(feature.total_points)));
        table.add_row(row);
    }

    table.to_string()
}

// ============================================================================
// Planner board
// ============================================================================

/// Render the planner board as one table, bucket by bucket
pub fn format_planner_board(
    board: &PlannerBoard,
    feature_values: &HashMap<String, f64>,
    no_color: bool,
) -> String {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    set_header(&mut table, vec!["Bucket", "#", "Epic", "Value"], no_color);

    for initiative in &board.initiatives {
        let planned: f64 = initiative
            .epics
            .iter()
            .map(|e| feature_values.get(e).copied().unwrap_or(0.0))
            .sum();
        let label = format!(
            "{} ({}) {} / {}",
            initiative.name,
            initiative.id,
            format_chf(planned),
            format_chf(initiative.budget)
        );
        if initiative.epics.is_empty() {
            table.add_row(vec![Cell::new(&label), Cell::new("-"), Cell::new("-"), Cell::new("-")]);
        }
        for (index, epic) in initiative.epics.iter().enumerate() {
            table.add_row(vec![
                Cell::new(if index == 0 { label.as_str() } else { "" }),
                Cell::new(index.to_string()),
                Cell::new(epic),
                Cell::new(format_chf(
                    feature_values.get(epic).copied().unwrap_or(0.0),
                )),
            ]);
        }
    }

    for (index, epic) in board.unassigned_epics.iter().enumerate() {
        table.add_row(vec![
            Cell::new(if index == 0 { "unassigned" } else { "" }),
            Cell::new(index.to_string()),
            Cell::new(epic),
            Cell::new(format_chf(
                feature_values.get(epic).copied().unwrap_or(0.0),
            )),
        ]);
    }

    table.to_string()
}

// ============================================================================
// Utilities
// ============================================================================

fn set_header(table: &mut Table, names: Vec<&str>, no_color: bool) {
    if no_color {
        table.set_header(names);
    } else {
        table.set_header(
            names
                .into_iter()
                .map(|n| Cell::new(n).fg(Color::Cyan))
                .collect::<Vec<_>>(),
        );
    }
}

/// Color for a planned-vs-budget percentage
///
/// Over 110% is over budget, under 90% leaves budget on the table.
fn percent_color(percent: f64) -> Color {
    if percent > 110.0 {
        Color::Red
    } else if percent < 90.0 {
        Color::Yellow
    } else {
        Color::Green
    }
}

/// Trim points to one decimal, dropping a trailing ".0"
fn format_points(points: f64) -> String {
    let text = format!("{:.1}", points);
    text.strip_suffix(".0").map(str::to_string).unwrap_or(text)
}

// ============================================================================
// Tests
// ============================================================================

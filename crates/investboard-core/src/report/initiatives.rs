//! Initiative budget-vs-planned aggregation
//!
//! Planned value is purely derivative: the auxiliary feature→value map is
//! computed from rows, then each initiative sums the values of its assigned
//! feature keys. Nothing here feeds back into team or feature totals.

use crate::models::{Initiative, StoryRow, TeamConfig};
use crate::report::features::UNASSIGNED;
use crate::report::InitiativeFilter;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Budget vs planned view of one initiative
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitiativeAggregate {
    pub name: String,
    /// None for the synthetic "Unassigned" entry
    pub priority: Option<i64>,
    pub budget: f64,
    /// Sum of assigned features' values; missing features contribute 0
    pub planned: f64,
}

impl InitiativeAggregate {
    /// Planned as a percentage of budget; 0 when there is no budget
    pub fn percent_of_budget(&self) -> f64 {
        if self.budget > 0.0 {
            (self.planned / self.budget) * 100.0
        } else {
            0.0
        }
    }
}

/// Compute the auxiliary feature→value map
///
/// `value = points × cost-per-point`, keyed by feature instead of team.
/// Unknown teams valuate at 0 (rows with unknown teams are normally already
/// dropped at ingestion, so this is belt-and-braces for direct callers).
pub fn feature_values(rows: &[&StoryRow], config: &TeamConfig) -> HashMap<String, f64> {
    let mut values: HashMap<String, f64> = HashMap::new();
    for row in rows {
        let value = row.points * config.cost_per_point(&row.team);
        *values.entry(row.parent_key.clone()).or_insert(0.0) += value;
    }
    values
}

/// Invert initiative assignment lists into feature → initiative name
///
/// When two initiatives claim the same feature, the later one in input order
/// wins. Features absent from the map are implicitly unassigned.
pub fn epic_to_initiative(initiatives: &[Initiative]) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for initiative in initiatives {
        for epic in &initiative.assigned_epics {
            map.insert(epic.clone(), initiative.name.clone());
        }
    }
    map
}

/// Compute budget-vs-planned aggregates for all initiatives
///
/// Entries where both budget and planned are zero are dropped. The synthetic
/// "Unassigned" entry sums values of features no initiative references and
/// appears only when positive and not excluded by the filter. Output order
/// follows input order, "Unassigned" last.
pub fn aggregate_initiatives(
    rows: &[&StoryRow],
    initiatives: &[Initiative],
    config: &TeamConfig,
    filter: &InitiativeFilter,
) -> Vec<InitiativeAggregate> {
    let values = feature_values(rows, config);

    let mut aggregates: Vec<InitiativeAggregate> = initiatives
        .iter()
        .map(|initiative| InitiativeAggregate {
            name: initiative.name.clone(),
            priority: Some(initiative.priority),
            budget: initiative.budget,
            planned: initiative
                .assigned_epics
                .iter()
                .map(|epic| values.get(epic).copied().unwrap_or(0.0))
                .sum(),
        })
        .filter(|agg| agg.budget > 0.0 || agg.planned > 0.0)
        .collect();

    let assigned: HashSet<&str> = initiatives
        .iter()
        .flat_map(|i| i.assigned_epics.iter())
        .map(String::as_str)
        .collect();

    let unassigned_value: f64 = values
        .iter()
        .filter(|(key, _)| !assigned.contains(key.as_str()))
        .map(|(_, value)| value)
        .sum();

    if unassigned_value > 0.0 && matches!(filter, InitiativeFilter::All | InitiativeFilter::Unassigned) {
        aggregates.push(InitiativeAggregate {
            name: UNASSIGNED.to_string(),
            priority: None,
            budget: 0.0,
            planned: unassigned_value,
        });
    }

    match filter {
        InitiativeFilter::All => aggregates,
        InitiativeFilter::Unassigned => aggregates
            .into_iter()
            .filter(|agg| agg.name == UNASSIGNED)
            .collect(),
        InitiativeFilter::Name(name) => aggregates
            .into_iter()
            .filter(|agg| &agg.name == name)
            .collect(),
    }
}

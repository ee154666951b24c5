//! Feature and team aggregation
//!
//! One pass over the (already filtered, already validated) rows produces two
//! independent groupings: by parent feature key and by team. Features come
//! back sorted by total points descending, stable on ties; every configured
//! team appears in the team view even with zero contributing rows.

use crate::models::{StoryRow, TeamConfig};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Points and value accumulated for one sprint of one team
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SprintTotals {
    pub points: f64,
    pub value: f64,
}

/// Aggregate view of one team
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamAggregate {
    pub name: String,
    pub total_points: f64,
    /// points × cost-per-point, summed over contributing rows
    pub total_value: f64,
    /// Per-sprint breakdown, keyed by sprint name
    pub sprints: BTreeMap<String, SprintTotals>,
}

impl TeamAggregate {
    fn empty(name: &str) -> Self {
        Self {
            name: name.to_string(),
            total_points: 0.0,
            total_value: 0.0,
            sprints: BTreeMap::new(),
        }
    }
}

/// Aggregate view of one feature (parent key)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureAggregate {
    pub key: String,
    pub summary: String,
    /// Owning initiative name, or "Unassigned"
    pub initiative: String,
    /// Points contributed per team
    pub points_by_team: BTreeMap<String, f64>,
    /// Invariant: equals the sum of `points_by_team` values
    pub total_points: f64,
}

/// Name used for features no initiative claims
pub const UNASSIGNED: &str = "Unassigned";

/// Group rows by feature and by team
///
/// Rows must already have passed ingestion (sentinel parent keys substituted,
/// unknown teams and unparseable points dropped) and any active filter.
pub fn aggregate_by_team_and_feature(
    rows: &[&StoryRow],
    config: &TeamConfig,
    epic_to_initiative: &HashMap<String, String>,
) -> (Vec<FeatureAggregate>, Vec<TeamAggregate>) {
    // Features keep encounter order so the descending sort is stable on ties
    let mut features: Vec<FeatureAggregate> = Vec::new();
    let mut feature_index: HashMap<String, usize> = HashMap::new();

    let mut teams: BTreeMap<&str, TeamAggregate> = config
        .team_names()
        .map(|name| (name, TeamAggregate::empty(name)))
        .collect();

    for row in rows {
        let idx = *feature_index.entry(row.parent_key.clone()).or_insert_with(|| {
            features.push(FeatureAggregate {
                key: row.parent_key.clone(),
                summary: row.parent_summary.clone(),
                initiative: epic_to_initiative
                    .get(&row.parent_key)
                    .cloned()
                    .unwrap_or_else(|| UNASSIGNED.to_string()),
                points_by_team: BTreeMap::new(),
                total_points: 0.0,
            });
            features.len() - 1
        });

        let feature = &mut features[idx];
        *feature.points_by_team.entry(row.team.clone()).or_insert(0.0) += row.points;
        feature.total_points += row.points;
        if feature.summary.is_empty() && !row.parent_summary.is_empty() {
            feature.summary = row.parent_summary.clone();
        }

        let value = row.points * config.cost_per_point(&row.team);
        if let Some(team) = teams.get_mut(row.team.as_str()) {
            team.total_points += row.points;
            team.total_value += value;
            let sprint = team.sprints.entry(row.sprint.clone()).or_default();
            sprint.points += row.points;
            sprint.value += value;
        }
    }

    // Stable sort: equal totals keep encounter order
    features.sort_by(|a, b| {
        b.total_points
            .partial_cmp(&a.total_points)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    (features, teams.into_values().collect())
}

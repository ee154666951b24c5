//! Reporting aggregator
//!
//! Pure, synchronous computation over already-materialized rows and
//! initiatives. Filters are applied to the row set BEFORE any aggregation
//! pass; every report is recomputed from scratch, never patched.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Initiative, SkippedRows, StoryRow, TeamConfig};

pub mod features;
pub mod initiatives;


pub use features::{
    aggregate_by_team_and_feature, FeatureAggregate, SprintTotals, TeamAggregate, UNASSIGNED,
};
pub use initiatives::{
    aggregate_initiatives, epic_to_initiative, feature_values, InitiativeAggregate,
};

/// Team selection for a report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TeamFilter {
    #[default]
    All,
    Team(String),
}

impl TeamFilter {
    /// Parse a CLI/query value; "all" (any case) selects everything
    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("all") {
            TeamFilter::All
        } else {
            TeamFilter::Team(value.to_string())
        }
    }
}

/// Initiative selection for a report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum InitiativeFilter {
    #[default]
    All,
    /// Features no initiative references
    Unassigned,
    Name(String),
}

impl InitiativeFilter {
    /// Parse a CLI/query value; "all" and "unassigned" are reserved words
    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("all") {
            InitiativeFilter::All
        } else if value.eq_ignore_ascii_case(UNASSIGNED) {
            InitiativeFilter::Unassigned
        } else {
            InitiativeFilter::Name(value.to_string())
        }
    }
}

/// Combined report filter
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportFilter {
    pub team: TeamFilter,
    pub initiative: InitiativeFilter,
}

/// Complete report over one row set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportData {
    /// Feature aggregates, total points descending
    pub features: Vec<FeatureAggregate>,
    /// One entry per configured team, zero-filled when absent from the rows
    pub teams: Vec<TeamAggregate>,
    /// Budget vs planned per initiative, input order, "Unassigned" last
    pub initiatives: Vec<InitiativeAggregate>,
    /// Sum of all team values over the filtered row set
    pub total_investment: f64,
    /// Ingestion drop diagnostics for the underlying row set
    pub skipped: SkippedRows,
    /// Filter the report was computed under
    pub filter: ReportFilter,
    /// Timestamp of computation
    pub computed_at: DateTime<Utc>,
}

impl ReportData {
    /// Compute a full report
    ///
    /// Filtering is pre-aggregation: the row set is restricted first, and
    /// every aggregate is computed over the restricted set only.
    pub fn compute(
        rows: &[StoryRow],
        initiatives: &[Initiative],
        config: &TeamConfig,
        filter: &ReportFilter,
        skipped: SkippedRows,
    ) -> Self {
        let epic_map = epic_to_initiative(initiatives);

        let filtered: Vec<&StoryRow> = rows
            .iter()
            .filter(|row| match &filter.team {
                TeamFilter::All => true,
                TeamFilter::Team(team) => &row.team == team,
            })
            .filter(|row| match &filter.initiative {
                InitiativeFilter::All => true,
                InitiativeFilter::Unassigned => !epic_map.contains_key(&row.parent_key),
                InitiativeFilter::Name(name) => {
                    epic_map.get(&row.parent_key).map(String::as_str) == Some(name.as_str())
                }
            })
            .collect();

        let (features, teams) = aggregate_by_team_and_feature(&filtered, config, &epic_map);
        let initiatives =
            aggregate_initiatives(&filtered, initiatives, config, &filter.initiative);
        let total_investment = teams.iter().map(|t| t.total_value).sum();

        Self {
            features,
            teams,
            initiatives,
            total_investment,
            skipped,
            filter: filter.clone(),
            computed_at: Utc::now(),
        }
    }

    /// Total story points across the filtered row set
    pub fn total_points(&self) -> f64 {
        self.teams.iter().map(|t| t.total_points).sum()
    }
}

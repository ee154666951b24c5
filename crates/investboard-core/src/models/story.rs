//! Story row model and ingestion policy
//!
//! Raw CSV records are validated exactly once, at ingestion. Aggregation only
//! ever sees [`StoryRow`] values that already passed the policy; rows that do
//! not are dropped and counted, never surfaced as errors.

use crate::models::TeamConfig;
use serde::{Deserialize, Serialize};

/// Sentinel parent key for stories without a parent feature
pub const NO_EPIC_KEY: &str = "No Epic";

/// Sentinel parent summary paired with [`NO_EPIC_KEY`]
pub const NO_EPIC_SUMMARY: &str = "Stories without a parent feature";

/// A validated story row
///
/// `parent_key`/`parent_summary` are always populated: rows lacking a parent
/// carry the sentinel pair, substituted before any grouping so that all such
/// rows merge into one synthetic feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryRow {
    pub issue_key: String,
    pub team: String,
    pub sprint: String,
    pub points: f64,
    pub parent_key: String,
    pub parent_summary: String,
}

/// A raw record as read from the CSV, before validation
#[derive(Debug, Clone, Default)]
pub struct RawStoryRecord {
    pub issue_key: Option<String>,
    pub team: Option<String>,
    pub sprint: Option<String>,
    pub points: Option<String>,
    pub parent_key: Option<String>,
    pub parent_summary: Option<String>,
}

/// Why a raw record was dropped by the ingestion policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowSkipReason {
    /// Team column empty or not present in the team configuration
    UnknownTeam,
    /// Story points column empty or missing
    MissingPoints,
    /// Story points present but not a finite, non-negative number
    InvalidPoints,
}

impl RowSkipReason {
    pub fn label(&self) -> &'static str {
        match self {
            RowSkipReason::UnknownTeam => "unknown team",
            RowSkipReason::MissingPoints => "missing story points",
            RowSkipReason::InvalidPoints => "invalid story points",
        }
    }
}

/// One dropped record, for diagnostics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedRow {
    /// Issue key of the dropped record, empty when the column was blank too
    pub issue_key: String,
    pub reason: RowSkipReason,
}

/// Diagnostic summary of records dropped during ingestion
///
/// Dropping stays silent at the report level (best-effort policy), but the
/// counts travel with every computed report so the loss is observable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkippedRows {
    pub rows: Vec<SkippedRow>,
}

impl SkippedRows {
    pub fn record(&mut self, issue_key: impl Into<String>, reason: RowSkipReason) {
        self.rows.push(SkippedRow {
            issue_key: issue_key.into(),
            reason,
        });
    }

    pub fn count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Counts grouped by skip reason
    pub fn by_reason(&self) -> std::collections::BTreeMap<RowSkipReason, usize> {
        let mut counts = std::collections::BTreeMap::new();
        for row in &self.rows {
            *counts.entry(row.reason).or_insert(0) += 1;
        }
        counts
    }
}

impl RawStoryRecord {
    /// Apply the ingestion policy
    ///
    /// Returns the validated row, or the reason it was dropped. This is the
    /// single place row shape is decided; aggregation never re-checks.
    pub fn validate(self, config: &TeamConfig) -> Result<StoryRow, RowSkipReason> {
        let team = match self.team.as_deref().map(str::trim) {
            Some(t) if !t.is_empty() && config.contains(t) => t.to_string(),
            _ => return Err(RowSkipReason::UnknownTeam),
        };

        let points_text = match self.points.as_deref().map(str::trim) {
            Some(p) if !p.is_empty() => p,
            _ => return Err(RowSkipReason::MissingPoints),
        };
        let points: f64 = match points_text.parse() {
            Ok(p) => p,
            Err(_) => return Err(RowSkipReason::InvalidPoints),
        };
        if !points.is_finite() || points < 0.0 {
            return Err(RowSkipReason::InvalidPoints);
        }

        // Sentinel substitution happens here, before any grouping
        let (parent_key, parent_summary) = match self.parent_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => (
                key.to_string(),
                self.parent_summary.unwrap_or_default().trim().to_string(),
            ),
            _ => (NO_EPIC_KEY.to_string(), NO_EPIC_SUMMARY.to_string()),
        };

        Ok(StoryRow {
            issue_key: self.issue_key.unwrap_or_default().trim().to_string(),
            team,
            sprint: self.sprint.unwrap_or_default().trim().to_string(),
            points,
            parent_key,
            parent_summary,
        })
    }
}

//! Initiative model
//!
//! An initiative is a roadmap budget line item: a priority, an invest amount
//! in whole currency units, and the ordered list of feature (epic) keys it
//! claims. Persisted records keep `assignedEpics` as one comma-separated
//! string; that shape is preserved on the wire and split at the model edge.

use serde::{Deserialize, Serialize};

/// A roadmap budget line item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Initiative {
    pub id: String,
    pub name: String,
    /// Lower sorts first
    pub priority: i64,
    /// Budget in whole currency units
    pub budget: f64,
    /// Feature keys assigned to this initiative, in assignment order
    pub assigned_epics: Vec<String>,
}

impl Initiative {
    /// Build from the persisted record fields
    ///
    /// Malformed priority or budget text coerces to 0 rather than failing;
    /// this mirrors the best-effort policy of the reporting pipeline.
    pub fn from_record(
        id: impl Into<String>,
        name: impl Into<String>,
        priority: &str,
        budget: &str,
        assigned_epics: &str,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            priority: priority.trim().parse().unwrap_or(0),
            budget: budget.trim().parse().unwrap_or(0.0),
            assigned_epics: split_epic_list(assigned_epics),
        }
    }
}

/// Derive a stable initiative id from its position and name
///
/// Used when the source record carries no id of its own (the budget-topics
/// CSV, or planner states persisted before ids existed).
pub fn derive_id(index: usize, name: &str) -> String {
    let slug: String = name
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-");
    format!("init-{}-{}", index, slug)
}

/// Split a comma-separated epic-key list, dropping empty segments
pub fn split_epic_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Join epic keys back into the persisted comma-separated form
pub fn join_epic_list(epics: &[String]) -> String {
    epics.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_record() {
        let init = Initiative::from_record(
            "init-0",
            "Technische Improvements",
            "2",
            "122000",
            "REL-874, REL-883, REL-885",
        );
        assert_eq!(init.priority, 2);
        assert_eq!(init.budget, 122000.0);
        assert_eq!(init.assigned_epics, vec!["REL-874", "REL-883", "REL-885"]);
    }

    #[test]
    fn test_malformed_numbers_coerce_to_zero() {
        let init = Initiative::from_record("init-1", "EOL", "high", "n/a", "REL-878");
        assert_eq!(init.priority, 0);
        assert_eq!(init.budget, 0.0);
    }

    #[test]
    fn test_split_epic_list_trims_and_drops_empty() {
        assert_eq!(
            split_epic_list(" REL-1 ,REL-2,, REL-3 "),
            vec!["REL-1", "REL-2", "REL-3"]
        );
        assert!(split_epic_list("").is_empty());
        assert!(split_epic_list(" , ").is_empty());
    }

    #[test]
    fn test_derive_id() {
        assert_eq!(derive_id(2, "Technische  Improvements"), "init-2-technische-improvements");
        assert_eq!(derive_id(0, "EOL"), "init-0-eol");
    }

    #[test]
    fn test_join_round_trip() {
        let epics = vec!["REL-1".to_string(), "REL-2".to_string()];
        assert_eq!(split_epic_list(&join_epic_list(&epics)), epics);
    }
}

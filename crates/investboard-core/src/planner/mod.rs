//! Initiative planner board
//!
//! The board assigns feature (epic) keys to initiatives by moving them
//! between an "unassigned" bucket and one bucket per initiative. The move
//! reducer is pure: it never mutates the input board, and a rejected move
//! leaves the caller's state exactly as it was. Unknown buckets reject the
//! move instead of silently dropping the item.

use crate::models::Initiative;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

pub mod state;

pub use state::{load_state_or, save_state, PLANNER_STATE_KEY};

/// One initiative column on the board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannerInitiative {
    pub id: String,
    pub name: String,
    pub priority: i64,
    pub budget: f64,
    /// Epic keys currently assigned, in board order
    pub epics: Vec<String>,
}

/// The complete board state
///
/// Serialized as one JSON blob (camelCase, matching the persisted shape
/// under [`PLANNER_STATE_KEY`]).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannerBoard {
    pub initiatives: Vec<PlannerInitiative>,
    pub unassigned_epics: Vec<String>,
}

/// A bucket items can live in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "id")]
pub enum Bucket {
    Unassigned,
    Initiative(String),
}

impl Bucket {
    /// Parse a CLI/droppable identifier; "unassigned" is reserved
    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("unassigned") {
            Bucket::Unassigned
        } else {
            Bucket::Initiative(value.to_string())
        }
    }
}

impl std::fmt::Display for Bucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Bucket::Unassigned => write!(f, "unassigned"),
            Bucket::Initiative(id) => write!(f, "{}", id),
        }
    }
}

/// A position within a bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub bucket: Bucket,
    pub index: usize,
}

/// A requested move of one epic between slots
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRequest {
    pub epic: String,
    pub source: Slot,
    pub destination: Slot,
}

/// Why a move was rejected (board left unchanged)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoveError {
    #[error("Unknown bucket: {bucket}")]
    UnknownBucket { bucket: String },

    #[error("Epic '{epic}' is not at {bucket}[{index}]")]
    SourceMismatch {
        epic: String,
        bucket: String,
        index: usize,
    },
}

impl PlannerBoard {
    /// Seed a fresh board from initiatives and the known feature keys
    ///
    /// Initiatives are ordered by priority ascending (stable). Each epic
    /// lands in the bucket of the last initiative claiming it; keys no
    /// initiative claims start out unassigned, in encounter order.
    pub fn seed<I>(initiatives: &[Initiative], epic_keys: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut columns: Vec<PlannerInitiative> = initiatives
            .iter()
            .map(|initiative| PlannerInitiative {
                id: initiative.id.clone(),
                name: initiative.name.clone(),
                priority: initiative.priority,
                budget: initiative.budget,
                epics: Vec::new(),
            })
            .collect();
        columns.sort_by_key(|c| c.priority);

        // Last claim wins, consistent with the report-side inversion
        let owner_of = |epic: &str| -> Option<&str> {
            initiatives
                .iter()
                .rev()
                .find(|i| i.assigned_epics.iter().any(|e| e == epic))
                .map(|i| i.id.as_str())
        };

        for column in &mut columns {
            let id = column.id.clone();
            if let Some(initiative) = initiatives.iter().find(|i| i.id == id) {
                column.epics = initiative
                    .assigned_epics
                    .iter()
                    .filter(|epic| owner_of(epic) == Some(id.as_str()))
                    .cloned()
                    .collect();
            }
        }

        let claimed: HashSet<String> = columns
            .iter()
            .flat_map(|c| c.epics.iter().cloned())
            .collect();

        let mut seen = HashSet::new();
        let unassigned_epics = epic_keys
            .into_iter()
            .filter(|key| !claimed.contains(key) && seen.insert(key.clone()))
            .collect();

        Self {
            initiatives: columns,
            unassigned_epics,
        }
    }

    /// All epic keys currently on the board, any bucket
    pub fn epic_keys(&self) -> impl Iterator<Item = &str> {
        self.unassigned_epics
            .iter()
            .map(String::as_str)
            .chain(self.initiatives.iter().flat_map(|i| i.epics.iter().map(String::as_str)))
    }

    fn bucket_exists(&self, bucket: &Bucket) -> bool {
        match bucket {
            Bucket::Unassigned => true,
            Bucket::Initiative(id) => self.initiatives.iter().any(|i| &i.id == id),
        }
    }

    fn bucket_mut(&mut self, bucket: &Bucket) -> Option<&mut Vec<String>> {
        match bucket {
            Bucket::Unassigned => Some(&mut self.unassigned_epics),
            Bucket::Initiative(id) => self
                .initiatives
                .iter_mut()
                .find(|i| &i.id == id)
                .map(|i| &mut i.epics),
        }
    }
}

/// Apply one move to a board, producing the next board state
///
/// Pure state transition: the input board is untouched.
///
/// - identical source and destination slot: no-op, unchanged clone
/// - unknown source or destination bucket: [`MoveError::UnknownBucket`]
/// - source index out of range, or holding a different epic:
///   [`MoveError::SourceMismatch`]
/// - destination index past the end of the destination list: clamps to append
pub fn apply_move(board: &PlannerBoard, request: &MoveRequest) -> Result<PlannerBoard, MoveError> {
    if request.source == request.destination {
        return Ok(board.clone());
    }

    // Validate both buckets before touching anything
    for bucket in [&request.source.bucket, &request.destination.bucket] {
        if !board.bucket_exists(bucket) {
            return Err(MoveError::UnknownBucket {
                bucket: bucket.to_string(),
            });
        }
    }

    let mut next = board.clone();

    {
        let source = next
            .bucket_mut(&request.source.bucket)
            .expect("bucket checked above");
        if source.get(request.source.index).map(String::as_str) != Some(request.epic.as_str()) {
            return Err(MoveError::SourceMismatch {
                epic: request.epic.clone(),
                bucket: request.source.bucket.to_string(),
                index: request.source.index,
            });
        }
        source.remove(request.source.index);
    }

    let destination = next
        .bucket_mut(&request.destination.bucket)
        .expect("bucket checked above");
    let index = request.destination.index.min(destination.len());
    destination.insert(index, request.epic.clone());

    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board() -> PlannerBoard {
        PlannerBoard {
            initiatives: vec![
                PlannerInitiative {
                    id: "init-a".to_string(),
                    name: "A".to_string(),
                    priority: 0,
                    budget: 10000.0,
                    epics: vec!["REL-10".to_string()],
                },
                PlannerInitiative {
                    id: "init-b".to_string(),
                    name: "B".to_string(),
                    priority: 1,
                    budget: 20000.0,
                    epics: vec![],
                },
            ],
            unassigned_epics: vec![
                "REL-1".to_string(),
                "REL-2".to_string(),
                "REL-3".to_string(),
            ],
        }
    }

    fn request(epic: &str, from: Bucket, from_idx: usize, to: Bucket, to_idx: usize) -> MoveRequest {
        MoveRequest {
            epic: epic.to_string(),
            source: Slot {
                bucket: from,
                index: from_idx,
            },
            destination: Slot {
                bucket: to,
                index: to_idx,
            },
        }
    }

    #[test]
    fn test_move_unassigned_to_initiative_front() {
        let before = board();
        let next = apply_move(
            &before,
            &request("REL-3", Bucket::Unassigned, 2, Bucket::Initiative("init-a".into()), 0),
        )
        .unwrap();

        assert_eq!(next.unassigned_epics, vec!["REL-1", "REL-2"]);
        assert_eq!(next.initiatives[0].epics, vec!["REL-3", "REL-10"]);
        // Input board untouched
        assert_eq!(before.unassigned_epics.len(), 3);
    }

    #[test]
    fn test_identical_source_and_destination_is_noop() {
        let before = board();
        let next = apply_move(
            &before,
            &request("REL-2", Bucket::Unassigned, 1, Bucket::Unassigned, 1),
        )
        .unwrap();
        assert_eq!(next, before);
    }

    #[test]
    fn test_reorder_within_bucket() {
        let before = board();
        let next = apply_move(
            &before,
            &request("REL-1", Bucket::Unassigned, 0, Bucket::Unassigned, 2),
        )
        .unwrap();
        assert_eq!(next.unassigned_epics, vec!["REL-2", "REL-3", "REL-1"]);
    }

    #[test]
    fn test_unknown_destination_rejected() {
        let before = board();
        let err = apply_move(
            &before,
            &request("REL-1", Bucket::Unassigned, 0, Bucket::Initiative("gone".into()), 0),
        )
        .unwrap_err();
        assert_eq!(
            err,
            MoveError::UnknownBucket {
                bucket: "gone".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_source_rejected() {
        let before = board();
        let err = apply_move(
            &before,
            &request("REL-1", Bucket::Initiative("gone".into()), 0, Bucket::Unassigned, 0),
        )
        .unwrap_err();
        assert!(matches!(err, MoveError::UnknownBucket { .. }));
    }

    #[test]
    fn test_source_mismatch_rejected() {
        let before = board();
        // REL-1 is at index 0, not index 1
        let err = apply_move(
            &before,
            &request("REL-1", Bucket::Unassigned, 1, Bucket::Initiative("init-a".into()), 0),
        )
        .unwrap_err();
        assert!(matches!(err, MoveError::SourceMismatch { .. }));
    }

    #[test]
    fn test_out_of_range_source_rejected() {
        let before = board();
        let err = apply_move(
            &before,
            &request("REL-9", Bucket::Unassigned, 99, Bucket::Unassigned, 0),
        )
        .unwrap_err();
        assert!(matches!(err, MoveError::SourceMismatch { .. }));
    }

    #[test]
    fn test_destination_index_clamps_to_append() {
        let before = board();
        let next = apply_move(
            &before,
            &request("REL-1", Bucket::Unassigned, 0, Bucket::Initiative("init-b".into()), 99),
        )
        .unwrap();
        assert_eq!(next.initiatives[1].epics, vec!["REL-1"]);
    }

    #[test]
    fn test_no_epic_is_lost_or_duplicated() {
        let before = board();
        let next = apply_move(
            &before,
            &request("REL-2", Bucket::Unassigned, 1, Bucket::Initiative("init-b".into()), 0),
        )
        .unwrap();

        let mut before_keys: Vec<&str> = before.epic_keys().collect();
        let mut next_keys: Vec<&str> = next.epic_keys().collect();
        before_keys.sort_unstable();
        next_keys.sort_unstable();
        assert_eq!(before_keys, next_keys);
    }

    #[test]
    fn test_seed_orders_by_priority_and_splits_claims() {
        let initiatives = vec![
            Initiative {
                id: "init-x".to_string(),
                name: "X".to_string(),
                priority: 5,
                budget: 1000.0,
                assigned_epics: vec!["REL-1".to_string()],
            },
            Initiative {
                id: "init-y".to_string(),
                name: "Y".to_string(),
                priority: 1,
                budget: 2000.0,
                // Claims REL-1 too; as the later claimant it wins
                assigned_epics: vec!["REL-1".to_string(), "REL-2".to_string()],
            },
        ];
        let epics = vec!["REL-1".to_string(), "REL-2".to_string(), "REL-3".to_string()];
        let board = PlannerBoard::seed(&initiatives, epics);

        assert_eq!(board.initiatives[0].id, "init-y");
        assert_eq!(board.initiatives[0].epics, vec!["REL-1", "REL-2"]);
        assert!(board.initiatives[1].epics.is_empty());
        assert_eq!(board.unassigned_epics, vec!["REL-3"]);
    }

    #[test]
    fn test_bucket_parse() {
        assert_eq!(Bucket::parse("Unassigned"), Bucket::Unassigned);
        assert_eq!(Bucket::parse("init-a"), Bucket::Initiative("init-a".to_string()));
    }
}

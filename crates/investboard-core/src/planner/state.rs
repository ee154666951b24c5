//! Planner state persistence
//!
//! The board persists as one opaque JSON blob under a fixed key name. A
//! corrupt or unreadable blob is not an error: the caller supplies a fallback
//! (normally a freshly seeded board) and the damage is logged, not raised.

use crate::error::CoreError;
use crate::planner::PlannerBoard;
use std::path::Path;
use tracing::{debug, warn};

/// Fixed key name of the persisted board state
pub const PLANNER_STATE_KEY: &str = "initiative_planning";

/// Load the board state, falling back on any failure
///
/// Missing file is the normal first-run case (debug-logged); a file that
/// exists but does not parse degrades to the fallback with a warning.
pub fn load_state_or(path: &Path, fallback: PlannerBoard) -> PlannerBoard {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "No planner state yet, starting fresh");
            return fallback;
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Cannot read planner state, starting fresh");
            return fallback;
        }
    };

    match serde_json::from_str(&content) {
        Ok(board) => board,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Corrupt planner state, starting fresh");
            fallback
        }
    }
}

/// Persist the board state as a single JSON blob
pub fn save_state(path: &Path, board: &PlannerBoard) -> Result<(), CoreError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| CoreError::FileWrite {
            path: path.to_path_buf(),
            source: e,
        })?;
    }

    let json = serde_json::to_string_pretty(board).map_err(|e| CoreError::JsonParse {
        path: path.to_path_buf(),
        message: e.to_string(),
        source: e,
    })?;

    std::fs::write(path, json).map_err(|e| CoreError::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })
}

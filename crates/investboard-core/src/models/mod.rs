//! Data models for investboard

pub mod initiative;
pub mod story;
pub mod team;

pub use initiative::{derive_id, join_epic_list, split_epic_list, Initiative};
pub use story::{
    RawStoryRecord, RowSkipReason, SkippedRow, SkippedRows, StoryRow, NO_EPIC_KEY, NO_EPIC_SUMMARY,
};
pub use team::{TeamConfig, TeamRate};

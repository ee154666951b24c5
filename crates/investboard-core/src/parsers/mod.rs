//! Parsers for the data exports investboard consumes

pub mod initiatives;
pub mod stories;
pub mod topics;

pub use initiatives::InitiativeJsonParser;
pub use stories::{StoryCsvParser, StoryIngest};
pub use topics::TopicsCsvParser;

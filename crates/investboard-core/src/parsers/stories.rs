//! Story CSV parser
//!
//! Reads the sprint/story export. The delimiter is configurable per source
//! (the story export is comma-separated, other exports use semicolons) and
//! fields are addressed by header name, case-insensitively, so column order
//! does not matter. Validation runs here, once, against the team config.

use crate::error::{CoreError, LoadError, LoadReport};
use crate::models::{RawStoryRecord, SkippedRows, StoryRow, TeamConfig};
use std::path::Path;
use tracing::{debug, warn};

/// Column names of the story export
pub const COL_ISSUE_KEY: &str = "Issue key";
pub const COL_TEAM: &str = "Team";
pub const COL_SPRINT: &str = "Sprint";
pub const COL_STORY_POINTS: &str = "Story Points";
pub const COL_PARENT_KEY: &str = "Parent key";
pub const COL_PARENT_SUMMARY: &str = "Parent summary";

/// Result of one ingestion pass over a story CSV
#[derive(Debug, Clone, Default)]
pub struct StoryIngest {
    /// Rows that passed the ingestion policy
    pub rows: Vec<StoryRow>,
    /// Records dropped by the policy, with reasons
    pub skipped: SkippedRows,
    /// Total records seen (valid + skipped + malformed)
    pub records_scanned: usize,
}

/// Parser for the story CSV export
pub struct StoryCsvParser {
    delimiter: u8,
}

impl Default for StoryCsvParser {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

impl StoryCsvParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Parse and validate a story CSV file
    pub async fn parse(&self, path: &Path, config: &TeamConfig) -> Result<StoryIngest, CoreError> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CoreError::FileNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                CoreError::FileRead {
                    path: path.to_path_buf(),
                    source: e,
                }
            }
        })?;

        self.parse_text(&content, config, path)
    }

    /// Parse CSV text already in memory
    pub fn parse_text(
        &self,
        text: &str,
        config: &TeamConfig,
        path: &Path,
    ) -> Result<StoryIngest, CoreError> {
        // Strip UTF-8 BOM if present
        let text = text.trim_start_matches('\u{FEFF}');

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .delimiter(self.delimiter)
            .flexible(true)
            .from_reader(text.as_bytes());

        let headers = reader
            .headers()
            .map_err(|e| CoreError::CsvParse {
                path: path.to_path_buf(),
                message: e.to_string(),
                source: e,
            })?
            .clone();

        let column = |name: &str| -> Option<usize> {
            headers.iter().position(|h| h.trim().eq_ignore_ascii_case(name))
        };

        // Team and Story Points are the load-bearing columns; without them
        // the export is a different file, not a degraded one.
        let team_col = column(COL_TEAM).ok_or_else(|| CoreError::MissingColumn {
            path: path.to_path_buf(),
            column: COL_TEAM.to_string(),
        })?;
        let points_col = column(COL_STORY_POINTS).ok_or_else(|| CoreError::MissingColumn {
            path: path.to_path_buf(),
            column: COL_STORY_POINTS.to_string(),
        })?;
        let issue_col = column(COL_ISSUE_KEY);
        let sprint_col = column(COL_SPRINT);
        let parent_key_col = column(COL_PARENT_KEY);
        let parent_summary_col = column(COL_PARENT_SUMMARY);

        let mut ingest = StoryIngest::default();

        for result in reader.records() {
            let record = match result {
                Ok(r) => r,
                Err(e) => {
                    warn!(error = %e, "Skipping malformed CSV record");
                    ingest.records_scanned += 1;
                    continue;
                }
            };
            ingest.records_scanned += 1;

            let field = |col: Option<usize>| -> Option<String> {
                col.and_then(|i| record.get(i))
                    .map(|v| v.trim().to_string())
                    .filter(|v| !v.is_empty())
            };

            let raw = RawStoryRecord {
                issue_key: field(issue_col),
                team: field(Some(team_col)),
                sprint: field(sprint_col),
                points: field(Some(points_col)),
                parent_key: field(parent_key_col),
                parent_summary: field(parent_summary_col),
            };

            let issue_key = raw.issue_key.clone().unwrap_or_default();
            match raw.validate(config) {
                Ok(row) => ingest.rows.push(row),
                Err(reason) => {
                    debug!(issue_key = %issue_key, reason = reason.label(), "Row dropped by ingestion policy");
                    ingest.skipped.record(issue_key, reason);
                }
            }
        }

        Ok(ingest)
    }

    /// Parse with graceful degradation, recording errors in LoadReport
    pub async fn parse_graceful(
        &self,
        path: &Path,
        config: &TeamConfig,
        report: &mut LoadReport,
    ) -> Option<StoryIngest> {
        match self.parse(path, config).await {
            Ok(ingest) => {
                report.stories_loaded = true;
                report.rows_scanned += ingest.records_scanned;
                report.rows_skipped += ingest.skipped.count();
                Some(ingest)
            }
            Err(e) => {
                report.add_error(LoadError::from_core_error("stories", &e));
                None
            }
        }
    }
}

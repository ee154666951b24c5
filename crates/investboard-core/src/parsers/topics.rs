//! Budget-topics CSV parser
//!
//! The roadmap budget comes as a semicolon-delimited export with one row per
//! initiative: `Prio;Topic;Invest` plus an optional `AssignedEpics` column.
//! Rows without a topic name are skipped with a warning; malformed numbers
//! coerce to 0 per the best-effort policy.

use crate::error::{CoreError, LoadError, LoadReport};
use crate::models::{derive_id, Initiative};
use std::path::Path;
use tracing::warn;

pub const COL_PRIO: &str = "Prio";
pub const COL_TOPIC: &str = "Topic";
pub const COL_INVEST: &str = "Invest";
pub const COL_ASSIGNED_EPICS: &str = "AssignedEpics";

/// Parser for the budget-topics CSV
pub struct TopicsCsvParser {
    delimiter: u8,
}

impl Default for TopicsCsvParser {
    fn default() -> Self {
        Self { delimiter: b';' }
    }
}

impl TopicsCsvParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Parse a budget-topics CSV file into initiatives
    pub async fn parse(&self, path: &Path) -> Result<Vec<Initiative>, CoreError> {
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

        self.parse_text(&content, path)
    }

    /// Parse CSV text already in memory
    pub fn parse_text(&self, text: &str, path: &Path) -> Result<Vec<Initiative>, CoreError> {
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

        let topic_col = column(COL_TOPIC).ok_or_else(|| CoreError::MissingColumn {
            path: path.to_path_buf(),
            column: COL_TOPIC.to_string(),
        })?;
        let prio_col = column(COL_PRIO);
        let invest_col = column(COL_INVEST);
        let epics_col = column(COL_ASSIGNED_EPICS);

        let mut initiatives = Vec::new();

        for result in reader.records() {
            let record = match result {
                Ok(r) => r,
                Err(e) => {
                    warn!(error = %e, "Skipping malformed topics record");
                    continue;
                }
            };

            let field = |col: Option<usize>| -> String {
                col.and_then(|i| record.get(i))
                    .map(str::trim)
                    .unwrap_or("")
                    .to_string()
            };

            let topic = field(Some(topic_col));
            if topic.is_empty() {
                warn!("Skipping topics record without a topic name");
                continue;
            }

            initiatives.push(Initiative::from_record(
                derive_id(initiatives.len(), &topic),
                topic,
                &field(prio_col),
                &field(invest_col),
                &field(epics_col),
            ));
        }

        Ok(initiatives)
    }

    /// Parse with graceful degradation, recording errors in LoadReport
    pub async fn parse_graceful(
        &self,
        path: &Path,
        report: &mut LoadReport,
    ) -> Option<Vec<Initiative>> {
        match self.parse(path).await {
            Ok(initiatives) => {
                report.initiatives_loaded = true;
                Some(initiatives)
            }
            Err(e) => {
                report.add_error(LoadError::from_core_error("initiatives", &e));
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
Prio;Topic;Invest;AssignedEpics
0;EOL;15000;REL-878
2;Technische Improvements;122000;REL-874, REL-883
;Leftovers;abc;
";

    #[test]
    fn test_parse_text() {
        let parser = TopicsCsvParser::new();
        let initiatives = parser.parse_text(CSV, Path::new("Topics.csv")).unwrap();

        assert_eq!(initiatives.len(), 3);
        assert_eq!(initiatives[0].name, "EOL");
        assert_eq!(initiatives[0].priority, 0);
        assert_eq!(initiatives[0].budget, 15000.0);
        assert_eq!(initiatives[0].assigned_epics, vec!["REL-878"]);
        assert_eq!(initiatives[0].id, "init-0-eol");

        assert_eq!(initiatives[1].assigned_epics, vec!["REL-874", "REL-883"]);

        // Malformed numbers coerce to 0, empty epic list stays empty
        assert_eq!(initiatives[2].priority, 0);
        assert_eq!(initiatives[2].budget, 0.0);
        assert!(initiatives[2].assigned_epics.is_empty());
    }

    #[test]
    fn test_topic_column_required() {
        let parser = TopicsCsvParser::new();
        let result = parser.parse_text("Prio;Invest\n1;5000\n", Path::new("Topics.csv"));
        assert!(matches!(result, Err(CoreError::MissingColumn { .. })));
    }

    #[test]
    fn test_rows_without_topic_skipped() {
        let parser = TopicsCsvParser::new();
        let initiatives = parser
            .parse_text("Prio;Topic;Invest\n1;;5000\n2;Real;7000\n", Path::new("Topics.csv"))
            .unwrap();
        assert_eq!(initiatives.len(), 1);
        assert_eq!(initiatives[0].name, "Real");
    }
}

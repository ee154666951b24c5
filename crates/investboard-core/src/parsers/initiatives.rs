//! Initiative JSON parser
//!
//! Reads the document-database export: an array of records
//! `{ id, topic, prio, invest, assignedEpics }` where `assignedEpics` is one
//! comma-separated string. Numeric fields arrive as numbers or strings
//! depending on how the record was entered; both coerce, malformed values to 0.

use crate::error::{CoreError, LoadError, LoadReport};
use crate::models::{derive_id, split_epic_list, Initiative};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

/// Wire shape of one persisted initiative record
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InitiativeRecord {
    #[serde(default)]
    id: Option<String>,
    topic: String,
    #[serde(default)]
    prio: Value,
    #[serde(default)]
    invest: Value,
    #[serde(default)]
    assigned_epics: String,
}

fn coerce_i64(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n.as_i64().unwrap_or_else(|| n.as_f64().unwrap_or(0.0) as i64),
        Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

fn coerce_f64(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Parser for the initiative JSON export
#[derive(Debug, Default)]
pub struct InitiativeJsonParser;

impl InitiativeJsonParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse an initiative JSON file
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

    /// Parse JSON text already in memory
    pub fn parse_text(&self, text: &str, path: &Path) -> Result<Vec<Initiative>, CoreError> {
        let records: Vec<InitiativeRecord> =
            serde_json::from_str(text).map_err(|e| CoreError::JsonParse {
                path: path.to_path_buf(),
                message: e.to_string(),
                source: e,
            })?;

        Ok(records
            .into_iter()
            .enumerate()
            .map(|(index, record)| Initiative {
                id: record
                    .id
                    .filter(|id| !id.trim().is_empty())
                    .unwrap_or_else(|| derive_id(index, &record.topic)),
                name: record.topic,
                priority: coerce_i64(&record.prio),
                budget: coerce_f64(&record.invest),
                assigned_epics: split_epic_list(&record.assigned_epics),
            })
            .collect())
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

//! Data store
//!
//! Caller-owned cache for the two data sources. Both sources load
//! concurrently; aggregation never begins until both are fully materialized.
//! There is no implicit fetch-if-empty: the caller decides when to `load`
//! and when to `invalidate`, and every report is recomputed from scratch.

use crate::error::LoadReport;
use crate::models::{Initiative, StoryRow, TeamConfig};
use crate::parsers::{InitiativeJsonParser, StoryCsvParser, StoryIngest, TopicsCsvParser};
use crate::report::{ReportData, ReportFilter};
use parking_lot::RwLock;
use std::path::PathBuf;
use tracing::{info, warn};

/// Where initiative records come from
#[derive(Debug, Clone)]
pub enum InitiativeSource {
    /// Document-database JSON export
    Json(PathBuf),
    /// Semicolon-delimited budget-topics CSV
    TopicsCsv(PathBuf),
}

/// Locations and per-source delimiters of the raw data
#[derive(Debug, Clone)]
pub struct DataSources {
    pub stories_path: PathBuf,
    pub initiatives: InitiativeSource,
    /// Delimiter of the story export (comma in the standard export)
    pub story_delimiter: u8,
    /// Delimiter of the topics export (semicolon in the standard export)
    pub topics_delimiter: u8,
}

impl DataSources {
    pub fn new(stories_path: PathBuf, initiatives: InitiativeSource) -> Self {
        Self {
            stories_path,
            initiatives,
            story_delimiter: b',',
            topics_delimiter: b';',
        }
    }
}

/// Central data store for investboard
pub struct DataStore {
    sources: DataSources,
    team_config: TeamConfig,
    stories: RwLock<Option<StoryIngest>>,
    initiatives: RwLock<Option<Vec<Initiative>>>,
}

impl DataStore {
    pub fn new(sources: DataSources, team_config: TeamConfig) -> Self {
        Self {
            sources,
            team_config,
            stories: RwLock::new(None),
            initiatives: RwLock::new(None),
        }
    }

    pub fn team_config(&self) -> &TeamConfig {
        &self.team_config
    }

    /// Load both sources concurrently
    ///
    /// A source that fails to fetch or parse stays unloaded and is recorded
    /// in the report; previously loaded data for that source is dropped so a
    /// half-refreshed store can never serve a mixed report.
    pub async fn load(&self) -> LoadReport {
        let mut report = LoadReport::new();

        info!(
            stories = %self.sources.stories_path.display(),
            "Loading data sources"
        );

        let story_parser = StoryCsvParser::new().with_delimiter(self.sources.story_delimiter);
        let stories_fut = story_parser.parse(&self.sources.stories_path, &self.team_config);

        let (stories_result, initiatives_result) = match &self.sources.initiatives {
            InitiativeSource::Json(path) => {
                let parser = InitiativeJsonParser::new();
                tokio::join!(stories_fut, parser.parse(path))
            }
            InitiativeSource::TopicsCsv(path) => {
                let parser = TopicsCsvParser::new().with_delimiter(self.sources.topics_delimiter);
                tokio::join!(stories_fut, parser.parse(path))
            }
        };

        match stories_result {
            Ok(ingest) => {
                report.stories_loaded = true;
                report.rows_scanned = ingest.records_scanned;
                report.rows_skipped = ingest.skipped.count();
                if !ingest.skipped.is_empty() {
                    warn!(
                        skipped = ingest.skipped.count(),
                        "Rows dropped by ingestion policy"
                    );
                }
                *self.stories.write() = Some(ingest);
            }
            Err(e) => {
                report.add_error(crate::error::LoadError::from_core_error("stories", &e));
                *self.stories.write() = None;
            }
        }

        match initiatives_result {
            Ok(initiatives) => {
                report.initiatives_loaded = true;
                *self.initiatives.write() = Some(initiatives);
            }
            Err(e) => {
                report.add_error(crate::error::LoadError::from_core_error("initiatives", &e));
                *self.initiatives.write() = None;
            }
        }

        info!(
            stories_loaded = report.stories_loaded,
            initiatives_loaded = report.initiatives_loaded,
            rows_scanned = report.rows_scanned,
            rows_skipped = report.rows_skipped,
            "Load complete"
        );

        report
    }

    /// Drop all cached data; the next report requires a fresh `load`
    pub fn invalidate(&self) {
        *self.stories.write() = None;
        *self.initiatives.write() = None;
    }

    /// Whether both sources are materialized
    pub fn is_loaded(&self) -> bool {
        self.stories.read().is_some() && self.initiatives.read().is_some()
    }

    /// Compute a report over the cached data
    ///
    /// Returns `None` until both sources are loaded - there is no partial
    /// report. Always recomputes from scratch.
    pub fn report(&self, filter: &ReportFilter) -> Option<ReportData> {
        let stories = self.stories.read();
        let initiatives = self.initiatives.read();
        let (ingest, initiatives) = (stories.as_ref()?, initiatives.as_ref()?);

        Some(ReportData::compute(
            &ingest.rows,
            initiatives,
            &self.team_config,
            filter,
            ingest.skipped.clone(),
        ))
    }

    /// Clone of the cached initiatives, if loaded
    pub fn initiatives(&self) -> Option<Vec<Initiative>> {
        self.initiatives.read().clone()
    }

    /// Clone of the cached, validated story rows, if loaded
    pub fn story_rows(&self) -> Option<Vec<StoryRow>> {
        self.stories.read().as_ref().map(|i| i.rows.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const STORIES: &str = "\
Issue key,Team,Sprint,Story Points,Parent key,Parent summary
REL-1001,Tungsten,S1,5,REL-1,Checkout
REL-1002,Neon,S1,2,REL-1,Checkout
REL-1003,Tungsten,S1,abc,REL-2,Payments
";

    const INITIATIVES: &str = r#"[
        {"id": "a1", "topic": "EOL", "prio": 0, "invest": 15000, "assignedEpics": "REL-1"}
    ]"#;

    fn write_file(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, "{}", content).unwrap();
        path
    }

    #[tokio::test]
    async fn test_load_and_report() {
        let dir = tempfile::tempdir().unwrap();
        let stories = write_file(&dir, "stories.csv", STORIES);
        let initiatives = write_file(&dir, "initiatives.json", INITIATIVES);

        let store = DataStore::new(
            DataSources::new(stories, InitiativeSource::Json(initiatives)),
            TeamConfig::default(),
        );

        assert!(!store.is_loaded());
        assert!(store.report(&ReportFilter::default()).is_none());

        let report = store.load().await;
        assert!(report.is_complete());
        assert_eq!(report.rows_scanned, 3);
        assert_eq!(report.rows_skipped, 1);

        let data = store.report(&ReportFilter::default()).unwrap();
        assert_eq!(data.total_points(), 7.0);
        assert_eq!(data.initiatives[0].planned, 7420.0);
        assert_eq!(data.skipped.count(), 1);
    }

    #[tokio::test]
    async fn test_missing_source_means_no_report() {
        let dir = tempfile::tempdir().unwrap();
        let stories = write_file(&dir, "stories.csv", STORIES);
        let missing = dir.path().join("absent.json");

        let store = DataStore::new(
            DataSources::new(stories, InitiativeSource::Json(missing)),
            TeamConfig::default(),
        );

        let report = store.load().await;
        assert!(report.stories_loaded);
        assert!(!report.initiatives_loaded);
        assert!(report.has_errors());
        // No partial report
        assert!(store.report(&ReportFilter::default()).is_none());
    }

    #[tokio::test]
    async fn test_invalidate_clears_cache() {
        let dir = tempfile::tempdir().unwrap();
        let stories = write_file(&dir, "stories.csv", STORIES);
        let initiatives = write_file(&dir, "initiatives.json", INITIATIVES);

        let store = DataStore::new(
            DataSources::new(stories, InitiativeSource::Json(initiatives)),
            TeamConfig::default(),
        );
        store.load().await;
        assert!(store.is_loaded());

        store.invalidate();
        assert!(!store.is_loaded());
        assert!(store.report(&ReportFilter::default()).is_none());
    }

    #[tokio::test]
    async fn test_topics_csv_source() {
        let dir = tempfile::tempdir().unwrap();
        let stories = write_file(&dir, "stories.csv", STORIES);
        let topics = write_file(&dir, "Topics.csv", "Prio;Topic;Invest;AssignedEpics\n0;EOL;15000;REL-1\n");

        let store = DataStore::new(
            DataSources::new(stories, InitiativeSource::TopicsCsv(topics)),
            TeamConfig::default(),
        );
        let report = store.load().await;
        assert!(report.is_complete());

        let data = store.report(&ReportFilter::default()).unwrap();
        assert_eq!(data.initiatives[0].name, "EOL");
        assert_eq!(data.initiatives[0].planned, 7420.0);
    }
}

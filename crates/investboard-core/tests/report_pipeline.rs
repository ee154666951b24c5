//! End-to-end pipeline tests: fixtures on disk, through DataStore, to a report

use investboard_core::models::{RowSkipReason, TeamConfig, NO_EPIC_KEY, NO_EPIC_SUMMARY};
use investboard_core::report::{InitiativeFilter, TeamFilter, UNASSIGNED};
use investboard_core::{DataSources, DataStore, InitiativeSource, ReportFilter};
use std::io::Write;
use std::path::PathBuf;

const STORIES: &str = "\
Issue key,Team,Sprint,Story Points,Parent key,Parent summary
REL-1001,Tungsten,Sprint 1,5,REL-1,Checkout rework
REL-1002,Neon,Sprint 1,2,REL-1,Checkout rework
REL-1003,H1,Sprint 2,4,REL-2,Payments
REL-1004,Zn2C,Sprint 2,1,,
REL-1005,Tungsten,Sprint 2,abc,REL-2,Payments
REL-1006,Krypton,Sprint 1,3,REL-1,Checkout rework
";

const INITIATIVES: &str = r#"[
    {"id": "a1", "topic": "EOL", "prio": 0, "invest": 15000, "assignedEpics": "REL-1"},
    {"id": "a2", "topic": "smartPEP", "prio": 3, "invest": 95000, "assignedEpics": "REL-404"},
    {"id": "a3", "topic": "Dormant", "prio": 9, "invest": 0, "assignedEpics": ""}
]"#;

fn write_file(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    write!(file, "{}", content).unwrap();
    path
}

fn store(dir: &tempfile::TempDir) -> DataStore {
    let stories = write_file(dir, "stories.csv", STORIES);
    let initiatives = write_file(dir, "initiatives.json", INITIATIVES);
    DataStore::new(
        DataSources::new(stories, InitiativeSource::Json(initiatives)),
        TeamConfig::default(),
    )
}

#[tokio::test]
async fn full_report_over_fixture_files() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(&dir);

    let load = store.load().await;
    assert!(load.is_complete());
    assert_eq!(load.rows_scanned, 6);
    // "abc" points and the unknown Krypton team drop
    assert_eq!(load.rows_skipped, 2);

    let report = store.report(&ReportFilter::default()).unwrap();

    // Conservation: feature totals == team totals == valid row points
    let feature_total: f64 = report.features.iter().map(|f| f.total_points).sum();
    assert_eq!(feature_total, 12.0);
    assert_eq!(report.total_points(), 12.0);

    // Worked example: REL-1 = 5×900 + 2×1460 = 7420
    let eol = report.initiatives.iter().find(|i| i.name == "EOL").unwrap();
    assert_eq!(eol.planned, 7420.0);

    // smartPEP references a feature with no rows: planned 0, kept (budget > 0)
    let smart = report.initiatives.iter().find(|i| i.name == "smartPEP").unwrap();
    assert_eq!(smart.planned, 0.0);

    // Dormant has budget 0 and planned 0: suppressed
    assert!(report.initiatives.iter().all(|i| i.name != "Dormant"));

    // Unassigned pseudo-initiative picks up REL-2 and the sentinel feature
    let unassigned = report.initiatives.iter().find(|i| i.name == UNASSIGNED).unwrap();
    assert_eq!(unassigned.planned, 4.0 * 1270.0 + 1.0 * 1280.0);

    // Sentinel feature present exactly once, with the fixed summary
    let sentinels: Vec<_> = report.features.iter().filter(|f| f.key == NO_EPIC_KEY).collect();
    assert_eq!(sentinels.len(), 1);
    assert_eq!(sentinels[0].summary, NO_EPIC_SUMMARY);

    // Skip diagnostics distinguish the two drop reasons
    let by_reason = report.skipped.by_reason();
    assert_eq!(by_reason[&RowSkipReason::InvalidPoints], 1);
    assert_eq!(by_reason[&RowSkipReason::UnknownTeam], 1);
}

#[tokio::test]
async fn filters_compose_through_the_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(&dir);
    store.load().await;

    let filter = ReportFilter {
        team: TeamFilter::Team("Tungsten".to_string()),
        initiative: InitiativeFilter::Name("EOL".to_string()),
    };
    let report = store.report(&filter).unwrap();

    assert_eq!(report.features.len(), 1);
    assert_eq!(report.features[0].key, "REL-1");
    assert_eq!(report.total_points(), 5.0);
    assert_eq!(report.total_investment, 4500.0);
}

#[tokio::test]
async fn reload_after_invalidate_recomputes() {
    let dir = tempfile::tempdir().unwrap();
    let stories = write_file(&dir, "stories.csv", STORIES);
    let initiatives = write_file(&dir, "initiatives.json", INITIATIVES);
    let store = DataStore::new(
        DataSources::new(stories.clone(), InitiativeSource::Json(initiatives)),
        TeamConfig::default(),
    );

    store.load().await;
    let before = store.report(&ReportFilter::default()).unwrap();
    assert_eq!(before.total_points(), 12.0);

    // Rewrite the story file and refresh explicitly
    let mut file = std::fs::File::create(&stories).unwrap();
    write!(
        file,
        "Issue key,Team,Sprint,Story Points,Parent key,Parent summary\n\
         REL-2001,Neon,Sprint 3,10,REL-7,New scope\n"
    )
    .unwrap();

    store.invalidate();
    assert!(store.report(&ReportFilter::default()).is_none());

    store.load().await;
    let after = store.report(&ReportFilter::default()).unwrap();
    assert_eq!(after.total_points(), 10.0);
    assert_eq!(after.features[0].key, "REL-7");
}

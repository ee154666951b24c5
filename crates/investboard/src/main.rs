//! investboard - Sprint budget reporting from story exports

mod cli;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use investboard_core::models::TeamConfig;
use investboard_core::planner::{
    apply_move, load_state_or, save_state, Bucket, MoveRequest, PlannerBoard, Slot,
    PLANNER_STATE_KEY,
};
use investboard_core::report::{InitiativeFilter, TeamFilter};
use investboard_core::{
    export_features_to_csv, export_initiatives_to_csv, export_report_to_json, DataSources,
    DataStore, InitiativeSource, ReportFilter,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "investboard",
    version,
    about = "Sprint budget reporting from story exports",
    long_about = "Joins a sprint/story CSV export against roadmap initiatives and renders\n\
                  budget-vs-planned tables, team summaries, and a feature breakdown.\n\
                  \n\
                  Examples:\n\
                    investboard report                               # Full report as tables\n\
                    investboard report --team Tungsten               # One team only\n\
                    investboard report --initiative Unassigned       # Features nobody claims\n\
                    investboard report --json                        # Machine output\n\
                    investboard export report --out report.json      # Full JSON dump\n\
                    investboard planner show                         # Current board\n\
                    investboard planner move --epic REL-1 \\\n\
                        --from unassigned --from-index 0 \\\n\
                        --to init-0-eol --to-index 0                 # Assign an epic\n\
                  \n\
                  Environment Variables:\n\
                    INVESTBOARD_STORIES                  # Story CSV path\n\
                    INVESTBOARD_INITIATIVES              # Initiative JSON path\n\
                    INVESTBOARD_TOPICS                   # Budget-topics CSV path\n\
                    INVESTBOARD_RATES                    # Team rates TOML path\n\
                    INVESTBOARD_NO_COLOR                 # Disable ANSI colors"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to the story CSV export
    #[arg(long, env = "INVESTBOARD_STORIES", default_value = "PI261_Stories.csv")]
    stories: PathBuf,

    /// Path to the initiative JSON export (document-database dump)
    #[arg(long, env = "INVESTBOARD_INITIATIVES")]
    initiatives: Option<PathBuf>,

    /// Path to the budget-topics CSV (used when no JSON export is given)
    #[arg(long, env = "INVESTBOARD_TOPICS", default_value = "Topics.csv")]
    topics: PathBuf,

    /// Path to a team rates TOML file (defaults to the embedded rates)
    #[arg(long, env = "INVESTBOARD_RATES")]
    rates: Option<PathBuf>,

    /// Delimiter of the story CSV
    #[arg(long, default_value = ",", value_parser = parse_delimiter)]
    story_delimiter: u8,

    /// Delimiter of the budget-topics CSV
    #[arg(long, default_value = ";", value_parser = parse_delimiter)]
    topics_delimiter: u8,

    /// Disable ANSI colors (log-friendly)
    #[arg(long, env = "INVESTBOARD_NO_COLOR")]
    no_color: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Print the budget-vs-planned report as tables
    Report {
        /// Restrict to one team (default: all)
        #[arg(long)]
        team: Option<String>,
        /// Restrict to one initiative by name, or "Unassigned"
        #[arg(long)]
        initiative: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write report aggregates to a file
    Export {
        /// What to export
        #[command(subcommand)]
        what: ExportTarget,
    },
    /// Inspect and edit the initiative planner board
    Planner {
        #[command(subcommand)]
        action: PlannerAction,
        /// Path of the persisted board state
        #[arg(long, env = "INVESTBOARD_PLANNER_STATE")]
        state: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum ExportTarget {
    /// Feature breakdown as CSV
    Features {
        #[arg(long)]
        out: PathBuf,
    },
    /// Initiative budget table as CSV
    Initiatives {
        #[arg(long)]
        out: PathBuf,
    },
    /// Full report as pretty JSON
    Report {
        #[arg(long)]
        out: PathBuf,
    },
}

#[derive(Subcommand)]
enum PlannerAction {
    /// Print the current board
    Show,
    /// Move an epic between buckets
    Move {
        /// Epic key to move
        #[arg(long)]
        epic: String,
        /// Source bucket: "unassigned" or an initiative id
        #[arg(long)]
        from: String,
        /// Position of the epic in the source bucket
        #[arg(long)]
        from_index: usize,
        /// Destination bucket: "unassigned" or an initiative id
        #[arg(long)]
        to: String,
        /// Position to insert at in the destination bucket
        #[arg(long)]
        to_index: usize,
    },
    /// Discard the saved board and reseed it from the data sources
    Reset,
}

fn parse_delimiter(value: &str) -> Result<u8, String> {
    let mut bytes = value.bytes();
    match (bytes.next(), bytes.next()) {
        (Some(b), None) => Ok(b),
        _ => Err("delimiter must be a single ASCII character".to_string()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let team_config = match &cli.rates {
        Some(path) => TeamConfig::from_toml_file(path)
            .with_context(|| format!("Failed to load team rates from {}", path.display()))?,
        None => TeamConfig::default(),
    };

    let initiative_source = match &cli.initiatives {
        Some(path) => InitiativeSource::Json(path.clone()),
        None => InitiativeSource::TopicsCsv(cli.topics.clone()),
    };

    let mut sources = DataSources::new(cli.stories.clone(), initiative_source);
    sources.story_delimiter = cli.story_delimiter;
    sources.topics_delimiter = cli.topics_delimiter;

    let store = DataStore::new(sources, team_config);
    let no_color = cli.no_color;

    match cli.command {
        Command::Report {
            team,
            initiative,
            json,
        } => {
            let filter = build_filter(team, initiative);
            load_store(&store, json).await?;
            let report = store
                .report(&filter)
                .context("Report unavailable: a data source failed to load")?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", cli::format_report(&report, store.team_config(), no_color));
            }
        }
        Command::Export { what } => {
            load_store(&store, true).await?;
            let report = store
                .report(&ReportFilter::default())
                .context("Report unavailable: a data source failed to load")?;

            let out = match what {
                ExportTarget::Features { out } => {
                    export_features_to_csv(&report.features, store.team_config(), &out)?;
                    out
                }
                ExportTarget::Initiatives { out } => {
                    export_initiatives_to_csv(&report.initiatives, &out)?;
                    out
                }
                ExportTarget::Report { out } => {
                    export_report_to_json(&report, &out)?;
                    out
                }
            };
            println!("Exported to {}", out.display());
        }
        Command::Planner { action, state } => {
            let state_path = state
                .or_else(default_state_path)
                .context("Could not determine a planner state path; pass --state")?;
            run_planner(&store, action, &state_path, no_color).await?;
        }
    }

    Ok(())
}

fn build_filter(team: Option<String>, initiative: Option<String>) -> ReportFilter {
    ReportFilter {
        team: team
            .map(|t| TeamFilter::parse(&t))
            .unwrap_or(TeamFilter::All),
        initiative: initiative
            .map(|i| InitiativeFilter::parse(&i))
            .unwrap_or(InitiativeFilter::All),
    }
}

fn default_state_path() -> Option<PathBuf> {
    dirs::data_dir().map(|d| {
        d.join("investboard")
            .join(format!("{}.json", PLANNER_STATE_KEY))
    })
}

/// Load both sources, with a spinner unless producing machine output
async fn load_store(store: &DataStore, quiet: bool) -> Result<()> {
    let spinner = if quiet {
        None
    } else {
        let spinner = indicatif::ProgressBar::new_spinner();
        spinner.set_style(
            indicatif::ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .expect("static template"),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        spinner.set_message("Loading stories and initiatives...");
        Some(spinner)
    };

    let report = store.load().await;

    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    tracing::debug!(
        rows_scanned = report.rows_scanned,
        rows_skipped = report.rows_skipped,
        "Sources loaded"
    );

    for warning in report.warnings() {
        eprintln!("warning: {}: {}", warning.source, warning.message);
    }

    if !report.is_complete() {
        eprintln!("Failed to load data:");
        for error in report.errors.iter() {
            eprintln!("  - {}: {}", error.source, error.message);
            if let Some(suggestion) = &error.suggestion {
                eprintln!("    hint: {}", suggestion);
            }
        }
        bail!("data load failed");
    }

    if report.rows_skipped > 0 {
        eprintln!(
            "note: {} of {} rows dropped by the ingestion policy (run 'report --json' for details)",
            report.rows_skipped, report.rows_scanned
        );
    }

    Ok(())
}

/// Seed a fresh board from the loaded sources
fn seed_board(store: &DataStore) -> Result<PlannerBoard> {
    let initiatives = store
        .initiatives()
        .context("Initiatives unavailable for seeding the planner board")?;
    let rows = store
        .story_rows()
        .context("Stories unavailable for seeding the planner board")?;

    // Feature keys in encounter order, deduplicated by seed()
    let epic_keys = rows.iter().map(|r| r.parent_key.clone());
    Ok(PlannerBoard::seed(&initiatives, epic_keys.collect::<Vec<_>>()))
}

async fn run_planner(
    store: &DataStore,
    action: PlannerAction,
    state_path: &PathBuf,
    no_color: bool,
) -> Result<()> {
    load_store(store, true).await?;
    let seeded = seed_board(store)?;

    match action {
        PlannerAction::Show => {
            let board = load_state_or(state_path, seeded);
            let rows = store.story_rows().unwrap_or_default();
            let refs: Vec<_> = rows.iter().collect();
            let values =
                investboard_core::report::feature_values(&refs, store.team_config());
            println!("{}", cli::format_planner_board(&board, &values, no_color));
        }
        PlannerAction::Move {
            epic,
            from,
            from_index,
            to,
            to_index,
        } => {
            let board = load_state_or(state_path, seeded);
            let request = MoveRequest {
                epic,
                source: Slot {
                    bucket: Bucket::parse(&from),
                    index: from_index,
                },
                destination: Slot {
                    bucket: Bucket::parse(&to),
                    index: to_index,
                },
            };

            let next = apply_move(&board, &request)
                .map_err(|e| anyhow::anyhow!("Move rejected: {}", e))?;
            save_state(state_path, &next)?;
            println!(
                "Moved {} from {}[{}] to {}[{}]",
                request.epic,
                request.source.bucket,
                request.source.index,
                request.destination.bucket,
                request.destination.index
            );
        }
        PlannerAction::Reset => {
            save_state(state_path, &seeded)?;
            println!("Planner board reset to {}", state_path.display());
        }
    }

    Ok(())
}

use std::path::PathBuf;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};

mod aggregate;
mod config;
mod dedupe;
mod error;
mod export;
mod logging;
mod models;
mod normalize;
mod pipeline;
mod reconcile;
mod report;
mod select;
mod source;

use aggregate::GroupOrder;
use config::TrackerConfig;
use export::ExportOutcome;
use reconcile::ReconcileScope;
use select::Selection;
use source::ConfiguredSource;

#[derive(Parser)]
#[command(name = "eval-tracker")]
#[command(about = "Evaluation completion tracker across factories", long_about = None)]
struct Cli {
    /// TOML file listing the sources of each factory
    #[arg(long, global = true, env = "EVAL_TRACKER_CONFIG", default_value = "eval-tracker.toml")]
    config: PathBuf,
    /// Factory key, overrides detection from --location
    #[arg(long, global = true)]
    factory: Option<String>,
    /// Page path used to detect the factory, e.g. /karawang/index.html
    #[arg(long, global = true, env = "EVAL_TRACKER_LOCATION")]
    location: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the current factory and its sheets
    Factory,
    /// Count unique names per department in a sheet
    SheetSummary {
        #[arg(long)]
        sheet: String,
    },
    /// Export unique names of a sheet grouped by department
    ExportDetail {
        #[arg(long)]
        sheet: String,
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
    /// Export names entered more than once in a sheet
    ExportDoubles {
        #[arg(long)]
        sheet: String,
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
    /// Reconcile employees against submissions
    Status {
        #[arg(long)]
        department: Option<String>,
        #[arg(long, value_enum, default_value_t = Selection::All)]
        show: Selection,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Completion per department
    Departments {
        /// Keep departments in order of first appearance
        #[arg(long)]
        first_seen: bool,
        /// Also export the summary as CSV into this directory
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
    /// Export reconciled statuses as CSV
    ExportStatus {
        #[arg(long)]
        department: Option<String>,
        #[arg(long, value_enum, default_value_t = Selection::Pending)]
        show: Selection,
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
    /// Generate a markdown report
    Report {
        #[arg(long)]
        department: Option<String>,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Submit an evaluation to the factory endpoint
    Submit {
        /// Form field as key=value, repeatable
        #[arg(long = "field", value_parser = parse_field, required = true)]
        fields: Vec<(String, String)>,
    },
}

fn parse_field(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(key, value)| (key.trim().to_string(), value.to_string()))
        .filter(|(key, _)| !key.is_empty())
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))
}

fn print_outcome(outcome: ExportOutcome) {
    match outcome {
        ExportOutcome::Written { path, rows } => {
            println!("Exported {rows} rows to {}.", path.display())
        }
        ExportOutcome::NothingToExport => println!("No data to export."),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_logging();
    let cli = Cli::parse();

    let config = TrackerConfig::load(&cli.config)
        .with_context(|| format!("failed to load config from {}", cli.config.display()))?;
    let factory = config.resolve_factory(cli.factory.as_deref(), cli.location.as_deref())?;
    let key = factory.key.clone();
    let source = ConfiguredSource::new(factory, config.request_timeout_secs)?;

    match cli.command {
        Commands::Factory => {
            println!("Factory: {}", key.to_uppercase());
            println!("Available sheets: {}", source.factory().sheet_names().join(", "));
        }
        Commands::SheetSummary { sheet } => {
            let records = pipeline::fetch_sheet(&source, &key, &sheet).await?;
            let counts = aggregate::unique_name_counts(&records);

            if counts.is_empty() {
                println!("No complete rows in sheet {sheet}.");
                return Ok(());
            }

            println!("Unique names per department in {sheet}:");
            for entry in &counts {
                println!("- {}: {}", entry.department, entry.count);
            }
        }
        Commands::ExportDetail { sheet, out_dir } => {
            let records = pipeline::fetch_sheet(&source, &key, &sheet).await?;
            let view = select::department_detail_view(&key, &sheet, &records);
            print_outcome(export::write_view(&out_dir, view.as_ref())?);
        }
        Commands::ExportDoubles { sheet, out_dir } => {
            let records = pipeline::fetch_sheet(&source, &key, &sheet).await?;
            let view = select::double_input_view(&key, &sheet, &records);
            print_outcome(export::write_view(&out_dir, view.as_ref())?);
        }
        Commands::Status {
            department,
            show,
            limit,
        } => {
            let scope = ReconcileScope::new(&key).with_department(department);
            let statuses = pipeline::load_statuses(&source, &scope).await?;
            let stats = select::summary_stats(&statuses);

            println!(
                "{} of {} employees done ({}%), {} pending",
                stats.done, stats.total, stats.percent, stats.pending
            );

            let selected = select::select(&statuses, show);
            if selected.is_empty() {
                println!("No {show} employees.");
                return Ok(());
            }

            for status in selected.iter().take(limit) {
                println!(
                    "- [{}] {} ({}, {}) value {} at {}",
                    status.status,
                    status.name,
                    status.identifier,
                    status.department,
                    status.value_label(),
                    status.timestamp_label()
                );
            }
        }
        Commands::Departments { first_seen, out_dir } => {
            let statuses = pipeline::load_statuses(&source, &ReconcileScope::new(&key)).await?;
            let order = if first_seen {
                GroupOrder::FirstSeen
            } else {
                GroupOrder::Alphabetical
            };
            let summaries = aggregate::department_summary(&statuses, order);

            if summaries.is_empty() {
                println!("No employees found.");
                return Ok(());
            }

            for summary in &summaries {
                println!(
                    "- {}: {} total, {} done, {} pending",
                    summary.department, summary.total, summary.done, summary.pending
                );
            }

            if let Some(dir) = out_dir {
                let view = select::department_summary_view(&key, &summaries);
                print_outcome(export::write_view(&dir, view.as_ref())?);
            }
        }
        Commands::ExportStatus {
            department,
            show,
            out_dir,
        } => {
            let scope = ReconcileScope::new(&key).with_department(department);
            let statuses = pipeline::load_statuses(&source, &scope).await?;
            let view = select::status_view(&key, show, &statuses);
            print_outcome(export::write_view(&out_dir, view.as_ref())?);
        }
        Commands::Report { department, out } => {
            let scope = ReconcileScope::new(&key).with_department(department);
            let (employees, submissions) = pipeline::fetch_roster(&source, &key).await?;
            let statuses = reconcile::reconcile(&employees, &submissions, &scope);
            let report = report::build_report(
                &key,
                scope.department.as_deref(),
                Utc::now().date_naive(),
                &statuses,
                &submissions,
            );
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::Submit { fields } => {
            let location = source.factory().submit_location()?;
            let ack = source::submit(source.client(), location, &fields).await?;
            println!("{}", serde_json::to_string_pretty(&ack)?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields_split_on_first_equals() {
        assert_eq!(
            parse_field("nik=1001").unwrap(),
            ("nik".to_string(), "1001".to_string())
        );
        assert_eq!(
            parse_field("note=a=b").unwrap(),
            ("note".to_string(), "a=b".to_string())
        );
        assert!(parse_field("=oops").is_err());
        assert!(parse_field("novalue").is_err());
    }

    #[test]
    fn cli_parses_status_options() {
        let cli = Cli::try_parse_from([
            "eval-tracker",
            "--factory",
            "karawang",
            "status",
            "--show",
            "pending",
            "--department",
            "Paint",
        ])
        .unwrap();
        assert_eq!(cli.factory.as_deref(), Some("karawang"));
        match cli.command {
            Commands::Status { department, show, limit } => {
                assert_eq!(department.as_deref(), Some("Paint"));
                assert_eq!(show, Selection::Pending);
                assert_eq!(limit, 20);
            }
            _ => panic!("expected status command"),
        }
    }
}

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand, ValueEnum};
use grid_ragent::{ChromeDriver, Config, DeleteOutcome, PageDriver, SnapshotDriver, Table};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;
use url::Url;

#[derive(Parser)]
#[command(name = "grid-ragent", about = "Read and drive web data tables")]
struct Cli {
    /// JSON config file; defaults apply to anything it leaves out.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Extra header mapping entries, e.g. `--map Status=disabled`.
    #[arg(long = "map", value_name = "LABEL=KEY", global = true)]
    mappings: Vec<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Dump a table from a saved HTML page.
    Inspect {
        #[arg(long)]
        html: PathBuf,
        #[arg(long)]
        container: String,
    },
    /// Drive a table on a live page in Chrome.
    Live {
        #[arg(long)]
        url: String,
        #[arg(long)]
        container: String,
        /// Save a PNG of the page after the action.
        #[arg(long)]
        screenshot: Option<PathBuf>,
        #[command(subcommand)]
        action: LiveAction,
    },
}

#[derive(Subcommand)]
enum LiveAction {
    /// Print every row.
    Dump,
    /// Sort by a column, then print the rows.
    Sort {
        column: String,
        #[arg(long)]
        descending: bool,
    },
    /// Filter, then print the key column of what is left.
    Filter { query: String },
    ClearFilter,
    /// List the labels of a row's action menu.
    Actions { row: String },
    Delete {
        row: String,
        #[arg(long, value_enum, default_value_t = OutcomeArg::Commit)]
        outcome: OutcomeArg,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutcomeArg {
    Commit,
    Cancel,
    Dismiss,
}

impl From<OutcomeArg> for DeleteOutcome {
    fn from(arg: OutcomeArg) -> Self {
        match arg {
            OutcomeArg::Commit => DeleteOutcome::Commit,
            OutcomeArg::Cancel => DeleteOutcome::Cancel,
            OutcomeArg::Dismiss => DeleteOutcome::Dismiss,
        }
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Config::default(),
    };

    for entry in &cli.mappings {
        let (label, key) = entry
            .split_once('=')
            .ok_or_else(|| anyhow!("mapping '{}' is not LABEL=KEY", entry))?;
        config
            .header_mapping
            .insert(label.trim().to_string(), key.trim().to_string());
    }

    Ok(config)
}

async fn report<D: PageDriver>(table: &Table<D>) -> anyhow::Result<serde_json::Value> {
    Ok(json!({
        "captured_at": chrono::Utc::now().to_rfc3339(),
        "count_label": table.try_count_label().await?,
        "headers": table.headers().await?,
        "current_sort": table.current_sort().await?,
        "rows": table.table().await?,
    }))
}

fn print(value: &serde_json::Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match &cli.command {
        Command::Inspect { html, container } => {
            let driver = SnapshotDriver::from_file(html)
                .with_context(|| format!("reading {}", html.display()))?;
            let table = Table::new(Arc::new(driver), container, &config)?;
            print(&report(&table).await?)?;
        }
        Command::Live {
            url,
            container,
            screenshot,
            action,
        } => {
            let url = Url::parse(url).with_context(|| format!("invalid url '{}'", url))?;
            let driver = ChromeDriver::launch(&config).await?;
            driver.navigate(&url).await?;
            info!("Session {} opened {}", driver.session_id(), url);

            let table = Table::new(Arc::new(driver), container, &config)?;
            run_live(&table, action).await?;

            if let Some(path) = screenshot {
                let png = table.driver().screenshot_png().await?;
                std::fs::write(path, png)
                    .with_context(|| format!("writing screenshot to {}", path.display()))?;
                info!("Screenshot saved to {}", path.display());
            }
        }
    }

    Ok(())
}

async fn run_live<D: PageDriver>(table: &Table<D>, action: &LiveAction) -> anyhow::Result<()> {
    match action {
        LiveAction::Dump => print(&report(table).await?)?,
        LiveAction::Sort { column, descending } => {
            let clicks = table.sort_by(column, !descending).await?;
            info!("Sorted '{}' with {} header clicks", column, clicks);
            print(&report(table).await?)?;
        }
        LiveAction::Filter { query } => {
            let keys = table.filter(query).await?.collect().await?;
            print(&json!({ "query": query, "rows": keys }))?;
        }
        LiveAction::ClearFilter => {
            table.clear_filter().await?;
            print(&json!({ "row_count": table.row_count().await? }))?;
        }
        LiveAction::Actions { row } => {
            let labels = table.actions(row).await?;
            print(&json!({ "row": row, "actions": labels }))?;
        }
        LiveAction::Delete { row, outcome } => {
            let state = table.delete_row(row, (*outcome).into()).await?;
            print(&json!({
                "row": row,
                "state": state,
                "row_retained": state.row_retained(),
            }))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delete_outcome(args: &[&str]) -> OutcomeArg {
        let mut argv = vec!["grid-ragent", "live", "--url", "http://localhost/inputs", "--container", "#inputs", "delete", "input_a"];
        argv.extend_from_slice(args);
        match Cli::try_parse_from(argv).unwrap().command {
            Command::Live {
                action: LiveAction::Delete { outcome, .. },
                ..
            } => outcome,
            _ => panic!("expected a delete action"),
        }
    }

    #[test]
    fn delete_commits_unless_told_otherwise() {
        assert_eq!(delete_outcome(&[]), OutcomeArg::Commit);
        assert_eq!(DeleteOutcome::from(delete_outcome(&[])), DeleteOutcome::default());
        assert_eq!(delete_outcome(&["--outcome", "dismiss"]), OutcomeArg::Dismiss);
    }

    #[test]
    fn mapping_flags_extend_the_config() {
        let cli = Cli::try_parse_from([
            "grid-ragent", "inspect", "--html", "page.html", "--container", "#inputs", "--map", "Status=disabled",
        ])
        .unwrap();
        let config = load_config(&cli).unwrap();
        assert_eq!(config.header_mapping.get("Status").map(String::as_str), Some("disabled"));

        let bad = Cli::try_parse_from([
            "grid-ragent", "inspect", "--html", "page.html", "--container", "#inputs", "--map", "Status",
        ])
        .unwrap();
        assert!(load_config(&bad).is_err());
    }
}

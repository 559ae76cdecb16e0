use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use comic_back_db::{Catalog, MemoryCatalog, MongoCatalog};
use comic_back_init::{verify, Plan};
use comic_back_kernel::settings::{DatabaseSettings, Settings};
use serde::Serialize;
use serde_json::json;

/// Create the comic-back database principals and collections on a fresh volume.
#[derive(Parser, Debug)]
#[command(name = "comic-back-init", version)]
struct Cli {
    /// Directory holding base.toml and <env>.toml (defaults to ./config).
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply the bootstrap once. This is the default.
    Run {
        /// Apply against an in-memory catalog and print what would be written.
        #[arg(long)]
        dry_run: bool,
    },
    /// Print the bootstrap steps as JSON without connecting.
    Plan,
    /// Check that the database holds the bootstrapped layout.
    Verify,
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("failed to render output")?;
    println!("{rendered}");
    Ok(())
}

async fn connect(settings: &DatabaseSettings) -> anyhow::Result<MongoCatalog> {
    comic_back_db::connect(&settings.uri, &settings.connect_options())
        .await
        .context("failed to configure the database client")
}

async fn run(plan: &Plan, catalog: &dyn Catalog) -> anyhow::Result<()> {
    let report = plan.bootstrap().run(catalog).await?;
    tracing::info!(
        engine = report.engine,
        database = ?report.database,
        steps = report.completed.len(),
        "comic-back bootstrap finished"
    );
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings =
        Settings::load(cli.config_dir).with_context(|| "failed to load comic-back settings")?;
    comic_back_telemetry::init(&settings.telemetry)?;

    tracing::debug!(env = ?settings.environment, "settings loaded");

    let plan = Plan::comic_back();

    match cli.command.unwrap_or(Command::Run { dry_run: false }) {
        Command::Plan => print_json(&plan.bootstrap().describe()),
        Command::Run { dry_run: true } => {
            let catalog = MemoryCatalog::new();
            let report = plan.bootstrap().run(&catalog).await?;
            let journal = catalog.journal().await;
            print_json(&json!({ "report": report, "journal": journal }))
        }
        Command::Run { dry_run: false } => {
            let catalog = connect(&settings.database).await?;
            run(&plan, &catalog).await
        }
        Command::Verify => {
            let catalog = connect(&settings.database).await?;
            let report = verify(&catalog, &plan)
                .await
                .context("failed to read the database catalog")?;
            print_json(&report)?;

            let failed = report.failures().count();
            if failed > 0 {
                bail!("{failed} verification check(s) failed");
            }
            Ok(())
        }
    }
}

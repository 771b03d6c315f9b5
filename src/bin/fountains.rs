use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use fountain_import::database_ops::{db::Db, placeholders, schema, stats, store::PgFountainStore};
use fountain_import::ingest::importer::DEFAULT_BATCH_SIZE;
use fountain_import::ingest::source::read_records;
use fountain_import::ingest::{ImportOptions, Importer};
use fountain_import::logging::{init_tracing, DEFAULT_FILTER};
use fountain_import::util::env as env_util;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "fountains", version, about = "Fountain spreadsheet import CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
#[command(rename_all = "kebab-case")]
enum Commands {
    /// Import a CSV or spreadsheet export into the fountains table
    Import(ImportArgs),
    /// Print the first parsed rows and detected headers of a source file
    Preview {
        /// CSV or workbook to inspect
        path: PathBuf,
        /// Number of rows to print
        #[arg(long, default_value_t = 10)]
        count: usize,
    },
    /// Run the idempotent fountains schema patches and print each outcome
    FixSchema {
        /// Optional override for the database URL
        #[arg(long)]
        db_url: Option<String>,
    },
    /// Rewrite legacy `<id>-fountain.jpg` / `<id>-cup.jpg` placeholders to the underscore form
    RenamePlaceholders {
        /// Optional override for the database URL
        #[arg(long)]
        db_url: Option<String>,
    },
    /// Print fountain row counts (connectivity check)
    Stats {
        /// Optional override for the database URL
        #[arg(long)]
        db_url: Option<String>,
    },
}

#[derive(Args, Debug)]
struct ImportArgs {
    /// CSV or workbook (.xlsx/.xls/.ods; first sheet only)
    path: PathBuf,
    /// Transform and print up to 10 records without touching the database
    #[arg(long, default_value_t = false)]
    dry_run: bool,
    /// Rows per insert batch (default: IMPORT_BATCH_SIZE or 500)
    #[arg(long)]
    batch_size: Option<usize>,
    /// Optional override for the database URL
    #[arg(long)]
    db_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_util::init_env();
    init_tracing(DEFAULT_FILTER)?;

    let cli = Cli::parse();
    match cli.command {
        Commands::Import(args) => import(args).await,
        Commands::Preview { path, count } => preview(path, count),
        Commands::FixSchema { db_url } => {
            let db = connect(db_url, 1).await?;
            let reports = schema::reconcile(&mut schema::PoolTarget(&db.pool)).await;
            db.close().await;
            println!("{}", serde_json::to_string_pretty(&reports)?);
            Ok(())
        }
        Commands::RenamePlaceholders { db_url } => {
            let db = connect(db_url, 1).await?;
            let updated = placeholders::migrate_dash_placeholders(&db).await;
            db.close().await;
            println!("rows updated: {}", updated?);
            Ok(())
        }
        Commands::Stats { db_url } => {
            let db = connect(db_url, 1).await?;
            let counts = stats::collect(&db).await;
            db.close().await;
            println!("{}", serde_json::to_string_pretty(&counts?)?);
            Ok(())
        }
    }
}

async fn connect(db_url: Option<String>, max_connections: u32) -> Result<Db> {
    let url = match db_url {
        Some(url) => url,
        None => env_util::db_url()?,
    };
    Db::connect(&url, max_connections)
        .await
        .context("failed to connect to database; set DATABASE_URL or PGHOST/PGUSER/PGPASSWORD/PGDATABASE")
}

async fn import(args: ImportArgs) -> Result<()> {
    let batch_size = args
        .batch_size
        .unwrap_or_else(|| env_util::env_parse("IMPORT_BATCH_SIZE", DEFAULT_BATCH_SIZE));
    let importer = Importer::new(ImportOptions {
        dry_run: args.dry_run,
        batch_size,
        ..ImportOptions::default()
    })?;

    // Parse before connecting so a malformed file never opens a session.
    let staged = importer
        .stage(&args.path)
        .with_context(|| format!("import of {} failed", args.path.display()))?;

    if importer.options().dry_run {
        let report = importer.dry_run_report(staged);
        println!("{}", serde_json::to_string_pretty(&report.sample)?);
        info!(
            accepted = report.accepted,
            discarded = report.discarded,
            "dry run complete"
        );
        return Ok(());
    }

    // One connection for the whole run.
    let db = connect(args.db_url, 1).await?;
    let mut store = PgFountainStore::new(&db);
    let result = importer.persist(&mut store, staged).await;
    drop(store);
    db.close().await;

    let report = result.with_context(|| format!("import of {} failed", args.path.display()))?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn preview(path: PathBuf, count: usize) -> Result<()> {
    let records = read_records(&path)?;
    println!(
        "Detected {} rows. Showing up to {count} rows:",
        records.len()
    );
    let sample: Vec<_> = records.iter().take(count).collect();
    println!("{}", serde_json::to_string_pretty(&sample)?);
    if let Some(first) = records.first() {
        let headers: Vec<&str> = first.keys().map(String::as_str).collect();
        println!("\nDetected headers: {}", headers.join(", "));
    }
    Ok(())
}

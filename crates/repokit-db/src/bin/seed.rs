//! # Seed Data Generator
//!
//! Populates a `records` table through the repository API, for trying
//! queries against a non-empty database.
//!
//! ## Usage
//! ```bash
//! # Generate 100 records (default)
//! cargo run -p repokit-db --bin seed
//!
//! # Generate custom amount
//! cargo run -p repokit-db --bin seed -- --count 1000
//!
//! # Specify database path
//! cargo run -p repokit-db --bin seed -- --db ./data/records.db
//! ```
//!
//! Without `--db`, the path comes from `REPOKIT_DATABASE_PATH`, then
//! `./repokit_dev.db`. Log verbosity follows `RUST_LOG` (default `info`).

use std::env;
use std::time::Instant;

use repokit_db::{Database, DbConfig, Fields, RepositoryConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

const DEFAULT_COUNT: usize = 100;
const DEFAULT_DB_PATH: &str = "./repokit_dev.db";

/// Record names cycle through these.
const NAMES: &[&str] = &["foo", "bar", "baz", "qux"];

const CREATE_RECORDS: &str = "CREATE TABLE IF NOT EXISTS records (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT,
    token TEXT,
    created_at TEXT,
    updated_at TEXT
)";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut count = DEFAULT_COUNT;
    let mut db_path: Option<String> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = parse_count(&args[i + 1]);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("repokit seed data generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of records to create (default: {DEFAULT_COUNT})");
                println!("  -d, --db <PATH>    Database file path (default: {DEFAULT_DB_PATH})");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            other => warn!(argument = %other, "Ignoring unknown argument"),
        }
        i += 1;
    }

    let config = match db_path {
        Some(path) => DbConfig::new(path).with_env_overrides(),
        None if env::var("REPOKIT_DATABASE_PATH").is_ok() => DbConfig::from_env()?,
        None => DbConfig::new(DEFAULT_DB_PATH).with_env_overrides(),
    };
    config.validate()?;

    let db = Database::new(config).await?;
    sqlx::query(CREATE_RECORDS).execute(db.pool()).await?;

    let records = db.repository(RepositoryConfig::new("records"));
    let existing = records.count().await?;
    info!(existing, count, "Seeding records");

    let start = Instant::now();
    for n in 0..count {
        let fields = Fields::new()
            .with("name", NAMES[n % NAMES.len()])
            .with("token", Uuid::new_v4());
        records.create(fields).await?;

        if (n + 1) % 500 == 0 {
            info!(created = n + 1, "Progress");
        }
    }

    let total = records.count().await?;
    info!(
        created = count,
        total,
        elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
        "Seed complete"
    );

    for name in NAMES {
        let matching = records.all_where([("name", *name)]).count().await?;
        info!(name = %name, matching, "Records by name");
    }

    db.close().await;
    Ok(())
}

/// Parses `--count`, falling back to the default with a warning.
fn parse_count(value: &str) -> usize {
    value.parse().unwrap_or_else(|_| {
        warn!(value = %value, default = DEFAULT_COUNT, "Invalid --count, using default");
        DEFAULT_COUNT
    })
}

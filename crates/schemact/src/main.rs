//! `schemact` CLI
//!
//! Command-line tool for running DSL-defined schema migrations against
//! PostgreSQL, MySQL, or SQLite.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use schemact::adapter::{DatabaseAdapter, MySqlAdapter, PostgresAdapter, SqliteAdapter};
use schemact::config::{Adapter, Options};
use schemact::engine::path_validate::validate_migration_name;
use schemact::engine::MigrationEngine;

#[derive(Parser)]
#[command(name = "schemact")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Database dialect to target.
    #[arg(long, value_enum, default_value = "sqlite")]
    database: CliAdapter,

    /// Database connection URL.
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite:schemact.db")]
    database_url: String,

    /// Migrations directory.
    #[arg(long, default_value = "migrations")]
    migrations_dir: PathBuf,

    /// Ledger file path.
    #[arg(long, default_value = ".schemact_ledger.json")]
    ledger: PathBuf,

    /// Enable verbose (debug-level) logging.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum CliAdapter {
    Postgres,
    Mysql,
    Sqlite,
}

impl From<CliAdapter> for Adapter {
    fn from(value: CliAdapter) -> Self {
        match value {
            CliAdapter::Postgres => Self::Postgres,
            CliAdapter::Mysql => Self::MySql,
            CliAdapter::Sqlite => Self::Sqlite,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create the migrations directory.
    Init,

    /// Scaffold a new, empty migration file.
    Create {
        /// A short, descriptive name (e.g. `add_users_table`).
        name: String,
    },

    /// Apply every pending migration as one batch.
    Up,

    /// Roll back the most recently applied batch.
    Down,

    /// Show applied and pending migrations.
    Status,

    /// Reverse-engineer a DSL schema from a live database. Not yet supported.
    Pull {
        /// Optional schema/database name to restrict introspection to.
        schema: Option<String>,
    },
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).with_target(false).finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

async fn run_command<A: DatabaseAdapter>(engine: &MigrationEngine<A>, command: &Commands) -> anyhow::Result<()> {
    match command {
        Commands::Up => {
            let report = engine.up().await?;
            if report.applied.is_empty() {
                info!("nothing to do, already up to date");
            } else {
                for filename in &report.applied {
                    info!(filename, "applied");
                }
                info!(batch = ?report.batch, "up complete");
            }
        }
        Commands::Down => {
            let report = engine.down().await?;
            if report.rolled_back.is_empty() {
                info!("nothing to roll back");
            } else {
                for filename in &report.rolled_back {
                    info!(filename, "reverted");
                }
                info!(batch = ?report.batch, "down complete");
            }
        }
        Commands::Status => {
            let status = engine.status()?;
            println!("\nApplied migrations:");
            println!("{:-<60}", "");
            for entry in &status.applied {
                println!(" [X] {} (batch {}, {})", entry.filename, entry.batch, entry.applied_at.format("%Y-%m-%d %H:%M:%S"));
            }
            if status.pending.is_empty() {
                println!("\nNo pending migrations.");
            } else {
                println!("\nPending migrations:");
                for filename in &status.pending {
                    println!(" [ ] {filename}");
                }
            }
            println!();
        }
        Commands::Init | Commands::Create { .. } | Commands::Pull { .. } => {
            unreachable!("handled before a database connection is made")
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match &cli.command {
        Commands::Init => {
            std::fs::create_dir_all(&cli.migrations_dir)?;
            info!(dir = %cli.migrations_dir.display(), "migrations directory ready");
            return Ok(());
        }
        Commands::Create { name } => {
            std::fs::create_dir_all(&cli.migrations_dir)?;
            let target = validate_migration_name(name, &cli.migrations_dir)?;
            let timestamp = chrono::Utc::now().format("%Y%m%d%H%M%S");
            let filename = format!(
                "{timestamp}_{}.sigl",
                target.file_name().and_then(|n| n.to_str()).unwrap_or(name)
            );
            let path = cli.migrations_dir.join(&filename);
            std::fs::write(&path, "// describe your schema change here\n")?;
            info!(file = %path.display(), "created migration");
            return Ok(());
        }
        Commands::Pull { schema } => {
            info!(?schema, "schema introspection is not supported yet");
            error!("`pull` is a placeholder; run migrations forward from .sigl files instead");
            return Ok(());
        }
        Commands::Up | Commands::Down | Commands::Status => {}
    }

    let options = Options::new(cli.database.into())
        .migrations_path(cli.migrations_dir.clone())
        .ledger_path(cli.ledger.clone());

    match cli.database {
        CliAdapter::Postgres => {
            let adapter = PostgresAdapter::connect(&cli.database_url).await?;
            let engine = MigrationEngine::new(options, adapter);
            run_command(&engine, &cli.command).await?;
        }
        CliAdapter::Mysql => {
            let adapter = MySqlAdapter::connect(&cli.database_url).await?;
            let engine = MigrationEngine::new(options, adapter);
            run_command(&engine, &cli.command).await?;
        }
        CliAdapter::Sqlite => {
            let adapter = SqliteAdapter::connect(&cli.database_url).await?;
            let engine = MigrationEngine::new(options, adapter);
            run_command(&engine, &cli.command).await?;
        }
    }

    Ok(())
}

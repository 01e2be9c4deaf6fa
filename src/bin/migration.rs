use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use library_api::{config, db, migrator::Migrator};
use sea_orm_migration::MigratorTrait;
use tracing::info;

/// Schema management for the library database
#[derive(Debug, Parser)]
#[command(name = "migration", version, about)]
struct Cli {
    /// Overrides the configured database URL
    #[arg(long)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Apply pending migrations (default)
    Up {
        #[arg(long)]
        steps: Option<u32>,
    },
    /// Roll back applied migrations, one step unless told otherwise
    Down {
        #[arg(long, default_value_t = 1)]
        steps: u32,
    },
    /// Drop every table and reapply all migrations
    Fresh,
    /// Roll back everything and reapply
    Refresh,
    /// List migrations and whether they are applied
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut cfg = config::load_config().context("failed to load configuration")?;
    config::init_tracing(cfg.log_level(), cfg.log_json);
    if let Some(url) = cli.database_url {
        cfg.database_url = url;
    }

    let pool = db::establish_connection_from_app_config(&cfg)
        .await
        .context("failed to connect to the database")?;

    match cli.command.unwrap_or(Commands::Up { steps: None }) {
        Commands::Up { steps } => {
            info!(?steps, "applying migrations");
            Migrator::up(&pool, steps).await?;
        }
        Commands::Down { steps } => {
            info!(steps, "rolling back migrations");
            Migrator::down(&pool, Some(steps)).await?;
        }
        Commands::Fresh => {
            info!("dropping all tables and reapplying migrations");
            Migrator::fresh(&pool).await?;
        }
        Commands::Refresh => {
            info!("rolling back and reapplying all migrations");
            Migrator::refresh(&pool).await?;
        }
        Commands::Status => {
            Migrator::status(&pool).await?;
        }
    }

    db::close_pool(pool).await?;
    info!("migration command finished");
    Ok(())
}

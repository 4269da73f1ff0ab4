mod locate;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use partnerdb_core::LocateMode;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "partnerdb-cli")]
#[command(about = "PartnerDB command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Find the partner serving a coordinate
    Locate {
        /// Longitude in degrees, -180..=180
        #[arg(long, allow_hyphen_values = true)]
        long: f64,
        /// Latitude in degrees, -90..=90
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        /// `nearest` or `coverage`; defaults to `PARTNERDB_DEFAULT_LOCATE_MODE`
        #[arg(long)]
        mode: Option<LocateMode>,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check database connectivity
    Ping,
    /// Apply pending migrations
    Migrate,
    /// Upsert partners from the seed file
    Seed {
        /// Seed file; defaults to `PARTNERDB_PARTNERS_PATH`
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("partnerdb-cli: use --help to list commands");
        return Ok(());
    };

    let config = partnerdb_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = partnerdb_db::PoolConfig::from_app_config(&config);
    let pool = partnerdb_db::connect_pool(&config.database_url, pool_config).await?;

    match command {
        Commands::Db { command } => match command {
            DbCommands::Ping => {
                partnerdb_db::health_check(&pool).await?;
                println!("database ok");
            }
            DbCommands::Migrate => {
                let applied = partnerdb_db::run_migrations(&pool).await?;
                println!("applied {applied} migration(s)");
            }
            DbCommands::Seed { path } => {
                let path = path.unwrap_or_else(|| config.partners_path.clone());
                let file = partnerdb_core::load_partners_file(&path)?;
                let count = partnerdb_db::seed_partners(&pool, &file.partners).await?;
                tracing::info!(count, path = %path.display(), "partners seeded");
                println!("seeded {count} partner(s) from {}", path.display());
            }
        },
        Commands::Locate { long, lat, mode } => {
            let mode = mode.unwrap_or(config.default_locate_mode);
            locate::run_locate(&pool, long, lat, mode).await?;
        }
    }

    Ok(())
}

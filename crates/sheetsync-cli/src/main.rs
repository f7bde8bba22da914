mod scheduler;
mod sources;
mod status;
mod sync;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "sheetsync")]
#[command(about = "Sync new spreadsheet rows into the store catalog")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Migrate, initialize tracking, then sync on the poll interval until stopped
    Setup,
    /// Run one sync pass over rows added since the last pass
    Sync {
        /// Map and validate pending rows without calling the store or moving the watermark
        #[arg(long)]
        dry_run: bool,
    },
    /// Move the watermark to the current end of the sheet, skipping any backlog
    Reset,
    /// Show the watermark, pending rows and recent runs
    Status {
        /// Number of recent runs to list
        #[arg(long, default_value_t = 10)]
        limit: i64,
    },
    /// Database management
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Apply pending migrations
    Migrate,
    /// Check database connectivity
    Ping,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("sheetsync: no command given; see --help");
        return Ok(());
    };

    let config = sheetsync_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = sheetsync_db::PoolConfig::from_app_config(&config);
    let pool = sheetsync_db::connect_pool(&config.database_url, pool_config).await?;

    match command {
        Commands::Setup => scheduler::run_setup(pool, config).await,
        Commands::Sync { dry_run: true } => sync::run_dry_run(&pool, &config).await,
        Commands::Sync { dry_run: false } => {
            let sheet = sources::build_sheet(&config)?;
            let catalog = sources::build_catalog(&config)?;
            let report = sync::run_sync(&pool, &config, sheet.as_ref(), &catalog, "cli").await?;
            println!("{}", sync::summarize(&report));
            Ok(())
        }
        Commands::Reset => sync::run_reset(&pool, &config).await,
        Commands::Status { limit } => status::run_status(&pool, &config, limit).await,
        Commands::Db {
            command: DbCommands::Migrate,
        } => {
            let applied = sheetsync_db::run_migrations(&pool).await?;
            println!("applied {applied} migration(s)");
            Ok(())
        }
        Commands::Db {
            command: DbCommands::Ping,
        } => {
            sheetsync_db::ping(&pool).await?;
            println!("database reachable");
            Ok(())
        }
    }
}

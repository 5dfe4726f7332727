pub mod commands;
pub mod utils;

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::database::{DatabaseManager, MemoryStore, PgRepository, Store};

#[derive(Parser)]
#[command(name = "lms-api")]
#[command(about = "LMS API - project tracker backend with completion rewards")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    /// Defaults to `serve`
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP API server")]
    Serve {
        #[arg(long, help = "Port to bind (overrides API_PORT)")]
        port: Option<u16>,
    },

    #[command(about = "Apply pending database migrations")]
    Migrate,

    #[command(about = "Delete revocation records for tokens that have already expired")]
    PurgeTokens,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let config = crate::config::config();
    config.validate()?;

    match cli.command.unwrap_or(Commands::Serve { port: None }) {
        Commands::Serve { port } => commands::server::serve(config, port).await,
        Commands::Migrate => commands::database::migrate(config, output_format).await,
        Commands::PurgeTokens => commands::database::purge_tokens(config, output_format).await,
    }
}

/// Pick the backing store: Postgres when DATABASE_URL is set, otherwise the
/// in-memory store (development only; `validate` rejects this elsewhere).
pub async fn build_store(config: &AppConfig) -> anyhow::Result<Arc<dyn Store>> {
    if config.database.url.is_none() {
        tracing::warn!("DATABASE_URL not set, using in-memory store; data will not survive a restart");
        return Ok(Arc::new(MemoryStore::new()));
    }

    let pool = DatabaseManager::connect(&config.database)
        .await
        .context("connecting to database")?;

    if config.database.run_migrations {
        DatabaseManager::migrate(&pool).await.context("running migrations")?;
    }

    Ok(Arc::new(PgRepository::new(pool)))
}

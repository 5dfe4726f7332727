use anyhow::Context;
use chrono::Utc;
use serde_json::{json, Value};

use crate::cli::utils::{report_done, report_failed};
use crate::cli::OutputFormat;
use crate::config::AppConfig;
use crate::database::{DatabaseManager, PgRepository, Store};

/// Apply pending migrations against DATABASE_URL
pub async fn migrate(config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    if config.database.url.is_none() {
        report_failed(&output_format, "migrate", "DATABASE_URL is not set", "CONFIG_MISSING")?;
        anyhow::bail!("nothing to migrate without DATABASE_URL");
    }

    let pool = DatabaseManager::connect(&config.database)
        .await
        .context("connecting to database")?;
    DatabaseManager::migrate(&pool).await.context("running migrations")?;

    report_done(&output_format, "migrate", "Migrations applied", Value::Null)
}

/// Remove revocation records whose tokens have expired on their own
pub async fn purge_tokens(config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    if config.database.url.is_none() {
        report_failed(&output_format, "purge-tokens", "DATABASE_URL is not set", "CONFIG_MISSING")?;
        anyhow::bail!("nothing to purge without DATABASE_URL");
    }

    let pool = DatabaseManager::connect(&config.database)
        .await
        .context("connecting to database")?;
    let removed = PgRepository::new(pool)
        .purge_expired_tokens(Utc::now())
        .await
        .context("purging revoked tokens")?;

    tracing::info!(removed, "Purged expired revocation records");
    report_done(
        &output_format,
        "purge-tokens",
        &format!("Removed {} expired revocation record(s)", removed),
        json!({ "removed": removed }),
    )
}

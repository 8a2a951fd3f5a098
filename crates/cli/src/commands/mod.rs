//! Subcommand implementations.

pub mod admin;
pub mod jobs;
pub mod migrate;

use secrecy::SecretString;
use sqlx::PgPool;

/// Missing configuration shared by every subcommand.
#[derive(Debug, thiserror::Error)]
#[error("Missing environment variable: SHOPX_DATABASE_URL (or DATABASE_URL)")]
pub struct MissingDatabaseUrl;

/// Database URL from `SHOPX_DATABASE_URL`, falling back to `DATABASE_URL`.
///
/// # Errors
///
/// Returns `MissingDatabaseUrl` if neither is set.
pub fn database_url() -> Result<SecretString, MissingDatabaseUrl> {
    dotenvy::dotenv().ok();
    std::env::var("SHOPX_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| MissingDatabaseUrl)
}

/// Connect using [`database_url`].
///
/// # Errors
///
/// Returns an error if the URL is missing or the connection fails.
pub async fn connect() -> Result<PgPool, Box<dyn std::error::Error>> {
    let url = database_url()?;
    tracing::info!("Connecting to database...");
    Ok(shopx_server::db::create_pool(&url).await?)
}

//! Database access for the `shop` schema.
//!
//! # Tables
//!
//! - `user`, `seller` - Accounts and seller storefront profiles
//! - `category`, `seller_category`, `product` - Catalog
//! - `cart`, `cart_item` - Pre-order staging, one cart per user
//! - `order`, `order_detail` - One order per seller per checkout
//! - `discount` - Promotional codes with a validity window and budget
//! - `contact` - Messages from users to the admins
//! - `notification`, `user_notification` - Admin broadcasts and per-user inbox rows
//!
//! # Migrations
//!
//! Migrations live in `crates/server/migrations/` and are run explicitly:
//! ```bash
//! cargo run -p shopx-cli -- migrate
//! ```
//!
//! Repositories borrow the pool. Operations that must join a caller's
//! transaction take a `&mut PgConnection` instead.

/// SQL `IN` list of the order statuses whose lines count as revenue.
macro_rules! revenue_statuses {
    () => {
        "('delivered', 'refund_rejected', 'completed')"
    };
}
pub(crate) use revenue_statuses;

pub mod carts;
pub mod categories;
pub mod contacts;
pub mod discounts;
pub mod notifications;
pub mod orders;
pub mod products;
pub mod reports;
pub mod seller_categories;
pub mod sellers;
pub mod statistics;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database query failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is invalid or corrupted.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested row does not exist.
    #[error("not found")]
    NotFound,

    /// A uniqueness or reference constraint was violated.
    #[error("conflict: {0}")]
    Conflict(String),
}

/// Map a unique-constraint violation to [`RepositoryError::Conflict`].
///
/// Any other error is passed through as [`RepositoryError::Database`].
pub(crate) fn unique_violation(e: sqlx::Error, message: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(message.to_owned());
    }
    RepositoryError::Database(e)
}

/// Escape `%`, `_` and `\` so user input matches literally inside `ILIKE`.
pub(crate) fn like_pattern(search: &str) -> String {
    let mut escaped = String::with_capacity(search.len() + 2);
    escaped.push('%');
    for c in search.trim().chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// Normalize an optional search string: blank becomes `None`.
pub(crate) fn search_term(search: Option<&str>) -> Option<String> {
    search
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(like_pattern)
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    pool_options().connect(database_url.expose_secret()).await
}

/// Create a pool that connects on first use.
///
/// Used by tests that exercise routes which never reach the database.
///
/// # Errors
///
/// Returns `sqlx::Error` if the URL cannot be parsed.
pub fn create_lazy_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    pool_options().connect_lazy(database_url.expose_secret())
}

fn pool_options() -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("  shoes "), "%shoes%");
    }

    #[test]
    fn test_revenue_statuses_match_core() {
        for status in shopx_core::OrderStatus::ALL {
            let quoted = format!("'{}'", status.as_str());
            assert_eq!(
                revenue_statuses!().contains(&quoted),
                status.is_revenue_countable(),
                "{status}"
            );
        }
    }

    #[test]
    fn test_search_term_blank_is_none() {
        assert_eq!(search_term(None), None);
        assert_eq!(search_term(Some("   ")), None);
        assert_eq!(search_term(Some("tea")), Some("%tea%".to_owned()));
    }
}

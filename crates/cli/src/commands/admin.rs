//! Admin account bootstrap.
//!
//! ```bash
//! SHOPX_ADMIN_PASSWORD=... shopx admin create -e admin@example.com -n "Admin Name"
//! ```
//!
//! The first admin has to be created here; after that admins can promote
//! other accounts through the API.

use thiserror::Error;

use shopx_core::{Email, Role};
use shopx_server::db::RepositoryError;
use shopx_server::db::users::UserRepository;
use shopx_server::models::user::NewUser;
use shopx_server::services::auth::{AuthError, hash_password, validate_password};

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    Config(#[from] super::MissingDatabaseUrl),

    #[error("Database connection error: {0}")]
    Connect(#[from] sqlx::Error),

    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error(transparent)]
    Password(#[from] AuthError),

    #[error("A user already exists with email: {0}")]
    UserExists(String),

    #[error(transparent)]
    Repository(RepositoryError),
}

/// Create an active admin account.
///
/// # Errors
///
/// Returns `AdminError` for a bad email or password, an existing account,
/// or a database failure.
pub async fn create_user(email: &str, name: &str, password: &str) -> Result<i32, AdminError> {
    let email = Email::parse(email).map_err(|_| AdminError::InvalidEmail(email.to_owned()))?;
    validate_password(password)?;
    let password_hash = hash_password(password)?;

    let url = super::database_url()?;
    let pool = shopx_server::db::create_pool(&url).await?;

    tracing::info!(email = %email, "Creating admin user");

    let new = NewUser {
        email: email.clone(),
        password_hash: Some(password_hash),
        full_name: Some(name.to_owned()),
        phone: None,
        address: None,
        avatar: None,
        role: Role::Admin,
        is_active: true,
        social_provider: None,
        social_id: None,
    };

    let user = UserRepository::new(&pool)
        .create(&new)
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => AdminError::UserExists(email.to_string()),
            other => AdminError::Repository(other),
        })?;

    tracing::info!(user_id = %user.id, "Admin user created");
    Ok(user.id.as_i32())
}

//! Authentication service.
//!
//! Password and social login, token issuing, and self-service account edits.

mod error;
mod jwt;

pub use error::AuthError;
pub use jwt::{Claims, JwtService};

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::PgPool;
use tracing::instrument;

use shopx_core::{Email, Role, UserId};

use crate::db::RepositoryError;
use crate::db::users::UserRepository;
use crate::models::user::{
    AuthResponse, ChangePasswordRequest, LoginRequest, NewUser, ProfileUpdate, RegisterRequest,
    SocialLoginRequest, User,
};

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    jwt: &'a JwtService,
}

impl<'a> AuthService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, jwt: &'a JwtService) -> Self {
        Self {
            users: UserRepository::new(pool),
            jwt,
        }
    }

    /// Register a customer account and sign it in.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` or `AuthError::PasswordMismatch` if the
    /// password is rejected.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    #[instrument(skip_all, fields(email = %request.email))]
    pub async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse, AuthError> {
        let email = Email::parse(&request.email)?;
        validate_password(&request.password)?;
        if request.password != request.confirm_password {
            return Err(AuthError::PasswordMismatch);
        }

        let password_hash = hash_password(&request.password)?;
        let new = NewUser {
            email,
            password_hash: Some(password_hash),
            full_name: request.full_name.clone(),
            phone: request.phone.clone(),
            address: request.address.clone(),
            avatar: None,
            role: Role::Customer,
            is_active: true,
            social_provider: None,
            social_id: None,
        };

        let user = self.users.create(&new).await.map_err(|e| match e {
            RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
            other => AuthError::Repository(other),
        })?;

        tracing::info!(user_id = %user.id, "Registered customer account");
        self.issue(user)
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    /// Returns `AuthError::AccountDisabled` if the account is deactivated.
    #[instrument(skip_all, fields(email = %request.email))]
    pub async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, AuthError> {
        let email = Email::parse(&request.email).map_err(|_| AuthError::InvalidCredentials)?;

        let (user, password_hash) = self
            .users
            .get_password_hash(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let hash = password_hash.ok_or(AuthError::InvalidCredentials)?;
        verify_password(&request.password, &hash)?;

        if !user.is_active {
            return Err(AuthError::AccountDisabled);
        }

        self.issue(user)
    }

    /// Sign in with an identity from an external provider.
    ///
    /// Matches on the provider identity first, then on email (linking the
    /// identity), and otherwise creates a customer account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::AccountDisabled` if the matched account is deactivated.
    #[instrument(skip_all, fields(provider = %request.provider))]
    pub async fn social_login(&self, request: &SocialLoginRequest) -> Result<AuthResponse, AuthError> {
        let provider = request.provider.trim().to_lowercase();
        let social_id = request.social_id.trim();
        if provider.is_empty() || social_id.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }

        if let Some(user) = self.users.get_by_social(&provider, social_id).await? {
            return self.issue_if_active(user);
        }

        let email = Email::parse(&request.email)?;
        if let Some(user) = self.users.get_by_email(&email).await? {
            if !user.is_active {
                return Err(AuthError::AccountDisabled);
            }
            self.users.link_social(user.id, &provider, social_id).await?;
            tracing::info!(user_id = %user.id, "Linked social identity to existing account");
            return self.issue(user);
        }

        let new = NewUser {
            email,
            password_hash: None,
            full_name: request.full_name.clone(),
            phone: None,
            address: None,
            avatar: request.avatar.clone(),
            role: Role::Customer,
            is_active: true,
            social_provider: Some(provider),
            social_id: Some(social_id.to_owned()),
        };
        let user = self.users.create(&new).await.map_err(|e| match e {
            RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
            other => AuthError::Repository(other),
        })?;

        tracing::info!(user_id = %user.id, "Created account from social login");
        self.issue(user)
    }

    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the current password is wrong.
    #[instrument(skip_all, fields(user_id = %user_id))]
    pub async fn change_password(
        &self,
        user_id: UserId,
        request: &ChangePasswordRequest,
    ) -> Result<(), AuthError> {
        let hash = self
            .users
            .password_hash_for(user_id)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;
        verify_password(&request.current_password, &hash)?;

        validate_password(&request.new_password)?;
        if request.new_password != request.confirm_new_password {
            return Err(AuthError::PasswordMismatch);
        }

        let new_hash = hash_password(&request.new_password)?;
        self.users.update_password(user_id, &new_hash).await?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the user doesn't exist.
    pub async fn update_profile(
        &self,
        user_id: UserId,
        update: &ProfileUpdate,
    ) -> Result<User, AuthError> {
        self.users
            .update_profile(user_id, update)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => AuthError::UserNotFound,
                other => AuthError::Repository(other),
            })
    }

    /// The current account, re-read from the database.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the user no longer exists.
    pub async fn me(&self, user_id: UserId) -> Result<User, AuthError> {
        self.users
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    fn issue_if_active(&self, user: User) -> Result<AuthResponse, AuthError> {
        if !user.is_active {
            return Err(AuthError::AccountDisabled);
        }
        self.issue(user)
    }

    fn issue(&self, user: User) -> Result<AuthResponse, AuthError> {
        let (token, expires_at) = self.jwt.create_token(&user)?;
        Ok(AuthResponse {
            token,
            expires_at,
            user,
        })
    }
}

/// Validate password meets requirements.
///
/// # Errors
///
/// Returns `AuthError::WeakPassword` if the password is too short.
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_password_length() {
        assert!(matches!(
            validate_password("short"),
            Err(AuthError::WeakPassword(_))
        ));
        assert!(validate_password("long enough").is_ok());
    }

    #[test]
    fn test_validate_password_counts_characters() {
        // 8 characters, more than 8 bytes
        assert!(validate_password("ññññññññ").is_ok());
        assert!(validate_password("ñññññññ").is_err());
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct horse", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong horse", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("same password").unwrap();
        let b = hash_password("same password").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_verify_rejects_garbage_hash() {
        assert!(matches!(
            verify_password("anything", "not-a-hash"),
            Err(AuthError::InvalidCredentials)
        ));
    }
}

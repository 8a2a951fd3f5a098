//! JWT issuing and verification.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shopx_core::{Role, SellerId, UserId};

use crate::config::JwtConfig;
use crate::models::user::User;

/// Claims carried by an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID as a string.
    pub sub: String,
    pub email: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seller_id: Option<SellerId>,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
    pub jti: String,
}

impl Claims {
    /// The user ID in `sub`, if it parses.
    #[must_use]
    pub fn user_id(&self) -> Option<UserId> {
        self.sub.parse::<i32>().ok().map(UserId::new)
    }
}

/// Creates and verifies HS256 access tokens.
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    ttl: Duration,
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("issuer", &self.issuer)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl JwtService {
    #[must_use]
    pub fn new(secret: &str, issuer: impl Into<String>, ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer: issuer.into(),
            ttl,
        }
    }

    #[must_use]
    pub fn from_config(config: &JwtConfig) -> Self {
        Self::new(
            config.secret.expose_secret(),
            config.issuer.clone(),
            Duration::minutes(config.expiry_minutes),
        )
    }

    /// Issue a token for a user. Returns the token and its expiry.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn create_token(
        &self,
        user: &User,
    ) -> Result<(String, DateTime<Utc>), jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let expires_at = now + self.ttl;

        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.as_str().to_owned(),
            role: user.role,
            seller_id: user.seller_id,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            iss: self.issuer.clone(),
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)?;
        Ok((token, expires_at))
    }

    /// Verify signature, issuer and expiry, returning the claims.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is malformed, expired, or signed by
    /// another key or issuer.
    pub fn verify_token(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.issuer]);

        decode::<Claims>(token, &self.decoding_key, &validation).map(|data| data.claims)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use shopx_core::Email;

    fn user(role: Role, seller_id: Option<SellerId>) -> User {
        User {
            id: UserId::new(42),
            email: Email::parse("buyer@example.com").unwrap(),
            full_name: Some("Buyer".to_owned()),
            phone: None,
            birthday: None,
            gender: None,
            address: None,
            avatar: None,
            role,
            is_active: true,
            social_provider: None,
            created_at: Utc::now(),
            seller_id,
            shop_name: None,
        }
    }

    fn service(secret: &str) -> JwtService {
        JwtService::new(secret, "shopx-test", Duration::minutes(60))
    }

    #[test]
    fn test_create_and_verify_token() {
        let jwt = service("test_secret_key");
        let (token, _) = jwt.create_token(&user(Role::Seller, Some(SellerId::new(7)))).unwrap();

        let claims = jwt.verify_token(&token).unwrap();
        assert_eq!(claims.user_id(), Some(UserId::new(42)));
        assert_eq!(claims.email, "buyer@example.com");
        assert_eq!(claims.role, Role::Seller);
        assert_eq!(claims.seller_id, Some(SellerId::new(7)));
        assert_eq!(claims.iss, "shopx-test");
    }

    #[test]
    fn test_customer_token_has_no_seller_id() {
        let jwt = service("test_secret_key");
        let (token, _) = jwt.create_token(&user(Role::Customer, None)).unwrap();
        let claims = jwt.verify_token(&token).unwrap();
        assert_eq!(claims.seller_id, None);
    }

    #[test]
    fn test_invalid_token() {
        assert!(service("test_secret_key").verify_token("invalid_token").is_err());
    }

    #[test]
    fn test_wrong_secret() {
        let (token, _) = service("secret1")
            .create_token(&user(Role::Customer, None))
            .unwrap();
        assert!(service("secret2").verify_token(&token).is_err());
    }

    #[test]
    fn test_wrong_issuer() {
        let other = JwtService::new("test_secret_key", "someone-else", Duration::minutes(60));
        let (token, _) = other.create_token(&user(Role::Customer, None)).unwrap();
        assert!(service("test_secret_key").verify_token(&token).is_err());
    }

    #[test]
    fn test_expiry_window() {
        let jwt = service("test_secret_key");
        let (token, expires_at) = jwt.create_token(&user(Role::Admin, None)).unwrap();
        let claims = jwt.verify_token(&token).unwrap();

        let expires_in = claims.exp - Utc::now().timestamp();
        assert!(expires_in > 59 * 60);
        assert!(expires_in <= 60 * 60);
        assert_eq!(claims.exp, expires_at.timestamp());
    }

    #[test]
    fn test_expired_token_rejected() {
        let jwt = JwtService::new("test_secret_key", "shopx-test", Duration::minutes(-10));
        let (token, _) = jwt.create_token(&user(Role::Customer, None)).unwrap();
        assert!(jwt.verify_token(&token).is_err());
    }
}

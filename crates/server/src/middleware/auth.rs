//! Bearer-token authentication extractors.
//!
//! Tokens come from `Authorization: Bearer <jwt>` and are verified against the
//! [`JwtService`](crate::services::auth::JwtService) in [`AppState`].

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};

use shopx_core::SellerId;

use crate::error::{AppError, set_sentry_user};
use crate::models::user::CurrentUser;
use crate::services::auth::Claims;
use crate::state::AppState;

/// Pull the token out of an `Authorization: Bearer` header.
///
/// The scheme is matched case-insensitively; an empty token is treated as absent.
#[must_use]
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Build the request's caller from verified claims.
///
/// # Errors
///
/// Returns `AppError::Unauthorized` if `sub` is not a user ID.
pub fn current_user(claims: Claims) -> Result<CurrentUser, AppError> {
    let id = claims
        .user_id()
        .ok_or_else(|| AppError::Unauthorized("invalid token subject".to_owned()))?;
    Ok(CurrentUser {
        id,
        email: claims.email,
        role: claims.role,
        seller_id: claims.seller_id,
    })
}

fn authenticate(parts: &Parts, state: &AppState) -> Result<CurrentUser, AppError> {
    let token = bearer_token(&parts.headers)
        .ok_or_else(|| AppError::Unauthorized("missing bearer token".to_owned()))?;
    let claims = state
        .jwt()
        .verify_token(token)
        .map_err(|_| AppError::Unauthorized("invalid or expired token".to_owned()))?;
    let user = current_user(claims)?;

    set_sentry_user(&user.id, Some(&user.email));
    tracing::Span::current().record("user_id", tracing::field::display(user.id));
    Ok(user)
}

/// Extractor that requires a valid token.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireAuth(user): RequireAuth) -> impl IntoResponse {
///     format!("Hello, {}!", user.email)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        authenticate(parts, state).map(Self)
    }
}

/// Extractor that optionally gets the caller.
///
/// A missing or invalid token yields `None` instead of rejecting.
pub struct OptionalAuth(pub Option<CurrentUser>);

impl FromRequestParts<AppState> for OptionalAuth {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(Self(authenticate(parts, state).ok()))
    }
}

/// Extractor that requires a seller with a shop.
pub struct RequireSeller {
    pub user: CurrentUser,
    pub seller_id: SellerId,
}

impl FromRequestParts<AppState> for RequireSeller {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user = authenticate(parts, state)?;
        let seller_id = user
            .seller()
            .ok_or_else(|| AppError::Forbidden("seller account required".to_owned()))?;
        Ok(Self { user, seller_id })
    }
}

/// Extractor that requires the admin role.
pub struct RequireAdmin(pub CurrentUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user = authenticate(parts, state)?;
        if !user.is_admin() {
            return Err(AppError::Forbidden("admin access required".to_owned()));
        }
        Ok(Self(user))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use shopx_core::{Role, UserId};

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token(&headers("Bearer abc.def.ghi")), Some("abc.def.ghi"));
        assert_eq!(bearer_token(&headers("bearer   abc")), Some("abc"));
        assert_eq!(bearer_token(&headers("Basic dXNlcjpwYXNz")), None);
        assert_eq!(bearer_token(&headers("Bearer ")), None);
        assert_eq!(bearer_token(&headers("Bearer")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    fn claims(sub: &str, role: Role, seller_id: Option<i32>) -> Claims {
        Claims {
            sub: sub.to_owned(),
            email: "a@example.com".to_owned(),
            role,
            seller_id: seller_id.map(SellerId::new),
            iat: 0,
            exp: 0,
            iss: "shopx".to_owned(),
            jti: "j".to_owned(),
        }
    }

    #[test]
    fn test_current_user_from_claims() {
        let user = current_user(claims("7", Role::Seller, Some(3))).unwrap();
        assert_eq!(user.id, UserId::new(7));
        assert_eq!(user.seller(), Some(SellerId::new(3)));

        let customer = current_user(claims("8", Role::Customer, None)).unwrap();
        assert_eq!(customer.seller(), None);
        assert!(!customer.is_admin());

        assert!(matches!(
            current_user(claims("not-a-number", Role::Admin, None)),
            Err(AppError::Unauthorized(_))
        ));
    }
}

//! Seller profiles: public storefront data and the switch to selling.

use sqlx::PgPool;
use tracing::instrument;

use shopx_core::{Role, SellerId, UserId};

use super::auth::JwtService;
use super::{ServiceError, ServiceResult};
use crate::db::sellers::{self, SellerRepository};
use crate::db::users::{self, UserRepository};
use crate::models::seller::{Seller, SellerPublicProfile, SellerPublicStats};
use crate::models::user::AuthResponse;

/// Longest accepted shop name, in characters.
pub const MAX_SHOP_NAME_LENGTH: usize = 100;

/// Trim a shop name and check its length.
///
/// # Errors
///
/// Returns `ServiceError::InvalidArgument` for a blank or overlong name.
pub fn normalize_shop_name(name: &str) -> ServiceResult<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ServiceError::InvalidArgument("shop name is required".to_owned()));
    }
    if name.chars().count() > MAX_SHOP_NAME_LENGTH {
        return Err(ServiceError::InvalidArgument(format!(
            "shop name must be at most {MAX_SHOP_NAME_LENGTH} characters"
        )));
    }
    Ok(name)
}

pub struct SellerService<'a> {
    pool: &'a PgPool,
    sellers: SellerRepository<'a>,
    users: UserRepository<'a>,
}

impl<'a> SellerService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            pool,
            sellers: SellerRepository::new(pool),
            users: UserRepository::new(pool),
        }
    }

    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` unless the shop exists and is active.
    pub async fn public_profile(&self, id: SellerId) -> ServiceResult<SellerPublicProfile> {
        let row = self
            .sellers
            .public_profile(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("seller", id))?;
        let categories = self.sellers.category_counts(id).await?;

        Ok(SellerPublicProfile {
            seller_id: row.seller_id,
            shop_name: row.shop_name,
            owner_name: row.owner_name,
            avatar: row.avatar,
            joined_at: row.joined_at,
            product_count: row.product_count,
            total_sold: row.total_sold,
            categories,
        })
    }

    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` unless the shop exists and is active.
    pub async fn public_stats(&self, id: SellerId) -> ServiceResult<SellerPublicStats> {
        self.sellers
            .public_stats(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("seller", id))
    }

    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the query fails.
    pub async fn is_active(&self, id: SellerId) -> ServiceResult<bool> {
        Ok(self.sellers.get_active(id).await?.is_some())
    }

    /// The caller's own shop, active or not.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the user has no seller profile.
    pub async fn current(&self, user_id: UserId) -> ServiceResult<Seller> {
        self.sellers
            .get_by_user(user_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("no shop for this account".to_owned()))
    }

    /// # Errors
    ///
    /// Returns `ServiceError::InvalidArgument` for a bad name and
    /// `ServiceError::NotFound` if the user has no seller profile.
    #[instrument(skip(self))]
    pub async fn rename(&self, user_id: UserId, shop_name: &str) -> ServiceResult<Seller> {
        let shop_name = normalize_shop_name(shop_name)?;
        let seller = self.current(user_id).await?;
        Ok(self.sellers.update_shop_name(seller.id, shop_name).await?)
    }

    /// Turn a customer into a seller, creating or reactivating their shop.
    ///
    /// Returns a fresh token carrying the new role and seller ID.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::InvalidOperation` for admins, inactive accounts and
    /// users who already run an active shop.
    #[instrument(skip(self, jwt))]
    pub async fn become_seller(
        &self,
        jwt: &JwtService,
        user_id: UserId,
        shop_name: &str,
    ) -> ServiceResult<AuthResponse> {
        let shop_name = normalize_shop_name(shop_name)?;
        let user = self
            .users
            .get_by_id(user_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("user", user_id))?;
        if !user.is_active {
            return Err(ServiceError::InvalidOperation("account is disabled".to_owned()));
        }
        if user.role == Role::Admin {
            return Err(ServiceError::InvalidOperation(
                "admin accounts cannot open a shop".to_owned(),
            ));
        }

        let mut tx = self.pool.begin().await?;
        let seller = match sellers::get_by_user(&mut tx, user_id).await? {
            Some(existing) if existing.is_active && user.role == Role::Seller => {
                return Err(ServiceError::InvalidOperation(
                    "account already has an active shop".to_owned(),
                ));
            }
            Some(existing) => sellers::reactivate(&mut tx, existing.id, Some(shop_name)).await?,
            None => sellers::create(&mut tx, user_id, shop_name).await?,
        };
        users::set_role(&mut tx, user_id, Role::Seller).await?;
        tx.commit().await?;

        tracing::info!(seller_id = %seller.id, "Converted account to seller");

        let user = self
            .users
            .get_by_id(user_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("user", user_id))?;
        let (token, expires_at) = jwt
            .create_token(&user)
            .map_err(|e| ServiceError::Internal(format!("token signing failed: {e}")))?;
        Ok(AuthResponse {
            token,
            expires_at,
            user,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_shop_name() {
        assert_eq!(normalize_shop_name("  Corner Shop ").ok(), Some("Corner Shop"));
        assert!(normalize_shop_name("   ").is_err());
        assert!(normalize_shop_name(&"a".repeat(MAX_SHOP_NAME_LENGTH)).is_ok());
        assert!(normalize_shop_name(&"a".repeat(MAX_SHOP_NAME_LENGTH + 1)).is_err());
    }
}

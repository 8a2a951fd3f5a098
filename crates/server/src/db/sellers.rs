//! Seller profile repository.

use sqlx::{PgConnection, PgPool};

use shopx_core::{SellerId, UserId};

use super::{RepositoryError, revenue_statuses};
use crate::models::seller::{Seller, SellerCategoryCount, SellerProfileRow, SellerPublicStats};

/// Repository for seller profiles.
pub struct SellerRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SellerRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get the seller profile owned by a user, active or not.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_user(&self, user_id: UserId) -> Result<Option<Seller>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        get_by_user(&mut conn, user_id).await
    }

    /// Get an active seller profile.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_active(&self, id: SellerId) -> Result<Option<Seller>, RepositoryError> {
        let seller = sqlx::query_as::<_, Seller>(
            r"
            SELECT id, user_id, shop_name, created_at, is_active
            FROM shop.seller
            WHERE id = $1 AND is_active
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(seller)
    }

    /// Rename a shop.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the seller doesn't exist.
    pub async fn update_shop_name(
        &self,
        id: SellerId,
        shop_name: &str,
    ) -> Result<Seller, RepositoryError> {
        sqlx::query_as::<_, Seller>(
            r"
            UPDATE shop.seller SET shop_name = $2
            WHERE id = $1
            RETURNING id, user_id, shop_name, created_at, is_active
            ",
        )
        .bind(id)
        .bind(shop_name)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Public header data: owner, product count and units sold.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn public_profile(
        &self,
        id: SellerId,
    ) -> Result<Option<SellerProfileRow>, RepositoryError> {
        let row = sqlx::query_as::<_, SellerProfileRow>(concat!(
            r"
            SELECT s.id AS seller_id, s.shop_name, u.full_name AS owner_name, u.avatar,
                   s.created_at AS joined_at,
                   (SELECT COUNT(*) FROM shop.product p
                    WHERE p.seller_id = s.id AND p.is_active) AS product_count,
                   (SELECT COALESCE(SUM(od.quantity), 0)::bigint
                    FROM shop.order_detail od
                    JOIN shop.product p ON p.id = od.product_id
                    JOIN shop.order o ON o.id = od.order_id
                    WHERE p.seller_id = s.id AND o.status IN ",
            revenue_statuses!(),
            r") AS total_sold
            FROM shop.seller s
            JOIN shop.user u ON u.id = s.user_id
            WHERE s.id = $1 AND s.is_active
            ",
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(row)
    }

    /// Active seller categories with their active product counts.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn category_counts(
        &self,
        id: SellerId,
    ) -> Result<Vec<SellerCategoryCount>, RepositoryError> {
        let rows = sqlx::query_as::<_, SellerCategoryCount>(
            r"
            SELECT sc.id, sc.name, COUNT(p.id) AS product_count
            FROM shop.seller_category sc
            LEFT JOIN shop.product p ON p.seller_category_id = sc.id AND p.is_active
            WHERE sc.seller_id = $1 AND sc.is_active
            GROUP BY sc.id, sc.name
            ORDER BY sc.name
            ",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Headline numbers for the public seller page.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn public_stats(
        &self,
        id: SellerId,
    ) -> Result<Option<SellerPublicStats>, RepositoryError> {
        let row = sqlx::query_as::<_, SellerPublicStats>(concat!(
            r"
            SELECT s.id AS seller_id,
                   (SELECT COUNT(*) FROM shop.product p
                    WHERE p.seller_id = s.id AND p.is_active) AS product_count,
                   COALESCE(sales.total_sold, 0)::bigint AS total_sold,
                   COALESCE(sales.completed_orders, 0) AS completed_orders,
                   COALESCE(sales.customer_count, 0) AS customer_count,
                   s.created_at AS joined_at
            FROM shop.seller s
            LEFT JOIN LATERAL (
                SELECT SUM(od.quantity) AS total_sold,
                       COUNT(DISTINCT o.id) AS completed_orders,
                       COUNT(DISTINCT o.user_id) AS customer_count
                FROM shop.order_detail od
                JOIN shop.product p ON p.id = od.product_id
                JOIN shop.order o ON o.id = od.order_id
                WHERE p.seller_id = s.id AND o.status IN ",
            revenue_statuses!(),
            r"
            ) sales ON TRUE
            WHERE s.id = $1 AND s.is_active
            ",
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(row)
    }
}

/// Get the seller profile owned by a user on an existing connection.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn get_by_user(
    conn: &mut PgConnection,
    user_id: UserId,
) -> Result<Option<Seller>, RepositoryError> {
    let seller = sqlx::query_as::<_, Seller>(
        r"
        SELECT id, user_id, shop_name, created_at, is_active
        FROM shop.seller
        WHERE user_id = $1
        FOR UPDATE
        ",
    )
    .bind(user_id)
    .fetch_optional(conn)
    .await?;
    Ok(seller)
}

/// Create a seller profile.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if the user already has a profile.
pub async fn create(
    conn: &mut PgConnection,
    user_id: UserId,
    shop_name: &str,
) -> Result<Seller, RepositoryError> {
    sqlx::query_as::<_, Seller>(
        r"
        INSERT INTO shop.seller (user_id, shop_name)
        VALUES ($1, $2)
        RETURNING id, user_id, shop_name, created_at, is_active
        ",
    )
    .bind(user_id)
    .bind(shop_name)
    .fetch_one(conn)
    .await
    .map_err(|e| super::unique_violation(e, "user already has a seller profile"))
}

/// Reactivate a profile, optionally renaming the shop.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the profile doesn't exist.
pub async fn reactivate(
    conn: &mut PgConnection,
    id: SellerId,
    shop_name: Option<&str>,
) -> Result<Seller, RepositoryError> {
    sqlx::query_as::<_, Seller>(
        r"
        UPDATE shop.seller
        SET is_active = TRUE, shop_name = COALESCE($2, shop_name)
        WHERE id = $1
        RETURNING id, user_id, shop_name, created_at, is_active
        ",
    )
    .bind(id)
    .bind(shop_name)
    .fetch_optional(conn)
    .await?
    .ok_or(RepositoryError::NotFound)
}

/// Deactivate the profile owned by a user, if any.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn deactivate_for_user(
    conn: &mut PgConnection,
    user_id: UserId,
) -> Result<(), RepositoryError> {
    sqlx::query("UPDATE shop.seller SET is_active = FALSE WHERE user_id = $1")
        .bind(user_id)
        .execute(conn)
        .await?;
    Ok(())
}

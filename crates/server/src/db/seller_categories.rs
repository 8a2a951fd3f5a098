//! Seller category repository.

use sqlx::PgPool;

use shopx_core::{SellerCategoryId, SellerId};

use super::RepositoryError;
use crate::models::catalog::{SellerCategory, SellerCategoryInput};

macro_rules! seller_category_select {
    () => {
        r"
        SELECT sc.id, sc.seller_id, sc.name, sc.description, sc.created_at, sc.is_active,
               (SELECT COUNT(*) FROM shop.product p
                WHERE p.seller_category_id = sc.id AND p.is_active) AS product_count
        FROM shop.seller_category sc
        "
    };
}

/// Repository for seller-owned categories.
pub struct SellerCategoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SellerCategoryRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// A seller's categories, optionally including inactive ones.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_seller(
        &self,
        seller_id: SellerId,
        include_inactive: bool,
    ) -> Result<Vec<SellerCategory>, RepositoryError> {
        let rows = sqlx::query_as::<_, SellerCategory>(concat!(
            seller_category_select!(),
            "WHERE sc.seller_id = $1 AND ($2 OR sc.is_active) ORDER BY sc.name, sc.id"
        ))
        .bind(seller_id)
        .bind(include_inactive)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: SellerCategoryId) -> Result<Option<SellerCategory>, RepositoryError> {
        let row = sqlx::query_as::<_, SellerCategory>(concat!(
            seller_category_select!(),
            "WHERE sc.id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(row)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create(
        &self,
        seller_id: SellerId,
        input: &SellerCategoryInput,
    ) -> Result<SellerCategory, RepositoryError> {
        let id: SellerCategoryId = sqlx::query_scalar(
            r"
            INSERT INTO shop.seller_category (seller_id, name, description, is_active)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            ",
        )
        .bind(seller_id)
        .bind(input.name.trim())
        .bind(input.description.as_deref())
        .bind(input.is_active.unwrap_or(true))
        .fetch_one(self.pool)
        .await?;

        self.get(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category doesn't exist.
    pub async fn update(
        &self,
        id: SellerCategoryId,
        input: &SellerCategoryInput,
    ) -> Result<SellerCategory, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE shop.seller_category
            SET name = $2, description = $3, is_active = COALESCE($4, is_active)
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(input.name.trim())
        .bind(input.description.as_deref())
        .bind(input.is_active)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        self.get(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Delete a category; its products keep existing without one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category doesn't exist.
    pub async fn delete(&self, id: SellerCategoryId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.seller_category WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

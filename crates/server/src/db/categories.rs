//! Platform category repository.

use sqlx::PgPool;

use shopx_core::{CategoryId, PageRequest};

use super::{RepositoryError, search_term, unique_violation};
use crate::models::catalog::{Category, CategoryInput};

/// Repository for platform categories.
pub struct CategoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CategoryRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Paged listing filtered by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        search: Option<&str>,
        page: PageRequest,
    ) -> Result<(Vec<Category>, i64), RepositoryError> {
        let pattern = search_term(search);

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM shop.category WHERE ($1::text IS NULL OR name ILIKE $1)",
        )
        .bind(pattern.as_deref())
        .fetch_one(self.pool)
        .await?;

        let rows = sqlx::query_as::<_, Category>(
            r"
            SELECT id, name, description, image
            FROM shop.category
            WHERE ($1::text IS NULL OR name ILIKE $1)
            ORDER BY name, id
            LIMIT $2 OFFSET $3
            ",
        )
        .bind(pattern.as_deref())
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        Ok((rows, total))
    }

    /// Every category, by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn all(&self) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query_as::<_, Category>(
            "SELECT id, name, description, image FROM shop.category ORDER BY name, id",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, Category>(
            "SELECT id, name, description, image FROM shop.category WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(row)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the name is taken.
    pub async fn create(&self, input: &CategoryInput) -> Result<Category, RepositoryError> {
        sqlx::query_as::<_, Category>(
            r"
            INSERT INTO shop.category (name, description, image)
            VALUES ($1, $2, $3)
            RETURNING id, name, description, image
            ",
        )
        .bind(input.name.trim())
        .bind(input.description.as_deref())
        .bind(input.image.as_deref())
        .fetch_one(self.pool)
        .await
        .map_err(|e| unique_violation(e, "category name already exists"))
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category doesn't exist.
    /// Returns `RepositoryError::Conflict` if the name is taken.
    pub async fn update(
        &self,
        id: CategoryId,
        input: &CategoryInput,
    ) -> Result<Category, RepositoryError> {
        sqlx::query_as::<_, Category>(
            r"
            UPDATE shop.category
            SET name = $2, description = $3, image = $4
            WHERE id = $1
            RETURNING id, name, description, image
            ",
        )
        .bind(id)
        .bind(input.name.trim())
        .bind(input.description.as_deref())
        .bind(input.image.as_deref())
        .fetch_optional(self.pool)
        .await
        .map_err(|e| unique_violation(e, "category name already exists"))?
        .ok_or(RepositoryError::NotFound)
    }

    /// Move the category's products to the default category, then delete it.
    ///
    /// Returns the number of products reassigned.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category doesn't exist.
    pub async fn delete_reassigning(&self, id: CategoryId) -> Result<u64, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let moved = sqlx::query(
            "UPDATE shop.product SET category_id = $2, updated_at = NOW() WHERE category_id = $1",
        )
        .bind(id)
        .bind(CategoryId::DEFAULT)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let deleted = sqlx::query("DELETE FROM shop.category WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if deleted == 0 {
            return Err(RepositoryError::NotFound);
        }

        tx.commit().await?;
        Ok(moved)
    }
}

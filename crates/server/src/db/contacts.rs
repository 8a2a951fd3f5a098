//! Contact message repository.

use sqlx::PgPool;

use shopx_core::{ContactId, ContactStatus, PageRequest, UserId};

use super::{RepositoryError, search_term};
use crate::models::contact::Contact;

macro_rules! contact_select {
    () => {
        r"
        SELECT ct.id, ct.user_id, u.email AS user_email, u.full_name AS user_name,
               ct.message, ct.status, ct.created_at
        FROM shop.contact ct
        JOIN shop.user u ON u.id = ct.user_id
        "
    };
}

/// Repository for contact messages.
pub struct ContactRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ContactRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, user_id: UserId, message: &str) -> Result<Contact, RepositoryError> {
        let id: ContactId = sqlx::query_scalar(
            "INSERT INTO shop.contact (user_id, message) VALUES ($1, $2) RETURNING id",
        )
        .bind(user_id)
        .bind(message)
        .fetch_one(self.pool)
        .await?;

        self.get(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ContactId) -> Result<Option<Contact>, RepositoryError> {
        let row = sqlx::query_as::<_, Contact>(concat!(contact_select!(), "WHERE ct.id = $1"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(row)
    }

    /// Newest first, filtered by status and sender/message text.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        status: Option<ContactStatus>,
        search: Option<&str>,
        page: PageRequest,
    ) -> Result<(Vec<Contact>, i64), RepositoryError> {
        let pattern = search_term(search);

        let total: i64 = sqlx::query_scalar(
            r"
            SELECT COUNT(*) FROM shop.contact ct
            JOIN shop.user u ON u.id = ct.user_id
            WHERE ($1::shop.contact_status IS NULL OR ct.status = $1)
              AND ($2::text IS NULL OR ct.message ILIKE $2 OR u.email ILIKE $2 OR u.full_name ILIKE $2)
            ",
        )
        .bind(status)
        .bind(pattern.as_deref())
        .fetch_one(self.pool)
        .await?;

        let rows = sqlx::query_as::<_, Contact>(concat!(
            contact_select!(),
            r"
            WHERE ($1::shop.contact_status IS NULL OR ct.status = $1)
              AND ($2::text IS NULL OR ct.message ILIKE $2 OR u.email ILIKE $2 OR u.full_name ILIKE $2)
            ORDER BY ct.created_at DESC, ct.id DESC
            LIMIT $3 OFFSET $4
            "
        ))
        .bind(status)
        .bind(pattern.as_deref())
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        Ok((rows, total))
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the contact doesn't exist.
    pub async fn set_status(&self, id: ContactId, status: ContactStatus) -> Result<Contact, RepositoryError> {
        let result = sqlx::query("UPDATE shop.contact SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        self.get(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the contact doesn't exist.
    pub async fn delete(&self, id: ContactId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.contact WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

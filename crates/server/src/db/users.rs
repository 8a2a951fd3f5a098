//! User repository for database operations.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgConnection, PgPool};

use shopx_core::{Email, PageRequest, Role, SellerId, UserId};

use super::{RepositoryError, search_term, unique_violation};
use crate::models::user::{AdminUserUpdate, NewUser, ProfileUpdate, User, UserSummary};

/// Columns for [`UserRow`], joined with the user's active seller profile.
macro_rules! user_select {
    () => {
        r"
        SELECT u.id, u.email, u.full_name, u.phone, u.birthday, u.gender, u.address,
               u.avatar, u.role, u.is_active, u.social_provider, u.created_at,
               s.id AS seller_id, s.shop_name
        FROM shop.user u
        LEFT JOIN shop.seller s ON s.user_id = u.id AND s.is_active
        "
    };
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: UserId,
    email: String,
    full_name: Option<String>,
    phone: Option<String>,
    birthday: Option<NaiveDate>,
    gender: Option<bool>,
    address: Option<String>,
    avatar: Option<String>,
    role: Role,
    is_active: bool,
    social_provider: Option<String>,
    created_at: DateTime<Utc>,
    seller_id: Option<SellerId>,
    shop_name: Option<String>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(r: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&r.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: r.id,
            email,
            full_name: r.full_name,
            phone: r.phone,
            birthday: r.birthday,
            gender: r.gender,
            address: r.address,
            avatar: r.avatar,
            role: r.role,
            is_active: r.is_active,
            social_provider: r.social_provider,
            created_at: r.created_at,
            seller_id: r.seller_id,
            shop_name: r.shop_name,
        })
    }
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the email in the database is invalid.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        sqlx::query_as::<_, UserRow>(concat!(user_select!(), "WHERE u.id = $1"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    /// Get a user by their email address (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the email in the database is invalid.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        sqlx::query_as::<_, UserRow>(concat!(user_select!(), "WHERE LOWER(u.email) = $1"))
            .bind(email.as_str())
            .fetch_optional(self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    /// Get a user linked to a social login.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_social(
        &self,
        provider: &str,
        social_id: &str,
    ) -> Result<Option<User>, RepositoryError> {
        sqlx::query_as::<_, UserRow>(concat!(
            user_select!(),
            "WHERE u.social_provider = $1 AND u.social_id = $2"
        ))
        .bind(provider)
        .bind(social_id)
        .fetch_optional(self.pool)
        .await?
        .map(User::try_from)
        .transpose()
    }

    /// Get a user with their password hash for login.
    ///
    /// Returns `None` if the user doesn't exist. The hash is `None` for
    /// accounts created through social login.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, Option<String>)>, RepositoryError> {
        let Some(user) = self.get_by_email(email).await? else {
            return Ok(None);
        };
        let hash = self.password_hash_for(user.id).await?;
        Ok(Some((user, hash)))
    }

    /// Get the stored password hash for a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn password_hash_for(&self, id: UserId) -> Result<Option<String>, RepositoryError> {
        let hash: Option<Option<String>> =
            sqlx::query_scalar("SELECT password_hash FROM shop.user WHERE id = $1")
                .bind(id)
                .fetch_optional(self.pool)
                .await?;
        Ok(hash.flatten())
    }

    /// Create a new user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, new: &NewUser) -> Result<User, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        let id = insert_user(&mut conn, new).await?;
        drop(conn);

        self.get_by_id(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Attach a social identity to an existing account.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the identity is linked elsewhere.
    pub async fn link_social(
        &self,
        id: UserId,
        provider: &str,
        social_id: &str,
    ) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE shop.user SET social_provider = $2, social_id = $3 WHERE id = $1")
            .bind(id)
            .bind(provider)
            .bind(social_id)
            .execute(self.pool)
            .await
            .map_err(|e| unique_violation(e, "social account already linked"))?;
        Ok(())
    }

    /// Replace a user's password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    pub async fn update_password(&self, id: UserId, hash: &str) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE shop.user SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(hash)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Apply a profile update; absent fields are left unchanged.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    pub async fn update_profile(
        &self,
        id: UserId,
        update: &ProfileUpdate,
    ) -> Result<User, RepositoryError> {
        self.apply_update(id, update, None).await
    }

    /// Apply an admin edit; absent fields are left unchanged.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    pub async fn admin_update(
        &self,
        id: UserId,
        update: &AdminUserUpdate,
    ) -> Result<User, RepositoryError> {
        self.apply_update(id, &update.profile, update.is_active).await
    }

    async fn apply_update(
        &self,
        id: UserId,
        p: &ProfileUpdate,
        is_active: Option<bool>,
    ) -> Result<User, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE shop.user
            SET full_name = COALESCE($2, full_name),
                phone     = COALESCE($3, phone),
                birthday  = COALESCE($4, birthday),
                gender    = COALESCE($5, gender),
                address   = COALESCE($6, address),
                avatar    = COALESCE($7, avatar),
                is_active = COALESCE($8, is_active)
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(p.full_name.as_deref())
        .bind(p.phone.as_deref())
        .bind(p.birthday)
        .bind(p.gender)
        .bind(p.address.as_deref())
        .bind(p.avatar.as_deref())
        .bind(is_active)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        self.get_by_id(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// List users for the admin screen.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        search: Option<&str>,
        role: Option<Role>,
        is_active: Option<bool>,
        page: PageRequest,
    ) -> Result<(Vec<UserSummary>, i64), RepositoryError> {
        let pattern = search_term(search);

        let total: i64 = sqlx::query_scalar(
            r"
            SELECT COUNT(*) FROM shop.user u
            WHERE ($1::text IS NULL OR u.email ILIKE $1 OR u.full_name ILIKE $1 OR u.phone ILIKE $1)
              AND ($2::shop.user_role IS NULL OR u.role = $2)
              AND ($3::bool IS NULL OR u.is_active = $3)
            ",
        )
        .bind(pattern.as_deref())
        .bind(role)
        .bind(is_active)
        .fetch_one(self.pool)
        .await?;

        let rows = sqlx::query_as::<_, UserSummary>(
            r"
            SELECT u.id, u.email, u.full_name, u.phone, u.role, u.is_active, u.created_at,
                   s.shop_name
            FROM shop.user u
            LEFT JOIN shop.seller s ON s.user_id = u.id AND s.is_active
            WHERE ($1::text IS NULL OR u.email ILIKE $1 OR u.full_name ILIKE $1 OR u.phone ILIKE $1)
              AND ($2::shop.user_role IS NULL OR u.role = $2)
              AND ($3::bool IS NULL OR u.is_active = $3)
            ORDER BY u.created_at DESC, u.id DESC
            LIMIT $4 OFFSET $5
            ",
        )
        .bind(pattern.as_deref())
        .bind(role)
        .bind(is_active)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        Ok((rows, total))
    }

    /// Whether the user has placed any order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn has_orders(&self, id: UserId) -> Result<bool, RepositoryError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM shop.order WHERE user_id = $1)")
                .bind(id)
                .fetch_one(self.pool)
                .await?;
        Ok(exists)
    }

    /// Delete a user. Returns `false` if no such user existed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: UserId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.user WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Insert a user row on an existing connection and return its ID.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if the email already exists.
pub async fn insert_user(conn: &mut PgConnection, new: &NewUser) -> Result<UserId, RepositoryError> {
    sqlx::query_scalar(
        r"
        INSERT INTO shop.user
            (email, password_hash, full_name, phone, address, avatar, role, is_active,
             social_provider, social_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING id
        ",
    )
    .bind(new.email.as_str())
    .bind(new.password_hash.as_deref())
    .bind(new.full_name.as_deref())
    .bind(new.phone.as_deref())
    .bind(new.address.as_deref())
    .bind(new.avatar.as_deref())
    .bind(new.role)
    .bind(new.is_active)
    .bind(new.social_provider.as_deref())
    .bind(new.social_id.as_deref())
    .fetch_one(conn)
    .await
    .map_err(|e| unique_violation(e, "email already exists"))
}

/// Change a user's role inside a transaction.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the user doesn't exist.
pub async fn set_role(conn: &mut PgConnection, id: UserId, role: Role) -> Result<(), RepositoryError> {
    let result = sqlx::query("UPDATE shop.user SET role = $2 WHERE id = $1")
        .bind(id)
        .bind(role)
        .execute(conn)
        .await?;
    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound);
    }
    Ok(())
}

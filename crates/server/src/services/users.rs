//! Admin account management.

use sqlx::PgPool;
use tracing::instrument;

use shopx_core::{Email, PageRequest, Paged, Role, UserId};

use super::auth::{hash_password, validate_password};
use super::sellers::normalize_shop_name;
use super::{ServiceError, ServiceResult};
use crate::db::RepositoryError;
use crate::db::sellers;
use crate::db::users::{self, UserRepository};
use crate::models::user::{
    AdminUserCreate, AdminUserUpdate, NewUser, SetRoleRequest, User, UserFilter, UserSummary,
};

/// Parse an optional role filter.
///
/// # Errors
///
/// Returns `ServiceError::InvalidArgument` for an unknown role.
pub fn parse_role(value: Option<&str>) -> ServiceResult<Option<Role>> {
    value
        .map(str::parse::<Role>)
        .transpose()
        .map_err(|e| ServiceError::InvalidArgument(e.to_string()))
}

pub struct UserService<'a> {
    pool: &'a PgPool,
    users: UserRepository<'a>,
}

impl<'a> UserService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            pool,
            users: UserRepository::new(pool),
        }
    }

    /// # Errors
    ///
    /// Returns `ServiceError::InvalidArgument` for an unknown role filter.
    pub async fn list(
        &self,
        filter: &UserFilter,
        page: PageRequest,
    ) -> ServiceResult<Paged<UserSummary>> {
        let role = parse_role(filter.role.as_deref())?;
        let page = page.normalized();
        let (items, total) = self
            .users
            .list(filter.search.as_deref(), role, filter.is_active, page)
            .await?;
        Ok(Paged::new(items, page, total))
    }

    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the user doesn't exist.
    pub async fn get(&self, id: UserId) -> ServiceResult<User> {
        self.users
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("user", id))
    }

    /// Create an account with any role; sellers get their shop in the same
    /// transaction.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::InvalidArgument` for a bad email, weak password or
    /// missing shop name, and `ServiceError::Conflict` for a taken email.
    #[instrument(skip_all, fields(email = %input.email, role = %input.role))]
    pub async fn create(&self, input: &AdminUserCreate) -> ServiceResult<User> {
        let email =
            Email::parse(&input.email).map_err(|e| ServiceError::InvalidArgument(e.to_string()))?;
        validate_password(&input.password)
            .map_err(|e| ServiceError::InvalidArgument(e.to_string()))?;
        let shop_name = match input.role {
            Role::Seller => Some(normalize_shop_name(input.shop_name.as_deref().unwrap_or(""))?),
            Role::Customer | Role::Admin => None,
        };
        let password_hash = hash_password(&input.password)
            .map_err(|e| ServiceError::Internal(e.to_string()))?;

        let new = NewUser {
            email,
            password_hash: Some(password_hash),
            full_name: input.full_name.clone(),
            phone: input.phone.clone(),
            address: input.address.clone(),
            avatar: None,
            role: input.role,
            is_active: true,
            social_provider: None,
            social_id: None,
        };

        let mut tx = self.pool.begin().await?;
        let id = users::insert_user(&mut tx, &new).await.map_err(conflict)?;
        if let Some(shop_name) = shop_name {
            sellers::create(&mut tx, id, shop_name).await.map_err(conflict)?;
        }
        tx.commit().await?;

        tracing::info!(user_id = %id, "Admin created account");
        self.get(id).await
    }

    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the user doesn't exist.
    #[instrument(skip(self, update))]
    pub async fn update(&self, id: UserId, update: &AdminUserUpdate) -> ServiceResult<User> {
        self.users.admin_update(id, update).await.map_err(|e| match e {
            RepositoryError::NotFound => ServiceError::not_found("user", id),
            other => ServiceError::Repository(other),
        })
    }

    /// Delete an account that never ordered.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::InvalidOperation` when deleting oneself or an
    /// account with orders, and `ServiceError::NotFound` if it doesn't exist.
    #[instrument(skip(self))]
    pub async fn delete(&self, actor: UserId, id: UserId) -> ServiceResult<()> {
        if actor == id {
            return Err(ServiceError::InvalidOperation(
                "you cannot delete your own account".to_owned(),
            ));
        }
        if self.users.has_orders(id).await? {
            return Err(ServiceError::InvalidOperation(
                "user has orders; deactivate the account instead".to_owned(),
            ));
        }
        if !self.users.delete(id).await? {
            return Err(ServiceError::not_found("user", id));
        }
        tracing::info!("Deleted account");
        Ok(())
    }

    /// Change a user's role, keeping the seller profile in step.
    ///
    /// Becoming a seller reuses an existing profile or needs a shop name to
    /// create one; leaving the seller role deactivates the profile.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::InvalidArgument` for an unknown role or a missing
    /// shop name, `ServiceError::InvalidOperation` when changing one's own role,
    /// and `ServiceError::NotFound` when the account does not exist.
    #[instrument(skip(self, request), fields(role = %request.role))]
    pub async fn set_role(
        &self,
        actor: UserId,
        id: UserId,
        request: &SetRoleRequest,
    ) -> ServiceResult<User> {
        let role: Role = request
            .role
            .parse()
            .map_err(|e: shopx_core::ParseEnumError| ServiceError::InvalidArgument(e.to_string()))?;
        if actor == id {
            return Err(ServiceError::InvalidOperation(
                "you cannot change your own role".to_owned(),
            ));
        }
        let shop_name = request
            .shop_name
            .as_deref()
            .map(normalize_shop_name)
            .transpose()?;
        if self.users.get_by_id(id).await?.is_none() {
            return Err(ServiceError::not_found("user", id));
        }

        let mut tx = self.pool.begin().await?;
        let profile = sellers::get_by_user(&mut tx, id).await?;
        match (role, profile) {
            (Role::Seller, Some(existing)) => {
                sellers::reactivate(&mut tx, existing.id, shop_name).await?;
            }
            (Role::Seller, None) => {
                let shop_name = shop_name.ok_or_else(|| {
                    ServiceError::InvalidArgument("shop name is required for sellers".to_owned())
                })?;
                sellers::create(&mut tx, id, shop_name).await.map_err(conflict)?;
            }
            (Role::Customer | Role::Admin, _) => {
                sellers::deactivate_for_user(&mut tx, id).await?;
            }
        }
        users::set_role(&mut tx, id, role).await.map_err(|e| match e {
            RepositoryError::NotFound => ServiceError::not_found("user", id),
            other => ServiceError::Repository(other),
        })?;
        tx.commit().await?;

        tracing::info!("Changed account role");
        self.get(id).await
    }
}

fn conflict(e: RepositoryError) -> ServiceError {
    match e {
        RepositoryError::Conflict(msg) => ServiceError::Conflict(msg),
        other => ServiceError::Repository(other),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_role() {
        assert_eq!(parse_role(None).unwrap(), None);
        assert_eq!(parse_role(Some("Seller")).unwrap(), Some(Role::Seller));
        assert!(matches!(
            parse_role(Some("owner")),
            Err(ServiceError::InvalidArgument(_))
        ));
    }
}

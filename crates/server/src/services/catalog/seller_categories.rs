//! A seller's own product groupings.

use sqlx::PgPool;
use tracing::instrument;

use shopx_core::{SellerCategoryId, SellerId};

use super::require_name;
use crate::db::seller_categories::SellerCategoryRepository;
use crate::models::catalog::{SellerCategory, SellerCategoryInput};
use crate::services::{ServiceError, ServiceResult};

pub struct SellerCategoryService<'a> {
    categories: SellerCategoryRepository<'a>,
}

impl<'a> SellerCategoryService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            categories: SellerCategoryRepository::new(pool),
        }
    }

    /// Active categories of a shop, for its public page.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the query fails.
    pub async fn public_list(&self, seller_id: SellerId) -> ServiceResult<Vec<SellerCategory>> {
        Ok(self.categories.list_for_seller(seller_id, false).await?)
    }

    /// All of the seller's categories, inactive included.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the query fails.
    pub async fn list_own(&self, seller_id: SellerId) -> ServiceResult<Vec<SellerCategory>> {
        Ok(self.categories.list_for_seller(seller_id, true).await?)
    }

    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the category doesn't exist and
    /// `ServiceError::Forbidden` if another seller owns it.
    pub async fn get_own(
        &self,
        seller_id: SellerId,
        id: SellerCategoryId,
    ) -> ServiceResult<SellerCategory> {
        let category = self
            .categories
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("seller category", id))?;
        if category.seller_id != seller_id {
            return Err(ServiceError::Forbidden(
                "this category belongs to another shop".to_owned(),
            ));
        }
        Ok(category)
    }

    /// # Errors
    ///
    /// Returns `ServiceError::InvalidArgument` for a blank name.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(
        &self,
        seller_id: SellerId,
        input: &SellerCategoryInput,
    ) -> ServiceResult<SellerCategory> {
        require_name(&input.name, "category")?;
        Ok(self.categories.create(seller_id, input).await?)
    }

    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` or `ServiceError::Forbidden` unless the
    /// seller owns the category.
    #[instrument(skip(self, input))]
    pub async fn update(
        &self,
        seller_id: SellerId,
        id: SellerCategoryId,
        input: &SellerCategoryInput,
    ) -> ServiceResult<SellerCategory> {
        require_name(&input.name, "category")?;
        self.get_own(seller_id, id).await?;
        Ok(self.categories.update(id, input).await?)
    }

    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` or `ServiceError::Forbidden` unless the
    /// seller owns the category.
    #[instrument(skip(self))]
    pub async fn delete(&self, seller_id: SellerId, id: SellerCategoryId) -> ServiceResult<()> {
        self.get_own(seller_id, id).await?;
        self.categories.delete(id).await?;
        Ok(())
    }
}

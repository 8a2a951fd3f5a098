//! Catalog services: platform categories, seller categories and products.

mod categories;
mod products;
mod seller_categories;

pub use categories::{CategoryCache, CategoryService};
pub use products::{ProductService, validate_product};
pub use seller_categories::SellerCategoryService;

use super::ServiceError;
use crate::db::RepositoryError;

fn conflict(e: RepositoryError) -> ServiceError {
    match e {
        RepositoryError::Conflict(msg) => ServiceError::Conflict(msg),
        other => ServiceError::Repository(other),
    }
}

fn require_name(name: &str, what: &str) -> Result<(), ServiceError> {
    let len = name.trim().chars().count();
    if len == 0 {
        return Err(ServiceError::InvalidArgument(format!("{what} name is required")));
    }
    if len > 100 {
        return Err(ServiceError::InvalidArgument(format!(
            "{what} name must be at most 100 characters"
        )));
    }
    Ok(())
}

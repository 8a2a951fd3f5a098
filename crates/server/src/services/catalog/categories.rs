//! Platform categories with a cached "all categories" list.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;
use tracing::instrument;

use shopx_core::{CategoryId, PageRequest, Paged};

use super::{conflict, require_name};
use crate::db::categories::CategoryRepository;
use crate::models::catalog::{Category, CategoryInput};
use crate::services::{ServiceError, ServiceResult};

/// Cache for the full category list.
///
/// Holds a single entry; admin writes invalidate it.
#[derive(Clone)]
pub struct CategoryCache {
    inner: Cache<(), Arc<Vec<Category>>>,
}

impl CategoryCache {
    /// Create a cache whose entry lives for at most `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Cache::builder().max_capacity(1).time_to_live(ttl).build(),
        }
    }

    async fn get(&self) -> Option<Arc<Vec<Category>>> {
        self.inner.get(&()).await
    }

    async fn put(&self, categories: Arc<Vec<Category>>) {
        self.inner.insert((), categories).await;
    }

    /// Drop the cached list.
    pub async fn invalidate(&self) {
        self.inner.invalidate(&()).await;
    }
}

impl Default for CategoryCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(300))
    }
}

impl std::fmt::Debug for CategoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CategoryCache")
            .field("entries", &self.inner.entry_count())
            .finish()
    }
}

/// Category reads for everyone, writes for admins.
pub struct CategoryService<'a> {
    categories: CategoryRepository<'a>,
    cache: &'a CategoryCache,
}

impl<'a> CategoryService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, cache: &'a CategoryCache) -> Self {
        Self {
            categories: CategoryRepository::new(pool),
            cache,
        }
    }

    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the query fails.
    pub async fn list(
        &self,
        search: Option<&str>,
        page: PageRequest,
    ) -> ServiceResult<Paged<Category>> {
        let page = page.normalized();
        let (items, total) = self.categories.list(search, page).await?;
        Ok(Paged::new(items, page, total))
    }

    /// Every category, served from the cache when warm.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the query fails.
    pub async fn all(&self) -> ServiceResult<Arc<Vec<Category>>> {
        if let Some(cached) = self.cache.get().await {
            return Ok(cached);
        }
        let fresh = Arc::new(self.categories.all().await?);
        self.cache.put(Arc::clone(&fresh)).await;
        Ok(fresh)
    }

    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the category doesn't exist.
    pub async fn get(&self, id: CategoryId) -> ServiceResult<Category> {
        self.categories
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("category", id))
    }

    /// # Errors
    ///
    /// Returns `ServiceError::Conflict` if the name is taken.
    #[instrument(skip_all, fields(name = %input.name))]
    pub async fn create(&self, input: &CategoryInput) -> ServiceResult<Category> {
        require_name(&input.name, "category")?;
        let category = self.categories.create(input).await.map_err(conflict)?;
        self.cache.invalidate().await;
        tracing::info!(category_id = %category.id, "Created category");
        Ok(category)
    }

    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the category doesn't exist and
    /// `ServiceError::Conflict` if the name is taken.
    #[instrument(skip(self, input))]
    pub async fn update(&self, id: CategoryId, input: &CategoryInput) -> ServiceResult<Category> {
        require_name(&input.name, "category")?;
        let category = self.categories.update(id, input).await.map_err(|e| match e {
            crate::db::RepositoryError::NotFound => ServiceError::not_found("category", id),
            other => conflict(other),
        })?;
        self.cache.invalidate().await;
        Ok(category)
    }

    /// Delete a category, moving its products to the default category.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::InvalidOperation` for the default category and
    /// `ServiceError::NotFound` if the category doesn't exist.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: CategoryId) -> ServiceResult<()> {
        if id == CategoryId::DEFAULT {
            return Err(ServiceError::InvalidOperation(
                "the default category cannot be deleted".to_owned(),
            ));
        }
        let moved = self
            .categories
            .delete_reassigning(id)
            .await
            .map_err(|e| match e {
                crate::db::RepositoryError::NotFound => ServiceError::not_found("category", id),
                other => ServiceError::Repository(other),
            })?;
        self.cache.invalidate().await;
        tracing::info!(moved, "Deleted category");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn category(id: i32, name: &str) -> Category {
        Category {
            id: CategoryId::new(id),
            name: name.to_owned(),
            description: None,
            image: None,
        }
    }

    #[tokio::test]
    async fn test_cache_roundtrip_and_invalidate() {
        let cache = CategoryCache::default();
        assert!(cache.get().await.is_none());

        cache
            .put(Arc::new(vec![category(1, "General"), category(2, "Books")]))
            .await;
        let cached = cache.get().await.unwrap();
        assert_eq!(cached.len(), 2);
        assert_eq!(cached[1].name, "Books");

        cache.invalidate().await;
        assert!(cache.get().await.is_none());
    }

    #[test]
    fn test_require_name() {
        assert!(require_name("Books", "category").is_ok());
        assert!(matches!(
            require_name("   ", "category"),
            Err(ServiceError::InvalidArgument(_))
        ));
        assert!(require_name(&"x".repeat(101), "category").is_err());
    }
}

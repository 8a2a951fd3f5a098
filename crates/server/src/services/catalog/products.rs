//! Product listings for shoppers and product management for sellers.

use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::instrument;

use shopx_core::{CategoryId, PageRequest, Paged, ProductId, SellerId};

use crate::db::categories::CategoryRepository;
use crate::db::products::{ProductQuery, ProductRepository};
use crate::db::seller_categories::SellerCategoryRepository;
use crate::db::sellers::SellerRepository;
use crate::models::catalog::{Product, ProductFilter, ProductInput, ProductSort, SellerProductFilter};
use crate::services::{ServiceError, ServiceResult};

/// Field checks for a product body.
///
/// # Errors
///
/// Returns `ServiceError::InvalidArgument` naming the first bad field.
pub fn validate_product(input: &ProductInput) -> ServiceResult<()> {
    super::require_name(&input.name, "product")?;
    if input.price < Decimal::ZERO {
        return Err(ServiceError::InvalidArgument(
            "price cannot be negative".to_owned(),
        ));
    }
    if input.stock_quantity < 0 {
        return Err(ServiceError::InvalidArgument(
            "stock quantity cannot be negative".to_owned(),
        ));
    }
    Ok(())
}

fn check_price_range(min: Option<Decimal>, max: Option<Decimal>) -> ServiceResult<()> {
    if let (Some(min), Some(max)) = (min, max)
        && min > max
    {
        return Err(ServiceError::InvalidArgument(
            "min_price cannot exceed max_price".to_owned(),
        ));
    }
    Ok(())
}

pub struct ProductService<'a> {
    products: ProductRepository<'a>,
    categories: CategoryRepository<'a>,
    seller_categories: SellerCategoryRepository<'a>,
    sellers: SellerRepository<'a>,
}

impl<'a> ProductService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            products: ProductRepository::new(pool),
            categories: CategoryRepository::new(pool),
            seller_categories: SellerCategoryRepository::new(pool),
            sellers: SellerRepository::new(pool),
        }
    }

    /// Storefront listing: active products from active shops.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::InvalidArgument` for an inverted price range.
    pub async fn list(
        &self,
        filter: &ProductFilter,
        page: PageRequest,
    ) -> ServiceResult<Paged<Product>> {
        check_price_range(filter.min_price, filter.max_price)?;
        let query = ProductQuery {
            search: filter.search.as_deref(),
            category_id: filter.category_id,
            seller_id: filter.seller_id,
            seller_category_id: filter.seller_category_id,
            min_price: filter.min_price,
            max_price: filter.max_price,
            is_active: None,
            storefront_only: true,
            sort: ProductSort::from_param(filter.sort.as_deref()),
        };
        self.page(&query, page).await
    }

    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the category doesn't exist.
    pub async fn by_category(
        &self,
        category_id: CategoryId,
        sort: Option<&str>,
        page: PageRequest,
    ) -> ServiceResult<Paged<Product>> {
        if self.categories.get(category_id).await?.is_none() {
            return Err(ServiceError::not_found("category", category_id));
        }
        let query = ProductQuery {
            category_id: Some(category_id),
            storefront_only: true,
            sort: ProductSort::from_param(sort),
            ..ProductQuery::default()
        };
        self.page(&query, page).await
    }

    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` unless the shop exists and is active.
    pub async fn by_seller(
        &self,
        seller_id: SellerId,
        filter: &SellerProductFilter,
        page: PageRequest,
    ) -> ServiceResult<Paged<Product>> {
        if self.sellers.get_active(seller_id).await?.is_none() {
            return Err(ServiceError::not_found("seller", seller_id));
        }
        let query = ProductQuery {
            search: filter.search.as_deref(),
            seller_id: Some(seller_id),
            seller_category_id: filter.seller_category_id,
            storefront_only: true,
            sort: ProductSort::from_param(filter.sort.as_deref()),
            ..ProductQuery::default()
        };
        self.page(&query, page).await
    }

    /// Product page; hidden products read as missing.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the product doesn't exist or is inactive.
    pub async fn detail(&self, id: ProductId) -> ServiceResult<Product> {
        self.products
            .get(id)
            .await?
            .filter(|p| p.is_active)
            .ok_or_else(|| ServiceError::not_found("product", id))
    }

    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the query fails.
    pub async fn best_selling(&self, limit: i64) -> ServiceResult<Vec<Product>> {
        Ok(self.products.top(ProductSort::BestSelling, limit).await?)
    }

    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the query fails.
    pub async fn newest(&self, limit: i64) -> ServiceResult<Vec<Product>> {
        Ok(self.products.top(ProductSort::Newest, limit).await?)
    }

    /// The seller's own catalog, inactive products included.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the query fails.
    pub async fn seller_list(
        &self,
        seller_id: SellerId,
        filter: &SellerProductFilter,
        page: PageRequest,
    ) -> ServiceResult<Paged<Product>> {
        let query = ProductQuery {
            search: filter.search.as_deref(),
            seller_id: Some(seller_id),
            seller_category_id: filter.seller_category_id,
            is_active: filter.is_active,
            sort: ProductSort::from_param(filter.sort.as_deref()),
            ..ProductQuery::default()
        };
        self.page(&query, page).await
    }

    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` or `ServiceError::Forbidden` unless the
    /// seller owns the product.
    pub async fn get_own(&self, seller_id: SellerId, id: ProductId) -> ServiceResult<Product> {
        let product = self
            .products
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("product", id))?;
        if product.seller_id != seller_id {
            return Err(ServiceError::Forbidden(
                "this product belongs to another shop".to_owned(),
            ));
        }
        Ok(product)
    }

    /// # Errors
    ///
    /// Returns `ServiceError::InvalidArgument` for bad fields or references
    /// to categories the seller can't use.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(&self, seller_id: SellerId, input: &ProductInput) -> ServiceResult<Product> {
        validate_product(input)?;
        self.check_references(seller_id, input).await?;
        let product = self.products.create(seller_id, input).await?;
        tracing::info!(product_id = %product.id, "Created product");
        Ok(product)
    }

    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` or `ServiceError::Forbidden` unless the
    /// seller owns the product, and `ServiceError::InvalidArgument` for bad fields.
    #[instrument(skip(self, input))]
    pub async fn update(
        &self,
        seller_id: SellerId,
        id: ProductId,
        input: &ProductInput,
    ) -> ServiceResult<Product> {
        validate_product(input)?;
        self.get_own(seller_id, id).await?;
        self.check_references(seller_id, input).await?;
        Ok(self.products.update(id, input).await?)
    }

    /// Hide a product, or remove it for good with `hard` when it was never ordered.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::InvalidOperation` for a hard delete of an
    /// ordered product.
    #[instrument(skip(self))]
    pub async fn delete(&self, seller_id: SellerId, id: ProductId, hard: bool) -> ServiceResult<()> {
        self.get_own(seller_id, id).await?;
        if !hard {
            self.products.set_active(id, false).await?;
            tracing::info!("Deactivated product");
            return Ok(());
        }
        if self.products.ever_ordered(id).await? {
            return Err(ServiceError::InvalidOperation(
                "product has orders and can only be deactivated".to_owned(),
            ));
        }
        self.products.delete(id).await?;
        tracing::info!("Deleted product");
        Ok(())
    }

    async fn check_references(&self, seller_id: SellerId, input: &ProductInput) -> ServiceResult<()> {
        if self.categories.get(input.category_id).await?.is_none() {
            return Err(ServiceError::InvalidArgument(format!(
                "category {} does not exist",
                input.category_id
            )));
        }
        if let Some(sc_id) = input.seller_category_id {
            let owned = self
                .seller_categories
                .get(sc_id)
                .await?
                .is_some_and(|sc| sc.seller_id == seller_id);
            if !owned {
                return Err(ServiceError::InvalidArgument(format!(
                    "seller category {sc_id} does not belong to this shop"
                )));
            }
        }
        Ok(())
    }

    async fn page(&self, query: &ProductQuery<'_>, page: PageRequest) -> ServiceResult<Paged<Product>> {
        let page = page.normalized();
        let (items, total) = self.products.list(query, page).await?;
        Ok(Paged::new(items, page, total))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn input(price: &str, stock: i32) -> ProductInput {
        ProductInput {
            name: "Mug".to_owned(),
            description: None,
            image_url: None,
            price: price.parse().unwrap(),
            stock_quantity: stock,
            category_id: CategoryId::DEFAULT,
            seller_category_id: None,
            is_active: None,
        }
    }

    #[test]
    fn test_validate_product() {
        assert!(validate_product(&input("9.50", 3)).is_ok());
        assert!(validate_product(&input("0", 0)).is_ok());
        assert!(validate_product(&input("-1", 3)).is_err());
        assert!(validate_product(&input("1", -3)).is_err());

        let mut blank = input("1", 1);
        blank.name = " ".to_owned();
        assert!(matches!(
            validate_product(&blank),
            Err(ServiceError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_price_range() {
        let ten: Decimal = "10".parse().unwrap();
        let five: Decimal = "5".parse().unwrap();
        assert!(check_price_range(Some(five), Some(ten)).is_ok());
        assert!(check_price_range(Some(ten), None).is_ok());
        assert!(check_price_range(Some(ten), Some(five)).is_err());
    }
}

//! Product repository.

use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use shopx_core::{CategoryId, PageRequest, ProductId, SellerCategoryId, SellerId};

use super::{RepositoryError, revenue_statuses, search_term};
use crate::models::catalog::{Product, ProductInput, ProductSort};

macro_rules! product_from {
    () => {
        concat!(
            r"
            FROM shop.product p
            JOIN shop.category c ON c.id = p.category_id
            JOIN shop.seller s ON s.id = p.seller_id
            LEFT JOIN shop.seller_category sc ON sc.id = p.seller_category_id
            LEFT JOIN LATERAL (
                SELECT COALESCE(SUM(od.quantity), 0)::bigint AS sold_quantity
                FROM shop.order_detail od
                JOIN shop.order o ON o.id = od.order_id
                WHERE od.product_id = p.id AND o.status IN ",
            revenue_statuses!(),
            r"
            ) sold ON TRUE
            "
        )
    };
}

macro_rules! product_columns {
    () => {
        r"
        SELECT p.id, p.name, p.description, p.image_url, p.price, p.stock_quantity,
               p.is_active, p.created_at, p.updated_at,
               p.category_id, c.name AS category_name,
               p.seller_id, s.shop_name,
               p.seller_category_id, sc.name AS seller_category_name,
               sold.sold_quantity
        "
    };
}

/// Filters for [`ProductRepository::list`].
#[derive(Debug, Clone, Default)]
pub struct ProductQuery<'q> {
    pub search: Option<&'q str>,
    pub category_id: Option<CategoryId>,
    pub seller_id: Option<SellerId>,
    pub seller_category_id: Option<SellerCategoryId>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub is_active: Option<bool>,
    /// Only products a shopper can see: active product from an active shop.
    pub storefront_only: bool,
    pub sort: ProductSort,
}

const PRODUCT_WHERE: &str = r"
    WHERE ($1::text IS NULL OR p.name ILIKE $1 OR p.description ILIKE $1)
      AND ($2::int IS NULL OR p.category_id = $2)
      AND ($3::int IS NULL OR p.seller_id = $3)
      AND ($4::int IS NULL OR p.seller_category_id = $4)
      AND ($5::numeric IS NULL OR p.price >= $5)
      AND ($6::numeric IS NULL OR p.price <= $6)
      AND ($7::bool IS NULL OR p.is_active = $7)
      AND (NOT $8 OR (p.is_active AND s.is_active))
";

/// A product row locked for update during checkout or restocking.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LockedProduct {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub stock_quantity: i32,
    pub is_active: bool,
    pub seller_id: SellerId,
}

/// Repository for products.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Filtered, sorted, paged product listing.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        query: &ProductQuery<'_>,
        page: PageRequest,
    ) -> Result<(Vec<Product>, i64), RepositoryError> {
        let pattern = search_term(query.search);

        let count_sql = format!(
            "SELECT COUNT(*) FROM shop.product p JOIN shop.seller s ON s.id = p.seller_id {PRODUCT_WHERE}"
        );
        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(pattern.as_deref())
            .bind(query.category_id)
            .bind(query.seller_id)
            .bind(query.seller_category_id)
            .bind(query.min_price)
            .bind(query.max_price)
            .bind(query.is_active)
            .bind(query.storefront_only)
            .fetch_one(self.pool)
            .await?;

        let list_sql = format!(
            "{} {} {PRODUCT_WHERE} ORDER BY {} LIMIT $9 OFFSET $10",
            product_columns!(),
            product_from!(),
            query.sort.order_by()
        );
        let rows = sqlx::query_as::<_, Product>(&list_sql)
            .bind(pattern.as_deref())
            .bind(query.category_id)
            .bind(query.seller_id)
            .bind(query.seller_category_id)
            .bind(query.min_price)
            .bind(query.max_price)
            .bind(query.is_active)
            .bind(query.storefront_only)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(self.pool)
            .await?;

        Ok((rows, total))
    }

    /// First `limit` storefront products in the given order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn top(&self, sort: ProductSort, limit: i64) -> Result<Vec<Product>, RepositoryError> {
        let query = ProductQuery {
            storefront_only: true,
            sort,
            ..ProductQuery::default()
        };
        let (rows, _) = self.list(&query, PageRequest::new(1, limit)).await?;
        Ok(rows)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let sql = concat!(product_columns!(), product_from!(), "WHERE p.id = $1");
        let row = sqlx::query_as::<_, Product>(sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(row)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        seller_id: SellerId,
        input: &ProductInput,
    ) -> Result<Product, RepositoryError> {
        let id: ProductId = sqlx::query_scalar(
            r"
            INSERT INTO shop.product
                (category_id, seller_category_id, seller_id, name, image_url, description,
                 price, stock_quantity, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            ",
        )
        .bind(input.category_id)
        .bind(input.seller_category_id)
        .bind(seller_id)
        .bind(input.name.trim())
        .bind(input.image_url.as_deref())
        .bind(input.description.as_deref())
        .bind(input.price)
        .bind(input.stock_quantity)
        .bind(input.is_active.unwrap_or(true))
        .fetch_one(self.pool)
        .await?;

        self.get(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    pub async fn update(&self, id: ProductId, input: &ProductInput) -> Result<Product, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE shop.product
            SET category_id = $2, seller_category_id = $3, name = $4, image_url = $5,
                description = $6, price = $7, stock_quantity = $8,
                is_active = COALESCE($9, is_active), updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(input.category_id)
        .bind(input.seller_category_id)
        .bind(input.name.trim())
        .bind(input.image_url.as_deref())
        .bind(input.description.as_deref())
        .bind(input.price)
        .bind(input.stock_quantity)
        .bind(input.is_active)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        self.get(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Soft delete or restore.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    pub async fn set_active(&self, id: ProductId, is_active: bool) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE shop.product SET is_active = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(is_active)
        .execute(self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Whether any order line references the product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn ever_ordered(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM shop.order_detail WHERE product_id = $1)",
        )
        .bind(id)
        .fetch_one(self.pool)
        .await?;
        Ok(exists)
    }

    /// Permanently delete a product. Cart lines referencing it cascade.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    pub async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.product WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

/// Lock a product row for the rest of the transaction.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn lock(
    conn: &mut PgConnection,
    id: ProductId,
) -> Result<Option<LockedProduct>, RepositoryError> {
    let row = sqlx::query_as::<_, LockedProduct>(
        r"
        SELECT id, name, price, stock_quantity, is_active, seller_id
        FROM shop.product
        WHERE id = $1
        FOR UPDATE
        ",
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(row)
}

/// Add `delta` (may be negative) to a product's stock.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the update fails, including when
/// the stock would go negative.
pub async fn adjust_stock(
    conn: &mut PgConnection,
    id: ProductId,
    delta: i32,
) -> Result<(), RepositoryError> {
    sqlx::query(
        "UPDATE shop.product SET stock_quantity = stock_quantity + $2, updated_at = NOW() WHERE id = $1",
    )
    .bind(id)
    .bind(delta)
    .execute(conn)
    .await?;
    Ok(())
}

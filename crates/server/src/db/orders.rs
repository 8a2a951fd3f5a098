//! Order repository.
//!
//! Writes happen inside the service's checkout or status-change transaction,
//! so most mutating functions take a `&mut PgConnection`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use shopx_core::{DiscountId, OrderId, OrderStatus, PageRequest, ProductId, SellerId, UserId};

use super::{RepositoryError, search_term};
use crate::models::order::{OrderCustomer, OrderLine, OrderRecord, OrderSort, OrderSummary};

const ORDER_COLUMNS: &str = r"
    id, user_id, discount_id, discount_code, order_date, total_amount, total_payment,
    status, shipping_address
";

/// Which orders a listing may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderScope {
    /// Orders placed by this customer.
    Customer(UserId),
    /// Orders containing at least one of this seller's products.
    Seller(SellerId),
    /// Every order.
    All,
}

/// Resolved filters for [`OrderRepository::list`].
#[derive(Debug, Clone, Default)]
pub struct OrderListQuery<'q> {
    pub search: Option<&'q str>,
    pub status: Option<OrderStatus>,
    pub from: Option<DateTime<Utc>>,
    /// Exclusive upper bound.
    pub until: Option<DateTime<Utc>>,
    pub min_amount: Option<Decimal>,
    pub max_amount: Option<Decimal>,
    pub sort: OrderSort,
}

/// Fields of a new order row.
#[derive(Debug, Clone)]
pub struct NewOrder<'a> {
    pub user_id: UserId,
    pub discount_id: Option<DiscountId>,
    pub discount_code: Option<&'a str>,
    pub order_date: DateTime<Utc>,
    pub total_amount: Decimal,
    pub total_payment: Decimal,
    pub status: OrderStatus,
    pub shipping_address: &'a str,
}

/// Repository for orders.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<OrderRecord>, RepositoryError> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM shop.order WHERE id = $1");
        let row = sqlx::query_as::<_, OrderRecord>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(row)
    }

    /// Lines of an order, optionally restricted to one seller's products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn lines(
        &self,
        order_id: OrderId,
        seller_id: Option<SellerId>,
    ) -> Result<Vec<OrderLine>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderLine>(
            r"
            SELECT od.id, od.product_id, p.name AS product_name, p.image_url,
                   p.category_id, c.name AS category_name,
                   p.seller_id, s.shop_name, s.is_active AS shop_is_active,
                   od.quantity, od.unit_price,
                   p.price AS current_price, p.stock_quantity AS current_stock,
                   p.is_active AS product_is_active
            FROM shop.order_detail od
            JOIN shop.product p ON p.id = od.product_id
            JOIN shop.category c ON c.id = p.category_id
            JOIN shop.seller s ON s.id = p.seller_id
            WHERE od.order_id = $1 AND ($2::int IS NULL OR p.seller_id = $2)
            ORDER BY od.id
            ",
        )
        .bind(order_id)
        .bind(seller_id)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Buyer details for an order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn customer(&self, order_id: OrderId) -> Result<Option<OrderCustomer>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderCustomer>(
            r"
            SELECT u.id AS user_id, u.email, u.full_name, u.phone
            FROM shop.order o
            JOIN shop.user u ON u.id = o.user_id
            WHERE o.id = $1
            ",
        )
        .bind(order_id)
        .fetch_optional(self.pool)
        .await?;
        Ok(row)
    }

    /// Whether the order contains any of the seller's products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn seller_in_order(
        &self,
        order_id: OrderId,
        seller_id: SellerId,
    ) -> Result<bool, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        seller_in_order(&mut conn, order_id, seller_id).await
    }

    /// Filtered, sorted, paged listing within a scope.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        scope: OrderScope,
        query: &OrderListQuery<'_>,
        page: PageRequest,
    ) -> Result<(Vec<OrderSummary>, i64), RepositoryError> {
        let (customer_id, seller_id) = match scope {
            OrderScope::Customer(id) => (Some(id), None),
            OrderScope::Seller(id) => (None, Some(id)),
            OrderScope::All => (None, None),
        };
        let raw_search = query.search.map(str::trim).filter(|s| !s.is_empty());
        let pattern = search_term(raw_search);

        let filter = r"
            WHERE ($1::int IS NULL OR o.user_id = $1)
              AND ($2::int IS NULL OR EXISTS (
                    SELECT 1 FROM shop.order_detail od
                    JOIN shop.product p ON p.id = od.product_id
                    WHERE od.order_id = o.id AND p.seller_id = $2))
              AND ($3::shop.order_status IS NULL OR o.status = $3)
              AND ($4::timestamptz IS NULL OR o.order_date >= $4)
              AND ($5::timestamptz IS NULL OR o.order_date < $5)
              AND ($6::numeric IS NULL OR o.total_amount >= $6)
              AND ($7::numeric IS NULL OR o.total_amount <= $7)
              AND ($8::text IS NULL OR o.id::text = $9 OR u.full_name ILIKE $8 OR u.email ILIKE $8)
        ";

        let count_sql = format!(
            "SELECT COUNT(*) FROM shop.order o JOIN shop.user u ON u.id = o.user_id {filter}"
        );
        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(customer_id)
            .bind(seller_id)
            .bind(query.status)
            .bind(query.from)
            .bind(query.until)
            .bind(query.min_amount)
            .bind(query.max_amount)
            .bind(pattern.as_deref())
            .bind(raw_search)
            .fetch_one(self.pool)
            .await?;

        let list_sql = format!(
            r"
            SELECT o.id, o.order_date, o.total_amount, o.total_payment, o.status,
                   (SELECT COALESCE(SUM(d.quantity), 0) FROM shop.order_detail d
                    WHERE d.order_id = o.id)::bigint AS item_count,
                   u.full_name AS customer_name, u.email AS customer_email
            FROM shop.order o
            JOIN shop.user u ON u.id = o.user_id
            {filter}
            ORDER BY {}
            LIMIT $10 OFFSET $11
            ",
            query.sort.order_by()
        );
        let rows = sqlx::query_as::<_, OrderSummary>(&list_sql)
            .bind(customer_id)
            .bind(seller_id)
            .bind(query.status)
            .bind(query.from)
            .bind(query.until)
            .bind(query.min_amount)
            .bind(query.max_amount)
            .bind(pattern.as_deref())
            .bind(raw_search)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(self.pool)
            .await?;

        Ok((rows, total))
    }

    /// Mark delivered orders whose refund window closed at or before `cutoff`
    /// as completed. Returns the number of orders updated.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn complete_delivered_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            "UPDATE shop.order SET status = $1 WHERE status = $2 AND order_date <= $3",
        )
        .bind(OrderStatus::Completed)
        .bind(OrderStatus::Delivered)
        .bind(cutoff)
        .execute(self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Whether any order used the discount.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn uses_discount(&self, discount_id: DiscountId) -> Result<bool, RepositoryError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM shop.order WHERE discount_id = $1)")
                .bind(discount_id)
                .fetch_one(self.pool)
                .await?;
        Ok(exists)
    }
}

/// Insert an order row and return its ID.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the insert fails.
pub async fn insert(conn: &mut PgConnection, order: &NewOrder<'_>) -> Result<OrderId, RepositoryError> {
    let id: OrderId = sqlx::query_scalar(
        r"
        INSERT INTO shop.order
            (user_id, discount_id, discount_code, order_date, total_amount, total_payment,
             status, shipping_address)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING id
        ",
    )
    .bind(order.user_id)
    .bind(order.discount_id)
    .bind(order.discount_code)
    .bind(order.order_date)
    .bind(order.total_amount)
    .bind(order.total_payment)
    .bind(order.status)
    .bind(order.shipping_address)
    .fetch_one(conn)
    .await?;
    Ok(id)
}

/// Insert one order line.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the insert fails.
pub async fn insert_line(
    conn: &mut PgConnection,
    order_id: OrderId,
    product_id: ProductId,
    quantity: i32,
    unit_price: Decimal,
) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        INSERT INTO shop.order_detail (order_id, product_id, quantity, unit_price)
        VALUES ($1, $2, $3, $4)
        ",
    )
    .bind(order_id)
    .bind(product_id)
    .bind(quantity)
    .bind(unit_price)
    .execute(conn)
    .await?;
    Ok(())
}

/// Lock an order row for a status change.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn lock(conn: &mut PgConnection, id: OrderId) -> Result<Option<OrderRecord>, RepositoryError> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM shop.order WHERE id = $1 FOR UPDATE");
    let row = sqlx::query_as::<_, OrderRecord>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(row)
}

/// Whether the order contains any of the seller's products.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn seller_in_order(
    conn: &mut PgConnection,
    order_id: OrderId,
    seller_id: SellerId,
) -> Result<bool, RepositoryError> {
    let exists: bool = sqlx::query_scalar(
        r"
        SELECT EXISTS(
            SELECT 1 FROM shop.order_detail od
            JOIN shop.product p ON p.id = od.product_id
            WHERE od.order_id = $1 AND p.seller_id = $2
        )
        ",
    )
    .bind(order_id)
    .bind(seller_id)
    .fetch_one(conn)
    .await?;
    Ok(exists)
}

/// `(product, quantity)` for every line of an order.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn line_quantities(
    conn: &mut PgConnection,
    order_id: OrderId,
) -> Result<Vec<(ProductId, i32)>, RepositoryError> {
    let rows: Vec<(ProductId, i32)> = sqlx::query_as(
        "SELECT product_id, quantity FROM shop.order_detail WHERE order_id = $1 ORDER BY product_id",
    )
    .bind(order_id)
    .fetch_all(conn)
    .await?;
    Ok(rows)
}

/// Set an order's status, optionally re-stamping its date.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the update fails.
pub async fn set_status(
    conn: &mut PgConnection,
    id: OrderId,
    status: OrderStatus,
    order_date: Option<DateTime<Utc>>,
) -> Result<(), RepositoryError> {
    sqlx::query(
        "UPDATE shop.order SET status = $2, order_date = COALESCE($3, order_date) WHERE id = $1",
    )
    .bind(id)
    .bind(status)
    .bind(order_date)
    .execute(conn)
    .await?;
    Ok(())
}

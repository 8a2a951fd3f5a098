//! Seller-scoped sales aggregates.
//!
//! Revenue is the sum of a seller's own order lines (`quantity * unit_price`)
//! in revenue-countable orders. Date bounds are half-open: `[from, until)`.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use shopx_core::{OrderStatus, SellerId};

use super::{RepositoryError, revenue_statuses};
use crate::models::stats::{
    DailySalesRow, GroupBy, ProductCounts, ProductSalesRow, RevenuePoint, RevenueTotals,
    SellerOrderSummary, TopCustomer, TopProduct,
};

macro_rules! seller_sales {
    () => {
        concat!(
            r"
            FROM shop.order_detail od
            JOIN shop.order o ON o.id = od.order_id
            JOIN shop.product p ON p.id = od.product_id
            WHERE p.seller_id = $1
              AND o.status IN ",
            revenue_statuses!(),
            r"
              AND ($2::timestamptz IS NULL OR o.order_date >= $2)
              AND ($3::timestamptz IS NULL OR o.order_date < $3)
            "
        )
    };
}

/// Repository for seller statistics.
pub struct StatisticsRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> StatisticsRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Revenue and distinct order count in a window (unbounded sides allowed).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn revenue(
        &self,
        seller_id: SellerId,
        from: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> Result<RevenueTotals, RepositoryError> {
        let row = sqlx::query_as::<_, RevenueTotals>(concat!(
            r"
            SELECT COALESCE(SUM(od.quantity * od.unit_price), 0) AS revenue,
                   COUNT(DISTINCT o.id) AS orders_count
            ",
            seller_sales!()
        ))
        .bind(seller_id)
        .bind(from)
        .bind(until)
        .fetch_one(self.pool)
        .await?;
        Ok(row)
    }

    /// Count of orders containing the seller's products, per status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn status_counts(
        &self,
        seller_id: SellerId,
    ) -> Result<Vec<(OrderStatus, i64)>, RepositoryError> {
        let rows: Vec<(OrderStatus, i64)> = sqlx::query_as(
            r"
            SELECT o.status, COUNT(*)
            FROM shop.order o
            WHERE EXISTS (
                SELECT 1 FROM shop.order_detail od
                JOIN shop.product p ON p.id = od.product_id
                WHERE od.order_id = o.id AND p.seller_id = $1
            )
            GROUP BY o.status
            ",
        )
        .bind(seller_id)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// All products, and those active with stock.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn product_counts(&self, seller_id: SellerId) -> Result<ProductCounts, RepositoryError> {
        let row = sqlx::query_as::<_, ProductCounts>(
            r"
            SELECT COUNT(*) AS total,
                   COUNT(*) FILTER (WHERE is_active AND stock_quantity > 0) AS available
            FROM shop.product
            WHERE seller_id = $1
            ",
        )
        .bind(seller_id)
        .fetch_one(self.pool)
        .await?;
        Ok(row)
    }

    /// Revenue per day or month; periods without sales are absent.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn revenue_series(
        &self,
        seller_id: SellerId,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
        group_by: GroupBy,
    ) -> Result<Vec<RevenuePoint>, RepositoryError> {
        let sql = format!(
            r"
            SELECT date_trunc('{unit}', o.order_date)::date AS period,
                   COALESCE(SUM(od.quantity * od.unit_price), 0) AS revenue,
                   COUNT(DISTINCT o.id) AS orders_count,
                   COALESCE(SUM(od.quantity), 0)::bigint AS products_sold
            {from_clause}
            GROUP BY period
            ORDER BY period
            ",
            unit = group_by.trunc_unit(),
            from_clause = seller_sales!(),
        );
        let rows = sqlx::query_as::<_, RevenuePoint>(&sql)
            .bind(seller_id)
            .bind(from)
            .bind(until)
            .fetch_all(self.pool)
            .await?;
        Ok(rows)
    }

    /// Best sellers by units sold.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn top_products(
        &self,
        seller_id: SellerId,
        from: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
        limit: i64,
    ) -> Result<Vec<TopProduct>, RepositoryError> {
        let rows = sqlx::query_as::<_, TopProduct>(concat!(
            r"
            SELECT p.id AS product_id, p.name AS product_name, p.image_url,
                   SUM(od.quantity)::bigint AS quantity_sold,
                   SUM(od.quantity * od.unit_price) AS revenue,
                   p.price AS unit_price,
                   p.stock_quantity AS remaining_stock
            ",
            seller_sales!(),
            r"
            GROUP BY p.id, p.name, p.image_url, p.price, p.stock_quantity
            ORDER BY quantity_sold DESC, revenue DESC, p.id
            LIMIT $4
            "
        ))
        .bind(seller_id)
        .bind(from)
        .bind(until)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Customers ranked by what they spent on this seller's products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn top_customers(
        &self,
        seller_id: SellerId,
        from: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
        limit: i64,
    ) -> Result<Vec<TopCustomer>, RepositoryError> {
        let rows = sqlx::query_as::<_, TopCustomer>(concat!(
            r"
            WITH spend AS (
                SELECT o.user_id, o.id AS order_id, o.order_date,
                       SUM(od.quantity * od.unit_price) AS amount
            ",
            seller_sales!(),
            r"
                GROUP BY o.user_id, o.id, o.order_date
            )
            SELECT u.id AS customer_id, u.full_name AS customer_name, u.email,
                   COUNT(*) AS total_orders,
                   SUM(s.amount) AS total_spent,
                   ROUND(SUM(s.amount) / COUNT(*), 2) AS average_order_value,
                   MIN(s.order_date) AS first_order_date,
                   MAX(s.order_date) AS last_order_date
            FROM spend s
            JOIN shop.user u ON u.id = s.user_id
            GROUP BY u.id, u.full_name, u.email
            ORDER BY total_spent DESC, u.id
            LIMIT $4
            "
        ))
        .bind(seller_id)
        .bind(from)
        .bind(until)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Sales per UTC day; days without sales are absent.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn daily_sales(
        &self,
        seller_id: SellerId,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<DailySalesRow>, RepositoryError> {
        let rows = sqlx::query_as::<_, DailySalesRow>(concat!(
            r"
            SELECT (o.order_date AT TIME ZONE 'UTC')::date AS day,
                   COALESCE(SUM(od.quantity * od.unit_price), 0) AS revenue,
                   COUNT(DISTINCT o.id) AS orders,
                   COALESCE(SUM(od.quantity), 0)::bigint AS products_sold,
                   COUNT(DISTINCT o.user_id) AS unique_customers
            ",
            seller_sales!(),
            r"
            GROUP BY day
            ORDER BY day
            "
        ))
        .bind(seller_id)
        .bind(Some(from))
        .bind(Some(until))
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Revenue and units per product, best earners first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn product_sales(
        &self,
        seller_id: SellerId,
        from: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> Result<Vec<ProductSalesRow>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductSalesRow>(concat!(
            r"
            SELECT p.id AS product_id, p.name AS product_name,
                   SUM(od.quantity * od.unit_price) AS revenue,
                   SUM(od.quantity)::bigint AS quantity_sold
            ",
            seller_sales!(),
            r"
            GROUP BY p.id, p.name
            ORDER BY revenue DESC, p.id
            "
        ))
        .bind(seller_id)
        .bind(from)
        .bind(until)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Orders containing the seller's products in any of `statuses`, newest
    /// first. `today` is the start of the current UTC day.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn orders_by_status(
        &self,
        seller_id: SellerId,
        statuses: &[OrderStatus],
        today: DateTime<Utc>,
    ) -> Result<Vec<SellerOrderSummary>, RepositoryError> {
        let names: Vec<&str> = statuses.iter().map(OrderStatus::as_str).collect();
        let rows = sqlx::query_as::<_, SellerOrderSummary>(
            r"
            SELECT o.id AS order_id, o.status, o.order_date,
                   SUM(od.quantity * od.unit_price) AS seller_total,
                   SUM(od.quantity)::bigint AS total_items,
                   u.full_name AS customer_name, u.email AS customer_email,
                   u.phone AS customer_phone, o.shipping_address,
                   (o.order_date >= $3 AND o.order_date < $3 + INTERVAL '1 day') AS created_today
            FROM shop.order o
            JOIN shop.order_detail od ON od.order_id = o.id
            JOIN shop.product p ON p.id = od.product_id AND p.seller_id = $1
            JOIN shop.user u ON u.id = o.user_id
            WHERE o.status::text = ANY($2)
            GROUP BY o.id, u.id
            ORDER BY o.order_date DESC, o.id DESC
            ",
        )
        .bind(seller_id)
        .bind(names)
        .bind(today)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }
}

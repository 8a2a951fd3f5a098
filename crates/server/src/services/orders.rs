//! Order service: checkout, status lifecycle, and order views.
//!
//! Checkout turns selected cart lines into one order per seller inside a
//! single transaction. Product rows are locked in ascending ID order and the
//! discount row (if any) before them, so concurrent checkouts serialize on
//! the rows they share instead of deadlocking.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::instrument;

use shopx_core::orders::{
    StatusActor, auto_complete_cutoff, can_request_refund, check_transition, days_left_for_refund,
    restocks,
};
use shopx_core::pricing::{DiscountTerms, discount_amount, line_total};
use shopx_core::{
    CartItemId, DiscountId, OrderId, OrderStatus, PageRequest, Paged, ProductId, Role, SellerId,
    UserId,
};

use super::{ServiceError, ServiceResult};
use crate::db::orders::{NewOrder, OrderListQuery, OrderRepository, OrderScope};
use crate::db::products::LockedProduct;
use crate::db::users::UserRepository;
use crate::db::{carts, discounts, orders, products};
use crate::models::cart::CheckoutLine;
use crate::models::order::{
    CreateOrderRequest, Order, OrderFilter, OrderLine, OrderRecord, OrderSort, OrderSummary,
};
use crate::models::user::CurrentUser;

// =============================================================================
// Checkout planning
// =============================================================================

/// One priced line of a planned order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedLine {
    pub product_id: ProductId,
    pub quantity: i32,
    pub unit_price: Decimal,
}

/// An order about to be inserted: one seller's share of the checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedOrder {
    pub seller_id: SellerId,
    pub lines: Vec<PlannedLine>,
    pub total_amount: Decimal,
    pub discount: Decimal,
}

impl PlannedOrder {
    #[must_use]
    pub fn new(seller_id: SellerId, lines: Vec<PlannedLine>) -> Self {
        let total_amount = lines
            .iter()
            .map(|l| line_total(l.unit_price, l.quantity))
            .sum();
        Self {
            seller_id,
            lines,
            total_amount,
            discount: Decimal::ZERO,
        }
    }

    #[must_use]
    pub fn total_payment(&self) -> Decimal {
        self.total_amount - self.discount
    }
}

/// Requested cart item IDs that were not found in the user's cart.
#[must_use]
pub fn missing_items(requested: &[CartItemId], found: &[CheckoutLine]) -> Vec<CartItemId> {
    let mut missing: Vec<CartItemId> = requested
        .iter()
        .copied()
        .filter(|id| !found.iter().any(|line| line.cart_item_id == *id))
        .collect();
    missing.sort_unstable();
    missing.dedup();
    missing
}

/// Group checkout lines by seller, sellers in ascending ID order.
#[must_use]
pub fn group_by_seller(lines: &[CheckoutLine]) -> BTreeMap<SellerId, Vec<CheckoutLine>> {
    let mut groups: BTreeMap<SellerId, Vec<CheckoutLine>> = BTreeMap::new();
    for line in lines {
        groups.entry(line.seller_id).or_default().push(line.clone());
    }
    groups
}

/// Check a locked product can fill `quantity`.
///
/// # Errors
///
/// Returns `ServiceError::InvalidOperation` naming the product when it is
/// inactive or short on stock.
pub fn check_stock(product: &LockedProduct, quantity: i32) -> ServiceResult<()> {
    if !product.is_active {
        return Err(ServiceError::InvalidOperation(format!(
            "product '{}' is no longer available",
            product.name
        )));
    }
    if product.stock_quantity < quantity {
        return Err(ServiceError::InvalidOperation(format!(
            "not enough stock for '{}': {} requested, {} available",
            product.name, quantity, product.stock_quantity
        )));
    }
    Ok(())
}

/// Spread a discount over planned orders in seller order, drawing each
/// order's share from the shared remaining budget. Returns the total spent.
pub fn apply_discount(
    orders: &mut [PlannedOrder],
    terms: DiscountTerms,
    remaining_budget: Decimal,
) -> Decimal {
    let mut remaining = remaining_budget;
    let mut spent = Decimal::ZERO;
    for order in orders {
        let amount = discount_amount(order.total_amount, terms, remaining);
        order.discount = amount;
        remaining -= amount;
        spent += amount;
    }
    spent
}

// =============================================================================
// Views
// =============================================================================

fn to_view(record: OrderRecord, items: Vec<OrderLine>, now: DateTime<Utc>) -> Order {
    Order {
        id: record.id,
        user_id: record.user_id,
        order_date: record.order_date,
        total_amount: record.total_amount,
        total_payment: record.total_payment,
        discount_amount: record.total_amount - record.total_payment,
        status: record.status,
        shipping_address: record.shipping_address,
        discount_code: record.discount_code,
        can_request_refund: can_request_refund(record.status, record.order_date, now),
        days_left_for_refund: days_left_for_refund(record.status, record.order_date, now),
        customer: None,
        items,
    }
}

fn with_refund_flags(mut summary: OrderSummary, now: DateTime<Utc>) -> OrderSummary {
    summary.can_request_refund = can_request_refund(summary.status, summary.order_date, now);
    summary.days_left_for_refund = days_left_for_refund(summary.status, summary.order_date, now);
    summary
}

fn start_of(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Turn listing filters into a repository query.
///
/// # Errors
///
/// Returns `ServiceError::InvalidArgument` for an unknown status or an
/// inverted date range.
pub fn list_query(filter: &OrderFilter, sort: OrderSort) -> ServiceResult<OrderListQuery<'_>> {
    let status = filter
        .status
        .as_deref()
        .map(str::parse::<OrderStatus>)
        .transpose()
        .map_err(|e| ServiceError::InvalidArgument(e.to_string()))?;

    if let (Some(start), Some(end)) = (filter.start_date, filter.end_date)
        && start > end
    {
        return Err(ServiceError::InvalidArgument(
            "start_date must not be after end_date".to_owned(),
        ));
    }

    Ok(OrderListQuery {
        search: filter.search.as_deref(),
        status,
        from: filter.start_date.map(start_of),
        until: filter
            .end_date
            .and_then(|d| d.checked_add_days(Days::new(1)))
            .map(start_of),
        min_amount: filter.min_amount,
        max_amount: filter.max_amount,
        sort,
    })
}

// =============================================================================
// Service
// =============================================================================

/// Order operations.
pub struct OrderService<'a> {
    pool: &'a PgPool,
    orders: OrderRepository<'a>,
    users: UserRepository<'a>,
}

impl<'a> OrderService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            pool,
            orders: OrderRepository::new(pool),
            users: UserRepository::new(pool),
        }
    }

    /// Check out the selected cart lines: one order per seller.
    ///
    /// Stock is decremented, the discount budget is drawn down, and the
    /// consumed cart lines are deleted, all in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::InvalidArgument` for an empty selection or blank
    /// address, `ServiceError::NotFound` for an unknown user, and
    /// `ServiceError::InvalidOperation` for missing cart lines, an unusable
    /// discount code, or insufficient stock.
    #[instrument(skip_all, fields(user_id = %user_id, items = request.cart_item_ids.len()))]
    pub async fn create_from_cart(
        &self,
        user_id: UserId,
        request: &CreateOrderRequest,
    ) -> ServiceResult<Vec<Order>> {
        if request.cart_item_ids.is_empty() {
            return Err(ServiceError::InvalidArgument(
                "select at least one cart item".to_owned(),
            ));
        }
        let shipping_address = request.shipping_address.trim();
        if shipping_address.is_empty() {
            return Err(ServiceError::InvalidArgument(
                "shipping address is required".to_owned(),
            ));
        }
        if self.users.get_by_id(user_id).await?.is_none() {
            return Err(ServiceError::not_found("user", user_id));
        }

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let lines = carts::checkout_lines(&mut tx, user_id, &request.cart_item_ids).await?;
        let missing = missing_items(&request.cart_item_ids, &lines);
        if !missing.is_empty() {
            let ids: Vec<String> = missing.iter().map(ToString::to_string).collect();
            return Err(ServiceError::InvalidOperation(format!(
                "cart items not found: {}",
                ids.join(", ")
            )));
        }

        let discount = match request.discount_code.as_deref() {
            Some(code) => {
                let discount = discounts::lock_by_code(&mut tx, code)
                    .await?
                    .ok_or_else(|| {
                        ServiceError::InvalidOperation(format!("discount code '{code}' does not exist"))
                    })?;
                if let Some(reason) = discount.unusable_reason(now) {
                    return Err(ServiceError::InvalidOperation(reason));
                }
                Some(discount)
            }
            None => None,
        };

        let mut product_ids: Vec<ProductId> = lines.iter().map(|l| l.product_id).collect();
        product_ids.sort_unstable();
        product_ids.dedup();
        let mut locked: HashMap<ProductId, LockedProduct> = HashMap::with_capacity(product_ids.len());
        for id in product_ids {
            let product = products::lock(&mut tx, id)
                .await?
                .ok_or_else(|| ServiceError::not_found("product", id))?;
            locked.insert(id, product);
        }

        let mut planned = Vec::new();
        for (seller_id, group) in group_by_seller(&lines) {
            let mut priced = Vec::with_capacity(group.len());
            for line in &group {
                let product = locked
                    .get(&line.product_id)
                    .ok_or_else(|| ServiceError::not_found("product", line.product_id))?;
                check_stock(product, line.quantity)?;
                products::adjust_stock(&mut tx, line.product_id, -line.quantity).await?;
                priced.push(PlannedLine {
                    product_id: line.product_id,
                    quantity: line.quantity,
                    unit_price: product.price,
                });
            }
            planned.push(PlannedOrder::new(seller_id, priced));
        }

        let (discount_id, discount_code): (Option<DiscountId>, Option<&str>) = match &discount {
            Some(d) => {
                let spent = apply_discount(&mut planned, d.terms(), d.remaining_budget);
                if spent > Decimal::ZERO {
                    discounts::spend_budget(&mut tx, d.id, spent).await?;
                }
                (Some(d.id), Some(d.code.as_str()))
            }
            None => (None, None),
        };

        let mut created = Vec::with_capacity(planned.len());
        for order in &planned {
            let id = orders::insert(
                &mut tx,
                &NewOrder {
                    user_id,
                    discount_id,
                    discount_code,
                    order_date: now,
                    total_amount: order.total_amount,
                    total_payment: order.total_payment(),
                    status: OrderStatus::Processing,
                    shipping_address,
                },
            )
            .await?;
            for line in &order.lines {
                orders::insert_line(&mut tx, id, line.product_id, line.quantity, line.unit_price)
                    .await?;
            }
            created.push(id);
        }

        let consumed: Vec<CartItemId> = lines.iter().map(|l| l.cart_item_id).collect();
        carts::delete_lines(&mut tx, &consumed).await?;

        tx.commit().await?;

        tracing::info!(
            orders = created.len(),
            discount = ?discount_id,
            "Created orders from cart"
        );

        let mut views = Vec::with_capacity(created.len());
        for id in created {
            views.push(self.load_view(id, None, true).await?);
        }
        Ok(views)
    }

    /// Move an order to a new status on behalf of `caller`.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::InvalidArgument` for an unknown status,
    /// `ServiceError::NotFound` for an unknown order, `ServiceError::Forbidden`
    /// when the caller may not make the change, and
    /// `ServiceError::InvalidOperation` when the lifecycle forbids it.
    #[instrument(skip_all, fields(user_id = %caller.id, order_id = %order_id, status = %status))]
    pub async fn update_status(
        &self,
        caller: &CurrentUser,
        order_id: OrderId,
        status: &str,
    ) -> ServiceResult<Order> {
        let to: OrderStatus = status
            .parse()
            .map_err(|e: shopx_core::ParseEnumError| ServiceError::InvalidArgument(e.to_string()))?;

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let order = orders::lock(&mut tx, order_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("order", order_id))?;

        let actor = match caller.role {
            Role::Admin => StatusActor::Admin,
            Role::Seller => {
                let sells = match caller.seller_id {
                    Some(seller_id) => orders::seller_in_order(&mut tx, order_id, seller_id).await?,
                    None => false,
                };
                if sells {
                    StatusActor::Seller { owns_order: true }
                } else if order.user_id == caller.id {
                    StatusActor::Customer { owns_order: true }
                } else {
                    StatusActor::Seller { owns_order: false }
                }
            }
            Role::Customer => StatusActor::Customer {
                owns_order: order.user_id == caller.id,
            },
        };

        let from = order.status;
        check_transition(actor, from, to, order.order_date, now)?;

        if restocks(from, to) {
            for (product_id, quantity) in orders::line_quantities(&mut tx, order_id).await? {
                products::adjust_stock(&mut tx, product_id, quantity).await?;
            }
        }

        let stamp = (to == OrderStatus::Delivered).then_some(now);
        orders::set_status(&mut tx, order_id, to, stamp).await?;
        tx.commit().await?;

        tracing::info!(%from, %to, "Order status updated");
        self.detail(caller, order_id).await
    }

    /// An order as seen by `caller`.
    ///
    /// Admins and the buyer see every line; a seller sees only their own
    /// lines. Anyone else gets `NotFound`.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the order doesn't exist or isn't
    /// visible to the caller.
    pub async fn detail(&self, caller: &CurrentUser, order_id: OrderId) -> ServiceResult<Order> {
        let record = self
            .orders
            .get(order_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("order", order_id))?;

        if caller.is_admin() || record.user_id == caller.id {
            return self.view_of(record, None, true).await;
        }
        if let Some(seller_id) = caller.seller()
            && self.orders.seller_in_order(order_id, seller_id).await?
        {
            return self.view_of(record, Some(seller_id), true).await;
        }
        Err(ServiceError::not_found("order", order_id))
    }

    /// The caller's own orders.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::InvalidArgument` for invalid filters.
    pub async fn my_orders(
        &self,
        user_id: UserId,
        filter: &OrderFilter,
        page: PageRequest,
    ) -> ServiceResult<Paged<OrderSummary>> {
        let mut query = list_query(filter, OrderSort::from_param(filter.sort.as_deref()))?;
        query.search = None;
        query.min_amount = None;
        query.max_amount = None;
        self.list(OrderScope::Customer(user_id), &query, page).await
    }

    /// Orders containing the seller's products.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::InvalidArgument` for invalid filters.
    pub async fn seller_orders(
        &self,
        seller_id: SellerId,
        filter: &OrderFilter,
        page: PageRequest,
    ) -> ServiceResult<Paged<OrderSummary>> {
        let mut query = list_query(filter, OrderSort::from_param(filter.sort.as_deref()))?;
        query.search = None;
        query.min_amount = None;
        query.max_amount = None;
        self.list(OrderScope::Seller(seller_id), &query, page).await
    }

    /// Every order, with admin search and sorts.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::InvalidArgument` for invalid filters.
    pub async fn all_orders(
        &self,
        filter: &OrderFilter,
        page: PageRequest,
    ) -> ServiceResult<Paged<OrderSummary>> {
        let query = list_query(filter, OrderSort::from_admin_param(filter.sort.as_deref()))?;
        self.list(OrderScope::All, &query, page).await
    }

    /// Complete delivered orders whose refund window has closed.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the update fails.
    #[instrument(skip(self))]
    pub async fn complete_delivered(&self, now: DateTime<Utc>) -> ServiceResult<u64> {
        let completed = self
            .orders
            .complete_delivered_before(auto_complete_cutoff(now))
            .await?;
        if completed > 0 {
            tracing::info!(completed, "Auto-completed delivered orders");
        }
        Ok(completed)
    }

    async fn list(
        &self,
        scope: OrderScope,
        query: &OrderListQuery<'_>,
        page: PageRequest,
    ) -> ServiceResult<Paged<OrderSummary>> {
        let page = page.normalized();
        let (rows, total) = self.orders.list(scope, query, page).await?;
        let now = Utc::now();
        Ok(Paged::new(rows, page, total).map(|s| with_refund_flags(s, now)))
    }

    async fn load_view(
        &self,
        order_id: OrderId,
        seller_id: Option<SellerId>,
        with_customer: bool,
    ) -> ServiceResult<Order> {
        let record = self
            .orders
            .get(order_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("order", order_id))?;
        self.view_of(record, seller_id, with_customer).await
    }

    async fn view_of(
        &self,
        record: OrderRecord,
        seller_id: Option<SellerId>,
        with_customer: bool,
    ) -> ServiceResult<Order> {
        let items = self.orders.lines(record.id, seller_id).await?;
        let customer = if with_customer {
            self.orders.customer(record.id).await?
        } else {
            None
        };
        let mut view = to_view(record, items, Utc::now());
        view.customer = customer;
        Ok(view)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn checkout(item: i32, product: i32, seller: i32, quantity: i32) -> CheckoutLine {
        CheckoutLine {
            cart_item_id: CartItemId::new(item),
            product_id: ProductId::new(product),
            seller_id: SellerId::new(seller),
            quantity,
        }
    }

    fn locked(stock: i32, active: bool) -> LockedProduct {
        LockedProduct {
            id: ProductId::new(1),
            name: "Desk Lamp".to_owned(),
            price: dec("25.00"),
            stock_quantity: stock,
            is_active: active,
            seller_id: SellerId::new(1),
        }
    }

    #[test]
    fn test_group_by_seller_one_order_per_seller() {
        let lines = [
            checkout(1, 10, 2, 1),
            checkout(2, 11, 1, 3),
            checkout(3, 12, 2, 2),
        ];
        let groups = group_by_seller(&lines);

        assert_eq!(groups.len(), 2);
        let sellers: Vec<SellerId> = groups.keys().copied().collect();
        assert_eq!(sellers, vec![SellerId::new(1), SellerId::new(2)]);
        assert_eq!(groups[&SellerId::new(2)].len(), 2);
        assert_eq!(groups[&SellerId::new(1)][0].product_id, ProductId::new(11));
    }

    #[test]
    fn test_missing_items_reports_sorted_unique_ids() {
        let found = [checkout(2, 10, 1, 1)];
        let missing = missing_items(
            &[CartItemId::new(5), CartItemId::new(2), CartItemId::new(3), CartItemId::new(5)],
            &found,
        );
        assert_eq!(missing, vec![CartItemId::new(3), CartItemId::new(5)]);
    }

    #[test]
    fn test_missing_items_none_when_all_found() {
        let found = [checkout(1, 10, 1, 1), checkout(2, 11, 1, 1)];
        assert!(missing_items(&[CartItemId::new(1), CartItemId::new(2)], &found).is_empty());
    }

    #[test]
    fn test_check_stock() {
        assert!(check_stock(&locked(5, true), 5).is_ok());

        let err = check_stock(&locked(2, true), 3).unwrap_err();
        assert!(matches!(err, ServiceError::InvalidOperation(ref m) if m.contains("Desk Lamp")));

        let err = check_stock(&locked(10, false), 1).unwrap_err();
        assert!(matches!(err, ServiceError::InvalidOperation(_)));
    }

    #[test]
    fn test_planned_order_totals() {
        let order = PlannedOrder::new(
            SellerId::new(1),
            vec![
                PlannedLine {
                    product_id: ProductId::new(1),
                    quantity: 2,
                    unit_price: dec("10.50"),
                },
                PlannedLine {
                    product_id: ProductId::new(2),
                    quantity: 1,
                    unit_price: dec("4.00"),
                },
            ],
        );
        assert_eq!(order.total_amount, dec("25.00"));
        assert_eq!(order.total_payment(), dec("25.00"));
    }

    fn planned(total: &str) -> PlannedOrder {
        PlannedOrder::new(
            SellerId::new(1),
            vec![PlannedLine {
                product_id: ProductId::new(1),
                quantity: 1,
                unit_price: dec(total),
            }],
        )
    }

    #[test]
    fn test_apply_discount_per_order() {
        let mut orders = vec![planned("100.00"), planned("50.00")];
        let terms = DiscountTerms {
            percent: dec("10"),
            max_discount_percent: 0,
        };
        let spent = apply_discount(&mut orders, terms, dec("1000"));

        assert_eq!(orders[0].discount, dec("10.00"));
        assert_eq!(orders[1].discount, dec("5.00"));
        assert_eq!(orders[1].total_payment(), dec("45.00"));
        assert_eq!(spent, dec("15.00"));
    }

    #[test]
    fn test_apply_discount_budget_shared_across_orders() {
        let mut orders = vec![planned("100.00"), planned("100.00")];
        let terms = DiscountTerms {
            percent: dec("20"),
            max_discount_percent: 0,
        };
        let spent = apply_discount(&mut orders, terms, dec("30"));

        assert_eq!(orders[0].discount, dec("20.00"));
        assert_eq!(orders[1].discount, dec("10.00"));
        assert_eq!(spent, dec("30"));
    }

    #[test]
    fn test_apply_discount_respects_max_percent() {
        let mut orders = vec![planned("200.00")];
        let terms = DiscountTerms {
            percent: dec("50"),
            max_discount_percent: 15,
        };
        apply_discount(&mut orders, terms, dec("1000"));
        assert_eq!(orders[0].discount, dec("30.00"));
    }

    #[test]
    fn test_list_query_parses_status_and_dates() {
        let filter = OrderFilter {
            status: Some("shipping".to_owned()),
            start_date: NaiveDate::from_ymd_opt(2026, 3, 1),
            end_date: NaiveDate::from_ymd_opt(2026, 3, 31),
            ..OrderFilter::default()
        };
        let query = list_query(&filter, OrderSort::NewestFirst).unwrap();
        assert_eq!(query.status, Some(OrderStatus::Shipping));
        assert_eq!(query.from.unwrap().to_rfc3339(), "2026-03-01T00:00:00+00:00");
        // end date is inclusive: the bound is the next midnight
        assert_eq!(query.until.unwrap().to_rfc3339(), "2026-04-01T00:00:00+00:00");
    }

    #[test]
    fn test_list_query_rejects_bad_input() {
        let filter = OrderFilter {
            status: Some("lost".to_owned()),
            ..OrderFilter::default()
        };
        assert!(matches!(
            list_query(&filter, OrderSort::NewestFirst),
            Err(ServiceError::InvalidArgument(_))
        ));

        let filter = OrderFilter {
            start_date: NaiveDate::from_ymd_opt(2026, 3, 2),
            end_date: NaiveDate::from_ymd_opt(2026, 3, 1),
            ..OrderFilter::default()
        };
        assert!(list_query(&filter, OrderSort::NewestFirst).is_err());
    }

    #[test]
    fn test_view_discount_and_refund_flags() {
        let now: DateTime<Utc> = "2026-03-10T12:00:00Z".parse().unwrap();
        let record = OrderRecord {
            id: OrderId::new(9),
            user_id: UserId::new(1),
            discount_id: None,
            discount_code: Some("SPRING".to_owned()),
            order_date: "2026-03-09T12:00:00Z".parse().unwrap(),
            total_amount: dec("80.00"),
            total_payment: dec("72.00"),
            status: OrderStatus::Delivered,
            shipping_address: "1 Main St".to_owned(),
        };
        let view = to_view(record, Vec::new(), now);
        assert_eq!(view.discount_amount, dec("8.00"));
        assert!(view.can_request_refund);
        assert_eq!(view.days_left_for_refund, 2);
    }
}

//! Checkout and account changes against a real database.
//!
//! Each test gets a fresh database with the server migrations applied
//! (`DATABASE_URL` must point at a Postgres server).

#![allow(clippy::unwrap_used)]

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use shopx_core::{CartItemId, ProductId, SellerId, UserId};
use shopx_server::models::order::CreateOrderRequest;
use shopx_server::models::user::SetRoleRequest;
use shopx_server::services::ServiceError;
use shopx_server::services::orders::OrderService;
use shopx_server::services::users::UserService;

async fn user(pool: &PgPool, email: &str, role: &str) -> UserId {
    sqlx::query_scalar(
        "INSERT INTO shop.user (email, full_name, role) VALUES ($1, $1, $2::shop.user_role) RETURNING id",
    )
    .bind(email)
    .bind(role)
    .fetch_one(pool)
    .await
    .unwrap()
}

async fn seller(pool: &PgPool, email: &str) -> SellerId {
    let user_id = user(pool, email, "seller").await;
    sqlx::query_scalar("INSERT INTO shop.seller (user_id, shop_name) VALUES ($1, $2) RETURNING id")
        .bind(user_id)
        .bind(format!("Shop of {email}"))
        .fetch_one(pool)
        .await
        .unwrap()
}

async fn product(pool: &PgPool, seller_id: SellerId, price: i64, stock: i32) -> ProductId {
    sqlx::query_scalar(
        r"
        INSERT INTO shop.product (category_id, seller_id, name, price, stock_quantity)
        VALUES (1, $1, 'Item', $2, $3)
        RETURNING id
        ",
    )
    .bind(seller_id)
    .bind(Decimal::from(price))
    .bind(stock)
    .fetch_one(pool)
    .await
    .unwrap()
}

async fn cart_line(pool: &PgPool, user_id: UserId, product_id: ProductId, quantity: i32) -> CartItemId {
    sqlx::query(
        "INSERT INTO shop.cart (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING",
    )
    .bind(user_id)
    .execute(pool)
    .await
    .unwrap();
    sqlx::query_scalar(
        r"
        INSERT INTO shop.cart_item (cart_id, product_id, quantity)
        SELECT id, $2, $3 FROM shop.cart WHERE user_id = $1
        RETURNING id
        ",
    )
    .bind(user_id)
    .bind(product_id)
    .bind(quantity)
    .fetch_one(pool)
    .await
    .unwrap()
}

async fn discount(pool: &PgPool, code: &str, percent: i64, remaining: i64) {
    let now = Utc::now();
    sqlx::query(
        r"
        INSERT INTO shop.discount
            (code, discount_percent, budget, remaining_budget, start_date, end_date)
        VALUES ($1, $2, $3, $3, $4, $5)
        ",
    )
    .bind(code)
    .bind(Decimal::from(percent))
    .bind(Decimal::from(remaining))
    .bind(now - Duration::days(1))
    .bind(now + Duration::days(1))
    .execute(pool)
    .await
    .unwrap();
}

async fn stock(pool: &PgPool, id: ProductId) -> i32 {
    sqlx::query_scalar("SELECT stock_quantity FROM shop.product WHERE id = $1")
        .bind(id)
        .fetch_one(pool)
        .await
        .unwrap()
}

async fn remaining_budget(pool: &PgPool, code: &str) -> Decimal {
    sqlx::query_scalar("SELECT remaining_budget FROM shop.discount WHERE code = $1")
        .bind(code)
        .fetch_one(pool)
        .await
        .unwrap()
}

async fn cart_items(pool: &PgPool, user_id: UserId) -> Vec<CartItemId> {
    sqlx::query_scalar(
        r"
        SELECT ci.id FROM shop.cart_item ci
        JOIN shop.cart c ON c.id = ci.cart_id
        WHERE c.user_id = $1
        ORDER BY ci.id
        ",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .unwrap()
}

async fn order_count(pool: &PgPool, user_id: UserId) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM shop.order WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

#[sqlx::test(migrations = "../server/migrations")]
async fn test_checkout_splits_orders_per_seller(pool: PgPool) {
    let buyer = user(&pool, "buyer@example.com", "customer").await;
    let first = seller(&pool, "first@example.com").await;
    let second = seller(&pool, "second@example.com").await;
    let lamp = product(&pool, first, 100, 5).await;
    let mug = product(&pool, second, 50, 3).await;
    let kept = product(&pool, first, 10, 10).await;
    let lamp_line = cart_line(&pool, buyer, lamp, 2).await;
    let mug_line = cart_line(&pool, buyer, mug, 1).await;
    let kept_line = cart_line(&pool, buyer, kept, 4).await;
    discount(&pool, "SAVE10", 10, 100).await;

    let orders = OrderService::new(&pool)
        .create_from_cart(
            buyer,
            &CreateOrderRequest {
                cart_item_ids: vec![lamp_line, mug_line],
                shipping_address: " 1 Main Street ".to_owned(),
                discount_code: Some("save10".to_owned()),
            },
        )
        .await
        .unwrap();

    assert_eq!(orders.len(), 2);
    for order in &orders {
        let sellers: Vec<SellerId> = order.items.iter().map(|l| l.seller_id).collect();
        assert!(sellers.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(order.shipping_address, "1 Main Street");
        assert_eq!(order.discount_code.as_deref(), Some("SAVE10"));
    }
    let totals: Vec<(Decimal, Decimal)> = orders
        .iter()
        .map(|o| (o.total_amount, o.total_payment))
        .collect();
    assert!(totals.contains(&(Decimal::from(200), Decimal::from(180))));
    assert!(totals.contains(&(Decimal::from(50), Decimal::from(45))));

    assert_eq!(stock(&pool, lamp).await, 3);
    assert_eq!(stock(&pool, mug).await, 2);
    assert_eq!(stock(&pool, kept).await, 10);
    assert_eq!(remaining_budget(&pool, "SAVE10").await, Decimal::from(75));
    assert_eq!(cart_items(&pool, buyer).await, vec![kept_line]);
    assert_eq!(order_count(&pool, buyer).await, 2);
}

#[sqlx::test(migrations = "../server/migrations")]
async fn test_checkout_short_stock_changes_nothing(pool: PgPool) {
    let buyer = user(&pool, "buyer@example.com", "customer").await;
    let first = seller(&pool, "first@example.com").await;
    let second = seller(&pool, "second@example.com").await;
    let lamp = product(&pool, first, 100, 5).await;
    let mug = product(&pool, second, 50, 1).await;
    let lamp_line = cart_line(&pool, buyer, lamp, 2).await;
    let mug_line = cart_line(&pool, buyer, mug, 2).await;
    discount(&pool, "SAVE10", 10, 100).await;

    let err = OrderService::new(&pool)
        .create_from_cart(
            buyer,
            &CreateOrderRequest {
                cart_item_ids: vec![lamp_line, mug_line],
                shipping_address: "1 Main Street".to_owned(),
                discount_code: Some("SAVE10".to_owned()),
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::InvalidOperation(ref m) if m.contains("not enough stock")));
    assert_eq!(stock(&pool, lamp).await, 5);
    assert_eq!(stock(&pool, mug).await, 1);
    assert_eq!(remaining_budget(&pool, "SAVE10").await, Decimal::from(100));
    assert_eq!(cart_items(&pool, buyer).await, vec![lamp_line, mug_line]);
    assert_eq!(order_count(&pool, buyer).await, 0);
}

#[sqlx::test(migrations = "../server/migrations")]
async fn test_set_role_for_missing_user_is_not_found(pool: PgPool) {
    let admin = user(&pool, "admin@example.com", "admin").await;

    let err = UserService::new(&pool)
        .set_role(
            admin,
            UserId::new(9_999),
            &SetRoleRequest {
                role: "seller".to_owned(),
                shop_name: Some("Ghost Shop".to_owned()),
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::NotFound(_)));
    let sellers: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM shop.seller")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(sellers, 0);
}

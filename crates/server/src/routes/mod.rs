//! HTTP routes for the JSON API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                              - Liveness
//! GET  /health/ready                        - Readiness (database ping)
//!
//! # Auth
//! POST /api/auth/register                   - Create a customer account
//! POST /api/auth/login                      - Email/password login
//! POST /api/auth/social-login               - Login with an external identity
//! GET  /api/auth/me                         - Current account
//! GET  /api/auth/check                      - Token check
//! PUT  /api/auth/profile                    - Edit own profile
//! POST /api/auth/change-password            - Change own password
//!
//! # Catalog
//! GET  /api/categories[/all|/{id}]          - Platform categories (admin writes)
//! *    /api/seller-categories[/{id}]        - Seller's own categories
//! GET  /api/products                        - Storefront listing
//! GET  /api/products/{best-selling,newest}  - Product strips
//! GET  /api/products/category/{id}          - Listing for one category
//! GET  /api/products/mine[/{id}]            - Seller's own products
//! *    /api/products[/{id}]                 - Seller product writes
//!
//! # Sellers
//! GET  /api/sellers/{id}[/products|/stats|/active|/categories]
//! POST /api/sellers/convert                 - Become a seller
//! GET  /api/sellers/current                 - Own shop
//! PUT  /api/sellers/current                 - Rename own shop
//!
//! # Shopping
//! *    /api/cart[/summary|/items[/{id}]|/inactive-shops]
//! POST /api/orders                          - Checkout
//! GET  /api/orders/{mine,seller}            - Customer and seller order lists
//! GET  /api/orders                          - All orders (admin)
//! GET  /api/orders/{id}                     - Order detail
//! PUT  /api/orders/{id}/status              - Status change
//! *    /api/discounts[/...]                 - Discount codes
//!
//! # Messaging
//! *    /api/contacts[/{id}[/status]]        - Contact messages
//! *    /api/notifications[/...]             - Broadcasts (admin)
//! *    /api/notifications/seller[/...]      - Seller announcements to own buyers
//! *    /api/inbox[/...]                     - The caller's notifications
//!
//! # Reporting
//! GET  /api/statistics/...                  - Seller dashboard and analytics
//! GET  /api/reports/{monthly,revenue}       - Admin revenue reports
//!
//! # Administration
//! *    /api/users[/{id}[/role]]             - Account management
//! ```

pub mod api;
pub mod health;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::middleware::{api_rate_limiter, auth_rate_limiter};
use crate::state::AppState;

use api::{
    auth, cart, categories, contacts, discounts, notifications, orders, products, reports,
    seller_categories, sellers, statistics, users,
};

/// Credential endpoints, behind the strict limiter.
pub fn auth_routes() -> Router<AppState> {
    let guarded = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/social-login", post(auth::social_login))
        .route("/change-password", post(auth::change_password))
        .layer(auth_rate_limiter());

    Router::new()
        .route("/me", get(auth::me))
        .route("/check", get(auth::check))
        .route("/profile", put(auth::update_profile))
        .merge(guarded)
}

pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(categories::list).post(categories::create))
        .route("/all", get(categories::all))
        .route(
            "/{id}",
            get(categories::show)
                .put(categories::update)
                .delete(categories::delete),
        )
}

pub fn seller_category_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(seller_categories::list).post(seller_categories::create))
        .route(
            "/{id}",
            get(seller_categories::show)
                .put(seller_categories::update)
                .delete(seller_categories::delete),
        )
}

pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::list).post(products::create))
        .route("/best-selling", get(products::best_selling))
        .route("/newest", get(products::newest))
        .route("/mine", get(products::mine))
        .route("/mine/{id}", get(products::mine_one))
        .route("/category/{id}", get(products::by_category))
        .route(
            "/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::delete),
        )
}

pub fn seller_routes() -> Router<AppState> {
    Router::new()
        .route("/convert", post(sellers::convert))
        .route("/current", get(sellers::current).put(sellers::rename))
        .route("/{id}", get(sellers::profile))
        .route("/{id}/products", get(sellers::products))
        .route("/{id}/stats", get(sellers::stats))
        .route("/{id}/active", get(sellers::active))
        .route("/{id}/categories", get(sellers::categories))
}

pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).delete(cart::clear))
        .route("/summary", get(cart::summary))
        .route("/items", post(cart::add_item))
        .route(
            "/items/{id}",
            put(cart::update_item).delete(cart::remove_item),
        )
        .route("/inactive-shops", post(cart::inactive_shops))
}

pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::all).post(orders::create))
        .route("/mine", get(orders::mine))
        .route("/seller", get(orders::seller))
        .route("/{id}", get(orders::show))
        .route("/{id}/status", put(orders::update_status))
}

pub fn discount_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(discounts::list).post(discounts::create))
        .route("/available", get(discounts::available))
        .route("/code/{code}", get(discounts::by_code))
        .route("/validate/{code}", get(discounts::validate))
        .route(
            "/{id}",
            get(discounts::show)
                .put(discounts::update)
                .delete(discounts::delete),
        )
        .route("/{id}/active", put(discounts::set_active))
}

pub fn contact_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(contacts::list).post(contacts::create))
        .route("/{id}", get(contacts::show).delete(contacts::delete))
        .route("/{id}/status", put(contacts::update_status))
}

pub fn notification_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(notifications::list).post(notifications::create))
        .route("/recipient-count", get(notifications::recipient_count))
        .route(
            "/{id}",
            get(notifications::show)
                .put(notifications::update)
                .delete(notifications::delete),
        )
        .route("/{id}/send", post(notifications::send))
        .route("/{id}/stats", get(notifications::stats))
        .route(
            "/seller",
            get(notifications::seller_list).post(notifications::seller_create),
        )
        .route("/seller/customers", get(notifications::seller_customers))
        .route(
            "/seller/{id}",
            get(notifications::seller_show)
                .put(notifications::seller_update)
                .delete(notifications::seller_delete),
        )
        .route("/seller/{id}/send", post(notifications::seller_send))
        .route("/seller/{id}/stats", get(notifications::seller_stats))
        .route("/seller/{id}/recipients", get(notifications::seller_recipients))
}

pub fn inbox_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(notifications::inbox))
        .route("/unread-count", get(notifications::unread_count))
        .route("/{id}", axum::routing::delete(notifications::remove))
        .route("/{id}/read", put(notifications::mark_read))
}

pub fn statistics_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(statistics::dashboard))
        .route("/revenue", get(statistics::revenue))
        .route("/top-products", get(statistics::top_products))
        .route("/top-customers", get(statistics::top_customers))
        .route("/order-status", get(statistics::order_status))
        .route("/orders-by-status", get(statistics::orders_by_status))
        .route("/chart-analytics", get(statistics::chart_analytics))
        .route("/chart-analytics/compare", get(statistics::chart_comparison))
        .route("/profit-analysis", get(statistics::profit_analysis))
}

pub fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/monthly", get(reports::monthly))
        .route("/revenue", get(reports::revenue))
}

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(users::list).post(users::create))
        .route(
            "/{id}",
            get(users::show).put(users::update).delete(users::delete),
        )
        .route("/{id}/role", put(users::set_role))
}

/// Everything under `/api`, behind the relaxed limiter.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes())
        .nest("/categories", category_routes())
        .nest("/seller-categories", seller_category_routes())
        .nest("/products", product_routes())
        .nest("/sellers", seller_routes())
        .nest("/cart", cart_routes())
        .nest("/orders", order_routes())
        .nest("/discounts", discount_routes())
        .nest("/contacts", contact_routes())
        .nest("/notifications", notification_routes())
        .nest("/inbox", inbox_routes())
        .nest("/statistics", statistics_routes())
        .nest("/reports", report_routes())
        .nest("/users", user_routes())
        .layer(api_rate_limiter())
}

/// All routes, without the outer middleware stack.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/api", api_routes())
}

//! JSON API handlers, one module per resource.

pub mod auth;
pub mod cart;
pub mod categories;
pub mod contacts;
pub mod discounts;
pub mod notifications;
pub mod orders;
pub mod products;
pub mod reports;
pub mod seller_categories;
pub mod sellers;
pub mod statistics;
pub mod users;

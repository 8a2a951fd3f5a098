//! Business logic services.
//!
//! Services compose repositories, enforce the business rules, and own the
//! transactions. Each borrows the pool (and whatever else it needs from
//! [`AppState`](crate::state::AppState)) for the length of one request.
//!
//! # Services
//!
//! - `auth` - Registration, login, tokens, self-service account edits
//! - `cart` - Cart lines and totals
//! - `orders` - Checkout, status lifecycle, order views
//! - `discounts` - Discount codes and their validation
//! - `catalog` - Categories, seller categories, products
//! - `sellers` - Seller profiles and conversion to seller
//! - `users` - Admin account management
//! - `contacts` - Contact messages
//! - `notifications` - Broadcasts and user inboxes
//! - `statistics` - Seller dashboard numbers
//! - `reports` - Admin revenue reports

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod contacts;
pub mod discounts;
mod error;
pub mod notifications;
pub mod orders;
pub mod reports;
pub mod sellers;
pub mod statistics;
pub mod users;

pub use error::{ServiceError, ServiceResult};

//! ShopX Core - Shared domain types.
//!
//! This crate provides the types used across all ShopX components:
//! - `server` - JSON API for customers, sellers and admins
//! - `cli` - Command-line tools for migrations, admin accounts and maintenance jobs
//!
//! # Architecture
//!
//! The core crate contains only types and pure rules - no I/O, no database
//! access, no HTTP. The `postgres` feature adds `sqlx` encoding for IDs,
//! emails and status enums.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, emails, roles, statuses and pagination
//! - [`pricing`] - Line totals and discount arithmetic
//! - [`orders`] - Order status transition and refund-window rules
//! - [`analytics`] - Period metrics, trends and profit estimates for sellers

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod analytics;
pub mod orders;
pub mod pricing;
pub mod types;

pub use types::*;

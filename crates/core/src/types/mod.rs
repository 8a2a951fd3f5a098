//! Core types for ShopX.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod paging;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use paging::{PageRequest, Paged};
pub use status::*;

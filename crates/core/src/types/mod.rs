//! Core types for the Elida storefront.
//!
//! Type-safe wrappers for IDs, emails, prices and statuses.

pub mod email;
pub mod id;
pub mod price;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use price::Price;
pub use status::*;

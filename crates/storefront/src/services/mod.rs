//! Business logic services for storefront.
//!
//! # Services
//!
//! - `auth` - sign-in, sign-up, Google, password reset, profile and token
//!   refresh over the identity provider
//! - `catalog` - cached product reads
//! - `orders` - checkout, order history and bookings

pub mod auth;
pub mod catalog;
pub mod orders;

pub use auth::{AuthError, AuthFlow, AuthService};
pub use catalog::CatalogService;
pub use orders::{History, OrderError, OrderService};

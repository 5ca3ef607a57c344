//! Elida Core - domain types and storefront rules.
//!
//! This crate holds everything the storefront knows about its domain that
//! does not touch the network:
//! - [`types`] - newtype IDs, emails, prices and status enums
//! - [`product`] - the product model and document normalization
//! - [`catalog`] - search, category and price filtering over a product list
//! - [`cart`] - cart and wishlist state
//! - [`order`] - orders and bookings as read from the document database
//! - [`profile`] - the mirrored user profile document
//! - [`validation`] - credential form checks done before any network call
//! - [`describe`] - best-effort bucketing of free-text descriptions
//!
//! # Architecture
//!
//! No I/O, no HTTP clients. The storefront crate owns the backend calls and
//! feeds plain JSON documents into the constructors here.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod describe;
pub mod order;
pub mod product;
pub mod profile;
pub mod types;
pub mod validation;

pub use cart::{Cart, CartError, CartItem, MAX_LINE_QUANTITY, VariantSelection, Wishlist};
pub use catalog::{ALL_CATEGORIES, CatalogFilter, CategorySelector, categories};
pub use describe::DescriptionSections;
pub use order::{Booking, Order, OrderLine, ShippingAddress};
pub use product::{DEFAULT_PRODUCT_IMAGE, Product, Variants};
pub use profile::ProfileMirror;
pub use types::*;
pub use validation::ValidationError;

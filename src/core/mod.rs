//! Core business logic - framework-agnostic back-office operations.
//!
//! Each module covers one manager of the admin interface. Operations take a
//! database connection and return [`crate::errors::Result`]; none of them
//! know how the result is presented.

pub mod blog;
pub mod brand;
pub mod category;
pub mod collection;
pub mod customer;
pub mod notice;
pub mod order;
pub mod pricing;
pub mod product;
pub mod seo;
pub mod slug;
pub mod variant;

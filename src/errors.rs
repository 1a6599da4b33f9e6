//! Unified error type for the back-office.
//!
//! Every operation in [`crate::core`] returns [`Result`]. Validation failures are
//! raised before any query is issued; database failures carry the underlying
//! [`sea_orm::DbErr`].

use thiserror::Error;

/// All failures surfaced by the crate.
#[derive(Debug, Error)]
pub enum Error {
    /// A query or statement failed at the database layer.
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Configuration could not be read or parsed.
    #[error("Configuration error: {message}")]
    Config {
        /// Human-readable description
        message: String,
    },

    /// Input rejected before touching the database.
    #[error("Validation error: {message}")]
    Validation {
        /// Human-readable description
        message: String,
    },

    /// A referenced row does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of record, e.g. `"product"`
        entity: &'static str,
        /// Identifier that was looked up
        id: String,
    },

    /// Price or amount is negative, NaN or infinite.
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// Offending value
        amount: f64,
    },

    /// A category named itself as its parent.
    #[error("Category {id} cannot be its own parent")]
    SelfParent {
        /// Category being saved
        id: i64,
    },

    /// Categories only nest one level deep.
    #[error("Category {parent_id} is already a subcategory and cannot have children")]
    CategoryTooDeep {
        /// Requested parent
        parent_id: i64,
    },

    /// A category with subcategories cannot be deleted or nested.
    #[error("Category {id} still has subcategories")]
    CategoryHasChildren {
        /// Category with children
        id: i64,
    },

    /// Every suffixed slug up to the limit was taken.
    #[error("No free slug for '{base}' after {attempts} attempts")]
    SlugExhausted {
        /// Slug the search started from
        base: String,
        /// Number of candidates tried
        attempts: u32,
    },

    /// Optimistic concurrency check failed on save.
    #[error("{entity} {id} was changed by someone else (expected revision {expected}, found {actual})")]
    StaleRevision {
        /// Kind of record
        entity: &'static str,
        /// Record id
        id: i64,
        /// Revision the editor loaded
        expected: i32,
        /// Revision found in the database
        actual: i32,
    },

    /// Reading a file or creating a directory failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A position did not fit the `sort_order` column.
    #[error("Integer conversion error: {0}")]
    TryFromInt(#[from] std::num::TryFromIntError),
}

impl Error {
    /// Shorthand for [`Error::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Shorthand for [`Error::NotFound`] keyed by a numeric id.
    #[must_use]
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

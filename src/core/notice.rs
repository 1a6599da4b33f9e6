//! Short user-facing outcome messages.
//!
//! Every admin action ends with a [`Notice`]. Failures are logged with the
//! operation name before being reduced to a message; nothing is retried.

use crate::errors::{Error, Result};
use serde::Serialize;
use tracing::error;

/// Whether a notice reports success or failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NoticeLevel {
    /// The action completed
    Success,
    /// The action failed and nothing was changed
    Error,
}

/// A one-line message for the admin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    /// Success or failure
    pub level: NoticeLevel,
    /// Text shown to the admin
    pub message: String,
}

impl Notice {
    /// A success notice.
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    /// An error notice.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    /// True for failure notices.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.level == NoticeLevel::Error
    }
}

/// Message shown for a failed operation.
#[must_use]
pub fn user_message(err: &Error) -> String {
    match err {
        Error::Validation { message } | Error::Config { message } => message.clone(),
        Error::NotFound { entity, .. } => format!("The {entity} no longer exists"),
        Error::StaleRevision { entity, .. } => {
            format!("This {entity} was changed by someone else. Reload and try again.")
        }
        Error::InvalidAmount { amount } => format!("{amount} is not a valid amount"),
        Error::SelfParent { .. } => "A category cannot be its own parent".to_string(),
        Error::CategoryTooDeep { .. } => "Subcategories cannot have children".to_string(),
        Error::CategoryHasChildren { .. } => {
            "Move or delete the subcategories first".to_string()
        }
        Error::SlugExhausted { base, .. } => format!("Choose a different slug than '{base}'"),
        Error::Database(_) | Error::Io(_) | Error::TryFromInt(_) => {
            "Something went wrong. Please try again.".to_string()
        }
    }
}

/// Turns the result of `operation` into a notice, logging failures.
pub fn notice_for<T>(operation: &str, result: &Result<T>, success: &str) -> Notice {
    match result {
        Ok(_) => Notice::success(success),
        Err(err) => {
            error!("{operation} failed: {err}");
            Notice::error(user_message(err))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::DbErr;

    #[test]
    fn test_success_notice() {
        let result: Result<i64> = Ok(3);
        let notice = notice_for("save product", &result, "Product saved");
        assert_eq!(notice, Notice::success("Product saved"));
        assert!(!notice.is_error());
    }

    #[test]
    fn test_error_notices() {
        let validation: Result<()> = Err(Error::validation("Product name cannot be empty"));
        let notice = notice_for("save product", &validation, "Product saved");
        assert!(notice.is_error());
        assert_eq!(notice.message, "Product name cannot be empty");

        let database: Result<()> = Err(Error::Database(DbErr::Custom("disk I/O".to_string())));
        let notice = notice_for("delete category", &database, "Deleted");
        assert_eq!(notice.message, "Something went wrong. Please try again.");

        let stale: Result<()> = Err(Error::StaleRevision {
            entity: "product",
            id: 1,
            expected: 1,
            actual: 2,
        });
        assert!(notice_for("save product", &stale, "Saved").message.contains("someone else"));

        let missing: Result<()> = Err(Error::not_found("collection", 4));
        assert_eq!(
            notice_for("delete collection", &missing, "Deleted").message,
            "The collection no longer exists"
        );
    }

    #[test]
    fn test_internal_failures_share_generic_message() {
        let generic = "Something went wrong. Please try again.";
        let io = Error::Io(std::io::Error::other("disk full"));
        assert_eq!(user_message(&io), generic);

        let overflow = i32::try_from(u64::MAX).map_err(Error::from);
        assert_eq!(notice_for("reorder collection", &overflow, "Saved").message, generic);
    }
}

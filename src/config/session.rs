//! Current administrator identity.
//!
//! Authentication happens upstream; the back-office only needs to know who is
//! acting so startup log lines can name them. The identity is read from
//! `ADMIN_EMAIL` and the optional `ADMIN_NAME`.

/// The signed-in administrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminIdentity {
    /// Trimmed `ADMIN_EMAIL`
    pub email: String,
    /// Trimmed `ADMIN_NAME`, `None` when unset or blank
    pub display_name: Option<String>,
}

impl AdminIdentity {
    /// Name to print: the display name when set, otherwise the email.
    #[must_use]
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.email)
    }
}

/// Reads the current administrator from the environment.
///
/// Returns `None` when `ADMIN_EMAIL` is unset or blank.
#[must_use]
pub fn current_admin() -> Option<AdminIdentity> {
    identity_from(
        std::env::var("ADMIN_EMAIL").ok(),
        std::env::var("ADMIN_NAME").ok(),
    )
}

fn identity_from(email: Option<String>, name: Option<String>) -> Option<AdminIdentity> {
    let email = email?.trim().to_string();
    if email.is_empty() {
        return None;
    }
    let display_name = name
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty());
    Some(AdminIdentity {
        email,
        display_name,
    })
}

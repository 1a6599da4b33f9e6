//! Slug derivation and uniqueness checks.
//!
//! A slug is the URL-safe form of a display name. Every table with a slug
//! column keeps it unique; [`unique_slug`] checks the table and appends `-1`,
//! `-2`, ... until a free value is found.

use crate::{
    entities::{blog_post, brand, category, collection, product},
    errors::{Error, Result},
};
use regex::Regex;
use sea_orm::{ConnectionTrait, prelude::*};
use std::sync::LazyLock;
use tracing::debug;

/// Upper bound on lookups before giving up.
pub const MAX_SLUG_ATTEMPTS: u32 = 1000;

#[allow(clippy::expect_used)]
static NON_ALPHANUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("slug pattern is valid"));

/// Tables that carry a unique `slug` column.
pub trait Sluggable: EntityTrait {
    /// The slug column
    fn slug_column() -> Self::Column;
    /// The integer primary key column
    fn id_column() -> Self::Column;
}

macro_rules! impl_sluggable {
    ($($module:ident),+ $(,)?) => {
        $(
            impl Sluggable for $module::Entity {
                fn slug_column() -> Self::Column {
                    $module::Column::Slug
                }

                fn id_column() -> Self::Column {
                    $module::Column::Id
                }
            }
        )+
    };
}

impl_sluggable!(product, category, collection, blog_post, brand);

/// Lowercases `name`, collapses every run of non-alphanumeric characters into a
/// single hyphen and trims hyphens from both ends.
///
/// `"Red Wine (750 ml)"` becomes `"red-wine-750-ml"`.
#[must_use]
pub fn slugify(name: &str) -> String {
    let lowered = name.trim().to_lowercase();
    NON_ALPHANUMERIC
        .replace_all(&lowered, "-")
        .trim_matches('-')
        .to_string()
}

fn candidate(base: &str, attempt: u32) -> String {
    if attempt == 0 {
        base.to_string()
    } else {
        format!("{base}-{attempt}")
    }
}

/// Returns the first of `base`, `base-1`, `base-2`, ... that is not in `taken`.
#[must_use]
pub fn next_available_slug<S: AsRef<str>>(base: &str, taken: &[S]) -> String {
    (0..)
        .map(|attempt| candidate(base, attempt))
        .find(|slug| !taken.iter().any(|existing| existing.as_ref() == slug))
        .unwrap_or_else(|| base.to_string())
}

/// Picks the slug to store: the explicit one if given, otherwise one derived from `name`.
///
/// # Errors
/// Returns a validation error when the result would be empty.
pub fn base_slug(explicit: Option<&str>, name: &str) -> Result<String> {
    let base = explicit
        .map(slugify)
        .filter(|slug| !slug.is_empty())
        .unwrap_or_else(|| slugify(name));
    if base.is_empty() {
        return Err(Error::validation(format!(
            "Cannot derive a slug from '{name}'"
        )));
    }
    Ok(base)
}

async fn slug_taken<E, C>(db: &C, slug: &str, exclude_id: Option<i64>) -> Result<bool>
where
    E: Sluggable,
    C: ConnectionTrait,
{
    let mut query = E::find().filter(E::slug_column().eq(slug));
    if let Some(id) = exclude_id {
        query = query.filter(E::id_column().ne(id));
    }
    Ok(query.one(db).await?.is_some())
}

/// Searches table `E` for a free slug starting at `base`.
///
/// The row identified by `exclude_id` is ignored so that saving a record
/// without renaming it keeps its current slug.
///
/// # Errors
/// Returns an error if `base` is empty, a query fails, or no free slug is
/// found within [`MAX_SLUG_ATTEMPTS`] attempts.
pub async fn unique_slug<E, C>(db: &C, base: &str, exclude_id: Option<i64>) -> Result<String>
where
    E: Sluggable,
    C: ConnectionTrait,
{
    if base.is_empty() {
        return Err(Error::validation("Slug cannot be empty"));
    }

    for attempt in 0..MAX_SLUG_ATTEMPTS {
        let slug = candidate(base, attempt);
        if !slug_taken::<E, C>(db, &slug, exclude_id).await? {
            if attempt > 0 {
                debug!("Slug '{base}' taken, using '{slug}'");
            }
            return Ok(slug);
        }
    }

    Err(Error::SlugExhausted {
        base: base.to_string(),
        attempts: MAX_SLUG_ATTEMPTS,
    })
}

//! Brand business logic.

use crate::{
    core::slug::{slugify, unique_slug},
    entities::{Brand, Product, brand, product},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{PaginatorTrait, QueryOrder, Set, prelude::*};
use tracing::info;

/// Creates an active brand with a unique slug.
///
/// # Errors
/// Returns `Validation` for a blank name, or a database error.
pub async fn create_brand(
    db: &DatabaseConnection,
    name: &str,
    logo_url: Option<String>,
) -> Result<brand::Model> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::validation("Brand name cannot be empty"));
    }
    let slug = unique_slug::<Brand, _>(db, &slugify(name), None).await?;

    let brand = brand::ActiveModel {
        name: Set(name.to_string()),
        slug: Set(slug),
        logo_url: Set(logo_url),
        is_active: Set(true),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    let brand = brand.insert(db).await?;
    info!("Created brand {} '{}'", brand.id, brand.slug);
    Ok(brand)
}

/// All brands, alphabetically.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn list_brands(db: &DatabaseConnection) -> Result<Vec<brand::Model>> {
    Brand::find()
        .order_by_asc(brand::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Deletes a brand that no product uses.
///
/// # Errors
/// Returns `NotFound` for an unknown brand and `Validation` while products
/// still use it.
pub async fn delete_brand(db: &DatabaseConnection, brand_id: i64) -> Result<()> {
    let brand = Brand::find_by_id(brand_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("brand", brand_id))?;

    let in_use = Product::find()
        .filter(product::Column::BrandId.eq(brand_id))
        .count(db)
        .await?;
    if in_use > 0 {
        return Err(Error::validation(format!(
            "Brand '{}' is used by {in_use} products",
            brand.name
        )));
    }

    brand.delete(db).await?;
    Ok(())
}

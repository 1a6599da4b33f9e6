//! Variant business logic - per-product sellable units and their images.
//!
//! Variants are written as part of the product save workflow in
//! [`crate::core::product`]; the helpers here take a generic connection so they
//! run inside that workflow's transaction.

use crate::{
    core::pricing::{Inventory, calculate_inventory, validate_optional_price, validate_price},
    entities::{
        ProductVariant, VariantImage, product_variant, values::VariantAttributes, variant_image,
    },
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*, sea_query::Expr};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Variant fields as submitted from the product editor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VariantForm {
    /// `None` for a new variant
    pub id: Option<i64>,
    /// Display name, required
    pub name: String,
    /// Stock keeping unit
    pub sku: Option<String>,
    /// Selling price
    pub price: f64,
    /// Former price
    pub compare_at_price: Option<f64>,
    /// Units on hand, never negative
    pub stock: i32,
    /// Option values such as size or colour
    pub attributes: VariantAttributes,
    /// At most one variant per product keeps this set
    pub is_default: bool,
    /// Hidden from the storefront when false
    pub is_active: bool,
    /// Image URLs in display order; the first becomes primary
    pub images: Vec<String>,
}

impl VariantForm {
    /// An active variant with the given name and price and no stock.
    pub fn new(name: impl Into<String>, price: f64) -> Self {
        Self {
            name: name.into(),
            price,
            is_active: true,
            ..Self::default()
        }
    }
}

/// A variant together with its images, ordered by `sort_order`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariantWithImages {
    /// The variant row
    pub variant: product_variant::Model,
    /// Its images
    pub images: Vec<variant_image::Model>,
}

/// Checks a single variant form.
///
/// # Errors
/// Returns `Validation` or `InvalidAmount` for the first bad field.
pub fn validate_variant(form: &VariantForm) -> Result<()> {
    if form.name.trim().is_empty() {
        return Err(Error::validation("Variant name cannot be empty"));
    }
    validate_price(form.price)?;
    validate_optional_price(form.compare_at_price)?;
    if form.stock < 0 {
        return Err(Error::validation(format!(
            "Variant '{}' cannot have negative stock",
            form.name.trim()
        )));
    }
    Ok(())
}

/// Leaves at most one variant flagged as default: the first flagged one wins.
///
/// Returns the index of the default variant, if any.
pub fn normalize_default_flags(variants: &mut [VariantForm]) -> Option<usize> {
    let winner = variants.iter().position(|variant| variant.is_default);
    for (index, variant) in variants.iter_mut().enumerate() {
        variant.is_default = Some(index) == winner;
    }
    winner
}

/// Stock state of a variant under the store threshold.
///
/// Variants follow their product's `continue_selling` setting.
#[must_use]
pub const fn variant_inventory(
    variant: &product_variant::Model,
    continue_selling: bool,
    threshold: i32,
) -> Inventory {
    calculate_inventory(variant.stock, continue_selling, threshold)
}

/// All variants of a product in display order.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn list_variants<C>(db: &C, product_id: i64) -> Result<Vec<product_variant::Model>>
where
    C: ConnectionTrait,
{
    ProductVariant::find()
        .filter(product_variant::Column::ProductId.eq(product_id))
        .order_by_asc(product_variant::Column::SortOrder)
        .order_by_asc(product_variant::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Loads variants of a product with their images in two queries.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn list_variants_with_images<C>(db: &C, product_id: i64) -> Result<Vec<VariantWithImages>>
where
    C: ConnectionTrait,
{
    let variants = list_variants(db, product_id).await?;
    if variants.is_empty() {
        return Ok(Vec::new());
    }

    let images = VariantImage::find()
        .filter(variant_image::Column::VariantId.is_in(variants.iter().map(|v| v.id)))
        .order_by_asc(variant_image::Column::SortOrder)
        .order_by_asc(variant_image::Column::Id)
        .all(db)
        .await?;

    let mut by_variant: HashMap<i64, Vec<variant_image::Model>> = HashMap::new();
    for image in images {
        by_variant.entry(image.variant_id).or_default().push(image);
    }

    Ok(variants
        .into_iter()
        .map(|variant| {
            let images = by_variant.remove(&variant.id).unwrap_or_default();
            VariantWithImages { variant, images }
        })
        .collect())
}

/// Replaces the image set of a variant. The first URL is marked primary.
///
/// # Errors
/// Returns an error if a statement fails.
pub async fn assign_variant_images<C>(
    db: &C,
    variant_id: i64,
    urls: &[String],
) -> Result<Vec<variant_image::Model>>
where
    C: ConnectionTrait,
{
    VariantImage::delete_many()
        .filter(variant_image::Column::VariantId.eq(variant_id))
        .exec(db)
        .await?;

    let rows = urls
        .iter()
        .map(|url| url.trim())
        .filter(|url| !url.is_empty())
        .enumerate()
        .map(|(position, url)| -> Result<variant_image::ActiveModel> {
            Ok(variant_image::ActiveModel {
                variant_id: Set(variant_id),
                url: Set(url.to_string()),
                alt_text: Set(None),
                sort_order: Set(i32::try_from(position)?),
                is_primary: Set(position == 0),
                ..Default::default()
            })
        })
        .collect::<Result<Vec<_>>>()?;

    if !rows.is_empty() {
        VariantImage::insert_many(rows)
            .exec_without_returning(db)
            .await?;
    }

    VariantImage::find()
        .filter(variant_image::Column::VariantId.eq(variant_id))
        .order_by_asc(variant_image::Column::SortOrder)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Updates the variant named by `form.id` or inserts a new one under `product_id`.
///
/// # Errors
/// Returns `NotFound` when `form.id` names a variant of another product.
pub async fn upsert_variant<C>(
    db: &C,
    product_id: i64,
    form: &VariantForm,
    sort_order: i32,
) -> Result<product_variant::Model>
where
    C: ConnectionTrait,
{
    let now = Utc::now();

    let mut variant: product_variant::ActiveModel = match form.id {
        Some(id) => {
            let existing = ProductVariant::find_by_id(id)
                .one(db)
                .await?
                .filter(|variant| variant.product_id == product_id)
                .ok_or_else(|| Error::not_found("variant", id))?;
            existing.into()
        }
        None => product_variant::ActiveModel {
            product_id: Set(product_id),
            created_at: Set(now),
            ..Default::default()
        },
    };

    variant.name = Set(form.name.trim().to_string());
    variant.sku = Set(form.sku.clone().filter(|sku| !sku.trim().is_empty()));
    variant.price = Set(form.price);
    variant.compare_at_price = Set(form.compare_at_price);
    variant.stock = Set(form.stock);
    variant.attributes = Set(form.attributes.clone());
    variant.is_default = Set(form.is_default);
    variant.is_active = Set(form.is_active);
    variant.sort_order = Set(sort_order);
    variant.updated_at = Set(now);

    let saved = if form.id.is_some() {
        variant.update(db).await?
    } else {
        variant.insert(db).await?
    };
    debug!("Saved variant {} of product {product_id}", saved.id);
    Ok(saved)
}

/// Deletes variants and their images.
///
/// # Errors
/// Returns an error if a statement fails.
pub async fn delete_variants<C>(db: &C, variant_ids: &[i64]) -> Result<u64>
where
    C: ConnectionTrait,
{
    if variant_ids.is_empty() {
        return Ok(0);
    }

    VariantImage::delete_many()
        .filter(variant_image::Column::VariantId.is_in(variant_ids.iter().copied()))
        .exec(db)
        .await?;

    let result = ProductVariant::delete_many()
        .filter(product_variant::Column::Id.is_in(variant_ids.iter().copied()))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

/// Makes `variant_id` the only default variant of `product_id`.
///
/// # Errors
/// Returns `NotFound` when the variant does not belong to the product.
pub async fn set_default_variant(
    db: &DatabaseConnection,
    product_id: i64,
    variant_id: i64,
) -> Result<product_variant::Model> {
    let txn = db.begin().await?;

    let variant = ProductVariant::find_by_id(variant_id)
        .one(&txn)
        .await?
        .filter(|variant| variant.product_id == product_id)
        .ok_or_else(|| Error::not_found("variant", variant_id))?;

    ProductVariant::update_many()
        .col_expr(product_variant::Column::IsDefault, Expr::value(false))
        .filter(product_variant::Column::ProductId.eq(product_id))
        .exec(&txn)
        .await?;

    let mut active: product_variant::ActiveModel = variant.into();
    active.is_default = Set(true);
    active.updated_at = Set(Utc::now());
    let updated = active.update(&txn).await?;

    txn.commit().await?;
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    fn variant(name: &str, is_default: bool) -> VariantForm {
        VariantForm {
            is_default,
            ..VariantForm::new(name, 10.0)
        }
    }

    #[test]
    fn test_normalize_default_flags_first_flagged_wins() {
        let mut variants = vec![
            variant("Pack", false),
            variant("Carton", true),
            variant("Pallet", true),
        ];
        assert_eq!(normalize_default_flags(&mut variants), Some(1));
        let flags: Vec<bool> = variants.iter().map(|v| v.is_default).collect();
        assert_eq!(flags, vec![false, true, false]);
    }

    #[test]
    fn test_normalize_default_flags_none_flagged() {
        let mut variants = vec![variant("Pack", false), variant("Carton", false)];
        assert_eq!(normalize_default_flags(&mut variants), None);
        assert!(variants.iter().all(|v| !v.is_default));
    }

    #[test]
    fn test_validate_variant() {
        assert!(validate_variant(&variant("Pack", false)).is_ok());
        assert!(matches!(
            validate_variant(&variant("  ", false)),
            Err(Error::Validation { .. })
        ));
        let negative_stock = VariantForm {
            stock: -1,
            ..variant("Pack", false)
        };
        assert!(matches!(
            validate_variant(&negative_stock),
            Err(Error::Validation { .. })
        ));
        let bad_price = VariantForm::new("Pack", -2.0);
        assert!(matches!(
            validate_variant(&bad_price),
            Err(Error::InvalidAmount { .. })
        ));
    }

    #[tokio::test]
    async fn test_assign_variant_images_replaces_set() -> Result<()> {
        let db = setup_test_db().await?;
        let mut form = product_form("Olive Oil", 12.0);
        form.variants = vec![variant("500 ml", true)];
        let saved = save_test_product(&db, form).await?;
        let variant_id = saved.variants[0].variant.id;

        let first = assign_variant_images(
            &db,
            variant_id,
            &["https://cdn/a.jpg".to_string(), "https://cdn/b.jpg".to_string()],
        )
        .await?;
        assert_eq!(first.len(), 2);
        assert!(first[0].is_primary);
        assert!(!first[1].is_primary);

        let second = assign_variant_images(
            &db,
            variant_id,
            &[" ".to_string(), "https://cdn/c.jpg".to_string()],
        )
        .await?;
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].url, "https://cdn/c.jpg");
        assert!(second[0].is_primary);

        Ok(())
    }

    #[tokio::test]
    async fn test_set_default_variant_clears_others() -> Result<()> {
        let db = setup_test_db().await?;
        let mut form = product_form("Olive Oil", 12.0);
        form.variants = vec![variant("500 ml", true), variant("1 l", false)];
        let saved = save_test_product(&db, form).await?;
        let product_id = saved.product.id;
        let second_id = saved.variants[1].variant.id;

        set_default_variant(&db, product_id, second_id).await?;

        let variants = list_variants(&db, product_id).await?;
        let defaults: Vec<i64> = variants
            .iter()
            .filter(|v| v.is_default)
            .map(|v| v.id)
            .collect();
        assert_eq!(defaults, vec![second_id]);

        Ok(())
    }

    #[tokio::test]
    async fn test_set_default_variant_rejects_foreign_variant() -> Result<()> {
        let db = setup_test_db().await?;
        let mut oil = product_form("Olive Oil", 12.0);
        oil.variants = vec![variant("500 ml", true)];
        let oil = save_test_product(&db, oil).await?;
        let vinegar = save_test_product(&db, product_form("Vinegar", 4.0)).await?;

        let result =
            set_default_variant(&db, vinegar.product.id, oil.variants[0].variant.id).await;
        assert!(matches!(result, Err(Error::NotFound { entity: "variant", .. })));

        Ok(())
    }
}

//! Product business logic - the product save workflow and catalogue maintenance.
//!
//! Saving a product touches several tables: the product row, its variants,
//! each variant's images, and the category and collection join tables. All of
//! it runs inside one database transaction, so a failure at any step leaves the
//! catalogue exactly as it was before the save.

use crate::{
    config::catalog::StoreSettings,
    core::{
        category::{product_category_ids, replace_product_categories},
        collection::{product_collection_ids, replace_product_collections},
        pricing::{
            Inventory, calculate_discount, calculate_inventory, calculate_profit_margin,
            validate_optional_price, validate_price,
        },
        seo::{SeoFields, seo_score},
        slug::{base_slug, unique_slug},
        variant::{
            VariantForm, VariantWithImages, assign_variant_images, delete_variants,
            list_variants, list_variants_with_images, normalize_default_flags, upsert_variant,
            validate_variant, variant_inventory,
        },
    },
    entities::{
        Brand, Product, ProductCategory, ProductCollection, ProductVariant, product,
        product_category, product_collection, product_variant,
        values::{ImageList, Specifications},
    },
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*, sea_query::Expr};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{info, instrument, warn};

/// Everything the product editor submits.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductForm {
    /// `None` creates a new product
    pub id: Option<i64>,
    /// Revision the editor loaded; when set, a newer revision in the database
    /// rejects the save instead of overwriting it
    pub expected_revision: Option<i32>,
    /// Display name, required
    pub name: String,
    /// Explicit slug; derived from `name` when absent
    pub slug: Option<String>,
    /// Must refer to an existing brand
    pub brand_id: Option<i64>,
    /// Stock keeping unit
    pub sku: Option<String>,
    /// One-line summary for listings
    pub short_description: Option<String>,
    /// Full description, counts towards the SEO score
    pub description: Option<String>,
    /// Selling price
    pub price: f64,
    /// Former price; a discount is shown when it is higher than `price`
    pub compare_at_price: Option<f64>,
    /// Purchase cost, used for the profit margin
    pub cost_price: Option<f64>,
    /// Units on hand, never negative
    pub stock: i32,
    /// Keeps the product purchasable at zero stock
    pub continue_selling_when_out_of_stock: bool,
    /// Hidden from the storefront when false
    pub is_active: bool,
    /// Highlighted on the home page
    pub is_featured: bool,
    /// Shown in the showcase carousel
    pub is_showcase: bool,
    /// Label and value pairs shown in the specs table
    pub specifications: Specifications,
    /// Image URLs in display order
    pub images: Vec<String>,
    /// `<title>` override for search engines
    pub meta_title: Option<String>,
    /// Search result snippet
    pub meta_description: Option<String>,
    /// Comma-separated keywords
    pub meta_keywords: Option<String>,
    /// Every variant the product should have after the save
    pub variants: Vec<VariantForm>,
    /// Manual collections to link
    pub collection_ids: Vec<i64>,
    /// Categories to link
    pub category_ids: Vec<i64>,
}

impl ProductForm {
    /// An active product with the given name and price and nothing else filled in.
    pub fn new(name: impl Into<String>, price: f64) -> Self {
        Self {
            name: name.into(),
            price,
            is_active: true,
            ..Self::default()
        }
    }

    /// Prefills the editor from a stored product, carrying its revision.
    #[must_use]
    pub fn from_detail(detail: &ProductDetail) -> Self {
        let product = &detail.product;
        Self {
            id: Some(product.id),
            expected_revision: Some(product.revision),
            name: product.name.clone(),
            slug: Some(product.slug.clone()),
            brand_id: product.brand_id,
            sku: product.sku.clone(),
            short_description: product.short_description.clone(),
            description: product.description.clone(),
            price: product.price,
            compare_at_price: product.compare_at_price,
            cost_price: product.cost_price,
            stock: product.stock,
            continue_selling_when_out_of_stock: product.continue_selling_when_out_of_stock,
            is_active: product.is_active,
            is_featured: product.is_featured,
            is_showcase: product.is_showcase,
            specifications: product.specifications.clone(),
            images: product.images.0.clone(),
            meta_title: product.meta_title.clone(),
            meta_description: product.meta_description.clone(),
            meta_keywords: product.meta_keywords.clone(),
            variants: detail
                .variants
                .iter()
                .map(|entry| VariantForm {
                    id: Some(entry.variant.id),
                    name: entry.variant.name.clone(),
                    sku: entry.variant.sku.clone(),
                    price: entry.variant.price,
                    compare_at_price: entry.variant.compare_at_price,
                    stock: entry.variant.stock,
                    attributes: entry.variant.attributes.clone(),
                    is_default: entry.variant.is_default,
                    is_active: entry.variant.is_active,
                    images: entry.images.iter().map(|image| image.url.clone()).collect(),
                })
                .collect(),
            collection_ids: detail.collection_ids.clone(),
            category_ids: detail.category_ids.clone(),
        }
    }
}

/// A product with everything hanging off it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductDetail {
    /// The product row
    pub product: product::Model,
    /// Variants in display order
    pub variants: Vec<VariantWithImages>,
    /// Linked collections, ascending
    pub collection_ids: Vec<i64>,
    /// Linked categories, ascending
    pub category_ids: Vec<i64>,
}

impl ProductDetail {
    /// The variant flagged as default, if any.
    #[must_use]
    pub fn default_variant(&self) -> Option<&product_variant::Model> {
        self.variants
            .iter()
            .map(|entry| &entry.variant)
            .find(|variant| variant.is_default)
    }

    /// Stock state of each variant, in display order.
    #[must_use]
    pub fn variant_inventories(&self, threshold: i32) -> Vec<(i64, Inventory)> {
        let continue_selling = self.product.continue_selling_when_out_of_stock;
        self.variants
            .iter()
            .map(|entry| {
                (
                    entry.variant.id,
                    variant_inventory(&entry.variant, continue_selling, threshold),
                )
            })
            .collect()
    }
}

/// Operations applicable to a selection of products at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BulkAction {
    /// Marks the products active
    Activate,
    /// Hides the products from the storefront
    Deactivate,
    /// Marks the products featured
    Feature,
    /// Clears the featured flag
    Unfeature,
    /// Removes the products with their variants and links
    Delete,
}

fn optional_text(value: Option<&String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

/// Checks the form without touching the database.
///
/// # Errors
/// Returns `Validation` or `InvalidAmount` for the first bad field.
pub fn validate_product_form(form: &ProductForm) -> Result<()> {
    if form.name.trim().is_empty() {
        return Err(Error::validation("Product name cannot be empty"));
    }
    validate_price(form.price)?;
    validate_optional_price(form.compare_at_price)?;
    validate_optional_price(form.cost_price)?;
    if form.stock < 0 {
        return Err(Error::validation("Stock cannot be negative"));
    }

    let mut seen = HashSet::new();
    for variant in &form.variants {
        validate_variant(variant)?;
        if let Some(id) = variant.id {
            if !seen.insert(id) {
                return Err(Error::validation(format!(
                    "Variant {id} appears more than once"
                )));
            }
        }
    }
    Ok(())
}

/// Creates or updates a product with its variants and links in one transaction.
///
/// # Errors
/// Returns an error if validation fails, a referenced brand, category,
/// collection or variant does not exist, the expected revision is stale, or
/// any statement fails. Nothing is written in any of these cases.
#[instrument(skip(db, form, settings), fields(product = %form.name.trim()))]
pub async fn save_product(
    db: &DatabaseConnection,
    mut form: ProductForm,
    settings: &StoreSettings,
) -> Result<ProductDetail> {
    validate_product_form(&form)?;
    normalize_default_flags(&mut form.variants);
    let base = base_slug(form.slug.as_deref(), &form.name)?;

    let txn = db.begin().await?;

    if let Some(brand_id) = form.brand_id {
        Brand::find_by_id(brand_id)
            .one(&txn)
            .await?
            .ok_or_else(|| Error::not_found("brand", brand_id))?;
    }

    let slug = unique_slug::<Product, _>(&txn, &base, form.id).await?;
    let product = write_product_row(&txn, &form, slug, settings).await?;

    sync_variants(&txn, product.id, &form.variants).await?;
    replace_collection_links(&txn, product.id, &form.collection_ids).await?;
    replace_category_links(&txn, product.id, &form.category_ids).await?;

    let detail = load_detail(&txn, product).await?;
    txn.commit().await?;

    info!(
        "Saved product {} '{}' (revision {}, {} variants)",
        detail.product.id,
        detail.product.slug,
        detail.product.revision,
        detail.variants.len()
    );
    Ok(detail)
}

async fn write_product_row<C>(
    db: &C,
    form: &ProductForm,
    slug: String,
    settings: &StoreSettings,
) -> Result<product::Model>
where
    C: ConnectionTrait,
{
    let now = Utc::now();
    let images = ImageList::from_urls(form.images.iter().cloned());
    let discount = calculate_discount(form.price, form.compare_at_price);
    let inventory = calculate_inventory(
        form.stock,
        form.continue_selling_when_out_of_stock,
        settings.low_stock_threshold,
    );
    let description = optional_text(form.description.as_ref());
    let meta_title = optional_text(form.meta_title.as_ref());
    let meta_description = optional_text(form.meta_description.as_ref());
    let meta_keywords = optional_text(form.meta_keywords.as_ref());
    let score = seo_score(&SeoFields {
        title: form.name.trim(),
        slug: &slug,
        meta_title: meta_title.as_deref(),
        meta_description: meta_description.as_deref(),
        description: description.as_deref(),
        keywords: meta_keywords.as_deref(),
        image_count: images.len(),
    });

    let (mut active, revision): (product::ActiveModel, i32) = match form.id {
        Some(id) => {
            let existing = Product::find_by_id(id)
                .one(db)
                .await?
                .ok_or_else(|| Error::not_found("product", id))?;
            if let Some(expected) = form.expected_revision {
                if expected != existing.revision {
                    warn!(
                        "Rejected stale save of product {id}: expected revision {expected}, found {}",
                        existing.revision
                    );
                    return Err(Error::StaleRevision {
                        entity: "product",
                        id,
                        expected,
                        actual: existing.revision,
                    });
                }
            }
            let revision = existing.revision + 1;
            (existing.into(), revision)
        }
        None => (
            product::ActiveModel {
                created_at: Set(now),
                ..Default::default()
            },
            1,
        ),
    };

    active.name = Set(form.name.trim().to_string());
    active.slug = Set(slug);
    active.brand_id = Set(form.brand_id);
    active.sku = Set(optional_text(form.sku.as_ref()));
    active.short_description = Set(optional_text(form.short_description.as_ref()));
    active.description = Set(description);
    active.price = Set(form.price);
    active.compare_at_price = Set(form.compare_at_price);
    active.cost_price = Set(form.cost_price);
    active.discount_amount = Set(discount.map(|d| d.amount));
    active.discount_percentage = Set(discount.map(|d| d.percentage));
    active.profit_margin = Set(calculate_profit_margin(form.price, form.cost_price));
    active.stock = Set(form.stock);
    active.continue_selling_when_out_of_stock = Set(form.continue_selling_when_out_of_stock);
    active.in_stock = Set(inventory.in_stock);
    active.inventory_status = Set(inventory.status);
    active.is_active = Set(form.is_active);
    active.is_featured = Set(form.is_featured);
    active.is_showcase = Set(form.is_showcase);
    active.specifications = Set(form.specifications.clone().cleaned());
    active.images = Set(images);
    active.meta_title = Set(meta_title);
    active.meta_description = Set(meta_description);
    active.meta_keywords = Set(meta_keywords);
    active.seo_score = Set(i32::from(score));
    active.revision = Set(revision);
    active.updated_at = Set(now);

    let saved = if form.id.is_some() {
        active.update(db).await?
    } else {
        active.insert(db).await?
    };
    Ok(saved)
}

/// Upserts the submitted variants in order, then drops the ones no longer listed.
async fn sync_variants<C>(db: &C, product_id: i64, forms: &[VariantForm]) -> Result<()>
where
    C: ConnectionTrait,
{
    let existing = list_variants(db, product_id).await?;
    let kept: HashSet<i64> = forms.iter().filter_map(|form| form.id).collect();

    for (position, form) in forms.iter().enumerate() {
        let variant = upsert_variant(db, product_id, form, i32::try_from(position)?).await?;
        assign_variant_images(db, variant.id, &form.images).await?;
    }

    let orphans: Vec<i64> = existing
        .iter()
        .map(|variant| variant.id)
        .filter(|id| !kept.contains(id))
        .collect();
    if !orphans.is_empty() {
        info!(
            "Removing {} variants of product {product_id} no longer in the form",
            orphans.len()
        );
        delete_variants(db, &orphans).await?;
    }
    Ok(())
}

async fn replace_collection_links<C>(db: &C, product_id: i64, collection_ids: &[i64]) -> Result<()>
where
    C: ConnectionTrait,
{
    replace_product_collections(db, product_id, collection_ids).await
}

async fn replace_category_links<C>(db: &C, product_id: i64, category_ids: &[i64]) -> Result<()>
where
    C: ConnectionTrait,
{
    replace_product_categories(db, product_id, category_ids).await
}

async fn load_detail<C>(db: &C, product: product::Model) -> Result<ProductDetail>
where
    C: ConnectionTrait,
{
    let variants = list_variants_with_images(db, product.id).await?;
    let collection_ids = product_collection_ids(db, product.id).await?;
    let category_ids = product_category_ids(db, product.id).await?;
    Ok(ProductDetail {
        product,
        variants,
        collection_ids,
        category_ids,
    })
}

/// Loads a product with variants, images and links.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn get_product(db: &DatabaseConnection, product_id: i64) -> Result<Option<ProductDetail>> {
    match Product::find_by_id(product_id).one(db).await? {
        Some(product) => Ok(Some(load_detail(db, product).await?)),
        None => Ok(None),
    }
}

/// Looks up a product by slug.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn get_product_by_slug(
    db: &DatabaseConnection,
    slug: &str,
) -> Result<Option<product::Model>> {
    Product::find()
        .filter(product::Column::Slug.eq(slug))
        .one(db)
        .await
        .map_err(Into::into)
}

/// All products, alphabetically.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn list_products(db: &DatabaseConnection) -> Result<Vec<product::Model>> {
    Product::find()
        .order_by_asc(product::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Products at or below `threshold` units, emptiest first.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn low_stock_products(
    db: &DatabaseConnection,
    threshold: i32,
) -> Result<Vec<product::Model>> {
    Product::find()
        .filter(product::Column::Stock.lte(threshold))
        .filter(product::Column::IsActive.eq(true))
        .order_by_asc(product::Column::Stock)
        .order_by_asc(product::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Removes products and everything that hangs off them.
async fn delete_products_cascade<C>(db: &C, product_ids: &[i64]) -> Result<u64>
where
    C: ConnectionTrait,
{
    let variant_ids: Vec<i64> = ProductVariant::find()
        .filter(product_variant::Column::ProductId.is_in(product_ids.iter().copied()))
        .all(db)
        .await?
        .into_iter()
        .map(|variant| variant.id)
        .collect();
    delete_variants(db, &variant_ids).await?;

    ProductCollection::delete_many()
        .filter(product_collection::Column::ProductId.is_in(product_ids.iter().copied()))
        .exec(db)
        .await?;
    ProductCategory::delete_many()
        .filter(product_category::Column::ProductId.is_in(product_ids.iter().copied()))
        .exec(db)
        .await?;

    let result = Product::delete_many()
        .filter(product::Column::Id.is_in(product_ids.iter().copied()))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

/// Deletes a product with its variants, images and links.
///
/// # Errors
/// Returns `NotFound` if the product does not exist.
#[instrument(skip(db))]
pub async fn delete_product(db: &DatabaseConnection, product_id: i64) -> Result<()> {
    let txn = db.begin().await?;

    Product::find_by_id(product_id)
        .one(&txn)
        .await?
        .ok_or_else(|| Error::not_found("product", product_id))?;
    delete_products_cascade(&txn, &[product_id]).await?;

    txn.commit().await?;
    info!("Deleted product {product_id}");
    Ok(())
}

/// Applies `action` to exactly the products in `product_ids`.
///
/// Returns the number of products affected. An empty selection does nothing.
///
/// # Errors
/// Returns an error if a statement fails; a failed delete changes nothing.
#[instrument(skip(db, product_ids), fields(count = product_ids.len()))]
pub async fn apply_bulk_action(
    db: &DatabaseConnection,
    product_ids: &[i64],
    action: BulkAction,
) -> Result<u64> {
    let ids: Vec<i64> = {
        let mut seen = HashSet::new();
        product_ids
            .iter()
            .copied()
            .filter(|id| seen.insert(*id))
            .collect()
    };
    if ids.is_empty() {
        return Ok(0);
    }

    let (column, value) = match action {
        BulkAction::Activate => (product::Column::IsActive, true),
        BulkAction::Deactivate => (product::Column::IsActive, false),
        BulkAction::Feature => (product::Column::IsFeatured, true),
        BulkAction::Unfeature => (product::Column::IsFeatured, false),
        BulkAction::Delete => {
            let txn = db.begin().await?;
            let deleted = delete_products_cascade(&txn, &ids).await?;
            txn.commit().await?;
            info!("Bulk deleted {deleted} products");
            return Ok(deleted);
        }
    };

    let result = Product::update_many()
        .col_expr(column, Expr::value(value))
        .col_expr(product::Column::UpdatedAt, Expr::value(Utc::now()))
        .col_expr(
            product::Column::Revision,
            Expr::col(product::Column::Revision).add(1),
        )
        .filter(product::Column::Id.is_in(ids))
        .exec(db)
        .await?;

    info!("Bulk {action:?} affected {} products", result.rows_affected);
    Ok(result.rows_affected)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::{
        core::variant::VariantForm,
        entities::{InventoryStatus, VariantImage, values::Specification},
        test_utils::*,
    };
    use sea_orm::{DatabaseBackend, MockDatabase, PaginatorTrait};

    fn variant(name: &str, price: f64, is_default: bool) -> VariantForm {
        VariantForm {
            is_default,
            stock: 5,
            ..VariantForm::new(name, price)
        }
    }

    #[tokio::test]
    async fn test_save_product_validation_happens_before_queries() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();
        let settings = StoreSettings::default();

        let result = save_product(&db, ProductForm::new("  ", 10.0), &settings).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        let result = save_product(&db, ProductForm::new("Tea", -1.0), &settings).await;
        assert!(matches!(result, Err(Error::InvalidAmount { amount }) if amount == -1.0));

        let mut negative_stock = ProductForm::new("Tea", 1.0);
        negative_stock.stock = -4;
        let result = save_product(&db, negative_stock, &settings).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        assert!(db.into_transaction_log().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_save_new_product_computes_derived_fields() -> Result<()> {
        let db = setup_test_db().await?;
        let mut form = product_form("Red Wine", 500.0);
        form.compare_at_price = Some(600.0);
        form.cost_price = Some(300.0);
        form.stock = 4;
        form.images = vec!["https://cdn/wine.jpg".to_string()];
        form.specifications = Specifications(vec![Specification {
            key: "Volume".to_string(),
            value: "750 ml".to_string(),
        }]);

        let saved = save_test_product(&db, form).await?;
        let product = &saved.product;

        assert_eq!(product.slug, "red-wine");
        assert_eq!(product.discount_amount, Some(100.0));
        assert_eq!(product.discount_percentage, Some(17.0));
        assert_eq!(product.profit_margin, 40.0);
        assert_eq!(product.inventory_status, InventoryStatus::LowStock);
        assert!(product.in_stock);
        assert_eq!(product.revision, 1);
        assert_eq!(product.images.len(), 1);
        assert_eq!(product.specifications.0.len(), 1);
        // title + slug + image
        assert_eq!(product.seo_score, 35);

        Ok(())
    }

    #[tokio::test]
    async fn test_no_discount_when_compare_at_not_higher() -> Result<()> {
        let db = setup_test_db().await?;
        let mut form = product_form("Cheap Wine", 500.0);
        form.compare_at_price = Some(450.0);

        let saved = save_test_product(&db, form).await?;
        assert_eq!(saved.product.discount_amount, None);
        assert_eq!(saved.product.discount_percentage, None);
        assert_eq!(saved.product.profit_margin, 0.0);

        Ok(())
    }

    #[tokio::test]
    async fn test_slug_collision_gets_suffix() -> Result<()> {
        let db = setup_test_db().await?;
        let first = save_test_product(&db, product_form("Red", 1.0)).await?;
        let second = save_test_product(&db, product_form("Red", 2.0)).await?;
        let third = save_test_product(&db, product_form("RED!", 3.0)).await?;

        assert_eq!(first.product.slug, "red");
        assert_eq!(second.product.slug, "red-1");
        assert_eq!(third.product.slug, "red-2");

        Ok(())
    }

    #[tokio::test]
    async fn test_resaving_keeps_own_slug() -> Result<()> {
        let db = setup_test_db().await?;
        let saved = save_test_product(&db, product_form("Red", 1.0)).await?;

        let form = ProductForm::from_detail(&saved);
        let resaved = save_test_product(&db, form).await?;

        assert_eq!(resaved.product.id, saved.product.id);
        assert_eq!(resaved.product.slug, "red");
        assert_eq!(resaved.product.revision, 2);

        Ok(())
    }

    #[tokio::test]
    async fn test_save_with_variants_and_default_normalization() -> Result<()> {
        let db = setup_test_db().await?;
        let mut form = product_form("Cola", 1.5);
        let mut pack = variant("Pack", 1.5, true);
        pack.images = vec!["https://cdn/pack.jpg".to_string()];
        form.variants = vec![pack, variant("Carton", 15.0, true)];

        let saved = save_test_product(&db, form).await?;

        assert_eq!(saved.variants.len(), 2);
        assert_eq!(saved.variants[0].variant.name, "Pack");
        assert_eq!(saved.variants[0].variant.sort_order, 0);
        assert_eq!(saved.variants[1].variant.sort_order, 1);
        assert_eq!(saved.variants[0].images.len(), 1);
        assert!(saved.variants[1].images.is_empty());
        assert_eq!(saved.default_variant().unwrap().name, "Pack");

        Ok(())
    }

    #[tokio::test]
    async fn test_resave_updates_inserts_and_removes_variants() -> Result<()> {
        let db = setup_test_db().await?;
        let mut form = product_form("Cola", 1.5);
        let mut pack = variant("Pack", 1.5, true);
        pack.images = vec!["https://cdn/pack.jpg".to_string()];
        form.variants = vec![pack, variant("Carton", 15.0, false)];
        let saved = save_test_product(&db, form).await?;
        let pack_id = saved.variants[0].variant.id;
        let carton_id = saved.variants[1].variant.id;

        // Edit: rename the carton, drop the pack, add a pallet
        let mut edit = ProductForm::from_detail(&saved);
        edit.variants.remove(0);
        edit.variants[0].name = "Carton of 12".to_string();
        edit.variants.push(variant("Pallet", 900.0, false));

        let resaved = save_test_product(&db, edit).await?;

        let names: Vec<&str> = resaved
            .variants
            .iter()
            .map(|entry| entry.variant.name.as_str())
            .collect();
        assert_eq!(names, vec!["Carton of 12", "Pallet"]);
        assert_eq!(resaved.variants[0].variant.id, carton_id);
        assert!(resaved.variants.iter().all(|e| e.variant.id != pack_id));

        // The dropped variant's images went with it
        let orphaned_images = VariantImage::find()
            .filter(crate::entities::variant_image::Column::VariantId.eq(pack_id))
            .count(&db)
            .await?;
        assert_eq!(orphaned_images, 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_replaces_category_and_collection_links() -> Result<()> {
        let db = setup_test_db().await?;
        let drinks = create_test_category(&db, "Drinks").await?;
        let snacks = create_test_category(&db, "Snacks").await?;
        let summer = create_test_collection(&db, "Summer").await?;

        let mut form = product_form("Lemonade", 2.0);
        form.category_ids = vec![drinks.id, snacks.id, drinks.id];
        form.collection_ids = vec![summer.id];
        let saved = save_test_product(&db, form).await?;
        assert_eq!(saved.category_ids, vec![drinks.id, snacks.id]);
        assert_eq!(saved.collection_ids, vec![summer.id]);

        let mut edit = ProductForm::from_detail(&saved);
        edit.category_ids = vec![snacks.id];
        edit.collection_ids = vec![];
        let resaved = save_test_product(&db, edit).await?;
        assert_eq!(resaved.category_ids, vec![snacks.id]);
        assert!(resaved.collection_ids.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_failed_save_rolls_back_everything() -> Result<()> {
        let db = setup_test_db().await?;
        let mut form = product_form("Lemonade", 2.0);
        form.variants = vec![variant("Bottle", 2.0, true)];
        // Unknown category makes the last step fail
        form.category_ids = vec![999];

        let result = save_test_product(&db, form).await;
        assert!(matches!(result, Err(Error::NotFound { entity: "category", .. })));

        assert_eq!(Product::find().count(&db).await?, 0);
        assert_eq!(ProductVariant::find().count(&db).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_stale_revision_is_rejected() -> Result<()> {
        let db = setup_test_db().await?;
        let saved = save_test_product(&db, product_form("Tea", 3.0)).await?;

        // Two editors load the same revision
        let mut first = ProductForm::from_detail(&saved);
        let mut second = ProductForm::from_detail(&saved);

        first.price = 3.5;
        save_test_product(&db, first).await?;

        second.price = 2.5;
        let result = save_test_product(&db, second).await;
        assert!(matches!(
            result,
            Err(Error::StaleRevision {
                expected: 1,
                actual: 2,
                ..
            })
        ));

        let stored = get_product(&db, saved.product.id).await?.unwrap();
        assert_eq!(stored.product.price, 3.5);
        Ok(())
    }

    #[tokio::test]
    async fn test_save_without_expected_revision_overwrites() -> Result<()> {
        let db = setup_test_db().await?;
        let saved = save_test_product(&db, product_form("Tea", 3.0)).await?;

        let mut edit = ProductForm::from_detail(&saved);
        edit.expected_revision = None;
        edit.price = 4.0;
        save_test_product(&db, edit.clone()).await?;
        edit.price = 5.0;
        let last = save_test_product(&db, edit).await?;

        assert_eq!(last.product.price, 5.0);
        assert_eq!(last.product.revision, 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_variant_id_is_rejected() -> Result<()> {
        let db = setup_test_db().await?;
        let saved = save_test_product(&db, product_form("Tea", 3.0)).await?;

        let mut edit = ProductForm::from_detail(&saved);
        let mut ghost = variant("Ghost", 1.0, false);
        ghost.id = Some(4242);
        edit.variants.push(ghost);

        let result = save_test_product(&db, edit).await;
        assert!(matches!(result, Err(Error::NotFound { entity: "variant", .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_product_cascades() -> Result<()> {
        let db = setup_test_db().await?;
        let drinks = create_test_category(&db, "Drinks").await?;
        let mut form = product_form("Cola", 1.5);
        let mut pack = variant("Pack", 1.5, true);
        pack.images = vec!["https://cdn/pack.jpg".to_string()];
        form.variants = vec![pack];
        form.category_ids = vec![drinks.id];
        let saved = save_test_product(&db, form).await?;

        delete_product(&db, saved.product.id).await?;

        assert!(get_product(&db, saved.product.id).await?.is_none());
        assert_eq!(ProductVariant::find().count(&db).await?, 0);
        assert_eq!(VariantImage::find().count(&db).await?, 0);
        assert_eq!(ProductCategory::find().count(&db).await?, 0);

        let missing = delete_product(&db, saved.product.id).await;
        assert!(matches!(missing, Err(Error::NotFound { entity: "product", .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_bulk_deactivate_touches_only_selection() -> Result<()> {
        let db = setup_test_db().await?;
        let a = save_test_product(&db, product_form("A", 1.0)).await?.product;
        let b = save_test_product(&db, product_form("B", 1.0)).await?.product;
        let c = save_test_product(&db, product_form("C", 1.0)).await?.product;

        let affected = apply_bulk_action(&db, &[a.id, c.id, a.id], BulkAction::Deactivate).await?;
        assert_eq!(affected, 2);

        let products = list_products(&db).await?;
        let inactive: Vec<i64> = products
            .iter()
            .filter(|p| !p.is_active)
            .map(|p| p.id)
            .collect();
        assert_eq!(inactive, vec![a.id, c.id]);
        assert!(products.iter().find(|p| p.id == b.id).unwrap().is_active);
        assert_eq!(products.iter().find(|p| p.id == a.id).unwrap().revision, 2);

        Ok(())
    }

    #[tokio::test]
    async fn test_bulk_feature_and_delete() -> Result<()> {
        let db = setup_test_db().await?;
        let a = save_test_product(&db, product_form("A", 1.0)).await?.product;
        let b = save_test_product(&db, product_form("B", 1.0)).await?.product;

        assert_eq!(apply_bulk_action(&db, &[], BulkAction::Feature).await?, 0);
        assert_eq!(apply_bulk_action(&db, &[b.id], BulkAction::Feature).await?, 1);
        let featured: Vec<String> = list_products(&db)
            .await?
            .into_iter()
            .filter(|p| p.is_featured)
            .map(|p| p.name)
            .collect();
        assert_eq!(featured, vec!["B".to_string()]);

        assert_eq!(apply_bulk_action(&db, &[a.id], BulkAction::Delete).await?, 1);
        let remaining: Vec<i64> = list_products(&db).await?.iter().map(|p| p.id).collect();
        assert_eq!(remaining, vec![b.id]);

        Ok(())
    }

    #[tokio::test]
    async fn test_low_stock_products() -> Result<()> {
        let db = setup_test_db().await?;
        for (name, stock) in [("Empty", 0), ("Few", 3), ("Plenty", 50)] {
            let mut form = product_form(name, 1.0);
            form.stock = stock;
            save_test_product(&db, form).await?;
        }

        let low: Vec<String> = low_stock_products(&db, 10)
            .await?
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(low, vec!["Empty".to_string(), "Few".to_string()]);

        let empty = get_product_by_slug(&db, "empty").await?.unwrap();
        assert_eq!(empty.inventory_status, InventoryStatus::OutOfStock);
        assert!(!empty.in_stock);
        Ok(())
    }

    #[tokio::test]
    async fn test_variant_inventories_follow_product_setting() -> Result<()> {
        let db = setup_test_db().await?;
        let mut form = product_form("Soda", 2.0);
        form.variants = [("Can", 0), ("Bottle", 3), ("Crate", 50)]
            .into_iter()
            .map(|(name, stock)| VariantForm {
                stock,
                ..VariantForm::new(name, 2.0)
            })
            .collect();
        let saved = save_test_product(&db, form).await?;

        let statuses: Vec<(InventoryStatus, bool)> = saved
            .variant_inventories(10)
            .into_iter()
            .map(|(_, inventory)| (inventory.status, inventory.in_stock))
            .collect();
        assert_eq!(
            statuses,
            vec![
                (InventoryStatus::OutOfStock, false),
                (InventoryStatus::LowStock, true),
                (InventoryStatus::InStock, true),
            ]
        );

        let mut backorder = ProductForm::from_detail(&saved);
        backorder.continue_selling_when_out_of_stock = true;
        let saved = save_test_product(&db, backorder).await?;
        let (can_id, can) = saved.variant_inventories(10)[0];
        assert_eq!(can_id, saved.variants[0].variant.id);
        assert_eq!(can.status, InventoryStatus::OutOfStock);
        assert!(can.in_stock);
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_brand_is_rejected() -> Result<()> {
        let db = setup_test_db().await?;
        let mut form = product_form("Tea", 3.0);
        form.brand_id = Some(77);

        let result = save_test_product(&db, form).await;
        assert!(matches!(result, Err(Error::NotFound { entity: "brand", .. })));
        Ok(())
    }
}

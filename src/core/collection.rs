//! Collection business logic - manual and smart product groupings.

use crate::{
    core::slug::{base_slug, unique_slug},
    entities::{
        Collection, CollectionType, Product, ProductCollection, collection, product,
        product_collection, values::CollectionRules,
    },
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, instrument};

/// Collection fields as submitted from the editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionForm {
    /// `None` creates a new collection
    pub id: Option<i64>,
    /// Display name, required
    pub name: String,
    /// Explicit slug; derived from `name` when absent
    pub slug: Option<String>,
    /// Shown on the collection page
    pub description: Option<String>,
    /// Banner image URL
    pub image_url: Option<String>,
    /// Manual or smart
    pub collection_type: CollectionType,
    /// Required for smart collections, ignored for manual ones
    pub rules: CollectionRules,
    /// Hidden from the storefront when false
    pub is_active: bool,
    /// `None` appends after the last collection
    pub sort_order: Option<i32>,
}

impl CollectionForm {
    /// An active manual collection.
    pub fn manual(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            slug: None,
            description: None,
            image_url: None,
            collection_type: CollectionType::Manual,
            rules: CollectionRules::default(),
            is_active: true,
            sort_order: None,
        }
    }

    /// An active smart collection with the given rules.
    pub fn smart(name: impl Into<String>, rules: CollectionRules) -> Self {
        Self {
            collection_type: CollectionType::Smart,
            rules,
            ..Self::manual(name)
        }
    }
}

fn validate_collection(form: &CollectionForm) -> Result<()> {
    if form.name.trim().is_empty() {
        return Err(Error::validation("Collection name cannot be empty"));
    }
    if form.collection_type == CollectionType::Smart && form.rules.0.is_empty() {
        return Err(Error::validation("A smart collection needs at least one rule"));
    }
    if let Some(rule) = form
        .rules
        .0
        .iter()
        .find(|rule| rule.field.trim().is_empty() || rule.operator.trim().is_empty())
    {
        return Err(Error::validation(format!(
            "Incomplete collection rule for value '{}'",
            rule.value
        )));
    }
    Ok(())
}

async fn find_collection<C>(db: &C, id: i64) -> Result<collection::Model>
where
    C: ConnectionTrait,
{
    Collection::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("collection", id))
}

/// Creates or updates a collection.
///
/// Turning a manual collection into a smart one drops its hand-picked members.
///
/// # Errors
/// Returns `Validation` for a blank name or incomplete smart rules,
/// `NotFound` for an unknown collection, or a database error.
#[instrument(skip(db, form), fields(collection = %form.name.trim()))]
pub async fn save_collection(
    db: &DatabaseConnection,
    form: CollectionForm,
) -> Result<collection::Model> {
    validate_collection(&form)?;
    let base = base_slug(form.slug.as_deref(), &form.name)?;

    let txn = db.begin().await?;
    let slug = unique_slug::<Collection, _>(&txn, &base, form.id).await?;
    let now = Utc::now();

    let mut active: collection::ActiveModel = match form.id {
        Some(id) => {
            let existing = find_collection(&txn, id).await?;
            if existing.collection_type == CollectionType::Manual
                && form.collection_type == CollectionType::Smart
            {
                let removed = ProductCollection::delete_many()
                    .filter(product_collection::Column::CollectionId.eq(id))
                    .exec(&txn)
                    .await?;
                debug!(
                    "Collection {id} became smart, removed {} manual members",
                    removed.rows_affected
                );
            }
            existing.into()
        }
        None => {
            let last = Collection::find()
                .order_by_desc(collection::Column::SortOrder)
                .one(&txn)
                .await?;
            collection::ActiveModel {
                sort_order: Set(last.map_or(0, |c| c.sort_order + 1)),
                created_at: Set(now),
                ..Default::default()
            }
        }
    };

    active.name = Set(form.name.trim().to_string());
    active.slug = Set(slug);
    active.description = Set(form.description);
    active.image_url = Set(form.image_url);
    active.collection_type = Set(form.collection_type);
    active.rules = Set(match form.collection_type {
        CollectionType::Smart => form.rules,
        CollectionType::Manual => CollectionRules::default(),
    });
    active.is_active = Set(form.is_active);
    if let Some(sort_order) = form.sort_order {
        active.sort_order = Set(sort_order);
    }
    active.updated_at = Set(now);

    let saved = if form.id.is_some() {
        active.update(&txn).await?
    } else {
        active.insert(&txn).await?
    };

    txn.commit().await?;
    info!("Saved collection {} '{}'", saved.id, saved.slug);
    Ok(saved)
}

/// All collections in display order.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn list_collections(db: &DatabaseConnection) -> Result<Vec<collection::Model>> {
    Collection::find()
        .order_by_asc(collection::Column::SortOrder)
        .order_by_asc(collection::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Deletes a collection and its membership rows.
///
/// # Errors
/// Returns `NotFound` if the collection does not exist.
#[instrument(skip(db))]
pub async fn delete_collection(db: &DatabaseConnection, collection_id: i64) -> Result<()> {
    let txn = db.begin().await?;
    let collection = find_collection(&txn, collection_id).await?;

    ProductCollection::delete_many()
        .filter(product_collection::Column::CollectionId.eq(collection_id))
        .exec(&txn)
        .await?;
    collection.delete(&txn).await?;

    txn.commit().await?;
    info!("Deleted collection {collection_id}");
    Ok(())
}

fn dedupe(ids: &[i64]) -> Vec<i64> {
    let mut seen = HashSet::new();
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

/// Replaces the members of a manual collection, in the given order.
///
/// # Errors
/// Returns `Validation` for smart collections and `NotFound` for unknown
/// products.
#[instrument(skip(db, product_ids), fields(count = product_ids.len()))]
pub async fn set_collection_products(
    db: &DatabaseConnection,
    collection_id: i64,
    product_ids: &[i64],
) -> Result<()> {
    let ids = dedupe(product_ids);

    let txn = db.begin().await?;
    let collection = find_collection(&txn, collection_id).await?;
    if collection.collection_type == CollectionType::Smart {
        return Err(Error::validation(format!(
            "Collection '{}' is rule based; its products cannot be set by hand",
            collection.name
        )));
    }

    if !ids.is_empty() {
        let found: HashSet<i64> = Product::find()
            .filter(product::Column::Id.is_in(ids.iter().copied()))
            .all(&txn)
            .await?
            .into_iter()
            .map(|product| product.id)
            .collect();
        if let Some(missing) = ids.iter().find(|id| !found.contains(id)) {
            return Err(Error::not_found("product", *missing));
        }
    }

    ProductCollection::delete_many()
        .filter(product_collection::Column::CollectionId.eq(collection_id))
        .exec(&txn)
        .await?;

    if !ids.is_empty() {
        let rows = ids
            .into_iter()
            .enumerate()
            .map(|(position, product_id)| {
                Ok(product_collection::ActiveModel {
                    product_id: Set(product_id),
                    collection_id: Set(collection_id),
                    position: Set(i32::try_from(position)?),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        ProductCollection::insert_many(rows)
            .exec_without_returning(&txn)
            .await?;
    }

    txn.commit().await?;
    Ok(())
}

/// Members of a manual collection, by position.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn collection_products(
    db: &DatabaseConnection,
    collection_id: i64,
) -> Result<Vec<product::Model>> {
    let links = ProductCollection::find()
        .filter(product_collection::Column::CollectionId.eq(collection_id))
        .order_by_asc(product_collection::Column::Position)
        .all(db)
        .await?;
    if links.is_empty() {
        return Ok(Vec::new());
    }
    let mut products: HashMap<i64, product::Model> = Product::find()
        .filter(product::Column::Id.is_in(links.iter().map(|link| link.product_id)))
        .all(db)
        .await?
        .into_iter()
        .map(|product| (product.id, product))
        .collect();

    Ok(links
        .iter()
        .filter_map(|link| products.remove(&link.product_id))
        .collect())
}

/// Number of manual members per collection id. Collections without members
/// are absent.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn product_counts(db: &DatabaseConnection) -> Result<HashMap<i64, u64>> {
    let mut counts = HashMap::new();
    for link in ProductCollection::find().all(db).await? {
        *counts.entry(link.collection_id).or_insert(0) += 1;
    }
    Ok(counts)
}

/// Collection ids a product belongs to, ascending.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn product_collection_ids<C>(db: &C, product_id: i64) -> Result<Vec<i64>>
where
    C: ConnectionTrait,
{
    Ok(ProductCollection::find()
        .filter(product_collection::Column::ProductId.eq(product_id))
        .order_by_asc(product_collection::Column::CollectionId)
        .all(db)
        .await?
        .into_iter()
        .map(|link| link.collection_id)
        .collect())
}

/// Replaces the collections a product belongs to.
///
/// Memberships the product already had keep their position; new ones are
/// appended at the end of the collection.
///
/// # Errors
/// Returns `NotFound` for unknown collections and `Validation` for smart ones.
pub async fn replace_product_collections<C>(
    db: &C,
    product_id: i64,
    collection_ids: &[i64],
) -> Result<()>
where
    C: ConnectionTrait,
{
    let ids = dedupe(collection_ids);

    if !ids.is_empty() {
        let collections: HashMap<i64, collection::Model> = Collection::find()
            .filter(collection::Column::Id.is_in(ids.iter().copied()))
            .all(db)
            .await?
            .into_iter()
            .map(|collection| (collection.id, collection))
            .collect();
        for id in &ids {
            let collection = collections
                .get(id)
                .ok_or_else(|| Error::not_found("collection", *id))?;
            if collection.collection_type == CollectionType::Smart {
                return Err(Error::validation(format!(
                    "Collection '{}' is rule based and cannot be assigned by hand",
                    collection.name
                )));
            }
        }
    }

    let previous: HashMap<i64, i32> = ProductCollection::find()
        .filter(product_collection::Column::ProductId.eq(product_id))
        .all(db)
        .await?
        .into_iter()
        .map(|link| (link.collection_id, link.position))
        .collect();

    ProductCollection::delete_many()
        .filter(product_collection::Column::ProductId.eq(product_id))
        .exec(db)
        .await?;

    let mut rows = Vec::with_capacity(ids.len());
    for collection_id in ids {
        let position = match previous.get(&collection_id) {
            Some(position) => *position,
            None => {
                let last = ProductCollection::find()
                    .filter(product_collection::Column::CollectionId.eq(collection_id))
                    .order_by_desc(product_collection::Column::Position)
                    .one(db)
                    .await?;
                last.map_or(0, |link| link.position + 1)
            }
        };
        rows.push(product_collection::ActiveModel {
            product_id: Set(product_id),
            collection_id: Set(collection_id),
            position: Set(position),
        });
    }

    if !rows.is_empty() {
        ProductCollection::insert_many(rows)
            .exec_without_returning(db)
            .await?;
    }
    Ok(())
}

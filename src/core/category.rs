//! Category business logic - the two-level category tree.
//!
//! Categories are either roots or direct children of a root. Ordering among
//! siblings is kept in `sort_order` and changed one step at a time with
//! [`move_category`].

use crate::{
    config::catalog::CategorySeed,
    core::slug::{base_slug, slugify, unique_slug},
    entities::{Category, ProductCategory, category, product_category},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{
    Condition, PaginatorTrait, QueryOrder, Set, TransactionTrait, prelude::*,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info, instrument, warn};

/// Category fields as submitted from the editor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryForm {
    /// `None` creates a new category
    pub id: Option<i64>,
    /// Display name, required
    pub name: String,
    /// Explicit slug; derived from `name` when absent
    pub slug: Option<String>,
    /// Shown on the category page
    pub description: Option<String>,
    /// Root category to nest under; must not be a subcategory
    pub parent_id: Option<i64>,
    /// Banner image URL
    pub image_url: Option<String>,
    /// Hidden from the storefront when false
    pub is_active: bool,
    /// Highlighted on the home page
    pub is_featured: bool,
}

impl CategoryForm {
    /// An active root category.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_active: true,
            ..Self::default()
        }
    }

    /// An active child of `parent_id`.
    pub fn child_of(name: impl Into<String>, parent_id: i64) -> Self {
        Self {
            parent_id: Some(parent_id),
            ..Self::new(name)
        }
    }
}

/// Which level of the tree a filter keeps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ParentFilter {
    /// Every category
    #[default]
    Any,
    /// Only top-level categories
    Root,
    /// Only children of the given root
    ChildOf(i64),
}

/// In-memory filter over a loaded category list.
#[derive(Debug, Clone, Default)]
pub struct CategoryFilter {
    /// Case-insensitive substring of name or description
    pub search: Option<String>,
    /// Keep only active or only inactive categories
    pub is_active: Option<bool>,
    /// Keep only featured or only unfeatured categories
    pub is_featured: Option<bool>,
    /// Tree level to keep
    pub parent: ParentFilter,
}

/// A root category with its children, both in display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryNode {
    /// The root
    pub category: category::Model,
    /// Direct children
    pub children: Vec<category::Model>,
}

/// Direction to move a category among its siblings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Towards the first position
    Up,
    /// Towards the last position
    Down,
}

/// Checks a category form without touching the database.
///
/// # Errors
/// Returns `Validation` for a blank name and `SelfParent` when the category
/// names itself as parent.
pub fn validate_category(form: &CategoryForm) -> Result<()> {
    if form.name.trim().is_empty() {
        return Err(Error::validation("Category name cannot be empty"));
    }
    if let (Some(id), Some(parent_id)) = (form.id, form.parent_id) {
        if id == parent_id {
            return Err(Error::SelfParent { id });
        }
    }
    Ok(())
}

fn siblings_condition(parent_id: Option<i64>) -> Condition {
    match parent_id {
        Some(parent_id) => Condition::all().add(category::Column::ParentId.eq(parent_id)),
        None => Condition::all().add(category::Column::ParentId.is_null()),
    }
}

async fn siblings<C>(db: &C, parent_id: Option<i64>) -> Result<Vec<category::Model>>
where
    C: ConnectionTrait,
{
    Category::find()
        .filter(siblings_condition(parent_id))
        .order_by_asc(category::Column::SortOrder)
        .order_by_asc(category::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

async fn next_sort_order<C>(db: &C, parent_id: Option<i64>) -> Result<i32>
where
    C: ConnectionTrait,
{
    let last = Category::find()
        .filter(siblings_condition(parent_id))
        .order_by_desc(category::Column::SortOrder)
        .one(db)
        .await?;
    Ok(last.map_or(0, |category| category.sort_order + 1))
}

/// Creates or updates a category.
///
/// # Errors
/// Returns an error if validation fails, the parent does not exist or is
/// itself a subcategory, a category with children is being nested, or a
/// statement fails.
#[instrument(skip(db, form), fields(category = %form.name.trim()))]
pub async fn save_category(db: &DatabaseConnection, form: CategoryForm) -> Result<category::Model> {
    validate_category(&form)?;
    let base = base_slug(form.slug.as_deref(), &form.name)?;

    let txn = db.begin().await?;

    if let Some(parent_id) = form.parent_id {
        let parent = Category::find_by_id(parent_id)
            .one(&txn)
            .await?
            .ok_or_else(|| Error::not_found("category", parent_id))?;
        if parent.parent_id.is_some() {
            return Err(Error::CategoryTooDeep { parent_id });
        }
        if let Some(id) = form.id {
            let children = Category::find()
                .filter(category::Column::ParentId.eq(id))
                .count(&txn)
                .await?;
            if children > 0 {
                return Err(Error::CategoryHasChildren { id });
            }
        }
    }

    let slug = unique_slug::<Category, _>(&txn, &base, form.id).await?;
    let now = Utc::now();

    let mut active: category::ActiveModel = match form.id {
        Some(id) => {
            let existing = Category::find_by_id(id)
                .one(&txn)
                .await?
                .ok_or_else(|| Error::not_found("category", id))?;
            let moved = existing.parent_id != form.parent_id;
            let mut active: category::ActiveModel = existing.into();
            if moved {
                active.sort_order = Set(next_sort_order(&txn, form.parent_id).await?);
            }
            active
        }
        None => category::ActiveModel {
            sort_order: Set(next_sort_order(&txn, form.parent_id).await?),
            created_at: Set(now),
            ..Default::default()
        },
    };

    active.name = Set(form.name.trim().to_string());
    active.slug = Set(slug);
    active.description = Set(form
        .description
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty()));
    active.parent_id = Set(form.parent_id);
    active.image_url = Set(form.image_url);
    active.is_active = Set(form.is_active);
    active.is_featured = Set(form.is_featured);
    active.updated_at = Set(now);

    let saved = if form.id.is_some() {
        active.update(&txn).await?
    } else {
        active.insert(&txn).await?
    };

    txn.commit().await?;
    debug!("Saved category {} '{}'", saved.id, saved.slug);
    Ok(saved)
}

/// All categories in display order.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn list_categories(db: &DatabaseConnection) -> Result<Vec<category::Model>> {
    Category::find()
        .order_by_asc(category::Column::SortOrder)
        .order_by_asc(category::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Looks up a category by id.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn get_category(db: &DatabaseConnection, id: i64) -> Result<Option<category::Model>> {
    Category::find_by_id(id).one(db).await.map_err(Into::into)
}

/// Applies `filter` to an already loaded list, keeping input order.
#[must_use]
pub fn filter_categories<'a>(
    categories: &'a [category::Model],
    filter: &CategoryFilter,
) -> Vec<&'a category::Model> {
    let needle = filter
        .search
        .as_deref()
        .map(|text| text.trim().to_lowercase())
        .filter(|text| !text.is_empty());

    categories
        .iter()
        .filter(|category| {
            needle.as_ref().is_none_or(|needle| {
                category.name.to_lowercase().contains(needle.as_str())
                    || category
                        .description
                        .as_deref()
                        .is_some_and(|text| text.to_lowercase().contains(needle.as_str()))
            })
        })
        .filter(|category| filter.is_active.is_none_or(|flag| category.is_active == flag))
        .filter(|category| filter.is_featured.is_none_or(|flag| category.is_featured == flag))
        .filter(|category| match filter.parent {
            ParentFilter::Any => true,
            ParentFilter::Root => category.parent_id.is_none(),
            ParentFilter::ChildOf(parent_id) => category.parent_id == Some(parent_id),
        })
        .collect()
}

fn display_order(a: &category::Model, b: &category::Model) -> std::cmp::Ordering {
    a.sort_order
        .cmp(&b.sort_order)
        .then_with(|| a.name.cmp(&b.name))
}

/// Groups a flat list into roots and their children.
///
/// Children whose parent is not in the list are shown as roots.
#[must_use]
pub fn build_category_tree(categories: &[category::Model]) -> Vec<CategoryNode> {
    let ids: HashSet<i64> = categories.iter().map(|category| category.id).collect();
    let is_root = |category: &category::Model| {
        category
            .parent_id
            .is_none_or(|parent_id| !ids.contains(&parent_id))
    };

    let mut roots: Vec<&category::Model> = categories.iter().filter(|c| is_root(c)).collect();
    roots.sort_by(|a, b| display_order(a, b));

    roots
        .into_iter()
        .map(|root| {
            let mut children: Vec<category::Model> = categories
                .iter()
                .filter(|c| c.parent_id == Some(root.id))
                .cloned()
                .collect();
            children.sort_by(display_order);
            CategoryNode {
                category: root.clone(),
                children,
            }
        })
        .collect()
}

/// Moves a category one step among its siblings.
///
/// Returns `false` when it is already first (up) or last (down).
///
/// # Errors
/// Returns `NotFound` for an unknown category, or a database error.
#[instrument(skip(db))]
pub async fn move_category(db: &DatabaseConnection, id: i64, direction: Direction) -> Result<bool> {
    let txn = db.begin().await?;

    let category = Category::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or_else(|| Error::not_found("category", id))?;
    let mut ordered = siblings(&txn, category.parent_id).await?;

    let Some(index) = ordered.iter().position(|sibling| sibling.id == id) else {
        return Err(Error::not_found("category", id));
    };
    let neighbour = match direction {
        Direction::Up => index.checked_sub(1),
        Direction::Down => Some(index + 1).filter(|next| *next < ordered.len()),
    };
    let Some(neighbour) = neighbour else {
        return Ok(false);
    };

    let current_order = ordered[index].sort_order;
    let neighbour_order = ordered[neighbour].sort_order;

    if current_order == neighbour_order {
        // Duplicate positions: renumber the whole sibling list
        ordered.swap(index, neighbour);
        for (position, sibling) in ordered.into_iter().enumerate() {
            let position = i32::try_from(position)?;
            if sibling.sort_order != position {
                let mut active: category::ActiveModel = sibling.into();
                active.sort_order = Set(position);
                active.update(&txn).await?;
            }
        }
    } else {
        let mut current: category::ActiveModel = ordered[index].clone().into();
        current.sort_order = Set(neighbour_order);
        current.update(&txn).await?;
        let mut other: category::ActiveModel = ordered[neighbour].clone().into();
        other.sort_order = Set(current_order);
        other.update(&txn).await?;
    }

    txn.commit().await?;
    Ok(true)
}

/// Deletes a category and its product links.
///
/// # Errors
/// Returns `CategoryHasChildren` while subcategories exist.
#[instrument(skip(db))]
pub async fn delete_category(db: &DatabaseConnection, id: i64) -> Result<()> {
    let txn = db.begin().await?;

    let category = Category::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or_else(|| Error::not_found("category", id))?;

    let children = Category::find()
        .filter(category::Column::ParentId.eq(id))
        .count(&txn)
        .await?;
    if children > 0 {
        return Err(Error::CategoryHasChildren { id });
    }

    ProductCategory::delete_many()
        .filter(product_category::Column::CategoryId.eq(id))
        .exec(&txn)
        .await?;
    category.delete(&txn).await?;

    txn.commit().await?;
    info!("Deleted category {id}");
    Ok(())
}

/// Category ids linked to a product, ascending.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn product_category_ids<C>(db: &C, product_id: i64) -> Result<Vec<i64>>
where
    C: ConnectionTrait,
{
    Ok(ProductCategory::find()
        .filter(product_category::Column::ProductId.eq(product_id))
        .order_by_asc(product_category::Column::CategoryId)
        .all(db)
        .await?
        .into_iter()
        .map(|link| link.category_id)
        .collect())
}

/// Replaces all category links of a product. Duplicate ids are ignored.
///
/// # Errors
/// Returns `NotFound` for the first id without a category, or a database
/// error.
pub async fn replace_product_categories<C>(
    db: &C,
    product_id: i64,
    category_ids: &[i64],
) -> Result<()>
where
    C: ConnectionTrait,
{
    let mut seen = HashSet::new();
    let ids: Vec<i64> = category_ids
        .iter()
        .copied()
        .filter(|id| seen.insert(*id))
        .collect();

    if !ids.is_empty() {
        let found: HashSet<i64> = Category::find()
            .filter(category::Column::Id.is_in(ids.iter().copied()))
            .all(db)
            .await?
            .into_iter()
            .map(|category| category.id)
            .collect();
        if let Some(missing) = ids.iter().find(|id| !found.contains(id)) {
            return Err(Error::not_found("category", *missing));
        }
    }

    ProductCategory::delete_many()
        .filter(product_category::Column::ProductId.eq(product_id))
        .exec(db)
        .await?;

    if !ids.is_empty() {
        let rows = ids.into_iter().map(|category_id| product_category::ActiveModel {
            product_id: Set(product_id),
            category_id: Set(category_id),
        });
        ProductCategory::insert_many(rows)
            .exec_without_returning(db)
            .await?;
    }
    Ok(())
}

/// Creates the configured categories that do not exist yet, matched by slug.
///
/// Returns the number of categories created.
///
/// # Errors
/// Returns an error if a lookup or insert fails.
pub async fn seed_categories(db: &DatabaseConnection, seeds: &[CategorySeed]) -> Result<usize> {
    let mut created = 0;

    for seed in seeds {
        let root = match find_by_slug(db, &slugify(&seed.name)).await? {
            Some(existing) => {
                debug!("Category '{}' already exists. Skipping.", seed.name);
                existing
            }
            None => {
                created += 1;
                save_category(
                    db,
                    CategoryForm {
                        description: seed.description.clone(),
                        ..CategoryForm::new(seed.name.clone())
                    },
                )
                .await?
            }
        };

        if root.parent_id.is_some() {
            warn!(
                "Seed category '{}' exists as a subcategory; not adding children",
                seed.name
            );
            continue;
        }

        for child in &seed.children {
            if let Some(existing) = find_by_slug(db, &slugify(child)).await? {
                if existing.parent_id == Some(root.id) {
                    debug!("Category '{child}' already exists. Skipping.");
                } else {
                    warn!(
                        "Seed category '{child}' already exists outside '{}'; not moving it",
                        seed.name
                    );
                }
                continue;
            }
            save_category(db, CategoryForm::child_of(child.clone(), root.id)).await?;
            created += 1;
        }
    }

    if created > 0 {
        info!("Seeded {created} categories");
    }
    Ok(created)
}

async fn find_by_slug(db: &DatabaseConnection, slug: &str) -> Result<Option<category::Model>> {
    Category::find()
        .filter(category::Column::Slug.eq(slug))
        .one(db)
        .await
        .map_err(Into::into)
}

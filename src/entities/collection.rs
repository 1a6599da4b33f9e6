//! Collection entity - a named merchandising group of products.
//!
//! Manual collections list their members explicitly in `product_collections`.
//! Smart collections carry a rule set instead; membership is resolved by the
//! storefront, never here.

use super::values::CollectionRules;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// How membership of a collection is decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum CollectionType {
    /// Curated by hand
    #[sea_orm(string_value = "manual")]
    Manual,
    /// Rule based
    #[sea_orm(string_value = "smart")]
    Smart,
}

/// Collection database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "collections")]
pub struct Model {
    /// Unique identifier for the collection
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name
    pub name: String,
    /// URL-safe identifier, unique across collections
    #[sea_orm(unique)]
    pub slug: String,
    /// Shown on the collection page
    pub description: Option<String>,
    /// Banner image URL
    pub image_url: Option<String>,
    /// Manual or smart
    pub collection_type: CollectionType,
    /// Only meaningful for smart collections
    pub rules: CollectionRules,
    /// Hidden from the storefront when false
    pub is_active: bool,
    /// Position among collections, ascending
    pub sort_order: i32,
    /// When the collection was created
    pub created_at: DateTimeUtc,
    /// When the collection was last modified
    pub updated_at: DateTimeUtc,
}

/// Products are reached through `product_collections`
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        super::product_collection::Relation::Product.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::product_collection::Relation::Collection.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}

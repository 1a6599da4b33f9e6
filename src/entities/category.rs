//! Category entity - a two-level tree of root categories and their direct children.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Category database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    /// Unique identifier for the category
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name
    pub name: String,
    /// URL-safe identifier, unique across categories
    #[sea_orm(unique)]
    pub slug: String,
    /// Shown on the category page
    pub description: Option<String>,
    /// `None` for root categories
    pub parent_id: Option<i64>,
    /// Banner image URL
    pub image_url: Option<String>,
    /// Position among siblings, ascending
    pub sort_order: i32,
    /// Hidden from the storefront when false
    pub is_active: bool,
    /// Highlighted on the home page
    pub is_featured: bool,
    /// When the category was created
    pub created_at: DateTimeUtc,
    /// When the category was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Category and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// A subcategory belongs to one root category
    #[sea_orm(belongs_to = "Entity", from = "Column::ParentId", to = "Column::Id")]
    Parent,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        super::product_category::Relation::Product.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::product_category::Relation::Category.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}

//! Product entity - the sellable catalogue item.
//!
//! A product owns zero or more variants and belongs to any number of categories
//! and collections through join tables. Derived values (discount, margin,
//! inventory status, SEO score) are computed on save and stored alongside the
//! inputs so list screens can read them without recomputing.

use super::values::{ImageList, Specifications};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Stock state shown in listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum InventoryStatus {
    /// Above the low stock threshold
    #[sea_orm(string_value = "in_stock")]
    InStock,
    /// At or below the threshold but not empty
    #[sea_orm(string_value = "low_stock")]
    LowStock,
    /// No units left
    #[sea_orm(string_value = "out_of_stock")]
    OutOfStock,
}

/// Product database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    /// Unique identifier for the product
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name
    pub name: String,
    /// URL-safe identifier, unique across products
    #[sea_orm(unique)]
    pub slug: String,
    /// Brand the product is sold under
    pub brand_id: Option<i64>,
    /// Stock keeping unit
    pub sku: Option<String>,
    /// One-line summary for listings
    pub short_description: Option<String>,
    /// Full description
    pub description: Option<String>,
    /// Selling price
    pub price: f64,
    /// Former or list price shown struck through when higher than `price`
    pub compare_at_price: Option<f64>,
    /// Purchase cost, used for the margin
    pub cost_price: Option<f64>,
    /// Savings against `compare_at_price`, `None` without a discount
    pub discount_amount: Option<f64>,
    /// Savings in whole percent of `compare_at_price`
    pub discount_percentage: Option<f64>,
    /// Margin in whole percent, 0 when cost is unknown
    pub profit_margin: f64,
    /// Units on hand
    pub stock: i32,
    /// Keeps the product purchasable at zero stock
    pub continue_selling_when_out_of_stock: bool,
    /// Whether the storefront may sell the product right now
    pub in_stock: bool,
    /// Stock state under the store threshold at the last save
    pub inventory_status: InventoryStatus,
    /// Hidden from the storefront when false
    pub is_active: bool,
    /// Highlighted on the home page
    pub is_featured: bool,
    /// Shown in the showcase carousel
    pub is_showcase: bool,
    /// Label and value rows for the specs table
    pub specifications: Specifications,
    /// Gallery image URLs, first one is the cover
    pub images: ImageList,
    /// `<title>` override for search engines
    pub meta_title: Option<String>,
    /// Search result snippet
    pub meta_description: Option<String>,
    /// Comma-separated keywords
    pub meta_keywords: Option<String>,
    /// Completeness score 0-100
    pub seo_score: i32,
    /// Incremented on every save, used for stale-write detection
    pub revision: i32,
    /// When the product was created
    pub created_at: DateTimeUtc,
    /// When the product was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Product and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each product optionally belongs to one brand
    #[sea_orm(
        belongs_to = "super::brand::Entity",
        from = "Column::BrandId",
        to = "super::brand::Column::Id"
    )]
    Brand,
    /// One product has many variants
    #[sea_orm(has_many = "super::product_variant::Entity")]
    Variants,
}

impl Related<super::brand::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Brand.def()
    }
}

impl Related<super::product_variant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Variants.def()
    }
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        super::product_category::Relation::Category.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::product_category::Relation::Product.def().rev())
    }
}

impl Related<super::collection::Entity> for Entity {
    fn to() -> RelationDef {
        super::product_collection::Relation::Collection.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::product_collection::Relation::Product.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}

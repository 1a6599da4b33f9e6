//! Product variant entity - a sellable sub-unit of a product (pack, carton, size).

use super::values::VariantAttributes;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Variant database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "product_variants")]
pub struct Model {
    /// Unique identifier for the variant
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning product
    pub product_id: i64,
    /// Display name, e.g. `Large`
    pub name: String,
    /// Stock keeping unit
    pub sku: Option<String>,
    /// Selling price
    pub price: f64,
    /// Former price
    pub compare_at_price: Option<f64>,
    /// Units on hand
    pub stock: i32,
    /// Option values such as size or colour
    pub attributes: VariantAttributes,
    /// At most one variant per product carries this flag
    pub is_default: bool,
    /// Hidden from the storefront when false
    pub is_active: bool,
    /// Position among the product's variants
    pub sort_order: i32,
    /// When the variant was created
    pub created_at: DateTimeUtc,
    /// When the variant was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between ProductVariant and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each variant belongs to one product
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
    /// One variant has many images
    #[sea_orm(has_many = "super::variant_image::Entity")]
    Images,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl Related<super::variant_image::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Images.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

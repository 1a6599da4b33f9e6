//! Variant image entity - one image URL attached to a variant.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Variant image database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "variant_images")]
pub struct Model {
    /// Unique identifier for the image
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning variant
    pub variant_id: i64,
    /// Image URL
    pub url: String,
    /// Alternative text for screen readers
    pub alt_text: Option<String>,
    /// Position in the variant's gallery
    pub sort_order: i32,
    /// The image shown first for the variant
    pub is_primary: bool,
}

/// Defines relationships between VariantImage and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each image belongs to one variant
    #[sea_orm(
        belongs_to = "super::product_variant::Entity",
        from = "Column::VariantId",
        to = "super::product_variant::Column::Id"
    )]
    Variant,
}

impl Related<super::product_variant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Variant.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

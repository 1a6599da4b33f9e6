//! Join table between products and manual collections.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Link between a product and a collection
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "product_collections")]
pub struct Model {
    /// Linked product
    #[sea_orm(primary_key, auto_increment = false)]
    pub product_id: i64,
    /// Linked collection
    #[sea_orm(primary_key, auto_increment = false)]
    pub collection_id: i64,
    /// Position inside the collection
    pub position: i32,
}

/// Defines relationships between the link and its two ends
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each link belongs to one product
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
    /// Each link belongs to one collection
    #[sea_orm(
        belongs_to = "super::collection::Entity",
        from = "Column::CollectionId",
        to = "super::collection::Column::Id"
    )]
    Collection,
}

impl ActiveModelBehavior for ActiveModel {}

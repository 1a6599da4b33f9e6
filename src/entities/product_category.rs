//! Join table between products and categories.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Link between a product and a category
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "product_categories")]
pub struct Model {
    /// Linked product
    #[sea_orm(primary_key, auto_increment = false)]
    pub product_id: i64,
    /// Linked category
    #[sea_orm(primary_key, auto_increment = false)]
    pub category_id: i64,
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
    /// Each link belongs to one category
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id"
    )]
    Category,
}

impl ActiveModelBehavior for ActiveModel {}

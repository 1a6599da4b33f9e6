//! Order item entity - one line of an order.
//!
//! Product and variant ids are kept as plain references without a foreign key
//! so that deleting a product does not rewrite order history; the name and
//! price are copied at checkout time.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Order item database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "order_items")]
pub struct Model {
    /// Unique identifier for the order item
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning order
    pub order_id: i64,
    /// Product the line was sold from, if known
    pub product_id: Option<i64>,
    /// Variant the line was sold from, if known
    pub variant_id: Option<i64>,
    /// Name at checkout time
    pub product_name: String,
    /// Units ordered
    pub quantity: i32,
    /// Price of one unit at checkout time
    pub unit_price: f64,
    /// `quantity * unit_price`
    pub total_price: f64,
}

/// Defines relationships between OrderItem and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each item belongs to one order
    #[sea_orm(
        belongs_to = "super::order::Entity",
        from = "Column::OrderId",
        to = "super::order::Column::Id"
    )]
    Order,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

//! Order entity - a placed order with its money totals.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Fulfilment state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Placed, not yet handled
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Being picked and packed
    #[sea_orm(string_value = "processing")]
    Processing,
    /// Handed to the carrier
    #[sea_orm(string_value = "shipped")]
    Shipped,
    /// Received by the customer
    #[sea_orm(string_value = "delivered")]
    Delivered,
    /// Stopped before delivery
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
    /// Money returned after the sale
    #[sea_orm(string_value = "refunded")]
    Refunded,
}

impl OrderStatus {
    /// Cancelled and refunded orders do not count towards revenue.
    #[must_use]
    pub const fn counts_as_revenue(self) -> bool {
        !matches!(self, Self::Cancelled | Self::Refunded)
    }
}

/// Payment state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Awaiting payment
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Payment captured
    #[sea_orm(string_value = "paid")]
    Paid,
    /// Payment declined
    #[sea_orm(string_value = "failed")]
    Failed,
    /// Payment returned
    #[sea_orm(string_value = "refunded")]
    Refunded,
}

/// Order database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    /// Unique identifier for the order
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Human-facing number, e.g. `ORD-000042`
    #[sea_orm(unique)]
    pub order_number: String,
    /// `None` for guest checkouts
    pub customer_id: Option<i64>,
    /// Contact email, copied from the customer for registered buyers
    pub customer_email: String,
    /// Fulfilment state
    pub status: OrderStatus,
    /// Payment state
    pub payment_status: PaymentStatus,
    /// Sum of the item totals
    pub subtotal: f64,
    /// Shipping charged
    pub shipping_cost: f64,
    /// Tax charged
    pub tax_amount: f64,
    /// Discount granted
    pub discount_amount: f64,
    /// Amount due, never below zero
    pub total: f64,
    /// Internal note for staff
    pub notes: Option<String>,
    /// When the order was created
    pub created_at: DateTimeUtc,
    /// When the order was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Order and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each order optionally belongs to one customer
    #[sea_orm(
        belongs_to = "super::customer::Entity",
        from = "Column::CustomerId",
        to = "super::customer::Column::Id"
    )]
    Customer,
    /// One order has many items
    #[sea_orm(has_many = "super::order_item::Entity")]
    Items,
}

impl Related<super::customer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customer.def()
    }
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

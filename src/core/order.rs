//! Order business logic - order entry, status changes and read-side statistics.
//!
//! Statistics are never stored. [`list_orders_with_items`] loads every order
//! and every item and joins them in memory; [`order_stats`] then folds over
//! the result.

use crate::{
    core::pricing::validate_price,
    entities::{
        Customer, Order, OrderItem, OrderStatus, PaymentStatus, order, order_item,
    },
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{info, instrument};

/// One line of a new order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOrderItem {
    /// Catalog product, if the line still refers to one
    pub product_id: Option<i64>,
    /// Chosen variant, if any
    pub variant_id: Option<i64>,
    /// Name captured at order time
    pub product_name: String,
    /// Must be at least 1
    pub quantity: i32,
    /// Price of one unit
    pub unit_price: f64,
}

/// A new order as entered by an admin or imported from checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOrder {
    /// `None` for guest checkouts
    pub customer_id: Option<i64>,
    /// Required for guests; taken from the customer when empty
    pub customer_email: String,
    /// At least one line
    pub items: Vec<NewOrderItem>,
    /// Added to the subtotal
    pub shipping_cost: f64,
    /// Added to the subtotal
    pub tax_amount: f64,
    /// Subtracted from the total
    pub discount_amount: f64,
    /// Internal note for staff
    pub notes: Option<String>,
}

/// An order joined with its lines.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderWithItems {
    /// The order row
    pub order: order::Model,
    /// Its lines, in insertion order
    pub items: Vec<order_item::Model>,
}

impl OrderWithItems {
    /// Sum of item quantities.
    #[must_use]
    pub fn units(&self) -> i64 {
        self.items.iter().map(|item| i64::from(item.quantity)).sum()
    }
}

/// Dashboard figures over a set of orders.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OrderStats {
    /// All orders, whatever their status
    pub order_count: usize,
    /// Total of orders that count as revenue
    pub revenue: f64,
    /// `revenue` divided by the number of revenue orders
    pub average_order_value: f64,
    /// Number of orders per status
    pub by_status: HashMap<OrderStatus, usize>,
    /// Units on revenue orders
    pub units_sold: u64,
}

fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

fn validate_order(new_order: &NewOrder) -> Result<()> {
    if new_order.items.is_empty() {
        return Err(Error::validation("An order needs at least one item"));
    }
    for item in &new_order.items {
        if item.product_name.trim().is_empty() {
            return Err(Error::validation("Order item name cannot be empty"));
        }
        if item.quantity <= 0 {
            return Err(Error::validation(format!(
                "Quantity for '{}' must be positive",
                item.product_name
            )));
        }
        validate_price(item.unit_price)?;
    }
    validate_price(new_order.shipping_cost)?;
    validate_price(new_order.tax_amount)?;
    validate_price(new_order.discount_amount)?;
    Ok(())
}

/// Stores an order and its items, computing the totals.
///
/// The total never drops below zero, whatever the discount.
///
/// # Errors
/// Returns `Validation` or `InvalidAmount` for bad input, `NotFound` for an
/// unknown customer, or a database error.
#[instrument(skip(db, new_order), fields(items = new_order.items.len()))]
pub async fn create_order(db: &DatabaseConnection, new_order: NewOrder) -> Result<OrderWithItems> {
    validate_order(&new_order)?;

    let txn = db.begin().await?;

    let mut email = new_order.customer_email.trim().to_lowercase();
    if let Some(customer_id) = new_order.customer_id {
        let customer = Customer::find_by_id(customer_id)
            .one(&txn)
            .await?
            .ok_or_else(|| Error::not_found("customer", customer_id))?;
        if email.is_empty() {
            email = customer.email;
        }
    }
    if email.is_empty() {
        return Err(Error::validation("Guest orders need an email address"));
    }

    let subtotal = round_cents(
        new_order
            .items
            .iter()
            .map(|item| f64::from(item.quantity) * item.unit_price)
            .sum(),
    );
    let total = round_cents(
        (subtotal + new_order.shipping_cost + new_order.tax_amount - new_order.discount_amount)
            .max(0.0),
    );

    let last = Order::find().order_by_desc(order::Column::Id).one(&txn).await?;
    let next_id = last.map_or(1, |order| order.id + 1);
    let now = Utc::now();

    let order = order::ActiveModel {
        order_number: Set(format!("ORD-{next_id:06}")),
        customer_id: Set(new_order.customer_id),
        customer_email: Set(email),
        status: Set(OrderStatus::Pending),
        payment_status: Set(PaymentStatus::Pending),
        subtotal: Set(subtotal),
        shipping_cost: Set(new_order.shipping_cost),
        tax_amount: Set(new_order.tax_amount),
        discount_amount: Set(new_order.discount_amount),
        total: Set(total),
        notes: Set(new_order.notes),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let mut items = Vec::with_capacity(new_order.items.len());
    for item in new_order.items {
        let line = order_item::ActiveModel {
            order_id: Set(order.id),
            product_id: Set(item.product_id),
            variant_id: Set(item.variant_id),
            product_name: Set(item.product_name.trim().to_string()),
            quantity: Set(item.quantity),
            unit_price: Set(item.unit_price),
            total_price: Set(round_cents(f64::from(item.quantity) * item.unit_price)),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        items.push(line);
    }

    txn.commit().await?;
    info!("Created order {} totalling {:.2}", order.order_number, order.total);
    Ok(OrderWithItems { order, items })
}

/// Every order with its items, newest first.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn list_orders_with_items(db: &DatabaseConnection) -> Result<Vec<OrderWithItems>> {
    let orders = Order::find()
        .order_by_desc(order::Column::CreatedAt)
        .order_by_desc(order::Column::Id)
        .all(db)
        .await?;
    let mut items_by_order: HashMap<i64, Vec<order_item::Model>> = HashMap::new();
    for item in OrderItem::find()
        .order_by_asc(order_item::Column::Id)
        .all(db)
        .await?
    {
        items_by_order.entry(item.order_id).or_default().push(item);
    }

    Ok(orders
        .into_iter()
        .map(|order| {
            let items = items_by_order.remove(&order.id).unwrap_or_default();
            OrderWithItems { order, items }
        })
        .collect())
}

/// Folds a set of orders into dashboard figures.
#[must_use]
pub fn order_stats(orders: &[OrderWithItems]) -> OrderStats {
    let mut stats = OrderStats {
        order_count: orders.len(),
        ..OrderStats::default()
    };
    let mut revenue_orders = 0_u32;

    for entry in orders {
        *stats.by_status.entry(entry.order.status).or_insert(0) += 1;
        if entry.order.status.counts_as_revenue() {
            revenue_orders += 1;
            stats.revenue += entry.order.total;
            stats.units_sold += u64::try_from(entry.units()).unwrap_or(0);
        }
    }

    stats.revenue = round_cents(stats.revenue);
    if revenue_orders > 0 {
        stats.average_order_value = round_cents(stats.revenue / f64::from(revenue_orders));
    }
    stats
}

async fn find_order(db: &DatabaseConnection, order_id: i64) -> Result<order::Model> {
    Order::find_by_id(order_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("order", order_id))
}

/// Sets the fulfilment status of an order.
///
/// # Errors
/// Returns `NotFound` for an unknown order, or a database error.
pub async fn update_order_status(
    db: &DatabaseConnection,
    order_id: i64,
    status: OrderStatus,
) -> Result<order::Model> {
    let mut order: order::ActiveModel = find_order(db, order_id).await?.into();
    order.status = Set(status);
    order.updated_at = Set(Utc::now());
    let order = order.update(db).await?;
    info!("Order {} is now {status:?}", order.order_number);
    Ok(order)
}

/// Sets the payment status of an order.
///
/// # Errors
/// Returns `NotFound` for an unknown order, or a database error.
pub async fn update_payment_status(
    db: &DatabaseConnection,
    order_id: i64,
    payment_status: PaymentStatus,
) -> Result<order::Model> {
    let mut order: order::ActiveModel = find_order(db, order_id).await?.into();
    order.payment_status = Set(payment_status);
    order.updated_at = Set(Utc::now());
    let order = order.update(db).await?;
    info!("Order {} payment is now {payment_status:?}", order.order_number);
    Ok(order)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;

    fn item(name: &str, quantity: i32, unit_price: f64) -> NewOrderItem {
        NewOrderItem {
            product_id: None,
            variant_id: None,
            product_name: name.to_string(),
            quantity,
            unit_price,
        }
    }

    fn guest_order(items: Vec<NewOrderItem>) -> NewOrder {
        NewOrder {
            customer_id: None,
            customer_email: "Guest@Example.com".to_string(),
            items,
            shipping_cost: 5.0,
            tax_amount: 2.5,
            discount_amount: 1.0,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_create_order_computes_totals() -> Result<()> {
        let db = setup_test_db().await?;
        let created = create_order(&db, guest_order(vec![item("Tea", 2, 3.0), item("Mug", 1, 8.5)])).await?;

        assert_eq!(created.order.order_number, "ORD-000001");
        assert_eq!(created.order.customer_email, "guest@example.com");
        assert_eq!(created.order.subtotal, 14.5);
        assert_eq!(created.order.total, 21.0);
        assert_eq!(created.items[0].total_price, 6.0);
        assert_eq!(created.units(), 3);

        let second = create_order(&db, guest_order(vec![item("Tea", 1, 3.0)])).await?;
        assert_eq!(second.order.order_number, "ORD-000002");
        Ok(())
    }

    #[tokio::test]
    async fn test_create_order_rejects_bad_input() -> Result<()> {
        let db = setup_test_db().await?;

        let empty = create_order(&db, guest_order(vec![])).await;
        assert!(matches!(empty, Err(Error::Validation { .. })));

        let zero = create_order(&db, guest_order(vec![item("Tea", 0, 3.0)])).await;
        assert!(matches!(zero, Err(Error::Validation { .. })));

        let mut anonymous = guest_order(vec![item("Tea", 1, 3.0)]);
        anonymous.customer_email = "  ".to_string();
        assert!(matches!(create_order(&db, anonymous).await, Err(Error::Validation { .. })));

        let mut unknown = guest_order(vec![item("Tea", 1, 3.0)]);
        unknown.customer_id = Some(404);
        assert!(matches!(
            create_order(&db, unknown).await,
            Err(Error::NotFound { entity: "customer", .. })
        ));

        assert!(list_orders_with_items(&db).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_customer_email_fills_in() -> Result<()> {
        let db = setup_test_db().await?;
        let ada = create_test_customer(&db, "ada@example.com").await?;
        let mut new_order = guest_order(vec![item("Tea", 1, 3.0)]);
        new_order.customer_id = Some(ada.id);
        new_order.customer_email = String::new();

        let created = create_order(&db, new_order).await?;
        assert_eq!(created.order.customer_email, "ada@example.com");
        Ok(())
    }

    #[tokio::test]
    async fn test_list_orders_joins_items() -> Result<()> {
        let db = setup_test_db().await?;
        let first = create_order(&db, guest_order(vec![item("Tea", 1, 3.0), item("Mug", 1, 8.0)])).await?;
        let second = create_order(&db, guest_order(vec![item("Cola", 6, 1.5)])).await?;

        let orders = list_orders_with_items(&db).await?;
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].order.id, second.order.id);
        assert_eq!(orders[0].items.len(), 1);
        assert_eq!(orders[1].order.id, first.order.id);
        let names: Vec<&str> = orders[1].items.iter().map(|i| i.product_name.as_str()).collect();
        assert_eq!(names, vec!["Tea", "Mug"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_order_stats_excludes_cancelled_and_refunded() -> Result<()> {
        let db = setup_test_db().await?;
        let a = create_test_order(&db, None, 10.0).await?;
        let b = create_test_order(&db, None, 30.0).await?;
        let c = create_test_order(&db, None, 100.0).await?;
        let d = create_test_order(&db, None, 50.0).await?;

        update_order_status(&db, b.order.id, OrderStatus::Delivered).await?;
        update_order_status(&db, c.order.id, OrderStatus::Cancelled).await?;
        update_order_status(&db, d.order.id, OrderStatus::Refunded).await?;
        update_payment_status(&db, a.order.id, PaymentStatus::Paid).await?;

        let stats = order_stats(&list_orders_with_items(&db).await?);
        assert_eq!(stats.order_count, 4);
        assert_eq!(stats.revenue, 40.0);
        assert_eq!(stats.average_order_value, 20.0);
        assert_eq!(stats.units_sold, 2);
        assert_eq!(stats.by_status.get(&OrderStatus::Pending), Some(&1));
        assert_eq!(stats.by_status.get(&OrderStatus::Cancelled), Some(&1));
        assert_eq!(stats.by_status.get(&OrderStatus::Shipped), None);
        Ok(())
    }

    #[test]
    fn test_order_stats_empty() {
        let stats = order_stats(&[]);
        assert_eq!(stats, OrderStats::default());
    }

    #[tokio::test]
    async fn test_update_unknown_order() -> Result<()> {
        let db = setup_test_db().await?;
        let result = update_order_status(&db, 9, OrderStatus::Shipped).await;
        assert!(matches!(result, Err(Error::NotFound { entity: "order", .. })));
        Ok(())
    }
}

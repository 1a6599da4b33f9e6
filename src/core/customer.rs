//! Customer business logic.
//!
//! Spending figures are derived from orders on every call; nothing here is
//! cached or persisted.

use crate::{
    entities::{Customer, Order, customer, order},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use regex::Regex;
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, sync::LazyLock};
use tracing::info;

#[allow(clippy::expect_used)]
static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid")
});

/// Fields for registering a customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCustomer {
    /// Trimmed and lowercased before storage
    pub email: String,
    /// Given name
    pub first_name: String,
    /// Family name; at least one of the names is required
    pub last_name: String,
    /// Blank numbers are stored as `None`
    pub phone: Option<String>,
}

/// A customer with figures computed from their orders.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerSummary {
    /// The customer record
    pub customer: customer::Model,
    /// All orders, including cancelled and refunded ones
    pub order_count: usize,
    /// Total of orders that count as revenue
    pub total_spent: f64,
    /// Total spent divided by the counted orders, 0 without any
    pub average_order_value: f64,
    /// Most recent order of any status
    pub last_order_at: Option<DateTime<Utc>>,
}

/// Totals across all customers.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CustomersOverview {
    /// Number of customers
    pub customer_count: usize,
    /// Customers not deactivated
    pub active_count: usize,
    /// Customers with at least one order
    pub buyers: usize,
    /// Sum of every customer's total spent
    pub total_spent: f64,
    /// Total spent divided by the number of buyers
    pub average_spent_per_buyer: f64,
}

/// Registers a customer. Emails are stored lowercase and must be unique.
///
/// # Errors
/// Returns `Validation` for a malformed or taken email or a missing name, or
/// a database error.
pub async fn create_customer(db: &DatabaseConnection, new: NewCustomer) -> Result<customer::Model> {
    let email = new.email.trim().to_lowercase();
    if !EMAIL.is_match(&email) {
        return Err(Error::validation(format!("'{email}' is not a valid email address")));
    }
    if new.first_name.trim().is_empty() && new.last_name.trim().is_empty() {
        return Err(Error::validation("Customer needs a name"));
    }

    let existing = Customer::find()
        .filter(customer::Column::Email.eq(email.as_str()))
        .one(db)
        .await?;
    if existing.is_some() {
        return Err(Error::validation(format!(
            "A customer with email '{email}' already exists"
        )));
    }

    let customer = customer::ActiveModel {
        email: Set(email),
        first_name: Set(new.first_name.trim().to_string()),
        last_name: Set(new.last_name.trim().to_string()),
        phone: Set(new
            .phone
            .map(|phone| phone.trim().to_string())
            .filter(|phone| !phone.is_empty())),
        is_active: Set(true),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!("Created customer {} <{}>", customer.id, customer.email);
    Ok(customer)
}

/// All customers, newest first.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn list_customers(db: &DatabaseConnection) -> Result<Vec<customer::Model>> {
    Customer::find()
        .order_by_desc(customer::Column::CreatedAt)
        .order_by_desc(customer::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Activates or deactivates a customer. Their orders are untouched.
///
/// # Errors
/// Returns `NotFound` for an unknown customer, or a database error.
pub async fn set_customer_active(
    db: &DatabaseConnection,
    customer_id: i64,
    is_active: bool,
) -> Result<customer::Model> {
    let customer = Customer::find_by_id(customer_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("customer", customer_id))?;
    let mut active: customer::ActiveModel = customer.into();
    active.is_active = Set(is_active);
    Ok(active.update(db).await?)
}

/// Per-customer spending, in [`list_customers`] order.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn customer_summaries(db: &DatabaseConnection) -> Result<Vec<CustomerSummary>> {
    let customers = list_customers(db).await?;
    let mut orders_by_customer: HashMap<i64, Vec<order::Model>> = HashMap::new();
    for order in Order::find()
        .filter(order::Column::CustomerId.is_not_null())
        .all(db)
        .await?
    {
        if let Some(customer_id) = order.customer_id {
            orders_by_customer.entry(customer_id).or_default().push(order);
        }
    }

    Ok(customers
        .into_iter()
        .map(|customer| {
            let orders = orders_by_customer.remove(&customer.id).unwrap_or_default();
            summarize(customer, &orders)
        })
        .collect())
}

fn summarize(customer: customer::Model, orders: &[order::Model]) -> CustomerSummary {
    let counted: Vec<&order::Model> = orders
        .iter()
        .filter(|order| order.status.counts_as_revenue())
        .collect();
    let total_spent: f64 = counted.iter().map(|order| order.total).sum();
    #[allow(clippy::cast_precision_loss)]
    let average_order_value = if counted.is_empty() {
        0.0
    } else {
        total_spent / counted.len() as f64
    };

    CustomerSummary {
        customer,
        order_count: orders.len(),
        total_spent,
        average_order_value,
        last_order_at: orders.iter().map(|order| order.created_at).max(),
    }
}

/// Folds summaries into store-wide customer figures.
#[must_use]
pub fn customers_overview(summaries: &[CustomerSummary]) -> CustomersOverview {
    let buyers = summaries.iter().filter(|s| s.order_count > 0).count();
    let total_spent: f64 = summaries.iter().map(|s| s.total_spent).sum();
    #[allow(clippy::cast_precision_loss)]
    let average_spent_per_buyer = if buyers == 0 {
        0.0
    } else {
        total_spent / buyers as f64
    };

    CustomersOverview {
        customer_count: summaries.len(),
        active_count: summaries.iter().filter(|s| s.customer.is_active).count(),
        buyers,
        total_spent,
        average_spent_per_buyer,
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::{core::order::update_order_status, entities::OrderStatus, test_utils::*};

    #[tokio::test]
    async fn test_create_customer_normalizes_email() -> Result<()> {
        let db = setup_test_db().await?;
        let customer = create_customer(
            &db,
            NewCustomer {
                email: "  Ada@Example.COM ".to_string(),
                first_name: "Ada".to_string(),
                last_name: "Lovelace".to_string(),
                phone: Some("  ".to_string()),
            },
        )
        .await?;

        assert_eq!(customer.email, "ada@example.com");
        assert_eq!(customer.full_name(), "Ada Lovelace");
        assert!(customer.phone.is_none());
        assert!(customer.is_active);

        let duplicate = create_test_customer(&db, "ADA@example.com").await;
        assert!(matches!(duplicate, Err(Error::Validation { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_email_rejected() -> Result<()> {
        let db = setup_test_db().await?;
        for email in ["", "no-at-sign", "two@@example.com", "space @example.com"] {
            let result = create_test_customer(&db, email).await;
            assert!(matches!(result, Err(Error::Validation { .. })), "{email}");
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_customer_summaries() -> Result<()> {
        let db = setup_test_db().await?;
        let ada = create_test_customer(&db, "ada@example.com").await?;
        let bob = create_test_customer(&db, "bob@example.com").await?;

        create_test_order(&db, Some(ada.id), 20.0).await?;
        let last = create_test_order(&db, Some(ada.id), 40.0).await?;
        let cancelled = create_test_order(&db, Some(ada.id), 500.0).await?;
        update_order_status(&db, cancelled.order.id, OrderStatus::Cancelled).await?;
        // Guest orders belong to nobody
        create_test_order(&db, None, 99.0).await?;

        let summaries = customer_summaries(&db).await?;
        let ada_summary = summaries.iter().find(|s| s.customer.id == ada.id).unwrap();
        assert_eq!(ada_summary.order_count, 3);
        assert_eq!(ada_summary.total_spent, 60.0);
        assert_eq!(ada_summary.average_order_value, 30.0);
        assert!(ada_summary.last_order_at.unwrap() >= last.order.created_at);

        let bob_summary = summaries.iter().find(|s| s.customer.id == bob.id).unwrap();
        assert_eq!(bob_summary.order_count, 0);
        assert_eq!(bob_summary.average_order_value, 0.0);
        assert!(bob_summary.last_order_at.is_none());

        set_customer_active(&db, bob.id, false).await?;
        let overview = customers_overview(&customer_summaries(&db).await?);
        assert_eq!(overview.customer_count, 2);
        assert_eq!(overview.active_count, 1);
        assert_eq!(overview.buyers, 1);
        assert_eq!(overview.total_spent, 60.0);
        assert_eq!(overview.average_spent_per_buyer, 60.0);
        Ok(())
    }

    #[test]
    fn test_overview_of_nobody() {
        assert_eq!(customers_overview(&[]), CustomersOverview::default());
    }
}

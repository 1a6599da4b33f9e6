//! Shared test utilities for the back-office.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test records with sensible defaults.
#![allow(clippy::missing_errors_doc)]

use crate::{
    config::catalog::StoreSettings,
    core::{
        category::{self, CategoryForm},
        collection::{self, CollectionForm},
        customer::{self, NewCustomer},
        order::{self, NewOrder, NewOrderItem, OrderWithItems},
        product::{self, ProductDetail, ProductForm},
    },
    entities,
    errors::Result,
};
use sea_orm::DatabaseConnection;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// An active product form with only name and price set.
pub fn product_form(name: &str, price: f64) -> ProductForm {
    ProductForm::new(name, price)
}

/// Saves a product with the default store settings (low stock at 10 units).
pub async fn save_test_product(db: &DatabaseConnection, form: ProductForm) -> Result<ProductDetail> {
    product::save_product(db, form, &StoreSettings::default()).await
}

/// Creates an active root category.
pub async fn create_test_category(
    db: &DatabaseConnection,
    name: &str,
) -> Result<entities::category::Model> {
    category::save_category(db, CategoryForm::new(name)).await
}

/// Creates an active manual collection.
pub async fn create_test_collection(
    db: &DatabaseConnection,
    name: &str,
) -> Result<entities::collection::Model> {
    collection::save_collection(db, CollectionForm::manual(name)).await
}

/// Creates a customer named "Test Customer".
pub async fn create_test_customer(
    db: &DatabaseConnection,
    email: &str,
) -> Result<entities::customer::Model> {
    customer::create_customer(
        db,
        NewCustomer {
            email: email.to_string(),
            first_name: "Test".to_string(),
            last_name: "Customer".to_string(),
            phone: None,
        },
    )
    .await
}

/// Creates a pending order with one unit of a single item priced at `total`.
///
/// # Defaults
/// * no shipping, tax or discount, so the order total equals `total`
/// * guest orders use `guest@example.com`
pub async fn create_test_order(
    db: &DatabaseConnection,
    customer_id: Option<i64>,
    total: f64,
) -> Result<OrderWithItems> {
    order::create_order(
        db,
        NewOrder {
            customer_id,
            customer_email: if customer_id.is_some() {
                String::new()
            } else {
                "guest@example.com".to_string()
            },
            items: vec![NewOrderItem {
                product_id: None,
                variant_id: None,
                product_name: "Test item".to_string(),
                quantity: 1,
                unit_price: total,
            }],
            shipping_cost: 0.0,
            tax_amount: 0.0,
            discount_amount: 0.0,
            notes: None,
        },
    )
    .await
}

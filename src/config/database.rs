//! Database configuration module.
//!
//! Handles the connection to the backing store and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with
//! `Schema::create_table_from_entity`, so the schema always matches the Rust
//! models. Creation is idempotent (`IF NOT EXISTS`) and safe to run on every start.

use crate::entities::{
    BlogPost, Brand, Category, Collection, Customer, Order, OrderItem, Product, ProductCategory,
    ProductCollection, ProductVariant, VariantImage,
};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};
use tracing::{debug, info};

const DEFAULT_DATABASE_URL: &str = "sqlite://data/shop_admin.sqlite?mode=rwc";

/// Gets the database URL from the `DATABASE_URL` environment variable,
/// falling back to a local `SQLite` file.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection using [`get_database_url`].
///
/// # Errors
/// Returns an error if the database cannot be reached.
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    debug!("Connecting to database at {database_url}");
    Database::connect(&database_url).await.map_err(Into::into)
}

/// Creates every table the back-office uses, skipping the ones that already exist.
///
/// Referenced tables are created before the tables pointing at them so the
/// statements also work on backends that check foreign keys at creation time.
///
/// # Errors
/// Returns an error if a `CREATE TABLE` statement fails.
pub async fn create_tables<C>(db: &C) -> Result<()>
where
    C: ConnectionTrait,
{
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let mut statements = vec![
        schema.create_table_from_entity(Brand),
        schema.create_table_from_entity(Category),
        schema.create_table_from_entity(Collection),
        schema.create_table_from_entity(Product),
        schema.create_table_from_entity(ProductVariant),
        schema.create_table_from_entity(VariantImage),
        schema.create_table_from_entity(ProductCategory),
        schema.create_table_from_entity(ProductCollection),
        schema.create_table_from_entity(Customer),
        schema.create_table_from_entity(Order),
        schema.create_table_from_entity(OrderItem),
        schema.create_table_from_entity(BlogPost),
    ];

    for statement in &mut statements {
        statement.if_not_exists();
        db.execute(builder.build(&*statement)).await?;
    }

    info!("Ensured {} tables exist", statements.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{CategoryModel, ProductModel};
    use sea_orm::{EntityTrait, QuerySelect};

    #[tokio::test]
    async fn test_create_tables() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;

        // Test that tables exist by querying them
        let _: Vec<ProductModel> = Product::find().limit(1).all(&db).await?;
        let _: Vec<CategoryModel> = Category::find().limit(1).all(&db).await?;
        let _ = ProductVariant::find().limit(1).all(&db).await?;
        let _ = VariantImage::find().limit(1).all(&db).await?;
        let _ = ProductCategory::find().limit(1).all(&db).await?;
        let _ = ProductCollection::find().limit(1).all(&db).await?;
        let _ = Order::find().limit(1).all(&db).await?;
        let _ = OrderItem::find().limit(1).all(&db).await?;
        let _ = BlogPost::find().limit(1).all(&db).await?;

        Ok(())
    }

    #[tokio::test]
    async fn test_create_tables_is_idempotent() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;
        create_tables(&db).await?;
        Ok(())
    }
}

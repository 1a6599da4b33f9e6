#![allow(clippy::result_large_err)]

use dotenvy::dotenv;
use shop_admin::{
    config::{self, database},
    core::{category, customer, notice::notice_for, order, product},
    errors::Result,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file, non-fatal since env vars can be set externally
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Store configuration
    let catalog = config::catalog::load_default_config()
        .inspect_err(|e| error!("Critical error loading configuration: {}", e))?;
    let settings = catalog.store;
    info!(
        "Managing '{}' (prices in {}, low stock at {} units)",
        settings.name, settings.currency, settings.low_stock_threshold
    );

    match config::session::current_admin() {
        Some(admin) => info!("Signed in as {}", admin.label()),
        None => warn!("ADMIN_EMAIL is not set; actions will not be attributed"),
    }

    // 4. Connect and create tables
    let database_url = database::get_database_url();
    if database_url.starts_with("sqlite://data/") {
        std::fs::create_dir_all("data")?;
    }
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|_| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to initialize database: {}", e))?;

    // 5. Seed configured categories
    let seeded = category::seed_categories(&db, &catalog.categories).await;
    let notice = notice_for("seed categories", &seeded, "Categories are up to date");
    info!("{}", notice.message);

    // 6. Dashboard summary
    let products = product::list_products(&db).await?;
    let low_stock = product::low_stock_products(&db, settings.low_stock_threshold).await?;
    info!(
        "{} products, {} active, {} at or below the low stock threshold",
        products.len(),
        products.iter().filter(|p| p.is_active).count(),
        low_stock.len()
    );
    for item in &low_stock {
        warn!("Low stock: {} ({} left)", item.name, item.stock);
    }

    let stats = order::order_stats(&order::list_orders_with_items(&db).await?);
    info!(
        "{} orders, revenue {:.2} {}, average order {:.2}, {} units sold",
        stats.order_count, stats.revenue, settings.currency, stats.average_order_value, stats.units_sold
    );

    let overview = customer::customers_overview(&customer::customer_summaries(&db).await?);
    info!(
        "{} customers ({} active, {} with orders)",
        overview.customer_count, overview.active_count, overview.buyers
    );

    Ok(())
}

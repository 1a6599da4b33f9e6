//! Price-derived values: discount, profit margin, inventory state.
//!
//! Pure functions, no database access. Percentages are rounded to whole numbers.

use crate::{
    entities::InventoryStatus,
    errors::{Error, Result},
};
use serde::Serialize;

/// Stock at or below this count is "low" unless the store overrides it.
pub const DEFAULT_LOW_STOCK_THRESHOLD: i32 = 10;

/// Savings shown when the compare-at price is above the selling price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Discount {
    /// `compare_at - price`
    pub amount: f64,
    /// Whole percent of `compare_at`
    pub percentage: f64,
}

/// Stock state of a product or variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Inventory {
    /// In stock, low or out
    pub status: InventoryStatus,
    /// Whether the item may be sold right now
    pub in_stock: bool,
}

/// Computes the discount implied by a compare-at price.
///
/// Returns `None` when there is no compare-at price or it is not above `price`.
#[must_use]
pub fn calculate_discount(price: f64, compare_at: Option<f64>) -> Option<Discount> {
    let compare_at = compare_at?;
    if compare_at <= price || compare_at <= 0.0 {
        return None;
    }
    let amount = compare_at - price;
    Some(Discount {
        amount,
        percentage: (amount / compare_at * 100.0).round(),
    })
}

/// Profit margin in whole percent of the selling price.
///
/// Unknown or zero cost, and non-positive prices, yield `0`.
#[must_use]
pub fn calculate_profit_margin(price: f64, cost: Option<f64>) -> f64 {
    match cost {
        Some(cost) if cost > 0.0 && price > 0.0 => ((price - cost) / price * 100.0).round(),
        _ => 0.0,
    }
}

/// Classifies a stock level.
///
/// `continue_selling` keeps the item purchasable at zero stock but does not
/// change the reported status.
#[must_use]
pub const fn calculate_inventory(stock: i32, continue_selling: bool, threshold: i32) -> Inventory {
    let status = if stock <= 0 {
        InventoryStatus::OutOfStock
    } else if stock <= threshold {
        InventoryStatus::LowStock
    } else {
        InventoryStatus::InStock
    };
    Inventory {
        status,
        in_stock: stock > 0 || continue_selling,
    }
}

/// Rejects negative, NaN and infinite amounts.
///
/// # Errors
/// Returns `InvalidAmount` for a rejected amount.
pub fn validate_price(amount: f64) -> Result<()> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(Error::InvalidAmount { amount });
    }
    Ok(())
}

/// Like [`validate_price`] for optional fields.
///
/// # Errors
/// Returns `InvalidAmount` for a rejected amount.
pub fn validate_optional_price(amount: Option<f64>) -> Result<()> {
    amount.map_or(Ok(()), validate_price)
}

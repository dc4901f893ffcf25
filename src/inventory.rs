use std::cmp::Ordering;

use tracing::{debug, warn};

use crate::amount::{self, Amount};
use crate::table::{RawRecord, Table};

/// Header names of the inventory table
pub mod field {
    pub const PRODUCT: &str = "producto";
    pub const CATEGORY: &str = "categoria";
    pub const PURCHASE_PRICE: &str = "precio_compra";
    pub const SALE_PRICE: &str = "precio_venta";
    pub const CURRENT_STOCK: &str = "stock_actual";
    pub const MIN_STOCK: &str = "stock_minimo";
}

/// The profit margin of an item, relative to its purchase price
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Margin {
    /// The margin in percent
    Percent(Amount),
    /// The item was purchased for free, so there is no meaningful percentage
    Undefined,
    /// One of the prices could not be parsed
    Invalid,
}

impl Margin {
    /// Computes `(sale - purchase) / purchase * 100`
    ///
    /// A result out of the range of [`Amount`] is invalid as well.
    pub fn new(purchase_price: Option<Amount>, sale_price: Option<Amount>) -> Self {
        let (purchase_price, sale_price) = match (purchase_price, sale_price) {
            (Some(purchase_price), Some(sale_price)) => (purchase_price, sale_price),
            _ => return Margin::Invalid,
        };
        if purchase_price == Amount::ZERO {
            return Margin::Undefined;
        }

        sale_price
            .checked_sub(purchase_price)
            .and_then(|profit| profit.checked_mul(Amount::from_num(100)))
            .and_then(|profit| profit.checked_div(purchase_price))
            .map_or(Margin::Invalid, Margin::Percent)
    }

    /// The percentage, if there is one
    pub fn percent(self) -> Option<Amount> {
        match self {
            Margin::Percent(percent) => Some(percent),
            Margin::Undefined | Margin::Invalid => None,
        }
    }

    /// Orders margins for ranking, items without a percentage rank lowest
    pub fn rank(self, other: Self) -> Ordering {
        self.percent().cmp(&other.percent())
    }
}

/// The urgency of a low stock alert
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    /// The item is sold out
    Critical,
    /// The item is at or below its minimum stock
    Warning,
}

/// An item in the store's inventory
#[derive(Clone, Debug, PartialEq)]
pub struct InventoryItem {
    product: String,
    category: String,
    purchase_price: Option<Amount>,
    sale_price: Option<Amount>,
    current_stock: Option<u32>,
    min_stock: Option<u32>,
    margin: Margin,
}

impl InventoryItem {
    /// Converts one raw line of the inventory table and derives its margin
    pub fn from_raw(record: &RawRecord) -> Self {
        let text = |name| record.get(name).unwrap_or_default().to_owned();
        let purchase_price = amount::parse_amount(record.get(field::PURCHASE_PRICE));
        let sale_price = amount::parse_amount(record.get(field::SALE_PRICE));

        Self {
            product: text(field::PRODUCT),
            category: text(field::CATEGORY),
            purchase_price,
            sale_price,
            current_stock: amount::parse_count(record.get(field::CURRENT_STOCK)),
            min_stock: amount::parse_count(record.get(field::MIN_STOCK)),
            margin: Margin::new(purchase_price, sale_price),
        }
    }

    /// The product name
    /// *This is a display key only, and not guaranteed to be unique*
    pub fn product(&self) -> &str {
        &self.product
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn purchase_price(&self) -> Option<Amount> {
        self.purchase_price
    }

    pub fn sale_price(&self) -> Option<Amount> {
        self.sale_price
    }

    /// The profit per unit sold, `None` if it cannot be computed
    pub fn unit_profit(&self) -> Option<Amount> {
        self.sale_price?.checked_sub(self.purchase_price?)
    }

    pub fn current_stock(&self) -> Option<u32> {
        self.current_stock
    }

    pub fn min_stock(&self) -> Option<u32> {
        self.min_stock
    }

    pub fn margin(&self) -> Margin {
        self.margin
    }

    /// Whether the current stock is at or below the minimum
    ///
    /// Items with an unreadable stock level are never considered low.
    pub fn is_low_stock(&self) -> bool {
        matches!(
            (self.current_stock, self.min_stock),
            (Some(current), Some(min)) if current <= min
        )
    }

    /// The alert level of a low stock item, `None` if the stock is fine
    pub fn alert_level(&self) -> Option<AlertLevel> {
        match self.current_stock {
            _ if !self.is_low_stock() => None,
            Some(0) => Some(AlertLevel::Critical),
            _ => Some(AlertLevel::Warning),
        }
    }
}

/// Converts the inventory table into typed items, keeping file order
pub fn normalize_inventory(table: &Table) -> Vec<InventoryItem> {
    let inventory = table
        .records()
        .iter()
        .map(InventoryItem::from_raw)
        .collect::<Vec<_>>();

    let invalid = inventory.iter().filter(|item| item.margin == Margin::Invalid).count();
    if invalid > 0 {
        warn!(count = invalid, "Items with an invalid price poison the average margin");
    }

    debug!(count = inventory.len(), "Normalized inventory");
    inventory
}

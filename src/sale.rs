use chrono::{DateTime, NaiveDate};
use tracing::{debug, warn};

use crate::amount::{self, Amount};
use crate::table::{RawRecord, Table};

/// Header names of the sales table
pub mod field {
    pub const DATE: &str = "fecha";
    pub const PRODUCT: &str = "producto";
    pub const CATEGORY: &str = "categoria";
    pub const QUANTITY: &str = "cantidad";
    pub const UNIT_PRICE: &str = "precio_unitario";
    pub const TOTAL: &str = "total";
    pub const EMPLOYEE: &str = "vendedor";
    pub const PAYMENT_METHOD: &str = "metodo_pago";
}

/// A single sales transaction
///
/// Numeric fields that could not be parsed are `None` and poison every sum
/// they are part of. An invalid date is `None` as well, such a sale is left
/// out of everything grouped by day but still counts as a transaction.
#[derive(Clone, Debug, PartialEq)]
pub struct SaleRecord {
    date: Option<NaiveDate>,
    product: String,
    category: String,
    quantity: Option<u32>,
    unit_price: Option<Amount>,
    total: Option<Amount>,
    employee: String,
    payment_method: String,
}

impl SaleRecord {
    /// Converts one raw line of the sales table
    ///
    /// Missing text fields become empty strings.
    pub fn from_raw(record: &RawRecord) -> Self {
        let text = |name| record.get(name).unwrap_or_default().to_owned();

        Self {
            date: parse_date(record.get(field::DATE)),
            product: text(field::PRODUCT),
            category: text(field::CATEGORY),
            quantity: amount::parse_count(record.get(field::QUANTITY)),
            unit_price: amount::parse_amount(record.get(field::UNIT_PRICE)),
            total: amount::parse_amount(record.get(field::TOTAL)),
            employee: text(field::EMPLOYEE),
            payment_method: text(field::PAYMENT_METHOD),
        }
    }

    /// The day of the sale
    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    pub fn product(&self) -> &str {
        &self.product
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    /// The number of units sold
    pub fn quantity(&self) -> Option<u32> {
        self.quantity
    }

    pub fn unit_price(&self) -> Option<Amount> {
        self.unit_price
    }

    /// The ticket amount
    ///
    /// This is taken from the source as is, and is never reconciled against
    /// quantity times unit price.
    pub fn total(&self) -> Option<Amount> {
        self.total
    }

    /// The employee who made the sale
    pub fn employee(&self) -> &str {
        &self.employee
    }

    pub fn payment_method(&self) -> &str {
        &self.payment_method
    }
}

/// Converts the sales table into typed records sorted by date
///
/// The sort is stable, so sales of the same day keep the order they were
/// recorded in. Sales with an invalid date go after all dated ones.
pub fn normalize_sales(table: &Table) -> Vec<SaleRecord> {
    let mut sales = table
        .records()
        .iter()
        .map(SaleRecord::from_raw)
        .collect::<Vec<_>>();
    sales.sort_by_key(|sale| (sale.date.is_none(), sale.date));

    let undated = sales.iter().filter(|sale| sale.date.is_none()).count();
    if undated > 0 {
        warn!(count = undated, "Sales with an invalid date are left out of daily figures");
    }
    let poisoned = sales.iter().filter(|sale| sale.total.is_none()).count();
    if poisoned > 0 {
        warn!(count = poisoned, "Sales with an invalid total poison revenue figures");
    }

    debug!(count = sales.len(), "Normalized sales");
    sales
}

fn parse_date(field: Option<&str>) -> Option<NaiveDate> {
    let field = field?.trim();

    NaiveDate::parse_from_str(field, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(field).ok().map(|date| date.date_naive()))
}

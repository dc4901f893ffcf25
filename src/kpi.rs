use chrono::NaiveDate;

use crate::aggregate::{self, Grouped};
use crate::amount::{self, Amount};
use crate::inventory::{InventoryItem, Margin};
use crate::sale::SaleRecord;

/// The revenue of a single day
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DayRevenue {
    pub date: NaiveDate,
    /// `None` if a sale of that day has an unreadable total
    pub revenue: Option<Amount>,
}

/// The summed up quantity sold of a product
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProductQuantity {
    pub product: String,
    pub quantity: Option<u64>,
}

/// The sales figures of a single employee
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmployeeStats {
    pub employee: String,
    pub revenue: Option<Amount>,
    pub transactions: usize,
    pub average_ticket: Option<Amount>,
}

/// The headline figures of the dashboard
///
/// Revenue figures are `None` when poisoned by an unreadable total. The
/// averages fall back to zero when there is nothing to average, `best_day`
/// and `top_product` are `None` when there is no data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Kpis {
    pub total_revenue: Option<Amount>,
    pub transaction_count: usize,
    pub average_ticket: Option<Amount>,
    pub average_margin: Option<Amount>,
    pub low_stock_count: usize,
    pub best_day: Option<DayRevenue>,
    pub top_product: Option<ProductQuantity>,
}

impl Kpis {
    /// Computes all figures from a set of sales and the inventory
    pub fn compute(sales: &[SaleRecord], inventory: &[InventoryItem]) -> Self {
        Self {
            total_revenue: total_revenue(sales),
            transaction_count: sales.len(),
            average_ticket: average_ticket(sales),
            average_margin: average_margin(inventory),
            low_stock_count: low_stock_count(inventory),
            best_day: best_day(sales),
            top_product: top_product_by_quantity(sales),
        }
    }
}

pub fn total_revenue(sales: &[SaleRecord]) -> Option<Amount> {
    amount::sum(sales.iter().map(SaleRecord::total))
}

/// The mean ticket, zero if there are no sales
pub fn average_ticket(sales: &[SaleRecord]) -> Option<Amount> {
    amount::average(total_revenue(sales), sales.len())
}

/// The mean margin of all items
///
/// Items bought for free have no margin and are skipped. An item with an
/// unreadable price poisons the mean. Zero if no item has a margin.
pub fn average_margin(inventory: &[InventoryItem]) -> Option<Amount> {
    let mut sum = Amount::ZERO;
    let mut count = 0;

    for item in inventory {
        match item.margin() {
            Margin::Percent(percent) => {
                sum = sum.checked_add(percent)?;
                count += 1;
            }
            Margin::Undefined => {}
            Margin::Invalid => return None,
        }
    }

    amount::average(Some(sum), count)
}

pub fn low_stock_count(inventory: &[InventoryItem]) -> usize {
    inventory.iter().filter(|item| item.is_low_stock()).count()
}

/// Revenue per day in chronological order
///
/// Sales with an invalid date are left out.
pub fn daily_revenue(sales: &[SaleRecord]) -> Grouped<NaiveDate, Option<Amount>> {
    let mut daily = aggregate::group_sum(
        sales.iter().filter_map(|sale| Some((sale.date()?, sale.total()))),
        |(date, _)| *date,
        |(_, total)| *total,
    );
    daily.sort_by_key();
    daily
}

/// The day with the highest revenue, the earliest one on a tie
pub fn best_day(sales: &[SaleRecord]) -> Option<DayRevenue> {
    let daily = daily_revenue(sales);

    aggregate::max_by_value(&daily)
        .ok()
        .map(|(&date, &revenue)| DayRevenue { date, revenue })
}

pub fn revenue_by_category(sales: &[SaleRecord]) -> Grouped<String, Option<Amount>> {
    aggregate::group_sum(sales, |sale| sale.category().to_owned(), |sale| sale.total())
}

pub fn revenue_by_payment_method(sales: &[SaleRecord]) -> Grouped<String, Option<Amount>> {
    aggregate::group_sum(sales, |sale| sale.payment_method().to_owned(), |sale| sale.total())
}

pub fn quantity_by_product(sales: &[SaleRecord]) -> Grouped<String, Option<u64>> {
    aggregate::group_sum(
        sales,
        |sale| sale.product().to_owned(),
        |sale| sale.quantity().map(u64::from),
    )
}

/// The product sold most often by units, the first seen one on a tie
pub fn top_product_by_quantity(sales: &[SaleRecord]) -> Option<ProductQuantity> {
    let quantities = quantity_by_product(sales);

    aggregate::max_by_value(&quantities)
        .ok()
        .map(|(product, &quantity)| ProductQuantity { product: product.clone(), quantity })
}

/// The figures of every employee, in first-seen order
pub fn employee_stats(sales: &[SaleRecord]) -> Vec<EmployeeStats> {
    let revenue = aggregate::group_sum(sales, |sale| sale.employee().to_owned(), |sale| sale.total());
    let transactions = aggregate::group_count(sales, |sale| sale.employee().to_owned());

    revenue
        .entries()
        .iter()
        .map(|(employee, revenue)| {
            let transactions = transactions.get(employee).copied().unwrap_or_default();
            EmployeeStats {
                employee: employee.clone(),
                revenue: *revenue,
                transactions,
                average_ticket: amount::average(*revenue, transactions),
            }
        })
        .collect()
}

/// The `n` employees with the highest revenue
pub fn top_employees_by_revenue(stats: &[EmployeeStats], n: usize) -> Vec<&EmployeeStats> {
    aggregate::top_n(stats, |a, b| a.revenue.cmp(&b.revenue), n)
}

/// The `n` employees with the most transactions
pub fn top_employees_by_transactions(stats: &[EmployeeStats], n: usize) -> Vec<&EmployeeStats> {
    aggregate::top_n(stats, |a, b| a.transactions.cmp(&b.transactions), n)
}

/// The `n` items with the highest margin, items without one rank last
pub fn top_margins(inventory: &[InventoryItem], n: usize) -> Vec<&InventoryItem> {
    aggregate::top_n(inventory, |a, b| a.margin().rank(b.margin()), n)
}

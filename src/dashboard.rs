use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::aggregate::{self, Grouped, StockAlert};
use crate::amount::Amount;
use crate::filter::{self, FilterCriteria};
use crate::inventory::{self, InventoryItem};
use crate::kpi::{self, EmployeeStats, Kpis};
use crate::sale::{self, SaleRecord};
use crate::table::{self, TableError};

/// Possible errors to occur while loading the datasets
///
/// Any of these leaves the dashboard without data, nothing is shown partially.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Failed to read {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse the {name} table")]
    Table {
        name: &'static str,
        #[source]
        source: TableError,
    },
    #[error("Loading the {0} table was aborted")]
    Aborted(&'static str),
}

/// How many entries the rankings of a view hold
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ViewOptions {
    /// The number of employees shown with their figures
    pub top_employees: usize,
    /// The number of items in the margin chart
    pub margin_chart: usize,
    /// The number of items in the margin table
    pub margin_table: usize,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            top_employees: 10,
            margin_chart: 15,
            margin_table: 10,
        }
    }
}

/// The datasets of one dashboard session
///
/// Both datasets are read once and never change afterwards. Every view is
/// computed from scratch out of them.
#[derive(Clone, Debug, Default)]
pub struct Dashboard {
    sales: Vec<SaleRecord>,
    inventory: Vec<InventoryItem>,
}

impl Dashboard {
    /// Creates a session from already normalized data
    ///
    /// Sales are expected in date order, see [`sale::normalize_sales`].
    pub fn new(sales: Vec<SaleRecord>, inventory: Vec<InventoryItem>) -> Self {
        Self { sales, inventory }
    }

    /// Parses and normalizes both tables
    pub fn from_text(sales: &str, inventory: &str, delimiter: u8) -> Result<Self, LoadError> {
        let sales = table::parse_table(sales, delimiter)
            .map_err(|source| LoadError::Table { name: "sales", source })?;
        let inventory = table::parse_table(inventory, delimiter)
            .map_err(|source| LoadError::Table { name: "inventory", source })?;

        let dashboard = Self::new(
            sale::normalize_sales(&sales),
            inventory::normalize_inventory(&inventory),
        );
        info!(
            sales = dashboard.sales.len(),
            inventory = dashboard.inventory.len(),
            "Datasets loaded"
        );
        Ok(dashboard)
    }

    /// Reads both files and creates a session out of them
    ///
    /// The files are read concurrently. Processing only starts once both of
    /// them are available, the first failure is returned otherwise.
    pub fn load(sales_path: &Path, inventory_path: &Path, delimiter: u8) -> Result<Self, LoadError> {
        let (sales, inventory) = std::thread::scope(|scope| {
            let sales = scope.spawn(|| read_source(sales_path));
            let inventory = scope.spawn(|| read_source(inventory_path));
            (sales.join(), inventory.join())
        });

        let sales = sales.map_err(|_| LoadError::Aborted("sales"))??;
        let inventory = inventory.map_err(|_| LoadError::Aborted("inventory"))??;

        Self::from_text(&sales, &inventory, delimiter)
    }

    /// All sales in date order
    pub fn sales(&self) -> &[SaleRecord] {
        &self.sales
    }

    pub fn inventory(&self) -> &[InventoryItem] {
        &self.inventory
    }

    /// The distinct sale categories, in first-seen order
    pub fn categories(&self) -> Vec<&str> {
        distinct(&self.sales, SaleRecord::category)
    }

    /// The distinct employees, in first-seen order
    pub fn employees(&self) -> Vec<&str> {
        distinct(&self.sales, SaleRecord::employee)
    }

    /// Computes everything shown on the dashboard for the selected filters
    ///
    /// Sales figures follow the filters, inventory figures always cover the
    /// whole inventory.
    pub fn view(&self, criteria: &FilterCriteria, today: NaiveDate, options: &ViewOptions) -> DashboardView<'_> {
        let sales = filter::apply_filters(&self.sales, criteria, today);
        debug!(filtered = sales.len(), total = self.sales.len(), "Recomputing view");

        DashboardView {
            criteria: criteria.clone(),
            total_records: self.sales.len(),
            kpis: Kpis::compute(&sales, &self.inventory),
            daily_revenue: kpi::daily_revenue(&sales),
            revenue_by_category: kpi::revenue_by_category(&sales),
            revenue_by_payment_method: kpi::revenue_by_payment_method(&sales),
            employees: kpi::employee_stats(&sales),
            margin_chart: kpi::top_margins(&self.inventory, options.margin_chart),
            margin_table: kpi::top_margins(&self.inventory, options.margin_table),
            alerts: aggregate::low_stock_alerts(&self.inventory),
            options: *options,
            sales,
        }
    }
}

/// The figures of the dashboard for one set of filters
#[derive(Clone, Debug)]
pub struct DashboardView<'a> {
    pub criteria: FilterCriteria,
    pub options: ViewOptions,
    /// The sales matching the filters
    pub sales: Vec<SaleRecord>,
    /// The number of sales before filtering
    pub total_records: usize,
    pub kpis: Kpis,
    pub daily_revenue: Grouped<NaiveDate, Option<Amount>>,
    pub revenue_by_category: Grouped<String, Option<Amount>>,
    pub revenue_by_payment_method: Grouped<String, Option<Amount>>,
    pub employees: Vec<EmployeeStats>,
    pub margin_chart: Vec<&'a InventoryItem>,
    pub margin_table: Vec<&'a InventoryItem>,
    pub alerts: Vec<StockAlert<'a>>,
}

impl DashboardView<'_> {
    /// Whether the filters removed any sale
    pub fn is_filtered(&self) -> bool {
        !self.criteria.is_empty() && self.sales.len() != self.total_records
    }

    /// The employees with the highest revenue
    pub fn top_employees(&self) -> Vec<&EmployeeStats> {
        kpi::top_employees_by_revenue(&self.employees, self.options.top_employees)
    }
}

fn read_source(path: &Path) -> Result<String, LoadError> {
    debug!(path = %path.display(), "Reading source");
    std::fs::read_to_string(path).map_err(|source| LoadError::Read {
        path: path.to_owned(),
        source,
    })
}

fn distinct<'a>(sales: &'a [SaleRecord], key_fn: fn(&SaleRecord) -> &str) -> Vec<&'a str> {
    aggregate::group_count(sales, |sale| key_fn(*sale))
        .keys()
        .copied()
        .collect()
}

pub use self::{
    aggregate::{AggregateError, Grouped, StockAlert},
    amount::Amount,
    dashboard::{Dashboard, DashboardView, LoadError, ViewOptions},
    filter::{apply_filters, FilterCriteria, FilterError, Period},
    inventory::{AlertLevel, InventoryItem, Margin},
    kpi::{DayRevenue, EmployeeStats, Kpis, ProductQuantity},
    report::Report,
    sale::SaleRecord,
    table::{parse_table, RawRecord, Table, TableError},
};

pub mod aggregate;
pub mod amount;
pub mod dashboard;
pub mod filter;
pub mod inventory;
pub mod kpi;
pub mod report;
pub mod sale;
pub mod table;

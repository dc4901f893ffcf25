use std::fmt;
use std::hash::Hash;

use chrono::NaiveDate;
use serde::Serialize;

use crate::aggregate::Grouped;
use crate::amount::{self, Amount};
use crate::dashboard::{Dashboard, DashboardView};
use crate::inventory::{AlertLevel, InventoryItem, Margin};
use crate::kpi::{self, Kpis};

/// Chart labels longer than this are cut off
const MAX_LABEL_CHARS: usize = 15;

/// The way a chart is drawn
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Line,
    Bar,
    Doughnut,
}

/// One data series, ready to be handed to a charting library
///
/// A poisoned value is `None`, which serializes as `null`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Chart {
    pub id: &'static str,
    pub title: &'static str,
    pub kind: ChartKind,
    pub labels: Vec<String>,
    pub values: Vec<Option<f64>>,
}

impl Chart {
    fn new(
        id: &'static str,
        title: &'static str,
        kind: ChartKind,
        points: impl IntoIterator<Item = (String, Option<Amount>)>,
    ) -> Self {
        let (labels, values) = points
            .into_iter()
            .map(|(label, value)| (label, amount::to_f64(value)))
            .unzip();

        Self { id, title, kind, labels, values }
    }

    fn from_grouped<K>(
        id: &'static str,
        title: &'static str,
        kind: ChartKind,
        grouped: &Grouped<K, Option<Amount>>,
        label: impl Fn(&K) -> String,
    ) -> Self
        where K: Eq + Hash + Clone
    {
        let points = grouped
            .entries()
            .iter()
            .map(|(key, value)| (label(key), *value));

        Self::new(id, title, kind, points)
    }
}

/// The text of the headline cards
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct KpiCards {
    pub total_revenue: String,
    pub transactions: usize,
    pub average_ticket: String,
    pub average_margin: String,
    pub low_stock_alerts: usize,
    pub best_day: String,
    pub top_product: String,
}

impl KpiCards {
    fn new(kpis: &Kpis) -> Self {
        Self {
            total_revenue: money(kpis.total_revenue),
            transactions: kpis.transaction_count,
            average_ticket: money(kpis.average_ticket),
            average_margin: percent(kpis.average_margin),
            low_stock_alerts: kpis.low_stock_count,
            best_day: kpis.best_day.as_ref().map_or_else(
                || NO_DATA.to_owned(),
                |day| format!("{}: {}", day.date, money(day.revenue)),
            ),
            top_product: kpis.top_product.as_ref().map_or_else(
                || NO_DATA.to_owned(),
                |top| match top.quantity {
                    Some(quantity) => format!("{} ({} units)", top.product, quantity),
                    None => format!("{} (NaN units)", top.product),
                },
            ),
        }
    }
}

const NO_DATA: &str = "No data";

/// How profitable an item is
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MarginTier {
    /// More than 50 %
    High,
    /// More than 30 %
    Medium,
    Low,
}

impl MarginTier {
    pub fn of(margin: Margin) -> Self {
        match margin.percent() {
            Some(percent) if percent > Amount::from_num(50) => MarginTier::High,
            Some(percent) if percent > Amount::from_num(30) => MarginTier::Medium,
            _ => MarginTier::Low,
        }
    }
}

/// A row of the margin table
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MarginRow {
    pub product: String,
    pub category: String,
    pub purchase_price: Option<f64>,
    pub sale_price: Option<f64>,
    pub unit_profit: Option<f64>,
    pub margin_percent: Option<f64>,
    pub tier: MarginTier,
}

impl MarginRow {
    fn new(item: &InventoryItem) -> Self {
        Self {
            product: item.product().to_owned(),
            category: item.category().to_owned(),
            purchase_price: amount::to_f64(item.purchase_price()),
            sale_price: amount::to_f64(item.sale_price()),
            unit_profit: amount::to_f64(item.unit_profit()),
            margin_percent: amount::to_f64(item.margin().percent()),
            tier: MarginTier::of(item.margin()),
        }
    }
}

/// A card of the inventory alerts panel
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AlertCard {
    pub product: String,
    pub category: String,
    pub current_stock: Option<u32>,
    pub min_stock: Option<u32>,
    pub level: AlertLevel,
}

/// The figures of one employee
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EmployeeCard {
    pub employee: String,
    pub revenue: String,
    pub transactions: usize,
    pub average_ticket: String,
}

/// The choices offered by the category and employee filters
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    pub categories: Vec<String>,
    pub employees: Vec<String>,
}

/// Everything the dashboard page displays
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Report {
    pub kpis: KpiCards,
    pub charts: Vec<Chart>,
    pub margin_table: Vec<MarginRow>,
    pub alerts: Vec<AlertCard>,
    pub employees: Vec<EmployeeCard>,
    pub top_employee_by_revenue: Option<String>,
    pub top_employee_by_transactions: Option<String>,
    /// Set when the filters hide some of the sales
    pub filter_indicator: Option<String>,
    pub filter_options: FilterOptions,
}

impl Report {
    /// Maps a computed view onto display values
    pub fn new(dashboard: &Dashboard, view: &DashboardView<'_>) -> Self {
        let margins = view.margin_chart
            .iter()
            .map(|item| (truncate_label(item.product()), item.margin().percent()));
        let employees = view.employees
            .iter()
            .map(|stats| (stats.employee.clone(), stats.revenue));

        let charts = vec![
            Chart::from_grouped("sales-trend", "Daily sales", ChartKind::Line, &view.daily_revenue, day_label),
            Chart::from_grouped("categories", "Sales by category", ChartKind::Bar, &view.revenue_by_category, String::clone),
            Chart::from_grouped("categories-share", "Category share", ChartKind::Doughnut, &view.revenue_by_category, String::clone),
            Chart::new("margins", "Profit margin (%)", ChartKind::Bar, margins),
            Chart::new("employees", "Sales by employee", ChartKind::Bar, employees),
            Chart::from_grouped("payment-methods", "Sales by payment method", ChartKind::Doughnut, &view.revenue_by_payment_method, String::clone),
        ];

        Self {
            kpis: KpiCards::new(&view.kpis),
            charts,
            margin_table: view.margin_table.iter().map(|item| MarginRow::new(item)).collect(),
            alerts: view.alerts
                .iter()
                .map(|alert| AlertCard {
                    product: alert.item.product().to_owned(),
                    category: alert.item.category().to_owned(),
                    current_stock: alert.item.current_stock(),
                    min_stock: alert.item.min_stock(),
                    level: alert.level,
                })
                .collect(),
            employees: view.top_employees()
                .into_iter()
                .map(|stats| EmployeeCard {
                    employee: stats.employee.clone(),
                    revenue: money(stats.revenue),
                    transactions: stats.transactions,
                    average_ticket: money(stats.average_ticket),
                })
                .collect(),
            top_employee_by_revenue: kpi::top_employees_by_revenue(&view.employees, 1)
                .first()
                .map(|stats| stats.employee.clone()),
            top_employee_by_transactions: kpi::top_employees_by_transactions(&view.employees, 1)
                .first()
                .map(|stats| stats.employee.clone()),
            filter_indicator: view.is_filtered().then(|| {
                format!("Showing {} of {} records", view.sales.len(), view.total_records)
            }),
            filter_options: FilterOptions {
                categories: dashboard.categories().into_iter().map(str::to_owned).collect(),
                employees: dashboard.employees().into_iter().map(str::to_owned).collect(),
            },
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(indicator) = &self.filter_indicator {
            writeln!(f, "{}\n", indicator)?;
        }

        writeln!(f, "Total revenue       {}", self.kpis.total_revenue)?;
        writeln!(f, "Transactions        {}", self.kpis.transactions)?;
        writeln!(f, "Average ticket      {}", self.kpis.average_ticket)?;
        writeln!(f, "Average margin      {}", self.kpis.average_margin)?;
        writeln!(f, "Low stock alerts    {}", self.kpis.low_stock_alerts)?;
        writeln!(f, "Best day            {}", self.kpis.best_day)?;
        writeln!(f, "Top product         {}", self.kpis.top_product)?;

        for chart in &self.charts {
            writeln!(f, "\n{}", chart.title)?;
            for (label, value) in chart.labels.iter().zip(&chart.values) {
                match value {
                    Some(value) => writeln!(f, "  {:<20} {:>12.2}", label, value)?,
                    None => writeln!(f, "  {:<20} {:>12}", label, "NaN")?,
                }
            }
        }

        writeln!(f, "\nEmployees")?;
        for employee in &self.employees {
            writeln!(
                f,
                "  {:<20} {:>12} {:>6} sales, {} average",
                employee.employee, employee.revenue, employee.transactions, employee.average_ticket,
            )?;
        }

        writeln!(f, "\nMargins")?;
        for row in &self.margin_table {
            writeln!(
                f,
                "  {:<30} {:>10} {:>10} {:>10} {:>8} {:?}",
                row.product,
                float(row.purchase_price, "$", ""),
                float(row.sale_price, "$", ""),
                float(row.unit_profit, "$", ""),
                float(row.margin_percent, "", "%"),
                row.tier,
            )?;
        }

        writeln!(f, "\nInventory alerts")?;
        if self.alerts.is_empty() {
            writeln!(f, "  All products have adequate stock")?;
        }
        for alert in &self.alerts {
            writeln!(
                f,
                "  [{:?}] {} ({}): stock {} (minimum {})",
                alert.level,
                alert.product,
                alert.category,
                count(alert.current_stock),
                count(alert.min_stock),
            )?;
        }

        Ok(())
    }
}

fn money(amount: Option<Amount>) -> String {
    float(amount::to_f64(amount), "$", "")
}

fn percent(amount: Option<Amount>) -> String {
    match amount::to_f64(amount) {
        Some(value) => format!("{:.1}%", value),
        None => "NaN".to_owned(),
    }
}

fn float(value: Option<f64>, prefix: &str, suffix: &str) -> String {
    match value {
        Some(value) => format!("{}{:.2}{}", prefix, value, suffix),
        None => "NaN".to_owned(),
    }
}

fn count(value: Option<u32>) -> String {
    value.map_or_else(|| "NaN".to_owned(), |value| value.to_string())
}

fn day_label(date: &NaiveDate) -> String {
    date.format("%d %b").to_string()
}

fn truncate_label(label: &str) -> String {
    match label.char_indices().nth(MAX_LABEL_CHARS) {
        Some((end, _)) => format!("{}...", &label[..end]),
        None => label.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::ViewOptions;
    use crate::filter::FilterCriteria;

    const SALES: &str = r#"
        fecha,      producto, categoria, cantidad, total, vendedor, metodo_pago
        2024-07-01, Lapiz,    Escritura,        2,   100,    Maria, Efectivo
        2024-07-02, Cuaderno, Papel,            1,    50,   Carlos, Tarjeta
    "#;

    const INVENTORY: &str = r#"
        producto,                   categoria, precio_compra, precio_venta, stock_actual, stock_minimo
        Lapiz,                      Escritura,            10,           15,            0,            5
        Cuaderno profesional rayado, Papel,               10,           20,            9,            5
        Pluma,                      Escritura,            10,           12,            3,            5
    "#;

    fn report(criteria: &FilterCriteria) -> Report {
        let dashboard = Dashboard::from_text(SALES, INVENTORY, b',').unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 7, 2).unwrap();
        let view = dashboard.view(criteria, today, &ViewOptions::default());
        Report::new(&dashboard, &view)
    }

    fn chart<'a>(report: &'a Report, id: &str) -> &'a Chart {
        report.charts.iter().find(|chart| chart.id == id).unwrap()
    }

    #[test]
    fn kpi_cards() {
        let report = report(&FilterCriteria::default());

        assert_eq!(report.kpis, KpiCards {
            total_revenue: "$150.00".to_owned(),
            transactions: 2,
            average_ticket: "$75.00".to_owned(),
            average_margin: "56.7%".to_owned(),
            low_stock_alerts: 2,
            best_day: "2024-07-01: $100.00".to_owned(),
            top_product: "Lapiz (2 units)".to_owned(),
        });
    }

    #[test]
    fn charts() {
        let report = report(&FilterCriteria::default());

        let trend = chart(&report, "sales-trend");
        assert_eq!(trend.kind, ChartKind::Line);
        assert_eq!(trend.labels, ["01 Jul", "02 Jul"]);
        assert_eq!(trend.values, [Some(100.0), Some(50.0)]);

        let margins = chart(&report, "margins");
        assert_eq!(margins.labels, ["Cuaderno profes...", "Lapiz", "Pluma"]);
        assert_eq!(margins.values, [Some(100.0), Some(50.0), Some(20.0)]);

        assert_eq!(chart(&report, "employees").labels, ["Maria", "Carlos"]);
        assert_eq!(chart(&report, "payment-methods").values, [Some(100.0), Some(50.0)]);
    }

    #[test]
    fn margin_table_and_alerts() {
        let report = report(&FilterCriteria::default());

        let tiers = report.margin_table.iter().map(|row| row.tier).collect::<Vec<_>>();
        assert_eq!(tiers, [MarginTier::High, MarginTier::Medium, MarginTier::Low]);
        assert_eq!(report.margin_table[1].unit_profit, Some(5.0));

        let alerts = report.alerts
            .iter()
            .map(|alert| (alert.product.as_str(), alert.level))
            .collect::<Vec<_>>();
        assert_eq!(alerts, [("Lapiz", AlertLevel::Critical), ("Pluma", AlertLevel::Warning)]);
    }

    #[test]
    fn filter_indicator() {
        assert_eq!(report(&FilterCriteria::default()).filter_indicator, None);

        let criteria = FilterCriteria::from_options("all", "Papel", "all").unwrap();
        let report = report(&criteria);
        assert_eq!(report.filter_indicator.as_deref(), Some("Showing 1 of 2 records"));
        assert_eq!(report.kpis.best_day, "2024-07-02: $50.00");
        assert_eq!(report.filter_options.categories, ["Escritura", "Papel"]);
    }

    #[test]
    fn empty_selection() {
        let criteria = FilterCriteria::from_options("all", "Juguetes", "all").unwrap();
        let report = report(&criteria);

        assert_eq!(report.kpis.average_ticket, "$0.00");
        assert_eq!(report.kpis.best_day, "No data");
        assert_eq!(report.kpis.top_product, "No data");
        assert_eq!(report.top_employee_by_revenue, None);
        assert!(report.charts.iter().filter(|chart| chart.id != "margins").all(|chart| chart.values.is_empty()));
    }

    #[test]
    fn employee_insights() {
        let report = report(&FilterCriteria::default());

        assert_eq!(report.top_employee_by_revenue.as_deref(), Some("Maria"));
        assert_eq!(report.top_employee_by_transactions.as_deref(), Some("Maria"));
        assert_eq!(report.employees[1].average_ticket, "$50.00");
    }

    #[test]
    fn margin_tiers() {
        assert_eq!(MarginTier::of(Margin::Percent(Amount::from_num(51))), MarginTier::High);
        assert_eq!(MarginTier::of(Margin::Percent(Amount::from_num(50))), MarginTier::Medium);
        assert_eq!(MarginTier::of(Margin::Percent(Amount::from_num(30))), MarginTier::Low);
        assert_eq!(MarginTier::of(Margin::Undefined), MarginTier::Low);
    }

    #[test]
    fn labels() {
        assert_eq!(truncate_label("Lapiz"), "Lapiz");
        assert_eq!(truncate_label("exactly 15 char"), "exactly 15 char");
        assert_eq!(truncate_label("Cuaderno profesional"), "Cuaderno profes...");
    }

    #[test]
    fn text_output() {
        let text = report(&FilterCriteria::default()).to_string();

        assert!(text.contains("Total revenue       $150.00"));
        assert!(text.contains("[Critical] Lapiz (Escritura): stock 0 (minimum 5)"));
    }
}

use std::io::Write;
use std::str::FromStr;

use chrono::NaiveDate;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use sales_dashboard::{Dashboard, FilterCriteria, Report, ViewOptions};

/// A cli interface to the sales and inventory dashboard
#[derive(Debug, Parser)]
#[clap(version)]
struct Args {
    /// The path to the sales CSV file
    sales: std::path::PathBuf,
    /// The path to the inventory CSV file
    inventory: std::path::PathBuf,
    /// Only include sales of the last N days, or `all`
    #[clap(long, default_value = "all")]
    period: String,
    /// Only include sales of this category, or `all`
    #[clap(long, default_value = "all")]
    category: String,
    /// Only include sales of this employee, or `all`
    #[clap(long, default_value = "all")]
    employee: String,
    /// The number of employees listed with their figures
    #[clap(long, default_value_t = 10)]
    top: usize,
    /// The number of items in the margin chart
    #[clap(long, default_value_t = 15)]
    margin_chart: usize,
    /// The number of items in the margin table
    #[clap(long, default_value_t = 10)]
    margin_table: usize,
    /// The field delimiter of both files
    #[clap(long, default_value_t = ',')]
    delimiter: char,
    /// The day the period filter counts back from, defaults to today
    #[clap(long)]
    today: Option<NaiveDate>,
    /// The output format, `text` or `json`
    #[clap(long, default_value = "text")]
    format: Format,
    /// Log debug output
    #[clap(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug)]
enum Format {
    Text,
    Json,
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Format::Text),
            "json" => Ok(Format::Json),
            other => Err(format!("unknown format `{}`, expected `text` or `json`", other)),
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let criteria = FilterCriteria::from_options(&args.period, &args.category, &args.employee)?;
    let delimiter = delimiter_byte(args.delimiter)?;
    let options = ViewOptions {
        top_employees: args.top,
        margin_chart: args.margin_chart,
        margin_table: args.margin_table,
    };
    let today = args.today.unwrap_or_else(|| chrono::Local::now().date_naive());

    // a failed load leaves nothing to show, so no partial report is written
    let dashboard = Dashboard::load(&args.sales, &args.inventory, delimiter)
        .map_err(|err| {
            error!(%err, "Failed to load the dashboard data");
            err
        })?;

    let view = dashboard.view(&criteria, today, &options);
    let report = Report::new(&dashboard, &view);
    info!(shown = view.sales.len(), total = view.total_records, "Report ready");

    let stdout = std::io::stdout();
    let mut stdout = stdout.lock();
    match args.format {
        Format::Text => write!(stdout, "{}", report)?,
        Format::Json => {
            serde_json::to_writer_pretty(&mut stdout, &report)?;
            writeln!(stdout)?;
        }
    }

    Ok(())
}

/// The files are split bytewise, so only ascii delimiters can ever match
fn delimiter_byte(delimiter: char) -> anyhow::Result<u8> {
    match delimiter.is_ascii() {
        true => Ok(delimiter as u8),
        false => anyhow::bail!("the delimiter `{}` is not an ascii character", delimiter),
    }
}

/// Logs go to stderr, `RUST_LOG` overrides the default level
fn init_tracing(verbose: bool) {
    let default = match verbose {
        true => "sales_dashboard=debug",
        false => "sales_dashboard=info",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_delimiters() {
        assert_eq!(delimiter_byte(',').unwrap(), b',');
        assert_eq!(delimiter_byte(';').unwrap(), b';');
        assert_eq!(delimiter_byte('\t').unwrap(), b'\t');
    }

    #[test]
    fn non_ascii_delimiters_are_rejected() {
        assert!(delimiter_byte('é').is_err());
        assert!(delimiter_byte('¦').is_err());
        assert!(delimiter_byte('→').is_err());
    }
}

use std::num::NonZeroU32;
use std::str::FromStr;

use chrono::{Days, NaiveDate};
use tracing::debug;

use crate::sale::SaleRecord;

/// Possible errors to occur while reading filter options
#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    #[error("Invalid period `{0}`, expected `all` or a positive number of days")]
    InvalidPeriod(String),
}

/// The time window sales are restricted to
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Period {
    /// No restriction
    #[default]
    All,
    /// Only sales of the last `n` days
    LastDays(NonZeroU32),
}

impl Period {
    /// The earliest date inside the window, as seen from `today`
    pub fn cutoff(self, today: NaiveDate) -> Option<NaiveDate> {
        match self {
            Period::All => None,
            Period::LastDays(days) => Some(
                today
                    .checked_sub_days(Days::new(days.get().into()))
                    .unwrap_or(NaiveDate::MIN),
            ),
        }
    }
}

impl FromStr for Period {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if is_all(s) {
            return Ok(Period::All);
        }

        s.trim()
            .parse()
            .map(Period::LastDays)
            .map_err(|_| FilterError::InvalidPeriod(s.to_owned()))
    }
}

/// The filters currently selected by the user
///
/// A criterion that is not set places no restriction on its dimension. It
/// never means "match the empty string".
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub period: Period,
    pub category: Option<String>,
    pub employee: Option<String>,
}

impl FilterCriteria {
    /// Reads the criteria from the values of the filter controls
    ///
    /// Every control accepts `all` (or an empty value) to disable it.
    pub fn from_options(period: &str, category: &str, employee: &str) -> Result<Self, FilterError> {
        Ok(Self {
            period: period.parse()?,
            category: exact(category),
            employee: exact(employee),
        })
    }

    /// Whether no criterion is set
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Keeps the sales matching every criterion that is set
///
/// `today` anchors the period window for the whole pass. Sales with an
/// invalid date never match an active period. The input is left untouched,
/// and without any criteria the result equals the input.
pub fn apply_filters(sales: &[SaleRecord], criteria: &FilterCriteria, today: NaiveDate) -> Vec<SaleRecord> {
    let cutoff = criteria.period.cutoff(today);

    let filtered = sales
        .iter()
        .filter(|sale| match cutoff {
            Some(cutoff) => sale.date().map_or(false, |date| date >= cutoff),
            None => true,
        })
        .filter(|sale| matches_exact(&criteria.category, sale.category()))
        .filter(|sale| matches_exact(&criteria.employee, sale.employee()))
        .cloned()
        .collect::<Vec<_>>();

    debug!(kept = filtered.len(), of = sales.len(), ?criteria, "Applied filters");
    filtered
}

fn matches_exact(criterion: &Option<String>, value: &str) -> bool {
    criterion.as_deref().map_or(true, |criterion| criterion == value)
}

// the spanish `todos` / `todas` control values are accepted as well
fn is_all(value: &str) -> bool {
    let value = value.trim();
    value.is_empty()
        || value.eq_ignore_ascii_case("all")
        || value == "todos"
        || value == "todas"
}

fn exact(value: &str) -> Option<String> {
    (!is_all(value)).then(|| value.trim().to_owned())
}

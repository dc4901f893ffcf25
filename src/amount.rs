use fixed::types::I64F64;

/// A decimal value used for money and percentages
///
/// A missing or malformed numeric field is represented as `None` wherever an
/// amount is read from the source data. [`sum`] yields `None` as soon as a
/// single value is missing or the total overflows, so a bad field poisons every
/// aggregate it takes part in instead of being skipped.
pub type Amount = I64F64;

/// Parses a decimal field, using a period as the decimal separator
///
/// The whole trimmed field has to be a number, partial matches like `12abc`
/// are rejected.
pub fn parse_amount(field: Option<&str>) -> Option<Amount> {
    field?.trim().parse().ok()
}

/// Parses a non-negative integer field
pub fn parse_count(field: Option<&str>) -> Option<u32> {
    field?.trim().parse().ok()
}

/// Adds up amounts, `None` if a value is missing or the sum overflows
pub fn sum(values: impl IntoIterator<Item = Option<Amount>>) -> Option<Amount> {
    values
        .into_iter()
        .try_fold(Amount::ZERO, |sum, value| sum.checked_add(value?))
}

/// Converts an amount into a float for display and chart data
pub fn to_f64(amount: Option<Amount>) -> Option<f64> {
    amount.map(|amount| amount.to_num())
}

/// Divides `total` evenly across `count` entries
///
/// An empty set yields zero rather than failing, a poisoned total stays poisoned.
pub fn average(total: Option<Amount>, count: usize) -> Option<Amount> {
    match count {
        0 => Some(Amount::ZERO),
        count => total?.checked_div(Amount::from_num(count)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_period_decimals() {
        assert_eq!(parse_amount(Some(" 12.5 ")), Some(Amount::from_num(12.5)));
        assert_eq!(parse_amount(Some("3")), Some(Amount::from_num(3)));
    }

    #[test]
    fn rejects_malformed_numbers() {
        assert_eq!(parse_amount(Some("12,5")), None);
        assert_eq!(parse_amount(Some("12abc")), None);
        assert_eq!(parse_amount(Some("")), None);
        assert_eq!(parse_amount(None), None);
        assert_eq!(parse_count(Some("-1")), None);
        assert_eq!(parse_count(Some("2.5")), None);
        assert_eq!(parse_count(Some("7")), Some(7));
    }

    #[test]
    fn missing_value_poisons_sum() {
        let values = [Some(Amount::from_num(1)), None, Some(Amount::from_num(2))];
        assert_eq!(sum(values), None);

        let values = [Some(Amount::from_num(1)), Some(Amount::from_num(2))];
        assert_eq!(sum(values), Some(Amount::from_num(3)));
        assert_eq!(sum(Vec::new()), Some(Amount::ZERO));
    }

    #[test]
    fn overflow_poisons_sum() {
        let huge = parse_amount(Some("5000000000000000000"));

        assert!(huge.is_some());
        assert_eq!(sum([huge, huge]), None);
    }

    #[test]
    fn average_of_nothing_is_zero() {
        assert_eq!(average(Some(Amount::ZERO), 0), Some(Amount::ZERO));
        assert_eq!(average(None, 0), Some(Amount::ZERO));
        assert_eq!(average(Some(Amount::from_num(150)), 2), Some(Amount::from_num(75)));
        assert_eq!(average(None, 2), None);
    }
}

//! Utility functions for formatting and common operations
//!
//! This module provides centralized formatting utilities for consistent
//! display of currency values, plus the business-day helpers used by the
//! exchange-rate lookup.

use chrono::{Datelike, Days, NaiveDate, Weekday};
use rust_decimal::Decimal;

/// Currency symbol options for formatting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurrencySymbol {
    /// Include the " zł" suffix
    Pln,
    /// No currency symbol (for table cells)
    None,
}

/// Core formatting function with full control over output.
///
/// Formats a Decimal value using Polish locale conventions:
/// - Thousands separator: ` ` (space)
/// - Decimal separator: `,` (comma)
///
/// # Examples
/// ```
/// use pit38::utils::{format_pln_with_width, CurrencySymbol};
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// let value = Decimal::from_str("1234.56").unwrap();
/// assert_eq!(
///     format_pln_with_width(value, 0, CurrencySymbol::Pln),
///     "1 234,56 zł"
/// );
/// ```
pub fn format_pln_with_width(value: Decimal, width: usize, symbol: CurrencySymbol) -> String {
    let is_negative = value < Decimal::ZERO;
    let abs_value = value.abs();

    // Round to 2 decimal places and format
    let formatted = format!("{:.2}", abs_value);
    let parts: Vec<&str> = formatted.split('.').collect();

    let integer_part = parts[0];
    let decimal_part = parts.get(1).unwrap_or(&"00");

    // Add thousands separators (spaces) to the integer part
    let with_separators: String = integer_part
        .chars()
        .rev()
        .enumerate()
        .flat_map(|(i, c)| {
            if i > 0 && i % 3 == 0 {
                vec![' ', c]
            } else {
                vec![c]
            }
        })
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();

    let sign = if is_negative { "-" } else { "" };
    let suffix = match symbol {
        CurrencySymbol::Pln => " zł",
        CurrencySymbol::None => "",
    };

    let result = format!("{}{},{}{}", sign, with_separators, decimal_part, suffix);

    // Apply width padding (right-align)
    if width > 0 && result.len() < width {
        format!("{:>width$}", result, width = width)
    } else {
        result
    }
}

/// Format as Polish złoty with symbol: "1 234,56 zł"
pub fn format_pln(value: Decimal) -> String {
    format_pln_with_width(value, 0, CurrencySymbol::Pln)
}

/// Format number only (no symbol): "1 234,56"
pub fn format_decimal_pl(value: Decimal) -> String {
    format_pln_with_width(value, 0, CurrencySymbol::None)
}

/// Whether the date falls on a weekday. NBP publishes rates on business
/// days only; public holidays are handled by walking further back.
pub fn is_business_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// The last business day strictly before `date`
pub fn previous_business_day(date: NaiveDate) -> NaiveDate {
    let mut day = date - Days::new(1);
    while !is_business_day(day) {
        day = day - Days::new(1);
    }
    day
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_format_pln_basic() {
        assert_eq!(format_pln(dec!(1234.56)), "1 234,56 zł");
        assert_eq!(format_pln(dec!(0.99)), "0,99 zł");
        assert_eq!(format_pln(dec!(1000000)), "1 000 000,00 zł");
    }

    #[test]
    fn test_format_pln_small_values() {
        assert_eq!(format_pln(dec!(0)), "0,00 zł");
        assert_eq!(format_pln(dec!(0.01)), "0,01 zł");
        assert_eq!(format_pln(dec!(999.99)), "999,99 zł");
    }

    #[test]
    fn test_format_pln_negative() {
        assert_eq!(format_pln(dec!(-1234.56)), "-1 234,56 zł");
        assert_eq!(format_pln(dec!(-0.01)), "-0,01 zł");
    }

    #[test]
    fn test_format_decimal_pl() {
        assert_eq!(format_decimal_pl(dec!(1234.56)), "1 234,56");
        assert_eq!(format_decimal_pl(dec!(-500)), "-500,00");
    }

    #[test]
    fn test_format_with_width() {
        let result = format_pln_with_width(dec!(100), 15, CurrencySymbol::Pln);
        assert_eq!(result.len(), 15);
        assert!(result.ends_with("100,00 zł"));
    }

    #[test]
    fn test_business_days() {
        // 2021-03-15 is a Monday
        let monday = NaiveDate::from_ymd_opt(2021, 3, 15).unwrap();
        assert!(is_business_day(monday));

        let saturday = NaiveDate::from_ymd_opt(2021, 3, 13).unwrap();
        assert!(!is_business_day(saturday));
    }

    #[test]
    fn test_previous_business_day_skips_weekend() {
        // Monday -> previous Friday
        let monday = NaiveDate::from_ymd_opt(2021, 3, 15).unwrap();
        assert_eq!(
            previous_business_day(monday),
            NaiveDate::from_ymd_opt(2021, 3, 12).unwrap()
        );

        // Wednesday -> Tuesday
        let wednesday = NaiveDate::from_ymd_opt(2021, 3, 17).unwrap();
        assert_eq!(
            previous_business_day(wednesday),
            NaiveDate::from_ymd_opt(2021, 3, 16).unwrap()
        );
    }
}

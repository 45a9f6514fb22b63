//! Utility functions used by httpagg.

use num_format::{Locale, ToFormattedString};

/// Number of decimal places reported statistics are rounded to.
pub const PRECISION: i32 = 2;

/// Round `value` to `places` decimal places.
///
/// # Example
/// ```rust
/// use httpagg::util;
///
/// assert_eq!(util::round(120.456, 2), 120.46);
/// assert_eq!(util::round(99.994, 2), 99.99);
/// assert_eq!(util::round(7.0, 2), 7.0);
/// ```
pub fn round(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Format large number in locale appropriate style.
///
/// # Example
/// ```rust
/// use httpagg::util;
///
/// assert_eq!(util::format_number(1234567), "1,234,567");
/// ```
pub fn format_number(number: usize) -> String {
    number.to_formatted_string(&Locale::en)
}

/// Format a percentile level for display, without a trailing `.0` on whole numbers.
///
/// # Example
/// ```rust
/// use httpagg::util;
///
/// assert_eq!(util::format_level(95.0), "95");
/// assert_eq!(util::format_level(99.99), "99.99");
/// ```
pub fn format_level(level: f64) -> String {
    if level.fract() == 0.0 {
        format!("{:.0}", level)
    } else {
        level.to_string()
    }
}

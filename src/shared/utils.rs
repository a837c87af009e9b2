//! Utility functions and helpers

/// Milliseconds in one minute
pub const MINUTE_MS: i64 = 60 * 1000;

/// Milliseconds in one day
pub const DAY_MS: i64 = 24 * 60 * MINUTE_MS;

/// Format a percentage with two decimals for the outbound payloads
pub fn format_percentage(value: f64) -> String {
    let formatted = format!("{:.2}", value);
    // "-0.00" reads as a move; the wire format never carries a signed zero
    if formatted == "-0.00" {
        "0.00".to_string()
    } else {
        formatted
    }
}

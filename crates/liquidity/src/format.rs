//! Chart label formatting

/// Compact amount with a T/B/M/K suffix and two decimals
pub fn format_coin(value: f64) -> String {
    const UNITS: [(f64, &str); 4] = [(1e12, "T"), (1e9, "B"), (1e6, "M"), (1e3, "K")];

    for (scale, suffix) in UNITS {
        if value >= scale {
            return format!("{:.2}{}", value / scale, suffix);
        }
    }
    format!("{:.2}", value)
}

/// Market cap in USD, e.g. `$1.50M`
pub fn format_mcap(value: f64) -> String {
    format!("${}", format_coin(value))
}

//! Human-readable display helpers for gallery cards

const SIZE_UNITS: [&str; 5] = ["B", "kB", "MB", "GB", "TB"];

/// Decimal byte size with at most two decimals, e.g. `1.5 MB`
pub fn format_size(bytes: i64) -> String {
    let mut value = bytes.max(0) as f64;
    let mut unit = 0;
    while value >= 1000.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1000.0;
        unit += 1;
    }

    let mut text = format!("{:.2}", value);
    // 999.999 kB rounds to 1000, which belongs to the next unit
    if text.parse::<f64>().is_ok_and(|rounded| rounded >= 1000.0) && unit < SIZE_UNITS.len() - 1 {
        value /= 1000.0;
        unit += 1;
        text = format!("{:.2}", value);
    }
    if text.contains('.') {
        text = text.trim_end_matches('0').trim_end_matches('.').to_string();
    }
    format!("{} {}", text, SIZE_UNITS[unit])
}

/// `m:ss` with whole minutes and rounded seconds
pub fn format_duration(seconds: f64) -> String {
    let seconds = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
    let mut minutes = (seconds / 60.0).floor() as u64;
    let mut rest = (seconds % 60.0).round() as u64;
    if rest == 60 {
        minutes += 1;
        rest = 0;
    }
    format!("{}:{:02}", minutes, rest)
}

/// Space saved by compression in whole percent; 0 when the original size is unknown
pub fn compression_percentage(original: i64, compressed: i64) -> i64 {
    if original <= 0 {
        return 0;
    }
    ((1.0 - compressed as f64 / original as f64) * 100.0).round() as i64
}

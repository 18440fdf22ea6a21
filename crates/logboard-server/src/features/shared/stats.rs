//! Statistics helpers
//!
//! Pure math shared by the dashboard queries: percentiles over sorted
//! samples, divide-by-zero-safe percentages and rates, and
//! exception-string parsing.

/// Percentile of a sorted (ascending) sample set.
///
/// Returns the element at index `ceil(n * p) - 1`, clamped into
/// `[0, n - 1]`; an empty slice yields 0.
pub fn percentile(sorted: &[i64], p: f64) -> i64 {
    if sorted.is_empty() {
        return 0;
    }

    let n = sorted.len();
    let rank = (n as f64 * p).ceil() as i64 - 1;
    let index = rank.clamp(0, n as i64 - 1) as usize;
    sorted[index]
}

/// Percentage of `part` in `whole`, rounded to two decimals.
/// Returns 0.0 when `whole` is 0.
pub fn percentage(part: i64, whole: i64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    let raw = part as f64 / whole as f64 * 100.0;
    (raw * 100.0).round() / 100.0
}

/// Events per minute over an elapsed window.
/// The window is clamped to a minimum of one minute.
pub fn per_minute_rate(count: i64, elapsed_minutes: i64) -> f64 {
    let minutes = elapsed_minutes.max(1);
    let raw = count as f64 / minutes as f64;
    (raw * 100.0).round() / 100.0
}

/// Split an exception string into (type, message) on the first `": "`.
///
/// Falls back to the whole first line as the type with an empty message
/// when no separator is present.
pub fn parse_exception(exception: &str) -> (String, String) {
    let line = first_line(exception);
    match line.split_once(": ") {
        Some((kind, message)) => (kind.trim().to_string(), message.trim().to_string()),
        None => (line.trim().to_string(), String::new()),
    }
}

/// Everything before the first newline.
pub fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentile_empty() {
        assert_eq!(percentile(&[], 0.95), 0);
    }

    #[test]
    fn test_percentile_single_element() {
        assert_eq!(percentile(&[42], 0.5), 42);
        assert_eq!(percentile(&[42], 0.99), 42);
    }

    #[test]
    fn test_percentile_index_formula() {
        let sorted: Vec<i64> = (1..=100).collect();
        // ceil(100 * 0.50) - 1 = 49 -> value 50
        assert_eq!(percentile(&sorted, 0.50), 50);
        // ceil(100 * 0.95) - 1 = 94 -> value 95
        assert_eq!(percentile(&sorted, 0.95), 95);
        // ceil(100 * 0.99) - 1 = 98 -> value 99
        assert_eq!(percentile(&sorted, 0.99), 99);
    }

    #[test]
    fn test_percentile_clamps_bounds() {
        let sorted = [10, 20, 30];
        assert_eq!(percentile(&sorted, 0.0), 10);
        assert_eq!(percentile(&sorted, 1.0), 30);
    }

    #[test]
    fn test_percentage_zero_denominator() {
        assert_eq!(percentage(5, 0), 0.0);
    }

    #[test]
    fn test_percentage_rounding() {
        assert_eq!(percentage(1, 3), 33.33);
        assert_eq!(percentage(50, 100), 50.0);
        assert_eq!(percentage(0, 10), 0.0);
    }

    #[test]
    fn test_per_minute_rate_clamps_elapsed() {
        assert_eq!(per_minute_rate(30, 0), 30.0);
        assert_eq!(per_minute_rate(30, -5), 30.0);
        assert_eq!(per_minute_rate(30, 60), 0.5);
    }

    #[test]
    fn test_parse_exception_with_separator() {
        let (kind, message) = parse_exception("IoError: connection refused");
        assert_eq!(kind, "IoError");
        assert_eq!(message, "connection refused");
    }

    #[test]
    fn test_parse_exception_without_separator() {
        let (kind, message) = parse_exception("something went wrong");
        assert_eq!(kind, "something went wrong");
        assert_eq!(message, "");
    }

    #[test]
    fn test_parse_exception_uses_first_line_only() {
        let (kind, message) = parse_exception("TimeoutError: deadline exceeded\n  at handler\n  at router");
        assert_eq!(kind, "TimeoutError");
        assert_eq!(message, "deadline exceeded");
    }

    #[test]
    fn test_first_line() {
        assert_eq!(first_line("a\nb\nc"), "a");
        assert_eq!(first_line("single"), "single");
        assert_eq!(first_line(""), "");
    }
}

/// Round `value` to `decimals` places, ties to even.
///
/// # Examples
///
/// ```
/// use qstats_core::formatting::round_to;
///
/// assert_eq!(round_to(66.666_666, 2), 66.67);
/// assert_eq!(round_to(2.0, 2), 2.0);
/// assert_eq!(round_to(1.125, 2), 1.12);
/// ```
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10_f64.powi(decimals as i32);
    let scaled = value * factor;
    // `f64::round_ties_even` needs 1.77.
    let rounded = if (scaled - scaled.trunc()).abs() == 0.5 {
        2.0 * (scaled / 2.0).round()
    } else {
        scaled.round()
    };
    rounded / factor
}

/// Calculate `(part / whole) * 100`, rounded to `decimal_places`.
///
/// A zero `whole` is treated as 1 so the call never divides by zero.
///
/// # Examples
///
/// ```
/// use qstats_core::formatting::percentage;
///
/// assert!((percentage(1.0, 3.0, 2) - 33.33).abs() < 1e-9);
/// assert_eq!(percentage(0.0, 0.0, 2), 0.0);
/// ```
pub fn percentage(part: f64, whole: f64, decimal_places: u32) -> f64 {
    let whole = if whole == 0.0 { 1.0 } else { whole };
    round_to((part / whole) * 100.0, decimal_places)
}

/// Arithmetic mean rounded to `decimals`; `0.0` for an empty slice.
pub fn mean(values: &[f64], decimals: u32) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    round_to(values.iter().sum::<f64>() / values.len() as f64, decimals)
}

/// Render an ASCII progress bar such as `"[########--------]  50.0%"`.
///
/// `current` is clamped to `total`; a zero `total` renders as complete.
pub fn progress_bar(current: usize, total: usize, width: usize) -> String {
    let ratio = if total == 0 {
        1.0
    } else {
        current.min(total) as f64 / total as f64
    };
    let filled = (ratio * width as f64) as usize;
    let empty = width.saturating_sub(filled);
    format!(
        "[{}{}] {:5.1}%",
        "#".repeat(filled),
        "-".repeat(empty),
        ratio * 100.0
    )
}

/// Frame `title` between two rule lines for banner-style log output.
pub fn banner(title: &str, rule: char, width: usize) -> String {
    let line: String = std::iter::repeat(rule).take(width).collect();
    format!("{line}\n{title}\n{line}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(1.005_1, 2), 1.01);
        assert_eq!(round_to(123.456, 0), 123.0);
    }

    #[test]
    fn test_round_to_ties_to_even() {
        assert_eq!(round_to(1.125, 2), 1.12);
        assert_eq!(round_to(1.375, 2), 1.38);
        assert_eq!(round_to(2.5, 0), 2.0);
        assert_eq!(round_to(3.5, 0), 4.0);
        assert_eq!(round_to(-2.5, 0), -2.0);
    }

    #[test]
    fn test_percentage_guard() {
        assert_eq!(percentage(5.0, 0.0, 2), 500.0);
        assert_eq!(percentage(1.0, 4.0, 2), 25.0);
    }

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[1.0, 2.0, 4.0], 2), 2.33);
        assert_eq!(mean(&[], 2), 0.0);
    }

    #[test]
    fn test_progress_bar_half() {
        assert_eq!(progress_bar(2, 4, 10), "[#####-----]  50.0%");
    }

    #[test]
    fn test_progress_bar_complete_and_clamped() {
        assert_eq!(progress_bar(7, 5, 4), "[####] 100.0%");
        assert_eq!(progress_bar(0, 0, 4), "[####] 100.0%");
    }

    #[test]
    fn test_banner() {
        assert_eq!(banner("DONE", '=', 4), "====\nDONE\n====");
    }
}

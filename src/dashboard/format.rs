//! Display formatting shared by the web view model and the CLI.

use crate::api::Score;

/// Rendered in place of any score that is missing or not numeric.
pub const NOT_AVAILABLE: &str = "N/A";

/// Two-decimal score, or `N/A`.
pub fn format_score(score: Score) -> String {
    match score {
        Some(value) if value.is_finite() => format!("{value:.2}"),
        _ => NOT_AVAILABLE.to_string(),
    }
}

/// Signed two-decimal delta (`+0.05`), or `N/A`.
pub fn format_delta(delta: Score) -> String {
    match delta {
        Some(value) if value.is_finite() => format!("{value:+.2}"),
        _ => NOT_AVAILABLE.to_string(),
    }
}

/// Zero-padded creation-order serial (`0001`).
pub fn serial_label(serial: u32) -> String {
    format!("{serial:04}")
}

/// `"1 iteration"`, `"3 iterations"`.
pub fn count_noun(count: u32, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{count} {singular}")
    } else {
        format!("{count} {plural}")
    }
}

/// `completed/total` question progress, with `?` for unknown parts.
pub fn progress_label(completed: Option<u64>, total: Option<u64>) -> String {
    let part = |n: Option<u64>| n.map_or_else(|| "?".to_string(), |n| n.to_string());
    format!("{}/{}", part(completed), part(total))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scores_round_to_two_decimals() {
        assert_eq!(format_score(Some(0.8333)), "0.83");
        assert_eq!(format_score(Some(0.9167)), "0.92");
        assert_eq!(format_score(Some(1.0)), "1.00");
        assert_eq!(format_score(Some(0.0)), "0.00");
    }

    #[test]
    fn non_numeric_scores_render_not_available() {
        assert_eq!(format_score(None), "N/A");
        assert_eq!(format_score(Some(f64::NAN)), "N/A");
        assert_eq!(format_score(Some(f64::INFINITY)), "N/A");
    }

    #[test]
    fn deltas_carry_a_sign() {
        assert_eq!(format_delta(Some(0.05)), "+0.05");
        assert_eq!(format_delta(Some(-0.126)), "-0.13");
        assert_eq!(format_delta(None), "N/A");
    }

    #[test]
    fn serials_are_zero_padded() {
        assert_eq!(serial_label(1), "0001");
        assert_eq!(serial_label(42), "0042");
        assert_eq!(serial_label(12345), "12345");
    }

    #[test]
    fn count_noun_pluralizes() {
        assert_eq!(count_noun(1, "iteration", "iterations"), "1 iteration");
        assert_eq!(count_noun(3, "iteration", "iterations"), "3 iterations");
        assert_eq!(count_noun(0, "iteration", "iterations"), "0 iterations");
    }

    #[test]
    fn progress_label_marks_unknowns() {
        assert_eq!(progress_label(Some(3), Some(12)), "3/12");
        assert_eq!(progress_label(None, Some(12)), "?/12");
    }
}

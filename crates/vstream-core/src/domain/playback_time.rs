//! `HH:MM:SS` rendering and parsing of playback offsets.

/// Renders a playback offset as `MM:SS`, or `HH:MM:SS` from one hour up.
///
/// Fractions are truncated.  Negative, NaN, and infinite inputs render as
/// `00:00`.
///
/// # Examples
///
/// ```rust
/// use vstream_core::domain::playback_time::render_time_seconds;
///
/// assert_eq!(render_time_seconds(75.9), "01:15");
/// assert_eq!(render_time_seconds(3723.0), "01:02:03");
/// ```
pub fn render_time_seconds(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };

    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;

    if hours > 0 {
        format!("{hours:02}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes:02}:{secs:02}")
    }
}

/// Parses `SS`, `MM:SS`, or `HH:MM:SS` into seconds.
///
/// Parts that are not integers count as zero, so this never fails.
pub fn parse_time_seconds(text: &str) -> u64 {
    let parts: Vec<u64> = text
        .trim()
        .split(':')
        .map(|p| p.trim().parse::<u64>().unwrap_or(0))
        .collect();

    match parts.as_slice() {
        [h, m, s, ..] => h * 3600 + m * 60 + s,
        [m, s] => m * 60 + s,
        [s] => *s,
        [] => 0,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_under_an_hour() {
        assert_eq!(render_time_seconds(0.0), "00:00");
        assert_eq!(render_time_seconds(9.0), "00:09");
        assert_eq!(render_time_seconds(60.0), "01:00");
        assert_eq!(render_time_seconds(3599.0), "59:59");
    }

    #[test]
    fn test_render_hours() {
        assert_eq!(render_time_seconds(3600.0), "01:00:00");
        assert_eq!(render_time_seconds(36_000.0 + 61.0), "10:01:01");
    }

    #[test]
    fn test_render_invalid_inputs_as_zero() {
        assert_eq!(render_time_seconds(-5.0), "00:00");
        assert_eq!(render_time_seconds(f64::NAN), "00:00");
        assert_eq!(render_time_seconds(f64::INFINITY), "00:00");
    }

    #[test]
    fn test_parse_all_forms() {
        assert_eq!(parse_time_seconds("42"), 42);
        assert_eq!(parse_time_seconds("1:15"), 75);
        assert_eq!(parse_time_seconds(" 1:02:03 "), 3723);
    }

    #[test]
    fn test_parse_is_lenient() {
        assert_eq!(parse_time_seconds(""), 0);
        assert_eq!(parse_time_seconds("x:30"), 30);
        assert_eq!(parse_time_seconds("1:zz:05"), 3605);
    }

    #[test]
    fn test_parse_reverses_render() {
        for secs in [0u64, 59, 61, 3600, 86_399] {
            assert_eq!(parse_time_seconds(&render_time_seconds(secs as f64)), secs);
        }
    }
}

//! Human-readable time formatting for chapter markers
//!
//! Chapter timestamps use the `H:MM:SS` form understood by video platforms:
//! hours are not zero-padded and never roll over into days.

/// Format elapsed seconds as `H:MM:SS`
///
/// Fractional seconds are dropped after rounding the value to whole
/// microseconds, so `9.9999999` formats as `0:00:10` while `9.6` formats as
/// `0:00:09`. Negative input is an error condition and gets a leading minus.
///
/// # Examples
///
/// ```
/// use ostmix_common::human_time::format_chapter_timestamp;
///
/// assert_eq!(format_chapter_timestamp(0.0), "0:00:00");
/// assert_eq!(format_chapter_timestamp(16.0), "0:00:16");
/// assert_eq!(format_chapter_timestamp(3661.5), "1:01:01");
/// assert_eq!(format_chapter_timestamp(90000.0), "25:00:00");
/// ```
pub fn format_chapter_timestamp(seconds: f64) -> String {
    let micros = (seconds * 1_000_000.0).round() as i64;
    let is_negative = micros < 0;
    let abs_seconds = micros.abs() / 1_000_000;

    let hours = abs_seconds / 3600;
    let mins = (abs_seconds % 3600) / 60;
    let secs = abs_seconds % 60;
    let formatted = format!("{}:{:02}:{:02}", hours, mins, secs);

    if is_negative {
        format!("-{}", formatted)
    } else {
        formatted
    }
}

/// Format a chapter line: `H:MM:SS - name`
pub fn format_chapter_line(seconds: f64, name: &str) -> String {
    format!("{} - {}", format_chapter_timestamp(seconds), name)
}

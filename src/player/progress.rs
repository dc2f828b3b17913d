//! Position arithmetic shared by the controller and the view.

/// Percentage (0..=100) of `duration_ms` covered by `position_ms`.
///
/// Zero whenever either side is zero, so an unknown duration never
/// divides by zero.
pub fn percentage(position_ms: u64, duration_ms: u64) -> f32 {
    if position_ms == 0 || duration_ms == 0 {
        return 0.0;
    }
    (position_ms as f64 / duration_ms as f64 * 100.0) as f32
}

/// Format milliseconds as `m:ss`; `--:--` when unknown.
pub fn format_timestamp(ms: Option<u64>) -> String {
    match ms {
        Some(ms) => {
            let total_seconds = ms / 1000;
            format!("{}:{:02}", total_seconds / 60, total_seconds % 60)
        }
        None => "--:--".to_string(),
    }
}

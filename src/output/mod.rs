// Output formatting — terminal display of sweeps, explanations and history.

pub mod terminal;

/// Format a threshold delta with an explicit sign, e.g. "+0.040".
///
/// Values that round to zero print as "0.000" rather than "-0.000".
pub fn format_delta(delta: f64) -> String {
    if delta.abs() < 0.0005 {
        "0.000".to_string()
    } else {
        format!("{delta:+.3}")
    }
}

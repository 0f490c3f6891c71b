//! Utilities: error types, logging and chart rendering

pub mod charts;
pub mod error;
pub mod logging;

pub use error::{CatDogError, Result};
pub use logging::init_logging;

/// `12.3s`, `4m 05s` or `1h 02m`
pub fn format_duration(seconds: f64) -> String {
    let whole = seconds.max(0.0) as u64;
    match whole {
        0..=59 => format!("{:.1}s", seconds.max(0.0)),
        60..=3599 => format!("{}m {:02}s", whole / 60, whole % 60),
        _ => format!("{}h {:02}m", whole / 3600, (whole % 3600) / 60),
    }
}

/// Format a probability in [0, 1] as a percentage with two decimals
pub fn format_percent(fraction: f64) -> String {
    format!("{:.2}%", fraction * 100.0)
}

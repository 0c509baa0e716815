use crate::severity::LogSeverity;
use crate::time::now;
use once_cell::sync::OnceCell;

// Unset means the host never opted in, and nothing is written.
static THRESHOLD: OnceCell<LogSeverity> = OnceCell::new();

/// Enables output for records at or above `min_severity`.
/// Only the first call has an effect; returns whether this call set the threshold.
pub fn init(min_severity: LogSeverity) -> bool {
    THRESHOLD.set(min_severity).is_ok()
}

/// Whether a record of the given severity would be written.
pub fn enabled(log_severity: LogSeverity) -> bool {
    THRESHOLD
        .get()
        .map_or(false, |min_severity| log_severity >= *min_severity)
}

pub fn log(msg: String, log_severity: LogSeverity) {
    if enabled(log_severity) {
        eprintln!("{}", format_line(&msg, log_severity, &now()));
    }
}

fn format_line(msg: &str, log_severity: LogSeverity, timestamp: &str) -> String {
    format!("[{}] {} {}", log_severity, timestamp, msg)
}

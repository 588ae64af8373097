pub mod synthetic;

use api::LogLevel;
use log::{debug, error, info, trace, warn};

pub use synthetic::SyntheticTracker;

/// Forwards tracker log lines to the daemon's logger under the tracker's target.
pub fn tracker_log_callback(level: LogLevel, target: &str, message: &str) {
    match level {
        LogLevel::Error => error!(target: target, "{}", message),
        LogLevel::Warn => warn!(target: target, "{}", message),
        LogLevel::Info => info!(target: target, "{}", message),
        LogLevel::Debug => debug!(target: target, "{}", message),
        LogLevel::Trace => trace!(target: target, "{}", message),
    }
}

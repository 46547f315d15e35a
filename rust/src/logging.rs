//! Logging macros for the scheduler, tiered the same way as the verbosity levels
//! used by the scheduling drivers:
//! - CHANGES: task placements, clock advances (`info`)
//! - CHECKS: readiness and candidate consideration (`debug`)
//! - DEBUG: forward/backward pass internals (`trace`)
//!
//! Everything goes through the `log` facade under the `dagr::schedule` target, so
//! nothing is emitted unless the host installs a logger.

/// Log target shared by all scheduler diagnostics.
pub const TARGET: &str = "dagr::schedule";

/// Log at CHANGES level.
///
/// Used for: task placements, clock advances, scheduling decisions.
#[macro_export]
macro_rules! log_changes {
    ($($arg:tt)*) => {
        ::log::info!(target: $crate::logging::TARGET, $($arg)*)
    };
}

/// Log at CHECKS level.
///
/// Used for: readiness checks, candidate selection, skip reasons.
#[macro_export]
macro_rules! log_checks {
    ($($arg:tt)*) => {
        ::log::debug!(target: $crate::logging::TARGET, $($arg)*)
    };
}

/// Log at DEBUG level.
///
/// Used for: per-task forward/backward pass values.
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        ::log::trace!(target: $crate::logging::TARGET, $($arg)*)
    };
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_log_macros_compile() {
        // No logger installed: macros must be silent no-ops
        log_changes!("placed {} at {}", "T-1", 1);
        log_checks!("ready: {:?}", ["T-2"]);
        log_debug!("es={} ef={}", 0, 8);
    }
}

//! Logging helpers for results that are handled by being reported.
//!
//! Persistence and host calls often fail in ways the caller can only log
//! and move past. These traits log the failure with the caller's source
//! location and hand the value back unchanged.

use std::fmt::Display;
use std::panic::Location;

use tracing::{error, warn};

/// Extension trait for logging errors with context.
pub trait ResultExt<T, E> {
    /// Log the error (if any) at `error` level together with `context`.
    ///
    /// ```ignore
    /// use action_bridge::result_ext::ResultExt;
    ///
    /// let loaded = files.load_history().log("Loading persisted history");
    /// ```
    fn log<S: ToString>(self, context: S) -> Result<T, E>;
}

impl<T, E: Display> ResultExt<T, E> for Result<T, E> {
    #[track_caller]
    fn log<S: ToString>(self, context: S) -> Result<T, E> {
        if let Err(ref e) = self {
            let caller = Location::caller();
            error!(
                target: "action_bridge",
                error = %e,
                file = %format!("{}:{}", caller.file(), caller.line()),
                context = %context.to_string(),
                "Operation failed"
            );
        }
        self
    }
}

/// Extension trait for logging missing values.
pub trait OptionResultExt<T> {
    /// Log at `warn` level if this is `None`.
    fn log_none<S: ToString>(self, context: S) -> Option<T>;
}

impl<T> OptionResultExt<T> for Option<T> {
    #[track_caller]
    fn log_none<S: ToString>(self, context: S) -> Option<T> {
        if self.is_none() {
            let caller = Location::caller();
            warn!(
                target: "action_bridge",
                file = %format!("{}:{}", caller.file(), caller.line()),
                context = %context.to_string(),
                "Expected value was None"
            );
        }
        self
    }
}

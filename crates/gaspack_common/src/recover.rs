//! Typed results for best-effort operations.

/// A value produced by an operation that may have degraded instead of failing.
///
/// Best-effort steps (loading the build cache, staging optional files,
/// pruning stale artifacts) never abort the build. They still report what
/// went wrong so that callers can log it and tests can assert on the
/// degraded path having been taken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recoverable<T> {
    /// The value to continue with.
    pub value: T,
    /// Why the value is a fallback, if it is one.
    pub degraded: Option<String>,
}

impl<T> Recoverable<T> {
    /// Wraps a value obtained on the normal path.
    pub fn ok(value: T) -> Self {
        Self {
            value,
            degraded: None,
        }
    }

    /// Wraps a fallback value together with the reason it was needed.
    pub fn degraded(value: T, reason: impl Into<String>) -> Self {
        Self {
            value,
            degraded: Some(reason.into()),
        }
    }

    /// Returns `true` if the fallback path was taken.
    pub fn is_degraded(&self) -> bool {
        self.degraded.is_some()
    }

    /// Discards the degradation reason and returns the value.
    pub fn into_value(self) -> T {
        self.value
    }
}

//! Event loop configuration.

/// Default cap on jobs run in a single microtask checkpoint.
pub const DEFAULT_MICROTASK_LIMIT: usize = 100_000;

/// Settings for an [`EventLoop`](crate::EventLoop).
///
/// # Examples
///
/// ```
/// use async_runtime::{EventLoop, RuntimeConfig};
///
/// let config = RuntimeConfig::default()
///     .with_microtask_limit(Some(1_000))
///     .with_abort_on_uncaught(true);
/// let event_loop = EventLoop::with_config(config);
/// assert_eq!(event_loop.config().microtask_limit, Some(1_000));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Maximum number of microtasks per checkpoint; `None` means unbounded.
    /// Guards against a job that endlessly re-queues itself.
    pub microtask_limit: Option<usize>,
    /// Whether rejected promises without handlers are reported.
    pub report_unhandled_rejections: bool,
    /// Whether an exception escaping a host task or microtask stops the loop.
    /// When false it is logged, recorded and the loop moves on.
    pub abort_on_uncaught: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            microtask_limit: Some(DEFAULT_MICROTASK_LIMIT),
            report_unhandled_rejections: true,
            abort_on_uncaught: false,
        }
    }
}

impl RuntimeConfig {
    /// Sets the per-checkpoint microtask cap.
    pub fn with_microtask_limit(mut self, limit: Option<usize>) -> Self {
        self.microtask_limit = limit;
        self
    }

    /// Enables or disables unhandled-rejection reporting.
    pub fn with_unhandled_rejection_reporting(mut self, enabled: bool) -> Self {
        self.report_unhandled_rejections = enabled;
        self
    }

    /// Makes uncaught host exceptions fatal to the loop.
    pub fn with_abort_on_uncaught(mut self, enabled: bool) -> Self {
        self.abort_on_uncaught = enabled;
        self
    }
}

//! Shared run context: the progress observer and per-run options.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

/// One progress notification from a running operation.
///
/// The underlying tools emit no structured progress guarantee, so the channel
/// carries free-text diagnostic lines; any percentage display derived from
/// them is the consumer's heuristic.
#[derive(Debug, Clone)]
pub enum ProgressEvent<'a> {
    /// A new subprocess pass is starting.
    Pass {
        /// 1-based pass number.
        index: usize,
        /// Total passes in this operation's plan.
        total: usize,
        /// Short description of the pass.
        label: &'a str,
    },
    /// A raw diagnostic line from the running tool's stderr.
    Line(&'a str),
}

/// Observer for progress events.
///
/// Wraps a callback so callers can route events to a UI, a log, or nothing.
/// Replaces any reliance on process-wide mutable state: components receive
/// the sender explicitly.
pub struct ProgressSender {
    callback: Box<dyn Fn(ProgressEvent<'_>) + Send + Sync>,
}

impl ProgressSender {
    /// Create a new sender from the given callback.
    pub fn new(callback: impl Fn(ProgressEvent<'_>) + Send + Sync + 'static) -> Self {
        Self {
            callback: Box::new(callback),
        }
    }

    /// Create a no-op sender that discards all events.
    pub fn noop() -> Self {
        Self {
            callback: Box::new(|_| {}),
        }
    }

    /// Report an event.
    pub fn send(&self, event: ProgressEvent<'_>) {
        (self.callback)(event);
    }
}

impl std::fmt::Debug for ProgressSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressSender").finish_non_exhaustive()
    }
}

/// Options for a single orchestrated operation run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Checked between passes and plumbed into the runner; cancelling kills
    /// any in-flight subprocess.
    pub cancellation: CancellationToken,
    /// Channel for progress events.
    pub progress: Arc<ProgressSender>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            cancellation: CancellationToken::new(),
            progress: Arc::new(ProgressSender::noop()),
        }
    }
}

impl RunOptions {
    /// Builder: attach a cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Builder: attach a progress sender.
    pub fn with_progress(mut self, progress: ProgressSender) -> Self {
        self.progress = Arc::new(progress);
        self
    }
}

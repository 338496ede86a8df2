//! Injectable logging handle.
//!
//! Every operation logs through `tracing`. A [`Logger`] decides which
//! subscriber receives those events: the one it carries, or the process-wide
//! default when it carries none.

use tracing::Dispatch;

/// Routes log events of the operations it is passed to.
#[derive(Clone, Default)]
pub struct Logger {
    dispatch: Option<Dispatch>,
}

impl Logger {
    /// Log to the process-wide default subscriber.
    pub fn global() -> Self {
        Self::default()
    }

    /// Log to `dispatch` instead of the global subscriber.
    pub fn new(dispatch: Dispatch) -> Self {
        Self {
            dispatch: Some(dispatch),
        }
    }

    /// Build a logger from any subscriber.
    pub fn from_subscriber<S>(subscriber: S) -> Self
    where
        S: tracing::Subscriber + Send + Sync + 'static,
    {
        Self::new(Dispatch::new(subscriber))
    }

    /// Run `f` with this logger's subscriber as the current default.
    pub fn scope<T>(&self, f: impl FnOnce() -> T) -> T {
        match &self.dispatch {
            Some(dispatch) => tracing::dispatcher::with_default(dispatch, f),
            None => f(),
        }
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("injected", &self.dispatch.is_some())
            .finish()
    }
}

//! User-facing notification sinks.
//!
//! The executor only ever hands a [`Toast`] to a [`Notifier`]; how it is shown
//! (a UI toaster, a terminal line, a log record) is up to the implementation.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use umroh_types::Toast;

/// Receives user-facing notifications.
pub trait Notifier: Send + Sync {
    fn notify(&self, toast: Toast);
}

impl<F> Notifier for F
where
    F: Fn(Toast) + Send + Sync,
{
    fn notify(&self, toast: Toast) {
        self(toast);
    }
}

/// Logs toasts instead of displaying them. Used when no UI is attached.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, toast: Toast) {
        tracing::warn!(
            title = %toast.title,
            variant = ?toast.variant,
            "{}",
            toast.description
        );
    }
}

/// Queue of pending toasts.
///
/// Toasts are accumulated here and drained by whatever renders them. Clones
/// share the same queue, so one handle can go to the executor and another to
/// the renderer.
#[derive(Debug, Clone, Default)]
pub struct ToastQueue {
    pending: Arc<Mutex<Vec<Toast>>>,
}

impl ToastQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take all pending toasts, clearing the queue.
    ///
    /// Returns the toasts in the order they were raised.
    pub fn take(&self) -> Vec<Toast> {
        std::mem::take(&mut *self.lock())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Toast>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Notifier for ToastQueue {
    fn notify(&self, toast: Toast) {
        self.lock().push(toast);
    }
}

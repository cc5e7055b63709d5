//! The retrying executor and the state it exposes to renderers.

use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use umroh_types::{QueryResponse, Toast};

use crate::failure::{Failure, Operation};
use crate::notify::{Notifier, TracingNotifier};
use crate::options::QueryOptions;

/// Where the executor is in its lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum QueryPhase {
    /// Nothing has been executed yet.
    #[default]
    Idle,
    /// An attempt or a backoff delay is outstanding.
    Running,
    /// The last execution to settle succeeded.
    Succeeded,
    /// The last execution to settle exhausted its retries.
    Failed,
}

impl QueryPhase {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

/// Read-only copy of the executor state at one point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySnapshot<T> {
    pub data: Option<T>,
    pub loading: bool,
    pub error: Option<String>,
    pub phase: QueryPhase,
}

struct QueryState<T> {
    data: Option<T>,
    loading: bool,
    error: Option<String>,
    phase: QueryPhase,
    operation: Option<Operation<T>>,
}

impl<T> Default for QueryState<T> {
    fn default() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
            phase: QueryPhase::Idle,
            operation: None,
        }
    }
}

/// Runs data operations with bounded retry and keeps their outcome.
///
/// One executor backs one logical query (e.g. "bookings, page 2"). Clones
/// share state. Overlapping executions on the same instance are not guarded:
/// each writes its outcome when it settles and the last write wins.
pub struct QueryExecutor<T> {
    options: Arc<QueryOptions>,
    state: Arc<Mutex<QueryState<T>>>,
    notifier: Arc<dyn Notifier>,
}

impl<T> Clone for QueryExecutor<T> {
    fn clone(&self) -> Self {
        Self {
            options: Arc::clone(&self.options),
            state: Arc::clone(&self.state),
            notifier: Arc::clone(&self.notifier),
        }
    }
}

impl<T> fmt::Debug for QueryExecutor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("QueryExecutor")
            .field("options", &self.options)
            .field("loading", &state.loading)
            .field("error", &state.error)
            .field("phase", &state.phase)
            .field("has_data", &state.data.is_some())
            .finish_non_exhaustive()
    }
}

impl<T> Default for QueryExecutor<T>
where
    T: Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new(QueryOptions::default())
    }
}

impl<T> QueryExecutor<T>
where
    T: Clone + Send + 'static,
{
    /// Executor whose failure toasts go to the log.
    #[must_use]
    pub fn new(options: QueryOptions) -> Self {
        Self::with_notifier(options, TracingNotifier)
    }

    #[must_use]
    pub fn with_notifier(options: QueryOptions, notifier: impl Notifier + 'static) -> Self {
        Self {
            options: Arc::new(options),
            state: Arc::new(Mutex::new(QueryState::default())),
            notifier: Arc::new(notifier),
        }
    }

    #[must_use]
    pub fn options(&self) -> &QueryOptions {
        &self.options
    }

    /// Run `f` with retries and remember it for [`QueryExecutor::retry`].
    ///
    /// Returns the data on success, `None` once every attempt has failed.
    /// Never returns an error: failures are reported through
    /// [`QueryExecutor::error`] and the notifier.
    pub async fn execute<F, Fut>(&self, f: F) -> Option<T>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<QueryResponse<T>>> + Send + 'static,
    {
        self.execute_operation(Operation::new(f)).await
    }

    /// Like [`QueryExecutor::execute`], for an already-built operation.
    pub async fn execute_operation(&self, operation: Operation<T>) -> Option<T> {
        {
            let mut state = self.lock();
            state.loading = true;
            state.error = None;
            state.phase = QueryPhase::Running;
            state.operation = Some(operation.clone());
        }

        let max_retries = self.options.max_retries;
        let mut last_failure = None;

        for attempt in 0..=max_retries {
            match operation.attempt().await {
                Ok(data) => {
                    tracing::trace!(attempt, "Query succeeded");
                    let mut state = self.lock();
                    state.data.clone_from(&data);
                    state.loading = false;
                    state.phase = QueryPhase::Succeeded;
                    return data;
                }
                Err(failure) => {
                    if attempt < max_retries {
                        let delay = self.options.backoff_delay(attempt + 1);
                        tracing::debug!(
                            error = %failure,
                            retry_count = attempt + 1,
                            delay_ms = delay.as_millis(),
                            "Retrying query after failure"
                        );
                        last_failure = Some(failure);
                        tokio::time::sleep(delay).await;
                    } else {
                        last_failure = Some(failure);
                    }
                }
            }
        }

        self.fail(last_failure.as_ref());
        None
    }

    /// Re-run the remembered operation with a fresh retry budget.
    ///
    /// Does nothing and returns `None` if nothing has been executed yet.
    pub async fn retry(&self) -> Option<T> {
        let operation = self.lock().operation.clone();
        match operation {
            Some(operation) => self.execute_operation(operation).await,
            None => {
                tracing::trace!("Retry requested before any query was executed");
                None
            }
        }
    }

    /// Replace the data outside the fetch lifecycle (optimistic updates).
    ///
    /// Loading, error and phase are left as they are.
    pub fn set_data(&self, data: Option<T>) {
        self.lock().data = data;
    }

    /// Update the data in place, e.g. to patch one row after a save.
    pub fn update_data(&self, f: impl FnOnce(&mut Option<T>)) {
        f(&mut self.lock().data);
    }

    #[must_use]
    pub fn data(&self) -> Option<T> {
        self.lock().data.clone()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.lock().loading
    }

    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.lock().error.clone()
    }

    #[must_use]
    pub fn phase(&self) -> QueryPhase {
        self.lock().phase
    }

    /// Whether [`QueryExecutor::retry`] has something to replay.
    #[must_use]
    pub fn has_operation(&self) -> bool {
        self.lock().operation.is_some()
    }

    /// The operation `retry` would replay.
    #[must_use]
    pub fn remembered_operation(&self) -> Option<Operation<T>> {
        self.lock().operation.clone()
    }

    #[must_use]
    pub fn snapshot(&self) -> QuerySnapshot<T> {
        let state = self.lock();
        QuerySnapshot {
            data: state.data.clone(),
            loading: state.loading,
            error: state.error.clone(),
            phase: state.phase,
        }
    }

    fn fail(&self, failure: Option<&Failure>) {
        let message = failure
            .and_then(Failure::message)
            .unwrap_or_else(|| self.options.error_message.clone());

        tracing::warn!(
            attempts = self.options.max_attempts(),
            kind = failure.map_or("unknown", Failure::kind),
            error = %message,
            "Query failed after exhausting retries"
        );

        {
            let mut state = self.lock();
            state.error = Some(message.clone());
            state.loading = false;
            state.phase = QueryPhase::Failed;
        }

        self.notifier.notify(Toast::destructive(
            self.options.error_message.clone(),
            message,
        ));
    }
}

impl<T> QueryExecutor<T> {
    fn lock(&self) -> MutexGuard<'_, QueryState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

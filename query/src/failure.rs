//! Operation handle and failure normalization.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;

use umroh_types::{QueryError, QueryResponse};

/// The boxed future one invocation of an [`Operation`] produces.
pub type OperationFuture<T> = BoxFuture<'static, anyhow::Result<QueryResponse<T>>>;

type OperationFn<T> = dyn Fn() -> OperationFuture<T> + Send + Sync;

/// A zero-argument async data operation, shareable across attempts.
///
/// Cloning is cheap and keeps identity: clones compare equal under
/// [`Operation::ptr_eq`], which is how a remembered operation is recognized.
pub struct Operation<T> {
    inner: Arc<OperationFn<T>>,
}

impl<T> Clone for Operation<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for Operation<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("ptr", &Arc::as_ptr(&self.inner).cast::<()>())
            .finish()
    }
}

impl<T: Send + 'static> Operation<T> {
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<QueryResponse<T>>> + Send + 'static,
    {
        Self {
            inner: Arc::new(move || -> OperationFuture<T> { Box::pin(f()) }),
        }
    }

    /// Whether both handles refer to the same underlying function.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Run the operation once, folding every failure channel into [`Failure`].
    pub(crate) async fn attempt(&self) -> Result<Option<T>, Failure> {
        // The call itself happens inside the guarded future so a panic while
        // building the future is caught too.
        let invoke = async { (self.inner)().await };
        match AssertUnwindSafe(invoke).catch_unwind().await {
            Ok(Ok(response)) => response.into_result().map_err(Failure::Returned),
            Ok(Err(err)) => Err(Failure::Raised(err)),
            Err(payload) => Err(Failure::Panicked {
                message: panic_message(payload.as_ref()),
            }),
        }
    }
}

/// Why a single attempt did not succeed.
#[derive(Debug)]
pub enum Failure {
    /// The operation resolved with a failure indicator.
    Returned(QueryError),
    /// The operation resolved to `Err`.
    Raised(anyhow::Error),
    /// The operation panicked while being polled.
    Panicked { message: Option<String> },
}

impl Failure {
    /// Human-readable message, if the failure carries a non-empty one.
    #[must_use]
    pub fn message(&self) -> Option<String> {
        let message = match self {
            Self::Returned(err) => return err.message().map(ToOwned::to_owned),
            Self::Raised(err) => err.to_string(),
            Self::Panicked { message } => message.clone()?,
        };
        (!message.is_empty()).then_some(message)
    }

    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Returned(_) => "returned",
            Self::Raised(_) => "raised",
            Self::Panicked { .. } => "panicked",
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.message() {
            Some(message) => write!(f, "{} failure: {message}", self.kind()),
            None => write!(f, "{} failure", self.kind()),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> Option<String> {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        return Some((*s).to_string());
    }
    payload.downcast_ref::<String>().cloned()
}

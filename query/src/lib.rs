//! Resilient query executor.
//!
//! Wraps an arbitrary async data operation with bounded retry and linear
//! backoff, tracks `data` / `loading` / `error` state for a renderer, and
//! raises a single destructive toast when every attempt has failed.
//!
//! # Retry Policy
//!
//! - Max retries: 2 (3 total attempts)
//! - Delay before retry `n` (1-indexed): `retry_delay * n`, default base 1s
//! - No jitter, no cap
//!
//! # Failure Channels
//!
//! An operation fails by returning a [`QueryResponse`] whose `error` is set,
//! by returning `Err`, or by panicking. All three are normalized into a
//! [`Failure`] and handled identically.
//!
//! ```text
//! execute(op) -> remember op -> attempt 0 .. attempt max_retries
//!                                  |  ok -> store data, return
//!                                  |  err -> sleep(base * (i + 1)) -> next
//!                                  v
//!                     exhausted -> store message, toast, return None
//! ```

mod executor;
mod failure;
mod notify;
mod options;

pub use executor::{QueryExecutor, QueryPhase, QuerySnapshot};
pub use failure::{Failure, Operation, OperationFuture};
pub use notify::{Notifier, ToastQueue, TracingNotifier};
pub use options::{DEFAULT_ERROR_MESSAGE, QueryOptions};

pub use umroh_types::{QueryError, QueryResponse, Toast, ToastVariant};

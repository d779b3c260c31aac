//! Result sinks: where a finished exchange delivers its outcome.
//!
//! A sink is a single-use handle. [`OutcomeSink::deliver`] consumes the
//! boxed sink, so once an exchange has handed over its outcome nothing can
//! reach the caller's callbacks again, and whatever the callbacks captured
//! is dropped together with them.

use bytes::Bytes;
use tokio::sync::oneshot;
use tracing::debug;

use crate::ExchangeError;

/// Terminal outcome of one exchange.
pub type Outcome = Result<Bytes, ExchangeError>;

/// Receives the terminal outcome of an exchange, exactly once.
pub trait OutcomeSink: Send {
    fn deliver(self: Box<Self>, outcome: Outcome);
}

type SuccessFn = Box<dyn FnOnce(Bytes) + Send>;
type FailureFn = Box<dyn FnOnce(ExchangeError) + Send>;

/// A success/failure callback pair.
///
/// Delivering an outcome fires exactly one of the two callbacks and drops
/// both.
pub struct ResultSinks {
    on_success: SuccessFn,
    on_failure: FailureFn,
}

impl ResultSinks {
    pub fn new(
        on_success: impl FnOnce(Bytes) + Send + 'static,
        on_failure: impl FnOnce(ExchangeError) + Send + 'static,
    ) -> Self {
        Self {
            on_success: Box::new(on_success),
            on_failure: Box::new(on_failure),
        }
    }
}

impl OutcomeSink for ResultSinks {
    fn deliver(self: Box<Self>, outcome: Outcome) {
        let Self {
            on_success,
            on_failure,
        } = *self;
        match outcome {
            Ok(body) => {
                drop(on_failure);
                on_success(body);
            }
            Err(err) => {
                drop(on_success);
                on_failure(err);
            }
        }
    }
}

impl OutcomeSink for oneshot::Sender<Outcome> {
    fn deliver(self: Box<Self>, outcome: Outcome) {
        if (*self).send(outcome).is_err() {
            debug!("outcome receiver dropped before delivery");
        }
    }
}

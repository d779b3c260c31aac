//! The exchange reducer.
//!
//! An [`Exchange`] folds the events of one HTTP request attempt (headers,
//! body chunks, completion) into a single [`Outcome`]. Two error channels
//! feed it: transport failures arrive out-of-band at completion, HTTP
//! failures are derived from the status code and, when present, a
//! structured error payload in the body. Transport failures win.
//!
//! # Event ordering
//!
//! The transport delivers events one at a time, in the order
//! headers → data* → complete. Every hook takes `&mut self`, so the
//! reducer needs no locking. Completion may be delivered more than once
//! (e.g. a cancellation racing a finished response); repeats are absorbed
//! and logged, never surfaced to the caller.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::BytesMut;
use tokio::sync::oneshot;
use tracing::{debug, trace};

use crate::config::ExchangeConfig;
use crate::payload;
use crate::response::{Admission, ResponseMeta};
use crate::sink::{Outcome, OutcomeSink};
use crate::{ExchangeError, TransportError};

static NEXT_EXCHANGE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identifier of an exchange, used to correlate log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ExchangeId(u64);

impl ExchangeId {
    fn next() -> Self {
        Self(NEXT_EXCHANGE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ExchangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle of an exchange. `Succeeded` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultState {
    Open,
    Succeeded,
    Failed,
}

impl ResultState {
    pub fn is_terminal(self) -> bool {
        self != Self::Open
    }
}

/// Non-2xx status seen in the headers, awaiting its error payload.
#[derive(Debug)]
struct PendingStatus {
    status_code: u16,
    payload: BytesMut,
    /// Set once the payload outgrew the configured bound.
    truncated: bool,
}

/// Reducer state for one request attempt.
pub struct Exchange {
    id: ExchangeId,
    config: ExchangeConfig,
    body: BytesMut,
    pending_status: Option<PendingStatus>,
    bad_response_error: Option<ExchangeError>,
    reported_error: Option<ExchangeError>,
    state: ResultState,
    sink: Option<Box<dyn OutcomeSink>>,
}

impl Exchange {
    pub fn new(sink: impl OutcomeSink + 'static) -> Self {
        Self::with_config(sink, ExchangeConfig::default())
    }

    pub fn with_config(sink: impl OutcomeSink + 'static, config: ExchangeConfig) -> Self {
        Self {
            id: ExchangeId::next(),
            config,
            body: BytesMut::new(),
            pending_status: None,
            bad_response_error: None,
            reported_error: None,
            state: ResultState::Open,
            sink: Some(Box::new(sink)),
        }
    }

    /// Create an exchange whose outcome is sent over a oneshot channel.
    pub fn channel() -> (Self, oneshot::Receiver<Outcome>) {
        Self::channel_with_config(ExchangeConfig::default())
    }

    pub fn channel_with_config(config: ExchangeConfig) -> (Self, oneshot::Receiver<Outcome>) {
        let (tx, rx) = oneshot::channel();
        (Self::with_config(tx, config), rx)
    }

    pub fn id(&self) -> ExchangeId {
        self.id
    }

    pub fn state(&self) -> ResultState {
        self.state
    }

    /// Status code of a non-2xx response still awaiting completion.
    pub fn pending_status(&self) -> Option<u16> {
        self.pending_status.as_ref().map(|p| p.status_code)
    }

    /// Number of success-path body bytes accumulated so far.
    pub fn body_len(&self) -> usize {
        self.body.len()
    }

    /// The error already surfaced to the caller, if any.
    pub fn reported_error(&self) -> Option<&ExchangeError> {
        self.reported_error.as_ref()
    }

    /// Handle the response headers.
    ///
    /// Malformed metadata fails the exchange on the spot and returns
    /// [`Admission::Reject`]; the transport must then abort. A status
    /// outside `[200, 300)` is remembered and the body that follows is
    /// treated as an error payload.
    pub fn on_headers(&mut self, meta: ResponseMeta) -> Admission {
        debug!(exchange = %self.id, response = %meta, "response headers received");

        if self.state.is_terminal() {
            debug!(exchange = %self.id, state = ?self.state, "headers after terminal result ignored");
            return Admission::Reject;
        }

        let head = match meta.into_head() {
            Ok(head) => head,
            Err(err) => {
                self.finish(Some(err));
                return Admission::Reject;
            }
        };

        if !(200..300).contains(&head.status) {
            self.pending_status = Some(PendingStatus {
                status_code: head.status,
                payload: BytesMut::new(),
                truncated: false,
            });
            self.bad_response_error = Some(ExchangeError::BadResponseStatusCode {
                status_code: head.status,
            });
        }

        Admission::Accept
    }

    /// Handle one chunk of response body.
    ///
    /// On the success path the chunk is appended to the body. While a
    /// status error is pending the chunk goes to the error payload instead,
    /// and the whole payload received so far is re-parsed; the last
    /// successful parse determines the error message.
    pub fn on_data_chunk(&mut self, chunk: &[u8]) {
        trace!(exchange = %self.id, len = chunk.len(), "response data received");

        if self.state.is_terminal() {
            trace!(exchange = %self.id, "data after terminal result ignored");
            return;
        }

        let Some(pending) = self.pending_status.as_mut() else {
            self.body.extend_from_slice(chunk);
            return;
        };

        if pending.truncated {
            return;
        }
        if pending.payload.len() + chunk.len() > self.config.max_error_payload_bytes {
            debug!(
                exchange = %self.id,
                status = pending.status_code,
                limit = self.config.max_error_payload_bytes,
                "error payload exceeds limit, no longer parsed"
            );
            pending.truncated = true;
            return;
        }

        pending.payload.extend_from_slice(chunk);
        match payload::error_message(&pending.payload) {
            Some(message) => {
                self.bad_response_error = Some(ExchangeError::BadResponseStatusCodeWithMessage {
                    status_code: pending.status_code,
                    message,
                });
            }
            None => {
                trace!(
                    exchange = %self.id,
                    buffered = pending.payload.len(),
                    "error payload not parseable yet"
                );
            }
        }
    }

    /// Handle completion of the exchange.
    ///
    /// A transport error takes precedence over any HTTP-level status error.
    /// Produces the terminal outcome on the first call; later calls are
    /// absorbed.
    pub fn on_complete(&mut self, transport_error: Option<TransportError>) {
        debug!(
            exchange = %self.id,
            transport_error = transport_error.as_ref().map(tracing::field::display),
            "exchange completed"
        );

        let resolved = transport_error
            .map(ExchangeError::Transport)
            .or_else(|| self.bad_response_error.clone());
        self.finish(resolved);
    }

    fn finish(&mut self, error: Option<ExchangeError>) {
        let Some(error) = error else {
            if self.state.is_terminal() {
                trace!(exchange = %self.id, state = ?self.state, "repeated completion ignored");
                return;
            }
            self.state = ResultState::Succeeded;
            let body = std::mem::take(&mut self.body).freeze();
            self.deliver(Ok(body));
            return;
        };

        if let Some(reported) = &self.reported_error {
            if error.is_cancellation() {
                trace!(exchange = %self.id, reported = %reported, "exchange cancelled after error was reported");
            } else {
                debug!(
                    exchange = %self.id,
                    reported = %reported,
                    error = %error,
                    "second error after one was already reported"
                );
            }
            return;
        }

        if self.state.is_terminal() {
            debug!(exchange = %self.id, error = %error, "error after successful completion ignored");
            return;
        }

        self.reported_error = Some(error.clone());
        self.state = ResultState::Failed;
        self.deliver(Err(error));
    }

    fn deliver(&mut self, outcome: Outcome) {
        if let Some(sink) = self.sink.take() {
            sink.deliver(outcome);
        }
    }
}

impl fmt::Debug for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Exchange")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("body_len", &self.body.len())
            .field("pending_status", &self.pending_status())
            .field("reported_error", &self.reported_error)
            .finish_non_exhaustive()
    }
}

impl Drop for Exchange {
    fn drop(&mut self) {
        if self.state == ResultState::Open {
            debug!(exchange = %self.id, "exchange dropped without a result");
        }
    }
}

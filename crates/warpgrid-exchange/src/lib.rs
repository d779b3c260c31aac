//! WarpGrid exchange reducer.
//!
//! Sits between a streaming HTTP transport and application callbacks. The
//! transport reports the three events of a request attempt (response
//! headers, body chunks, completion) and the [`Exchange`] reduces them to
//! exactly one [`Outcome`]: the full body on success, or a classified
//! [`ExchangeError`].
//!
//! # Error channels
//!
//! Two independent sources can fail an exchange:
//!
//! - the transport, out-of-band, when the exchange completes
//!   (connection refused, reset, cancellation, ...);
//! - the response itself, through a status code outside `[200, 300)`,
//!   optionally refined by a JSON error payload in the body
//!   (`{"error": "...", "error_description": "..."}`).
//!
//! A transport error always wins. Whichever error is reported first is the
//! only one the caller ever sees; later completions are absorbed.
//!
//! # Usage
//!
//! ```
//! use warpgrid_exchange::{Exchange, ResponseMeta};
//!
//! let (mut exchange, mut outcome) = Exchange::channel();
//! exchange.on_headers(ResponseMeta::http(404, Default::default()));
//! exchange.on_data_chunk(br#"{"error":"not_found"}"#);
//! exchange.on_complete(None);
//!
//! let err = outcome.try_recv().unwrap().unwrap_err();
//! assert_eq!(err.to_string(), "bad response status code 404: not_found");
//! ```

mod config;
mod error;
mod event;
mod exchange;
mod payload;
mod response;
mod sink;

pub use config::{ExchangeConfig, DEFAULT_MAX_ERROR_PAYLOAD_BYTES};
pub use error::{ExchangeError, TransportError, TransportErrorKind};
pub use event::{pump, TransportEvent};
pub use exchange::{Exchange, ExchangeId, ResultState};
pub use response::{Admission, ResponseHead, ResponseMeta};
pub use sink::{Outcome, OutcomeSink, ResultSinks};

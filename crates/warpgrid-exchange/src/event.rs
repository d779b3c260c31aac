//! Transport events and an async driver for them.
//!
//! Transports that already expose their response as a stream of events
//! can hand that stream to [`pump`] instead of calling the
//! [`Exchange`] hooks one by one.

use std::pin::pin;

use bytes::Bytes;
use futures_core::Stream;
use tracing::debug;

use crate::exchange::{Exchange, ResultState};
use crate::response::{Admission, ResponseMeta};
use crate::TransportError;

/// One event of a streaming HTTP exchange.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    Headers(ResponseMeta),
    Data(Bytes),
    Complete(Option<TransportError>),
}

impl Exchange {
    /// Dispatch an event to the matching hook.
    ///
    /// Only a headers event can reject; data and completion always
    /// return [`Admission::Accept`].
    pub fn handle(&mut self, event: TransportEvent) -> Admission {
        match event {
            TransportEvent::Headers(meta) => self.on_headers(meta),
            TransportEvent::Data(chunk) => {
                self.on_data_chunk(&chunk);
                Admission::Accept
            }
            TransportEvent::Complete(err) => {
                self.on_complete(err);
                Admission::Accept
            }
        }
    }
}

/// Feed every event of `events` into `exchange`, in order.
///
/// Stops pulling from the stream as soon as the headers are rejected.
/// Returns the state the exchange is left in; a stream that ends without
/// a completion event leaves it [`ResultState::Open`].
pub async fn pump<S>(exchange: &mut Exchange, events: S) -> ResultState
where
    S: Stream<Item = TransportEvent>,
{
    let mut events = pin!(events);
    while let Some(event) = std::future::poll_fn(|cx| events.as_mut().poll_next(cx)).await {
        if exchange.handle(event) == Admission::Reject {
            debug!(exchange = %exchange.id(), "response rejected, aborting event stream");
            break;
        }
    }
    exchange.state()
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use futures_util::StreamExt;
    use http::HeaderMap;

    use super::*;
    use crate::ExchangeError;

    fn events(list: Vec<TransportEvent>) -> impl Stream<Item = TransportEvent> {
        futures_util::stream::iter(list)
    }

    #[tokio::test]
    async fn pump_success() {
        let (mut exchange, rx) = Exchange::channel();
        let state = pump(
            &mut exchange,
            events(vec![
                TransportEvent::Headers(ResponseMeta::http(200, HeaderMap::new())),
                TransportEvent::Data(Bytes::from_static(b"{\"ok\":")),
                TransportEvent::Data(Bytes::from_static(b"true}")),
                TransportEvent::Complete(None),
            ]),
        )
        .await;

        assert_eq!(state, ResultState::Succeeded);
        assert_eq!(rx.await.unwrap(), Ok(Bytes::from_static(b"{\"ok\":true}")));
    }

    #[tokio::test]
    async fn pump_stops_after_rejection() {
        let (mut exchange, rx) = Exchange::channel();
        let pulled = Arc::new(AtomicUsize::new(0));
        let counter = pulled.clone();
        let stream = events(vec![
            TransportEvent::Headers(ResponseMeta::malformed("HTTP/9.9 ???")),
            TransportEvent::Data(Bytes::from_static(b"unused")),
            TransportEvent::Complete(None),
        ])
        .inspect(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let state = pump(&mut exchange, stream).await;
        assert_eq!(state, ResultState::Failed);
        assert_eq!(pulled.load(Ordering::SeqCst), 1);
        assert_eq!(
            rx.await.unwrap(),
            Err(ExchangeError::InvalidResponse {
                metadata: "HTTP/9.9 ???".into()
            })
        );
    }

    #[tokio::test]
    async fn pump_without_completion_leaves_exchange_open() {
        let (mut exchange, mut rx) = Exchange::channel();
        let state = pump(
            &mut exchange,
            events(vec![
                TransportEvent::Headers(ResponseMeta::http(200, HeaderMap::new())),
                TransportEvent::Data(Bytes::from_static(b"partial")),
            ]),
        )
        .await;

        assert_eq!(state, ResultState::Open);
        assert_eq!(exchange.body_len(), 7);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn handle_dispatches_to_hooks() {
        let (mut exchange, mut rx) = Exchange::channel();
        assert_eq!(
            exchange.handle(TransportEvent::Headers(ResponseMeta::http(404, HeaderMap::new()))),
            Admission::Accept
        );
        assert_eq!(exchange.pending_status(), Some(404));
        exchange.handle(TransportEvent::Data(Bytes::from_static(br#"{"error":"not_found"}"#)));
        exchange.handle(TransportEvent::Complete(None));

        assert_eq!(
            rx.try_recv().unwrap(),
            Err(ExchangeError::BadResponseStatusCodeWithMessage {
                status_code: 404,
                message: "not_found".into(),
            })
        );
    }
}

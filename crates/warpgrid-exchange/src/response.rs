use std::fmt;

use http::{HeaderMap, StatusCode};

use crate::ExchangeError;

/// Status line and headers of an HTTP response.
#[derive(Debug, Clone, Default)]
pub struct ResponseHead {
    pub status: u16,
    pub headers: HeaderMap,
}

impl ResponseHead {
    pub fn new(status: u16, headers: HeaderMap) -> Self {
        Self { status, headers }
    }

    pub fn status(status: u16) -> Self {
        Self::new(status, HeaderMap::new())
    }
}

/// Response metadata as handed over by the transport.
///
/// Transports that cannot produce an HTTP response object (a proxy speaking
/// another protocol, a truncated status line) report it as
/// [`ResponseMeta::Malformed`] with a description of what they saw.
#[derive(Debug, Clone)]
pub enum ResponseMeta {
    Http(ResponseHead),
    Malformed(String),
}

impl ResponseMeta {
    pub fn http(status: u16, headers: HeaderMap) -> Self {
        Self::Http(ResponseHead::new(status, headers))
    }

    pub fn malformed(description: impl Into<String>) -> Self {
        Self::Malformed(description.into())
    }

    /// Validate the metadata into a response head.
    ///
    /// A head whose status is not a valid HTTP status code is treated the
    /// same as a non-HTTP response.
    pub(crate) fn into_head(self) -> Result<ResponseHead, ExchangeError> {
        match self {
            Self::Http(head) if StatusCode::from_u16(head.status).is_ok() => Ok(head),
            Self::Http(head) => Err(ExchangeError::InvalidResponse {
                metadata: format!("invalid status code {}", head.status),
            }),
            Self::Malformed(metadata) => Err(ExchangeError::InvalidResponse { metadata }),
        }
    }
}

impl<T> From<&http::Response<T>> for ResponseMeta {
    fn from(response: &http::Response<T>) -> Self {
        Self::http(response.status().as_u16(), response.headers().clone())
    }
}

impl From<ResponseHead> for ResponseMeta {
    fn from(head: ResponseHead) -> Self {
        Self::Http(head)
    }
}

impl fmt::Display for ResponseMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(head) => write!(f, "HTTP {}", head.status),
            Self::Malformed(description) => write!(f, "malformed ({description})"),
        }
    }
}

/// Whether the transport should keep receiving the response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Accept,
    /// Abort the exchange; it has already been failed.
    Reject,
}

impl Admission {
    pub fn is_accepted(self) -> bool {
        self == Self::Accept
    }
}

#[cfg(test)]
mod tests {
    use http::header::CONTENT_TYPE;

    use super::*;

    #[test]
    fn valid_status_passes() {
        for status in [100, 200, 204, 301, 404, 500, 599, 999] {
            let head = ResponseMeta::Http(ResponseHead::status(status))
                .into_head()
                .unwrap();
            assert_eq!(head.status, status);
        }
    }

    #[test]
    fn out_of_range_status_is_invalid() {
        for status in [0, 42, 99, 1000, u16::MAX] {
            let err = ResponseMeta::Http(ResponseHead::status(status))
                .into_head()
                .unwrap_err();
            assert!(
                matches!(err, ExchangeError::InvalidResponse { .. }),
                "status {status}"
            );
        }
    }

    #[test]
    fn malformed_keeps_description() {
        let err = ResponseMeta::malformed("SSH-2.0-OpenSSH_9.6")
            .into_head()
            .unwrap_err();
        assert_eq!(
            err,
            ExchangeError::InvalidResponse {
                metadata: "SSH-2.0-OpenSSH_9.6".into()
            }
        );
    }

    #[test]
    fn from_http_response() {
        let response = http::Response::builder()
            .status(418)
            .header(CONTENT_TYPE, "application/json")
            .body(())
            .unwrap();

        let head = ResponseMeta::from(&response).into_head().unwrap();
        assert_eq!(head.status, 418);
        assert_eq!(head.headers.get(CONTENT_TYPE).unwrap(), "application/json");
    }

    #[test]
    fn display() {
        assert_eq!(ResponseMeta::http(503, HeaderMap::new()).to_string(), "HTTP 503");
        assert_eq!(ResponseMeta::malformed("eof").to_string(), "malformed (eof)");
    }

    #[test]
    fn admission() {
        assert!(Admission::Accept.is_accepted());
        assert!(!Admission::Reject.is_accepted());
    }
}

//! Structured error payloads carried by non-2xx response bodies.
//!
//! A payload is a flat JSON object of string values with at least an
//! `error` field, optionally accompanied by `error_description`:
//!
//! ```text
//! {"error":"server_error","error_description":"disk full"}
//! ```

use std::collections::HashMap;

const ERROR_FIELD: &str = "error";
const DESCRIPTION_FIELD: &str = "error_description";

/// Extract the error message from a buffered payload.
///
/// Returns `None` when the bytes are not JSON, not a flat string-to-string
/// object, or lack an `error` field. The message is `"<error>"`, or
/// `"<error>: <error_description>"` when a description is present.
pub(crate) fn error_message(payload: &[u8]) -> Option<String> {
    let mut fields: HashMap<String, String> = serde_json::from_slice(payload).ok()?;
    let error = fields.remove(ERROR_FIELD)?;
    match fields.remove(DESCRIPTION_FIELD) {
        Some(description) => Some(format!("{error}: {description}")),
        None => Some(error),
    }
}

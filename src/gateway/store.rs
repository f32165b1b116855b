//! Remote store abstraction.
//!
//! The plugin runtime owns the network: it can fire a web request and later
//! receives the reply as an event. A [`RemoteStore`] therefore does not
//! perform I/O itself; it translates gateway operations into
//! [`HttpRequest`]s and interprets the [`HttpReply`] that comes back.

use super::messages::{GatewayRequest, GatewayResponse, RequestContext};
use crate::domain::error::Result;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// HTTP methods the plugin runtime can issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Delete,
}

/// A web request ready to be handed to the plugin runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub method: HttpMethod,
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
    /// Opaque correlation data echoed back with the reply.
    pub context: BTreeMap<String, String>,
}

impl HttpRequest {
    /// A bodyless request with no headers and an empty context.
    #[must_use]
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method,
            headers: BTreeMap::new(),
            body: Vec::new(),
            context: BTreeMap::new(),
        }
    }
}

/// The status and body of a completed web request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpReply {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Read/write/remove access to a hierarchical key-value backend.
///
/// Subscriptions are layered on top of [`read_all`](Self::read_all) by
/// [`Subscriptions`](super::Subscriptions).
///
/// # Implementations
///
/// - [`FirebaseRest`](super::FirebaseRest): Firebase Realtime Database REST API
pub trait RemoteStore {
    /// Builds the bulk read of the collection at `path`.
    fn read_all(&self, path: &str) -> HttpRequest;

    /// Builds a partial update writing exactly `fields` at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the fields cannot be serialized.
    fn write(&self, path: &str, fields: &Map<String, Value>) -> Result<HttpRequest>;

    /// Builds the removal of the record at `path`.
    fn remove(&self, path: &str) -> HttpRequest;

    /// Interprets the reply to a request described by `context`.
    fn interpret(&self, context: &RequestContext, reply: &HttpReply) -> GatewayResponse;

    /// Builds the web request for `request`, tagged with its context.
    ///
    /// # Errors
    ///
    /// Propagates serialization failures from [`write`](Self::write).
    fn prepare(&self, request: &GatewayRequest) -> Result<HttpRequest> {
        let mut http = match request {
            GatewayRequest::ReadAll { path, .. } | GatewayRequest::Poll { path, .. } => {
                self.read_all(path)
            }
            GatewayRequest::Write { path, fields, .. } => self.write(path, fields)?,
            GatewayRequest::Remove { path, .. } => self.remove(path),
        };
        http.context = request.context().to_map();
        Ok(http)
    }
}

/// Builds the failure response for a request.
pub(crate) fn failure(context: &RequestContext, message: impl Into<String>) -> GatewayResponse {
    GatewayResponse::Failed {
        request_id: context.request_id,
        op: context.op,
        subscription: context.subscription,
        message: message.into(),
    }
}

/// Converts a successful read body into keyed records.
///
/// `null` means the collection does not exist and yields no records. Arrays
/// (the store's rendering of integer-keyed collections) are keyed by index
/// with holes skipped.
pub(crate) fn records_from_body(body: &[u8]) -> std::result::Result<BTreeMap<String, Value>, String> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(BTreeMap::new());
    }
    let value: Value = serde_json::from_slice(body).map_err(|e| format!("invalid JSON: {e}"))?;
    match value {
        Value::Null => Ok(BTreeMap::new()),
        Value::Object(map) => Ok(map.into_iter().collect()),
        Value::Array(items) => Ok(items
            .into_iter()
            .enumerate()
            .filter(|(_, item)| !item.is_null())
            .map(|(idx, item)| (idx.to_string(), item))
            .collect()),
        other => Err(format!("expected a collection, got {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_body_is_an_empty_collection() {
        assert!(records_from_body(b"null").unwrap().is_empty());
        assert!(records_from_body(b"").unwrap().is_empty());
    }

    #[test]
    fn array_body_is_keyed_by_index() {
        let records = records_from_body(br#"[null, {"a":1}, {"b":2}]"#).unwrap();
        assert_eq!(records.keys().collect::<Vec<_>>(), vec!["1", "2"]);
    }

    #[test]
    fn scalar_body_is_rejected() {
        assert!(records_from_body(b"42").is_err());
        assert!(records_from_body(b"{not json").is_err());
    }
}

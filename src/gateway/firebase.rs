//! Firebase Realtime Database over its REST API.
//!
//! Every node of the database is addressable as `{database_url}/{path}.json`.
//! Partial updates use `PATCH`, which the plugin runtime cannot send directly;
//! they go out as `POST` with the `X-HTTP-Method-Override` header, which the
//! REST API honours.

use super::messages::{GatewayOp, GatewayResponse, RequestContext};
use super::store::{failure, records_from_body, HttpMethod, HttpReply, HttpRequest, RemoteStore};
use crate::domain::error::Result;
use crate::Secret;
use serde::Deserialize;
use serde_json::{Map, Value};

/// Header used to tunnel `PATCH` through `POST`.
pub const METHOD_OVERRIDE_HEADER: &str = "X-HTTP-Method-Override";

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// A [`RemoteStore`] backed by one Firebase Realtime Database instance.
#[derive(Debug, Clone)]
pub struct FirebaseRest {
    database_url: String,
    auth: Option<Secret>,
}

impl FirebaseRest {
    /// Creates a store rooted at `database_url`.
    ///
    /// `auth` is a database secret or ID token appended to every request.
    #[must_use]
    pub fn new(database_url: impl Into<String>, auth: Option<Secret>) -> Self {
        let database_url = database_url.into().trim_end_matches('/').to_string();
        Self { database_url, auth }
    }

    /// The REST URL of the node at `path`.
    ///
    /// Each path segment is percent-encoded, so keys holding spaces, `?`,
    /// `%` or `&` still address their own node.
    ///
    /// ```
    /// use roadguard_moderator::gateway::FirebaseRest;
    ///
    /// let store = FirebaseRest::new("https://roadguard.firebaseio.com/", None);
    /// assert_eq!(store.url_for("/posts/-Nabc"), "https://roadguard.firebaseio.com/posts/-Nabc.json");
    /// ```
    #[must_use]
    pub fn url_for(&self, path: &str) -> String {
        let segments: Vec<_> = path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(urlencoding::encode)
            .collect();
        let mut url = format!("{}/{}.json", self.database_url, segments.join("/"));
        if let Some(auth) = &self.auth {
            url.push_str("?auth=");
            url.push_str(&urlencoding::encode(auth.expose()));
        }
        url
    }
}

impl RemoteStore for FirebaseRest {
    fn read_all(&self, path: &str) -> HttpRequest {
        HttpRequest::new(HttpMethod::Get, self.url_for(path))
    }

    fn write(&self, path: &str, fields: &Map<String, Value>) -> Result<HttpRequest> {
        let mut request = HttpRequest::new(HttpMethod::Post, self.url_for(path));
        request
            .headers
            .insert(METHOD_OVERRIDE_HEADER.to_string(), "PATCH".to_string());
        request
            .headers
            .insert("Content-Type".to_string(), "application/json".to_string());
        request.body = serde_json::to_vec(fields)?;
        Ok(request)
    }

    fn remove(&self, path: &str) -> HttpRequest {
        HttpRequest::new(HttpMethod::Delete, self.url_for(path))
    }

    fn interpret(&self, context: &RequestContext, reply: &HttpReply) -> GatewayResponse {
        if let Ok(ErrorBody { error }) = serde_json::from_slice::<ErrorBody>(&reply.body) {
            return failure(context, error);
        }
        if !reply.is_success() {
            return failure(context, format!("HTTP {}", reply.status));
        }

        let request_id = context.request_id;
        match context.op {
            GatewayOp::ReadAll | GatewayOp::Poll => match records_from_body(&reply.body) {
                Ok(records) => match context.subscription {
                    Some(subscription) => GatewayResponse::Polled {
                        request_id,
                        subscription,
                        records,
                    },
                    None => GatewayResponse::Snapshot { request_id, records },
                },
                Err(message) => failure(context, message),
            },
            GatewayOp::Write => GatewayResponse::Written { request_id },
            GatewayOp::Remove => GatewayResponse::Removed { request_id },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::GatewayRequest;
    use serde_json::json;

    fn store() -> FirebaseRest {
        FirebaseRest::new("https://rg.firebaseio.com", Some(Secret::new("s3cr/t")))
    }

    fn reply(status: u16, body: &str) -> HttpReply {
        HttpReply { status, body: body.as_bytes().to_vec() }
    }

    #[test]
    fn auth_token_is_encoded_into_the_query() {
        assert_eq!(
            store().url_for("posts"),
            "https://rg.firebaseio.com/posts.json?auth=s3cr%2Ft"
        );
    }

    #[test]
    fn path_segments_are_encoded_one_by_one() {
        let store = FirebaseRest::new("https://rg.firebaseio.com", None);
        assert_eq!(
            store.url_for("posts/a b?x%y&z"),
            "https://rg.firebaseio.com/posts/a%20b%3Fx%25y%26z.json"
        );
        assert!(crate::domain::post::is_valid_key("a b?x%y&z"));

        let request = store.remove("posts/a b?x");
        assert_eq!(request.url, "https://rg.firebaseio.com/posts/a%20b%3Fx.json");
    }

    #[test]
    fn write_tunnels_patch_with_exact_fields() {
        let mut fields = Map::new();
        fields.insert("resolved".to_string(), json!(true));
        let request = store()
            .prepare(&GatewayRequest::Write {
                request_id: 4,
                path: "posts/p1".to_string(),
                fields,
            })
            .unwrap();

        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(request.headers.get(METHOD_OVERRIDE_HEADER).map(String::as_str), Some("PATCH"));
        assert_eq!(request.body, br#"{"resolved":true}"#.to_vec());
        assert_eq!(request.context.get("request_id").map(String::as_str), Some("4"));
    }

    #[test]
    fn remove_uses_delete() {
        let request = store().remove("posts/p1");
        assert_eq!(request.method, HttpMethod::Delete);
        assert!(request.url.starts_with("https://rg.firebaseio.com/posts/p1.json"));
    }

    #[test]
    fn null_snapshot_is_empty() {
        let ctx = GatewayRequest::ReadAll { request_id: 1, path: "posts".into() }.context();
        assert_eq!(
            store().interpret(&ctx, &reply(200, "null")),
            GatewayResponse::Snapshot { request_id: 1, records: Default::default() }
        );
    }

    #[test]
    fn error_body_and_status_are_failures() {
        let ctx = GatewayRequest::Remove { request_id: 2, path: "posts/p".into() }.context();
        match store().interpret(&ctx, &reply(401, r#"{"error":"Permission denied"}"#)) {
            GatewayResponse::Failed { message, op, .. } => {
                assert_eq!(message, "Permission denied");
                assert_eq!(op, GatewayOp::Remove);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            store().interpret(&ctx, &reply(503, "")),
            GatewayResponse::Failed { .. }
        ));
        assert_eq!(
            store().interpret(&ctx, &reply(200, "null")),
            GatewayResponse::Removed { request_id: 2 }
        );
    }

    #[test]
    fn poll_reply_carries_subscription() {
        let ctx = GatewayRequest::Poll { request_id: 9, subscription: 1, path: "reports".into() }
            .context();
        let response = store().interpret(&ctx, &reply(200, r#"{"r1":{"status":"pending"}}"#));
        match response {
            GatewayResponse::Polled { subscription, records, .. } => {
                assert_eq!(subscription, 1);
                assert_eq!(records.len(), 1);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}

//! Request and response types exchanged with the remote store.
//!
//! Requests leave the view-model as [`Action::Gateway`](crate::app::Action)
//! values; the plugin runtime turns them into web requests and tags each one
//! with a [`RequestContext`]. The runtime echoes that context back with the
//! reply, which is how a response finds its way to the pending operation that
//! caused it.

use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Context key marking a web request as belonging to the gateway.
pub const CONTEXT_KIND: &str = "roadguard.kind";

/// Value of [`CONTEXT_KIND`] for gateway requests.
pub const KIND_GATEWAY: &str = "gateway";

/// Monotonically increasing identifier of one gateway request.
pub type RequestId = u64;

/// Identifier of a registered subscription.
pub type SubscriptionId = u64;

/// Tracing context carried through a request so the response span can be
/// correlated with the span that issued it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceContext {
    /// OpenTelemetry trace ID as a hex string.
    pub trace_id: String,
    /// Span ID of the issuing span.
    pub span_id: String,
}

impl TraceContext {
    /// Captures the trace and span IDs of the current tracing span.
    ///
    /// Returns `None` when no OpenTelemetry layer is installed or the span
    /// context is not valid.
    #[must_use]
    pub fn from_current() -> Option<Self> {
        use opentelemetry::trace::TraceContextExt;
        use tracing_opentelemetry::OpenTelemetrySpanExt;

        let context = tracing::Span::current().context();
        let span = context.span();
        let span_context = span.span_context();

        span_context.is_valid().then(|| Self {
            trace_id: format!("{:032x}", span_context.trace_id()),
            span_id: format!("{:016x}", span_context.span_id()),
        })
    }
}

/// The operation a request performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayOp {
    ReadAll,
    Write,
    Remove,
    Poll,
}

impl GatewayOp {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ReadAll => "read_all",
            Self::Write => "write",
            Self::Remove => "remove",
            Self::Poll => "poll",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "read_all" => Some(Self::ReadAll),
            "write" => Some(Self::Write),
            "remove" => Some(Self::Remove),
            "poll" => Some(Self::Poll),
            _ => None,
        }
    }
}

/// A request for the remote store.
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayRequest {
    /// Bulk read of an entire collection.
    ReadAll { request_id: RequestId, path: String },

    /// Partial update of the record at `path`; only `fields` are written.
    Write {
        request_id: RequestId,
        path: String,
        fields: Map<String, Value>,
    },

    /// Destructive removal of the record at `path`.
    Remove { request_id: RequestId, path: String },

    /// Bulk read on behalf of a subscription.
    Poll {
        request_id: RequestId,
        subscription: SubscriptionId,
        path: String,
    },
}

impl GatewayRequest {
    #[must_use]
    pub const fn request_id(&self) -> RequestId {
        match self {
            Self::ReadAll { request_id, .. }
            | Self::Write { request_id, .. }
            | Self::Remove { request_id, .. }
            | Self::Poll { request_id, .. } => *request_id,
        }
    }

    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::ReadAll { path, .. }
            | Self::Write { path, .. }
            | Self::Remove { path, .. }
            | Self::Poll { path, .. } => path,
        }
    }

    #[must_use]
    pub const fn op(&self) -> GatewayOp {
        match self {
            Self::ReadAll { .. } => GatewayOp::ReadAll,
            Self::Write { .. } => GatewayOp::Write,
            Self::Remove { .. } => GatewayOp::Remove,
            Self::Poll { .. } => GatewayOp::Poll,
        }
    }

    /// Builds the context echoed back with this request's reply.
    #[must_use]
    pub fn context(&self) -> RequestContext {
        RequestContext {
            request_id: self.request_id(),
            op: self.op(),
            path: self.path().to_string(),
            subscription: match self {
                Self::Poll { subscription, .. } => Some(*subscription),
                _ => None,
            },
            trace: TraceContext::from_current(),
        }
    }
}

/// Correlation data attached to a web request and returned with its reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub request_id: RequestId,
    pub op: GatewayOp,
    pub path: String,
    pub subscription: Option<SubscriptionId>,
    pub trace: Option<TraceContext>,
}

impl RequestContext {
    /// Encodes the context as the string map carried by a web request.
    #[must_use]
    pub fn to_map(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        map.insert(CONTEXT_KIND.to_string(), KIND_GATEWAY.to_string());
        map.insert("request_id".to_string(), self.request_id.to_string());
        map.insert("op".to_string(), self.op.as_str().to_string());
        map.insert("path".to_string(), self.path.clone());
        if let Some(subscription) = self.subscription {
            map.insert("subscription".to_string(), subscription.to_string());
        }
        if let Some(trace) = &self.trace {
            map.insert("trace_id".to_string(), trace.trace_id.clone());
            map.insert("span_id".to_string(), trace.span_id.clone());
        }
        map
    }

    /// Decodes a context map; `None` if it was not produced by [`to_map`](Self::to_map).
    #[must_use]
    pub fn from_map(map: &BTreeMap<String, String>) -> Option<Self> {
        if map.get(CONTEXT_KIND).map(String::as_str) != Some(KIND_GATEWAY) {
            return None;
        }
        let request_id = map.get("request_id")?.parse().ok()?;
        let op = GatewayOp::parse(map.get("op")?)?;
        let path = map.get("path")?.clone();
        let subscription = match map.get("subscription") {
            Some(s) => Some(s.parse().ok()?),
            None => None,
        };
        let trace = match (map.get("trace_id"), map.get("span_id")) {
            (Some(trace_id), Some(span_id)) => Some(TraceContext {
                trace_id: trace_id.clone(),
                span_id: span_id.clone(),
            }),
            _ => None,
        };

        Some(Self {
            request_id,
            op,
            path,
            subscription,
            trace,
        })
    }
}

/// Outcome of a gateway request, delivered to the view-model as an event.
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayResponse {
    /// A bulk read completed; an absent collection yields an empty map.
    Snapshot {
        request_id: RequestId,
        records: BTreeMap<String, Value>,
    },

    /// A subscription poll completed.
    Polled {
        request_id: RequestId,
        subscription: SubscriptionId,
        records: BTreeMap<String, Value>,
    },

    /// A partial update was accepted.
    Written { request_id: RequestId },

    /// A removal was accepted.
    Removed { request_id: RequestId },

    /// The request failed; `message` is suitable for display.
    Failed {
        request_id: RequestId,
        op: GatewayOp,
        subscription: Option<SubscriptionId>,
        message: String,
    },
}

impl GatewayResponse {
    #[must_use]
    pub const fn request_id(&self) -> RequestId {
        match self {
            Self::Snapshot { request_id, .. }
            | Self::Polled { request_id, .. }
            | Self::Written { request_id }
            | Self::Removed { request_id }
            | Self::Failed { request_id, .. } => *request_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_survives_the_string_map() {
        let ctx = RequestContext {
            request_id: 42,
            op: GatewayOp::Poll,
            path: "reports".to_string(),
            subscription: Some(3),
            trace: Some(TraceContext {
                trace_id: "ab".repeat(16),
                span_id: "cd".repeat(8),
            }),
        };
        assert_eq!(RequestContext::from_map(&ctx.to_map()), Some(ctx));
    }

    #[test]
    fn foreign_context_is_not_decoded() {
        let mut map = BTreeMap::new();
        map.insert(CONTEXT_KIND.to_string(), "map".to_string());
        map.insert("request_id".to_string(), "1".to_string());
        assert!(RequestContext::from_map(&map).is_none());
    }

    #[test]
    fn request_context_without_tracing_layer_has_no_trace() {
        let request = GatewayRequest::Remove {
            request_id: 7,
            path: "posts/abc".to_string(),
        };
        let ctx = request.context();
        assert_eq!(ctx.request_id, 7);
        assert_eq!(ctx.op, GatewayOp::Remove);
        assert!(ctx.trace.is_none());
    }
}

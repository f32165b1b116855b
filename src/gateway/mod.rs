//! Remote store gateway.
//!
//! Read, write, remove and subscribe against a hierarchical key-value backend.
//! The gateway never performs I/O: it builds [`HttpRequest`]s for the plugin
//! runtime to send and interprets the replies into [`GatewayResponse`]s.

pub mod firebase;
pub mod messages;
pub mod store;
pub mod subscription;

pub use firebase::FirebaseRest;
pub use messages::{
    GatewayOp, GatewayRequest, GatewayResponse, RequestContext, RequestId, SubscriptionId,
    TraceContext, CONTEXT_KIND, KIND_GATEWAY,
};
pub use store::{HttpMethod, HttpReply, HttpRequest, RemoteStore};
pub use subscription::{ChangeNotification, Subscriptions};

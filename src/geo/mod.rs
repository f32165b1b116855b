//! Geocode/map adapter.
//!
//! For each visible post with a location the adapter makes sure the mapping
//! widget has been loaded (once, process-wide), mounts a map handle centred on
//! the post and resolves the coordinates to a street address. Any failure
//! degrades to showing the raw coordinates.

pub mod adapter;
pub mod geocode;
pub mod loader;

pub use adapter::{AddressSlot, MapAdapter, MapHandle, DEFAULT_ZOOM};
pub use geocode::{Generation, MapRequest, MapResponse, MapsClient, KIND_MAP};
pub use loader::{LoadDecision, LoaderStatus, WidgetLoader};

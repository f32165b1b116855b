//! Per-visible-post map handles and their reverse-geocoded addresses.
//!
//! The adapter owns one [`MapHandle`] per visible post with a location. Each
//! pass over the visible slice drops handles for posts that left it; a result
//! arriving for a dropped handle, or for an older generation of a handle,
//! is ignored.

use super::geocode::{Generation, MapRequest, MapResponse, MapsClient};
use super::loader::{LoadDecision, LoaderStatus, WidgetLoader};
use crate::domain::{GeoPoint, Post, PostId};
use std::collections::HashMap;

/// Zoom level of a post's map view.
pub const DEFAULT_ZOOM: u8 = 15;

/// What a post's address line shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressSlot {
    /// Geocode outstanding.
    Pending,
    /// Formatted address from the mapping service.
    Resolved(String),
    /// Raw coordinates, shown when no address is available.
    Fallback(String),
}

impl AddressSlot {
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Pending => "Locating…",
            Self::Resolved(text) | Self::Fallback(text) => text,
        }
    }
}

/// A mounted (or waiting) map view for one post.
#[derive(Debug, Clone, PartialEq)]
pub struct MapHandle {
    pub post_id: PostId,
    pub generation: Generation,
    pub center: GeoPoint,
    pub marker: GeoPoint,
    pub zoom: u8,
    /// Whether the map view exists; false while waiting on the widget.
    pub mounted: bool,
    pub address: AddressSlot,
}

#[derive(Debug, Default)]
pub struct MapAdapter {
    client: Option<MapsClient>,
    loader: WidgetLoader,
    handles: HashMap<PostId, MapHandle>,
    next_generation: Generation,
}

impl MapAdapter {
    /// Creates an adapter; without a client every address falls back to coordinates.
    #[must_use]
    pub fn new(client: Option<MapsClient>) -> Self {
        Self {
            client,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn client(&self) -> Option<&MapsClient> {
        self.client.as_ref()
    }

    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.client.is_some()
    }

    #[must_use]
    pub const fn loader_status(&self) -> &LoaderStatus {
        self.loader.status()
    }

    #[must_use]
    pub fn handle(&self, post_id: &str) -> Option<&MapHandle> {
        self.handles.get(post_id)
    }

    #[must_use]
    pub fn handle_count(&self) -> usize {
        self.handles.len()
    }

    /// Address slot for a visible post, if it has a location.
    #[must_use]
    pub fn address_for(&self, post_id: &str) -> Option<&AddressSlot> {
        self.handles.get(post_id).map(|h| &h.address)
    }

    /// Runs one adapter pass over the visible slice.
    ///
    /// Returns the requests to issue: at most one widget load and one reverse
    /// geocode per newly mounted handle.
    pub fn sync_visible(&mut self, visible: &[Post]) -> Vec<MapRequest> {
        let _span = tracing::debug_span!("map_pass", visible = visible.len()).entered();

        let located: HashMap<&str, GeoPoint> = visible
            .iter()
            .filter_map(|p| p.location.map(|loc| (p.id.as_str(), loc)))
            .collect();

        let stale: Vec<PostId> = self
            .handles
            .iter()
            .filter(|(id, handle)| located.get(id.as_str()) != Some(&handle.center))
            .map(|(id, _)| id.clone())
            .collect();
        for id in stale {
            self.handles.remove(&id);
            self.loader.forget(&id);
            tracing::trace!(post_id = %id, "map handle dropped");
        }

        let mut requests = Vec::new();
        for post in visible {
            let Some(point) = post.location else { continue };

            if !self.handles.contains_key(&post.id) {
                self.next_generation += 1;
                let address = if self.client.is_some() {
                    AddressSlot::Pending
                } else {
                    AddressSlot::Fallback(point.display())
                };
                self.handles.insert(
                    post.id.clone(),
                    MapHandle {
                        post_id: post.id.clone(),
                        generation: self.next_generation,
                        center: point,
                        marker: point,
                        zoom: DEFAULT_ZOOM,
                        mounted: false,
                        address,
                    },
                );
            }

            if self.client.is_none() || self.handles.get(&post.id).is_some_and(|h| h.mounted) {
                continue;
            }

            match self.loader.request(&post.id) {
                LoadDecision::Ready => requests.extend(self.mount(&post.id)),
                LoadDecision::Start => requests.push(MapRequest::LoadWidget),
                LoadDecision::Wait => {}
            }
        }

        tracing::debug!(
            handles = self.handles.len(),
            requests = requests.len(),
            "map pass complete"
        );
        requests
    }

    /// Applies a mapping-service result, returning follow-up requests.
    pub fn on_response(&mut self, response: MapResponse) -> Vec<MapRequest> {
        match response {
            MapResponse::WidgetLoaded => {
                tracing::info!("map widget loaded");
                self.loader
                    .complete(Ok(()))
                    .iter()
                    .filter_map(|id| self.mount(id))
                    .collect()
            }
            MapResponse::WidgetFailed { message } => {
                tracing::warn!(error = %message, "map widget failed to load");
                for id in self.loader.complete(Err(message)) {
                    if let Some(handle) = self.handles.get_mut(&id) {
                        handle.address = AddressSlot::Fallback(handle.center.display());
                    }
                }
                vec![]
            }
            MapResponse::Geocoded {
                post_id,
                generation,
                address,
            } => {
                if let Some(handle) = self.current(&post_id, generation) {
                    handle.address = AddressSlot::Resolved(address);
                }
                vec![]
            }
            MapResponse::GeocodeFailed {
                post_id,
                generation,
                message,
            } => {
                if let Some(handle) = self.current(&post_id, generation) {
                    tracing::warn!(post_id = %post_id, error = %message, "reverse geocode failed");
                    handle.address = AddressSlot::Fallback(handle.center.display());
                }
                vec![]
            }
        }
    }

    fn current(&mut self, post_id: &str, generation: Generation) -> Option<&mut MapHandle> {
        let handle = self
            .handles
            .get_mut(post_id)
            .filter(|h| h.generation == generation);
        if handle.is_none() {
            tracing::trace!(post_id = %post_id, generation, "ignoring result for stale map handle");
        }
        handle
    }

    fn mount(&mut self, post_id: &str) -> Option<MapRequest> {
        let handle = self.handles.get_mut(post_id)?;
        handle.mounted = true;
        handle.address = AddressSlot::Pending;
        Some(MapRequest::ReverseGeocode {
            post_id: handle.post_id.clone(),
            generation: handle.generation,
            point: handle.marker,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Secret;

    fn located(id: &str, lat: f64) -> Post {
        let mut post = Post::new(id, "t", "b");
        post.location = Some(GeoPoint::new(lat, 121.0).unwrap());
        post
    }

    fn adapter() -> MapAdapter {
        MapAdapter::new(Some(MapsClient::new("w", "g", Secret::new("k"))))
    }

    fn geocodes(requests: &[MapRequest]) -> Vec<(PostId, Generation)> {
        requests
            .iter()
            .filter_map(|r| match r {
                MapRequest::ReverseGeocode { post_id, generation, .. } => {
                    Some((post_id.clone(), *generation))
                }
                MapRequest::LoadWidget => None,
            })
            .collect()
    }

    #[test]
    fn widget_loads_once_and_releases_waiting_mounts() {
        let mut adapter = adapter();
        let visible = vec![located("a", 1.0), Post::new("b", "t", "b"), located("c", 2.0)];

        let requests = adapter.sync_visible(&visible);
        assert_eq!(requests, vec![MapRequest::LoadWidget]);
        assert_eq!(adapter.handle_count(), 2);

        assert!(adapter.sync_visible(&visible).is_empty());

        let released = adapter.on_response(MapResponse::WidgetLoaded);
        let ids: Vec<_> = geocodes(&released).into_iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["a".to_string(), "c".to_string()]);
        assert!(adapter.handle("b").is_none());
    }

    #[test]
    fn results_for_dropped_handles_are_ignored() {
        let mut adapter = adapter();
        adapter.sync_visible(&[located("a", 1.0)]);
        let released = adapter.on_response(MapResponse::WidgetLoaded);
        let (_, generation) = geocodes(&released)[0].clone();

        adapter.sync_visible(&[located("z", 3.0)]);
        assert!(adapter.handle("a").is_none());

        adapter.on_response(MapResponse::Geocoded {
            post_id: "a".into(),
            generation,
            address: "late".into(),
        });
        assert!(adapter.address_for("a").is_none());
    }

    #[test]
    fn older_generation_does_not_overwrite_newer_handle() {
        let mut adapter = adapter();
        adapter.sync_visible(&[located("a", 1.0)]);
        let first = geocodes(&adapter.on_response(MapResponse::WidgetLoaded))[0].1;

        adapter.sync_visible(&[]);
        let second = geocodes(&adapter.sync_visible(&[located("a", 1.0)]))[0].1;
        assert!(second > first);

        adapter.on_response(MapResponse::Geocoded {
            post_id: "a".into(),
            generation: first,
            address: "old".into(),
        });
        assert_eq!(adapter.address_for("a"), Some(&AddressSlot::Pending));

        adapter.on_response(MapResponse::Geocoded {
            post_id: "a".into(),
            generation: second,
            address: "Quezon Ave".into(),
        });
        assert_eq!(adapter.address_for("a"), Some(&AddressSlot::Resolved("Quezon Ave".into())));
    }

    #[test]
    fn geocode_failure_falls_back_to_coordinates() {
        let mut adapter = adapter();
        adapter.sync_visible(&[located("a", 1.0)]);
        let generation = geocodes(&adapter.on_response(MapResponse::WidgetLoaded))[0].1;

        adapter.on_response(MapResponse::GeocodeFailed {
            post_id: "a".into(),
            generation,
            message: "ZERO_RESULTS".into(),
        });
        assert_eq!(
            adapter.address_for("a"),
            Some(&AddressSlot::Fallback("1.00000, 121.00000".into()))
        );
    }

    #[test]
    fn failed_widget_is_retried_on_next_pass() {
        let mut adapter = adapter();
        let visible = vec![located("a", 1.0)];
        adapter.sync_visible(&visible);
        adapter.on_response(MapResponse::WidgetFailed { message: "HTTP 403".into() });
        assert!(matches!(adapter.address_for("a"), Some(AddressSlot::Fallback(_))));

        assert_eq!(adapter.sync_visible(&visible), vec![MapRequest::LoadWidget]);
    }

    #[test]
    fn disabled_adapter_shows_coordinates_without_requests() {
        let mut adapter = MapAdapter::new(None);
        assert!(adapter.sync_visible(&[located("a", 1.0)]).is_empty());
        assert_eq!(adapter.address_for("a").map(AddressSlot::text), Some("1.00000, 121.00000"));
    }
}

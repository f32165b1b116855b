//! Change subscriptions layered on periodic bulk reads.
//!
//! The REST API offers no push channel the plugin runtime can hold open, so a
//! subscription is a path plus a poll interval. Each poll result is compared
//! with the last snapshot delivered; only a difference produces a
//! [`ChangeNotification`]. The first successful poll always notifies.

use super::messages::SubscriptionId;
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use std::collections::BTreeMap;

/// Longest accepted poll interval, one day.
const MAX_INTERVAL_SECS: u64 = 86_400;

/// A changed snapshot for one subscription.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeNotification {
    pub subscription: SubscriptionId,
    pub path: String,
    pub records: BTreeMap<String, Value>,
}

#[derive(Debug)]
struct Subscription {
    id: SubscriptionId,
    path: String,
    interval: Duration,
    next_due: DateTime<Utc>,
    in_flight: bool,
    last: Option<BTreeMap<String, Value>>,
}

/// Registry of active subscriptions and their poll schedule.
#[derive(Debug, Default)]
pub struct Subscriptions {
    entries: Vec<Subscription>,
    next_id: SubscriptionId,
}

impl Subscriptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a subscription on `path`, due for its first poll at `now`.
    pub fn subscribe(
        &mut self,
        path: impl Into<String>,
        interval_secs: u64,
        now: DateTime<Utc>,
    ) -> SubscriptionId {
        self.next_id += 1;
        let id = self.next_id;
        let secs = interval_secs.clamp(1, MAX_INTERVAL_SECS);
        let interval = Duration::seconds(i64::try_from(secs).unwrap_or(1));
        let path = path.into();

        tracing::debug!(subscription = id, path = %path, interval_secs = secs, "subscription registered");

        self.entries.push(Subscription {
            id,
            path,
            interval,
            next_due: now,
            in_flight: false,
            last: None,
        });
        id
    }

    /// Subscriptions whose poll is due at `now`, as `(id, path)` pairs.
    ///
    /// Returned subscriptions are marked in flight and rescheduled; a
    /// subscription with a poll outstanding is never returned twice.
    pub fn take_due(&mut self, now: DateTime<Utc>) -> Vec<(SubscriptionId, String)> {
        self.entries
            .iter_mut()
            .filter(|s| !s.in_flight && s.next_due <= now)
            .map(|s| {
                s.in_flight = true;
                s.next_due = now + s.interval;
                (s.id, s.path.clone())
            })
            .collect()
    }

    /// Earliest time a subscription without an outstanding poll is due.
    #[must_use]
    pub fn next_deadline(&self) -> Option<DateTime<Utc>> {
        self.entries
            .iter()
            .filter(|s| !s.in_flight)
            .map(|s| s.next_due)
            .min()
    }

    /// Records a poll result, returning a notification if the snapshot changed.
    pub fn deliver(
        &mut self,
        id: SubscriptionId,
        records: BTreeMap<String, Value>,
    ) -> Option<ChangeNotification> {
        let entry = self.entries.iter_mut().find(|s| s.id == id)?;
        entry.in_flight = false;

        if entry.last.as_ref() == Some(&records) {
            tracing::trace!(subscription = id, "poll unchanged");
            return None;
        }

        entry.last = Some(records.clone());
        Some(ChangeNotification {
            subscription: id,
            path: entry.path.clone(),
            records,
        })
    }

    /// Records a failed poll; the subscription stays scheduled.
    pub fn fail(&mut self, id: SubscriptionId) {
        if let Some(entry) = self.entries.iter_mut().find(|s| s.id == id) {
            entry.in_flight = false;
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

//! Post domain model, wire record validation and partial updates.
//!
//! Posts arrive from the remote store as untyped JSON objects written by the
//! RoadGuard mobile app. [`Post::from_record`] validates one record before the
//! feed uses it; [`PostPatch`] describes the only mutations the console makes
//! to a post that it keeps.

use super::error::ValidationError;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Number of seconds in one minute.
const SECONDS_PER_MINUTE: i64 = 60;

/// Number of seconds in one hour.
const SECONDS_PER_HOUR: i64 = 3600;

/// Number of seconds in one day.
const SECONDS_PER_DAY: i64 = 86400;

/// Characters the realtime database forbids in keys.
const FORBIDDEN_KEY_CHARS: [char; 6] = ['.', '$', '#', '[', ']', '/'];

/// Backend-assigned post key.
pub type PostId = String;

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// Validates and builds a point.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidField`] when either coordinate is not
    /// finite or lies outside the WGS84 range.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, ValidationError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(ValidationError::InvalidField {
                field: "location.latitude",
                reason: format!("{latitude} is outside [-90, 90]"),
            });
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(ValidationError::InvalidField {
                field: "location.longitude",
                reason: format!("{longitude} is outside [-180, 180]"),
            });
        }
        Ok(Self { latitude, longitude })
    }

    /// Formats the pair as shown when no address is available.
    ///
    /// ```
    /// use roadguard_moderator::domain::GeoPoint;
    ///
    /// let p = GeoPoint::new(14.5995, 120.9842).unwrap();
    /// assert_eq!(p.display(), "14.59950, 120.98420");
    /// ```
    #[must_use]
    pub fn display(&self) -> String {
        format!("{:.5}, {:.5}", self.latitude, self.longitude)
    }
}

/// A road-hazard post as held in the feed's working set.
#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub body: String,
    pub author: String,
    pub author_photo: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub location: Option<GeoPoint>,
    pub upvotes: i64,
    pub downvotes: i64,
    pub resolved: bool,

    /// Wire key the body was read from; edits write back to it.
    pub body_key: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireTimestamp {
    Millis(f64),
    Text(String),
}

#[derive(Debug, Deserialize)]
struct WireLocation {
    #[serde(alias = "lat")]
    latitude: f64,
    #[serde(alias = "lng")]
    longitude: f64,
}

/// Body key written for posts that did not come from a record.
pub const DEFAULT_BODY_KEY: &str = "description";

/// Wire keys the mobile app has used for each field, in lookup order.
const BODY_KEYS: [&str; 3] = [DEFAULT_BODY_KEY, "body", "content"];
const AUTHOR_KEYS: [&str; 3] = ["userName", "authorName", "author"];
const PHOTO_KEYS: [&str; 2] = ["userPhoto", "authorPhoto"];
const IMAGE_KEYS: [&str; 2] = ["imageUrl", "image"];
const TIMESTAMP_KEYS: [&str; 2] = ["timestamp", "createdAt"];

/// Looks up the first of `keys` present in `record` and deserializes it.
///
/// Returns the key that matched so writes can go back to the same field.
fn first_present<T: DeserializeOwned>(
    record: &Map<String, Value>,
    keys: &[&'static str],
) -> Result<Option<(&'static str, T)>, ValidationError> {
    let Some((key, value)) = keys
        .iter()
        .find_map(|key| record.get(*key).filter(|v| !v.is_null()).map(|v| (*key, v)))
    else {
        return Ok(None);
    };
    serde_json::from_value(value.clone())
        .map(|parsed| Some((key, parsed)))
        .map_err(|e| ValidationError::InvalidField {
            field: key,
            reason: e.to_string(),
        })
}

fn optional<T: DeserializeOwned>(
    record: &Map<String, Value>,
    keys: &[&'static str],
) -> Result<Option<T>, ValidationError> {
    Ok(first_present(record, keys)?.map(|(_, value)| value))
}

impl Post {
    /// Creates an open post with zero votes, no media and no location.
    ///
    /// The creation timestamp is set to the current time.
    ///
    /// ```
    /// use roadguard_moderator::domain::Post;
    ///
    /// let post = Post::new("p1", "Flooding", "Knee-deep water near the bridge");
    /// assert_eq!(post.score(), 0);
    /// assert!(!post.resolved);
    /// ```
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            body: body.into(),
            author: "Anonymous".to_string(),
            author_photo: None,
            image_url: None,
            created_at: Utc::now(),
            location: None,
            upvotes: 0,
            downvotes: 0,
            resolved: false,
            body_key: DEFAULT_BODY_KEY,
        }
    }

    /// Validates one backend record and converts it into a post.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::InvalidField`] for an unusable key, a mistyped
    ///   field, an unparseable timestamp or an out-of-range location
    /// - [`ValidationError::MissingField`] when the title or body is absent
    pub fn from_record(id: &str, record: &Value) -> Result<Self, ValidationError> {
        if !is_valid_key(id) {
            return Err(ValidationError::InvalidField {
                field: "id",
                reason: format!("`{id}` cannot address a child path"),
            });
        }

        let record = record.as_object().ok_or_else(|| ValidationError::InvalidField {
            field: "record",
            reason: format!("expected an object, found {record}"),
        })?;

        let title: String = optional(record, &["title"])?.ok_or(ValidationError::MissingField("title"))?;
        let (body_key, body): (_, String) =
            first_present(record, &BODY_KEYS)?.ok_or(ValidationError::MissingField("description"))?;

        let created_at = match first_present(record, &TIMESTAMP_KEYS)? {
            None => DateTime::<Utc>::default(),
            Some((field, WireTimestamp::Millis(ms))) => {
                #[allow(clippy::cast_possible_truncation)]
                let millis = ms as i64;
                DateTime::from_timestamp_millis(millis).ok_or_else(|| {
                    ValidationError::InvalidField {
                        field,
                        reason: format!("{ms} is out of range"),
                    }
                })?
            }
            Some((field, WireTimestamp::Text(text))) => DateTime::parse_from_rfc3339(&text)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| ValidationError::InvalidField {
                    field,
                    reason: e.to_string(),
                })?,
        };

        let location = optional::<WireLocation>(record, &["location"])?
            .map(|loc| GeoPoint::new(loc.latitude, loc.longitude))
            .transpose()?;

        Ok(Self {
            id: id.to_string(),
            title,
            body,
            author: optional::<String>(record, &AUTHOR_KEYS)?
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| "Anonymous".to_string()),
            author_photo: optional(record, &PHOTO_KEYS)?,
            image_url: optional(record, &IMAGE_KEYS)?,
            created_at,
            location,
            upvotes: vote_count("upvotes", record.get("upvotes"))?,
            downvotes: vote_count("downvotes", record.get("downvotes"))?,
            resolved: optional(record, &["resolved"])?.unwrap_or(false),
            body_key,
        })
    }

    /// Converts a collection snapshot into posts, in key order.
    ///
    /// Records that fail validation are skipped and logged; they never fail
    /// the snapshot as a whole.
    #[must_use]
    pub fn collect_snapshot(records: &BTreeMap<String, Value>) -> Vec<Self> {
        records
            .iter()
            .filter_map(|(id, record)| match Self::from_record(id, record) {
                Ok(post) => Some(post),
                Err(e) => {
                    tracing::warn!(post_id = %id, error = %e, "skipping invalid post record");
                    None
                }
            })
            .collect()
    }

    /// Net vote score (upvotes minus downvotes).
    #[must_use]
    pub const fn score(&self) -> i64 {
        self.upvotes.saturating_sub(self.downvotes)
    }

    /// Returns a human-readable string describing how long ago the post was made.
    ///
    /// - Less than 1 minute: "just now"
    /// - Less than 1 hour: "Xm ago"
    /// - Less than 1 day: "Xh ago"
    /// - 1 day or more: "Xd ago"
    #[must_use]
    pub fn time_ago(&self, now: DateTime<Utc>) -> String {
        let diff = (now - self.created_at).num_seconds();

        if diff < SECONDS_PER_MINUTE {
            "just now".to_string()
        } else if diff < SECONDS_PER_HOUR {
            let mins = diff / SECONDS_PER_MINUTE;
            format!("{mins}m ago")
        } else if diff < SECONDS_PER_DAY {
            let hours = diff / SECONDS_PER_HOUR;
            format!("{hours}h ago")
        } else {
            let days = diff / SECONDS_PER_DAY;
            format!("{days}d ago")
        }
    }
}

fn vote_count(field: &'static str, value: Option<&Value>) -> Result<i64, ValidationError> {
    let Some(value) = value else {
        return Ok(0);
    };
    if value.is_null() {
        return Ok(0);
    }
    value
        .as_i64()
        .or_else(|| {
            #[allow(clippy::cast_possible_truncation)]
            value.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)
        })
        .filter(|count| *count >= 0)
        .ok_or_else(|| ValidationError::InvalidField {
            field,
            reason: format!("{value} is not a vote count"),
        })
}

/// Returns `true` if `key` can be used as a single path segment.
#[must_use]
pub fn is_valid_key(key: &str) -> bool {
    !key.is_empty() && !key.contains(FORBIDDEN_KEY_CHARS)
}

/// A partial update applied to one post.
///
/// Only the fields named by the variant are written remotely and patched
/// locally; every other field of the local record is preserved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostPatch {
    /// Marks the post resolved.
    Resolve,

    /// Replaces the editable text of the post.
    ///
    /// `body_key` names the wire field the body was read from.
    Content {
        title: String,
        body: String,
        body_key: &'static str,
    },
}

impl PostPatch {
    /// The wire fields this patch writes.
    ///
    /// ```
    /// use roadguard_moderator::domain::PostPatch;
    ///
    /// let fields = PostPatch::Resolve.fields();
    /// assert_eq!(fields.get("resolved"), Some(&serde_json::Value::Bool(true)));
    /// assert_eq!(fields.len(), 1);
    /// ```
    #[must_use]
    pub fn fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        match self {
            Self::Resolve => {
                fields.insert("resolved".to_string(), Value::Bool(true));
            }
            Self::Content { title, body, body_key } => {
                fields.insert("title".to_string(), Value::String(title.clone()));
                fields.insert((*body_key).to_string(), Value::String(body.clone()));
            }
        }
        fields
    }

    /// Applies the patch to a local post.
    pub fn apply_to(&self, post: &mut Post) {
        match self {
            Self::Resolve => post.resolved = true,
            Self::Content { title, body, .. } => {
                post.title.clone_from(title);
                post.body.clone_from(body);
            }
        }
    }
}

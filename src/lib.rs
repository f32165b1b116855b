//! RoadGuard Moderator: a Zellij plugin for moderating road-hazard reports.
//!
//! The plugin shows the posts collection of the RoadGuard realtime database
//! as a paged feed of cards and lets a moderator:
//! - Sort by recency or net votes and page through the results
//! - Search (fuzzy) and filter by resolved status
//! - Mark a post resolved, edit its title and description, or delete it with
//!   a recorded reason
//! - See where a hazard is, as a reverse-geocoded address
//! - Keep an eye on the number of user reports awaiting review

#![allow(clippy::multiple_crate_versions)]

//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │  Zellij Plugin Shim (main.rs)                       │  ← Entry point
//! │  - Key/mouse mapping, web requests, timers          │
//! └─────────────────────────────────────────────────────┘
//!                        │
//! ┌─────────────────────────────────────────────────────┐
//! │  Application Layer (app/)                           │  ← Feed view-model
//! │  - Event handling                                   │
//! │  - Moderation actions                               │
//! │  - View model computation                           │
//! └─────────────────────────────────────────────────────┘
//!         │                    │                    │
//! ┌───────────────┐   ┌───────────────┐   ┌───────────────┐
//! │ Feed (feed/)  │   │ Gateway       │   │ Geo (geo/)    │
//! │ - Sort        │   │ (gateway/)    │   │ - Widget load │
//! │ - Paginate    │   │ - Firebase    │   │ - Map handles │
//! │ - Filter      │   │ - Subscribe   │   │ - Geocoding   │
//! └───────────────┘   └───────────────┘   └───────────────┘
//!                        │
//! ┌─────────────────────────────────────────────────────┐
//! │  Domain, UI, Infrastructure, Observability          │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! All I/O leaves the library as [`Action`]s and comes back as [`Event`]s,
//! so the whole view-model runs and tests on the host without Zellij.
//!
//! # Configuration
//!
//! ```kdl
//! pane {
//!     plugin location="file:/path/to/roadguard-moderator.wasm" {
//!         database_url "https://roadguard-app.firebaseio.com"
//!         config_file "~/.config/roadguard/moderator.toml"
//!         page_size "5"
//!         theme "roadguard-night"
//!         trace_level "info"
//!     }
//! }
//! ```
//!
//! Secrets (`database_auth`, `maps_api_key`) belong in the `config_file`,
//! which supplies any key the layout leaves unset.
//!
//! # Example
//!
//! ```rust
//! use roadguard_moderator::{handle_event, initialize, Action, Config, Event};
//! use std::collections::BTreeMap;
//!
//! let mut map = BTreeMap::new();
//! map.insert("database_url".to_string(), "https://roadguard.firebaseio.com".to_string());
//!
//! let config = Config::from_zellij(&map);
//! let mut state = initialize(&config);
//!
//! let (_, actions) = handle_event(&mut state, &Event::Mount { now: chrono::Utc::now() })?;
//! assert!(actions.iter().any(|a| matches!(a, Action::Gateway(_))));
//! # Ok::<(), roadguard_moderator::ModeratorError>(())
//! ```

pub mod app;
pub mod domain;
pub mod feed;
pub mod gateway;
pub mod geo;
pub mod infrastructure;
pub mod observability;
pub mod ui;

pub use app::{handle_event, Action, AppState, Event, InputMode, SearchFocus};
pub use domain::{ModeratorError, Post, Result};
pub use ui::Theme;

use app::FeedSettings;
use feed::DEFAULT_PAGE_SIZE;
use gateway::FirebaseRest;
use geo::{MapAdapter, MapsClient};
use std::collections::BTreeMap;

/// Default mapping widget script URL.
pub const DEFAULT_MAP_WIDGET_URL: &str = "https://maps.googleapis.com/maps/api/js";

/// Default reverse-geocoding endpoint.
pub const DEFAULT_GEOCODE_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";

/// A credential taken from configuration.
///
/// `Debug` never prints the value.
///
/// ```
/// use roadguard_moderator::Secret;
///
/// let key = Secret::new("AIza-example");
/// assert_eq!(format!("{key:?}"), "Secret(***)");
/// assert_eq!(key.expose(), "AIza-example");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw value, for building request URLs.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Secret(***)")
    }
}

/// Plugin configuration parsed from Zellij's configuration map.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root URL of the realtime database. Required.
    pub database_url: Option<String>,

    /// Database secret or ID token, sent as `?auth=`.
    pub database_auth: Option<Secret>,

    /// Mapping service key; without it locations show as coordinates.
    pub maps_api_key: Option<Secret>,

    pub map_widget_url: String,
    pub geocode_url: String,

    pub posts_path: String,
    pub reports_path: String,

    /// Posts per page, at least 1. Default: 5
    pub page_size: usize,

    /// Seconds a success message stays visible. Default: 3
    pub flash_secs: u64,

    /// Seconds between polls of the reports collection, at least 1. Default: 15
    pub poll_secs: u64,

    /// Built-in theme name. Ignored if `theme_file` is set.
    pub theme_name: Option<String>,

    /// Path to a custom TOML theme file.
    pub theme_file: Option<String>,

    /// `EnvFilter` directive for tracing. Default: `"info"`
    pub trace_level: Option<String>,

    /// TOML file supplying values the layout leaves unset.
    pub config_file: Option<String>,

    /// Why `config_file` could not be used, if it could not.
    pub config_file_error: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        let feed = FeedSettings::default();
        Self {
            database_url: None,
            database_auth: None,
            maps_api_key: None,
            map_widget_url: DEFAULT_MAP_WIDGET_URL.to_string(),
            geocode_url: DEFAULT_GEOCODE_URL.to_string(),
            posts_path: feed.posts_path,
            reports_path: feed.reports_path,
            page_size: DEFAULT_PAGE_SIZE,
            flash_secs: feed.flash_secs,
            poll_secs: feed.poll_secs,
            theme_name: None,
            theme_file: None,
            trace_level: None,
            config_file: None,
            config_file_error: None,
        }
    }
}

impl Config {
    /// Parses configuration from Zellij's configuration map.
    ///
    /// When `config_file` is given, its top-level keys fill in whatever the
    /// map leaves unset. Unparseable numbers fall back to their defaults.
    ///
    /// ```rust
    /// use roadguard_moderator::Config;
    /// use std::collections::BTreeMap;
    ///
    /// let mut map = BTreeMap::new();
    /// map.insert("database_url".to_string(), "https://rg.firebaseio.com".to_string());
    /// map.insert("page_size".to_string(), "10".to_string());
    /// map.insert("poll_secs".to_string(), "0".to_string());
    ///
    /// let config = Config::from_zellij(&map);
    /// assert_eq!(config.page_size, 10);
    /// assert_eq!(config.poll_secs, 1);
    /// assert!(config.maps_api_key.is_none());
    /// ```
    #[must_use]
    pub fn from_zellij(config: &BTreeMap<String, String>) -> Self {
        let mut merged = config.clone();
        let mut config_file_error = None;

        let config_file = non_empty(config.get("config_file"));
        if let Some(path) = &config_file {
            match load_config_file(&infrastructure::expand_tilde(path)) {
                Ok(file) => {
                    for (key, value) in file {
                        merged.entry(key).or_insert(value);
                    }
                }
                Err(e) => config_file_error = Some(format!("{path}: {e}")),
            }
        }

        let defaults = Self::default();
        let get = |key: &str| non_empty(merged.get(key));
        let number = |key: &str, default: u64| get(key).and_then(|s| s.parse::<u64>().ok()).unwrap_or(default);

        Self {
            database_url: get("database_url"),
            database_auth: get("database_auth").map(Secret::new),
            maps_api_key: get("maps_api_key").map(Secret::new),
            map_widget_url: get("map_widget_url").unwrap_or(defaults.map_widget_url),
            geocode_url: get("geocode_url").unwrap_or(defaults.geocode_url),
            posts_path: get("posts_path").unwrap_or(defaults.posts_path),
            reports_path: get("reports_path").unwrap_or(defaults.reports_path),
            page_size: get("page_size")
                .and_then(|s| s.parse::<usize>().ok())
                .unwrap_or(defaults.page_size)
                .max(1),
            flash_secs: number("flash_secs", defaults.flash_secs),
            poll_secs: number("poll_secs", defaults.poll_secs).max(1),
            theme_name: get("theme"),
            theme_file: get("theme_file"),
            trace_level: get("trace_level"),
            config_file,
            config_file_error,
        }
    }

    /// The problem that keeps the plugin from reaching the database, if any.
    #[must_use]
    pub fn problem(&self) -> Option<String> {
        if let Some(error) = &self.config_file_error {
            return Some(format!("config_file could not be read: {error}"));
        }
        match &self.database_url {
            None => Some("database_url is required".to_string()),
            Some(url) if !url.starts_with("https://") && !url.starts_with("http://") => {
                Some(format!("database_url must be an http(s) URL, got `{url}`"))
            }
            Some(_) => None,
        }
    }

    /// The remote store, when a database URL is configured.
    #[must_use]
    pub fn store(&self) -> Option<FirebaseRest> {
        self.database_url
            .as_ref()
            .map(|url| FirebaseRest::new(url.clone(), self.database_auth.clone()))
    }

    #[must_use]
    pub fn feed_settings(&self) -> FeedSettings {
        FeedSettings {
            posts_path: self.posts_path.clone(),
            reports_path: self.reports_path.clone(),
            page_size: self.page_size,
            flash_secs: self.flash_secs,
            poll_secs: self.poll_secs,
        }
    }
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value.map(|s| s.trim()).filter(|s| !s.is_empty()).map(String::from)
}

/// Reads the flat TOML table at `path` into string values.
fn load_config_file(path: &str) -> Result<BTreeMap<String, String>> {
    let contents = std::fs::read_to_string(path)?;
    let table: toml::Table = contents
        .parse()
        .map_err(|e: toml::de::Error| ModeratorError::Config(e.to_string()))?;

    Ok(table
        .into_iter()
        .filter_map(|(key, value)| {
            let value = match value {
                toml::Value::String(s) => s,
                toml::Value::Integer(i) => i.to_string(),
                toml::Value::Boolean(b) => b.to_string(),
                _ => return None,
            };
            Some((key, value))
        })
        .collect())
}

/// Builds the initial state from configuration.
///
/// Loads the theme (file, then name, then default) and the map adapter. A
/// configuration problem is kept in [`AppState::config_error`]; the plugin
/// then renders it instead of fetching.
pub fn initialize(config: &Config) -> AppState {
    tracing::debug!("initializing roadguard moderator");

    let theme = config.theme_file.as_ref().map_or_else(
        || {
            config.theme_name.as_ref().map_or_else(Theme::default, |theme_name| {
                Theme::from_name(theme_name).unwrap_or_else(|| {
                    tracing::warn!(theme_name = %theme_name, "unknown theme, using default");
                    Theme::default()
                })
            })
        },
        |theme_file| {
            Theme::from_file(infrastructure::expand_tilde(theme_file)).unwrap_or_else(|e| {
                tracing::warn!(theme_file = %theme_file, error = %e, "failed to load theme from file, using default");
                Theme::default()
            })
        },
    );

    let maps = MapAdapter::new(config.maps_api_key.clone().map(|key| {
        MapsClient::new(config.map_widget_url.clone(), config.geocode_url.clone(), key)
    }));
    if !maps.is_enabled() {
        tracing::info!("no maps_api_key configured, locations show as coordinates");
    }

    let mut state = AppState::new(config.feed_settings(), theme, maps);
    state.config_error = config.problem();
    if let Some(problem) = &state.config_error {
        tracing::error!(error = %ModeratorError::Config(problem.clone()), "plugin is not configured");
    }
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn map(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn missing_database_url_is_a_problem() {
        let config = Config::from_zellij(&map(&[]));
        assert_eq!(config.problem().as_deref(), Some("database_url is required"));
        assert!(initialize(&config).config_error.is_some());
    }

    #[test]
    fn config_file_fills_unset_keys_only() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "database_url = \"https://from-file.firebaseio.com\"\nmaps_api_key = \"k\"\npage_size = 8"
        )
        .unwrap();
        let path = file.path().to_string_lossy().to_string();

        let config = Config::from_zellij(&map(&[
            ("database_url", "https://from-layout.firebaseio.com"),
            ("config_file", path.as_str()),
        ]));

        assert_eq!(config.database_url.as_deref(), Some("https://from-layout.firebaseio.com"));
        assert_eq!(config.maps_api_key.as_ref().map(Secret::expose), Some("k"));
        assert_eq!(config.page_size, 8);
        assert!(config.problem().is_none());
    }

    #[test]
    fn unreadable_config_file_is_reported() {
        let config = Config::from_zellij(&map(&[
            ("database_url", "https://rg.firebaseio.com"),
            ("config_file", "/nonexistent/roadguard.toml"),
        ]));
        assert!(config.problem().unwrap().starts_with("config_file could not be read"));
    }

    #[test]
    fn secrets_are_redacted_in_debug_output() {
        let config = Config::from_zellij(&map(&[("database_auth", "hunter2")]));
        assert!(!format!("{config:?}").contains("hunter2"));
    }

    #[test]
    fn maps_key_enables_adapter() {
        let config = Config::from_zellij(&map(&[
            ("database_url", "https://rg.firebaseio.com"),
            ("maps_api_key", "abc"),
            ("theme", "roadguard-day"),
        ]));
        let state = initialize(&config);
        assert!(state.maps.is_enabled());
        assert_eq!(state.theme.name, "roadguard-day");
        assert!(state.config_error.is_none());
    }
}

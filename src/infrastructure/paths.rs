//! Path handling for the Zellij plugin sandbox.
//!
//! Inside the sandbox the host filesystem is reachable under `/host`, which
//! points at the directory Zellij was started from (usually `$HOME`).

use std::path::PathBuf;

/// Directory for trace files: `/host/.local/share/zellij/roadguard-moderator`.
///
/// ```
/// use roadguard_moderator::infrastructure::get_data_dir;
///
/// assert_eq!(
///     get_data_dir().to_str(),
///     Some("/host/.local/share/zellij/roadguard-moderator")
/// );
/// ```
#[must_use]
pub fn get_data_dir() -> PathBuf {
    PathBuf::from("/host/.local/share/zellij").join(env!("CARGO_PKG_NAME"))
}

/// Maps a `~`-prefixed path onto the sandbox's `/host` mount.
///
/// Used for the `theme_file` and `config_file` options.
///
/// ```
/// use roadguard_moderator::infrastructure::expand_tilde;
///
/// assert_eq!(expand_tilde("~/.config/roadguard.toml"), "/host/.config/roadguard.toml");
/// assert_eq!(expand_tilde("~"), "/host");
/// assert_eq!(expand_tilde("/etc/roadguard.toml"), "/etc/roadguard.toml");
/// ```
#[must_use]
pub fn expand_tilde(path: &str) -> String {
    if path.starts_with("~/") {
        path.replacen('~', "/host", 1)
    } else if path == "~" {
        "/host".to_string()
    } else {
        path.to_string()
    }
}

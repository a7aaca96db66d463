use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use crate::domain::Role;
use crate::infrastructure::runtime::SyncSettings;

pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";

/// Desktop notification consent
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationPermission {
    /// Ask on the first unread increase
    #[default]
    Ask,
    Granted,
    Denied,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_url: String,
    pub token: Option<String>,
    pub user_id: String,
    pub role: Role,
    pub poll_interval_ms: u64,
    pub debounce_ms: u64,
    pub cache_ttl_secs: u64,
    pub cache_sweep_secs: u64,
    pub notifications: NotificationPermission,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token: None,
            user_id: String::new(),
            role: Role::Unknown,
            poll_interval_ms: 5_000,
            debounce_ms: 200,
            cache_ttl_secs: 300,
            cache_sweep_secs: 600,
            notifications: NotificationPermission::Ask,
        }
    }
}

impl Config {
    pub fn sync_settings(&self) -> SyncSettings {
        SyncSettings {
            user_id: self.user_id.clone(),
            poll_interval: Duration::from_millis(self.poll_interval_ms.max(1)),
            debounce: Duration::from_millis(self.debounce_ms),
            cache_ttl: Duration::from_secs(self.cache_ttl_secs),
            cache_sweep: Duration::from_secs(self.cache_sweep_secs.max(1)),
        }
    }

    /// Environment overrides applied after the file
    pub fn apply_env(&mut self) {
        if let Some(token) = std::env::var("CHAUFFEUR_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty())
        {
            self.token = Some(token);
        }
    }
}

pub fn load() -> Config {
    let mut config = config_path()
        .and_then(|path| fs::read_to_string(&path).ok().map(|content| (path, content)))
        .map(|(path, content)| parse(&content, &path))
        .unwrap_or_default();
    config.apply_env();
    config
}

fn parse(content: &str, path: &std::path::Path) -> Config {
    match toml::from_str::<Config>(content) {
        Ok(config) => config,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "ignoring unreadable config");
            Config::default()
        }
    }
}

pub fn config_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os("CHAUFFEUR_CONFIG").map(PathBuf::from) {
        return Some(path);
    }
    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from) {
        return Some(xdg.join("chauffeur").join("config.toml"));
    }
    if let Some(home) = std::env::var_os("HOME").map(PathBuf::from) {
        return Some(home.join(".config").join("chauffeur").join("config.toml"));
    }

    directories::ProjectDirs::from("ci", "chauffeur", "chauffeur")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

pub fn data_dir() -> Option<PathBuf> {
    if let Some(xdg) = std::env::var_os("XDG_DATA_HOME").map(PathBuf::from) {
        return Some(xdg.join("chauffeur"));
    }
    if let Some(home) = std::env::var_os("HOME").map(PathBuf::from) {
        return Some(home.join(".local").join("share").join("chauffeur"));
    }
    directories::ProjectDirs::from("ci", "chauffeur", "chauffeur")
        .map(|dirs| dirs.data_dir().to_path_buf())
}

pub fn log_path() -> Option<PathBuf> {
    data_dir().map(|dir| dir.join("chauffeur.log"))
}

/// "http://host:port/api" from loose input
pub fn normalize_api_url(url: &str) -> String {
    let trimmed = url.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_partial_file_keeps_defaults() {
        let config = parse(
            r#"
            api_url = "https://api.chauffeur.ci/api"
            user_id = "u-7"
            role = "chauffeur"
            notifications = "denied"
            "#,
            std::path::Path::new("config.toml"),
        );
        assert_eq!(config.api_url, "https://api.chauffeur.ci/api");
        assert_eq!(config.role, Role::Driver);
        assert_eq!(config.notifications, NotificationPermission::Denied);
        assert_eq!(config.poll_interval_ms, 5_000);
        assert_eq!(config.debounce_ms, 200);
    }

    #[test]
    fn test_missing_role_cannot_publish() {
        let config = parse("user_id = \"u-9\"", std::path::Path::new("config.toml"));
        assert_eq!(config.role, Role::Unknown);
        assert!(!config.role.can_publish_offers());
    }

    #[test]
    fn test_parse_garbage_falls_back() {
        let config = parse("api_url = [", std::path::Path::new("config.toml"));
        assert_eq!(config.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn test_sync_settings() {
        let config = Config {
            poll_interval_ms: 0,
            cache_ttl_secs: 60,
            ..Config::default()
        };
        let settings = config.sync_settings();
        assert_eq!(settings.poll_interval, Duration::from_millis(1));
        assert_eq!(settings.cache_ttl, Duration::from_secs(60));
        assert_eq!(settings.cache_sweep, Duration::from_secs(600));
    }

    #[test]
    fn test_normalize_api_url() {
        assert_eq!(normalize_api_url("localhost:5000/api/"), "http://localhost:5000/api");
        assert_eq!(
            normalize_api_url(" https://api.chauffeur.ci "),
            "https://api.chauffeur.ci"
        );
    }
}

use crate::cli::CliArgs;
use crate::notify::DEFAULT_TOAST_LIFETIME;
use crate::poller::DEFAULT_POLL_PERIOD;
use crate::rotation::DEFAULT_ROTATION_INTERVAL;
use crate::view::ITEMS_PER_PAGE;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_FULL_REFRESH: Duration = Duration::from_secs(10 * 60);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Resolved runtime settings: CLI over config file over built-in defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub source: Option<String>,
    pub api_url: String,
    pub initial_alias: Option<String>,
    pub rotation_interval: Duration,
    pub rotation_enabled: bool,
    pub full_refresh_interval: Duration,
    pub status_poll_period: Duration,
    pub items_per_page: usize,
    pub toast_lifetime: Duration,
    pub request_timeout: Duration,
    pub fallback_aliases: Vec<String>,
    pub session_cookie: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            source: None,
            api_url: DEFAULT_API_URL.to_string(),
            initial_alias: None,
            rotation_interval: DEFAULT_ROTATION_INTERVAL,
            rotation_enabled: true,
            full_refresh_interval: DEFAULT_FULL_REFRESH,
            status_poll_period: DEFAULT_POLL_PERIOD,
            items_per_page: ITEMS_PER_PAGE,
            toast_lifetime: DEFAULT_TOAST_LIFETIME,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            fallback_aliases: Vec::new(),
            session_cookie: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
struct HeartbeatConfigFile {
    #[serde(default)]
    api_url: Option<String>,
    #[serde(default, alias = "rotation_ms")]
    rotation_interval_ms: Option<u64>,
    #[serde(default)]
    auto_rotate: Option<bool>,
    #[serde(default)]
    full_refresh_secs: Option<u64>,
    #[serde(default, alias = "poll_ms")]
    status_poll_ms: Option<u64>,
    #[serde(default)]
    items_per_page: Option<usize>,
    #[serde(default)]
    toast_secs: Option<u64>,
    #[serde(default, alias = "timeout_secs")]
    request_timeout_secs: Option<u64>,
    #[serde(default)]
    fallback_aliases: Vec<String>,
    #[serde(default)]
    session_cookie: Option<String>,
}

impl Settings {
    pub fn load(cli: &CliArgs) -> Result<Self> {
        let path = match &cli.config {
            Some(path) => Some(path.clone()),
            None => discover_config_path(),
        };
        let (file, source) = match path {
            Some(path) => (read_config_file(&path)?, Some(path.display().to_string())),
            None => (HeartbeatConfigFile::default(), None),
        };
        let mut settings = Self::merge(cli, file);
        settings.source = source;
        Ok(settings)
    }

    fn merge(cli: &CliArgs, file: HeartbeatConfigFile) -> Self {
        let defaults = Self::default();
        let millis = |value: Option<u64>, fallback: Duration| {
            value
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis)
                .unwrap_or(fallback)
        };
        let secs = |value: Option<u64>, fallback: Duration| {
            value
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(fallback)
        };

        Self {
            source: None,
            api_url: cli
                .api_url
                .clone()
                .or(file.api_url)
                .map(|url| url.trim().to_string())
                .filter(|url| !url.is_empty())
                .unwrap_or(defaults.api_url),
            initial_alias: cli.alias.clone(),
            rotation_interval: millis(
                cli.rotation_ms.or(file.rotation_interval_ms),
                defaults.rotation_interval,
            ),
            rotation_enabled: !cli.no_rotate && file.auto_rotate.unwrap_or(true),
            full_refresh_interval: secs(file.full_refresh_secs, defaults.full_refresh_interval),
            status_poll_period: millis(file.status_poll_ms, defaults.status_poll_period),
            items_per_page: file
                .items_per_page
                .filter(|count| *count > 0)
                .unwrap_or(defaults.items_per_page),
            toast_lifetime: secs(file.toast_secs, defaults.toast_lifetime),
            request_timeout: secs(file.request_timeout_secs, defaults.request_timeout),
            fallback_aliases: file
                .fallback_aliases
                .into_iter()
                .map(|alias| alias.trim().to_string())
                .filter(|alias| !alias.is_empty())
                .collect(),
            session_cookie: file
                .session_cookie
                .map(|cookie| cookie.trim().to_string())
                .filter(|cookie| !cookie.is_empty()),
        }
    }
}

fn read_config_file(path: &Path) -> Result<HeartbeatConfigFile> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    parse_config(&raw).with_context(|| format!("failed to parse config {}", path.display()))
}

fn parse_config(raw: &str) -> Result<HeartbeatConfigFile> {
    if raw.trim().is_empty() {
        return Ok(HeartbeatConfigFile::default());
    }
    Ok(serde_yaml::from_str(raw)?)
}

fn discover_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("HEARTBEAT_CONFIG")
        && !path.trim().is_empty()
    {
        return Some(PathBuf::from(path));
    }

    let cwd_candidates = [
        PathBuf::from("heartbeat.yaml"),
        PathBuf::from("heartbeat.yml"),
        PathBuf::from(".heartbeat.yaml"),
    ];
    for candidate in cwd_candidates {
        if candidate.exists() {
            return Some(candidate);
        }
    }

    if let Ok(home) = std::env::var("HOME") {
        let user_candidates = [
            PathBuf::from(&home).join(".config/heartbeat/config.yaml"),
            PathBuf::from(&home).join(".config/heartbeat/config.yml"),
        ];
        for candidate in user_candidates {
            if candidate.exists() {
                return Some(candidate);
            }
        }
    }

    None
}

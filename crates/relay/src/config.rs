use std::{fs, io, time::Duration};

use anyhow::Context;
use serde::Deserialize;
use shared::domain::DEFAULT_NAMESPACE;

const CONFIG_FILE: &str = "relay.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub bind_addr: String,
    pub upstream_url: String,
    pub namespace: String,
    pub request_timeout_secs: Option<u64>,
    pub max_body_bytes: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".into(),
            upstream_url: "http://127.0.0.1:8000".into(),
            namespace: DEFAULT_NAMESPACE.into(),
            request_timeout_secs: None,
            max_body_bytes: 1024 * 1024,
        }
    }
}

impl Settings {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    bind_addr: Option<String>,
    upstream_url: Option<String>,
    namespace: Option<String>,
    request_timeout_secs: Option<u64>,
    max_body_bytes: Option<usize>,
}

pub fn load_settings() -> anyhow::Result<Settings> {
    let raw = match fs::read_to_string(CONFIG_FILE) {
        Ok(raw) => Some(raw),
        Err(err) if err.kind() == io::ErrorKind::NotFound => None,
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read {CONFIG_FILE}"));
        }
    };
    settings_from_sources(raw.as_deref(), |key| std::env::var(key).ok())
}

/// Defaults, then the TOML file, then environment variables.
fn settings_from_sources(
    file: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    if let Some(raw) = file {
        let file_cfg: FileSettings =
            toml::from_str(raw).with_context(|| format!("failed to parse {CONFIG_FILE}"))?;
        if let Some(v) = file_cfg.bind_addr {
            settings.bind_addr = v;
        }
        if let Some(v) = file_cfg.upstream_url {
            settings.upstream_url = v;
        }
        if let Some(v) = file_cfg.namespace {
            settings.namespace = v;
        }
        if let Some(v) = file_cfg.request_timeout_secs {
            settings.request_timeout_secs = Some(v);
        }
        if let Some(v) = file_cfg.max_body_bytes {
            settings.max_body_bytes = v;
        }
    }

    if let Some(v) = env("RELAY_BIND") {
        settings.bind_addr = v;
    }
    if let Some(v) = env("APP__BIND_ADDR") {
        settings.bind_addr = v;
    }

    if let Some(v) = env("RELAY_UPSTREAM_URL") {
        settings.upstream_url = v;
    }

    if let Some(v) = env("RELAY_NAMESPACE") {
        settings.namespace = v;
    }

    if let Some(v) = env("RELAY_REQUEST_TIMEOUT_SECS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.request_timeout_secs = Some(parsed);
        }
    }

    if let Some(v) = env("RELAY_MAX_BODY_BYTES") {
        if let Ok(parsed) = v.parse::<usize>() {
            settings.max_body_bytes = parsed;
        }
    }

    Ok(settings)
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;

use std::{fs, io, path::Path, time::Duration};

use anyhow::Context;
use serde::Deserialize;
use shared::domain::DEFAULT_NAMESPACE;

const CONFIG_FILE: &str = "talk.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub service_url: String,
    pub namespace: String,
    pub request_timeout_secs: Option<u64>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            service_url: "http://127.0.0.1:8000".into(),
            namespace: DEFAULT_NAMESPACE.into(),
            request_timeout_secs: None,
        }
    }
}

impl ClientSettings {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

/// Values given on the command line; these win over every other source.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub service_url: Option<String>,
    pub namespace: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    service_url: Option<String>,
    namespace: Option<String>,
    request_timeout_secs: Option<u64>,
}

/// A missing `talk.toml` in the working directory is fine; a missing file
/// passed explicitly with `--config` is not.
pub fn load_settings(path: Option<&Path>, overrides: Overrides) -> anyhow::Result<ClientSettings> {
    let raw = match path {
        Some(path) => Some(
            fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?,
        ),
        None => match fs::read_to_string(CONFIG_FILE) {
            Ok(raw) => Some(raw),
            Err(err) if err.kind() == io::ErrorKind::NotFound => None,
            Err(err) => {
                return Err(err).with_context(|| format!("failed to read {CONFIG_FILE}"));
            }
        },
    };
    settings_from_sources(raw.as_deref(), |key| std::env::var(key).ok(), overrides)
}

fn settings_from_sources(
    file: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
    overrides: Overrides,
) -> anyhow::Result<ClientSettings> {
    let mut settings = ClientSettings::default();

    if let Some(raw) = file {
        let file_cfg: FileSettings =
            toml::from_str(raw).context("failed to parse client settings")?;
        if let Some(v) = file_cfg.service_url {
            settings.service_url = v;
        }
        if let Some(v) = file_cfg.namespace {
            settings.namespace = v;
        }
        if let Some(v) = file_cfg.request_timeout_secs {
            settings.request_timeout_secs = Some(v);
        }
    }

    if let Some(v) = env("TALK_SERVICE_URL") {
        settings.service_url = v;
    }
    if let Some(v) = env("TALK_NAMESPACE") {
        settings.namespace = v;
    }
    if let Some(v) = env("TALK_REQUEST_TIMEOUT_SECS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.request_timeout_secs = Some(parsed);
        }
    }

    if let Some(v) = overrides.service_url {
        settings.service_url = v;
    }
    if let Some(v) = overrides.namespace {
        settings.namespace = v;
    }
    if let Some(v) = overrides.timeout_secs {
        settings.request_timeout_secs = Some(v);
    }

    Ok(settings)
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;

use std::{collections::HashMap, fs, path::PathBuf};

use anyhow::Context;
use serde::Deserialize;
use shared::domain::EmployeeDraft;

const SETTINGS_FILE: &str = "directory.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    pub bind_addr: String,
    pub seed_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8787".into(),
            seed_path: None,
        }
    }
}

/// Defaults, then `directory.toml`, then environment variables.
pub fn load_settings() -> Settings {
    let file = fs::read_to_string(SETTINGS_FILE).ok();
    resolve_settings(file.as_deref(), |key| std::env::var(key).ok())
}

pub(crate) fn resolve_settings(
    file: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> Settings {
    let mut settings = Settings::default();

    if let Some(raw) = file {
        if let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(raw) {
            if let Some(v) = file_cfg.get("bind_addr") {
                settings.bind_addr = v.clone();
            }
            if let Some(v) = file_cfg.get("seed_path") {
                settings.seed_path = Some(PathBuf::from(v));
            }
        }
    }

    if let Some(v) = env("DIRECTORY_BIND") {
        settings.bind_addr = v;
    }
    if let Some(v) = env("APP__BIND_ADDR") {
        settings.bind_addr = v;
    }

    if let Some(v) = env("DIRECTORY_SEED") {
        settings.seed_path = Some(PathBuf::from(v));
    }
    if let Some(v) = env("APP__SEED_PATH") {
        settings.seed_path = Some(PathBuf::from(v));
    }

    settings.seed_path = settings
        .seed_path
        .filter(|path| !path.as_os_str().is_empty());
    settings
}

/// Reads a JSON array of drafts used to prefill the directory at startup.
pub fn read_seed(path: &std::path::Path) -> anyhow::Result<Vec<EmployeeDraft>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read seed file '{}'", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("seed file '{}' is not a JSON array of employees", path.display()))
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;

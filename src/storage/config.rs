//! JSON Configuration Management
//!
//! Handles reading and writing the engine settings file. Environment
//! variables override the endpoints read from disk but are never written back.

use std::fs;
use std::path::{Path, PathBuf};

use crate::models::settings::{InsightSettings, SettingsUpdate};
use crate::utils::error::{AppError, AppResult};
use crate::utils::paths::{config_path, ensure_dir};

/// Overrides `agent_endpoint`
pub const ENV_AGENT_ENDPOINT: &str = "INSIGHT_AGENT_ENDPOINT";

/// Overrides `upstream_base_url`
pub const ENV_UPSTREAM_URL: &str = "INSIGHT_UPSTREAM_URL";

/// Settings store backed by a JSON file
#[derive(Debug)]
pub struct SettingsStore {
    config_path: PathBuf,
    /// Settings as stored on disk
    stored: InsightSettings,
    /// Stored settings with environment overrides applied
    effective: InsightSettings,
}

impl SettingsStore {
    /// Open the store at the default location, creating defaults if absent
    pub fn new() -> AppResult<Self> {
        Self::open(config_path()?)
    }

    /// Open the store at `path`, creating defaults if absent
    pub fn open(path: impl Into<PathBuf>) -> AppResult<Self> {
        let config_path = path.into();
        if let Some(parent) = config_path.parent() {
            ensure_dir(parent)?;
        }

        let stored = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            tracing::info!("Creating default settings at {}", config_path.display());
            let defaults = InsightSettings::default();
            Self::save_to_file(&config_path, &defaults)?;
            defaults
        };
        let effective = apply_env_overrides(stored.clone(), |name| std::env::var(name).ok());
        effective.validate().map_err(AppError::validation)?;

        Ok(Self {
            config_path,
            stored,
            effective,
        })
    }

    fn load_from_file(path: &Path) -> AppResult<InsightSettings> {
        let content = fs::read_to_string(path)?;
        let settings: InsightSettings = serde_json::from_str(&content)?;
        settings.validate().map_err(AppError::validation)?;
        Ok(settings)
    }

    fn save_to_file(path: &Path, settings: &InsightSettings) -> AppResult<()> {
        settings.validate().map_err(AppError::validation)?;
        let content = serde_json::to_string_pretty(settings)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Effective settings (file values plus environment overrides)
    pub fn settings(&self) -> &InsightSettings {
        &self.effective
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Apply a partial update and persist it
    pub fn update(&mut self, update: SettingsUpdate) -> AppResult<InsightSettings> {
        let mut next = self.stored.clone();
        next.apply_update(update);
        Self::save_to_file(&self.config_path, &next)?;
        self.effective = apply_env_overrides(next.clone(), |name| std::env::var(name).ok());
        self.stored = next;
        Ok(self.effective.clone())
    }

    /// Reload settings from disk
    pub fn reload(&mut self) -> AppResult<()> {
        self.stored = Self::load_from_file(&self.config_path)?;
        self.effective = apply_env_overrides(self.stored.clone(), |name| std::env::var(name).ok());
        Ok(())
    }

    /// Reset settings to defaults
    pub fn reset(&mut self) -> AppResult<()> {
        let defaults = InsightSettings::default();
        Self::save_to_file(&self.config_path, &defaults)?;
        self.effective = apply_env_overrides(defaults.clone(), |name| std::env::var(name).ok());
        self.stored = defaults;
        Ok(())
    }
}

/// Apply endpoint overrides looked up through `lookup`. Blank values are ignored.
pub fn apply_env_overrides(
    mut settings: InsightSettings,
    lookup: impl Fn(&str) -> Option<String>,
) -> InsightSettings {
    let non_blank = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
    if let Some(endpoint) = non_blank(ENV_AGENT_ENDPOINT) {
        tracing::debug!("{} overrides agent_endpoint", ENV_AGENT_ENDPOINT);
        settings.agent_endpoint = endpoint;
    }
    if let Some(url) = non_blank(ENV_UPSTREAM_URL) {
        tracing::debug!("{} overrides upstream_base_url", ENV_UPSTREAM_URL);
        settings.upstream_base_url = url;
    }
    settings
}

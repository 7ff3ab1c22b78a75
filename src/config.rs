use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Host configuration, read from `config.toml`.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub gewechat: GewechatConfig,
    #[serde(default)]
    pub plugin: PluginConfig,
}

/// Connection settings for the GeWe gateway, shared by every plugin.
#[derive(Deserialize, Clone, Default)]
pub struct GewechatConfig {
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub app_id: String,
}

impl std::fmt::Debug for GewechatConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GewechatConfig")
            .field("base_url", &self.base_url)
            .field("token", &"[REDACTED]")
            .field("app_id", &self.app_id)
            .finish()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PluginConfig {
    /// Path of the plugin's JSON config. Relative paths are resolved
    /// against the directory holding `config.toml`.
    #[serde(default = "default_invite_config_path")]
    pub config_path: PathBuf,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            config_path: default_invite_config_path(),
        }
    }
}

fn default_invite_config_path() -> PathBuf {
    PathBuf::from("auto_invite_group-config.json")
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        if config.plugin.config_path.is_relative() {
            if let Some(dir) = path.parent() {
                config.plugin.config_path = dir.join(&config.plugin.config_path);
            }
        }

        Ok(config)
    }
}

/// One keyword trigger and the group it invites into.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct KeywordMapping {
    #[serde(default)]
    pub keyword: String,
    #[serde(default)]
    pub group_id: String,
    #[serde(default)]
    pub reason: String,
}

/// Settings of the auto-invite plugin, read once at startup.
///
/// `match_threshold` and `invite_after_accept` are part of the file format
/// but no code path reads them yet.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct InviteConfig {
    #[serde(default = "default_true")]
    pub auto_invite: bool,
    #[serde(default)]
    pub invite_after_accept: bool,
    #[serde(default = "default_true")]
    pub fuzzy_match: bool,
    #[serde(default = "default_match_threshold")]
    pub match_threshold: f64,
    #[serde(default)]
    pub keyword_mappings: Vec<KeywordMapping>,
}

fn default_true() -> bool {
    true
}

fn default_match_threshold() -> f64 {
    0.7
}

/// Used when no config file exists.
impl Default for InviteConfig {
    fn default() -> Self {
        Self {
            auto_invite: true,
            invite_after_accept: false,
            fuzzy_match: true,
            match_threshold: default_match_threshold(),
            keyword_mappings: vec![KeywordMapping {
                keyword: "群".to_string(),
                group_id: "12345678@chatroom".to_string(),
                reason: "欢迎加入我们的群聊".to_string(),
            }],
        }
    }
}

impl InviteConfig {
    /// Load the plugin config, falling back to the built-in default when
    /// the file does not exist. A file that exists but cannot be parsed is
    /// an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!(
                "Plugin config not found: {}, using built-in defaults",
                path.display()
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read plugin config: {}", path.display()))?;
        let config: InviteConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse plugin config: {}", path.display()))?;

        info!("Loaded plugin config: {}", path.display());
        Ok(config)
    }
}

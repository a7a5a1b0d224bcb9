//! Provider configuration management.
//!
//! Loads and saves provider settings from `~/.wishsync/config.json`.
//! Every setting resolves as: env var > config file > built-in default.

use crate::config::global_wishsync_dir;
use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::types::{ProviderSettings, WishsyncConfig};

/// Default gacha log endpoint.
pub const DEFAULT_GACHA_ENDPOINT: &str =
    "https://hk4e-api-os.hoyoverse.com/gacha_info/api/getGachaLog";

/// Default account info endpoint.
pub const DEFAULT_IDENTITY_ENDPOINT: &str =
    "https://hk4e-api-os.hoyoverse.com/common/im/userClient/initUserChat";

/// Default language for item names.
pub const DEFAULT_LANG: &str = "en-us";

/// Default page size; the provider caps it at 20.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Get the config file path.
fn config_path() -> Result<PathBuf> {
    global_wishsync_dir()
        .map(|dir| dir.join("config.json"))
        .ok_or(Error::Config("Could not determine home directory".into()))
}

/// Load the full wishsync configuration.
pub fn load_config() -> Result<WishsyncConfig> {
    load_config_from(&config_path()?)
}

/// Load configuration from an explicit path. A missing file yields defaults.
pub fn load_config_from(path: &Path) -> Result<WishsyncConfig> {
    if !path.exists() {
        return Ok(WishsyncConfig::default());
    }

    let content = fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Failed to read config file: {e}")))?;

    serde_json::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse config file: {e}")))
}

/// Save the full wishsync configuration.
pub fn save_config(config: &WishsyncConfig) -> Result<()> {
    save_config_to(&config_path()?, config)
}

/// Save configuration to an explicit path, creating parent directories.
pub fn save_config_to(path: &Path, config: &WishsyncConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| Error::Config(format!("Failed to create config directory: {e}")))?;
    }

    let content = serde_json::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Failed to serialize config: {e}")))?;

    fs::write(path, content)
        .map_err(|e| Error::Config(format!("Failed to write config file: {e}")))?;

    Ok(())
}

/// Get provider settings from config file.
pub fn get_provider_settings() -> Result<Option<ProviderSettings>> {
    Ok(load_config()?.provider)
}

/// Merge new settings over the existing ones. Unset fields keep their old value.
#[must_use]
pub fn merge_settings(existing: ProviderSettings, update: &ProviderSettings) -> ProviderSettings {
    ProviderSettings {
        gacha_endpoint: update.gacha_endpoint.clone().or(existing.gacha_endpoint),
        identity_endpoint: update.identity_endpoint.clone().or(existing.identity_endpoint),
        lang: update.lang.clone().or(existing.lang),
        page_size: update.page_size.or(existing.page_size),
    }
}

/// Save provider settings (merges with existing config).
pub fn save_provider_settings(settings: &ProviderSettings) -> Result<ProviderSettings> {
    let mut config = load_config()?;
    let merged = merge_settings(config.provider.unwrap_or_default(), settings);
    config.provider = Some(merged.clone());
    save_config(&config)?;
    Ok(merged)
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn settings_value(pick: impl FnOnce(ProviderSettings) -> Option<String>) -> Option<String> {
    get_provider_settings().ok().flatten().and_then(pick)
}

/// Resolve the gacha log endpoint.
pub fn resolve_gacha_endpoint() -> String {
    env_value("WISHSYNC_GACHA_ENDPOINT")
        .or_else(|| settings_value(|s| s.gacha_endpoint))
        .unwrap_or_else(|| DEFAULT_GACHA_ENDPOINT.to_string())
}

/// Resolve the account info endpoint.
pub fn resolve_identity_endpoint() -> String {
    env_value("WISHSYNC_IDENTITY_ENDPOINT")
        .or_else(|| settings_value(|s| s.identity_endpoint))
        .unwrap_or_else(|| DEFAULT_IDENTITY_ENDPOINT.to_string())
}

/// Resolve the item name language.
pub fn resolve_lang() -> String {
    env_value("WISHSYNC_LANG")
        .or_else(|| settings_value(|s| s.lang))
        .unwrap_or_else(|| DEFAULT_LANG.to_string())
}

/// Resolve the item name language for one user's import.
///
/// `WISHSYNC_LANG` still wins; the user's preferred language beats the
/// config file and the default.
pub fn resolve_lang_for(user_lang: Option<&str>) -> String {
    choose_lang(env_value("WISHSYNC_LANG"), user_lang, || {
        settings_value(|s| s.lang)
    })
}

fn choose_lang(
    env: Option<String>,
    user_lang: Option<&str>,
    from_file: impl FnOnce() -> Option<String>,
) -> String {
    env.or_else(|| {
        user_lang
            .map(str::trim)
            .filter(|lang| !lang.is_empty())
            .map(ToString::to_string)
    })
    .or_else(from_file)
    .unwrap_or_else(|| DEFAULT_LANG.to_string())
}

/// Resolve the page size, clamped to 1..=20.
pub fn resolve_page_size() -> u32 {
    env_value("WISHSYNC_PAGE_SIZE")
        .and_then(|v| v.trim().parse::<u32>().ok())
        .or_else(|| get_provider_settings().ok().flatten().and_then(|s| s.page_size))
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, DEFAULT_PAGE_SIZE)
}

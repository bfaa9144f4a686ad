// SPDX-FileCopyrightText: 2026 Wicket Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./wicket.toml` > `~/.config/wicket/wicket.toml` > `/etc/wicket/wicket.toml`
//! with environment variable overrides via `WICKET_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::WicketConfig;

/// Top-level sections addressable from environment variables.
const ENV_SECTIONS: &[&str] = &[
    "queue",
    "notification",
    "scheduler",
    "storage",
    "gateway",
    "telegram",
    "prometheus",
    "logging",
];

pub(crate) const SYSTEM_CONFIG_PATH: &str = "/etc/wicket/wicket.toml";
pub(crate) const LOCAL_CONFIG_PATH: &str = "wicket.toml";

pub(crate) fn user_config_path() -> Option<std::path::PathBuf> {
    dirs::config_dir().map(|d| d.join("wicket/wicket.toml"))
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/wicket/wicket.toml` (system-wide)
/// 3. `~/.config/wicket/wicket.toml` (user XDG config)
/// 4. `./wicket.toml` (local directory)
/// 5. `WICKET_*` environment variables
pub fn load_config() -> Result<WicketConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env vars).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<WicketConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(WicketConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<WicketConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(WicketConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading (exposed for diagnostic use).
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(WicketConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_PATH))
        .merge(env_provider())
}

/// Maps `WICKET_<SECTION>_<KEY>` to `<section>.<key>`.
///
/// Only the first underscore after a known section name becomes a dot, so
/// `WICKET_NOTIFICATION_MAX_ATTEMPTS` lands on `notification.max_attempts`
/// rather than `notification.max.attempts`.
fn env_provider() -> Env {
    Env::prefixed("WICKET_").map(|key| map_env_key(key.as_str()).into())
}

pub(crate) fn map_env_key(key: &str) -> String {
    for section in ENV_SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|rest| rest.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}

// SPDX-FileCopyrightText: 2026 Pitstop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./pitstop.toml` > `~/.config/pitstop/pitstop.toml` > `/etc/pitstop/pitstop.toml`
//! with environment variable overrides via `PITSTOP_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::PitstopConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/pitstop/pitstop.toml` (system-wide)
/// 3. `~/.config/pitstop/pitstop.toml` (user XDG config)
/// 4. `./pitstop.toml` (local directory)
/// 5. `PITSTOP_*` environment variables
pub fn load_config() -> Result<PitstopConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from an inline TOML string only (no XDG lookup, no env).
///
/// Used for testing.
pub fn load_config_from_str(toml_content: &str) -> Result<PitstopConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PitstopConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<PitstopConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PitstopConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading (exposed for diagnostic use).
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(PitstopConfig::default()))
        .merge(Toml::file("/etc/pitstop/pitstop.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("pitstop/pitstop.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("pitstop.toml"))
        .merge(env_provider())
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `PITSTOP_SMS_AUTH_TOKEN` must map to `sms.auth_token`, not
/// `sms.auth.token`.
fn env_provider() -> Env {
    Env::prefixed("PITSTOP_").map(|key| {
        // Example: PITSTOP_GEMINI_API_KEY -> "gemini_api_key" -> "gemini.api_key"
        let key_str = key.as_str();
        let mapped = SECTIONS
            .iter()
            .find_map(|section| {
                key_str
                    .strip_prefix(section)
                    .and_then(|rest| rest.strip_prefix('_'))
                    .map(|rest| format!("{section}.{rest}"))
            })
            .unwrap_or_else(|| key_str.to_string());
        mapped.into()
    })
}

/// Top-level config sections that environment variables may target.
pub(crate) const SECTIONS: &[&str] = &[
    "dealership",
    "gemini",
    "sms",
    "storage",
    "gateway",
    "scheduler",
];

//! # braid-settings
//!
//! Configuration management with layered sources for the Braid engine.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults** — [`BraidSettings::default()`]
//! 2. **User file** — `~/.braid/settings.json` (deep-merged over defaults)
//! 3. **Environment variables** — `BRAID_*` overrides (highest priority)
//!
//! The engine never reads settings directly; the embedding application maps
//! them into engine config at construction time.
//!
//! # Usage
//!
//! ```no_run
//! use braid_settings::get_settings;
//!
//! let settings = get_settings();
//! println!("prune at: {}", settings.engine.prune.max_messages);
//! ```

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::*;

use std::sync::OnceLock;

/// Global settings singleton.
///
/// Initialized on first access via [`get_settings`]. The settings are loaded
/// from `~/.braid/settings.json` with env var overrides, or fall back to
/// compiled defaults if loading fails.
static SETTINGS: OnceLock<BraidSettings> = OnceLock::new();

/// Get the global settings instance.
///
/// On first call, loads settings from `~/.braid/settings.json` with env var
/// overrides. On subsequent calls, returns the cached value. If loading
/// fails, returns compiled defaults.
pub fn get_settings() -> &'static BraidSettings {
    SETTINGS.get_or_init(|| load_settings().unwrap_or_default())
}

/// Initialize the global settings with a specific value.
///
/// Returns `Ok(())` if the settings were set, or `Err(settings)` if
/// they were already initialized.
///
/// # Errors
///
/// Returns the provided settings back if the global was already initialized.
#[allow(clippy::result_large_err)]
pub fn init_settings(settings: BraidSettings) -> std::result::Result<(), BraidSettings> {
    SETTINGS.set(settings)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

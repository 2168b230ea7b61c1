//! Viewport configuration: typed options, validated partial updates, and
//! environment defaults.
//!
//! The recognized option set is closed. Keyed updates (`set_option`) name
//! options by their camelCase wire key and reject anything else.

use serde::{Deserialize, Serialize};

use crate::consts::DEFAULT_RESIZE_DEBOUNCE_MS;
use crate::error::ConfigError;

/// Wire keys accepted by [`ConfigPatch::from_option`].
pub const OPTION_KEYS: [&str; 4] = ["changeCursorOnPan", "disabled", "refitOnResize", "resizeDebounceMs"];

/// Behavior switches for one viewport engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct ViewportConfig {
    /// Swap between grab / grabbing cursors while panning.
    pub change_cursor_on_pan: bool,
    /// Stored and reported; no transform or pan path reads it.
    pub disabled: bool,
    /// Re-fit (debounced) after window resizes.
    pub refit_on_resize: bool,
    /// Quiet period after the last resize before the re-fit runs.
    pub resize_debounce_ms: f64,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            change_cursor_on_pan: true,
            disabled: false,
            refit_on_resize: true,
            resize_debounce_ms: DEFAULT_RESIZE_DEBOUNCE_MS,
        }
    }
}

impl ViewportConfig {
    /// Build config from environment variables over the defaults.
    ///
    /// Optional:
    /// - `VIEWFIT_CHANGE_CURSOR_ON_PAN`: default `true`
    /// - `VIEWFIT_DISABLED`: default `false`
    /// - `VIEWFIT_REFIT_ON_RESIZE`: default `true`
    /// - `VIEWFIT_RESIZE_DEBOUNCE_MS`: default 1
    ///
    /// Unparseable values fall back to the default.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let debounce = env_parse("VIEWFIT_RESIZE_DEBOUNCE_MS", defaults.resize_debounce_ms);
        Self {
            change_cursor_on_pan: env_parse("VIEWFIT_CHANGE_CURSOR_ON_PAN", defaults.change_cursor_on_pan),
            disabled: env_parse("VIEWFIT_DISABLED", defaults.disabled),
            refit_on_resize: env_parse("VIEWFIT_REFIT_ON_RESIZE", defaults.refit_on_resize),
            resize_debounce_ms: if valid_debounce(debounce) { debounce } else { defaults.resize_debounce_ms },
        }
    }

    /// Check value ranges that serde alone cannot express.
    ///
    /// # Errors
    ///
    /// `InvalidOptionValue` when `resizeDebounceMs` is negative or not finite.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_debounce(self.resize_debounce_ms)
    }

    /// Apply every present field of `patch`.
    ///
    /// # Errors
    ///
    /// `InvalidOptionValue` when the patch carries an out-of-range value. The
    /// config is left untouched in that case.
    pub fn apply(&mut self, patch: &ConfigPatch) -> Result<(), ConfigError> {
        patch.validate()?;
        if let Some(v) = patch.change_cursor_on_pan {
            self.change_cursor_on_pan = v;
        }
        if let Some(v) = patch.disabled {
            self.disabled = v;
        }
        if let Some(v) = patch.refit_on_resize {
            self.refit_on_resize = v;
        }
        if let Some(v) = patch.resize_debounce_ms {
            self.resize_debounce_ms = v;
        }
        Ok(())
    }
}

/// Sparse update for a [`ViewportConfig`]. Only present fields are applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ConfigPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_cursor_on_pan: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refit_on_resize: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resize_debounce_ms: Option<f64>,
}

impl ConfigPatch {
    /// Build a single-field patch from a wire key and a JSON value.
    ///
    /// # Errors
    ///
    /// `UnknownOption` when `key` is not one of [`OPTION_KEYS`];
    /// `InvalidOptionValue` when the value has the wrong type or range.
    pub fn from_option(key: &str, value: &serde_json::Value) -> Result<Self, ConfigError> {
        let mut patch = Self::default();
        match key {
            "changeCursorOnPan" => patch.change_cursor_on_pan = Some(expect_bool(key, value)?),
            "disabled" => patch.disabled = Some(expect_bool(key, value)?),
            "refitOnResize" => patch.refit_on_resize = Some(expect_bool(key, value)?),
            "resizeDebounceMs" => {
                let ms = value.as_f64().ok_or_else(|| invalid(key, "expected a number"))?;
                check_debounce(ms)?;
                patch.resize_debounce_ms = Some(ms);
            }
            other => return Err(ConfigError::UnknownOption(other.to_string())),
        }
        Ok(patch)
    }

    /// Parse a JSON object of options, as a host page would pass them.
    ///
    /// # Errors
    ///
    /// `UnknownOption` for the first unrecognized key, `InvalidOptionValue`
    /// for a badly typed value.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, ConfigError> {
        let Some(map) = value.as_object() else {
            return Err(invalid("<root>", "expected an object"));
        };
        let mut patch = Self::default();
        for (key, v) in map {
            patch.merge(&Self::from_option(key, v)?);
        }
        Ok(patch)
    }

    fn merge(&mut self, other: &ConfigPatch) {
        self.change_cursor_on_pan = other.change_cursor_on_pan.or(self.change_cursor_on_pan);
        self.disabled = other.disabled.or(self.disabled);
        self.refit_on_resize = other.refit_on_resize.or(self.refit_on_resize);
        self.resize_debounce_ms = other.resize_debounce_ms.or(self.resize_debounce_ms);
    }

    /// Range checks for a patch that did not come through [`ConfigPatch::from_option`],
    /// e.g. one deserialized directly.
    ///
    /// # Errors
    ///
    /// `InvalidOptionValue` when `resizeDebounceMs` is negative or not finite.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.resize_debounce_ms.map_or(Ok(()), check_debounce)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn expect_bool(key: &str, value: &serde_json::Value) -> Result<bool, ConfigError> {
    value.as_bool().ok_or_else(|| invalid(key, "expected a boolean"))
}

fn invalid(key: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidOptionValue { key: key.to_string(), reason: reason.to_string() }
}

fn valid_debounce(ms: f64) -> bool {
    ms.is_finite() && ms >= 0.0
}

fn check_debounce(ms: f64) -> Result<(), ConfigError> {
    if valid_debounce(ms) {
        Ok(())
    } else {
        Err(invalid("resizeDebounceMs", "expected a finite, non-negative number"))
    }
}

pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key).map_or(default, |v| v.trim().parse::<T>().unwrap_or(default))
}

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

//! Tagging options
//!
//! Options come in two layers: process-wide defaults given when the plugin
//! is registered, and per-route overrides stored under the plugin's
//! namespace in [`RouteSettings`](etagger_http::RouteSettings). Both use the
//! same schema:
//!
//! | key          | type | default |
//! |--------------|------|---------|
//! | `enabled`    | bool | `false` |
//! | `nonSuccess` | bool | `false` |
//!
//! `onlyOnSuccess` is accepted as an alias of `nonSuccess`. Unknown keys are
//! rejected.

use etagger_http::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::PLUGIN_NAME;

/// Resolved options for one tagging decision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TagOptions {
	/// Tag responses automatically.
	pub enabled: bool,
	/// Skip responses whose status is outside 200..300.
	pub only_on_success: bool,
}

impl TagOptions {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn enabled(mut self, enabled: bool) -> Self {
		self.enabled = enabled;
		self
	}

	pub fn only_on_success(mut self, only_on_success: bool) -> Self {
		self.only_on_success = only_on_success;
		self
	}

	/// Layer `overrides` on top of these options; set fields win.
	///
	/// # Examples
	///
	/// ```
	/// use etagger_middleware::{TagOptions, TagOptionsOverride};
	///
	/// let defaults = TagOptions::new().only_on_success(true);
	/// let route = TagOptionsOverride { enabled: Some(true), only_on_success: None };
	///
	/// assert_eq!(
	///     defaults.merge(&route),
	///     TagOptions { enabled: true, only_on_success: true },
	/// );
	/// ```
	pub fn merge(&self, overrides: &TagOptionsOverride) -> TagOptions {
		TagOptions {
			enabled: overrides.enabled.unwrap_or(self.enabled),
			only_on_success: overrides.only_on_success.unwrap_or(self.only_on_success),
		}
	}

	/// Validate a raw per-route value and merge it over these options.
	///
	/// # Errors
	///
	/// Returns [`Error::Configuration`] when `route` does not match the schema.
	pub fn resolve(&self, route: Option<&Value>) -> Result<TagOptions> {
		match route {
			Some(value) => Ok(self.merge(&TagOptionsOverride::from_value(value.clone())?)),
			None => Ok(*self),
		}
	}
}

impl From<TagOptionsOverride> for TagOptions {
	fn from(overrides: TagOptionsOverride) -> Self {
		TagOptions::default().merge(&overrides)
	}
}

/// Partial options, as written in configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TagOptionsOverride {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub enabled: Option<bool>,
	#[serde(
		default,
		rename = "nonSuccess",
		alias = "onlyOnSuccess",
		skip_serializing_if = "Option::is_none"
	)]
	pub only_on_success: Option<bool>,
}

impl TagOptionsOverride {
	/// Validate options given as JSON. `null` means "no options".
	///
	/// # Errors
	///
	/// Returns [`Error::Configuration`] on unknown keys or wrong types.
	///
	/// # Examples
	///
	/// ```
	/// use etagger_middleware::TagOptionsOverride;
	/// use serde_json::json;
	///
	/// let options = TagOptionsOverride::from_value(json!({"nonSuccess": true})).unwrap();
	/// assert_eq!(options.only_on_success, Some(true));
	///
	/// assert!(TagOptionsOverride::from_value(json!({"unknownOption": 1})).is_err());
	/// ```
	pub fn from_value(value: Value) -> Result<Self> {
		if value.is_null() {
			return Ok(Self::default());
		}
		if !value.is_object() {
			return Err(Error::Configuration(format!(
				"{PLUGIN_NAME} options must be an object"
			)));
		}
		serde_json::from_value(value).map_err(|e| Error::Configuration(e.to_string()))
	}

	/// Validate options given as TOML.
	///
	/// Accepts either a document whose top level holds the options, or a
	/// document with an `[etagger]` table, in which case other tables are
	/// ignored.
	///
	/// # Errors
	///
	/// Returns [`Error::Configuration`] on syntax errors, unknown keys or
	/// wrong types.
	///
	/// # Examples
	///
	/// ```
	/// use etagger_middleware::TagOptionsOverride;
	///
	/// let options = TagOptionsOverride::from_toml_str(
	///     "[server]\nport = 8080\n\n[etagger]\nenabled = true\n",
	/// )
	/// .unwrap();
	/// assert_eq!(options.enabled, Some(true));
	/// ```
	pub fn from_toml_str(source: &str) -> Result<Self> {
		#[derive(Deserialize)]
		struct Document {
			etagger: TagOptionsOverride,
		}

		let table: toml::Table =
			toml::from_str(source).map_err(|e| Error::Configuration(e.to_string()))?;

		if table.contains_key(PLUGIN_NAME) {
			toml::from_str::<Document>(source)
				.map(|document| document.etagger)
				.map_err(|e| Error::Configuration(e.to_string()))
		} else {
			toml::from_str(source).map_err(|e| Error::Configuration(e.to_string()))
		}
	}

	pub fn is_empty(&self) -> bool {
		self.enabled.is_none() && self.only_on_success.is_none()
	}
}

//! Registrar configuration
//!
//! Each [`ObservationRegistrar`](crate::ObservationRegistrar) carries a
//! [`RegistrarConfig`]. The defaults match the behavior expected by
//! instrumented accessors, so most subjects never configure anything.
//!
//! Configuration can be built in code, deserialized with `serde`, or read
//! from the environment:
//!
//! | Variable                      | Values                          |
//! |-------------------------------|---------------------------------|
//! | `OBSERVATION_FIRE_POLICY`     | `on_attempt` (default), `on_success` |
//! | `OBSERVATION_SWEEP_ON_ACCESS` | boolean, default `true`         |
//! | `OBSERVATION_LABEL`           | free-form label used in logs    |

use core::fmt;
use core::str::FromStr;
use std::env;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Prefix shared by every environment variable read by [`RegistrarConfig::from_env`].
pub const ENV_PREFIX: &str = "OBSERVATION_";

/// When a mutation fires the contexts interested in the mutated property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FirePolicy {
	/// Fire on every path that ran the mutation body: normal return,
	/// an `Err` result, or a panic. State may have changed before the
	/// failure point, so observers are told.
	#[default]
	OnAttempt,
	/// Fire only when the mutation body returned normally and, for
	/// fallible mutations, returned `Ok`.
	OnSuccess,
}

impl FirePolicy {
	/// Whether a mutation that did not complete successfully should fire.
	pub fn fires_on_failure(self) -> bool {
		matches!(self, FirePolicy::OnAttempt)
	}
}

impl fmt::Display for FirePolicy {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			FirePolicy::OnAttempt => f.write_str("on_attempt"),
			FirePolicy::OnSuccess => f.write_str("on_success"),
		}
	}
}

impl FromStr for FirePolicy {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"on_attempt" | "attempt" => Ok(FirePolicy::OnAttempt),
			"on_success" | "success" => Ok(FirePolicy::OnSuccess),
			_ => Err(ConfigError::InvalidFirePolicy(s.to_string())),
		}
	}
}

/// Settings for one registrar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrarConfig {
	/// Firing behavior for failed mutations.
	pub fire_policy: FirePolicy,
	/// Drop already-fired contexts from a key's interest set whenever a new
	/// reader registers for that key.
	pub sweep_on_access: bool,
	/// Optional label attached to this registrar's log events.
	pub label: Option<String>,
}

impl Default for RegistrarConfig {
	fn default() -> Self {
		Self {
			fire_policy: FirePolicy::default(),
			sweep_on_access: true,
			label: None,
		}
	}
}

impl RegistrarConfig {
	/// Create the default configuration.
	pub fn new() -> Self {
		Self::default()
	}

	/// Set the fire policy.
	pub fn with_fire_policy(mut self, policy: FirePolicy) -> Self {
		self.fire_policy = policy;
		self
	}

	/// Enable or disable lazy sweeping on access.
	pub fn with_sweep_on_access(mut self, enabled: bool) -> Self {
		self.sweep_on_access = enabled;
		self
	}

	/// Attach a label used in log events.
	pub fn with_label(mut self, label: impl Into<String>) -> Self {
		self.label = Some(label.into());
		self
	}

	/// Load configuration from `OBSERVATION_*` environment variables.
	///
	/// Unset variables keep their default value.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|key| env::var(key).ok())
	}

	/// Load configuration through an arbitrary variable lookup.
	///
	/// `lookup` receives full variable names, prefix included.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let mut config = Self::default();

		if let Some(value) = lookup(&env_key("FIRE_POLICY")) {
			config.fire_policy = value.parse()?;
		}

		let sweep_key = env_key("SWEEP_ON_ACCESS");
		if let Some(value) = lookup(&sweep_key) {
			config.sweep_on_access = parse_bool(&value).ok_or(ConfigError::InvalidBool {
				key: sweep_key,
				value,
			})?;
		}

		if let Some(value) = lookup(&env_key("LABEL")) {
			let value = value.trim();
			if !value.is_empty() {
				config.label = Some(value.to_string());
			}
		}

		Ok(config)
	}
}

fn env_key(name: &str) -> String {
	format!("{}{}", ENV_PREFIX, name)
}

fn parse_bool(value: &str) -> Option<bool> {
	match value.trim().to_ascii_lowercase().as_str() {
		"true" | "1" | "yes" | "on" => Some(true),
		"false" | "0" | "no" | "off" => Some(false),
		_ => None,
	}
}

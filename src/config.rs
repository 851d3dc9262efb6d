//! Immutable gateway configuration resolved once at startup.
//!
//! Handlers receive the resolved [`Config`] by reference; nothing in the request path
//! reads the process environment.

// std
use std::env;
// self
use crate::{_prelude::*, error::ConfigError};

/// Environment variable holding the Epic OAuth client identifier.
pub const ENV_CLIENT_ID: &str = "EPIC_CLIENT_ID";
/// Environment variable holding the Epic OAuth client secret.
pub const ENV_CLIENT_SECRET: &str = "EPIC_CLIENT_SECRET";
/// Environment variable holding the registered redirect URI.
pub const ENV_REDIRECT_URI: &str = "EPIC_REDIRECT_URI";
/// Environment variable holding the single-page application origin.
pub const ENV_APP_ORIGIN: &str = "APP_ORIGIN";
/// Environment variable holding the listen port.
pub const ENV_PORT: &str = "PORT";

const DEFAULT_APP_ORIGIN: &str = "http://localhost:4200";
const DEFAULT_PORT: u16 = 4000;

/// Process-lifetime-static gateway configuration.
#[derive(Clone, Debug)]
pub struct Config {
	/// OAuth client identifier registered with Epic.
	pub client_id: String,
	/// Confidential client secret; used only for token endpoint authentication.
	pub client_secret: String,
	/// Redirect URI registered with Epic; its origin is the gateway's own origin.
	pub redirect_uri: Url,
	/// Origin of the single-page application that opens the login popup.
	pub app_origin: Url,
	/// TCP port the gateway listens on.
	pub listen_port: u16,
}
impl Config {
	/// Resolves the configuration from the process environment.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::resolve(|key| env::var(key).ok())
	}

	/// Resolves the configuration from an injected variable lookup.
	///
	/// Short-circuits on the first missing required value, before any network activity.
	/// Empty values count as unset.
	pub fn resolve(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
		let client_id = required(&lookup, ENV_CLIENT_ID, ConfigError::MissingClientId)?;
		let client_secret = required(&lookup, ENV_CLIENT_SECRET, ConfigError::MissingClientSecret)?;
		let redirect_raw = required(&lookup, ENV_REDIRECT_URI, ConfigError::MissingRedirectUri)?;
		let redirect_uri = Url::parse(&redirect_raw)
			.map_err(|source| ConfigError::InvalidRedirectUri { source })?;
		let app_origin_raw =
			optional(&lookup, ENV_APP_ORIGIN).unwrap_or_else(|| DEFAULT_APP_ORIGIN.into());
		let app_origin = Url::parse(&app_origin_raw)
			.map_err(|source| ConfigError::InvalidAppOrigin { source })?;
		let listen_port = match optional(&lookup, ENV_PORT) {
			Some(raw) =>
				raw.parse().map_err(|_| ConfigError::InvalidPort { value: raw.clone() })?,
			None => DEFAULT_PORT,
		};

		Ok(Self { client_id, client_secret, redirect_uri, app_origin, listen_port })
	}

	/// Exact `scheme://host[:port]` origin of the single-page application.
	///
	/// This is the only value ever used as a `postMessage` target origin.
	pub fn app_origin_ascii(&self) -> String {
		self.app_origin.origin().ascii_serialization()
	}

	/// Exact origin of the gateway itself, derived from the registered redirect URI.
	pub fn backend_origin_ascii(&self) -> String {
		self.redirect_uri.origin().ascii_serialization()
	}
}

fn required(
	lookup: impl Fn(&str) -> Option<String>,
	key: &str,
	missing: ConfigError,
) -> Result<String, ConfigError> {
	match lookup(key) {
		Some(value) if !value.trim().is_empty() => Ok(value),
		_ => Err(missing),
	}
}

fn optional(lookup: impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
	lookup(key).filter(|value| !value.trim().is_empty())
}

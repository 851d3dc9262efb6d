//! Gateway-level error types shared across configuration, login flows, and the HTTP boundary.

// crates.io
use axum::{
	Json,
	http::StatusCode,
	response::{IntoResponse, Response},
};
use serde_json::Value;
// self
use crate::_prelude::*;

/// Envelope label for configuration failures.
const CONFIG_MISSING: &str = "Epic configuration missing";
/// Envelope label for every provider-facing failure.
const AUTH_FAILED: &str = "Epic authentication failed";

/// Gateway-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Canonical gateway error exposed by public APIs.
///
/// Every variant is converted into a JSON envelope at the request boundary; none is
/// allowed to crash the process.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Failure in the provider-facing login flow.
	#[error(transparent)]
	Auth(#[from] AuthError),
	/// Handoff document could not be rendered.
	#[error("Failed to encode the handoff payload.")]
	HandoffEncode {
		/// Underlying serialization failure.
		#[source]
		source: serde_json::Error,
	},
	/// Listener-level I/O failure while binding or serving.
	#[error("I/O error occurred while serving the gateway.")]
	Io(#[from] std::io::Error),
}
impl Error {
	/// HTTP status the error maps to at the request boundary.
	pub fn status_code(&self) -> StatusCode {
		match self {
			Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
			Self::Auth(auth) => match auth {
				AuthError::MissingCode | AuthError::StateMismatch => StatusCode::BAD_REQUEST,
				AuthError::AuthorizationDenied { .. } | AuthError::ProviderUnreachable { .. } =>
					StatusCode::BAD_GATEWAY,
				AuthError::ProviderExchangeFailed { .. }
				| AuthError::ExchangeResponseParse { .. }
				| AuthError::UserInfoFailed { .. }
				| AuthError::UserInfoResponseParse { .. } => StatusCode::INTERNAL_SERVER_ERROR,
			},
			Self::HandoffEncode { .. } | Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}

	/// JSON envelope the error maps to at the request boundary.
	///
	/// Provider bodies are forwarded for diagnostics; credentials never are.
	pub fn envelope(&self) -> ErrorEnvelope {
		match self {
			Self::Config(_) => ErrorEnvelope::new(CONFIG_MISSING),
			Self::Auth(auth) => match auth {
				AuthError::MissingCode => ErrorEnvelope::new("Missing authorization code"),
				AuthError::StateMismatch => ErrorEnvelope::new("Invalid authorization state"),
				AuthError::AuthorizationDenied { error, description } =>
					ErrorEnvelope::new(AUTH_FAILED).with_details(serde_json::json!({
						"error": error,
						"error_description": description,
					})),
				AuthError::ProviderExchangeFailed { body, .. }
				| AuthError::ExchangeResponseParse { body, .. }
				| AuthError::UserInfoFailed { body, .. }
				| AuthError::UserInfoResponseParse { body, .. } => {
					let envelope = ErrorEnvelope::new(AUTH_FAILED);

					match provider_details(body) {
						Some(details) => envelope.with_details(details),
						None => envelope,
					}
				},
				AuthError::ProviderUnreachable { source } => ErrorEnvelope::new(AUTH_FAILED)
					.with_details(Value::String(source.to_string())),
			},
			Self::HandoffEncode { .. } => ErrorEnvelope::new("Failed to render login response"),
			Self::Io(_) => ErrorEnvelope::new("Internal server error"),
		}
	}
}
impl IntoResponse for Error {
	fn into_response(self) -> Response {
		let status = self.status_code();

		if status.is_server_error() {
			tracing::warn!(error = %self, "request failed");
		} else {
			tracing::debug!(error = %self, "request rejected");
		}

		(status, Json(self.envelope())).into_response()
	}
}

/// Configuration and validation failures raised by the gateway.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// `EPIC_CLIENT_ID` is unset or empty.
	#[error("Epic client id is missing.")]
	MissingClientId,
	/// `EPIC_CLIENT_SECRET` is unset or empty.
	#[error("Epic client secret is missing.")]
	MissingClientSecret,
	/// `EPIC_REDIRECT_URI` is unset or empty.
	#[error("Epic redirect URI is missing.")]
	MissingRedirectUri,
	/// Redirect URI cannot be parsed.
	#[error("Redirect URI is invalid.")]
	InvalidRedirectUri {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Application origin cannot be parsed.
	#[error("Application origin is invalid.")]
	InvalidAppOrigin {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Application origin cannot be used as a CORS header value.
	#[error("Application origin is not a valid header value.")]
	AppOriginHeaderValue {
		/// Underlying header conversion failure.
		#[source]
		source: axum::http::header::InvalidHeaderValue,
	},
	/// Listen port is not a valid TCP port number.
	#[error("Listen port `{value}` is invalid.")]
	InvalidPort {
		/// Rejected raw value.
		value: String,
	},
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: reqwest::Error,
	},
}

/// Login-flow failures surfaced by the provider-facing operations.
#[derive(Debug, ThisError)]
pub enum AuthError {
	/// Callback arrived without an authorization code.
	#[error("Missing authorization code.")]
	MissingCode,
	/// Provider redirected back with an OAuth error instead of a code.
	#[error("Provider denied the authorization request: {error}.")]
	AuthorizationDenied {
		/// OAuth `error` parameter returned by the provider.
		error: String,
		/// Optional `error_description` parameter.
		description: Option<String>,
	},
	/// Callback `state` is unknown, already consumed, or expired.
	#[error("Authorization state mismatch.")]
	StateMismatch,
	/// Token endpoint rejected the exchange.
	#[error("Token endpoint rejected the exchange with status {status}.")]
	ProviderExchangeFailed {
		/// HTTP status returned by the token endpoint.
		status: u16,
		/// Raw response body, forwarded for diagnostics.
		body: String,
	},
	/// Token endpoint returned a success status with an unusable payload.
	#[error("Token endpoint returned malformed JSON.")]
	ExchangeResponseParse {
		/// HTTP status returned by the token endpoint.
		status: u16,
		/// Raw response body, forwarded for diagnostics.
		body: String,
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Userinfo endpoint rejected the lookup.
	#[error("Userinfo endpoint rejected the lookup with status {status}.")]
	UserInfoFailed {
		/// HTTP status returned by the userinfo endpoint.
		status: u16,
		/// Raw response body, forwarded for diagnostics.
		body: String,
	},
	/// Userinfo endpoint returned a success status with an unusable payload.
	#[error("Userinfo endpoint returned malformed JSON.")]
	UserInfoResponseParse {
		/// HTTP status returned by the userinfo endpoint.
		status: u16,
		/// Raw response body, forwarded for diagnostics.
		body: String,
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Outbound call failed at the transport layer (DNS, TCP, TLS, timeout).
	#[error("Provider is unreachable.")]
	ProviderUnreachable {
		/// Transport-specific network failure.
		#[source]
		source: reqwest::Error,
	},
}

/// JSON error envelope returned by every failing endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
	/// Stable, user-facing error label.
	pub error: String,
	/// Diagnostic payload forwarded from the provider, when available.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub details: Option<Value>,
}
impl ErrorEnvelope {
	/// Creates an envelope with the provided label and no details.
	pub fn new(error: impl Into<String>) -> Self {
		Self { error: error.into(), details: None }
	}

	/// Attaches a diagnostic payload.
	pub fn with_details(mut self, details: Value) -> Self {
		self.details = Some(details);

		self
	}
}

/// Re-parses a provider body as JSON when possible, falling back to the raw string.
fn provider_details(body: &str) -> Option<Value> {
	if body.is_empty() {
		return None;
	}

	Some(serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_owned())))
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn provider_failures_map_to_the_authentication_envelope() {
		let err: Error = AuthError::ProviderExchangeFailed {
			status: 400,
			body: "{\"error\":\"invalid_grant\"}".into(),
		}
		.into();

		assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

		let envelope = err.envelope();

		assert_eq!(envelope.error, AUTH_FAILED);
		assert_eq!(envelope.details, Some(serde_json::json!({ "error": "invalid_grant" })));
	}

	#[test]
	fn non_json_provider_bodies_are_forwarded_verbatim() {
		let err: Error = AuthError::UserInfoFailed { status: 503, body: "upstream down".into() }.into();
		let envelope = err.envelope();

		assert_eq!(envelope.details, Some(Value::String("upstream down".into())));
	}

	#[test]
	fn missing_code_is_a_client_error() {
		let err: Error = AuthError::MissingCode.into();

		assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
		assert_eq!(err.envelope().error, "Missing authorization code");
		assert_eq!(err.envelope().details, None);
	}

	#[test]
	fn config_failures_surface_as_500() {
		let err: Error = ConfigError::MissingClientId.into();

		assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
		assert_eq!(err.envelope().error, CONFIG_MISSING);
	}
}

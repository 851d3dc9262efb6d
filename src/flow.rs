//! Provider-facing login flow: authorization redirect, code exchange, and identity
//! resolution.
//!
//! The two outbound calls run sequentially within one request's handling; the exchanged
//! access token is used exactly once and never crosses the network boundary back to the
//! browser.

// std
use std::time::Duration as StdDuration;
// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
use reqwest::{StatusCode, redirect::Policy};
// self
use crate::{
	_prelude::*,
	auth::{AccessToken, AccountId},
	config::Config,
	error::{AuthError, ConfigError},
	provider::ProviderEndpoints,
};

/// Bounded timeout applied to each outbound provider call.
pub const PROVIDER_TIMEOUT: StdDuration = StdDuration::from_secs(8);

const SCOPE: &str = "basic_profile";

/// Token endpoint response; held only within the exchanging request's scope and
/// invalidated by process exit.
#[derive(Clone, Debug, Deserialize)]
pub struct TokenResponse {
	/// Bearer credential used exactly once to resolve the identity.
	pub access_token: AccessToken,
	/// Token type reported by the provider, typically `bearer`.
	#[serde(default)]
	pub token_type: Option<String>,
	/// Access token lifetime in seconds.
	#[serde(default)]
	pub expires_in: Option<u64>,
	/// Epic account identifier, when the token endpoint includes it.
	#[serde(default)]
	pub account_id: Option<AccountId>,
}

/// Resolved identity returned by the userinfo endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
	/// Durable subject identifier; the primary key for the user.
	#[serde(rename = "sub")]
	pub subject: AccountId,
	/// Display name; not a stable key.
	pub preferred_username: String,
}

/// Coordinates the authorization-code login against a single provider endpoint set.
///
/// The flow owns the outbound HTTP client so timeout and redirect policy are applied
/// uniformly; token requests must not follow redirects, matching OAuth 2.0 guidance
/// that token endpoints return results directly.
#[derive(Clone, Debug)]
pub struct LoginFlow {
	http_client: ReqwestClient,
	config: Arc<Config>,
	endpoints: ProviderEndpoints,
}
impl LoginFlow {
	/// Creates a flow for the provided configuration and endpoint set.
	pub fn new(config: Arc<Config>, endpoints: ProviderEndpoints) -> Result<Self> {
		let http_client = ReqwestClient::builder()
			.timeout(PROVIDER_TIMEOUT)
			.redirect(Policy::none())
			.build()
			.map_err(|source| ConfigError::HttpClientBuild { source })?;

		Ok(Self { http_client, config, endpoints })
	}

	/// Endpoint set the flow operates against.
	pub fn endpoints(&self) -> &ProviderEndpoints {
		&self.endpoints
	}

	/// Builds the provider authorization URL for one login attempt.
	///
	/// `prompt=login` forces re-authentication instead of silent SSO; `state` must be a
	/// freshly issued single-use value that the callback handler verifies.
	pub fn authorize_url(&self, state: &str) -> Url {
		let mut url = self.endpoints.authorization.clone();
		let mut pairs = url.query_pairs_mut();

		pairs.append_pair("client_id", &self.config.client_id);
		pairs.append_pair("response_type", "code");
		pairs.append_pair("scope", SCOPE);
		pairs.append_pair("prompt", "login");
		pairs.append_pair("redirect_uri", self.config.redirect_uri.as_str());
		pairs.append_pair("state", state);

		drop(pairs);

		url
	}

	/// Exchanges a single-use authorization code for a token response.
	///
	/// An empty code is rejected locally with [`AuthError::MissingCode`] before any
	/// network call. There is no retry policy: the code is single-use by provider
	/// contract, so retrying with the same code is expected to fail.
	pub async fn exchange_code(&self, code: &str) -> Result<TokenResponse> {
		if code.trim().is_empty() {
			return Err(AuthError::MissingCode.into());
		}

		let credentials =
			STANDARD.encode(format!("{}:{}", self.config.client_id, self.config.client_secret));
		let form = [
			("grant_type", "authorization_code"),
			("code", code),
			("redirect_uri", self.config.redirect_uri.as_str()),
		];
		let response = self
			.http_client
			.post(self.endpoints.token.clone())
			.header("Authorization", format!("Basic {credentials}"))
			.form(&form)
			.send()
			.await
			.map_err(|source| AuthError::ProviderUnreachable { source })?;
		let status = response.status();
		let body = response
			.text()
			.await
			.map_err(|source| AuthError::ProviderUnreachable { source })?;

		if !status.is_success() {
			return Err(
				AuthError::ProviderExchangeFailed { status: status.as_u16(), body }.into()
			);
		}

		parse_json(&body).map_err(|source| {
			AuthError::ExchangeResponseParse {
				status: status.as_u16(),
				body: body.clone(),
				source,
			}
			.into()
		})
	}

	/// Resolves the authenticated identity with a freshly exchanged access token.
	///
	/// Must run strictly after a successful [`Self::exchange_code`]; it is not
	/// independently retryable with a stale token.
	pub async fn resolve_identity(&self, access_token: &AccessToken) -> Result<UserInfo> {
		let response = self
			.http_client
			.get(self.endpoints.userinfo.clone())
			.bearer_auth(access_token.expose())
			.send()
			.await
			.map_err(|source| AuthError::ProviderUnreachable { source })?;
		let status = response.status();
		let body = response
			.text()
			.await
			.map_err(|source| AuthError::ProviderUnreachable { source })?;

		if !status.is_success() {
			return Err(AuthError::UserInfoFailed { status: status.as_u16(), body }.into());
		}

		parse_json(&body).map_err(|source| {
			AuthError::UserInfoResponseParse {
				status: status.as_u16(),
				body: body.clone(),
				source,
			}
			.into()
		})
	}

	/// Runs the full exchange-then-resolve sequence for one callback.
	///
	/// The token response is dropped on return; only the resolved identity escapes.
	pub async fn complete_login(&self, code: &str) -> Result<UserInfo> {
		let token = self.exchange_code(code).await?;
		let user = self.resolve_identity(&token.access_token).await?;

		tracing::info!(username = %user.preferred_username, subject = %user.subject, "login completed");

		Ok(user)
	}
}

fn parse_json<T>(body: &str) -> Result<T, serde_path_to_error::Error<serde_json::Error>>
where
	T: for<'de> Deserialize<'de>,
{
	let mut deserializer = serde_json::Deserializer::from_str(body);

	serde_path_to_error::deserialize(&mut deserializer)
}

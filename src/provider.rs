//! Epic endpoint set consumed by the login flow.

// self
use crate::_prelude::*;

const EPIC_AUTHORIZATION: &str = "https://www.epicgames.com/id/authorize";
const EPIC_TOKEN: &str = "https://api.epicgames.dev/epic/oauth/v1/token";
const EPIC_USERINFO: &str = "https://api.epicgames.dev/epic/oauth/v1/userInfo";
const EPIC_LOGOUT: &str = "https://www.epicgames.com/id/logout";

/// Endpoint set used for every outbound provider interaction.
///
/// Defaults to the Epic production endpoints; each endpoint can be overridden
/// individually, which is how tests point the flow at a mock provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderEndpoints {
	/// Authorization endpoint the end-user's browser is redirected to.
	pub authorization: Url,
	/// Token endpoint used for the authorization-code exchange.
	pub token: Url,
	/// Userinfo endpoint resolved with the exchanged access token.
	pub userinfo: Url,
	/// Logout endpoint terminating the provider's own session.
	pub logout: Url,
}
impl ProviderEndpoints {
	/// Epic production endpoint set.
	pub fn epic() -> Self {
		Self {
			authorization: EPIC_AUTHORIZATION.parse().expect("valid default URL"),
			token: EPIC_TOKEN.parse().expect("valid default URL"),
			userinfo: EPIC_USERINFO.parse().expect("valid default URL"),
			logout: EPIC_LOGOUT.parse().expect("valid default URL"),
		}
	}

	/// Overrides the authorization endpoint.
	#[must_use]
	pub fn with_authorization(mut self, url: Url) -> Self {
		self.authorization = url;

		self
	}

	/// Overrides the token endpoint.
	#[must_use]
	pub fn with_token(mut self, url: Url) -> Self {
		self.token = url;

		self
	}

	/// Overrides the userinfo endpoint.
	#[must_use]
	pub fn with_userinfo(mut self, url: Url) -> Self {
		self.userinfo = url;

		self
	}

	/// Overrides the logout endpoint.
	#[must_use]
	pub fn with_logout(mut self, url: Url) -> Self {
		self.logout = url;

		self
	}
}
impl Default for ProviderEndpoints {
	fn default() -> Self {
		Self::epic()
	}
}

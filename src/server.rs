//! HTTP surface of the gateway: login redirect, provider callback, logout redirect,
//! session probe, and the embedded pages.

// std
use std::net::SocketAddr;
// crates.io
use axum::{
	Json, Router,
	extract::{Query, State},
	http::{HeaderValue, StatusCode, header},
	response::{Html, IntoResponse, Response},
	routing::get,
};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
// self
use crate::{
	_prelude::*,
	config::Config,
	error::{AuthError, ConfigError, ErrorEnvelope},
	flow::LoginFlow,
	handoff,
	provider::ProviderEndpoints,
	session::{MemorySessionStore, SessionStore, landing_page, profile_page},
	state::StateLedger,
};

/// Shared state behind every handler.
///
/// Holds the immutable configuration, the provider-facing flow, the single-use state
/// ledger, and the session-store seam consulted by `/api/me`. The login flow itself
/// never writes to that store; there is no server-side session table.
pub struct Gateway {
	config: Arc<Config>,
	flow: LoginFlow,
	states: StateLedger,
	sessions: Arc<dyn SessionStore>,
	allow_origin: HeaderValue,
}
impl Gateway {
	/// Creates a gateway against the Epic production endpoints.
	pub fn new(config: Config) -> Result<Self> {
		Self::with_endpoints(config, ProviderEndpoints::default())
	}

	/// Creates a gateway against an explicit endpoint set.
	pub fn with_endpoints(config: Config, endpoints: ProviderEndpoints) -> Result<Self> {
		let config = Arc::new(config);
		let allow_origin = HeaderValue::from_str(&config.app_origin_ascii())
			.map_err(|source| ConfigError::AppOriginHeaderValue { source })?;
		let flow = LoginFlow::new(config.clone(), endpoints)?;

		Ok(Self {
			config,
			flow,
			states: StateLedger::default(),
			sessions: Arc::new(MemorySessionStore::default()),
			allow_origin,
		})
	}

	/// Replaces the session store consulted by `/api/me`.
	#[must_use]
	pub fn with_session_store(mut self, store: Arc<dyn SessionStore>) -> Self {
		self.sessions = store;

		self
	}

	/// Resolved configuration the gateway was built with.
	pub fn config(&self) -> &Config {
		&self.config
	}

	/// Provider-facing login flow.
	pub fn flow(&self) -> &LoginFlow {
		&self.flow
	}
}
impl Debug for Gateway {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Gateway")
			.field("config", &self.config)
			.field("allow_origin", &self.allow_origin)
			.finish()
	}
}

/// Builds the gateway router with CORS restricted to the application origin.
pub fn router(gateway: Arc<Gateway>) -> Router {
	let cors =
		CorsLayer::new().allow_origin(gateway.allow_origin.clone()).allow_credentials(true);

	Router::new()
		.route("/", get(landing))
		.route("/profile", get(profile))
		.route("/auth/epic/login", get(login))
		.route("/auth/epic/callback", get(callback))
		.route("/full-logout", get(full_logout))
		.route("/api/me", get(me))
		.layer(cors)
		.layer(TraceLayer::new_for_http())
		.with_state(gateway)
}

/// Binds the configured port and serves the gateway until the process exits.
pub async fn serve(gateway: Arc<Gateway>) -> Result<()> {
	let addr = SocketAddr::from(([0, 0, 0, 0], gateway.config.listen_port));
	let listener = TcpListener::bind(addr).await?;
	let port = listener.local_addr()?.port();

	tracing::info!("Server running on http://localhost:{port}");

	axum::serve(listener, router(gateway)).await?;

	Ok(())
}

/// Query parameters Epic appends to the callback redirect.
#[derive(Debug, Deserialize)]
struct CallbackQuery {
	code: Option<String>,
	state: Option<String>,
	error: Option<String>,
	error_description: Option<String>,
}

async fn landing(State(gateway): State<Arc<Gateway>>) -> Result<Html<String>> {
	Ok(Html(landing_page(&gateway.config.backend_origin_ascii())?))
}

async fn profile(State(gateway): State<Arc<Gateway>>) -> Result<Html<String>> {
	Ok(Html(profile_page(&gateway.config.backend_origin_ascii())?))
}

async fn login(State(gateway): State<Arc<Gateway>>) -> Response {
	let state = gateway.states.issue();
	let url = gateway.flow.authorize_url(&state);

	tracing::debug!("redirecting to the provider authorization endpoint");

	found(url.as_str())
}

async fn callback(
	State(gateway): State<Arc<Gateway>>,
	Query(query): Query<CallbackQuery>,
) -> Result<Html<String>> {
	if let Some(error) = query.error {
		return Err(AuthError::AuthorizationDenied {
			error,
			description: query.error_description,
		}
		.into());
	}

	let code =
		query.code.filter(|code| !code.trim().is_empty()).ok_or(AuthError::MissingCode)?;

	if !gateway.states.consume(query.state.as_deref().unwrap_or_default()) {
		return Err(AuthError::StateMismatch.into());
	}

	let user = gateway.flow.complete_login(&code).await?;
	let document = handoff::render_success(&user, &gateway.config.app_origin)?;

	Ok(Html(document))
}

async fn full_logout(State(gateway): State<Arc<Gateway>>) -> Response {
	let mut url = gateway.flow.endpoints().logout.clone();

	url.query_pairs_mut().append_pair("redirect_uri", &gateway.config.app_origin_ascii());

	found(url.as_str())
}

async fn me(State(gateway): State<Arc<Gateway>>) -> Response {
	match gateway.sessions.load() {
		Ok(Some(record)) => Json(record).into_response(),
		Ok(None) =>
			(StatusCode::UNAUTHORIZED, Json(ErrorEnvelope::new("Not logged in"))).into_response(),
		Err(err) => (
			StatusCode::INTERNAL_SERVER_ERROR,
			Json(ErrorEnvelope::new("Session store failure")
				.with_details(serde_json::Value::String(err.to_string()))),
		)
			.into_response(),
	}
}

fn found(location: &str) -> Response {
	(StatusCode::FOUND, [(header::LOCATION, location.to_owned())]).into_response()
}

// std
use std::{collections::HashMap, sync::Arc};
// crates.io
use httpmock::prelude::*;
use serde_json::Value;
// self
use epic_login_gateway::{
	config::Config,
	provider::ProviderEndpoints,
	server::{self, Gateway},
	url::Url,
};

const APP_ORIGIN: &str = "http://localhost:4200";

fn url(value: &str) -> Url {
	Url::parse(value).expect("Mock provider URL should parse successfully.")
}

fn config() -> Config {
	Config {
		client_id: "client-it".into(),
		client_secret: "secret-it".into(),
		redirect_uri: url("http://127.0.0.1:4000/auth/epic/callback"),
		app_origin: url(APP_ORIGIN),
		listen_port: 0,
	}
}

fn build_endpoints(server: &MockServer) -> ProviderEndpoints {
	ProviderEndpoints::default()
		.with_authorization(url(&server.url("/authorize")))
		.with_token(url(&server.url("/token")))
		.with_userinfo(url(&server.url("/userInfo")))
		.with_logout(url(&server.url("/logout")))
}

async fn spawn_gateway(endpoints: ProviderEndpoints) -> String {
	let gateway = Gateway::with_endpoints(config(), endpoints)
		.expect("Gateway construction should succeed.");
	let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
		.await
		.expect("Test listener should bind an ephemeral port.");
	let addr = listener.local_addr().expect("Test listener should expose its address.");

	tokio::spawn(async move {
		axum::serve(listener, server::router(Arc::new(gateway))).await.ok();
	});

	format!("http://{addr}")
}

fn client() -> reqwest::Client {
	reqwest::Client::builder()
		.redirect(reqwest::redirect::Policy::none())
		.build()
		.expect("Test HTTP client should build successfully.")
}

async fn issued_state(client: &reqwest::Client, base: &str) -> String {
	let response = client
		.get(format!("{base}/auth/epic/login"))
		.send()
		.await
		.expect("Login request should succeed.");
	let location = response
		.headers()
		.get("location")
		.and_then(|value| value.to_str().ok())
		.expect("Login redirect should carry a Location header.");
	let pairs: HashMap<_, _> = url(location).query_pairs().into_owned().collect();

	pairs.get("state").cloned().expect("Authorize URL should carry a state parameter.")
}

async fn envelope(response: reqwest::Response) -> Value {
	response.json().await.expect("Error responses should carry a JSON envelope.")
}

#[tokio::test]
async fn callback_without_a_code_never_reaches_the_token_endpoint() {
	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"T1\"}");
		})
		.await;
	let base = spawn_gateway(build_endpoints(&server)).await;
	let client = client();

	for path in ["/auth/epic/callback", "/auth/epic/callback?code="] {
		let response = client
			.get(format!("{base}{path}"))
			.send()
			.await
			.expect("Callback request should get a response.");

		assert_eq!(response.status().as_u16(), 400);
		assert_eq!(envelope(response).await["error"], "Missing authorization code");
	}

	token_mock.assert_hits_async(0).await;
}

#[tokio::test]
async fn unknown_state_is_rejected_before_the_exchange() {
	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"T1\"}");
		})
		.await;
	let base = spawn_gateway(build_endpoints(&server)).await;
	let response = client()
		.get(format!("{base}/auth/epic/callback?code=VALID123&state=never-issued"))
		.send()
		.await
		.expect("Callback request should get a response.");

	assert_eq!(response.status().as_u16(), 400);
	assert_eq!(envelope(response).await["error"], "Invalid authorization state");

	token_mock.assert_hits_async(0).await;
}

#[tokio::test]
async fn rejected_exchange_forwards_the_provider_body() {
	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(400)
				.header("content-type", "application/json")
				.body("{\"error\":\"invalid_grant\",\"error_description\":\"code is invalid or expired\"}");
		})
		.await;
	let base = spawn_gateway(build_endpoints(&server)).await;
	let client = client();
	let state = issued_state(&client, &base).await;
	let response = client
		.get(format!("{base}/auth/epic/callback?code=STALE&state={state}"))
		.send()
		.await
		.expect("Callback request should get a response.");

	assert_eq!(response.status().as_u16(), 500);

	let envelope = envelope(response).await;

	assert_eq!(envelope["error"], "Epic authentication failed");
	assert_eq!(envelope["details"]["error"], "invalid_grant");
	assert_eq!(envelope["details"]["error_description"], "code is invalid or expired");

	token_mock.assert_async().await;
}

#[tokio::test]
async fn malformed_token_bodies_are_surfaced_with_the_raw_payload() {
	let server = MockServer::start_async().await;
	let _token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200).header("content-type", "text/plain").body("not json");
		})
		.await;
	let base = spawn_gateway(build_endpoints(&server)).await;
	let client = client();
	let state = issued_state(&client, &base).await;
	let response = client
		.get(format!("{base}/auth/epic/callback?code=VALID123&state={state}"))
		.send()
		.await
		.expect("Callback request should get a response.");

	assert_eq!(response.status().as_u16(), 500);

	let envelope = envelope(response).await;

	assert_eq!(envelope["error"], "Epic authentication failed");
	assert_eq!(envelope["details"], "not json");
}

#[tokio::test]
async fn failed_userinfo_lookup_is_surfaced_after_a_single_exchange() {
	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"T1\"}");
		})
		.await;
	let userinfo_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/userInfo");
			then.status(403)
				.header("content-type", "application/json")
				.body("{\"error\":\"insufficient_scope\"}");
		})
		.await;
	let base = spawn_gateway(build_endpoints(&server)).await;
	let client = client();
	let state = issued_state(&client, &base).await;
	let response = client
		.get(format!("{base}/auth/epic/callback?code=VALID123&state={state}"))
		.send()
		.await
		.expect("Callback request should get a response.");

	assert_eq!(response.status().as_u16(), 500);

	let envelope = envelope(response).await;

	assert_eq!(envelope["error"], "Epic authentication failed");
	assert_eq!(envelope["details"]["error"], "insufficient_scope");

	token_mock.assert_async().await;
	userinfo_mock.assert_async().await;
}

#[tokio::test]
async fn provider_denial_on_the_callback_is_reported_without_an_exchange() {
	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"T1\"}");
		})
		.await;
	let base = spawn_gateway(build_endpoints(&server)).await;
	let response = client()
		.get(format!("{base}/auth/epic/callback?error=access_denied&error_description=nope"))
		.send()
		.await
		.expect("Callback request should get a response.");

	assert_eq!(response.status().as_u16(), 502);

	let envelope = envelope(response).await;

	assert_eq!(envelope["error"], "Epic authentication failed");
	assert_eq!(envelope["details"]["error"], "access_denied");
	assert_eq!(envelope["details"]["error_description"], "nope");

	token_mock.assert_hits_async(0).await;
}

#[tokio::test]
async fn unreachable_token_endpoint_maps_to_a_bad_gateway() {
	let server = MockServer::start_async().await;
	// Nothing listens on port 9 on loopback; the connection is refused immediately.
	let endpoints = build_endpoints(&server).with_token(url("http://127.0.0.1:9/token"));
	let base = spawn_gateway(endpoints).await;
	let client = client();
	let state = issued_state(&client, &base).await;
	let response = client
		.get(format!("{base}/auth/epic/callback?code=VALID123&state={state}"))
		.send()
		.await
		.expect("Callback request should get a response.");

	assert_eq!(response.status().as_u16(), 502);
	assert_eq!(envelope(response).await["error"], "Epic authentication failed");
}

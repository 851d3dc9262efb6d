//! Gateway binary entry point: resolve configuration once, fail fast when it is
//! incomplete, then serve.

// std
use std::{process::ExitCode, sync::Arc};
// self
use epic_login_gateway::{
	config::Config,
	obs,
	server::{self, Gateway},
};

#[tokio::main]
async fn main() -> ExitCode {
	obs::init_tracing();

	let config = match Config::from_env() {
		Ok(config) => config,
		Err(err) => {
			tracing::error!(error = %err, "Epic configuration missing");

			return ExitCode::FAILURE;
		},
	};
	let gateway = match Gateway::new(config) {
		Ok(gateway) => Arc::new(gateway),
		Err(err) => {
			tracing::error!(error = %err, "failed to construct the gateway");

			return ExitCode::FAILURE;
		},
	};

	if let Err(err) = server::serve(gateway).await {
		tracing::error!(error = %err, "server exited with an error");

		return ExitCode::FAILURE;
	}

	ExitCode::SUCCESS
}

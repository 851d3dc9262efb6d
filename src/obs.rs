//! Observability setup for the gateway binary.

// crates.io
use tracing_subscriber::EnvFilter;

/// Initializes the global tracing subscriber.
///
/// `RUST_LOG` overrides the default filter. Later calls are no-ops, so tests may
/// initialize freely.
pub fn init_tracing() {
	let filter = EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| EnvFilter::new("epic_login_gateway=info,tower_http=info"));

	let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

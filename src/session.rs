//! Client-side session contract: the persisted identity record, its storage seam, the
//! one-shot receiver that consumes the popup handoff, and the embedded pages that run
//! the same contract in a browser.
//!
//! There is no server-side session table; the record below, held in client-local
//! durable storage, is the sole signal of "logged in".

// std
use std::sync::atomic::{AtomicBool, Ordering};
// self
use crate::{
	_prelude::*,
	auth::AccountId,
	handoff::{self, HandoffMessage},
};

/// Fixed storage key the client persists the session record under, as JSON text.
pub const SESSION_STORAGE_KEY: &str = "epic_user";

/// Identity record owned exclusively by the client device.
///
/// Created on successful handoff, destroyed on logout. Serializes as
/// `{"username":…,"accountId":…}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
	/// Display name shown by the application.
	pub username: String,
	/// Durable Epic account identifier; the primary key for the user.
	#[serde(rename = "accountId")]
	pub account_id: AccountId,
}

/// Error type produced by [`SessionStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failure surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

/// Client-local durable storage contract for the single session record.
///
/// Models a key-value store holding JSON text under [`SESSION_STORAGE_KEY`], the way
/// a browser's local storage does.
pub trait SessionStore
where
	Self: Send + Sync,
{
	/// Persists or replaces the record.
	fn save(&self, record: &SessionRecord) -> Result<(), StoreError>;

	/// Fetches the record, if present.
	fn load(&self) -> Result<Option<SessionRecord>, StoreError>;

	/// Removes the record; absence is the logged-out state.
	fn clear(&self) -> Result<(), StoreError>;
}

/// Thread-safe storage backend that keeps the record in-process for tests and demos.
///
/// The record is held as serialized JSON text so the round-trip through the store
/// exercises the same encoding a browser storage backend would.
#[derive(Debug, Default)]
pub struct MemorySessionStore(Mutex<Option<String>>);
impl SessionStore for MemorySessionStore {
	fn save(&self, record: &SessionRecord) -> Result<(), StoreError> {
		let text = serde_json::to_string(record)
			.map_err(|e| StoreError::Serialization { message: e.to_string() })?;

		*self.0.lock() = Some(text);

		Ok(())
	}

	fn load(&self) -> Result<Option<SessionRecord>, StoreError> {
		match self.0.lock().as_deref() {
			Some(text) => serde_json::from_str(text)
				.map(Some)
				.map_err(|e| StoreError::Serialization { message: e.to_string() }),
			None => Ok(None),
		}
	}

	fn clear(&self) -> Result<(), StoreError> {
		*self.0.lock() = None;

		Ok(())
	}
}

/// Reasons an inbound message is silently ignored rather than consumed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IgnoreReason {
	/// The sender origin did not exactly match the expected backend origin.
	OriginMismatch,
	/// A handoff was already consumed for this login attempt.
	AlreadyConsumed,
	/// The payload was not a recognized handoff message.
	UnrecognizedPayload,
}

/// Outcome of offering one inbound message to the receiver.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReceiveOutcome {
	/// The handoff was consumed and persisted; the caller should navigate to the
	/// profile view.
	LoggedIn(SessionRecord),
	/// The message was not for us; nothing was persisted.
	Ignored(IgnoreReason),
}

/// One-shot receiver for the popup handoff, scoped to a single login attempt.
///
/// Origin verification is exact and case-sensitive over scheme+host+port; mismatches
/// are dropped silently, never raised as errors. Consumption is at-most-once per
/// attempt, so duplicate or delayed messages after a successful handoff are ignored.
pub struct SessionReceiver {
	expected_origin: String,
	store: Arc<dyn SessionStore>,
	consumed: AtomicBool,
}
impl SessionReceiver {
	/// Creates a receiver expecting messages from the given backend origin.
	pub fn new(expected_origin: impl Into<String>, store: Arc<dyn SessionStore>) -> Self {
		Self { expected_origin: expected_origin.into(), store, consumed: AtomicBool::new(false) }
	}

	/// Offers one inbound cross-window message to the receiver.
	///
	/// Only storage failures surface as errors; every protocol-level rejection is an
	/// [`Ignored`](ReceiveOutcome::Ignored) outcome.
	pub fn receive(&self, origin: &str, payload: &str) -> Result<ReceiveOutcome, StoreError> {
		if origin != self.expected_origin {
			return Ok(ReceiveOutcome::Ignored(IgnoreReason::OriginMismatch));
		}

		let Ok(HandoffMessage::AuthSuccess(record)) = serde_json::from_str(payload) else {
			return Ok(ReceiveOutcome::Ignored(IgnoreReason::UnrecognizedPayload));
		};

		if self.consumed.swap(true, Ordering::AcqRel) {
			return Ok(ReceiveOutcome::Ignored(IgnoreReason::AlreadyConsumed));
		}

		self.store.save(&record)?;

		Ok(ReceiveOutcome::LoggedIn(record))
	}
}
impl Debug for SessionReceiver {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SessionReceiver")
			.field("expected_origin", &self.expected_origin)
			.field("consumed", &self.consumed)
			.finish()
	}
}

/// Clears the persisted session record.
///
/// This is the entire client-visible logout; the provider's own session cookie scope
/// is only affected by the separate logout redirect.
pub fn logout(store: &dyn SessionStore) -> Result<(), StoreError> {
	store.clear()
}

/// Renders the landing page: the browser rendition of the receiver contract above.
///
/// The inline script opens the login popup, registers a one-shot listener that
/// verifies the sender origin, persists the identity under
/// [`SESSION_STORAGE_KEY`], deregisters itself, and navigates to the profile view.
pub fn landing_page(backend_origin: &str) -> Result<String> {
	let origin = handoff::script_literal(backend_origin)?;
	let storage_key = handoff::script_literal(SESSION_STORAGE_KEY)?;

	Ok(format!(
		"<!doctype html>\n\
		<html>\n\
		<head><meta charset=\"utf-8\"><title>Epic Games Login</title></head>\n\
		<body>\n\
		<h1>Epic Games Login</h1>\n\
		<button id=\"login\">Sign in with Epic</button>\n\
		<script>\n\
		(function () {{\n\
		\tvar BACKEND_ORIGIN = {origin};\n\
		\tvar STORAGE_KEY = {storage_key};\n\
		\tdocument.getElementById(\"login\").addEventListener(\"click\", function () {{\n\
		\t\twindow.open(BACKEND_ORIGIN + \"/auth/epic/login\", \"EpicLogin\", \"width=500,height=600\");\n\
		\t\tvar listener = function (event) {{\n\
		\t\t\tif (event.origin !== BACKEND_ORIGIN) {{ return; }}\n\
		\t\t\tif (!event.data || event.data.type !== \"AUTH_SUCCESS\") {{ return; }}\n\
		\t\t\twindow.removeEventListener(\"message\", listener);\n\
		\t\t\tlocalStorage.setItem(STORAGE_KEY, JSON.stringify(event.data.data));\n\
		\t\t\twindow.location.href = \"/profile\";\n\
		\t\t}};\n\
		\t\twindow.addEventListener(\"message\", listener);\n\
		\t}});\n\
		}})();\n\
		</script>\n\
		</body>\n\
		</html>\n"
	))
}

/// Renders the profile page: reads the persisted record, shows it, and offers both
/// local logout and the provider logout redirect.
pub fn profile_page(backend_origin: &str) -> Result<String> {
	let origin = handoff::script_literal(backend_origin)?;
	let storage_key = handoff::script_literal(SESSION_STORAGE_KEY)?;

	Ok(format!(
		"<!doctype html>\n\
		<html>\n\
		<head><meta charset=\"utf-8\"><title>Profile</title></head>\n\
		<body>\n\
		<h1>Profile</h1>\n\
		<p id=\"who\"></p>\n\
		<button id=\"logout\">Log out</button>\n\
		<a id=\"full-logout\" href=\"#\">Log out of Epic as well</a>\n\
		<script>\n\
		(function () {{\n\
		\tvar BACKEND_ORIGIN = {origin};\n\
		\tvar STORAGE_KEY = {storage_key};\n\
		\tvar raw = localStorage.getItem(STORAGE_KEY);\n\
		\tif (!raw) {{\n\
		\t\twindow.location.href = \"/\";\n\
		\t\treturn;\n\
		\t}}\n\
		\tvar user = JSON.parse(raw);\n\
		\tdocument.getElementById(\"who\").textContent = user.username + \" (\" + user.accountId + \")\";\n\
		\tdocument.getElementById(\"logout\").addEventListener(\"click\", function () {{\n\
		\t\tlocalStorage.removeItem(STORAGE_KEY);\n\
		\t\twindow.location.href = \"/\";\n\
		\t}});\n\
		\tdocument.getElementById(\"full-logout\").setAttribute(\"href\", BACKEND_ORIGIN + \"/full-logout\");\n\
		}})();\n\
		</script>\n\
		</body>\n\
		</html>\n"
	))
}

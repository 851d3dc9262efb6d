//! Popup-to-opener handoff: the one channel by which a resolved identity crosses from
//! the confidential backend context into the untrusted page context.

// self
use crate::{_prelude::*, flow::UserInfo, session::SessionRecord};

/// Tagged cross-window message posted from the popup to its opener.
///
/// Serializes as `{"type":"AUTH_SUCCESS","data":{"username":…,"accountId":…}}`. The
/// discriminant makes the channel a single-shot tagged union rather than a general
/// event bus; receivers ignore anything else.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum HandoffMessage {
	/// Successful login; carries the identity record the opener persists.
	#[serde(rename = "AUTH_SUCCESS")]
	AuthSuccess(SessionRecord),
}

/// Renders the minimal HTML document that posts the resolved identity to the opener
/// window and closes the popup.
///
/// The `postMessage` target origin is the exact application origin, never `*`. The
/// inputs carry no access token, so the bearer credential cannot be embedded.
pub fn render_success(user: &UserInfo, app_origin: &Url) -> Result<String> {
	let message = HandoffMessage::AuthSuccess(SessionRecord {
		username: user.preferred_username.clone(),
		account_id: user.subject.clone(),
	});
	let payload = script_literal(&message)?;
	let origin = script_literal(&app_origin.origin().ascii_serialization())?;

	Ok(format!(
		"<!doctype html>\n\
		<html>\n\
		<head><meta charset=\"utf-8\"><title>Signing in</title></head>\n\
		<body>\n\
		<script>\n\
		(function () {{\n\
		\tvar message = {payload};\n\
		\tif (window.opener) {{\n\
		\t\twindow.opener.postMessage(message, {origin});\n\
		\t}}\n\
		\twindow.close();\n\
		}})();\n\
		</script>\n\
		<p>Login complete. You can close this window.</p>\n\
		</body>\n\
		</html>\n"
	))
}

/// Serializes a value as a JavaScript literal safe to embed in an inline script.
///
/// `<` is escaped so attacker-influenced strings cannot terminate the script element.
pub(crate) fn script_literal(value: &(impl Serialize + ?Sized)) -> Result<String> {
	let json = serde_json::to_string(value)
		.map_err(|source| Error::HandoffEncode { source })?;

	Ok(json.replace('<', "\\u003c"))
}

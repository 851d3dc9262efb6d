//! Single-use CSRF `state` issued per login attempt.

// crates.io
use rand::{Rng, distr::Alphanumeric};
// self
use crate::_prelude::*;

const STATE_LEN: usize = 32;
const STATE_TTL: Duration = Duration::minutes(10);

/// In-process single-use state ledger scoped to popup lifetimes.
///
/// [`issue`](Self::issue) records a fresh opaque value with a bounded expiry;
/// [`consume`](Self::consume) removes it, so each value can authorize at most one
/// callback. The ledger is the only state shared between concurrent login attempts.
#[derive(Debug, Default)]
pub struct StateLedger(Mutex<HashMap<String, OffsetDateTime>>);
impl StateLedger {
	/// Issues a fresh state value for one login attempt.
	///
	/// Expired entries from abandoned attempts are purged on the way.
	pub fn issue(&self) -> String {
		let state = random_string(STATE_LEN);
		let now = OffsetDateTime::now_utc();
		let mut entries = self.0.lock();

		entries.retain(|_, expires_at| *expires_at > now);
		entries.insert(state.clone(), now + STATE_TTL);

		state
	}

	/// Consumes a returned state value, reporting whether it was live.
	///
	/// Unknown, reused, and expired values all report `false`.
	pub fn consume(&self, state: &str) -> bool {
		if state.is_empty() {
			return false;
		}

		match self.0.lock().remove(state) {
			Some(expires_at) => expires_at > OffsetDateTime::now_utc(),
			None => false,
		}
	}
}

fn random_string(len: usize) -> String {
	rand::rng().sample_iter(Alphanumeric).take(len).map(char::from).collect()
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn issued_state_is_consumable_exactly_once() {
		let ledger = StateLedger::default();
		let state = ledger.issue();

		assert_eq!(state.len(), STATE_LEN);
		assert!(ledger.consume(&state));
		assert!(!ledger.consume(&state), "A state value must be single-use.");
	}

	#[test]
	fn unknown_and_empty_states_are_rejected() {
		let ledger = StateLedger::default();

		assert!(!ledger.consume("never-issued"));
		assert!(!ledger.consume(""));
	}

	#[test]
	fn issued_states_are_unique_per_attempt() {
		let ledger = StateLedger::default();

		assert_ne!(ledger.issue(), ledger.issue());
	}

	#[test]
	fn expired_states_are_rejected_and_purged() {
		let ledger = StateLedger::default();
		let stale = "stale-state".to_owned();

		ledger
			.0
			.lock()
			.insert(stale.clone(), OffsetDateTime::now_utc() - Duration::seconds(1));

		assert!(!ledger.consume(&stale));

		ledger
			.0
			.lock()
			.insert(stale.clone(), OffsetDateTime::now_utc() - Duration::seconds(1));
		ledger.issue();

		assert!(!ledger.0.lock().contains_key(&stale), "Issuing must purge expired entries.");
	}
}

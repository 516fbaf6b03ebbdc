//! Issued-token snapshot and expiry arithmetic.

// self
use crate::{_prelude::*, auth::token::secret::TokenSecret};

/// Bearer credential ready for an `Authorization` header.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerCredential {
	/// Token type as returned by the token endpoint (e.g. `Bearer`).
	pub token_type: String,
	/// Raw access token.
	pub access_token: TokenSecret,
}
impl BearerCredential {
	/// Creates a credential, dropping any `"` characters left around either value.
	pub fn new(token_type: impl AsRef<str>, access_token: impl AsRef<str>) -> Self {
		Self {
			token_type: strip_quotes(token_type.as_ref()),
			access_token: TokenSecret::new(strip_quotes(access_token.as_ref())),
		}
	}

	/// Renders `"<token_type> <access_token>"` for use as an `Authorization` header value.
	pub fn header_value(&self) -> String {
		format!("{} {}", self.token_type, self.access_token.expose())
	}
}
impl Debug for BearerCredential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("BearerCredential")
			.field("token_type", &self.token_type)
			.field("access_token", &"<redacted>")
			.finish()
	}
}

/// Immutable snapshot of the token held by an exchanger.
///
/// `issued_at` and `lifetime` only carry meaning together. An empty snapshot has no credential
/// and a zero lifetime, which makes it expired from the moment it is created.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenState {
	/// Credential minted by the last successful exchange.
	pub credential: Option<BearerCredential>,
	/// Instant the credential was issued.
	pub issued_at: OffsetDateTime,
	/// Lifetime declared by the token endpoint.
	pub lifetime: Duration,
}
impl TokenState {
	/// State held before any successful exchange.
	pub fn empty() -> Self {
		Self::empty_at(OffsetDateTime::now_utc())
	}

	/// Empty state stamped with a caller-provided instant.
	pub fn empty_at(instant: OffsetDateTime) -> Self {
		Self { credential: None, issued_at: instant, lifetime: Duration::ZERO }
	}

	/// State recording a credential issued at `issued_at` for `lifetime`.
	pub fn issued(
		credential: BearerCredential,
		issued_at: OffsetDateTime,
		lifetime: Duration,
	) -> Self {
		Self { credential: Some(credential), issued_at, lifetime }
	}

	/// Returns the `Authorization` header value, if a credential was issued.
	pub fn authorization(&self) -> Option<String> {
		self.credential.as_ref().map(BearerCredential::header_value)
	}

	/// Lifetime in whole seconds as declared by the token endpoint.
	pub fn lifetime_seconds(&self) -> i64 {
		self.lifetime.whole_seconds()
	}

	/// Nominal expiry instant (`issued_at + lifetime`).
	pub fn expires_at(&self) -> OffsetDateTime {
		self.issued_at.saturating_add(self.lifetime)
	}

	/// Returns `true` unless expiry lies strictly after `now + lookahead`.
	///
	/// The boundary instant itself counts as expired. A positive lookahead reports expiry early so
	/// callers can refresh proactively.
	pub fn is_expired_at(&self, now: OffsetDateTime, lookahead: Duration) -> bool {
		self.expires_at() <= now.saturating_add(lookahead)
	}

	/// Checks expiry against the current UTC clock.
	pub fn is_expired(&self, lookahead: Duration) -> bool {
		self.is_expired_at(OffsetDateTime::now_utc(), lookahead)
	}

	/// Time left before expiry at `now`, clamped to zero.
	pub fn remaining_at(&self, now: OffsetDateTime) -> Duration {
		let remaining = self.expires_at() - now;

		if remaining.is_negative() { Duration::ZERO } else { remaining }
	}
}
impl Default for TokenState {
	fn default() -> Self {
		Self::empty()
	}
}

fn strip_quotes(value: &str) -> String {
	value.replace('"', "")
}

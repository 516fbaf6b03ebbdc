//! Token exchanger owning the credentials, the current token snapshot, and the transport.

mod client_credentials;
mod counters;

pub use counters::ExchangeMetrics;

// self
use crate::{
	_prelude::*, auth::TokenState, config::ThingConfig, http::TokenHttpClient,
	oauth::TransportErrorMapper,
};
#[cfg(feature = "reqwest")]
use crate::{http::ReqwestHttpClient, oauth::ReqwestTransportErrorMapper};

#[cfg(feature = "reqwest")]
/// Exchanger specialized for the crate's default reqwest transport stack.
pub type ReqwestTokenExchanger = TokenExchanger<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Performs client-credentials exchanges for one thing configuration and tracks token expiry.
///
/// The current [`TokenState`] is an immutable snapshot swapped in whole after each successful
/// exchange, so readers never see a half-updated issuance instant or lifetime. Exchanges are
/// serialized by an async single-flight guard: callers that queued behind a successful exchange
/// receive its token instead of hitting the endpoint again.
pub struct TokenExchanger<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// HTTP client wrapper used for every outbound token request.
	pub http_client: Arc<C>,
	/// Mapper applied to transport-layer errors before surfacing them to callers.
	pub transport_mapper: Arc<M>,
	/// Shared counters for exchange outcomes.
	pub metrics: Arc<ExchangeMetrics>,
	config: ThingConfig,
	state: RwLock<Arc<TokenState>>,
	exchange_guard: AsyncMutex<()>,
}
impl<C, M> TokenExchanger<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates an exchanger that reuses the caller-provided transport + mapper pair.
	pub fn with_http_client(
		config: ThingConfig,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Self {
		Self {
			http_client: http_client.into(),
			transport_mapper: mapper.into(),
			metrics: Default::default(),
			config,
			state: RwLock::new(Arc::new(TokenState::empty())),
			exchange_guard: AsyncMutex::new(()),
		}
	}

	/// Configuration this exchanger was built from.
	pub fn config(&self) -> &ThingConfig {
		&self.config
	}

	/// Returns `true` when the configured credentials allow a grant under the configured mode.
	pub fn credentials_ready(&self) -> bool {
		self.config.check_oauth2_fields()
	}

	/// Returns the current token snapshot.
	pub fn token_state(&self) -> Arc<TokenState> {
		Arc::clone(&*self.state.read())
	}

	/// Returns the `Authorization` header value of the current token, expired or not.
	pub fn authorization(&self) -> Option<String> {
		self.token_state().authorization()
	}

	/// Returns `true` if the current token has expired.
	pub fn is_token_expired(&self) -> bool {
		self.is_token_expired_with(Duration::ZERO)
	}

	/// Returns `true` if the current token expires before `now + lookahead`.
	pub fn is_token_expired_with(&self, lookahead: Duration) -> bool {
		self.token_state().is_expired(lookahead)
	}

	fn replace_state(&self, next: Arc<TokenState>) {
		*self.state.write() = next;
	}
}
#[cfg(feature = "reqwest")]
impl TokenExchanger<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates an exchanger backed by a fresh reqwest client.
	pub fn new(config: ThingConfig) -> Result<Self> {
		let http_client = ReqwestHttpClient::new()?;

		Ok(Self::with_http_client(config, http_client, ReqwestTransportErrorMapper))
	}
}
impl<C, M> Debug for TokenExchanger<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenExchanger")
			.field("config", &self.config)
			.field("state", &self.token_state())
			.finish()
	}
}

#[cfg(all(test, feature = "reqwest"))]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;
	use crate::auth::{BearerCredential, CredentialSet};

	fn exchanger() -> ReqwestTokenExchanger {
		let credentials = CredentialSet::new(
			"thing-client",
			"thing-secret",
			"device.read",
			"client_credentials",
			"https://auth.example.com/token",
		);

		TokenExchanger::new(ThingConfig::oauth2(credentials)).expect("Exchanger should build.")
	}

	#[test]
	fn fresh_exchanger_holds_expired_empty_state() {
		let exchanger = exchanger();

		assert!(exchanger.credentials_ready());
		assert!(exchanger.is_token_expired());
		assert!(exchanger.authorization().is_none());
		assert_eq!(exchanger.token_state().lifetime_seconds(), 0);
	}

	#[test]
	fn replaced_state_is_visible_to_readers() {
		let exchanger = exchanger();
		let held = exchanger.token_state();
		let next = Arc::new(TokenState::issued(
			BearerCredential::new("Bearer", "abc123"),
			OffsetDateTime::now_utc(),
			Duration::hours(1),
		));

		exchanger.replace_state(Arc::clone(&next));

		assert!(Arc::ptr_eq(&exchanger.token_state(), &next));
		assert!(held.is_expired(Duration::ZERO));
		assert!(!exchanger.is_token_expired());
		assert!(exchanger.is_token_expired_with(Duration::hours(2)));
		assert_eq!(exchanger.authorization().as_deref(), Some("Bearer abc123"));
	}

	#[test]
	fn debug_output_redacts_token_and_secret() {
		let exchanger = exchanger();

		exchanger.replace_state(Arc::new(TokenState::issued(
			BearerCredential::new("Bearer", "abc123"),
			macros::datetime!(2025-01-01 00:00 UTC),
			Duration::hours(1),
		)));

		let rendered = format!("{exchanger:?}");

		assert!(!rendered.contains("abc123"));
		assert!(!rendered.contains("thing-secret"));
	}
}

//! Client-credentials exchange with single-flight collapsing.
//!
//! [`TokenExchanger::acquire_token`] validates the credentials, parses the token URL, sends the
//! form-encoded grant through the configured transport, and swaps in a fresh [`TokenState`] only
//! when the endpoint answers 2xx with a usable payload. Every failure leaves the held snapshot
//! untouched.

// crates.io
use oauth2::{
	AsyncHttpClient, HttpRequest,
	http::{
		Request,
		header::{ACCEPT, CONTENT_TYPE},
	},
};
// self
use crate::{
	_prelude::*,
	auth::TokenState,
	error::ConfigError,
	exchange::TokenExchanger,
	http::{RequestTimeout, ResponseMetadataSlot, TokenHttpClient},
	oauth::{self, TokenEndpointResponse, TransportErrorMapper},
	obs::{self, ExchangeOutcome, ExchangeSpan},
};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

impl<C, M> TokenExchanger<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Exchanges the configured client credentials for a fresh token.
	///
	/// When another exchange completes successfully while this call waits for the single-flight
	/// guard, its snapshot is returned without a second request.
	pub async fn acquire_token(&self) -> Result<Arc<TokenState>> {
		let span = ExchangeSpan::new("acquire_token");

		obs::record_exchange_outcome(ExchangeOutcome::Attempt);
		self.metrics.record_attempt();

		let observed = self.token_state();
		let result: Result<(Arc<TokenState>, ExchangeOutcome)> = span
			.instrument(async {
				let _singleflight = self.exchange_guard.lock().await;
				let current = self.token_state();

				if !Arc::ptr_eq(&observed, &current) {
					return Ok((current, ExchangeOutcome::Coalesced));
				}

				let next = Arc::new(self.exchange().await?);

				self.replace_state(Arc::clone(&next));

				Ok((next, ExchangeOutcome::Success))
			})
			.await;

		match result {
			Ok((state, outcome)) => {
				if outcome == ExchangeOutcome::Coalesced {
					self.metrics.record_coalesced();
				} else {
					self.metrics.record_success();
				}

				obs::record_exchange_outcome(outcome);

				Ok(state)
			},
			Err(err) => {
				obs::log_exchange_failure(&self.config.credentials.token_url, &err);
				obs::record_exchange_outcome(ExchangeOutcome::Failure);
				self.metrics.record_failure();

				Err(err)
			},
		}
	}

	/// Runs [`acquire_token`](Self::acquire_token) and returns the `Authorization` header value,
	/// or an empty string on any failure.
	pub async fn acquire_token_or_empty(&self) -> String {
		self.acquire_token().await.ok().and_then(|state| state.authorization()).unwrap_or_default()
	}

	async fn exchange(&self) -> Result<TokenState> {
		let request = self.build_request()?;
		let meta = ResponseMetadataSlot::default();
		let handle = self.http_client.with_metadata(meta.clone());
		let response = handle.call(request).await.map_err(|err| {
			self.transport_mapper.map_transport_error(meta.take().as_ref(), err)
		})?;
		let status = response.status();

		if !status.is_success() {
			return Err(oauth::map_error_response(&response, meta.take().as_ref()));
		}

		let issued_at = OffsetDateTime::now_utc();

		TokenEndpointResponse::parse(status.as_u16(), response.body())?.into_state(issued_at)
	}

	fn build_request(&self) -> Result<HttpRequest> {
		let credentials = &self.config.credentials;

		credentials.validate()?;

		let token_url = Url::parse(&credentials.token_url).map_err(|source| {
			ConfigError::InvalidTokenEndpoint { url: credentials.token_url.clone(), source }
		})?;
		let mut builder = Request::builder()
			.method(self.config.token_method.as_method())
			.uri(token_url.as_str())
			.header(CONTENT_TYPE, FORM_CONTENT_TYPE)
			.header(ACCEPT, "application/json");

		if let Some(timeout) = self.config.request_timeout() {
			builder = builder.extension(RequestTimeout(timeout));
		}

		let request =
			builder.body(credentials.form_body().into_bytes()).map_err(ConfigError::from)?;

		Ok(request)
	}
}

// self
use crate::_prelude::*;
#[cfg(feature = "tracing")] use crate::error::ConfigError;

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedExchange<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedExchange<F> = F;

/// Span wrapper used around token exchanges.
#[derive(Clone, Debug)]
pub struct ExchangeSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl ExchangeSpan {
	/// Creates a new span tagged with the provided stage.
	pub fn new(stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("thing_oauth2.exchange", stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = stage;

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedExchange<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Emits the diagnostic line for a failed exchange against `token_url`.
///
/// Malformed endpoints get their own message since no request was attempted.
pub fn log_exchange_failure(token_url: &str, error: &Error) {
	#[cfg(feature = "tracing")]
	{
		match error {
			Error::Config(ConfigError::InvalidTokenEndpoint { .. }) =>
				tracing::debug!(token_url, "failed to create authentication: token URL is invalid"),
			_ => tracing::debug!(
				token_url,
				status = error.status(),
				error = %error,
				"OAuth2 token request failed"
			),
		}
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (token_url, error);
	}
}

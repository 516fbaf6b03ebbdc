//! Token endpoint wire handling: request errors, response parsing, and error classification.

// crates.io
use oauth2::{HttpClientError, HttpResponse};
use serde::de::{self, Deserializer, Visitor};
// self
use crate::{
	_prelude::*,
	auth::{BearerCredential, TokenState},
	error::{ResponseError, TransientError},
	http::ResponseMetadata,
};
#[cfg(feature = "reqwest")] use crate::error::{ConfigError, TransportError};

/// Maps HTTP transport failures into crate [`Error`] values.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an [`HttpClientError`] emitted by the transport into a crate error.
	fn map_transport_error(
		&self,
		metadata: Option<&ResponseMetadata>,
		error: HttpClientError<E>,
	) -> Error;
}

/// Default mapper for reqwest-backed transports.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
#[cfg(feature = "reqwest")]
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(
		&self,
		meta: Option<&ResponseMetadata>,
		err: HttpClientError<ReqwestError>,
	) -> Error {
		match err {
			HttpClientError::Reqwest(inner) => map_reqwest_error(meta, *inner),
			HttpClientError::Http(inner) => ConfigError::from(inner).into(),
			HttpClientError::Io(inner) => TransportError::Io(inner).into(),
			HttpClientError::Other(message) => map_generic_transport_error(meta, message),
			_ => map_unknown_transport_error(meta),
		}
	}
}

/// Successful token endpoint payload.
#[derive(Clone, Deserialize)]
pub struct TokenEndpointResponse {
	/// Raw access token; non-string JSON values are kept as their JSON text.
	#[serde(deserialize_with = "deserialize_json_text")]
	pub access_token: String,
	/// Token type, usually `Bearer`; non-string JSON values are kept as their JSON text.
	#[serde(deserialize_with = "deserialize_json_text")]
	pub token_type: String,
	/// Lifetime in seconds; numeric strings are accepted and fractional numbers are truncated.
	#[serde(deserialize_with = "deserialize_expires_in")]
	pub expires_in: u64,
}
impl TokenEndpointResponse {
	/// Parses a 2xx response body.
	pub fn parse(status: u16, body: &[u8]) -> Result<Self> {
		let mut de = serde_json::Deserializer::from_slice(body);

		serde_path_to_error::deserialize(&mut de)
			.map_err(|source| ResponseError::Malformed { source, status }.into())
	}

	/// Converts the payload into a token snapshot issued at `issued_at`.
	pub fn into_state(self, issued_at: OffsetDateTime) -> Result<TokenState> {
		let seconds = i64::try_from(self.expires_in)
			.map_err(|_| ResponseError::ExpiresInOutOfRange { value: self.expires_in })?;
		let lifetime = Duration::seconds(seconds);

		if issued_at.checked_add(lifetime).is_none() {
			return Err(ResponseError::ExpiresInOutOfRange { value: self.expires_in }.into());
		}

		Ok(TokenState::issued(
			BearerCredential::new(&self.token_type, &self.access_token),
			issued_at,
			lifetime,
		))
	}
}
impl Debug for TokenEndpointResponse {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenEndpointResponse")
			.field("access_token", &"<redacted>")
			.field("token_type", &self.token_type)
			.field("expires_in", &self.expires_in)
			.finish()
	}
}

/// OAuth 2.0 error payload (RFC 6749 §5.2); every field is optional because servers vary.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
struct ErrorResponse {
	error: Option<String>,
	error_description: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ErrorKind {
	InvalidGrant,
	InvalidClient,
	InsufficientScope,
	Transient,
}

/// Classifies a non-2xx token endpoint response.
///
/// The OAuth `error` field wins when present; otherwise the status code decides.
pub fn map_error_response(response: &HttpResponse, meta: Option<&ResponseMetadata>) -> Error {
	let status = response.status().as_u16();
	let body = serde_json::from_slice::<ErrorResponse>(response.body()).unwrap_or_default();
	let kind = body
		.error
		.as_deref()
		.and_then(classify_oauth_error)
		.unwrap_or_else(|| classify_status(status));
	let reason = match (&body.error_description, &body.error) {
		(Some(description), _) => description.clone(),
		(None, Some(code)) => code.clone(),
		(None, None) => format!("HTTP {status}"),
	};

	match kind {
		ErrorKind::InvalidGrant => Error::InvalidGrant { reason, status },
		ErrorKind::InvalidClient => Error::InvalidClient { reason, status },
		ErrorKind::InsufficientScope => Error::InsufficientScope { reason, status },
		ErrorKind::Transient => TransientError::TokenEndpoint {
			message: format!("Token endpoint returned an unexpected response: {reason}."),
			status: Some(status),
			retry_after: meta_retry_after(meta),
		}
		.into(),
	}
}

fn classify_oauth_error(value: &str) -> Option<ErrorKind> {
	if value.eq_ignore_ascii_case("invalid_grant")
		|| value.eq_ignore_ascii_case("unsupported_grant_type")
		|| value.eq_ignore_ascii_case("invalid_request")
	{
		Some(ErrorKind::InvalidGrant)
	} else if value.eq_ignore_ascii_case("invalid_client")
		|| value.eq_ignore_ascii_case("unauthorized_client")
	{
		Some(ErrorKind::InvalidClient)
	} else if value.eq_ignore_ascii_case("invalid_scope")
		|| value.eq_ignore_ascii_case("insufficient_scope")
	{
		Some(ErrorKind::InsufficientScope)
	} else if value.eq_ignore_ascii_case("temporarily_unavailable")
		|| value.eq_ignore_ascii_case("server_error")
	{
		Some(ErrorKind::Transient)
	} else {
		None
	}
}

fn classify_status(status: u16) -> ErrorKind {
	match status {
		400 | 404 | 410 => ErrorKind::InvalidGrant,
		401 => ErrorKind::InvalidClient,
		403 => ErrorKind::InsufficientScope,
		_ => ErrorKind::Transient,
	}
}

fn deserialize_expires_in<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
	D: Deserializer<'de>,
{
	struct ExpiresInVisitor;
	impl Visitor<'_> for ExpiresInVisitor {
		type Value = u64;

		fn expecting(&self, f: &mut Formatter) -> FmtResult {
			f.write_str("a non-negative number of seconds")
		}

		fn visit_u64<E>(self, value: u64) -> Result<u64, E>
		where
			E: de::Error,
		{
			Ok(value)
		}

		fn visit_i64<E>(self, value: i64) -> Result<u64, E>
		where
			E: de::Error,
		{
			u64::try_from(value).map_err(|_| E::invalid_value(de::Unexpected::Signed(value), &self))
		}

		fn visit_f64<E>(self, value: f64) -> Result<u64, E>
		where
			E: de::Error,
		{
			if value.is_finite() && value >= 0.0 {
				// Saturates above `u64::MAX`; the range check in `into_state` rejects it.
				Ok(value.trunc() as u64)
			} else {
				Err(E::invalid_value(de::Unexpected::Float(value), &self))
			}
		}

		fn visit_str<E>(self, value: &str) -> Result<u64, E>
		where
			E: de::Error,
		{
			value.trim().parse().map_err(|_| E::invalid_value(de::Unexpected::Str(value), &self))
		}
	}

	deserializer.deserialize_any(ExpiresInVisitor)
}

fn deserialize_json_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
	D: Deserializer<'de>,
{
	Ok(match serde_json::Value::deserialize(deserializer)? {
		serde_json::Value::String(text) => text,
		other => other.to_string(),
	})
}

#[cfg(feature = "reqwest")]
fn map_reqwest_error(meta: Option<&ResponseMetadata>, err: ReqwestError) -> Error {
	if err.is_builder() {
		return ConfigError::from(err).into();
	}
	if err.is_timeout() {
		return TransientError::TokenEndpoint {
			message: "Request timed out while calling the token endpoint.".into(),
			status: meta_status(meta).or_else(|| err.status().map(|code| code.as_u16())),
			retry_after: meta_retry_after(meta),
		}
		.into();
	}

	TransportError::from(err).into()
}

#[cfg(feature = "reqwest")]
fn map_generic_transport_error(meta: Option<&ResponseMetadata>, message: impl Display) -> Error {
	TransientError::TokenEndpoint {
		message: format!("HTTP client error occurred while calling the token endpoint: {message}."),
		status: meta_status(meta),
		retry_after: meta_retry_after(meta),
	}
	.into()
}

#[cfg(feature = "reqwest")]
fn map_unknown_transport_error(meta: Option<&ResponseMetadata>) -> Error {
	TransientError::TokenEndpoint {
		message: "HTTP client error occurred while calling the token endpoint.".into(),
		status: meta_status(meta),
		retry_after: meta_retry_after(meta),
	}
	.into()
}

#[cfg(feature = "reqwest")]
fn meta_status(meta: Option<&ResponseMetadata>) -> Option<u16> {
	meta.and_then(|value| value.status)
}

fn meta_retry_after(meta: Option<&ResponseMetadata>) -> Option<Duration> {
	meta.and_then(|value| value.retry_after)
}

//! Thing configuration consumed by the token exchanger.
//!
//! Only the keys that drive the OAuth 2.0 client-credentials grant are modeled. A full thing
//! configuration document (base URL, refresh interval, headers, encoding, ...) can be loaded as-is;
//! keys this crate does not use are ignored.

// crates.io
use oauth2::http::Method;
// self
use crate::{_prelude::*, auth::CredentialSet, error::ConfigError};

/// Authentication mode selected for the thing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuthMode {
	#[default]
	/// HTTP Basic challenged by the server.
	#[serde(rename = "BASIC")]
	Basic,
	/// HTTP Basic sent with the first request.
	#[serde(rename = "BASIC_PREEMPTIVE")]
	BasicPreemptive,
	/// HTTP Digest.
	#[serde(rename = "DIGEST")]
	Digest,
	/// OAuth 2.0 client-credentials grant.
	#[serde(rename = "OAuthV2", alias = "OAUTH2")]
	OAuth2,
}

/// HTTP verb used for the token request.
///
/// Defaults to `GET` with the form in the request body, which is what deployed thing
/// configurations rely on. Most authorization servers expect `POST`; select it explicitly.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TokenMethod {
	#[default]
	/// `GET` with a form body.
	Get,
	/// `POST` with a form body.
	Post,
	/// `PUT` with a form body.
	Put,
}
impl TokenMethod {
	/// Returns the matching [`Method`].
	pub fn as_method(self) -> Method {
		match self {
			Self::Get => Method::GET,
			Self::Post => Method::POST,
			Self::Put => Method::PUT,
		}
	}
}
impl Display for TokenMethod {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_method().as_str())
	}
}

/// Configuration record owning the client credentials and request settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ThingConfig {
	/// Client-credentials fields.
	#[serde(flatten)]
	pub credentials: CredentialSet,
	/// Request timeout in milliseconds; zero or negative means the request never times out.
	pub timeout: i64,
	/// Selected authentication mode.
	pub auth_mode: AuthMode,
	/// Verb used for the token request.
	pub token_method: TokenMethod,
}
impl ThingConfig {
	const DEFAULT_TIMEOUT_MS: i64 = 3_000;

	/// Creates an OAuth 2.0 configuration with default timeout and verb.
	pub fn oauth2(credentials: CredentialSet) -> Self {
		Self { credentials, auth_mode: AuthMode::OAuth2, ..Default::default() }
	}

	/// Loads a configuration from a JSON document, reporting the offending key path on failure.
	pub fn from_json_str(raw: &str) -> Result<Self> {
		let mut de = serde_json::Deserializer::from_str(raw);

		serde_path_to_error::deserialize(&mut de)
			.map_err(|source| Error::from(ConfigError::Load { source }))
	}

	/// Overrides the request timeout; [`StdDuration::ZERO`] disables it.
	pub fn with_timeout(mut self, timeout: StdDuration) -> Self {
		self.timeout = i64::try_from(timeout.as_millis()).unwrap_or(i64::MAX);

		self
	}

	/// Overrides the token request verb.
	pub fn with_token_method(mut self, method: TokenMethod) -> Self {
		self.token_method = method;

		self
	}

	/// Request timeout as a [`StdDuration`], or `None` when the timeout is disabled.
	pub fn request_timeout(&self) -> Option<StdDuration> {
		u64::try_from(self.timeout).ok().filter(|ms| *ms > 0).map(StdDuration::from_millis)
	}

	/// Returns `true` when the configured mode can proceed with the current credentials.
	pub fn check_oauth2_fields(&self) -> bool {
		self.credentials.is_ready(self.auth_mode)
	}
}
impl Default for ThingConfig {
	fn default() -> Self {
		Self {
			credentials: CredentialSet::default(),
			timeout: Self::DEFAULT_TIMEOUT_MS,
			auth_mode: AuthMode::default(),
			token_method: TokenMethod::default(),
		}
	}
}

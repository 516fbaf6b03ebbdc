//! Client-credentials field set and the readiness check run before a grant is attempted.

// self
use crate::{_prelude::*, auth::TokenSecret, config::AuthMode, error::ConfigError};

/// Fields required by the client-credentials grant.
///
/// Validity is a precondition checked by [`CredentialSet::is_ready`] or
/// [`CredentialSet::validate`]; the type itself accepts empty values so it can be loaded from a
/// partially filled configuration.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CredentialSet {
	/// OAuth 2.0 client identifier.
	pub client_id: String,
	/// OAuth 2.0 client secret; never logged.
	pub client_secret: TokenSecret,
	/// Scope requested from the token endpoint.
	pub scope: String,
	/// Grant type sent as `grant_type`, normally `client_credentials`.
	pub grant_type: String,
	/// Token endpoint URL, parsed lazily when the exchange runs.
	pub token_url: String,
}
impl CredentialSet {
	/// Creates a credential set from its five fields.
	pub fn new(
		client_id: impl Into<String>,
		client_secret: impl Into<String>,
		scope: impl Into<String>,
		grant_type: impl Into<String>,
		token_url: impl Into<String>,
	) -> Self {
		Self {
			client_id: client_id.into(),
			client_secret: TokenSecret::new(client_secret),
			scope: scope.into(),
			grant_type: grant_type.into(),
			token_url: token_url.into(),
		}
	}

	/// Returns `true` when the credentials allow a grant under `mode`.
	///
	/// Modes other than [`AuthMode::OAuth2`] never use these fields, so they always pass.
	pub fn is_ready(&self, mode: AuthMode) -> bool {
		if mode != AuthMode::OAuth2 {
			return true;
		}

		self.missing_field().is_none()
	}

	/// Fails with the configuration key of the first empty field.
	pub fn validate(&self) -> Result<(), ConfigError> {
		match self.missing_field() {
			Some(field) => Err(ConfigError::IncompleteCredentials { field }),
			None => Ok(()),
		}
	}

	/// Returns the configuration key of the first empty field, if any.
	pub fn missing_field(&self) -> Option<&'static str> {
		self.fields().into_iter().find(|(_, value)| value.is_empty()).map(|(key, _)| key)
	}

	/// Encodes the grant request as an `application/x-www-form-urlencoded` body.
	pub(crate) fn form_body(&self) -> String {
		url::form_urlencoded::Serializer::new(String::new())
			.append_pair("client_id", &self.client_id)
			.append_pair("client_secret", self.client_secret.expose())
			.append_pair("scope", &self.scope)
			.append_pair("grant_type", &self.grant_type)
			.finish()
	}

	fn fields(&self) -> [(&'static str, &str); 5] {
		[
			("clientId", &self.client_id),
			("clientSecret", self.client_secret.expose()),
			("scope", &self.scope),
			("grantType", &self.grant_type),
			("tokenUrl", &self.token_url),
		]
	}
}
impl Debug for CredentialSet {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CredentialSet")
			.field("client_id", &self.client_id)
			.field("client_secret", &self.client_secret)
			.field("scope", &self.scope)
			.field("grant_type", &self.grant_type)
			.field("token_url", &self.token_url)
			.finish()
	}
}

//! Loads a thing configuration, exchanges its client credentials against a mock token endpoint,
//! and prints the resulting `Authorization` header along with its expiry.

// crates.io
use color_eyre::{Result, eyre::eyre};
use httpmock::prelude::*;
// self
use thing_oauth2::{config::ThingConfig, exchange::ReqwestTokenExchanger, time::Duration};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"demo-access\",\"token_type\":\"Bearer\",\"expires_in\":900}",
			);
		})
		.await;
	let raw = format!(
		r#"{{
			"authMode": "OAUTH2",
			"tokenMethod": "POST",
			"timeout": 5000,
			"clientId": "demo-thing",
			"clientSecret": "super-secret",
			"scope": "device.read device.write",
			"grantType": "client_credentials",
			"tokenUrl": "{}"
		}}"#,
		server.url("/token"),
	);
	let config = ThingConfig::from_json_str(&raw)?;

	if !config.check_oauth2_fields() {
		return Err(eyre!("Thing configuration is missing OAuth2 credentials."));
	}

	let exchanger = ReqwestTokenExchanger::new(config)?;
	let state = exchanger.acquire_token().await?;

	println!(
		"Authorization: {}.",
		state.authorization().ok_or_else(|| eyre!("Exchange returned no credential."))?
	);
	println!("Expires at {}.", state.expires_at());
	println!("Refresh due within a minute: {}.", exchanger.is_token_expired_with(Duration::MINUTE));

	token_mock.assert_async().await;

	Ok(())
}

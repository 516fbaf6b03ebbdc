// std
use std::{sync::Arc, time::Duration as StdDuration};
// crates.io
use httpmock::prelude::*;
use time::{Duration, OffsetDateTime};
// self
use thing_oauth2::{
	auth::CredentialSet,
	config::{ThingConfig, TokenMethod},
	error::{Error, ResponseError, TransientError},
	exchange::{ReqwestTokenExchanger, TokenExchanger},
};

const FORM_BODY: &str =
	"client_id=thing-client&client_secret=thing-secret&scope=device.read&grant_type=client_credentials";
const TOKEN_BODY: &str = r#"{"access_token":"abc123","token_type":"Bearer","expires_in":3600}"#;

fn build_config(server: &MockServer) -> ThingConfig {
	ThingConfig::oauth2(CredentialSet::new(
		"thing-client",
		"thing-secret",
		"device.read",
		"client_credentials",
		server.url("/token"),
	))
}

fn build_exchanger(config: ThingConfig) -> ReqwestTokenExchanger {
	TokenExchanger::new(config).expect("Exchanger should build for integration tests.")
}

// Deployed thing configurations send the grant as GET with a form body. Authorization servers
// following RFC 6749 expect POST; keep this pinned until the target server is confirmed.
// httpmock refuses body matchers on GET, so the exact form bytes are asserted against a recording
// transport in `token_http_client_it.rs`.
#[tokio::test]
async fn token_request_defaults_to_get_with_form_body() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/token")
				.header("content-type", "application/x-www-form-urlencoded")
				.header("accept", "application/json");
			then.status(200).header("content-type", "application/json").body(TOKEN_BODY);
		})
		.await;
	let exchanger = build_exchanger(build_config(&server));
	let before = OffsetDateTime::now_utc();
	let state = exchanger.acquire_token().await.expect("Token exchange should succeed.");
	let after = OffsetDateTime::now_utc();

	mock.assert_async().await;

	assert_eq!(state.authorization().as_deref(), Some("Bearer abc123"));
	assert_eq!(state.lifetime_seconds(), 3600);
	assert!(before <= state.issued_at && state.issued_at <= after);
	assert!(Arc::ptr_eq(&state, &exchanger.token_state()));
	assert!(!exchanger.is_token_expired());
	assert_eq!(exchanger.metrics.successes(), 1);
}

#[tokio::test]
async fn token_request_honors_post_override() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token").body(FORM_BODY);
			then.status(200).header("content-type", "application/json").body(TOKEN_BODY);
		})
		.await;
	let exchanger = build_exchanger(build_config(&server).with_token_method(TokenMethod::Post));

	assert_eq!(exchanger.acquire_token_or_empty().await, "Bearer abc123");

	mock.assert_async().await;
}

#[tokio::test]
async fn lookahead_reports_expiry_before_the_token_lapses() {
	let server = MockServer::start_async().await;
	let _mock = server
		.mock_async(|when, then| {
			when.path("/token");
			then.status(200).header("content-type", "application/json").body(
				r#"{"access_token":"short","token_type":"Bearer","expires_in":120}"#,
			);
		})
		.await;
	let exchanger = build_exchanger(build_config(&server));

	assert!(exchanger.is_token_expired(), "Nothing has been exchanged yet.");

	exchanger.acquire_token().await.expect("Token exchange should succeed.");

	assert!(!exchanger.is_token_expired());
	assert!(!exchanger.is_token_expired_with(Duration::seconds(60)));
	assert!(exchanger.is_token_expired_with(Duration::seconds(120)));
	assert!(exchanger.is_token_expired_with(Duration::minutes(5)));
}

#[tokio::test]
async fn rejected_request_keeps_previous_token() {
	let server = MockServer::start_async().await;
	let success = server
		.mock_async(|when, then| {
			when.path("/token");
			then.status(200).header("content-type", "application/json").body(TOKEN_BODY);
		})
		.await;
	let exchanger = build_exchanger(build_config(&server));
	let first = exchanger.acquire_token().await.expect("Initial exchange should succeed.");

	success.delete_async().await;

	let rejected = server
		.mock_async(|when, then| {
			when.path("/token");
			then.status(401)
				.header("content-type", "application/json")
				.body(r#"{"error":"invalid_client","error_description":"client secret rotated"}"#);
		})
		.await;

	assert_eq!(exchanger.acquire_token_or_empty().await, "");

	let err = exchanger.acquire_token().await.expect_err("Rejected exchange should fail.");

	match err {
		Error::InvalidClient { reason, status } => {
			assert_eq!(reason, "client secret rotated");
			assert_eq!(status, 401);
		},
		other => panic!("Unexpected error variant: {other:?}."),
	}

	rejected.assert_calls_async(2).await;

	let held = exchanger.token_state();

	assert!(Arc::ptr_eq(&first, &held));
	assert_eq!(held.issued_at, first.issued_at);
	assert_eq!(held.lifetime_seconds(), 3600);
	assert_eq!(exchanger.metrics.failures(), 2);
}

#[tokio::test]
async fn server_errors_surface_retry_after() {
	let server = MockServer::start_async().await;
	let _mock = server
		.mock_async(|when, then| {
			when.path("/token");
			then.status(503).header("retry-after", "7").body("maintenance");
		})
		.await;
	let exchanger = build_exchanger(build_config(&server));
	let err = exchanger.acquire_token().await.expect_err("Unavailable endpoint should fail.");

	match err {
		Error::Transient(TransientError::TokenEndpoint { status, retry_after, .. }) => {
			assert_eq!(status, Some(503));
			assert_eq!(retry_after, Some(Duration::seconds(7)));
		},
		other => panic!("Unexpected error variant: {other:?}."),
	}

	assert!(exchanger.is_token_expired());
}

#[tokio::test]
async fn malformed_success_body_is_a_parse_error() {
	let server = MockServer::start_async().await;
	let _mock = server
		.mock_async(|when, then| {
			when.path("/token");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"access_token":"abc123","token_type":"Bearer"}"#);
		})
		.await;
	let exchanger = build_exchanger(build_config(&server));
	let err = exchanger.acquire_token().await.expect_err("Missing expires_in should fail.");

	assert!(matches!(err, Error::Response(ResponseError::Malformed { status: 200, .. })));
	assert_eq!(err.status(), Some(200));
	assert!(exchanger.authorization().is_none());
}

#[tokio::test]
async fn slow_endpoint_hits_request_timeout() {
	let server = MockServer::start_async().await;
	let _mock = server
		.mock_async(|when, then| {
			when.path("/token");
			then.status(200)
				.delay(StdDuration::from_millis(1_500))
				.header("content-type", "application/json")
				.body(TOKEN_BODY);
		})
		.await;
	let exchanger = build_exchanger(
		build_config(&server).with_timeout(StdDuration::from_millis(100)),
	);
	let err = exchanger.acquire_token().await.expect_err("Slow endpoint should time out.");

	match err {
		Error::Transient(TransientError::TokenEndpoint { message, .. }) =>
			assert!(message.contains("timed out"), "Unexpected message: {message}."),
		other => panic!("Unexpected error variant: {other:?}."),
	}
}

#[tokio::test]
async fn zero_timeout_never_cuts_the_request_short() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.path("/token");
			then.status(200)
				.delay(StdDuration::from_millis(50))
				.header("content-type", "application/json")
				.body(TOKEN_BODY);
		})
		.await;
	let exchanger = build_exchanger(build_config(&server).with_timeout(StdDuration::ZERO));
	let state = exchanger.acquire_token().await.expect("Unbounded request should succeed.");

	mock.assert_async().await;

	assert_eq!(state.authorization().as_deref(), Some("Bearer abc123"));
}

#[tokio::test]
async fn redirects_from_the_token_endpoint_are_not_followed() {
	let server = MockServer::start_async().await;
	let redirect = server
		.mock_async(|when, then| {
			when.path("/token");
			then.status(302).header("location", server.url("/moved"));
		})
		.await;
	let moved = server
		.mock_async(|when, then| {
			when.path("/moved");
			then.status(200).header("content-type", "application/json").body(TOKEN_BODY);
		})
		.await;
	let exchanger = build_exchanger(build_config(&server));
	let err = exchanger.acquire_token().await.expect_err("Redirect must not yield a token.");

	redirect.assert_async().await;
	moved.assert_calls_async(0).await;

	assert_eq!(err.status(), Some(302));
	assert!(exchanger.authorization().is_none());
}

#[tokio::test]
async fn concurrent_acquires_share_one_exchange() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.path("/token");
			then.status(200)
				.delay(StdDuration::from_millis(100))
				.header("content-type", "application/json")
				.body(TOKEN_BODY);
		})
		.await;
	let exchanger = build_exchanger(build_config(&server));
	let (first, second) = tokio::join!(exchanger.acquire_token(), exchanger.acquire_token());
	let first = first.expect("First concurrent call should succeed.");
	let second = second.expect("Second concurrent call should succeed.");

	mock.assert_calls_async(1).await;

	assert!(Arc::ptr_eq(&first, &second));
	assert_eq!(exchanger.metrics.attempts(), 2);
	assert_eq!(exchanger.metrics.successes(), 1);
	assert_eq!(exchanger.metrics.coalesced(), 1);
}

#[tokio::test]
async fn sequential_acquires_always_hit_the_endpoint() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.path("/token");
			then.status(200).header("content-type", "application/json").body(TOKEN_BODY);
		})
		.await;
	let exchanger = build_exchanger(build_config(&server));
	let first = exchanger.acquire_token().await.expect("First exchange should succeed.");
	let second = exchanger.acquire_token().await.expect("Second exchange should succeed.");

	mock.assert_calls_async(2).await;

	assert!(!Arc::ptr_eq(&first, &second));
	assert!(second.issued_at >= first.issued_at);
}

#![cfg(feature = "reqwest")]

// std
use std::sync::Arc;
// crates.io
use httpmock::prelude::*;
use serde_json::json;
use time::{Duration, OffsetDateTime};
// self
use asana_client::{
	auth::{Authenticator, OauthCredentials, Secret},
	dispatcher::{Dispatcher, DispatcherConfig, ReqwestDispatcher},
	error::{CredentialsError, Error},
	http::ReqwestTransport,
	oauth::OauthApp,
	request::DispatchOptions,
};

/// Transport that accepts the self-signed certificate `httpmock` serves.
fn mock_transport() -> ReqwestTransport {
	let client = reqwest::Client::builder()
		.danger_accept_invalid_certs(true)
		.danger_accept_invalid_hostnames(true)
		.build()
		.expect("Insecure reqwest client for the mock server should build.");

	ReqwestTransport::with_client(client)
}

fn build_app(server: &MockServer) -> OauthApp {
	OauthApp::native("client-1")
		.expect("Native app should build.")
		.with_client_secret("secret-1")
		.with_endpoints(&server.url("/-/oauth_authorize"), &server.url("/-/oauth_token"))
		.expect("Mock endpoints should parse.")
		.with_transport(mock_transport())
}

fn expired_credentials() -> OauthCredentials {
	OauthCredentials::from_access_token("access-stale")
		.with_refresh_token("refresh-1")
		.with_expires_at(OffsetDateTime::now_utc() - Duration::minutes(1))
}

#[tokio::test]
async fn refresh_rotates_access_token_before_dispatch() {
	let server = MockServer::start_async().await;
	let token = server
		.mock_async(|when, then| {
			when.method(POST).path("/-/oauth_token");
			then.status(200)
				.header("content-type", "application/json")
				.body(
					"{\"access_token\":\"access-fresh\",\"token_type\":\"bearer\",\"expires_in\":3600}",
				);
		})
		.await;
	let me = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/1.0/users/me").header("authorization", "Bearer access-fresh");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"data\":{\"gid\":\"42\"}}");
		})
		.await;
	let authenticator = Arc::new(Arc::new(build_app(&server)).authenticator(expired_credentials()));
	let dispatcher: ReqwestDispatcher = Dispatcher::with_transport(
		DispatcherConfig::default()
			.with_base_url(format!("{}/", server.base_url()))
			.with_authenticator(authenticator.clone()),
		mock_transport(),
	);

	dispatcher.authorize().await.expect("Authorization should refresh the stale token.");

	let user = dispatcher
		.get("/users/me", None, DispatchOptions::default())
		.await
		.expect("GET /users/me should resolve with the refreshed token.");
	let credentials = authenticator.credentials();

	assert_eq!(user, json!({ "gid": "42" }));
	assert_eq!(credentials.access_token.as_ref().map(Secret::expose), Some("access-fresh"));
	// Token endpoint omitted a refresh token, so the previous one stays.
	assert_eq!(credentials.refresh_token.as_ref().map(Secret::expose), Some("refresh-1"));
	assert!(credentials.expires_at.is_some());

	token.assert_calls_async(1).await;
	me.assert_calls_async(1).await;
}

#[tokio::test]
async fn concurrent_callers_share_one_refresh() {
	let server = MockServer::start_async().await;
	let token = server
		.mock_async(|when, then| {
			when.method(POST).path("/-/oauth_token");
			then.status(200)
				.header("content-type", "application/json")
				.delay(std::time::Duration::from_millis(50))
				.body(
					"{\"access_token\":\"access-shared\",\"refresh_token\":\"refresh-2\",\"token_type\":\"bearer\",\"expires_in\":3600}",
				);
		})
		.await;
	let authenticator = Arc::new(build_app(&server)).authenticator(expired_credentials());
	let (first, second, third) = tokio::join!(
		authenticator.ensure_credentials(),
		authenticator.ensure_credentials(),
		authenticator.ensure_credentials(),
	);

	first.expect("First caller should observe refreshed credentials.");
	second.expect("Second caller should observe refreshed credentials.");
	third.expect("Third caller should observe refreshed credentials.");

	let credentials = authenticator.credentials();

	assert_eq!(credentials.access_token.as_ref().map(Secret::expose), Some("access-shared"));
	assert_eq!(credentials.refresh_token.as_ref().map(Secret::expose), Some("refresh-2"));

	token.assert_calls_async(1).await;
}

#[tokio::test]
async fn invalid_grant_surfaces_as_credentials_error() {
	let server = MockServer::start_async().await;
	let token = server
		.mock_async(|when, then| {
			when.method(POST).path("/-/oauth_token");
			then.status(400)
				.header("content-type", "application/json")
				.body("{\"error\":\"invalid_grant\",\"error_description\":\"refresh token revoked\"}");
		})
		.await;
	let authenticator = Arc::new(build_app(&server)).authenticator(expired_credentials());
	let err = authenticator.ensure_credentials().await.expect_err("Revoked grant should fail.");

	assert!(matches!(
		err,
		Error::Credentials(CredentialsError::InvalidGrant { ref reason }) if reason == "refresh token revoked"
	));
	assert_eq!(
		authenticator.credentials().access_token.as_ref().map(Secret::expose),
		Some("access-stale")
	);

	token.assert_calls_async(1).await;
}

#[tokio::test]
async fn exchange_code_returns_credentials() {
	let server = MockServer::start_async().await;
	let token = server
		.mock_async(|when, then| {
			when.method(POST).path("/-/oauth_token");
			then.status(200)
				.header("content-type", "application/json")
				.body(
					"{\"access_token\":\"access-code\",\"refresh_token\":\"refresh-code\",\"token_type\":\"bearer\",\"expires_in\":3600}",
				);
		})
		.await;
	let app = build_app(&server);
	let session = app.authorization_session(Some("default"));

	session.validate_state(&session.state).expect("Echoed state should validate.");

	let credentials = app
		.exchange_code("code-1", Some(session.pkce_verifier()))
		.await
		.expect("Code exchange should succeed.");
	let now = OffsetDateTime::now_utc();

	assert_eq!(credentials.access_token.as_ref().map(Secret::expose), Some("access-code"));
	assert_eq!(credentials.refresh_token.as_ref().map(Secret::expose), Some("refresh-code"));
	assert!(credentials.is_usable_at(now, Duration::minutes(5)));

	token.assert_calls_async(1).await;
}

#[tokio::test]
async fn token_endpoint_server_failure_is_reported() {
	let server = MockServer::start_async().await;
	let token = server
		.mock_async(|when, then| {
			when.method(POST).path("/-/oauth_token");
			then.status(500).header("content-type", "text/plain").body("boom");
		})
		.await;
	let app = build_app(&server);
	let err = app
		.refresh_credentials(&Secret::new("refresh-1"))
		.await
		.expect_err("Server failure should reject.");

	assert!(matches!(err, Error::Credentials(_)));

	token.assert_calls_async(1).await;
}

mod common;

// crates.io
use azuread_connector::{
	credential::{RefreshTokenCredential, TokenCredential, TokenSecret},
	error::{AuthError, Error},
	http::ReqwestHttpClient,
	oauth::ReqwestTransportErrorMapper,
};
use httpmock::prelude::*;
// self
use common::*;

const REFRESH_TOKEN: &str = "long-lived-refresh";

fn credential(server: &MockServer, client_secret: Option<&TokenSecret>) -> RefreshTokenCredential {
	RefreshTokenCredential::<ReqwestHttpClient, ReqwestTransportErrorMapper>::new(
		&token_url(server),
		CLIENT_ID,
		client_secret,
		TokenSecret::new(REFRESH_TOKEN),
		http_client(),
		ReqwestTransportErrorMapper,
	)
	.expect("Refresh token credential should build.")
}

#[tokio::test]
async fn every_call_redeems_the_configured_refresh_token() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path(TOKEN_PATH)
				.form_urlencoded_tuple("grant_type", "refresh_token")
				.form_urlencoded_tuple("client_id", CLIENT_ID)
				.form_urlencoded_tuple("client_secret", CLIENT_SECRET)
				.form_urlencoded_tuple("refresh_token", REFRESH_TOKEN);
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"delegated\",\"refresh_token\":\"rotated\",\"token_type\":\"Bearer\",\"expires_in\":3600}",
			);
		})
		.await;
	let secret = TokenSecret::new(CLIENT_SECRET);
	let credential = credential(&server, Some(&secret));
	let first = credential.acquire_token().await.expect("First redemption should succeed.");
	let second = credential.acquire_token().await.expect("Second redemption should succeed.");

	// The rotated token is discarded, so both calls present the configured one.
	mock.assert_calls_async(2).await;

	assert_eq!(first.token.expose(), "delegated");
	assert_eq!(second.token.expose(), "delegated");
}

#[tokio::test]
async fn public_clients_redeem_without_a_secret() {
	let server = MockServer::start_async().await;
	let public = server
		.mock_async(|when, then| {
			when.method(POST)
				.path(TOKEN_PATH)
				.form_urlencoded_tuple("grant_type", "refresh_token")
				.form_urlencoded_tuple("refresh_token", REFRESH_TOKEN);
			then.status(200)
				.header("content-type", "application/json")
				.body(token_body("public-access", 600));
		})
		.await;
	let token = credential(&server, None)
		.acquire_token()
		.await
		.expect("Public client redemption should succeed.");

	public.assert_async().await;

	assert_eq!(token.token.expose(), "public-access");
}

#[tokio::test]
async fn expired_refresh_token_maps_to_invalid_grant() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(400).header("content-type", "application/json").body(
				"{\"error\":\"invalid_grant\",\"error_description\":\"AADSTS700082: The refresh token has expired due to inactivity.\"}",
			);
		})
		.await;

	let err = credential(&server, None).acquire_token().await.expect_err("Expired grant must fail.");

	assert!(!err.is_retryable());
	assert!(matches!(err, Error::Auth(AuthError::InvalidGrant { .. })));
}

#[tokio::test]
async fn non_json_envelopes_are_parse_errors() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(200).header("content-type", "application/json").body("{\"token_type\":\"Bearer\"}");
		})
		.await;

	let err = credential(&server, None).acquire_token().await.expect_err("Missing token must fail.");

	assert!(matches!(err, Error::Auth(AuthError::TokenResponseParse { status: Some(200), .. })));
}

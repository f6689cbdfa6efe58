//! Shared helpers for integration tests.

#![allow(dead_code)]

// crates.io
use azuread_connector::{
	config::{ConnectorConfig, ConnectorSettings, Endpoints},
	connector::Connector,
	credential::TokenSecret,
	http::ReqwestHttpClient,
	reqwest::{Client, redirect::Policy},
	url::Url,
};
use httpmock::prelude::*;

pub const TENANT: &str = "contoso.onmicrosoft.com";
pub const CLIENT_ID: &str = "client-id";
pub const CLIENT_SECRET: &str = "client-secret";
pub const TOKEN_PATH: &str = "/contoso.onmicrosoft.com/oauth2/v2.0/token";
pub const USERS_PATH: &str = "/v1.0/users";

/// Reqwest client that trusts the mock server's self-signed certificate.
pub fn http_client() -> ReqwestHttpClient {
	let client = Client::builder()
		.danger_accept_invalid_certs(true)
		.redirect(Policy::none())
		.build()
		.expect("Failed to build insecure Reqwest client for tests.");

	ReqwestHttpClient::with_client(client)
}

/// Settings whose login authority and Graph root both live on `server`.
pub fn settings(server: &MockServer) -> ConnectorSettings {
	let endpoints = Endpoints::builder()
		.authority(Url::parse(&server.base_url()).expect("Mock authority URL should parse."))
		.graph(Url::parse(&server.url("/v1.0")).expect("Mock Graph URL should parse."))
		.build()
		.expect("Mock endpoints should validate.");

	ConnectorSettings::new(endpoints)
}

pub fn token_url(server: &MockServer) -> Url {
	Url::parse(&server.url(TOKEN_PATH)).expect("Mock token URL should parse.")
}

pub fn connector(server: &MockServer) -> Connector {
	Connector::with_http_client(settings(server), http_client())
}

pub fn config() -> ConnectorConfig {
	ConnectorConfig {
		tenant: TENANT.into(),
		client_id: CLIENT_ID.into(),
		client_secret: TokenSecret::new(CLIENT_SECRET),
		..Default::default()
	}
}

pub fn token_body(access_token: &str, expires_in: u64) -> String {
	format!(
		"{{\"access_token\":\"{access_token}\",\"token_type\":\"Bearer\",\"expires_in\":{expires_in}}}"
	)
}

pub fn graph_user(id: &str, display_name: &str, mail: Option<&str>) -> serde_json::Value {
	serde_json::json!({
		"id": id,
		"displayName": display_name,
		"mail": mail,
		"mobilePhone": null,
		"userPrincipalName": format!("{id}@contoso.onmicrosoft.com"),
		"createdDateTime": "2021-06-01T12:00:00Z",
	})
}

pub fn users_page(users: &[serde_json::Value]) -> String {
	serde_json::json!({ "value": users }).to_string()
}

/// Mocks a successful client-credentials exchange for [`TENANT`].
pub async fn mock_token(server: &MockServer) -> httpmock::Mock<'_> {
	server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(200)
				.header("content-type", "application/json")
				.body(token_body("graph-token", 3600));
		})
		.await
}

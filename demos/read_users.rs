//! Drives the connector lifecycle (configure, open, read until exhausted, close) against a mock
//! Azure AD tenant and prints the canonical identity records.

// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
// self
use azuread_connector::{
	config::{ConnectorConfig, ConnectorSettings, Endpoints},
	connector::Connector,
	credential::TokenSecret,
	http::ReqwestHttpClient,
	plugin::{IdentityPlugin, OperationKind},
	reqwest::Client,
	url::Url,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/contoso/oauth2/v2.0/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"demo-access\",\"token_type\":\"Bearer\",\"expires_in\":3600}",
			);
		})
		.await;
	let users_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/v1.0/users");
			then.status(200).header("content-type", "application/json").body(
				serde_json::json!({
					"value": [
						{
							"id": "6e7b768e-07e2-4810-8459-485f84f8f204",
							"displayName": "Adele Vance",
							"mail": "adelev@contoso.com",
							"mobilePhone": "+1 425 555 0109",
							"userPrincipalName": "adelev@contoso.com",
							"createdDateTime": "2021-03-14T09:26:53Z",
						},
						{
							"id": "87d349ed-44d7-43e1-9a83-5f2406dee5bd",
							"displayName": "Alex Wilber",
							"mail": null,
							"mobilePhone": null,
							"userPrincipalName": "alexw@contoso.com",
							"createdDateTime": "2021-03-14T09:27:10Z",
						},
					],
				})
				.to_string(),
			);
		})
		.await;
	let endpoints = Endpoints::builder()
		.authority(Url::parse(&server.base_url())?)
		.graph(Url::parse(&server.url("/v1.0"))?)
		.build()?;
	let http_client =
		ReqwestHttpClient::with_client(Client::builder().danger_accept_invalid_certs(true).build()?);
	let mut connector =
		Connector::with_http_client(ConnectorSettings::new(endpoints).with_page_size(25), http_client);
	let config = ConnectorConfig {
		tenant: "contoso".into(),
		client_id: "demo-client".into(),
		client_secret: TokenSecret::new("super-secret"),
		..Default::default()
	};

	connector.configure(config.clone()).await?;
	connector.open(config, OperationKind::Read)?;

	loop {
		match IdentityPlugin::read(&mut connector).await {
			Ok(users) =>
				for user in users {
					println!("{}", serde_json::to_string_pretty(&user)?);
				},
			Err(err) if err.is_end_of_data() => break,
			Err(err) => return Err(err.into()),
		}
	}

	println!("Session stats: {:?}.", connector.stats());

	connector.close()?;
	token_mock.assert_calls_async(2).await;
	users_mock.assert_calls_async(2).await;

	Ok(())
}

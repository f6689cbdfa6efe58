mod common;

// std
use std::sync::Arc;
// crates.io
use azuread_connector::{
	credential::{ClientSecretCredential, TokenSecret},
	directory::{DirectoryClient, SELECT_FIELDS, UserFilter},
	error::{DirectoryError, Error},
	http::ReqwestHttpClient,
	oauth::ReqwestTransportErrorMapper,
};
use httpmock::prelude::*;
// self
use common::*;

fn directory(server: &MockServer, page_size: Option<u32>) -> DirectoryClient {
	let mut settings = settings(server);

	if let Some(page_size) = page_size {
		settings = settings.with_page_size(page_size);
	}

	let credential = ClientSecretCredential::<ReqwestHttpClient, ReqwestTransportErrorMapper>::new(
		&token_url(server),
		CLIENT_ID,
		&TokenSecret::new(CLIENT_SECRET),
		settings.endpoints.default_scope(),
		http_client(),
		ReqwestTransportErrorMapper,
	)
	.expect("Client secret credential should build.");

	DirectoryClient::new(http_client(), Arc::new(credential), &settings)
		.expect("Directory client should build.")
}

#[tokio::test]
async fn listing_projects_orders_and_caps() {
	let server = MockServer::start_async().await;
	let token = mock_token(&server).await;
	let listing = server
		.mock_async(|when, then| {
			when.method(GET)
				.path(USERS_PATH)
				.header("authorization", "Bearer graph-token")
				.query_param("$select", SELECT_FIELDS)
				.query_param("$orderby", "displayName")
				.query_param("$top", "25");
			then.status(200).header("content-type", "application/json").body(users_page(&[
				graph_user("1", "Ada", Some("ada@contoso.com")),
				graph_user("2", "Bob", None),
			]));
		})
		.await;
	let users = directory(&server, Some(25)).list_users(None).await.expect("Listing should succeed.");

	token.assert_async().await;
	listing.assert_async().await;

	assert_eq!(users.len(), 2);
	assert_eq!(users[0].display_name.as_deref(), Some("Ada"));
	assert_eq!(users[1].mail, None);
}

#[tokio::test]
async fn id_lookup_filters_without_ordering() {
	let server = MockServer::start_async().await;

	mock_token(&server).await;

	let lookup = server
		.mock_async(|when, then| {
			when.method(GET)
				.path(USERS_PATH)
				.query_param("$select", SELECT_FIELDS)
				.query_param("$filter", "id eq 'abc-123'");
			then.status(200)
				.header("content-type", "application/json")
				.body(users_page(&[graph_user("abc-123", "Ada", None)]));
		})
		.await;
	let users = directory(&server, None).get_by_id("abc-123").await.expect("Lookup should succeed.");

	lookup.assert_async().await;

	assert_eq!(users.len(), 1);
	assert_eq!(users[0].id.as_deref(), Some("abc-123"));
}

#[tokio::test]
async fn email_lookup_falls_back_to_principal_name() {
	let server = MockServer::start_async().await;

	mock_token(&server).await;

	let by_mail = server
		.mock_async(|when, then| {
			when.method(GET).path(USERS_PATH).query_param("$filter", "mail eq 'x@y.com'");
			then.status(200).header("content-type", "application/json").body(users_page(&[]));
		})
		.await;
	let by_upn = server
		.mock_async(|when, then| {
			when.method(GET)
				.path(USERS_PATH)
				.query_param("$filter", "userPrincipalName eq 'x@y.com'");
			then.status(200)
				.header("content-type", "application/json")
				.body(users_page(&[graph_user("upn-1", "Principal", None)]));
		})
		.await;
	let users =
		directory(&server, None).get_by_email("x@y.com").await.expect("Lookup should succeed.");

	by_mail.assert_async().await;
	by_upn.assert_async().await;

	assert_eq!(users.len(), 1);
	assert_eq!(users[0].id.as_deref(), Some("upn-1"));
}

#[tokio::test]
async fn email_lookup_stops_at_the_first_mail_match() {
	let server = MockServer::start_async().await;

	mock_token(&server).await;

	let by_mail = server
		.mock_async(|when, then| {
			when.method(GET).path(USERS_PATH).query_param("$filter", "mail eq 'dup@y.com'");
			then.status(200).header("content-type", "application/json").body(users_page(&[
				graph_user("a", "First", Some("dup@y.com")),
				graph_user("b", "Second", Some("dup@y.com")),
			]));
		})
		.await;
	let by_upn = server
		.mock_async(|when, then| {
			when.method(GET)
				.path(USERS_PATH)
				.query_param("$filter", "userPrincipalName eq 'dup@y.com'");
			then.status(200).header("content-type", "application/json").body(users_page(&[]));
		})
		.await;
	let users =
		directory(&server, None).get_by_email("dup@y.com").await.expect("Lookup should succeed.");

	by_mail.assert_async().await;
	by_upn.assert_calls_async(0).await;

	assert_eq!(users.len(), 2);
}

#[tokio::test]
async fn quotes_in_lookup_values_are_escaped() {
	let server = MockServer::start_async().await;

	mock_token(&server).await;

	let lookup = server
		.mock_async(|when, then| {
			when.method(GET)
				.path(USERS_PATH)
				.query_param("$filter", "mail eq 'o''brien@y.com'");
			then.status(200).header("content-type", "application/json").body(users_page(&[
				graph_user("ob", "O'Brien", Some("o'brien@y.com")),
			]));
		})
		.await;
	let users = directory(&server, None)
		.list_users(Some(&UserFilter::MailEq("o'brien@y.com".into())))
		.await
		.expect("Lookup should succeed.");

	lookup.assert_async().await;

	assert_eq!(users[0].mail.as_deref(), Some("o'brien@y.com"));
}

#[tokio::test]
async fn invalid_lookup_values_never_reach_the_directory() {
	let server = MockServer::start_async().await;
	let token = mock_token(&server).await;
	let err = directory(&server, None)
		.get_by_id("")
		.await
		.expect_err("Empty id must be rejected.");

	token.assert_calls_async(0).await;

	assert!(matches!(
		err,
		Error::Directory(DirectoryError::InvalidFilterValue { field: "id", .. })
	));
}

#[tokio::test]
async fn api_errors_surface_the_odata_envelope() {
	let server = MockServer::start_async().await;

	mock_token(&server).await;
	server
		.mock_async(|when, then| {
			when.method(GET).path(USERS_PATH);
			then.status(403).header("content-type", "application/json").body(
				r#"{"error":{"code":"Authorization_RequestDenied","message":"Insufficient privileges to complete the operation."}}"#,
			);
		})
		.await;

	let err = directory(&server, None).list_users(None).await.expect_err("Denied query must fail.");

	assert!(!err.is_retryable());

	match err {
		Error::Directory(DirectoryError::Api { status, code, message, retry_after }) => {
			assert_eq!(status, 403);
			assert_eq!(code, "Authorization_RequestDenied");
			assert_eq!(message, "Insufficient privileges to complete the operation.");
			assert_eq!(retry_after, None);
		},
		other => panic!("Unexpected error: {other:?}"),
	}
}

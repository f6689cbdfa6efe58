//! Microsoft Graph `/users` query client.
//!
//! Every query projects the same fixed field set, attaches a bearer token from the configured
//! [`TokenCredential`], and decodes the page with path-aware errors. Requests are issued one at
//! a time; continuation links are followed only when [`Pagination::FollowNextLink`] is set.

pub mod filter;
pub mod model;

pub use filter::UserFilter;
pub use model::*;

// crates.io
use reqwest::header::ACCEPT;
use url::form_urlencoded;
// self
use crate::{
	_prelude::*,
	config::{ConnectorSettings, Pagination},
	credential::TokenCredential,
	error::{ConfigError, DirectoryError, TransportError},
	http::{self, ReqwestHttpClient},
	obs::{self, Stage, StageOutcome, StageSpan},
};

/// Fields requested on every query.
pub const SELECT_FIELDS: &str = "displayName,id,mail,createdDateTime,mobilePhone,userPrincipalName";

const BODY_PREVIEW_LIMIT: usize = 256;

/// Query client for the Graph user collection.
pub struct DirectoryClient {
	http_client: ReqwestHttpClient,
	credential: Arc<dyn TokenCredential>,
	users_url: Url,
	page_size: Option<u32>,
	pagination: Pagination,
}
impl DirectoryClient {
	/// Creates a client for the users collection under `settings.endpoints`.
	pub fn new(
		http_client: ReqwestHttpClient,
		credential: Arc<dyn TokenCredential>,
		settings: &ConnectorSettings,
	) -> Result<Self> {
		Ok(Self {
			http_client,
			credential,
			users_url: settings.endpoints.users_url()?,
			page_size: settings.page_size,
			pagination: settings.pagination,
		})
	}

	/// Lists users matching `filter`, or every user when `filter` is `None`.
	///
	/// Unfiltered listings are ordered by display name.
	pub async fn list_users(&self, filter: Option<&UserFilter>) -> Result<Vec<GraphUser>> {
		const STAGE: Stage = Stage::ListUsers;

		let span = StageSpan::new(STAGE, "list_users");

		obs::record_stage_outcome(STAGE, StageOutcome::Attempt);

		let result = span.instrument(self.collect(filter)).await;

		obs::record_result(STAGE, &result);

		result
	}

	/// Looks up users by object id.
	pub async fn get_by_id(&self, id: &str) -> Result<Vec<GraphUser>> {
		self.list_users(Some(&UserFilter::IdEq(id.to_owned()))).await
	}

	/// Looks up users by mail, falling back to the user principal name when no mail matches.
	pub async fn get_by_email(&self, email: &str) -> Result<Vec<GraphUser>> {
		let users = self.list_users(Some(&UserFilter::MailEq(email.to_owned()))).await?;

		if !users.is_empty() {
			return Ok(users);
		}

		tracing::debug!("no user matched on mail; retrying on userPrincipalName");

		self.list_users(Some(&UserFilter::UserPrincipalNameEq(email.to_owned()))).await
	}

	async fn collect(&self, filter: Option<&UserFilter>) -> Result<Vec<GraphUser>> {
		let filter = filter.map(UserFilter::to_odata).transpose()?;
		let max_pages = self.pagination.max_pages();
		let mut url = self.query_url(filter.as_deref());
		let mut users = Vec::new();
		let mut pages = 0;

		loop {
			let page = self.fetch_page(url).await?;

			pages += 1;

			tracing::debug!(page = pages, users = page.value.len(), "fetched users page");

			users.extend(page.value);

			let Some(next_link) = page.next_link else { break };

			if pages >= max_pages {
				tracing::warn!(
					pages,
					fetched = users.len(),
					"directory has more users than this query fetches; continuation link dropped"
				);

				break;
			}

			url = self.next_url(&next_link)?;
		}

		Ok(users)
	}

	fn query_url(&self, filter: Option<&str>) -> Url {
		let mut pairs = vec![("$select", SELECT_FIELDS.to_owned())];

		match filter {
			Some(filter) => pairs.push(("$filter", filter.to_owned())),
			None => pairs.push(("$orderby", "displayName".to_owned())),
		}
		if let Some(top) = self.page_size {
			pairs.push(("$top", top.to_string()));
		}

		let query = pairs
			.iter()
			.map(|(key, value)| format!("{key}={}", encode_component(value)))
			.collect::<Vec<_>>()
			.join("&");
		let mut url = self.users_url.clone();

		url.set_query(Some(&query));

		url
	}

	fn next_url(&self, next_link: &str) -> Result<Url, DirectoryError> {
		let url = Url::parse(next_link).map_err(|source| DirectoryError::InvalidNextLink { source })?;

		if url.origin() != self.users_url.origin() {
			return Err(DirectoryError::ForeignNextLink { url: url.to_string() });
		}

		Ok(url)
	}

	async fn fetch_page(&self, url: Url) -> Result<UserCollection> {
		let token = self.credential.acquire_token().await?;
		let response = self
			.http_client
			.get(url)
			.bearer_auth(token.token.expose())
			.header(ACCEPT, "application/json")
			.send()
			.await
			.map_err(map_send_error)?;
		let status = response.status();
		let retry_after = http::parse_retry_after(response.headers());
		let body = response
			.bytes()
			.await
			.map_err(|err| DirectoryError::Transport(TransportError::network("graph", err)))?;

		if !status.is_success() {
			return Err(api_error(status.as_u16(), status.canonical_reason(), retry_after, &body).into());
		}

		let mut deserializer = serde_json::Deserializer::from_slice(&body);

		serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|source| DirectoryError::ResponseParse { source, status: status.as_u16() }.into())
	}
}
impl Debug for DirectoryClient {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("DirectoryClient")
			.field("users_url", &self.users_url.as_str())
			.field("page_size", &self.page_size)
			.field("pagination", &self.pagination)
			.finish_non_exhaustive()
	}
}

fn map_send_error(err: ReqwestError) -> Error {
	if err.is_builder() {
		return ConfigError::from(err).into();
	}

	DirectoryError::Transport(TransportError::network("graph", err)).into()
}

fn api_error(
	status: u16,
	reason: Option<&str>,
	retry_after: Option<Duration>,
	body: &[u8],
) -> DirectoryError {
	match serde_json::from_slice::<ODataError>(body) {
		Ok(envelope) => DirectoryError::Api {
			status,
			code: envelope.error.code,
			message: envelope.error.message,
			retry_after,
		},
		Err(_) => DirectoryError::Api {
			status,
			code: reason.unwrap_or("Unknown").to_owned(),
			message: body_preview(body),
			retry_after,
		},
	}
}

fn body_preview(body: &[u8]) -> String {
	let text = String::from_utf8_lossy(body);
	let text = text.trim();

	match text.char_indices().nth(BODY_PREVIEW_LIMIT) {
		Some((cut, _)) => format!("{}...", &text[..cut]),
		None => text.to_owned(),
	}
}

// Literal `+` is already `%2B`, so every remaining `+` encodes a space.
fn encode_component(value: &str) -> String {
	form_urlencoded::byte_serialize(value.as_bytes()).collect::<String>().replace('+', "%20")
}

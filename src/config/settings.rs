// std
use std::time::Duration as StdDuration;
// self
use crate::{_prelude::*, config::Endpoints, http::ReqwestHttpClient};

/// Continuation policy for `@odata.nextLink`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Pagination {
	/// Return only the first page; a dropped continuation link is logged at `warn`.
	#[default]
	SinglePage,
	/// Follow continuation links until the collection ends or `max_pages` pages were fetched.
	FollowNextLink {
		/// Upper bound on pages fetched by one query, including the first.
		max_pages: u32,
	},
}
impl Pagination {
	/// Returns the maximum number of pages one query may fetch.
	pub fn max_pages(self) -> u32 {
		match self {
			Self::SinglePage => 1,
			Self::FollowNextLink { max_pages } => max_pages.max(1),
		}
	}
}

/// Code-level connection settings that hosts never provide.
#[derive(Clone, Debug)]
pub struct ConnectorSettings {
	/// Login authority and Graph root.
	pub endpoints: Endpoints,
	/// Optional `$top` page-size cap.
	pub page_size: Option<u32>,
	/// Continuation policy.
	pub pagination: Pagination,
	/// Per-request timeout applied by the HTTP client.
	pub request_timeout: StdDuration,
	/// Whether the refresh-token exchange also authenticates with the client secret.
	pub refresh_sends_client_secret: bool,
}
impl ConnectorSettings {
	/// Creates settings for `endpoints` with default paging and timeouts.
	pub fn new(endpoints: Endpoints) -> Self {
		Self {
			endpoints,
			page_size: None,
			pagination: Pagination::default(),
			request_timeout: ReqwestHttpClient::DEFAULT_TIMEOUT,
			refresh_sends_client_secret: true,
		}
	}

	/// Settings for the Azure public cloud.
	pub fn azure_public() -> Result<Self> {
		Ok(Self::new(Endpoints::builder().build()?))
	}

	/// Caps every page at `page_size` users.
	pub fn with_page_size(mut self, page_size: u32) -> Self {
		self.page_size = Some(page_size);

		self
	}

	/// Overrides the continuation policy.
	pub fn with_pagination(mut self, pagination: Pagination) -> Self {
		self.pagination = pagination;

		self
	}

	/// Overrides the per-request timeout.
	pub fn with_request_timeout(mut self, timeout: StdDuration) -> Self {
		self.request_timeout = timeout;

		self
	}

	/// Controls whether refresh-token exchanges send `client_secret`.
	pub fn with_refresh_client_secret(mut self, send: bool) -> Self {
		self.refresh_sends_client_secret = send;

		self
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn defaults_fetch_one_page_without_cap() {
		let settings = ConnectorSettings::azure_public().expect("Public cloud should validate.");

		assert_eq!(settings.page_size, None);
		assert_eq!(settings.pagination.max_pages(), 1);
		assert_eq!(settings.request_timeout, StdDuration::from_secs(30));
		assert!(settings.refresh_sends_client_secret);
	}

	#[test]
	fn follow_next_link_fetches_at_least_one_page() {
		assert_eq!(Pagination::FollowNextLink { max_pages: 0 }.max_pages(), 1);
		assert_eq!(Pagination::FollowNextLink { max_pages: 7 }.max_pages(), 7);

		let settings = ConnectorSettings::azure_public()
			.expect("Public cloud should validate.")
			.with_page_size(25)
			.with_pagination(Pagination::FollowNextLink { max_pages: 4 })
			.with_refresh_client_secret(false);

		assert_eq!(settings.page_size, Some(25));
		assert_eq!(settings.pagination.max_pages(), 4);
		assert!(!settings.refresh_sends_client_secret);
	}
}

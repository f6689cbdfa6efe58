//! Azure AD identity-provider connector: authenticate against Microsoft Graph, pull directory
//! users (full listing, by id, or by email), and normalize them into canonical identity records
//! for identity-synchronization hosts.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod config;
pub mod connector;
pub mod credential;
pub mod directory;
pub mod error;
pub mod http;
pub mod oauth;
pub mod obs;
pub mod plugin;
pub mod transform;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for tests; enabled via `cfg(test)` or the `test`
	//! crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		config::{ConnectorConfig, ConnectorSettings, Endpoints},
		connector::Connector,
		credential::TokenSecret,
		http::ReqwestHttpClient,
	};

	/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.redirect(reqwest::redirect::Policy::none())
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestHttpClient::with_client(client)
	}

	/// Builds connector settings whose login authority and Graph base both point at a mock
	/// server rooted at `base` (for example `https://127.0.0.1:4000`).
	pub fn test_settings(base: &str) -> ConnectorSettings {
		let authority = Url::parse(base).expect("Mock authority URL should parse.");
		let graph = Url::parse(&format!("{}/v1.0", base.trim_end_matches('/')))
			.expect("Mock Graph URL should parse.");
		let endpoints = Endpoints::builder()
			.authority(authority)
			.graph(graph)
			.build()
			.expect("Mock endpoints should validate.");

		ConnectorSettings::new(endpoints)
	}

	/// Constructs a [`Connector`] wired to the insecure test transport.
	pub fn build_test_connector(settings: ConnectorSettings) -> Connector {
		Connector::with_http_client(settings, test_reqwest_http_client())
	}

	/// Returns a client-secret configuration for the provided tenant.
	pub fn test_config(tenant: &str) -> ConnectorConfig {
		ConnectorConfig {
			tenant: tenant.into(),
			client_id: "client-id".into(),
			client_secret: TokenSecret::new("client-secret"),
			..Default::default()
		}
	}
}

mod _prelude {
	pub use std::{
		collections::BTreeMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::Mutex;
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _, tokio as _};

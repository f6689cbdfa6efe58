//! Host-supplied connector configuration plus code-level connection settings.
//!
//! [`ConnectorConfig`] is what an identity-sync host hands the connector (tenant, application
//! credentials, optional single-user target). [`ConnectorSettings`] carries everything the host
//! never sees: endpoint roots, page sizing, continuation policy, and timeouts.

/// Login authority and Graph endpoint roots.
pub mod endpoints;
/// Code-level connection settings such as page size, pagination, and timeouts.
pub mod settings;

pub use endpoints::*;
pub use settings::*;

// self
use crate::{_prelude::*, credential::TokenSecret, error::ConfigError};

/// Connector configuration as provided by the host.
///
/// Keys are kebab-case (`client-id`, `user-pid`, ...) and unknown keys are rejected. Blank
/// optional values are treated as absent.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct ConnectorConfig {
	/// Directory tenant (GUID or verified domain).
	pub tenant: String,
	/// Application (client) id of the app registration.
	pub client_id: String,
	/// Client secret of the app registration.
	pub client_secret: TokenSecret,
	/// Long-lived refresh token; switches the credential flow when present.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub refresh_token: Option<TokenSecret>,
	/// Object id of the single user to read.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub user_pid: Option<String>,
	/// Mail or principal name of the single user to read.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub user_email: Option<String>,
}
impl ConnectorConfig {
	/// Host-facing description of the plugin.
	pub const DESCRIPTION: &'static str = "AzureAD plugin";

	/// Decodes a host payload, reporting the JSON path of the first offending field.
	pub fn from_value(value: serde_json::Value) -> Result<Self, ConfigError> {
		serde_path_to_error::deserialize(value).map_err(|err| ConfigError::InvalidShape {
			path: err.path().to_string(),
			source: err.into_inner(),
		})
	}

	/// Describes the configuration fields to the host.
	pub fn schema() -> ConfigSchema {
		ConfigSchema {
			description: Self::DESCRIPTION,
			fields: vec![
				ConfigField::new("tenant", "AzureAD tenant", true, false),
				ConfigField::new("client-id", "AzureAD Client ID", true, false),
				ConfigField::new("client-secret", "AzureAD Client Secret", true, true),
				ConfigField::new("refresh-token", "AzureAD Refresh Token", false, true),
				ConfigField::new(
					"user-pid",
					"AzureAD User PID of the user you want to read",
					false,
					false,
				),
				ConfigField::new(
					"user-email",
					"AzureAD User email of the user you want to read",
					false,
					false,
				),
			],
		}
	}

	/// Checks required and mutually exclusive fields without touching the network.
	///
	/// The conflicting-target check runs first, so a payload carrying both `user-pid` and
	/// `user-email` reports that conflict even when other fields are missing.
	pub fn validate_fields(&self) -> Result<(), ConfigError> {
		self.target()?;

		if self.tenant.trim().is_empty() {
			return Err(ConfigError::MissingTenant);
		}
		if self.client_id.trim().is_empty() {
			return Err(ConfigError::MissingClientId);
		}
		if self.client_secret.is_blank() {
			return Err(ConfigError::MissingClientSecret);
		}

		Ok(())
	}

	/// Resolves which users a read session targets.
	pub fn target(&self) -> Result<ReadTarget, ConfigError> {
		match (non_blank(self.user_pid.as_deref()), non_blank(self.user_email.as_deref())) {
			(Some(_), Some(_)) => Err(ConfigError::ConflictingTarget),
			(Some(pid), None) => Ok(ReadTarget::Pid(pid.to_owned())),
			(None, Some(email)) => Ok(ReadTarget::Email(email.to_owned())),
			(None, None) => Ok(ReadTarget::All),
		}
	}

	/// Resolves which credential flow the configuration selects.
	pub fn credential_kind(&self) -> CredentialKind {
		match &self.refresh_token {
			Some(token) if !token.is_blank() => CredentialKind::RefreshToken,
			_ => CredentialKind::ClientSecret,
		}
	}
}

/// Users a read session retrieves.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReadTarget {
	/// Full directory listing.
	All,
	/// Single user by object id.
	Pid(String),
	/// Users by mail, falling back to principal name.
	Email(String),
}

/// Credential flow selected by a configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CredentialKind {
	/// App-only client-credentials flow.
	ClientSecret,
	/// Delegated refresh-token flow.
	RefreshToken,
}

/// Host-facing configuration schema.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ConfigSchema {
	/// Plugin description.
	pub description: &'static str,
	/// Accepted fields in display order.
	pub fields: Vec<ConfigField>,
}

/// One host-visible configuration field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ConfigField {
	/// Key as it appears in the payload.
	pub name: &'static str,
	/// Human-readable description.
	pub description: &'static str,
	/// Whether the field must be non-empty.
	pub required: bool,
	/// Whether hosts should mask the value.
	pub secret: bool,
}
impl ConfigField {
	const fn new(
		name: &'static str,
		description: &'static str,
		required: bool,
		secret: bool,
	) -> Self {
		Self { name, description, required, secret }
	}
}

fn non_blank(value: Option<&str>) -> Option<&str> {
	value.map(str::trim).filter(|value| !value.is_empty())
}

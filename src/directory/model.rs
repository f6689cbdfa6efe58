//! Wire shapes of the Graph `/users` collection.

// self
use crate::_prelude::*;

/// Read-only view over a directory user, independent of the wire representation.
pub trait DirectoryUser {
	/// Object id.
	fn id(&self) -> Option<&str>;

	/// Display name.
	fn display_name(&self) -> Option<&str>;

	/// Primary SMTP address.
	fn mail(&self) -> Option<&str>;

	/// Mobile phone number.
	fn mobile_phone(&self) -> Option<&str>;

	/// User principal name (sign-in name).
	fn user_principal_name(&self) -> Option<&str>;

	/// Creation timestamp.
	fn created_at(&self) -> Option<OffsetDateTime>;

	/// Photo reference, when the representation carries one.
	fn picture(&self) -> Option<&str> {
		None
	}
}

/// User as returned by `GET /users?$select=...`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphUser {
	/// Object id.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub id: Option<String>,
	/// Display name.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub display_name: Option<String>,
	/// Primary SMTP address.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub mail: Option<String>,
	/// Mobile phone number.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub mobile_phone: Option<String>,
	/// Sign-in name.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub user_principal_name: Option<String>,
	/// Creation timestamp (RFC 3339).
	#[serde(default, skip_serializing_if = "Option::is_none", with = "time::serde::rfc3339::option")]
	pub created_date_time: Option<OffsetDateTime>,
}
impl DirectoryUser for GraphUser {
	fn id(&self) -> Option<&str> {
		self.id.as_deref()
	}

	fn display_name(&self) -> Option<&str> {
		self.display_name.as_deref()
	}

	fn mail(&self) -> Option<&str> {
		self.mail.as_deref()
	}

	fn mobile_phone(&self) -> Option<&str> {
		self.mobile_phone.as_deref()
	}

	fn user_principal_name(&self) -> Option<&str> {
		self.user_principal_name.as_deref()
	}

	fn created_at(&self) -> Option<OffsetDateTime> {
		self.created_date_time
	}
}

/// One page of a user collection.
#[derive(Clone, Debug, Deserialize)]
pub struct UserCollection {
	/// Users on this page.
	#[serde(default)]
	pub value: Vec<GraphUser>,
	/// Continuation link for the next page.
	#[serde(default, rename = "@odata.nextLink")]
	pub next_link: Option<String>,
}

/// OData error envelope.
#[derive(Clone, Debug, Deserialize)]
pub struct ODataError {
	/// Error body.
	pub error: ODataErrorBody,
}

/// Body of an [`ODataError`].
#[derive(Clone, Debug, Deserialize)]
pub struct ODataErrorBody {
	/// Machine-readable code, for example `Authorization_RequestDenied`.
	pub code: String,
	/// Human-readable message.
	#[serde(default)]
	pub message: String,
}

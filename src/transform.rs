//! Normalization of directory users into canonical identity records.
//!
//! [`normalize`] is pure: one [`DirectoryUser`] in, one [`CanonicalUser`] out. Besides copying
//! scalar fields it synthesizes identity assertions, keyed by the asserted value:
//!
//! - `PID` for the object id (always present, verified),
//! - `EMAIL` for a non-empty mail address (verified),
//! - `PHONE` for a non-empty mobile phone (not verified; the directory does not attest it).
//!
//! When two values coincide the earlier kind keeps the key, so every record carries exactly one
//! `PID` entry.

// std
use std::collections::btree_map::Entry;
// self
use crate::{
	_prelude::*,
	directory::{DirectoryUser, GraphUser},
};

/// Provider tag stamped on every identity assertion.
pub const PROVIDER: &str = "azuread";

/// Kind of an identity assertion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IdentityKind {
	/// Directory object id.
	Pid,
	/// Mail address.
	Email,
	/// Phone number.
	Phone,
}

/// Provenance and verification status of one identity value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentitySource {
	/// Assertion kind.
	pub kind: IdentityKind,
	/// Provider that produced the assertion.
	pub provider: String,
	/// Whether the provider attests ownership of the value.
	pub verified: bool,
}
impl IdentitySource {
	fn new(kind: IdentityKind) -> Self {
		Self { kind, provider: PROVIDER.into(), verified: !matches!(kind, IdentityKind::Phone) }
	}
}

/// Properties, roles, and permissions attached to a user or application.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttrSet {
	/// Free-form properties.
	pub properties: serde_json::Map<String, serde_json::Value>,
	/// Role names.
	pub roles: Vec<String>,
	/// Permission names.
	pub permissions: Vec<String>,
}

/// Record timestamps.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
	/// Creation instant.
	#[serde(with = "time::serde::rfc3339")]
	pub created_at: OffsetDateTime,
	/// Last update instant; the directory does not track one, so it mirrors `created_at`.
	#[serde(with = "time::serde::rfc3339")]
	pub updated_at: OffsetDateTime,
}

/// Canonical identity record handed to the host.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalUser {
	/// Directory object id.
	pub id: String,
	/// Display name.
	pub display_name: String,
	/// Mail address, empty when the directory has none.
	pub email: String,
	/// Photo reference, when available.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub picture: Option<String>,
	/// Identity assertions keyed by the asserted value.
	pub identities: BTreeMap<String, IdentitySource>,
	/// User attributes; always empty for this directory.
	pub attributes: AttrSet,
	/// Per-application attributes; unused by this connector.
	pub applications: BTreeMap<String, AttrSet>,
	/// Record timestamps.
	pub metadata: Metadata,
}

/// A directory record lacks a field every canonical user needs.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum NormalizationError {
	/// Required attribute is absent or empty.
	#[error("Directory user `{id}` is missing `{field}`.")]
	MissingField {
		/// Attribute name as the directory spells it.
		field: &'static str,
		/// Object id of the record, empty when the id itself is missing.
		id: String,
	},
}

/// Maps one directory user into a [`CanonicalUser`].
pub fn normalize<U>(user: &U) -> Result<CanonicalUser, NormalizationError>
where
	U: ?Sized + DirectoryUser,
{
	let id = required(user.id(), "id", "")?;
	let display_name = required(user.display_name(), "displayName", id)?;
	let created_at = user
		.created_at()
		.ok_or_else(|| NormalizationError::MissingField { field: "createdDateTime", id: id.into() })?;
	let email = user.mail().unwrap_or_default();
	let mut identities = BTreeMap::new();

	assert_identity(&mut identities, id, IdentityKind::Pid);
	assert_identity(&mut identities, email, IdentityKind::Email);
	assert_identity(&mut identities, user.mobile_phone().unwrap_or_default(), IdentityKind::Phone);

	Ok(CanonicalUser {
		id: id.into(),
		display_name: display_name.into(),
		email: email.into(),
		picture: user.picture().map(Into::into),
		identities,
		attributes: AttrSet::default(),
		applications: BTreeMap::new(),
		metadata: Metadata { created_at, updated_at: created_at },
	})
}

/// Maps a canonical user back onto the directory wire shape (id, display name, mail).
pub fn to_directory_user(user: &CanonicalUser) -> GraphUser {
	GraphUser {
		id: Some(user.id.clone()),
		display_name: Some(user.display_name.clone()),
		mail: Some(user.email.clone()).filter(|mail| !mail.is_empty()),
		..Default::default()
	}
}

fn required<'a>(
	value: Option<&'a str>,
	field: &'static str,
	id: &str,
) -> Result<&'a str, NormalizationError> {
	value
		.filter(|value| !value.is_empty())
		.ok_or_else(|| NormalizationError::MissingField { field, id: id.into() })
}

fn assert_identity(
	identities: &mut BTreeMap<String, IdentitySource>,
	value: &str,
	kind: IdentityKind,
) {
	if value.is_empty() {
		return;
	}

	match identities.entry(value.to_owned()) {
		Entry::Vacant(entry) => {
			entry.insert(IdentitySource::new(kind));
		},
		Entry::Occupied(entry) => {
			tracing::debug!(
				kept = ?entry.get().kind,
				dropped = ?kind,
				"identity value already asserted by another kind"
			);
		},
	}
}

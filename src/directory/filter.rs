//! OData `$filter` construction for user lookups.

// self
use crate::error::DirectoryError;

/// Filter applied to a `/users` query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UserFilter {
	/// `id eq '{value}'`.
	IdEq(String),
	/// `mail eq '{value}'`.
	MailEq(String),
	/// `userPrincipalName eq '{value}'`.
	UserPrincipalNameEq(String),
	/// Caller-built expression, sent verbatim; the caller owns its escaping.
	Raw(String),
}
impl UserFilter {
	/// Renders the filter expression, escaping literal values.
	pub fn to_odata(&self) -> Result<String, DirectoryError> {
		match self {
			Self::IdEq(value) => eq("id", value),
			Self::MailEq(value) => eq("mail", value),
			Self::UserPrincipalNameEq(value) => eq("userPrincipalName", value),
			Self::Raw(expression) => Ok(expression.clone()),
		}
	}
}

fn eq(field: &'static str, value: &str) -> Result<String, DirectoryError> {
	Ok(format!("{field} eq {}", literal(field, value)?))
}

fn literal(field: &'static str, value: &str) -> Result<String, DirectoryError> {
	if value.trim().is_empty() {
		return Err(DirectoryError::InvalidFilterValue { field, reason: "value is empty" });
	}
	if value.chars().any(char::is_control) {
		return Err(DirectoryError::InvalidFilterValue {
			field,
			reason: "value contains control characters",
		});
	}

	// Single quotes are escaped by doubling.
	Ok(format!("'{}'", value.replace('\'', "''")))
}

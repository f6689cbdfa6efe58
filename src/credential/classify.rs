//! Classification of token-endpoint failures into the connector's auth taxonomy.
//!
//! Azure AD `AADSTS` codes embedded in the description win, then the structured OAuth `error`
//! field, then the HTTP status.

// self
use crate::_prelude::*;

/// OAuth 2.0 grants the connector performs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GrantType {
	/// App-only tokens from a client secret.
	ClientCredentials,
	/// Delegated tokens from a long-lived refresh token.
	RefreshToken,
}
impl GrantType {
	/// Returns the RFC 6749 identifier for the grant type.
	pub const fn as_str(self) -> &'static str {
		match self {
			GrantType::ClientCredentials => "client_credentials",
			GrantType::RefreshToken => "refresh_token",
		}
	}
}
impl Display for GrantType {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Canonical token failure categories.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenErrorKind {
	/// The grant (refresh token, consent) is no longer valid.
	InvalidGrant,
	/// Client authentication failed.
	InvalidClient,
	/// The application is not allowed the requested scope.
	InsufficientScope,
	/// Failure is temporary and may be retried.
	Transient,
}

/// Primitive data describing one failed token request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenErrorContext {
	/// Grant associated with the failing request.
	pub grant_type: GrantType,
	/// HTTP status code returned by the endpoint, when available.
	pub http_status: Option<u16>,
	/// OAuth `error` field.
	pub oauth_error: Option<String>,
	/// OAuth `error_description` field.
	pub error_description: Option<String>,
}
impl TokenErrorContext {
	/// Creates a new context scoped to the provided grant type.
	pub fn new(grant_type: GrantType) -> Self {
		Self { grant_type, http_status: None, oauth_error: None, error_description: None }
	}

	/// Adds an HTTP status code.
	pub fn with_http_status(mut self, status: u16) -> Self {
		self.http_status = Some(status);

		self
	}

	/// Adds the OAuth `error` code.
	pub fn with_oauth_error(mut self, error: impl Into<String>) -> Self {
		self.oauth_error = Some(error.into());

		self
	}

	/// Adds the OAuth `error_description` field.
	pub fn with_error_description(mut self, description: impl Into<String>) -> Self {
		self.error_description = Some(description.into());

		self
	}
}

/// Maps a failed token request onto a [`TokenErrorKind`].
pub fn classify_token_error(ctx: &TokenErrorContext) -> TokenErrorKind {
	if let Some(kind) = ctx.error_description.as_deref().and_then(classify_aadsts) {
		return kind;
	}
	if let Some(kind) = ctx.oauth_error.as_deref().and_then(classify_oauth_error) {
		return kind;
	}

	classify_status(ctx.http_status)
}

fn classify_oauth_error(value: &str) -> Option<TokenErrorKind> {
	if value.eq_ignore_ascii_case("invalid_grant")
		|| value.eq_ignore_ascii_case("interaction_required")
		|| value.eq_ignore_ascii_case("consent_required")
	{
		Some(TokenErrorKind::InvalidGrant)
	} else if value.eq_ignore_ascii_case("invalid_client")
		|| value.eq_ignore_ascii_case("unauthorized_client")
	{
		Some(TokenErrorKind::InvalidClient)
	} else if value.eq_ignore_ascii_case("invalid_scope") {
		Some(TokenErrorKind::InsufficientScope)
	} else if value.eq_ignore_ascii_case("temporarily_unavailable")
		|| value.eq_ignore_ascii_case("server_error")
	{
		Some(TokenErrorKind::Transient)
	} else {
		None
	}
}

// Descriptions look like `AADSTS7000215: Invalid client secret provided. ...`.
fn classify_aadsts(description: &str) -> Option<TokenErrorKind> {
	let rest = &description[description.find("AADSTS")? + "AADSTS".len()..];
	let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
	let code = rest[..digits].parse::<u32>().ok()?;

	match code {
		// Expired, revoked, or malformed refresh tokens and missing user consent.
		70000 | 70008 | 700082 | 700084 | 50173 | 65001 | 50076 => Some(TokenErrorKind::InvalidGrant),
		// Wrong or expired client secret, unknown application, unknown tenant.
		7000215 | 7000222 | 700016 | 90002 => Some(TokenErrorKind::InvalidClient),
		70011 => Some(TokenErrorKind::InsufficientScope),
		// Throttling and service-side faults.
		50196 | 90033 => Some(TokenErrorKind::Transient),
		_ => None,
	}
}

fn classify_status(status: Option<u16>) -> TokenErrorKind {
	match status {
		Some(400) => TokenErrorKind::InvalidGrant,
		Some(401) => TokenErrorKind::InvalidClient,
		Some(403) => TokenErrorKind::InsufficientScope,
		_ => TokenErrorKind::Transient,
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn aadsts_codes_take_precedence() {
		let ctx = TokenErrorContext::new(GrantType::ClientCredentials)
			.with_http_status(400)
			.with_oauth_error("invalid_request")
			.with_error_description("AADSTS7000215: Invalid client secret provided.");

		assert_eq!(classify_token_error(&ctx), TokenErrorKind::InvalidClient);

		let ctx = TokenErrorContext::new(GrantType::RefreshToken)
			.with_oauth_error("invalid_grant")
			.with_error_description("AADSTS700082: The refresh token has expired due to inactivity.");

		assert_eq!(classify_token_error(&ctx), TokenErrorKind::InvalidGrant);
	}

	#[test]
	fn oauth_error_used_when_code_is_unknown() {
		let ctx = TokenErrorContext::new(GrantType::RefreshToken)
			.with_http_status(400)
			.with_oauth_error("invalid_scope")
			.with_error_description("AADSTS1: something new");

		assert_eq!(classify_token_error(&ctx), TokenErrorKind::InsufficientScope);
	}

	#[test]
	fn status_is_the_last_resort() {
		let ctx = TokenErrorContext::new(GrantType::ClientCredentials).with_http_status(401);

		assert_eq!(classify_token_error(&ctx), TokenErrorKind::InvalidClient);

		let ctx = TokenErrorContext::new(GrantType::ClientCredentials).with_http_status(503);

		assert_eq!(classify_token_error(&ctx), TokenErrorKind::Transient);
		assert_eq!(
			classify_token_error(&TokenErrorContext::new(GrantType::RefreshToken)),
			TokenErrorKind::Transient
		);
	}
}

//! Credential providers that mint bearer tokens for Microsoft Graph.
//!
//! Both the client-secret and the refresh-token flows implement [`TokenCredential`], so the
//! directory client only ever asks for "a token" and never learns which grant produced it.

pub mod classify;
pub mod client_secret;
pub mod refresh;
pub mod secret;

pub use client_secret::ClientSecretCredential;
pub use refresh::RefreshTokenCredential;
pub use secret::TokenSecret;

// self
use crate::_prelude::*;

/// Boxed future returned by [`TokenCredential`] implementations.
pub type CredentialFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

/// Source of bearer tokens for directory calls.
pub trait TokenCredential
where
	Self: Send + Sync,
{
	/// Returns a bearer token that is valid at the time of the call.
	///
	/// Fails with [`AuthError`](crate::error::AuthError) when the token endpoint is unreachable,
	/// rejects the request, or answers with something other than a token envelope.
	fn acquire_token(&self) -> CredentialFuture<'_, AccessToken>;
}

/// Bearer token plus the instant it stops being accepted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccessToken {
	/// Bearer token value; callers must avoid logging it.
	pub token: TokenSecret,
	/// Expiry instant computed as `now + expires_in` when the token was issued.
	pub expires_at: OffsetDateTime,
}
impl AccessToken {
	/// Wraps a token value and its expiry.
	pub fn new(token: impl Into<String>, expires_at: OffsetDateTime) -> Self {
		Self { token: TokenSecret::new(token), expires_at }
	}

	/// Returns `true` when the token expires within `window` of `now` (or already has).
	pub fn expires_within(&self, window: Duration, now: OffsetDateTime) -> bool {
		self.expires_at - now <= window
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	#[test]
	fn expiry_window_is_inclusive() {
		let now = macros::datetime!(2025-01-01 00:00 UTC);
		let token = AccessToken::new("access", macros::datetime!(2025-01-01 00:05 UTC));

		assert!(token.expires_within(Duration::minutes(5), now));
		assert!(!token.expires_within(Duration::minutes(4), now));
		assert!(token.expires_within(Duration::ZERO, macros::datetime!(2025-01-01 00:06 UTC)));
	}

	#[test]
	fn debug_output_redacts_the_token() {
		let token = AccessToken::new("super-secret", macros::datetime!(2025-01-01 00:05 UTC));

		assert!(!format!("{token:?}").contains("super-secret"));
	}
}

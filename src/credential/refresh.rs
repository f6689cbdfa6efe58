//! Refresh-token flow against the tenant's v2.0 token endpoint.
//!
//! Every [`TokenCredential::acquire_token`] call performs a fresh `grant_type=refresh_token`
//! exchange. Rotated refresh tokens returned by the endpoint are not persisted; once the
//! configured token is invalidated upstream, calls fail with
//! [`AuthError::InvalidGrant`](crate::error::AuthError::InvalidGrant).

// self
use crate::{
	_prelude::*,
	credential::{AccessToken, CredentialFuture, TokenCredential, TokenSecret},
	http::{ReqwestHttpClient, TokenHttpClient},
	oauth::{ReqwestTransportErrorMapper, TokenFacade, TransportErrorMapper},
	obs::{self, Stage, StageOutcome, StageSpan},
};

/// Refresh-token credential for delegated directory access.
pub struct RefreshTokenCredential<C = ReqwestHttpClient, M = ReqwestTransportErrorMapper>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	facade: TokenFacade<C, M>,
	refresh_token: TokenSecret,
}
impl<C, M> RefreshTokenCredential<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a credential that redeems `refresh_token` at `token_url`.
	///
	/// Pass `client_secret: None` for public-client registrations, in which case only
	/// `client_id` identifies the application.
	pub fn new(
		token_url: &Url,
		client_id: &str,
		client_secret: Option<&TokenSecret>,
		refresh_token: TokenSecret,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Result<Self> {
		let facade = TokenFacade::new(token_url, client_id, client_secret, http_client, mapper)?;

		Ok(Self { facade, refresh_token })
	}

	async fn redeem(&self) -> Result<AccessToken> {
		let (token, rotated) = self.facade.refresh_token(&self.refresh_token).await?;

		if rotated.as_ref().is_some_and(|secret| secret != &self.refresh_token) {
			tracing::debug!("token endpoint rotated the refresh token; keeping the configured one");
		}

		tracing::debug!(expires_at = %token.expires_at, "redeemed refresh token");

		Ok(token)
	}
}
impl<C, M> TokenCredential for RefreshTokenCredential<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn acquire_token(&self) -> CredentialFuture<'_, AccessToken> {
		const STAGE: Stage = Stage::RefreshToken;

		Box::pin(async move {
			let span = StageSpan::new(STAGE, "acquire_token");

			obs::record_stage_outcome(STAGE, StageOutcome::Attempt);

			let result = span.instrument(self.redeem()).await;

			obs::record_result(STAGE, &result);

			result
		})
	}
}
impl<C, M> Debug for RefreshTokenCredential<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RefreshTokenCredential")
			.field("refresh_token", &self.refresh_token)
			.finish_non_exhaustive()
	}
}

//! Client-credentials flow with an in-process token cache.
//!
//! Tokens are reused until they come within [`ClientSecretCredential::DEFAULT_RENEWAL_WINDOW`]
//! of expiry. The cache sits behind an async mutex, so concurrent callers wait for the single
//! in-flight exchange instead of hitting the token endpoint again.

// self
use crate::{
	_prelude::*,
	credential::{AccessToken, CredentialFuture, TokenCredential, TokenSecret},
	http::{ReqwestHttpClient, TokenHttpClient},
	oauth::{ReqwestTransportErrorMapper, TokenFacade, TransportErrorMapper},
	obs::{self, Stage, StageOutcome, StageSpan},
};

/// Secret-based credential: exchanges tenant + client id + client secret for app-only tokens.
pub struct ClientSecretCredential<C = ReqwestHttpClient, M = ReqwestTransportErrorMapper>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	facade: TokenFacade<C, M>,
	scope: String,
	renewal_window: Duration,
	cached: AsyncMutex<Option<AccessToken>>,
}
impl<C, M> ClientSecretCredential<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Renew cached tokens this long before they expire.
	pub const DEFAULT_RENEWAL_WINDOW: Duration = Duration::minutes(5);

	/// Creates a credential for the tenant token endpoint `token_url`, requesting `scope`
	/// (typically `https://graph.microsoft.com/.default`).
	pub fn new(
		token_url: &Url,
		client_id: &str,
		client_secret: &TokenSecret,
		scope: impl Into<String>,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Result<Self> {
		let facade = TokenFacade::new(token_url, client_id, Some(client_secret), http_client, mapper)?;

		Ok(Self {
			facade,
			scope: scope.into(),
			renewal_window: Self::DEFAULT_RENEWAL_WINDOW,
			cached: AsyncMutex::new(None),
		})
	}

	/// Overrides the renewal window; negative values are clamped to zero.
	pub fn with_renewal_window(mut self, window: Duration) -> Self {
		self.renewal_window = if window.is_negative() { Duration::ZERO } else { window };

		self
	}

	/// Drops the cached token so the next call performs a fresh exchange.
	pub async fn invalidate(&self) {
		*self.cached.lock().await = None;
	}

	async fn cached_or_exchange(&self) -> Result<AccessToken> {
		let mut cached = self.cached.lock().await;
		let now = OffsetDateTime::now_utc();

		if let Some(token) =
			cached.as_ref().filter(|token| !token.expires_within(self.renewal_window, now))
		{
			tracing::trace!(expires_at = %token.expires_at, "reusing cached access token");

			return Ok(token.clone());
		}

		let token = self.facade.client_credentials(&self.scope).await?;

		tracing::debug!(expires_at = %token.expires_at, "acquired access token");

		*cached = Some(token.clone());

		Ok(token)
	}
}
impl<C, M> TokenCredential for ClientSecretCredential<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn acquire_token(&self) -> CredentialFuture<'_, AccessToken> {
		const STAGE: Stage = Stage::ClientCredentials;

		Box::pin(async move {
			let span = StageSpan::new(STAGE, "acquire_token");

			obs::record_stage_outcome(STAGE, StageOutcome::Attempt);

			let result = span.instrument(self.cached_or_exchange()).await;

			obs::record_result(STAGE, &result);

			result
		})
	}
}
impl<C, M> Debug for ClientSecretCredential<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ClientSecretCredential")
			.field("scope", &self.scope)
			.field("renewal_window", &self.renewal_window)
			.finish_non_exhaustive()
	}
}

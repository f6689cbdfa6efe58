//! Internal OAuth client facade over the Azure AD v2.0 token endpoint.

pub use oauth2;

// crates.io
use oauth2::{
	AuthType, ClientId, ClientSecret, EndpointNotSet, EndpointSet, HttpClientError, RefreshToken,
	RequestTokenError, Scope, TokenResponse, TokenUrl,
	basic::{BasicClient, BasicErrorResponse, BasicRequestTokenError},
};
// self
use crate::{
	_prelude::*,
	credential::{
		AccessToken, TokenSecret,
		classify::{self, GrantType, TokenErrorContext, TokenErrorKind},
	},
	error::{AuthError, ConfigError, TransportError},
	http::{ReqwestHttpClient, ResponseMetadata, ResponseMetadataSlot, TokenHttpClient},
};

type ConfiguredBasicClient =
	BasicClient<EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;
type FacadeTokenResponse = oauth2::basic::BasicTokenResponse;

/// Maps HTTP transport failures into connector [`Error`] values.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an [`HttpClientError`] emitted by the transport into a connector error.
	fn map_transport_error(
		&self,
		grant: GrantType,
		metadata: Option<&ResponseMetadata>,
		error: HttpClientError<E>,
	) -> Error;
}

/// Default mapper for reqwest-backed transports.
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(
		&self,
		grant: GrantType,
		meta: Option<&ResponseMetadata>,
		err: HttpClientError<ReqwestError>,
	) -> Error {
		match err {
			HttpClientError::Reqwest(inner) => map_reqwest_error(grant, meta, *inner),
			HttpClientError::Http(inner) => ConfigError::from(inner).into(),
			HttpClientError::Io(inner) => AuthError::Transport(TransportError::Io(inner)).into(),
			HttpClientError::Other(message) => map_generic_transport_error(meta, message),
			_ => map_unknown_transport_error(meta),
		}
	}
}

/// Token-endpoint client bound to one tenant + application registration.
pub(crate) struct TokenFacade<C = ReqwestHttpClient, M = ReqwestTransportErrorMapper>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	oauth_client: ConfiguredBasicClient,
	http_client: Arc<C>,
	error_mapper: Arc<M>,
}
impl<C, M> TokenFacade<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Builds a facade that authenticates with `client_secret` in the request body when one is
	/// supplied, and as a public client otherwise.
	pub(crate) fn new(
		token_url: &Url,
		client_id: &str,
		client_secret: Option<&TokenSecret>,
		http_client: impl Into<Arc<C>>,
		error_mapper: impl Into<Arc<M>>,
	) -> Result<Self> {
		let token_url = TokenUrl::new(token_url.to_string())
			.map_err(|source| ConfigError::InvalidEndpoint { endpoint: "token", source })?;
		let mut oauth_client = BasicClient::new(ClientId::new(client_id.to_owned()))
			.set_token_uri(token_url)
			.set_auth_type(AuthType::RequestBody);

		if let Some(secret) = client_secret {
			oauth_client = oauth_client.set_client_secret(ClientSecret::new(secret.expose().into()));
		}

		Ok(Self {
			oauth_client,
			http_client: http_client.into(),
			error_mapper: error_mapper.into(),
		})
	}

	/// Performs `grant_type=client_credentials` for the provided scope.
	pub(crate) async fn client_credentials(&self, scope: &str) -> Result<AccessToken> {
		let meta = ResponseMetadataSlot::default();
		let instrumented = self.http_client.with_metadata(meta.clone());
		let response = self
			.oauth_client
			.exchange_client_credentials()
			.add_scope(Scope::new(scope.to_owned()))
			.request_async(&instrumented)
			.await
			.map_err(|err| {
				map_request_error(
					GrantType::ClientCredentials,
					meta.take(),
					err,
					self.error_mapper.as_ref(),
				)
			})?;

		map_token_response(&response)
	}

	/// Performs `grant_type=refresh_token` and returns the access token plus any rotated
	/// refresh token the endpoint issued.
	pub(crate) async fn refresh_token(
		&self,
		refresh_token: &TokenSecret,
	) -> Result<(AccessToken, Option<TokenSecret>)> {
		let meta = ResponseMetadataSlot::default();
		let instrumented = self.http_client.with_metadata(meta.clone());
		let refresh_secret = RefreshToken::new(refresh_token.expose().to_owned());
		let response = self
			.oauth_client
			.exchange_refresh_token(&refresh_secret)
			.request_async(&instrumented)
			.await
			.map_err(|err| {
				map_request_error(
					GrantType::RefreshToken,
					meta.take(),
					err,
					self.error_mapper.as_ref(),
				)
			})?;
		let token = map_token_response(&response)?;
		let rotated = response.refresh_token().map(|secret| TokenSecret::new(secret.secret()));

		Ok((token, rotated))
	}
}

fn map_token_response(response: &FacadeTokenResponse) -> Result<AccessToken> {
	let expires_in = response.expires_in().ok_or(AuthError::MissingExpiresIn)?.as_secs();
	let expires_in = i64::try_from(expires_in).map_err(|_| AuthError::ExpiresInOutOfRange)?;

	if expires_in <= 0 {
		return Err(AuthError::NonPositiveExpiresIn.into());
	}

	let expires_at = OffsetDateTime::now_utc()
		.checked_add(Duration::seconds(expires_in))
		.ok_or(AuthError::ExpiresInOutOfRange)?;

	Ok(AccessToken::new(response.access_token().secret().as_str(), expires_at))
}

fn map_request_error<E, M>(
	grant: GrantType,
	meta: Option<ResponseMetadata>,
	err: BasicRequestTokenError<HttpClientError<E>>,
	mapper: &M,
) -> Error
where
	E: 'static + Send + Sync + StdError,
	M: ?Sized + TransportErrorMapper<E>,
{
	let meta_ref = meta.as_ref();

	match err {
		RequestTokenError::ServerResponse(response) =>
			map_server_response_error(grant, response, meta_ref),
		RequestTokenError::Request(error) => mapper.map_transport_error(grant, meta_ref, error),
		RequestTokenError::Parse(error, _body) =>
			AuthError::TokenResponseParse { source: error, status: meta_status(meta_ref) }.into(),
		RequestTokenError::Other(message) => AuthError::TokenEndpoint {
			message,
			status: meta_status(meta_ref),
			retry_after: meta_retry_after(meta_ref),
		}
		.into(),
	}
}

fn map_server_response_error(
	grant: GrantType,
	response: BasicErrorResponse,
	meta: Option<&ResponseMetadata>,
) -> Error {
	let mut ctx = TokenErrorContext::new(grant).with_oauth_error(response.error().as_ref());

	if let Some(description) = response.error_description() {
		ctx = ctx.with_error_description(description.as_str());
	}
	if let Some(status) = meta_status(meta) {
		ctx = ctx.with_http_status(status);
	}

	let message = match response.error_description() {
		Some(description) => format!("{}: {}", response.error().as_ref(), first_line(description)),
		None => response.error().as_ref().to_owned(),
	};

	match classify::classify_token_error(&ctx) {
		TokenErrorKind::InvalidGrant => AuthError::InvalidGrant { reason: message },
		TokenErrorKind::InvalidClient => AuthError::InvalidClient { reason: message },
		TokenErrorKind::InsufficientScope => AuthError::InsufficientScope { reason: message },
		TokenErrorKind::Transient => AuthError::TokenEndpoint {
			message,
			status: meta_status(meta),
			retry_after: meta_retry_after(meta),
		},
	}
	.into()
}

fn map_reqwest_error(grant: GrantType, meta: Option<&ResponseMetadata>, err: ReqwestError) -> Error {
	if err.is_builder() {
		return ConfigError::from(err).into();
	}
	if err.is_timeout() {
		return AuthError::TokenEndpoint {
			message: format!("request timed out during the {grant} grant"),
			status: meta_status(meta).or_else(|| err.status().map(|code| code.as_u16())),
			retry_after: meta_retry_after(meta),
		}
		.into();
	}

	AuthError::Transport(TransportError::network("token", err)).into()
}

fn map_generic_transport_error(meta: Option<&ResponseMetadata>, message: impl Display) -> Error {
	AuthError::TokenEndpoint {
		message: format!("HTTP client error: {message}"),
		status: meta_status(meta),
		retry_after: meta_retry_after(meta),
	}
	.into()
}

fn map_unknown_transport_error(meta: Option<&ResponseMetadata>) -> Error {
	AuthError::TokenEndpoint {
		message: "unknown HTTP client error".into(),
		status: meta_status(meta),
		retry_after: meta_retry_after(meta),
	}
	.into()
}

// Azure AD descriptions append trace and correlation ids on later lines.
fn first_line(description: &str) -> &str {
	description.lines().next().unwrap_or(description).trim()
}

fn meta_status(meta: Option<&ResponseMetadata>) -> Option<u16> {
	meta.and_then(|value| value.status)
}

fn meta_retry_after(meta: Option<&ResponseMetadata>) -> Option<Duration> {
	meta.and_then(|value| value.retry_after)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn builds_confidential_and_public_facades() {
		let token_url = Url::parse("https://login.microsoftonline.com/contoso/oauth2/v2.0/token")
			.expect("Failed to parse token endpoint URL.");
		let secret = TokenSecret::new("secret");
		let confidential = <TokenFacade<ReqwestHttpClient, ReqwestTransportErrorMapper>>::new(
			&token_url,
			"client-id",
			Some(&secret),
			Arc::new(crate::_preludet::test_reqwest_http_client()),
			Arc::new(ReqwestTransportErrorMapper),
		);
		let public = <TokenFacade<ReqwestHttpClient, ReqwestTransportErrorMapper>>::new(
			&token_url,
			"client-id",
			None,
			Arc::new(crate::_preludet::test_reqwest_http_client()),
			Arc::new(ReqwestTransportErrorMapper),
		);

		assert!(confidential.is_ok());
		assert!(public.is_ok());
	}

	#[test]
	fn first_line_strips_trace_suffixes() {
		let description = "AADSTS70000: The grant is expired.\r\nTrace ID: abc\r\nCorrelation ID: def";

		assert_eq!(first_line(description), "AADSTS70000: The grant is expired.");
	}
}

//! Connector-level error types shared across credentials, directory queries, and the session.

// self
use crate::{_prelude::*, transform::NormalizationError};

/// Connector-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical connector error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Invalid, missing, or conflicting configuration.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Credential acquisition failed.
	#[error(transparent)]
	Auth(#[from] AuthError),
	/// Querying the directory failed.
	#[error(transparent)]
	Directory(#[from] DirectoryError),
	/// A point lookup yielded zero users.
	#[error(transparent)]
	NotFound(#[from] NotFoundError),
	/// A remote record is missing required fields.
	#[error(transparent)]
	Normalization(#[from] NormalizationError),

	/// Iteration finished; the host should stop calling `read`.
	#[error("No more users are available in this session.")]
	EndOfData,
}
impl Error {
	/// Returns `true` for the [`Error::EndOfData`] sentinel.
	pub fn is_end_of_data(&self) -> bool {
		matches!(self, Self::EndOfData)
	}

	/// Returns `true` when repeating the same call may succeed without changing any input.
	pub fn is_retryable(&self) -> bool {
		match self {
			Self::Auth(err) => err.is_retryable(),
			Self::Directory(err) => err.is_retryable(),
			Self::Config(ConfigError::Probe { source }) => source.is_retryable(),
			_ => false,
		}
	}
}

/// Configuration and validation failures; the caller must fix the input.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// The `tenant` field is empty.
	#[error("no tenant was provided")]
	MissingTenant,
	/// The `client-id` field is empty.
	#[error("no client id was provided")]
	MissingClientId,
	/// The `client-secret` field is empty.
	#[error("no client secret was provided")]
	MissingClientSecret,
	/// Both point-lookup selectors were supplied.
	#[error("user-pid and user-email were both provided; please specify only one")]
	ConflictingTarget,
	/// Host payload does not have the expected configuration shape.
	#[error("Configuration payload is malformed at `{path}`.")]
	InvalidShape {
		/// JSON path of the offending field.
		path: String,
		/// Underlying decoding failure.
		#[source]
		source: serde_json::Error,
	},
	/// The connectivity probe issued while validating the configuration failed.
	#[error("failed to retrieve users from AzureAD: {source}")]
	Probe {
		/// Failure observed by the probe.
		#[source]
		source: Box<Error>,
	},
	/// `read` was called without an open session.
	#[error("Connector session is not open.")]
	SessionNotOpen,

	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// An endpoint URL cannot be parsed.
	#[error("The {endpoint} endpoint is not a valid URL.")]
	InvalidEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Endpoints must use HTTPS outside loopback hosts.
	#[error("The {endpoint} endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// Endpoint URL cannot carry path segments.
	#[error("The {endpoint} endpoint cannot be used as a base URL.")]
	CannotBeABase {
		/// Which endpoint failed validation.
		endpoint: &'static str,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}

	/// Wraps a failed connectivity probe.
	pub fn probe(source: Error) -> Self {
		Self::Probe { source: Box::new(source) }
	}
}
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Credential acquisition failures raised while talking to the token endpoint.
#[derive(Debug, ThisError)]
pub enum AuthError {
	/// Token endpoint rejected the grant (bad or expired refresh token, consent missing).
	#[error("Token endpoint rejected the grant: {reason}.")]
	InvalidGrant {
		/// Provider-supplied reason string.
		reason: String,
	},
	/// Client authentication failed or credentials are malformed.
	#[error("Client authentication failed: {reason}.")]
	InvalidClient {
		/// Provider-supplied reason string.
		reason: String,
	},
	/// Requested scope is not granted to the application.
	#[error("Token lacks the required scopes: {reason}.")]
	InsufficientScope {
		/// Provider-supplied reason string.
		reason: String,
	},
	/// Token endpoint returned an unexpected but non-fatal response; retry with backoff.
	#[error("Token endpoint returned an unexpected response: {message}.")]
	TokenEndpoint {
		/// Message summarizing the failure.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
	/// Token endpoint responded with a body that is not a token envelope.
	#[error("Token endpoint returned a malformed token envelope.")]
	TokenResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::error::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Token envelope omitted `expires_in`.
	#[error("Token endpoint response is missing expires_in.")]
	MissingExpiresIn,
	/// Token endpoint returned an excessively large `expires_in`.
	#[error("The expires_in value exceeds the supported range.")]
	ExpiresInOutOfRange,
	/// Token endpoint returned a non-positive duration.
	#[error("The expires_in value must be positive.")]
	NonPositiveExpiresIn,
	/// The token endpoint could not be reached.
	#[error(transparent)]
	Transport(#[from] TransportError),
}
impl AuthError {
	/// Returns `true` for failures that may clear up on their own.
	pub fn is_retryable(&self) -> bool {
		matches!(self, Self::TokenEndpoint { .. } | Self::Transport(_))
	}
}

/// Failures raised while querying the remote user collection.
#[derive(Debug, ThisError)]
pub enum DirectoryError {
	/// Directory answered with a non-success status.
	#[error("Directory returned HTTP {status} ({code}): {message}.")]
	Api {
		/// HTTP status code.
		status: u16,
		/// OData error code, or the canonical status reason when the body is not OData.
		code: String,
		/// OData error message, or a preview of the response body.
		message: String,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
	/// Directory answered with a body that is not a user collection.
	#[error("Directory returned a malformed user collection.")]
	ResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::error::Error>,
		/// HTTP status code of the response.
		status: u16,
	},
	/// A filter value cannot be safely embedded in an OData literal.
	#[error("Filter value for `{field}` is invalid: {reason}.")]
	InvalidFilterValue {
		/// Attribute the value was meant to match.
		field: &'static str,
		/// Why the value was rejected.
		reason: &'static str,
	},
	/// Directory returned a continuation link that is not a URL.
	#[error("Directory returned an invalid continuation link.")]
	InvalidNextLink {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Continuation link points outside the Graph origin the query started on.
	#[error("Directory returned a continuation link on a foreign origin: {url}.")]
	ForeignNextLink {
		/// Offending link.
		url: String,
	},
	/// The directory could not be reached.
	#[error(transparent)]
	Transport(#[from] TransportError),
}
impl DirectoryError {
	/// Returns `true` for throttling, server-side, and network failures.
	pub fn is_retryable(&self) -> bool {
		match self {
			Self::Api { status, .. } => *status == 429 || *status >= 500,
			Self::Transport(_) => true,
			_ => false,
		}
	}
}

/// Point lookup yielded zero users; an expected outcome rather than a fault.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum NotFoundError {
	/// No user carries the requested object identifier.
	#[error("failed to get user by pid {id}")]
	Pid {
		/// Identifier that was looked up.
		id: String,
	},
	/// No user carries the requested mail or principal name.
	#[error("failed to get user by email {email}")]
	Email {
		/// Address that was looked up.
		email: String,
	},
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the {endpoint} endpoint.")]
	Network {
		/// Which endpoint was being called.
		endpoint: &'static str,
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling a remote endpoint.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error raised against `endpoint`.
	pub fn network(
		endpoint: &'static str,
		src: impl 'static + Send + Sync + std::error::Error,
	) -> Self {
		Self::Network { endpoint, source: Box::new(src) }
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn config_messages_match_host_expectations() {
		assert_eq!(Error::from(ConfigError::MissingClientId).to_string(), "no client id was provided");
		assert_eq!(
			Error::from(ConfigError::ConflictingTarget).to_string(),
			"user-pid and user-email were both provided; please specify only one"
		);
	}

	#[test]
	fn not_found_messages_carry_the_lookup_value() {
		let err = Error::from(NotFoundError::Pid { id: "abc-123".into() });

		assert_eq!(err.to_string(), "failed to get user by pid abc-123");
		assert!(!err.is_retryable());
		assert!(!err.is_end_of_data());
	}

	#[test]
	fn retry_taxonomy_follows_status_classes() {
		let throttled = DirectoryError::Api {
			status: 429,
			code: "TooManyRequests".into(),
			message: "slow down".into(),
			retry_after: Some(Duration::seconds(3)),
		};
		let forbidden = DirectoryError::Api {
			status: 403,
			code: "Authorization_RequestDenied".into(),
			message: "denied".into(),
			retry_after: None,
		};

		assert!(Error::from(throttled).is_retryable());
		assert!(!Error::from(forbidden).is_retryable());
		assert!(Error::EndOfData.is_end_of_data());
		assert!(!Error::from(AuthError::InvalidClient { reason: "bad".into() }).is_retryable());
	}
}

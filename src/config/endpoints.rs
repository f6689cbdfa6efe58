// self
use crate::{_prelude::*, error::ConfigError};

/// Public-cloud login authority.
pub const DEFAULT_AUTHORITY: &str = "https://login.microsoftonline.com";
/// Public-cloud Microsoft Graph v1.0 root.
pub const DEFAULT_GRAPH: &str = "https://graph.microsoft.com/v1.0";

/// Validated endpoint roots for one cloud.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoints {
	/// Login authority; tenant token endpoints live under it.
	pub authority: Url,
	/// Graph API root, including the version segment.
	pub graph: Url,
}
impl Endpoints {
	/// Creates a new builder seeded with the public-cloud defaults.
	pub fn builder() -> EndpointsBuilder {
		EndpointsBuilder::default()
	}

	/// Returns `{authority}/{tenant}/oauth2/v2.0/token`.
	pub fn token_url(&self, tenant: &str) -> Result<Url, ConfigError> {
		join_segments(&self.authority, "authority", &[tenant, "oauth2", "v2.0", "token"])
	}

	/// Returns `{graph}/users`.
	pub fn users_url(&self) -> Result<Url, ConfigError> {
		join_segments(&self.graph, "graph", &["users"])
	}

	/// Returns the `.default` scope for the Graph origin (for example
	/// `https://graph.microsoft.com/.default`).
	pub fn default_scope(&self) -> String {
		format!("{}/.default", self.graph.origin().ascii_serialization())
	}

	fn validate(&self) -> Result<(), ConfigError> {
		validate_endpoint("authority", &self.authority)?;
		validate_endpoint("graph", &self.graph)?;

		Ok(())
	}
}

/// Builder for [`Endpoints`] values.
#[derive(Debug, Default)]
pub struct EndpointsBuilder {
	/// Login authority override.
	pub authority: Option<Url>,
	/// Graph root override.
	pub graph: Option<Url>,
}
impl EndpointsBuilder {
	/// Overrides the login authority (sovereign clouds, mock servers).
	pub fn authority(mut self, url: Url) -> Self {
		self.authority = Some(url);

		self
	}

	/// Overrides the Graph API root.
	pub fn graph(mut self, url: Url) -> Self {
		self.graph = Some(url);

		self
	}

	/// Consumes the builder and validates the resulting endpoints.
	pub fn build(self) -> Result<Endpoints, ConfigError> {
		let authority = match self.authority {
			Some(url) => url,
			None => parse_endpoint("authority", DEFAULT_AUTHORITY)?,
		};
		let graph = match self.graph {
			Some(url) => url,
			None => parse_endpoint("graph", DEFAULT_GRAPH)?,
		};
		let endpoints = Endpoints { authority, graph };

		endpoints.validate()?;

		Ok(endpoints)
	}
}

fn parse_endpoint(endpoint: &'static str, raw: &str) -> Result<Url, ConfigError> {
	Url::parse(raw).map_err(|source| ConfigError::InvalidEndpoint { endpoint, source })
}

fn validate_endpoint(endpoint: &'static str, url: &Url) -> Result<(), ConfigError> {
	if url.cannot_be_a_base() {
		return Err(ConfigError::CannotBeABase { endpoint });
	}
	if url.scheme() == "https" || (url.scheme() == "http" && is_loopback(url)) {
		Ok(())
	} else {
		Err(ConfigError::InsecureEndpoint { endpoint, url: url.to_string() })
	}
}

fn is_loopback(url: &Url) -> bool {
	match url.host() {
		Some(url::Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
		Some(url::Host::Ipv4(ip)) => ip.is_loopback(),
		Some(url::Host::Ipv6(ip)) => ip.is_loopback(),
		None => false,
	}
}

fn join_segments(base: &Url, endpoint: &'static str, segments: &[&str]) -> Result<Url, ConfigError> {
	let mut url = base.clone();

	url.path_segments_mut()
		.map_err(|_| ConfigError::CannotBeABase { endpoint })?
		.pop_if_empty()
		.extend(segments);

	Ok(url)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn defaults_target_the_public_cloud() {
		let endpoints = Endpoints::builder().build().expect("Defaults should validate.");

		assert_eq!(
			endpoints.token_url("contoso.onmicrosoft.com").expect("Token URL should build.").as_str(),
			"https://login.microsoftonline.com/contoso.onmicrosoft.com/oauth2/v2.0/token"
		);
		assert_eq!(
			endpoints.users_url().expect("Users URL should build.").as_str(),
			"https://graph.microsoft.com/v1.0/users"
		);
		assert_eq!(endpoints.default_scope(), "https://graph.microsoft.com/.default");
	}

	#[test]
	fn tenant_is_percent_encoded_as_one_segment() {
		let endpoints = Endpoints::builder().build().expect("Defaults should validate.");
		let url = endpoints.token_url("a/b").expect("Token URL should build.");

		assert_eq!(url.path(), "/a%2Fb/oauth2/v2.0/token");
	}

	#[test]
	fn trailing_slashes_do_not_double_up() {
		let endpoints = Endpoints::builder()
			.graph(Url::parse("https://graph.microsoft.us/v1.0/").expect("URL should parse."))
			.build()
			.expect("Override should validate.");

		assert_eq!(
			endpoints.users_url().expect("Users URL should build.").as_str(),
			"https://graph.microsoft.us/v1.0/users"
		);
		assert_eq!(endpoints.default_scope(), "https://graph.microsoft.us/.default");
	}

	#[test]
	fn plain_http_is_only_allowed_on_loopback() {
		let remote = Endpoints::builder()
			.authority(Url::parse("http://login.example.com").expect("URL should parse."))
			.build();

		assert!(matches!(
			remote,
			Err(ConfigError::InsecureEndpoint { endpoint: "authority", .. })
		));

		let local = Endpoints::builder()
			.authority(Url::parse("http://127.0.0.1:8080").expect("URL should parse."))
			.graph(Url::parse("http://localhost:8080/v1.0").expect("URL should parse."))
			.build();

		assert!(local.is_ok());

		let opaque = Endpoints::builder()
			.graph(Url::parse("mailto:graph@example.com").expect("URL should parse."))
			.build();

		assert!(matches!(opaque, Err(ConfigError::CannotBeABase { endpoint: "graph" })));
	}
}

//! Host-facing lifecycle contract for identity-provider plugins.
//!
//! Hosts drive a plugin through `validate → open → read* → close`. `read` is called until it
//! fails with [`Error::EndOfData`]; `write` and `delete` are part of the contract even for
//! read-only directories.

// self
use crate::{
	_prelude::*,
	config::{ConfigSchema, ConnectorConfig},
	connector::SessionStats,
	transform::CanonicalUser,
};

/// Boxed future returned by [`IdentityPlugin`] operations that touch the network.
pub type PluginFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

/// What the host intends to do with an open session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
	/// Pull users from the directory.
	#[default]
	Read,
	/// Push users into the directory.
	Write,
	/// Remove users from the directory.
	Delete,
}
impl OperationKind {
	/// Returns a stable label suitable for log fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OperationKind::Read => "read",
			OperationKind::Write => "write",
			OperationKind::Delete => "delete",
		}
	}
}
impl Display for OperationKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Build metadata reported to the host.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildInfo {
	/// Semantic version.
	pub version: String,
	/// Build date, empty when not stamped.
	pub date: String,
	/// Source commit, empty when not stamped.
	pub commit: String,
}
impl BuildInfo {
	/// Creates build metadata from explicit values.
	pub fn new(
		version: impl Into<String>,
		date: impl Into<String>,
		commit: impl Into<String>,
	) -> Self {
		Self { version: version.into(), date: date.into(), commit: commit.into() }
	}

	/// Metadata of this build.
	///
	/// Date and commit come from the `AZUREAD_CONNECTOR_BUILD_DATE` and
	/// `AZUREAD_CONNECTOR_BUILD_COMMIT` variables at compile time.
	pub fn current() -> Self {
		Self::new(
			env!("CARGO_PKG_VERSION"),
			option_env!("AZUREAD_CONNECTOR_BUILD_DATE").unwrap_or_default(),
			option_env!("AZUREAD_CONNECTOR_BUILD_COMMIT").unwrap_or_default(),
		)
	}

	/// Returns `(version, date, commit)`.
	pub fn as_tuple(&self) -> (&str, &str, &str) {
		(&self.version, &self.date, &self.commit)
	}
}
impl Default for BuildInfo {
	fn default() -> Self {
		Self::current()
	}
}

/// Lifecycle contract between an identity-sync host and a directory connector.
pub trait IdentityPlugin
where
	Self: Send,
{
	/// Describes the configuration the plugin accepts.
	fn config_schema(&self) -> ConfigSchema;

	/// Reports build metadata.
	fn version(&self) -> BuildInfo;

	/// Checks a configuration, including a live connectivity probe.
	fn validate(&mut self, config: ConnectorConfig) -> PluginFuture<'_, ()>;

	/// Starts a session for `operation`.
	fn open(&mut self, config: ConnectorConfig, operation: OperationKind) -> Result<()>;

	/// Returns the next batch of users, or [`Error::EndOfData`] once the session is exhausted.
	fn read(&mut self) -> PluginFuture<'_, Vec<CanonicalUser>>;

	/// Writes one user back to the directory.
	fn write(&mut self, user: &CanonicalUser) -> Result<()>;

	/// Deletes one user from the directory.
	fn delete(&mut self, id: &str) -> Result<()>;

	/// Ends the session and reports statistics, when the plugin keeps any for the host.
	fn close(&mut self) -> Result<Option<SessionStats>>;
}

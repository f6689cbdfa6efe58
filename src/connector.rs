//! Session state machine driven by the identity-sync host.
//!
//! A [`Connector`] moves through [`SessionState`]:
//!
//! ```text
//! Unconfigured ─configure→ Validated ─open→ Opened ─read→ Reading ─→ Exhausted ─close→ Closed
//! ```
//!
//! `open` is accepted from any state and starts a fresh session. A full listing that fails
//! returns the session to `Opened` so the host may retry; point lookups exhaust the session
//! whether they succeed or fail.

/// Per-session record counters.
pub mod stats;

pub use stats::SessionStats;

// self
use crate::{
	_prelude::*,
	config::{
		ConfigSchema, ConnectorConfig, ConnectorSettings, CredentialKind, Pagination, ReadTarget,
	},
	credential::{ClientSecretCredential, RefreshTokenCredential, TokenCredential},
	directory::{DirectoryClient, DirectoryUser, GraphUser},
	error::{ConfigError, NotFoundError},
	http::ReqwestHttpClient,
	oauth::ReqwestTransportErrorMapper,
	obs::{self, Stage, StageOutcome, StageSpan},
	plugin::{BuildInfo, IdentityPlugin, OperationKind, PluginFuture},
	transform::{self, CanonicalUser},
};

/// Lifecycle position of a [`Connector`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SessionState {
	/// No configuration has been accepted yet.
	#[default]
	Unconfigured,
	/// A configuration passed validation and the connectivity probe.
	Validated,
	/// A session is open and has users left to read.
	Opened,
	/// A `read` call is in flight.
	Reading,
	/// Every user of the session was returned; further reads yield [`Error::EndOfData`].
	Exhausted,
	/// The session was closed.
	Closed,
}

struct Session {
	directory: DirectoryClient,
	target: ReadTarget,
	operation: OperationKind,
}

/// Azure AD connector implementing [`IdentityPlugin`].
pub struct Connector {
	settings: ConnectorSettings,
	http_client: ReqwestHttpClient,
	build: BuildInfo,
	state: SessionState,
	config: Option<ConnectorConfig>,
	session: Option<Session>,
	stats: SessionStats,
}
impl Connector {
	/// Creates a connector whose HTTP client applies `settings.request_timeout`.
	pub fn new(settings: ConnectorSettings) -> Result<Self> {
		let http_client = ReqwestHttpClient::with_timeout(settings.request_timeout)?;

		Ok(Self::with_http_client(settings, http_client))
	}

	/// Creates a connector on a caller-supplied HTTP client.
	pub fn with_http_client(settings: ConnectorSettings, http_client: ReqwestHttpClient) -> Self {
		Self {
			settings,
			http_client,
			build: BuildInfo::current(),
			state: SessionState::Unconfigured,
			config: None,
			session: None,
			stats: SessionStats::default(),
		}
	}

	/// Overrides the build metadata reported to the host.
	pub fn with_build_info(mut self, build: BuildInfo) -> Self {
		self.build = build;

		self
	}

	/// Current lifecycle state.
	pub fn state(&self) -> SessionState {
		self.state
	}

	/// Counters of the current (or last closed) session.
	pub fn stats(&self) -> &SessionStats {
		&self.stats
	}

	/// Last configuration accepted by [`configure`](Self::configure) or [`open`](Self::open).
	pub fn config(&self) -> Option<&ConnectorConfig> {
		self.config.as_ref()
	}

	/// Validates `config` and probes the directory with one listing call.
	///
	/// Probe failures are wrapped in [`ConfigError::Probe`].
	pub async fn configure(&mut self, config: ConnectorConfig) -> Result<()> {
		const STAGE: Stage = Stage::Probe;

		let span = StageSpan::new(STAGE, "configure");

		obs::record_stage_outcome(STAGE, StageOutcome::Attempt);

		let result = span.instrument(self.probe(&config)).await;

		obs::record_result(STAGE, &result);

		result?;

		tracing::info!(tenant = %config.tenant, "configuration validated");

		self.config = Some(config);
		self.state = SessionState::Validated;

		Ok(())
	}

	/// Opens a session for `operation`, discarding any previous one.
	pub fn open(&mut self, config: ConnectorConfig, operation: OperationKind) -> Result<()> {
		config.validate_fields()?;

		let target = config.target()?;
		let directory = self.directory_for(&config, &self.settings)?;

		tracing::info!(
			tenant = %config.tenant,
			operation = operation.as_str(),
			target = ?target,
			"session opened"
		);

		self.session = Some(Session { directory, target, operation });
		self.config = Some(config);
		self.stats = SessionStats::default();
		self.state = SessionState::Opened;

		Ok(())
	}

	/// Decodes a host payload and opens a session with it.
	pub fn open_value(&mut self, value: serde_json::Value, operation: OperationKind) -> Result<()> {
		let config = ConnectorConfig::from_value(value)?;

		self.open(config, operation)
	}

	/// Returns the users of the session, or [`Error::EndOfData`] once they were all returned.
	pub async fn read(&mut self) -> Result<Vec<CanonicalUser>> {
		const STAGE: Stage = Stage::Read;

		let span = StageSpan::new(STAGE, "read");

		obs::record_stage_outcome(STAGE, StageOutcome::Attempt);

		let result = span.instrument(self.read_session()).await;

		obs::record_result(STAGE, &result);

		result
	}

	/// Accepts a user without touching the directory.
	pub fn write(&mut self, user: &CanonicalUser) -> Result<()> {
		tracing::debug!(id = %user.id, "write is not supported by this directory; ignoring");

		Ok(())
	}

	/// Accepts a deletion without touching the directory.
	pub fn delete(&mut self, id: &str) -> Result<()> {
		tracing::debug!(id, "delete is not supported by this directory; ignoring");

		Ok(())
	}

	/// Ends the session; the counters stay available through [`stats`](Self::stats).
	pub fn close(&mut self) -> Result<Option<SessionStats>> {
		if let Some(session) = self.session.take() {
			tracing::info!(
				operation = session.operation.as_str(),
				received = self.stats.received,
				normalized = self.stats.normalized,
				skipped = self.stats.skipped,
				"session closed"
			);
		}

		self.state = SessionState::Closed;

		Ok(None)
	}

	async fn probe(&self, config: &ConnectorConfig) -> Result<()> {
		config.validate_fields()?;

		let settings = self.settings.clone().with_pagination(Pagination::SinglePage);
		let directory = self.directory_for(config, &settings)?;

		directory.list_users(None).await.map_err(ConfigError::probe)?;

		Ok(())
	}

	async fn read_session(&mut self) -> Result<Vec<CanonicalUser>> {
		match self.state {
			SessionState::Exhausted => return Err(Error::EndOfData),
			SessionState::Opened | SessionState::Reading => (),
			_ => return Err(ConfigError::SessionNotOpen.into()),
		}

		let Some(session) = self.session.as_ref() else {
			return Err(ConfigError::SessionNotOpen.into());
		};

		self.state = SessionState::Reading;

		match &session.target {
			ReadTarget::All => match session.directory.list_users(None).await {
				Ok(users) => {
					self.state = SessionState::Exhausted;

					Ok(normalize_batch(&mut self.stats, &users))
				},
				Err(err) => {
					self.state = SessionState::Opened;

					Err(err)
				},
			},
			ReadTarget::Pid(id) => {
				self.state = SessionState::Exhausted;

				let users = session.directory.get_by_id(id).await?;
				let user = users.first().ok_or_else(|| NotFoundError::Pid { id: id.clone() })?;

				self.stats.record_received(users.len());

				let canonical = transform::normalize(user)?;

				self.stats.record_normalized();

				Ok(vec![canonical])
			},
			ReadTarget::Email(email) => {
				self.state = SessionState::Exhausted;

				let users = session.directory.get_by_email(email).await?;

				if users.is_empty() {
					return Err(NotFoundError::Email { email: email.clone() }.into());
				}

				Ok(normalize_batch(&mut self.stats, &users))
			},
		}
	}

	fn directory_for(
		&self,
		config: &ConnectorConfig,
		settings: &ConnectorSettings,
	) -> Result<DirectoryClient> {
		let endpoints = &settings.endpoints;
		let token_url = endpoints.token_url(&config.tenant)?;
		let credential: Arc<dyn TokenCredential> = match config.credential_kind() {
			CredentialKind::ClientSecret => Arc::new(ClientSecretCredential::<
				ReqwestHttpClient,
				ReqwestTransportErrorMapper,
			>::new(
				&token_url,
				&config.client_id,
				&config.client_secret,
				endpoints.default_scope(),
				self.http_client.clone(),
				ReqwestTransportErrorMapper,
			)?),
			CredentialKind::RefreshToken => {
				let client_secret =
					settings.refresh_sends_client_secret.then_some(&config.client_secret);

				Arc::new(RefreshTokenCredential::<ReqwestHttpClient, ReqwestTransportErrorMapper>::new(
					&token_url,
					&config.client_id,
					client_secret,
					config.refresh_token.clone().unwrap_or_default(),
					self.http_client.clone(),
					ReqwestTransportErrorMapper,
				)?)
			},
		};

		DirectoryClient::new(self.http_client.clone(), credential, settings)
	}
}
impl IdentityPlugin for Connector {
	fn config_schema(&self) -> ConfigSchema {
		ConnectorConfig::schema()
	}

	fn version(&self) -> BuildInfo {
		self.build.clone()
	}

	fn validate(&mut self, config: ConnectorConfig) -> PluginFuture<'_, ()> {
		Box::pin(self.configure(config))
	}

	fn open(&mut self, config: ConnectorConfig, operation: OperationKind) -> Result<()> {
		Connector::open(self, config, operation)
	}

	fn read(&mut self) -> PluginFuture<'_, Vec<CanonicalUser>> {
		Box::pin(Connector::read(self))
	}

	fn write(&mut self, user: &CanonicalUser) -> Result<()> {
		Connector::write(self, user)
	}

	fn delete(&mut self, id: &str) -> Result<()> {
		Connector::delete(self, id)
	}

	fn close(&mut self) -> Result<Option<SessionStats>> {
		Connector::close(self)
	}
}
impl Debug for Connector {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Connector")
			.field("state", &self.state)
			.field("stats", &self.stats)
			.field("config", &self.config)
			.finish_non_exhaustive()
	}
}

// Records that fail normalization are skipped so one malformed user cannot sink the batch.
fn normalize_batch(stats: &mut SessionStats, users: &[GraphUser]) -> Vec<CanonicalUser> {
	stats.record_received(users.len());

	users
		.iter()
		.filter_map(|user| match transform::normalize(user) {
			Ok(canonical) => {
				tracing::debug!(
					id = %canonical.id,
					display_name = %canonical.display_name,
					has_email = !canonical.email.is_empty(),
					"normalized user"
				);
				stats.record_normalized();

				Some(canonical)
			},
			Err(err) => {
				tracing::warn!(id = ?DirectoryUser::id(user), error = %err, "skipping malformed user");
				stats.record_skipped();

				None
			},
		})
		.collect()
}

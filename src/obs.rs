//! Observability helpers for connector stages.
//!
//! Every token exchange and directory query runs inside a span named `azuread_connector.stage`
//! carrying the `stage` and `site` (call site) fields.
//!
//! # Feature Flags
//!
//! - Enable `metrics` to increment the `azuread_connector_stage_total` counter for every
//!   attempt/success/failure, labeled by `stage` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Units of remote work the connector performs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
	/// App-only token acquisition from a client secret.
	ClientCredentials,
	/// Delegated token acquisition from a refresh token.
	RefreshToken,
	/// One `/users` query, including every continuation page it follows.
	ListUsers,
	/// Connectivity probe issued while validating a configuration.
	Probe,
	/// One `read` call on an open session.
	Read,
}
impl Stage {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Stage::ClientCredentials => "client_credentials",
			Stage::RefreshToken => "refresh_token",
			Stage::ListUsers => "list_users",
			Stage::Probe => "probe",
			Stage::Read => "read",
		}
	}
}
impl Display for Stage {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StageOutcome {
	/// Entry to a stage.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl StageOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			StageOutcome::Attempt => "attempt",
			StageOutcome::Success => "success",
			StageOutcome::Failure => "failure",
		}
	}
}
impl Display for StageOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Records [`StageOutcome::Success`] or [`StageOutcome::Failure`] for a finished stage.
///
/// [`Error::EndOfData`] is the normal end of a session and counts as a success.
pub fn record_result<T>(stage: Stage, result: &Result<T>) {
	let outcome = match result {
		Ok(_) => StageOutcome::Success,
		Err(err) if err.is_end_of_data() => StageOutcome::Success,
		Err(err) => {
			::tracing::debug!(stage = stage.as_str(), error = %err, "stage failed");

			StageOutcome::Failure
		},
	};

	record_stage_outcome(stage, outcome);
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn labels_are_stable() {
		assert_eq!(Stage::ListUsers.to_string(), "list_users");
		assert_eq!(Stage::RefreshToken.as_str(), "refresh_token");
		assert_eq!(StageOutcome::Failure.to_string(), "failure");
	}

	#[test]
	fn end_of_data_is_not_a_failure() {
		record_result::<()>(Stage::Read, &Err(Error::EndOfData));
		record_result(Stage::Read, &Ok(1));
	}
}

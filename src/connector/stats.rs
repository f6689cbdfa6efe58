// self
use crate::_prelude::*;

/// Per-session counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
	/// Directory records received.
	pub received: u64,
	/// Records normalized and returned to the host.
	pub normalized: u64,
	/// Records skipped because they failed normalization.
	pub skipped: u64,
}
impl SessionStats {
	pub(crate) fn record_received(&mut self, count: usize) {
		self.received = self.received.saturating_add(count as u64);
	}

	pub(crate) fn record_normalized(&mut self) {
		self.normalized = self.normalized.saturating_add(1);
	}

	pub(crate) fn record_skipped(&mut self) {
		self.skipped = self.skipped.saturating_add(1);
	}
}

//! Optional observability helpers for the refresh coordinator.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit spans named `silent_refresh.refresh` with a `stage` field, plus
//!   `debug`/`warn` events for every refresh outcome.
//! - Enable `metrics` to increment the `silent_refresh_refresh_total` counter, labeled by
//!   `outcome`.

mod metrics;
mod tracing;

pub use self::metrics::*;
pub use self::tracing::*;

// self
use crate::_prelude::*;

/// Outcome labels recorded around a refresh cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RefreshOutcome {
	/// A 401 started a new refresh exchange.
	Attempt,
	/// A 401 arrived while a refresh was in flight and the request was queued.
	Queued,
	/// The exchange produced a new credential pair.
	Success,
	/// The exchange failed and the session was terminated.
	Failure,
}
impl RefreshOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			RefreshOutcome::Attempt => "attempt",
			RefreshOutcome::Queued => "queued",
			RefreshOutcome::Success => "success",
			RefreshOutcome::Failure => "failure",
		}
	}
}
impl Display for RefreshOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

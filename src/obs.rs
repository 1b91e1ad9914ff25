//! Optional observability helpers for the dispatcher.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `bearer_dispatch.stage` with a `stage` field
//!   (`refresh`, `dispatch`, `drain`), plus events for refresh failures, request timeouts and
//!   closes.
//! - Enable `metrics` to increment the `bearer_dispatch_stage_total` counter for every stage
//!   outcome, labeled by `stage` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Dispatcher stages observed by the instrumentation hooks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
	/// Credential acquisition and transport installation.
	Refresh,
	/// A caller request passing through [`crate::Dispatcher::send`].
	Dispatch,
	/// Replay of queued requests after a refresh.
	Drain,
}
impl Stage {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Stage::Refresh => "refresh",
			Stage::Dispatch => "dispatch",
			Stage::Drain => "drain",
		}
	}
}
impl Display for Stage {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StageOutcome {
	/// Entry to a stage.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure surfaced to the caller or absorbed by a retry.
	Failure,
	/// Request parked in the waitlist.
	Queued,
	/// Request gave up waiting for a credential.
	Timeout,
}
impl StageOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			StageOutcome::Attempt => "attempt",
			StageOutcome::Success => "success",
			StageOutcome::Failure => "failure",
			StageOutcome::Queued => "queued",
			StageOutcome::Timeout => "timeout",
		}
	}
}
impl Display for StageOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

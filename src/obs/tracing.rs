// self
use crate::{_prelude::*, obs::Stage};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedStage<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedStage<F> = F;

/// A span builder used by dispatcher stages.
#[derive(Clone, Debug)]
pub struct StageSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl StageSpan {
	/// Creates a new span tagged with the provided stage and endpoint.
	pub fn new(stage: Stage, endpoint: &Url) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!(
				"bearer_dispatch.stage",
				stage = stage.as_str(),
				endpoint = endpoint.as_str()
			);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (stage, endpoint);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedStage<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Logs a successful refresh and the delay until the next one.
pub fn refresh_succeeded(expires_at: OffsetDateTime, next_in: Duration) {
	#[cfg(feature = "tracing")]
	tracing::debug!(%expires_at, %next_in, "installed transport for fresh credential");
	#[cfg(not(feature = "tracing"))]
	let _ = (expires_at, next_in);
}

/// Logs a failed refresh attempt and the backoff before the retry.
pub fn refresh_failed(error: &Error, attempt: u32, retry_in: Duration) {
	#[cfg(feature = "tracing")]
	tracing::warn!(%error, attempt, %retry_in, "credential refresh failed");
	#[cfg(not(feature = "tracing"))]
	let _ = (error, attempt, retry_in);
}

/// Logs a queued request that gave up waiting for a credential.
pub fn job_timed_out(waited: Duration) {
	#[cfg(feature = "tracing")]
	tracing::warn!(%waited, "queued request timed out waiting for a credential");
	#[cfg(not(feature = "tracing"))]
	let _ = waited;
}

/// Logs a dispatcher close and how many requests were still queued.
pub fn dispatcher_closed(queued: usize) {
	#[cfg(feature = "tracing")]
	tracing::debug!(queued, "dispatcher closed");
	#[cfg(not(feature = "tracing"))]
	let _ = queued;
}

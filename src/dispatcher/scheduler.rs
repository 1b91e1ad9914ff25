//! Refresh scheduling: when to ask the provider for a token and how a fresh transport is
//! installed.
//!
//! Timers are spawned tasks holding a [`Weak`](std::sync::Weak) reference to the dispatcher and
//! the generation they were armed for. A timer that fires after being superseded, after `close`,
//! or after every handle was dropped does nothing.

// crates.io
use futures_util::future;
// self
use super::{Inner, waitlist::Job};
use crate::{
	_prelude::*,
	auth::Credential,
	config,
	error::CredentialError,
	http::Transport,
	obs::{self, Stage, StageOutcome, StageSpan},
};

impl Inner {
	/// Arms the next refresh so it fires `refresh_margin` before `expires_at`, or immediately
	/// when that point has already passed. `None` means "refresh now".
	///
	/// Returns the delay that was armed.
	pub(super) fn schedule_refresh(self: &Arc<Self>, expires_at: Option<OffsetDateTime>) -> Duration {
		let delay = match expires_at {
			Some(expires_at) => refresh_delay(
				expires_at - OffsetDateTime::now_utc(),
				self.config.refresh_margin,
			),
			None => Duration::ZERO,
		};

		self.arm(delay);

		delay
	}

	fn arm(self: &Arc<Self>, delay: Duration) {
		let mut state = self.state.lock();

		if state.closed {
			return;
		}

		state.generation += 1;

		let generation = state.generation;
		let weak = Arc::downgrade(self);
		let timer = self.runtime.spawn(async move {
			if delay.is_positive() {
				tokio::time::sleep(config::to_std(delay)).await;
			}
			if let Some(inner) = weak.upgrade() {
				inner.refresh(generation).await;
			}
		});

		// The superseded handle may belong to the task running this very call, so it is only
		// detached here; its generation no longer matches.
		state.timer = Some(timer);
	}

	async fn refresh(self: Arc<Self>, generation: u64) {
		const STAGE: Stage = Stage::Refresh;

		{
			let state = self.state.lock();

			if state.closed || state.generation != generation {
				return;
			}
		}

		let span = StageSpan::new(STAGE, &self.endpoint);

		obs::record_stage_outcome(STAGE, StageOutcome::Attempt);
		self.metrics.record_refresh_attempt();

		match span.instrument(self.acquire()).await {
			Ok(credential) => {
				self.state.lock().failures = 0;
				self.metrics.record_refresh_success();
				obs::record_stage_outcome(STAGE, StageOutcome::Success);

				let next_in = self.schedule_refresh(Some(credential.expires_at));

				obs::refresh_succeeded(credential.expires_at, next_in);
			},
			Err(Error::Closed) => (),
			Err(err) => {
				self.metrics.record_refresh_failure();
				obs::record_stage_outcome(STAGE, StageOutcome::Failure);

				let attempt = {
					let mut state = self.state.lock();

					state.transport = None;
					state.failures = state.failures.saturating_add(1);

					state.failures - 1
				};
				let retry_in = self.config.retry.delay(attempt);

				obs::refresh_failed(&err, attempt, retry_in);

				self.arm(retry_in);
			},
		}
	}

	/// Runs one refresh: fetch, build and install, drain, decode.
	///
	/// The waitlist is drained before the expiry is decoded, so requests queued during an outage
	/// go out as soon as a transport exists even if the token later proves undecodable.
	async fn acquire(&self) -> Result<Credential> {
		let token = self.provider.fetch().await?;

		if token.is_empty() {
			return Err(CredentialError::EmptyToken.into());
		}

		let transport = self.factory.build(&self.endpoint, self.options.with_bearer(&token))?;
		let jobs = self.install(transport.clone())?;

		self.drain(transport, jobs);

		Ok(Credential::decode(token, self.decoder.as_ref())?)
	}

	/// Installs `transport` as current and hands back the waitlist, unless the dispatcher was
	/// closed while the refresh was in flight.
	fn install(&self, transport: Arc<dyn Transport>) -> Result<Vec<Job>> {
		let mut state = self.state.lock();

		if state.closed {
			return Err(Error::Closed);
		}

		state.transport = Some(transport);

		Ok(state.waitlist.take())
	}

	/// Replays claimable jobs on `transport` from a single task.
	///
	/// `Transport::send` is called for every job in arrival order before any of them is awaited,
	/// then the replies are driven concurrently.
	fn drain(&self, transport: Arc<dyn Transport>, jobs: Vec<Job>) {
		let claimed = jobs.into_iter().filter_map(Job::claim).collect::<Vec<_>>();

		if claimed.is_empty() {
			return;
		}

		for _ in &claimed {
			self.metrics.record_job_drained();
			obs::record_stage_outcome(Stage::Drain, StageOutcome::Attempt);
		}

		let span = StageSpan::new(Stage::Drain, &self.endpoint);

		self.runtime.spawn(span.instrument(async move {
			let sends = claimed
				.into_iter()
				.map(|(operation, reply)| {
					let send = transport.send(operation);

					async move {
						let _ = reply.send(send.await);
					}
				})
				.collect::<Vec<_>>();

			future::join_all(sends).await;
		}));
	}
}

/// Computes how long to wait before refreshing a credential with `time_left` until expiry.
pub(super) fn refresh_delay(time_left: Duration, margin: Duration) -> Duration {
	if time_left <= margin { Duration::ZERO } else { time_left - margin }
}

//! Request dispatcher that keeps a bearer-authenticated transport fresh.
//!
//! A [`Dispatcher`] owns one endpoint and one credential provider. Building it triggers an
//! immediate refresh; every successful refresh installs a new transport carrying
//! `Authorization: Bearer <token>`, replays the requests queued while no transport existed, and
//! re-arms a timer that fires [`DispatcherConfig::refresh_margin`] before the token expires.
//! Failed refreshes drop the transport and retry according to [`DispatcherConfig::retry`].

mod builder;
mod metrics;
mod scheduler;
mod waitlist;

pub use builder::DispatcherBuilder;
pub use metrics::DispatchMetrics;

// crates.io
use tokio::{runtime::Handle, task::JoinHandle};
// self
use crate::{
	_prelude::*,
	auth::TokenDecoder,
	config::DispatcherConfig,
	http::{Operation, Transport, TransportFactory, TransportOptions},
	obs::{self, Stage, StageOutcome, StageSpan},
	provider::CredentialProvider,
};
use waitlist::{JobTicket, Waitlist};

/// Public handle to a credential-refreshing request dispatcher.
///
/// Handles are cheap to clone and share one state. Dropping every handle stops the refresh loop;
/// [`Dispatcher::close`] stops it explicitly and rejects further requests.
#[derive(Clone)]
pub struct Dispatcher {
	inner: Arc<Inner>,
}
impl Dispatcher {
	/// Returns a builder for configuring a dispatcher.
	pub fn builder() -> DispatcherBuilder {
		DispatcherBuilder::default()
	}

	/// Builds a dispatcher with empty transport options and the default transport.
	///
	/// Must be called from within a Tokio runtime.
	pub fn new(
		endpoint: impl AsRef<str>,
		provider: impl 'static + CredentialProvider,
	) -> Result<Self> {
		Self::builder().endpoint(endpoint).provider(provider).build()
	}

	/// Sends `operation` through the current transport.
	///
	/// Without a transport the request waits in the waitlist until a refresh installs one, or
	/// fails with [`Error::JobTimeout`] after [`DispatcherConfig::job_wait_timeout`]. Transport
	/// failures are returned unchanged. Fails with [`Error::Closed`] once the dispatcher is
	/// closed.
	pub async fn send(&self, operation: Operation) -> Result<serde_json::Value> {
		const STAGE: Stage = Stage::Dispatch;

		let span = StageSpan::new(STAGE, &self.inner.endpoint);

		obs::record_stage_outcome(STAGE, StageOutcome::Attempt);

		let result = span.instrument(self.inner.dispatch(operation)).await;

		match &result {
			Ok(_) => obs::record_stage_outcome(STAGE, StageOutcome::Success),
			Err(Error::JobTimeout { .. }) =>
				obs::record_stage_outcome(STAGE, StageOutcome::Timeout),
			Err(_) => obs::record_stage_outcome(STAGE, StageOutcome::Failure),
		}

		result
	}

	/// Closes the dispatcher.
	///
	/// Drops the current transport, cancels the armed refresh timer, and makes every later
	/// [`send`](Dispatcher::send) fail with [`Error::Closed`]. Requests already waiting keep their
	/// own timeouts. Closing twice is a no-op.
	pub fn close(&self) {
		self.inner.close();
	}

	/// Returns `true` while a transport is installed.
	pub fn is_ready(&self) -> bool {
		self.inner.state.lock().transport.is_some()
	}

	/// Returns `true` once [`close`](Dispatcher::close) has been called.
	pub fn is_closed(&self) -> bool {
		self.inner.state.lock().closed
	}

	/// Returns the number of requests currently waiting for a transport.
	pub fn queued(&self) -> usize {
		self.inner.state.lock().waitlist.pending()
	}

	/// Returns the refresh and waitlist counters.
	pub fn metrics(&self) -> &DispatchMetrics {
		&self.inner.metrics
	}

	/// Returns the endpoint every transport is built for.
	pub fn endpoint(&self) -> &Url {
		&self.inner.endpoint
	}

	/// Returns the timing configuration.
	pub fn config(&self) -> &DispatcherConfig {
		&self.inner.config
	}
}
impl Debug for Dispatcher {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let state = self.inner.state.lock();

		f.debug_struct("Dispatcher")
			.field("endpoint", &self.inner.endpoint.as_str())
			.field("ready", &state.transport.is_some())
			.field("closed", &state.closed)
			.field("queued", &state.waitlist.pending())
			.finish()
	}
}

struct Inner {
	endpoint: Url,
	options: TransportOptions,
	provider: Arc<dyn CredentialProvider>,
	decoder: Arc<dyn TokenDecoder>,
	factory: Arc<dyn TransportFactory>,
	config: DispatcherConfig,
	runtime: Handle,
	metrics: DispatchMetrics,
	state: Mutex<State>,
}
impl Inner {
	async fn dispatch(&self, operation: Operation) -> Result<serde_json::Value> {
		match self.route(operation)? {
			Route::Ready(transport, operation) => transport.send(operation).await,
			Route::Queued(ticket) => {
				let result = ticket.wait(self.config.job_wait_timeout).await;

				if let Err(Error::JobTimeout { waited }) = &result {
					self.metrics.record_job_timed_out();

					obs::job_timed_out(*waited);
				}

				result
			},
		}
	}

	fn route(&self, operation: Operation) -> Result<Route> {
		let mut state = self.state.lock();

		if state.closed {
			return Err(Error::Closed);
		}
		if let Some(transport) = state.transport.clone() {
			return Ok(Route::Ready(transport, operation));
		}

		let ticket = state.waitlist.push(operation);

		self.metrics.record_job_queued();
		obs::record_stage_outcome(Stage::Dispatch, StageOutcome::Queued);

		Ok(Route::Queued(ticket))
	}

	fn close(&self) {
		let (timer, queued) = {
			let mut state = self.state.lock();

			if state.closed {
				return;
			}

			state.closed = true;
			state.transport = None;
			state.generation += 1;

			(state.timer.take(), state.waitlist.pending())
		};

		if let Some(timer) = timer {
			timer.abort();
		}

		obs::dispatcher_closed(queued);
	}
}
impl Drop for Inner {
	fn drop(&mut self) {
		if let Some(timer) = self.state.get_mut().timer.take() {
			timer.abort();
		}
	}
}

/// Mutable dispatcher state. Every transition happens under one lock and no lock is held
/// across an `.await`.
#[derive(Default)]
struct State {
	transport: Option<Arc<dyn Transport>>,
	waitlist: Waitlist,
	closed: bool,
	timer: Option<JoinHandle<()>>,
	/// Bumped whenever a timer is armed or the dispatcher closes; stale timers compare and bail.
	generation: u64,
	/// Consecutive failed refresh attempts.
	failures: u32,
}

enum Route {
	Ready(Arc<dyn Transport>, Operation),
	Queued(JobTicket),
}

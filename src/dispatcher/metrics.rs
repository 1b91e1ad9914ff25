// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for refresh attempts and queued requests.
#[derive(Debug, Default)]
pub struct DispatchMetrics {
	refresh_attempts: AtomicU64,
	refresh_success: AtomicU64,
	refresh_failure: AtomicU64,
	jobs_queued: AtomicU64,
	jobs_drained: AtomicU64,
	jobs_timed_out: AtomicU64,
}
impl DispatchMetrics {
	/// Returns the total number of refresh attempts.
	pub fn refresh_attempts(&self) -> u64 {
		self.refresh_attempts.load(Ordering::Relaxed)
	}

	/// Returns the number of refreshes that installed a transport and re-armed the timer.
	pub fn refresh_successes(&self) -> u64 {
		self.refresh_success.load(Ordering::Relaxed)
	}

	/// Returns the number of failed refresh attempts.
	pub fn refresh_failures(&self) -> u64 {
		self.refresh_failure.load(Ordering::Relaxed)
	}

	/// Returns the number of requests that entered the waitlist.
	pub fn jobs_queued(&self) -> u64 {
		self.jobs_queued.load(Ordering::Relaxed)
	}

	/// Returns the number of queued requests replayed on a fresh transport.
	pub fn jobs_drained(&self) -> u64 {
		self.jobs_drained.load(Ordering::Relaxed)
	}

	/// Returns the number of queued requests that timed out.
	pub fn jobs_timed_out(&self) -> u64 {
		self.jobs_timed_out.load(Ordering::Relaxed)
	}

	pub(crate) fn record_refresh_attempt(&self) {
		self.refresh_attempts.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_refresh_success(&self) {
		self.refresh_success.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_refresh_failure(&self) {
		self.refresh_failure.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_job_queued(&self) {
		self.jobs_queued.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_job_drained(&self) {
		self.jobs_drained.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_job_timed_out(&self) {
		self.jobs_timed_out.fetch_add(1, Ordering::Relaxed);
	}
}

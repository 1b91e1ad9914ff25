//! Dispatcher tuning knobs: refresh lead time, waitlist bound, and refresh retry backoff.

// crates.io
use rand::Rng;
// self
use crate::_prelude::*;

/// Timing configuration shared by the refresh scheduler and the waitlist.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
	/// Lead time before expiry at which a proactive refresh fires.
	pub refresh_margin: Duration,
	/// Maximum time a request may wait for a credential before failing.
	pub job_wait_timeout: Duration,
	/// Backoff applied between failed refresh attempts.
	pub retry: RetryPolicy,
}
impl DispatcherConfig {
	/// Default refresh lead time: tokens expiring within a minute are refreshed immediately.
	pub const DEFAULT_REFRESH_MARGIN: Duration = Duration::seconds(60);
	/// Default waitlist bound.
	pub const DEFAULT_JOB_WAIT_TIMEOUT: Duration = Duration::seconds(10);

	/// Overrides the refresh lead time (negative values clamp to zero).
	pub fn with_refresh_margin(mut self, margin: Duration) -> Self {
		self.refresh_margin = non_negative(margin);

		self
	}

	/// Overrides the waitlist bound (negative values clamp to zero).
	pub fn with_job_wait_timeout(mut self, timeout: Duration) -> Self {
		self.job_wait_timeout = non_negative(timeout);

		self
	}

	/// Overrides the refresh retry policy.
	pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
		self.retry = retry;

		self
	}
}
impl Default for DispatcherConfig {
	fn default() -> Self {
		Self {
			refresh_margin: Self::DEFAULT_REFRESH_MARGIN,
			job_wait_timeout: Self::DEFAULT_JOB_WAIT_TIMEOUT,
			retry: RetryPolicy::default(),
		}
	}
}

/// Capped exponential backoff with proportional jitter for failed refresh attempts.
///
/// Attempt `n` (zero-based) waits `initial * multiplier^n`, capped at `max`, minus a random
/// share of up to `jitter` of that delay.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
	/// Delay before the first retry.
	pub initial: Duration,
	/// Upper bound for any single delay.
	pub max: Duration,
	/// Growth factor applied per consecutive failure.
	pub multiplier: f64,
	/// Fraction of the delay (0.0..=1.0) that may be shaved off at random.
	pub jitter: f64,
}
impl RetryPolicy {
	/// Retries immediately after every failure, without any delay.
	pub const fn immediate() -> Self {
		Self { initial: Duration::ZERO, max: Duration::ZERO, multiplier: 1.0, jitter: 0.0 }
	}

	/// Overrides the initial delay.
	pub fn with_initial(mut self, initial: Duration) -> Self {
		self.initial = non_negative(initial);

		self
	}

	/// Overrides the delay cap.
	pub fn with_max(mut self, max: Duration) -> Self {
		self.max = non_negative(max);

		self
	}

	/// Overrides the growth factor; values below 1.0 are treated as 1.0.
	pub fn with_multiplier(mut self, multiplier: f64) -> Self {
		self.multiplier = if multiplier.is_finite() { multiplier.max(1.0) } else { 1.0 };

		self
	}

	/// Overrides the jitter ratio, clamped into `0.0..=1.0`.
	pub fn with_jitter(mut self, jitter: f64) -> Self {
		self.jitter = if jitter.is_finite() { jitter.clamp(0.0, 1.0) } else { 0.0 };

		self
	}

	/// Returns the un-jittered delay for the given zero-based attempt.
	pub fn base_delay(&self, attempt: u32) -> Duration {
		let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
		let scaled = self.initial.as_seconds_f64() * self.multiplier.powi(exponent);
		let capped = scaled.min(self.max.as_seconds_f64());

		if capped.is_finite() && capped > 0.0 { Duration::seconds_f64(capped) } else { Duration::ZERO }
	}

	/// Returns the jittered delay for the given zero-based attempt.
	pub fn delay(&self, attempt: u32) -> Duration {
		let base = self.base_delay(attempt);

		if base.is_zero() || self.jitter <= 0.0 {
			return base;
		}

		let shave = rand::rng().random_range(0.0..=self.jitter);

		base - base * shave
	}
}
impl Default for RetryPolicy {
	fn default() -> Self {
		Self {
			initial: Duration::milliseconds(250),
			max: Duration::seconds(30),
			multiplier: 2.0,
			jitter: 0.2,
		}
	}
}

/// Converts a signed [`Duration`] into a [`std::time::Duration`] suitable for Tokio timers.
pub(crate) fn to_std(duration: Duration) -> std::time::Duration {
	if duration.is_positive() { duration.unsigned_abs() } else { std::time::Duration::ZERO }
}

fn non_negative(duration: Duration) -> Duration {
	if duration.is_negative() { Duration::ZERO } else { duration }
}

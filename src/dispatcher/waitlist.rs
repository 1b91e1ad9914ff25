//! Requests parked while no transport is installed.
//!
//! Each queued request is split into a [`Job`] that stays in the [`Waitlist`] and a
//! [`JobTicket`] held by the waiting caller. Both share a `done` flag; whichever side flips it
//! first (the drain or the caller's timeout) owns the completion, so a job completes exactly once.

// std
use std::sync::atomic::{AtomicBool, Ordering};
// crates.io
use tokio::sync::oneshot;
// self
use crate::{_prelude::*, config, http::Operation};

type Reply = Result<serde_json::Value>;

const PRUNE_FLOOR: usize = 16;

/// A queued request waiting for a transport.
pub(crate) struct Job {
	operation: Operation,
	done: Arc<AtomicBool>,
	reply: oneshot::Sender<Reply>,
}
impl Job {
	/// Claims the job for dispatch. Returns `None` when its caller already timed out.
	pub(crate) fn claim(self) -> Option<(Operation, oneshot::Sender<Reply>)> {
		claim(&self.done).then_some((self.operation, self.reply))
	}

	fn is_done(&self) -> bool {
		self.done.load(Ordering::Acquire)
	}
}
impl Debug for Job {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Job")
			.field("operation_name", &self.operation.operation_name)
			.field("done", &self.is_done())
			.finish()
	}
}

/// The caller's half of a queued request.
#[derive(Debug)]
pub(crate) struct JobTicket {
	done: Arc<AtomicBool>,
	reply: oneshot::Receiver<Reply>,
}
impl JobTicket {
	/// Waits for the drain to deliver a reply, giving up after `limit`.
	///
	/// On timeout the ticket tries to claim the job. If the drain claimed it first, the reply is
	/// already on its way and the ticket keeps waiting for it instead of failing.
	pub(crate) async fn wait(mut self, limit: Duration) -> Reply {
		match tokio::time::timeout(config::to_std(limit), &mut self.reply).await {
			Ok(reply) => reply.unwrap_or(Err(Error::Closed)),
			Err(_) if claim(&self.done) => Err(Error::JobTimeout { waited: limit }),
			Err(_) => self.reply.await.unwrap_or(Err(Error::Closed)),
		}
	}
}

/// Arrival-ordered queue of [`Job`]s.
///
/// Timed-out jobs are swept out whenever the queue reaches `prune_at`; the threshold is then reset
/// to twice the surviving length, keeping pushes amortized constant time.
#[derive(Debug, Default)]
pub(crate) struct Waitlist {
	jobs: Vec<Job>,
	prune_at: usize,
}
impl Waitlist {
	/// Appends a request and returns the ticket its caller waits on.
	pub(crate) fn push(&mut self, operation: Operation) -> JobTicket {
		let done = Arc::new(AtomicBool::new(false));
		let (reply, receiver) = oneshot::channel();

		if self.jobs.len() >= self.prune_at {
			self.jobs.retain(|job| !job.is_done());
			self.prune_at = (self.jobs.len() * 2).max(PRUNE_FLOOR);
		}

		self.jobs.push(Job { operation, done: done.clone(), reply });

		JobTicket { done, reply: receiver }
	}

	/// Takes every queued job, leaving the waitlist empty.
	pub(crate) fn take(&mut self) -> Vec<Job> {
		self.prune_at = 0;

		std::mem::take(&mut self.jobs)
	}

	/// Returns the number of jobs whose callers are still waiting.
	pub(crate) fn pending(&self) -> usize {
		self.jobs.iter().filter(|job| !job.is_done()).count()
	}
}

fn claim(done: &AtomicBool) -> bool {
	done.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire).is_ok()
}

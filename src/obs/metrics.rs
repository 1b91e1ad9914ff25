// self
use crate::obs::{Stage, StageOutcome};

/// Records a stage outcome via the global metrics recorder (when enabled).
pub fn record_stage_outcome(stage: Stage, outcome: StageOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"bearer_dispatch_stage_total",
			"stage" => stage.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (stage, outcome);
	}
}

#[cfg(all(test, feature = "metrics"))]
mod tests {
	// std
	use std::sync::{
		Arc, Mutex,
		atomic::{AtomicU64, Ordering},
	};
	// crates.io
	use metrics::{
		Counter, CounterFn, Gauge, Histogram, Key, KeyName, Metadata, Recorder, SharedString, Unit,
	};
	// self
	use super::*;

	#[derive(Debug, Default)]
	struct Hits(AtomicU64);
	impl CounterFn for Hits {
		fn increment(&self, value: u64) {
			self.0.fetch_add(value, Ordering::Relaxed);
		}

		fn absolute(&self, value: u64) {
			self.0.store(value, Ordering::Relaxed);
		}
	}

	#[derive(Debug, Default)]
	struct CapturingRecorder {
		counters: Mutex<Vec<(Key, Arc<Hits>)>>,
	}
	impl Recorder for CapturingRecorder {
		fn describe_counter(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}

		fn describe_gauge(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}

		fn describe_histogram(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}

		fn register_counter(&self, key: &Key, _: &Metadata<'_>) -> Counter {
			let hits = Arc::new(Hits::default());

			self.counters
				.lock()
				.expect("Recorder lock should not be poisoned.")
				.push((key.clone(), hits.clone()));

			Counter::from_arc(hits)
		}

		fn register_gauge(&self, _: &Key, _: &Metadata<'_>) -> Gauge {
			Gauge::noop()
		}

		fn register_histogram(&self, _: &Key, _: &Metadata<'_>) -> Histogram {
			Histogram::noop()
		}
	}

	#[test]
	fn stage_outcomes_increment_a_labelled_counter() {
		let recorder = CapturingRecorder::default();

		metrics::with_local_recorder(&recorder, || {
			record_stage_outcome(Stage::Drain, StageOutcome::Timeout);
		});

		let counters = recorder.counters.lock().expect("Recorder lock should not be poisoned.");
		let (key, hits) = counters.first().expect("A counter should have been registered.");
		let labels = key.labels().map(|label| (label.key(), label.value())).collect::<Vec<_>>();

		assert_eq!(counters.len(), 1);
		assert_eq!(key.name(), "bearer_dispatch_stage_total");
		assert_eq!(labels, [("stage", "drain"), ("outcome", "timeout")]);
		assert_eq!(hits.0.load(Ordering::Relaxed), 1);
	}
}

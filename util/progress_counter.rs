use num_traits::ToPrimitive;
use std::sync::{
	atomic::{AtomicU64, Ordering},
	Arc,
};

/// A `ProgressCounter` is shared between the code doing some work and the code reporting on it. Clones share the same current value.
#[derive(Clone, Debug)]
pub struct ProgressCounter {
	current: Arc<AtomicU64>,
	total: u64,
}

impl ProgressCounter {
	pub fn new(total: u64) -> Self {
		Self {
			current: Arc::new(AtomicU64::new(0)),
			total,
		}
	}

	pub fn total(&self) -> u64 {
		self.total
	}

	pub fn get(&self) -> u64 {
		self.current.load(Ordering::Relaxed)
	}

	pub fn set(&self, value: u64) {
		self.current.store(value, Ordering::Relaxed);
	}

	pub fn inc(&self, amount: u64) {
		self.current.fetch_add(amount, Ordering::Relaxed);
	}

	/// The fraction of the work that is done, in [0, 1]. An empty counter is considered done.
	pub fn fraction(&self) -> f64 {
		if self.total == 0 {
			return 1.0;
		}
		(self.get().to_f64().unwrap() / self.total.to_f64().unwrap()).min(1.0)
	}
}

#[test]
fn test_progress_counter() {
	let counter = ProgressCounter::new(4);
	let shared = counter.clone();
	shared.inc(1);
	counter.inc(2);
	assert_eq!(counter.get(), 3);
	assert_eq!(shared.total(), 4);
	assert!((counter.fraction() - 0.75).abs() < 1e-12);
	counter.set(10);
	assert_eq!(counter.fraction(), 1.0);
	assert_eq!(ProgressCounter::new(0).fraction(), 1.0);
}

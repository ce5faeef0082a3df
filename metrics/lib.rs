/*!
This crate defines the [`StreamingMetric`](trait.StreamingMetric.html) trait and the metrics computed by the miner and the classifier: [`ContrastMetrics`](struct.ContrastMetrics.html), which measures how strongly a pattern contrasts one class against the rest, and [`ClassificationMetrics`](struct.ClassificationMetrics.html), which summarizes predictions against labels.
*/

#![allow(clippy::tabs_in_doc_comments)]

mod classification;
mod contrast;

pub use self::classification::{
	ClassMetrics, ClassificationMetrics, ClassificationMetricsInput, ClassificationMetricsOutput,
};
pub use self::contrast::{
	growth_rate, strength, ContrastMeasures, ContrastMetrics, ContrastMetricsInput,
};

/**
The `StreamingMetric` trait defines a common interface to metrics that can be computed in a streaming manner, where the input is available one example at a time or in chunks.

After being initialized, a value of type `T` implementing the `StreamingMetric` trait can have `update()` called on it with values of the associated type `Input`. Multiple values of `T` can be merged together by calling `merge()`. This is useful when computing a metric across multiple threads. When finished aggregating, you can call `finalize()` on the metric to produce the associated type `Output`.

# Examples

```
use emerge_metrics::StreamingMetric;

struct Min(f64);

impl StreamingMetric<'_> for Min {
	type Input = f64;
	type Output = f64;
	fn update(&mut self, input: Self::Input) {
		self.0 = self.0.min(input)
	}
	fn merge(&mut self, other: Self) { self.0 = self.0.min(other.0) }
	fn finalize(self) -> Self::Output { self.0 }
}
```

The seemingly unused generic lifetime `'a` exists here to allow `Input`s and `Output`s to borrow from their enclosing scope.
*/
pub trait StreamingMetric<'a> {
	/// `Input` is the type to aggregate in calls to `update()`.
	type Input;
	/// `Output` is the return type of `finalize()`.
	type Output;
	/// Update this streaming metric with the `Input` `input`.
	fn update(&mut self, input: Self::Input);
	/// Merge multiple independently computed streaming metrics.
	fn merge(&mut self, other: Self);
	/// When you are done aggregating `Input`s, call `finalize()` to produce an `Output`.
	fn finalize(self) -> Self::Output;
}

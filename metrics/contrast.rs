use super::StreamingMetric;
use num_traits::ToPrimitive;

/// `ContrastMetrics` counts how a pattern's cover splits the examples of a target class from the rest. Feed it one `ContrastMetricsInput` per example and finalize it to get the pattern's [`ContrastMeasures`](struct.ContrastMeasures.html).
#[derive(Clone, Debug, Default)]
pub struct ContrastMetrics {
	true_positives: u64,
	false_positives: u64,
	true_negatives: u64,
	false_negatives: u64,
}

#[derive(Clone, Copy, Debug)]
pub struct ContrastMetricsInput {
	/// Does the pattern cover the example?
	pub covered: bool,
	/// Does the example belong to the pattern's target class?
	pub positive: bool,
}

/// These are the quality measures of a pattern on one dataset.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ContrastMeasures {
	pub true_positives: u64,
	pub false_positives: u64,
	pub true_negatives: u64,
	pub false_negatives: u64,
	/// The fraction of all examples that are covered and positive.
	pub support: f64,
	/// The ratio of the true positive rate to the false positive rate. It is infinite when the pattern covers positives but no negatives.
	pub growth_rate: f64,
	/// `growth_rate / (growth_rate + 1) * support`, infinite for jumping patterns.
	pub strength: f64,
	/// The fraction of covered examples that are positive, or 0 if the pattern covers nothing.
	pub confidence: f64,
}

impl ContrastMetrics {
	pub fn new() -> Self {
		Self::default()
	}
}

impl StreamingMetric<'_> for ContrastMetrics {
	type Input = ContrastMetricsInput;
	type Output = ContrastMeasures;

	fn update(&mut self, input: ContrastMetricsInput) {
		match (input.covered, input.positive) {
			(true, true) => self.true_positives += 1,
			(true, false) => self.false_positives += 1,
			(false, true) => self.false_negatives += 1,
			(false, false) => self.true_negatives += 1,
		}
	}

	fn merge(&mut self, other: Self) {
		self.true_positives += other.true_positives;
		self.false_positives += other.false_positives;
		self.true_negatives += other.true_negatives;
		self.false_negatives += other.false_negatives;
	}

	fn finalize(self) -> ContrastMeasures {
		ContrastMeasures::from_counts(
			self.true_positives,
			self.false_positives,
			self.true_negatives,
			self.false_negatives,
		)
	}
}

impl ContrastMeasures {
	pub fn from_counts(
		true_positives: u64,
		false_positives: u64,
		true_negatives: u64,
		false_negatives: u64,
	) -> Self {
		let n_examples = true_positives + false_positives + true_negatives + false_negatives;
		let support = ratio(true_positives, n_examples);
		let growth_rate = growth_rate(
			true_positives,
			true_positives + false_negatives,
			false_positives,
			false_positives + true_negatives,
		);
		let strength = strength(growth_rate, support);
		let confidence = ratio(true_positives, true_positives + false_positives);
		Self {
			true_positives,
			false_positives,
			true_negatives,
			false_negatives,
			support,
			growth_rate,
			strength,
			confidence,
		}
	}
}

/**
Compute the growth rate of a pattern that occurs `positive_count` times among `n_positive` positive examples and `negative_count` times among `n_negative` negative examples.

Division by zero is not an error. If the negative ratio is zero the growth rate is infinite when the positive ratio is nonzero and zero when both are zero.
*/
pub fn growth_rate(positive_count: u64, n_positive: u64, negative_count: u64, n_negative: u64) -> f64 {
	let positive_ratio = ratio(positive_count, n_positive);
	let negative_ratio = ratio(negative_count, n_negative);
	if negative_ratio == 0.0 {
		if positive_ratio == 0.0 {
			0.0
		} else {
			f64::INFINITY
		}
	} else {
		positive_ratio / negative_ratio
	}
}

/// Compute the strength of a pattern from its growth rate and support.
pub fn strength(growth_rate: f64, support: f64) -> f64 {
	if growth_rate.is_infinite() {
		f64::INFINITY
	} else if growth_rate == 0.0 || support == 0.0 {
		0.0
	} else {
		growth_rate / (growth_rate + 1.0) * support
	}
}

fn ratio(numerator: u64, denominator: u64) -> f64 {
	if denominator == 0 {
		0.0
	} else {
		numerator.to_f64().unwrap() / denominator.to_f64().unwrap()
	}
}

#[test]
fn test_jumping_pattern() {
	let measures = ContrastMeasures::from_counts(5, 0, 10, 0);
	assert_eq!(measures.growth_rate, f64::INFINITY);
	assert_eq!(measures.strength, f64::INFINITY);
	assert!((measures.support - 5.0 / 15.0).abs() < 1e-12);
	assert_eq!(measures.confidence, 1.0);
}

#[test]
fn test_pattern_covering_no_positives() {
	let measures = ContrastMeasures::from_counts(0, 0, 10, 5);
	assert_eq!(measures.growth_rate, 0.0);
	assert_eq!(measures.strength, 0.0);
	assert_eq!(measures.support, 0.0);
	assert_eq!(measures.confidence, 0.0);
}

#[test]
fn test_finite_growth_rate() {
	let mut metrics = ContrastMetrics::new();
	// 4 of 5 positives are covered, 1 of 5 negatives is covered.
	for &(covered, positive) in &[
		(true, true),
		(true, true),
		(true, true),
		(true, true),
		(false, true),
		(true, false),
		(false, false),
		(false, false),
		(false, false),
		(false, false),
	] {
		metrics.update(ContrastMetricsInput { covered, positive });
	}
	let measures = metrics.finalize();
	assert_eq!(measures.true_positives, 4);
	assert_eq!(measures.false_positives, 1);
	assert_eq!(measures.true_negatives, 4);
	assert_eq!(measures.false_negatives, 1);
	assert!((measures.growth_rate - 4.0).abs() < 1e-12);
	assert!((measures.support - 0.4).abs() < 1e-12);
	assert!((measures.strength - 0.8 * 0.4).abs() < 1e-12);
	assert!((measures.confidence - 0.8).abs() < 1e-12);
}

#[test]
fn test_from_counts() {
	let measures = ContrastMeasures::from_counts(2, 1, 3, 2);
	insta::assert_debug_snapshot!(measures, @r###"
	ContrastMeasures {
	    true_positives: 2,
	    false_positives: 1,
	    true_negatives: 3,
	    false_negatives: 2,
	    support: 0.25,
	    growth_rate: 2.0,
	    strength: 0.16666666666666666,
	    confidence: 0.6666666666666666,
	}
	"###);
}

#[test]
fn test_infinity_orders_above_finite_values() {
	let mut values = vec![f64::INFINITY, 3.0, 0.0, 1e300];
	values.sort_by(|a, b| a.total_cmp(b));
	assert_eq!(values, vec![0.0, 3.0, 1e300, f64::INFINITY]);
}

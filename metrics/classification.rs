use super::StreamingMetric;
use ndarray::prelude::*;
use num_traits::ToPrimitive;

/// `ClassificationMetrics` accumulates a confusion matrix from predicted and actual class indexes.
#[derive(Clone, Debug)]
pub struct ClassificationMetrics {
	/// The shape of the confusion matrix is (n_classes x n_classes).
	confusion_matrix: Array2<u64>,
}

pub struct ClassificationMetricsInput<'a> {
	/// (n_examples), 0-indexed
	pub predictions: &'a [usize],
	/// (n_examples), 0-indexed
	pub labels: &'a [usize],
}

#[derive(Debug)]
pub struct ClassificationMetricsOutput {
	pub class_metrics: Vec<ClassMetrics>,
	pub accuracy: f64,
	pub baseline_accuracy: f64,
}

#[derive(Debug)]
pub struct ClassMetrics {
	pub true_positives: u64,
	pub false_positives: u64,
	pub true_negatives: u64,
	pub false_negatives: u64,
	/// `None` if the class was never predicted.
	pub precision: Option<f64>,
	/// `None` if the class never occurs.
	pub recall: Option<f64>,
	pub f1_score: Option<f64>,
}

impl ClassificationMetrics {
	pub fn new(n_classes: usize) -> Self {
		//                                           prediction    label
		//                                               |           |
		//                                               v           v
		let confusion_matrix = <Array2<u64>>::zeros((n_classes, n_classes));
		Self { confusion_matrix }
	}
}

impl<'a> StreamingMetric<'a> for ClassificationMetrics {
	type Input = ClassificationMetricsInput<'a>;
	type Output = ClassificationMetricsOutput;

	fn update(&mut self, input: ClassificationMetricsInput) {
		for (prediction, label) in input.predictions.iter().zip(input.labels.iter()) {
			self.confusion_matrix[(*prediction, *label)] += 1;
		}
	}

	fn merge(&mut self, other: Self) {
		self.confusion_matrix += &other.confusion_matrix;
	}

	fn finalize(self) -> ClassificationMetricsOutput {
		let n_classes = self.confusion_matrix.nrows();
		let n_examples = self.confusion_matrix.sum();
		let confusion_matrix = self.confusion_matrix;
		let class_metrics: Vec<_> = (0..n_classes)
			.map(|class_index| {
				let true_positives = confusion_matrix[(class_index, class_index)];
				let false_positives = confusion_matrix.row(class_index).sum() - true_positives;
				let false_negatives = confusion_matrix.column(class_index).sum() - true_positives;
				let true_negatives =
					n_examples - true_positives - false_positives - false_negatives;
				let precision = ratio(true_positives, true_positives + false_positives);
				let recall = ratio(true_positives, true_positives + false_negatives);
				let f1_score = match (precision, recall) {
					(Some(precision), Some(recall)) if precision + recall > 0.0 => {
						Some(2.0 * (precision * recall) / (precision + recall))
					}
					_ => None,
				};
				ClassMetrics {
					true_positives,
					false_positives,
					true_negatives,
					false_negatives,
					precision,
					recall,
					f1_score,
				}
			})
			.collect();
		let n_correct: u64 = confusion_matrix.diag().sum();
		let accuracy = ratio(n_correct, n_examples).unwrap_or(0.0);
		// The baseline accuracy is the accuracy of always predicting the most frequent class.
		let n_examples_per_class = confusion_matrix.sum_axis(Axis(0));
		let baseline_accuracy = n_examples_per_class
			.iter()
			.max()
			.and_then(|n| ratio(*n, n_examples))
			.unwrap_or(0.0);
		ClassificationMetricsOutput {
			class_metrics,
			accuracy,
			baseline_accuracy,
		}
	}
}

fn ratio(numerator: u64, denominator: u64) -> Option<f64> {
	if denominator == 0 {
		None
	} else {
		Some(numerator.to_f64().unwrap() / denominator.to_f64().unwrap())
	}
}

#[test]
fn test_multiclass() {
	// example taken from https://en.wikipedia.org/wiki/Confusion_matrix
	let labels = [
		0, 0, 0, 0, 0, 1, 1, 0, 0, 0, 1, 1, 1, 2, 2, 1, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2,
	];
	let predictions = [
		0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 1, 1, 1, 1, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2,
	];
	let mut metrics = ClassificationMetrics::new(3);
	metrics.update(ClassificationMetricsInput {
		predictions: &predictions[..13],
		labels: &labels[..13],
	});
	let mut rest = ClassificationMetrics::new(3);
	rest.update(ClassificationMetricsInput {
		predictions: &predictions[13..],
		labels: &labels[13..],
	});
	metrics.merge(rest);
	let metrics = metrics.finalize();
	let counts: Vec<_> = metrics
		.class_metrics
		.iter()
		.map(|class| {
			(
				class.true_positives,
				class.false_positives,
				class.true_negatives,
				class.false_negatives,
			)
		})
		.collect();
	assert_eq!(counts, vec![(5, 2, 17, 3), (3, 5, 16, 3), (11, 1, 13, 2)]);
	assert!((metrics.accuracy - 19.0 / 27.0).abs() < 1e-12);
	assert!((metrics.baseline_accuracy - 13.0 / 27.0).abs() < 1e-12);
	assert_eq!(metrics.class_metrics[1].precision, Some(0.375));
	assert_eq!(metrics.class_metrics[1].recall, Some(0.5));
}

#[test]
fn test_class_never_predicted() {
	let mut metrics = ClassificationMetrics::new(2);
	metrics.update(ClassificationMetricsInput {
		predictions: &[0, 0, 0],
		labels: &[0, 1, 0],
	});
	let metrics = metrics.finalize();
	assert_eq!(metrics.class_metrics[1].precision, None);
	assert_eq!(metrics.class_metrics[1].recall, Some(0.0));
	assert_eq!(metrics.class_metrics[1].f1_score, None);
}

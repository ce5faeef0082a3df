use crate::{
	combine::{argmax, combine},
	dataset::{Dataset, Transaction},
	error::Result,
	item::ItemTable,
	mine::mine,
	pattern::Pattern,
	prune::prune,
	TrainOptions, TrainProgress,
};
use emerge_metrics::{
	ClassificationMetrics, ClassificationMetricsInput, ClassificationMetricsOutput, StreamingMetric,
};
use emerge_util::progress_counter::ProgressCounter;
use itertools::izip;
use ndarray::prelude::*;
use num_traits::ToPrimitive;
use rayon::prelude::*;

/**
A `Classifier` predicts the class of a row by combining the mined patterns that cover it. It keeps three rule sets built from the same patterns.

```
use emerge_mining::{Classifier, Dataset, TrainOptions};

let dataset = Dataset::from_nominal_rows(
	&["outlook"],
	&[
		&["sunny", "play"],
		&["sunny", "play"],
		&["rainy", "stay"],
		&["rainy", "stay"],
	],
)
.unwrap();
let options = TrainOptions {
	minimum_support: 0.25,
	..Default::default()
};
let classifier = Classifier::train(&dataset, &options, &mut |_| {}).unwrap();
assert_eq!(classifier.unfiltered.len(), 2);
assert_eq!(classifier.predict(&dataset).unfiltered, vec![0, 0, 1, 1]);
```
*/
#[derive(Clone, Debug, serde::Serialize)]
pub struct Classifier {
	/// The names of the classes. Predictions are indexes into this list.
	pub classes: Vec<String>,
	/// The frequency of each class in the training data.
	pub priors: Vec<f64>,
	/// The items of the training data, with their class probabilities.
	pub items: ItemTable,
	/// Every mined pattern, grouped by class.
	pub unfiltered: Vec<Pattern>,
	/// For each class, the patterns selected to cover that class's training rows.
	pub pruned: Vec<Pattern>,
	/// For each class, the strongest patterns.
	pub class_filtered: Vec<Pattern>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RuleSet {
	Unfiltered,
	Pruned,
	ClassFiltered,
}

impl RuleSet {
	pub const ALL: [RuleSet; 3] = [RuleSet::Unfiltered, RuleSet::Pruned, RuleSet::ClassFiltered];

	pub fn name(&self) -> &'static str {
		match self {
			RuleSet::Unfiltered => "unfiltered",
			RuleSet::Pruned => "pruned",
			RuleSet::ClassFiltered => "class filtered",
		}
	}
}

/// The predicted class of each row under each rule set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Predictions {
	pub unfiltered: Vec<usize>,
	pub pruned: Vec<usize>,
	pub class_filtered: Vec<usize>,
}

#[derive(Debug)]
pub struct Evaluation {
	pub unfiltered: ClassificationMetricsOutput,
	pub pruned: ClassificationMetricsOutput,
	pub class_filtered: ClassificationMetricsOutput,
}

impl Classifier {
	/// Train a classifier by mining each class against the rest.
	pub fn train(
		dataset: &Dataset,
		options: &TrainOptions,
		update_progress: &mut dyn FnMut(TrainProgress),
	) -> Result<Self> {
		options.validate()?;
		let n_classes = dataset.classes.len();

		// Compute the class probabilities of the items.
		let mut items = dataset.items.clone();
		let progress_counter = ProgressCounter::new(items.len().to_u64().unwrap());
		update_progress(TrainProgress::ComputingProbabilities(
			progress_counter.clone(),
		));
		items.calculate_probabilities(dataset, options.estimator)?;
		progress_counter.set(progress_counter.total());

		// Mine each class against the rest. Each mining call owns its trees, so the classes are mined in parallel.
		let progress_counter = ProgressCounter::new(n_classes.to_u64().unwrap());
		update_progress(TrainProgress::Mining(progress_counter.clone()));
		let patterns_per_class: Vec<Vec<Pattern>> = (0..n_classes)
			.into_par_iter()
			.map(|class| {
				let patterns = mine(dataset, class, options);
				progress_counter.inc(1);
				patterns
			})
			.collect::<Result<_>>()?;

		// Compute training measures and build the rule sets.
		let progress_counter = ProgressCounter::new(n_classes.to_u64().unwrap());
		update_progress(TrainProgress::Pruning(progress_counter.clone()));
		let mut unfiltered = Vec::new();
		let mut pruned = Vec::new();
		let mut class_filtered = Vec::new();
		for mut patterns in patterns_per_class {
			patterns.par_iter_mut().for_each(|pattern| {
				let measures = pattern.calculate_measures(dataset);
				pattern.set_training_measures(measures);
			});
			pruned.extend(prune(dataset, &patterns));
			class_filtered.extend(strongest(&patterns, options.rules_per_class));
			unfiltered.extend(patterns);
			progress_counter.inc(1);
		}

		Ok(Self {
			classes: dataset.classes.clone(),
			priors: dataset.class_priors(),
			items,
			unfiltered,
			pruned,
			class_filtered,
		})
	}

	pub fn rules(&self, rule_set: RuleSet) -> &[Pattern] {
		match rule_set {
			RuleSet::Unfiltered => &self.unfiltered,
			RuleSet::Pruned => &self.pruned,
			RuleSet::ClassFiltered => &self.class_filtered,
		}
	}

	/// Compute the probability of each class for one transaction.
	pub fn predict_probabilities(&self, rule_set: RuleSet, transaction: &Transaction) -> Vec<f64> {
		combine(
			&self.items,
			&self.priors,
			transaction,
			self.rules(rule_set),
		)
	}

	/// Compute class probabilities for every row of `dataset`. The shape of the result is (n_rows, n_classes).
	pub fn predict_proba(&self, rule_set: RuleSet, dataset: &Dataset) -> Array2<f64> {
		let mut probabilities = Array2::zeros((dataset.nrows(), self.classes.len()));
		let rows: Vec<Vec<f64>> = dataset
			.transactions
			.par_iter()
			.map(|transaction| self.predict_probabilities(rule_set, transaction))
			.collect();
		for (mut probabilities, row) in izip!(probabilities.axis_iter_mut(Axis(0)), rows) {
			probabilities.assign(&Array1::from(row));
		}
		probabilities
	}

	/// Predict the class of every row of `dataset` with each rule set.
	pub fn predict(&self, dataset: &Dataset) -> Predictions {
		let predict = |rule_set| -> Vec<usize> {
			self.predict_proba(rule_set, dataset)
				.axis_iter(Axis(0))
				.map(|probabilities| argmax(probabilities.as_slice().unwrap()))
				.collect()
		};
		Predictions {
			unfiltered: predict(RuleSet::Unfiltered),
			pruned: predict(RuleSet::Pruned),
			class_filtered: predict(RuleSet::ClassFiltered),
		}
	}

	/// Compute the test measures of every pattern on `dataset` and the classification metrics of each rule set.
	pub fn evaluate(&mut self, dataset: &Dataset) -> Evaluation {
		for patterns in vec![
			&mut self.unfiltered,
			&mut self.pruned,
			&mut self.class_filtered,
		] {
			patterns.par_iter_mut().for_each(|pattern| {
				pattern.test_measures = Some(pattern.calculate_measures(dataset));
			});
		}
		let predictions = self.predict(dataset);
		let metrics = |predictions: &[usize]| {
			let mut metrics = ClassificationMetrics::new(self.classes.len());
			metrics.update(ClassificationMetricsInput {
				predictions,
				labels: &dataset.labels,
			});
			metrics.finalize()
		};
		Evaluation {
			unfiltered: metrics(&predictions.unfiltered),
			pruned: metrics(&predictions.pruned),
			class_filtered: metrics(&predictions.class_filtered),
		}
	}
}

/// The `n` strongest of `patterns`, by strength, then support, then their order in `patterns`.
fn strongest(patterns: &[Pattern], n: usize) -> Vec<Pattern> {
	let mut order: Vec<usize> = (0..patterns.len()).collect();
	order.sort_by(|a, b| {
		let (pa, pb) = (&patterns[*a], &patterns[*b]);
		pb.strength
			.total_cmp(&pa.strength)
			.then_with(|| pb.support.total_cmp(&pa.support))
			.then_with(|| a.cmp(b))
	});
	order
		.into_iter()
		.take(n)
		.map(|index| patterns[index].clone())
		.collect()
}

#[cfg(test)]
fn weather() -> Dataset {
	let mut rows: Vec<[&str; 3]> = Vec::new();
	rows.extend(std::iter::repeat(["sunny", "no", "play"]).take(3));
	rows.extend(std::iter::repeat(["overcast", "yes", "play"]).take(2));
	rows.extend(std::iter::repeat(["rainy", "yes", "stay"]).take(3));
	rows.push(["sunny", "yes", "stay"]);
	rows.push(["rainy", "no", "stay"]);
	let rows: Vec<&[&str]> = rows.iter().map(|row| &row[..]).collect();
	Dataset::from_nominal_rows(&["outlook", "windy"], &rows).unwrap()
}

// The sorted item names of each pattern.
#[cfg(test)]
fn names(items: &ItemTable, patterns: &[Pattern]) -> Vec<Vec<String>> {
	patterns
		.iter()
		.map(|pattern| {
			let mut names: Vec<String> = pattern
				.items()
				.iter()
				.map(|item| items.get(*item).to_string())
				.collect();
			names.sort();
			names
		})
		.collect()
}

#[test]
fn test_train() {
	let dataset = weather();
	let options = TrainOptions {
		minimum_support: 0.1,
		rules_per_class: 1,
		..Default::default()
	};
	let mut progress = Vec::new();
	let classifier = Classifier::train(&dataset, &options, &mut |update| {
		progress.push(match update {
			TrainProgress::ComputingProbabilities(_) => "probabilities",
			TrainProgress::Mining(_) => "mining",
			TrainProgress::Pruning(_) => "pruning",
		})
	})
	.unwrap();
	assert_eq!(progress, vec!["probabilities", "mining", "pruning"]);
	assert_eq!(classifier.classes, vec!["play".to_owned(), "stay".to_owned()]);
	let mut unfiltered = names(&classifier.items, &classifier.unfiltered);
	unfiltered.sort();
	assert_eq!(
		unfiltered,
		vec![
			vec!["outlook = overcast".to_owned()],
			vec!["outlook = rainy".to_owned()],
			vec!["outlook = sunny".to_owned(), "windy = no".to_owned()],
			vec!["outlook = sunny".to_owned(), "windy = yes".to_owned()],
		]
	);
	assert!(classifier
		.unfiltered
		.iter()
		.all(|pattern| pattern.growth_rate == f64::INFINITY && pattern.training_measures.is_some()));
	assert_eq!(classifier.pruned.len(), 4);
	assert_eq!(
		names(&classifier.items, &classifier.class_filtered),
		vec![
			vec!["outlook = sunny".to_owned(), "windy = no".to_owned()],
			vec!["outlook = rainy".to_owned()],
		]
	);
	let probabilities = classifier.items.iter().next().unwrap().1.probabilities_per_class.clone();
	assert!(probabilities.is_some());
}

#[test]
fn test_predict() {
	let dataset = weather();
	let options = TrainOptions {
		minimum_support: 0.1,
		rules_per_class: 1,
		..Default::default()
	};
	let mut classifier = Classifier::train(&dataset, &options, &mut |_| {}).unwrap();
	let predictions = classifier.predict(&dataset);
	// Sunny and windy is a stay row, but the play probabilities of its items outweigh the stay probabilities.
	assert_eq!(predictions.unfiltered, vec![0, 0, 0, 0, 0, 1, 1, 1, 0, 1]);
	assert_eq!(predictions.pruned, predictions.unfiltered);
	// No class filtered pattern covers the overcast rows, so they get the priors, which tie and go to the first class.
	assert_eq!(predictions.class_filtered, vec![0, 0, 0, 0, 0, 1, 1, 1, 0, 1]);
	let probabilities = classifier.predict_proba(RuleSet::Unfiltered, &dataset);
	assert_eq!(probabilities.dim(), (10, 2));
	for row in probabilities.axis_iter(Axis(0)) {
		assert!((row.sum() - 1.0).abs() < 1e-12);
	}
	let evaluation = classifier.evaluate(&dataset);
	assert!((evaluation.unfiltered.accuracy - 0.9).abs() < 1e-12);
	assert!((evaluation.class_filtered.accuracy - 0.9).abs() < 1e-12);
	for rule_set in RuleSet::ALL.iter() {
		assert!(classifier
			.rules(*rule_set)
			.iter()
			.all(|pattern| pattern.test_measures == pattern.training_measures));
	}
}

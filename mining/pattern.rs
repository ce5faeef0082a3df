use crate::{
	dataset::{Dataset, Transaction},
	item::{ItemId, ItemTable},
};
use emerge_metrics::{ContrastMeasures, ContrastMetrics, ContrastMetricsInput, StreamingMetric};
use itertools::Itertools;
use std::fmt;

/**
A `Pattern` is a conjunction of items contrasting its target `class` against the other classes. Its items are ordered and unique.

`support`, `growth_rate`, and `strength` are set when the pattern is mined and again when training measures are computed. Measures computed on a held out dataset go in `test_measures`.
*/
#[derive(Clone, Debug, serde::Serialize)]
pub struct Pattern {
	items: Vec<ItemId>,
	pub class: usize,
	pub support: f64,
	pub growth_rate: f64,
	pub strength: f64,
	pub training_measures: Option<ContrastMeasures>,
	pub test_measures: Option<ContrastMeasures>,
}

impl Pattern {
	/// Make a pattern of `items` with no measures. Repeated items are kept once, at their first position.
	pub fn new(items: impl IntoIterator<Item = ItemId>, class: usize) -> Self {
		let mut pattern = Self {
			items: Vec::new(),
			class,
			support: 0.0,
			growth_rate: 0.0,
			strength: 0.0,
			training_measures: None,
			test_measures: None,
		};
		for item in items {
			pattern.add_item(item);
		}
		pattern
	}

	pub fn items(&self) -> &[ItemId] {
		&self.items
	}

	pub fn len(&self) -> usize {
		self.items.len()
	}

	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}

	pub fn contains(&self, item: ItemId) -> bool {
		self.items.contains(&item)
	}

	/// Append `item` if the pattern does not already contain it.
	pub fn add_item(&mut self, item: ItemId) {
		if !self.contains(item) {
			self.items.push(item);
		}
	}

	pub fn drop_item(&mut self, item: ItemId) {
		self.items.retain(|other| *other != item);
	}

	/// The items of `self` followed by the items of `other` it lacks, for the class of `self`.
	pub fn merge(&self, other: &Pattern) -> Pattern {
		Pattern::new(
			self.items.iter().chain(other.items.iter()).copied(),
			self.class,
		)
	}

	/// The items of `self` that `other` lacks.
	pub fn difference(&self, other: &Pattern) -> Pattern {
		Pattern::new(
			self.items
				.iter()
				.copied()
				.filter(|item| !other.contains(*item)),
			self.class,
		)
	}

	/// The same items in reverse order.
	pub fn reverse(&self) -> Pattern {
		Pattern::new(self.items.iter().rev().copied(), self.class)
	}

	pub fn is_subset_of(&self, other: &Pattern) -> bool {
		self.items.iter().all(|item| other.contains(*item))
	}

	/// Do the patterns have the same items, in any order?
	pub fn same_items(&self, other: &Pattern) -> bool {
		self.len() == other.len() && self.is_subset_of(other)
	}

	/// Does every item of the pattern cover some item of `transaction`?
	pub fn covers(&self, items: &ItemTable, transaction: &Transaction) -> bool {
		self.items.iter().all(|item| items.covers(*item, transaction))
	}

	/// Count how the pattern's cover splits the rows of `dataset` into its class and the rest.
	pub fn calculate_measures(&self, dataset: &Dataset) -> ContrastMeasures {
		let mut metrics = ContrastMetrics::new();
		for (transaction, label) in dataset.transactions.iter().zip(dataset.labels.iter()) {
			metrics.update(ContrastMetricsInput {
				covered: self.covers(&dataset.items, transaction),
				positive: *label == self.class,
			});
		}
		metrics.finalize()
	}

	/// Store training measures and take the pattern's support, growth rate, and strength from them.
	pub fn set_training_measures(&mut self, measures: ContrastMeasures) {
		self.support = measures.support;
		self.growth_rate = measures.growth_rate;
		self.strength = measures.strength;
		self.training_measures = Some(measures);
	}

	/// Display the pattern's items using the names in `items`.
	pub fn display<'a>(&'a self, items: &'a ItemTable) -> impl fmt::Display + 'a {
		PatternDisplay {
			pattern: self,
			items,
		}
	}
}

struct PatternDisplay<'a> {
	pattern: &'a Pattern,
	items: &'a ItemTable,
}

impl<'a> fmt::Display for PatternDisplay<'a> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"{{{}}}",
			self.pattern
				.items
				.iter()
				.map(|item| self.items.get(*item))
				.join(", ")
		)
	}
}

#[cfg(test)]
fn weather() -> Dataset {
	Dataset::from_nominal_rows(
		&["outlook", "windy"],
		&[
			&["sunny", "no", "play"],
			&["sunny", "yes", "play"],
			&["overcast", "no", "play"],
			&["rainy", "yes", "stay"],
			&["rainy", "no", "stay"],
			&["sunny", "yes", "stay"],
		],
	)
	.unwrap()
}

#[cfg(test)]
fn item(dataset: &Dataset, variable: &str, value: &str) -> ItemId {
	dataset
		.items
		.lookup(&crate::item::Item::nominal(variable, value).condition)
		.unwrap()
}

#[test]
fn test_set_operations() {
	let mut pattern = Pattern::new(vec![ItemId(2), ItemId(0), ItemId(2)], 1);
	assert_eq!(pattern.items(), &[ItemId(2), ItemId(0)]);
	pattern.add_item(ItemId(0));
	assert_eq!(pattern.len(), 2);
	pattern.add_item(ItemId(5));
	pattern.drop_item(ItemId(7));
	pattern.drop_item(ItemId(2));
	assert_eq!(pattern.items(), &[ItemId(0), ItemId(5)]);
	let other = Pattern::new(vec![ItemId(5), ItemId(3)], 0);
	let merged = pattern.merge(&other);
	assert_eq!(merged.items(), &[ItemId(0), ItemId(5), ItemId(3)]);
	assert_eq!(merged.class, 1);
	assert_eq!(pattern.difference(&other).items(), &[ItemId(0)]);
	assert_eq!(pattern.reverse().items(), &[ItemId(5), ItemId(0)]);
	assert!(pattern.same_items(&pattern.reverse()));
	assert!(pattern.is_subset_of(&merged));
	assert!(!merged.is_subset_of(&pattern));
	// The operations are pure.
	assert_eq!(pattern.items(), &[ItemId(0), ItemId(5)]);
}

#[test]
fn test_cover_monotonicity() {
	let dataset = weather();
	let sunny = item(&dataset, "outlook", "sunny");
	let windy = item(&dataset, "windy", "yes");
	let mut pattern = Pattern::new(vec![], 0);
	let mut previous: Vec<bool> = dataset
		.transactions
		.iter()
		.map(|transaction| pattern.covers(&dataset.items, transaction))
		.collect();
	assert!(previous.iter().all(|covered| *covered));
	for id in [sunny, windy].iter() {
		pattern.add_item(*id);
		let covered: Vec<bool> = dataset
			.transactions
			.iter()
			.map(|transaction| pattern.covers(&dataset.items, transaction))
			.collect();
		for (before, after) in previous.iter().zip(covered.iter()) {
			assert!(*before || !*after);
		}
		previous = covered;
	}
	assert_eq!(previous, vec![false, true, false, false, false, true]);
}

#[test]
fn test_calculate_measures() {
	let dataset = weather();
	let sunny = item(&dataset, "outlook", "sunny");
	let overcast = item(&dataset, "outlook", "overcast");
	let rainy = item(&dataset, "outlook", "rainy");
	// Classes are sorted, so "play" is 0.
	let mut pattern = Pattern::new(vec![sunny], 0);
	let measures = pattern.calculate_measures(&dataset);
	assert_eq!(
		(
			measures.true_positives,
			measures.false_positives,
			measures.true_negatives,
			measures.false_negatives
		),
		(2, 1, 2, 1)
	);
	assert!((measures.support - 2.0 / 6.0).abs() < 1e-12);
	assert!((measures.growth_rate - 2.0).abs() < 1e-12);
	assert!((measures.strength - 2.0 / 3.0 * 2.0 / 6.0).abs() < 1e-12);
	pattern.set_training_measures(measures);
	assert!((pattern.growth_rate - 2.0).abs() < 1e-12);
	// A jumping pattern has an infinite growth rate and strength.
	let measures = Pattern::new(vec![overcast], 0).calculate_measures(&dataset);
	assert_eq!(measures.growth_rate, f64::INFINITY);
	assert_eq!(measures.strength, f64::INFINITY);
	// A pattern covering no rows of its class has a growth rate of zero.
	let measures = Pattern::new(vec![rainy], 0).calculate_measures(&dataset);
	assert_eq!(measures.growth_rate, 0.0);
	assert_eq!(measures.strength, 0.0);
	assert_eq!(
		Pattern::new(vec![sunny, overcast], 0)
			.display(&dataset.items)
			.to_string(),
		"{outlook = sunny, outlook = overcast}"
	);
}

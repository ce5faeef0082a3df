/*!
This crate mines strong jumping emerging patterns: minimal itemsets that occur in enough rows of one class and in few or no rows of the other classes. The mined patterns are used as interpretable classification rules.

Mining builds a [`CpTree`](struct.CpTree.html), a prefix tree of the rows sorted by how strongly each item contrasts the target class, and walks it from the least discriminative item upward, recursing into conditional trees. An alternative miner searches the items depth first and counts supports by intersecting [`BscTree`](struct.BscTree.html)s, compressed bitmaps of the rows containing each item. After mining, [`prune`](fn.prune.html) selects a small set of patterns covering the training rows, and at prediction time [`combine`](fn.combine.html) turns the patterns covering a row into class probabilities.

For an end to end example, see [`Classifier`](struct.Classifier.html).
*/

#![allow(clippy::tabs_in_doc_comments)]

mod bsc_tree;
mod classifier;
mod combine;
mod config;
mod cp_tree;
mod dataset;
mod error;
mod item;
mod mine;
mod pattern;
mod prune;
mod ranking;

pub use self::bsc_tree::{BscLeaf, BscTree, PathCode};
pub use self::classifier::{Classifier, Evaluation, Predictions, RuleSet};
pub use self::combine::{class_scores, combine, select_patterns, Selection};
pub use self::config::Config;
pub use self::cp_tree::{ClassCounts, CpTree, HeaderEntry};
pub use self::dataset::{Dataset, DatasetOptions, Transaction};
pub use self::error::{Error, Result};
pub use self::item::{
	estimate_probabilities, Condition, Item, ItemId, ItemTable, Relation, TriangularFuzzySet,
};
pub use self::mine::mine;
pub use self::pattern::Pattern;
pub use self::prune::prune;
pub use self::ranking::{Ranking, RankingKey};

use emerge_util::progress_counter::ProgressCounter;

/// These are the options passed to [`mine`](fn.mine.html) and [`Classifier::train`](struct.Classifier.html#method.train).
#[derive(Clone, Debug)]
pub struct TrainOptions {
	/// A pattern must occur in at least this fraction of all training rows, in rows of its class.
	pub minimum_support: f64,
	/// A pattern must have at least this growth rate. The default of infinity mines jumping emerging patterns only.
	pub minimum_growth_rate: f64,
	/// This controls the order of items in the mining tree.
	pub ordering: ItemOrdering,
	pub miner: Miner,
	/// This is the estimator used for the class probabilities of items that the Bayesian rule combination multiplies together.
	pub estimator: Estimator,
	/// Patterns longer than this are not mined.
	pub max_length: Option<usize>,
	/// The class filtered rule set keeps this many of the strongest patterns of each class.
	pub rules_per_class: usize,
}

impl TrainOptions {
	/// Check that the thresholds are in range.
	pub fn validate(&self) -> Result<()> {
		if !(0.0..=1.0).contains(&self.minimum_support) {
			return Err(Error::InvalidConfig(format!(
				"the minimum support must be in [0, 1] but is {}",
				self.minimum_support
			)));
		}
		if self.minimum_growth_rate.is_nan() || self.minimum_growth_rate < 0.0 {
			return Err(Error::InvalidConfig(format!(
				"the minimum growth rate must not be negative but is {}",
				self.minimum_growth_rate
			)));
		}
		if self.max_length == Some(0) {
			return Err(Error::InvalidConfig(
				"the maximum length must be at least 1".to_owned(),
			));
		}
		Ok(())
	}
}

impl Default for TrainOptions {
	fn default() -> Self {
		Self {
			minimum_support: 0.01,
			minimum_growth_rate: f64::INFINITY,
			ordering: ItemOrdering::SupportRatio,
			miner: Miner::CpTree,
			estimator: Estimator::MEstimate,
			max_length: None,
			rules_per_class: 10,
		}
	}
}

/// The order items are inserted into a mining tree in, from the root down.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Deserialize)]
pub enum ItemOrdering {
	/// Items with the highest growth rate toward the target class come first, ties broken by name. Discriminative items near the root let mining prune early.
	#[serde(rename = "support_ratio")]
	SupportRatio,
	/// Items are ordered by name.
	#[serde(rename = "lexicographic")]
	Lexicographic,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Deserialize)]
pub enum Miner {
	/// Mine a contrast pattern tree with a header table and conditional pattern bases.
	#[serde(rename = "cp_tree")]
	CpTree,
	/// Search items depth first and count supports by intersecting bit string compression trees.
	#[serde(rename = "bsc_tree")]
	BscTree,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Deserialize)]
pub enum Estimator {
	#[serde(rename = "laplace")]
	Laplace,
	#[serde(rename = "m_estimate")]
	MEstimate,
}

/// This enum reports the training progress.
#[derive(Debug)]
pub enum TrainProgress {
	/// Computing the class probabilities of the items. The counter counts items.
	ComputingProbabilities(ProgressCounter),
	/// Mining one class against the rest. The counter counts classes.
	Mining(ProgressCounter),
	/// Measuring and pruning the mined patterns. The counter counts classes.
	Pruning(ProgressCounter),
}

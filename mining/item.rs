use crate::{
	dataset::{Dataset, Transaction},
	error::{Error, Result},
	Estimator,
};
use fnv::FnvHashMap;
use num_traits::ToPrimitive;
use std::{
	fmt,
	hash::{Hash, Hasher},
};

/// The additive constant of the Laplace estimator.
const LAPLACE_K: f64 = 1.0;
/// The equivalent sample size of the M-estimate.
const M_ESTIMATE_N0: f64 = 5.0;

/// An `ItemId` is the index of an item in an [`ItemTable`](struct.ItemTable.html). Trees, transactions, and patterns refer to items only through their ids.
#[derive(
	Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub struct ItemId(pub usize);

/**
An `Item` is a condition on a single variable, together with values derived from the training data.

Two items are equal if and only if their conditions are equal. The derived `growth_rate` and `probabilities_per_class` take no part in equality or hashing.
*/
#[derive(Clone, Debug, serde::Serialize)]
pub struct Item {
	pub condition: Condition,
	/// The growth rate of this item toward the class it contrasts most strongly.
	pub growth_rate: f64,
	/// The estimated probability of this item for each class, indexed by class.
	pub probabilities_per_class: Option<Vec<f64>>,
}

#[derive(Clone, Debug, serde::Serialize)]
pub enum Condition {
	/// The variable has exactly this value.
	Nominal { variable: String, value: String },
	/// The variable's value relates to `threshold` by `relation`.
	Numeric {
		variable: String,
		threshold: f64,
		relation: Relation,
	},
	/// The variable's value has a nonzero membership in `set`.
	Fuzzy {
		variable: String,
		label: String,
		set: TriangularFuzzySet,
	},
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub enum Relation {
	/// The value is within `alpha` of the threshold. An `alpha` of zero is an exact match.
	Equal { alpha: f64 },
	LessOrEqual,
	Greater,
}

/// A triangular fuzzy set rises linearly from `left` to 1 at `center` and falls linearly back to 0 at `right`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct TriangularFuzzySet {
	pub left: f64,
	pub center: f64,
	pub right: f64,
}

impl TriangularFuzzySet {
	pub fn membership(&self, value: f64) -> f64 {
		if value == self.center {
			1.0
		} else if value <= self.left || value >= self.right {
			0.0
		} else if value < self.center {
			(value - self.left) / (self.center - self.left)
		} else {
			(self.right - value) / (self.right - self.center)
		}
	}
}

impl Item {
	pub fn nominal(variable: impl Into<String>, value: impl Into<String>) -> Self {
		Self::new(Condition::Nominal {
			variable: variable.into(),
			value: value.into(),
		})
	}

	pub fn numeric(variable: impl Into<String>, threshold: f64, relation: Relation) -> Self {
		Self::new(Condition::Numeric {
			variable: variable.into(),
			threshold,
			relation,
		})
	}

	pub fn fuzzy(
		variable: impl Into<String>,
		label: impl Into<String>,
		set: TriangularFuzzySet,
	) -> Self {
		Self::new(Condition::Fuzzy {
			variable: variable.into(),
			label: label.into(),
			set,
		})
	}

	pub fn new(condition: Condition) -> Self {
		Self {
			condition,
			growth_rate: 0.0,
			probabilities_per_class: None,
		}
	}

	pub fn variable(&self) -> &str {
		self.condition.variable()
	}

	pub fn is_nominal(&self) -> bool {
		matches!(self.condition, Condition::Nominal { .. })
	}

	/**
	Does this item cover `other`? `other` is usually an item derived from a row.

	A nominal item covers an equal item. A numeric item covers a numeric item of the same variable whose threshold satisfies the relation. A fuzzy item covers a numeric item of the same variable whose threshold has a nonzero membership, and an equal fuzzy item.
	*/
	pub fn covers(&self, other: &Item) -> bool {
		if self.variable() != other.variable() {
			return false;
		}
		match (&self.condition, &other.condition) {
			(Condition::Nominal { value: a, .. }, Condition::Nominal { value: b, .. }) => a == b,
			(
				Condition::Numeric {
					threshold,
					relation,
					..
				},
				Condition::Numeric { threshold: value, .. },
			) => match relation {
				Relation::Equal { alpha } => (value - threshold).abs() <= *alpha,
				Relation::LessOrEqual => value <= threshold,
				Relation::Greater => value > threshold,
			},
			(Condition::Fuzzy { set, .. }, Condition::Numeric { threshold: value, .. }) => {
				set.membership(*value) > 0.0
			}
			(Condition::Fuzzy { .. }, Condition::Fuzzy { .. }) => self.condition == other.condition,
			_ => false,
		}
	}
}

impl PartialEq for Item {
	fn eq(&self, other: &Self) -> bool {
		self.condition == other.condition
	}
}

impl Eq for Item {}

impl Hash for Item {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.condition.hash(state)
	}
}

impl fmt::Display for Item {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.condition)
	}
}

impl Condition {
	pub fn variable(&self) -> &str {
		match self {
			Self::Nominal { variable, .. } => variable,
			Self::Numeric { variable, .. } => variable,
			Self::Fuzzy { variable, .. } => variable,
		}
	}
}

// Floats compare by their bits so that equality is reflexive and agrees with hashing. Negative zero is folded into zero.
fn float_key(value: f64) -> u64 {
	if value == 0.0 {
		0.0f64.to_bits()
	} else {
		value.to_bits()
	}
}

fn relation_key(relation: &Relation) -> (u8, u64) {
	match relation {
		Relation::Equal { alpha } => (0, float_key(*alpha)),
		Relation::LessOrEqual => (1, 0),
		Relation::Greater => (2, 0),
	}
}

impl PartialEq for Condition {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(
				Self::Nominal { variable, value },
				Self::Nominal {
					variable: other_variable,
					value: other_value,
				},
			) => variable == other_variable && value == other_value,
			(
				Self::Numeric {
					variable,
					threshold,
					relation,
				},
				Self::Numeric {
					variable: other_variable,
					threshold: other_threshold,
					relation: other_relation,
				},
			) => {
				variable == other_variable
					&& float_key(*threshold) == float_key(*other_threshold)
					&& relation_key(relation) == relation_key(other_relation)
			}
			(
				Self::Fuzzy {
					variable,
					label,
					set,
				},
				Self::Fuzzy {
					variable: other_variable,
					label: other_label,
					set: other_set,
				},
			) => {
				variable == other_variable
					&& label == other_label
					&& float_key(set.left) == float_key(other_set.left)
					&& float_key(set.center) == float_key(other_set.center)
					&& float_key(set.right) == float_key(other_set.right)
			}
			_ => false,
		}
	}
}

impl Eq for Condition {}

impl Hash for Condition {
	fn hash<H: Hasher>(&self, state: &mut H) {
		match self {
			Self::Nominal { variable, value } => {
				0u8.hash(state);
				variable.hash(state);
				value.hash(state);
			}
			Self::Numeric {
				variable,
				threshold,
				relation,
			} => {
				1u8.hash(state);
				variable.hash(state);
				float_key(*threshold).hash(state);
				relation_key(relation).hash(state);
			}
			Self::Fuzzy {
				variable,
				label,
				set,
			} => {
				2u8.hash(state);
				variable.hash(state);
				label.hash(state);
				float_key(set.left).hash(state);
				float_key(set.center).hash(state);
				float_key(set.right).hash(state);
			}
		}
	}
}

impl fmt::Display for Condition {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Nominal { variable, value } => write!(f, "{} = {}", variable, value),
			Self::Numeric {
				variable,
				threshold,
				relation,
			} => match relation {
				Relation::Equal { alpha } if *alpha == 0.0 => {
					write!(f, "{} = {}", variable, threshold)
				}
				Relation::Equal { alpha } => write!(f, "{} = {} ± {}", variable, threshold, alpha),
				Relation::LessOrEqual => write!(f, "{} <= {}", variable, threshold),
				Relation::Greater => write!(f, "{} > {}", variable, threshold),
			},
			Self::Fuzzy {
				variable, label, ..
			} => write!(f, "{} is {}", variable, label),
		}
	}
}

/**
Compute the probability of an item for each class from `n_covered_per_class`, the number of rows of each class the item covers, and `n_rows_per_class`, the number of rows of each class.

Both estimators give the probability of the item within the rows of class `c`. With the Laplace estimator it is `(covered_c + k) / (rows_c + |C| * k)`. With the M-estimate it is `(covered_c + n0 * covered / N) / (rows_c + n0)`.
*/
pub fn estimate_probabilities(
	n_covered_per_class: &[u64],
	n_rows_per_class: &[u64],
	estimator: Estimator,
) -> Vec<f64> {
	let n_classes = n_rows_per_class.len().to_f64().unwrap();
	let n_covered = n_covered_per_class.iter().sum::<u64>().to_f64().unwrap();
	let n_rows = n_rows_per_class.iter().sum::<u64>().to_f64().unwrap();
	n_covered_per_class
		.iter()
		.zip(n_rows_per_class.iter())
		.map(|(n_covered_in_class, n_rows_in_class)| {
			let n_covered_in_class = n_covered_in_class.to_f64().unwrap();
			let n_rows_in_class = n_rows_in_class.to_f64().unwrap();
			match estimator {
				Estimator::Laplace => {
					(n_covered_in_class + LAPLACE_K) / (n_rows_in_class + n_classes * LAPLACE_K)
				}
				Estimator::MEstimate => {
					let prior = if n_rows > 0.0 { n_covered / n_rows } else { 0.0 };
					(n_covered_in_class + M_ESTIMATE_N0 * prior) / (n_rows_in_class + M_ESTIMATE_N0)
				}
			}
		})
		.collect()
}

/// An `ItemTable` interns items, giving every distinct item a dense [`ItemId`](struct.ItemId.html).
#[derive(Clone, Debug, Default, serde::Serialize)]
pub struct ItemTable {
	items: Vec<Item>,
	#[serde(skip)]
	ids: FnvHashMap<Condition, ItemId>,
}

impl ItemTable {
	pub fn new() -> Self {
		Self::default()
	}

	/// Get the id of `item`, adding it to the table if it has not been seen before.
	pub fn intern(&mut self, item: Item) -> ItemId {
		if let Some(id) = self.ids.get(&item.condition) {
			return *id;
		}
		let id = ItemId(self.items.len());
		self.ids.insert(item.condition.clone(), id);
		self.items.push(item);
		id
	}

	pub fn lookup(&self, condition: &Condition) -> Option<ItemId> {
		self.ids.get(condition).copied()
	}

	pub fn get(&self, id: ItemId) -> &Item {
		&self.items[id.0]
	}

	pub fn len(&self) -> usize {
		self.items.len()
	}

	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = (ItemId, &Item)> {
		self.items
			.iter()
			.enumerate()
			.map(|(index, item)| (ItemId(index), item))
	}

	/**
	Does the item `id` cover some item of `transaction`?

	Interned nominal items cover exactly the items equal to them, so for them this is a lookup by id. Other items are checked against every item of the transaction.
	*/
	pub fn covers(&self, id: ItemId, transaction: &Transaction) -> bool {
		transaction.contains(id)
			|| (!self.get(id).is_nominal()
				&& transaction
					.items()
					.iter()
					.any(|other| self.item_covers(id, *other)))
	}

	/// Does the item `id` cover the item `other`? Ids unknown to this table are covered by nothing but themselves.
	pub fn item_covers(&self, id: ItemId, other: ItemId) -> bool {
		if id == other {
			return true;
		}
		let item = self.get(id);
		!item.is_nominal()
			&& self
				.items
				.get(other.0)
				.map(|other| item.covers(other))
				.unwrap_or(false)
	}

	/**
	Compute the class probabilities and the growth rate of every item from one pass over `dataset`.

	Fails with `Error::InvalidProbability` if an estimate falls outside [0, 1].
	*/
	pub fn calculate_probabilities(&mut self, dataset: &Dataset, estimator: Estimator) -> Result<()> {
		let n_classes = dataset.classes.len();
		let n_rows_per_class = dataset.class_counts();
		let mut n_covered = vec![vec![0u64; n_classes]; self.items.len()];
		let non_nominal: Vec<ItemId> = self
			.iter()
			.filter(|(_, item)| !item.is_nominal())
			.map(|(id, _)| id)
			.collect();
		for (transaction, label) in dataset.transactions.iter().zip(dataset.labels.iter()) {
			for id in transaction.items() {
				if self.get(*id).is_nominal() {
					n_covered[id.0][*label] += 1;
				}
			}
			for id in non_nominal.iter() {
				if self.covers(*id, transaction) {
					n_covered[id.0][*label] += 1;
				}
			}
		}
		for (index, n_covered_per_class) in n_covered.iter().enumerate() {
			let probabilities =
				estimate_probabilities(n_covered_per_class, &n_rows_per_class, estimator);
			for (class, probability) in probabilities.iter().enumerate() {
				if !(0.0..=1.0).contains(probability) {
					return Err(Error::InvalidProbability {
						item: self.items[index].to_string(),
						class,
						probability: *probability,
					});
				}
			}
			let n_covered_total: u64 = n_covered_per_class.iter().sum();
			let n_rows_total: u64 = n_rows_per_class.iter().sum();
			let growth_rate = (0..n_classes)
				.map(|class| {
					emerge_metrics::growth_rate(
						n_covered_per_class[class],
						n_rows_per_class[class],
						n_covered_total - n_covered_per_class[class],
						n_rows_total - n_rows_per_class[class],
					)
				})
				.fold(0.0, f64::max);
			let item = &mut self.items[index];
			item.probabilities_per_class = Some(probabilities);
			item.growth_rate = growth_rate;
		}
		Ok(())
	}
}

#[test]
fn test_item_equality_ignores_derived_values() {
	let a = Item::nominal("color", "red");
	let mut b = Item::nominal("color", "red");
	b.growth_rate = 3.0;
	b.probabilities_per_class = Some(vec![0.25, 0.75]);
	let mut c = Item::nominal("color", "red");
	c.growth_rate = f64::INFINITY;
	assert_eq!(a, a);
	assert_eq!(a, b);
	assert_eq!(b, a);
	assert_eq!(b, c);
	assert_eq!(a, c);
	assert_ne!(a, Item::nominal("color", "blue"));
	assert_ne!(a, Item::nominal("shade", "red"));
	let mut table = ItemTable::new();
	let id = table.intern(a);
	assert_eq!(table.intern(b), id);
	assert_eq!(table.intern(c), id);
	assert_eq!(table.len(), 1);
}

#[test]
fn test_numeric_items() {
	let value = Item::numeric("age", 30.0, Relation::Equal { alpha: 0.0 });
	let exact = Item::numeric("age", 30.0, Relation::Equal { alpha: 0.0 });
	let near = Item::numeric("age", 32.0, Relation::Equal { alpha: 2.5 });
	let at_most = Item::numeric("age", 30.0, Relation::LessOrEqual);
	let above = Item::numeric("age", 30.0, Relation::Greater);
	assert!(exact.covers(&value));
	assert!(near.covers(&value));
	assert!(at_most.covers(&value));
	assert!(!above.covers(&value));
	assert!(!Item::numeric("height", 30.0, Relation::LessOrEqual).covers(&value));
	assert_ne!(exact, near);
	assert_ne!(at_most, above);
	assert_eq!(
		Item::numeric("age", 0.0, Relation::LessOrEqual),
		Item::numeric("age", -0.0, Relation::LessOrEqual)
	);
}

#[test]
fn test_fuzzy_items() {
	let set = TriangularFuzzySet {
		left: 0.0,
		center: 5.0,
		right: 10.0,
	};
	assert_eq!(set.membership(5.0), 1.0);
	assert_eq!(set.membership(2.5), 0.5);
	assert_eq!(set.membership(7.5), 0.5);
	assert_eq!(set.membership(0.0), 0.0);
	assert_eq!(set.membership(11.0), 0.0);
	let medium = Item::fuzzy("weight", "medium", set);
	assert!(medium.covers(&Item::numeric("weight", 9.0, Relation::Equal { alpha: 0.0 })));
	assert!(!medium.covers(&Item::numeric("weight", 10.0, Relation::Equal { alpha: 0.0 })));
	assert!(medium.covers(&medium.clone()));
	assert!(!medium.covers(&Item::nominal("weight", "medium")));
	assert_eq!(medium.to_string(), "weight is medium");
}

#[test]
fn test_estimate_probabilities() {
	// The item covers 3 of 4 rows of class 0 and 1 of 6 rows of class 1.
	let laplace = estimate_probabilities(&[3, 1], &[4, 6], Estimator::Laplace);
	assert!((laplace[0] - 4.0 / 6.0).abs() < 1e-12);
	assert!((laplace[1] - 2.0 / 8.0).abs() < 1e-12);
	let m_estimate = estimate_probabilities(&[3, 1], &[4, 6], Estimator::MEstimate);
	assert!((m_estimate[0] - (3.0 + 5.0 * 0.4) / 9.0).abs() < 1e-12);
	assert!((m_estimate[1] - (1.0 + 5.0 * 0.4) / 11.0).abs() < 1e-12);
}

#[test]
fn test_laplace_is_conditioned_on_the_class() {
	// The item is in the only row of class 0 and in 1 of 99 rows of class 1.
	let laplace = estimate_probabilities(&[1, 1], &[1, 99], Estimator::Laplace);
	assert!((laplace[0] - 2.0 / 3.0).abs() < 1e-12);
	assert!((laplace[1] - 2.0 / 101.0).abs() < 1e-12);
	assert!(laplace[0] > 30.0 * laplace[1]);
	// An item never seen still gets a nonzero probability in every class.
	let unseen = estimate_probabilities(&[0, 0], &[1, 99], Estimator::Laplace);
	assert!((unseen[0] - 1.0 / 3.0).abs() < 1e-12);
	assert!((unseen[1] - 1.0 / 101.0).abs() < 1e-12);
}

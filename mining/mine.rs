use crate::{
	bsc_tree::BscTree,
	cp_tree::{ClassCounts, CpTree},
	dataset::Dataset,
	error::{Error, Result},
	item::ItemId,
	pattern::Pattern,
	ranking::Ranking,
	Miner, TrainOptions,
};
use num_traits::ToPrimitive;

/**
Mine the minimal patterns of `dataset` that contrast `class` against the other classes.

A pattern is accepted when its count in `class` reaches the minimum count, `ceil(minimum_support * n_rows)` but at least 1, and its growth rate reaches `minimum_growth_rate`. Accepted patterns are not extended, and patterns with an accepted proper subset are dropped at the end. Patterns are returned in the order they were found.
*/
pub fn mine(dataset: &Dataset, class: usize, options: &TrainOptions) -> Result<Vec<Pattern>> {
	validate_options(dataset, class, options)?;
	let context = MiningContext::new(dataset, class, options);
	if context.n_positive == 0 {
		return Ok(Vec::new());
	}
	let rows = covered_items(dataset);
	let mut counts = vec![ClassCounts::default(); dataset.items.len()];
	for (row, is_positive) in rows.iter().zip(context.is_positive.iter()) {
		for id in row.iter() {
			counts[id.0] += ClassCounts::of_row(*is_positive);
		}
	}
	let ranking = Ranking::for_target(
		&dataset.items,
		&counts,
		context.n_positive,
		context.n_negative,
		context.min_count,
		options.ordering,
	);
	let patterns = match options.miner {
		Miner::CpTree => mine_cp_tree(&context, &rows, &ranking),
		Miner::BscTree => mine_bsc_tree(&context, &rows, &ranking),
	};
	Ok(retain_minimal(patterns))
}

fn validate_options(dataset: &Dataset, class: usize, options: &TrainOptions) -> Result<()> {
	if class >= dataset.classes.len() {
		return Err(Error::InvalidConfig(format!(
			"class {} is out of range for {} classes",
			class,
			dataset.classes.len()
		)));
	}
	options.validate()
}

/// The thresholds and class sizes shared by the steps of one mining call.
struct MiningContext {
	class: usize,
	/// Whether each row belongs to the target class.
	is_positive: Vec<bool>,
	n_rows: u64,
	n_positive: u64,
	n_negative: u64,
	min_count: u64,
	minimum_growth_rate: f64,
	max_length: Option<usize>,
}

impl MiningContext {
	fn new(dataset: &Dataset, class: usize, options: &TrainOptions) -> Self {
		let n_rows = dataset.nrows().to_u64().unwrap();
		let n_positive = dataset.class_counts()[class];
		// Subtract a little before rounding up so that a product like 0.2 * 10 is not rounded to 3.
		let min_count = (options.minimum_support * n_rows.to_f64().unwrap() - 1e-9)
			.ceil()
			.to_u64()
			.unwrap_or(0)
			.max(1);
		Self {
			class,
			is_positive: dataset.labels.iter().map(|label| *label == class).collect(),
			n_rows,
			n_positive,
			n_negative: n_rows - n_positive,
			min_count,
			minimum_growth_rate: options.minimum_growth_rate,
			max_length: options.max_length,
		}
	}

	fn growth_rate(&self, counts: ClassCounts) -> f64 {
		emerge_metrics::growth_rate(counts.d1, self.n_positive, counts.d2, self.n_negative)
	}

	fn is_iep(&self, counts: ClassCounts) -> bool {
		counts.d1 >= self.min_count && self.growth_rate(counts) >= self.minimum_growth_rate
	}

	fn can_extend(&self, len: usize) -> bool {
		self.max_length.map(|max_length| len < max_length).unwrap_or(true)
	}

	fn pattern(&self, items: Vec<ItemId>, counts: ClassCounts) -> Pattern {
		let mut pattern = Pattern::new(items, self.class);
		pattern.support = counts.d1.to_f64().unwrap() / self.n_rows.to_f64().unwrap();
		pattern.growth_rate = self.growth_rate(counts);
		pattern.strength = emerge_metrics::strength(pattern.growth_rate, pattern.support);
		pattern
	}
}

/// The ids of the items covering each row. For interned nominal items these are the row's own items.
fn covered_items(dataset: &Dataset) -> Vec<Vec<ItemId>> {
	let non_nominal: Vec<ItemId> = dataset
		.items
		.iter()
		.filter(|(_, item)| !item.is_nominal())
		.map(|(id, _)| id)
		.collect();
	dataset
		.transactions
		.iter()
		.map(|transaction| {
			let mut ids = transaction.items().to_vec();
			ids.extend(
				non_nominal
					.iter()
					.filter(|id| {
						!transaction.contains(**id) && dataset.items.covers(**id, transaction)
					})
					.copied(),
			);
			ids
		})
		.collect()
}

/**
Mine with a contrast pattern tree. The header table of each tree is walked from its lowest ranked item upward. An item frequent enough in the target class forms a candidate with the suffix the tree was conditioned on. A candidate that is not accepted is extended by mining its conditional tree, which is pushed on a stack instead of recursing.
*/
fn mine_cp_tree(context: &MiningContext, rows: &[Vec<ItemId>], ranking: &Ranking) -> Vec<Pattern> {
	let mut tree = CpTree::new();
	for (row, is_positive) in rows.iter().zip(context.is_positive.iter().copied()) {
		let mut ranks: Vec<usize> = row.iter().filter_map(|id| ranking.rank(*id)).collect();
		ranks.sort_unstable();
		let path: Vec<(usize, ItemId)> = ranks
			.into_iter()
			.map(|rank| (rank, ranking.item(rank)))
			.collect();
		tree.insert(&path, ClassCounts::of_row(is_positive));
	}
	let mut patterns = Vec::new();
	let mut stack: Vec<(CpTree, Vec<ItemId>)> = vec![(tree, Vec::new())];
	while let Some((tree, suffix)) = stack.pop() {
		for entry in tree.header().rev() {
			if entry.counts.d1 < context.min_count {
				continue;
			}
			let mut items = Vec::with_capacity(suffix.len() + 1);
			items.push(entry.item);
			items.extend(suffix.iter().copied());
			if context.is_iep(entry.counts) {
				patterns.push(context.pattern(items, entry.counts));
				continue;
			}
			if !context.can_extend(items.len()) {
				continue;
			}
			let conditional = tree.conditional_tree(entry.rank, context.min_count);
			if !conditional.is_empty() {
				stack.push((conditional, items));
			}
		}
	}
	patterns
}

struct BscNode {
	items: Vec<ItemId>,
	last_rank: usize,
	positive: BscTree,
	negative: BscTree,
}

/**
Mine by searching the ranked items depth first. Each item has a tree of the target class rows containing it and a tree of the other rows containing it, and the counts of a candidate are the counts of the intersections of its items' trees.

An extension is pruned if it is not frequent enough in the target class or if it does not lower the count in the other classes, since then dropping the new item gives an accepted subset. For the same reason an item occurring in every row of the other classes is only tried on its own.
*/
fn mine_bsc_tree(context: &MiningContext, rows: &[Vec<ItemId>], ranking: &Ranking) -> Vec<Pattern> {
	let mut positive_positions = vec![Vec::new(); ranking.len()];
	let mut negative_positions = vec![Vec::new(); ranking.len()];
	let (mut n_positive, mut n_negative) = (0, 0);
	for (row, is_positive) in rows.iter().zip(context.is_positive.iter().copied()) {
		for rank in row.iter().filter_map(|id| ranking.rank(*id)) {
			if is_positive {
				positive_positions[rank].push(n_positive);
			} else {
				negative_positions[rank].push(n_negative);
			}
		}
		if is_positive {
			n_positive += 1;
		} else {
			n_negative += 1;
		}
	}
	let positive_trees: Vec<BscTree> = positive_positions
		.into_iter()
		.map(|positions| BscTree::from_positions(n_positive, positions))
		.collect();
	let negative_trees: Vec<BscTree> = negative_positions
		.into_iter()
		.map(|positions| BscTree::from_positions(n_negative, positions))
		.collect();

	let mut patterns = Vec::new();
	let mut stack = Vec::new();
	for rank in (0..ranking.len()).rev() {
		let positive = &positive_trees[rank];
		let negative = &negative_trees[rank];
		let counts = ClassCounts::new(positive.count(), negative.count());
		if counts.d1 < context.min_count {
			continue;
		}
		let items = vec![ranking.item(rank)];
		if context.is_iep(counts) {
			patterns.push(context.pattern(items, counts));
		} else if counts.d2 < context.n_negative && context.can_extend(1) {
			stack.push(BscNode {
				items,
				last_rank: rank,
				positive: positive.clone(),
				negative: negative.clone(),
			});
		}
	}
	while let Some(node) = stack.pop() {
		let n_negative_covered = node.negative.count();
		let mut children = Vec::new();
		for rank in node.last_rank + 1..ranking.len() {
			let positive = node.positive.and(&positive_trees[rank]);
			let d1 = positive.count();
			if d1 < context.min_count {
				continue;
			}
			let negative = node.negative.and(&negative_trees[rank]);
			let d2 = negative.count();
			if d2 == n_negative_covered {
				continue;
			}
			let mut items = node.items.clone();
			items.push(ranking.item(rank));
			let counts = ClassCounts::new(d1, d2);
			if context.is_iep(counts) {
				patterns.push(context.pattern(items, counts));
			} else if context.can_extend(items.len()) {
				children.push(BscNode {
					items,
					last_rank: rank,
					positive,
					negative,
				});
			}
		}
		stack.extend(children.into_iter().rev());
	}
	patterns
}

/// Drop every pattern that has a proper subset among `patterns`, keeping the order of the rest.
fn retain_minimal(patterns: Vec<Pattern>) -> Vec<Pattern> {
	let keep: Vec<bool> = patterns
		.iter()
		.map(|pattern| {
			!patterns
				.iter()
				.any(|other| other.len() < pattern.len() && other.is_subset_of(pattern))
		})
		.collect();
	patterns
		.into_iter()
		.zip(keep)
		.filter(|(_, keep)| *keep)
		.map(|(pattern, _)| pattern)
		.collect()
}

#[cfg(test)]
fn random_dataset(seed: u64) -> Dataset {
	use rand::{Rng, SeedableRng};
	use rand_xoshiro::Xoshiro256Plus;
	let mut rng = Xoshiro256Plus::seed_from_u64(seed);
	let values = ["a", "b", "c"];
	let classes = ["x", "y", "z"];
	let rows: Vec<Vec<&str>> = (0..40)
		.map(|_| {
			let class = rng.gen_range(0..3);
			let mut row: Vec<&str> = (0..4)
				.map(|variable| {
					// The first two variables lean toward the class.
					if variable < 2 && rng.gen_bool(0.6) {
						values[class]
					} else if rng.gen_bool(0.1) {
						"?"
					} else {
						values[rng.gen_range(0..3)]
					}
				})
				.collect();
			row.push(classes[class]);
			row
		})
		.collect();
	let rows: Vec<&[&str]> = rows.iter().map(|row| row.as_slice()).collect();
	Dataset::from_nominal_rows(&["p", "q", "r", "s"], &rows).unwrap()
}

/// A dataset of two number columns and one enum column where every numeric item covers values within 1 of it.
#[cfg(test)]
fn numeric_dataset(seed: u64) -> Dataset {
	use emerge_dataframe::{Column, ColumnType, DataFrame};
	use rand::{Rng, SeedableRng};
	use rand_xoshiro::Xoshiro256Plus;
	use std::num::NonZeroUsize;
	let mut rng = Xoshiro256Plus::seed_from_u64(seed);
	let mut dataframe = DataFrame::new(
		vec!["u".to_owned(), "v".to_owned(), "w".to_owned(), "class".to_owned()],
		vec![
			ColumnType::Number,
			ColumnType::Number,
			ColumnType::Enum {
				options: vec!["a".to_owned(), "b".to_owned()],
			},
			ColumnType::Enum {
				options: vec!["x".to_owned(), "y".to_owned()],
			},
		],
	);
	for _ in 0..30 {
		let class = rng.gen_range(0..2);
		// u leans low for x and high for y.
		let u = if rng.gen_bool(0.7) {
			(class * 3 + rng.gen_range(0..2)) as f32
		} else {
			rng.gen_range(0..5) as f32
		};
		let v = rng.gen_range(0..4) as f32;
		let w = NonZeroUsize::new(rng.gen_range(1..3));
		let class = NonZeroUsize::new(class + 1);
		if let Column::Number(column) = &mut dataframe.columns[0] {
			column.data.push(u);
		}
		if let Column::Number(column) = &mut dataframe.columns[1] {
			column.data.push(v);
		}
		if let Column::Enum(column) = &mut dataframe.columns[2] {
			column.data.push(w);
		}
		if let Column::Enum(column) = &mut dataframe.columns[3] {
			column.data.push(class);
		}
	}
	let options = crate::DatasetOptions {
		numeric_alpha: Some(1.0),
		..Default::default()
	};
	Dataset::from_dataframe(&dataframe, "class", &options).unwrap()
}

/// Find the minimal accepted patterns by trying every itemset.
#[cfg(test)]
fn brute_force(dataset: &Dataset, class: usize, options: &TrainOptions) -> Vec<Vec<ItemId>> {
	let context = MiningContext::new(dataset, class, options);
	let n_items = dataset.items.len();
	let mut accepted: Vec<Vec<ItemId>> = Vec::new();
	for mask in 1u64..(1 << n_items) {
		let items: Vec<ItemId> = (0..n_items)
			.filter(|index| mask & (1 << index) != 0)
			.map(ItemId)
			.collect();
		if !context.can_extend(items.len() - 1) {
			continue;
		}
		let measures = Pattern::new(items.clone(), class).calculate_measures(dataset);
		let counts = ClassCounts::new(measures.true_positives, measures.false_positives);
		if context.is_iep(counts) {
			accepted.push(items);
		}
	}
	let minimal: Vec<Vec<ItemId>> = accepted
		.iter()
		.filter(|items| {
			!accepted.iter().any(|other| {
				other.len() < items.len() && other.iter().all(|item| items.contains(item))
			})
		})
		.cloned()
		.collect();
	sorted(minimal)
}

#[cfg(test)]
fn sorted(mut patterns: Vec<Vec<ItemId>>) -> Vec<Vec<ItemId>> {
	for items in patterns.iter_mut() {
		items.sort_unstable();
	}
	patterns.sort();
	patterns
}

#[test]
fn test_single_perfect_attribute() {
	let rows: Vec<[&str; 2]> = (0..10)
		.map(|index| {
			if index % 2 == 0 {
				["yes", "positive"]
			} else {
				["no", "negative"]
			}
		})
		.collect();
	let rows: Vec<&[&str]> = rows.iter().map(|row| &row[..]).collect();
	let dataset = Dataset::from_nominal_rows(&["flag"], &rows).unwrap();
	let positive = dataset.classes.iter().position(|class| class == "positive").unwrap();
	for miner in [Miner::CpTree, Miner::BscTree].iter() {
		let options = TrainOptions {
			minimum_support: 0.2,
			minimum_growth_rate: 1.0,
			miner: *miner,
			..Default::default()
		};
		let patterns = mine(&dataset, positive, &options).unwrap();
		assert_eq!(patterns.len(), 1);
		let pattern = &patterns[0];
		assert_eq!(pattern.display(&dataset.items).to_string(), "{flag = yes}");
		assert_eq!(pattern.growth_rate, f64::INFINITY);
		assert!((pattern.support - 0.5).abs() < 1e-12);
		let selected = crate::prune::prune(&dataset, &patterns);
		assert_eq!(selected.len(), 1);
		let n_covered = dataset
			.transactions_of_class(positive)
			.into_iter()
			.filter(|transaction| selected[0].covers(&dataset.items, transaction))
			.count();
		assert_eq!(n_covered, 5);
	}
}

#[test]
fn test_miners_find_all_minimal_patterns() {
	for seed in 0..4 {
		let dataset = random_dataset(seed);
		for (minimum_support, minimum_growth_rate, max_length) in [
			(0.05, f64::INFINITY, None),
			(0.1, 2.0, None),
			(0.025, 3.0, Some(2)),
		]
		.iter()
		{
			for class in 0..dataset.classes.len() {
				let options = TrainOptions {
					minimum_support: *minimum_support,
					minimum_growth_rate: *minimum_growth_rate,
					max_length: *max_length,
					..Default::default()
				};
				let expected = brute_force(&dataset, class, &options);
				for ordering in [
					crate::ItemOrdering::SupportRatio,
					crate::ItemOrdering::Lexicographic,
				]
				.iter()
				{
					for miner in [Miner::CpTree, Miner::BscTree].iter() {
						let options = TrainOptions {
							miner: *miner,
							ordering: *ordering,
							..options.clone()
						};
						let patterns = mine(&dataset, class, &options).unwrap();
						let found = sorted(patterns.iter().map(|p| p.items().to_vec()).collect());
						assert_eq!(found, expected, "{:?} {:?}", miner, options);
						for pattern in patterns.iter() {
							let measures = pattern.calculate_measures(&dataset);
							assert_eq!(pattern.growth_rate, measures.growth_rate);
							assert!((pattern.support - measures.support).abs() < 1e-12);
						}
					}
				}
			}
		}
	}
}

#[test]
fn test_miners_find_all_minimal_numeric_patterns() {
	for seed in 0..2 {
		let dataset = numeric_dataset(seed);
		assert!(dataset.items.len() <= 11);
		for (minimum_support, minimum_growth_rate) in [(0.1, f64::INFINITY), (0.15, 2.0)].iter() {
			for class in 0..dataset.classes.len() {
				let options = TrainOptions {
					minimum_support: *minimum_support,
					minimum_growth_rate: *minimum_growth_rate,
					..Default::default()
				};
				let expected = brute_force(&dataset, class, &options);
				for miner in [Miner::CpTree, Miner::BscTree].iter() {
					let options = TrainOptions {
						miner: *miner,
						..options.clone()
					};
					let patterns = mine(&dataset, class, &options).unwrap();
					let found = sorted(patterns.iter().map(|p| p.items().to_vec()).collect());
					assert_eq!(found, expected, "{:?} {:?}", miner, options);
				}
			}
		}
	}
}

#[test]
fn test_covered_items_include_tolerant_items() {
	let dataset = numeric_dataset(0);
	let rows = covered_items(&dataset);
	for (row, transaction) in rows.iter().zip(dataset.transactions.iter()) {
		for id in transaction.items() {
			assert!(row.contains(id));
		}
		for (id, _) in dataset.items.iter() {
			assert_eq!(row.contains(&id), dataset.items.covers(id, transaction));
		}
	}
	// A value of u is covered by the items for its neighbors too.
	assert!(rows
		.iter()
		.zip(dataset.transactions.iter())
		.any(|(row, transaction)| row.len() > transaction.len()));
}

#[test]
fn test_invalid_options() {
	let dataset = random_dataset(0);
	let invalid = [
		TrainOptions {
			minimum_support: 1.5,
			..Default::default()
		},
		TrainOptions {
			minimum_growth_rate: -1.0,
			..Default::default()
		},
		TrainOptions {
			minimum_growth_rate: f64::NAN,
			..Default::default()
		},
		TrainOptions {
			max_length: Some(0),
			..Default::default()
		},
	];
	for options in invalid.iter() {
		assert!(matches!(
			mine(&dataset, 0, options),
			Err(Error::InvalidConfig(_))
		));
	}
	assert!(matches!(
		mine(&dataset, 3, &TrainOptions::default()),
		Err(Error::InvalidConfig(_))
	));
}

use crate::{
	cp_tree::ClassCounts,
	dataset::Transaction,
	item::{ItemId, ItemTable},
	ItemOrdering,
};
use std::cmp::Ordering;

/// A `RankingKey` is computed once per item at the start of a mining call. Sorting the keys ascending puts the highest ranked item first.
#[derive(Clone, Debug, PartialEq)]
pub enum RankingKey {
	/// Order by descending growth rate toward the target class, then by name.
	Ratio { growth_rate: f64, name: String },
	/// Order by name.
	Nominal { name: String },
}

impl RankingKey {
	pub fn new(ordering: ItemOrdering, growth_rate: f64, name: String) -> Self {
		match ordering {
			ItemOrdering::SupportRatio => Self::Ratio { growth_rate, name },
			ItemOrdering::Lexicographic => Self::Nominal { name },
		}
	}

	fn name(&self) -> &str {
		match self {
			Self::Ratio { name, .. } => name,
			Self::Nominal { name } => name,
		}
	}

	pub fn compare(&self, other: &Self) -> Ordering {
		match (self, other) {
			(
				Self::Ratio { growth_rate, name },
				Self::Ratio {
					growth_rate: other_growth_rate,
					name: other_name,
				},
			) => other_growth_rate
				.total_cmp(growth_rate)
				.then_with(|| name.cmp(other_name)),
			_ => self.name().cmp(other.name()),
		}
	}
}

/// A `Ranking` assigns each item admitted to a mining call a distinct rank, 0 being the highest. Items without a rank take no part in mining.
#[derive(Clone, Debug)]
pub struct Ranking {
	ranks: Vec<Option<usize>>,
	order: Vec<ItemId>,
}

impl Ranking {
	/// Rank the items of `keys`. Equal keys are ordered by item id so that the ranking is deterministic.
	pub fn new(n_items: usize, mut keys: Vec<(ItemId, RankingKey)>) -> Self {
		keys.sort_by(|(a_id, a), (b_id, b)| a.compare(b).then_with(|| a_id.cmp(b_id)));
		let mut ranks = vec![None; n_items];
		let order: Vec<ItemId> = keys.into_iter().map(|(id, _)| id).collect();
		for (rank, id) in order.iter().enumerate() {
			ranks[id.0] = Some(rank);
		}
		Self { ranks, order }
	}

	/**
	Rank the items whose count in the target class reaches `min_count`. `counts` holds the class counts of every item in `items`, and `n_positive` and `n_negative` are the number of rows in and out of the target class.
	*/
	pub fn for_target(
		items: &ItemTable,
		counts: &[ClassCounts],
		n_positive: u64,
		n_negative: u64,
		min_count: u64,
		ordering: ItemOrdering,
	) -> Self {
		let keys = items
			.iter()
			.filter(|(id, _)| counts[id.0].d1 >= min_count)
			.map(|(id, item)| {
				let growth_rate = emerge_metrics::growth_rate(
					counts[id.0].d1,
					n_positive,
					counts[id.0].d2,
					n_negative,
				);
				(id, RankingKey::new(ordering, growth_rate, item.to_string()))
			})
			.collect();
		Self::new(items.len(), keys)
	}

	pub fn rank(&self, id: ItemId) -> Option<usize> {
		self.ranks.get(id.0).copied().flatten()
	}

	pub fn item(&self, rank: usize) -> ItemId {
		self.order[rank]
	}

	/// The number of ranked items.
	pub fn len(&self) -> usize {
		self.order.len()
	}

	pub fn is_empty(&self) -> bool {
		self.order.is_empty()
	}

	/// The ranks of the ranked items of `transaction`, highest ranked first.
	pub fn rank_transaction(&self, transaction: &Transaction) -> Vec<usize> {
		let mut ranks: Vec<usize> = transaction
			.items()
			.iter()
			.filter_map(|id| self.rank(*id))
			.collect();
		ranks.sort_unstable();
		ranks
	}
}

#[test]
fn test_ratio_ranking() {
	let key = |growth_rate: f64, name: &str| RankingKey::new(ItemOrdering::SupportRatio, growth_rate, name.to_owned());
	let ranking = Ranking::new(
		4,
		vec![
			(ItemId(0), key(2.0, "b")),
			(ItemId(1), key(f64::INFINITY, "z")),
			(ItemId(2), key(2.0, "a")),
			(ItemId(3), key(0.5, "a")),
		],
	);
	assert_eq!(ranking.rank(ItemId(1)), Some(0));
	assert_eq!(ranking.rank(ItemId(2)), Some(1));
	assert_eq!(ranking.rank(ItemId(0)), Some(2));
	assert_eq!(ranking.rank(ItemId(3)), Some(3));
	assert_eq!(ranking.item(0), ItemId(1));
	let transaction = Transaction::new(vec![ItemId(3), ItemId(0), ItemId(1)]);
	assert_eq!(ranking.rank_transaction(&transaction), vec![0, 2, 3]);
}

#[test]
fn test_lexicographic_ranking() {
	let key = |name: &str| RankingKey::new(ItemOrdering::Lexicographic, 1.0, name.to_owned());
	let ranking = Ranking::new(
		5,
		vec![(ItemId(0), key("c")), (ItemId(4), key("a")), (ItemId(2), key("b"))],
	);
	assert_eq!(ranking.len(), 3);
	assert_eq!(ranking.rank(ItemId(4)), Some(0));
	assert_eq!(ranking.rank(ItemId(2)), Some(1));
	assert_eq!(ranking.rank(ItemId(0)), Some(2));
	assert_eq!(ranking.rank(ItemId(1)), None);
	assert_eq!(ranking.rank(ItemId(9)), None);
}

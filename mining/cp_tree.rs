use crate::item::ItemId;
use std::{
	collections::{btree_map, BTreeMap},
	ops::AddAssign,
};

/// The number of rows of the target class (`d1`) and of the other classes (`d2`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClassCounts {
	pub d1: u64,
	pub d2: u64,
}

impl ClassCounts {
	pub fn new(d1: u64, d2: u64) -> Self {
		Self { d1, d2 }
	}

	/// The counts of a single row.
	pub fn of_row(is_positive: bool) -> Self {
		if is_positive {
			Self::new(1, 0)
		} else {
			Self::new(0, 1)
		}
	}
}

impl AddAssign for ClassCounts {
	fn add_assign(&mut self, other: Self) {
		self.d1 += other.d1;
		self.d2 += other.d2;
	}
}

#[derive(Clone, Debug)]
struct Node {
	/// This is `None` only for the root.
	item: Option<ItemId>,
	rank: usize,
	counts: ClassCounts,
	parent: Option<usize>,
	/// Indexes of the children, sorted by rank.
	children: Vec<usize>,
}

/// A `HeaderEntry` holds the total counts of one item in a tree and the chain of nodes carrying it.
#[derive(Clone, Debug)]
pub struct HeaderEntry {
	pub item: ItemId,
	pub rank: usize,
	pub counts: ClassCounts,
	/// Indexes of the nodes for this item, in order of creation.
	pub nodes: Vec<usize>,
}

/**
A `CpTree` is a contrast pattern tree. It is a prefix tree of rows whose items are sorted by rank, where every node counts the rows of each class passing through it. The header table indexes the tree by item.

Nodes live in an arena and refer to each other by index. A tree is owned by one mining call.
*/
#[derive(Clone, Debug)]
pub struct CpTree {
	nodes: Vec<Node>,
	header: BTreeMap<usize, HeaderEntry>,
}

impl Default for CpTree {
	fn default() -> Self {
		Self::new()
	}
}

impl CpTree {
	pub fn new() -> Self {
		let root = Node {
			item: None,
			rank: 0,
			counts: ClassCounts::default(),
			parent: None,
			children: Vec::new(),
		};
		Self {
			nodes: vec![root],
			header: BTreeMap::new(),
		}
	}

	/**
	Insert a path with weight `counts`. `path` holds (rank, item) pairs sorted by rank, highest ranked first.

	Shared prefixes reuse existing nodes. A new node is added to its parent's children in rank order and appended to its item's chain in the header table.
	*/
	pub fn insert(&mut self, path: &[(usize, ItemId)], counts: ClassCounts) {
		self.nodes[0].counts += counts;
		let mut current = 0;
		for (rank, item) in path.iter().copied() {
			let search = self.nodes[current]
				.children
				.binary_search_by_key(&rank, |child| self.nodes[*child].rank);
			let (child, is_new) = match search {
				Ok(position) => (self.nodes[current].children[position], false),
				Err(position) => {
					let child = self.nodes.len();
					self.nodes.push(Node {
						item: Some(item),
						rank,
						counts: ClassCounts::default(),
						parent: Some(current),
						children: Vec::new(),
					});
					self.nodes[current].children.insert(position, child);
					(child, true)
				}
			};
			self.nodes[child].counts += counts;
			let entry = match self.header.entry(rank) {
				btree_map::Entry::Occupied(entry) => entry.into_mut(),
				btree_map::Entry::Vacant(entry) => entry.insert(HeaderEntry {
					item,
					rank,
					counts: ClassCounts::default(),
					nodes: Vec::new(),
				}),
			};
			entry.counts += counts;
			if is_new {
				entry.nodes.push(child);
			}
			current = child;
		}
	}

	/// The header table entries, highest ranked first.
	pub fn header(&self) -> impl DoubleEndedIterator<Item = &HeaderEntry> {
		self.header.values()
	}

	pub fn header_entry(&self, rank: usize) -> Option<&HeaderEntry> {
		self.header.get(&rank)
	}

	/// The counts of all rows inserted into the tree.
	pub fn counts(&self) -> ClassCounts {
		self.nodes[0].counts
	}

	/// The number of nodes, not counting the root.
	pub fn n_nodes(&self) -> usize {
		self.nodes.len() - 1
	}

	pub fn is_empty(&self) -> bool {
		self.header.is_empty()
	}

	/// The items on the path from the root down to the parent of `node`.
	fn prefix_path(&self, node: usize) -> Vec<(usize, ItemId)> {
		let mut path = Vec::new();
		let mut current = self.nodes[node].parent;
		while let Some(index) = current {
			let node = &self.nodes[index];
			if let Some(item) = node.item {
				path.push((node.rank, item));
			}
			current = node.parent;
		}
		path.reverse();
		path
	}

	/**
	Build the conditional tree of the item ranked `rank`. Its rows are the prefix paths of the nodes in the item's chain, each weighted by that node's counts. Items whose total target class count in these paths is below `min_count` are left out.
	*/
	pub fn conditional_tree(&self, rank: usize, min_count: u64) -> CpTree {
		let mut tree = CpTree::new();
		let entry = match self.header.get(&rank) {
			Some(entry) => entry,
			None => return tree,
		};
		let paths: Vec<(Vec<(usize, ItemId)>, ClassCounts)> = entry
			.nodes
			.iter()
			.map(|node| (self.prefix_path(*node), self.nodes[*node].counts))
			.collect();
		let mut d1_counts: BTreeMap<usize, u64> = BTreeMap::new();
		for (path, counts) in paths.iter() {
			for (rank, _) in path.iter() {
				*d1_counts.entry(*rank).or_insert(0) += counts.d1;
			}
		}
		for (path, counts) in paths.iter() {
			let path: Vec<(usize, ItemId)> = path
				.iter()
				.copied()
				.filter(|(rank, _)| d1_counts[rank] >= min_count)
				.collect();
			tree.insert(&path, *counts);
		}
		tree
	}
}

#[test]
fn test_insert() {
	let a = (0, ItemId(10));
	let b = (1, ItemId(11));
	let c = (2, ItemId(12));
	let mut tree = CpTree::new();
	tree.insert(&[a, b, c], ClassCounts::new(1, 0));
	tree.insert(&[a, c], ClassCounts::new(0, 1));
	tree.insert(&[a, b], ClassCounts::new(1, 0));
	tree.insert(&[b], ClassCounts::new(0, 1));
	// a, a-b, a-b-c, a-c, b
	assert_eq!(tree.n_nodes(), 5);
	assert_eq!(tree.counts(), ClassCounts::new(2, 2));
	let header: Vec<(ItemId, ClassCounts, usize)> = tree
		.header()
		.map(|entry| (entry.item, entry.counts, entry.nodes.len()))
		.collect();
	assert_eq!(
		header,
		vec![
			(ItemId(10), ClassCounts::new(2, 1), 1),
			(ItemId(11), ClassCounts::new(2, 1), 2),
			(ItemId(12), ClassCounts::new(1, 1), 2),
		]
	);
	// The children of the root stay sorted by rank when a lower ranked child is created first.
	let mut tree = CpTree::new();
	tree.insert(&[c], ClassCounts::new(1, 0));
	tree.insert(&[a], ClassCounts::new(1, 0));
	tree.insert(&[b], ClassCounts::new(1, 0));
	let ranks: Vec<usize> = tree.nodes[0]
		.children
		.iter()
		.map(|child| tree.nodes[*child].rank)
		.collect();
	assert_eq!(ranks, vec![0, 1, 2]);
}

#[test]
fn test_conditional_tree() {
	let a = (0, ItemId(0));
	let b = (1, ItemId(1));
	let c = (2, ItemId(2));
	let mut tree = CpTree::new();
	tree.insert(&[a, b, c], ClassCounts::new(2, 0));
	tree.insert(&[b, c], ClassCounts::new(1, 3));
	tree.insert(&[a, c], ClassCounts::new(0, 1));
	let conditional = tree.conditional_tree(2, 1);
	assert_eq!(conditional.counts(), ClassCounts::new(3, 4));
	let header: Vec<(ItemId, ClassCounts)> = conditional
		.header()
		.map(|entry| (entry.item, entry.counts))
		.collect();
	assert_eq!(
		header,
		vec![
			(ItemId(0), ClassCounts::new(2, 1)),
			(ItemId(1), ClassCounts::new(3, 3)),
		]
	);
	// With a minimum count of 3, only b is frequent enough in the prefix paths of c.
	let conditional = tree.conditional_tree(2, 3);
	let items: Vec<ItemId> = conditional.header().map(|entry| entry.item).collect();
	assert_eq!(items, vec![ItemId(1)]);
	assert!(tree.conditional_tree(0, 1).is_empty());
	assert!(tree.conditional_tree(7, 1).is_empty());
}

#[test]
fn test_header_counts_match_direct_counts() {
	use rand::{seq::SliceRandom, Rng, SeedableRng};
	use rand_xoshiro::Xoshiro256Plus;
	let mut rng = Xoshiro256Plus::seed_from_u64(7);
	let n_items = 8;
	let mut rows: Vec<(Vec<(usize, ItemId)>, ClassCounts)> = (0..200)
		.map(|_| {
			let path = (0..n_items)
				.filter(|_| rng.gen_bool(0.4))
				.map(|rank| (rank, ItemId(100 + rank)))
				.collect();
			(path, ClassCounts::of_row(rng.gen_bool(0.5)))
		})
		.collect();
	let mut expected = vec![ClassCounts::default(); n_items];
	for (path, counts) in rows.iter() {
		for (rank, _) in path.iter() {
			expected[*rank] += *counts;
		}
	}
	for _ in 0..2 {
		let mut tree = CpTree::new();
		for (path, counts) in rows.iter() {
			tree.insert(path, *counts);
		}
		for (rank, counts) in expected.iter().enumerate() {
			let entry = tree.header_entry(rank);
			if *counts == ClassCounts::default() {
				assert!(entry.is_none());
			} else {
				let entry = entry.unwrap();
				assert_eq!(entry.item, ItemId(100 + rank));
				assert_eq!(entry.counts, *counts);
				let chain_counts = entry.nodes.iter().fold(ClassCounts::default(), |mut sum, node| {
					sum += tree.nodes[*node].counts;
					sum
				});
				assert_eq!(chain_counts, *counts);
			}
		}
		rows.shuffle(&mut rng);
	}
}

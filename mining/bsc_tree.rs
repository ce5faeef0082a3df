use num_traits::ToPrimitive;
use std::cmp::Ordering;

/**
A `PathCode` locates a node of a balanced binary tree over bit positions. The low `len` bits of `bits` are the steps from the root, the first step in the most significant of them, 0 for left and 1 for right.

Path codes are ordered by the first bit position they span and then by depth, so an ancestor sorts before its descendants.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PathCode {
	bits: u64,
	len: u8,
}

impl PathCode {
	pub fn root() -> Self {
		Self { bits: 0, len: 0 }
	}

	pub fn len(&self) -> usize {
		self.len as usize
	}

	pub fn left(self) -> Self {
		Self {
			bits: self.bits << 1,
			len: self.len + 1,
		}
	}

	pub fn right(self) -> Self {
		Self {
			bits: (self.bits << 1) | 1,
			len: self.len + 1,
		}
	}

	/// Is the node at `self` an ancestor of, or the same node as, the node at `other`?
	pub fn is_prefix_of(&self, other: &PathCode) -> bool {
		self.len <= other.len && other.bits >> (other.len - self.len) == self.bits
	}

	// The path left aligned in 64 bits, which orders nodes by their first bit position.
	fn aligned(&self) -> u128 {
		(self.bits as u128) << (64 - self.len as u32)
	}

	/// The first bit position spanned by this node in a tree of depth `depth`.
	fn start(&self, depth: usize) -> usize {
		(self.bits as usize) << (depth - self.len())
	}
}

impl PartialOrd for PathCode {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

impl Ord for PathCode {
	fn cmp(&self, other: &Self) -> Ordering {
		self.aligned()
			.cmp(&other.aligned())
			.then_with(|| self.len.cmp(&other.len))
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BscLeaf {
	pub code: PathCode,
	/// The number of set bits under this leaf, which is every bit it spans.
	pub count: u64,
}

/**
A `BscTree` is a bit string compression tree. It represents a bitmap of `n_bits` positions by the maximal nodes of a balanced binary tree over the positions whose bits are all set. These leaves are sorted by path code and partition the set bits.

Because the leaves are maximal, a bitmap has exactly one representation, and two trees are intersected with a merge walk over their leaves without expanding either bitmap.
*/
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BscTree {
	n_bits: usize,
	depth: usize,
	leaves: Vec<BscLeaf>,
}

impl BscTree {
	pub fn from_bits(bits: &[bool]) -> Self {
		let mut prefix_sums = Vec::with_capacity(bits.len() + 1);
		prefix_sums.push(0usize);
		let mut sum = 0;
		prefix_sums.extend(bits.iter().map(|bit| {
			sum += *bit as usize;
			sum
		}));
		Self::from_prefix_sums(&prefix_sums)
	}

	/// Compress a bitmap of `n_bits` positions in which the bits at `positions` are set.
	pub fn from_positions(n_bits: usize, positions: impl IntoIterator<Item = usize>) -> Self {
		let mut bits = vec![false; n_bits];
		for position in positions {
			bits[position] = true;
		}
		Self::from_bits(&bits)
	}

	fn from_prefix_sums(prefix_sums: &[usize]) -> Self {
		let n_bits = prefix_sums.len() - 1;
		let depth = depth_for(n_bits);
		let mut leaves = Vec::new();
		// Visit nodes in order, left child first, so the leaves come out sorted.
		let mut stack = vec![PathCode::root()];
		while let Some(code) = stack.pop() {
			let width = 1usize << (depth - code.len());
			let start = code.start(depth);
			if start >= n_bits {
				continue;
			}
			let end = (start + width).min(n_bits);
			let count = prefix_sums[end] - prefix_sums[start];
			if count == 0 {
				continue;
			}
			if count == width {
				leaves.push(BscLeaf {
					code,
					count: count.to_u64().unwrap(),
				});
				continue;
			}
			stack.push(code.right());
			stack.push(code.left());
		}
		Self {
			n_bits,
			depth,
			leaves,
		}
	}

	pub fn n_bits(&self) -> usize {
		self.n_bits
	}

	pub fn leaves(&self) -> &[BscLeaf] {
		&self.leaves
	}

	/// The number of set bits.
	pub fn count(&self) -> u64 {
		self.leaves.iter().map(|leaf| leaf.count).sum()
	}

	/**
	Intersect two trees over the same number of bits.

	Two leaves either span disjoint positions or one spans the other. A nested pair contributes the deeper leaf. Otherwise the walk advances past whichever leaf comes first.
	*/
	pub fn and(&self, other: &BscTree) -> BscTree {
		assert_eq!(self.n_bits, other.n_bits);
		let mut leaves = Vec::with_capacity(self.leaves.len().min(other.leaves.len()));
		let (mut i, mut j) = (0, 0);
		while i < self.leaves.len() && j < other.leaves.len() {
			let a = self.leaves[i];
			let b = other.leaves[j];
			if a.code.is_prefix_of(&b.code) {
				leaves.push(b);
				j += 1;
			} else if b.code.is_prefix_of(&a.code) {
				leaves.push(a);
				i += 1;
			} else if a.code < b.code {
				i += 1;
			} else {
				j += 1;
			}
		}
		BscTree {
			n_bits: self.n_bits,
			depth: self.depth,
			leaves,
		}
	}

	/// Is every bit set in `other` also set in `self`?
	pub fn covers(&self, other: &BscTree) -> bool {
		self.and(other).leaves == other.leaves
	}

	/// Expand the tree back into its bitmap.
	pub fn to_bits(&self) -> Vec<bool> {
		let mut bits = vec![false; self.n_bits];
		for leaf in self.leaves.iter() {
			let start = leaf.code.start(self.depth);
			for bit in bits[start..start + leaf.count.to_usize().unwrap()].iter_mut() {
				*bit = true;
			}
		}
		bits
	}
}

// The depth of the smallest balanced binary tree with at least `n_bits` leaves.
fn depth_for(n_bits: usize) -> usize {
	let mut depth = 0;
	while (1usize << depth) < n_bits {
		depth += 1;
	}
	depth
}

#[test]
fn test_path_code_order() {
	let root = PathCode::root();
	let l = root.left();
	let r = root.right();
	let lr = l.right();
	assert!(root < l);
	assert!(l < lr);
	assert!(lr < r);
	assert!(l.is_prefix_of(&lr));
	assert!(root.is_prefix_of(&r));
	assert!(!r.is_prefix_of(&lr));
	assert!(lr.is_prefix_of(&lr));
}

#[test]
fn test_compression() {
	let tree = BscTree::from_bits(&[true, true, true, true, false, true, true, false]);
	let codes: Vec<(u64, usize, u64)> = tree
		.leaves()
		.iter()
		.map(|leaf| (leaf.code.bits, leaf.code.len(), leaf.count))
		.collect();
	assert_eq!(codes, vec![(0b0, 1, 4), (0b101, 3, 1), (0b110, 3, 1)]);
	assert_eq!(tree.count(), 6);
	let full = BscTree::from_bits(&[true; 5]);
	assert_eq!(full.count(), 5);
	assert_eq!(BscTree::from_bits(&[]).count(), 0);
	assert_eq!(BscTree::from_bits(&[true]).leaves().len(), 1);
}

#[test]
fn test_and_matches_bitmaps() {
	use rand::{Rng, SeedableRng};
	use rand_xoshiro::Xoshiro256Plus;
	let mut rng = Xoshiro256Plus::seed_from_u64(0);
	for n_bits in [1, 2, 3, 7, 8, 9, 31, 64, 100, 257].iter() {
		for density in [0.1, 0.5, 0.9].iter() {
			let a: Vec<bool> = (0..*n_bits).map(|_| rng.gen_bool(*density)).collect();
			let b: Vec<bool> = (0..*n_bits).map(|_| rng.gen_bool(*density)).collect();
			let a_tree = BscTree::from_bits(&a);
			let b_tree = BscTree::from_bits(&b);
			assert_eq!(a_tree.to_bits(), a);
			let and: Vec<bool> = a.iter().zip(b.iter()).map(|(a, b)| *a && *b).collect();
			let and_tree = a_tree.and(&b_tree);
			let popcount = and.iter().filter(|bit| **bit).count() as u64;
			assert_eq!(and_tree.count(), popcount);
			assert_eq!(and_tree, BscTree::from_bits(&and));
			let is_subset = b.iter().zip(a.iter()).all(|(b, a)| !*b || *a);
			assert_eq!(a_tree.covers(&b_tree), is_subset);
			assert!(a_tree.covers(&and_tree));
		}
	}
}

#[test]
fn test_from_positions() {
	let tree = BscTree::from_positions(6, vec![5, 0, 1]);
	assert_eq!(tree.to_bits(), vec![true, true, false, false, false, true]);
	assert_eq!(tree.n_bits(), 6);
	assert_eq!(tree.count(), 3);
}

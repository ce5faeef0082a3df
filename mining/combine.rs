use crate::{
	dataset::Transaction,
	item::{ItemId, ItemTable},
	pattern::Pattern,
};

/// The items whose class probabilities are multiplied (`numerator`) and divided out (`denominator`) when combining patterns. Both are multisets.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selection {
	pub numerator: Vec<ItemId>,
	pub denominator: Vec<ItemId>,
}

/**
Choose patterns among `patterns`, which all cover `transaction`, until their items span the transaction's items.

While more than one candidate remains, only candidates with an item not yet covered are considered, and the one with the highest strength is chosen, then the most items, then the most new items, then the earliest. A single remaining candidate is always chosen. Each chosen pattern adds all its items to the numerator and the items it shares with the patterns chosen before it to the denominator.
*/
pub fn select_patterns(
	items: &ItemTable,
	transaction: &Transaction,
	patterns: &[&Pattern],
) -> Selection {
	let mut candidates: Vec<&Pattern> = patterns.to_vec();
	let mut covered: Vec<ItemId> = Vec::new();
	let mut selection = Selection::default();
	while !candidates.is_empty() && !spans(items, &covered, transaction) {
		let chosen = if candidates.len() == 1 {
			0
		} else {
			let mut best: Option<(usize, usize)> = None;
			for (index, candidate) in candidates.iter().enumerate() {
				let n_new = candidate
					.items()
					.iter()
					.filter(|item| !covered.contains(item))
					.count();
				if n_new == 0 {
					continue;
				}
				let is_better = match best {
					None => true,
					Some((best_index, best_n_new)) => {
						let best = candidates[best_index];
						candidate
							.strength
							.total_cmp(&best.strength)
							.then_with(|| candidate.len().cmp(&best.len()))
							.then_with(|| n_new.cmp(&best_n_new))
							.is_gt()
					}
				};
				if is_better {
					best = Some((index, n_new));
				}
			}
			match best {
				Some((index, _)) => index,
				None => break,
			}
		};
		let chosen = candidates.remove(chosen);
		for item in chosen.items() {
			if covered.contains(item) {
				selection.denominator.push(*item);
			}
		}
		selection.numerator.extend(chosen.items().iter().copied());
		for item in chosen.items() {
			if !covered.contains(item) {
				covered.push(*item);
			}
		}
	}
	selection
}

// Is every item of the transaction covered by one of `covered`?
fn spans(items: &ItemTable, covered: &[ItemId], transaction: &Transaction) -> bool {
	transaction.items().iter().all(|row_item| {
		covered
			.iter()
			.any(|id| items.item_covers(*id, *row_item))
	})
}

/**
Score each class as its prior times the product of the class probabilities of the numerator items divided by the product of those of the denominator items. Items without probabilities contribute a factor of 1.
*/
pub fn class_scores(items: &ItemTable, priors: &[f64], selection: &Selection) -> Vec<f64> {
	let probability = |id: &ItemId, class: usize| {
		items
			.get(*id)
			.probabilities_per_class
			.as_ref()
			.map(|probabilities| probabilities[class])
			.unwrap_or(1.0)
	};
	priors
		.iter()
		.enumerate()
		.map(|(class, prior)| {
			let numerator: f64 = selection
				.numerator
				.iter()
				.map(|id| probability(id, class))
				.product();
			// Denominator items also appear in the numerator, so a zero there already zeroes the score.
			let denominator: f64 = selection
				.denominator
				.iter()
				.map(|id| probability(id, class))
				.filter(|probability| *probability > 0.0)
				.product();
			prior * numerator / denominator
		})
		.collect()
}

/**
Compute class probabilities for `transaction` from the patterns covering it. If no pattern covers it, or every class scores zero, the probabilities are `priors`.
*/
pub fn combine(
	items: &ItemTable,
	priors: &[f64],
	transaction: &Transaction,
	patterns: &[Pattern],
) -> Vec<f64> {
	let covering: Vec<&Pattern> = patterns
		.iter()
		.filter(|pattern| pattern.covers(items, transaction))
		.collect();
	if covering.is_empty() {
		return priors.to_vec();
	}
	let selection = select_patterns(items, transaction, &covering);
	let scores = class_scores(items, priors, &selection);
	let total: f64 = scores.iter().sum();
	if !(total > 0.0 && total.is_finite()) {
		return priors.to_vec();
	}
	scores.into_iter().map(|score| score / total).collect()
}

/// The index of the highest probability, the lowest index on ties.
pub(crate) fn argmax(probabilities: &[f64]) -> usize {
	let mut best = 0;
	for (index, probability) in probabilities.iter().enumerate() {
		if *probability > probabilities[best] {
			best = index;
		}
	}
	best
}

#[cfg(test)]
fn item_with_probabilities(items: &mut ItemTable, value: &str, probabilities: &[f64]) -> ItemId {
	let mut item = crate::item::Item::nominal("v", value);
	item.probabilities_per_class = Some(probabilities.to_vec());
	items.intern(item)
}

#[cfg(test)]
fn pattern_with_strength(items: &[ItemId], strength: f64) -> Pattern {
	let mut pattern = Pattern::new(items.iter().copied(), 0);
	pattern.strength = strength;
	pattern
}

#[test]
fn test_combine() {
	let mut items = ItemTable::new();
	let a = item_with_probabilities(&mut items, "a", &[0.8, 0.2]);
	let b = item_with_probabilities(&mut items, "b", &[0.5, 0.5]);
	let c = item_with_probabilities(&mut items, "c", &[0.6, 0.4]);
	let d = item_with_probabilities(&mut items, "d", &[0.1, 0.9]);
	let transaction = Transaction::new(vec![a, b, c]);
	let patterns = vec![
		pattern_with_strength(&[c], 1.0),
		pattern_with_strength(&[a, b], 2.0),
		pattern_with_strength(&[b, c], 1.0),
		pattern_with_strength(&[d], 5.0),
	];
	let covering: Vec<&Pattern> = patterns[..3].iter().collect();
	let selection = select_patterns(&items, &transaction, &covering);
	// {a, b} is strongest. {b, c} and {c} both add c at equal strength, and {b, c} has more items.
	assert_eq!(
		selection,
		Selection {
			numerator: vec![a, b, b, c],
			denominator: vec![b],
		}
	);
	let scores = class_scores(&items, &[0.5, 0.5], &selection);
	assert!((scores[0] - 0.12).abs() < 1e-12);
	assert!((scores[1] - 0.02).abs() < 1e-12);
	let probabilities = combine(&items, &[0.5, 0.5], &transaction, &patterns);
	assert!((probabilities[0] - 6.0 / 7.0).abs() < 1e-12);
	assert!((probabilities[1] - 1.0 / 7.0).abs() < 1e-12);
	assert_eq!(argmax(&probabilities), 0);
}

#[test]
fn test_combine_edge_cases() {
	let mut items = ItemTable::new();
	let a = item_with_probabilities(&mut items, "a", &[0.3, 0.7]);
	let b = item_with_probabilities(&mut items, "b", &[0.5, 0.5]);
	let transaction = Transaction::new(vec![a, b]);
	// No pattern covers the row.
	let patterns = vec![pattern_with_strength(&[a, b], 1.0)];
	let unrelated = Transaction::new(vec![b]);
	assert_eq!(
		combine(&items, &[0.25, 0.75], &unrelated, &patterns),
		vec![0.25, 0.75]
	);
	// A candidate adding nothing new is skipped while others remain.
	let first = pattern_with_strength(&[a], 1.0);
	let second = pattern_with_strength(&[b], 1.0);
	let same = pattern_with_strength(&[a], 3.0);
	let selection = select_patterns(&items, &transaction, &[&first, &second, &same]);
	assert_eq!(selection.numerator, vec![a, b]);
	assert!(selection.denominator.is_empty());
	let selection = select_patterns(&items, &transaction, &[&same, &first]);
	assert_eq!(selection.numerator, vec![a, a]);
	assert_eq!(selection.denominator, vec![a]);
	assert_eq!(argmax(&[0.5, 0.5]), 0);
}

#[test]
fn test_combine_with_tolerant_items() {
	use crate::item::{Item, Relation};
	let mut items = ItemTable::new();
	let mut numeric = |threshold: f64, probabilities: &[f64]| {
		let mut item = Item::numeric("age", threshold, Relation::Equal { alpha: 2.0 });
		item.probabilities_per_class = Some(probabilities.to_vec());
		items.intern(item)
	};
	let age_30 = numeric(30.0, &[0.1, 0.9]);
	let age_31 = numeric(31.0, &[0.6, 0.2]);
	let age_40 = numeric(40.0, &[0.9, 0.1]);
	let red = item_with_probabilities(&mut items, "red", &[0.5, 0.5]);
	let transaction = Transaction::new(vec![age_30, red]);
	let patterns = vec![
		pattern_with_strength(&[age_31], 2.0),
		pattern_with_strength(&[red], 1.0),
		pattern_with_strength(&[age_30], 0.5),
		pattern_with_strength(&[age_40], 9.0),
	];
	// age 31 covers the row's age 30 within alpha, so once red is chosen the row is spanned and age 30 is never needed.
	assert!(patterns[0].covers(&items, &transaction));
	assert!(!patterns[3].covers(&items, &transaction));
	let covering: Vec<&Pattern> = patterns[..3].iter().collect();
	let selection = select_patterns(&items, &transaction, &covering);
	assert_eq!(
		selection,
		Selection {
			numerator: vec![age_31, red],
			denominator: vec![],
		}
	);
	let probabilities = combine(&items, &[0.5, 0.5], &transaction, &patterns);
	assert!((probabilities[0] - 0.75).abs() < 1e-12);
	assert!((probabilities[1] - 0.25).abs() < 1e-12);
}

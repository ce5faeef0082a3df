use crate::{dataset::Dataset, pattern::Pattern};
use std::cmp::Reverse;

/**
Select a small set of patterns covering the rows of `dataset` that belong to the patterns' classes. A pattern covers a row if it covers the row's transaction and the row has the pattern's class.

Patterns are considered by descending support, longer patterns first at equal support, and in their original order after that. A pattern is kept if it covers a row no kept pattern covers, and selection stops once every row is covered. The kept patterns are returned in the order they were selected, so pruning the result again returns it unchanged.
*/
pub fn prune(dataset: &Dataset, patterns: &[Pattern]) -> Vec<Pattern> {
	let mut order: Vec<usize> = (0..patterns.len()).collect();
	// Sort ascending and consume from the end.
	order.sort_by(|a, b| {
		let (pa, pb) = (&patterns[*a], &patterns[*b]);
		pa.support
			.total_cmp(&pb.support)
			.then_with(|| pa.len().cmp(&pb.len()))
			.then_with(|| Reverse(a).cmp(&Reverse(b)))
	});
	let is_target: Vec<bool> = dataset
		.labels
		.iter()
		.map(|label| patterns.iter().any(|pattern| pattern.class == *label))
		.collect();
	let mut n_uncovered = is_target.iter().filter(|is_target| **is_target).count();
	let mut covered = vec![false; dataset.nrows()];
	let mut selected = Vec::new();
	for index in order.into_iter().rev() {
		if n_uncovered == 0 {
			break;
		}
		let pattern = &patterns[index];
		let mut n_newly_covered = 0;
		for (row, transaction) in dataset.transactions.iter().enumerate() {
			if is_target[row]
				&& !covered[row]
				&& dataset.labels[row] == pattern.class
				&& pattern.covers(&dataset.items, transaction)
			{
				covered[row] = true;
				n_newly_covered += 1;
			}
		}
		if n_newly_covered > 0 {
			n_uncovered -= n_newly_covered;
			selected.push(pattern.clone());
		}
	}
	selected
}

#[cfg(test)]
fn pattern(dataset: &Dataset, items: &[(&str, &str)], class: usize) -> Pattern {
	let items = items.iter().map(|(variable, value)| {
		dataset
			.items
			.lookup(&crate::item::Item::nominal(*variable, *value).condition)
			.unwrap()
	});
	let mut pattern = Pattern::new(items, class);
	let measures = pattern.calculate_measures(dataset);
	pattern.set_training_measures(measures);
	pattern
}

#[cfg(test)]
fn shapes() -> Dataset {
	Dataset::from_nominal_rows(
		&["shape", "color"],
		&[
			&["circle", "red", "yes"],
			&["circle", "blue", "yes"],
			&["square", "red", "yes"],
			&["square", "green", "yes"],
			&["circle", "green", "yes"],
			&["triangle", "blue", "no"],
			&["triangle", "red", "no"],
			&["square", "blue", "no"],
		],
	)
	.unwrap()
}

#[test]
fn test_prune() {
	let dataset = shapes();
	let yes = 1;
	let patterns = vec![
		pattern(&dataset, &[("color", "green")], yes),
		pattern(&dataset, &[("shape", "circle")], yes),
		pattern(&dataset, &[("shape", "square"), ("color", "red")], yes),
		pattern(&dataset, &[("shape", "circle"), ("color", "red")], yes),
		pattern(&dataset, &[("shape", "square"), ("color", "green")], yes),
	];
	let selected = prune(&dataset, &patterns);
	let selected: Vec<String> = selected
		.iter()
		.map(|pattern| pattern.display(&dataset.items).to_string())
		.collect();
	// circle covers three rows. green covers two, one of them new. square and red covers the last one.
	insta::assert_debug_snapshot!(selected, @r###"
	[
	    "{shape = circle}",
	    "{color = green}",
	    "{shape = square, color = red}",
	]
	"###);
}

#[test]
fn test_prune_ties() {
	let dataset = shapes();
	let yes = 1;
	// Both patterns cover one row each with equal support and length, so the earlier one is considered first.
	let patterns = vec![
		pattern(&dataset, &[("shape", "square"), ("color", "red")], yes),
		pattern(&dataset, &[("shape", "circle"), ("color", "red")], yes),
	];
	let selected = prune(&dataset, &patterns);
	assert_eq!(selected.len(), 2);
	assert!(selected[0].same_items(&patterns[0]));
	assert!(selected[1].same_items(&patterns[1]));
}

#[test]
fn test_prune_is_idempotent() {
	let dataset = shapes();
	let yes = 1;
	let patterns = vec![
		pattern(&dataset, &[("color", "green")], yes),
		pattern(&dataset, &[("shape", "square"), ("color", "red")], yes),
		pattern(&dataset, &[("shape", "circle")], yes),
		pattern(&dataset, &[("shape", "square"), ("color", "green")], yes),
		pattern(&dataset, &[("shape", "triangle")], 0),
	];
	let once = prune(&dataset, &patterns);
	let twice = prune(&dataset, &once);
	assert_eq!(once.len(), twice.len());
	for (a, b) in once.iter().zip(twice.iter()) {
		assert!(a.same_items(b));
		assert_eq!(a.class, b.class);
	}
	assert!(once.iter().any(|pattern| pattern.class == 0));
	assert!(prune(&dataset, &[]).is_empty());
}

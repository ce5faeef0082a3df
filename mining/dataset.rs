use crate::{
	error::{Error, Result},
	item::{Item, ItemId, ItemTable, Relation},
};
use emerge_dataframe::{DataFrame, Value};
use num_traits::ToPrimitive;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;
use std::collections::BTreeSet;

/// These values are treated as missing by [`Dataset::from_nominal_rows`](struct.Dataset.html#method.from_nominal_rows).
const MISSING_VALUES: &[&str] = &["", "?"];

/// A `Transaction` is a row reduced to the ids of the items derived from it. The ids are sorted and unique.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Transaction {
	items: Vec<ItemId>,
}

impl Transaction {
	pub fn new(mut items: Vec<ItemId>) -> Self {
		items.sort_unstable();
		items.dedup();
		Self { items }
	}

	pub fn items(&self) -> &[ItemId] {
		&self.items
	}

	pub fn contains(&self, id: ItemId) -> bool {
		self.items.binary_search(&id).is_ok()
	}

	pub fn len(&self) -> usize {
		self.items.len()
	}

	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}
}

#[derive(Clone, Debug, Default)]
pub struct DatasetOptions {
	/// If this is `Some`, number columns are allowed and each value becomes a numeric item matching values within `alpha` of it. If it is `None`, a number column is an unsupported dataset.
	pub numeric_alpha: Option<f64>,
	/// Columns holding codes that look like numbers but are nominal values.
	pub nominal_columns: Vec<String>,
}

impl DatasetOptions {
	/// The columns to load as enum columns when the class is in the column `target`. The class is always nominal.
	pub fn enum_columns(&self, target: &str) -> Vec<String> {
		let mut columns = self.nominal_columns.clone();
		if !columns.iter().any(|column| column == target) {
			columns.push(target.to_owned());
		}
		columns
	}
}

/// A `Dataset` is a labeled list of transactions over the items in `items`.
#[derive(Clone, Debug)]
pub struct Dataset {
	pub items: ItemTable,
	/// The names of the classes. Labels are indexes into this list.
	pub classes: Vec<String>,
	pub transactions: Vec<Transaction>,
	pub labels: Vec<usize>,
}

impl Dataset {
	/**
	Reduce each row of `dataframe` to its items. The column named `target` must be an enum column and supplies the classes. Every other enum column contributes a nominal item per row with a valid value, and rows with an invalid target value are skipped. Load the dataframe with [`DatasetOptions::enum_columns`](struct.DatasetOptions.html#method.enum_columns) as its enum columns so that numeric codes stay nominal.
	*/
	pub fn from_dataframe(
		dataframe: &DataFrame,
		target: &str,
		options: &DatasetOptions,
	) -> Result<Self> {
		let target_column = dataframe
			.column(target)
			.ok_or_else(|| Error::UnsupportedDataset(format!("no column named \"{}\"", target)))?;
		let target_column = target_column.as_enum().ok_or_else(|| {
			Error::UnsupportedDataset(format!("the target column \"{}\" is not an enum", target))
		})?;
		let mut items = ItemTable::new();
		let mut transactions = Vec::with_capacity(dataframe.nrows());
		let mut labels = Vec::with_capacity(dataframe.nrows());
		if options.numeric_alpha.is_none() {
			if let Some(column) = dataframe
				.columns
				.iter()
				.find_map(|column| column.as_number())
			{
				return Err(Error::UnsupportedDataset(format!(
					"\"{}\" is a number column and only nominal attributes are supported",
					column.name
				)));
			}
		}
		let alpha = options.numeric_alpha.unwrap_or(0.0);
		for row_index in 0..dataframe.nrows() {
			let label = match target_column.data[row_index] {
				Some(label) => label.get() - 1,
				None => continue,
			};
			let mut row_items = Vec::new();
			for (column, value) in dataframe.columns.iter().zip(dataframe.row(row_index)) {
				if column.name() == target {
					continue;
				}
				let item = match value {
					Value::Enum(Some(value)) => Some(Item::nominal(column.name(), value)),
					Value::Number(value) if value.is_finite() => Some(Item::numeric(
						column.name(),
						value.to_f64().unwrap(),
						Relation::Equal { alpha },
					)),
					_ => None,
				};
				if let Some(item) = item {
					row_items.push(items.intern(item));
				}
			}
			transactions.push(Transaction::new(row_items));
			labels.push(label);
		}
		if transactions.is_empty() {
			return Err(Error::UnsupportedDataset(
				"the dataset has no rows with a valid target".to_owned(),
			));
		}
		Ok(Self {
			items,
			classes: target_column.options.clone(),
			transactions,
			labels,
		})
	}

	/**
	Build a dataset from rows of strings. The last value of each row is its class and the others are the values of `variables`, in order. The values "" and "?" are missing and produce no item. Classes are sorted by name.
	*/
	pub fn from_nominal_rows(variables: &[&str], rows: &[&[&str]]) -> Result<Self> {
		let classes: Vec<String> = rows
			.iter()
			.filter_map(|row| row.last())
			.map(|class| class.to_string())
			.collect::<BTreeSet<_>>()
			.into_iter()
			.collect();
		let mut items = ItemTable::new();
		let mut transactions = Vec::with_capacity(rows.len());
		let mut labels = Vec::with_capacity(rows.len());
		for row in rows {
			if row.len() != variables.len() + 1 {
				return Err(Error::UnsupportedDataset(format!(
					"expected {} values in a row but found {}",
					variables.len() + 1,
					row.len()
				)));
			}
			let (class, values) = row.split_last().unwrap();
			let row_items = variables
				.iter()
				.zip(values.iter())
				.filter(|(_, value)| !MISSING_VALUES.contains(*value))
				.map(|(variable, value)| items.intern(Item::nominal(*variable, *value)))
				.collect();
			transactions.push(Transaction::new(row_items));
			labels.push(classes.iter().position(|c| c == class).unwrap());
		}
		if transactions.is_empty() {
			return Err(Error::UnsupportedDataset("the dataset has no rows".to_owned()));
		}
		Ok(Self {
			items,
			classes,
			transactions,
			labels,
		})
	}

	pub fn nrows(&self) -> usize {
		self.transactions.len()
	}

	/// The number of rows of each class.
	pub fn class_counts(&self) -> Vec<u64> {
		let mut counts = vec![0; self.classes.len()];
		for label in self.labels.iter() {
			counts[*label] += 1;
		}
		counts
	}

	/// The empirical frequency of each class.
	pub fn class_priors(&self) -> Vec<f64> {
		let n_rows = self.nrows().to_f64().unwrap();
		self.class_counts()
			.into_iter()
			.map(|count| count.to_f64().unwrap() / n_rows)
			.collect()
	}

	/// The transactions labeled with `class`.
	pub fn transactions_of_class(&self, class: usize) -> Vec<&Transaction> {
		self.transactions
			.iter()
			.zip(self.labels.iter())
			.filter(|(_, label)| **label == class)
			.map(|(transaction, _)| transaction)
			.collect()
	}

	/// Make a dataset of the rows at `indexes`, sharing this dataset's items and classes.
	pub fn subset(&self, indexes: &[usize]) -> Self {
		Self {
			items: self.items.clone(),
			classes: self.classes.clone(),
			transactions: indexes
				.iter()
				.map(|index| self.transactions[*index].clone())
				.collect(),
			labels: indexes.iter().map(|index| self.labels[*index]).collect(),
		}
	}

	/// Shuffle the rows with a generator seeded by `seed` and split off `test_fraction` of them as a test dataset. Both datasets share the item ids of this one.
	pub fn split(&self, test_fraction: f64, seed: u64) -> (Self, Self) {
		let mut indexes: Vec<usize> = (0..self.nrows()).collect();
		let mut rng = Xoshiro256Plus::seed_from_u64(seed);
		indexes.shuffle(&mut rng);
		let n_test = (test_fraction * self.nrows().to_f64().unwrap())
			.round()
			.to_usize()
			.unwrap_or(0)
			.min(self.nrows());
		let (test, train) = indexes.split_at(n_test);
		(self.subset(train), self.subset(test))
	}
}

#[test]
fn test_from_nominal_rows() {
	let dataset = Dataset::from_nominal_rows(
		&["outlook", "windy"],
		&[
			&["sunny", "yes", "stay"],
			&["rainy", "?", "stay"],
			&["sunny", "no", "play"],
		],
	)
	.unwrap();
	assert_eq!(dataset.classes, vec!["play".to_owned(), "stay".to_owned()]);
	assert_eq!(dataset.labels, vec![1, 1, 0]);
	assert_eq!(dataset.items.len(), 4);
	assert_eq!(dataset.transactions[1].len(), 1);
	let sunny = dataset
		.items
		.lookup(&Item::nominal("outlook", "sunny").condition)
		.unwrap();
	assert!(dataset.transactions[0].contains(sunny));
	assert!(dataset.transactions[2].contains(sunny));
	assert!(!dataset.transactions[1].contains(sunny));
	assert_eq!(dataset.class_counts(), vec![1, 2]);
}

#[test]
fn test_from_dataframe() {
	let csv = "color,size,class\nred,1.5,a\nblue,2,b\n?,2,a\n";
	let dataframe = emerge_dataframe::DataFrame::from_csv(
		&mut csv_reader(csv),
		emerge_dataframe::FromCsvOptions::default(),
		|_| {},
	)
	.unwrap();
	let error = Dataset::from_dataframe(&dataframe, "class", &DatasetOptions::default());
	assert!(matches!(error, Err(Error::UnsupportedDataset(_))));
	let dataset = Dataset::from_dataframe(
		&dataframe,
		"class",
		&DatasetOptions {
			numeric_alpha: Some(0.0),
			..Default::default()
		},
	)
	.unwrap();
	assert_eq!(dataset.nrows(), 3);
	assert_eq!(dataset.labels, vec![0, 1, 0]);
	// red, blue, 1.5, 2
	assert_eq!(dataset.items.len(), 4);
	assert_eq!(dataset.transactions[2].len(), 1);
	assert_eq!(dataset.transactions[1].items()[1], dataset.transactions[2].items()[0]);
	assert!(matches!(
		Dataset::from_dataframe(&dataframe, "missing", &DatasetOptions::default()),
		Err(Error::UnsupportedDataset(_))
	));
}

#[test]
fn test_numeric_codes_are_nominal() {
	let csv = "color,level,class\nred,1,2\nblue,2,1\nred,3,2\nblue,1,1\n";
	// Without enum columns, the codes load as numbers and the dataset is rejected.
	let dataframe = emerge_dataframe::DataFrame::from_csv(
		&mut csv_reader(csv),
		emerge_dataframe::FromCsvOptions::default(),
		|_| {},
	)
	.unwrap();
	assert!(matches!(
		Dataset::from_dataframe(&dataframe, "class", &DatasetOptions::default()),
		Err(Error::UnsupportedDataset(_))
	));
	let options = DatasetOptions {
		nominal_columns: vec!["level".to_owned()],
		..Default::default()
	};
	let enum_columns = options.enum_columns("class");
	assert_eq!(enum_columns, vec!["level".to_owned(), "class".to_owned()]);
	let dataframe = emerge_dataframe::DataFrame::from_csv(
		&mut csv_reader(csv),
		emerge_dataframe::FromCsvOptions {
			enum_columns: &enum_columns,
			..Default::default()
		},
		|_| {},
	)
	.unwrap();
	let dataset = Dataset::from_dataframe(&dataframe, "class", &options).unwrap();
	assert_eq!(dataset.classes, vec!["1".to_owned(), "2".to_owned()]);
	assert_eq!(dataset.labels, vec![1, 0, 1, 0]);
	let level = dataset
		.items
		.lookup(&Item::nominal("level", "1").condition)
		.unwrap();
	assert!(dataset.transactions[0].contains(level));
	assert!(dataset.transactions[3].contains(level));
	// red, 1, blue, 2, 3
	assert_eq!(dataset.items.len(), 5);
}

#[test]
fn test_split() {
	let rows: Vec<Vec<&str>> = (0..10)
		.map(|index| vec![if index % 2 == 0 { "x" } else { "y" }, "c"])
		.collect();
	let rows: Vec<&[&str]> = rows.iter().map(|row| row.as_slice()).collect();
	let dataset = Dataset::from_nominal_rows(&["v"], &rows).unwrap();
	let (train, test) = dataset.split(0.3, 42);
	assert_eq!(train.nrows(), 7);
	assert_eq!(test.nrows(), 3);
	let (train_again, _) = dataset.split(0.3, 42);
	assert_eq!(train.transactions, train_again.transactions);
}

#[cfg(test)]
fn csv_reader(csv: &str) -> csv::Reader<std::io::Cursor<Vec<u8>>> {
	csv::Reader::from_reader(std::io::Cursor::new(csv.as_bytes().to_vec()))
}

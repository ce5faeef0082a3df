/*!
This crate provides a basic implementation of dataframes, which are two dimensional arrays of data where each column can have a different data type, like a spreadsheet. It only implements what the miner needs: number columns and enum columns, loaded from csv.
*/

use std::num::NonZeroUsize;

pub mod load;

pub use self::load::*;

#[derive(Debug, Clone, PartialEq)]
pub struct DataFrame {
	pub columns: Vec<Column>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Column {
	Number(NumberColumn),
	Enum(EnumColumn),
}

#[derive(Debug, Clone, PartialEq)]
pub struct NumberColumn {
	pub name: String,
	/// Invalid values are stored as NaN.
	pub data: Vec<f32>,
}

/// The values of an enum column are 1-indexed positions into `options`. Invalid values are `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumColumn {
	pub name: String,
	pub options: Vec<String>,
	pub data: Vec<Option<NonZeroUsize>>,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(tag = "type")]
pub enum ColumnType {
	#[serde(rename = "number")]
	Number,
	#[serde(rename = "enum")]
	Enum { options: Vec<String> },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Value<'a> {
	Number(f32),
	Enum(Option<&'a str>),
}

impl DataFrame {
	pub fn new(column_names: Vec<String>, column_types: Vec<ColumnType>) -> Self {
		let columns = column_names
			.into_iter()
			.zip(column_types.into_iter())
			.map(|(column_name, column_type)| match column_type {
				ColumnType::Number => Column::Number(NumberColumn::new(column_name)),
				ColumnType::Enum { options } => Column::Enum(EnumColumn::new(column_name, options)),
			})
			.collect();
		Self { columns }
	}

	pub fn ncols(&self) -> usize {
		self.columns.len()
	}

	pub fn nrows(&self) -> usize {
		self.columns.first().map(|column| column.len()).unwrap_or(0)
	}

	pub fn column(&self, name: &str) -> Option<&Column> {
		self.columns.iter().find(|column| column.name() == name)
	}

	/// Read the value at `row_index` of every column.
	pub fn row(&self, row_index: usize) -> Vec<Value> {
		self.columns
			.iter()
			.map(|column| column.value(row_index))
			.collect()
	}
}

impl Column {
	pub fn len(&self) -> usize {
		match self {
			Self::Number(s) => s.data.len(),
			Self::Enum(s) => s.data.len(),
		}
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn name(&self) -> &str {
		match self {
			Self::Number(s) => s.name.as_str(),
			Self::Enum(s) => s.name.as_str(),
		}
	}

	pub fn as_number(&self) -> Option<&NumberColumn> {
		match self {
			Self::Number(s) => Some(s),
			_ => None,
		}
	}

	pub fn as_enum(&self) -> Option<&EnumColumn> {
		match self {
			Self::Enum(s) => Some(s),
			_ => None,
		}
	}

	pub fn value(&self, row_index: usize) -> Value {
		match self {
			Self::Number(s) => Value::Number(s.data[row_index]),
			Self::Enum(s) => Value::Enum(s.option(row_index)),
		}
	}
}

impl NumberColumn {
	pub fn new(name: String) -> Self {
		Self {
			name,
			data: Vec::new(),
		}
	}
}

impl EnumColumn {
	pub fn new(name: String, options: Vec<String>) -> Self {
		Self {
			name,
			options,
			data: Vec::new(),
		}
	}

	/// Get the option string for the value at `row_index`, or `None` if the value is invalid.
	pub fn option(&self, row_index: usize) -> Option<&str> {
		self.data[row_index].map(|value| self.options[value.get() - 1].as_str())
	}
}

#[test]
fn test_row() {
	let mut df = DataFrame::new(
		vec!["size".to_owned(), "color".to_owned()],
		vec![
			ColumnType::Number,
			ColumnType::Enum {
				options: vec!["red".to_owned(), "blue".to_owned()],
			},
		],
	);
	if let Column::Number(column) = &mut df.columns[0] {
		column.data.extend(&[1.5, std::f32::NAN]);
	}
	if let Column::Enum(column) = &mut df.columns[1] {
		column.data.extend(&[NonZeroUsize::new(2), None]);
	}
	assert_eq!(df.nrows(), 2);
	assert_eq!(df.ncols(), 2);
	assert_eq!(df.row(0), vec![Value::Number(1.5), Value::Enum(Some("blue"))]);
	assert_eq!(df.row(1)[1], Value::Enum(None));
	assert!(df.column("color").and_then(|c| c.as_enum()).is_some());
	assert!(df.column("missing").is_none());
}

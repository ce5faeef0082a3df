use super::*;
use anyhow::Result;
use fnv::FnvHashMap;
use std::{
	collections::{BTreeMap, BTreeSet},
	path::Path,
};

#[derive(Clone)]
pub struct FromCsvOptions<'a> {
	/// Columns present in this map get the given type instead of an inferred one.
	pub column_types: Option<BTreeMap<String, ColumnType>>,
	/// Columns named here are inferred as enum columns even when every value is a number.
	pub enum_columns: &'a [String],
	pub invalid_values: &'a [&'a str],
}

impl<'a> Default for FromCsvOptions<'a> {
	fn default() -> Self {
		Self {
			column_types: None,
			enum_columns: &[],
			invalid_values: DEFAULT_INVALID_VALUES,
		}
	}
}

/// These values are the default values that are considered invalid.
const DEFAULT_INVALID_VALUES: &[&str] = &[
	"", "null", "NULL", "n/a", "N/A", "nan", "-nan", "NaN", "-NaN", "?",
];

impl DataFrame {
	pub fn from_path(path: &Path, options: FromCsvOptions, progress: impl Fn(u64)) -> Result<Self> {
		Self::from_csv(&mut csv::Reader::from_path(path)?, options, progress)
	}

	/// Load a dataframe from csv. Types of columns not given in `options.column_types` are inferred in a first pass over the records, after which the reader is rewound to load the values.
	pub fn from_csv<R>(
		reader: &mut csv::Reader<R>,
		options: FromCsvOptions,
		progress: impl Fn(u64),
	) -> Result<Self>
	where
		R: std::io::Read + std::io::Seek,
	{
		let column_names: Vec<String> = reader
			.headers()?
			.into_iter()
			.map(|column_name| column_name.to_owned())
			.collect();
		let start_position = reader.position().clone();
		let invalid_values = options.invalid_values;

		// Retrieve any column types present in the options.
		let mut column_types: Vec<Option<ColumnType>> = column_names
			.iter()
			.map(|column_name| {
				options
					.column_types
					.as_ref()
					.and_then(|column_types| column_types.get(column_name).cloned())
			})
			.collect();

		// If any column type was not specified, pass over the csv to infer it.
		let mut n_rows = None;
		if column_types.iter().any(|column_type| column_type.is_none()) {
			let mut infer_stats: Vec<(usize, InferStats)> = column_types
				.iter()
				.enumerate()
				.filter(|(_, column_type)| column_type.is_none())
				.map(|(index, _)| (index, InferStats::new(invalid_values)))
				.collect();
			let mut record = csv::StringRecord::new();
			let mut n_rows_computed = 0;
			while reader.read_record(&mut record)? {
				n_rows_computed += 1;
				for (index, infer_stats) in infer_stats.iter_mut() {
					infer_stats.update(record.get(*index).unwrap_or(""));
				}
			}
			n_rows = Some(n_rows_computed);
			for (index, infer_stats) in infer_stats {
				let is_enum = options.enum_columns.contains(&column_names[index]);
				column_types[index] = Some(infer_stats.finalize(is_enum));
			}
			// After inference, return back to the beginning of the csv to load the values.
			reader.seek(start_position)?;
		}
		let column_types: Vec<ColumnType> = column_types.into_iter().flatten().collect();

		// Create the dataframe and a lookup from option to position for each enum column.
		let mut dataframe = Self::new(column_names, column_types);
		let option_indexes: Vec<Option<FnvHashMap<String, usize>>> = dataframe
			.columns
			.iter()
			.map(|column| {
				column.as_enum().map(|column| {
					column
						.options
						.iter()
						.enumerate()
						.map(|(index, option)| (option.clone(), index))
						.collect()
				})
			})
			.collect();
		if let Some(n_rows) = n_rows {
			for column in dataframe.columns.iter_mut() {
				match column {
					Column::Number(column) => column.data.reserve_exact(n_rows),
					Column::Enum(column) => column.data.reserve_exact(n_rows),
				}
			}
		}

		// Read each csv record and insert the values into the columns of the dataframe.
		let mut record = csv::ByteRecord::new();
		while reader.read_byte_record(&mut record)? {
			if let Some(position) = record.position() {
				progress(position.byte());
			}
			for ((column, option_index), value) in dataframe
				.columns
				.iter_mut()
				.zip(option_indexes.iter())
				.zip(record.iter())
			{
				match column {
					Column::Number(column) => {
						let value = match lexical::parse::<f32, &[u8]>(value) {
							Ok(value) if value.is_finite() => value,
							_ => std::f32::NAN,
						};
						column.data.push(value);
					}
					Column::Enum(column) => {
						let value = std::str::from_utf8(value)
							.ok()
							.and_then(|value| option_index.as_ref()?.get(value))
							.and_then(|position| NonZeroUsize::new(*position + 1));
						column.data.push(value);
					}
				}
			}
		}
		Ok(dataframe)
	}
}

#[derive(Clone, Debug)]
struct InferStats<'a> {
	invalid_values: &'a [&'a str],
	all_numbers: bool,
	unique_values: BTreeSet<String>,
}

impl<'a> InferStats<'a> {
	fn new(invalid_values: &'a [&'a str]) -> Self {
		Self {
			invalid_values,
			all_numbers: true,
			unique_values: BTreeSet::new(),
		}
	}

	fn update(&mut self, value: &str) {
		if self.invalid_values.contains(&value) {
			return;
		}
		if !self.unique_values.contains(value) {
			self.unique_values.insert(value.to_owned());
		}
		if self.all_numbers
			&& !lexical::parse::<f32, &str>(value)
				.map(|v| v.is_finite())
				.unwrap_or(false)
		{
			self.all_numbers = false;
		}
	}

	fn finalize(self, is_enum: bool) -> ColumnType {
		// A column with no valid values, or with only the values zero and one, is an enum column.
		let is_binary = self
			.unique_values
			.iter()
			.all(|value| value == "0" || value == "1");
		if self.all_numbers && !is_binary && !is_enum {
			ColumnType::Number
		} else {
			ColumnType::Enum {
				options: self.unique_values.into_iter().collect(),
			}
		}
	}
}

#[test]
fn test_infer() {
	let csv = r#"number,enum,flag
1,test,0
2,?,1
"#;
	let df = DataFrame::from_csv(
		&mut csv::Reader::from_reader(std::io::Cursor::new(csv)),
		FromCsvOptions::default(),
		|_| {},
	)
	.unwrap();
	insta::assert_debug_snapshot!(df, @r###"
 DataFrame {
     columns: [
         Number(
             NumberColumn {
                 name: "number",
                 data: [
                     1.0,
                     2.0,
                 ],
             },
         ),
         Enum(
             EnumColumn {
                 name: "enum",
                 options: [
                     "test",
                 ],
                 data: [
                     Some(
                         1,
                     ),
                     None,
                 ],
             },
         ),
         Enum(
             EnumColumn {
                 name: "flag",
                 options: [
                     "0",
                     "1",
                 ],
                 data: [
                     Some(
                         1,
                     ),
                     Some(
                         2,
                     ),
                 ],
             },
         ),
     ],
 }
 "###);
}

#[test]
fn test_column_types() {
	let csv = r#"number,enum
1,hello
2,world
"#;
	let mut column_types = BTreeMap::new();
	column_types.insert("number".to_owned(), ColumnType::Enum {
		options: vec!["2".to_owned(), "1".to_owned()],
	});
	column_types.insert("enum".to_owned(), ColumnType::Enum {
		options: vec!["world".to_owned()],
	});
	let df = DataFrame::from_csv(
		&mut csv::Reader::from_reader(std::io::Cursor::new(csv)),
		FromCsvOptions {
			column_types: Some(column_types),
			..Default::default()
		},
		|_| {},
	)
	.unwrap();
	let number = df.column("number").unwrap().as_enum().unwrap();
	assert_eq!(number.option(0), Some("1"));
	assert_eq!(number.option(1), Some("2"));
	let enum_column = df.column("enum").unwrap().as_enum().unwrap();
	assert_eq!(enum_column.option(0), None);
	assert_eq!(enum_column.option(1), Some("world"));
}

#[test]
fn test_enum_columns() {
	let csv = "level,class\n1,2\n3,1\n?,2\n";
	let enum_columns = vec!["class".to_owned()];
	let df = DataFrame::from_csv(
		&mut csv::Reader::from_reader(std::io::Cursor::new(csv)),
		FromCsvOptions {
			enum_columns: &enum_columns,
			..Default::default()
		},
		|_| {},
	)
	.unwrap();
	let level = df.column("level").unwrap().as_number().unwrap();
	assert_eq!(&level.data[0..2], &[1.0, 3.0]);
	assert!(level.data[2].is_nan());
	let class = df.column("class").unwrap().as_enum().unwrap();
	assert_eq!(class.options, vec!["1".to_owned(), "2".to_owned()]);
	assert_eq!(df.row(1)[1], Value::Enum(Some("1")));
	assert_eq!(df.row(2)[1], Value::Enum(Some("2")));
}

/*!
This module defines the `Config` struct, which is used to configure mining and training with [`Classifier::train`](../struct.Classifier.html#method.train). A config is read from JSON or from a flat map of option names to values, and options it leaves out take their defaults.
*/

use crate::{
	error::{Error, Result},
	DatasetOptions, Estimator, ItemOrdering, Miner, TrainOptions,
};
use std::str::FromStr;

#[derive(Clone, Debug, Default, PartialEq, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
	#[serde(rename = "Minimum support")]
	pub minimum_support: Option<f64>,
	/// JSON cannot hold infinity, so leave this out to mine jumping patterns only.
	#[serde(rename = "Minimum GrowthRate")]
	pub minimum_growth_rate: Option<f64>,
	#[serde(rename = "Ordering")]
	pub ordering: Option<ItemOrdering>,
	#[serde(rename = "Miner")]
	pub miner: Option<Miner>,
	#[serde(rename = "Estimator")]
	pub estimator: Option<Estimator>,
	#[serde(rename = "Maximum length")]
	pub max_length: Option<usize>,
	/// The tolerance of numeric items. Number columns are only accepted when this is set.
	#[serde(rename = "Alpha")]
	pub alpha: Option<f64>,
	#[serde(rename = "Rules per class")]
	pub rules_per_class: Option<usize>,
	/// Columns whose values are nominal codes even though they look like numbers.
	#[serde(rename = "Nominal columns")]
	pub nominal_columns: Option<Vec<String>>,
}

impl Config {
	pub fn from_json(json: &str) -> Result<Self> {
		serde_json::from_str(json).map_err(|error| Error::InvalidConfig(error.to_string()))
	}

	/// Read a config from option names and values, such as `("Minimum support", "0.05")`.
	pub fn from_parameters<'a>(
		parameters: impl IntoIterator<Item = (&'a str, &'a str)>,
	) -> Result<Self> {
		let mut config = Config::default();
		for (key, value) in parameters {
			match key {
				"Minimum support" => config.minimum_support = Some(parse(key, value)?),
				"Minimum GrowthRate" => config.minimum_growth_rate = Some(parse(key, value)?),
				"Ordering" => config.ordering = Some(parse(key, value)?),
				"Miner" => config.miner = Some(parse(key, value)?),
				"Estimator" => config.estimator = Some(parse(key, value)?),
				"Maximum length" => config.max_length = Some(parse(key, value)?),
				"Alpha" => config.alpha = Some(parse(key, value)?),
				"Rules per class" => config.rules_per_class = Some(parse(key, value)?),
				"Nominal columns" => {
					config.nominal_columns = Some(
						value
							.split(',')
							.map(|column| column.trim().to_owned())
							.filter(|column| !column.is_empty())
							.collect(),
					)
				}
				_ => {
					return Err(Error::InvalidConfig(format!(
						"unknown option \"{}\"",
						key
					)))
				}
			}
		}
		Ok(config)
	}

	pub fn train_options(&self) -> Result<TrainOptions> {
		let defaults = TrainOptions::default();
		let options = TrainOptions {
			minimum_support: self.minimum_support.unwrap_or(defaults.minimum_support),
			minimum_growth_rate: self
				.minimum_growth_rate
				.unwrap_or(defaults.minimum_growth_rate),
			ordering: self.ordering.unwrap_or(defaults.ordering),
			miner: self.miner.unwrap_or(defaults.miner),
			estimator: self.estimator.unwrap_or(defaults.estimator),
			max_length: self.max_length.or(defaults.max_length),
			rules_per_class: self.rules_per_class.unwrap_or(defaults.rules_per_class),
		};
		options.validate()?;
		Ok(options)
	}

	pub fn dataset_options(&self) -> Result<DatasetOptions> {
		match self.alpha {
			Some(alpha) if !(alpha >= 0.0 && alpha.is_finite()) => Err(Error::InvalidConfig(
				"\"Alpha\" must be a finite number that is not negative".to_owned(),
			)),
			alpha => Ok(DatasetOptions {
				numeric_alpha: alpha,
				nominal_columns: self.nominal_columns.clone().unwrap_or_default(),
			}),
		}
	}
}

fn parse<T: FromStr>(key: &str, value: &str) -> Result<T> {
	value.trim().parse().map_err(|_| {
		Error::InvalidConfig(format!(
			"\"{}\" is not a valid value for \"{}\"",
			value, key
		))
	})
}

impl FromStr for ItemOrdering {
	type Err = Error;
	fn from_str(value: &str) -> Result<Self> {
		match value {
			"support_ratio" => Ok(ItemOrdering::SupportRatio),
			"lexicographic" => Ok(ItemOrdering::Lexicographic),
			_ => Err(Error::InvalidConfig(format!("unknown ordering \"{}\"", value))),
		}
	}
}

impl FromStr for Miner {
	type Err = Error;
	fn from_str(value: &str) -> Result<Self> {
		match value {
			"cp_tree" => Ok(Miner::CpTree),
			"bsc_tree" => Ok(Miner::BscTree),
			_ => Err(Error::InvalidConfig(format!("unknown miner \"{}\"", value))),
		}
	}
}

impl FromStr for Estimator {
	type Err = Error;
	fn from_str(value: &str) -> Result<Self> {
		match value {
			"laplace" => Ok(Estimator::Laplace),
			"m_estimate" => Ok(Estimator::MEstimate),
			_ => Err(Error::InvalidConfig(format!("unknown estimator \"{}\"", value))),
		}
	}
}

#[test]
fn test_from_json() {
	let config = Config::from_json(
		r#"{
			"Minimum support": 0.05,
			"Ordering": "lexicographic",
			"Miner": "bsc_tree",
			"Rules per class": 3,
			"Nominal columns": ["zip code"]
		}"#,
	)
	.unwrap();
	let options = config.train_options().unwrap();
	assert_eq!(options.minimum_support, 0.05);
	assert_eq!(options.minimum_growth_rate, f64::INFINITY);
	assert_eq!(options.ordering, ItemOrdering::Lexicographic);
	assert_eq!(options.miner, Miner::BscTree);
	assert_eq!(options.estimator, Estimator::MEstimate);
	assert_eq!(options.rules_per_class, 3);
	let dataset_options = config.dataset_options().unwrap();
	assert_eq!(dataset_options.numeric_alpha, None);
	assert_eq!(dataset_options.nominal_columns, vec!["zip code".to_owned()]);
	assert!(matches!(
		Config::from_json(r#"{ "Minimum Support": 0.05 }"#),
		Err(Error::InvalidConfig(_))
	));
	assert!(matches!(
		Config::from_json(r#"{ "Miner": "fp_growth" }"#),
		Err(Error::InvalidConfig(_))
	));
}

#[test]
fn test_from_parameters() {
	let config = Config::from_parameters(vec![
		("Minimum support", "0.2"),
		("Minimum GrowthRate", " inf "),
		("Estimator", "laplace"),
		("Maximum length", "3"),
		("Alpha", "0.5"),
		("Nominal columns", "level, grade,"),
	])
	.unwrap();
	let options = config.train_options().unwrap();
	assert_eq!(options.minimum_support, 0.2);
	assert_eq!(options.minimum_growth_rate, f64::INFINITY);
	assert_eq!(options.estimator, Estimator::Laplace);
	assert_eq!(options.max_length, Some(3));
	let dataset_options = config.dataset_options().unwrap();
	assert_eq!(dataset_options.numeric_alpha, Some(0.5));
	assert_eq!(
		dataset_options.nominal_columns,
		vec!["level".to_owned(), "grade".to_owned()]
	);
	let invalid: Vec<Vec<(&str, &str)>> = vec![
		vec![("Minimum support", "lots")],
		vec![("Ordering", "random")],
		vec![("Pruning depth", "2")],
	];
	for parameters in invalid {
		assert!(matches!(
			Config::from_parameters(parameters),
			Err(Error::InvalidConfig(_))
		));
	}
	let config = Config::from_parameters(vec![("Minimum support", "1.5")]).unwrap();
	assert!(matches!(
		config.train_options(),
		Err(Error::InvalidConfig(_))
	));
	let config = Config::from_parameters(vec![("Alpha", "-1")]).unwrap();
	assert!(matches!(
		config.dataset_options(),
		Err(Error::InvalidConfig(_))
	));
}

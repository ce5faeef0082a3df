//! This module contains the main entrypoint to the emerge cli.

use self::progress_view::ProgressView;
use clap::Parser;
use colored::Colorize;
use emerge_dataframe::{DataFrame, FromCsvOptions};
use emerge_mining::{Classifier, Config, Dataset, RuleSet};
use emerge_util::{err, error::Result};
use std::path::PathBuf;

mod progress_view;

#[derive(Parser)]
#[clap(
	about = "Mine strong jumping emerging patterns and classify with them.",
	setting = clap::AppSettings::DisableHelpSubcommand,
)]
enum Options {
	#[clap(name = "train")]
	Train(Box<TrainOptions>),
}

#[derive(Parser, Debug)]
#[clap(about = "mine patterns from a csv file and evaluate them as a classifier")]
struct TrainOptions {
	#[clap(short, long, help = "the path to your .csv file")]
	file: PathBuf,
	#[clap(short, long, help = "the name of the column holding the class")]
	target: String,
	#[clap(short, long, help = "the path to a json config file")]
	config: Option<PathBuf>,
	#[clap(short, long, help = "the path to write the rules to, as json")]
	output: Option<PathBuf>,
	#[clap(
		long,
		default_value = "0.2",
		help = "the fraction of rows held out for testing"
	)]
	test_fraction: f64,
	#[clap(long, default_value = "42", help = "the seed of the train/test shuffle")]
	seed: u64,
	#[clap(long = "no-progress", help = "disable the progress view", parse(from_flag = std::ops::Not::not))]
	progress: bool,
}

fn main() {
	let options = Options::parse();
	let result = match options {
		Options::Train(options) => cli_train(*options),
	};
	if let Err(error) = result {
		eprintln!("{}: {}", "error".red().bold(), error);
		std::process::exit(1);
	}
}

fn cli_train(options: TrainOptions) -> Result<()> {
	if !(0.0..1.0).contains(&options.test_fraction) {
		return Err(err!(
			"the test fraction must be in [0, 1) but is {}",
			options.test_fraction
		));
	}

	// Read the config, falling back to the defaults.
	let config = match options.config.as_ref() {
		Some(path) => {
			let json = std::fs::read_to_string(path)
				.map_err(|error| err!("failed to read {}: {}", path.display(), error))?;
			Config::from_json(&json)?
		}
		None => Config::default(),
	};
	let train_options = config.train_options()?;

	// Load the csv and reduce its rows to transactions.
	// The class and the configured nominal columns load as enums even when their values look like numbers.
	let dataset_options = config.dataset_options()?;
	let enum_columns = dataset_options.enum_columns(&options.target);
	let dataframe = DataFrame::from_path(
		&options.file,
		FromCsvOptions {
			enum_columns: &enum_columns,
			..Default::default()
		},
		|_| {},
	)?;
	let dataset = Dataset::from_dataframe(&dataframe, &options.target, &dataset_options)?;
	let (dataset_train, dataset_test) = dataset.split(options.test_fraction, options.seed);
	if dataset_train.nrows() == 0 {
		return Err(err!("no rows are left for training"));
	}

	// Train with the progress view if enabled.
	let mut classifier = {
		let mut progress_view = if options.progress {
			Some(ProgressView::new())
		} else {
			None
		};
		Classifier::train(&dataset_train, &train_options, &mut |progress| {
			if let Some(progress_view) = progress_view.as_mut() {
				progress_view.update(progress)
			}
		})?
	};

	// Report the pruned rules and the accuracy of each rule set on the test rows.
	println!("{}", "Pruned rules".bold());
	for pattern in classifier.pruned.iter() {
		println!(
			"{} => {} (support {:.4}, growth rate {})",
			pattern.display(&classifier.items),
			classifier.classes[pattern.class],
			pattern.support,
			pattern.growth_rate,
		);
	}
	if dataset_test.nrows() > 0 {
		let evaluation = classifier.evaluate(&dataset_test);
		println!();
		println!("{}", "Test accuracy".bold());
		for (rule_set, metrics) in RuleSet::ALL.iter().zip(
			[
				&evaluation.unfiltered,
				&evaluation.pruned,
				&evaluation.class_filtered,
			]
			.iter(),
		) {
			println!(
				"{:>16}: {:.4} with {} rules (baseline {:.4})",
				rule_set.name(),
				metrics.accuracy,
				classifier.rules(*rule_set).len(),
				metrics.baseline_accuracy,
			);
		}
	}

	// Write the rules to the output path.
	if let Some(output_path) = options.output {
		let file = std::fs::File::create(&output_path)?;
		serde_json::to_writer_pretty(file, &classifier)?;
		eprintln!("Your rules were written to {}.", output_path.display());
	}

	Ok(())
}

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// These are the ways learning or mining can fail. Degenerate measures such as a zero or infinite growth rate are not errors.
#[derive(Debug, Error)]
pub enum Error {
	/// The dataset has a shape the miner cannot handle, for example a number column when no tolerance for numeric items is configured.
	#[error("unsupported dataset: {0}")]
	UnsupportedDataset(String),
	/// A computed class probability fell outside [0, 1]. This indicates a bug, and fails the learning call that computed it.
	#[error("the probability of \"{item}\" for class {class} is {probability}, which is outside [0, 1]")]
	InvalidProbability {
		item: String,
		class: usize,
		probability: f64,
	},
	#[error("invalid config: {0}")]
	InvalidConfig(String),
}

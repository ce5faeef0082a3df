pub use anyhow::{Error, Result};

/// Create an [`Error`](type.Error.html) from a format string, like `format!`.
#[macro_export]
macro_rules! err {
	($($t:tt)*) => {
		$crate::error::Error::msg(format!($($t)*))
	};
}

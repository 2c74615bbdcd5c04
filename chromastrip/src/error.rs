//! Error types surfaced by the palette pipeline

use thiserror::Error;

/// Result type alias for palette operations
pub type Result<T> = std::result::Result<T, PaletteError>;

/// The ways building a palette can fail
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PaletteError {
	/// One or more color codes are not of the form `#RRGGBB`
	///
	/// Every offending value is listed, not just the first one.
	#[error("invalid hex color codes: {}", .values.join(", "))]
	InvalidInput {
		/// The rejected color codes, in input order
		values: Vec<String>,
	},

	/// The cluster count is outside `1..=max`
	#[error("cluster count {k} is not in the range 1..={max}")]
	InvalidClusterCount {
		/// The requested number of clusters
		k: u8,
		/// The largest cluster count allowed for this input
		max: usize,
	},

	/// The numeric backend was used before [`crate::initialize`] was called
	#[error("the numeric backend has not been initialized")]
	NotReady,

	/// A pipeline stage produced values that cannot be clustered
	#[error("{stage} failed: {reason}")]
	ComputationFailure {
		/// The stage that failed
		stage: &'static str,
		/// Short description of the failure
		reason: String,
	},
}

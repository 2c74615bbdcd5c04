//! Group hex colors by perceptual similarity and order them into a palette strip.
//!
//! The pipeline converts each `#RRGGBB` code to a perceptual color space (CIE LCh or HSL),
//! standardizes the coordinates, partitions them with seeded k-means, sorts each cluster
//! by a perceptual key, and concatenates the clusters in label order.
//!
//! # Examples
//!
//! ## Build a palette with the default options
//!
//! ```
//! chromastrip::initialize();
//!
//! let codes = ["#FF0000", "#00FF00", "#0000FF", "#FF0001"];
//! let palette = chromastrip::build_palette(&codes, 2, &chromastrip::Options::default())?;
//!
//! assert_eq!(palette.len(), 4);
//! assert_eq!(palette.weights, vec![1.0; 4]);
//! # Ok::<(), chromastrip::PaletteError>(())
//! ```
//!
//! ## Use HSL and a lightness-first sort with an owned backend
//!
//! ```
//! use chromastrip::{Backend, ColorSpace, Options, SortOrder};
//!
//! let backend = Backend::new();
//! let options = Options::default()
//! 	.with_color_space(ColorSpace::Hsl)
//! 	.with_sort_order(SortOrder::Lch);
//!
//! let palette = backend.build_palette(&["#102030", "#A0B0C0", "#405060"], 1, &options)?;
//! assert_eq!(palette.hex_codes(), ["#102030", "#405060", "#A0B0C0"]);
//! # Ok::<(), chromastrip::PaletteError>(())
//! ```
//!
//! # Options
//!
//! ## Color Space
//!
//! [`ColorSpace::Lch`] (the default) converts through CIE XYZ and Lab under the D65 white point.
//! [`ColorSpace::Hsl`] works directly on the encoded sRGB values.
//!
//! ## Hue Encoding
//!
//! Hue is an angle, so by default it is clustered through its cartesian form
//! ([`HueEncoding::Circular`]), which keeps reds at `1°` and `359°` together.
//! [`HueEncoding::Linear`] clusters on the raw `(lightness, chroma, hue)` triple instead.
//! Sorting always uses the raw hue angle.
//!
//! ## Sort Order
//!
//! The permutation of hue, chroma, and lightness used to order colors within each cluster.
//! [`SortOrder::Hcl`] is the default.
//!
//! ## Trials, Max Iterations, and Seed
//!
//! k-means can get stuck in a local minimum, so `trials` independent runs are made and the one with the
//! lowest inertia is kept. Each run stops once no color changes cluster, or after `max_iter` iterations.
//! Trial `i` seeds its generator with `seed ^ i`, so the same input and options always give the same palette.

#![deny(unsafe_code)]
#![warn(clippy::pedantic, clippy::cargo)]
#![warn(clippy::use_debug, clippy::dbg_macro, clippy::todo, clippy::unimplemented)]
#![warn(clippy::unwrap_used, clippy::unwrap_in_result)]
#![warn(clippy::unneeded_field_pattern, clippy::rest_pat_in_fully_bound_structs)]
#![warn(clippy::unnecessary_self_imports)]
#![warn(clippy::str_to_string, clippy::string_to_string, clippy::string_slice)]
#![warn(missing_docs, clippy::missing_docs_in_private_items, rustdoc::all)]
#![warn(clippy::float_cmp_const, clippy::lossy_float_literal)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::enum_glob_use)]
#![allow(clippy::unreadable_literal)]

pub mod backend;
pub mod color;
mod error;
pub mod kmeans;
pub mod normalize;
pub mod sort;
pub mod strip;

pub use backend::{initialize, Backend};
pub use color::{ColorSpace, Coordinate, HexColor};
pub use error::{PaletteError, Result};
pub use kmeans::Clustering;
pub use normalize::HueEncoding;
pub use sort::SortOrder;
pub use strip::{Palette, DISPLAY_WEIGHT};

/// The largest number of clusters that may be requested
pub const MAX_CLUSTERS: u8 = 20;

/// Tunable parameters of the palette pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Options {
	/// The color space colors are clustered and sorted in
	pub color_space: ColorSpace,
	/// How hue is laid out for clustering
	pub hue_encoding: HueEncoding,
	/// The key used to order colors within a cluster
	pub sort_order: SortOrder,
	/// The seed for choosing the starting centroids
	pub seed: u64,
	/// The maximum number of iterations for each k-means trial
	pub max_iter: u32,
	/// The number of k-means trials to run, keeping the lowest inertia
	pub trials: u32,
}

impl Default for Options {
	fn default() -> Self {
		Self {
			color_space: ColorSpace::Lch,
			hue_encoding: HueEncoding::Circular,
			sort_order: SortOrder::Hcl,
			seed: 42,
			max_iter: 300,
			trials: 10,
		}
	}
}

impl Options {
	/// Set the color space
	#[must_use]
	pub fn with_color_space(mut self, color_space: ColorSpace) -> Self {
		self.color_space = color_space;
		self
	}

	/// Set the hue encoding
	#[must_use]
	pub fn with_hue_encoding(mut self, hue_encoding: HueEncoding) -> Self {
		self.hue_encoding = hue_encoding;
		self
	}

	/// Set the sort order
	#[must_use]
	pub fn with_sort_order(mut self, sort_order: SortOrder) -> Self {
		self.sort_order = sort_order;
		self
	}

	/// Set the seed
	#[must_use]
	pub fn with_seed(mut self, seed: u64) -> Self {
		self.seed = seed;
		self
	}

	/// Set the maximum number of iterations per trial
	#[must_use]
	pub fn with_max_iter(mut self, max_iter: u32) -> Self {
		self.max_iter = max_iter;
		self
	}

	/// Set the number of trials
	#[must_use]
	pub fn with_trials(mut self, trials: u32) -> Self {
		self.trials = trials;
		self
	}
}

/// The largest valid cluster count for `n` colors
#[must_use]
pub fn max_clusters(n: usize) -> usize {
	usize::min(usize::from(MAX_CLUSTERS), n)
}

/// Build a palette strip using the process-wide backend.
///
/// See the crate documentation for examples and information on each option.
///
/// # Errors
/// - [`PaletteError::NotReady`] if [`initialize`] has not been called.
/// - [`PaletteError::InvalidInput`] listing every code that is not `#RRGGBB`.
/// - [`PaletteError::InvalidClusterCount`] if `k` is not in `1..=min(20, hexcodes.len())`.
/// - [`PaletteError::ComputationFailure`] if the colors could not be standardized.
pub fn build_palette<S: AsRef<str>>(hexcodes: &[S], k: u8, options: &Options) -> Result<Palette> {
	backend::get()?.build_palette(hexcodes, k, options)
}

impl Backend {
	/// Build a palette strip with this backend.
	///
	/// See [`build_palette`] for the possible errors, apart from [`PaletteError::NotReady`].
	///
	/// # Errors
	/// Returns an error if the input or cluster count is invalid or the colors could not be standardized.
	pub fn build_palette<S: AsRef<str>>(&self, hexcodes: &[S], k: u8, options: &Options) -> Result<Palette> {
		let colors = color::parse_hex_codes(hexcodes)?;

		let max = max_clusters(colors.len());
		if k == 0 || usize::from(k) > max {
			return Err(PaletteError::InvalidClusterCount { k, max });
		}

		tracing::debug!(colors = colors.len(), k, ?options, "building palette");

		// Cluster in a canonical order so the result does not depend on the input order
		let mut canonical = (0..colors.len()).collect::<Vec<_>>();
		canonical.sort_by_key(|&i| (colors[i].packed(), i));

		let coordinates = colors
			.iter()
			.map(|color| color.to_coordinate(self, options.color_space))
			.collect::<Vec<_>>();

		let canonical_coordinates = canonical.iter().map(|&i| coordinates[i]).collect::<Vec<_>>();
		let features = normalize::standardize(&canonical_coordinates, options.hue_encoding)?;

		let mut clustering = kmeans::run(&features, k, options.max_iter, options.trials, options.seed);

		let mut labels = vec![0; colors.len()];
		for (&i, &label) in canonical.iter().zip(&clustering.labels) {
			labels[i] = label;
		}
		clustering.labels = labels;

		tracing::debug!(
			sizes = ?clustering.sizes(),
			inertia = clustering.inertia,
			iterations = clustering.iterations,
			"clustered colors"
		);

		Ok(strip::assemble(&colors, &coordinates, &clustering, options.sort_order))
	}
}

//! Specifies the CLI and handles arg parsing

use chromastrip::{ColorSpace, HueEncoding, SortOrder, MAX_CLUSTERS};
use clap::{Parser, ValueEnum};

/// Supported output formats for the final colors
#[derive(Copy, Clone, ValueEnum)]
pub enum FormatOutput {
	/// sRGB hexcode, as given in the input
	Hex,
	/// sRGB (r,g,b) triple
	Rgb,
	/// Whitespace with true color background
	Swatch,
	/// The full palette (colors, weights, and cluster labels) as JSON
	Json,
}

/// Ways to colorize the output text
#[derive(Copy, Clone, ValueEnum)]
pub enum ColorizeOutput {
	/// Foreground
	Fg,
	/// Background
	Bg,
}

/// The color space to cluster and sort in
#[derive(Copy, Clone, ValueEnum)]
pub enum SpaceArg {
	/// CIE LCh under D65
	Lch,
	/// HSL of the sRGB values
	Hsl,
}

impl From<SpaceArg> for ColorSpace {
	fn from(space: SpaceArg) -> Self {
		match space {
			SpaceArg::Lch => ColorSpace::Lch,
			SpaceArg::Hsl => ColorSpace::Hsl,
		}
	}
}

/// How hue is laid out for clustering
#[derive(Copy, Clone, ValueEnum)]
pub enum HueArg {
	/// Cartesian form, so hues near 0° and 360° are close
	Circular,
	/// Raw angle in degrees
	Linear,
}

impl From<HueArg> for HueEncoding {
	fn from(hue: HueArg) -> Self {
		match hue {
			HueArg::Circular => HueEncoding::Circular,
			HueArg::Linear => HueEncoding::Linear,
		}
	}
}

/// Sort keys for the colors within each cluster
#[derive(Copy, Clone, ValueEnum)]
pub enum SortArg {
	/// Hue, chroma, lightness
	Hcl,
	/// Hue, lightness, chroma
	Hlc,
	/// Chroma, hue, lightness
	Chl,
	/// Chroma, lightness, hue
	Clh,
	/// Lightness, hue, chroma
	Lhc,
	/// Lightness, chroma, hue
	Lch,
}

impl From<SortArg> for SortOrder {
	fn from(sort: SortArg) -> Self {
		match sort {
			SortArg::Hcl => SortOrder::Hcl,
			SortArg::Hlc => SortOrder::Hlc,
			SortArg::Chl => SortOrder::Chl,
			SortArg::Clh => SortOrder::Clh,
			SortArg::Lhc => SortOrder::Lhc,
			SortArg::Lch => SortOrder::Lch,
		}
	}
}

/// Group hex colors by perceptual similarity and print them as an ordered palette strip.
///
/// Colors are converted to LCH or HSL, clustered with k-means, and sorted within each cluster.
#[derive(Parser)]
#[command(version)]
pub struct Options {
	/// The #RRGGBB colors to arrange
	///
	/// If none are given, colors are read from stdin, one per line. Blank lines are skipped.
	pub colors: Vec<String>,

	/// The number of clusters to group the colors into
	///
	/// Must be at most 20 and at most the number of colors.
	#[arg(short, default_value_t = 5, value_parser = clap::value_parser!(u8).range(1..=i64::from(MAX_CLUSTERS)))]
	pub k: u8,

	/// The color space to cluster and sort in
	#[arg(long, default_value = "lch")]
	pub space: SpaceArg,

	/// How hue is laid out for clustering
	///
	/// With linear hue, reds just above 0° and just below 360° end up at opposite ends.
	#[arg(long, default_value = "circular")]
	pub hue: HueArg,

	/// The order to sort the colors in within each cluster
	#[arg(short, long, default_value = "hcl")]
	pub sort: SortArg,

	/// The seed value used for choosing the starting centroids
	#[arg(long, default_value_t = 42)]
	pub seed: u64,

	/// The maximum number of iterations for each k-means trial
	#[arg(short = 'i', long, default_value_t = 300)]
	pub max_iter: u32,

	/// The number of trials of k-means to run
	///
	/// k-means can get stuck in a local minimum, so a few trials are run by default.
	/// The trial with the lowest inertia is picked.
	#[arg(short = 'n', long, default_value_t = 10)]
	pub trials: u32,

	/// The format to print the colors in
	#[arg(short, long, default_value = "hex")]
	pub output: FormatOutput,

	/// Color the foreground or background for each printed color
	#[arg(short, long)]
	pub colorize: Option<ColorizeOutput>,

	/// Reverse the printed order of the colors
	#[arg(short, long)]
	pub reverse: bool,

	/// Print each cluster on its own line
	#[arg(short, long)]
	pub group: bool,

	/// The number of threads to use for k-means trials
	///
	/// A value of 0 uses the number of available cores.
	#[cfg(feature = "threads")]
	#[arg(short, long, default_value_t = 0)]
	pub threads: u8,

	/// Log additional information, such as the cluster sizes and k-means inertia
	#[arg(long)]
	pub verbose: bool,
}

impl Options {
	/// The library options selected by the arguments
	pub fn palette_options(&self) -> chromastrip::Options {
		chromastrip::Options::default()
			.with_color_space(self.space.into())
			.with_hue_encoding(self.hue.into())
			.with_sort_order(self.sort.into())
			.with_seed(self.seed)
			.with_max_iter(self.max_iter)
			.with_trials(self.trials)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use clap::CommandFactory;

	#[test]
	fn verify_cli() {
		Options::command().debug_assert();
	}

	#[test]
	fn defaults_match_library() {
		let options = Options::parse_from(["chromastrip", "#FF0000"]);
		assert_eq!(options.palette_options(), chromastrip::Options::default());
		assert_eq!(options.k, 5);
		assert_eq!(options.colors, ["#FF0000"]);
	}

	#[test]
	fn cluster_count_is_bounded() {
		assert!(Options::try_parse_from(["chromastrip", "-k", "0"]).is_err());
		assert!(Options::try_parse_from(["chromastrip", "-k", "21"]).is_err());
		assert!(Options::try_parse_from(["chromastrip", "-k", "20"]).is_ok());
	}

	#[test]
	fn arguments_map_to_library_options() {
		let options = Options::parse_from([
			"chromastrip", "--space", "hsl", "--hue", "linear", "-s", "lhc", "--seed", "7", "-i", "20", "-n", "3",
		]);

		assert_eq!(
			options.palette_options(),
			chromastrip::Options {
				color_space: ColorSpace::Hsl,
				hue_encoding: HueEncoding::Linear,
				sort_order: SortOrder::Lhc,
				seed: 7,
				max_iter: 20,
				trials: 3,
			}
		);
	}
}

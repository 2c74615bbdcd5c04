//! Standardization of perceptual coordinates into clustering features

use crate::{color::Coordinate, error::PaletteError, Result};

/// A point in the 3-dimensional standardized feature space
pub type Feature = [f64; 3];

/// Relative bound under which a standard deviation is rounding noise and treated as zero
///
/// Summing identical values does not always round trip through the mean exactly,
/// so a constant dimension can come out with a tiny nonzero deviation.
const ZERO_SCALE: f64 = 10.0 * f64::EPSILON;

/// How the hue angle of a [`Coordinate`] is laid out before standardization
///
/// Hue is an angle, so with [`HueEncoding::Linear`] the colors at `1°` and `359°` end up
/// at opposite ends of the hue axis. [`HueEncoding::Circular`] instead uses the cartesian form
/// `(lightness, chroma * cos(hue), chroma * sin(hue))`, which for LCH is exactly CIELAB.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum HueEncoding {
	/// `(lightness, chroma * cos(hue), chroma * sin(hue))`
	#[default]
	Circular,
	/// `(lightness, chroma, hue)` with hue in degrees
	Linear,
}

impl HueEncoding {
	/// Lay out a coordinate as a raw (unstandardized) feature
	#[must_use]
	pub fn encode(self, coordinate: Coordinate) -> Feature {
		let lightness = f64::from(coordinate.lightness);
		let chroma = f64::from(coordinate.chroma);
		let hue = f64::from(coordinate.hue);

		match self {
			Self::Circular => {
				let (sin, cos) = hue.to_radians().sin_cos();
				[lightness, chroma * cos, chroma * sin]
			},
			Self::Linear => [lightness, chroma, hue],
		}
	}
}

/// Per-dimension mean and population standard deviation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scaler {
	/// Arithmetic mean of each dimension
	pub mean: [f64; 3],
	/// Standard deviation of each dimension, or `0.0` if the dimension has no variance
	pub scale: [f64; 3],
}

impl Scaler {
	/// Compute the mean and standard deviation of each dimension
	///
	/// An empty slice gives a zero mean and zero scale.
	#[must_use]
	pub fn fit(points: &[Feature]) -> Self {
		let mut mean = [0.0; 3];
		let mut scale = [0.0; 3];

		if points.is_empty() {
			return Self { mean, scale };
		}

		// slices of colors are far below 2^52 elements
		#[allow(clippy::cast_precision_loss)]
		let n = points.len() as f64;

		for dim in 0..3 {
			let avg = points.iter().map(|point| point[dim]).sum::<f64>() / n;
			let variance = points.iter().map(|point| (point[dim] - avg).powi(2)).sum::<f64>() / n;
			let std = variance.sqrt();

			mean[dim] = avg;
			scale[dim] = if std <= ZERO_SCALE * n * f64::max(avg.abs(), 1.0) { 0.0 } else { std };
		}

		Self { mean, scale }
	}

	/// Shift and scale a point to zero mean and unit variance
	///
	/// Dimensions with no variance map to `0.0`.
	#[must_use]
	#[allow(clippy::float_cmp)]
	pub fn transform(&self, point: Feature) -> Feature {
		let mut feature = [0.0; 3];
		for (dim, value) in feature.iter_mut().enumerate() {
			let scale = self.scale[dim];
			*value = if scale == 0.0 { 0.0 } else { (point[dim] - self.mean[dim]) / scale };
		}
		feature
	}

	/// The dimensions that have no variance
	#[allow(clippy::float_cmp)]
	pub fn constant_dimensions(&self) -> impl Iterator<Item = usize> + '_ {
		self.scale.iter().enumerate().filter(|&(_, &scale)| scale == 0.0).map(|(dim, _)| dim)
	}
}

/// Standardize every coordinate, returning one feature per coordinate in the same order.
///
/// # Errors
/// Returns [`PaletteError::ComputationFailure`] if a coordinate or resulting feature is not finite.
pub fn standardize(coordinates: &[Coordinate], encoding: HueEncoding) -> Result<Vec<Feature>> {
	if let Some(index) = coordinates.iter().position(|coordinate| !coordinate.is_finite()) {
		return Err(PaletteError::ComputationFailure {
			stage: "normalization",
			reason: format!("color {index} converted to a non-finite coordinate"),
		});
	}

	let points = coordinates.iter().map(|&coordinate| encoding.encode(coordinate)).collect::<Vec<_>>();
	let scaler = Scaler::fit(&points);

	for dim in scaler.constant_dimensions() {
		tracing::debug!(dim, mean = scaler.mean[dim], "feature dimension has no variance");
	}

	tracing::debug!(
		colors = points.len(),
		mean = ?scaler.mean,
		scale = ?scaler.scale,
		"standardized features"
	);

	let features = points.into_iter().map(|point| scaler.transform(point)).collect::<Vec<_>>();

	if features.iter().flatten().all(|value| value.is_finite()) {
		Ok(features)
	} else {
		Err(PaletteError::ComputationFailure {
			stage: "normalization",
			reason: "standardization produced a non-finite feature".to_owned(),
		})
	}
}

//! Perceptual ordering of the colors within a cluster

use crate::color::Coordinate;
use std::cmp::Ordering;

/// The lexicographic key used to order colors within a cluster
///
/// Each letter names a component of a [`Coordinate`]: `H` for hue, `C` for chroma
/// (saturation in HSL), and `L` for lightness. Components are compared in ascending order,
/// and colors with equal keys keep their input order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum SortOrder {
	/// Hue, then chroma, then lightness
	#[default]
	Hcl,
	/// Hue, then lightness, then chroma
	Hlc,
	/// Chroma, then hue, then lightness
	Chl,
	/// Chroma, then lightness, then hue
	Clh,
	/// Lightness, then hue, then chroma
	Lhc,
	/// Lightness, then chroma, then hue
	Lch,
}

impl SortOrder {
	/// The components of `coordinate` in comparison order
	#[must_use]
	pub fn key(self, coordinate: Coordinate) -> [f32; 3] {
		let Coordinate { lightness: l, chroma: c, hue: h } = coordinate;
		match self {
			Self::Hcl => [h, c, l],
			Self::Hlc => [h, l, c],
			Self::Chl => [c, h, l],
			Self::Clh => [c, l, h],
			Self::Lhc => [l, h, c],
			Self::Lch => [l, c, h],
		}
	}

	/// Compare two coordinates by this order's key
	#[must_use]
	pub fn compare(self, x: Coordinate, y: Coordinate) -> Ordering {
		self.key(x)
			.iter()
			.zip(self.key(y))
			.map(|(a, b)| a.total_cmp(&b))
			.find(|ordering| ordering.is_ne())
			.unwrap_or(Ordering::Equal)
	}
}

/// Order the members of a cluster, given as indices into `coordinates`.
///
/// Members with equal keys are ordered by index, so the result is fully determined by the input.
#[must_use]
pub fn sorted_members(members: &[usize], coordinates: &[Coordinate], order: SortOrder) -> Vec<usize> {
	let mut sorted = members.to_vec();
	sorted.sort_unstable_by(|&x, &y| order.compare(coordinates[x], coordinates[y]).then(x.cmp(&y)));
	sorted
}

//! Assembly of sorted clusters into the final palette strip

use crate::{
	color::{Coordinate, HexColor},
	kmeans::Clustering,
	sort::{sorted_members, SortOrder},
};

/// The display weight given to every color in the strip
///
/// Every bar in a rendered strip has the same height.
pub const DISPLAY_WEIGHT: f32 = 1.0;

/// An ordered palette strip
///
/// Colors are grouped by ascending cluster label and perceptually sorted within each cluster.
/// `colors`, `weights`, and `labels` always have the same length.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Palette {
	/// Every input color exactly once, in display order
	pub colors: Vec<HexColor>,
	/// The display weight of each color, always [`DISPLAY_WEIGHT`]
	pub weights: Vec<f32>,
	/// The cluster label of each color, in ascending order
	pub labels: Vec<u8>,
	/// The requested number of clusters
	pub cluster_count: u8,
}

impl Palette {
	/// Number of colors in the strip
	#[must_use]
	pub fn len(&self) -> usize {
		self.colors.len()
	}

	/// Whether the strip has no colors
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.colors.is_empty()
	}

	/// The colors of each cluster in label order, including empty slices for unused labels
	pub fn clusters(&self) -> impl Iterator<Item = &[HexColor]> + '_ {
		(0..self.cluster_count).map(|label| {
			let start = self.labels.partition_point(|&l| l < label);
			let end = self.labels.partition_point(|&l| l <= label);
			&self.colors[start..end]
		})
	}

	/// The colors as plain strings, in display order
	#[must_use]
	pub fn hex_codes(&self) -> Vec<&str> {
		self.colors.iter().map(HexColor::as_str).collect()
	}
}

/// Concatenate each cluster's sorted members in ascending label order.
///
/// `colors`, `coordinates`, and `clustering.labels` must be parallel slices.
/// Labels with no members contribute nothing.
#[must_use]
pub fn assemble(colors: &[HexColor], coordinates: &[Coordinate], clustering: &Clustering, order: SortOrder) -> Palette {
	debug_assert_eq!(colors.len(), coordinates.len());
	debug_assert_eq!(colors.len(), clustering.labels.len());

	let mut members = vec![Vec::new(); usize::from(clustering.k)];
	for (index, &label) in clustering.labels.iter().enumerate() {
		members[usize::from(label)].push(index);
	}

	let mut palette = Palette {
		colors: Vec::with_capacity(colors.len()),
		weights: vec![DISPLAY_WEIGHT; colors.len()],
		labels: Vec::with_capacity(colors.len()),
		cluster_count: clustering.k,
	};

	// label < k <= u8::MAX
	#[allow(clippy::cast_possible_truncation)]
	for (label, members) in members.iter().enumerate() {
		for index in sorted_members(members, coordinates, order) {
			palette.colors.push(colors[index].clone());
			palette.labels.push(label as u8);
		}
	}

	palette
}

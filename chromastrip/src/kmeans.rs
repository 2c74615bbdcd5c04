//! Provides the implementation for seeded k-means over standardized features
//!
//! Each trial picks its starting centroids with k-means++ using a [`Xoshiro256PlusPlus`]
//! generator seeded with `seed ^ trial`, then runs Lloyd iterations until no point changes cluster
//! or the iteration limit is hit. The trial with the lowest inertia wins, ties going to the earlier trial.

use crate::normalize::Feature;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

/// Assignment of a point that has not been placed in any cluster yet
const UNASSIGNED: u8 = u8::MAX;

/// Squared euclidean distance between two features
fn squared_distance(x: Feature, y: Feature) -> f64 {
	let d0 = x[0] - y[0];
	let d1 = x[1] - y[1];
	let d2 = x[2] - y[2];
	d0 * d0 + d1 * d1 + d2 * d2
}

/// Bookkeeping for each k-means data point
struct PointData {
	/// Center assignment for this data point
	assignment: Vec<u8>,
	/// Weight of each data point used to randomly select starting centroids in k-means++
	weight: Vec<f64>,
}

impl PointData {
	/// Create a [`PointData`] with the given number data points
	fn new(n: usize) -> Self {
		Self {
			assignment: vec![UNASSIGNED; n],
			weight: vec![f64::INFINITY; n],
		}
	}
}

/// Data for each center/centroid
struct CenterData {
	/// The centroid point
	centroid: Vec<Feature>,
	/// Vector sum for all data points in this center
	sum: Vec<Feature>,
	/// Number of points in this center
	count: Vec<u32>,
}

impl CenterData {
	/// Create a [`CenterData`] with the given number of centers
	fn new(k: u8) -> Self {
		let k = usize::from(k);
		Self {
			centroid: Vec::with_capacity(k),
			sum: vec![[0.0; 3]; k],
			count: vec![0; k],
		}
	}
}

/// Holds all the state used by one k-means trial
struct KmeansState {
	/// Data for each center
	centers: CenterData,
	/// Data for each point
	points: PointData,
}

impl KmeansState {
	/// Initialize a new [`KmeansState`] with `k` centers and `n` data points
	fn new(k: u8, n: usize) -> Self {
		Self {
			centers: CenterData::new(k),
			points: PointData::new(n),
		}
	}
}

/// Cluster assignment produced by k-means
#[derive(Debug, Clone, PartialEq)]
pub struct Clustering {
	/// The requested number of clusters
	pub k: u8,
	/// Cluster label in `0..k` for each feature, in input order
	///
	/// Not every label in `0..k` has to be used.
	pub labels: Vec<u8>,
	/// Sum of squared distances from each feature to its centroid
	///
	/// A lower inertia indicates a tighter clustering.
	pub inertia: f64,
	/// Number of Lloyd iterations run by the chosen trial
	pub iterations: u32,
	/// Whether the chosen trial stopped because no assignment changed
	pub converged: bool,
}

impl Clustering {
	/// Put every feature into cluster `0`
	fn single(k: u8, features: &[Feature]) -> Self {
		let mut mean = [0.0; 3];
		if !features.is_empty() {
			// slices of colors are far below 2^52 elements
			#[allow(clippy::cast_precision_loss)]
			let n = features.len() as f64;
			for feature in features {
				for (total, value) in mean.iter_mut().zip(feature) {
					*total += value / n;
				}
			}
		}

		Self {
			k,
			labels: vec![0; features.len()],
			inertia: features.iter().map(|&feature| squared_distance(feature, mean)).sum(),
			iterations: 0,
			converged: true,
		}
	}

	/// Number of features in each cluster, indexed by label
	#[must_use]
	pub fn sizes(&self) -> Vec<usize> {
		let mut sizes = vec![0; usize::from(self.k)];
		for &label in &self.labels {
			sizes[usize::from(label)] += 1;
		}
		sizes
	}

	/// Renumber clusters in order of their first member, keeping the same partition.
	fn relabel_by_first_member(&mut self) {
		let mut mapping = vec![UNASSIGNED; usize::from(self.k)];
		let mut next = 0;
		for label in &mut self.labels {
			let new_label = &mut mapping[usize::from(*label)];
			if *new_label == UNASSIGNED {
				*new_label = next;
				next += 1;
			}
			*label = *new_label;
		}
	}
}

/// Choose the starting centroids using the k-means++ algorithm
fn kmeans_plus_plus(
	k: u8,
	rng: &mut impl Rng,
	features: &[Feature],
	centroids: &mut Vec<Feature>,
	weights: &mut [f64],
) {
	use rand::{
		distributions::{WeightedError::*, WeightedIndex},
		prelude::Distribution,
	};

	// Pick any random first centroid
	centroids.push(features[rng.gen_range(0..features.len())]);

	// Pick each next centroid with a weighted probability based off the squared distance to its closest centroid
	for i in 1..usize::from(k) {
		let centroid = centroids[i - 1];
		for (weight, &feature) in weights.iter_mut().zip(features) {
			*weight = f64::min(*weight, squared_distance(feature, centroid));
		}

		match WeightedIndex::new(&*weights) {
			Ok(sampler) => centroids.push(features[sampler.sample(rng)]),
			Err(AllWeightsZero) => return, // all points exactly match a centroid
			Err(InvalidWeight | NoItem | TooMany) => {
				unreachable!("standardized features are finite, so every weight is a finite squared distance >= 0")
			},
		}
	}
}

/// The closest centroid to `feature`, preferring the lowest index on ties
// centroids.len() <= k <= u8::MAX
#[allow(clippy::cast_possible_truncation)]
fn nearest_center(feature: Feature, centroids: &[Feature]) -> u8 {
	let mut min_dist = f64::INFINITY;
	let mut min_center = 0;
	for (i, &centroid) in centroids.iter().enumerate() {
		let dist = squared_distance(feature, centroid);
		if dist < min_dist {
			min_dist = dist;
			min_center = i;
		}
	}
	min_center as u8
}

/// For each data point, update its assigned center, returning how many points moved
fn update_assignments(features: &[Feature], centers: &mut CenterData, points: &mut PointData) -> usize {
	let mut moved = 0;
	for (&feature, center) in features.iter().zip(&mut points.assignment) {
		let nearest = nearest_center(feature, &centers.centroid);
		if nearest == *center {
			continue;
		}

		// Move this point to its new center
		if *center != UNASSIGNED {
			let ci = usize::from(*center);
			for (sum, value) in centers.sum[ci].iter_mut().zip(feature) {
				*sum -= value;
			}
			centers.count[ci] -= 1;
		}

		let cj = usize::from(nearest);
		for (sum, value) in centers.sum[cj].iter_mut().zip(feature) {
			*sum += value;
		}
		centers.count[cj] += 1;

		*center = nearest;
		moved += 1;
	}
	moved
}

/// For each center, update its centroid using the vector sums
///
/// An empty center keeps its previous centroid.
fn update_centroids(centers: &mut CenterData) {
	for ((centroid, &n), sum) in centers.centroid.iter_mut().zip(&centers.count).zip(&centers.sum) {
		if n > 0 {
			let n = f64::from(n);
			*centroid = sum.map(|total| total / n);
		}
	}
}

/// Run a trial of k-means
fn kmeans(features: &[Feature], k: u8, max_iter: u32, seed: u64) -> Clustering {
	let KmeansState { mut centers, mut points } = KmeansState::new(k, features.len());
	let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
	kmeans_plus_plus(k, &mut rng, features, &mut centers.centroid, &mut points.weight);

	// The first pass places every point, so at least two passes are needed to observe convergence
	let mut iterations = 0;
	let converged = loop {
		let moved = update_assignments(features, &mut centers, &mut points);
		update_centroids(&mut centers);
		iterations += 1;

		if moved == 0 {
			break true;
		}
		if iterations >= max_iter {
			break false;
		}
	};

	let inertia = features
		.iter()
		.zip(&points.assignment)
		.map(|(&feature, &center)| squared_distance(feature, centers.centroid[usize::from(center)]))
		.sum();

	Clustering {
		k,
		labels: points.assignment,
		inertia,
		iterations,
		converged,
	}
}

/// Run every trial of k-means
#[cfg(not(feature = "threads"))]
fn run_trials(features: &[Feature], k: u8, max_iter: u32, trials: u32, seed: u64) -> Vec<Clustering> {
	(0..trials)
		.map(|i| kmeans(features, k, max_iter, seed ^ u64::from(i)))
		.collect()
}

/// Run every trial of k-means in parallel
///
/// Each trial owns its own generator, so the results match the sequential version.
#[cfg(feature = "threads")]
fn run_trials(features: &[Feature], k: u8, max_iter: u32, trials: u32, seed: u64) -> Vec<Clustering> {
	use rayon::prelude::*;

	(0..trials)
		.into_par_iter()
		.map(|i| kmeans(features, k, max_iter, seed ^ u64::from(i)))
		.collect()
}

/// Partition `features` into at most `k` clusters.
///
/// Runs `trials` seeded trials of k-means (at least one), keeping the one with the lowest inertia.
/// Every trial runs at least one assignment pass, even if `max_iter` is `0`.
/// Clusters are numbered in order of their first member in `features`.
///
/// An empty `features` slice or `k` <= 1 puts everything in cluster `0` without running k-means.
///
/// # Panics
/// If a feature is not finite. [`crate::normalize::standardize`] never returns such features.
#[must_use]
pub fn run(features: &[Feature], k: u8, max_iter: u32, trials: u32, seed: u64) -> Clustering {
	if features.is_empty() || k <= 1 {
		return Clustering::single(k, features);
	}

	let results = run_trials(features, k, max_iter, trials.max(1), seed);

	for (trial, result) in results.iter().enumerate() {
		tracing::debug!(
			trial,
			inertia = result.inertia,
			iterations = result.iterations,
			converged = result.converged,
			"k-means trial finished"
		);
	}

	let Some(mut best) = results
		.into_iter()
		.min_by(|x, y| f64::total_cmp(&x.inertia, &y.inertia))
	else {
		return Clustering::single(k, features);
	};

	if !best.converged {
		tracing::warn!(
			max_iter,
			inertia = best.inertia,
			"k-means reached the iteration limit before converging; using the best assignment found"
		);
	}

	best.relabel_by_first_member();
	best
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
	use super::*;

	fn test_features() -> Vec<Feature> {
		vec![
			[-1.2, 0.4, 0.1],
			[-1.1, 0.5, 0.0],
			[-1.3, 0.3, 0.2],
			[0.9, -1.0, 1.1],
			[1.0, -1.1, 1.0],
			[1.1, -0.9, 1.2],
			[0.2, 1.5, -1.4],
			[0.3, 1.4, -1.3],
		]
	}

	fn kmeans_plus_plus_num_centroids(k: u8, n: usize) {
		let mut state = KmeansState::new(k, n);

		kmeans_plus_plus(
			k,
			&mut Xoshiro256PlusPlus::seed_from_u64(0),
			&test_features()[..n],
			&mut state.centers.centroid,
			&mut state.points.weight,
		);

		assert_eq!(state.centers.centroid.len(), usize::min(usize::from(k), n));
	}

	#[test]
	fn kmeans_plus_plus_k_greater_than_n() {
		kmeans_plus_plus_num_centroids(6, 2);
	}

	#[test]
	fn kmeans_plus_plus_k_equals_n() {
		kmeans_plus_plus_num_centroids(4, 4);
	}

	#[test]
	fn kmeans_plus_plus_k_less_than_n() {
		kmeans_plus_plus_num_centroids(2, 6);
	}

	#[test]
	fn kmeans_plus_plus_stops_on_identical_points() {
		let features = vec![[0.0; 3]; 5];
		let mut state = KmeansState::new(3, features.len());

		kmeans_plus_plus(
			3,
			&mut Xoshiro256PlusPlus::seed_from_u64(7),
			&features,
			&mut state.centers.centroid,
			&mut state.points.weight,
		);

		assert_eq!(state.centers.centroid, vec![[0.0; 3]]);
	}

	#[test]
	fn nearest_center_prefers_lowest_index() {
		let centroids = [[1.0, 0.0, 0.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
		assert_eq!(nearest_center([0.0, 0.0, 0.0], &centroids), 0);
		assert_eq!(nearest_center([-0.5, 0.0, 0.0], &centroids), 1);
		assert_eq!(nearest_center([-0.5, 0.6, 0.0], &centroids), 2);
	}

	#[test]
	fn update_assignments_sum_reflects_assignment() {
		let features = test_features();
		let mut state = KmeansState::new(3, features.len());
		kmeans_plus_plus(
			3,
			&mut Xoshiro256PlusPlus::seed_from_u64(0),
			&features,
			&mut state.centers.centroid,
			&mut state.points.weight,
		);

		let moved = update_assignments(&features, &mut state.centers, &mut state.points);
		assert_eq!(moved, features.len());

		for (&feature, &center) in features.iter().zip(&state.points.assignment) {
			let center = usize::from(center);
			for (sum, value) in state.centers.sum[center].iter_mut().zip(feature) {
				*sum -= value;
			}
			state.centers.count[center] -= 1;
		}

		for sum in &state.centers.sum {
			for &value in sum {
				assert!(value.abs() <= 1e-12);
			}
		}
		assert!(state.centers.count.iter().all(|&count| count == 0));
	}

	#[test]
	fn separated_groups_are_found() {
		for seed in 0..4 {
			let result = run(&test_features(), 3, 300, 8, seed);

			assert!(result.converged);
			assert_eq!(result.labels, vec![0, 0, 0, 1, 1, 1, 2, 2]);
			assert_eq!(result.sizes(), vec![3, 3, 2]);
		}
	}

	#[test]
	fn same_seed_same_result() {
		let features = test_features();
		assert_eq!(run(&features, 4, 300, 3, 42), run(&features, 4, 300, 3, 42));
	}

	#[test]
	fn more_trials_never_increase_inertia() {
		let features = test_features();
		let one = run(&features, 4, 300, 1, 42);
		let many = run(&features, 4, 300, 8, 42);
		assert!(many.inertia <= one.inertia);
	}

	#[test]
	fn identical_points_share_cluster_zero() {
		let result = run(&[[0.0; 3]; 4], 3, 300, 1, 0);

		assert_eq!(result.labels, vec![0; 4]);
		assert_eq!(result.sizes(), vec![4, 0, 0]);
		assert!(result.inertia.abs() <= f64::EPSILON);
	}

	#[test]
	fn single_cluster_skips_kmeans() {
		let result = run(&test_features(), 1, 300, 1, 0);
		assert_eq!(result.labels, vec![0; 8]);
		assert_eq!(result.iterations, 0);
		assert!(result.inertia > 0.0);
	}

	#[test]
	fn max_iter_reached() {
		let result = run(&test_features(), 3, 1, 1, 0);

		// The first pass places every point, so one iteration can never observe convergence
		assert_eq!(result.iterations, 1);
		assert!(!result.converged);
		assert_eq!(result.labels.len(), 8);
	}

	#[test]
	fn runs_on_standardized_colors() {
		use crate::{color::parse_hex_codes, normalize::{standardize, HueEncoding}, Backend, ColorSpace};

		let backend = Backend::new();
		let steps = [0x00, 0x33, 0x66, 0x99, 0xCC, 0xFF];
		let codes = steps
			.iter()
			.flat_map(|r| steps.iter().map(move |b| format!("#{r:02X}80{b:02X}")))
			.collect::<Vec<_>>();
		let colors = parse_hex_codes(&codes).unwrap();

		for space in [ColorSpace::Lch, ColorSpace::Hsl] {
			let coordinates = colors.iter().map(|color| color.to_coordinate(&backend, space)).collect::<Vec<_>>();
			let features = standardize(&coordinates, HueEncoding::Circular).unwrap();

			for k in [2, 7, 20] {
				for seed in 0..4 {
					let result = run(&features, k, 300, 2, seed);
					assert_eq!(result.labels.len(), features.len());
					assert!(result.labels.iter().all(|&label| label < k));
				}
			}
		}
	}

	#[test]
	fn labels_follow_first_member_order() {
		let mut clustering = Clustering {
			k: 4,
			labels: vec![3, 3, 1, 3, 0, 1],
			inertia: 0.0,
			iterations: 1,
			converged: true,
		};

		clustering.relabel_by_first_member();

		assert_eq!(clustering.labels, vec![0, 0, 1, 0, 2, 1]);
	}
}

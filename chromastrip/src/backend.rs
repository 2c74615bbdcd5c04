//! The numeric backend shared by pipeline runs

use crate::{error::PaletteError, Result};
use palette::{LinSrgb, Srgb};
use std::sync::OnceLock;

/// The process-wide backend, set by [`initialize`]
static BACKEND: OnceLock<Backend> = OnceLock::new();

/// Precomputed tables for decoding 8-bit sRGB channels
///
/// A `Backend` can be owned and used directly, or installed process-wide with [`initialize`]
/// for use by [`crate::build_palette`].
#[derive(Debug, Clone)]
pub struct Backend {
	/// Encoded channel value in `0.0..=1.0` for each 8-bit value
	encoded: [f32; 256],
	/// Linear light channel value for each 8-bit value
	linear: [f32; 256],
}

impl Backend {
	/// Build the decoding tables
	#[must_use]
	pub fn new() -> Self {
		let mut encoded = [0.0; 256];
		let mut linear = [0.0; 256];

		for ((value, encoded_value), linear_value) in (0..=u8::MAX).zip(&mut encoded).zip(&mut linear) {
			let srgb: Srgb<f32> = Srgb::new(value, value, value).into_format();
			let lin: LinSrgb = srgb.into_linear();
			*encoded_value = srgb.red;
			*linear_value = lin.red;
		}

		tracing::debug!("built sRGB decoding tables");

		Self { encoded, linear }
	}

	/// The encoded (gamma companded) channel value in `0.0..=1.0`
	#[must_use]
	pub fn encoded(&self, channel: u8) -> f32 {
		self.encoded[usize::from(channel)]
	}

	/// The linear light channel value in `0.0..=1.0`
	#[must_use]
	pub fn linear(&self, channel: u8) -> f32 {
		self.linear[usize::from(channel)]
	}
}

impl Default for Backend {
	fn default() -> Self {
		Self::new()
	}
}

/// Initialize the process-wide backend, returning it.
///
/// Calling this more than once is harmless; later calls return the existing backend.
pub fn initialize() -> &'static Backend {
	BACKEND.get_or_init(Backend::new)
}

/// The process-wide backend, or [`PaletteError::NotReady`] if [`initialize`] has not run yet
pub fn get() -> Result<&'static Backend> {
	BACKEND.get().ok_or(PaletteError::NotReady)
}

//! Hex color parsing and conversion to the perceptual color spaces used for clustering
//!
//! Both supported spaces are cylindrical, so a converted color is always described by
//! a lightness, a chroma (saturation for HSL), and a hue angle in degrees.

use crate::{backend::Backend, error::PaletteError, Result};
use palette::{FromColor, Hsl, Lab, Lch, LinSrgb, Srgb, Xyz};
use std::{fmt, str::FromStr};

/// The perceptual color space colors are converted to before clustering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ColorSpace {
	/// CIE LCh(ab) under the D65 reference white
	#[default]
	Lch,
	/// Hue, saturation, lightness of the encoded sRGB values
	Hsl,
}

/// A color in a cylindrical perceptual color space
///
/// For [`ColorSpace::Hsl`], `chroma` holds the saturation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
	/// Lightness (`0..=100` for LCH, `0..=1` for HSL)
	pub lightness: f32,
	/// Chroma for LCH, saturation for HSL
	pub chroma: f32,
	/// Hue angle in degrees, in `0.0..360.0`
	pub hue: f32,
}

impl Coordinate {
	/// Whether every component is a finite number
	#[must_use]
	pub fn is_finite(self) -> bool {
		self.lightness.is_finite() && self.chroma.is_finite() && self.hue.is_finite()
	}
}

/// A six digit `#RRGGBB` sRGB color code
///
/// The text as given (including its letter case) is kept and returned verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
pub struct HexColor {
	/// The color code as given
	text: String,
	/// The red, green, and blue channels
	rgb: [u8; 3],
}

impl HexColor {
	/// Parse a `#RRGGBB` color code (hex digits are case-insensitive)
	///
	/// # Errors
	/// Returns [`PaletteError::InvalidInput`] if `text` is not a `#` followed by exactly six hex digits.
	pub fn parse(text: &str) -> Result<Self> {
		parse_rgb(text)
			.map(|rgb| Self { text: text.to_owned(), rgb })
			.ok_or_else(|| PaletteError::InvalidInput { values: vec![text.to_owned()] })
	}

	/// The color code exactly as it was given
	#[must_use]
	pub fn as_str(&self) -> &str {
		&self.text
	}

	/// The red, green, and blue channels
	#[must_use]
	pub const fn rgb(&self) -> [u8; 3] {
		self.rgb
	}

	/// The color as an 8-bit [`Srgb`] value
	#[must_use]
	pub fn srgb(&self) -> Srgb<u8> {
		let [r, g, b] = self.rgb;
		Srgb::new(r, g, b)
	}

	/// The channels packed into `0xRRGGBB`
	#[must_use]
	pub fn packed(&self) -> u32 {
		let [r, g, b] = self.rgb;
		u32::from(r) << 16 | u32::from(g) << 8 | u32::from(b)
	}

	/// Convert this color into the given perceptual color space
	#[must_use]
	pub fn to_coordinate(&self, backend: &Backend, space: ColorSpace) -> Coordinate {
		match space {
			ColorSpace::Lch => self.to_lch(backend),
			ColorSpace::Hsl => self.to_hsl(backend),
		}
	}

	/// sRGB -> linear sRGB -> XYZ -> Lab -> LCh
	fn to_lch(&self, backend: &Backend) -> Coordinate {
		let [r, g, b] = self.rgb.map(|channel| backend.linear(channel));
		let xyz: Xyz = Xyz::from_color(LinSrgb::new(r, g, b));
		let lab: Lab = Lab::from_color(xyz);
		let lch: Lch = Lch::from_color(lab);

		Coordinate {
			lightness: lch.l,
			chroma: lch.chroma,
			hue: positive_degrees(lch.hue.into_positive_degrees()),
		}
	}

	/// sRGB -> HSL
	fn to_hsl(&self, backend: &Backend) -> Coordinate {
		let [r, g, b] = self.rgb.map(|channel| backend.encoded(channel));
		let hsl: Hsl = Hsl::from_color(Srgb::new(r, g, b));

		Coordinate {
			lightness: hsl.lightness,
			chroma: hsl.saturation,
			hue: positive_degrees(hsl.hue.into_positive_degrees()),
		}
	}
}

/// Fold an angle that rounded up to exactly `360.0` back to `0.0`
fn positive_degrees(degrees: f32) -> f32 {
	if degrees >= 360.0 {
		degrees - 360.0
	} else {
		degrees
	}
}

/// Parse the channels of a `#RRGGBB` color code
fn parse_rgb(text: &str) -> Option<[u8; 3]> {
	let digits = text.strip_prefix('#')?.as_bytes();
	if digits.len() != 6 {
		return None;
	}

	let mut rgb = [0; 3];
	for (channel, pair) in rgb.iter_mut().zip(digits.chunks_exact(2)) {
		*channel = hex_digit(pair[0])? << 4 | hex_digit(pair[1])?;
	}

	Some(rgb)
}

/// The value of a single hex digit
// to_digit(16) is < 16
#[allow(clippy::cast_possible_truncation)]
fn hex_digit(byte: u8) -> Option<u8> {
	char::from(byte).to_digit(16).map(|digit| digit as u8)
}

/// Parse every color code, reporting all invalid ones together.
///
/// # Errors
/// Returns [`PaletteError::InvalidInput`] listing each invalid code in input order.
pub fn parse_hex_codes<S: AsRef<str>>(codes: &[S]) -> Result<Vec<HexColor>> {
	let mut colors = Vec::with_capacity(codes.len());
	let mut invalid = Vec::new();

	for code in codes {
		let code = code.as_ref();
		match parse_rgb(code) {
			Some(rgb) => colors.push(HexColor { text: code.to_owned(), rgb }),
			None => invalid.push(code.to_owned()),
		}
	}

	if invalid.is_empty() {
		Ok(colors)
	} else {
		Err(PaletteError::InvalidInput { values: invalid })
	}
}

impl fmt::Display for HexColor {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		f.write_str(&self.text)
	}
}

impl FromStr for HexColor {
	type Err = PaletteError;

	fn from_str(s: &str) -> Result<Self> {
		Self::parse(s)
	}
}

impl TryFrom<String> for HexColor {
	type Error = PaletteError;

	fn try_from(text: String) -> Result<Self> {
		match parse_rgb(&text) {
			Some(rgb) => Ok(Self { text, rgb }),
			None => Err(PaletteError::InvalidInput { values: vec![text] }),
		}
	}
}

impl From<HexColor> for String {
	fn from(color: HexColor) -> Self {
		color.text
	}
}

impl AsRef<str> for HexColor {
	fn as_ref(&self) -> &str {
		&self.text
	}
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
	use super::*;
	use approx::assert_relative_eq;

	fn coordinate(code: &str, space: ColorSpace) -> Coordinate {
		HexColor::parse(code).unwrap().to_coordinate(&Backend::new(), space)
	}

	#[test]
	fn parses_either_case() {
		let lower = HexColor::parse("#ff8000").unwrap();
		let upper = HexColor::parse("#FF8000").unwrap();

		assert_eq!(lower.rgb(), [0xFF, 0x80, 0x00]);
		assert_eq!(lower.rgb(), upper.rgb());
		assert_eq!(lower.packed(), 0xFF8000);
		assert_eq!(upper.to_string(), "#FF8000");
	}

	#[test]
	fn rejects_malformed_codes() {
		for code in ["FF0000", "#FF000", "#FF00000", "#GG0000", "#ff00 0", "", "#", "#ＦＦ0000"] {
			assert_eq!(
				HexColor::parse(code),
				Err(PaletteError::InvalidInput { values: vec![code.to_owned()] }),
				"{code}"
			);
		}
	}

	#[test]
	fn parse_hex_codes_reports_all_invalid() {
		let result = parse_hex_codes(&["#000000", "nope", "#FFFFFF", "#12345", "#abcdef"]);

		assert_eq!(
			result,
			Err(PaletteError::InvalidInput {
				values: vec!["nope".to_owned(), "#12345".to_owned()]
			})
		);
	}

	#[test]
	fn parse_hex_codes_keeps_order() {
		let colors = parse_hex_codes(&["#0000FF", "#00ff00"]).unwrap();

		assert_eq!(colors.iter().map(HexColor::as_str).collect::<Vec<_>>(), ["#0000FF", "#00ff00"]);
	}

	#[test]
	fn red_in_hsl() {
		let red = coordinate("#FF0000", ColorSpace::Hsl);

		assert_relative_eq!(red.hue, 0.0, epsilon = 1e-3);
		assert_relative_eq!(red.chroma, 1.0, epsilon = 1e-3);
		assert_relative_eq!(red.lightness, 0.5, epsilon = 1e-3);
	}

	#[test]
	fn primaries_in_hsl() {
		let green = coordinate("#00FF00", ColorSpace::Hsl);
		let blue = coordinate("#0000FF", ColorSpace::Hsl);
		let almost_red = coordinate("#FF0001", ColorSpace::Hsl);

		assert_relative_eq!(green.hue, 120.0, epsilon = 1e-3);
		assert_relative_eq!(blue.hue, 240.0, epsilon = 1e-3);
		assert_relative_eq!(almost_red.hue, 359.7647, epsilon = 1e-3);
		assert_relative_eq!(almost_red.chroma, 1.0, epsilon = 1e-3);
	}

	#[test]
	fn gray_has_no_hue_or_saturation() {
		let gray = coordinate("#808080", ColorSpace::Hsl);

		assert_relative_eq!(gray.hue, 0.0);
		assert_relative_eq!(gray.chroma, 0.0);
		assert_relative_eq!(gray.lightness, 128.0 / 255.0, epsilon = 1e-6);
	}

	#[test]
	fn hsl_saturation_formula() {
		// max = 0.8, min = 0.2 => l = 0.5, s = 0.6 / (1 - |2 * 0.5 - 1|)
		let color = coordinate("#CC3333", ColorSpace::Hsl);

		assert_relative_eq!(color.lightness, 0.5, epsilon = 1e-3);
		assert_relative_eq!(color.chroma, 0.6, epsilon = 1e-3);
		assert_relative_eq!(color.hue, 0.0, epsilon = 1e-3);
	}

	#[test]
	fn red_in_lch() {
		let red = coordinate("#FF0000", ColorSpace::Lch);

		assert_relative_eq!(red.lightness, 53.24, epsilon = 0.05);
		assert_relative_eq!(red.chroma, 104.55, epsilon = 0.1);
		assert_relative_eq!(red.hue, 40.0, epsilon = 0.1);
	}

	#[test]
	fn white_and_black_in_lch() {
		let white = coordinate("#FFFFFF", ColorSpace::Lch);
		let black = coordinate("#000000", ColorSpace::Lch);

		assert_relative_eq!(white.lightness, 100.0, epsilon = 0.01);
		assert!(white.chroma < 0.01);
		assert_relative_eq!(black.lightness, 0.0, epsilon = 1e-4);
		assert!(black.chroma < 1e-4);
	}

	#[test]
	fn hue_is_in_range() {
		let backend = Backend::new();
		for space in [ColorSpace::Lch, ColorSpace::Hsl] {
			for r in (0..=u8::MAX).step_by(51) {
				for g in (0..=u8::MAX).step_by(51) {
					for b in (0..=u8::MAX).step_by(51) {
						let color = HexColor::parse(&format!("#{r:02X}{g:02X}{b:02X}")).unwrap();
						let coordinate = color.to_coordinate(&backend, space);
						assert!(coordinate.is_finite());
						assert!((0.0..360.0).contains(&coordinate.hue), "{color}: {}", coordinate.hue);
					}
				}
			}
		}
	}
}

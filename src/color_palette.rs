use palette::{FromColor, Hsl, ShiftHue, Srgb};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Base color used whenever a seed string fails to parse.
pub const DEFAULT_BASE: Color = Color::new(0x30, 0x60, 0x9f);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ColorParseError {
    #[error("expected 3 or 6 hex digits, got {0:?}")]
    Length(String),
    #[error("invalid hex digit in {0:?}")]
    Digit(String),
}

/// RGB color, canonically formatted as a lowercase `#rrggbb` string.
///
/// Opacity is a rendering attribute, not part of the color model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const WHITE: Color = Color::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Color { r, g, b }
    }

    pub fn to_hex(self) -> String {
        self.to_string()
    }

    /// WCAG relative luminance, 0.0 (black) to 1.0 (white).
    pub fn luminance(self) -> f64 {
        fn channel(v: u8) -> f64 {
            let v = v as f64 / 255.0;
            if v <= 0.03928 {
                v / 12.92
            } else {
                ((v + 0.055) / 1.055).powf(2.4)
            }
        }
        0.2126 * channel(self.r) + 0.7152 * channel(self.g) + 0.0722 * channel(self.b)
    }

    /// Rotates the hue by `degrees`, keeping saturation and lightness.
    pub fn spin(self, degrees: f32) -> Color {
        Color::from_hsl(self.to_hsl().shift_hue(degrees))
    }

    /// Raises HSL lightness by `amount` percentage points, clamped.
    pub fn lighten(self, amount: f64) -> Color {
        let hsl = self.to_hsl();
        let lightness = (hsl.lightness + amount as f32 / 100.0).clamp(0.0, 1.0);
        Color::from_hsl(Hsl::new(hsl.hue, hsl.saturation, lightness))
    }

    /// Lowers HSL lightness by `amount` percentage points, clamped.
    pub fn darken(self, amount: f64) -> Color {
        self.lighten(-amount)
    }

    /// Lowers HSL saturation by `amount` percentage points, clamped.
    pub fn desaturate(self, amount: f64) -> Color {
        let hsl = self.to_hsl();
        let saturation = (hsl.saturation - amount as f32 / 100.0).clamp(0.0, 1.0);
        Color::from_hsl(Hsl::new(hsl.hue, saturation, hsl.lightness))
    }

    /// Pushes every RGB channel toward white by `amount` percent of full
    /// scale. Unlike [`Color::lighten`] this works in RGB space.
    pub fn brighten(self, amount: f64) -> Color {
        let delta = (255.0 * amount / 100.0).round() as i16;
        let adjust = |v: u8| (v as i16 + delta).clamp(0, 255) as u8;
        Color::new(adjust(self.r), adjust(self.g), adjust(self.b))
    }

    fn to_hsl(self) -> Hsl {
        Hsl::from_color(Srgb::new(self.r, self.g, self.b).into_format::<f32>())
    }

    fn from_hsl(hsl: Hsl) -> Color {
        let rgb = Srgb::from_color(hsl).into_format::<u8>();
        Color::new(rgb.red, rgb.green, rgb.blue)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for Color {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        let raw = raw.strip_prefix('#').unwrap_or(raw);
        let expanded = match raw.len() {
            3 => raw.chars().flat_map(|c| [c, c]).collect::<String>(),
            6 => raw.to_string(),
            _ => return Err(ColorParseError::Length(s.to_string())),
        };
        let channel = |i: usize| {
            u8::from_str_radix(&expanded[i..i + 2], 16)
                .map_err(|_| ColorParseError::Digit(s.to_string()))
        };
        Ok(Color::new(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct HexVisitor;

        impl Visitor<'_> for HexVisitor {
            type Value = Color;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a hex color string like \"#30609f\"")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Color, E> {
                v.parse().map_err(de::Error::custom)
            }
        }

        deserializer.deserialize_str(HexVisitor)
    }
}

/// Full palette derived from one seed color.
///
/// `analogous` always holds exactly six entries ordered light to dark; it is
/// recomputed wholesale on every seed change, never mutated in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette {
    pub base: Color,
    pub analogous: [Color; 6],
    pub complementary: Color,
}

/// Accent colors handed to the surrounding UI. The ramp itself stays on the
/// terrain; these pick the readable entries out of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UiAccents {
    pub primary: Color,
    pub complementary: Color,
    pub dark: Color,
    pub light: Color,
}

impl Palette {
    pub fn ui_accents(&self) -> UiAccents {
        UiAccents {
            primary: self.base,
            complementary: self.complementary,
            dark: self.analogous[self.analogous.len() - 2],
            light: self.analogous[1],
        }
    }
}

/// Derives the full palette for a seed color string.
///
/// An unparseable seed is silently replaced by [`DEFAULT_BASE`]; this
/// function never fails. Same seed, same palette.
pub fn derive_palette(seed: &str) -> Palette {
    let base: Color = seed.parse().unwrap_or(DEFAULT_BASE);

    let mut fan = analogous_fan(base);
    // Make the ramp always run light to dark.
    if fan[fan.len() - 1].luminance() > fan[0].luminance() {
        fan.reverse();
    }
    // Lighten the light half and darken the dark half, scaled by distance
    // from the midpoint, then mute everything. Raw analogous hues read as
    // candy stripes; this turns them into a usable terrain ramp.
    let analogous = std::array::from_fn(|i| {
        let offset = ((i as f64 + 1.0) - 3.0) * 15.0;
        let shaded = if offset < 0.0 {
            fan[i].lighten(offset.abs())
        } else if offset > 0.0 {
            fan[i].darken(offset)
        } else {
            fan[i]
        };
        shaded.desaturate(30.0)
    });

    let complementary = complement(base).brighten(40.0).desaturate(40.0);

    Palette {
        base,
        analogous,
        complementary,
    }
}

/// Hue-inverted companion of a color. Lightness and saturation untouched.
pub fn complement(color: Color) -> Color {
    color.spin(180.0)
}

// Six hues fanned around the base at 12° steps, spanning -24° to +36°.
// The ramp keeps the base's saturation and lightness on every entry.
fn analogous_fan(base: Color) -> [Color; 6] {
    const STEP: f32 = 12.0;
    std::array::from_fn(|i| base.spin(STEP * (i as f32 - 2.0)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_parse_and_format() {
        let color: Color = "#30609f".parse().unwrap();
        assert_eq!(color, Color::new(0x30, 0x60, 0x9f));
        assert_eq!(color.to_hex(), "#30609f");

        // Short form expands per digit, with or without the hash.
        assert_eq!("fff".parse::<Color>().unwrap(), Color::WHITE);
        assert_eq!("#abc".parse::<Color>().unwrap(), Color::new(0xaa, 0xbb, 0xcc));
    }

    #[test]
    fn test_bad_hex_is_rejected() {
        assert!("".parse::<Color>().is_err());
        assert!("notacolor".parse::<Color>().is_err());
        assert!("#12345".parse::<Color>().is_err());
        assert!("zzz".parse::<Color>().is_err());
    }

    #[test]
    fn test_invalid_seed_falls_back_to_default() {
        assert_eq!(derive_palette("").base, DEFAULT_BASE);
        assert_eq!(derive_palette("notacolor").base, DEFAULT_BASE);
    }

    #[test]
    fn test_palette_is_deterministic() {
        assert_eq!(derive_palette("#234"), derive_palette("#234"));
    }

    #[test]
    fn test_analogous_has_six_entries_light_to_dark() {
        for seed in ["fff", "#30609f", "d08635", "86233d", "20391b", "4182d9"] {
            let palette = derive_palette(seed);
            assert_eq!(palette.analogous.len(), 6);
            for pair in palette.analogous.windows(2) {
                assert!(
                    pair[0].luminance() >= pair[1].luminance() - 1e-9,
                    "ramp for {} not light-to-dark: {} then {}",
                    seed,
                    pair[0].to_hex(),
                    pair[1].to_hex()
                );
            }
        }
    }

    #[test]
    fn test_complement_inverts_hue() {
        let base: Color = "#30609f".parse().unwrap();
        let inverted = complement(base);

        let hue = |c: Color| {
            let hsl = c.to_hsl();
            hsl.hue.into_positive_degrees() as f64
        };
        let diff = (hue(base) - hue(inverted)).rem_euclid(360.0);
        // u8 quantization through the HSL round trip costs a degree or two.
        assert!(
            (diff - 180.0).abs() < 2.0,
            "hue difference was {} degrees",
            diff
        );
    }

    #[test]
    fn test_brighten_is_rgb_space() {
        let color = Color::new(100, 150, 200);
        assert_eq!(color.brighten(40.0), Color::new(202, 252, 255));
    }

    #[test]
    fn test_lighten_darken_clamp() {
        assert_eq!(Color::WHITE.lighten(30.0), Color::WHITE);
        assert_eq!(Color::new(0, 0, 0).darken(45.0), Color::new(0, 0, 0));
    }

    #[test]
    fn test_ui_accents_pick_ramp_entries() {
        let palette = derive_palette("d08635");
        let accents = palette.ui_accents();
        assert_eq!(accents.primary, palette.base);
        assert_eq!(accents.complementary, palette.complementary);
        assert_eq!(accents.light, palette.analogous[1]);
        assert_eq!(accents.dark, palette.analogous[4]);
    }

    #[test]
    fn test_color_serde_round_trip() {
        let color = Color::new(0x30, 0x60, 0x9f);
        let json = serde_json::to_string(&color).unwrap();
        assert_eq!(json, "\"#30609f\"");
        assert_eq!(serde_json::from_str::<Color>(&json).unwrap(), color);
    }
}

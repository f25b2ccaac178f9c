//! Season categories and the swatch tables grouped under them.

use image::Rgb;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PaletteError {
    #[error("invalid hex color: {0:?}")]
    InvalidHex(String),
    #[error("unknown season: {0:?}")]
    UnknownSeason(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Undertone {
    Warm,
    Cool,
}

/// Personal-color category. Declaration order is the table order used for
/// display and for breaking ties in the tally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Spring,
    Summer,
    Autumn,
    Winter,
}

impl Season {
    pub const ALL: [Season; 4] = [Season::Spring, Season::Summer, Season::Autumn, Season::Winter];

    pub fn key(self) -> &'static str {
        match self {
            Season::Spring => "spring",
            Season::Summer => "summer",
            Season::Autumn => "autumn",
            Season::Winter => "winter",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Season::Spring => "봄 웜톤",
            Season::Summer => "여름 쿨톤",
            Season::Autumn => "가을 웜톤",
            Season::Winter => "겨울 쿨톤",
        }
    }

    pub fn undertone(self) -> Undertone {
        match self {
            Season::Spring | Season::Autumn => Undertone::Warm,
            Season::Summer | Season::Winter => Undertone::Cool,
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Season {
    type Err = PaletteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "spring" => Ok(Season::Spring),
            "summer" => Ok(Season::Summer),
            "autumn" | "fall" => Ok(Season::Autumn),
            "winter" => Ok(Season::Winter),
            _ => Err(PaletteError::UnknownSeason(s.to_string())),
        }
    }
}

/// A named background color belonging to exactly one season.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Swatch {
    pub name: String,
    /// Uppercase `#RRGGBB`.
    pub hex: String,
    pub season: Season,
}

impl Swatch {
    /// Build a user-defined swatch. Accepts `#abc`, `abc`, `#aabbcc` or `aabbcc`.
    pub fn custom(
        name: impl Into<String>,
        hex: &str,
        season: Season,
    ) -> Result<Self, PaletteError> {
        let rgb = parse_hex(hex)?;
        Ok(Self {
            name: name.into(),
            hex: to_hex(rgb),
            season,
        })
    }

    pub fn rgb(&self) -> Rgb<u8> {
        // Presets and custom swatches are both validated on construction.
        parse_hex(&self.hex).unwrap_or(Rgb([0, 0, 0]))
    }
}

impl From<&PresetSwatch> for Swatch {
    fn from(preset: &PresetSwatch) -> Self {
        Self {
            name: preset.name.to_string(),
            hex: preset.hex.to_string(),
            season: preset.season,
        }
    }
}

/// Static table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresetSwatch {
    pub name: &'static str,
    pub hex: &'static str,
    pub season: Season,
}

const fn preset(name: &'static str, hex: &'static str, season: Season) -> PresetSwatch {
    PresetSwatch { name, hex, season }
}

pub const PRESETS: [PresetSwatch; 24] = [
    preset("Coral", "#FF7F50", Season::Spring),
    preset("Peach", "#FFDAB9", Season::Spring),
    preset("Warm Yellow", "#FFD966", Season::Spring),
    preset("Light Camel", "#D8B38A", Season::Spring),
    preset("Apple Green", "#8DB600", Season::Spring),
    preset("Turquoise", "#40E0D0", Season::Spring),
    preset("Powder Blue", "#B0E0E6", Season::Summer),
    preset("Lavender", "#E6E6FA", Season::Summer),
    preset("Rose Pink", "#F4A6B7", Season::Summer),
    preset("Soft Mint", "#B8E2D2", Season::Summer),
    preset("Dusty Blue", "#7A9CC6", Season::Summer),
    preset("Mauve", "#C8A2C8", Season::Summer),
    preset("Mustard", "#D4A017", Season::Autumn),
    preset("Terracotta", "#E2725B", Season::Autumn),
    preset("Olive", "#808000", Season::Autumn),
    preset("Camel", "#C19A6B", Season::Autumn),
    preset("Burnt Orange", "#CC5500", Season::Autumn),
    preset("Khaki", "#C3B091", Season::Autumn),
    preset("Pure White", "#FFFFFF", Season::Winter),
    preset("Black", "#000000", Season::Winter),
    preset("Royal Blue", "#4169E1", Season::Winter),
    preset("Fuchsia", "#FF00FF", Season::Winter),
    preset("Emerald", "#50C878", Season::Winter),
    preset("True Red", "#C8102E", Season::Winter),
];

/// Preset swatches of one season, in table order.
pub fn swatches(season: Season) -> impl Iterator<Item = Swatch> {
    PRESETS
        .iter()
        .filter(move |p| p.season == season)
        .map(Swatch::from)
}

/// Look up a preset by name, case-insensitively.
pub fn find(name: &str) -> Option<Swatch> {
    PRESETS
        .iter()
        .find(|p| p.name.eq_ignore_ascii_case(name.trim()))
        .map(Swatch::from)
}

pub fn parse_hex(input: &str) -> Result<Rgb<u8>, PaletteError> {
    let invalid = || PaletteError::InvalidHex(input.to_string());
    let trimmed = input.trim();
    let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid());
    }

    let expanded: String = match digits.len() {
        3 => digits.chars().flat_map(|c| [c, c]).collect(),
        6 => digits.to_string(),
        _ => return Err(invalid()),
    };

    let channel = |i: usize| u8::from_str_radix(&expanded[i..i + 2], 16).map_err(|_| invalid());
    Ok(Rgb([channel(0)?, channel(2)?, channel(4)?]))
}

pub fn to_hex(rgb: Rgb<u8>) -> String {
    format!("#{:02X}{:02X}{:02X}", rgb[0], rgb[1], rgb[2])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_season_has_six_presets() {
        for season in Season::ALL {
            assert_eq!(swatches(season).count(), 6, "{season}");
        }
    }

    #[test]
    fn test_presets_are_valid_uppercase_hex() {
        for p in PRESETS.iter() {
            let rgb = parse_hex(p.hex).unwrap();
            assert_eq!(to_hex(rgb), p.hex);
        }
    }

    #[test]
    fn test_parse_short_hex() {
        assert_eq!(parse_hex("#f0a").unwrap(), Rgb([0xFF, 0x00, 0xAA]));
        assert_eq!(parse_hex("0a0b0c").unwrap(), Rgb([0x0A, 0x0B, 0x0C]));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_hex("#12345").is_err());
        assert!(parse_hex("#GGGGGG").is_err());
        assert!(parse_hex("").is_err());
        assert!(parse_hex("#+1+2+3").is_err());
    }

    #[test]
    fn test_custom_swatch_normalises_hex() {
        let swatch = Swatch::custom("Mine", "abc", Season::Summer).unwrap();
        assert_eq!(swatch.hex, "#AABBCC");
        assert_eq!(swatch.rgb(), Rgb([0xAA, 0xBB, 0xCC]));
    }

    #[test]
    fn test_find_is_case_insensitive() {
        let swatch = find("royal blue").unwrap();
        assert_eq!(swatch.season, Season::Winter);
        assert!(find("Nope").is_none());
    }

    #[test]
    fn test_season_from_str() {
        assert_eq!("Autumn".parse::<Season>().unwrap(), Season::Autumn);
        assert_eq!("fall".parse::<Season>().unwrap(), Season::Autumn);
        assert!("monsoon".parse::<Season>().is_err());
    }

    #[test]
    fn test_undertones() {
        assert_eq!(Season::Spring.undertone(), Undertone::Warm);
        assert_eq!(Season::Winter.undertone(), Undertone::Cool);
    }
}

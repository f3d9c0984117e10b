//! Bar fill colors.
//!
//! Category palettes are configured as CSS color strings. They are parsed
//! into [`Color`] once per layout run, so every bar of a category carries the
//! same resolved value.

use std::{fmt, str::FromStr};

use color::DynamicColor;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A parsed CSS color, serialized back in CSS notation.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Color {
    color: DynamicColor,
}

impl Color {
    /// Parses a CSS color string such as "#ff0000", "rgb(255, 0, 0)" or "red".
    ///
    /// # Examples
    ///
    /// ```
    /// use almanac_core::color::Color;
    ///
    /// assert!(Color::new("#336699").is_ok());
    /// assert!(Color::new("rebeccapurple").is_ok());
    /// assert!(Color::new("plaid").is_err());
    /// ```
    ///
    /// # Errors
    ///
    /// Returns a description of the problem when `css` is not a color.
    pub fn new(css: &str) -> Result<Self, String> {
        DynamicColor::from_str(css)
            .map(|color| Self { color })
            .map_err(|err| format!("`{css}` is not a CSS color: {err}"))
    }
}

/// Neutral gray for categories without a configured color.
impl Default for Color {
    fn default() -> Self {
        Self::new("slategray").expect("'slategray' is a valid CSS color")
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.color)
    }
}

impl FromStr for Color {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let css = String::deserialize(deserializer)?;
        Self::new(&css).map_err(serde::de::Error::custom)
    }
}

//! Percent-change classification into heatmap buckets.
//!
//! | Condition | Bucket | Background | Foreground |
//! |-----------|--------|------------|------------|
//! | absent | `Missing` | `#D3D3D3` | black |
//! | > 3 | `BigGain` | `#FFD700` | black |
//! | > 2 | `StrongGain` | `#006400` | white |
//! | > 1 | `Gain` | `#32CD32` | black |
//! | (0, 1] | `SmallGain` | `#E0FFE0` | black |
//! | [-1, 0) | `SmallLoss` | `#FFE0E0` | black |
//! | < -2 | `BigLoss` | `#8B0000` | white |
//! | < -1 | `StrongLoss` | `#FF6347` | black |
//! | otherwise | `Neutral` | white | black |
//!
//! Rules are evaluated top to bottom and the first match wins.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// 24-bit RGB colour, serialized as `#RRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Self = Self::rgb(0x00, 0x00, 0x00);
    pub const WHITE: Self = Self::rgb(0xFF, 0xFF, 0xFF);
    pub const LIGHT_GRAY: Self = Self::rgb(0xD3, 0xD3, 0xD3);
    pub const GOLD: Self = Self::rgb(0xFF, 0xD7, 0x00);
    pub const DARK_GREEN: Self = Self::rgb(0x00, 0x64, 0x00);
    pub const LIME_GREEN: Self = Self::rgb(0x32, 0xCD, 0x32);
    pub const PALE_GREEN: Self = Self::rgb(0xE0, 0xFF, 0xE0);
    pub const PALE_RED: Self = Self::rgb(0xFF, 0xE0, 0xE0);
    pub const DARK_RED: Self = Self::rgb(0x8B, 0x00, 0x00);
    pub const TOMATO: Self = Self::rgb(0xFF, 0x63, 0x47);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl From<Color> for String {
    fn from(value: Color) -> Self {
        value.hex()
    }
}

impl Display for Color {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.hex())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ColorPair {
    pub background: Color,
    pub foreground: Color,
}

impl ColorPair {
    pub const fn new(background: Color, foreground: Color) -> Self {
        Self {
            background,
            foreground,
        }
    }
}

/// Discrete visual classification of a day's move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    BigGain,
    StrongGain,
    Gain,
    SmallGain,
    SmallLoss,
    Loss,
    StrongLoss,
    BigLoss,
    Neutral,
    Missing,
}

impl Bucket {
    pub const ALL: [Self; 10] = [
        Self::BigGain,
        Self::StrongGain,
        Self::Gain,
        Self::SmallGain,
        Self::SmallLoss,
        Self::Loss,
        Self::StrongLoss,
        Self::BigLoss,
        Self::Neutral,
        Self::Missing,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BigGain => "big_gain",
            Self::StrongGain => "strong_gain",
            Self::Gain => "gain",
            Self::SmallGain => "small_gain",
            Self::SmallLoss => "small_loss",
            Self::Loss => "loss",
            Self::StrongLoss => "strong_loss",
            Self::BigLoss => "big_loss",
            Self::Neutral => "neutral",
            Self::Missing => "missing",
        }
    }

    /// Fixed background/foreground pair for this bucket.
    pub const fn colors(self) -> ColorPair {
        match self {
            Self::BigGain => ColorPair::new(Color::GOLD, Color::BLACK),
            Self::StrongGain => ColorPair::new(Color::DARK_GREEN, Color::WHITE),
            Self::Gain => ColorPair::new(Color::LIME_GREEN, Color::BLACK),
            Self::SmallGain => ColorPair::new(Color::PALE_GREEN, Color::BLACK),
            Self::SmallLoss => ColorPair::new(Color::PALE_RED, Color::BLACK),
            // No threshold row selects `Loss`; it shares the light-red shading.
            Self::Loss => ColorPair::new(Color::TOMATO, Color::BLACK),
            Self::StrongLoss => ColorPair::new(Color::TOMATO, Color::BLACK),
            Self::BigLoss => ColorPair::new(Color::DARK_RED, Color::WHITE),
            Self::Neutral => ColorPair::new(Color::WHITE, Color::BLACK),
            Self::Missing => ColorPair::new(Color::LIGHT_GRAY, Color::BLACK),
        }
    }
}

impl Display for Bucket {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Threshold table variant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scheme {
    /// Full ten-bucket table.
    #[default]
    Fine,
    /// No small-move shading: `[-1, 0)` and `(0, 1]` render as `Neutral`.
    Coarse,
}

impl Scheme {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fine => "fine",
            Self::Coarse => "coarse",
        }
    }
}

impl Display for Scheme {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scheme {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "fine" => Ok(Self::Fine),
            "coarse" => Ok(Self::Coarse),
            _ => Err(ValidationError::InvalidScheme {
                value: value.to_owned(),
            }),
        }
    }
}

/// Pure, total mapping from percent change to bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Classifier {
    scheme: Scheme,
}

impl Classifier {
    pub const fn new(scheme: Scheme) -> Self {
        Self { scheme }
    }

    pub const fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn classify(&self, percent_change: Option<f64>) -> Bucket {
        let bucket = classify(percent_change);
        match (self.scheme, bucket) {
            (Scheme::Coarse, Bucket::SmallGain | Bucket::SmallLoss) => Bucket::Neutral,
            _ => bucket,
        }
    }
}

/// Classifies with the full ten-bucket table.
///
/// `NaN` fails every comparison and lands in `Neutral`.
pub fn classify(percent_change: Option<f64>) -> Bucket {
    let Some(change) = percent_change else {
        return Bucket::Missing;
    };

    if change > 3.0 {
        Bucket::BigGain
    } else if change > 2.0 {
        Bucket::StrongGain
    } else if change > 1.0 {
        Bucket::Gain
    } else if change > 0.0 && change <= 1.0 {
        Bucket::SmallGain
    } else if (-1.0..0.0).contains(&change) {
        Bucket::SmallLoss
    } else if change < -2.0 {
        Bucket::BigLoss
    } else if change < -1.0 {
        Bucket::StrongLoss
    } else {
        Bucket::Neutral
    }
}

use crate::domain::market_data::Timestamp;
use serde::{Deserialize, Serialize, Serializer};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// Value Object - what the primary pane shows
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumIter, EnumString, AsRefStr, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ChartMode {
    /// Open/high/low/close bars
    #[default]
    Ohlc,
    /// Close-price line
    Price,
    /// Volume histogram only
    Volume,
}

impl ChartMode {
    /// Rendering kind of the primary series, `None` when the pane shows volume only.
    pub fn primary_series_kind(&self) -> Option<SeriesKind> {
        match self {
            ChartMode::Ohlc => Some(SeriesKind::Bar),
            ChartMode::Price => Some(SeriesKind::Line),
            ChartMode::Volume => None,
        }
    }
}

/// Closed set of series kinds a renderer has to support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesKind {
    Bar,
    Line,
    Histogram,
    Band,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumIter, EnumString, AsRefStr, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

/// Chart panes sharing one time axis.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumIter, EnumString, AsRefStr, Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PaneKind {
    Price,
    Volume,
    Rsi,
    Atr,
}

/// Value Object - visible window on the shared time axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub from: Timestamp,
    pub to: Timestamp,
}

impl TimeRange {
    pub fn new(from: Timestamp, to: Timestamp) -> Self {
        if from <= to { Self { from, to } } else { Self { from: to, to: from } }
    }

    pub fn span_secs(&self) -> u64 {
        self.to.value() - self.from.value()
    }

    pub fn contains(&self, time: Timestamp) -> bool {
        self.from <= time && time <= self.to
    }
}

/// Value Object - RGBA color, serialized as a CSS `rgba(...)` string
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Color {
    pub const fn rgba(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn from_hex(hex: u32) -> Self {
        Self::rgba(((hex >> 16) & 0xFF) as u8, ((hex >> 8) & 0xFF) as u8, (hex & 0xFF) as u8, 1.0)
    }

    pub fn with_alpha(&self, alpha: f32) -> Self {
        Self { a: alpha, ..*self }
    }

    pub fn to_css(&self) -> String {
        format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_css())
    }
}

/// Up/down pair used to tint volume bars.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumePalette {
    pub up: Color,
    pub down: Color,
}

impl VolumePalette {
    pub const LIGHT: VolumePalette = VolumePalette {
        up: Color::rgba(38, 166, 154, 0.5),
        down: Color::rgba(239, 83, 80, 0.5),
    };

    pub const DARK: VolumePalette = VolumePalette {
        up: Color::rgba(8, 153, 129, 0.8),
        down: Color::rgba(242, 54, 69, 0.8),
    };

    pub fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Light => Self::LIGHT,
            Theme::Dark => Self::DARK,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn mode_parses_lowercase_names() {
        assert_eq!(ChartMode::from_str("price").unwrap(), ChartMode::Price);
        assert_eq!(ChartMode::Volume.to_string(), "volume");
        assert!(ChartMode::from_str("candles").is_err());
    }

    #[test]
    fn palettes_differ_by_direction_and_theme() {
        for theme in [Theme::Light, Theme::Dark] {
            let palette = VolumePalette::for_theme(theme);
            assert_ne!(palette.up, palette.down);
        }
        assert_ne!(VolumePalette::LIGHT.up, VolumePalette::DARK.up);
    }

    #[test]
    fn color_serializes_as_css() {
        let json = serde_json::to_string(&Color::from_hex(0x2962FF).with_alpha(0.5)).unwrap();
        assert_eq!(json, "\"rgba(41, 98, 255, 0.5)\"");
    }

    #[test]
    fn time_range_orders_its_ends() {
        let range = TimeRange::new(Timestamp::from(200), Timestamp::from(100));
        assert_eq!(range.from.value(), 100);
        assert_eq!(range.span_secs(), 100);
        assert!(range.contains(Timestamp::from(150)));
    }
}

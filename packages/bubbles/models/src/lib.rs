#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Output and configuration types of the bubble grid engine.
//!
//! The engine never draws anything itself. Each render produces a
//! [`RenderFrame`]: a declarative list of [`BubbleDescriptor`]s plus the
//! layout, legend and enter/update/exit diff that a retained-mode
//! SVG or canvas renderer needs to bring its scene up to date.

pub mod config;

use chile_dashboard_dataset_models::{SortKey, Year};
use serde::{Deserialize, Serialize};

pub use config::{
    BorderConfig, ColorConfig, EngineConfig, Features, LayoutConfig, LegendConfig, LegendStyle,
    RadiusConfig, TransitionConfig,
};

/// An opaque 8-bit RGB color, serialized as `"#rrggbb"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Rgb {
    /// Creates a color from its channels.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parses `"#rrggbb"` (the leading `#` is optional).
    #[must_use]
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }

        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some(Self { r, g, b })
    }

    /// Formats as lowercase `"#rrggbb"`.
    #[must_use]
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Linear RGB interpolation; `t` is clamped to `[0, 1]`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn lerp(self, other: Self, t: f64) -> Self {
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
        let channel = |a: u8, b: u8| {
            let (a, b) = (f64::from(a), f64::from(b));
            (b - a).mul_add(t, a).round().clamp(0.0, 255.0) as u8
        };

        Self {
            r: channel(self.r, other.r),
            g: channel(self.g, other.g),
            b: channel(self.b, other.b),
        }
    }
}

/// Error returned when a string is not a `#rrggbb` color.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidColorError {
    /// The rejected input.
    pub value: String,
}

impl std::fmt::Display for InvalidColorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid color '{}': expected #rrggbb", self.value)
    }
}

impl std::error::Error for InvalidColorError {}

impl TryFrom<String> for Rgb {
    type Error = InvalidColorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value).ok_or(InvalidColorError { value })
    }
}

impl From<Rgb> for String {
    fn from(color: Rgb) -> Self {
        color.to_hex()
    }
}

impl std::fmt::Display for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// One grid slot, in visiting order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutCell {
    /// Visiting order (0 = first-ranked record).
    pub index: usize,
    /// Column the cell occupies (after serpentine reversal).
    pub column: usize,
    /// Row the cell occupies.
    pub row: usize,
    /// Horizontal center in container pixels.
    pub center_x: f64,
    /// Vertical center in container pixels.
    pub center_y: f64,
}

/// Result of a grid layout computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridLayout {
    /// Cells in visiting order; `cells[i]` hosts the `i`-th sorted record.
    pub cells: Vec<LayoutCell>,
    /// Column count.
    pub columns: usize,
    /// Row count actually used.
    pub rows: usize,
    /// Width of one cell, always positive.
    pub cell_width: f64,
    /// Height of one cell, always positive.
    pub cell_height: f64,
    /// Whether the minimum cell size forced content past the container.
    pub overflow: bool,
}

impl GridLayout {
    /// Smallest of the two cell dimensions.
    #[must_use]
    pub fn min_cell_side(&self) -> f64 {
        self.cell_width.min(self.cell_height)
    }
}

/// Everything a renderer needs to draw one region's bubble.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BubbleDescriptor {
    /// Region key (stable across renders).
    pub region: String,
    /// Center x in container pixels.
    pub x: f64,
    /// Center y in container pixels.
    pub y: f64,
    /// Circle radius; area is proportional to VIF.
    pub radius: f64,
    /// Fill color derived from satisfaction.
    pub fill_color: Rgb,
    /// Stroke width derived from crime rate.
    pub border_width: f64,
    /// Outline color.
    pub stroke_color: Rgb,
    /// Label drawn above the circle.
    pub label_text: String,
    /// Abbreviated label for narrow layouts.
    pub short_label: String,
    /// Lines drawn inside the circle.
    pub value_text: Vec<String>,
    /// Font size of `label_text`.
    pub label_font_size: f64,
    /// Font size of `value_text`.
    pub value_font_size: f64,
    /// Vertical offset of `label_text` relative to the center.
    pub label_offset_y: f64,
}

/// Literal minimum and maximum of a metric's finite values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extremes {
    /// Smallest finite value.
    pub min: f64,
    /// Largest finite value.
    pub max: f64,
}

/// A gradient stop of the color legend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradientStop {
    /// Position along the gradient in `[0, 1]`.
    pub offset: f64,
    /// Color at that position.
    pub color: Rgb,
}

/// An axis tick under the color legend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    /// Satisfaction value of the tick.
    pub value: f64,
    /// Formatted label (`"75.0%"`).
    pub label: String,
}

/// Satisfaction → color legend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorLegend {
    /// Legend title.
    pub title: String,
    /// Global satisfaction domain.
    pub domain: [f64; 2],
    /// Gradient stops from the domain minimum to the maximum.
    pub stops: Vec<GradientStop>,
    /// Axis ticks.
    pub ticks: Vec<Tick>,
}

/// VIF → radius legend: two sample circles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SizeLegend {
    /// Legend title.
    pub title: String,
    /// Radius of the low sample.
    pub r_min: f64,
    /// Radius of the high sample.
    pub r_max: f64,
    /// Raw VIF extremes of the displayed year, if any value was finite.
    pub extremes: Option<Extremes>,
    /// Label of the low sample.
    pub low_label: String,
    /// Label of the high sample.
    pub high_label: String,
    /// Fill of both samples (color at the satisfaction midpoint).
    pub swatch_color: Rgb,
    /// Outline of both samples.
    pub stroke_color: Rgb,
}

/// Crime rate → border width legend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BorderLegend {
    /// Legend title.
    pub title: String,
    /// Thinnest stroke.
    pub width_min: f64,
    /// Thickest stroke.
    pub width_max: f64,
    /// Raw crime-rate extremes of the displayed year, if any value was finite.
    pub extremes: Option<Extremes>,
    /// Label of the thin sample.
    pub low_label: String,
    /// Label of the thick sample.
    pub high_label: String,
}

/// All legends of one render; a legend is `None` when hidden by
/// [`LegendStyle`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LegendModel {
    /// Color legend.
    pub color: Option<ColorLegend>,
    /// Size legend.
    pub size: Option<SizeLegend>,
    /// Border legend.
    pub border: Option<BorderLegend>,
}

/// Region keys split by what happened to them in a render.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameDiff {
    /// New regions, in display order.
    pub entering: Vec<String>,
    /// Regions present before and after, in display order.
    pub updating: Vec<String>,
    /// Removed regions, alphabetical.
    pub exiting: Vec<String>,
}

/// The declarative output of one render call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderFrame {
    /// Year rendered.
    pub year: Year,
    /// Ordering applied.
    pub sort: SortKey,
    /// Target bubbles in display order.
    pub bubbles: Vec<BubbleDescriptor>,
    /// Enter/update/exit split against the previous render.
    pub diff: FrameDiff,
    /// Legends for this render.
    pub legend: LegendModel,
    /// Grid geometry.
    pub layout: GridLayout,
    /// Message to show instead of the grid when the year has no rows.
    pub placeholder: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_roundtrip() {
        let color = Rgb::from_hex("#263363").unwrap();
        assert_eq!(color, Rgb::new(0x26, 0x33, 0x63));
        assert_eq!(color.to_hex(), "#263363");
        assert_eq!(Rgb::from_hex("8FB4FF"), Some(Rgb::new(0x8f, 0xb4, 0xff)));
        assert_eq!(Rgb::from_hex("#GGGGGG"), None);
        assert_eq!(Rgb::from_hex("#fff"), None);
    }

    #[test]
    fn lerp_endpoints_and_midpoint() {
        let a = Rgb::new(0, 100, 200);
        let b = Rgb::new(100, 200, 0);
        assert_eq!(a.lerp(b, 0.0), a);
        assert_eq!(a.lerp(b, 1.0), b);
        assert_eq!(a.lerp(b, 0.5), Rgb::new(50, 150, 100));
        assert_eq!(a.lerp(b, 7.0), b, "t is clamped");
        assert_eq!(a.lerp(b, f64::NAN), a);
    }

    #[test]
    fn rgb_serializes_as_hex_string() {
        let json = serde_json::to_string(&Rgb::new(0x3a, 0x43, 0x66)).unwrap();
        assert_eq!(json, "\"#3a4366\"");

        let parsed: Rgb = serde_json::from_str("\"#233055\"").unwrap();
        assert_eq!(parsed, Rgb::new(0x23, 0x30, 0x55));
        assert!(serde_json::from_str::<Rgb>("\"blue\"").is_err());
    }
}

//! Engine configuration.
//!
//! Every section implements [`Default`] and is `#[serde(default)]`, so a
//! TOML file only needs to name the values it overrides:
//!
//! ```toml
//! [layout]
//! row_count = 4
//!
//! [legend]
//! style = "color_only"
//! ```

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

use crate::Rgb;

/// Complete engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Grid geometry.
    pub layout: LayoutConfig,
    /// VIF → radius mapping.
    pub radius: RadiusConfig,
    /// Crime rate → border width mapping.
    pub border: BorderConfig,
    /// Satisfaction → color mapping.
    pub color: ColorConfig,
    /// Animation between renders.
    pub transition: TransitionConfig,
    /// Legend rendering.
    pub legend: LegendConfig,
    /// Optional behaviors.
    pub features: Features,
}

/// Grid geometry, in container pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Initial container width.
    pub container_width: f64,
    /// Initial container height.
    pub container_height: f64,
    /// Left and right padding.
    pub padding_x: f64,
    /// Top and bottom padding.
    pub padding_y: f64,
    /// Horizontal gap between cells.
    pub gap_x: f64,
    /// Vertical gap between cells.
    pub gap_y: f64,
    /// Target number of rows; columns are `ceil(n / row_count)`.
    pub row_count: usize,
    /// Smallest usable cell side.
    pub min_cell_size: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            container_width: 3800.0,
            container_height: 2000.0,
            padding_x: 150.0,
            padding_y: 150.0,
            gap_x: 100.0,
            gap_y: 110.0,
            row_count: 2,
            min_cell_size: 32.0,
        }
    }
}

/// Radius range derivation from the cell size.
///
/// `base = max(base_floor, min(cell_w, cell_h) * base_factor)`,
/// `r_min = max(min_floor, base * min_factor)`,
/// `r_max = max(r_min + min_delta, base * max_factor)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadiusConfig {
    /// Lower bound of the base radius.
    pub base_floor: f64,
    /// Share of the smaller cell side used as base radius.
    pub base_factor: f64,
    /// Readability floor of the smallest bubble.
    pub min_floor: f64,
    /// Smallest bubble relative to the base radius.
    pub min_factor: f64,
    /// Largest bubble relative to the base radius.
    pub max_factor: f64,
    /// Guaranteed gap between the smallest and largest radius.
    pub min_delta: f64,
    /// Radius used when a year has no finite VIF value, or for a record
    /// whose own VIF is not finite.
    pub fallback: f64,
}

impl Default for RadiusConfig {
    fn default() -> Self {
        Self {
            base_floor: 34.0,
            base_factor: 0.48,
            min_floor: 26.0,
            min_factor: 0.70,
            max_factor: 1.30,
            min_delta: 10.0,
            fallback: 24.0,
        }
    }
}

/// Border width range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BorderConfig {
    /// Stroke of the lowest crime rate.
    pub min_width: f64,
    /// Stroke of the highest crime rate.
    pub max_width: f64,
    /// Stroke used when no finite crime rate is available.
    pub fallback: f64,
}

impl Default for BorderConfig {
    fn default() -> Self {
        Self {
            min_width: 1.5,
            max_width: 6.0,
            fallback: 3.0,
        }
    }
}

/// Satisfaction color ramp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorConfig {
    /// Ramp colors, spread evenly from the domain minimum to its maximum.
    pub stops: Vec<Rgb>,
    /// Domain used when the dataset has no finite satisfaction value.
    pub fallback_domain: [f64; 2],
    /// Fill of a region whose satisfaction is not finite.
    pub missing: Rgb,
    /// Bubble outline color.
    pub stroke: Rgb,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            stops: vec![
                Rgb::new(0x26, 0x33, 0x63),
                Rgb::new(0x3b, 0x56, 0xa8),
                Rgb::new(0x8f, 0xb4, 0xff),
            ],
            fallback_domain: [70.0, 85.0],
            missing: Rgb::new(0x3a, 0x43, 0x66),
            stroke: Rgb::new(0x23, 0x30, 0x55),
        }
    }
}

/// Animation between two renders.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitionConfig {
    /// Duration of every transition in milliseconds; `0` snaps.
    pub duration_ms: u64,
    /// Radius an entering bubble grows from.
    pub enter_radius: f64,
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self {
            duration_ms: 600,
            enter_radius: 0.0,
        }
    }
}

/// Which legends a render produces.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LegendStyle {
    /// Color, size and border legends.
    #[default]
    Full,
    /// Only the satisfaction color legend.
    ColorOnly,
    /// No legend.
    Hidden,
}

/// Legend rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LegendConfig {
    /// Which legends to build.
    pub style: LegendStyle,
    /// Gradient resolution; the legend carries `samples + 1` stops.
    pub gradient_samples: usize,
    /// Approximate number of axis ticks.
    pub tick_count: usize,
}

impl Default for LegendConfig {
    fn default() -> Self {
        Self {
            style: LegendStyle::Full,
            gradient_samples: 60,
            tick_count: 6,
        }
    }
}

/// Optional behaviors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Features {
    /// Honor the requested sort key; when off, always sort by satisfaction.
    pub sort_control: bool,
    /// Allow hit testing bubbles to open the detail panel.
    pub click_to_detail: bool,
}

impl Default for Features {
    fn default() -> Self {
        Self {
            sort_control: true,
            click_to_detail: true,
        }
    }
}

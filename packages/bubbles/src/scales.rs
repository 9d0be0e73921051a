//! Value → visual mappings.
//!
//! The color scale is global: its domain spans every year of the dataset
//! so a color means the same satisfaction level whichever year is shown.
//! It is derived once per dataset and shared through an [`Arc`].
//!
//! The radius and border scales are local: they are rebuilt on every
//! render from the displayed year's finite values, so bubble sizes are
//! only comparable within one year.

use std::sync::Arc;

use chile_dashboard_bubbles_models::{
    BorderConfig, ColorConfig, EngineConfig, GridLayout, RadiusConfig, Rgb,
};
use chile_dashboard_dataset_models::{Dataset, RegionRecord};

use crate::legend::extremes;

/// Maps a value onto `[0, 1]` within `domain`, clamped.
///
/// A degenerate domain maps every value to the midpoint.
fn normalize(value: f64, domain: [f64; 2]) -> f64 {
    let span = domain[1] - domain[0];
    if span.abs() < f64::EPSILON {
        0.5
    } else {
        ((value - domain[0]) / span).clamp(0.0, 1.0)
    }
}

/// Square root that keeps the sign, so negative inputs stay monotonic.
fn signed_sqrt(value: f64) -> f64 {
    value.signum() * value.abs().sqrt()
}

fn interpolate(range: [f64; 2], t: f64) -> f64 {
    (range[1] - range[0]).mul_add(t, range[0])
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Mapping {
    Linear { domain: [f64; 2], range: [f64; 2] },
    Sqrt { domain: [f64; 2], range: [f64; 2] },
    Constant,
}

/// A numeric scale with a fallback for non-finite input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricScale {
    mapping: Mapping,
    fallback: f64,
}

impl MetricScale {
    /// Linear interpolation from `domain` onto `range`, clamped.
    #[must_use]
    pub const fn linear(domain: [f64; 2], range: [f64; 2], fallback: f64) -> Self {
        Self {
            mapping: Mapping::Linear { domain, range },
            fallback,
        }
    }

    /// Square-root interpolation (output² ∝ input), clamped.
    #[must_use]
    pub const fn sqrt(domain: [f64; 2], range: [f64; 2], fallback: f64) -> Self {
        Self {
            mapping: Mapping::Sqrt { domain, range },
            fallback,
        }
    }

    /// Always returns `value`.
    #[must_use]
    pub const fn constant(value: f64) -> Self {
        Self {
            mapping: Mapping::Constant,
            fallback: value,
        }
    }

    /// Maps `value`; non-finite input yields the fallback.
    #[must_use]
    pub fn apply(&self, value: f64) -> f64 {
        if !value.is_finite() {
            return self.fallback;
        }

        match self.mapping {
            Mapping::Linear { domain, range } => interpolate(range, normalize(value, domain)),
            Mapping::Sqrt { domain, range } => {
                let domain = [signed_sqrt(domain[0]), signed_sqrt(domain[1])];
                interpolate(range, normalize(signed_sqrt(value), domain))
            }
            Mapping::Constant => self.fallback,
        }
    }

    /// The input domain, or `None` for a constant scale.
    #[must_use]
    pub const fn domain(&self) -> Option<[f64; 2]> {
        match self.mapping {
            Mapping::Linear { domain, .. } | Mapping::Sqrt { domain, .. } => Some(domain),
            Mapping::Constant => None,
        }
    }

    /// The output range; a constant scale has a zero-width range.
    #[must_use]
    pub const fn range(&self) -> [f64; 2] {
        match self.mapping {
            Mapping::Linear { range, .. } | Mapping::Sqrt { range, .. } => range,
            Mapping::Constant => [self.fallback, self.fallback],
        }
    }

    /// Whether this scale ignores its input.
    #[must_use]
    pub const fn is_constant(&self) -> bool {
        matches!(self.mapping, Mapping::Constant)
    }
}

/// Satisfaction → fill color, piecewise linear across evenly spaced stops.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorScale {
    domain: [f64; 2],
    stops: Vec<Rgb>,
    missing: Rgb,
}

impl ColorScale {
    /// Creates a color scale. `stops` must hold at least one color.
    #[must_use]
    pub fn new(domain: [f64; 2], stops: Vec<Rgb>, missing: Rgb) -> Self {
        Self {
            domain,
            stops,
            missing,
        }
    }

    /// The satisfaction domain.
    #[must_use]
    pub const fn domain(&self) -> [f64; 2] {
        self.domain
    }

    /// Color of the domain midpoint.
    #[must_use]
    pub fn midpoint(&self) -> Rgb {
        self.apply((self.domain[0] + self.domain[1]) / 2.0)
    }

    /// Maps `value`; non-finite input yields the missing-data color.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn apply(&self, value: f64) -> Rgb {
        if !value.is_finite() {
            return self.missing;
        }
        match self.stops.as_slice() {
            [] => self.missing,
            [only] => *only,
            stops => {
                let segments = stops.len() - 1;
                let position = normalize(value, self.domain) * segments as f64;
                let index = (position.floor() as usize).min(segments - 1);
                stops[index].lerp(stops[index + 1], position - index as f64)
            }
        }
    }
}

/// Scales rebuilt from the displayed year on every render.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalScales {
    /// VIF → radius.
    pub radius: MetricScale,
    /// Crime rate → border width.
    pub border: MetricScale,
}

/// Derives the global color scale from every year of `dataset`.
///
/// The domain is `[floor(min), ceil(max)]` over all finite satisfaction
/// values, or the configured fallback domain when there are none.
#[must_use]
pub fn derive_color_scale(dataset: &Dataset, config: &ColorConfig) -> ColorScale {
    let domain = extremes(dataset.all_rows().map(|r| r.satisfaccion)).map_or_else(
        || {
            log::warn!(
                "No finite satisfaction values; using fallback color domain {:?}",
                config.fallback_domain
            );
            config.fallback_domain
        },
        |e| [e.min.floor(), e.max.ceil()],
    );

    log::info!("Derived satisfaction color domain {domain:?}");
    ColorScale::new(domain, config.stops.clone(), config.missing)
}

/// Holds the color scale of the most recently seen dataset.
///
/// Asking again for the same dataset (same [`Arc`]) returns the cached
/// scale without touching the data.
#[derive(Debug, Default)]
pub struct ColorScaleCache {
    entry: Option<(Arc<Dataset>, Arc<ColorScale>)>,
}

impl ColorScaleCache {
    /// Returns the color scale for `dataset`, deriving it on first use.
    pub fn get_or_derive(
        &mut self,
        dataset: &Arc<Dataset>,
        config: &ColorConfig,
    ) -> Arc<ColorScale> {
        if let Some((cached, scale)) = &self.entry
            && Arc::ptr_eq(cached, dataset)
        {
            return Arc::clone(scale);
        }

        let scale = Arc::new(derive_color_scale(dataset, config));
        self.entry = Some((Arc::clone(dataset), Arc::clone(&scale)));
        scale
    }
}

/// Smallest and largest radius for a grid whose smaller cell side is
/// `min_cell_side`.
#[must_use]
pub fn radius_range(min_cell_side: f64, config: &RadiusConfig) -> [f64; 2] {
    let base = config.base_floor.max(min_cell_side * config.base_factor);
    let r_min = config.min_floor.max(base * config.min_factor);
    let r_max = (r_min + config.min_delta).max(base * config.max_factor);
    [r_min, r_max]
}

fn radius_scale(rows: &[RegionRecord], layout: &GridLayout, config: &RadiusConfig) -> MetricScale {
    let range = radius_range(layout.min_cell_side(), config);
    extremes(rows.iter().map(|r| r.vif)).map_or_else(
        || {
            log::warn!("No finite VIF values; using constant radius {}", config.fallback);
            MetricScale::constant(config.fallback)
        },
        |e| MetricScale::sqrt([e.min, e.max], range, config.fallback),
    )
}

fn border_scale(rows: &[RegionRecord], config: &BorderConfig) -> MetricScale {
    extremes(rows.iter().map(|r| r.delitos)).map_or_else(
        || {
            log::warn!("No finite crime rates; using constant border {}", config.fallback);
            MetricScale::constant(config.fallback)
        },
        |e| {
            MetricScale::linear(
                [e.min, e.max],
                [config.min_width, config.max_width],
                config.fallback,
            )
        },
    )
}

/// Derives the radius and border scales from the displayed year's rows.
///
/// Non-finite values are left out of the domains; when nothing finite
/// remains the scale falls back to the configured constant.
#[must_use]
pub fn derive_local_scales(
    rows: &[RegionRecord],
    layout: &GridLayout,
    config: &EngineConfig,
) -> LocalScales {
    LocalScales {
        radius: radius_scale(rows, layout, &config.radius),
        border: border_scale(rows, &config.border),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn layout(side: f64) -> GridLayout {
        GridLayout {
            cells: Vec::new(),
            columns: 1,
            rows: 1,
            cell_width: side,
            cell_height: side,
            overflow: false,
        }
    }

    fn dataset() -> Dataset {
        let mut rows = BTreeMap::new();
        rows.insert(
            "2021".to_owned(),
            vec![
                RegionRecord::new("A", 72.4, 0.5, 1.2),
                RegionRecord::new("B", 84.2, 1.5, 0.8),
            ],
        );
        rows.insert(
            "2023".to_owned(),
            vec![
                RegionRecord::new("A", 88.6, 0.7, 1.0),
                RegionRecord::new("B", f64::NAN, 0.9, 0.9),
            ],
        );
        Dataset {
            years: vec![2021, 2023],
            rows,
            studied_crimes: Vec::new(),
        }
    }

    #[test]
    fn sqrt_scale_is_monotonic() {
        let scale = MetricScale::sqrt([0.2, 1.8], [26.0, 60.0], 24.0);
        let mut previous = f64::MIN;
        for step in 0..=160 {
            let value = 0.2 + f64::from(step) * 0.01;
            let radius = scale.apply(value);
            assert!(radius >= previous, "radius decreased at {value}");
            previous = radius;
        }
        assert!((scale.apply(0.2) - 26.0).abs() < 1e-9);
        assert!((scale.apply(1.8) - 60.0).abs() < 1e-9);
    }

    #[test]
    fn sqrt_scale_is_area_proportional() {
        let scale = MetricScale::sqrt([0.0, 4.0], [0.0, 20.0], 0.0);
        assert!((scale.apply(1.0) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn degenerate_domain_maps_to_midpoint() {
        let scale = MetricScale::sqrt([0.5, 0.5], [30.0, 40.0], 24.0);
        assert!((scale.apply(0.5) - 35.0).abs() < 1e-9);
    }

    #[test]
    fn non_finite_input_uses_fallback() {
        let scale = MetricScale::linear([0.0, 1.0], [1.5, 6.0], 3.0);
        assert!((scale.apply(f64::NAN) - 3.0).abs() < f64::EPSILON);
        assert!((scale.apply(f64::INFINITY) - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn color_domain_spans_all_years() {
        let scale = derive_color_scale(&dataset(), &ColorConfig::default());
        assert_eq!(scale.domain(), [72.0, 89.0]);
    }

    #[test]
    fn color_scale_hits_configured_stops() {
        let config = ColorConfig::default();
        let scale = ColorScale::new([70.0, 90.0], config.stops.clone(), config.missing);
        assert_eq!(scale.apply(70.0), config.stops[0]);
        assert_eq!(scale.apply(80.0), config.stops[1]);
        assert_eq!(scale.apply(90.0), config.stops[2]);
        assert_eq!(scale.apply(120.0), config.stops[2]);
        assert_eq!(scale.apply(f64::NAN), config.missing);
        assert_eq!(scale.midpoint(), config.stops[1]);
    }

    #[test]
    fn empty_dataset_uses_fallback_color_domain() {
        let scale = derive_color_scale(&Dataset::default(), &ColorConfig::default());
        assert_eq!(scale.domain(), [70.0, 85.0]);
    }

    #[test]
    fn cache_reuses_scale_for_same_dataset() {
        let mut cache = ColorScaleCache::default();
        let data = Arc::new(dataset());
        let first = cache.get_or_derive(&data, &ColorConfig::default());
        let second = cache.get_or_derive(&data, &ColorConfig::default());
        assert!(Arc::ptr_eq(&first, &second));

        let other = Arc::new(Dataset::default());
        let third = cache.get_or_derive(&other, &ColorConfig::default());
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(third.domain(), [70.0, 85.0]);
    }

    #[test]
    fn radius_range_respects_floor_and_delta() {
        let config = RadiusConfig::default();

        let [r_min, r_max] = radius_range(350.0, &config);
        assert!((r_min - 117.6).abs() < 1e-9, "{r_min}");
        assert!((r_max - 218.4).abs() < 1e-9, "{r_max}");

        let [r_min, r_max] = radius_range(10.0, &config);
        assert!((r_min - 26.0).abs() < 1e-9);
        assert!((r_max - 44.2).abs() < 1e-9, "{r_max}");
        assert!(r_max - r_min >= config.min_delta);
    }

    #[test]
    fn all_nan_vif_falls_back_to_constant_radius() {
        let rows = vec![
            RegionRecord::new("A", 80.0, f64::NAN, 0.01),
            RegionRecord::new("B", 82.0, f64::NAN, 0.02),
        ];
        let config = EngineConfig::default();
        let local = derive_local_scales(&rows, &layout(350.0), &config);

        assert!(local.radius.is_constant());
        for record in &rows {
            let radius = local.radius.apply(record.vif);
            assert!(radius.is_finite());
            assert!((radius - config.radius.fallback).abs() < f64::EPSILON);
        }
        assert!(!local.border.is_constant());
    }

    #[test]
    fn empty_year_falls_back_to_constants() {
        let config = EngineConfig::default();
        let local = derive_local_scales(&[], &layout(350.0), &config);
        assert!(local.radius.is_constant());
        assert!(local.border.is_constant());
        assert!((local.border.apply(0.4) - config.border.fallback).abs() < f64::EPSILON);
    }

    #[test]
    fn local_domains_ignore_non_finite_values() {
        let rows = vec![
            RegionRecord::new("A", 80.0, 0.5, 1.2),
            RegionRecord::new("B", 90.0, 1.5, f64::NAN),
            RegionRecord::new("C", 85.0, f64::NAN, 0.8),
        ];
        let local = derive_local_scales(&rows, &layout(350.0), &EngineConfig::default());
        assert_eq!(local.radius.domain(), Some([0.5, 1.5]));
        assert_eq!(local.border.domain(), Some([0.8, 1.2]));
        assert!(local.radius.apply(0.5) < local.radius.apply(1.5));
    }
}

//! Legend derivation.
//!
//! Legends show raw data values (the literal min/max of the displayed
//! year), not the clamped ranges the scales work with. A year without a
//! single finite value still gets a legend, labelled with a placeholder.

use chile_dashboard_bubbles_models::{
    BorderLegend, ColorLegend, EngineConfig, Extremes, GradientStop, LegendModel, LegendStyle,
    SizeLegend, Tick,
};
use chile_dashboard_dataset_models::RegionRecord;

use crate::format::{MISSING, fraction_pct, satisfaction_pct};
use crate::scales::{ColorScale, LocalScales};

/// Literal min and max of the finite values in `values`.
///
/// Returns `None` when no value is finite.
pub fn extremes(values: impl IntoIterator<Item = f64>) -> Option<Extremes> {
    values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some(Extremes { min: v, max: v }),
            Some(e) => Some(Extremes {
                min: e.min.min(v),
                max: e.max.max(v),
            }),
        })
}

/// Start index, end index and increment of the tick sequence. A negative
/// increment means "divide by `-inc`", which keeps decimal ticks exact.
fn tick_range(start: f64, stop: f64, count: f64) -> (f64, f64, f64) {
    let step = (stop - start) / count;
    let power = step.log10().floor();
    let error = step / 10f64.powf(power);
    let factor = if error >= 50f64.sqrt() {
        10.0
    } else if error >= 10f64.sqrt() {
        5.0
    } else if error >= 2f64.sqrt() {
        2.0
    } else {
        1.0
    };

    let (i1, i2, inc) = if power < 0.0 {
        let scale = 10f64.powf(-power) / factor;
        let mut i1 = (start * scale).round();
        let mut i2 = (stop * scale).round();
        if i1 / scale < start {
            i1 += 1.0;
        }
        if i2 / scale > stop {
            i2 -= 1.0;
        }
        (i1, i2, -scale)
    } else {
        let scale = 10f64.powf(power) * factor;
        let mut i1 = (start / scale).round();
        let mut i2 = (stop / scale).round();
        if i1 * scale < start {
            i1 += 1.0;
        }
        if i2 * scale > stop {
            i2 -= 1.0;
        }
        (i1, i2, scale)
    };

    if i2 < i1 && (0.5..2.0).contains(&count) {
        return tick_range(start, stop, count * 2.0);
    }
    (i1, i2, inc)
}

/// Round-numbered ticks covering `[start, stop]`, roughly `count` of them
/// (1, 2 or 5 times a power of ten apart).
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn nice_ticks(start: f64, stop: f64, count: usize) -> Vec<f64> {
    if !(start.is_finite() && stop.is_finite()) || count == 0 {
        return Vec::new();
    }
    if (stop - start).abs() < f64::EPSILON {
        return vec![start];
    }

    let (lo, hi) = if start <= stop {
        (start, stop)
    } else {
        (stop, start)
    };
    let (i1, i2, inc) = tick_range(lo, hi, count as f64);
    if i2 < i1 {
        return Vec::new();
    }

    let n = (i2 - i1) as usize + 1;
    (0..n)
        .map(|i| {
            let k = i1 + i as f64;
            if inc < 0.0 { k / -inc } else { k * inc }
        })
        .collect()
}

#[allow(clippy::cast_precision_loss)]
fn color_legend(config: &EngineConfig, color: &ColorScale) -> ColorLegend {
    let [min, max] = color.domain();
    let samples = config.legend.gradient_samples.max(1);

    let stops = (0..=samples)
        .map(|i| {
            let offset = i as f64 / samples as f64;
            GradientStop {
                offset,
                color: color.apply((max - min).mul_add(offset, min)),
            }
        })
        .collect();

    let ticks = nice_ticks(min, max, config.legend.tick_count)
        .into_iter()
        .map(|value| Tick {
            value,
            label: satisfaction_pct(value),
        })
        .collect();

    ColorLegend {
        title: "Satisfacción de la vida (%)".to_owned(),
        domain: [min, max],
        stops,
        ticks,
    }
}

fn extreme_labels(prefix: &str, extremes: Option<Extremes>) -> (String, String) {
    extremes.map_or_else(
        || {
            (
                format!("{prefix} bajo ({MISSING})"),
                format!("{prefix} alto ({MISSING})"),
            )
        },
        |e| {
            (
                format!("{prefix} bajo ({})", fraction_pct(e.min)),
                format!("{prefix} alto ({})", fraction_pct(e.max)),
            )
        },
    )
}

fn size_legend(
    config: &EngineConfig,
    color: &ColorScale,
    local: &LocalScales,
    rows: &[RegionRecord],
) -> SizeLegend {
    let [r_min, r_max] = local.radius.range();
    let vif = extremes(rows.iter().map(|r| r.vif));
    let (low_label, high_label) = extreme_labels("VIF", vif);

    SizeLegend {
        title: "Tamaño = VIF".to_owned(),
        r_min,
        r_max,
        extremes: vif,
        low_label,
        high_label,
        swatch_color: color.midpoint(),
        stroke_color: config.color.stroke,
    }
}

fn border_legend(local: &LocalScales, rows: &[RegionRecord]) -> BorderLegend {
    let [width_min, width_max] = local.border.range();
    let crime = extremes(rows.iter().map(|r| r.delitos));
    let (low_label, high_label) = extreme_labels("Delitos", crime);

    BorderLegend {
        title: "Borde = Delitos".to_owned(),
        width_min,
        width_max,
        extremes: crime,
        low_label,
        high_label,
    }
}

/// Builds the legends of one render, honoring the configured
/// [`LegendStyle`].
#[must_use]
pub fn build_legend(
    config: &EngineConfig,
    color: &ColorScale,
    local: &LocalScales,
    rows: &[RegionRecord],
) -> LegendModel {
    match config.legend.style {
        LegendStyle::Hidden => LegendModel::default(),
        LegendStyle::ColorOnly => LegendModel {
            color: Some(color_legend(config, color)),
            size: None,
            border: None,
        },
        LegendStyle::Full => LegendModel {
            color: Some(color_legend(config, color)),
            size: Some(size_legend(config, color, local, rows)),
            border: Some(border_legend(local, rows)),
        },
    }
}

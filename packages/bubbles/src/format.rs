//! Display text for bubbles and legends.
//!
//! VIF and crime rates are stored as fractions and only turned into
//! percentages here. Satisfaction is already a percentage.

/// Placeholder shown for a value that is missing or not finite.
pub const MISSING: &str = "—";

/// Abbreviations for region names that do not fit inside a bubble.
const SHORT_LABELS: &[(&str, &str)] = &[
    ("Arica y Parinacota", "Arica"),
    ("Valparaíso", "Valpo"),
    ("Metropolitana", "Stgo"),
    ("O'Higgins", "O'Hig."),
    ("Antofagasta", "Antofa"),
    ("Araucanía", "Arauc."),
    ("Magallanes", "Magal."),
    ("Los Ríos", "L. Ríos"),
    ("Los Lagos", "L. Lagos"),
];

/// Short form of `region`, or the name itself when it has none.
#[must_use]
pub fn short_label(region: &str) -> &str {
    SHORT_LABELS
        .iter()
        .find(|(name, _)| *name == region)
        .map_or(region, |&(_, short)| short)
}

/// Formats a fraction as a whole percentage (`0.123` → `"12%"`).
#[must_use]
pub fn fraction_pct(value: f64) -> String {
    if value.is_finite() {
        format!("{}%", (value * 100.0).round())
    } else {
        MISSING.to_owned()
    }
}

/// Formats a satisfaction percentage with one decimal (`75.0%`).
#[must_use]
pub fn satisfaction_pct(value: f64) -> String {
    if value.is_finite() {
        format!("{value:.1}%")
    } else {
        MISSING.to_owned()
    }
}

/// The two lines drawn inside a bubble.
#[must_use]
pub fn value_lines(vif: f64, delitos: f64) -> Vec<String> {
    vec![
        format!("VIF {}", fraction_pct(vif)),
        format!("Del {}", fraction_pct(delitos)),
    ]
}

/// Font size of the region name above a bubble.
#[must_use]
pub fn label_font_size(radius: f64) -> f64 {
    (radius * 0.32).clamp(10.0, 16.0)
}

/// Font size of the values inside a bubble.
#[must_use]
pub fn value_font_size(radius: f64) -> f64 {
    (radius * 0.38).clamp(11.0, 18.0)
}

/// Vertical offset of the region name relative to the bubble center.
#[must_use]
pub fn label_offset_y(radius: f64) -> f64 {
    -radius - 12.0
}

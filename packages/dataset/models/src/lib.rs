#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Regional statistics types shared across the Chile dashboard.
//!
//! A [`Dataset`] holds one row set per year, each row being a
//! [`RegionRecord`] with the three metrics the dashboard visualizes:
//! life satisfaction, intra-family violence (VIF) and crime rate.
//! Records are immutable once loaded; every consumer reads them through
//! shared references.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Calendar year of a row set.
pub type Year = u16;

/// One region's statistics for a single year.
///
/// `vif` and `delitos` are fractions in `[0, 1]`; `satisfaccion` is
/// already a percentage. A metric that is missing (or `null`) in the
/// source is stored as `NaN` so the region is still rendered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionRecord {
    /// Display name, unique within a year and stable across years.
    pub region: String,
    /// Life-satisfaction percentage.
    #[serde(default = "missing", deserialize_with = "lenient_f64")]
    pub satisfaccion: f64,
    /// Intra-family violence rate (fraction).
    #[serde(default = "missing", deserialize_with = "lenient_f64")]
    pub vif: f64,
    /// Crime rate (fraction).
    #[serde(default = "missing", deserialize_with = "lenient_f64")]
    pub delitos: f64,
    /// Psychological share of VIF, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vif_psicologica: Option<f64>,
    /// Physical share of VIF, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vif_fisica: Option<f64>,
}

const fn missing() -> f64 {
    f64::NAN
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}

impl RegionRecord {
    /// Creates a record with the three core metrics and no VIF breakdown.
    #[must_use]
    pub fn new(region: &str, satisfaccion: f64, vif: f64, delitos: f64) -> Self {
        Self {
            region: region.to_owned(),
            satisfaccion,
            vif,
            delitos,
            vif_psicologica: None,
            vif_fisica: None,
        }
    }

    /// Returns the value of `metric` for this record (may be non-finite).
    #[must_use]
    pub const fn metric(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Satisfaction => self.satisfaccion,
            Metric::Vif => self.vif,
            Metric::Crime => self.delitos,
        }
    }
}

/// The three statistics carried by every [`RegionRecord`].
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Metric {
    /// Life satisfaction (percentage).
    Satisfaction,
    /// Intra-family violence rate.
    Vif,
    /// Crime rate.
    Crime,
}

impl Metric {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Satisfaction, Self::Vif, Self::Crime]
    }

    /// Human-readable label used in legends and the detail panel.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Satisfaction => "Satisfacción de la vida",
            Self::Vif => "VIF",
            Self::Crime => "Delitos",
        }
    }
}

/// Ordering applied to the bubble grid before positions are assigned.
///
/// Every ordering is descending; ties keep the input order.
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
pub enum SortKey {
    /// Highest satisfaction first.
    #[default]
    Satisfaction,
    /// Highest VIF first.
    Vif,
    /// Highest crime rate first.
    Crime,
}

impl SortKey {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Satisfaction, Self::Vif, Self::Crime]
    }

    /// The metric this ordering sorts on.
    #[must_use]
    pub const fn metric(self) -> Metric {
        match self {
            Self::Satisfaction => Metric::Satisfaction,
            Self::Vif => Metric::Vif,
            Self::Crime => Metric::Crime,
        }
    }
}

/// Orders two metric values, placing non-finite values last in either
/// direction.
#[must_use]
pub fn compare_metric(a: f64, b: f64, descending: bool) -> std::cmp::Ordering {
    use std::cmp::Ordering;

    match (a.is_finite(), b.is_finite()) {
        (true, true) => {
            let ord = a.total_cmp(&b);
            if descending { ord.reverse() } else { ord }
        }
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => Ordering::Equal,
    }
}

/// Multi-year regional statistics, loaded once and never mutated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    /// Years with data, ascending after load.
    #[serde(default)]
    pub years: Vec<Year>,
    /// Row sets keyed by the year as a string (`"2021"`).
    #[serde(default)]
    pub rows: BTreeMap<String, Vec<RegionRecord>>,
    /// Descriptive labels of the offenses counted in `delitos`.
    #[serde(default, rename = "delitos_estudiados")]
    pub studied_crimes: Vec<String>,
}

impl Dataset {
    /// Rows for `year`, or an empty slice when the year has no row set.
    #[must_use]
    pub fn rows_for(&self, year: Year) -> &[RegionRecord] {
        self.rows
            .get(&year.to_string())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Iterates every record of every year.
    pub fn all_rows(&self) -> impl Iterator<Item = &RegionRecord> {
        self.rows.values().flatten()
    }

    /// Earliest year, if any.
    #[must_use]
    pub fn first_year(&self) -> Option<Year> {
        self.years.iter().copied().min()
    }

    /// Latest year, if any.
    #[must_use]
    pub fn last_year(&self) -> Option<Year> {
        self.years.iter().copied().max()
    }

    /// Whether `year` is one of the dataset's years.
    #[must_use]
    pub fn has_year(&self, year: Year) -> bool {
        self.years.contains(&year)
    }
}

/// What the dashboard is currently showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum ViewMode {
    /// A single year.
    Single {
        /// The selected year.
        year: Year,
    },
    /// Earliest year side by side with the latest one.
    Compare {
        /// Earliest year.
        left: Year,
        /// Latest year.
        right: Year,
    },
}

impl ViewMode {
    /// Compare mode spanning the dataset's first and last years.
    ///
    /// Returns `None` when the dataset has no years.
    #[must_use]
    pub fn compare(dataset: &Dataset) -> Option<Self> {
        Some(Self::Compare {
            left: dataset.first_year()?,
            right: dataset.last_year()?,
        })
    }

    /// The year the bubble grid renders. Compare mode shows the earliest year.
    #[must_use]
    pub const fn bubble_year(self) -> Year {
        match self {
            Self::Single { year } => year,
            Self::Compare { left, .. } => left,
        }
    }
}

impl std::fmt::Display for ViewMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Single { year } => write!(f, "{year}"),
            Self::Compare { left, right } => write!(f, "Comparar {left} vs {right}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr as _;

    use super::*;

    #[test]
    fn null_metrics_become_nan() {
        let record: RegionRecord = serde_json::from_value(serde_json::json!({
            "region": "Aysén",
            "satisfaccion": 81.2,
            "vif": null,
        }))
        .unwrap();

        assert!((record.satisfaccion - 81.2).abs() < f64::EPSILON);
        assert!(record.vif.is_nan());
        assert!(record.delitos.is_nan(), "missing field should be NaN");
        assert_eq!(record.vif_psicologica, None);
    }

    #[test]
    fn rows_for_missing_year_is_empty() {
        let dataset: Dataset = serde_json::from_value(serde_json::json!({
            "years": [2021, 2023],
            "rows": {
                "2021": [{"region": "Maule", "satisfaccion": 80.0, "vif": 0.01, "delitos": 0.02}]
            },
            "delitos_estudiados": ["Robo con violencia"]
        }))
        .unwrap();

        assert_eq!(dataset.rows_for(2021).len(), 1);
        assert!(dataset.rows_for(2023).is_empty());
        assert_eq!(dataset.studied_crimes, vec!["Robo con violencia"]);
        assert_eq!(dataset.all_rows().count(), 1);
    }

    #[test]
    fn sort_key_parses_snake_case() {
        assert_eq!(SortKey::from_str("satisfaction").unwrap(), SortKey::Satisfaction);
        assert_eq!(SortKey::from_str("vif").unwrap(), SortKey::Vif);
        assert_eq!(SortKey::from_str("crime").unwrap(), SortKey::Crime);
        assert!(SortKey::from_str("population").is_err());
        assert_eq!(SortKey::Crime.to_string(), "crime");
    }

    #[test]
    fn compare_mode_shows_earliest_year_in_bubbles() {
        let dataset = Dataset {
            years: vec![2023, 2019, 2021],
            ..Dataset::default()
        };
        let mode = ViewMode::compare(&dataset).unwrap();

        assert_eq!(mode, ViewMode::Compare { left: 2019, right: 2023 });
        assert_eq!(mode.bubble_year(), 2019);
        assert_eq!(mode.to_string(), "Comparar 2019 vs 2023");
        assert_eq!(ViewMode::compare(&Dataset::default()), None);
    }

    #[test]
    fn non_finite_values_sort_last() {
        use std::cmp::Ordering;

        assert_eq!(compare_metric(2.0, 1.0, true), Ordering::Less);
        assert_eq!(compare_metric(2.0, 1.0, false), Ordering::Greater);
        assert_eq!(compare_metric(f64::NAN, 1.0, true), Ordering::Greater);
        assert_eq!(compare_metric(f64::NAN, 1.0, false), Ordering::Greater);
        assert_eq!(compare_metric(f64::NAN, f64::INFINITY, false), Ordering::Equal);
    }

    #[test]
    fn metric_accessor_matches_fields() {
        let record = RegionRecord::new("Biobío", 78.0, 0.012, 0.031);
        assert!((record.metric(Metric::Satisfaction) - 78.0).abs() < f64::EPSILON);
        assert!((record.metric(Metric::Vif) - 0.012).abs() < f64::EPSILON);
        assert!((record.metric(Metric::Crime) - 0.031).abs() < f64::EPSILON);
        assert_eq!(SortKey::Vif.metric(), Metric::Vif);
    }
}

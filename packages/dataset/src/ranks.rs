//! Per-year rankings and the region detail panel.
//!
//! Satisfaction is ranked highest-first; crime and VIF are ranked
//! lowest-first, so position 1 is always the "best" region for that
//! metric. Ties keep the row order of the input.

use std::collections::BTreeMap;

use chile_dashboard_dataset_models::{Metric, RegionRecord, Year, compare_metric};

/// 1-based positions of every region for each metric.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegionRanks {
    positions: BTreeMap<Metric, BTreeMap<String, usize>>,
    /// Number of regions ranked.
    pub total: usize,
}

impl RegionRanks {
    /// Position of `region` for `metric`, if it was ranked.
    #[must_use]
    pub fn position(&self, metric: Metric, region: &str) -> Option<usize> {
        self.positions.get(&metric)?.get(region).copied()
    }
}

/// Whether a higher value ranks first for `metric`.
const fn ranks_descending(metric: Metric) -> bool {
    matches!(metric, Metric::Satisfaction)
}

fn rank_by(rows: &[RegionRecord], metric: Metric) -> BTreeMap<String, usize> {
    let mut ordered: Vec<&RegionRecord> = rows.iter().collect();
    let descending = ranks_descending(metric);
    ordered.sort_by(|a, b| compare_metric(a.metric(metric), b.metric(metric), descending));

    ordered
        .into_iter()
        .enumerate()
        .map(|(i, record)| (record.region.clone(), i + 1))
        .collect()
}

/// Ranks every region in `rows` by satisfaction, crime and VIF.
#[must_use]
pub fn compute_ranks(rows: &[RegionRecord]) -> RegionRanks {
    RegionRanks {
        positions: Metric::all()
            .iter()
            .map(|&metric| (metric, rank_by(rows, metric)))
            .collect(),
        total: rows.len(),
    }
}

/// Everything the detail panel shows for one region in one year.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionDetail {
    /// Region display name.
    pub region: String,
    /// Year the values belong to.
    pub year: Year,
    /// Life-satisfaction percentage.
    pub satisfaccion: f64,
    /// VIF rate (fraction).
    pub vif: f64,
    /// Crime rate (fraction).
    pub delitos: f64,
    /// Satisfaction position (1 = highest).
    pub satisfaction_rank: usize,
    /// Crime position (1 = lowest).
    pub crime_rank: usize,
    /// VIF position (1 = lowest).
    pub vif_rank: usize,
    /// Regions ranked that year.
    pub total: usize,
    /// Psychological VIF share, when reported and finite.
    pub vif_psicologica: Option<f64>,
    /// Physical VIF share, when reported and finite.
    pub vif_fisica: Option<f64>,
    /// Offenses counted in the crime rate.
    pub studied_crimes: Vec<String>,
}

impl RegionDetail {
    /// Attaches the dataset's list of studied offenses.
    #[must_use]
    pub fn with_studied_crimes(mut self, crimes: &[String]) -> Self {
        self.studied_crimes = crimes.to_vec();
        self
    }
}

/// Builds the detail panel contents for `region`.
///
/// Returns `None` when the region has no row in `rows`.
#[must_use]
pub fn region_detail(rows: &[RegionRecord], year: Year, region: &str) -> Option<RegionDetail> {
    let record = rows.iter().find(|r| r.region == region)?;
    let ranks = compute_ranks(rows);

    Some(RegionDetail {
        region: record.region.clone(),
        year,
        satisfaccion: record.satisfaccion,
        vif: record.vif,
        delitos: record.delitos,
        satisfaction_rank: ranks.position(Metric::Satisfaction, region)?,
        crime_rank: ranks.position(Metric::Crime, region)?,
        vif_rank: ranks.position(Metric::Vif, region)?,
        total: ranks.total,
        vif_psicologica: record.vif_psicologica.filter(|v| v.is_finite()),
        vif_fisica: record.vif_fisica.filter(|v| v.is_finite()),
        studied_crimes: Vec::new(),
    })
}

/// Formats a rank as `"3.º lugar"`.
#[must_use]
pub fn ordinal(position: usize) -> String {
    format!("{position}.º lugar")
}

fn fraction_pct(value: f64, decimals: usize) -> String {
    if value.is_finite() {
        format!("{:.decimals$}%", value * 100.0)
    } else {
        "—".to_owned()
    }
}

impl std::fmt::Display for RegionDetail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Detalle — {} ({})", self.region, self.year)?;

        let satisfaction = if self.satisfaccion.is_finite() {
            format!("{:.1}%", self.satisfaccion)
        } else {
            "—".to_owned()
        };
        writeln!(
            f,
            "  Satisfacción: {satisfaction:>8}  {} en satisfacción",
            ordinal(self.satisfaction_rank)
        )?;
        writeln!(
            f,
            "  Delitos:      {:>8}  {} en delitos",
            fraction_pct(self.delitos, 2),
            ordinal(self.crime_rank)
        )?;
        writeln!(
            f,
            "  VIF:          {:>8}  {} en VIF",
            fraction_pct(self.vif, 2),
            ordinal(self.vif_rank)
        )?;

        if let Some(psico) = self.vif_psicologica {
            writeln!(f, "    psicológica: {}", fraction_pct(psico, 1))?;
        }
        if let Some(fisica) = self.vif_fisica {
            writeln!(f, "    física:      {}", fraction_pct(fisica, 1))?;
        }

        if !self.studied_crimes.is_empty() {
            writeln!(f, "  Delitos estudiados:")?;
            for crime in &self.studied_crimes {
                writeln!(f, "    - {crime}")?;
            }
        }

        write!(f, "  ({} regiones)", self.total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows() -> Vec<RegionRecord> {
        vec![
            RegionRecord::new("Maule", 80.0, 0.012, 0.030),
            RegionRecord::new("Aysén", 86.5, 0.020, 0.010),
            RegionRecord::new("Metropolitana", 75.0, 0.009, f64::NAN),
        ]
    }

    #[test]
    fn satisfaction_ranks_highest_first() {
        let ranks = compute_ranks(&rows());
        assert_eq!(ranks.position(Metric::Satisfaction, "Aysén"), Some(1));
        assert_eq!(ranks.position(Metric::Satisfaction, "Maule"), Some(2));
        assert_eq!(ranks.position(Metric::Satisfaction, "Metropolitana"), Some(3));
        assert_eq!(ranks.total, 3);
    }

    #[test]
    fn crime_and_vif_rank_lowest_first() {
        let ranks = compute_ranks(&rows());
        assert_eq!(ranks.position(Metric::Vif, "Metropolitana"), Some(1));
        assert_eq!(ranks.position(Metric::Vif, "Aysén"), Some(3));
        assert_eq!(ranks.position(Metric::Crime, "Aysén"), Some(1));
        assert_eq!(
            ranks.position(Metric::Crime, "Metropolitana"),
            Some(3),
            "missing crime rate should rank last"
        );
    }

    #[test]
    fn ties_keep_input_order() {
        let rows = vec![
            RegionRecord::new("B", 80.0, 0.01, 0.01),
            RegionRecord::new("A", 80.0, 0.01, 0.01),
        ];
        let ranks = compute_ranks(&rows);
        assert_eq!(ranks.position(Metric::Satisfaction, "B"), Some(1));
        assert_eq!(ranks.position(Metric::Satisfaction, "A"), Some(2));
    }

    #[test]
    fn detail_includes_finite_breakdown_only() {
        let mut rows = rows();
        rows[0].vif_psicologica = Some(0.6);
        rows[0].vif_fisica = Some(f64::NAN);

        let detail = region_detail(&rows, 2021, "Maule").unwrap();
        assert_eq!(detail.satisfaction_rank, 2);
        assert_eq!(detail.crime_rank, 2);
        assert_eq!(detail.vif_psicologica, Some(0.6));
        assert_eq!(detail.vif_fisica, None);

        let text = detail.to_string();
        assert!(text.contains("Detalle — Maule (2021)"), "{text}");
        assert!(text.contains("80.0%"), "{text}");
        assert!(text.contains("3.00%"), "{text}");
        assert!(text.contains("2.º lugar en delitos"), "{text}");
        assert!(text.contains("psicológica: 60.0%"), "{text}");
        assert!(!text.contains("física"), "{text}");
    }

    #[test]
    fn detail_lists_studied_crimes() {
        let detail = region_detail(&rows(), 2021, "Aysén").unwrap();
        assert!(!detail.to_string().contains("Delitos estudiados"));

        let crimes = vec!["Robo con violencia".to_owned(), "Homicidios".to_owned()];
        let text = detail.with_studied_crimes(&crimes).to_string();
        assert!(
            text.contains("Delitos estudiados:\n    - Robo con violencia\n    - Homicidios\n"),
            "{text}"
        );
    }

    #[test]
    fn detail_for_unknown_region_is_none() {
        assert!(region_detail(&rows(), 2021, "Atacama").is_none());
    }
}

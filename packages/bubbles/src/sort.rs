//! Display ordering of a year's records.

use chile_dashboard_dataset_models::{RegionRecord, SortKey, compare_metric};

/// Orders `rows` by `key`, highest first.
///
/// The sort is stable: records with equal values keep their input order.
/// Records whose sort metric is not finite go last.
#[must_use]
pub fn sort_records(rows: &[RegionRecord], key: SortKey) -> Vec<&RegionRecord> {
    let metric = key.metric();
    let mut sorted: Vec<&RegionRecord> = rows.iter().collect();
    sorted.sort_by(|a, b| compare_metric(a.metric(metric), b.metric(metric), true));
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn regions(sorted: &[&RegionRecord]) -> Vec<String> {
        sorted.iter().map(|r| r.region.clone()).collect()
    }

    #[test]
    fn sorts_each_key_descending() {
        let rows = vec![
            RegionRecord::new("A", 80.0, 0.5, 1.2),
            RegionRecord::new("B", 90.0, 1.5, 0.8),
            RegionRecord::new("C", 85.0, 1.0, 1.5),
        ];

        assert_eq!(regions(&sort_records(&rows, SortKey::Satisfaction)), ["B", "C", "A"]);
        assert_eq!(regions(&sort_records(&rows, SortKey::Vif)), ["B", "C", "A"]);
        assert_eq!(regions(&sort_records(&rows, SortKey::Crime)), ["C", "A", "B"]);
    }

    #[test]
    fn ties_keep_input_order_and_nan_goes_last() {
        let rows = vec![
            RegionRecord::new("X", f64::NAN, 0.1, 0.1),
            RegionRecord::new("Y", 80.0, 0.1, 0.1),
            RegionRecord::new("Z", 80.0, 0.1, 0.1),
        ];

        assert_eq!(regions(&sort_records(&rows, SortKey::Satisfaction)), ["Y", "Z", "X"]);
        assert_eq!(regions(&sort_records(&rows, SortKey::Vif)), ["X", "Y", "Z"]);
    }
}

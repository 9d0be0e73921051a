//! Region-keyed enter/update/exit diffing.
//!
//! Bubbles are matched by region name, never by position, so a sort
//! change moves the existing bubble for each region instead of reusing
//! another region's bubble.

use std::collections::BTreeSet;

use chile_dashboard_bubbles_models::FrameDiff;
use chile_dashboard_dataset_models::RegionRecord;

/// The three-way split of a render against the previous one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reconciliation<'a> {
    /// Records with no bubble yet, in display order.
    pub entering: Vec<&'a RegionRecord>,
    /// Records whose bubble already exists, in display order.
    pub updating: Vec<&'a RegionRecord>,
    /// Keys of bubbles to remove, alphabetical.
    pub exiting: Vec<String>,
}

impl Reconciliation<'_> {
    /// Owned key-only form for a [`chile_dashboard_bubbles_models::RenderFrame`].
    #[must_use]
    pub fn to_diff(&self) -> FrameDiff {
        FrameDiff {
            entering: self.entering.iter().map(|r| r.region.clone()).collect(),
            updating: self.updating.iter().map(|r| r.region.clone()).collect(),
            exiting: self.exiting.clone(),
        }
    }
}

/// Splits `next` against the keys of the previous render.
///
/// A region that appears more than once in `next` is only considered at
/// its first occurrence.
pub fn reconcile<'a>(
    prev_keys: &BTreeSet<String>,
    next: impl IntoIterator<Item = &'a RegionRecord>,
) -> Reconciliation<'a> {
    let mut seen = BTreeSet::new();
    let mut result = Reconciliation::default();

    for record in next {
        if !seen.insert(record.region.as_str()) {
            log::warn!("Duplicate region '{}' ignored", record.region);
            continue;
        }
        if prev_keys.contains(&record.region) {
            result.updating.push(record);
        } else {
            result.entering.push(record);
        }
    }

    result.exiting = prev_keys
        .iter()
        .filter(|key| !seen.contains(key.as_str()))
        .cloned()
        .collect();

    result
}

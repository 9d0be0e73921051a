//! The bubble grid engine.
//!
//! [`BubbleGridEngine`] turns `(year, rows, sort)` into a [`RenderFrame`]
//! and keeps one [`BubbleState`] per region between calls, so a renderer
//! can animate from the previous frame with [`BubbleGridEngine::sample`].

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

use chile_dashboard_bubbles_models::{
    BubbleDescriptor, EngineConfig, GridLayout, LayoutCell, RenderFrame,
};
use chile_dashboard_dataset_models::{RegionRecord, SortKey, Year};

use crate::format;
use crate::layout::{LayoutError, compute_layout, compute_layout_overflowing};
use crate::legend::build_legend;
use crate::reconcile::reconcile;
use crate::scales::{ColorScale, LocalScales, derive_local_scales};
use crate::sort::sort_records;
use crate::transition::{BubbleState, Clock, SystemClock};

/// Shown instead of the grid when the requested year has no rows.
pub const EMPTY_YEAR_MESSAGE: &str = "Sin filas para el año seleccionado.";

/// The last `update` call, replayed on resize.
#[derive(Debug, Clone)]
struct RenderRequest {
    year: Year,
    rows: Vec<RegionRecord>,
    sort: SortKey,
}

/// Stateful bubble grid renderer model.
///
/// The color scale is injected: it belongs to the dataset, not to a
/// render, and must outlive year changes. Everything else (layout,
/// radius and border scales, legends) is rebuilt on every render.
#[derive(Debug)]
pub struct BubbleGridEngine<C = SystemClock> {
    config: EngineConfig,
    color: Arc<ColorScale>,
    width: f64,
    height: f64,
    request: Option<RenderRequest>,
    bubbles: BTreeMap<String, BubbleState>,
    order: Vec<String>,
    clock: C,
}

impl BubbleGridEngine {
    /// Creates an engine animated by the wall clock.
    #[must_use]
    pub fn new(config: EngineConfig, color: Arc<ColorScale>) -> Self {
        Self::with_clock(config, color, SystemClock::default())
    }
}

impl<C: Clock> BubbleGridEngine<C> {
    /// Creates an engine animated by `clock`.
    #[must_use]
    pub fn with_clock(config: EngineConfig, color: Arc<ColorScale>, clock: C) -> Self {
        Self {
            width: config.layout.container_width,
            height: config.layout.container_height,
            config,
            color,
            request: None,
            bubbles: BTreeMap::new(),
            order: Vec::new(),
            clock,
        }
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The injected global color scale.
    #[must_use]
    pub const fn color_scale(&self) -> &Arc<ColorScale> {
        &self.color
    }

    /// Current container size as `(width, height)`.
    #[must_use]
    pub const fn container(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    /// Year of the last successful render, if any.
    #[must_use]
    pub fn year(&self) -> Option<Year> {
        self.request.as_ref().map(|r| r.year)
    }

    /// Number of bubbles currently kept.
    #[must_use]
    pub fn bubble_count(&self) -> usize {
        self.bubbles.len()
    }

    /// Swaps in the color scale of a newly loaded dataset. Takes effect
    /// on the next render.
    pub fn replace_color_scale(&mut self, color: Arc<ColorScale>) {
        self.color = color;
    }

    /// Renders `rows` of `year` ordered by `sort`.
    ///
    /// Bubbles are matched to the previous render by region. Existing
    /// bubbles start moving toward their new targets from wherever they
    /// are currently drawn, new ones grow in place, and removed ones are
    /// dropped.
    ///
    /// # Errors
    ///
    /// Returns a [`LayoutError`] when the configured row count is zero.
    /// A container too small for the minimum cell size does not fail; the
    /// layout overflows instead and is flagged as such.
    pub fn update(
        &mut self,
        year: Year,
        rows: &[RegionRecord],
        sort: SortKey,
    ) -> Result<RenderFrame, LayoutError> {
        let request = RenderRequest {
            year,
            rows: rows.to_vec(),
            sort,
        };
        let frame = self.render(&request)?;
        self.request = Some(request);
        Ok(frame)
    }

    /// Re-lays out the last rendered rows in a `width` x `height`
    /// container. Returns `None` when nothing has been rendered yet.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::InvalidContainer`] for a non-finite or
    /// non-positive size; the previous size is kept in that case.
    pub fn on_container_resize(
        &mut self,
        width: f64,
        height: f64,
    ) -> Result<Option<RenderFrame>, LayoutError> {
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(LayoutError::InvalidContainer { width, height });
        }
        log::debug!("Container resized to {width}x{height}");
        self.width = width;
        self.height = height;

        let Some(request) = self.request.take() else {
            return Ok(None);
        };
        let frame = self.render(&request);
        self.request = Some(request);
        frame.map(Some)
    }

    /// Bubbles as they should be drawn right now, in display order.
    #[must_use]
    pub fn sample(&self) -> Vec<BubbleDescriptor> {
        let now = self.clock.now();
        let duration = self.duration();
        self.order
            .iter()
            .filter_map(|region| self.bubbles.get(region))
            .map(|state| state.sample(now, duration))
            .collect()
    }

    /// Whether any bubble is still moving.
    #[must_use]
    pub fn is_animating(&self) -> bool {
        let now = self.clock.now();
        let duration = self.duration();
        self.bubbles
            .values()
            .any(|state| state.is_transitioning(now, duration))
    }

    /// Region whose target circle contains `(x, y)`.
    ///
    /// Always `None` when click-to-detail is disabled.
    #[must_use]
    pub fn hit_test(&self, x: f64, y: f64) -> Option<&str> {
        if !self.config.features.click_to_detail {
            return None;
        }
        self.order
            .iter()
            .filter_map(|region| self.bubbles.get(region))
            .map(BubbleState::target)
            .find(|bubble| {
                let (dx, dy) = (x - bubble.x, y - bubble.y);
                dx.hypot(dy) <= bubble.radius
            })
            .map(|bubble| bubble.region.as_str())
    }

    const fn duration(&self) -> Duration {
        Duration::from_millis(self.config.transition.duration_ms)
    }

    fn effective_sort(&self, requested: SortKey) -> SortKey {
        if self.config.features.sort_control {
            requested
        } else {
            SortKey::Satisfaction
        }
    }

    fn layout_for(&self, n: usize) -> Result<GridLayout, LayoutError> {
        let config = &self.config.layout;
        match compute_layout(n, self.width, self.height, config.row_count, config) {
            Err(LayoutError::InsufficientSpace {
                cell_width,
                cell_height,
                minimum,
            }) => {
                log::warn!(
                    "Container {}x{} too small for {n} bubbles ({cell_width:.1}x{cell_height:.1} < {minimum}); overflowing",
                    self.width,
                    self.height,
                );
                compute_layout_overflowing(n, self.width, self.height, config.row_count, config)
            }
            result => result,
        }
    }

    fn describe(
        &self,
        record: &RegionRecord,
        cell: &LayoutCell,
        local: &LocalScales,
    ) -> BubbleDescriptor {
        let radius = local.radius.apply(record.vif);
        BubbleDescriptor {
            region: record.region.clone(),
            x: cell.center_x,
            y: cell.center_y,
            radius,
            fill_color: self.color.apply(record.satisfaccion),
            border_width: local.border.apply(record.delitos),
            stroke_color: self.config.color.stroke,
            label_text: record.region.clone(),
            short_label: format::short_label(&record.region).to_owned(),
            value_text: format::value_lines(record.vif, record.delitos),
            label_font_size: format::label_font_size(radius),
            value_font_size: format::value_font_size(radius),
            label_offset_y: format::label_offset_y(radius),
        }
    }

    fn apply_transitions(&mut self, exiting: &[String], bubbles: &[BubbleDescriptor]) {
        let now = self.clock.now();
        let duration = self.duration();
        let enter_radius = self.config.transition.enter_radius;

        for region in exiting {
            self.bubbles.remove(region);
        }
        for state in self.bubbles.values_mut() {
            state.settle(now, duration);
        }
        for bubble in bubbles {
            if let Some(state) = self.bubbles.get_mut(&bubble.region) {
                state.retarget(bubble.clone(), now, duration);
            } else {
                self.bubbles.insert(
                    bubble.region.clone(),
                    BubbleState::entering(bubble.clone(), enter_radius, now, duration),
                );
            }
        }
        self.order = bubbles.iter().map(|b| b.region.clone()).collect();
    }

    fn render(&mut self, request: &RenderRequest) -> Result<RenderFrame, LayoutError> {
        let sort = self.effective_sort(request.sort);
        if sort != request.sort {
            log::debug!("Sort control disabled; ignoring sort '{}'", request.sort);
        }

        let mut seen = BTreeSet::new();
        let sorted: Vec<&RegionRecord> = sort_records(&request.rows, sort)
            .into_iter()
            .filter(|record| {
                let first = seen.insert(record.region.as_str());
                if !first {
                    log::warn!("Duplicate region '{}' in {} ignored", record.region, request.year);
                }
                first
            })
            .collect();

        // Scales and legends only see the rows that are drawn.
        let drawn: Vec<RegionRecord> = sorted.iter().map(|&record| record.clone()).collect();

        let layout = self.layout_for(drawn.len())?;
        let local = derive_local_scales(&drawn, &layout, &self.config);

        let prev_keys: BTreeSet<String> = self.bubbles.keys().cloned().collect();
        let diff = reconcile(&prev_keys, sorted.iter().copied()).to_diff();

        let bubbles: Vec<BubbleDescriptor> = sorted
            .iter()
            .zip(&layout.cells)
            .map(|(record, cell)| self.describe(record, cell, &local))
            .collect();

        self.apply_transitions(&diff.exiting, &bubbles);

        log::debug!(
            "Rendered {} by {sort}: {} entering, {} updating, {} exiting",
            request.year,
            diff.entering.len(),
            diff.updating.len(),
            diff.exiting.len(),
        );

        Ok(RenderFrame {
            year: request.year,
            sort,
            placeholder: bubbles.is_empty().then(|| EMPTY_YEAR_MESSAGE.to_owned()),
            legend: build_legend(&self.config, &self.color, &local, &drawn),
            bubbles,
            diff,
            layout,
        })
    }
}

//! Dashboard state: which dataset, year, sort and detail panel are shown.
//!
//! The [`Controller`] is the only caller of the bubble engine. Every user
//! action goes through it so the engine, the view mode and the open
//! detail panel never disagree about the displayed year.

use std::sync::Arc;

use chile_dashboard_bubbles::{BubbleGridEngine, LayoutError};
use chile_dashboard_bubbles::scales::ColorScaleCache;
use chile_dashboard_bubbles::transition::{Clock, SystemClock};
use chile_dashboard_bubbles_models::{EngineConfig, RenderFrame};
use chile_dashboard_dataset::DataLoadError;
use chile_dashboard_dataset::ranks::{RegionDetail, region_detail};
use chile_dashboard_dataset_models::{Dataset, SortKey, ViewMode, Year};

/// Errors that can occur while driving the dashboard.
#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    /// The dataset has no year to show.
    #[error("Dataset has no years")]
    NoYears,

    /// The requested year is not in the dataset.
    #[error("Year {year} is not in the dataset")]
    UnknownYear {
        /// Requested year.
        year: Year,
    },

    /// Layout failed.
    #[error(transparent)]
    Layout(#[from] LayoutError),

    /// A dataset reload failed; the previous dataset is still shown.
    #[error(transparent)]
    Load(#[from] DataLoadError),
}

/// What one refresh produced.
#[derive(Debug, Clone, PartialEq)]
pub struct View {
    /// View mode rendered.
    pub mode: ViewMode,
    /// Bubble grid frame for [`ViewMode::bubble_year`].
    pub frame: RenderFrame,
    /// Detail panel contents, when a region is open and present that year.
    pub detail: Option<RegionDetail>,
}

/// Owns the dataset and the engine and applies user actions to them.
#[derive(Debug)]
pub struct Controller<C = SystemClock> {
    dataset: Arc<Dataset>,
    colors: ColorScaleCache,
    engine: BubbleGridEngine<C>,
    mode: ViewMode,
    sort: SortKey,
    detail: Option<String>,
}

impl Controller {
    /// Creates a controller animated by the wall clock, showing the most
    /// recent year.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::NoYears`] for a dataset without years.
    pub fn new(config: EngineConfig, dataset: Dataset) -> Result<Self, ControllerError> {
        Self::with_clock(config, dataset, SystemClock::default())
    }
}

impl<C: Clock> Controller<C> {
    /// Creates a controller whose engine is animated by `clock`.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::NoYears`] for a dataset without years.
    pub fn with_clock(
        config: EngineConfig,
        dataset: Dataset,
        clock: C,
    ) -> Result<Self, ControllerError> {
        let year = dataset.last_year().ok_or(ControllerError::NoYears)?;
        let dataset = Arc::new(dataset);
        let mut colors = ColorScaleCache::default();
        let color = colors.get_or_derive(&dataset, &config.color);

        Ok(Self {
            engine: BubbleGridEngine::with_clock(config, color, clock),
            dataset,
            colors,
            mode: ViewMode::Single { year },
            sort: SortKey::default(),
            detail: None,
        })
    }

    /// The dataset being shown.
    #[must_use]
    pub const fn dataset(&self) -> &Arc<Dataset> {
        &self.dataset
    }

    /// The bubble engine.
    #[must_use]
    pub const fn engine(&self) -> &BubbleGridEngine<C> {
        &self.engine
    }

    /// Current view mode.
    #[must_use]
    pub const fn mode(&self) -> ViewMode {
        self.mode
    }

    /// Current sort key.
    #[must_use]
    pub const fn sort(&self) -> SortKey {
        self.sort
    }

    /// Region whose detail panel is open.
    #[must_use]
    pub fn detail_region(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    /// Re-renders the current state.
    ///
    /// An open detail panel follows the displayed year; it is closed when
    /// its region has no row that year.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::Layout`] if the engine cannot lay out the
    /// grid.
    pub fn refresh(&mut self) -> Result<View, ControllerError> {
        let year = self.mode.bubble_year();
        let rows = self.dataset.rows_for(year);
        let frame = self.engine.update(year, rows, self.sort)?;

        let detail = self
            .detail
            .as_deref()
            .and_then(|region| region_detail(rows, year, region))
            .map(|detail| detail.with_studied_crimes(&self.dataset.studied_crimes));
        if detail.is_none()
            && let Some(region) = self.detail.take()
        {
            log::info!("Closing detail for '{region}': no data in {year}");
        }

        Ok(View {
            mode: self.mode,
            frame,
            detail,
        })
    }

    /// Shows a single year.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::UnknownYear`] when the dataset lacks
    /// `year`, leaving the view unchanged.
    pub fn select_year(&mut self, year: Year) -> Result<View, ControllerError> {
        if !self.dataset.has_year(year) {
            return Err(ControllerError::UnknownYear { year });
        }
        self.mode = ViewMode::Single { year };
        self.refresh()
    }

    /// Switches to comparing the first and last years.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::NoYears`] for an empty dataset.
    pub fn compare(&mut self) -> Result<View, ControllerError> {
        self.mode = ViewMode::compare(&self.dataset).ok_or(ControllerError::NoYears)?;
        self.refresh()
    }

    /// Changes the bubble ordering.
    ///
    /// # Errors
    ///
    /// As [`Self::refresh`].
    pub fn set_sort(&mut self, sort: SortKey) -> Result<View, ControllerError> {
        self.sort = sort;
        self.refresh()
    }

    /// Forwards a container resize to the engine.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::Layout`] for an unusable size.
    pub fn resize(
        &mut self,
        width: f64,
        height: f64,
    ) -> Result<Option<RenderFrame>, ControllerError> {
        Ok(self.engine.on_container_resize(width, height)?)
    }

    /// Opens the detail panel for `region` in the displayed year.
    ///
    /// Returns `None`, leaving any open panel as is, when the region has no
    /// row that year.
    pub fn open_detail(&mut self, region: &str) -> Option<RegionDetail> {
        let year = self.mode.bubble_year();
        let detail = region_detail(self.dataset.rows_for(year), year, region)?
            .with_studied_crimes(&self.dataset.studied_crimes);
        self.detail = Some(detail.region.clone());
        Some(detail)
    }

    /// Closes the detail panel.
    pub fn close_detail(&mut self) {
        self.detail = None;
    }

    /// Opens the detail panel of the bubble at `(x, y)`, if any.
    pub fn click(&mut self, x: f64, y: f64) -> Option<RegionDetail> {
        let region = self.engine.hit_test(x, y)?.to_owned();
        self.open_detail(&region)
    }

    /// Swaps in a freshly loaded dataset and re-renders.
    ///
    /// A failed load leaves the dataset, view and detail panel untouched.
    /// When the displayed year disappeared, the latest year is shown.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::Load`] for a failed load,
    /// [`ControllerError::NoYears`] for a dataset without years (which is
    /// also rejected), or a layout error from the refresh.
    pub fn reload(
        &mut self,
        loaded: Result<Dataset, DataLoadError>,
    ) -> Result<View, ControllerError> {
        let dataset = match loaded {
            Ok(dataset) => dataset,
            Err(e) => {
                log::error!("Dataset reload failed, keeping previous data: {e}");
                return Err(e.into());
            }
        };
        let latest = dataset.last_year().ok_or(ControllerError::NoYears)?;

        self.dataset = Arc::new(dataset);
        let color = self
            .colors
            .get_or_derive(&self.dataset, &self.engine.config().color);
        self.engine.replace_color_scale(color);

        self.mode = match self.mode {
            ViewMode::Compare { .. } => {
                ViewMode::compare(&self.dataset).ok_or(ControllerError::NoYears)?
            }
            ViewMode::Single { year } if self.dataset.has_year(year) => self.mode,
            ViewMode::Single { year } => {
                log::info!("Year {year} not in reloaded dataset; showing {latest}");
                ViewMode::Single { year: latest }
            }
        };

        self.refresh()
    }
}

#[cfg(test)]
mod tests {
    use chile_dashboard_bubbles::transition::ManualClock;
    use chile_dashboard_dataset::parse_dataset;

    use super::*;

    fn dataset() -> Dataset {
        let json = serde_json::json!({
            "years": [2021, 2023],
            "rows": {
                "2021": [
                    {"region": "Maule", "satisfaccion": 72.0, "vif": 0.010, "delitos": 0.030},
                    {"region": "Biobío", "satisfaccion": 78.0, "vif": 0.014, "delitos": 0.025}
                ],
                "2023": [
                    {"region": "Maule", "satisfaccion": 81.0, "vif": 0.012, "delitos": 0.028,
                     "vif_psicologica": 0.6, "vif_fisica": 0.3},
                    {"region": "Ñuble", "satisfaccion": 86.0, "vif": null, "delitos": 0.020}
                ]
            },
            "delitos_estudiados": ["Robo con violencia"]
        });
        parse_dataset(&json.to_string()).unwrap()
    }

    fn controller() -> Controller<ManualClock> {
        Controller::with_clock(EngineConfig::default(), dataset(), ManualClock::default()).unwrap()
    }

    fn regions(view: &View) -> Vec<&str> {
        view.frame.bubbles.iter().map(|b| b.region.as_str()).collect()
    }

    #[test]
    fn starts_on_latest_year() {
        let mut controller = controller();
        let view = controller.refresh().unwrap();
        assert_eq!(view.mode, ViewMode::Single { year: 2023 });
        assert_eq!(regions(&view), ["Ñuble", "Maule"]);
    }

    #[test]
    fn empty_dataset_is_rejected() {
        let err = Controller::new(EngineConfig::default(), Dataset::default()).unwrap_err();
        assert!(matches!(err, ControllerError::NoYears));
    }

    #[test]
    fn unknown_year_leaves_view_unchanged() {
        let mut controller = controller();
        let err = controller.select_year(1999).unwrap_err();
        assert!(matches!(err, ControllerError::UnknownYear { year: 1999 }));
        assert_eq!(controller.mode(), ViewMode::Single { year: 2023 });
    }

    #[test]
    fn compare_renders_earliest_year() {
        let mut controller = controller();
        let view = controller.compare().unwrap();
        assert_eq!(
            view.mode,
            ViewMode::Compare {
                left: 2021,
                right: 2023
            }
        );
        assert_eq!(view.frame.year, 2021);
    }

    #[test]
    fn detail_follows_year_and_closes_when_region_is_missing() {
        let mut controller = controller();
        controller.refresh().unwrap();

        let detail = controller.open_detail("Maule").unwrap();
        assert_eq!(detail.year, 2023);
        assert_eq!(detail.vif_psicologica, Some(0.6));
        assert_eq!(detail.studied_crimes, ["Robo con violencia"]);

        let view = controller.select_year(2021).unwrap();
        let detail = view.detail.unwrap();
        assert_eq!(detail.year, 2021);
        assert!(detail.to_string().contains("- Robo con violencia"));
        assert_eq!(detail.satisfaction_rank, 2);

        controller.open_detail("Biobío").unwrap();
        let view = controller.select_year(2023).unwrap();
        assert_eq!(view.detail, None);
        assert_eq!(controller.detail_region(), None);
    }

    #[test]
    fn click_opens_detail_of_hit_bubble() {
        let mut controller = controller();
        let view = controller.refresh().unwrap();
        let maule = view
            .frame
            .bubbles
            .iter()
            .find(|b| b.region == "Maule")
            .unwrap();

        let detail = controller.click(maule.x, maule.y).unwrap();
        assert_eq!(detail.region, "Maule");
        assert_eq!(controller.detail_region(), Some("Maule"));
        assert_eq!(controller.click(-500.0, -500.0), None);
    }

    #[test]
    fn sort_change_reorders_without_entering() {
        let mut controller = controller();
        controller.refresh().unwrap();
        let view = controller.set_sort(SortKey::Crime).unwrap();
        assert_eq!(regions(&view), ["Maule", "Ñuble"]);
        assert!(view.frame.diff.entering.is_empty());
        assert_eq!(view.frame.sort, SortKey::Crime);
    }

    #[test]
    fn failed_reload_keeps_previous_state() {
        let mut controller = controller();
        controller.refresh().unwrap();
        controller.open_detail("Maule").unwrap();
        let before = Arc::clone(controller.dataset());

        let err = controller
            .reload(Err(DataLoadError::Invalid {
                message: "boom".to_owned(),
            }))
            .unwrap_err();

        assert!(matches!(err, ControllerError::Load(_)));
        assert!(Arc::ptr_eq(controller.dataset(), &before));
        assert_eq!(controller.detail_region(), Some("Maule"));
        assert_eq!(controller.mode(), ViewMode::Single { year: 2023 });
    }

    #[test]
    fn reload_rederives_color_scale_and_falls_back_to_latest_year() {
        let mut controller = controller();
        controller.select_year(2021).unwrap();
        let old_scale = Arc::clone(controller.engine().color_scale());

        let json = serde_json::json!({
            "rows": {
                "2024": [{"region": "Maule", "satisfaccion": 60.2, "vif": 0.01, "delitos": 0.02}]
            }
        });
        let view = controller
            .reload(parse_dataset(&json.to_string()))
            .unwrap();

        assert_eq!(view.mode, ViewMode::Single { year: 2024 });
        assert!(!Arc::ptr_eq(controller.engine().color_scale(), &old_scale));
        assert_eq!(controller.engine().color_scale().domain(), [60.0, 61.0]);
        assert_eq!(view.frame.diff.exiting, ["Biobío"]);
    }
}

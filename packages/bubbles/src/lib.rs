#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Bubble grid engine for the regional statistics dashboard.
//!
//! Places one bubble per region on a serpentine grid and binds three
//! independent metrics to three visual channels:
//!
//! - fill color ← life satisfaction, on a domain shared by every year
//! - radius ← VIF, area-proportional, on the displayed year's domain
//! - border width ← crime rate, on the displayed year's domain
//!
//! [`BubbleGridEngine`] is the entry point. It keeps bubbles keyed by
//! region across renders, so year, sort and container changes animate
//! from whatever is currently on screen instead of snapping.

pub mod config;
pub mod engine;
pub mod format;
pub mod layout;
pub mod legend;
pub mod reconcile;
pub mod scales;
pub mod sort;
pub mod transition;

pub use config::ConfigError;
pub use engine::BubbleGridEngine;
pub use layout::LayoutError;

//! Per-bubble animation state.
//!
//! Each bubble is either idle at its target or transitioning toward it
//! from wherever it was drawn when the transition started. A new render
//! never queues behind a running transition: it restarts from the
//! currently displayed visual, so an interrupted animation cannot leave a
//! bubble stuck halfway.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use chile_dashboard_bubbles_models::{BubbleDescriptor, Rgb};

use crate::format;

/// Source of the current time for transitions.
pub trait Clock {
    /// Time elapsed since an arbitrary, fixed origin.
    fn now(&self) -> Duration;
}

/// Wall clock measured from its creation.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Clock advanced explicitly by the host, e.g. from animation-frame
/// timestamps. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    millis: Arc<AtomicU64>,
}

impl ManualClock {
    /// Moves the clock forward by `millis` milliseconds.
    pub fn advance(&self, millis: u64) {
        self.millis.fetch_add(millis, Ordering::Relaxed);
    }

    /// Sets the clock to `millis` milliseconds after the origin.
    pub fn set(&self, millis: u64) {
        self.millis.store(millis, Ordering::Relaxed);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_millis(self.millis.load(Ordering::Relaxed))
    }
}

/// Cubic ease-in-out over `[0, 1]`.
#[must_use]
pub fn ease_cubic_in_out(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0) * 2.0;
    if t <= 1.0 {
        t * t * t / 2.0
    } else {
        let t = t - 2.0;
        t.mul_add(t * t, 2.0) / 2.0
    }
}

/// The animatable part of a bubble.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Visual {
    /// Center x.
    pub x: f64,
    /// Center y.
    pub y: f64,
    /// Radius.
    pub radius: f64,
    /// Fill color.
    pub fill: Rgb,
    /// Border width.
    pub border: f64,
}

impl Visual {
    /// The visual a descriptor describes.
    #[must_use]
    pub fn of(descriptor: &BubbleDescriptor) -> Self {
        Self {
            x: descriptor.x,
            y: descriptor.y,
            radius: descriptor.radius,
            fill: descriptor.fill_color,
            border: descriptor.border_width,
        }
    }

    fn lerp(self, other: Self, t: f64) -> Self {
        let mix = |a: f64, b: f64| (b - a).mul_add(t, a);
        Self {
            x: mix(self.x, other.x),
            y: mix(self.y, other.y),
            radius: mix(self.radius, other.radius),
            fill: self.fill.lerp(other.fill, t),
            border: mix(self.border, other.border),
        }
    }
}

/// Animation phase of one bubble.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Phase {
    /// Resting at the target.
    Idle,
    /// Moving from `from` to the target since `started`.
    Transitioning {
        /// Visual at the start of the transition.
        from: Visual,
        /// Clock time the transition started.
        started: Duration,
    },
}

/// A bubble's target descriptor plus its animation phase.
#[derive(Debug, Clone, PartialEq)]
pub struct BubbleState {
    target: BubbleDescriptor,
    phase: Phase,
}

impl BubbleState {
    /// A bubble appearing for the first time. It grows from
    /// `enter_radius` at its target position.
    #[must_use]
    pub fn entering(
        target: BubbleDescriptor,
        enter_radius: f64,
        now: Duration,
        duration: Duration,
    ) -> Self {
        let phase = if duration.is_zero() {
            Phase::Idle
        } else {
            Phase::Transitioning {
                from: Visual {
                    radius: enter_radius,
                    ..Visual::of(&target)
                },
                started: now,
            }
        };
        Self { target, phase }
    }

    /// The descriptor the bubble is heading to.
    #[must_use]
    pub const fn target(&self) -> &BubbleDescriptor {
        &self.target
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Whether the bubble is still moving at `now`.
    #[must_use]
    pub fn is_transitioning(&self, now: Duration, duration: Duration) -> bool {
        match self.phase {
            Phase::Idle => false,
            Phase::Transitioning { started, .. } => now.saturating_sub(started) < duration,
        }
    }

    /// Where the bubble is drawn at `now`.
    #[must_use]
    pub fn visual_at(&self, now: Duration, duration: Duration) -> Visual {
        let to = Visual::of(&self.target);
        match self.phase {
            Phase::Idle => to,
            Phase::Transitioning { from, started } => {
                let elapsed = now.saturating_sub(started);
                if duration.is_zero() || elapsed >= duration {
                    to
                } else {
                    let t = elapsed.as_secs_f64() / duration.as_secs_f64();
                    from.lerp(to, ease_cubic_in_out(t))
                }
            }
        }
    }

    /// Points the bubble at a new target, starting from wherever it is
    /// drawn at `now`. Any running transition is superseded.
    pub fn retarget(&mut self, target: BubbleDescriptor, now: Duration, duration: Duration) {
        let from = self.visual_at(now, duration);
        self.phase = if duration.is_zero() || from == Visual::of(&target) {
            Phase::Idle
        } else {
            Phase::Transitioning { from, started: now }
        };
        self.target = target;
    }

    /// Drops a finished transition.
    pub fn settle(&mut self, now: Duration, duration: Duration) {
        if !self.is_transitioning(now, duration) {
            self.phase = Phase::Idle;
        }
    }

    /// The descriptor as drawn at `now`: target text with the interpolated
    /// geometry, color and font sizes.
    #[must_use]
    pub fn sample(&self, now: Duration, duration: Duration) -> BubbleDescriptor {
        let visual = self.visual_at(now, duration);
        BubbleDescriptor {
            x: visual.x,
            y: visual.y,
            radius: visual.radius,
            fill_color: visual.fill,
            border_width: visual.border,
            label_font_size: format::label_font_size(visual.radius),
            value_font_size: format::value_font_size(visual.radius),
            label_offset_y: format::label_offset_y(visual.radius),
            ..self.target.clone()
        }
    }
}

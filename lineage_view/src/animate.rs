// Copyright 2025 the Lineage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Wall-clock driven animation of screen snapshots.

use core::time::Duration;
use std::sync::Arc;
use std::time::Instant;

use crate::entities::ScreenEntities;
use crate::interpolate::Interpolator;
use crate::transform::ScreenTransform;

/// Linear completion clock.
#[derive(Copy, Clone, Debug)]
pub struct Animator {
    start: Instant,
    duration: Duration,
    ratio: f64,
}

impl Animator {
    /// Start a clock of `duration` at `now`.
    pub fn new(duration: Duration, now: Instant) -> Self {
        let mut a = Self {
            start: now,
            duration,
            ratio: 0.0,
        };
        a.set_time(now);
        a
    }

    /// Restart with a new duration.
    pub fn reset(&mut self, duration: Duration, now: Instant) {
        *self = Self::new(duration, now);
    }

    /// Advance the clock. Times before the start count as the start.
    pub fn set_time(&mut self, now: Instant) {
        self.ratio = if self.duration.is_zero() {
            1.0
        } else {
            let elapsed = now.saturating_duration_since(self.start);
            (elapsed.as_secs_f64() / self.duration.as_secs_f64()).min(1.0)
        };
    }

    /// Completion in `[0, 1]` as of the last [`set_time`](Self::set_time).
    pub fn ratio_complete(&self) -> f64 {
        self.ratio
    }

    /// Returns true once the full duration has elapsed.
    pub fn is_complete(&self) -> bool {
        self.ratio >= 1.0
    }
}

/// Animates from whatever was shown last to each newly projected snapshot.
///
/// [`start_animation`](Self::start_animation) begins a transition from the
/// last computed snapshot. [`continue_animation`](Self::continue_animation)
/// swaps in a new target while a transition runs, keeping its start and clock
/// and following the vertical viewport change incrementally, so that a
/// scroll during an animation does not restart it.
#[derive(Debug)]
pub struct EntityAnimator {
    clock: Animator,
    interpolator: Option<Interpolator>,
    last_computed: Arc<ScreenEntities>,
}

impl Default for EntityAnimator {
    fn default() -> Self {
        Self::new(Instant::now())
    }
}

impl EntityAnimator {
    /// Create an idle animator showing nothing.
    pub fn new(now: Instant) -> Self {
        Self {
            clock: Animator::new(Duration::ZERO, now),
            interpolator: None,
            last_computed: Arc::default(),
        }
    }

    /// Begin a transition to `end`. A zero `duration` shows `end` at once.
    pub fn start_animation(&mut self, end: ScreenEntities, duration: Duration, now: Instant) {
        self.clock.reset(duration, now);
        if duration.is_zero() {
            self.interpolator = None;
            self.last_computed = Arc::new(end);
        } else {
            self.interpolator = Some(Interpolator::new(
                self.last_computed.clone(),
                Arc::new(end),
            ));
        }
    }

    /// Retarget a running transition to `end`, or start one if idle.
    pub fn continue_animation(&mut self, end: ScreenEntities, duration: Duration, now: Instant) {
        match self.interpolator.take() {
            Some(running) => {
                let start = running.start().clone();
                let incremental = ScreenTransform::incremental_y(start.transform(), end.transform());
                self.interpolator = Some(Interpolator::with_incremental(
                    start,
                    Arc::new(end),
                    Some(incremental),
                ));
            }
            None => self.start_animation(end, duration, now),
        }
    }

    /// Advance to `now` and return the snapshot to draw.
    pub fn set_time(&mut self, now: Instant) -> Arc<ScreenEntities> {
        self.clock.set_time(now);
        if let Some(ip) = &self.interpolator {
            if self.clock.is_complete() {
                self.last_computed = ip.end().clone();
                self.interpolator = None;
            } else {
                self.last_computed = Arc::new(ip.interpolate(self.clock.ratio_complete()));
            }
        }
        self.last_computed.clone()
    }

    /// Returns true while a transition is running.
    pub fn is_animating(&self) -> bool {
        self.interpolator.is_some()
    }

    /// Snapshot produced by the last [`set_time`](Self::set_time) or
    /// immediate [`start_animation`](Self::start_animation).
    pub fn last_computed(&self) -> &Arc<ScreenEntities> {
        &self.last_computed
    }
}

#[cfg(test)]
mod tests {
    use kurbo::{Rect, Vec2};

    use super::*;

    fn frame(min_y: f64) -> ScreenEntities {
        let t = ScreenTransform::new(Rect::new(0.0, min_y, 10.0, min_y + 10.0), 101, 101);
        ScreenEntities::with_transform(t, Vec2::ZERO)
    }

    #[test]
    fn clock_reaches_completion() {
        let t0 = Instant::now();
        let mut a = Animator::new(Duration::from_millis(100), t0);
        assert_eq!(a.ratio_complete(), 0.0);
        a.set_time(t0 + Duration::from_millis(50));
        assert!((a.ratio_complete() - 0.5).abs() < 1e-9);
        assert!(!a.is_complete());
        a.set_time(t0 + Duration::from_millis(500));
        assert!(a.is_complete());
        assert_eq!(a.ratio_complete(), 1.0);
    }

    #[test]
    fn zero_duration_is_immediately_complete() {
        let t0 = Instant::now();
        let a = Animator::new(Duration::ZERO, t0);
        assert!(a.is_complete());

        let mut anim = EntityAnimator::new(t0);
        anim.start_animation(frame(3.0), Duration::ZERO, t0);
        assert!(!anim.is_animating());
        assert_eq!(anim.set_time(t0).transform().min_y(), 3.0);
    }

    #[test]
    fn transition_ends_on_the_target() {
        let t0 = Instant::now();
        let mut anim = EntityAnimator::new(t0);
        anim.start_animation(frame(0.0), Duration::ZERO, t0);
        anim.start_animation(frame(10.0), Duration::from_millis(200), t0);
        assert!(anim.is_animating());

        let mid = anim.set_time(t0 + Duration::from_millis(100));
        let y = mid.transform().min_y();
        assert!(y > 0.0 && y < 10.0);
        assert!(anim.is_animating());

        let last = anim.set_time(t0 + Duration::from_millis(200));
        assert!(!anim.is_animating());
        assert_eq!(last.transform().min_y(), 10.0);
        assert!(Arc::ptr_eq(&last, anim.last_computed()));
    }

    #[test]
    fn continuing_keeps_the_clock() {
        let t0 = Instant::now();
        let mut anim = EntityAnimator::new(t0);
        anim.start_animation(frame(0.0), Duration::ZERO, t0);
        anim.start_animation(frame(10.0), Duration::from_millis(200), t0);
        anim.continue_animation(frame(20.0), Duration::from_millis(200), t0);
        assert!(anim.is_animating());
        let last = anim.set_time(t0 + Duration::from_millis(200));
        assert_eq!(last.transform().min_y(), 20.0);
        assert!(!anim.is_animating());
    }

    #[test]
    fn continuing_while_idle_starts_fresh() {
        let t0 = Instant::now();
        let mut anim = EntityAnimator::new(t0);
        anim.continue_animation(frame(5.0), Duration::ZERO, t0);
        assert!(!anim.is_animating());
        assert_eq!(anim.last_computed().transform().min_y(), 5.0);
    }
}

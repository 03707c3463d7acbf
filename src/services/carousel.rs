//! Looping carousel state.
//!
//! The carousel shows a *looped* sequence `[last, ..items, first]` so that
//! stepping past either end animates onto a duplicate, after which the
//! position silently jumps to the real slide. This module only holds the
//! state transitions; timers and notifications live in `services::autoplay`.

use std::time::Duration;

/// Time between automatic advances
pub const AUTOPLAY_INTERVAL: Duration = Duration::from_millis(5000);
/// Length of the slide animation; wrap corrections run after it
pub const TRANSITION_DURATION: Duration = Duration::from_millis(450);
/// Portion of the carousel that must be on screen for autoplay
pub const MIN_VISIBLE_RATIO: f64 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Previous,
}

/// How the view should move to the new position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    Smooth,
    Instant,
}

/// A pending jump from a duplicate boundary slide to its real counterpart
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Correction {
    pub target: usize,
    generation: u64,
}

/// Result of a position change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub position: usize,
    pub motion: Motion,
    /// To be applied with `Carousel::apply_correction` after `TRANSITION_DURATION`
    pub correction: Option<Correction>,
}

#[derive(Debug, Clone)]
pub struct Carousel<T> {
    items: Vec<T>,
    looped: Vec<T>,
    pos: usize,
    pending: Option<Correction>,
    generation: u64,
}

impl<T: Clone> Carousel<T> {
    pub fn new(items: Vec<T>) -> Self {
        let looped = Self::build_looped(&items);
        let pos = Self::initial_position(looped.len());
        Self {
            items,
            looped,
            pos,
            pending: None,
            generation: 0,
        }
    }

    fn build_looped(items: &[T]) -> Vec<T> {
        match (items.first(), items.last()) {
            (Some(first), Some(last)) if items.len() > 1 => {
                let mut looped = Vec::with_capacity(items.len() + 2);
                looped.push(last.clone());
                looped.extend_from_slice(items);
                looped.push(first.clone());
                looped
            }
            _ => items.to_vec(),
        }
    }

    fn initial_position(looped_len: usize) -> usize {
        if looped_len > 1 {
            1
        } else {
            0
        }
    }

    /// Replaces the slides and jumps, without animation, to the first real slide.
    ///
    /// Any correction scheduled for the previous slides becomes stale.
    pub fn set_items(&mut self, items: Vec<T>) -> Step {
        self.looped = Self::build_looped(&items);
        self.items = items;
        self.pos = Self::initial_position(self.looped.len());
        self.pending = None;
        self.generation += 1;
        Step {
            position: self.pos,
            motion: Motion::Instant,
            correction: None,
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn looped(&self) -> &[T] {
        &self.looped
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn pending_correction(&self) -> Option<Correction> {
        self.pending
    }

    /// Index into `items` of the slide currently shown.
    pub fn active_index(&self) -> Option<usize> {
        let len = self.items.len();
        if len == 0 {
            return None;
        }
        Some((self.pos + len - 1) % len)
    }

    pub fn active_item(&self) -> Option<&T> {
        self.active_index().and_then(|i| self.items.get(i))
    }

    fn wraps(&self) -> bool {
        self.looped.len() > 1
    }

    /// Moves one slide in `direction`.
    ///
    /// Landing on a duplicate boundary slide schedules a correction. A
    /// correction still pending from an earlier step is settled first.
    pub fn advance(&mut self, direction: Direction) -> Option<Step> {
        if !self.wraps() {
            return None;
        }
        self.settle();

        let position = match direction {
            Direction::Next => self.pos + 1,
            Direction::Previous => self.pos - 1,
        };
        Some(self.land(position))
    }

    /// Jumps straight to a looped index (hover or focus on a side slide).
    pub fn set_active(&mut self, index: usize) -> Option<Step> {
        if index >= self.looped.len() {
            return None;
        }
        self.settle();
        Some(self.land(index))
    }

    fn land(&mut self, position: usize) -> Step {
        self.pos = position;

        let last = self.looped.len().saturating_sub(1);
        let target = match position {
            p if self.wraps() && p == last => Some(1),
            0 if self.wraps() => Some(last - 1),
            _ => None,
        };
        let correction = target.map(|target| Correction {
            target,
            generation: self.generation,
        });
        self.pending = correction;

        Step {
            position,
            motion: Motion::Smooth,
            correction,
        }
    }

    /// Applies a correction handed out by `advance`, if it is still the pending one.
    pub fn apply_correction(&mut self, correction: Correction) -> Option<Step> {
        if self.pending != Some(correction) || correction.generation != self.generation {
            return None;
        }
        self.pending = None;
        self.pos = correction.target;
        Some(Step {
            position: self.pos,
            motion: Motion::Instant,
            correction: None,
        })
    }

    fn settle(&mut self) {
        if let Some(correction) = self.pending.take() {
            self.pos = correction.target;
        }
    }
}

/// The four signals that gate autoplay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoplayConditions {
    pub paused: bool,
    pub in_view: bool,
    pub hovering: bool,
    pub document_visible: bool,
}

impl Default for AutoplayConditions {
    fn default() -> Self {
        Self {
            paused: false,
            in_view: true,
            hovering: false,
            document_visible: true,
        }
    }
}

impl AutoplayConditions {
    /// Autoplay runs only when every signal says go.
    pub fn should_run(&self) -> bool {
        !self.paused && self.in_view && !self.hovering && self.document_visible
    }

    /// Updates viewport visibility from an intersection observation.
    pub fn observe_intersection(&mut self, is_intersecting: bool, ratio: f64) {
        self.in_view = is_intersecting && ratio > MIN_VISIBLE_RATIO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn carousel(k: usize) -> Carousel<usize> {
        Carousel::new((0..k).collect())
    }

    #[test]
    fn test_looped_sequence() {
        let c = carousel(3);
        assert_eq!(c.looped(), &[2, 0, 1, 2, 0]);
        assert_eq!(c.position(), 1);
        assert_eq!(c.active_index(), Some(0));

        let single = carousel(1);
        assert_eq!(single.looped(), &[0]);
        assert_eq!(single.position(), 0);
        assert_eq!(single.active_index(), Some(0));

        let empty = carousel(0);
        assert_eq!(empty.position(), 0);
        assert_eq!(empty.active_index(), None);
        assert_eq!(empty.active_item(), None);
    }

    #[test]
    fn test_full_lap_returns_home_with_one_correction() {
        for k in 2..=9 {
            let mut c = carousel(k);
            let start = c.active_index();
            let mut corrections = 0;

            for _ in 0..k {
                let step = c.advance(Direction::Next).unwrap();
                if let Some(correction) = step.correction {
                    corrections += 1;
                    assert_eq!(correction.target, 1);
                    assert!(c.apply_correction(correction).is_some());
                }
            }

            assert_eq!(c.active_index(), start, "k={k}");
            assert_eq!(c.position(), 1);
            assert_eq!(corrections, 1, "k={k}");
        }
    }

    #[test]
    fn test_lap_without_timer_still_corrects_once() {
        let mut c = carousel(3);
        let mut corrections = 0;
        for _ in 0..6 {
            if c.advance(Direction::Next).unwrap().correction.is_some() {
                corrections += 1;
            }
            assert!(c.position() >= 1 && c.position() <= c.looped().len() - 1);
        }
        assert_eq!(corrections, 2);
        assert_eq!(c.active_index(), Some(0));
    }

    #[test]
    fn test_previous_wraps_to_last_real_slide() {
        let mut c = carousel(4);
        let step = c.advance(Direction::Previous).unwrap();
        assert_eq!(step.position, 0);
        assert_eq!(c.active_index(), Some(3));

        let correction = step.correction.unwrap();
        assert_eq!(correction.target, 4);
        let settled = c.apply_correction(correction).unwrap();
        assert_eq!(settled.motion, Motion::Instant);
        assert_eq!(c.position(), 4);
        assert_eq!(c.active_index(), Some(3));
    }

    #[test]
    fn test_correction_applies_once() {
        let mut c = carousel(2);
        c.advance(Direction::Next).unwrap();
        let step = c.advance(Direction::Next).unwrap();
        let correction = step.correction.unwrap();
        assert!(c.apply_correction(correction).is_some());
        assert!(c.apply_correction(correction).is_none());
    }

    #[test]
    fn test_set_items_invalidates_pending_correction() {
        let mut c = carousel(2);
        c.advance(Direction::Next).unwrap();
        let correction = c.advance(Direction::Next).unwrap().correction.unwrap();

        let reset = c.set_items(vec![10, 11, 12]);
        assert_eq!(reset.position, 1);
        assert_eq!(reset.motion, Motion::Instant);
        assert!(c.apply_correction(correction).is_none());
        assert_eq!(c.active_item(), Some(&10));
    }

    #[test]
    fn test_single_item_does_not_move() {
        let mut c = carousel(1);
        assert!(c.advance(Direction::Next).is_none());
        assert!(c.advance(Direction::Previous).is_none());
        assert_eq!(c.position(), 0);
    }

    #[test]
    fn test_set_active_on_duplicate_schedules_correction() {
        let mut c = carousel(3);
        let step = c.set_active(0).unwrap();
        assert_eq!(step.correction.map(|x| x.target), Some(3));

        // the next move settles onto the real slide before stepping back
        let step = c.advance(Direction::Previous).unwrap();
        assert_eq!(step.position, 2);
        assert_eq!(c.active_index(), Some(1));
    }

    #[test]
    fn test_set_active() {
        let mut c = carousel(3);
        let step = c.set_active(3).unwrap();
        assert_eq!(step.position, 3);
        assert_eq!(c.active_index(), Some(2));
        assert!(c.set_active(5).is_none());
        assert_eq!(c.position(), 3);
    }

    #[test]
    fn test_autoplay_gate() {
        let go = AutoplayConditions::default();
        assert!(go.should_run());

        for blocked in [
            AutoplayConditions { paused: true, ..go },
            AutoplayConditions { in_view: false, ..go },
            AutoplayConditions { hovering: true, ..go },
            AutoplayConditions {
                document_visible: false,
                ..go
            },
        ] {
            assert!(!blocked.should_run());
        }
    }

    #[test]
    fn test_intersection_threshold() {
        let mut conditions = AutoplayConditions::default();
        conditions.observe_intersection(true, 0.25);
        assert!(!conditions.in_view);
        conditions.observe_intersection(true, 0.3);
        assert!(conditions.in_view);
        conditions.observe_intersection(false, 0.9);
        assert!(!conditions.in_view);
    }
}

//! Multi-finger gesture detection state machine.
//!
//! The detector owns one [`FingerTrack`] per hardware slot and is fed raw
//! [`TouchEvent`]s in device order.  On every `SYN_REPORT` it checks whether
//! all active fingers agree on one gesture: a straight swipe when every finger
//! moved far enough in the same cardinal direction, otherwise a pinch or
//! spread decided by how the outline around the fingers changed.
//!
//! Only one gesture is reported per contact epoch (first finger down until
//! the last finger up).
use std::collections::HashSet;
use std::fmt;
use std::time::{Duration, Instant};

use strum::{EnumIter, EnumString, IntoStaticStr};

use crate::event::TouchEvent;
use crate::finger::FingerTrack;
use crate::geometry::{Point, circumference};

/// Number of contact slots tracked.
pub const MAX_FINGERS: usize = 5;

/// Supported gesture kinds.  The strum names are the config slot prefixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, IntoStaticStr, EnumIter)]
pub enum GestureKind {
    #[strum(serialize = "swipe_up")]
    SwipeUp,
    #[strum(serialize = "swipe_down")]
    SwipeDown,
    #[strum(serialize = "swipe_left")]
    SwipeLeft,
    #[strum(serialize = "swipe_right")]
    SwipeRight,
    #[strum(serialize = "pinch")]
    Pinch,
    #[strum(serialize = "spread")]
    Spread,
}

impl GestureKind {
    /// Human-readable name.
    pub fn label(self) -> &'static str {
        match self {
            GestureKind::SwipeUp => "Swipe Up",
            GestureKind::SwipeDown => "Swipe Down",
            GestureKind::SwipeLeft => "Swipe Left",
            GestureKind::SwipeRight => "Swipe Right",
            GestureKind::Pinch => "Pinch",
            GestureKind::Spread => "Spread",
        }
    }
}

/// A detected gesture, handed to the dispatcher by value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Gesture {
    pub kind: GestureKind,
    pub fingers: usize,
}

impl fmt::Display for Gesture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} fingers)", self.kind.label(), self.fingers)
    }
}

/// Distance and timing limits used by the detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    /// Distance every finger must travel for a straight swipe.
    pub swipe_distance: i32,
    /// Distance every finger must travel for a pinch or spread.
    pub radial_distance: i32,
    /// Settle time after a touch change before movement is trusted.
    pub debounce: Duration,
    /// Restart the sampling window when no gesture emerged within this time.
    pub resample: Duration,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            swipe_distance: 1100,
            radial_distance: 500,
            debounce: Duration::from_millis(50),
            resample: Duration::from_millis(220),
        }
    }
}

/// Outcome of the straight-swipe pass over the active fingers.
enum SwipePass {
    /// Some finger has not travelled far enough yet.
    Incomplete,
    Straight(GestureKind),
    /// All fingers moved but not in one direction, or none are active.
    NotStraight,
}

/// Detects gestures from a stream of multi-touch events.
#[derive(Debug)]
pub struct GestureDetector {
    fingers: [FingerTrack; MAX_FINGERS],
    /// `None` after a slot-select outside the tracked range.
    current_slot: Option<usize>,
    last_gesture: Option<GestureKind>,
    finger_count: usize,
    reset_timer: Instant,
    suspended: bool,
    configured_fingers: HashSet<usize>,
    thresholds: Thresholds,
}

impl GestureDetector {
    /// `configured_fingers` lists the finger counts that have at least one
    /// action; other counts are never examined.
    pub fn new(configured_fingers: HashSet<usize>, thresholds: Thresholds) -> Self {
        let now = Instant::now();
        Self {
            fingers: [FingerTrack::new(now); MAX_FINGERS],
            current_slot: Some(0),
            last_gesture: None,
            finger_count: 0,
            reset_timer: now,
            suspended: false,
            configured_fingers,
            thresholds,
        }
    }

    /// Number of contacts currently on the pad.
    pub fn finger_count(&self) -> usize {
        self.finger_count
    }

    /// Whether a gesture was already reported for the current contact epoch.
    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    pub fn finger(&self, slot: usize) -> Option<&FingerTrack> {
        self.fingers.get(slot)
    }

    /// Feed one event observed at `now`.  Returns a gesture when this event
    /// completes one.
    pub fn handle_event(&mut self, event: &TouchEvent, now: Instant) -> Option<Gesture> {
        match *event {
            TouchEvent::Slot(slot) => {
                self.current_slot = usize::try_from(slot).ok().filter(|s| *s < MAX_FINGERS);
            }
            TouchEvent::FingerDown(_) => self.contact_changed(true, now),
            TouchEvent::FingerUp => self.contact_changed(false, now),
            TouchEvent::PositionX(x) => {
                if let Some(finger) = self.current_finger() {
                    finger.set_x(x);
                }
            }
            TouchEvent::PositionY(y) => {
                if let Some(finger) = self.current_finger() {
                    finger.set_y(y);
                }
            }
            TouchEvent::SynReport => {
                if !self.suspended {
                    return self.detect(now);
                }
            }
        }
        None
    }

    fn current_finger(&mut self) -> Option<&mut FingerTrack> {
        self.current_slot.map(|slot| &mut self.fingers[slot])
    }

    fn contact_changed(&mut self, down: bool, now: Instant) {
        let previous = self.finger_count;

        if down {
            self.finger_count += 1;
            if let Some(finger) = self.current_finger() {
                finger.activate(now);
            }
        } else {
            self.finger_count = self.finger_count.saturating_sub(1);
            if let Some(finger) = self.current_finger() {
                finger.deactivate();
            }
        }

        self.reset_fingers(now);

        // First finger on an empty pad starts a new epoch.
        if previous == 0 {
            self.last_gesture = None;
            self.suspended = false;
        }
    }

    fn reset_fingers(&mut self, now: Instant) {
        for finger in &mut self.fingers {
            finger.reset(now);
        }
        self.reset_timer = now;
    }

    fn detect(&mut self, now: Instant) -> Option<Gesture> {
        let elapsed = now.saturating_duration_since(self.reset_timer);

        if !self.configured_fingers.contains(&self.finger_count)
            || self.finger_count < 2
            || elapsed < self.thresholds.debounce
        {
            return None;
        }

        let kind = match self.straight_swipe(now) {
            SwipePass::Incomplete => {
                if elapsed > self.thresholds.resample {
                    self.reset_fingers(now);
                }
                return None;
            }
            SwipePass::Straight(kind) => kind,
            SwipePass::NotStraight => self.radial(now)?,
        };

        let emitted = if self.last_gesture != Some(kind) {
            self.last_gesture = Some(kind);
            self.suspended = true;
            Some(Gesture {
                kind,
                fingers: self.finger_count,
            })
        } else {
            None
        };

        self.reset_fingers(now);
        emitted
    }

    fn active_fingers(&self) -> impl Iterator<Item = &FingerTrack> {
        self.fingers.iter().filter(|f| f.is_active)
    }

    fn straight_swipe(&self, now: Instant) -> SwipePass {
        let th = &self.thresholds;
        let mut candidate = None;

        for finger in self.active_fingers() {
            if !finger.has_swiped(th.swipe_distance, th.debounce, now) {
                return SwipePass::Incomplete;
            }
            let direction = finger.direction();
            match candidate {
                None => candidate = Some(direction),
                Some(kind) if kind != direction => return SwipePass::NotStraight,
                Some(_) => {}
            }
        }

        candidate.map_or(SwipePass::NotStraight, SwipePass::Straight)
    }

    /// Pinch or spread, from the outline around the fingers before and after
    /// the movement.  `None` unless every active finger moved far enough.
    fn radial(&self, now: Instant) -> Option<GestureKind> {
        let th = &self.thresholds;
        let mut start: Vec<Point> = Vec::with_capacity(MAX_FINGERS);
        let mut end: Vec<Point> = Vec::with_capacity(MAX_FINGERS);

        for finger in self.active_fingers() {
            if !finger.has_swiped(th.radial_distance, th.debounce, now) {
                return None;
            }
            start.push(finger.first);
            end.push(finger.last);
        }

        if start.is_empty() {
            return None;
        }

        if circumference(&start) > circumference(&end) {
            Some(GestureKind::Pinch)
        } else {
            Some(GestureKind::Spread)
        }
    }
}

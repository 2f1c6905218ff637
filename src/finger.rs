//! Per-slot finger state: where a contact started, where it is now and
//! which way it has moved since the last reset.
use std::time::{Duration, Instant};

use crate::detector::GestureKind;
use crate::geometry::{self, Point};

/// State of one hardware contact slot.
#[derive(Debug, Clone, Copy)]
pub struct FingerTrack {
    /// First position reported after activation or the last reset.
    pub first: Point,
    /// Most recently reported position.
    pub last: Point,
    pub has_x: bool,
    pub has_y: bool,
    pub is_active: bool,
    pub activation_time: Instant,
}

impl FingerTrack {
    pub fn new(now: Instant) -> Self {
        Self {
            first: Point::default(),
            last: Point::default(),
            has_x: false,
            has_y: false,
            is_active: false,
            activation_time: now,
        }
    }

    pub fn activate(&mut self, now: Instant) {
        self.is_active = true;
        self.reset(now);
    }

    pub fn deactivate(&mut self) {
        self.is_active = false;
    }

    /// Forget the latched start position and restart the settle timer.
    /// Active state is left alone.
    pub fn reset(&mut self, now: Instant) {
        self.has_x = false;
        self.has_y = false;
        self.activation_time = now;
    }

    pub fn set_x(&mut self, x: i32) {
        if !self.has_x {
            self.first.x = x;
            self.has_x = true;
        }
        self.last.x = x;
    }

    pub fn set_y(&mut self, y: i32) {
        if !self.has_y {
            self.first.y = y;
            self.has_y = true;
        }
        self.last.y = y;
    }

    pub fn has_position(&self) -> bool {
        self.has_x && self.has_y
    }

    /// Movement angle in whole degrees, 0..360, counter-clockwise from the
    /// positive x axis with screen-up as 90.
    pub fn angle(&self) -> i32 {
        if !self.has_position() {
            return 0;
        }

        let dx = f64::from(self.last.x) - f64::from(self.first.x);
        // Device y grows downwards.
        let dy = f64::from(self.first.y) - f64::from(self.last.y);

        let angle = dy.atan2(dx).to_degrees() as i32;
        if angle < 0 { angle + 360 } else { angle }
    }

    /// Cardinal direction of the movement. Boundary angles go to the first
    /// matching range in the order up, left, down, right.
    pub fn direction(&self) -> GestureKind {
        match self.angle() {
            45..=135 => GestureKind::SwipeUp,
            136..=225 => GestureKind::SwipeLeft,
            226..=315 => GestureKind::SwipeDown,
            _ => GestureKind::SwipeRight,
        }
    }

    pub fn distance(&self) -> i32 {
        if !self.has_position() {
            return 0;
        }
        geometry::distance(self.first, self.last)
    }

    /// True once the finger has settled for `debounce` and moved further
    /// than `threshold` since the last reset.
    pub fn has_swiped(&self, threshold: i32, debounce: Duration, now: Instant) -> bool {
        if !self.has_position() {
            return false;
        }
        if now.saturating_duration_since(self.activation_time) < debounce {
            return false;
        }
        self.distance() > threshold
    }
}

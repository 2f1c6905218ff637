//! Touch event classification and gesture plumbing - no I/O, no hardware,
//! fully testable.
//!
//! This module holds the deterministic glue around the detector: turning
//! `evdev` events into [`TouchEvent`]s, feeding them through a
//! [`GestureDetector`], looking up the command for a gesture and splitting
//! that command into argv.
use std::collections::HashMap;
use std::time::Instant;

use crate::config::{ActionTable, GLOBAL_ACTIONS, PadgestrError};
use crate::detector::{Gesture, GestureDetector};

// -- TouchEvent -----------------------------------------------

/// Intermediate representation of a relevant multi-touch event,
/// decoupled from `evdev` types for testability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchEvent {
    /// `ABS_MT_SLOT`: following updates apply to this slot.
    Slot(i32),
    /// `ABS_MT_TRACKING_ID` with a new contact id.
    FingerDown(i32),
    /// `ABS_MT_TRACKING_ID` of -1.
    FingerUp,
    PositionX(i32),
    PositionY(i32),
    SynReport,
}

// -- Core processing ------------------------------------------

/// Feed a sequence of [`TouchEvent`]s observed at `now` into a detector and
/// collect any gestures that fire.
pub fn process_touch_events(
    detector: &mut GestureDetector,
    events: &[TouchEvent],
    now: Instant,
) -> Vec<Gesture> {
    events
        .iter()
        .filter_map(|event| detector.handle_event(event, now))
        .collect()
}

// -- Dispatch helpers -----------------------------------------

/// Look up the command for `gesture`.
///
/// The table for `window_class` wins when it has a command for the gesture;
/// otherwise the global table is used.
pub fn resolve_action<'a>(
    gesture: Gesture,
    actions: &'a HashMap<String, ActionTable>,
    window_class: Option<&str>,
) -> Option<&'a str> {
    window_class
        .filter(|class| !class.is_empty())
        .and_then(|class| actions.get(class))
        .and_then(|table| table.get(gesture.kind, gesture.fingers))
        .or_else(|| actions.get(GLOBAL_ACTIONS)?.get(gesture.kind, gesture.fingers))
}

/// Split a command string into argv with shell quoting rules.  No expansion
/// is performed.
pub fn parse_command(command: &str) -> Result<Vec<String>, PadgestrError> {
    let argv = shell_words::split(command).map_err(|e| PadgestrError::CommandParseError {
        command: command.to_string(),
        message: e.to_string(),
    })?;

    if argv.is_empty() {
        return Err(PadgestrError::EmptyCommand);
    }
    Ok(argv)
}

/// Classify a single `evdev::InputEvent` into one of the multi-touch
/// categories the detector cares about.  Returns `None` for irrelevant events.
pub fn classify_event(event: &evdev::InputEvent) -> Option<TouchEvent> {
    use evdev::{AbsoluteAxisType, InputEventKind};

    match event.kind() {
        InputEventKind::AbsAxis(axis) => match axis {
            AbsoluteAxisType::ABS_MT_SLOT => Some(TouchEvent::Slot(event.value())),
            AbsoluteAxisType::ABS_MT_POSITION_X => Some(TouchEvent::PositionX(event.value())),
            AbsoluteAxisType::ABS_MT_POSITION_Y => Some(TouchEvent::PositionY(event.value())),
            AbsoluteAxisType::ABS_MT_TRACKING_ID => {
                if event.value() == -1 {
                    Some(TouchEvent::FingerUp)
                } else {
                    Some(TouchEvent::FingerDown(event.value()))
                }
            }
            _ => None,
        },
        InputEventKind::Synchronization(evdev::Synchronization::SYN_REPORT) => {
            Some(TouchEvent::SynReport)
        }
        _ => None,
    }
}

//! Integration tests for the event plumbing in `event`.
//!
//! Tests use `TouchEvent` directly (no hardware) and also verify
//! `classify_event` with synthetic `evdev::InputEvent`s.
use std::collections::HashMap;
use std::time::{Duration, Instant};

use evdev::{AbsoluteAxisType, EventType, InputEvent, Synchronization};
use padgestr::config::{ActionTable, PadgestrError};
use padgestr::detector::{Gesture, GestureDetector, GestureKind, Thresholds};
use padgestr::event::{
    TouchEvent, classify_event, parse_command, process_touch_events, resolve_action,
};
use strum::IntoEnumIterator;

// -- Helpers --------------------------------------------------

fn abs(axis: AbsoluteAxisType, value: i32) -> InputEvent {
    InputEvent::new(EventType::ABSOLUTE, axis.0, value)
}

fn table(entries: &[(GestureKind, usize, &str)]) -> ActionTable {
    let mut table = ActionTable::default();
    for (kind, fingers, command) in entries {
        table.insert(*kind, *fingers, command);
    }
    table
}

fn actions(tables: Vec<(&str, ActionTable)>) -> HashMap<String, ActionTable> {
    tables
        .into_iter()
        .map(|(class, table)| (class.to_string(), table))
        .collect()
}

fn swipe_left(fingers: usize) -> Gesture {
    Gesture {
        kind: GestureKind::SwipeLeft,
        fingers,
    }
}

// -- classify_event: evdev → TouchEvent -----------------------

#[test]
fn test_classify_mt_slot() {
    let ev = abs(AbsoluteAxisType::ABS_MT_SLOT, 3);
    assert_eq!(classify_event(&ev), Some(TouchEvent::Slot(3)));
}

#[test]
fn test_classify_mt_position_x() {
    let ev = abs(AbsoluteAxisType::ABS_MT_POSITION_X, 4211);
    assert_eq!(classify_event(&ev), Some(TouchEvent::PositionX(4211)));
}

#[test]
fn test_classify_mt_position_y() {
    let ev = abs(AbsoluteAxisType::ABS_MT_POSITION_Y, 99);
    assert_eq!(classify_event(&ev), Some(TouchEvent::PositionY(99)));
}

#[test]
fn test_classify_tracking_id_new_finger() {
    let ev = abs(AbsoluteAxisType::ABS_MT_TRACKING_ID, 512);
    assert_eq!(classify_event(&ev), Some(TouchEvent::FingerDown(512)));
}

#[test]
fn test_classify_tracking_id_finger_up() {
    let ev = abs(AbsoluteAxisType::ABS_MT_TRACKING_ID, -1);
    assert_eq!(classify_event(&ev), Some(TouchEvent::FingerUp));
}

#[test]
fn test_classify_syn_report() {
    let ev = InputEvent::new(EventType::SYNCHRONIZATION, Synchronization::SYN_REPORT.0, 0);
    assert_eq!(classify_event(&ev), Some(TouchEvent::SynReport));
}

#[test]
fn test_classify_other_syn_codes_ignored() {
    let ev = InputEvent::new(EventType::SYNCHRONIZATION, Synchronization::SYN_DROPPED.0, 0);
    assert_eq!(classify_event(&ev), None);
}

#[test]
fn test_classify_irrelevant_abs_axis() {
    // ABS_X (single-touch emulation) should be ignored
    let ev = abs(AbsoluteAxisType::ABS_X, 100);
    assert_eq!(classify_event(&ev), None);
}

#[test]
fn test_classify_key_event_ignored() {
    let ev = InputEvent::new(EventType::KEY, 0x145, 1); // BTN_TOOL_FINGER
    assert_eq!(classify_event(&ev), None);
}

// -- process_touch_events -------------------------------------

#[test]
fn test_classified_stream_detects_swipe() {
    let mut det = GestureDetector::new([2].into_iter().collect(), Thresholds::default());
    let t0 = Instant::now();

    let down: Vec<TouchEvent> = [
        abs(AbsoluteAxisType::ABS_MT_SLOT, 0),
        abs(AbsoluteAxisType::ABS_MT_TRACKING_ID, 40),
        abs(AbsoluteAxisType::ABS_MT_SLOT, 1),
        abs(AbsoluteAxisType::ABS_MT_TRACKING_ID, 41),
        abs(AbsoluteAxisType::ABS_MT_SLOT, 0),
        abs(AbsoluteAxisType::ABS_MT_POSITION_X, 3000),
        abs(AbsoluteAxisType::ABS_MT_POSITION_Y, 2000),
        abs(AbsoluteAxisType::ABS_MT_SLOT, 1),
        abs(AbsoluteAxisType::ABS_MT_POSITION_X, 3400),
        abs(AbsoluteAxisType::ABS_MT_POSITION_Y, 2000),
        InputEvent::new(EventType::KEY, 0x14d, 1), // BTN_TOOL_DOUBLETAP
        InputEvent::new(EventType::SYNCHRONIZATION, Synchronization::SYN_REPORT.0, 0),
    ]
    .iter()
    .filter_map(classify_event)
    .collect();

    let moved: Vec<TouchEvent> = [
        abs(AbsoluteAxisType::ABS_MT_SLOT, 0),
        abs(AbsoluteAxisType::ABS_MT_POSITION_X, 1700),
        abs(AbsoluteAxisType::ABS_MT_SLOT, 1),
        abs(AbsoluteAxisType::ABS_MT_POSITION_X, 2100),
        InputEvent::new(EventType::SYNCHRONIZATION, Synchronization::SYN_REPORT.0, 0),
    ]
    .iter()
    .filter_map(classify_event)
    .collect();

    assert!(process_touch_events(&mut det, &down, t0).is_empty());
    assert_eq!(
        process_touch_events(&mut det, &moved, t0 + Duration::from_millis(80)),
        vec![swipe_left(2)]
    );
}

#[test]
fn test_empty_events_no_gesture() {
    let mut det = GestureDetector::new([2].into_iter().collect(), Thresholds::default());
    assert!(process_touch_events(&mut det, &[], Instant::now()).is_empty());
}

#[test]
fn test_syn_report_only_no_gesture() {
    let mut det = GestureDetector::new([2].into_iter().collect(), Thresholds::default());
    let events = [TouchEvent::SynReport, TouchEvent::SynReport];
    assert!(process_touch_events(&mut det, &events, Instant::now()).is_empty());
}

// -- resolve_action -------------------------------------------

#[test]
fn test_resolve_action_window_specific() {
    let a = actions(vec![
        ("", table(&[(GestureKind::SwipeLeft, 3, "echo global")])),
        ("Firefox", table(&[(GestureKind::SwipeLeft, 3, "echo firefox")])),
    ]);
    assert_eq!(
        resolve_action(swipe_left(3), &a, Some("Firefox")),
        Some("echo firefox")
    );
}

#[test]
fn test_resolve_action_falls_back_to_global_for_missing_slot() {
    let a = actions(vec![
        ("", table(&[(GestureKind::SwipeLeft, 3, "echo global")])),
        ("Firefox", table(&[(GestureKind::SwipeRight, 3, "echo firefox")])),
    ]);
    assert_eq!(
        resolve_action(swipe_left(3), &a, Some("Firefox")),
        Some("echo global")
    );
}

#[test]
fn test_resolve_action_unknown_window_uses_global() {
    let a = actions(vec![("", table(&[(GestureKind::SwipeLeft, 4, "echo global")]))]);
    assert_eq!(
        resolve_action(swipe_left(4), &a, Some("XTerm")),
        Some("echo global")
    );
}

#[test]
fn test_resolve_action_no_window_uses_global() {
    let a = actions(vec![
        ("", table(&[(GestureKind::SwipeLeft, 2, "echo global")])),
        ("Firefox", table(&[(GestureKind::SwipeLeft, 2, "echo firefox")])),
    ]);
    assert_eq!(resolve_action(swipe_left(2), &a, None), Some("echo global"));
    assert_eq!(resolve_action(swipe_left(2), &a, Some("")), Some("echo global"));
}

#[test]
fn test_resolve_action_finger_count_must_match() {
    let a = actions(vec![("", table(&[(GestureKind::SwipeLeft, 3, "echo three")]))]);
    assert_eq!(resolve_action(swipe_left(4), &a, None), None);
}

#[test]
fn test_resolve_action_window_only() {
    let a = actions(vec![(
        "Firefox",
        table(&[(GestureKind::SwipeLeft, 3, "echo firefox")]),
    )]);
    assert_eq!(
        resolve_action(swipe_left(3), &a, Some("Firefox")),
        Some("echo firefox")
    );
    assert_eq!(resolve_action(swipe_left(3), &a, Some("XTerm")), None);
}

#[test]
fn test_resolve_action_empty_map() {
    let a = HashMap::new();
    assert_eq!(resolve_action(swipe_left(3), &a, Some("Firefox")), None);
}

#[test]
fn test_resolve_action_all_gesture_kinds() {
    for kind in GestureKind::iter() {
        for fingers in 2..=5 {
            let name: &str = kind.into();
            let command = format!("echo {name} {fingers}");
            let a = actions(vec![("", table(&[(kind, fingers, command.as_str())]))]);
            assert_eq!(
                resolve_action(Gesture { kind, fingers }, &a, None),
                Some(command.as_str()),
                "Failed for {name}_{fingers}"
            );
        }
    }
}

// -- parse_command --------------------------------------------

#[test]
fn test_parse_command_simple() {
    assert_eq!(
        parse_command("xdotool key ctrl+alt+Right").unwrap(),
        vec!["xdotool", "key", "ctrl+alt+Right"]
    );
}

#[test]
fn test_parse_command_respects_quotes() {
    assert_eq!(
        parse_command(r#"notify-send 'Swipe done' "three fingers""#).unwrap(),
        vec!["notify-send", "Swipe done", "three fingers"]
    );
}

#[test]
fn test_parse_command_does_not_expand() {
    assert_eq!(
        parse_command("echo $HOME *").unwrap(),
        vec!["echo", "$HOME", "*"]
    );
}

#[test]
fn test_parse_command_unterminated_quote() {
    let err = parse_command("echo 'oops").unwrap_err();
    assert!(matches!(err, PadgestrError::CommandParseError { .. }));
    assert!(err.to_string().contains("echo 'oops"));
}

#[test]
fn test_parse_command_blank() {
    assert!(matches!(
        parse_command("   ").unwrap_err(),
        PadgestrError::EmptyCommand
    ));
}

//! Configuration data structures and TOML parsing.
//!
//! The config file uses TOML format. Example:
//!
//! ```toml
//! [global]
//! log_level = "info"
//!
//! [global.thresholds]
//! swipe_distance = 1100
//! radial_distance = 500
//! debounce_ms = 50
//! resample_ms = 220
//!
//! [device]
//! path = "/dev/input/event7"
//!
//! [gestures]
//! swipe_left_3 = "xdotool key ctrl+alt+Right"
//! pinch_2 = "xdotool key ctrl+minus"
//!
//! [window.Firefox.gestures]
//! swipe_left_3 = "xdotool key alt+Left"
//! ```
//!
//! Gesture slot names are `<kind>_<fingers>`, where kind is one of
//! `swipe_up`, `swipe_down`, `swipe_left`, `swipe_right`, `pinch`, `spread`
//! and fingers is 2 to 5.  `[gestures]` applies to every window; a
//! `[window.<class>.gestures]` table takes precedence while a window of that
//! WM class has focus.

use std::collections::{HashMap, HashSet};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::detector::{GestureKind, MAX_FINGERS, Thresholds};

/// Key of the global action table in [`AppConfig::actions`].
pub const GLOBAL_ACTIONS: &str = "";

/// Top-level error type used throughout the crate.
#[derive(Debug, Error)]
pub enum PadgestrError {
    #[error("Failed to read config file {path}: {source}")]
    ConfigReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ConfigParseError { path: PathBuf, message: String },

    #[error(
        "Unknown gesture '{name}' in {scope}: expected <kind>_<fingers> with kind one of \
         swipe_up, swipe_down, swipe_left, swipe_right, pinch, spread and fingers 2-5"
    )]
    UnknownGesture { scope: String, name: String },

    #[error("Empty window class in [window.\"\"]: use [gestures] for actions in every window")]
    EmptyWindowClass,

    #[error("No input device path in config (set [device] path)")]
    MissingDevicePath,

    #[error("Failed to open input device {path}: {source}")]
    DeviceOpenError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to start device reader: {0}")]
    ReaderSpawnError(std::io::Error),

    #[error("Window system unavailable: {0}")]
    WindowSystemError(String),

    #[error("No active window")]
    NoActiveWindow,

    #[error("Failed to parse command '{command}': {message}")]
    CommandParseError { command: String, message: String },

    #[error("Empty command")]
    EmptyCommand,
}

/// Root of the TOML config file.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct RawConfig {
    global: RawGlobal,
    device: RawDevice,
    gestures: HashMap<String, String>,
    window: HashMap<String, RawWindow>,
}

/// The `[global]` section.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct RawGlobal {
    log_level: Option<String>,
    log_file: Option<String>,
    thresholds: RawThresholds,
}

/// Threshold overrides - anything left out keeps its built-in default.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct RawThresholds {
    swipe_distance: Option<i32>,
    radial_distance: Option<i32>,
    debounce_ms: Option<u64>,
    resample_ms: Option<u64>,
}

impl RawThresholds {
    fn into_thresholds(self) -> Thresholds {
        let defaults = Thresholds::default();
        Thresholds {
            swipe_distance: self.swipe_distance.unwrap_or(defaults.swipe_distance),
            radial_distance: self.radial_distance.unwrap_or(defaults.radial_distance),
            debounce: self
                .debounce_ms
                .map_or(defaults.debounce, Duration::from_millis),
            resample: self
                .resample_ms
                .map_or(defaults.resample, Duration::from_millis),
        }
    }
}

/// The `[device]` section.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct RawDevice {
    path: Option<String>,
}

/// A `[window.<class>]` section.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct RawWindow {
    gestures: HashMap<String, String>,
}

/// One configurable slot: a gesture kind performed with a finger count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActionSlot {
    pub kind: GestureKind,
    pub fingers: usize,
}

impl FromStr for ActionSlot {
    type Err = ();

    /// Parse a slot name such as `swipe_left_3` or `pinch_2`.
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let (kind, fingers) = name.rsplit_once('_').ok_or(())?;
        let kind = GestureKind::from_str(kind).map_err(|_| ())?;
        let fingers: usize = fingers.parse().map_err(|_| ())?;
        if !(2..=MAX_FINGERS).contains(&fingers) {
            return Err(());
        }
        Ok(Self { kind, fingers })
    }
}

/// Commands for one window class (or the global fallback).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionTable {
    commands: HashMap<ActionSlot, String>,
}

impl ActionTable {
    /// Build a table from `slot name -> command` pairs.  Empty commands are
    /// treated as unset.
    pub fn from_named<'a>(
        scope: &str,
        entries: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<Self, PadgestrError> {
        let mut table = Self::default();
        for (name, command) in entries {
            let slot: ActionSlot = name.parse().map_err(|()| PadgestrError::UnknownGesture {
                scope: scope.to_string(),
                name: name.to_string(),
            })?;
            table.insert(slot.kind, slot.fingers, command);
        }
        Ok(table)
    }

    pub fn insert(&mut self, kind: GestureKind, fingers: usize, command: &str) {
        let slot = ActionSlot { kind, fingers };
        if command.trim().is_empty() {
            self.commands.remove(&slot);
        } else {
            self.commands.insert(slot, command.to_string());
        }
    }

    /// Command for `kind` performed with `fingers`, if one is configured.
    pub fn get(&self, kind: GestureKind, fingers: usize) -> Option<&str> {
        self.commands
            .get(&ActionSlot { kind, fingers })
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Finger counts with at least one command.
    pub fn finger_counts(&self) -> impl Iterator<Item = usize> + '_ {
        self.commands.keys().map(|slot| slot.fingers)
    }
}

/// Top-level parsed configuration.
#[derive(Debug)]
pub struct AppConfig {
    pub log_level: String,
    pub log_file: Option<String>,
    pub device_path: PathBuf,
    pub thresholds: Thresholds,
    /// Action tables by WM class; [`GLOBAL_ACTIONS`] holds the fallback.
    pub actions: HashMap<String, ActionTable>,
}

impl AppConfig {
    /// Finger counts that could trigger any command, in any window.
    pub fn configured_fingers(&self) -> HashSet<usize> {
        self.actions
            .values()
            .flat_map(|table| table.finger_counts())
            .collect()
    }
}

fn action_table(
    scope: &str,
    entries: &HashMap<String, String>,
) -> Result<ActionTable, PadgestrError> {
    ActionTable::from_named(
        scope,
        entries.iter().map(|(k, v)| (k.as_str(), v.as_str())),
    )
}

/// Parse a TOML config file and return the fully resolved `AppConfig`.
pub fn parse_config_file(path: &Path) -> Result<AppConfig, PadgestrError> {
    let raw: RawConfig =
        toml::from_str(
            &fs::read_to_string(path).map_err(|e| PadgestrError::ConfigReadError {
                path: path.to_path_buf(),
                source: e,
            })?,
        )
        .map_err(|e| PadgestrError::ConfigParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    let device_path = raw
        .device
        .path
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from)
        .ok_or(PadgestrError::MissingDevicePath)?;

    let mut actions = HashMap::new();
    actions.insert(
        GLOBAL_ACTIONS.to_string(),
        action_table("[gestures]", &raw.gestures)?,
    );
    for (class, window) in &raw.window {
        if class.trim().is_empty() {
            return Err(PadgestrError::EmptyWindowClass);
        }
        let scope = format!("[window.{class}.gestures]");
        actions.insert(class.clone(), action_table(&scope, &window.gestures)?);
    }

    Ok(AppConfig {
        log_level: raw.global.log_level.unwrap_or_else(|| "info".to_string()),
        log_file: raw.global.log_file,
        device_path,
        thresholds: raw.global.thresholds.into_thresholds(),
        actions,
    })
}

/// `$XDG_CONFIG_HOME/padgestr/gestures.toml`, falling back to `~/.config`
/// and finally to `/etc/padgestr/gestures.toml`.
pub fn default_config_path() -> PathBuf {
    let base = env::var_os("XDG_CONFIG_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")));

    match base {
        Some(dir) => dir.join("padgestr").join("gestures.toml"),
        None => PathBuf::from("/etc/padgestr/gestures.toml"),
    }
}

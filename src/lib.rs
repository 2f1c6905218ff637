//! padgestr – multi-finger touchpad gestures for Linux.
//!
//! Raw multi-touch events go through [`detector::GestureDetector`]; each
//! detected [`detector::Gesture`] is mapped to a command through the
//! per-window tables in [`config::AppConfig`].
pub mod config;
pub mod detector;
pub mod event;
pub mod finger;
pub mod geometry;
pub mod manager;
pub mod window;

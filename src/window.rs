//! Active-window lookup, used to pick per-application actions.
use log::debug;
use x11rb::connection::Connection;
use x11rb::protocol::xproto::{Atom, AtomEnum, ConnectionExt, Window};
use x11rb::rust_connection::RustConnection;

use crate::config::PadgestrError;

/// Something that can report the WM class of the focused window.
pub trait WindowClassSource: Send + Sync {
    fn active_window_class(&self) -> Result<String, PadgestrError>;
}

/// Queries the focused window through EWMH on an X11 display.
pub struct X11Windows {
    conn: RustConnection,
    root: Window,
    net_active_window: Atom,
}

fn x11_error(e: impl std::fmt::Display) -> PadgestrError {
    PadgestrError::WindowSystemError(e.to_string())
}

impl X11Windows {
    /// Connect to the display named by `$DISPLAY`.
    pub fn connect() -> Result<Self, PadgestrError> {
        let (conn, screen) = x11rb::connect(None).map_err(x11_error)?;
        let root = conn.setup().roots[screen].root;
        let net_active_window = conn
            .intern_atom(false, b"_NET_ACTIVE_WINDOW")
            .map_err(x11_error)?
            .reply()
            .map_err(x11_error)?
            .atom;

        debug!("Connected to X11 screen {screen}");
        Ok(Self {
            conn,
            root,
            net_active_window,
        })
    }

    fn active_window(&self) -> Result<Window, PadgestrError> {
        let reply = self
            .conn
            .get_property(
                false,
                self.root,
                self.net_active_window,
                AtomEnum::WINDOW,
                0,
                1,
            )
            .map_err(x11_error)?
            .reply()
            .map_err(x11_error)?;

        reply
            .value32()
            .and_then(|mut values| values.next())
            .filter(|window| *window != x11rb::NONE)
            .ok_or(PadgestrError::NoActiveWindow)
    }
}

impl WindowClassSource for X11Windows {
    fn active_window_class(&self) -> Result<String, PadgestrError> {
        let window = self.active_window()?;
        let reply = self
            .conn
            .get_property(false, window, AtomEnum::WM_CLASS, AtomEnum::STRING, 0, 256)
            .map_err(x11_error)?
            .reply()
            .map_err(x11_error)?;

        parse_wm_class(&reply.value).ok_or(PadgestrError::NoActiveWindow)
    }
}

/// Extract the class from a raw `WM_CLASS` value (`instance\0class\0`).
pub fn parse_wm_class(raw: &[u8]) -> Option<String> {
    raw.split(|b| *b == 0)
        .nth(1)
        .filter(|class| !class.is_empty())
        .map(|class| String::from_utf8_lossy(class).into_owned())
}

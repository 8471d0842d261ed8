//! Window system abstraction layer
//!
//! Provides the primitives the grab manager needs:
//! - Key symbol to key code lookup through the current keyboard layout
//! - Per-screen exclusive key grabs and their release
//! - Reloading the keyboard mapping after it changed
//!
//! `x11::X11WindowSystem` is the real implementation. Tests use
//! `mock::MockWindowSystem`, which records every grab instead of talking
//! to an X server.

#[cfg(test)]
pub mod mock;
pub mod x11;

use crate::key::{KeyCode, Keysym};
use thiserror::Error;

/// Verdict of the event filter, telling the event loop what happened to an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventResponse {
    /// The event was recognized and acted upon; nobody else should react to it
    Consume,
    /// The event was not ours
    Passthrough,
}

/// Errors trapped around grab and ungrab requests
#[derive(Debug, Error)]
pub enum GrabError {
    #[error("screen {0} does not exist")]
    NoSuchScreen(usize),

    #[error("X server refused the request: {0}")]
    Refused(String),

    #[error("X connection failed: {0}")]
    Connection(String),
}

/// Interface contract for window system implementations.
///
/// Every request is checked before returning, so a refused grab surfaces as
/// an `Err` here instead of an asynchronous protocol error later on.
pub trait WindowSystem {
    /// Map a key symbol to the key code that produces it in the current layout
    fn keycode_for(&self, keysym: Keysym) -> Option<KeyCode>;

    /// Number of screens whose root windows receive grabs
    fn screen_count(&self) -> usize;

    /// Grab `code` with any modifier on the root window of `screen`
    fn grab_key(&self, code: KeyCode, screen: usize) -> Result<(), GrabError>;

    /// Release a grab taken with `grab_key`
    fn ungrab_key(&self, code: KeyCode, screen: usize) -> Result<(), GrabError>;

    /// Fetch the keyboard mapping again after the server announced a change
    fn reload_keymap(&mut self) -> Result<(), GrabError>;
}

//! X11 window system: connection, keyboard mapping, key grabs and the event thread
//!
//! Key components:
//! - x11rb `RustConnection` shared between the event loop and the reader thread
//! - A cached copy of the server's keyboard mapping for keysym lookups
//! - A polling thread that converts X11 events into `InputEvent`s

use super::{GrabError, WindowSystem};
use crate::key::{InputEvent, KeyCode, KeyEvent, Keysym};
use anyhow::{Context, Result};
use nix::poll::{PollFd, PollFlags, PollTimeout, poll};
use std::os::fd::{AsRawFd, BorrowedFd};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use tokio::sync::mpsc;
use tracing::{debug, error, info, trace, warn};
use x11rb::connection::Connection;
use x11rb::errors::ConnectionError;
use x11rb::protocol::Event;
use x11rb::protocol::xproto::{ConnectionExt as _, GrabMode, KeyButMask, Mapping, ModMask, Window};
use x11rb::rust_connection::RustConnection;

// ============================================================================
// Keyboard Mapping
// ============================================================================

/// Snapshot of the server's keycode → keysym table
#[derive(Debug, Clone, Default)]
struct Keymap {
    min_keycode: u8,
    keysyms_per_keycode: u8,
    keysyms: Vec<Keysym>,
}

impl Keymap {
    fn fetch(conn: &RustConnection) -> Result<Self, GrabError> {
        let setup = conn.setup();
        let min_keycode = setup.min_keycode;
        let count = setup.max_keycode - min_keycode + 1;

        let reply = conn
            .get_keyboard_mapping(min_keycode, count)
            .map_err(|e| GrabError::Connection(e.to_string()))?
            .reply()
            .map_err(|e| GrabError::Refused(e.to_string()))?;

        Ok(Self {
            min_keycode,
            keysyms_per_keycode: reply.keysyms_per_keycode,
            keysyms: reply.keysyms,
        })
    }

    /// Keycode producing `keysym`, searching shift columns in order.
    ///
    /// Every keycode's unshifted column is checked before any shifted one,
    /// so a key whose base symbol is `keysym` wins over a key that only
    /// produces it with a modifier.
    fn lookup(&self, keysym: Keysym) -> Option<KeyCode> {
        let per_code = usize::from(self.keysyms_per_keycode);
        if per_code == 0 {
            return None;
        }

        (0..per_code)
            .find_map(|column| {
                self.keysyms
                    .chunks(per_code)
                    .position(|row| row.get(column) == Some(&keysym))
            })
            .and_then(|offset| u8::try_from(offset).ok())
            .and_then(|offset| self.min_keycode.checked_add(offset))
            .map(KeyCode::new)
    }
}

// ============================================================================
// Window System Implementation
// ============================================================================

/// X11 window system backed by an x11rb connection
pub struct X11WindowSystem {
    conn: Arc<RustConnection>,
    roots: Vec<Window>,
    keymap: Keymap,
}

impl X11WindowSystem {
    /// Connect to the display named by `$DISPLAY` and load the keyboard mapping
    pub fn connect() -> Result<Self> {
        let (conn, screen_num) = RustConnection::connect(None).context("failed to connect to X11")?;

        let roots: Vec<Window> = conn.setup().roots.iter().map(|screen| screen.root).collect();
        info!(
            screens = roots.len(),
            default_screen = screen_num,
            "connected to X11"
        );

        let keymap = Keymap::fetch(&conn).context("failed to read the keyboard mapping")?;

        Ok(Self {
            conn: Arc::new(conn),
            roots,
            keymap,
        })
    }

    /// Get a shared reference to the X11 connection
    pub fn conn(&self) -> &Arc<RustConnection> {
        &self.conn
    }

    fn root(&self, screen: usize) -> Result<Window, GrabError> {
        self.roots
            .get(screen)
            .copied()
            .ok_or(GrabError::NoSuchScreen(screen))
    }
}

impl WindowSystem for X11WindowSystem {
    fn keycode_for(&self, keysym: Keysym) -> Option<KeyCode> {
        self.keymap.lookup(keysym)
    }

    fn screen_count(&self) -> usize {
        self.roots.len()
    }

    fn grab_key(&self, code: KeyCode, screen: usize) -> Result<(), GrabError> {
        let root = self.root(screen)?;

        // owner_events so the release is reported against the focused client's
        // coordinates; async modes so the keyboard is never frozen
        self.conn
            .grab_key(
                true,
                root,
                ModMask::ANY,
                code.raw(),
                GrabMode::ASYNC,
                GrabMode::ASYNC,
            )
            .map_err(|e| GrabError::Connection(e.to_string()))?
            .check()
            .map_err(|e| GrabError::Refused(e.to_string()))?;

        trace!(%code, screen, "grabbed key");
        Ok(())
    }

    fn ungrab_key(&self, code: KeyCode, screen: usize) -> Result<(), GrabError> {
        let root = self.root(screen)?;

        self.conn
            .ungrab_key(code.raw(), root, ModMask::ANY)
            .map_err(|e| GrabError::Connection(e.to_string()))?
            .check()
            .map_err(|e| GrabError::Refused(e.to_string()))?;

        trace!(%code, screen, "released key");
        Ok(())
    }

    fn reload_keymap(&mut self) -> Result<(), GrabError> {
        self.keymap = Keymap::fetch(&self.conn)?;
        debug!(
            keysyms_per_keycode = self.keymap.keysyms_per_keycode,
            "reloaded keyboard mapping"
        );
        Ok(())
    }
}

// ============================================================================
// Event Thread
// ============================================================================

/// Convert an X11 event into our InputEvent type
fn convert_event(event: &Event) -> InputEvent {
    match event {
        Event::KeyPress(e) => InputEvent::Key(KeyEvent::press(
            KeyCode::new(e.detail),
            e.state.contains(KeyButMask::SHIFT),
        )),
        Event::KeyRelease(e) => InputEvent::Key(KeyEvent::release(
            KeyCode::new(e.detail),
            e.state.contains(KeyButMask::SHIFT),
        )),
        Event::MappingNotify(e) if e.request == Mapping::KEYBOARD => InputEvent::KeymapChanged,
        Event::Error(e) => {
            // Unchecked request errors land here; never fatal
            warn!(error = ?e.error_kind, sequence = e.sequence, "X11 error reported");
            InputEvent::Other
        }
        _ => InputEvent::Other,
    }
}

/// Handle to the reader thread
pub struct EventReader {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl EventReader {
    /// Spawn a dedicated thread that polls the X11 connection for events.
    ///
    /// Drains every queued event, then waits on the connection fd with
    /// `nix::poll()` and a 100ms timeout. Events are forwarded in delivery
    /// order on the returned channel.
    pub fn spawn(conn: Arc<RustConnection>) -> Result<(Self, mpsc::UnboundedReceiver<InputEvent>)> {
        let (tx, rx) = mpsc::unbounded_channel();
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop);

        let handle = std::thread::Builder::new()
            .name("x11-events".into())
            .spawn(move || read_events(&conn, &thread_stop, &tx))
            .context("failed to spawn X11 event thread")?;

        Ok((Self { stop, handle }, rx))
    }

    /// Ask the thread to exit and wait for it
    pub fn stop(self) {
        self.stop.store(true, Ordering::Relaxed);
        if self.handle.join().is_err() {
            warn!("X11 event thread panicked");
        }
    }
}

fn read_events(conn: &RustConnection, stop: &AtomicBool, tx: &mpsc::UnboundedSender<InputEvent>) {
    let raw_fd = conn.stream().as_raw_fd();

    while !stop.load(Ordering::Relaxed) {
        // Checked requests on the event loop thread read the socket too and
        // leave any events they see queued, so the queue is drained on every
        // pass, not only when the fd is readable.
        if !drain_events(|| conn.poll_for_event(), tx) {
            return;
        }

        // SAFETY: raw_fd is the X11 connection fd, valid while conn is alive.
        let borrowed = unsafe { BorrowedFd::borrow_raw(raw_fd) };
        let mut fds = [PollFd::new(borrowed, PollFlags::POLLIN)];

        match poll(&mut fds, PollTimeout::from(100u16)) {
            Ok(_) | Err(nix::Error::EINTR) => {}
            Err(e) => {
                error!(error = %e, "poll error on X11 fd");
                return;
            }
        }
    }
}

/// Forward every event `next` yields until it runs dry.
///
/// Returns false when the thread should exit: the connection failed or the
/// receiving side is gone.
fn drain_events(
    mut next: impl FnMut() -> Result<Option<Event>, ConnectionError>,
    tx: &mpsc::UnboundedSender<InputEvent>,
) -> bool {
    loop {
        match next() {
            Ok(Some(event)) => {
                if tx.send(convert_event(&event)).is_err() {
                    return false;
                }
            }
            Ok(None) => return true,
            Err(e) => {
                error!(error = %e, "X11 connection error");
                return false;
            }
        }
    }
}

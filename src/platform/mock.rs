//! Mock window system for testing
//!
//! Records every grab and release instead of talking to an X server, and
//! can be told to refuse specific grabs to simulate another client already
//! holding a key.

use super::{GrabError, WindowSystem};
use crate::key::{KeyCode, Keysym};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

/// Recorded window system call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrabCall {
    Grab(KeyCode, usize),
    Ungrab(KeyCode, usize),
}

/// Mock window system that records calls instead of executing them
#[derive(Clone)]
pub struct MockWindowSystem {
    screens: usize,
    layout: HashMap<Keysym, KeyCode>,
    refused: HashSet<(KeyCode, usize)>,
    failing_ungrabs: HashSet<KeyCode>,
    calls: Arc<Mutex<Vec<GrabCall>>>,
    reloads: Arc<Mutex<usize>>,
}

impl MockWindowSystem {
    /// Create a mock with `screens` screens and an empty keyboard layout
    pub fn new(screens: usize) -> Self {
        Self {
            screens,
            layout: HashMap::new(),
            refused: HashSet::new(),
            failing_ungrabs: HashSet::new(),
            calls: Arc::new(Mutex::new(Vec::new())),
            reloads: Arc::new(Mutex::new(0)),
        }
    }

    /// Create a mock whose layout maps every action's symbol to a distinct code
    pub fn with_media_keys(screens: usize) -> Self {
        let mut mock = Self::new(screens);
        for (i, action) in crate::key::LogicalAction::ALL.iter().enumerate() {
            let keysym = crate::key::keysym_from_name(action.symbol_name()).unwrap();
            mock.map_key(keysym, KeyCode::new(170 + i as u8));
        }
        mock
    }

    /// Make `keysym` resolve to `code`
    pub fn map_key(&mut self, keysym: Keysym, code: KeyCode) {
        self.layout.insert(keysym, code);
    }

    /// Remove `keysym` from the layout
    pub fn unmap_key(&mut self, keysym: Keysym) {
        self.layout.remove(&keysym);
    }

    /// Refuse grabs of `code` on `screen`, as if another client held it
    pub fn refuse_grab(&mut self, code: KeyCode, screen: usize) {
        self.refused.insert((code, screen));
    }

    /// Make releases of `code` report an error
    pub fn fail_ungrab(&mut self, code: KeyCode) {
        self.failing_ungrabs.insert(code);
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<GrabCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Clear all recorded calls
    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// Number of keymap reloads requested
    pub fn reload_count(&self) -> usize {
        *self.reloads.lock().unwrap()
    }

    /// Codes currently grabbed on `screen`, derived from the call log
    pub fn held_on(&self, screen: usize) -> HashSet<KeyCode> {
        let mut held = HashSet::new();
        for call in self.calls() {
            match call {
                GrabCall::Grab(code, s) if s == screen => {
                    held.insert(code);
                }
                GrabCall::Ungrab(code, s) if s == screen => {
                    held.remove(&code);
                }
                _ => {}
            }
        }
        held
    }
}

impl WindowSystem for MockWindowSystem {
    fn keycode_for(&self, keysym: Keysym) -> Option<KeyCode> {
        self.layout.get(&keysym).copied()
    }

    fn screen_count(&self) -> usize {
        self.screens
    }

    fn grab_key(&self, code: KeyCode, screen: usize) -> Result<(), GrabError> {
        if screen >= self.screens {
            return Err(GrabError::NoSuchScreen(screen));
        }
        if self.refused.contains(&(code, screen)) {
            return Err(GrabError::Refused("BadAccess".to_string()));
        }
        self.calls.lock().unwrap().push(GrabCall::Grab(code, screen));
        Ok(())
    }

    fn ungrab_key(&self, code: KeyCode, screen: usize) -> Result<(), GrabError> {
        self.calls
            .lock()
            .unwrap()
            .push(GrabCall::Ungrab(code, screen));
        if self.failing_ungrabs.contains(&code) {
            return Err(GrabError::Refused("BadValue".to_string()));
        }
        Ok(())
    }

    fn reload_keymap(&mut self) -> Result<(), GrabError> {
        *self.reloads.lock().unwrap() += 1;
        Ok(())
    }
}

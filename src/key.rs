//! Key symbols, key codes and the logical actions they trigger
//!
//! Multimedia keyboards report `XF86Audio*` key symbols. The X server maps
//! each symbol to a physical key code through the current keyboard layout;
//! this module holds the fixed symbol table and the types that flow between
//! the grab layer, the event filter and the dispatcher.

use std::fmt;

/// X11 key symbol value (`KeySym`)
pub type Keysym = u32;

/// Physical key code as reported by the X server.
///
/// Only meaningful to the window system that produced it. Unbound actions are
/// represented with `Option<KeyCode>::None`, never with a zero code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyCode(u8);

impl KeyCode {
    /// Create a KeyCode from a raw X11 keycode
    pub fn new(code: u8) -> Self {
        Self(code)
    }

    /// The raw X11 keycode
    pub fn raw(self) -> u8 {
        self.0
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The player actions a multimedia key can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalAction {
    Play,
    Pause,
    Stop,
    Next,
    Previous,
    RaiseVolume,
    LowerVolume,
    Mute,
    EjectMedia,
}

impl LogicalAction {
    /// Number of actions; sizes the binding table
    pub const COUNT: usize = 9;

    /// Every action, in binding-table order
    pub const ALL: [LogicalAction; Self::COUNT] = [
        LogicalAction::Play,
        LogicalAction::Pause,
        LogicalAction::Stop,
        LogicalAction::Next,
        LogicalAction::Previous,
        LogicalAction::RaiseVolume,
        LogicalAction::LowerVolume,
        LogicalAction::Mute,
        LogicalAction::EjectMedia,
    ];

    /// Slot of this action in the binding table
    pub fn index(self) -> usize {
        self as usize
    }

    /// Name of the key symbol that triggers this action
    pub fn symbol_name(self) -> &'static str {
        match self {
            LogicalAction::Play => "XF86AudioPlay",
            LogicalAction::Pause => "XF86AudioPause",
            LogicalAction::Stop => "XF86AudioStop",
            LogicalAction::Next => "XF86AudioNext",
            LogicalAction::Previous => "XF86AudioPrev",
            LogicalAction::RaiseVolume => "XF86AudioRaiseVolume",
            LogicalAction::LowerVolume => "XF86AudioLowerVolume",
            LogicalAction::Mute => "XF86AudioMute",
            LogicalAction::EjectMedia => "XF86AudioMedia",
        }
    }
}

/// Symbols of the media keys, values as in `XF86keysym.h`
const KEYSYMS: &[(&str, Keysym)] = &[
    ("XF86AudioLowerVolume", 0x1008_FF11),
    ("XF86AudioMute", 0x1008_FF12),
    ("XF86AudioRaiseVolume", 0x1008_FF13),
    ("XF86AudioPlay", 0x1008_FF14),
    ("XF86AudioStop", 0x1008_FF15),
    ("XF86AudioPrev", 0x1008_FF16),
    ("XF86AudioNext", 0x1008_FF17),
    ("XF86AudioPause", 0x1008_FF31),
    ("XF86AudioMedia", 0x1008_FF32),
];

/// Look a key symbol name up in the symbol table
pub fn keysym_from_name(name: &str) -> Option<Keysym> {
    KEYSYMS
        .iter()
        .find(|(sym_name, _)| *sym_name == name)
        .map(|(_, sym)| *sym)
}

/// A key event received from the window system
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    /// The key that was pressed/released
    pub code: KeyCode,
    /// Whether this is a key release (false for a press)
    pub release: bool,
    /// Whether Shift was held when the event was generated
    pub shift: bool,
}

impl KeyEvent {
    /// Create a key release event
    pub fn release(code: KeyCode, shift: bool) -> Self {
        Self {
            code,
            release: true,
            shift,
        }
    }

    /// Create a key press event
    pub fn press(code: KeyCode, shift: bool) -> Self {
        Self {
            code,
            release: false,
            shift,
        }
    }
}

/// Input delivered to the event filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    /// A key press or release
    Key(KeyEvent),
    /// The keyboard mapping changed; key codes must be resolved again
    KeymapChanged,
    /// Anything else the window system delivered
    Other,
}

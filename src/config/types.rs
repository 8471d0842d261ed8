//! Configuration type definitions

use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Byte span in the source file
pub type Span = Range<usize>;

/// Highest accepted volume increment, in percent
pub const MAX_VOLUME_INCREMENT: u8 = 100;

/// What the Play key does while a track is already playing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayAction {
    /// Pause playback, making Play a play/pause toggle
    #[default]
    Pause,
    /// Restart the current track
    Restart,
}

impl PlayAction {
    /// Parse the value of the `play_action` key
    pub fn from_config_str(s: &str) -> Option<Self> {
        match s {
            "pause" => Some(PlayAction::Pause),
            "restart" => Some(PlayAction::Restart),
            _ => None,
        }
    }
}

/// Settings read by the dispatcher on every key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub play_action: PlayAction,
    /// Volume change per key press, in percent (0..=100)
    pub volume_increment: u8,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            play_action: PlayAction::Pause,
            volume_increment: 5,
        }
    }
}

/// Config file as written by the user, before validation
///
/// Values keep their source span so validation issues can point at them.
/// Unknown keys are ignored.
#[derive(Debug, Default, Deserialize)]
pub(super) struct RawConfig {
    pub play_action: Option<toml::Spanned<String>>,
    pub volume_increment: Option<toml::Spanned<i64>>,
}

//! Player transport interface
//!
//! The dispatcher drives the player exclusively through `Transport`. The
//! daemon uses `mpris::MprisTransport`; tests use `mock::MockTransport`.

#[cfg(test)]
pub mod mock;
pub mod mpris;

use anyhow::Result;
use async_trait::async_trait;

/// Highest volume level, in percent
pub const MAX_VOLUME: u8 = 100;

/// Per-channel volume, each channel in 0..=100
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Volume {
    pub left: u8,
    pub right: u8,
}

impl Volume {
    pub const MUTED: Volume = Volume { left: 0, right: 0 };

    pub fn new(left: u8, right: u8) -> Self {
        Self { left, right }
    }

    /// Both channels raised by `step`, each capped at 100
    pub fn raised(self, step: u8) -> Self {
        let up = |level: u8| level.saturating_add(step).min(MAX_VOLUME);
        Self::new(up(self.left), up(self.right))
    }

    /// Both channels lowered by `step`, each floored at 0
    pub fn lowered(self, step: u8) -> Self {
        Self::new(self.left.saturating_sub(step), self.right.saturating_sub(step))
    }

    pub fn is_muted(self) -> bool {
        self == Self::MUTED
    }
}

/// Control surface of the media player.
///
/// Calls complete before returning; errors are reported to the caller, which
/// logs them and carries on.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn play(&self) -> Result<()>;
    async fn pause(&self) -> Result<()>;
    async fn stop(&self) -> Result<()>;
    async fn playlist_prev(&self) -> Result<()>;
    async fn playlist_next(&self) -> Result<()>;
    async fn is_playing(&self) -> Result<bool>;
    async fn volume(&self) -> Result<Volume>;
    async fn set_volume(&self, volume: Volume) -> Result<()>;
    async fn eject(&self) -> Result<()>;
}

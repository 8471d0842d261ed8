//! Action dispatcher
//!
//! Turns a recognized key into player transport calls. The active
//! configuration is read from the watch channel on every key, so settings
//! applied while running take effect on the next press.

use crate::config::{PlayAction, SessionConfig};
use crate::key::LogicalAction;
use crate::transport::{Transport, Volume};
use anyhow::Result;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// What the Play key should do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayDecision {
    /// Start (or restart) playback unconditionally
    Restart,
    /// Behave exactly like the Pause key
    ToggleViaPause,
}

/// Decide how to handle the Play key.
///
/// Holding Shift restarts regardless of the configured preference.
pub fn play_decision(preference: PlayAction, shift_held: bool) -> PlayDecision {
    if preference == PlayAction::Restart || shift_held {
        PlayDecision::Restart
    } else {
        PlayDecision::ToggleViaPause
    }
}

/// Executes actions against the transport and owns the mute memory
pub struct Dispatcher<T> {
    transport: T,
    config: watch::Receiver<SessionConfig>,
    /// Volume just before the last mute; empty until the first mute
    mute_memory: Option<Volume>,
}

impl<T: Transport> Dispatcher<T> {
    pub fn new(transport: T, config: watch::Receiver<SessionConfig>) -> Self {
        Self {
            transport,
            config,
            mute_memory: None,
        }
    }

    /// Volume remembered by the last mute
    #[cfg(test)]
    pub fn mute_memory(&self) -> Option<Volume> {
        self.mute_memory
    }

    /// Execute `action`. Transport failures are logged, never returned.
    pub async fn dispatch(&mut self, action: LogicalAction, shift_held: bool) {
        // Copy out so the watch borrow is not held across awaits
        let config = *self.config.borrow();
        debug!(?action, shift_held, ?config, "dispatching action");

        if let Err(e) = self.run(action, shift_held, config).await {
            warn!(?action, error = %e, "player command failed");
        }
    }

    async fn run(
        &mut self,
        action: LogicalAction,
        shift_held: bool,
        config: SessionConfig,
    ) -> Result<()> {
        match action {
            LogicalAction::Stop => self.transport.stop().await,
            LogicalAction::Previous => self.transport.playlist_prev().await,
            LogicalAction::Next => self.transport.playlist_next().await,
            LogicalAction::EjectMedia => self.transport.eject().await,
            LogicalAction::Play => match play_decision(config.play_action, shift_held) {
                PlayDecision::Restart => self.transport.play().await,
                PlayDecision::ToggleViaPause => self.toggle_pause().await,
            },
            LogicalAction::Pause => self.toggle_pause().await,
            LogicalAction::RaiseVolume => {
                let volume = self.transport.volume().await?;
                self.transport
                    .set_volume(volume.raised(config.volume_increment))
                    .await
            }
            LogicalAction::LowerVolume => {
                let volume = self.transport.volume().await?;
                self.transport
                    .set_volume(volume.lowered(config.volume_increment))
                    .await
            }
            LogicalAction::Mute => self.toggle_mute().await,
        }
    }

    async fn toggle_pause(&self) -> Result<()> {
        if self.transport.is_playing().await? {
            self.transport.pause().await
        } else {
            self.transport.play().await
        }
    }

    /// Mute state is derived from the player's volume, never tracked locally
    async fn toggle_mute(&mut self) -> Result<()> {
        let volume = self.transport.volume().await?;

        if !volume.is_muted() {
            self.mute_memory = Some(volume);
            return self.transport.set_volume(Volume::MUTED).await;
        }

        match self.mute_memory {
            Some(saved) => self.transport.set_volume(saved).await,
            None => {
                info!("volume is already zero and no earlier volume is known, nothing to restore");
                Ok(())
            }
        }
    }
}

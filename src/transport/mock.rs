//! Mock transport for testing
//!
//! Records every transport call and simulates the playing state and volume
//! the way a player would, so dispatcher tests can assert exact call
//! sequences without a media player running.

use super::{Transport, Volume};
use anyhow::{Result, bail};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Recorded transport call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportCall {
    Play,
    Pause,
    Stop,
    PlaylistPrev,
    PlaylistNext,
    IsPlaying,
    GetVolume,
    SetVolume(Volume),
    Eject,
}

#[derive(Debug, Default)]
struct PlayerState {
    playing: bool,
    volume: Volume,
    unreachable: bool,
    calls: Vec<TransportCall>,
}

/// Mock transport that records calls instead of driving a player
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<PlayerState>>,
}

impl MockTransport {
    /// Create a stopped player at the given volume
    pub fn new(volume: Volume) -> Self {
        let transport = Self::default();
        transport.state.lock().unwrap().volume = volume;
        transport
    }

    /// Set whether the player reports itself as playing
    pub fn set_playing(&self, playing: bool) {
        self.state.lock().unwrap().playing = playing;
    }

    /// Make every call fail, as if the player went away
    pub fn set_unreachable(&self, unreachable: bool) {
        self.state.lock().unwrap().unreachable = unreachable;
    }

    /// Current simulated volume
    pub fn current_volume(&self) -> Volume {
        self.state.lock().unwrap().volume
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<TransportCall> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Clear all recorded calls
    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    /// Number of recorded calls equal to `call`
    pub fn count(&self, call: TransportCall) -> usize {
        self.calls().iter().filter(|c| **c == call).count()
    }

    fn record(&self, call: TransportCall) -> Result<std::sync::MutexGuard<'_, PlayerState>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        if state.unreachable {
            bail!("player not reachable");
        }
        Ok(state)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn play(&self) -> Result<()> {
        self.record(TransportCall::Play)?.playing = true;
        Ok(())
    }

    async fn pause(&self) -> Result<()> {
        self.record(TransportCall::Pause)?.playing = false;
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        self.record(TransportCall::Stop)?.playing = false;
        Ok(())
    }

    async fn playlist_prev(&self) -> Result<()> {
        self.record(TransportCall::PlaylistPrev)?;
        Ok(())
    }

    async fn playlist_next(&self) -> Result<()> {
        self.record(TransportCall::PlaylistNext)?;
        Ok(())
    }

    async fn is_playing(&self) -> Result<bool> {
        Ok(self.record(TransportCall::IsPlaying)?.playing)
    }

    async fn volume(&self) -> Result<Volume> {
        Ok(self.record(TransportCall::GetVolume)?.volume)
    }

    async fn set_volume(&self, volume: Volume) -> Result<()> {
        self.record(TransportCall::SetVolume(volume))?.volume = volume;
        Ok(())
    }

    async fn eject(&self) -> Result<()> {
        self.record(TransportCall::Eject)?;
        Ok(())
    }
}

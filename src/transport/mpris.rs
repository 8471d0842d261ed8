//! MPRIS transport over the D-Bus session bus
//!
//! The player is looked up on every call, so players may start and quit
//! while the daemon runs. MPRIS exposes a single volume level; it is
//! reported as two equal channels and written from the louder channel.

use super::{MAX_VOLUME, Transport, Volume};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use tracing::debug;
use zbus::proxy;
use zbus::proxy::CacheProperties;

/// Well-known bus name prefix of every MPRIS player
const MPRIS_PREFIX: &str = "org.mpris.MediaPlayer2.";

#[proxy(
    interface = "org.mpris.MediaPlayer2.Player",
    default_service = "org.mpris.MediaPlayer2",
    default_path = "/org/mpris/MediaPlayer2"
)]
trait MediaPlayer2Player {
    async fn play(&self) -> zbus::Result<()>;
    async fn pause(&self) -> zbus::Result<()>;
    async fn stop(&self) -> zbus::Result<()>;
    async fn next(&self) -> zbus::Result<()>;
    async fn previous(&self) -> zbus::Result<()>;
    async fn seek(&self, offset: i64) -> zbus::Result<()>;

    #[zbus(property)]
    fn playback_status(&self) -> zbus::Result<String>;

    #[zbus(property)]
    fn position(&self) -> zbus::Result<i64>;

    #[zbus(property)]
    fn volume(&self) -> zbus::Result<f64>;

    #[zbus(property)]
    fn set_volume(&self, value: f64) -> zbus::Result<()>;
}

#[proxy(
    interface = "org.mpris.MediaPlayer2",
    default_service = "org.mpris.MediaPlayer2",
    default_path = "/org/mpris/MediaPlayer2"
)]
trait MediaPlayer2 {
    async fn raise(&self) -> zbus::Result<()>;
}

/// Transport driving an MPRIS player
pub struct MprisTransport {
    conn: zbus::Connection,
    /// Bus name suffix prefix selecting the player, e.g. "vlc"
    player: Option<String>,
}

impl MprisTransport {
    /// Connect to the session bus
    pub async fn connect(player: Option<String>) -> Result<Self> {
        let conn = zbus::Connection::session()
            .await
            .context("failed to connect to the D-Bus session bus")?;
        Ok(Self { conn, player })
    }

    /// Bus name of the player to control
    async fn player_name(&self) -> Result<String> {
        let dbus = zbus::fdo::DBusProxy::new(&self.conn).await?;
        let names = dbus.list_names().await?;

        names
            .into_iter()
            .map(|name| name.to_string())
            .find(|name| matches_player(name, self.player.as_deref()))
            .ok_or_else(|| match &self.player {
                Some(player) => anyhow!("no MPRIS media player matching '{player}' found"),
                None => anyhow!("no MPRIS media players found"),
            })
    }

    async fn player(&self) -> Result<MediaPlayer2PlayerProxy<'static>> {
        let name = self.player_name().await?;
        debug!(player = %name, "using MPRIS player");

        let proxy = MediaPlayer2PlayerProxy::builder(&self.conn)
            .destination(name)?
            .cache_properties(CacheProperties::No)
            .build()
            .await?;
        Ok(proxy)
    }
}

/// Whether `bus_name` is an MPRIS player selected by `wanted`
fn matches_player(bus_name: &str, wanted: Option<&str>) -> bool {
    let Some(suffix) = bus_name.strip_prefix(MPRIS_PREFIX) else {
        return false;
    };
    wanted.is_none_or(|wanted| suffix.starts_with(wanted))
}

/// MPRIS volume (1.0 is full) as a percentage
fn to_percent(level: f64) -> u8 {
    (level * 100.0).round().clamp(0.0, f64::from(MAX_VOLUME)) as u8
}

#[async_trait]
impl Transport for MprisTransport {
    async fn play(&self) -> Result<()> {
        let player = self.player().await?;

        if player.playback_status().await? == "Playing" {
            // Play restarts the current track when it is already playing
            let position = player.position().await.context("player has no position")?;
            player.seek(-position).await?;
        } else {
            player.play().await?;
        }
        Ok(())
    }

    async fn pause(&self) -> Result<()> {
        Ok(self.player().await?.pause().await?)
    }

    async fn stop(&self) -> Result<()> {
        Ok(self.player().await?.stop().await?)
    }

    async fn playlist_prev(&self) -> Result<()> {
        Ok(self.player().await?.previous().await?)
    }

    async fn playlist_next(&self) -> Result<()> {
        Ok(self.player().await?.next().await?)
    }

    async fn is_playing(&self) -> Result<bool> {
        let status = self.player().await?.playback_status().await?;
        Ok(status == "Playing")
    }

    async fn volume(&self) -> Result<Volume> {
        let level = to_percent(self.player().await?.volume().await?);
        Ok(Volume::new(level, level))
    }

    async fn set_volume(&self, volume: Volume) -> Result<()> {
        let level = f64::from(volume.left.max(volume.right)) / 100.0;
        Ok(self.player().await?.set_volume(level).await?)
    }

    async fn eject(&self) -> Result<()> {
        let name = self.player_name().await?;
        let root = MediaPlayer2Proxy::builder(&self.conn)
            .destination(name)?
            .cache_properties(CacheProperties::No)
            .build()
            .await?;
        Ok(root.raise().await?)
    }
}

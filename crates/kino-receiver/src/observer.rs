//! Playback event observation
//!
//! Error, stall and seek events are only logged; the engine owns recovery.
//! Load-complete reapplies the audio track preference.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::host::PlayerManager;
use crate::preference::AudioTrackPreference;
use crate::types::AudioTrack;

/// Playback engine events this receiver listens to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlaybackEvent {
    Error {
        #[serde(default)]
        code: Option<String>,
        #[serde(default)]
        detail: Option<String>,
    },
    /// Playback stalled (`true`) or resumed after a stall (`false`)
    Buffering { is_buffering: bool },
    Seeking { current_time: f64 },
    LoadComplete,
}

/// Observer of playback engine events
pub struct PlaybackObserver {
    preference: AudioTrackPreference,
    player: Arc<dyn PlayerManager>,
}

impl PlaybackObserver {
    pub fn new(preference: AudioTrackPreference, player: Arc<dyn PlayerManager>) -> Self {
        Self { preference, player }
    }

    /// React to an event; returns the audio track activated, if any
    pub async fn on_event(&self, event: &PlaybackEvent) -> Option<AudioTrack> {
        match event {
            PlaybackEvent::Error { code, detail } => {
                warn!(code = ?code, detail = ?detail, "Playback error");
                None
            }
            PlaybackEvent::Buffering { is_buffering } => {
                debug!(is_buffering, "Playback buffering");
                None
            }
            PlaybackEvent::Seeking { current_time } => {
                debug!(current_time, "Playback seeking");
                None
            }
            PlaybackEvent::LoadComplete => self.apply_track_preference().await,
        }
    }

    /// Switch to the preferred audio track when present and not active
    ///
    /// A preference with no matching track leaves the engine default active.
    pub async fn apply_track_preference(&self) -> Option<AudioTrack> {
        let label = self.preference.get().await?;

        let active = self.player.active_audio_track();
        if active.as_ref().and_then(|t| t.name.as_deref()) == Some(label.as_str()) {
            debug!(label = %label, "Preferred audio track already active");
            return None;
        }

        let Some(track) = self
            .player
            .audio_tracks()
            .into_iter()
            .find(|t| t.name.as_deref() == Some(label.as_str()))
        else {
            debug!(label = %label, "No audio track matches preference");
            return None;
        };

        self.player.set_active_audio_track(track.track_id);
        info!(label = %label, track_id = track.track_id, "Audio track preference applied");
        Some(track)
    }
}

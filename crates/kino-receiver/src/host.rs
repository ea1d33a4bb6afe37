//! Host runtime collaborators
//!
//! The receiver runtime owns the playback engine and dispatches events; the
//! analytics adapter is provided by the embedding application. Both are
//! reached only through these traits.

use serde_json::Value;

use crate::playback::{PlaybackConfig, PlaybackInfoHandler};
use crate::types::{AudioTrack, SessionId};

/// Playback engine surface used by the pipeline
pub trait PlayerManager: Send + Sync {
    /// Snapshot of the installed playback configuration
    fn playback_config(&self) -> PlaybackConfig;

    /// Replace the installed playback configuration as a whole
    fn set_playback_config(&self, config: PlaybackConfig);

    /// Register the per-load playback-info callback, replacing any previous one
    fn set_media_playback_info_handler(&self, handler: PlaybackInfoHandler);

    /// Audio tracks of the loaded item
    fn audio_tracks(&self) -> Vec<AudioTrack>;

    /// Currently active audio track
    fn active_audio_track(&self) -> Option<AudioTrack>;

    /// Activate an audio track by identifier
    fn set_active_audio_track(&self, track_id: u32);
}

/// Handle passed to the analytics adapter alongside its configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiverContext {
    pub session_id: SessionId,
    pub namespace: String,
}

/// External analytics adapter
pub trait AnalyticsCollaborator: Send + Sync {
    /// Arm the adapter with a sender-provided configuration
    ///
    /// Called once per configuration message; repeated calls re-arm.
    fn configure(&self, config: &Value, context: &ReceiverContext) -> anyhow::Result<()>;
}

//! In-memory host doubles
//!
//! `RecordingPlayer` stands in for the playback engine and
//! `RecordingAnalytics` for the analytics adapter. Both record what the
//! pipeline did to them so tests can assert on it.

use serde_json::Value;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::host::{AnalyticsCollaborator, PlayerManager, ReceiverContext};
use crate::playback::{PlaybackConfig, PlaybackInfoHandler};
use crate::types::{AudioTrack, LoadRequest};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Default)]
struct PlayerInner {
    config: PlaybackConfig,
    config_installs: usize,
    handler: Option<PlaybackInfoHandler>,
    handler_registrations: usize,
    tracks: Vec<AudioTrack>,
    active_track: Option<u32>,
    track_switches: Vec<u32>,
}

/// Playback engine double
#[derive(Default)]
pub struct RecordingPlayer {
    inner: Mutex<PlayerInner>,
}

impl RecordingPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate the engine loading an item with these audio tracks
    ///
    /// The first track becomes active, as an engine default would.
    pub fn load_tracks(&self, tracks: Vec<AudioTrack>) {
        let mut inner = lock(&self.inner);
        inner.active_track = tracks.first().map(|t| t.track_id);
        inner.tracks = tracks;
    }

    /// Configuration the engine would use for this request
    pub fn effective_playback_config(&self, request: &LoadRequest) -> PlaybackConfig {
        let (handler, config) = {
            let inner = lock(&self.inner);
            (inner.handler.clone(), inner.config.clone())
        };
        match handler {
            Some(handler) => handler(request, config),
            None => config,
        }
    }

    /// Number of times a configuration snapshot was installed
    pub fn config_installs(&self) -> usize {
        lock(&self.inner).config_installs
    }

    /// Number of playback-info handler registrations
    pub fn playback_info_registrations(&self) -> usize {
        lock(&self.inner).handler_registrations
    }

    /// Track ids activated by the pipeline, in order
    pub fn track_switches(&self) -> Vec<u32> {
        lock(&self.inner).track_switches.clone()
    }
}

impl PlayerManager for RecordingPlayer {
    fn playback_config(&self) -> PlaybackConfig {
        lock(&self.inner).config.clone()
    }

    fn set_playback_config(&self, config: PlaybackConfig) {
        let mut inner = lock(&self.inner);
        inner.config = config;
        inner.config_installs += 1;
    }

    fn set_media_playback_info_handler(&self, handler: PlaybackInfoHandler) {
        let mut inner = lock(&self.inner);
        inner.handler = Some(handler);
        inner.handler_registrations += 1;
    }

    fn audio_tracks(&self) -> Vec<AudioTrack> {
        lock(&self.inner).tracks.clone()
    }

    fn active_audio_track(&self) -> Option<AudioTrack> {
        let inner = lock(&self.inner);
        let id = inner.active_track?;
        inner.tracks.iter().find(|t| t.track_id == id).cloned()
    }

    fn set_active_audio_track(&self, track_id: u32) {
        let mut inner = lock(&self.inner);
        inner.active_track = Some(track_id);
        inner.track_switches.push(track_id);
    }
}

/// Analytics adapter double
#[derive(Default)]
pub struct RecordingAnalytics {
    calls: Mutex<Vec<(Value, ReceiverContext)>>,
    fail: bool,
}

impl RecordingAnalytics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adapter that records the call and then reports a failure
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    /// Configurations received, in order
    pub fn configurations(&self) -> Vec<Value> {
        lock(&self.calls).iter().map(|(config, _)| config.clone()).collect()
    }

    pub fn contexts(&self) -> Vec<ReceiverContext> {
        lock(&self.calls).iter().map(|(_, context)| context.clone()).collect()
    }
}

impl AnalyticsCollaborator for RecordingAnalytics {
    fn configure(&self, config: &Value, context: &ReceiverContext) -> anyhow::Result<()> {
        lock(&self.calls).push((config.clone(), context.clone()));
        if self.fail {
            anyhow::bail!("analytics adapter rejected configuration");
        }
        Ok(())
    }
}

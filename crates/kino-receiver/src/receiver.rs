//! Receiver session - orchestrates load interception and control events
//!
//! Coordinates:
//! - Locator classification and content resolution
//! - Segment format normalization
//! - Credential policy and DRM binding
//! - Control channel messages
//! - Audio track preference on load-complete

use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{watch, RwLock};
use tracing::{info, instrument, warn};

use crate::{
    config::ReceiverConfig,
    control::{ControlChannelHandler, ControlOutcome},
    drm::{bind_drm, clear_drm},
    format::normalize_stream_format,
    host::{AnalyticsCollaborator, PlayerManager, ReceiverContext},
    locator::Locator,
    observer::{PlaybackEvent, PlaybackObserver},
    preference::AudioTrackPreference,
    resolver::{apply_resolution, ContentResolver, HttpContentResolver},
    types::*,
    Error, Result,
};

/// How the locator of a load was finalized
enum Resolution {
    /// Locator usable as delivered, or collapsed from a legacy descriptor
    Ready,
    /// Resolution service supplied the locator
    Resolved,
    /// Resolution failed; the original request goes through unmodified
    Failed,
}

/// Receiver session bound to one host runtime
pub struct Receiver {
    /// Unique session ID
    id: SessionId,
    /// Receiver configuration
    config: ReceiverConfig,
    /// Playback engine
    player: Arc<dyn PlayerManager>,
    /// Resolution service client
    resolver: Arc<dyn ContentResolver>,
    /// Audio track preference shared with the control channel
    preference: AudioTrackPreference,
    control: ControlChannelHandler,
    observer: PlaybackObserver,
    /// Current load stage
    stage: Arc<RwLock<LoadStage>>,
    /// Stage change broadcaster
    stage_tx: watch::Sender<LoadStage>,
    started: AtomicBool,
}

impl Receiver {
    /// Create a receiver resolving content over HTTP
    pub fn new(
        config: ReceiverConfig,
        player: Arc<dyn PlayerManager>,
        analytics: Arc<dyn AnalyticsCollaborator>,
    ) -> Result<Self> {
        let resolver = Arc::new(HttpContentResolver::new(&config)?);
        Self::with_resolver(config, player, analytics, resolver)
    }

    /// Create a receiver with a custom resolution client
    pub fn with_resolver(
        config: ReceiverConfig,
        player: Arc<dyn PlayerManager>,
        analytics: Arc<dyn AnalyticsCollaborator>,
        resolver: Arc<dyn ContentResolver>,
    ) -> Result<Self> {
        config.validate()?;
        let id = SessionId::new();
        let (stage_tx, _) = watch::channel(LoadStage::Idle);
        let preference = AudioTrackPreference::new();

        let context = ReceiverContext {
            session_id: id,
            namespace: config.namespace.clone(),
        };

        Ok(Self {
            id,
            control: ControlChannelHandler::new(preference.clone(), analytics, context),
            observer: PlaybackObserver::new(preference.clone(), player.clone()),
            config,
            player,
            resolver,
            preference,
            stage: Arc::new(RwLock::new(LoadStage::Idle)),
            stage_tx,
            started: AtomicBool::new(false),
        })
    }

    /// Get session ID
    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn config(&self) -> &ReceiverConfig {
        &self.config
    }

    /// Control channel namespace to register with the host
    pub fn namespace(&self) -> &str {
        self.control.namespace()
    }

    /// Handle to the shared audio track preference
    pub fn audio_track_preference(&self) -> AudioTrackPreference {
        self.preference.clone()
    }

    /// Mark the receiver as started
    pub fn start(&self) {
        if self.started.swap(true, Ordering::SeqCst) {
            warn!(session_id = %self.id, "Receiver already started");
            return;
        }
        info!(
            session_id = %self.id,
            namespace = %self.config.namespace,
            version = crate::VERSION,
            "Receiver started"
        );
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    /// Get current load stage
    pub async fn stage(&self) -> LoadStage {
        *self.stage.read().await
    }

    /// Subscribe to load stage changes
    pub fn subscribe_stage(&self) -> watch::Receiver<LoadStage> {
        self.stage_tx.subscribe()
    }

    /// Transition to a new stage
    async fn set_stage(&self, new_stage: LoadStage) -> Result<()> {
        let mut stage = self.stage.write().await;
        let current = *stage;

        if !current.can_transition_to(new_stage) {
            return Err(Error::InvalidStageTransition {
                from: current.to_string(),
                to: new_stage.to_string(),
            });
        }

        *stage = new_stage;
        let _ = self.stage_tx.send(new_stage);
        info!(from = %current, to = %new_stage, "Load stage transition");
        Ok(())
    }

    /// Start a new load cycle regardless of where the previous one stopped
    async fn begin_load(&self) {
        *self.stage.write().await = LoadStage::Intercepted;
        let _ = self.stage_tx.send(LoadStage::Intercepted);
    }

    /// Transform an intercepted load request
    ///
    /// Resolution failures are recovered: the original request is returned
    /// with credential handlers installed but no format or DRM decisions.
    /// A malformed legacy locator fails the load.
    #[instrument(skip(self, request), fields(session_id = %self.id))]
    pub async fn intercept_load(&self, mut request: LoadRequest) -> Result<LoadRequest> {
        self.begin_load().await;
        info!(locator = request.locator().unwrap_or_default(), "Load request intercepted");

        let resolution = match self.finalize_locator(&mut request).await {
            Ok(resolution) => resolution,
            Err(e) => {
                warn!(error = %e, code = e.error_code(), "Load rejected");
                self.set_stage(LoadStage::Failed).await?;
                return Err(e);
            }
        };

        if !matches!(resolution, Resolution::Failed) {
            normalize_stream_format(&mut request, &self.config.chunked_path_markers);
            self.set_stage(LoadStage::FormatNormalized).await?;
        }

        let snapshot = self.player.playback_config();
        self.player
            .set_playback_config(self.config.credential_policy.apply(&snapshot));
        self.set_stage(LoadStage::CredentialsApplied).await?;

        if !matches!(resolution, Resolution::Failed) && bind_drm(&request, self.player.as_ref()) {
            self.set_stage(LoadStage::DrmConfigured).await?;
        } else {
            clear_drm(self.player.as_ref());
        }

        self.set_stage(LoadStage::Delivered).await?;
        info!(
            locator = request.locator().unwrap_or_default(),
            segment_format = ?request.media.hls_segment_format,
            drm = request.drm().is_some(),
            "Load request delivered"
        );
        Ok(request)
    }

    async fn finalize_locator(&self, request: &mut LoadRequest) -> Result<Resolution> {
        if let Some(raw) = request.locator() {
            let locator = Locator::parse(raw)?;
            if locator.is_legacy() {
                request.set_locator(locator.into_url()?);
                self.set_stage(LoadStage::Resolved).await?;
                return Ok(Resolution::Ready);
            }
        }

        let Some(metadata) = request.metadata().cloned() else {
            if request.locator().is_none() {
                return Err(Error::MissingLocator);
            }
            self.set_stage(LoadStage::Resolved).await?;
            return Ok(Resolution::Ready);
        };

        self.set_stage(LoadStage::Resolving).await?;
        let headers = self.resolver.request_headers(&metadata);
        let outcome = match self.resolver.resolve(&metadata).await {
            Ok(response) => apply_resolution(request, response, &headers),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(()) => {
                self.set_stage(LoadStage::Resolved).await?;
                Ok(Resolution::Resolved)
            }
            Err(e) if e.is_recoverable() => {
                warn!(
                    error = %e,
                    code = e.error_code(),
                    content_id = %metadata.content_id,
                    "Content resolution failed, delivering original request"
                );
                Ok(Resolution::Failed)
            }
            Err(e) => Err(e),
        }
    }

    /// Handle a message from the companion sender
    pub async fn on_custom_message(&self, namespace: &str, raw: &Value) -> Result<ControlOutcome> {
        self.control.handle(namespace, raw).await.inspect_err(|e| {
            warn!(error = %e, code = e.error_code(), "Control message rejected");
        })
    }

    /// Handle a playback engine event
    pub async fn on_playback_event(&self, event: &PlaybackEvent) -> Option<AudioTrack> {
        let applied = self.observer.on_event(event).await;
        if applied.is_some() {
            // A load-complete without a prior delivered load is still honored
            let _ = self.set_stage(LoadStage::TrackPreferenceApplied).await;
        }
        applied
    }
}

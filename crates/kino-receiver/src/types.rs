//! Core types for Kino Receiver

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use uuid::Uuid;

/// Unique identifier for a receiver session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Load Request
// =============================================================================

/// Load request as delivered by the host runtime
///
/// Fields this crate does not interpret are kept in `extra` and handed back
/// to the host untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadRequest {
    pub media: MediaInformation,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LoadRequest {
    /// Create a request for a locator (URL or JSON-encoded descriptor)
    pub fn new(locator: impl Into<String>) -> Self {
        Self {
            media: MediaInformation {
                content_id: Some(locator.into()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Attach custom data
    pub fn with_custom_data(mut self, custom_data: CustomData) -> Self {
        self.media.custom_data = Some(custom_data);
        self
    }

    /// Current locator string, `contentUrl` taking precedence over `contentId`
    pub fn locator(&self) -> Option<&str> {
        self.media
            .content_url
            .as_deref()
            .or(self.media.content_id.as_deref())
    }

    /// Replace the locator on every field a host may read it from
    pub fn set_locator(&mut self, locator: impl Into<String>) {
        let locator = locator.into();
        if self.media.content_url.is_some() {
            self.media.content_url = Some(locator.clone());
        }
        self.media.content_id = Some(locator);
    }

    /// Content metadata requiring resolution, if any
    pub fn metadata(&self) -> Option<&ContentMetadata> {
        self.media.custom_data.as_ref()?.metadata.as_ref()
    }

    /// DRM descriptor, if any
    pub fn drm(&self) -> Option<&DrmDescriptor> {
        self.media.custom_data.as_ref()?.drm.as_ref()
    }

    /// Set the DRM descriptor, creating custom data when absent
    pub fn set_drm(&mut self, drm: DrmDescriptor) {
        self.media.custom_data.get_or_insert_with(CustomData::default).drm = Some(drm);
    }
}

/// Media information section of a load request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaInformation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_data: Option<CustomData>,
    /// Segment container override; `None` leaves the engine default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hls_segment_format: Option<HlsSegmentFormat>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Sender-provided custom data
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ContentMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drm: Option<DrmDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Value>,
}

/// Opaque content description used to query the resolution service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentMetadata {
    pub content_id: String,
    pub request_channel: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    #[serde(default)]
    pub auth_token: String,
    #[serde(default)]
    pub entitlement_token: String,
}

impl ContentMetadata {
    pub fn new(content_id: impl Into<String>, request_channel: impl Into<String>) -> Self {
        Self {
            content_id: content_id.into(),
            request_channel: request_channel.into(),
            channel_id: None,
            auth_token: String::new(),
            entitlement_token: String::new(),
        }
    }
}

/// DRM parameters for a load
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrmDescriptor {
    /// Protection system identifier understood by the playback engine
    pub protection_system: String,
    pub license_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<HashMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub with_credentials: Option<bool>,
}

impl DrmDescriptor {
    pub fn new(protection_system: impl Into<String>, license_url: impl Into<String>) -> Self {
        Self {
            protection_system: protection_system.into(),
            license_url: license_url.into(),
            headers: None,
            with_credentials: None,
        }
    }

    /// Add a header for license requests
    pub fn with_header(mut self, key: &str, value: &str) -> Self {
        self.headers
            .get_or_insert_with(HashMap::new)
            .insert(key.to_string(), value.to_string());
        self
    }
}

/// Result of a successful resolution call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedLocation {
    pub url: String,
    #[serde(default)]
    pub drm_type: Option<String>,
    #[serde(default, rename = "laURL")]
    pub license_url: Option<String>,
    #[serde(default)]
    pub stream_type: Option<String>,
}

/// Segment container override for HLS playback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HlsSegmentFormat {
    /// MPEG transport stream
    Ts,
    /// Fragmented MP4
    Fmp4,
    /// Packed AAC audio
    Aac,
}

impl std::fmt::Display for HlsSegmentFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HlsSegmentFormat::Ts => write!(f, "ts"),
            HlsSegmentFormat::Fmp4 => write!(f, "fmp4"),
            HlsSegmentFormat::Aac => write!(f, "aac"),
        }
    }
}

// =============================================================================
// Tracks
// =============================================================================

/// Audio track as reported by the playback engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioTrack {
    pub track_id: u32,
    /// Human-readable label
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
}

impl AudioTrack {
    pub fn new(track_id: u32, name: impl Into<String>) -> Self {
        Self {
            track_id,
            name: Some(name.into()),
            language: None,
        }
    }
}

// =============================================================================
// Load Stages
// =============================================================================

/// Per-load-cycle pipeline stages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoadStage {
    /// No load seen yet
    Idle,
    /// Load request handed over by the host
    Intercepted,
    /// Resolution call in flight
    Resolving,
    /// Locator finalized
    Resolved,
    /// Segment container decided
    FormatNormalized,
    /// Credential handlers installed
    CredentialsApplied,
    /// License handler registered
    DrmConfigured,
    /// Request returned to the host
    Delivered,
    /// Preferred audio track activated after load-complete
    TrackPreferenceApplied,
    /// Load rejected before delivery
    Failed,
}

impl LoadStage {
    /// Check if transition to target stage is valid
    pub fn can_transition_to(&self, target: LoadStage) -> bool {
        use LoadStage::*;
        matches!(
            (self, target),
            // A new load may start from any resting stage
            (Idle, Intercepted) | (Delivered, Intercepted) |
            (TrackPreferenceApplied, Intercepted) | (Failed, Intercepted) |
            // From Intercepted
            (Intercepted, Resolving) | (Intercepted, Resolved) | (Intercepted, Failed) |
            // From Resolving; a failed resolution skips format and DRM decisions
            (Resolving, Resolved) | (Resolving, CredentialsApplied) | (Resolving, Failed) |
            // Linear tail
            (Resolved, FormatNormalized) |
            (FormatNormalized, CredentialsApplied) |
            (CredentialsApplied, DrmConfigured) | (CredentialsApplied, Delivered) |
            (DrmConfigured, Delivered) |
            (Delivered, TrackPreferenceApplied)
        )
    }
}

impl std::fmt::Display for LoadStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadStage::Idle => write!(f, "idle"),
            LoadStage::Intercepted => write!(f, "intercepted"),
            LoadStage::Resolving => write!(f, "resolving"),
            LoadStage::Resolved => write!(f, "resolved"),
            LoadStage::FormatNormalized => write!(f, "format_normalized"),
            LoadStage::CredentialsApplied => write!(f, "credentials_applied"),
            LoadStage::DrmConfigured => write!(f, "drm_configured"),
            LoadStage::Delivered => write!(f, "delivered"),
            LoadStage::TrackPreferenceApplied => write!(f, "track_preference_applied"),
            LoadStage::Failed => write!(f, "failed"),
        }
    }
}

//! Kino Receiver - Cast receiver core for Kino
//!
//! This crate decides what a cast receiver asks its playback engine to load
//! and how those requests are authorized:
//! - Legacy dual-encoded locators and metadata-only requests resolved to a manifest URL
//! - Segment container override for origins outside the chunked allow-list
//! - Credential handlers for manifest, segment, caption and license fetches
//! - DRM license endpoint, protection system and license request decoration
//! - Companion control channel and audio track preference across loads
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         Kino Receiver                           │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐           │
//! │  │   Locator /  │─▶│    Format    │─▶│  Credential  │──┐        │
//! │  │   Resolver   │  │  Normalizer  │  │    Policy    │  │        │
//! │  └──────────────┘  └──────────────┘  └──────────────┘  │        │
//! │                                                        ▼        │
//! │                    ┌─────────────┐           ┌──────────────┐   │
//! │                    │  Receiver   │◀──────────│  DRM Binder  │   │
//! │                    │  Session    │           └──────────────┘   │
//! │                    └──────┬──────┘                              │
//! │                           │                                     │
//! │  ┌──────────────┐  ┌──────┴──────┐  ┌──────────────┐            │
//! │  │   Control    │─▶│ Audio Track │◀─│   Playback   │            │
//! │  │   Channel    │  │ Preference  │  │   Observer   │            │
//! │  └──────────────┘  └─────────────┘  └──────────────┘            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod types;
pub mod config;
pub mod locator;
pub mod resolver;
pub mod format;
pub mod playback;
pub mod credentials;
pub mod drm;
pub mod host;
pub mod preference;
pub mod control;
pub mod observer;
pub mod receiver;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use error::{Error, Result};
pub use types::*;
pub use config::ReceiverConfig;
pub use locator::Locator;
pub use resolver::{ContentResolver, HttpContentResolver, ResolutionResponse};
pub use playback::{PlaybackConfig, PlaybackConfigBuilder, RequestHandler, RequestInfo};
pub use credentials::CredentialPolicy;
pub use host::{AnalyticsCollaborator, PlayerManager, ReceiverContext};
pub use preference::AudioTrackPreference;
pub use control::{ControlChannelHandler, ControlMessage, ControlOutcome};
pub use observer::{PlaybackEvent, PlaybackObserver};
pub use receiver::Receiver;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the receiver library
pub fn init() {
    tracing::info!(version = VERSION, "Kino Receiver initialized");
}

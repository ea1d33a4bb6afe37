//! Credential policy
//!
//! Marks outbound manifest, segment, caption and license fetches as carrying
//! ambient credentials. Installed on every load, before DRM binding.

use serde::{Deserialize, Serialize};

use crate::playback::{PlaybackConfig, RequestHandler};

/// Per-category credential directives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialPolicy {
    pub manifest: bool,
    pub segment: bool,
    pub caption: bool,
    pub license: bool,
}

impl Default for CredentialPolicy {
    fn default() -> Self {
        Self {
            manifest: true,
            segment: true,
            caption: true,
            license: true,
        }
    }
}

impl CredentialPolicy {
    /// Policy with every directive disabled
    pub fn none() -> Self {
        Self {
            manifest: false,
            segment: false,
            caption: false,
            license: false,
        }
    }

    /// Derive a new snapshot with all four handler slots reassigned
    ///
    /// Disabled categories get their slot cleared, so applying the policy
    /// twice yields the same snapshot.
    pub fn apply(&self, config: &PlaybackConfig) -> PlaybackConfig {
        config
            .to_builder()
            .manifest_request_handler(slot(self.manifest))
            .segment_request_handler(slot(self.segment))
            .caption_request_handler(slot(self.caption))
            .license_request_handler(slot(self.license))
            .build()
    }
}

fn slot(enabled: bool) -> Option<RequestHandler> {
    enabled.then_some(RequestHandler::WithCredentials)
}

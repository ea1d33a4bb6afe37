//! Playback configuration snapshots
//!
//! The playback engine reads its configuration as a whole. Stages never
//! mutate the installed value: they take a snapshot, derive a new one
//! through [`PlaybackConfigBuilder`], and publish it back to the host.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::types::LoadRequest;

/// Outgoing network request as seen by a handler
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestInfo {
    pub url: String,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    /// Send ambient credentials (cookies) with the request
    #[serde(default)]
    pub with_credentials: bool,
}

impl RequestInfo {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }
}

/// Behaviour installed in one of the request handler slots
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "headers", rename_all = "snake_case")]
pub enum RequestHandler {
    /// Mark the request as carrying ambient credentials
    WithCredentials,
    /// Strip ambient credentials from the request
    WithoutCredentials,
    /// Replace the request headers with a static set
    Headers(HashMap<String, String>),
}

impl RequestHandler {
    /// Apply the handler to an outgoing request
    pub fn apply(&self, request: &mut RequestInfo) {
        match self {
            RequestHandler::WithCredentials => request.with_credentials = true,
            RequestHandler::WithoutCredentials => request.with_credentials = false,
            RequestHandler::Headers(headers) => request.headers = headers.clone(),
        }
    }
}

/// Immutable playback configuration value
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackConfig {
    license_url: Option<String>,
    protection_system: Option<String>,
    manifest_request_handler: Option<RequestHandler>,
    segment_request_handler: Option<RequestHandler>,
    caption_request_handler: Option<RequestHandler>,
    license_request_handler: Option<RequestHandler>,
}

impl PlaybackConfig {
    /// Start a new snapshot derived from this one
    pub fn to_builder(&self) -> PlaybackConfigBuilder {
        PlaybackConfigBuilder {
            config: self.clone(),
        }
    }

    pub fn license_url(&self) -> Option<&str> {
        self.license_url.as_deref()
    }

    pub fn protection_system(&self) -> Option<&str> {
        self.protection_system.as_deref()
    }

    pub fn manifest_request_handler(&self) -> Option<&RequestHandler> {
        self.manifest_request_handler.as_ref()
    }

    pub fn segment_request_handler(&self) -> Option<&RequestHandler> {
        self.segment_request_handler.as_ref()
    }

    pub fn caption_request_handler(&self) -> Option<&RequestHandler> {
        self.caption_request_handler.as_ref()
    }

    pub fn license_request_handler(&self) -> Option<&RequestHandler> {
        self.license_request_handler.as_ref()
    }

    /// Run a manifest request through the installed handler
    pub fn prepare_manifest_request(&self, request: &mut RequestInfo) {
        apply_slot(&self.manifest_request_handler, request);
    }

    /// Run a segment request through the installed handler
    pub fn prepare_segment_request(&self, request: &mut RequestInfo) {
        apply_slot(&self.segment_request_handler, request);
    }

    /// Run a caption request through the installed handler
    pub fn prepare_caption_request(&self, request: &mut RequestInfo) {
        apply_slot(&self.caption_request_handler, request);
    }

    /// Run a license request through the installed handler
    pub fn prepare_license_request(&self, request: &mut RequestInfo) {
        apply_slot(&self.license_request_handler, request);
    }
}

fn apply_slot(slot: &Option<RequestHandler>, request: &mut RequestInfo) {
    if let Some(handler) = slot {
        handler.apply(request);
    }
}

/// Builder producing a new [`PlaybackConfig`] snapshot
#[derive(Debug, Clone, Default)]
pub struct PlaybackConfigBuilder {
    config: PlaybackConfig,
}

impl PlaybackConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn license_url(mut self, url: impl Into<String>) -> Self {
        self.config.license_url = Some(url.into());
        self
    }

    pub fn protection_system(mut self, system: impl Into<String>) -> Self {
        self.config.protection_system = Some(system.into());
        self
    }

    pub fn manifest_request_handler(mut self, handler: Option<RequestHandler>) -> Self {
        self.config.manifest_request_handler = handler;
        self
    }

    pub fn segment_request_handler(mut self, handler: Option<RequestHandler>) -> Self {
        self.config.segment_request_handler = handler;
        self
    }

    pub fn caption_request_handler(mut self, handler: Option<RequestHandler>) -> Self {
        self.config.caption_request_handler = handler;
        self
    }

    pub fn license_request_handler(mut self, handler: Option<RequestHandler>) -> Self {
        self.config.license_request_handler = handler;
        self
    }

    pub fn build(self) -> PlaybackConfig {
        self.config
    }
}

/// Callback the engine invokes per load to derive the effective configuration
pub type PlaybackInfoHandler =
    Arc<dyn Fn(&LoadRequest, PlaybackConfig) -> PlaybackConfig + Send + Sync>;

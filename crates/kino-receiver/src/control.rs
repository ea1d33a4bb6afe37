//! Companion control channel
//!
//! Messages arrive on a private namespace as `{ "action": .., ...payload }`.
//! Some senders wrap the body once more under `data`; both shapes are
//! accepted, and a body delivered as a JSON string is decoded first.

use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::host::{AnalyticsCollaborator, ReceiverContext};
use crate::preference::AudioTrackPreference;
use crate::{Error, Result};

pub const ANALYTICS_CONFIG_RECEIVED: &str = "ANALYTICS_CONFIG_RECEIVED";
pub const CONTENT_LANGUAGE_LABEL: &str = "CONTENT_LANGUAGE_LABEL";

/// Control message validated at the boundary
#[derive(Debug, Clone, PartialEq)]
pub enum ControlMessage {
    /// Configuration for the analytics adapter
    AnalyticsConfigReceived { config: Value },
    /// Preferred audio track label
    ContentLanguageLabel { audio_track_label: String },
    /// Any action this receiver does not handle
    Other { action: String },
}

#[derive(Deserialize)]
struct AnalyticsPayload {
    config: Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LanguagePayload {
    audio_track_label: String,
}

impl ControlMessage {
    /// Parse a raw channel payload
    pub fn parse(raw: &Value) -> Result<Self> {
        let decoded;
        let raw = match raw {
            Value::String(text) => {
                decoded = serde_json::from_str::<Value>(text)
                    .map_err(|e| Error::message(format!("undecodable body: {e}")))?;
                &decoded
            }
            other => other,
        };
        let body = unwrap_envelope(raw)?;

        let action = body
            .get("action")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::message("action must be a string"))?;

        match action {
            ANALYTICS_CONFIG_RECEIVED => {
                let payload: AnalyticsPayload = payload(body, action)?;
                Ok(ControlMessage::AnalyticsConfigReceived {
                    config: payload.config,
                })
            }
            CONTENT_LANGUAGE_LABEL => {
                let payload: LanguagePayload = payload(body, action)?;
                Ok(ControlMessage::ContentLanguageLabel {
                    audio_track_label: payload.audio_track_label,
                })
            }
            other => Ok(ControlMessage::Other {
                action: other.to_string(),
            }),
        }
    }

    pub fn action(&self) -> &str {
        match self {
            ControlMessage::AnalyticsConfigReceived { .. } => ANALYTICS_CONFIG_RECEIVED,
            ControlMessage::ContentLanguageLabel { .. } => CONTENT_LANGUAGE_LABEL,
            ControlMessage::Other { action } => action,
        }
    }
}

fn unwrap_envelope(raw: &Value) -> Result<&Value> {
    let Some(object) = raw.as_object() else {
        return Err(Error::message("body must be a JSON object"));
    };
    if object.contains_key("action") {
        return Ok(raw);
    }
    match object.get("data") {
        Some(inner) if inner.get("action").is_some() => Ok(inner),
        _ => Err(Error::message("no action in body or data")),
    }
}

fn payload<T: for<'de> Deserialize<'de>>(body: &Value, action: &str) -> Result<T> {
    T::deserialize(body).map_err(|e| Error::message(format!("{action}: {e}")))
}

/// What a handled message did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlOutcome {
    /// Analytics adapter was (re-)armed
    AnalyticsConfigured,
    /// Audio track preference now holds this label
    PreferenceUpdated(String),
    /// Message was not for this receiver or its action is not handled
    Ignored,
}

/// Handler for the private control namespace
pub struct ControlChannelHandler {
    namespace: String,
    preference: AudioTrackPreference,
    analytics: Arc<dyn AnalyticsCollaborator>,
    context: ReceiverContext,
}

impl ControlChannelHandler {
    pub fn new(
        preference: AudioTrackPreference,
        analytics: Arc<dyn AnalyticsCollaborator>,
        context: ReceiverContext,
    ) -> Self {
        Self {
            namespace: context.namespace.clone(),
            preference,
            analytics,
            context,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Handle a raw message delivered on `namespace`
    pub async fn handle(&self, namespace: &str, raw: &Value) -> Result<ControlOutcome> {
        if namespace != self.namespace {
            warn!(namespace, expected = %self.namespace, "Message on foreign namespace");
            return Ok(ControlOutcome::Ignored);
        }

        let message = ControlMessage::parse(raw)?;
        debug!(action = message.action(), "Control message received");
        self.dispatch(message).await
    }

    /// Act on an already validated message
    pub async fn dispatch(&self, message: ControlMessage) -> Result<ControlOutcome> {
        match message {
            ControlMessage::AnalyticsConfigReceived { config } => {
                self.analytics
                    .configure(&config, &self.context)
                    .map_err(Error::Analytics)?;
                info!(session_id = %self.context.session_id, "Analytics configured");
                Ok(ControlOutcome::AnalyticsConfigured)
            }
            ControlMessage::ContentLanguageLabel { audio_track_label } => {
                self.preference.set(audio_track_label.clone()).await;
                info!(label = %audio_track_label, "Audio track preference updated");
                Ok(ControlOutcome::PreferenceUpdated(audio_track_label))
            }
            ControlMessage::Other { action } => {
                debug!(action = %action, "Ignoring control action");
                Ok(ControlOutcome::Ignored)
            }
        }
    }
}

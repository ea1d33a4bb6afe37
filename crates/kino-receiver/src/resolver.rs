//! Content resolution
//!
//! Requests that describe content by metadata instead of a playable URL are
//! resolved against the content-resolution service:
//!
//! ```text
//! GET {origin}/2.0/R/ENG/{requestChannel}/ALL/CONTENT/PLAY?[channelId=..&]contentId=..
//!     ascendontoken: {authToken}
//!     entitlementtoken: {entitlementToken}
//!
//! { "message": "200", "resultObj": { "url": .., "drmType": .., "laURL": .., "streamType": .. } }
//! ```

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::config::ReceiverConfig;
use crate::types::{ContentMetadata, DrmDescriptor, LoadRequest, ResolvedLocation};
use crate::{Error, Result};

/// Status the service reports on success
pub const SUCCESS_STATUS: &str = "200";

/// Body returned by the resolution service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionResponse {
    /// Status code as a string
    pub message: String,
    #[serde(default, rename = "resultObj")]
    pub result_obj: Option<ResolvedLocation>,
}

impl ResolutionResponse {
    pub fn is_success(&self) -> bool {
        self.message == SUCCESS_STATUS
    }

    /// Resolved location of a successful response
    pub fn into_location(self) -> Result<ResolvedLocation> {
        let success = self.is_success();
        match self.result_obj {
            Some(location) if success => Ok(location),
            _ => Err(Error::ResolutionFailed {
                status: self.message,
            }),
        }
    }
}

/// Resolution service client
#[async_trait]
pub trait ContentResolver: Send + Sync {
    /// Look up the playable location for a content description
    async fn resolve(&self, metadata: &ContentMetadata) -> Result<ResolutionResponse>;

    /// Headers sent with the lookup, reused for synthesized license requests
    fn request_headers(&self, metadata: &ContentMetadata) -> HashMap<String, String>;
}

/// Auth headers for a lookup, merged with receiver-configured extras
///
/// Extra headers win on a name clash.
pub fn resolution_headers(
    metadata: &ContentMetadata,
    extra_headers: &HashMap<String, String>,
) -> HashMap<String, String> {
    let mut headers = HashMap::with_capacity(extra_headers.len() + 2);
    headers.insert("ascendontoken".to_string(), metadata.auth_token.clone());
    headers.insert("entitlementtoken".to_string(), metadata.entitlement_token.clone());
    headers.extend(extra_headers.iter().map(|(k, v)| (k.clone(), v.clone())));
    headers
}

/// HTTP client for the resolution service
#[derive(Debug, Clone)]
pub struct HttpContentResolver {
    client: Client,
    origin: Url,
    extra_headers: HashMap<String, String>,
    timeout: Duration,
}

impl HttpContentResolver {
    /// Create a resolver from the receiver configuration
    pub fn new(config: &ReceiverConfig) -> Result<Self> {
        if config.resolution_origin.cannot_be_a_base() {
            return Err(Error::InvalidConfig(format!(
                "resolution origin {} cannot be a base URL",
                config.resolution_origin
            )));
        }

        Ok(Self {
            client: Client::builder().build()?,
            origin: config.resolution_origin.clone(),
            extra_headers: config.extra_headers.clone(),
            timeout: config.resolution_timeout(),
        })
    }

    /// Lookup URL for a content description
    pub fn resolution_url(&self, metadata: &ContentMetadata) -> Result<Url> {
        let mut url = self.origin.clone();
        url.path_segments_mut()
            .map_err(|_| Error::InvalidConfig("resolution origin cannot be a base URL".into()))?
            .pop_if_empty()
            .extend([
                "2.0",
                "R",
                "ENG",
                metadata.request_channel.as_str(),
                "ALL",
                "CONTENT",
                "PLAY",
            ]);

        {
            let mut query = url.query_pairs_mut();
            query.clear();
            if let Some(channel_id) = &metadata.channel_id {
                query.append_pair("channelId", channel_id);
            }
            query.append_pair("contentId", &metadata.content_id);
        }
        Ok(url)
    }
}

#[async_trait]
impl ContentResolver for HttpContentResolver {
    #[instrument(skip(self, metadata), fields(content_id = %metadata.content_id))]
    async fn resolve(&self, metadata: &ContentMetadata) -> Result<ResolutionResponse> {
        let url = self.resolution_url(metadata)?;
        debug!(url = %url, "Resolving content");

        let mut request = self.client.get(url);
        for (name, value) in self.request_headers(metadata) {
            request = request.header(name, value);
        }

        let call = async { request.send().await?.json::<ResolutionResponse>().await };
        let response = tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| Error::ResolutionTimeout {
                timeout_ms: self.timeout.as_millis() as u64,
            })??;

        debug!(status = %response.message, "Resolution response received");
        Ok(response)
    }

    fn request_headers(&self, metadata: &ContentMetadata) -> HashMap<String, String> {
        resolution_headers(metadata, &self.extra_headers)
    }
}

/// Default protection system for stream types that imply DRM
pub fn drm_scheme_for_stream_type(stream_type: &str) -> Option<&'static str> {
    match stream_type.to_ascii_uppercase().as_str() {
        "DASHWV" => Some("widevine"),
        "DASHPR" => Some("playready"),
        _ => None,
    }
}

/// DRM descriptor for a resolved location whose stream type implies DRM
pub fn drm_for_location(
    location: &ResolvedLocation,
    headers: &HashMap<String, String>,
) -> Option<DrmDescriptor> {
    let scheme = drm_scheme_for_stream_type(location.stream_type.as_deref()?)?;

    let Some(license_url) = location.license_url.clone() else {
        warn!(
            stream_type = location.stream_type.as_deref().unwrap_or_default(),
            "DRM stream type without license URL"
        );
        return None;
    };

    Some(DrmDescriptor {
        protection_system: location
            .drm_type
            .clone()
            .unwrap_or_else(|| scheme.to_string()),
        license_url,
        headers: Some(headers.clone()),
        with_credentials: Some(false),
    })
}

/// Apply a resolution response to a request
///
/// The request is left untouched when the response reports failure.
pub fn apply_resolution(
    request: &mut LoadRequest,
    response: ResolutionResponse,
    headers: &HashMap<String, String>,
) -> Result<()> {
    let location = response.into_location()?;

    if let Some(drm) = drm_for_location(&location, headers) {
        request.set_drm(drm);
    }
    request.set_locator(location.url);
    Ok(())
}

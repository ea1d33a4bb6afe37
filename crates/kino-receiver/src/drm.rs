//! DRM configuration binding
//!
//! Registers a playback-info handler that points the engine at the license
//! server and protection system of the load, and decorates the license
//! request with either static headers or the credentials flag.

use std::sync::Arc;
use tracing::{debug, info};

use crate::host::PlayerManager;
use crate::playback::{PlaybackConfig, RequestHandler};
use crate::types::{DrmDescriptor, LoadRequest};

/// License request handler for a descriptor
///
/// Headers are considered first and the credentials flag second, so a
/// descriptor carrying headers and `withCredentials: true` ends up with the
/// credentials handler. An explicit `false` without headers strips
/// credentials from the license request.
pub fn license_handler(drm: &DrmDescriptor) -> Option<RequestHandler> {
    let headers = drm.headers.clone().map(RequestHandler::Headers);
    match drm.with_credentials {
        Some(true) => Some(RequestHandler::WithCredentials),
        Some(false) => headers.or(Some(RequestHandler::WithoutCredentials)),
        None => headers,
    }
}

/// Derive the effective configuration for a descriptor
///
/// Without a header or credentials directive the incoming license handler
/// is kept as installed by the credential policy.
pub fn configure_drm(drm: &DrmDescriptor, config: PlaybackConfig) -> PlaybackConfig {
    let mut builder = config
        .to_builder()
        .license_url(drm.license_url.clone())
        .protection_system(drm.protection_system.clone());

    if let Some(handler) = license_handler(drm) {
        builder = builder.license_request_handler(Some(handler));
    }
    builder.build()
}

/// Register the DRM playback-info handler for a request
///
/// Returns false and registers nothing when the request has no descriptor.
pub fn bind_drm(request: &LoadRequest, player: &dyn PlayerManager) -> bool {
    let Some(drm) = request.drm().cloned() else {
        return false;
    };

    info!(
        protection_system = %drm.protection_system,
        license_url = %drm.license_url,
        "Binding DRM configuration"
    );

    player.set_media_playback_info_handler(Arc::new(move |_request, config| {
        configure_drm(&drm, config)
    }));
    true
}

/// Register a pass-through playback-info handler
///
/// Replaces whatever handler an earlier load bound, so its license endpoint
/// and headers do not reach a load without DRM.
pub fn clear_drm(player: &dyn PlayerManager) {
    debug!("Clearing DRM configuration");
    player.set_media_playback_info_handler(Arc::new(|_request, config| config));
}

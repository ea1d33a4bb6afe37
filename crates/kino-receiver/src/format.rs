//! Stream format normalization
//!
//! Origins listed by path marker already serve chunked HLS/DASH segments and
//! keep the engine's default container. Everything else is forced to MPEG-TS.
//! This is an allow-list, not content negotiation: a new chunked origin must
//! be added to the markers or its segments will be decoded as TS.

use tracing::debug;

use crate::types::{HlsSegmentFormat, LoadRequest};

/// Decide the segment container for a locator
pub fn segment_format_for(locator: &str, chunked_path_markers: &[String]) -> Option<HlsSegmentFormat> {
    if chunked_path_markers
        .iter()
        .any(|marker| locator.contains(marker.as_str()))
    {
        None
    } else {
        Some(HlsSegmentFormat::Ts)
    }
}

/// Set or clear the segment container override on a finalized request
pub fn normalize_stream_format(request: &mut LoadRequest, chunked_path_markers: &[String]) {
    let format = request
        .locator()
        .and_then(|locator| segment_format_for(locator, chunked_path_markers));

    debug!(
        locator = request.locator().unwrap_or_default(),
        format = ?format,
        "Segment format decided"
    );
    request.media.hls_segment_format = format;
}

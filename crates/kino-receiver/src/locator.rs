//! Content locators
//!
//! A locator is either a direct manifest URL or, for an older sender, a
//! JSON object carrying several manifest variants in one field:
//!
//! ```text
//! {"hls":"https://cdn/master.m3u8","dash":"https://cdn/manifest.mpd"}
//! ```
//!
//! The legacy shape is recognized once, at ingress, and collapsed to a
//! single URL with `hls` preferred over `dash`.

use crate::{Error, Result};
use serde::Deserialize;

/// Locator as it arrived on the load request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    /// Already a playable URL (or an opaque id the host understands)
    Direct(String),
    /// Legacy dual-encoded descriptor
    Legacy {
        hls: Option<String>,
        dash: Option<String>,
    },
}

#[derive(Deserialize)]
struct LegacyDescriptor {
    #[serde(default)]
    hls: Option<String>,
    #[serde(default)]
    dash: Option<String>,
}

impl Locator {
    /// Classify a raw locator string
    ///
    /// Strings beginning with `{` must parse as a legacy descriptor; a parse
    /// failure is returned rather than falling back to the raw string.
    pub fn parse(raw: &str) -> Result<Self> {
        if !raw.trim_start().starts_with('{') {
            return Ok(Locator::Direct(raw.to_string()));
        }

        let descriptor: LegacyDescriptor = serde_json::from_str(raw)?;
        Ok(Locator::Legacy {
            hls: descriptor.hls.filter(|s| !s.is_empty()),
            dash: descriptor.dash.filter(|s| !s.is_empty()),
        })
    }

    /// Whether this locator was dual-encoded
    pub fn is_legacy(&self) -> bool {
        matches!(self, Locator::Legacy { .. })
    }

    /// Effective URL, preferring the HLS variant
    pub fn into_url(self) -> Result<String> {
        match self {
            Locator::Direct(url) => Ok(url),
            Locator::Legacy { hls, dash } => hls.or(dash).ok_or(Error::EmptyLocator),
        }
    }
}

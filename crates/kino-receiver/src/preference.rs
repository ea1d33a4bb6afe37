//! Audio track preference shared between the control channel and the
//! playback observer. Lives for the receiver session, never persisted.

use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared audio track label cell
///
/// Cloning yields another handle to the same cell.
#[derive(Debug, Clone, Default)]
pub struct AudioTrackPreference {
    label: Arc<RwLock<Option<String>>>,
}

impl AudioTrackPreference {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the preferred label
    pub async fn set(&self, label: impl Into<String>) {
        *self.label.write().await = Some(label.into());
    }

    /// Latest committed label
    pub async fn get(&self) -> Option<String> {
        self.label.read().await.clone()
    }

    pub async fn clear(&self) {
        *self.label.write().await = None;
    }
}

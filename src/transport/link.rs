//! File-level delivery on top of a [`DeviceTransport`].

use std::path::Path;
use std::sync::Arc;

use super::{jpeg, DeviceTransport, TransportError};
use crate::config::DeviceConfig;

/// Sends slide files and audio references to the device.
#[derive(Clone)]
pub struct DeviceLink {
    transport: Arc<dyn DeviceTransport>,
    jpeg_quality: u8,
    max_datagram: usize,
}

impl DeviceLink {
    pub fn new(transport: Arc<dyn DeviceTransport>, config: &DeviceConfig) -> Self {
        Self {
            transport,
            jpeg_quality: config.jpeg_quality,
            max_datagram: config.max_datagram_bytes,
        }
    }

    /// Re-encode the slide at `path` as datagram-sized JPEG and send it.
    ///
    /// Decoding and encoding run on the blocking pool.
    pub async fn show_slide(&self, path: &Path) -> Result<(), TransportError> {
        let owned = path.to_path_buf();
        let (quality, max) = (self.jpeg_quality, self.max_datagram);
        let bytes = tokio::task::spawn_blocking(move || jpeg::load_for_datagram(&owned, quality, max))
            .await
            .map_err(|e| TransportError::Encode(format!("encoder task failed: {e}")))??;

        self.transport.send_image(&bytes).await?;
        log::info!("transport: slide sent {}", path.display());
        Ok(())
    }

    /// Announce an audio file on the control channel.
    pub async fn cue_audio(&self, reference: &str) -> Result<(), TransportError> {
        self.transport.send_audio_ref(reference).await
    }
}

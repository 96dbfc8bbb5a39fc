//! Delivery to the wearable display.
//!
//! ```text
//!   slide.png ──▶ DeviceLink::show_slide ──▶ jpeg::fit_datagram ──▶ send_image ──▶ host:base_port
//!   voice.wav ──▶ DeviceLink::cue_audio  ──────────────────────────▶ send_audio_ref ▶ host:base_port+1
//!                                                                   ("AUDIO:<path>")
//! ```
//!
//! Fire-and-forget: no acknowledgement, no retry, no ordering beyond the
//! order of the calls.

pub mod jpeg;
pub mod link;
pub mod udp;

use async_trait::async_trait;
use thiserror::Error;

pub use link::DeviceLink;
pub use udp::UdpTransport;

/// Prefix of a control-channel message announcing an audio file.
pub const AUDIO_PREFIX: &str = "AUDIO:";

// ---------------------------------------------------------------------------
// TransportError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum TransportError {
    /// The payload cannot be delivered in one datagram.
    #[error("payload of {len} bytes exceeds the {max} byte datagram limit")]
    Oversized { len: usize, max: usize },

    #[error("socket error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image encoding failed: {0}")]
    Encode(String),

    /// `base_port + 1` does not fit in a port number.
    #[error("no control port above {0}")]
    InvalidPort(u16),

    #[error("cannot resolve device address {0}")]
    Resolve(String),
}

// ---------------------------------------------------------------------------
// DeviceTransport
// ---------------------------------------------------------------------------

/// Datagram channel pair to the device.
#[async_trait]
pub trait DeviceTransport: Send + Sync {
    /// One encoded JPEG on the image channel.
    async fn send_image(&self, jpeg: &[u8]) -> Result<(), TransportError>;

    /// `AUDIO:<reference>` on the control channel.
    async fn send_audio_ref(&self, reference: &str) -> Result<(), TransportError>;
}

//! UDP implementation of [`DeviceTransport`].

use std::net::SocketAddr;

use async_trait::async_trait;
use tokio::net::UdpSocket;

use super::{DeviceTransport, TransportError, AUDIO_PREFIX};
use crate::config::DeviceConfig;

/// One unconnected socket sending to two device ports.
pub struct UdpTransport {
    socket: UdpSocket,
    image_addr: SocketAddr,
    control_addr: SocketAddr,
    max_datagram: usize,
}

impl UdpTransport {
    /// Bind an ephemeral local port and resolve `host:base_port`.
    pub async fn connect(config: &DeviceConfig) -> Result<Self, TransportError> {
        let control_port = config
            .base_port
            .checked_add(1)
            .ok_or(TransportError::InvalidPort(config.base_port))?;

        let target = format!("{}:{}", config.host, config.base_port);
        let image_addr = tokio::net::lookup_host(&target)
            .await
            .map_err(|e| TransportError::Resolve(format!("{target}: {e}")))?
            .next()
            .ok_or_else(|| TransportError::Resolve(target.clone()))?;
        let control_addr = SocketAddr::new(image_addr.ip(), control_port);

        let bind_addr = if image_addr.is_ipv6() { "[::]:0" } else { "0.0.0.0:0" };
        let socket = UdpSocket::bind(bind_addr).await?;

        log::info!("transport: images → {image_addr}, control → {control_addr}");

        Ok(Self {
            socket,
            image_addr,
            control_addr,
            max_datagram: config.max_datagram_bytes,
        })
    }

    pub fn image_addr(&self) -> SocketAddr {
        self.image_addr
    }

    pub fn control_addr(&self) -> SocketAddr {
        self.control_addr
    }

    async fn send(&self, payload: &[u8], to: SocketAddr) -> Result<(), TransportError> {
        if payload.len() > self.max_datagram {
            return Err(TransportError::Oversized {
                len: payload.len(),
                max: self.max_datagram,
            });
        }
        self.socket.send_to(payload, to).await?;
        Ok(())
    }
}

#[async_trait]
impl DeviceTransport for UdpTransport {
    async fn send_image(&self, jpeg: &[u8]) -> Result<(), TransportError> {
        self.send(jpeg, self.image_addr).await?;
        log::debug!("transport: sent {} byte image", jpeg.len());
        Ok(())
    }

    async fn send_audio_ref(&self, reference: &str) -> Result<(), TransportError> {
        let message = format!("{AUDIO_PREFIX}{reference}");
        self.send(message.as_bytes(), self.control_addr).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn device_pair() -> (UdpSocket, UdpSocket, DeviceConfig) {
        // Consecutive ports are not guaranteed, so retry until both bind.
        loop {
            let image = UdpSocket::bind("127.0.0.1:0").await.unwrap();
            let port = image.local_addr().unwrap().port();
            let Some(next) = port.checked_add(1) else { continue };
            if let Ok(control) = UdpSocket::bind(("127.0.0.1", next)).await {
                let config = DeviceConfig {
                    host: "127.0.0.1".into(),
                    base_port: port,
                    ..DeviceConfig::default()
                };
                return (image, control, config);
            }
        }
    }

    #[tokio::test]
    async fn images_and_audio_use_separate_ports() {
        let (image_rx, control_rx, config) = device_pair().await;
        let transport = UdpTransport::connect(&config).await.unwrap();

        transport.send_image(&[0xFF, 0xD8, 0x01]).await.unwrap();
        transport.send_audio_ref("/tmp/voice_1.wav").await.unwrap();

        let mut buf = [0u8; 64];
        let n = image_rx.recv(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], &[0xFF, 0xD8, 0x01]);
        let n = control_rx.recv(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"AUDIO:/tmp/voice_1.wav");
    }

    #[tokio::test]
    async fn oversized_payload_is_rejected_before_sending() {
        let config = DeviceConfig {
            host: "127.0.0.1".into(),
            base_port: 40_000,
            max_datagram_bytes: 4,
            ..DeviceConfig::default()
        };
        let transport = UdpTransport::connect(&config).await.unwrap();

        let err = transport.send_image(&[0; 5]).await.unwrap_err();
        assert!(matches!(err, TransportError::Oversized { len: 5, max: 4 }));
    }

    #[tokio::test]
    async fn top_port_has_no_control_channel() {
        let config = DeviceConfig {
            host: "127.0.0.1".into(),
            base_port: u16::MAX,
            ..DeviceConfig::default()
        };
        assert!(matches!(
            UdpTransport::connect(&config).await,
            Err(TransportError::InvalidPort(u16::MAX))
        ));
    }
}

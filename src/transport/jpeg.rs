//! JPEG encoding sized for a single datagram.

use std::io::Cursor;
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;

use super::TransportError;

/// Lowest quality tried before downscaling.
pub const MIN_QUALITY: u8 = 40;
const QUALITY_STEP: u8 = 15;
/// Images are never shrunk below this edge length.
const MIN_EDGE: u32 = 64;

pub fn encode(image: &DynamicImage, quality: u8) -> Result<Vec<u8>, TransportError> {
    let rgb = image.to_rgb8();
    let mut out = Cursor::new(Vec::new());
    {
        let mut encoder = JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100));
        encoder
            .encode_image(&rgb)
            .map_err(|e| TransportError::Encode(e.to_string()))?;
    }
    Ok(out.into_inner())
}

/// Encode `image` so it fits in `max_bytes`.
///
/// Quality is lowered from `quality` in steps down to [`MIN_QUALITY`]; after
/// that the image is shrunk by a quarter per attempt at `MIN_QUALITY`.
pub fn fit_datagram(
    image: &DynamicImage,
    quality: u8,
    max_bytes: usize,
) -> Result<Vec<u8>, TransportError> {
    let mut quality = quality.max(MIN_QUALITY);
    let mut last_len;
    loop {
        let bytes = encode(image, quality)?;
        if bytes.len() <= max_bytes {
            return Ok(bytes);
        }
        last_len = bytes.len();
        if quality == MIN_QUALITY {
            break;
        }
        quality = quality.saturating_sub(QUALITY_STEP).max(MIN_QUALITY);
    }

    let mut current = image.clone();
    while current.width().min(current.height()) * 3 / 4 >= MIN_EDGE {
        let width = current.width() * 3 / 4;
        let height = current.height() * 3 / 4;
        current = current.resize(width, height, FilterType::Triangle);

        let bytes = encode(&current, MIN_QUALITY)?;
        if bytes.len() <= max_bytes {
            log::debug!(
                "transport: slide downscaled to {}x{} ({} bytes)",
                current.width(),
                current.height(),
                bytes.len()
            );
            return Ok(bytes);
        }
        last_len = bytes.len();
    }

    Err(TransportError::Oversized {
        len: last_len,
        max: max_bytes,
    })
}

/// Load a slide file and fit it.
pub fn load_for_datagram(path: &Path, quality: u8, max_bytes: usize) -> Result<Vec<u8>, TransportError> {
    let image = image::open(path).map_err(|e| TransportError::Encode(format!("{}: {e}", path.display())))?;
    fit_datagram(&image, quality, max_bytes)
}

//! Checks applied to an inbound artifact before it reaches the session.

use std::path::Path;

use image::imageops::FilterType;
use thiserror::Error;

const UNSAFE_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];
const MAX_NAME_CHARS: usize = 100;

#[derive(Debug, Error)]
pub enum IngestError {
    /// Only png, jpg, jpeg and pdf are accepted.
    #[error("unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("file is {size} bytes, limit is {max}")]
    TooLarge { size: u64, max: u64 },

    #[error("not a readable image: {0}")]
    Undecodable(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Replace path-unsafe characters with `_` and cap the length.
///
/// ```
/// use vr_sensei::ingest::clean_filename;
///
/// assert_eq!(clean_filename("宿題:1/2?.png"), "宿題_1_2_.png");
/// ```
pub fn clean_filename(name: &str) -> String {
    name.chars()
        .map(|c| if UNSAFE_CHARS.contains(&c) { '_' } else { c })
        .take(MAX_NAME_CHARS)
        .collect()
}

pub fn check_size(size: u64, max: u64) -> Result<(), IngestError> {
    if size > max {
        return Err(IngestError::TooLarge { size, max });
    }
    Ok(())
}

/// Decode the image at `path` and shrink it in place to fit
/// `max_width`×`max_height`, keeping the aspect ratio.
///
/// Returns whether the file was rewritten.  Blocking.
pub fn prepare_image(path: &Path, max_width: u32, max_height: u32) -> Result<bool, IngestError> {
    let image = image::open(path).map_err(|e| IngestError::Undecodable(e.to_string()))?;
    if image.width() <= max_width && image.height() <= max_height {
        return Ok(false);
    }

    let resized = image.resize(max_width, max_height, FilterType::Triangle);
    // JPEG has no alpha channel.
    let resized = match image::ImageFormat::from_path(path) {
        Ok(image::ImageFormat::Jpeg) => image::DynamicImage::ImageRgb8(resized.to_rgb8()),
        _ => resized,
    };
    resized
        .save(path)
        .map_err(|e| IngestError::Undecodable(e.to_string()))?;
    log::debug!(
        "ingest: resized {}x{} → {}x{}",
        image.width(),
        image.height(),
        resized.width(),
        resized.height()
    );
    Ok(true)
}

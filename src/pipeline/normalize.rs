//! Image normalisation: any supported photo → upright, bounded JPEG.
//!
//! Every photo leaves this stage in the same shape, whatever the phone
//! produced: EXIF orientation baked into the pixels, longest side at most
//! `max_side`, re-encoded as baseline JPEG with no metadata. Storage,
//! thumbnails and the inference request can then all assume one format.
//!
//! Decoding and resampling are CPU-bound; [`normalize_all`] runs each image
//! on the blocking pool and keeps the results in upload order.

use crate::error::ScanError;
use futures::future::try_join_all;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, ImageReader};
use std::io::Cursor;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// A photo after normalisation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedImage {
    /// Baseline JPEG bytes.
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Why a single image could not be normalised.
#[derive(Debug, Error)]
pub enum NormalizeError {
    /// HEIC/HEIF container; no codec for it is linked in.
    #[error("HEIC/HEIF photos are not supported; convert to JPEG before upload")]
    HeifUnsupported,

    #[error("could not decode image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("could not encode JPEG: {0}")]
    Encode(#[source] image::ImageError),
}

/// Dimensions after bounding the longest side to `max_side`.
///
/// Images already within bounds keep their size; larger ones are scaled by
/// `min(max_side / w, max_side / h)` and rounded to whole pixels.
pub fn target_dimensions(width: u32, height: u32, max_side: u32) -> (u32, u32) {
    if width <= max_side && height <= max_side {
        return (width, height);
    }
    let scale = f64::min(
        max_side as f64 / width as f64,
        max_side as f64 / height as f64,
    );
    let w = ((width as f64 * scale).round() as u32).max(1);
    let h = ((height as f64 * scale).round() as u32).max(1);
    (w, h)
}

/// ISO-BMFF `ftyp` brands used by HEIC/HEIF/AVIF-style containers.
fn is_heif(raw: &[u8]) -> bool {
    if raw.len() < 12 || &raw[4..8] != b"ftyp" {
        return false;
    }
    matches!(
        &raw[8..12],
        b"heic" | b"heix" | b"hevc" | b"hevx" | b"heim" | b"heis" | b"mif1" | b"msf1"
    )
}

fn decode_upright(raw: &[u8]) -> Result<DynamicImage, NormalizeError> {
    let reader = ImageReader::new(Cursor::new(raw))
        .with_guessed_format()
        .map_err(|e| NormalizeError::Decode(image::ImageError::IoError(e)))?;
    let mut decoder = reader.into_decoder().map_err(NormalizeError::Decode)?;
    let orientation = decoder.orientation().unwrap_or(Orientation::NoTransforms);
    let mut img = DynamicImage::from_decoder(decoder).map_err(NormalizeError::Decode)?;
    img.apply_orientation(orientation);
    Ok(img)
}

/// Normalise one raw upload.
///
/// Steps: decode, apply EXIF orientation, bound to `max_side` (Lanczos3),
/// convert to 8-bit RGB and encode as JPEG at `quality`. The encoder never
/// writes EXIF, so no orientation tag survives.
pub fn normalize_image(
    raw: &[u8],
    max_side: u32,
    quality: u8,
) -> Result<NormalizedImage, NormalizeError> {
    if is_heif(raw) {
        return Err(NormalizeError::HeifUnsupported);
    }

    let img = decode_upright(raw)?;
    let (w, h) = target_dimensions(img.width(), img.height(), max_side);
    let img = if (w, h) == (img.width(), img.height()) {
        img
    } else {
        img.resize_exact(w, h, FilterType::Lanczos3)
    };

    // JPEG has no alpha channel; flatten to RGB8.
    let rgb = img.to_rgb8();
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, quality)
        .encode_image(&rgb)
        .map_err(NormalizeError::Encode)?;

    debug!("Normalised image → {}x{} px, {} bytes", w, h, bytes.len());
    Ok(NormalizedImage {
        bytes,
        width: w,
        height: h,
    })
}

/// Normalise every upload concurrently, preserving input order.
///
/// The first failure aborts the batch with [`ScanError::UnsupportedFormat`]
/// carrying that image's index.
pub async fn normalize_all(
    files: Vec<Vec<u8>>,
    max_side: u32,
    quality: u8,
    progress: Option<crate::progress::ProgressCallback>,
) -> Result<Vec<NormalizedImage>, ScanError> {
    let total = files.len();
    let tasks = files.into_iter().enumerate().map(|(index, raw)| {
        let progress = progress.as_ref().map(Arc::clone);
        async move {
            let result =
                tokio::task::spawn_blocking(move || normalize_image(&raw, max_side, quality))
                    .await
                    .map_err(|e| ScanError::Internal(format!("Normalise task panicked: {e}")))?;
            let image = result.map_err(|e| ScanError::UnsupportedFormat {
                index,
                detail: e.to_string(),
            })?;
            if let Some(cb) = progress {
                cb.on_image_normalized(index, total, image.bytes.len());
            }
            Ok::<_, ScanError>(image)
        }
    });
    try_join_all(tasks).await
}

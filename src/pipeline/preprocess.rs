//! Image preprocessing: decode → bound width → JPEG → base64.
//!
//! Phone photos of passports are routinely 4000 px wide and several MB.
//! Downscaling to `max_width` and re-encoding as JPEG caps upload size and
//! request latency while keeping the MRZ readable. Height follows width so
//! the aspect ratio is preserved; images already within bounds keep their
//! dimensions but are still re-encoded so every upload has the same format.

use crate::error::ExtractionError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;
use tracing::debug;

/// MIME type of every preprocessed image.
pub const OUTPUT_MIME: &str = "image/jpeg";

/// An image ready to be inlined in a model request.
#[derive(Debug, Clone)]
pub struct PreparedImage {
    /// Original file name, unchanged.
    pub file_name: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl PreparedImage {
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }
}

/// Target dimensions for an image of `width × height` under `max_width`.
pub fn target_dimensions(width: u32, height: u32, max_width: u32) -> (u32, u32) {
    if width <= max_width || width == 0 {
        return (width, height);
    }
    let scaled = (height as f64 * max_width as f64 / width as f64).round() as u32;
    (max_width, scaled.max(1))
}

/// Decode, downscale and re-encode an image.
///
/// # Errors
/// [`ExtractionError::DecodeFailed`] when the bytes are not a supported
/// image; [`ExtractionError::EncodeFailed`] if JPEG encoding fails.
pub fn preprocess(
    bytes: &[u8],
    file_name: &str,
    max_width: u32,
    quality: u8,
) -> Result<PreparedImage, ExtractionError> {
    let img = image::load_from_memory(bytes).map_err(|e| ExtractionError::DecodeFailed {
        detail: e.to_string(),
    })?;

    let (w, h) = target_dimensions(img.width(), img.height(), max_width);
    let img = if (w, h) != (img.width(), img.height()) {
        img.resize_exact(w, h, FilterType::Triangle)
    } else {
        img
    };

    // JPEG has no alpha channel.
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    let mut out = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut out, quality);
    rgb.write_with_encoder(encoder)
        .map_err(|e| ExtractionError::EncodeFailed {
            detail: e.to_string(),
        })?;

    debug!(
        "Preprocessed {}: {:.2} KB → {:.2} KB ({}x{})",
        file_name,
        bytes.len() as f64 / 1024.0,
        out.len() as f64 / 1024.0,
        w,
        h
    );

    Ok(PreparedImage {
        file_name: file_name.to_string(),
        mime_type: OUTPUT_MIME,
        bytes: out,
        width: w,
        height: h,
    })
}

/// [`preprocess`] on the blocking thread pool; decoding a 12 MP photo is
/// CPU-bound and would otherwise stall the async worker.
pub async fn preprocess_async(
    bytes: Vec<u8>,
    file_name: String,
    max_width: u32,
    quality: u8,
) -> Result<PreparedImage, ExtractionError> {
    tokio::task::spawn_blocking(move || preprocess(&bytes, &file_name, max_width, quality))
        .await
        .map_err(|e| ExtractionError::DecodeFailed {
            detail: format!("preprocess task panicked: {e}"),
        })?
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use std::io::Cursor;

    fn png_bytes(w: u32, h: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(w, h, Rgba([10, 20, 30, 128])));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn target_dimensions_preserve_aspect() {
        assert_eq!(target_dimensions(3072, 2048, 1536), (1536, 1024));
        assert_eq!(target_dimensions(1000, 700, 1536), (1000, 700));
        assert_eq!(target_dimensions(1536, 10, 1536), (1536, 10));
        assert_eq!(target_dimensions(5000, 1, 1536), (1536, 1));
    }

    #[test]
    fn wide_image_is_downscaled_to_max_width() {
        let out = preprocess(&png_bytes(3000, 1000), "wide.png", 1536, 90).unwrap();
        assert_eq!((out.width, out.height), (1536, 512));
        let decoded = image::load_from_memory(&out.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (1536, 512));
        assert_eq!(
            image::guess_format(&out.bytes).unwrap(),
            image::ImageFormat::Jpeg
        );
    }

    #[test]
    fn small_image_keeps_size_but_becomes_jpeg() {
        let out = preprocess(&png_bytes(40, 30), "small.png", 1536, 90).unwrap();
        assert_eq!((out.width, out.height), (40, 30));
        assert_eq!(out.mime_type, "image/jpeg");
        assert_eq!(out.file_name, "small.png");
    }

    #[test]
    fn garbage_is_decode_error() {
        let err = preprocess(b"definitely not an image", "x.jpg", 1536, 90).unwrap_err();
        assert!(matches!(err, ExtractionError::DecodeFailed { .. }));
    }

    #[test]
    fn base64_round_trips() {
        let out = preprocess(&png_bytes(8, 8), "t.png", 1536, 90).unwrap();
        let decoded = STANDARD.decode(out.to_base64()).unwrap();
        assert_eq!(decoded, out.bytes);
    }

    #[tokio::test]
    async fn async_variant_matches_sync() {
        let out = preprocess_async(png_bytes(2000, 100), "a.png".into(), 1000, 80)
            .await
            .unwrap();
        assert_eq!((out.width, out.height), (1000, 50));
    }
}

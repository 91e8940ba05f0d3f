//! Raster image recompression and modern-format conversion

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::codecs::webp::WebPEncoder;
use image::{DynamicImage, ImageFormat};
use ravif::{Encoder, Img, RGBA8};

use super::TransformError;
use crate::config::PngCompression;

/// Raster formats the image tasks can decode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RasterKind {
    Jpeg,
    Png,
}

impl RasterKind {
    /// Determine the raster kind from a file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            _ => None,
        }
    }

    fn format(self) -> ImageFormat {
        match self {
            Self::Jpeg => ImageFormat::Jpeg,
            Self::Png => ImageFormat::Png,
        }
    }
}

fn decode(bytes: &[u8], kind: RasterKind) -> Result<DynamicImage, TransformError> {
    Ok(image::load_from_memory_with_format(bytes, kind.format())?)
}

/// Re-encode a JPEG at `quality`
pub fn recompress_jpeg(bytes: &[u8], quality: u8) -> Result<Vec<u8>, TransformError> {
    let img = decode(bytes, RasterKind::Jpeg)?;
    let mut out = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut out, quality);
    DynamicImage::ImageRgb8(img.to_rgb8()).write_with_encoder(encoder)?;
    Ok(out)
}

/// Re-encode a PNG losslessly with the given deflate effort
pub fn recompress_png(bytes: &[u8], level: PngCompression) -> Result<Vec<u8>, TransformError> {
    let img = decode(bytes, RasterKind::Png)?;
    let compression = match level {
        PngCompression::Fast => CompressionType::Fast,
        PngCompression::Default => CompressionType::Default,
        PngCompression::Best => CompressionType::Best,
    };
    let mut out = Vec::new();
    let encoder = PngEncoder::new_with_quality(&mut out, compression, FilterType::Adaptive);
    img.write_with_encoder(encoder)?;
    Ok(out)
}

/// Recompress and keep whichever of the original and re-encoded bytes is
/// smaller
pub fn optimize(
    bytes: &[u8],
    kind: RasterKind,
    jpeg_quality: u8,
    png_level: PngCompression,
) -> Result<Vec<u8>, TransformError> {
    let encoded = match kind {
        RasterKind::Jpeg => recompress_jpeg(bytes, jpeg_quality)?,
        RasterKind::Png => recompress_png(bytes, png_level)?,
    };

    if encoded.len() < bytes.len() {
        Ok(encoded)
    } else {
        Ok(bytes.to_vec())
    }
}

/// Convert to lossless WebP
pub fn to_webp(bytes: &[u8], kind: RasterKind) -> Result<Vec<u8>, TransformError> {
    let img = decode(bytes, kind)?;
    let mut out = Vec::new();
    let encoder = WebPEncoder::new_lossless(&mut out);
    DynamicImage::ImageRgba8(img.to_rgba8()).write_with_encoder(encoder)?;
    Ok(out)
}

/// Convert to AVIF
pub fn to_avif(
    bytes: &[u8],
    kind: RasterKind,
    quality: f32,
    speed: u8,
) -> Result<Vec<u8>, TransformError> {
    let rgba = decode(bytes, kind)?.to_rgba8();
    let (width, height) = rgba.dimensions();
    let pixels: Vec<RGBA8> = rgba
        .pixels()
        .map(|p| RGBA8::new(p[0], p[1], p[2], p[3]))
        .collect();

    let encoded = Encoder::new()
        .with_quality(quality)
        .with_speed(speed)
        .encode_rgba(Img::new(pixels.as_slice(), width as usize, height as usize))
        .map_err(|e| TransformError::Avif(e.to_string()))?;

    Ok(encoded.avif_file)
}

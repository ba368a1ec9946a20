//! Lead-image download and sharpening.
//!
//! Sharpening blends the image with a smoothed copy of itself:
//!
//! ```text
//! out = smooth + factor * (orig - smooth)      clamped to 0..=255
//! ```
//!
//! `smooth` is a 3x3 convolution with kernel `[1 1 1; 1 5 1; 1 1 1] / 13`.
//! The outermost row and column are copied unfiltered, so the image border
//! never changes. A factor of 1.0 returns the original, larger factors
//! exaggerate edges. The result is always re-encoded as an RGB JPEG.

use crate::error::PipelineError;
use crate::utils::ensure_success;
use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;
use reqwest::Client;
use tracing::{debug, info, instrument};

const SMOOTH_KERNEL: [[u32; 3]; 3] = [[1, 1, 1], [1, 5, 1], [1, 1, 1]];
const SMOOTH_SCALE: u32 = 13;

/// Download the raw bytes of an image.
#[instrument(level = "info", skip(client))]
pub async fn download_image(client: &Client, url: &str) -> Result<Vec<u8>, PipelineError> {
    let response = client.get(url).send().await?;
    let bytes = ensure_success("image source", response).await?.bytes().await?;
    debug!(bytes = bytes.len(), "Downloaded image");
    Ok(bytes.to_vec())
}

/// Decode `bytes`, sharpen by `factor` and re-encode as JPEG.
///
/// # Errors
///
/// [`PipelineError::Decode`] when the bytes are not a supported image,
/// [`PipelineError::Encode`] if JPEG encoding fails.
#[instrument(level = "info", skip(bytes), fields(input_bytes = bytes.len()))]
pub fn enhance(bytes: &[u8], factor: f32, jpeg_quality: u8) -> Result<Vec<u8>, PipelineError> {
    let image = image::load_from_memory(bytes).map_err(PipelineError::Decode)?;
    let sharpened = sharpen(&image.to_rgb8(), factor);

    let mut jpeg = Vec::new();
    sharpened
        .write_with_encoder(JpegEncoder::new_with_quality(&mut jpeg, jpeg_quality))
        .map_err(PipelineError::Encode)?;

    info!(
        width = sharpened.width(),
        height = sharpened.height(),
        output_bytes = jpeg.len(),
        "Enhanced image"
    );
    Ok(jpeg)
}

/// Apply the sharpness blend to an RGB image.
pub fn sharpen(image: &RgbImage, factor: f32) -> RgbImage {
    let smooth = smooth(image);
    let mut out = RgbImage::new(image.width(), image.height());
    for (x, y, px) in out.enumerate_pixels_mut() {
        let orig = image.get_pixel(x, y);
        let soft = smooth.get_pixel(x, y);
        for c in 0..3 {
            px.0[c] = blend(soft.0[c], orig.0[c], factor);
        }
    }
    out
}

fn blend(degenerate: u8, original: u8, factor: f32) -> u8 {
    let v = f32::from(degenerate) + factor * (f32::from(original) - f32::from(degenerate));
    v.clamp(0.0, 255.0) as u8
}

fn smooth(image: &RgbImage) -> RgbImage {
    let (w, h) = image.dimensions();
    let mut out = image.clone();
    if w < 3 || h < 3 {
        return out;
    }
    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let mut sums = [0u32; 3];
            for (ky, row) in SMOOTH_KERNEL.iter().enumerate() {
                for (kx, weight) in row.iter().enumerate() {
                    let p = image.get_pixel(x + kx as u32 - 1, y + ky as u32 - 1);
                    for c in 0..3 {
                        sums[c] += weight * u32::from(p.0[c]);
                    }
                }
            }
            let px = out.get_pixel_mut(x, y);
            for c in 0..3 {
                // round half up
                px.0[c] = ((sums[c] * 2 + SMOOTH_SCALE) / (SMOOTH_SCALE * 2)) as u8;
            }
        }
    }
    out
}

use image::ImageFormat;

use crate::decode::domain::jpeg_decoder::{DecodeError, JpegDecoder};
use crate::shared::constants::SOI_MARKER;
use crate::shared::pixel_format::rgb888_to_rgb565;

/// Baseline/progressive JPEG decoding through the `image` crate.
pub struct ImageJpegDecoder;

impl JpegDecoder for ImageJpegDecoder {
    fn decode_into(&mut self, jpeg: &[u8], pixels: &mut Vec<u16>) -> Result<(u32, u32), DecodeError> {
        if jpeg.is_empty() {
            return Err(DecodeError::Empty);
        }
        if !jpeg.starts_with(&SOI_MARKER) {
            return Err(DecodeError::InvalidMarker);
        }
        let image = image::load_from_memory_with_format(jpeg, ImageFormat::Jpeg)
            .map_err(|e| DecodeError::Backend(Box::new(e)))?;
        let rgb = image.into_rgb8();
        let (width, height) = rgb.dimensions();

        pixels.clear();
        pixels.reserve(width as usize * height as usize);
        pixels.extend(rgb.pixels().map(|p| rgb888_to_rgb565(p[0], p[1], p[2])));
        Ok((width, height))
    }
}

#[cfg(test)]
pub(crate) fn encode_test_jpeg(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
    use image::codecs::jpeg::JpegEncoder;
    use image::{Rgb, RgbImage};

    let img = RgbImage::from_pixel(width, height, Rgb(rgb));
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, 95)
        .encode_image(&img)
        .unwrap();
    out
}

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConversionError {
    #[error("unknown pixel format: {0} (expected passthrough, rgb888 or grayscale)")]
    UnknownFormat(String),
}

/// Output layout for a decoded RGB565 frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelFormat {
    /// RGB565, two little-endian bytes per pixel.
    #[default]
    Passthrough,
    Rgb888,
    Grayscale,
}

impl PixelFormat {
    pub const ALL: &[PixelFormat] = &[
        PixelFormat::Passthrough,
        PixelFormat::Rgb888,
        PixelFormat::Grayscale,
    ];

    pub fn from_name(name: &str) -> Result<Self, ConversionError> {
        match name.to_ascii_lowercase().as_str() {
            "passthrough" | "rgb565" => Ok(PixelFormat::Passthrough),
            "rgb888" | "rgb" => Ok(PixelFormat::Rgb888),
            "grayscale" | "gray" | "grey" => Ok(PixelFormat::Grayscale),
            _ => Err(ConversionError::UnknownFormat(name.to_string())),
        }
    }

    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Passthrough => 2,
            PixelFormat::Rgb888 => 3,
            PixelFormat::Grayscale => 1,
        }
    }

    pub fn convert(self, pixels: &[u16]) -> Vec<u8> {
        let mut out = Vec::with_capacity(pixels.len() * self.bytes_per_pixel());
        match self {
            PixelFormat::Passthrough => {
                for &p in pixels {
                    out.extend_from_slice(&p.to_le_bytes());
                }
            }
            PixelFormat::Rgb888 => {
                for &p in pixels {
                    out.extend_from_slice(&rgb565_to_rgb888(p));
                }
            }
            PixelFormat::Grayscale => out.extend(pixels.iter().map(|&p| rgb565_to_gray(p))),
        }
        out
    }
}

impl std::fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PixelFormat::Passthrough => write!(f, "passthrough"),
            PixelFormat::Rgb888 => write!(f, "rgb888"),
            PixelFormat::Grayscale => write!(f, "grayscale"),
        }
    }
}

/// Converts by format name; the only failure is an unknown name.
pub fn convert(pixels: &[u16], format: &str) -> Result<Vec<u8>, ConversionError> {
    Ok(PixelFormat::from_name(format)?.convert(pixels))
}

/// Expands each channel to 8 bits by shifting (low bits stay zero).
pub fn rgb565_to_rgb888(pixel: u16) -> [u8; 3] {
    let r = ((pixel >> 11) & 0x1F) as u8;
    let g = ((pixel >> 5) & 0x3F) as u8;
    let b = (pixel & 0x1F) as u8;
    [r << 3, g << 2, b << 3]
}

pub fn rgb888_to_rgb565(r: u8, g: u8, b: u8) -> u16 {
    ((r as u16 & 0xF8) << 8) | ((g as u16 & 0xFC) << 3) | (b as u16 >> 3)
}

/// Luma 0.30R + 0.59G + 0.11B over the expanded channels, rounded to nearest.
pub fn rgb565_to_gray(pixel: u16) -> u8 {
    let [r, g, b] = rgb565_to_rgb888(pixel);
    ((r as u32 * 30 + g as u32 * 59 + b as u32 * 11 + 50) / 100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::red(0xF800, [248, 0, 0])]
    #[case::green(0x07E0, [0, 252, 0])]
    #[case::blue(0x001F, [0, 0, 248])]
    #[case::white(0xFFFF, [248, 252, 248])]
    #[case::black(0x0000, [0, 0, 0])]
    fn test_rgb565_to_rgb888(#[case] pixel: u16, #[case] expected: [u8; 3]) {
        assert_eq!(rgb565_to_rgb888(pixel), expected);
    }

    #[rstest]
    #[case::red(0xF800, 74)]
    #[case::green(0x07E0, 149)]
    #[case::blue(0x001F, 27)]
    #[case::white(0xFFFF, 250)]
    #[case::black(0x0000, 0)]
    fn test_rgb565_to_gray(#[case] pixel: u16, #[case] expected: u8) {
        assert_eq!(rgb565_to_gray(pixel), expected);
    }

    #[test]
    fn test_rgb888_to_rgb565_inverts_expansion() {
        assert_eq!(rgb888_to_rgb565(248, 0, 0), 0xF800);
        assert_eq!(rgb888_to_rgb565(255, 255, 255), 0xFFFF);
    }

    #[test]
    fn test_convert_lengths_follow_bytes_per_pixel() {
        let pixels = [0xF800u16, 0x07E0, 0x001F];
        for &format in PixelFormat::ALL {
            assert_eq!(format.convert(&pixels).len(), 3 * format.bytes_per_pixel());
        }
    }

    #[test]
    fn test_passthrough_is_little_endian() {
        assert_eq!(PixelFormat::Passthrough.convert(&[0xF800]), vec![0x00, 0xF8]);
    }

    #[test]
    fn test_convert_by_name() {
        assert_eq!(convert(&[0xF800], "grayscale").unwrap(), vec![74]);
        assert_eq!(convert(&[0xF800], "RGB888").unwrap(), vec![248, 0, 0]);
    }

    #[test]
    fn test_unknown_format_name_is_error() {
        assert_eq!(
            convert(&[0xF800], "cmyk"),
            Err(ConversionError::UnknownFormat("cmyk".to_string()))
        );
    }

    #[test]
    fn test_display_round_trips_through_from_name() {
        for &format in PixelFormat::ALL {
            assert_eq!(PixelFormat::from_name(&format.to_string()).unwrap(), format);
        }
    }
}

use std::io::Cursor;

use image::{DynamicImage, GrayAlphaImage, ImageFormat, LumaA};

const CONTRAST: f32 = 1.5;

/// Grayscale and contrast-stretch an encoded image, returning PNG bytes.
///
/// Gray uses the Rec. 601 luma weights; contrast is `1.5 * (g - 128) + 128`
/// clamped to `0..=255`. Alpha is preserved.
pub fn preprocess_image(data: &[u8]) -> Result<Vec<u8>, String> {
    let decoded =
        image::load_from_memory(data).map_err(|e| format!("Failed to decode image: {}", e))?;
    let rgba = decoded.to_rgba8();

    let mut out = GrayAlphaImage::new(rgba.width(), rgba.height());
    for (x, y, pixel) in rgba.enumerate_pixels() {
        let [r, g, b, a] = pixel.0;
        out.put_pixel(x, y, LumaA([enhance(r, g, b), a]));
    }

    let mut buf = Vec::new();
    DynamicImage::ImageLumaA8(out)
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .map_err(|e| format!("Failed to encode image: {}", e))?;
    Ok(buf)
}

fn enhance(r: u8, g: u8, b: u8) -> u8 {
    let gray = 0.299 * f32::from(r) + 0.587 * f32::from(g) + 0.114 * f32::from(b);
    (CONTRAST * (gray - 128.0) + 128.0).clamp(0.0, 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn png(pixels: &[[u8; 4]]) -> Vec<u8> {
        let mut img = RgbaImage::new(pixels.len() as u32, 1);
        for (x, p) in pixels.iter().enumerate() {
            img.put_pixel(x as u32, 0, Rgba(*p));
        }
        let mut buf = Vec::new();
        DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn grayscale_then_contrast() {
        assert_eq!(enhance(128, 128, 128), 128);
        assert_eq!(enhance(255, 255, 255), 255);
        assert_eq!(enhance(0, 0, 0), 0);
        // 0.299 * 200 = 59.8 -> 1.5 * (59.8 - 128) + 128 = 25.7
        assert_eq!(enhance(200, 0, 0), 26);
    }

    #[test]
    fn output_is_gray_png_with_alpha_kept() {
        let input = png(&[[255, 0, 0, 255], [10, 200, 30, 77]]);
        let output = preprocess_image(&input).unwrap();
        let decoded = image::load_from_memory_with_format(&output, ImageFormat::Png)
            .unwrap()
            .to_luma_alpha8();
        assert_eq!(decoded.dimensions(), (2, 1));
        assert_eq!(decoded.get_pixel(0, 0).0, [enhance(255, 0, 0), 255]);
        assert_eq!(decoded.get_pixel(1, 0).0, [enhance(10, 200, 30), 77]);
    }

    #[test]
    fn undecodable_input_is_an_error() {
        assert!(preprocess_image(b"not an image").is_err());
    }
}

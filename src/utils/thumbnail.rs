use image::ImageFormat;
use std::io::Cursor;

use crate::error::AppError;

pub const THUMBNAIL_MAX_DIM: u32 = 512;

/// Bounded-dimension JPEG preview derived from raw image bytes.
///
/// Callers treat any error here as "no thumbnail": the gallery falls back to
/// the original key, so this stays best-effort.
pub fn make_thumbnail(data: &[u8]) -> Result<Vec<u8>, AppError> {
    let img = image::load_from_memory(data)
        .map_err(|e| AppError::InternalServerError(format!("Failed to load image: {}", e)))?;

    // thumbnail() fits within the box preserving aspect ratio; JPEG has no
    // alpha channel, so flatten to RGB first.
    let thumb = image::DynamicImage::ImageRgb8(
        img.thumbnail(THUMBNAIL_MAX_DIM, THUMBNAIL_MAX_DIM).to_rgb8(),
    );

    let mut buffer = Cursor::new(Vec::new());
    thumb
        .write_to(&mut buffer, ImageFormat::Jpeg)
        .map_err(|e| AppError::InternalServerError(format!("Failed to encode thumbnail: {}", e)))?;

    Ok(buffer.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_fixture(width: u32, height: u32) -> Vec<u8> {
        let img = image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
            width,
            height,
            image::Rgb([180, 40, 90]),
        ));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    #[test]
    fn thumbnail_is_jpeg_and_bounded() {
        let thumb = make_thumbnail(&png_fixture(1600, 900)).unwrap();
        let decoded = image::load_from_memory(&thumb).unwrap();
        assert!(decoded.width() <= THUMBNAIL_MAX_DIM);
        assert!(decoded.height() <= THUMBNAIL_MAX_DIM);
        assert_eq!(image::guess_format(&thumb).unwrap(), ImageFormat::Jpeg);
    }

    #[test]
    fn non_image_bytes_are_rejected() {
        assert!(make_thumbnail(b"definitely not an image").is_err());
    }
}

use crate::error::AnalysisError;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, GenericImageView};
use std::io::Cursor;
use std::path::Path;

/// Formats the vision API accepts as inline data.
const ACCEPTED_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/webp",
    "image/heic",
    "image/heif",
];

/// Raw payload ceiling; base64 adds a third on top and requests are capped at 20 MB.
pub const MAX_INLINE_BYTES: usize = 14 * 1024 * 1024;

/// Longest edge of a re-encoded image.
pub const MAX_DIMENSION: u32 = 2048;

const JPEG_QUALITY: u8 = 85;

/// Image bytes ready to be sent inline.
#[derive(Debug)]
pub struct Upload {
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Passes accepted formats through untouched and converts everything else
/// (GIF, BMP, TIFF, oversized files) to a JPEG no larger than
/// [`MAX_DIMENSION`] on its longest edge.
///
/// CPU bound; call from a blocking context.
pub fn prepare(path: &Path, mime_type: &'static str, bytes: Vec<u8>) -> Result<Upload, AnalysisError> {
    if ACCEPTED_MIME_TYPES.contains(&mime_type) && bytes.len() <= MAX_INLINE_BYTES {
        return Ok(Upload { mime_type, bytes });
    }

    log::debug!(
        "Converting {:?} ({}, {} bytes) to JPEG for upload",
        path,
        mime_type,
        bytes.len()
    );

    let image = image::load_from_memory(&bytes).map_err(|e| AnalysisError::InvalidInput {
        path: path.to_path_buf(),
        reason: format!("cannot decode {}: {}", mime_type, e),
    })?;

    let (width, height) = image.dimensions();
    let image = if width > MAX_DIMENSION || height > MAX_DIMENSION {
        image.thumbnail(MAX_DIMENSION, MAX_DIMENSION)
    } else {
        image
    };

    let bytes = encode_jpeg(&image, JPEG_QUALITY).map_err(|e| AnalysisError::InvalidInput {
        path: path.to_path_buf(),
        reason: format!("cannot encode JPEG: {}", e),
    })?;

    if bytes.len() > MAX_INLINE_BYTES {
        return Err(AnalysisError::InvalidInput {
            path: path.to_path_buf(),
            reason: format!("image too large to upload ({} bytes)", bytes.len()),
        });
    }

    Ok(Upload {
        mime_type: "image/jpeg",
        bytes,
    })
}

fn encode_jpeg(image: &DynamicImage, quality: u8) -> image::ImageResult<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    image
        .to_rgb8()
        .write_with_encoder(JpegEncoder::new_with_quality(&mut buffer, quality))?;
    Ok(buffer.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, RgbImage};

    fn encoded(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, image::Rgb([200, 40, 10])));
        let mut buffer = Cursor::new(Vec::new());
        image.write_to(&mut buffer, format).unwrap();
        buffer.into_inner()
    }

    #[test]
    fn test_bmp_converted_to_jpeg() {
        let bmp = encoded(8, 6, ImageFormat::Bmp);

        let upload = prepare(Path::new("scan.bmp"), "image/bmp", bmp).unwrap();

        assert_eq!(upload.mime_type, "image/jpeg");
        assert_eq!(&upload.bytes[..2], &[0xFF, 0xD8]);
        let decoded = image::load_from_memory(&upload.bytes).unwrap();
        assert_eq!(decoded.dimensions(), (8, 6));
    }

    #[test]
    fn test_gif_and_tiff_converted() {
        for (format, mime_type) in [
            (ImageFormat::Gif, "image/gif"),
            (ImageFormat::Tiff, "image/tiff"),
        ] {
            let upload = prepare(Path::new("frame"), mime_type, encoded(4, 4, format)).unwrap();
            assert_eq!(upload.mime_type, "image/jpeg");
        }
    }

    #[test]
    fn test_large_image_downscaled() {
        let bmp = encoded(4096, 16, ImageFormat::Bmp);

        let upload = prepare(Path::new("panorama.bmp"), "image/bmp", bmp).unwrap();

        let decoded = image::load_from_memory(&upload.bytes).unwrap();
        assert_eq!(decoded.width(), MAX_DIMENSION);
        assert!(decoded.height() <= 8);
    }

    #[test]
    fn test_accepted_format_passes_through() {
        let png = encoded(3, 3, ImageFormat::Png);

        let upload = prepare(Path::new("a.png"), "image/png", png.clone()).unwrap();

        assert_eq!(upload.mime_type, "image/png");
        assert_eq!(upload.bytes, png);
    }

    #[test]
    fn test_undecodable_bytes_are_invalid_input() {
        let err = prepare(Path::new("broken.gif"), "image/gif", b"GIF89a garbage".to_vec()).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidInput { .. }));
    }
}

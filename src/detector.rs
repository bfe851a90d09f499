use std::path::Path;

pub struct ImageDetector;

impl ImageDetector {
    /// Returns the image MIME type of `bytes`, or `None` if they are not an
    /// image. Magic bytes win; the extension is only consulted when the
    /// content is unrecognised.
    pub fn detect_mime(path: &Path, bytes: &[u8]) -> Option<&'static str> {
        if let Some(kind) = infer::get(bytes) {
            if kind.matcher_type() == infer::MatcherType::Image {
                log::debug!("MIME {} for {:?}", kind.mime_type(), path);
                return Some(kind.mime_type());
            }
            log::warn!("{:?} is {} rather than an image", path, kind.mime_type());
            return None;
        }

        log::warn!("Could not detect image type by magic bytes, falling back to extension");
        Self::detect_by_extension(path)
    }

    fn detect_by_extension(path: &Path) -> Option<&'static str> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "jpg" | "jpeg" => Some("image/jpeg"),
            "png" => Some("image/png"),
            "gif" => Some("image/gif"),
            "webp" => Some("image/webp"),
            "bmp" => Some("image/bmp"),
            "tiff" | "tif" => Some("image/tiff"),
            "heic" => Some("image/heic"),
            "heif" => Some("image/heif"),
            _ => None,
        }
    }
}

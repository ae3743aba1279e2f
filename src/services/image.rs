use base64::{Engine, engine::general_purpose::STANDARD};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::{info, warn};

/// Directory under the media root where recipe images are written.
const RECIPE_IMAGE_DIR: &str = "recipes/images";

const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp"];

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("{0}")]
    Invalid(String),

    #[error("Failed to store image: {0}")]
    Io(String),
}

/// Decoded `data:image/<ext>;base64,<payload>` upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub extension: String,
    pub bytes: Vec<u8>,
}

/// Parse and decode an inline image payload.
pub fn parse_data_uri(value: &str) -> Result<DecodedImage, ImageError> {
    let (header, payload) = value
        .split_once(";base64,")
        .ok_or_else(|| ImageError::Invalid("Image must be a base64 data URI".to_string()))?;

    let extension = header
        .strip_prefix("data:image/")
        .ok_or_else(|| ImageError::Invalid("Image must be a base64 data URI".to_string()))?
        .to_ascii_lowercase();

    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(ImageError::Invalid(format!(
            "Unsupported image type: {extension}"
        )));
    }

    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| ImageError::Invalid(format!("Invalid base64 image payload: {e}")))?;

    if bytes.is_empty() {
        return Err(ImageError::Invalid("Image payload is empty".to_string()));
    }

    Ok(DecodedImage { extension, bytes })
}

/// Stores uploaded recipe images below the configured media root.
pub struct ImageService {
    media_root: PathBuf,
}

impl ImageService {
    #[must_use]
    pub fn new(media_root: impl Into<PathBuf>) -> Self {
        Self {
            media_root: media_root.into(),
        }
    }

    #[must_use]
    pub fn media_root(&self) -> &Path {
        &self.media_root
    }

    /// Decode a data URI and write it to disk. Returns the path relative to
    /// the media root.
    pub async fn save_data_uri(&self, value: &str) -> Result<String, ImageError> {
        let image = parse_data_uri(value)?;

        let dir = self.media_root.join(RECIPE_IMAGE_DIR);
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| ImageError::Io(e.to_string()))?;

        let relative = format!(
            "{RECIPE_IMAGE_DIR}/{}.{}",
            uuid::Uuid::new_v4(),
            image.extension
        );
        let file_path = self.media_root.join(&relative);

        fs::write(&file_path, &image.bytes)
            .await
            .map_err(|e| ImageError::Io(format!("{}: {e}", file_path.display())))?;

        info!(path = %file_path.display(), bytes = image.bytes.len(), "Stored recipe image");

        Ok(relative)
    }

    /// Remove a previously stored image. Failures are logged, not returned.
    pub async fn remove(&self, relative: &str) {
        if relative.is_empty() {
            return;
        }

        let file_path = self.media_root.join(relative);
        if let Err(e) = fs::remove_file(&file_path).await {
            warn!(path = %file_path.display(), error = %e, "Failed to remove image");
        }
    }

    /// Public URL of a stored image.
    #[must_use]
    pub fn url_for(relative: &str) -> String {
        format!("/media/{relative}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 1x1 transparent PNG
    const PNG: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

    #[test]
    fn test_parse_data_uri() {
        let image = parse_data_uri(&format!("data:image/png;base64,{PNG}")).unwrap();
        assert_eq!(image.extension, "png");
        assert_eq!(&image.bytes[1..4], b"PNG");
    }

    #[test]
    fn test_parse_data_uri_rejects_bad_input() {
        assert!(parse_data_uri("not a data uri").is_err());
        assert!(parse_data_uri(&format!("data:text/plain;base64,{PNG}")).is_err());
        assert!(parse_data_uri(&format!("data:image/bmp;base64,{PNG}")).is_err());
        assert!(parse_data_uri("data:image/png;base64,@@@").is_err());
        assert!(parse_data_uri("data:image/png;base64,").is_err());
    }

    #[test]
    fn test_url_for() {
        assert_eq!(
            ImageService::url_for("recipes/images/a.png"),
            "/media/recipes/images/a.png"
        );
    }

    #[tokio::test]
    async fn test_save_and_remove() {
        let root = std::env::temp_dir().join(format!("foodgram-media-{}", uuid::Uuid::new_v4()));
        let service = ImageService::new(&root);

        let relative = service
            .save_data_uri(&format!("data:image/png;base64,{PNG}"))
            .await
            .unwrap();
        assert!(relative.starts_with("recipes/images/"));
        assert!(relative.ends_with(".png"));
        assert!(root.join(&relative).exists());

        service.remove(&relative).await;
        assert!(!root.join(&relative).exists());

        let _ = std::fs::remove_dir_all(root);
    }
}

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Photo of the affected zone, forwarded untouched to the narrative backend.
#[derive(Clone, Serialize, Deserialize)]
pub struct ImageUpload {
    #[serde(skip)]
    pub data: Vec<u8>,
    pub mime_type: String,
    /// Where the caller stored the image; only this is persisted.
    pub reference: Option<String>,
}

impl ImageUpload {
    pub fn new(data: Vec<u8>, mime_type: &str) -> Self {
        Self {
            data,
            mime_type: mime_type.to_string(),
            reference: None,
        }
    }

    pub fn with_reference(mut self, reference: &str) -> Self {
        self.reference = Some(reference.to_string());
        self
    }

    /// Read an image file, guessing its MIME type from the extension.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let data = std::fs::read(path)?;
        let mime = mime_guess::from_path(path).first_or_octet_stream();
        Ok(Self {
            data,
            mime_type: mime.essence_str().to_string(),
            reference: Some(path.display().to_string()),
        })
    }

    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }
}

impl std::fmt::Debug for ImageUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageUpload")
            .field("bytes", &self.data.len())
            .field("mime_type", &self.mime_type)
            .field("reference", &self.reference)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn from_path_guesses_mime_type() {
        let mut file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        file.write_all(b"\x89PNG fake").unwrap();

        let image = ImageUpload::from_path(file.path()).unwrap();
        assert_eq!(image.mime_type, "image/png");
        assert!(image.is_image());
        assert_eq!(image.data.len(), 9);
        assert!(image.reference.is_some());
    }

    #[test]
    fn unknown_extension_is_not_an_image() {
        let image = ImageUpload::new(vec![1, 2, 3], "application/octet-stream");
        assert!(!image.is_image());
    }

    #[test]
    fn debug_hides_bytes() {
        let image = ImageUpload::new(vec![0; 1024], "image/jpeg").with_reference("uploads/a.jpg");
        let debug = format!("{image:?}");
        assert!(debug.contains("1024"));
        assert!(debug.contains("uploads/a.jpg"));
    }
}

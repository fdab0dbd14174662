// Image payloads for product create/update requests. The file is read from
// disk and embedded in the JSON body as base64 together with its extension.

use crate::error::ImageError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Extensions the catalog server accepts for product images.
pub const SUPPORTED_EXTENSIONS: &[&str] =
    &[".jpeg", ".jpg", ".gif", ".bmp", ".png", ".webp", ".heif"];

/// `{"data": <base64>, "extension": ".jpg"}` as embedded in `requestData.image`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImagePayload {
    pub data: String,
    pub extension: String,
}

impl ImagePayload {
    /// Read `path` and encode it. The extension is lowercased and must be
    /// one of `SUPPORTED_EXTENSIONS`; it is checked before the file is read.
    pub fn from_file(path: &Path) -> Result<Self, ImageError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e.to_ascii_lowercase()))
            .ok_or_else(|| ImageError::NoExtension(path.to_path_buf()))?;
        if !SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(ImageError::UnsupportedExtension(extension));
        }

        let bytes = std::fs::read(path).map_err(|source| ImageError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(ImagePayload {
            data: STANDARD.encode(bytes),
            extension,
        })
    }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_home(input: &str) -> PathBuf {
    let trimmed = input.trim();
    if trimmed == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    } else if let Some(rest) = trimmed.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn encodes_file_contents_and_extension() {
        let mut file = tempfile::Builder::new().suffix(".JPG").tempfile().unwrap();
        file.write_all(b"hello").unwrap();

        let payload = ImagePayload::from_file(file.path()).unwrap();
        assert_eq!(payload.data, "aGVsbG8=");
        assert_eq!(payload.extension, ".jpg");
    }

    #[test]
    fn rejects_unknown_extension_before_reading() {
        let err = ImagePayload::from_file(Path::new("/definitely/not/here.tiff")).unwrap_err();
        assert!(matches!(err, ImageError::UnsupportedExtension(ext) if ext == ".tiff"));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = ImagePayload::from_file(Path::new("/definitely/not/here.png")).unwrap_err();
        assert!(matches!(err, ImageError::Read { .. }));
    }

    #[test]
    fn no_extension() {
        let err = ImagePayload::from_file(Path::new("picture")).unwrap_err();
        assert!(matches!(err, ImageError::NoExtension(_)));
    }

    #[test]
    fn plain_paths_are_untouched() {
        assert_eq!(expand_home(" /tmp/a.png "), PathBuf::from("/tmp/a.png"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home("~/a.png"), home.join("a.png"));
        }
    }
}

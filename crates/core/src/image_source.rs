//! Image references and byte resolution.
//!
//! The studio never cares where an image came from: an upload, a generated
//! picture or an existing product photo all arrive as an [`ImageRef`]. This
//! module turns a reference into raw encoded bytes; decoding happens in
//! [`crate::pixel_buffer`].
//!
//! Accepted textual forms:
//!
//! - `data:image/png;base64,....` inline data URIs
//! - `file:///abs/path.png` URLs
//! - plain filesystem paths

use crate::error::{Result, StudioError};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

/// A reference to an image resource.
///
/// Serializes as a plain string so snapshots stay readable. In-memory byte
/// references serialize through their data-URI form.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ImageRef {
    /// Inline `data:` URI.
    DataUri(String),
    /// A file on disk.
    Path(PathBuf),
    /// Encoded bytes held in memory (PNG, JPEG, ...).
    Bytes(Arc<[u8]>),
}

impl ImageRef {
    /// Parses a textual reference.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.starts_with("data:") {
            return Self::DataUri(trimmed.to_string());
        }
        if trimmed.starts_with("file://")
            && let Ok(url) = url::Url::parse(trimmed)
            && let Ok(path) = url.to_file_path()
        {
            return Self::Path(path);
        }
        Self::Path(PathBuf::from(trimmed))
    }

    /// Wraps encoded bytes.
    pub fn from_bytes(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self::Bytes(bytes.into())
    }

    /// Builds a PNG data URI from encoded PNG bytes.
    pub fn png_data_uri(png: &[u8]) -> Self {
        Self::DataUri(format!("data:image/png;base64,{}", BASE64.encode(png)))
    }

    /// Resolves the reference to encoded image bytes.
    ///
    /// # Errors
    ///
    /// Returns [`StudioError::UnsupportedSource`] for data URIs that are not
    /// base64 encoded or for remote URLs, [`StudioError::Decode`] when the
    /// base64 payload is corrupt, and [`StudioError::Io`] when a file cannot
    /// be read.
    pub fn resolve_bytes(&self) -> Result<Vec<u8>> {
        match self {
            Self::DataUri(uri) => decode_data_uri(uri),
            Self::Path(path) => {
                let text = path.to_string_lossy();
                if text.starts_with("http://") || text.starts_with("https://") {
                    return Err(StudioError::UnsupportedSource(text.into_owned()));
                }
                Ok(fs::read(path)?)
            }
            Self::Bytes(bytes) => Ok(bytes.to_vec()),
        }
    }

    /// Returns the string form used in snapshots.
    pub fn to_uri_string(&self) -> String {
        match self {
            Self::DataUri(uri) => uri.clone(),
            Self::Path(path) => path.to_string_lossy().into_owned(),
            Self::Bytes(bytes) => format!(
                "data:application/octet-stream;base64,{}",
                BASE64.encode(bytes)
            ),
        }
    }
}

fn decode_data_uri(uri: &str) -> Result<Vec<u8>> {
    let (header, payload) = uri
        .split_once(',')
        .ok_or_else(|| StudioError::decode("data URI has no payload separator"))?;

    if !header.ends_with(";base64") {
        return Err(StudioError::UnsupportedSource(
            "only base64 data URIs are supported".to_string(),
        ));
    }

    BASE64
        .decode(payload.trim())
        .map_err(|e| StudioError::decode(format!("Invalid base64 payload: {}", e)))
}

impl From<String> for ImageRef {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<&str> for ImageRef {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl From<ImageRef> for String {
    fn from(image: ImageRef) -> Self {
        image.to_uri_string()
    }
}

impl fmt::Debug for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Data URIs can be megabytes long
        match self {
            Self::DataUri(uri) => write!(f, "DataUri({} bytes)", uri.len()),
            Self::Path(path) => write!(f, "Path({})", path.display()),
            Self::Bytes(bytes) => write!(f, "Bytes({} bytes)", bytes.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_textual_forms() {
        assert!(matches!(ImageRef::parse("data:image/png;base64,AAAA"), ImageRef::DataUri(_)));
        assert_eq!(
            ImageRef::parse("file:///tmp/shirt.png"),
            ImageRef::Path(PathBuf::from("/tmp/shirt.png"))
        );
        assert_eq!(
            ImageRef::parse("mockups/shirt.png"),
            ImageRef::Path(PathBuf::from("mockups/shirt.png"))
        );
    }

    #[test]
    fn data_uri_payload_round_trips() {
        let image = ImageRef::png_data_uri(&[1, 2, 3, 4]);
        assert_eq!(image.resolve_bytes().unwrap(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn rejects_non_base64_data_uri() {
        let image = ImageRef::parse("data:text/plain,hello");
        assert!(matches!(image.resolve_bytes(), Err(StudioError::UnsupportedSource(_))));
    }

    #[test]
    fn rejects_remote_urls() {
        let image = ImageRef::parse("https://cdn.example.com/a.png");
        assert!(image.resolve_bytes().unwrap_err().is_decode());
    }

    #[test]
    fn reads_files_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("raw.bin");
        std::fs::write(&path, [9u8, 8, 7]).unwrap();
        assert_eq!(ImageRef::Path(path).resolve_bytes().unwrap(), vec![9, 8, 7]);
    }
}

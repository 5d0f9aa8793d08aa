//! Files submitted for scanning and their MIME detection.

use image::ImageFormat;
use std::fs;
use std::io;
use std::path::Path;

/// A user-supplied file handed to the scan pipeline.
///
/// `declared_mime` is the type reported by whatever produced the file (an upload
/// form, a file picker). When absent the type is sniffed from the content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    /// File name, forwarded to the remote decoder
    pub name: String,
    /// MIME type claimed by the source, if any
    pub declared_mime: Option<String>,
    /// Raw file content
    pub bytes: Vec<u8>,
}

impl ImageFile {
    /// Wrap in-memory bytes
    pub fn new(name: impl Into<String>, declared_mime: Option<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            declared_mime,
            bytes,
        }
    }

    /// Read a file from disk; the MIME type is sniffed later
    pub fn from_path<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        Ok(Self::new(name, None, bytes))
    }

    /// Effective MIME type: the declared one, else sniffed from magic bytes
    pub fn mime_type(&self) -> Option<String> {
        if let Some(declared) = &self.declared_mime {
            let trimmed = declared.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_ascii_lowercase());
            }
        }
        image::guess_format(&self.bytes)
            .ok()
            .map(|format| mime_for_format(format).to_string())
    }

    /// True when the effective MIME type is `image/*`
    pub fn is_image(&self) -> bool {
        self.mime_type()
            .map(|mime| mime.starts_with("image/"))
            .unwrap_or(false)
    }
}

fn mime_for_format(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Png => "image/png",
        ImageFormat::Jpeg => "image/jpeg",
        ImageFormat::Gif => "image/gif",
        ImageFormat::WebP => "image/webp",
        ImageFormat::Bmp => "image/bmp",
        ImageFormat::Ico => "image/x-icon",
        ImageFormat::Tiff => "image/tiff",
        ImageFormat::Avif => "image/avif",
        ImageFormat::Tga => "image/x-tga",
        ImageFormat::Pnm => "image/x-portable-anymap",
        _ => "image/x-unknown",
    }
}

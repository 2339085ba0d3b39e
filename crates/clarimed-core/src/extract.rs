//! Text extraction abstraction for uploaded report files.
//!
//! Extraction itself runs outside this process (OCR and PDF parsing are
//! delegated to a sidecar service); the core only classifies the upload
//! and defines the boundary trait.

use clarimed_types::error::ExtractError;

/// How an uploaded file should be routed for extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Pdf,
    Image,
}

impl FileKind {
    /// Classifies a bare extension, case-insensitively.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "png" | "jpg" | "jpeg" | "gif" | "bmp" | "tiff" => Some(Self::Image),
            _ => None,
        }
    }

    /// Classifies a filename by its final extension.
    pub fn from_filename(filename: &str) -> Option<Self> {
        let (_, ext) = filename.rsplit_once('.')?;
        Self::from_extension(ext)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Image => "image",
        }
    }
}

/// Trait for report text extraction backends.
///
/// Implementations live in clarimed-infra (e.g. `HttpTextExtractor`).
pub trait TextExtractor: Send + Sync {
    fn extract(
        &self,
        data: &[u8],
        kind: FileKind,
    ) -> impl std::future::Future<Output = Result<String, ExtractError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf_extension_routes_to_pdf() {
        assert_eq!(FileKind::from_extension("pdf"), Some(FileKind::Pdf));
        assert_eq!(FileKind::from_extension("PDF"), Some(FileKind::Pdf));
    }

    #[test]
    fn test_image_extensions_route_to_image() {
        for ext in ["png", "jpg", "jpeg", "gif", "bmp", "tiff", "JPEG"] {
            assert_eq!(FileKind::from_extension(ext), Some(FileKind::Image), "{ext}");
        }
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        assert_eq!(FileKind::from_extension("docx"), None);
        assert_eq!(FileKind::from_extension(""), None);
    }

    #[test]
    fn test_filename_classification_uses_last_extension() {
        assert_eq!(FileKind::from_filename("scan.final.PDF"), Some(FileKind::Pdf));
        assert_eq!(FileKind::from_filename("xray.jpeg"), Some(FileKind::Image));
        assert_eq!(FileKind::from_filename("no_extension"), None);
    }
}

//! Converted output returned by the download step.

use bytes::Bytes;

const ARCHIVE_CONTENT_TYPES: &[&str] = &["application/zip", "application/x-zip-compressed"];

/// Bytes retrieved for a session plus the display name the service chose.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedArtifact {
    pub file_name: String,
    pub content: Bytes,
    pub content_type: Option<String>,
}

impl DownloadedArtifact {
    pub fn new(file_name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            content: content.into(),
            content_type: None,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Multi-file conversions come back bundled as a single zip archive.
    pub fn is_archive(&self) -> bool {
        let by_type = self
            .content_type
            .as_deref()
            .map(|ct| {
                let mime = ct.split(';').next().unwrap_or("").trim().to_lowercase();
                ARCHIVE_CONTENT_TYPES.contains(&mime.as_str())
            })
            .unwrap_or(false);
        by_type || self.file_name.to_lowercase().ends_with(".zip")
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_archive_detection() {
        assert!(!DownloadedArtifact::new("a.jpg", vec![0u8]).is_archive());
        assert!(DownloadedArtifact::new("bundle.ZIP", vec![0u8]).is_archive());
        assert!(DownloadedArtifact::new("converted", vec![0u8])
            .with_content_type("application/x-zip-compressed")
            .is_archive());
    }

    #[test]
    fn test_archive_detection_ignores_content_type_parameters() {
        assert!(DownloadedArtifact::new("converted", vec![0u8])
            .with_content_type("application/zip; charset=binary")
            .is_archive());
        assert!(DownloadedArtifact::new("converted", vec![0u8])
            .with_content_type("Application/X-Zip-Compressed ;name=out.zip")
            .is_archive());
        assert!(!DownloadedArtifact::new("converted", vec![0u8])
            .with_content_type("image/jpeg; q=1")
            .is_archive());
    }
}

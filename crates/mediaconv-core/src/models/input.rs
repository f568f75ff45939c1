//! Files selected by the user for conversion.

use bytes::Bytes;
use std::path::Path;

use super::FormatTag;

/// A named blob of file content handed to the core by the caller.
///
/// Cloning is cheap: the content is reference counted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    name: String,
    content: Bytes,
}

impl InputFile {
    pub fn new(name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Read a file from disk, keeping only its final path component as the name.
    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(name, content))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content(&self) -> &Bytes {
        &self.content
    }

    pub fn format_tag(&self) -> FormatTag {
        FormatTag::from_file_name(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_format_tag_from_name() {
        let file = InputFile::new("Holiday.Jpeg", vec![1u8, 2, 3]);
        assert_eq!(file.format_tag().as_str(), "JPEG");
        assert_eq!(file.content().len(), 3);
    }

    #[tokio::test]
    async fn test_from_path_reads_content_and_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.wav");
        let mut handle = std::fs::File::create(&path).unwrap();
        handle.write_all(b"RIFF").unwrap();

        let file = InputFile::from_path(&path).await.unwrap();
        assert_eq!(file.name(), "clip.wav");
        assert_eq!(file.content().as_ref(), b"RIFF");
    }

    #[tokio::test]
    async fn test_from_path_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(InputFile::from_path(dir.path().join("absent.png")).await.is_err());
    }
}

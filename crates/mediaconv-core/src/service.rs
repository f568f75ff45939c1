//! Interface of the remote conversion service.
//!
//! The HTTP client implements this trait; tests substitute an in-memory
//! double. Every method performs exactly one remote call and never retries.

use async_trait::async_trait;

use crate::error::ServiceError;
use crate::models::{
    ConversionReceipt, DownloadedArtifact, FormatTag, InputFile, SessionId, SupportedFormats,
    UploadReceipt,
};

#[async_trait]
pub trait ConversionService: Send + Sync {
    /// Media family to supported formats, for display only.
    async fn supported_formats(&self) -> Result<SupportedFormats, ServiceError>;

    /// Formats `format` can be converted into. Rejected for unknown formats.
    async fn supported_conversions(&self, format: &FormatTag)
        -> Result<Vec<FormatTag>, ServiceError>;

    /// Whether converting `from` into `to` is allowed.
    async fn is_valid_conversion(
        &self,
        from: &FormatTag,
        to: &FormatTag,
    ) -> Result<bool, ServiceError>;

    /// Upload every file in one request tagged with `session_id`
    /// (the sentinel asks the service to allocate a new session).
    async fn upload(
        &self,
        session_id: &SessionId,
        files: &[InputFile],
    ) -> Result<UploadReceipt, ServiceError>;

    /// Convert the files held by `session_id` into `to_format`.
    async fn convert(
        &self,
        session_id: &SessionId,
        to_format: &FormatTag,
    ) -> Result<ConversionReceipt, ServiceError>;

    /// Retrieve the converted output of `session_id`.
    async fn download(&self, session_id: &SessionId) -> Result<DownloadedArtifact, ServiceError>;
}

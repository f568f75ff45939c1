//! Domain methods for the conversion service client.
//!
//! Each method maps to one endpoint and issues exactly one request. The
//! [`ConversionService`] implementation simply forwards to them.

use async_trait::async_trait;
use mediaconv_core::models::{
    ConversionReceipt, DownloadedArtifact, FormatTag, InputFile, SessionId, SupportedFormats,
    UploadReceipt,
};
use mediaconv_core::{ConversionService, ServiceError};
use reqwest::header::{HeaderMap, CONTENT_DISPOSITION, CONTENT_TYPE};

use crate::ApiClient;

/// Header carrying the display name of a downloaded artifact.
pub const FILENAME_HEADER: &str = "filename";

/// Name used when the service supplies none.
pub const FALLBACK_FILE_NAME: &str = "converted";

impl ApiClient {
    /// List supported formats grouped by media family.
    pub async fn list_supported_formats(&self) -> Result<SupportedFormats, ServiceError> {
        self.get("/supported-formats/", &[]).await
    }

    /// List the formats a given format can be converted into.
    pub async fn list_supported_conversions(
        &self,
        format: &FormatTag,
    ) -> Result<Vec<FormatTag>, ServiceError> {
        self.get(
            "/supported-conversions/",
            &[("format", format.to_string())],
        )
        .await
    }

    /// Ask whether `from` can be converted into `to`.
    pub async fn check_conversion(
        &self,
        from: &FormatTag,
        to: &FormatTag,
    ) -> Result<bool, ServiceError> {
        self.get(
            "/is-valid-conversion/",
            &[("from_format", from.to_string()), ("to_format", to.to_string())],
        )
        .await
    }

    /// Upload files as one multipart request; every file goes under the `files` field.
    pub async fn upload_files(
        &self,
        session_id: &SessionId,
        files: &[InputFile],
    ) -> Result<UploadReceipt, ServiceError> {
        let form = files.iter().fold(reqwest::multipart::Form::new(), |form, file| {
            form.part(
                "files",
                reqwest::multipart::Part::bytes(file.content().to_vec())
                    .file_name(file.name().to_string()),
            )
        });

        let request = self
            .client()
            .post(self.build_url("/upload/"))
            .query(&[("session_id", session_id.as_str())])
            .multipart(form);
        self.send_json(request).await
    }

    /// Convert the files held by a session.
    pub async fn request_conversion(
        &self,
        session_id: &SessionId,
        to_format: &FormatTag,
    ) -> Result<ConversionReceipt, ServiceError> {
        let request = self
            .client()
            .patch(self.build_url("/convert/"))
            .query(&[
                ("session_id", session_id.as_str()),
                ("to_format", to_format.as_str()),
            ]);
        self.send_json(request).await
    }

    /// Download the converted output of a session.
    pub async fn download_result(
        &self,
        session_id: &SessionId,
    ) -> Result<DownloadedArtifact, ServiceError> {
        let request = self
            .client()
            .get(self.build_url("/download/"))
            .query(&[("session_id", session_id.as_str())]);
        let response = self.send(request).await?;

        let headers = response.headers().clone();
        let content = response.bytes().await.map_err(|e| {
            ServiceError::Transport(format!("Failed to read download body: {}", e))
        })?;

        let mut artifact = DownloadedArtifact::new(display_file_name(&headers), content);
        if let Some(content_type) = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()) {
            artifact = artifact.with_content_type(content_type);
        }
        Ok(artifact)
    }
}

/// Display name from the `filename` header, else `Content-Disposition`, else a fallback.
fn display_file_name(headers: &HeaderMap) -> String {
    if let Some(name) = headers
        .get(FILENAME_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
    {
        return name.to_string();
    }

    headers
        .get(CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .and_then(disposition_file_name)
        .unwrap_or_else(|| FALLBACK_FILE_NAME.to_string())
}

fn disposition_file_name(disposition: &str) -> Option<String> {
    disposition
        .split(';')
        .map(str::trim)
        .find_map(|part| part.strip_prefix("filename="))
        .map(|name| name.trim_matches('"').to_string())
        .filter(|name| !name.is_empty())
}

#[async_trait]
impl ConversionService for ApiClient {
    async fn supported_formats(&self) -> Result<SupportedFormats, ServiceError> {
        self.list_supported_formats().await
    }

    async fn supported_conversions(
        &self,
        format: &FormatTag,
    ) -> Result<Vec<FormatTag>, ServiceError> {
        self.list_supported_conversions(format).await
    }

    async fn is_valid_conversion(
        &self,
        from: &FormatTag,
        to: &FormatTag,
    ) -> Result<bool, ServiceError> {
        self.check_conversion(from, to).await
    }

    async fn upload(
        &self,
        session_id: &SessionId,
        files: &[InputFile],
    ) -> Result<UploadReceipt, ServiceError> {
        self.upload_files(session_id, files).await
    }

    async fn convert(
        &self,
        session_id: &SessionId,
        to_format: &FormatTag,
    ) -> Result<ConversionReceipt, ServiceError> {
        self.request_conversion(session_id, to_format).await
    }

    async fn download(&self, session_id: &SessionId) -> Result<DownloadedArtifact, ServiceError> {
        self.download_result(session_id).await
    }
}

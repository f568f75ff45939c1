//! Mock conversion service for testing
//!
//! Answers every remote operation from in-memory tables and records each call,
//! so tests can assert both outcomes and that no request was issued.

use async_trait::async_trait;
use mediaconv_core::models::{
    ConversionReceipt, DownloadedArtifact, FileEntry, FormatTag, InputFile, SessionId,
    SupportedFormats, UploadReceipt,
};
use mediaconv_core::{ConversionService, ServiceError};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// One recorded remote call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    SupportedFormats,
    SupportedConversions(FormatTag),
    IsValidConversion(FormatTag, FormatTag),
    Upload {
        session_id: SessionId,
        file_names: Vec<String>,
    },
    Convert {
        session_id: SessionId,
        to_format: FormatTag,
    },
    Download {
        session_id: SessionId,
    },
}

/// Mock conversion service for testing without a network
pub struct MockConversionService {
    formats: Mutex<SupportedFormats>,
    conversions: Mutex<HashMap<FormatTag, Result<Vec<FormatTag>, ServiceError>>>,
    pairs: Mutex<HashMap<(FormatTag, FormatTag), Result<bool, ServiceError>>>,
    delays: Mutex<HashMap<FormatTag, Duration>>,
    upload_session: Mutex<Result<SessionId, ServiceError>>,
    convert_error: Mutex<Option<ServiceError>>,
    download: Mutex<Result<DownloadedArtifact, ServiceError>>,
    calls: Mutex<Vec<Call>>,
}

impl Default for MockConversionService {
    fn default() -> Self {
        Self::new()
    }
}

impl MockConversionService {
    pub fn new() -> Self {
        Self {
            formats: Mutex::new(SupportedFormats::default()),
            conversions: Mutex::new(HashMap::new()),
            pairs: Mutex::new(HashMap::new()),
            delays: Mutex::new(HashMap::new()),
            upload_session: Mutex::new(Ok(SessionId::from("abc123"))),
            convert_error: Mutex::new(None),
            download: Mutex::new(Ok(DownloadedArtifact::new("converted", Vec::<u8>::new()))),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn set_supported_formats(&self, formats: SupportedFormats) {
        *self.formats.lock().unwrap() = formats;
    }

    /// Register the convertibility set reported for `format`.
    pub fn add_conversions(&self, format: &str, targets: &[&str]) {
        self.conversions.lock().unwrap().insert(
            FormatTag::parse(format),
            Ok(targets.iter().map(|t| FormatTag::parse(t)).collect()),
        );
    }

    /// Make the convertibility query for `format` fail.
    pub fn fail_conversions(&self, format: &str, err: ServiceError) {
        self.conversions
            .lock()
            .unwrap()
            .insert(FormatTag::parse(format), Err(err));
    }

    /// Hold the convertibility query for `format` for `delay` before answering.
    pub fn delay_conversions(&self, format: &str, delay: Duration) {
        self.delays
            .lock()
            .unwrap()
            .insert(FormatTag::parse(format), delay);
    }

    /// Override the pairwise check; unset pairs fall back to the registered sets.
    pub fn set_pair(&self, from: &str, to: &str, result: Result<bool, ServiceError>) {
        self.pairs
            .lock()
            .unwrap()
            .insert((FormatTag::parse(from), FormatTag::parse(to)), result);
    }

    /// Session id handed out for uploads tagged with the sentinel.
    pub fn set_upload_session(&self, session_id: &str) {
        *self.upload_session.lock().unwrap() = Ok(SessionId::from(session_id));
    }

    pub fn fail_upload(&self, err: ServiceError) {
        *self.upload_session.lock().unwrap() = Err(err);
    }

    pub fn fail_convert(&self, err: ServiceError) {
        *self.convert_error.lock().unwrap() = Some(err);
    }

    pub fn clear_convert_failure(&self) {
        *self.convert_error.lock().unwrap() = None;
    }

    pub fn set_download(&self, artifact: DownloadedArtifact) {
        *self.download.lock().unwrap() = Ok(artifact);
    }

    pub fn fail_download(&self, err: ServiceError) {
        *self.download.lock().unwrap() = Err(err);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

/// Rejection the service returns for formats it does not know.
pub fn invalid_format(format: &str) -> ServiceError {
    ServiceError::Rejected {
        status: 404,
        detail: format!("Invalid format: {}", format.to_uppercase()),
    }
}

pub fn transport(message: &str) -> ServiceError {
    ServiceError::Transport(message.to_string())
}

pub fn rejected(status: u16, detail: &str) -> ServiceError {
    ServiceError::Rejected {
        status,
        detail: detail.to_string(),
    }
}

#[async_trait]
impl ConversionService for MockConversionService {
    async fn supported_formats(&self) -> Result<SupportedFormats, ServiceError> {
        self.record(Call::SupportedFormats);
        Ok(self.formats.lock().unwrap().clone())
    }

    async fn supported_conversions(
        &self,
        format: &FormatTag,
    ) -> Result<Vec<FormatTag>, ServiceError> {
        self.record(Call::SupportedConversions(format.clone()));
        let delay = self.delays.lock().unwrap().get(format).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.conversions
            .lock()
            .unwrap()
            .get(format)
            .cloned()
            .unwrap_or_else(|| Err(invalid_format(format.as_str())))
    }

    async fn is_valid_conversion(
        &self,
        from: &FormatTag,
        to: &FormatTag,
    ) -> Result<bool, ServiceError> {
        self.record(Call::IsValidConversion(from.clone(), to.clone()));
        if let Some(result) = self
            .pairs
            .lock()
            .unwrap()
            .get(&(from.clone(), to.clone()))
            .cloned()
        {
            return result;
        }
        let known = self.conversions.lock().unwrap().get(from).cloned();
        Ok(matches!(known, Some(Ok(targets)) if targets.contains(to)))
    }

    async fn upload(
        &self,
        session_id: &SessionId,
        files: &[InputFile],
    ) -> Result<UploadReceipt, ServiceError> {
        self.record(Call::Upload {
            session_id: session_id.clone(),
            file_names: files.iter().map(|f| f.name().to_string()).collect(),
        });
        let allocated = self.upload_session.lock().unwrap().clone()?;
        let session_id = if session_id.is_fresh() {
            allocated
        } else {
            session_id.clone()
        };
        let uploaded_files = files
            .iter()
            .map(|f| FileEntry {
                file_name: f.name().to_string(),
                file_id: format!("{}|{}", f.name(), session_id),
            })
            .collect();
        Ok(UploadReceipt {
            session_id,
            uploaded_files,
        })
    }

    async fn convert(
        &self,
        session_id: &SessionId,
        to_format: &FormatTag,
    ) -> Result<ConversionReceipt, ServiceError> {
        self.record(Call::Convert {
            session_id: session_id.clone(),
            to_format: to_format.clone(),
        });
        if let Some(err) = self.convert_error.lock().unwrap().clone() {
            return Err(err);
        }
        Ok(ConversionReceipt {
            session_id: session_id.clone(),
            converted_files: Vec::new(),
        })
    }

    async fn download(&self, session_id: &SessionId) -> Result<DownloadedArtifact, ServiceError> {
        self.record(Call::Download {
            session_id: session_id.clone(),
        });
        self.download.lock().unwrap().clone()
    }
}

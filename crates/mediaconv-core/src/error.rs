//! Error types module
//!
//! Every remote-call failure is converted at its call site into one of the
//! variants below. `ServiceError` is what the remote layer reports;
//! `NegotiationError` and `SessionError` are what callers of the orchestrator see.
//! All of them implement [`UserFacing`] so a front end can render exactly one
//! message while the raw cause stays available for logging.

use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::models::FormatTag;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like an unusable selection
    Debug,
    /// Warning level - for requests the service refused
    Warn,
    /// Error level - for transport failures
    Error,
}

/// How an error should be presented to the person driving the conversion.
pub trait UserFacing {
    /// One human-readable sentence.
    fn user_message(&self) -> String;

    /// Level at which the raw error should be logged.
    fn log_level(&self) -> LogLevel;

    /// Whether trying the same action again may succeed.
    fn is_recoverable(&self) -> bool;
}

/// Failure reported by the remote conversion service layer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    /// The service answered with a non-success status.
    #[error("Service rejected request with status {status}: {detail}")]
    Rejected { status: u16, detail: String },

    /// The request never produced a usable response.
    #[error("Transport error: {0}")]
    Transport(String),
}

impl ServiceError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ServiceError::Rejected { .. } => FailureKind::ServerRejected,
            ServiceError::Transport(_) => FailureKind::TransportError,
        }
    }

    /// Server-supplied detail, if the service answered at all.
    pub fn detail(&self) -> Option<&str> {
        match self {
            ServiceError::Rejected { detail, .. } => Some(detail),
            ServiceError::Transport(_) => None,
        }
    }
}

/// Remote stage of a conversion run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Upload,
    Convert,
    Download,
}

impl Stage {
    /// Present participle phrase used in messages ("while uploading files").
    pub fn activity(&self) -> &'static str {
        match self {
            Stage::Upload => "uploading files",
            Stage::Convert => "converting files",
            Stage::Download => "downloading files",
        }
    }
}

impl Display for Stage {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Stage::Upload => write!(f, "upload"),
            Stage::Convert => write!(f, "convert"),
            Stage::Download => write!(f, "download"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    ServerRejected,
    TransportError,
}

impl Display for FailureKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            FailureKind::ServerRejected => write!(f, "server rejected"),
            FailureKind::TransportError => write!(f, "transport error"),
        }
    }
}

/// Structured failure of the upload, convert or download stage.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{stage} failed ({kind}): {message}")]
pub struct StageFailure {
    pub stage: Stage,
    pub kind: FailureKind,
    /// Server detail verbatim, or a generic transport message.
    pub message: String,
    #[source]
    pub cause: Option<ServiceError>,
}

impl StageFailure {
    pub fn from_service(stage: Stage, err: ServiceError) -> Self {
        let message = match &err {
            ServiceError::Rejected { detail, .. } => detail.clone(),
            ServiceError::Transport(_) => format!(
                "Could not reach the conversion service while {}",
                stage.activity()
            ),
        };
        Self {
            stage,
            kind: err.kind(),
            message,
            cause: Some(err),
        }
    }
}

impl UserFacing for StageFailure {
    fn user_message(&self) -> String {
        match self.kind {
            FailureKind::ServerRejected => format!(
                "An error occurred while {}: {}",
                self.stage.activity(),
                self.message
            ),
            FailureKind::TransportError => format!(
                "An error occurred while {}. Please try again.",
                self.stage.activity()
            ),
        }
    }

    fn log_level(&self) -> LogLevel {
        match self.kind {
            FailureKind::ServerRejected => LogLevel::Warn,
            FailureKind::TransportError => LogLevel::Error,
        }
    }

    fn is_recoverable(&self) -> bool {
        self.kind == FailureKind::TransportError
    }
}

/// Why no common target format could be offered for a selection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NegotiationError {
    #[error("Conversion service unavailable while querying targets for {format}")]
    Unavailable {
        format: FormatTag,
        #[source]
        cause: ServiceError,
    },

    #[error("Invalid source format {format}: {detail}")]
    InvalidSourceFormat { format: FormatTag, detail: String },

    #[error("Selected files share no common target format")]
    NoCommonFormat,
}

impl UserFacing for NegotiationError {
    fn user_message(&self) -> String {
        match self {
            NegotiationError::Unavailable { .. } => {
                "An error occurred while getting valid conversion options. Please try again."
                    .to_string()
            }
            NegotiationError::InvalidSourceFormat { .. } => {
                "Please select files with valid formats.".to_string()
            }
            NegotiationError::NoCommonFormat => {
                "Please select files of the same media type.".to_string()
            }
        }
    }

    fn log_level(&self) -> LogLevel {
        match self {
            NegotiationError::Unavailable { .. } => LogLevel::Error,
            NegotiationError::InvalidSourceFormat { .. } => LogLevel::Warn,
            NegotiationError::NoCommonFormat => LogLevel::Debug,
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, NegotiationError::Unavailable { .. })
    }
}

/// Why a conversion run stopped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("No files selected")]
    NoFilesSelected,

    #[error("Selection has no negotiated target formats")]
    NotNegotiated,

    #[error("Format {format} is not offered for the current selection")]
    FormatNotOffered { format: FormatTag },

    #[error("Conversion service unavailable while validating {format}")]
    ValidationUnavailable {
        format: FormatTag,
        #[source]
        cause: ServiceError,
    },

    #[error("Validation of {format} rejected: {detail}")]
    ValidationRejected { format: FormatTag, detail: String },

    #[error("Conversion from {from} to {to} is not supported")]
    UnsupportedPair { from: FormatTag, to: FormatTag },

    #[error(transparent)]
    Failed(#[from] StageFailure),
}

impl SessionError {
    /// Remote stage that failed, for failures past the pre-flight checks.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            SessionError::Failed(failure) => Some(failure.stage),
            _ => None,
        }
    }
}

impl UserFacing for SessionError {
    fn user_message(&self) -> String {
        match self {
            SessionError::NoFilesSelected => "Please select a file to convert.".to_string(),
            SessionError::NotNegotiated => {
                "Please select files of the same media type.".to_string()
            }
            SessionError::FormatNotOffered { .. } => {
                "Please select a valid format to convert to.".to_string()
            }
            SessionError::ValidationUnavailable { .. } => {
                "An error occurred while checking conversions. Please try again.".to_string()
            }
            SessionError::ValidationRejected { detail, .. } => {
                format!("An error occurred while checking conversions: {}", detail)
            }
            SessionError::UnsupportedPair { from, to } => {
                format!("File format {} cannot be converted to {}", from, to)
            }
            SessionError::Failed(failure) => failure.user_message(),
        }
    }

    fn log_level(&self) -> LogLevel {
        match self {
            SessionError::NoFilesSelected
            | SessionError::NotNegotiated
            | SessionError::FormatNotOffered { .. }
            | SessionError::UnsupportedPair { .. } => LogLevel::Debug,
            SessionError::ValidationRejected { .. } => LogLevel::Warn,
            SessionError::ValidationUnavailable { .. } => LogLevel::Error,
            SessionError::Failed(failure) => failure.log_level(),
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            SessionError::ValidationUnavailable { .. } => true,
            SessionError::Failed(failure) => failure.is_recoverable(),
            _ => false,
        }
    }
}

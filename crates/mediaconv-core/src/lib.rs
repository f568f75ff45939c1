//! Mediaconv Core Library
//!
//! This crate provides the domain models, error taxonomy, configuration and
//! remote-service interface shared by the client, orchestrator and CLI crates.

pub mod config;
pub mod error;
pub mod hooks;
pub mod models;
pub mod service;

// Re-export commonly used types
pub use config::ClientConfig;
pub use error::{
    FailureKind, LogLevel, NegotiationError, ServiceError, SessionError, Stage, StageFailure,
    UserFacing,
};
pub use hooks::{Feedback, FeedbackSink, NoOpFeedback, RecordingFeedback, Severity};
pub use models::{
    CommonTargetSet, ConversionReceipt, DownloadedArtifact, FileEntry, FormatTag, InputFile,
    Negotiation, SessionId, SupportedFormats, UploadReceipt,
};
pub use service::ConversionService;

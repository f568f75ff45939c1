//! Upload → convert → download workflow for a single conversion request.

use mediaconv_core::models::{CommonTargetSet, DownloadedArtifact, FormatTag, InputFile, SessionId};
use mediaconv_core::{
    ConversionService, FailureKind, Feedback, FeedbackSink, NoOpFeedback, ServiceError,
    SessionError, Severity, Stage, StageFailure,
};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::sync::Arc;

use crate::report::report;

/// Where a run currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Uploading,
    Uploaded,
    Converting,
    Converted,
    Downloading,
    Complete,
    Failed { stage: Stage, kind: FailureKind },
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Complete | SessionState::Failed { .. })
    }
}

impl Display for SessionState {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            SessionState::Idle => write!(f, "idle"),
            SessionState::Uploading => write!(f, "uploading"),
            SessionState::Uploaded => write!(f, "uploaded"),
            SessionState::Converting => write!(f, "converting"),
            SessionState::Converted => write!(f, "converted"),
            SessionState::Downloading => write!(f, "downloading"),
            SessionState::Complete => write!(f, "complete"),
            SessionState::Failed { stage, kind } => write!(f, "failed ({} {})", stage, kind),
        }
    }
}

/// Drives one conversion against the remote service.
///
/// Owns the client-side session id: it adopts the id returned by a successful
/// upload and resets it to the sentinel once the artifact has been downloaded.
/// A failure after upload leaves the server-issued id in place. The service
/// is asked for nothing else, so that server session is left to expire.
pub struct ConversionSession {
    service: Arc<dyn ConversionService>,
    feedback: Arc<dyn FeedbackSink>,
    session_id: SessionId,
    state: SessionState,
}

impl ConversionSession {
    pub fn new(service: Arc<dyn ConversionService>, session_id: SessionId) -> Self {
        Self {
            service,
            feedback: Arc::new(NoOpFeedback),
            session_id,
            state: SessionState::Idle,
        }
    }

    pub fn with_feedback(mut self, feedback: Arc<dyn FeedbackSink>) -> Self {
        self.feedback = feedback;
        self
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Convert `files` to `chosen` and return the downloaded artifact.
    ///
    /// Preconditions and the per-file pairwise check run before any upload;
    /// failing them leaves the state at `Idle`. Stages run strictly in order
    /// and nothing is retried.
    #[tracing::instrument(
        skip_all,
        fields(files = files.len(), to_format = %chosen, session_id = %self.session_id)
    )]
    pub async fn run(
        &mut self,
        files: &[InputFile],
        chosen: &FormatTag,
        last_negotiation: Option<&CommonTargetSet>,
    ) -> Result<DownloadedArtifact, SessionError> {
        // Each invocation starts fresh; only the session id carries over.
        self.state = SessionState::Idle;

        if let Err(err) = self.preflight(files, chosen, last_negotiation).await {
            report(self.feedback.as_ref(), &err, severity_for(&err));
            return Err(err);
        }

        self.transition(SessionState::Uploading);
        self.feedback.notify(Feedback::progress("Uploading files..."));
        let receipt = match self.service.upload(&self.session_id, files).await {
            Ok(receipt) => receipt,
            Err(err) => return Err(self.fail(Stage::Upload, err)),
        };
        self.session_id = receipt.session_id;
        self.transition(SessionState::Uploaded);
        tracing::info!(
            session_id = %self.session_id,
            uploaded = receipt.uploaded_files.len(),
            "Files uploaded"
        );
        self.feedback.notify(Feedback::progress(format!(
            "Files uploaded successfully. Converting to {}...",
            chosen
        )));

        self.transition(SessionState::Converting);
        if let Err(err) = self.service.convert(&self.session_id, chosen).await {
            return Err(self.fail(Stage::Convert, err));
        }
        self.transition(SessionState::Converted);
        tracing::info!(session_id = %self.session_id, "Files converted");
        self.feedback.notify(Feedback::progress(format!(
            "Files successfully converted to {}. Downloading files from server...",
            chosen
        )));

        self.transition(SessionState::Downloading);
        let artifact = match self.service.download(&self.session_id).await {
            Ok(artifact) => artifact,
            Err(err) => return Err(self.fail(Stage::Download, err)),
        };
        tracing::info!(
            session_id = %self.session_id,
            file_name = %artifact.file_name,
            bytes = artifact.len(),
            "Conversion result downloaded"
        );

        // The server session is consumed; the next run asks for a new one.
        self.session_id = SessionId::fresh();
        self.transition(SessionState::Complete);
        self.feedback.notify(Feedback::progress("Files downloaded."));
        Ok(artifact)
    }

    async fn preflight(
        &self,
        files: &[InputFile],
        chosen: &FormatTag,
        last_negotiation: Option<&CommonTargetSet>,
    ) -> Result<(), SessionError> {
        if files.is_empty() {
            return Err(SessionError::NoFilesSelected);
        }
        let targets = last_negotiation.ok_or(SessionError::NotNegotiated)?;
        if !targets.contains(chosen) {
            return Err(SessionError::FormatNotOffered {
                format: chosen.clone(),
            });
        }

        for file in files {
            let from = file.format_tag();
            match self.service.is_valid_conversion(&from, chosen).await {
                Ok(true) => {
                    tracing::debug!(from = %from, to = %chosen, "Conversion pair accepted");
                }
                Ok(false) => {
                    return Err(SessionError::UnsupportedPair {
                        from,
                        to: chosen.clone(),
                    });
                }
                Err(ServiceError::Rejected { detail, .. }) => {
                    return Err(SessionError::ValidationRejected {
                        format: from,
                        detail,
                    });
                }
                Err(cause @ ServiceError::Transport(_)) => {
                    return Err(SessionError::ValidationUnavailable {
                        format: from,
                        cause,
                    });
                }
            }
        }
        Ok(())
    }

    fn fail(&mut self, stage: Stage, err: ServiceError) -> SessionError {
        let failure = StageFailure::from_service(stage, err);
        self.transition(SessionState::Failed {
            stage,
            kind: failure.kind,
        });
        let err = SessionError::Failed(failure);
        report(self.feedback.as_ref(), &err, Severity::Error);
        err
    }

    fn transition(&mut self, next: SessionState) {
        tracing::debug!(
            from = %self.state,
            to = %next,
            session_id = %self.session_id,
            "Session state transition"
        );
        self.state = next;
    }
}

fn severity_for(err: &SessionError) -> Severity {
    match err {
        SessionError::ValidationRejected { .. }
        | SessionError::ValidationUnavailable { .. }
        | SessionError::Failed(_) => Severity::Error,
        _ => Severity::Warning,
    }
}

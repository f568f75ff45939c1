//! Facade wiring negotiation, conversion runs and the shared context together.

use mediaconv_core::models::{
    DownloadedArtifact, FormatTag, InputFile, Negotiation, SupportedFormats,
};
use mediaconv_core::{
    ConversionService, Feedback, FeedbackSink, NegotiationError, NoOpFeedback, ServiceError,
    SessionError, Severity,
};
use std::sync::Arc;

use crate::context::SessionContext;
use crate::negotiator::FormatNegotiator;
use crate::report::report;
use crate::session::ConversionSession;

/// Entry point for front ends: negotiates selections and runs conversions
/// while keeping the shared [`SessionContext`] current.
pub struct ConversionOrchestrator {
    service: Arc<dyn ConversionService>,
    negotiator: FormatNegotiator,
    feedback: Arc<dyn FeedbackSink>,
    context: SessionContext,
}

impl ConversionOrchestrator {
    pub fn new(service: Arc<dyn ConversionService>) -> Self {
        Self {
            negotiator: FormatNegotiator::new(service.clone()),
            service,
            feedback: Arc::new(NoOpFeedback),
            context: SessionContext::new(),
        }
    }

    pub fn with_feedback(mut self, feedback: Arc<dyn FeedbackSink>) -> Self {
        self.feedback = feedback;
        self
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut SessionContext {
        &mut self.context
    }

    /// Formats table for display. Not needed for negotiation or conversion.
    pub async fn supported_formats(&self) -> Result<SupportedFormats, ServiceError> {
        self.service.supported_formats().await.map_err(|err| {
            tracing::warn!(error = %err, "Failed to fetch supported formats");
            err
        })
    }

    /// Record `files` as the current selection and negotiate its common targets.
    ///
    /// Feedback from a previous selection is cleared on success; a failure is
    /// shown once. Results of a superseded selection are neither stored nor shown.
    pub async fn select_files(
        &mut self,
        files: &[InputFile],
    ) -> Result<Negotiation, NegotiationError> {
        let ticket = self.context.begin_negotiation(files);
        let result = self.negotiator.negotiate(files).await;

        if self.context.commit_negotiation(ticket, &result) {
            match &result {
                Ok(_) => self.feedback.notify(Feedback::clear()),
                Err(err) => {
                    let severity = match err {
                        NegotiationError::Unavailable { .. } => Severity::Error,
                        _ => Severity::Warning,
                    };
                    report(self.feedback.as_ref(), err, severity);
                }
            }
        }
        result
    }

    /// Convert the current selection to `chosen`.
    ///
    /// `files` must be the selection last passed to [`select_files`](Self::select_files)
    /// and that negotiation must have succeeded; otherwise nothing is sent.
    pub async fn convert(
        &mut self,
        files: &[InputFile],
        chosen: &FormatTag,
    ) -> Result<DownloadedArtifact, SessionError> {
        let targets = match self.context.check_selection(files) {
            Ok(targets) => targets.clone(),
            Err(err) => {
                report(self.feedback.as_ref(), &err, Severity::Warning);
                return Err(err);
            }
        };

        let ticket = self.context.begin_run();
        let mut session = ConversionSession::new(self.service.clone(), ticket.session_id().clone())
            .with_feedback(self.feedback.clone());
        let result = session.run(files, chosen, Some(&targets)).await;

        self.context.finish_run(ticket, session.session_id().clone(), &result);
        result
    }
}

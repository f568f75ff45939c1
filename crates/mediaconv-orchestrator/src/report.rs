use mediaconv_core::{Feedback, FeedbackSink, LogLevel, Severity, UserFacing};
use std::fmt::Debug;

/// Log the raw error at its own level and show its user message once.
pub(crate) fn report<E>(feedback: &dyn FeedbackSink, err: &E, severity: Severity)
where
    E: UserFacing + std::error::Error + Debug,
{
    match err.log_level() {
        LogLevel::Debug => tracing::debug!(error = %err, "Request refused"),
        LogLevel::Warn => tracing::warn!(error = %err, raw = ?err, "Request rejected"),
        LogLevel::Error => tracing::error!(error = %err, raw = ?err, "Request failed"),
    }
    feedback.notify(Feedback::new(err.user_message(), severity));
}

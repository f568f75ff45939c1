//! State carried between negotiation and conversion invocations.
//!
//! There is one context per client. The orchestrator is its only writer;
//! front ends read it between invocations. Every `begin_*` call hands out a
//! ticket with a monotonically increasing generation, and a result is only
//! committed if its ticket is still the newest one. A late answer from a
//! superseded invocation is dropped instead of overwriting newer state.

use mediaconv_core::models::{
    CommonTargetSet, DownloadedArtifact, FormatTag, InputFile, Negotiation, SessionId,
};
use mediaconv_core::{NegotiationError, SessionError};

/// Proof that a negotiation was started for a particular selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NegotiationTicket {
    generation: u64,
    formats: Vec<FormatTag>,
}

impl NegotiationTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Proof that a conversion run was started, carrying the session id it uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunTicket {
    generation: u64,
    session_id: SessionId,
}

impl RunTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }
}

#[derive(Debug, Default)]
pub struct SessionContext {
    session_id: SessionId,
    /// Formats of the most recent selection, `None` when nothing is selected.
    selection: Option<Vec<FormatTag>>,
    /// Common targets of that selection; `None` until negotiation succeeds.
    targets: Option<CommonTargetSet>,
    last_artifact: Option<DownloadedArtifact>,
    negotiation_generation: u64,
    run_generation: u64,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn selection(&self) -> Option<&[FormatTag]> {
        self.selection.as_deref()
    }

    pub fn targets(&self) -> Option<&CommonTargetSet> {
        self.targets.as_ref()
    }

    /// Artifact of the last successful run, kept so it can be offered again.
    pub fn last_artifact(&self) -> Option<&DownloadedArtifact> {
        self.last_artifact.as_ref()
    }

    /// Forget the server session id, e.g. after the service expired it.
    pub fn reset_session(&mut self) {
        if !self.session_id.is_fresh() {
            tracing::info!(session_id = %self.session_id, "Dropping server session reference");
        }
        self.session_id = SessionId::fresh();
    }

    /// Record a selection change and start negotiating it.
    ///
    /// Derived state of the previous selection is invalidated immediately.
    pub fn begin_negotiation(&mut self, files: &[InputFile]) -> NegotiationTicket {
        self.negotiation_generation += 1;
        let formats: Vec<FormatTag> = files.iter().map(InputFile::format_tag).collect();

        self.selection = if formats.is_empty() {
            None
        } else {
            Some(formats.clone())
        };
        self.targets = None;
        self.last_artifact = None;

        NegotiationTicket {
            generation: self.negotiation_generation,
            formats,
        }
    }

    /// Store the outcome of a negotiation. Returns `false` if it was superseded.
    pub fn commit_negotiation(
        &mut self,
        ticket: NegotiationTicket,
        result: &Result<Negotiation, NegotiationError>,
    ) -> bool {
        if ticket.generation != self.negotiation_generation {
            tracing::debug!(
                stale = ticket.generation,
                current = self.negotiation_generation,
                "Discarding superseded negotiation result"
            );
            return false;
        }

        match result {
            Ok(Negotiation::Targets(targets)) => {
                self.selection = Some(ticket.formats);
                self.targets = Some(targets.clone());
            }
            Ok(Negotiation::Empty) => {
                self.selection = None;
                self.targets = None;
            }
            Err(_) => {
                self.targets = None;
            }
        }
        true
    }

    /// Check that `files` is the selection negotiated last and that it succeeded.
    pub fn check_selection(&self, files: &[InputFile]) -> Result<&CommonTargetSet, SessionError> {
        if files.is_empty() {
            return Err(SessionError::NoFilesSelected);
        }
        let negotiated = self.selection.as_ref().ok_or(SessionError::NoFilesSelected)?;
        let same_selection = negotiated.len() == files.len()
            && negotiated
                .iter()
                .zip(files)
                .all(|(format, file)| *format == file.format_tag());
        if !same_selection {
            return Err(SessionError::NotNegotiated);
        }
        self.targets.as_ref().ok_or(SessionError::NotNegotiated)
    }

    /// Start a conversion run with the current session id.
    pub fn begin_run(&mut self) -> RunTicket {
        self.run_generation += 1;
        RunTicket {
            generation: self.run_generation,
            session_id: self.session_id.clone(),
        }
    }

    /// Store the session id a run ended with. Returns `false` if it was superseded.
    pub fn finish_run(
        &mut self,
        ticket: RunTicket,
        session_id: SessionId,
        result: &Result<DownloadedArtifact, SessionError>,
    ) -> bool {
        if ticket.generation != self.run_generation {
            tracing::debug!(
                stale = ticket.generation,
                current = self.run_generation,
                "Discarding superseded conversion result"
            );
            return false;
        }

        self.session_id = session_id;
        if let Ok(artifact) = result {
            self.last_artifact = Some(artifact.clone());
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::input_files;
    use crate::FormatNegotiator;
    use std::time::Duration;

    fn offered(values: &[&str]) -> Negotiation {
        let tags: Vec<FormatTag> = values.iter().map(|v| FormatTag::parse(v)).collect();
        Negotiation::Targets(CommonTargetSet::intersect(&[tags]).unwrap())
    }

    #[test]
    fn test_starts_with_sentinel_and_nothing_negotiated() {
        let ctx = SessionContext::new();
        assert!(ctx.session_id().is_fresh());
        assert!(ctx.targets().is_none());
        assert!(ctx.last_artifact().is_none());
    }

    #[test]
    fn test_commit_current_negotiation() {
        let mut ctx = SessionContext::new();
        let files = input_files(&["a.png", "b.png"]);
        let ticket = ctx.begin_negotiation(&files);
        assert!(ctx.commit_negotiation(ticket, &Ok(offered(&["JPG", "GIF"]))));

        let targets = ctx.check_selection(&files).unwrap();
        assert!(targets.contains(&FormatTag::parse("GIF")));
    }

    #[test]
    fn test_stale_negotiation_is_discarded() {
        let mut ctx = SessionContext::new();
        let first = input_files(&["a.png"]);
        let second = input_files(&["song.mp3"]);

        let old = ctx.begin_negotiation(&first);
        let new = ctx.begin_negotiation(&second);
        assert!(ctx.commit_negotiation(new, &Ok(offered(&["WAV"]))));
        assert!(!ctx.commit_negotiation(old, &Ok(offered(&["JPG"]))));

        let targets = ctx.targets().unwrap();
        assert!(targets.contains(&FormatTag::parse("WAV")));
        assert!(!targets.contains(&FormatTag::parse("JPG")));
        assert_eq!(ctx.check_selection(&first), Err(SessionError::NotNegotiated));
    }

    #[test]
    fn test_failed_negotiation_clears_targets() {
        let mut ctx = SessionContext::new();
        let files = input_files(&["a.png", "b.mp3"]);
        let ticket = ctx.begin_negotiation(&files);
        ctx.commit_negotiation(ticket, &Err(NegotiationError::NoCommonFormat));

        assert!(ctx.targets().is_none());
        assert_eq!(ctx.check_selection(&files), Err(SessionError::NotNegotiated));
    }

    #[test]
    fn test_empty_selection_clears_everything() {
        let mut ctx = SessionContext::new();
        let ticket = ctx.begin_negotiation(&[]);
        ctx.commit_negotiation(ticket, &Ok(Negotiation::Empty));

        assert!(ctx.selection().is_none());
        assert_eq!(ctx.check_selection(&[]), Err(SessionError::NoFilesSelected));
        assert_eq!(
            ctx.check_selection(&input_files(&["a.png"])),
            Err(SessionError::NoFilesSelected)
        );
    }

    #[test]
    fn test_selection_change_drops_last_artifact() {
        let mut ctx = SessionContext::new();
        let run = ctx.begin_run();
        let artifact = DownloadedArtifact::new("a.jpg", b"jpeg".to_vec());
        assert!(ctx.finish_run(run, SessionId::fresh(), &Ok(artifact.clone())));
        assert_eq!(ctx.last_artifact(), Some(&artifact));

        ctx.begin_negotiation(&input_files(&["b.png"]));
        assert!(ctx.last_artifact().is_none());
    }

    #[test]
    fn test_stale_run_does_not_overwrite_session_id() {
        let mut ctx = SessionContext::new();
        let old = ctx.begin_run();
        let new = ctx.begin_run();

        assert!(ctx.finish_run(
            new,
            SessionId::from("server-2"),
            &Err(SessionError::NotNegotiated)
        ));
        assert!(!ctx.finish_run(
            old,
            SessionId::fresh(),
            &Ok(DownloadedArtifact::new("late.jpg", Vec::<u8>::new()))
        ));
        assert_eq!(ctx.session_id().as_str(), "server-2");
        assert!(ctx.last_artifact().is_none());
    }

    #[test]
    fn test_reset_session() {
        let mut ctx = SessionContext::new();
        let run = ctx.begin_run();
        ctx.finish_run(run, SessionId::from("abc123"), &Err(SessionError::NoFilesSelected));
        assert_eq!(ctx.begin_run().session_id().as_str(), "abc123");

        ctx.reset_session();
        assert!(ctx.session_id().is_fresh());
    }

    #[tokio::test]
    async fn test_late_resolution_from_concurrent_negotiations() {
        let service = crate::test_helpers::media_service();
        service.delay_conversions("PNG", Duration::from_millis(50));
        let negotiator = FormatNegotiator::new(service);
        let mut ctx = SessionContext::new();

        let slow_files = input_files(&["a.png"]);
        let fast_files = input_files(&["song.mp3"]);
        let slow_ticket = ctx.begin_negotiation(&slow_files);
        let fast_ticket = ctx.begin_negotiation(&fast_files);

        let (slow_result, fast_result) = tokio::join!(
            negotiator.negotiate(&slow_files),
            negotiator.negotiate(&fast_files)
        );

        // The newer answer lands first, the older one arrives late.
        assert!(ctx.commit_negotiation(fast_ticket, &fast_result));
        assert!(!ctx.commit_negotiation(slow_ticket, &slow_result));
        assert!(ctx.check_selection(&fast_files).is_ok());
        assert!(ctx.check_selection(&slow_files).is_err());
    }
}

//! Format negotiation across a multi-file selection.

use futures::future::join_all;
use mediaconv_core::models::{CommonTargetSet, FormatTag, InputFile, Negotiation};
use mediaconv_core::{ConversionService, NegotiationError, ServiceError};
use std::sync::Arc;

/// Computes the target formats every file of a selection can be converted to.
///
/// Stateless: each call starts from scratch and queries the service once per
/// file (files sharing a format are not deduplicated).
#[derive(Clone)]
pub struct FormatNegotiator {
    service: Arc<dyn ConversionService>,
}

impl FormatNegotiator {
    pub fn new(service: Arc<dyn ConversionService>) -> Self {
        Self { service }
    }

    /// Negotiate the common target set for `files`.
    ///
    /// An empty selection returns [`Negotiation::Empty`] without any remote call.
    /// Queries run concurrently, but the result is only computed once all of
    /// them have resolved; the first failure in file order decides the error
    /// and no partial set is returned.
    #[tracing::instrument(skip_all, fields(files = files.len()))]
    pub async fn negotiate(&self, files: &[InputFile]) -> Result<Negotiation, NegotiationError> {
        if files.is_empty() {
            tracing::debug!("Empty selection, nothing to negotiate");
            return Ok(Negotiation::Empty);
        }

        let formats: Vec<FormatTag> = files.iter().map(InputFile::format_tag).collect();
        let results = join_all(
            formats
                .iter()
                .map(|format| self.service.supported_conversions(format)),
        )
        .await;

        let mut sets = Vec::with_capacity(formats.len());
        for (format, result) in formats.into_iter().zip(results) {
            match result {
                Ok(targets) => {
                    tracing::debug!(
                        format = %format,
                        targets = targets.len(),
                        "Convertibility set received"
                    );
                    sets.push(targets);
                }
                Err(ServiceError::Rejected { detail, .. }) => {
                    return Err(NegotiationError::InvalidSourceFormat { format, detail });
                }
                Err(cause @ ServiceError::Transport(_)) => {
                    return Err(NegotiationError::Unavailable { format, cause });
                }
            }
        }

        match CommonTargetSet::intersect(&sets) {
            Some(common) => {
                tracing::info!(targets = common.len(), "Negotiated common target formats");
                Ok(Negotiation::Targets(common))
            }
            None => Err(NegotiationError::NoCommonFormat),
        }
    }
}

//! Mediaconv Orchestrator
//!
//! Drives the client side of a remote media conversion:
//!
//! - [`FormatNegotiator`] works out which target formats every selected file
//!   can be converted to.
//! - [`ConversionSession`] runs the upload → convert → download workflow for
//!   one request and tracks the server session id.
//! - [`SessionContext`] holds the state shared between invocations (session id,
//!   last negotiation, last artifact) and discards superseded results.
//! - [`ConversionOrchestrator`] wires the three together for sequential callers.

pub mod context;
pub mod negotiator;
pub mod orchestrator;
mod report;
pub mod session;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

pub use context::{NegotiationTicket, RunTicket, SessionContext};
pub use negotiator::FormatNegotiator;
pub use orchestrator::ConversionOrchestrator;
pub use session::{ConversionSession, SessionState};

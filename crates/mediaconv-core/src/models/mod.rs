//! Data models for the conversion client
//!
//! Each sub-module covers one concept of the upload → convert → download
//! workflow; everything is re-exported here for convenient imports.

mod artifact;
mod format;
mod input;
mod session;

pub use artifact::*;
pub use format::*;
pub use input::*;
pub use session::*;

//! Client-held reference to a server-side conversion session.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Identifier of the server session holding uploaded files.
///
/// The sentinel value `"new"` means no session has been allocated yet; the
/// service creates one when it receives an upload tagged with it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub const SENTINEL: &'static str = "new";

    /// The "no session yet" sentinel.
    pub fn fresh() -> Self {
        Self(Self::SENTINEL.to_string())
    }

    pub fn is_fresh(&self) -> bool {
        self.0 == Self::SENTINEL
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::fresh()
    }
}

impl Display for SessionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A file the service reports as stored for a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub file_name: String,
    pub file_id: String,
}

/// Response to an upload: the session now holding the files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadReceipt {
    pub session_id: SessionId,
    #[serde(default)]
    pub uploaded_files: Vec<FileEntry>,
}

/// Acknowledgement of a conversion request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionReceipt {
    pub session_id: SessionId,
    #[serde(default)]
    pub converted_files: Vec<FileEntry>,
}

//! Test helpers for orchestrator tests
//!
//! Enabled for this crate's own tests and, through the `test-helpers`
//! feature, for downstream crates that want an in-memory service.

pub mod mock_service;

pub use mock_service::*;

use mediaconv_core::models::InputFile;
use std::sync::Arc;

/// Input files with the given names and a few bytes of placeholder content.
pub fn input_files(names: &[&str]) -> Vec<InputFile> {
    names
        .iter()
        .map(|name| InputFile::new(*name, name.as_bytes().to_vec()))
        .collect()
}

/// Mock service that knows the image family: PNG and JPG convert to JPG and GIF,
/// MP3 converts within the audio family.
pub fn media_service() -> Arc<MockConversionService> {
    let service = MockConversionService::new();
    service.add_conversions("PNG", &["JPG", "GIF"]);
    service.add_conversions("JPG", &["JPG", "GIF"]);
    service.add_conversions("MP3", &["WAV", "OGG"]);
    Arc::new(service)
}

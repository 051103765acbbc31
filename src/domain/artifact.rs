use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// Element-scoped image of one post
    PerItem,
    /// Viewport slice taken at a fixed scroll offset
    FullPage,
}

/// Image file produced during a collection run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenshotArtifact {
    pub file_path: PathBuf,
    /// `capture_index` of the record this image shows; None for viewport slices
    pub source_capture_index: Option<usize>,
    pub kind: ArtifactKind,
}

impl ScreenshotArtifact {
    pub fn per_item(file_path: PathBuf, capture_index: usize) -> Self {
        Self {
            file_path,
            source_capture_index: Some(capture_index),
            kind: ArtifactKind::PerItem,
        }
    }

    pub fn full_page(file_path: PathBuf) -> Self {
        Self {
            file_path,
            source_capture_index: None,
            kind: ArtifactKind::FullPage,
        }
    }

    pub fn file_name(&self) -> String {
        self.file_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

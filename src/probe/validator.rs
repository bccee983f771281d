//! Media file validation utilities

use std::path::Path;

use crate::domain::model::MediaKind;
use crate::error::{ShrinkXError, ShrinkXResult};

/// Classify a source by its extension
pub fn classify_media_kind(path: &Path) -> ShrinkXResult<MediaKind> {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().into_owned())
        .unwrap_or_default();

    MediaKind::from_extension(&extension).ok_or(ShrinkXError::UnsupportedMedia { extension })
}

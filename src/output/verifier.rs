//! Output verification after a successful encoder exit

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use crate::error::{ShrinkXError, ShrinkXResult};
use crate::utils::format_file_size;

/// Summary of a finished compression
#[derive(Debug, Clone, Serialize)]
pub struct OutputReport {
    pub output_path: PathBuf,
    pub output_size: u64,
    pub source_size: u64,
    /// `output_size / source_size`, 0 when the source is empty
    pub ratio: f64,
}

impl OutputReport {
    /// Bytes saved, negative when the output grew
    pub fn saved_bytes(&self) -> i64 {
        self.source_size as i64 - self.output_size as i64
    }
}

/// Checks that the encoder actually produced an output file
pub struct OutputVerifier;

impl OutputVerifier {
    pub fn verify(output_path: &Path, source_size: u64) -> ShrinkXResult<OutputReport> {
        let output_size = match std::fs::metadata(output_path) {
            Ok(meta) if meta.is_file() => meta.len(),
            _ => {
                return Err(ShrinkXError::EncoderFailed {
                    code: "0".to_string(),
                    message: format!(
                        "Encoder reported success but no output was written to {}",
                        output_path.display()
                    ),
                })
            }
        };

        let ratio = if source_size == 0 {
            0.0
        } else {
            output_size as f64 / source_size as f64
        };

        if output_size > source_size {
            warn!(
                "Output is larger than the source: {} > {}",
                format_file_size(output_size),
                format_file_size(source_size)
            );
        } else {
            info!(
                "Compressed {} -> {} ({:.1}%)",
                format_file_size(source_size),
                format_file_size(output_size),
                ratio * 100.0
            );
        }

        Ok(OutputReport {
            output_path: output_path.to_path_buf(),
            output_size,
            source_size,
            ratio,
        })
    }
}

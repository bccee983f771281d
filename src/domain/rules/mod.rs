// Domain rules - Strategy availability and parameter policies

use crate::domain::model::*;
use crate::error::{ShrinkXError, ShrinkXResult};

/// Valid constant rate factor values for libx265
pub const CRF_RANGE: std::ops::RangeInclusive<u8> = 0..=51;
/// libmp3lame VBR quality levels
pub const AUDIO_QUALITY_RANGE: std::ops::RangeInclusive<u8> = 0..=9;
/// mjpeg qscale values accepted for still images
pub const IMAGE_QUALITY_RANGE: std::ops::RangeInclusive<u8> = 2..=31;

/// Which strategies make sense for which kind of media
pub struct StrategyAvailability;

impl StrategyAvailability {
    /// Strategies offered for a media kind, in presentation order
    pub fn strategies_for(kind: MediaKind) -> &'static [StrategyKind] {
        match kind {
            MediaKind::Video => &[
                StrategyKind::FileSize,
                StrategyKind::VideoBitrate,
                StrategyKind::Resolution,
                StrategyKind::ConstantRateFactor,
                StrategyKind::FrameRate,
            ],
            MediaKind::Audio => &[
                StrategyKind::FileSize,
                StrategyKind::AudioBitrate,
                StrategyKind::AudioQuality,
                StrategyKind::AudioSampleRate,
            ],
            MediaKind::ImageJpeg => &[StrategyKind::Resolution, StrategyKind::ImageQuality],
            MediaKind::ImagePng => &[StrategyKind::Resolution],
            MediaKind::ImageGif => &[StrategyKind::Resolution, StrategyKind::FrameRate],
        }
    }

    pub fn is_available(kind: MediaKind, strategy: StrategyKind) -> bool {
        Self::strategies_for(kind).contains(&strategy)
    }
}

/// Validates a strategy before a command line is built for it
pub struct StrategyValidator;

impl StrategyValidator {
    /// Check that the strategy applies to `kind` and its parameters are in range
    pub fn validate(strategy: &CompressionStrategy, kind: MediaKind) -> ShrinkXResult<()> {
        if !StrategyAvailability::is_available(kind, strategy.kind()) {
            return Err(ShrinkXError::UnsupportedStrategy {
                strategy: strategy.kind().to_string(),
                kind: kind.to_string(),
            });
        }

        match strategy {
            CompressionStrategy::FileSize { target_mb, .. } => {
                require_positive("Target size", *target_mb)
            }
            CompressionStrategy::VideoBitrate { kbps, .. }
            | CompressionStrategy::AudioBitrate { kbps, .. } => {
                require_positive("Bitrate", *kbps as f64)
            }
            CompressionStrategy::Resolution { width } => require_positive("Width", *width as f64),
            CompressionStrategy::FrameRate { fps } => require_positive("Frame rate", *fps as f64),
            CompressionStrategy::ConstantRateFactor { crf, .. } => {
                require_in_range("CRF", *crf, CRF_RANGE)
            }
            CompressionStrategy::AudioQuality { quality } => {
                require_in_range("Audio quality", *quality, AUDIO_QUALITY_RANGE)
            }
            CompressionStrategy::AudioSampleRate { hz } => {
                require_positive("Sample rate", *hz as f64)
            }
            CompressionStrategy::ImageQuality { quality } => {
                require_in_range("Image quality", *quality, IMAGE_QUALITY_RANGE)
            }
        }
    }
}

fn require_positive(name: &str, value: f64) -> ShrinkXResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ShrinkXError::InvalidParameters {
            message: format!("{} must be greater than zero, got {}", name, value),
        })
    }
}

fn require_in_range(
    name: &str,
    value: u8,
    range: std::ops::RangeInclusive<u8>,
) -> ShrinkXResult<()> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(ShrinkXError::InvalidParameters {
            message: format!(
                "{} must be between {} and {}, got {}",
                name,
                range.start(),
                range.end(),
                value
            ),
        })
    }
}

//! Command-line argument definitions

use std::path::PathBuf;

use clap::{Args, Subcommand};
use clap_num::number_range;

use crate::domain::model::{CompressionStrategy, SpeedPreset};

fn crf_value(s: &str) -> Result<u8, String> {
    number_range(s, 0, 51)
}

fn audio_quality_value(s: &str) -> Result<u8, String> {
    number_range(s, 0, 9)
}

fn image_quality_value(s: &str) -> Result<u8, String> {
    number_range(s, 2, 31)
}

fn positive_u32(s: &str) -> Result<u32, String> {
    number_range(s, 1, u32::MAX)
}

fn positive_megabytes(s: &str) -> Result<f64, String> {
    let value: f64 = s.parse().map_err(|_| format!("`{}` is not a number", s))?;
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(format!("size must be positive, got {}", s))
    }
}

/// Arguments for the probe command
#[derive(Args, Debug)]
pub struct ProbeArgs {
    /// Input media file path
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the compress command
#[derive(Args, Debug)]
pub struct CompressArgs {
    /// Input media file path
    #[arg(short, long)]
    pub input: PathBuf,

    /// Emit progress and the final report as JSON lines
    #[arg(long)]
    pub json: bool,

    /// Read `pause`, `resume` and `cancel` from stdin while encoding
    #[arg(long)]
    pub interactive: bool,

    #[command(subcommand)]
    pub strategy: StrategyCommand,
}

/// Compression strategies and their parameters
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum StrategyCommand {
    /// Aim for an output size in megabytes
    FileSize {
        #[arg(long = "target-mb", value_parser = positive_megabytes)]
        target_mb: f64,
        /// Cap the bitrate so the target is not exceeded
        #[arg(long)]
        limit: bool,
    },
    /// Encode video at a fixed bitrate
    VideoBitrate {
        #[arg(long, value_parser = positive_u32)]
        kbps: u32,
        #[arg(long)]
        limit: bool,
    },
    /// Encode audio at a fixed bitrate
    AudioBitrate {
        #[arg(long, value_parser = positive_u32)]
        kbps: u32,
        #[arg(long)]
        limit: bool,
    },
    /// Scale to a width, keeping the aspect ratio
    Resolution {
        #[arg(long, value_parser = positive_u32)]
        width: u32,
    },
    /// Change the frame rate
    FrameRate {
        #[arg(long, value_parser = positive_u32)]
        fps: u32,
    },
    /// Re-encode with x265 at a constant rate factor
    Crf {
        #[arg(long, default_value = "23", value_parser = crf_value)]
        crf: u8,
        #[arg(long, default_value = "medium")]
        preset: SpeedPreset,
    },
    /// Re-encode audio with libmp3lame VBR (0 is best)
    AudioQuality {
        #[arg(long, value_parser = audio_quality_value)]
        quality: u8,
    },
    /// Resample audio
    SampleRate {
        #[arg(long, value_parser = positive_u32)]
        hz: u32,
    },
    /// Re-encode a JPEG at a qscale (2 is best)
    ImageQuality {
        #[arg(long, value_parser = image_quality_value)]
        quality: u8,
    },
}

impl StrategyCommand {
    pub fn into_strategy(self) -> CompressionStrategy {
        match self {
            Self::FileSize { target_mb, limit } => CompressionStrategy::FileSize {
                target_mb,
                limit_to_target: limit,
            },
            Self::VideoBitrate { kbps, limit } => CompressionStrategy::VideoBitrate {
                kbps,
                limit_to_target: limit,
            },
            Self::AudioBitrate { kbps, limit } => CompressionStrategy::AudioBitrate {
                kbps,
                limit_to_target: limit,
            },
            Self::Resolution { width } => CompressionStrategy::Resolution { width },
            Self::FrameRate { fps } => CompressionStrategy::FrameRate { fps },
            Self::Crf { crf, preset } => CompressionStrategy::ConstantRateFactor { crf, preset },
            Self::AudioQuality { quality } => CompressionStrategy::AudioQuality { quality },
            Self::SampleRate { hz } => CompressionStrategy::AudioSampleRate { hz },
            Self::ImageQuality { quality } => CompressionStrategy::ImageQuality { quality },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("shrinker").chain(args.iter().copied()))
    }

    fn strategy_of(args: &[&str]) -> CompressionStrategy {
        match parse(args).unwrap().command {
            Commands::Compress(compress) => compress.strategy.into_strategy(),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_crf_defaults() {
        assert_eq!(
            strategy_of(&["compress", "-i", "a.mp4", "crf"]),
            CompressionStrategy::ConstantRateFactor {
                crf: 23,
                preset: SpeedPreset::Medium
            }
        );
        assert_eq!(
            strategy_of(&["compress", "-i", "a.mp4", "crf", "--crf", "18", "--preset", "slow"]),
            CompressionStrategy::ConstantRateFactor {
                crf: 18,
                preset: SpeedPreset::Slow
            }
        );
    }

    #[test]
    fn test_file_size_with_limit() {
        assert_eq!(
            strategy_of(&["compress", "-i", "a.mp4", "file-size", "--target-mb", "8.5", "--limit"]),
            CompressionStrategy::FileSize {
                target_mb: 8.5,
                limit_to_target: true
            }
        );
    }

    #[test]
    fn test_ranges_are_enforced() {
        assert!(parse(&["compress", "-i", "a.mp4", "crf", "--crf", "52"]).is_err());
        assert!(parse(&["compress", "-i", "a.mp3", "audio-quality", "--quality", "10"]).is_err());
        assert!(parse(&["compress", "-i", "a.jpg", "image-quality", "--quality", "1"]).is_err());
        assert!(parse(&["compress", "-i", "a.mp4", "resolution", "--width", "0"]).is_err());
        assert!(parse(&["compress", "-i", "a.mp4", "file-size", "--target-mb", "-1"]).is_err());
        assert!(parse(&["compress", "-i", "a.mp4", "crf", "--preset", "warp"]).is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = parse(&["probe", "-i", "a.wav", "--log-level", "debug", "--ffmpeg", "/opt/ffmpeg"])
            .unwrap();
        assert_eq!(cli.log_level, Some(crate::utils::logging::LogLevel::Debug));
        assert_eq!(cli.ffmpeg_path, Some(PathBuf::from("/opt/ffmpeg")));
    }
}

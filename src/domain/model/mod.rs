// Domain models - Core types and data structures

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::Serialize;

use crate::error::ShrinkXError;

/// Kind of source media, derived once from the file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Video,
    Audio,
    ImageJpeg,
    ImagePng,
    ImageGif,
}

impl MediaKind {
    /// Classify an extension (without the leading dot), ignoring case
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "mp4" | "mkv" | "avi" | "mov" => Some(Self::Video),
            "mp3" | "wav" => Some(Self::Audio),
            "jpg" | "jpeg" => Some(Self::ImageJpeg),
            "png" => Some(Self::ImagePng),
            "gif" => Some(Self::ImageGif),
            _ => None,
        }
    }

    /// Whether this kind is a still or animated image
    pub fn is_image(&self) -> bool {
        matches!(self, Self::ImageJpeg | Self::ImagePng | Self::ImageGif)
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Video => "video",
            Self::Audio => "audio",
            Self::ImageJpeg => "JPEG image",
            Self::ImagePng => "PNG image",
            Self::ImageGif => "GIF image",
        };
        f.write_str(name)
    }
}

/// Parameterless tag of a compression strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    FileSize,
    VideoBitrate,
    AudioBitrate,
    Resolution,
    FrameRate,
    ConstantRateFactor,
    AudioQuality,
    AudioSampleRate,
    ImageQuality,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FileSize => "file-size",
            Self::VideoBitrate => "video-bitrate",
            Self::AudioBitrate => "audio-bitrate",
            Self::Resolution => "resolution",
            Self::FrameRate => "frame-rate",
            Self::ConstantRateFactor => "crf",
            Self::AudioQuality => "audio-quality",
            Self::AudioSampleRate => "sample-rate",
            Self::ImageQuality => "image-quality",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// x265 encoding speed presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeedPreset {
    Ultrafast,
    Superfast,
    Veryfast,
    Faster,
    Fast,
    #[default]
    Medium,
    Slow,
    Slower,
    Veryslow,
    Placebo,
}

impl SpeedPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ultrafast => "ultrafast",
            Self::Superfast => "superfast",
            Self::Veryfast => "veryfast",
            Self::Faster => "faster",
            Self::Fast => "fast",
            Self::Medium => "medium",
            Self::Slow => "slow",
            Self::Slower => "slower",
            Self::Veryslow => "veryslow",
            Self::Placebo => "placebo",
        }
    }
}

impl fmt::Display for SpeedPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SpeedPreset {
    type Err = ShrinkXError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ultrafast" => Ok(Self::Ultrafast),
            "superfast" => Ok(Self::Superfast),
            "veryfast" => Ok(Self::Veryfast),
            "faster" => Ok(Self::Faster),
            "fast" => Ok(Self::Fast),
            "medium" => Ok(Self::Medium),
            "slow" => Ok(Self::Slow),
            "slower" => Ok(Self::Slower),
            "veryslow" => Ok(Self::Veryslow),
            "placebo" => Ok(Self::Placebo),
            other => Err(ShrinkXError::InvalidParameters {
                message: format!("Unknown speed preset: {}", other),
            }),
        }
    }
}

/// A compression strategy together with its parameters
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "strategy", rename_all = "kebab-case")]
pub enum CompressionStrategy {
    /// Aim for a total output size in megabytes
    FileSize { target_mb: f64, limit_to_target: bool },
    VideoBitrate { kbps: u32, limit_to_target: bool },
    AudioBitrate { kbps: u32, limit_to_target: bool },
    /// Scale to a target width, keeping the aspect ratio
    Resolution { width: u32 },
    FrameRate { fps: u32 },
    ConstantRateFactor { crf: u8, preset: SpeedPreset },
    /// libmp3lame VBR quality, 0 is best
    AudioQuality { quality: u8 },
    AudioSampleRate { hz: u32 },
    /// mjpeg qscale, 2 is best
    ImageQuality { quality: u8 },
}

impl CompressionStrategy {
    pub fn kind(&self) -> StrategyKind {
        match self {
            Self::FileSize { .. } => StrategyKind::FileSize,
            Self::VideoBitrate { .. } => StrategyKind::VideoBitrate,
            Self::AudioBitrate { .. } => StrategyKind::AudioBitrate,
            Self::Resolution { .. } => StrategyKind::Resolution,
            Self::FrameRate { .. } => StrategyKind::FrameRate,
            Self::ConstantRateFactor { .. } => StrategyKind::ConstantRateFactor,
            Self::AudioQuality { .. } => StrategyKind::AudioQuality,
            Self::AudioSampleRate { .. } => StrategyKind::AudioSampleRate,
            Self::ImageQuality { .. } => StrategyKind::ImageQuality,
        }
    }

    /// Whether building the command line depends on probed metadata
    pub fn needs_metadata(&self) -> bool {
        matches!(
            self,
            Self::FileSize { .. } | Self::Resolution { .. } | Self::AudioSampleRate { .. }
        )
    }
}

/// Frame dimensions in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Height that keeps the aspect ratio at `target_width`, rounded to the nearest even value
    pub fn scaled_height(&self, target_width: u32) -> u32 {
        if self.width == 0 {
            return 0;
        }
        let exact = target_width as f64 * self.height as f64 / self.width as f64;
        let even = ((exact / 2.0).round() * 2.0) as u32;
        even.max(2)
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Metadata extracted from an inspection run of the encoder
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MediaMetadata {
    /// Size of the source file in bytes
    pub size_bytes: u64,
    pub duration: Option<Duration>,
    pub resolution: Option<Resolution>,
    pub frame_rate: Option<f64>,
    pub video_bitrate_kbps: Option<u32>,
    pub audio_bitrate_kbps: Option<u32>,
    pub audio_sample_rate_hz: Option<u32>,
}

/// A single progress report handed to a progress sink
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressSample {
    /// Completed share of the job in [0, 1]
    pub fraction: f64,
    /// `fraction` scaled to the caller's maximum
    pub value: f64,
    /// Percentage rounded to two decimals, e.g. `42.17 %`
    pub text: String,
}

impl ProgressSample {
    pub fn initial() -> Self {
        Self {
            fraction: 0.0,
            value: 0.0,
            text: "0.0 %".to_string(),
        }
    }

    pub fn from_fraction(fraction: f64, max: f64) -> Self {
        let percent = (fraction * 10_000.0).round() / 100.0;
        Self {
            fraction,
            value: fraction * max,
            text: format!("{} %", percent),
        }
    }

    pub fn completed(max: f64) -> Self {
        Self {
            fraction: 1.0,
            value: max,
            text: "100 %".to_string(),
        }
    }

    /// Rescale the value to a different maximum
    pub fn scaled(mut self, max: f64) -> Self {
        self.value = self.fraction * max;
        self
    }
}

/// Lifecycle state of a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum JobState {
    Idle = 0,
    Running = 1,
    Paused = 2,
    Completed = 3,
    Cancelled = 4,
    Failed = 5,
}

impl JobState {
    /// Whether a new run may start from this state
    pub fn can_start(&self) -> bool {
        !matches!(self, Self::Running | Self::Paused)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Failed)
    }

    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Running,
            2 => Self::Paused,
            3 => Self::Completed,
            4 => Self::Cancelled,
            5 => Self::Failed,
            _ => Self::Idle,
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Snapshot of one transcode request on one source file
#[derive(Debug, Clone, Serialize)]
pub struct Job {
    pub source_path: PathBuf,
    pub kind: MediaKind,
    pub output_path: Option<PathBuf>,
    pub strategy: Option<CompressionStrategy>,
    pub state: JobState,
}

impl Job {
    pub fn new(source_path: impl AsRef<Path>, kind: MediaKind) -> Self {
        Self {
            source_path: source_path.as_ref().to_path_buf(),
            kind,
            output_path: None,
            strategy: None,
            state: JobState::Idle,
        }
    }
}

#[cfg(test)]
mod tests;

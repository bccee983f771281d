//! Per-strategy encoder command construction

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::domain::model::{CompressionStrategy, MediaKind, MediaMetadata};
use crate::domain::rules::StrategyValidator;
use crate::engine::parser::{ParseProfile, ProgressToken, X265_ERROR_PREFIX};
use crate::error::{ShrinkXError, ShrinkXResult};
use crate::output;
use crate::planner::{rates, CommandPlan};

/// Re-encode flags used whenever a video stream has to be rewritten
const VIDEO_REENCODE: [&str; 4] = ["-c:v", "libx265", "-c:a", "copy"];
/// Quality used when the strategy itself does not pick one
const FALLBACK_CRF: &str = "18";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TargetStream {
    Video,
    Audio,
}

impl TargetStream {
    fn specifier(&self) -> &'static str {
        match self {
            TargetStream::Video => "v",
            TargetStream::Audio => "a",
        }
    }
}

/// Builds encoder argument lists for a single source file
pub struct CommandBuilder {
    source: PathBuf,
    kind: MediaKind,
}

impl CommandBuilder {
    pub fn new(source: impl AsRef<Path>, kind: MediaKind) -> Self {
        Self {
            source: source.as_ref().to_path_buf(),
            kind,
        }
    }

    /// Plan the run and remove any stale file at the output path
    pub fn build(
        &self,
        strategy: &CompressionStrategy,
        metadata: Option<&MediaMetadata>,
    ) -> ShrinkXResult<CommandPlan> {
        let plan = self.plan(strategy, metadata)?;
        output::prepare_output(&plan.output_path)?;
        info!(
            "Planned {} for {} -> {}",
            strategy.kind(),
            self.source.display(),
            plan.output_path.display()
        );
        Ok(plan)
    }

    /// Pure half of [`build`](Self::build): compute arguments without touching the filesystem
    pub fn plan(
        &self,
        strategy: &CompressionStrategy,
        metadata: Option<&MediaMetadata>,
    ) -> ShrinkXResult<CommandPlan> {
        StrategyValidator::validate(strategy, self.kind)?;

        let output_path = output::derive_output_path(&self.source)?;
        let is_video = self.kind == MediaKind::Video;

        let mut args: Vec<String> = vec![
            "-hide_banner".into(),
            "-nostdin".into(),
            "-i".into(),
            self.source.to_string_lossy().into_owned(),
        ];

        let frame = ParseProfile::new(ProgressToken::Frame);
        let size = ParseProfile::new(ProgressToken::Size);
        let x265 = frame.with_codec_errors(X265_ERROR_PREFIX);

        let profile = match strategy {
            CompressionStrategy::Resolution { width } => {
                let height = metadata
                    .and_then(|m| m.resolution)
                    .map(|r| r.scaled_height(*width).to_string())
                    .unwrap_or_else(|| "-2".to_string());
                let scale = format!("scale={}:{}", width, height);
                push(&mut args, &["-vf", scale.as_str()]);
                if is_video {
                    push(&mut args, &VIDEO_REENCODE);
                    push(&mut args, &["-crf", FALLBACK_CRF]);
                    x265
                } else {
                    frame
                }
            }
            CompressionStrategy::FrameRate { fps } => {
                let fps = fps.to_string();
                push(&mut args, &["-r", fps.as_str()]);
                if is_video {
                    push(&mut args, &VIDEO_REENCODE);
                    push(&mut args, &["-crf", FALLBACK_CRF]);
                    x265
                } else {
                    frame
                }
            }
            CompressionStrategy::VideoBitrate {
                kbps,
                limit_to_target,
            } => push_bitrate(
                &mut args,
                TargetStream::Video,
                rates::kbps_to_bps(*kbps as f64),
                *limit_to_target,
            ),
            CompressionStrategy::AudioBitrate {
                kbps,
                limit_to_target,
            } => push_bitrate(
                &mut args,
                TargetStream::Audio,
                rates::kbps_to_bps(*kbps as f64),
                *limit_to_target,
            ),
            CompressionStrategy::FileSize {
                target_mb,
                limit_to_target,
            } => {
                let metadata = metadata.ok_or_else(|| ShrinkXError::InvalidParameters {
                    message: "File size target needs probed metadata".to_string(),
                })?;
                let duration = metadata.duration.ok_or_else(|| ShrinkXError::InvalidParameters {
                    message: "Source duration is unknown, cannot target a file size".to_string(),
                })?;

                let (stream, kbps) = if self.kind == MediaKind::Audio {
                    (
                        TargetStream::Audio,
                        rates::total_bitrate_kbps(*target_mb, duration)?,
                    )
                } else {
                    let audio = metadata.audio_bitrate_kbps.unwrap_or(0);
                    (
                        TargetStream::Video,
                        rates::video_bitrate_for_size_kbps(*target_mb, duration, audio)?,
                    )
                };
                debug!(target_mb, kbps, "Derived bitrate for size target");
                push_bitrate(&mut args, stream, rates::kbps_to_bps(kbps), *limit_to_target)
            }
            CompressionStrategy::ConstantRateFactor { crf, preset } => {
                push(&mut args, &VIDEO_REENCODE);
                let crf = crf.to_string();
                push(&mut args, &["-preset", preset.as_str(), "-crf", crf.as_str()]);
                x265
            }
            CompressionStrategy::AudioQuality { quality } => {
                let quality = quality.to_string();
                push(&mut args, &["-c:a", "libmp3lame", "-q:a", quality.as_str()]);
                size
            }
            CompressionStrategy::AudioSampleRate { hz } => {
                let hz = hz.to_string();
                push(&mut args, &["-ar", hz.as_str()]);
                if let Some(kbps) = metadata.and_then(|m| m.audio_bitrate_kbps) {
                    let bps = rates::kbps_to_bps(kbps as f64).to_string();
                    push(&mut args, &["-b:a", bps.as_str()]);
                }
                size
            }
            CompressionStrategy::ImageQuality { quality } => {
                let quality = quality.to_string();
                push(&mut args, &["-q:v", quality.as_str()]);
                size
            }
        };

        args.push(output_path.to_string_lossy().into_owned());

        Ok(CommandPlan {
            args,
            output_path,
            profile,
            known_duration: metadata.and_then(|m| m.duration),
        })
    }
}

fn push(args: &mut Vec<String>, parts: &[&str]) {
    args.extend(parts.iter().map(|s| s.to_string()));
}

fn push_bitrate(
    args: &mut Vec<String>,
    stream: TargetStream,
    bps: u64,
    limit_to_target: bool,
) -> ParseProfile {
    let bps = bps.to_string();
    let spec = stream.specifier();
    push(args, &[format!("-b:{}", spec).as_str(), bps.as_str()]);

    let profile = match stream {
        TargetStream::Video => {
            push(args, &VIDEO_REENCODE);
            ParseProfile::new(ProgressToken::Frame).with_codec_errors(X265_ERROR_PREFIX)
        }
        TargetStream::Audio => ParseProfile::new(ProgressToken::Size),
    };

    if limit_to_target {
        let maxrate = format!("-maxrate:{}", spec);
        let bufsize = format!("-bufsize:{}", spec);
        push(
            args,
            &[maxrate.as_str(), bps.as_str(), bufsize.as_str(), bps.as_str()],
        );
    }
    profile
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Resolution, SpeedPreset};
    use std::time::Duration;

    fn video_metadata() -> MediaMetadata {
        MediaMetadata {
            size_bytes: 50_000_000,
            duration: Some(Duration::from_secs(100)),
            resolution: Some(Resolution::new(1920, 1080)),
            frame_rate: Some(29.97),
            video_bitrate_kbps: Some(4000),
            audio_bitrate_kbps: Some(128),
            audio_sample_rate_hz: None,
        }
    }

    fn tail(plan: &CommandPlan) -> Vec<&str> {
        plan.args[4..plan.args.len() - 1]
            .iter()
            .map(String::as_str)
            .collect()
    }

    #[test]
    fn test_common_prefix_and_output() {
        let builder = CommandBuilder::new("/media/my clip.mp4", MediaKind::Video);
        let plan = builder
            .plan(&CompressionStrategy::FrameRate { fps: 24 }, None)
            .unwrap();
        assert_eq!(
            &plan.args[..4],
            &["-hide_banner", "-nostdin", "-i", "/media/my clip.mp4"]
        );
        assert_eq!(
            plan.args.last().map(String::as_str),
            Some("/media/my clip_COMPRESSED.mp4")
        );
    }

    #[test]
    fn test_resolution_video_keeps_even_height() {
        let builder = CommandBuilder::new("/media/a.mp4", MediaKind::Video);
        let metadata = video_metadata();
        let plan = builder
            .plan(&CompressionStrategy::Resolution { width: 720 }, Some(&metadata))
            .unwrap();
        assert_eq!(
            tail(&plan),
            vec!["-vf", "scale=720:406", "-c:v", "libx265", "-c:a", "copy", "-crf", "18"]
        );
        assert_eq!(plan.profile.progress_token, ProgressToken::Frame);
        assert_eq!(plan.profile.codec_error_prefix, Some(X265_ERROR_PREFIX));
    }

    #[test]
    fn test_resolution_image_skips_codec_flags() {
        let builder = CommandBuilder::new("/media/a.png", MediaKind::ImagePng);
        let plan = builder
            .plan(&CompressionStrategy::Resolution { width: 320 }, None)
            .unwrap();
        assert_eq!(tail(&plan), vec!["-vf", "scale=320:-2"]);
        assert_eq!(plan.profile.codec_error_prefix, None);
    }

    #[test]
    fn test_file_size_subtracts_audio_bitrate() {
        let builder = CommandBuilder::new("/media/a.mkv", MediaKind::Video);
        let metadata = video_metadata();
        let plan = builder
            .plan(
                &CompressionStrategy::FileSize {
                    target_mb: 10.0,
                    limit_to_target: false,
                },
                Some(&metadata),
            )
            .unwrap();
        assert_eq!(
            tail(&plan),
            vec!["-b:v", "672000", "-c:v", "libx265", "-c:a", "copy"]
        );
    }

    #[test]
    fn test_file_size_audio_uses_total_bitrate_with_limit() {
        let builder = CommandBuilder::new("/media/a.mp3", MediaKind::Audio);
        let metadata = MediaMetadata {
            duration: Some(Duration::from_secs(200)),
            audio_bitrate_kbps: Some(320),
            ..Default::default()
        };
        let plan = builder
            .plan(
                &CompressionStrategy::FileSize {
                    target_mb: 5.0,
                    limit_to_target: true,
                },
                Some(&metadata),
            )
            .unwrap();
        assert_eq!(
            tail(&plan),
            vec!["-b:a", "200000", "-maxrate:a", "200000", "-bufsize:a", "200000"]
        );
        assert_eq!(plan.profile.progress_token, ProgressToken::Size);
    }

    #[test]
    fn test_file_size_without_duration_fails() {
        let builder = CommandBuilder::new("/media/a.mp4", MediaKind::Video);
        let metadata = MediaMetadata::default();
        let result = builder.plan(
            &CompressionStrategy::FileSize {
                target_mb: 10.0,
                limit_to_target: false,
            },
            Some(&metadata),
        );
        assert!(matches!(result, Err(ShrinkXError::InvalidParameters { .. })));
    }

    #[test]
    fn test_video_bitrate_with_limit() {
        let builder = CommandBuilder::new("/media/a.avi", MediaKind::Video);
        let plan = builder
            .plan(
                &CompressionStrategy::VideoBitrate {
                    kbps: 1500,
                    limit_to_target: true,
                },
                None,
            )
            .unwrap();
        assert_eq!(
            tail(&plan),
            vec![
                "-b:v", "1500000", "-c:v", "libx265", "-c:a", "copy", "-maxrate:v", "1500000",
                "-bufsize:v", "1500000"
            ]
        );
    }

    #[test]
    fn test_crf_with_preset() {
        let builder = CommandBuilder::new("/media/a.mov", MediaKind::Video);
        let plan = builder
            .plan(
                &CompressionStrategy::ConstantRateFactor {
                    crf: 28,
                    preset: SpeedPreset::Slow,
                },
                None,
            )
            .unwrap();
        assert_eq!(
            tail(&plan),
            vec!["-c:v", "libx265", "-c:a", "copy", "-preset", "slow", "-crf", "28"]
        );
    }

    #[test]
    fn test_gif_frame_rate_has_no_codec_flags() {
        let builder = CommandBuilder::new("/media/a.gif", MediaKind::ImageGif);
        let plan = builder
            .plan(&CompressionStrategy::FrameRate { fps: 10 }, None)
            .unwrap();
        assert_eq!(tail(&plan), vec!["-r", "10"]);
    }

    #[test]
    fn test_sample_rate_preserves_audio_bitrate() {
        let builder = CommandBuilder::new("/media/a.wav", MediaKind::Audio);
        let metadata = MediaMetadata {
            audio_bitrate_kbps: Some(1411),
            ..Default::default()
        };
        let plan = builder
            .plan(&CompressionStrategy::AudioSampleRate { hz: 22050 }, Some(&metadata))
            .unwrap();
        assert_eq!(tail(&plan), vec!["-ar", "22050", "-b:a", "1411000"]);
    }

    #[test]
    fn test_audio_and_image_quality() {
        let builder = CommandBuilder::new("/media/a.mp3", MediaKind::Audio);
        let plan = builder
            .plan(&CompressionStrategy::AudioQuality { quality: 4 }, None)
            .unwrap();
        assert_eq!(tail(&plan), vec!["-c:a", "libmp3lame", "-q:a", "4"]);

        let builder = CommandBuilder::new("/media/a.jpg", MediaKind::ImageJpeg);
        let plan = builder
            .plan(&CompressionStrategy::ImageQuality { quality: 5 }, None)
            .unwrap();
        assert_eq!(tail(&plan), vec!["-q:v", "5"]);
        assert_eq!(plan.profile.progress_token, ProgressToken::Size);
    }

    #[test]
    fn test_unavailable_strategy_rejected() {
        let builder = CommandBuilder::new("/media/a.png", MediaKind::ImagePng);
        let result = builder.plan(&CompressionStrategy::FrameRate { fps: 10 }, None);
        assert!(matches!(result, Err(ShrinkXError::UnsupportedStrategy { .. })));
    }
}

//! Media metadata extraction from an inspection-only ffmpeg run

use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use regex::{Captures, Regex};
use tracing::{debug, info};

use crate::adapters::NoopSuspender;
use crate::domain::model::{MediaKind, MediaMetadata, Resolution};
use crate::engine::parser::{ParseEvent, ParseProfile, ProgressToken, StreamingOutputParser};
use crate::engine::supervisor::ProcessSupervisor;
use crate::error::{ShrinkXError, ShrinkXResult};
use crate::ports::ProbePort;
use crate::probe::validator::classify_media_kind;

fn video_stream_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^\s*Stream #\d+:\d+.*?: Video: .+?, (\d+)x(\d+).*?,(?: (\d+) kb/s,)? (\d+(?:\.\d+)?) fps",
        )
        .expect("valid video stream regex")
    })
}

fn audio_stream_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*Stream #\d+:\d+.*?: Audio: .+?, (\d+) Hz.+?, (\d+) kb/s")
            .expect("valid audio stream regex")
    })
}

fn image_stream_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*Stream #\d+:\d+.*?: Video: .+?, (\d+)x(\d+)")
            .expect("valid image stream regex")
    })
}

fn capture<T: std::str::FromStr>(caps: &Captures<'_>, index: usize) -> Option<T> {
    caps.get(index).and_then(|m| m.as_str().parse().ok())
}

/// Accumulates metadata from inspection output, one line at a time.
///
/// The first matching stream line wins; later streams never overwrite it.
pub struct MetadataExtractor {
    kind: MediaKind,
    parser: StreamingOutputParser,
    metadata: MediaMetadata,
    stream_found: bool,
}

impl MetadataExtractor {
    pub fn new(kind: MediaKind) -> Self {
        Self {
            kind,
            parser: StreamingOutputParser::new(ParseProfile::new(ProgressToken::Size)),
            metadata: MediaMetadata::default(),
            stream_found: false,
        }
    }

    /// Whether every field this kind can provide has been captured
    pub fn is_complete(&self) -> bool {
        match self.kind {
            MediaKind::Video => {
                self.stream_found
                    && self.parser.duration().is_some()
                    && self.parser.audio_bitrate_kbps().is_some()
            }
            MediaKind::Audio => self.stream_found && self.parser.duration().is_some(),
            _ => self.stream_found,
        }
    }

    /// Feed one line. Returns an error if the line reports a fatal condition.
    pub fn feed(&mut self, line: &str) -> Option<ShrinkXError> {
        if let ParseEvent::Fatal { kind, message } = self.parser.feed(line) {
            return Some(kind.into_error(message));
        }
        if self.stream_found {
            return None;
        }

        match self.kind {
            MediaKind::Video => {
                if let Some(caps) = video_stream_regex().captures(line) {
                    self.metadata.resolution = resolution(&caps);
                    self.metadata.video_bitrate_kbps = capture(&caps, 3);
                    self.metadata.frame_rate = capture(&caps, 4);
                    self.stream_found = self.metadata.resolution.is_some();
                }
            }
            MediaKind::Audio => {
                if let Some(caps) = audio_stream_regex().captures(line) {
                    self.metadata.audio_sample_rate_hz = capture(&caps, 1);
                    self.metadata.audio_bitrate_kbps = capture(&caps, 2);
                    self.stream_found = true;
                }
            }
            MediaKind::ImageJpeg | MediaKind::ImagePng | MediaKind::ImageGif => {
                if let Some(caps) = image_stream_regex().captures(line) {
                    self.metadata.resolution = resolution(&caps);
                    self.stream_found = self.metadata.resolution.is_some();
                }
            }
        }
        None
    }

    /// Finalise the metadata; fails when no stream description was recognised
    pub fn finish(mut self, size_bytes: u64) -> ShrinkXResult<MediaMetadata> {
        if !self.stream_found {
            return Err(ShrinkXError::ProbeError {
                message: format!("No {} stream description found", self.kind),
            });
        }
        self.metadata.size_bytes = size_bytes;
        self.metadata.duration = self.parser.duration();
        if self.metadata.audio_bitrate_kbps.is_none() {
            self.metadata.audio_bitrate_kbps = self.parser.audio_bitrate_kbps();
        }
        Ok(self.metadata)
    }
}

fn resolution(caps: &Captures<'_>) -> Option<Resolution> {
    Some(Resolution::new(capture(caps, 1)?, capture(caps, 2)?))
}

/// Probes media files by running ffmpeg without an output
pub struct MediaInspector {
    ffmpeg_path: PathBuf,
    supervisor: ProcessSupervisor,
}

impl MediaInspector {
    pub fn new(ffmpeg_path: impl AsRef<Path>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.as_ref().to_path_buf(),
            supervisor: ProcessSupervisor::new(Arc::new(NoopSuspender)),
        }
    }

    /// Inspect a source file
    pub async fn inspect(&self, source: &Path) -> ShrinkXResult<MediaMetadata> {
        let kind = classify_media_kind(source)?;
        let size_bytes = std::fs::metadata(source)
            .map_err(|e| ShrinkXError::ProbeError {
                message: format!("Cannot read {}: {}", source.display(), e),
            })?
            .len();

        let args = vec![
            "-hide_banner".to_string(),
            "-nostdin".to_string(),
            "-i".to_string(),
            source.to_string_lossy().into_owned(),
        ];
        let mut process = self.supervisor.start(&self.ffmpeg_path, &args)?;

        let mut extractor = MetadataExtractor::new(kind);
        let mut fatal = None;
        // Drain everything so the process can be joined, but stop matching once done.
        while let Some(line) = process.next_line().await {
            if fatal.is_some() || extractor.is_complete() {
                continue;
            }
            fatal = extractor.feed(&line);
        }
        // Without an output file ffmpeg always exits non-zero.
        let outcome = process.wait().await?;
        debug!(?outcome, "Inspection run finished");

        if let Some(error) = fatal {
            return Err(error);
        }
        let metadata = extractor.finish(size_bytes)?;
        info!(
            "Probed {}: duration={:?} resolution={:?}",
            source.display(),
            metadata.duration,
            metadata.resolution
        );
        Ok(metadata)
    }
}

#[async_trait]
impl ProbePort for MediaInspector {
    async fn probe(&self, source: &Path) -> ShrinkXResult<MediaMetadata> {
        self.inspect(source).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const VIDEO_PROBE: &[&str] = &[
        "Input #0, mov,mp4,m4a,3gp,3g2,mj2, from 'clip.mp4':",
        "  Metadata:",
        "    major_brand     : isom",
        "  Duration: 00:01:40.00, start: 0.000000, bitrate: 4632 kb/s",
        "  Stream #0:0[0x1](und): Video: h264 (High) (avc1 / 0x31637661), yuv420p(tv, bt709, progressive), 1920x1080 [SAR 1:1 DAR 16:9], 4500 kb/s, 29.97 fps, 29.97 tbr, 30k tbn (default)",
        "  Stream #0:1[0x2](und): Audio: aac (LC) (mp4a / 0x6134706D), 48000 Hz, stereo, fltp, 128 kb/s (default)",
        "  Stream #0:2[0x3](und): Video: h264 (Baseline), yuv420p, 320x240, 200 kb/s, 15 fps",
        "At least one output file must be specified",
    ];

    #[test]
    fn test_extracts_video_metadata() {
        let mut extractor = MetadataExtractor::new(MediaKind::Video);
        for line in VIDEO_PROBE {
            assert!(extractor.feed(line).is_none());
        }
        assert!(extractor.is_complete());

        let metadata = extractor.finish(1234).unwrap();
        assert_eq!(metadata.size_bytes, 1234);
        assert_eq!(metadata.duration, Some(Duration::from_secs(100)));
        assert_eq!(metadata.resolution, Some(Resolution::new(1920, 1080)));
        assert_eq!(metadata.video_bitrate_kbps, Some(4500));
        assert_eq!(metadata.frame_rate, Some(29.97));
        assert_eq!(metadata.audio_bitrate_kbps, Some(128));
    }

    #[test]
    fn test_video_without_bitrate() {
        let mut extractor = MetadataExtractor::new(MediaKind::Video);
        extractor.feed("  Stream #0:0: Video: vp9 (Profile 0), yuv420p(tv), 640x360, SAR 1:1 DAR 16:9, 25 fps, 25 tbr, 1k tbn");
        let metadata = extractor.finish(1).unwrap();
        assert_eq!(metadata.resolution, Some(Resolution::new(640, 360)));
        assert_eq!(metadata.video_bitrate_kbps, None);
        assert_eq!(metadata.frame_rate, Some(25.0));
    }

    #[test]
    fn test_extracts_audio_metadata() {
        let mut extractor = MetadataExtractor::new(MediaKind::Audio);
        extractor.feed("  Duration: 00:03:20.00, start: 0.025057, bitrate: 320 kb/s");
        extractor.feed("  Stream #0:0: Audio: mp3 (mp3float), 44100 Hz, stereo, fltp, 320 kb/s");
        extractor.feed("  Stream #0:1: Video: mjpeg (Baseline), yuvj420p(pc), 500x500, 90k tbr, 90k tbn (attached pic)");
        assert!(extractor.is_complete());

        let metadata = extractor.finish(8_000_000).unwrap();
        assert_eq!(metadata.audio_sample_rate_hz, Some(44100));
        assert_eq!(metadata.audio_bitrate_kbps, Some(320));
        assert_eq!(metadata.resolution, None);
    }

    #[test]
    fn test_extracts_image_dimensions() {
        let mut extractor = MetadataExtractor::new(MediaKind::ImagePng);
        extractor.feed("  Stream #0:0: Video: png, rgba(pc), 800x600, 25 fps, 25 tbr, 25 tbn");
        let metadata = extractor.finish(42).unwrap();
        assert_eq!(metadata.resolution, Some(Resolution::new(800, 600)));
    }

    #[test]
    fn test_missing_stream_is_probe_error() {
        let mut extractor = MetadataExtractor::new(MediaKind::Video);
        extractor.feed("clip.mp4: Invalid data found when processing input");
        let err = extractor.finish(0).unwrap_err();
        assert!(matches!(err, ShrinkXError::ProbeError { .. }));
    }

    #[test]
    fn test_missing_file_line_is_fatal() {
        let mut extractor = MetadataExtractor::new(MediaKind::Audio);
        let err = extractor
            .feed("/music/song.mp3: No such file or directory")
            .unwrap();
        assert!(matches!(err, ShrinkXError::PathTooLong { ref path } if path == "/music/song.mp3"));
    }

    #[test]
    fn test_first_stream_wins() {
        let mut extractor = MetadataExtractor::new(MediaKind::ImageGif);
        extractor.feed("  Stream #0:0: Video: gif, bgra, 400x300, 10 fps");
        extractor.feed("  Stream #0:1: Video: gif, bgra, 100x100, 10 fps");
        let metadata = extractor.finish(1).unwrap();
        assert_eq!(metadata.resolution, Some(Resolution::new(400, 300)));
    }
}

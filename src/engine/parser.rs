//! Incremental parser for ffmpeg's diagnostic output
//!
//! Each call to [`StreamingOutputParser::feed`] classifies one line. Fatal
//! patterns take priority, then the input duration (only until it is known),
//! then progress lines carrying `time=`. Everything else is ignored.

use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use tracing::debug;

use crate::domain::model::ProgressSample;
use crate::error::ShrinkXError;
use crate::utils::time::parse_timestamp;

const DEVICE_FULL_SUFFIX: &str = "No space left on device";
const IO_ERROR_SUFFIX: &str = "I/O error";
const NOT_FOUND_SUFFIX: &str = ": No such file or directory";

/// Prefix x265 uses for fatal encoder errors
pub const X265_ERROR_PREFIX: &str = "x265 [error]: ";

fn duration_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*Duration:\s*(\d{2,}:\d{2}:\d{2}\.\d{2})").expect("valid duration regex")
    })
}

fn frame_progress_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^frame=\s*\d+\s.*?time=\s*(\d{2,}:\d{2}:\d{2}\.\d{2})")
            .expect("valid frame progress regex")
    })
}

fn size_progress_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^size=\s*(?:\d+\s*(?:kB|KiB)|N/A).*?time=\s*(\d{2,}:\d{2}:\d{2}\.\d{2})")
            .expect("valid size progress regex")
    })
}

fn audio_bitrate_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*Stream .+: Audio: .+ (\d+) kb/s").expect("valid audio bitrate regex")
    })
}

/// Leading token of the stats line the encoder prints for a given job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressToken {
    /// `frame=` lines, printed when a video stream is encoded
    Frame,
    /// `size=` lines, printed for audio and single-image outputs
    Size,
}

impl ProgressToken {
    fn regex(&self) -> &'static Regex {
        match self {
            ProgressToken::Frame => frame_progress_regex(),
            ProgressToken::Size => size_progress_regex(),
        }
    }
}

/// What the parser looks for in one run's output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseProfile {
    pub progress_token: ProgressToken,
    /// Lines starting with this prefix are fatal codec errors
    pub codec_error_prefix: Option<&'static str>,
}

impl ParseProfile {
    pub fn new(progress_token: ProgressToken) -> Self {
        Self {
            progress_token,
            codec_error_prefix: None,
        }
    }

    pub fn with_codec_errors(mut self, prefix: &'static str) -> Self {
        self.codec_error_prefix = Some(prefix);
        self
    }
}

/// Category of an unrecoverable encoder failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FatalKind {
    /// Out of disk space or an I/O failure
    DeviceFull,
    /// The encoder could not open a path, usually because it is too long
    PathTooLong,
    Codec,
}

impl FatalKind {
    pub fn into_error(self, message: String) -> ShrinkXError {
        match self {
            FatalKind::DeviceFull => ShrinkXError::DeviceFull { message },
            FatalKind::PathTooLong => ShrinkXError::PathTooLong { path: message },
            FatalKind::Codec => ShrinkXError::CodecError { message },
        }
    }
}

/// Classification of a single diagnostic line
#[derive(Debug, Clone, PartialEq)]
pub enum ParseEvent {
    DurationDiscovered(Duration),
    /// Progress with `value` on a 0..=1 scale
    ProgressTick(ProgressSample),
    Fatal { kind: FatalKind, message: String },
    Ignored,
}

/// Line-at-a-time parser holding the running state of one encoder run
#[derive(Debug, Clone)]
pub struct StreamingOutputParser {
    profile: ParseProfile,
    duration: Option<Duration>,
    audio_bitrate_kbps: Option<u32>,
    halted: bool,
}

impl StreamingOutputParser {
    pub fn new(profile: ParseProfile) -> Self {
        Self {
            profile,
            duration: None,
            audio_bitrate_kbps: None,
            halted: false,
        }
    }

    /// Seed the duration from an earlier probe; a `Duration:` line will then be ignored
    pub fn with_known_duration(mut self, duration: Option<Duration>) -> Self {
        self.duration = duration.filter(|d| !d.is_zero());
        self
    }

    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    /// Bitrate of the first audio stream seen in the output
    pub fn audio_bitrate_kbps(&self) -> Option<u32> {
        self.audio_bitrate_kbps
    }

    /// Whether a fatal line has been seen
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Classify one line and update the running state
    pub fn feed(&mut self, line: &str) -> ParseEvent {
        if self.halted {
            return ParseEvent::Ignored;
        }

        if let Some((kind, message)) = self.match_fatal(line) {
            self.halted = true;
            return ParseEvent::Fatal { kind, message };
        }

        if self.audio_bitrate_kbps.is_none() {
            if let Some(kbps) = audio_bitrate_regex()
                .captures(line)
                .and_then(|caps| caps[1].parse().ok())
            {
                self.audio_bitrate_kbps = Some(kbps);
                return ParseEvent::Ignored;
            }
        }

        if self.duration.is_none() {
            if let Some(caps) = duration_regex().captures(line) {
                return match parse_timestamp(&caps[1]) {
                    Ok(duration) if !duration.is_zero() => {
                        self.duration = Some(duration);
                        ParseEvent::DurationDiscovered(duration)
                    }
                    _ => ParseEvent::Ignored,
                };
            }
        }

        self.match_progress(line).unwrap_or(ParseEvent::Ignored)
    }

    fn match_fatal(&self, line: &str) -> Option<(FatalKind, String)> {
        let trimmed = line.trim_end();

        if trimmed.ends_with(DEVICE_FULL_SUFFIX) || trimmed.ends_with(IO_ERROR_SUFFIX) {
            return Some((FatalKind::DeviceFull, trimmed.to_string()));
        }

        if let Some(path) = trimmed.strip_suffix(NOT_FOUND_SUFFIX) {
            return Some((FatalKind::PathTooLong, path.trim().to_string()));
        }

        let prefix = self.profile.codec_error_prefix?;
        trimmed
            .strip_prefix(prefix)
            .map(|message| (FatalKind::Codec, message.to_string()))
    }

    fn match_progress(&self, line: &str) -> Option<ParseEvent> {
        let caps = self.profile.progress_token.regex().captures(line)?;
        let duration = self.duration?;
        let elapsed = parse_timestamp(&caps[1]).ok()?;

        let raw = elapsed.as_secs_f64() / duration.as_secs_f64();
        if raw > 1.0 {
            debug!(elapsed = ?elapsed, duration = ?duration, "Progress overshoots duration, clamping");
        }
        let fraction = raw.clamp(0.0, 1.0);

        Some(ParseEvent::ProgressTick(ProgressSample::from_fraction(
            fraction, 1.0,
        )))
    }
}

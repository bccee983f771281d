//! Bitrate arithmetic for size-targeted strategies

use std::time::Duration;

use crate::error::{ShrinkXError, ShrinkXResult};

/// Kilobits in one (decimal) megabyte
const KILOBITS_PER_MEGABYTE: f64 = 8_000.0;

/// Total kb/s needed to fit `duration` of media into `target_mb`
pub fn total_bitrate_kbps(target_mb: f64, duration: Duration) -> ShrinkXResult<f64> {
    let seconds = duration.as_secs_f64();
    if seconds <= 0.0 {
        return Err(ShrinkXError::InvalidParameters {
            message: "Source duration is zero, cannot derive a bitrate".to_string(),
        });
    }
    Ok(target_mb * KILOBITS_PER_MEGABYTE / seconds)
}

/// Video kb/s left for `target_mb` once the audio stream's share is taken out
pub fn video_bitrate_for_size_kbps(
    target_mb: f64,
    duration: Duration,
    audio_kbps: u32,
) -> ShrinkXResult<f64> {
    let total = total_bitrate_kbps(target_mb, duration)?;
    let video = total - audio_kbps as f64;
    if video <= 0.0 {
        return Err(ShrinkXError::InvalidParameters {
            message: format!(
                "Target of {} MB leaves no room for video: {:.1} kb/s total, audio alone needs {} kb/s",
                target_mb, total, audio_kbps
            ),
        });
    }
    Ok(video)
}

/// Convert kb/s to the bit/s value ffmpeg expects
pub fn kbps_to_bps(kbps: f64) -> u64 {
    (kbps * 1000.0).round() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_bitrate_subtracts_audio() {
        let kbps = video_bitrate_for_size_kbps(10.0, Duration::from_secs(100), 128).unwrap();
        assert_eq!(kbps, 672.0);
        assert_eq!(kbps_to_bps(kbps), 672_000);
    }

    #[test]
    fn test_total_bitrate_for_audio() {
        let kbps = total_bitrate_kbps(5.0, Duration::from_secs(200)).unwrap();
        assert_eq!(kbps, 200.0);
    }

    #[test]
    fn test_zero_duration_rejected() {
        assert!(total_bitrate_kbps(10.0, Duration::ZERO).is_err());
    }

    #[test]
    fn test_audio_larger_than_target_rejected() {
        let err = video_bitrate_for_size_kbps(1.0, Duration::from_secs(100), 128).unwrap_err();
        assert!(matches!(err, ShrinkXError::InvalidParameters { .. }));
    }
}

// Unit tests for domain models

use super::*;

#[test]
fn test_media_kind_from_supported_extensions() {
    for ext in ["mp4", "mkv", "avi", "mov"] {
        assert_eq!(MediaKind::from_extension(ext), Some(MediaKind::Video));
    }
    for ext in ["mp3", "wav"] {
        assert_eq!(MediaKind::from_extension(ext), Some(MediaKind::Audio));
    }
    assert_eq!(MediaKind::from_extension("jpg"), Some(MediaKind::ImageJpeg));
    assert_eq!(MediaKind::from_extension("jpeg"), Some(MediaKind::ImageJpeg));
    assert_eq!(MediaKind::from_extension("png"), Some(MediaKind::ImagePng));
    assert_eq!(MediaKind::from_extension("gif"), Some(MediaKind::ImageGif));
}

#[test]
fn test_media_kind_ignores_case() {
    assert_eq!(MediaKind::from_extension("MP4"), Some(MediaKind::Video));
    assert_eq!(MediaKind::from_extension("Gif"), Some(MediaKind::ImageGif));
}

#[test]
fn test_media_kind_rejects_unknown_extension() {
    assert_eq!(MediaKind::from_extension("webm"), None);
    assert_eq!(MediaKind::from_extension(""), None);
}

#[test]
fn test_speed_preset_parse() {
    assert_eq!("medium".parse::<SpeedPreset>().unwrap(), SpeedPreset::Medium);
    assert_eq!("VerySlow".parse::<SpeedPreset>().unwrap(), SpeedPreset::Veryslow);
    assert!("turbo".parse::<SpeedPreset>().is_err());
    assert_eq!(SpeedPreset::default(), SpeedPreset::Medium);
}

#[test]
fn test_scaled_height_is_even_and_close() {
    let source = Resolution::new(1920, 1080);
    let height = source.scaled_height(720);
    assert_eq!(height % 2, 0);
    assert!((height as f64 - 720.0 * 9.0 / 16.0).abs() <= 1.0);
    assert_eq!(height, 406);
}

#[test]
fn test_scaled_height_odd_source() {
    let source = Resolution::new(641, 479);
    let height = source.scaled_height(320);
    assert_eq!(height % 2, 0);
    assert!(height >= 2);
}

#[test]
fn test_progress_sample_text() {
    assert_eq!(ProgressSample::initial().text, "0.0 %");
    assert_eq!(ProgressSample::from_fraction(0.4217, 100.0).text, "42.17 %");
    assert_eq!(ProgressSample::from_fraction(0.5, 100.0).text, "50 %");
    assert_eq!(ProgressSample::completed(1_000_000.0).value, 1_000_000.0);
    assert_eq!(ProgressSample::completed(100.0).text, "100 %");
}

#[test]
fn test_progress_sample_scaling() {
    let sample = ProgressSample::from_fraction(0.25, 100.0).scaled(1_000_000.0);
    assert_eq!(sample.value, 250_000.0);
    assert_eq!(sample.text, "25 %");
}

#[test]
fn test_strategy_kind_and_metadata_needs() {
    let strategy = CompressionStrategy::ConstantRateFactor {
        crf: 18,
        preset: SpeedPreset::Medium,
    };
    assert_eq!(strategy.kind(), StrategyKind::ConstantRateFactor);
    assert!(!strategy.needs_metadata());

    let strategy = CompressionStrategy::FileSize {
        target_mb: 10.0,
        limit_to_target: false,
    };
    assert!(strategy.needs_metadata());
}

#[test]
fn test_job_state_transitions_allowed() {
    assert!(JobState::Idle.can_start());
    assert!(JobState::Cancelled.can_start());
    assert!(!JobState::Running.can_start());
    assert!(!JobState::Paused.can_start());
    assert_eq!(JobState::from_u8(JobState::Paused as u8), JobState::Paused);
}

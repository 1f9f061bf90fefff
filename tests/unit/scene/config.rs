use super::*;

#[test]
fn timeline_derives_total_and_interval() {
    let t = TimelineConfig::new(5, 30).unwrap();
    assert_eq!(t.total_duration_ms(), 5000.0);
    assert!((t.frame_interval_ms() - 33.333_333).abs() < 1e-3);
    assert_eq!(t.total_frames(), 150);
}

#[test]
fn timeline_rejects_out_of_range_values() {
    assert!(matches!(
        TimelineConfig::new(0, 30),
        Err(ReelError::InvalidConfiguration(_))
    ));
    assert!(TimelineConfig::new(31, 30).is_err());
    assert!(TimelineConfig::new(5, 9).is_err());
    assert!(TimelineConfig::new(5, 61).is_err());
    assert!(TimelineConfig::new(1, 10).is_ok());
    assert!(TimelineConfig::new(30, 60).is_ok());
}

#[test]
fn render_config_must_match_a_preset() {
    let mut cfg = RenderConfig::new("Hello", "", BackgroundStyle::Aurora, ResolutionPreset::P720);
    assert_eq!((cfg.width_px, cfg.height_px), (1280, 720));
    assert!(cfg.validate().is_ok());

    cfg.width_px = 1000;
    assert!(matches!(
        cfg.validate(),
        Err(ReelError::InvalidConfiguration(_))
    ));

    cfg.width_px = 0;
    assert!(cfg.validate().is_err());
}

#[test]
fn blank_title_falls_back_and_blank_subtitle_is_omitted() {
    let cfg = RenderConfig::new("   ", "", BackgroundStyle::Waves, ResolutionPreset::P480);
    assert_eq!(cfg.display_title(), PLACEHOLDER_TITLE);
    assert_eq!(cfg.display_subtitle(), None);

    let cfg = RenderConfig::new(" Hi ", " sub ", BackgroundStyle::Waves, ResolutionPreset::P480);
    assert_eq!(cfg.display_title(), "Hi");
    assert_eq!(cfg.display_subtitle(), Some("sub"));
}

#[test]
fn enums_parse_case_insensitively() {
    assert_eq!(
        "Particles".parse::<BackgroundStyle>().unwrap(),
        BackgroundStyle::Particles
    );
    assert_eq!(
        "1080P".parse::<ResolutionPreset>().unwrap(),
        ResolutionPreset::P1080
    );
    assert!("sparkles".parse::<BackgroundStyle>().is_err());
    assert!("4k".parse::<ResolutionPreset>().is_err());
}

#[test]
fn recording_config_json_uses_defaults() {
    let json = r#"{ "title": "Hello", "background": "waves", "resolution": "square" }"#;
    let cfg = RecordingConfig::from_reader(json.as_bytes()).unwrap();
    assert_eq!(cfg.duration_seconds, 5);
    assert_eq!(cfg.fps, 30);

    let (render, timeline, capture) = cfg.into_parts().unwrap();
    assert_eq!(render.background, BackgroundStyle::Waves);
    assert_eq!((render.width_px, render.height_px), (1080, 1080));
    assert_eq!(timeline.total_frames(), 150);
    assert_eq!(capture.bitrate_bps, DEFAULT_BITRATE_BPS);
}

#[test]
fn recording_config_rejects_bad_bitrate_and_json() {
    let cfg = RecordingConfig {
        bitrate_bps: Some(10),
        ..Default::default()
    };
    assert!(cfg.validate().is_err());
    assert!(RecordingConfig::default().validate().is_ok());
    assert!(matches!(
        cfg.into_parts(),
        Err(ReelError::InvalidConfiguration(_))
    ));

    let err = RecordingConfig::from_reader(&b"{ not json"[..]).unwrap_err();
    assert!(matches!(err, ReelError::Serde(_)));
}

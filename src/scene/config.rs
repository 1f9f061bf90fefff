use crate::foundation::core::Canvas;
use crate::foundation::error::{ReelError, ReelResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::str::FromStr;

/// Inclusive recording duration bounds, in seconds.
pub const DURATION_SECONDS_RANGE: std::ops::RangeInclusive<u32> = 1..=30;
/// Inclusive frame-rate bounds.
pub const FPS_RANGE: std::ops::RangeInclusive<u32> = 10..=60;
/// Inclusive target bitrate bounds, in bits per second.
pub const BITRATE_RANGE: std::ops::RangeInclusive<u32> = 100_000..=50_000_000;
pub const DEFAULT_BITRATE_BPS: u32 = 5_000_000;

/// Placeholder drawn when the configured title is empty or whitespace.
pub const PLACEHOLDER_TITLE: &str = "Your Title Here";

/// Animated background styles. The set is closed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackgroundStyle {
    /// Linear gradient whose stops drift through three independent sinusoids.
    #[default]
    Aurora,
    /// Dark backdrop with drifting point sprites.
    Particles,
    /// Radial gradient with a wandering center.
    Waves,
}

impl BackgroundStyle {
    pub const ALL: [BackgroundStyle; 3] = [Self::Aurora, Self::Particles, Self::Waves];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Aurora => "aurora",
            Self::Particles => "particles",
            Self::Waves => "waves",
        }
    }
}

impl fmt::Display for BackgroundStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackgroundStyle {
    type Err = ReelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|b| b.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ReelError::invalid_config(format!("unknown background style '{s}'")))
    }
}

/// Fixed output resolutions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ResolutionPreset {
    #[serde(rename = "480p")]
    P480,
    #[default]
    #[serde(rename = "720p")]
    P720,
    #[serde(rename = "1080p")]
    P1080,
    #[serde(rename = "square")]
    Square,
}

impl ResolutionPreset {
    pub const ALL: [ResolutionPreset; 4] = [Self::P480, Self::P720, Self::P1080, Self::Square];

    /// Pixel dimensions as `(width, height)`. All presets are even-sized for yuv420p output.
    pub fn dimensions(self) -> (u32, u32) {
        match self {
            Self::P480 => (854, 480),
            Self::P720 => (1280, 720),
            Self::P1080 => (1920, 1080),
            Self::Square => (1080, 1080),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::P480 => "480p",
            Self::P720 => "720p",
            Self::P1080 => "1080p",
            Self::Square => "square",
        }
    }

    /// Find the preset matching the given dimensions, if any.
    pub fn from_dimensions(width: u32, height: u32) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.dimensions() == (width, height))
    }
}

impl fmt::Display for ResolutionPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (w, h) = self.dimensions();
        write!(f, "{} ({w}x{h})", self.as_str())
    }
}

impl FromStr for ResolutionPreset {
    type Err = ReelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ReelError::invalid_config(format!("unknown resolution preset '{s}'")))
    }
}

/// What the renderer draws. Immutable for the duration of one recording.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    pub title_text: String,
    pub subtitle_text: String,
    pub background: BackgroundStyle,
    pub width_px: u32,
    pub height_px: u32,
}

impl RenderConfig {
    pub fn new(
        title_text: impl Into<String>,
        subtitle_text: impl Into<String>,
        background: BackgroundStyle,
        resolution: ResolutionPreset,
    ) -> Self {
        let (width_px, height_px) = resolution.dimensions();
        Self {
            title_text: title_text.into(),
            subtitle_text: subtitle_text.into(),
            background,
            width_px,
            height_px,
        }
    }

    /// Width and height must be positive and match one of the resolution presets.
    pub fn validate(&self) -> ReelResult<()> {
        if self.width_px == 0 || self.height_px == 0 {
            return Err(ReelError::invalid_config(
                "render width/height must be positive",
            ));
        }
        if ResolutionPreset::from_dimensions(self.width_px, self.height_px).is_none() {
            return Err(ReelError::invalid_config(format!(
                "resolution {}x{} does not match any preset",
                self.width_px, self.height_px
            )));
        }
        Ok(())
    }

    pub fn canvas(&self) -> Canvas {
        Canvas {
            width: self.width_px,
            height: self.height_px,
        }
    }

    /// Title to draw: the configured text, or the placeholder when it is blank.
    pub fn display_title(&self) -> &str {
        let t = self.title_text.trim();
        if t.is_empty() { PLACEHOLDER_TITLE } else { t }
    }

    /// Subtitle to draw, or `None` when it should be omitted.
    pub fn display_subtitle(&self) -> Option<&str> {
        let s = self.subtitle_text.trim();
        (!s.is_empty()).then_some(s)
    }
}

/// How long to record and at what frame rate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineConfig {
    pub duration_seconds: u32,
    pub frames_per_second: u32,
}

impl TimelineConfig {
    pub fn new(duration_seconds: u32, frames_per_second: u32) -> ReelResult<Self> {
        let cfg = Self {
            duration_seconds,
            frames_per_second,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> ReelResult<()> {
        if !DURATION_SECONDS_RANGE.contains(&self.duration_seconds) {
            return Err(ReelError::invalid_config(format!(
                "duration_seconds must be in {}..={}, got {}",
                DURATION_SECONDS_RANGE.start(),
                DURATION_SECONDS_RANGE.end(),
                self.duration_seconds
            )));
        }
        if !FPS_RANGE.contains(&self.frames_per_second) {
            return Err(ReelError::invalid_config(format!(
                "frames_per_second must be in {}..={}, got {}",
                FPS_RANGE.start(),
                FPS_RANGE.end(),
                self.frames_per_second
            )));
        }
        Ok(())
    }

    pub fn total_duration_ms(&self) -> f64 {
        f64::from(self.duration_seconds) * 1000.0
    }

    pub fn frame_interval_ms(&self) -> f64 {
        1000.0 / f64::from(self.frames_per_second)
    }

    /// Number of video frames a full-length recording contains.
    pub fn total_frames(&self) -> u64 {
        u64::from(self.duration_seconds) * u64::from(self.frames_per_second)
    }
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            duration_seconds: 5,
            frames_per_second: 30,
        }
    }
}

/// Encoder-facing knobs that are not part of the picture itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureSettings {
    pub bitrate_bps: u32,
}

impl CaptureSettings {
    pub fn validate(&self) -> ReelResult<()> {
        if !BITRATE_RANGE.contains(&self.bitrate_bps) {
            return Err(ReelError::invalid_config(format!(
                "bitrate_bps must be in {}..={}, got {}",
                BITRATE_RANGE.start(),
                BITRATE_RANGE.end(),
                self.bitrate_bps
            )));
        }
        Ok(())
    }
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            bitrate_bps: DEFAULT_BITRATE_BPS,
        }
    }
}

/// JSON-facing recording request, as supplied by a UI or a config file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecordingConfig {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub background: BackgroundStyle,
    #[serde(default)]
    pub resolution: ResolutionPreset,
    #[serde(default = "default_duration_seconds")]
    pub duration_seconds: u32,
    #[serde(default = "default_fps")]
    pub fps: u32,
    #[serde(default)]
    pub bitrate_bps: Option<u32>,
}

fn default_duration_seconds() -> u32 {
    TimelineConfig::default().duration_seconds
}

fn default_fps() -> u32 {
    TimelineConfig::default().frames_per_second
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            title: String::new(),
            subtitle: String::new(),
            background: BackgroundStyle::default(),
            resolution: ResolutionPreset::default(),
            duration_seconds: default_duration_seconds(),
            fps: default_fps(),
            bitrate_bps: None,
        }
    }
}

impl RecordingConfig {
    pub fn from_reader<R: std::io::Read>(r: R) -> ReelResult<Self> {
        serde_json::from_reader(r)
            .map_err(|e| ReelError::serde(format!("parse recording config JSON: {e}")))
    }

    pub fn from_path(path: impl AsRef<Path>) -> ReelResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            ReelError::invalid_config(format!("open recording config '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    pub fn validate(&self) -> ReelResult<()> {
        self.clone().into_parts().map(|_| ())
    }

    /// Validate and split into the typed configuration parts.
    pub fn into_parts(self) -> ReelResult<(RenderConfig, TimelineConfig, CaptureSettings)> {
        let render = RenderConfig::new(
            self.title,
            self.subtitle,
            self.background,
            self.resolution,
        );
        render.validate()?;
        let timeline = TimelineConfig::new(self.duration_seconds, self.fps)?;
        let capture = CaptureSettings {
            bitrate_bps: self.bitrate_bps.unwrap_or(DEFAULT_BITRATE_BPS),
        };
        capture.validate()?;
        Ok((render, timeline, capture))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/config.rs"]
mod tests;

use crate::foundation::core::{Canvas, Point, Rect, Rgba8};
use serde::{Deserialize, Serialize};

/// A gradient stop at `offset` in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GradientStop {
    pub offset: f64,
    pub color: Rgba8,
}

/// One point sprite.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub center: Point,
    pub radius: f64,
    pub opacity: f64,
}

/// Soft drop shadow applied behind text.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextShadow {
    pub color: Rgba8,
    /// Blur extent in pixels.
    pub blur_px: f64,
}

/// Backend-agnostic draw command. Commands are executed in order, each painted over the result of
/// the previous ones.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawOp {
    /// Fill the whole canvas with a solid color.
    Fill { color: Rgba8 },
    /// Fill the whole canvas with a linear gradient from `start` to `end`.
    LinearGradient {
        start: Point,
        end: Point,
        stops: [GradientStop; 2],
    },
    /// Fill the whole canvas with a radial gradient.
    RadialGradient {
        center: Point,
        radius: f64,
        stops: [GradientStop; 2],
    },
    /// Filled circles sharing one color.
    Particles {
        color: Rgba8,
        particles: Vec<Particle>,
    },
    /// Single line of text centered on `center` (horizontally and vertically).
    Text {
        text: String,
        center: Point,
        font_size: f64,
        font_weight: u16,
        color: Rgba8,
        shadow: Option<TextShadow>,
    },
    /// Axis-aligned rectangle outline, stroke centered on `rect`'s edges.
    StrokeRect {
        rect: Rect,
        line_width: f64,
        color: Rgba8,
    },
}

/// Ordered display list for one frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScenePlan {
    pub canvas: Canvas,
    pub ops: Vec<DrawOp>,
}

impl ScenePlan {
    pub fn text_ops(&self) -> impl Iterator<Item = &DrawOp> {
        self.ops
            .iter()
            .filter(|op| matches!(op, DrawOp::Text { .. }))
    }

    pub fn to_json_pretty(&self) -> crate::ReelResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| crate::ReelError::serde(format!("serialize scene plan: {e}")))
    }
}

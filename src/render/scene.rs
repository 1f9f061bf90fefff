//! Pure scene composition: `(time, config) -> ScenePlan`.
//!
//! Nothing here keeps state between frames. Every primitive is recomputed from the timestamp, so
//! calling [`compose_scene`] twice with the same arguments yields an identical plan.

use crate::foundation::core::{Canvas, Point, Rect, Rgba8};
use crate::foundation::math::{hash01, wave01};
use crate::render::plan::{DrawOp, GradientStop, Particle, ScenePlan, TextShadow};
use crate::scene::config::{BackgroundStyle, RenderConfig};
use std::f64::consts::TAU;

pub const PARTICLE_COUNT: usize = 300;
pub const BORDER_INSET_PX: f64 = 12.0;
pub const TITLE_SIZE_RATIO: f64 = 0.07;
pub const SUBTITLE_SIZE_RATIO: f64 = 0.03;
pub const WOBBLE_AMPLITUDE_PX: f64 = 6.0;
pub const WOBBLE_FREQUENCY: f64 = 0.003;

const AURORA_FREQUENCIES: [f64; 3] = [0.0006, 0.0009, 0.0007];
const AURORA_PHASES: [f64; 3] = [0.0, 1.2, 2.7];
const WAVES_FREQUENCY: f64 = 0.0005;
const SHADOW_BLUR_PX: f64 = 12.0;
const PARTICLES_BACKDROP: Rgba8 = Rgba8::rgb(6, 8, 20);
const PARTICLE_COLOR: Rgba8 = Rgba8::rgb(200, 220, 255);

/// Build the display list for the frame at `time_ms`.
///
/// `time_ms` may be any finite value, including zero and values far past the recording length;
/// clamping is the caller's concern.
pub fn compose_scene(time_ms: f64, config: &RenderConfig) -> ScenePlan {
    let canvas = config.canvas();
    let t = if time_ms.is_finite() { time_ms } else { 0.0 };

    let mut ops = Vec::with_capacity(6);
    match config.background {
        BackgroundStyle::Aurora => ops.push(aurora(t, canvas)),
        BackgroundStyle::Particles => {
            ops.push(DrawOp::Fill {
                color: PARTICLES_BACKDROP,
            });
            ops.push(particles(t, canvas));
        }
        BackgroundStyle::Waves => ops.push(waves(t, canvas)),
    }
    text_overlay(t, config, canvas, &mut ops);
    ops.push(border(canvas));

    ScenePlan { canvas, ops }
}

/// Vertical text offset shared by title and subtitle.
pub fn wobble(time_ms: f64) -> f64 {
    (time_ms * WOBBLE_FREQUENCY).sin() * WOBBLE_AMPLITUDE_PX
}

fn aurora(t: f64, canvas: Canvas) -> DrawOp {
    let [a, b, c] =
        std::array::from_fn(|i| wave01(t * AURORA_FREQUENCIES[i] + AURORA_PHASES[i]));

    let first = Rgba8::from_rgb_f64(20.0 + 60.0 * a, 60.0 + 140.0 * b, 120.0 + 110.0 * c);
    let second = Rgba8::from_rgb_f64(90.0 + 130.0 * c, 30.0 + 90.0 * a, 110.0 + 120.0 * b);

    DrawOp::LinearGradient {
        start: Point::new(0.0, 0.0),
        end: Point::new(f64::from(canvas.width), f64::from(canvas.height)),
        stops: [
            GradientStop {
                offset: 0.0,
                color: first,
            },
            GradientStop {
                offset: 1.0,
                color: second,
            },
        ],
    }
}

fn particles(t: f64, canvas: Canvas) -> DrawOp {
    let w = f64::from(canvas.width);
    let h = f64::from(canvas.height);
    let scale = (canvas.min_side() / 720.0).max(0.5);

    let particles = (0..PARTICLE_COUNT)
        .map(|i| {
            let seed = i as f64 + 1.0;
            let base_x = hash01(seed) * w;
            let base_y = hash01(seed + 101.0) * h;
            let speed = 0.15 + 0.85 * hash01(seed + 202.0);
            let phase = hash01(seed + 303.0) * TAU;

            let x = (base_x + t * 0.03 * speed).rem_euclid(w);
            let y = (base_y - t * 0.015 * speed + (t * 0.001 + phase).sin() * 12.0).rem_euclid(h);

            Particle {
                center: Point::new(x, y),
                radius: (0.6 + 1.8 * hash01(seed + 404.0)) * scale,
                opacity: 0.25 + 0.75 * wave01(t * 0.002 + phase),
            }
        })
        .collect();

    DrawOp::Particles {
        color: PARTICLE_COLOR,
        particles,
    }
}

fn waves(t: f64, canvas: Canvas) -> DrawOp {
    let w = f64::from(canvas.width);
    let h = f64::from(canvas.height);
    let p = t * WAVES_FREQUENCY;

    let center = Point::new(w * (0.5 + 0.25 * p.sin()), h * (0.5 + 0.25 * p.cos()));
    let inner = Rgba8::from_rgb_f64(
        40.0 + 120.0 * wave01(p),
        100.0 + 100.0 * wave01(p + 2.0),
        180.0 + 60.0 * wave01(p + 4.0),
    );
    let outer = Rgba8::from_rgb_f64(
        10.0 + 30.0 * wave01(p + 1.0),
        15.0 + 40.0 * wave01(p + 3.0),
        40.0 + 60.0 * wave01(p + 5.0),
    );

    DrawOp::RadialGradient {
        center,
        radius: w.max(h) * 0.75,
        stops: [
            GradientStop {
                offset: 0.0,
                color: inner,
            },
            GradientStop {
                offset: 1.0,
                color: outer,
            },
        ],
    }
}

fn text_overlay(t: f64, config: &RenderConfig, canvas: Canvas, ops: &mut Vec<DrawOp>) {
    let min_side = canvas.min_side();
    let title_size = (min_side * TITLE_SIZE_RATIO).round().max(1.0);
    let subtitle_size = (min_side * SUBTITLE_SIZE_RATIO).round().max(1.0);
    let cx = f64::from(canvas.width) / 2.0;
    let cy = f64::from(canvas.height) / 2.0;
    let wobble = wobble(t);
    let shadow = Some(TextShadow {
        color: Rgba8::rgba(0, 0, 0, 140),
        blur_px: SHADOW_BLUR_PX,
    });

    let subtitle = config.display_subtitle();
    let title_y = match subtitle {
        Some(_) => cy - subtitle_size * 0.9 + wobble,
        None => cy + wobble,
    };

    ops.push(DrawOp::Text {
        text: config.display_title().to_owned(),
        center: Point::new(cx, title_y),
        font_size: title_size,
        font_weight: 700,
        color: Rgba8::rgb(255, 255, 255),
        shadow,
    });

    if let Some(sub) = subtitle {
        ops.push(DrawOp::Text {
            text: sub.to_owned(),
            center: Point::new(cx, cy + title_size * 0.6 + wobble * 0.5),
            font_size: subtitle_size,
            font_weight: 400,
            color: Rgba8::rgba(255, 255, 255, 217),
            shadow,
        });
    }
}

fn border(canvas: Canvas) -> DrawOp {
    let w = f64::from(canvas.width);
    let h = f64::from(canvas.height);
    DrawOp::StrokeRect {
        rect: Rect::new(
            BORDER_INSET_PX,
            BORDER_INSET_PX,
            (w - BORDER_INSET_PX).max(BORDER_INSET_PX),
            (h - BORDER_INSET_PX).max(BORDER_INSET_PX),
        ),
        line_width: (canvas.min_side() / 720.0).max(1.0),
        color: Rgba8::rgba(255, 255, 255, 64),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/scene.rs"]
mod tests;

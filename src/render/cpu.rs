use crate::foundation::core::{Canvas, Point, Rgba8};
use crate::foundation::error::{ReelError, ReelResult};
use crate::render::composite::{over_in_place, over_sprite_at};
use crate::render::plan::{DrawOp, GradientStop, Particle, ScenePlan, TextShadow};
use crate::render::surface::Surface;
use crate::render::text::{TextRasterizer, TextStyle};
use std::path::Path;
use vello_cpu::kurbo::Shape;

/// Executes a [`ScenePlan`] on a [`Surface`].
///
/// Gradients are filled per pixel, vector shapes go through `vello_cpu`, and text comes from
/// cached `resvg` sprites. Every op is composited source-over onto the result of the previous
/// ones, starting from a transparent surface.
pub struct CpuRasterizer {
    text: TextRasterizer,
    layer: Vec<u8>,
    scratch: Option<vello_cpu::Pixmap>,
}

impl CpuRasterizer {
    pub fn new(font_dirs: &[&Path]) -> Self {
        Self {
            text: TextRasterizer::new(font_dirs),
            layer: Vec::new(),
            scratch: None,
        }
    }

    /// Number of font faces available to text ops.
    pub fn font_face_count(&self) -> usize {
        self.text.face_count()
    }

    pub fn rasterize(&mut self, plan: &ScenePlan, surface: &mut Surface) -> ReelResult<()> {
        let canvas = surface.canvas();
        if plan.canvas != canvas {
            return Err(ReelError::render(format!(
                "plan canvas {}x{} does not match surface {}x{}",
                plan.canvas.width, plan.canvas.height, canvas.width, canvas.height
            )));
        }

        // Fail before touching any scratch state if the surface is gone.
        surface.data_mut()?.fill(0);
        self.layer.resize(canvas.rgba_len(), 0);

        for op in &plan.ops {
            self.draw_op(op, canvas, surface)?;
        }
        surface.mark_rendered();
        Ok(())
    }

    fn draw_op(&mut self, op: &DrawOp, canvas: Canvas, surface: &mut Surface) -> ReelResult<()> {
        match op {
            DrawOp::Fill { color } => {
                let px = color.to_premul();
                for d in self.layer.chunks_exact_mut(4) {
                    d.copy_from_slice(&px);
                }
                over_in_place(surface.data_mut()?, &self.layer, 1.0)
            }
            DrawOp::LinearGradient { start, end, stops } => {
                fill_linear_gradient(&mut self.layer, canvas, *start, *end, stops);
                over_in_place(surface.data_mut()?, &self.layer, 1.0)
            }
            DrawOp::RadialGradient {
                center,
                radius,
                stops,
            } => {
                fill_radial_gradient(&mut self.layer, canvas, *center, *radius, stops);
                over_in_place(surface.data_mut()?, &self.layer, 1.0)
            }
            DrawOp::Particles { color, particles } => {
                let pixels = self.vector_pass(canvas, |ctx| draw_particles(ctx, *color, particles))?;
                over_in_place(surface.data_mut()?, pixels, 1.0)
            }
            DrawOp::StrokeRect {
                rect,
                line_width,
                color,
            } => {
                let pixels = self.vector_pass(canvas, |ctx| {
                    draw_stroke_rect(ctx, *rect, *line_width, *color)
                })?;
                over_in_place(surface.data_mut()?, pixels, 1.0)
            }
            DrawOp::Text {
                text,
                center,
                font_size,
                font_weight,
                color,
                shadow,
            } => self.draw_text(
                surface,
                canvas,
                TextStyle {
                    text,
                    font_size: *font_size,
                    weight: *font_weight,
                    color: *color,
                    shadow: shadow.map(|TextShadow { color, blur_px }| (color, blur_px)),
                    max_width: canvas.width,
                },
                *center,
            ),
        }
    }

    /// Render shapes into the cleared scratch pixmap and return its premultiplied bytes.
    fn vector_pass(
        &mut self,
        canvas: Canvas,
        draw: impl FnOnce(&mut vello_cpu::RenderContext),
    ) -> ReelResult<&[u8]> {
        let width_u16: u16 = canvas
            .width
            .try_into()
            .map_err(|_| ReelError::render("surface width exceeds u16"))?;
        let height_u16: u16 = canvas
            .height
            .try_into()
            .map_err(|_| ReelError::render("surface height exceeds u16"))?;

        let stale = self
            .scratch
            .as_ref()
            .is_none_or(|p| p.width() != width_u16 || p.height() != height_u16);
        if stale {
            self.scratch = Some(vello_cpu::Pixmap::new(width_u16, height_u16));
        }
        let pixmap = self
            .scratch
            .as_mut()
            .ok_or_else(|| ReelError::render("scratch pixmap missing"))?;
        pixmap.data_as_u8_slice_mut().fill(0);

        let mut ctx = vello_cpu::RenderContext::new(width_u16, height_u16);
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        draw(&mut ctx);
        ctx.flush();
        ctx.render_to_pixmap(pixmap);
        Ok(pixmap.data_as_u8_slice())
    }

    fn draw_text(
        &mut self,
        surface: &mut Surface,
        canvas: Canvas,
        style: TextStyle<'_>,
        center: Point,
    ) -> ReelResult<()> {
        if style.text.trim().is_empty() {
            return Ok(());
        }
        let sprites = self.text.sprites(style)?;
        let cx = center.x.round() as i64;
        let cy = center.y.round() as i64;
        let dst = surface.data_mut()?;
        for placed in [&sprites.shadow, &sprites.text].into_iter().flatten() {
            over_sprite_at(
                dst,
                canvas.width,
                canvas.height,
                &placed.sprite,
                cx + placed.dx,
                cy + placed.dy,
            )?;
        }
        Ok(())
    }
}

fn draw_particles(ctx: &mut vello_cpu::RenderContext, color: Rgba8, particles: &[Particle]) {
    for p in particles {
        let c = color.with_opacity(p.opacity);
        if c.a == 0 || p.radius.is_nan() || p.radius <= 0.0 {
            continue;
        }
        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a));
        let circle = vello_cpu::kurbo::Circle::new((p.center.x, p.center.y), p.radius);
        ctx.fill_path(&circle.to_path(0.1));
    }
}

/// Outline as four non-overlapping bands centered on the rect's edges.
fn draw_stroke_rect(
    ctx: &mut vello_cpu::RenderContext,
    rect: kurbo::Rect,
    line_width: f64,
    color: Rgba8,
) {
    if line_width.is_nan() || line_width <= 0.0 || color.a == 0 {
        return;
    }
    let h = line_width / 2.0;
    let (x0, y0, x1, y1) = (rect.x0, rect.y0, rect.x1, rect.y1);
    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
        color.r, color.g, color.b, color.a,
    ));
    for band in [
        (x0 - h, y0 - h, x1 + h, y0 + h),
        (x0 - h, y1 - h, x1 + h, y1 + h),
        (x0 - h, y0 + h, x0 + h, y1 - h),
        (x1 - h, y0 + h, x1 + h, y1 - h),
    ] {
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(band.0, band.1, band.2, band.3));
    }
}

/// Straight-alpha color at `t` between two stops, returned premultiplied.
pub(crate) fn sample_stops(stops: &[GradientStop; 2], t: f64) -> [u8; 4] {
    let [a, b] = stops;
    let span = b.offset - a.offset;
    let t = if span.abs() <= f64::EPSILON {
        if t < a.offset { 0.0 } else { 1.0 }
    } else {
        ((t - a.offset) / span).clamp(0.0, 1.0)
    };
    let lerp = |x: u8, y: u8| -> u8 {
        let xf = f64::from(x);
        let yf = f64::from(y);
        (xf + (yf - xf) * t).round().clamp(0.0, 255.0) as u8
    };
    Rgba8::rgba(
        lerp(a.color.r, b.color.r),
        lerp(a.color.g, b.color.g),
        lerp(a.color.b, b.color.b),
        lerp(a.color.a, b.color.a),
    )
    .to_premul()
}

fn fill_linear_gradient(
    dst: &mut [u8],
    canvas: Canvas,
    start: Point,
    end: Point,
    stops: &[GradientStop; 2],
) {
    let dx = end.x - start.x;
    let dy = end.y - start.y;
    let len2 = dx * dx + dy * dy;
    let w = canvas.width as usize;
    for (i, px) in dst.chunks_exact_mut(4).enumerate() {
        let x = (i % w) as f64 + 0.5;
        let y = (i / w) as f64 + 0.5;
        let t = if len2 <= f64::EPSILON {
            0.0
        } else {
            ((x - start.x) * dx + (y - start.y) * dy) / len2
        };
        px.copy_from_slice(&sample_stops(stops, t));
    }
}

fn fill_radial_gradient(
    dst: &mut [u8],
    canvas: Canvas,
    center: Point,
    radius: f64,
    stops: &[GradientStop; 2],
) {
    let w = canvas.width as usize;
    for (i, px) in dst.chunks_exact_mut(4).enumerate() {
        let x = (i % w) as f64 + 0.5;
        let y = (i / w) as f64 + 0.5;
        let t = if radius > 0.0 {
            ((x - center.x).hypot(y - center.y)) / radius
        } else {
            1.0
        };
        px.copy_from_slice(&sample_stops(stops, t));
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;

use crate::foundation::core::Canvas;
use crate::foundation::error::{ReelError, ReelResult};
use crate::foundation::math::mul_div255_u16;

/// The drawing surface shared by the renderer (sole writer) and the capture stream (reader).
///
/// Pixels are premultiplied RGBA8, tightly packed, row-major. A released surface keeps its size
/// but refuses reads and writes with [`ReelError::SurfaceUnavailable`].
#[derive(Debug)]
pub struct Surface {
    canvas: Canvas,
    pixels: Option<Vec<u8>>,
    generation: u64,
}

impl Surface {
    /// Allocate a transparent surface.
    pub fn new(canvas: Canvas) -> ReelResult<Self> {
        let canvas = Canvas::new(canvas.width, canvas.height)?;
        Ok(Self {
            canvas,
            pixels: Some(vec![0u8; canvas.rgba_len()]),
            generation: 0,
        })
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    pub fn width(&self) -> u32 {
        self.canvas.width
    }

    pub fn height(&self) -> u32 {
        self.canvas.height
    }

    pub fn is_available(&self) -> bool {
        self.pixels.is_some()
    }

    /// Number of completed renders into this surface.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn data(&self) -> ReelResult<&[u8]> {
        self.pixels
            .as_deref()
            .ok_or_else(|| ReelError::surface_unavailable("surface has been released"))
    }

    pub(crate) fn data_mut(&mut self) -> ReelResult<&mut [u8]> {
        self.pixels
            .as_deref_mut()
            .ok_or_else(|| ReelError::surface_unavailable("surface has been released"))
    }

    pub(crate) fn mark_rendered(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    /// Drop the pixel buffer. Later reads and writes fail with `SurfaceUnavailable`.
    pub fn release(&mut self) {
        self.pixels = None;
    }

    /// Copy of the pixels flattened over `bg_rgba` into opaque straight RGBA8.
    pub fn to_opaque_rgba8(&self, bg_rgba: [u8; 4]) -> ReelResult<Vec<u8>> {
        let src = self.data()?;
        let mut out = vec![0u8; src.len()];
        flatten_premul_over_bg_to_opaque_rgba8(&mut out, src, bg_rgba)?;
        Ok(out)
    }
}

/// Composite premultiplied RGBA8 over an opaque background color.
pub(crate) fn flatten_premul_over_bg_to_opaque_rgba8(
    dst: &mut [u8],
    src_premul: &[u8],
    bg_rgba: [u8; 4],
) -> ReelResult<()> {
    if dst.len() != src_premul.len() || !dst.len().is_multiple_of(4) {
        return Err(ReelError::render(
            "flatten_premul_over_bg_to_opaque_rgba8 expects equal-length rgba8 buffers",
        ));
    }

    let bg_r = bg_rgba[0] as u16;
    let bg_g = bg_rgba[1] as u16;
    let bg_b = bg_rgba[2] as u16;

    for (d, s) in dst.chunks_exact_mut(4).zip(src_premul.chunks_exact(4)) {
        let a = s[3] as u16;
        if a == 255 {
            d.copy_from_slice(s);
            continue;
        }

        let inv = 255u16 - a;
        let r = s[0] as u16 + mul_div255_u16(bg_r, inv);
        let g = s[1] as u16 + mul_div255_u16(bg_g, inv);
        let b = s[2] as u16 + mul_div255_u16(bg_b, inv);

        d[0] = r.min(255) as u8;
        d[1] = g.min(255) as u8;
        d[2] = b.min(255) as u8;
        d[3] = 255;
    }

    Ok(())
}

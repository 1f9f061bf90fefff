use crate::foundation::error::{ReelError, ReelResult};
use crate::foundation::math::mul_div255_u8;

pub(crate) type PremulRgba8 = [u8; 4];

/// Source-over for one premultiplied pixel, with an extra `opacity` multiplier.
pub(crate) fn over(dst: PremulRgba8, src: PremulRgba8, opacity: f32) -> PremulRgba8 {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 || src[3] == 0 {
        return dst;
    }

    let op = ((opacity * 255.0).round() as i32).clamp(0, 255) as u16;
    let sa = mul_div255_u8(u16::from(src[3]), op);
    if sa == 0 {
        return dst;
    }

    let inv = 255u16 - u16::from(sa);

    let mut out = [0u8; 4];
    out[3] = sa.saturating_add(mul_div255_u8(u16::from(dst[3]), inv));
    for i in 0..3 {
        let sc = mul_div255_u8(u16::from(src[i]), op);
        let dc = mul_div255_u8(u16::from(dst[i]), inv);
        out[i] = sc.saturating_add(dc);
    }
    out
}

pub(crate) fn over_in_place(dst: &mut [u8], src: &[u8], opacity: f32) -> ReelResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(ReelError::render(
            "over_in_place expects equal-length rgba8 buffers",
        ));
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        if s[3] == 0 {
            continue;
        }
        let out = over([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]], opacity);
        d.copy_from_slice(&out);
    }
    Ok(())
}

/// A premultiplied RGBA8 sprite placed at an integer offset in a larger buffer.
#[derive(Clone, Debug)]
pub(crate) struct Sprite {
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) data: Vec<u8>,
}

/// Composite `sprite` over `dst` with its top-left corner at `(x, y)`, clipping to `dst`.
pub(crate) fn over_sprite_at(
    dst: &mut [u8],
    dst_width: u32,
    dst_height: u32,
    sprite: &Sprite,
    x: i64,
    y: i64,
) -> ReelResult<()> {
    if dst.len() != (dst_width as usize) * (dst_height as usize) * 4 {
        return Err(ReelError::render(
            "over_sprite_at destination does not match its dimensions",
        ));
    }
    if sprite.data.len() != (sprite.width as usize) * (sprite.height as usize) * 4 {
        return Err(ReelError::render(
            "over_sprite_at sprite does not match its dimensions",
        ));
    }

    let x0 = x.max(0);
    let y0 = y.max(0);
    let x1 = (x + i64::from(sprite.width)).min(i64::from(dst_width));
    let y1 = (y + i64::from(sprite.height)).min(i64::from(dst_height));
    if x0 >= x1 || y0 >= y1 {
        return Ok(());
    }

    let span = ((x1 - x0) as usize) * 4;
    for dy in y0..y1 {
        let sy = (dy - y) as usize;
        let sx = (x0 - x) as usize;
        let s_off = (sy * sprite.width as usize + sx) * 4;
        let d_off = (dy as usize * dst_width as usize + x0 as usize) * 4;
        over_in_place(
            &mut dst[d_off..d_off + span],
            &sprite.data[s_off..s_off + span],
            1.0,
        )?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/render/composite.rs"]
mod tests;

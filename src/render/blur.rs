//! Gaussian blur for text shadows.
//!
//! A shadow is the text's coverage mask, blurred and then tinted, so blurring works on a single
//! alpha plane. Samples outside the mask count as transparent.

use crate::foundation::error::{ReelError, ReelResult};

/// Normalized 1-D gaussian taps for one shadow blur extent.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct ShadowKernel {
    radius: usize,
    taps: Vec<f32>,
}

impl ShadowKernel {
    /// Kernel for a CSS-style `shadowBlur` extent in pixels: sigma is half the extent and the
    /// support covers three sigma. `None` when the extent is zero, negative or not finite.
    pub(crate) fn for_extent(blur_px: f64) -> Option<Self> {
        if !blur_px.is_finite() || blur_px <= 0.0 {
            return None;
        }
        let sigma = blur_px / 2.0;
        let radius = ((sigma * 3.0).ceil() as usize).max(1);

        let two_sigma_sq = 2.0 * sigma * sigma;
        let raw: Vec<f64> = (0..=2 * radius)
            .map(|i| {
                let x = i as f64 - radius as f64;
                (-x * x / two_sigma_sq).exp()
            })
            .collect();
        let total: f64 = raw.iter().sum();
        Some(Self {
            radius,
            taps: raw.iter().map(|w| (w / total) as f32).collect(),
        })
    }

    /// Pixels the blur reaches beyond the mask's opaque region.
    pub(crate) fn radius(&self) -> u32 {
        u32::try_from(self.radius).unwrap_or(u32::MAX)
    }

    /// Blur a `width * height` alpha mask.
    pub(crate) fn blur(&self, mask: &[u8], width: u32, height: u32) -> ReelResult<Vec<u8>> {
        let (w, h) = (width as usize, height as usize);
        let len = w
            .checked_mul(h)
            .ok_or_else(|| ReelError::render("shadow mask size overflow"))?;
        if mask.len() != len {
            return Err(ReelError::render(format!(
                "shadow mask is {} bytes, expected {width}x{height}",
                mask.len()
            )));
        }

        let coverage: Vec<f32> = mask.iter().map(|&a| f32::from(a)).collect();
        let mut rows = vec![0.0f32; len];
        let mut out = vec![0.0f32; len];
        // Rows, then columns of the row-blurred plane.
        for y in 0..h {
            self.convolve(&coverage, &mut rows, y * w, 1, w);
        }
        for x in 0..w {
            self.convolve(&rows, &mut out, x, w, h);
        }

        Ok(out
            .into_iter()
            .map(|v| v.round().clamp(0.0, 255.0) as u8)
            .collect())
    }

    /// Convolve the `n` samples at `start`, `start + step`, ... of `src` into `dst`.
    fn convolve(&self, src: &[f32], dst: &mut [f32], start: usize, step: usize, n: usize) {
        for i in 0..n {
            let first = i.saturating_sub(self.radius);
            let last = (i + self.radius).min(n.saturating_sub(1));
            let mut acc = 0.0f32;
            for j in first..=last {
                acc += self.taps[j + self.radius - i] * src[start + j * step];
            }
            dst[start + i * step] = acc;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/blur.rs"]
mod tests;

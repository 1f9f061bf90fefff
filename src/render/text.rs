//! Text rasterization through `usvg`/`resvg`, cached per distinct text style.
//!
//! Text only moves between frames (the wobble), so each distinct string/size/color is shaped and
//! rasterized once into a cropped sprite, and later frames just composite it at a new offset.

use crate::foundation::core::Rgba8;
use crate::foundation::error::{ReelError, ReelResult};
use crate::render::blur::ShadowKernel;
use crate::render::composite::Sprite;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

const SANS_SERIF_CANDIDATES: [&str; 6] = [
    "Inter",
    "DejaVu Sans",
    "Liberation Sans",
    "Noto Sans",
    "Arial",
    "Helvetica",
];

/// Distinct text styles kept before the cache starts over.
const TEXT_CACHE_LIMIT: usize = 64;

/// Sprite plus its top-left offset relative to the text center.
#[derive(Clone, Debug)]
pub(crate) struct PlacedSprite {
    pub(crate) sprite: Sprite,
    pub(crate) dx: i64,
    pub(crate) dy: i64,
}

#[derive(Clone, Debug)]
pub(crate) struct TextSprites {
    pub(crate) shadow: Option<PlacedSprite>,
    pub(crate) text: Option<PlacedSprite>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct TextKey {
    text: String,
    font_size_bits: u64,
    weight: u16,
    color: Rgba8,
    shadow: Option<(Rgba8, u64)>,
    strip_width: u32,
}

/// Request to rasterize one line of text.
#[derive(Clone, Copy, Debug)]
pub(crate) struct TextStyle<'a> {
    pub(crate) text: &'a str,
    pub(crate) font_size: f64,
    pub(crate) weight: u16,
    pub(crate) color: Rgba8,
    pub(crate) shadow: Option<(Rgba8, f64)>,
    /// Width available to the line; longer text is clipped.
    pub(crate) max_width: u32,
}

pub(crate) struct TextRasterizer {
    fontdb: Arc<usvg::fontdb::Database>,
    cache: HashMap<TextKey, Arc<TextSprites>>,
}

impl TextRasterizer {
    /// Load system fonts plus any `.ttf`/`.otf`/`.ttc` files found in `font_dirs`.
    pub(crate) fn new(font_dirs: &[&Path]) -> Self {
        let mut db = usvg::fontdb::Database::new();
        db.load_system_fonts();
        for dir in font_dirs {
            load_fonts_from_dir(&mut db, dir);
        }

        if let Some(family) = pick_sans_serif_family(&db) {
            db.set_sans_serif_family(family);
        }
        tracing::debug!(faces = db.len(), "text rasterizer font database ready");

        Self {
            fontdb: Arc::new(db),
            cache: HashMap::new(),
        }
    }

    pub(crate) fn face_count(&self) -> usize {
        self.fontdb.len()
    }

    pub(crate) fn sprites(&mut self, style: TextStyle<'_>) -> ReelResult<Arc<TextSprites>> {
        let key = TextKey {
            text: style.text.to_owned(),
            font_size_bits: style.font_size.to_bits(),
            weight: style.weight,
            color: style.color,
            shadow: style.shadow.map(|(c, blur)| (c, blur.to_bits())),
            strip_width: style.max_width,
        };
        if let Some(hit) = self.cache.get(&key) {
            return Ok(Arc::clone(hit));
        }

        let rendered = Arc::new(self.rasterize(style)?);
        if self.cache.len() >= TEXT_CACHE_LIMIT {
            tracing::debug!(entries = self.cache.len(), "text sprite cache full, clearing");
            self.cache.clear();
        }
        self.cache.insert(key, Arc::clone(&rendered));
        Ok(rendered)
    }

    fn rasterize(&self, style: TextStyle<'_>) -> ReelResult<TextSprites> {
        if !style.font_size.is_finite() || style.font_size <= 0.0 {
            return Err(ReelError::render("font size must be positive"));
        }

        let kernel = style
            .shadow
            .and_then(|(_, blur)| ShadowKernel::for_extent(blur));
        let radius = kernel.as_ref().map_or(0, ShadowKernel::radius);
        let pad = radius.saturating_add(2);
        let strip_w = style.max_width.max(1).saturating_add(pad * 2);
        let strip_h = ((style.font_size * 2.0).ceil() as u32)
            .max(1)
            .saturating_add(pad * 2);
        let cx = f64::from(strip_w) / 2.0;
        let cy = f64::from(strip_h) / 2.0;

        let svg = text_svg(style, strip_w, strip_h, cx, cy);
        let opts = usvg::Options {
            fontdb: Arc::clone(&self.fontdb),
            ..Default::default()
        };
        let tree = usvg::Tree::from_data(svg.as_bytes(), &opts)
            .map_err(|e| ReelError::render(format!("parse text svg: {e}")))?;

        let mut pixmap = resvg::tiny_skia::Pixmap::new(strip_w, strip_h)
            .ok_or_else(|| ReelError::render("failed to allocate text pixmap"))?;
        resvg::render(
            &tree,
            resvg::tiny_skia::Transform::identity(),
            &mut pixmap.as_mut(),
        );
        let strip = pixmap.data();

        // No glyphs drawn (e.g. no usable font): nothing to composite.
        let Some(bbox) = alpha_bbox(strip, strip_w, strip_h) else {
            return Ok(TextSprites {
                shadow: None,
                text: None,
            });
        };

        let origin_x = cx.round() as i64;
        let origin_y = cy.round() as i64;
        let text = crop(strip, strip_w, bbox);
        let text = PlacedSprite {
            sprite: text,
            dx: i64::from(bbox.x0) - origin_x,
            dy: i64::from(bbox.y0) - origin_y,
        };

        let shadow = match (style.shadow, kernel) {
            (Some((color, _)), Some(kernel)) => {
                let grown = bbox.grow(radius, strip_w, strip_h);
                let coverage = crop(strip, strip_w, grown);
                let mask = alpha_plane(&coverage.data);
                let blurred = kernel.blur(&mask, coverage.width, coverage.height)?;
                Some(PlacedSprite {
                    sprite: Sprite {
                        width: coverage.width,
                        height: coverage.height,
                        data: tint_mask(&blurred, color),
                    },
                    dx: i64::from(grown.x0) - origin_x,
                    dy: i64::from(grown.y0) - origin_y,
                })
            }
            _ => None,
        };

        Ok(TextSprites {
            shadow,
            text: Some(text),
        })
    }
}

fn text_svg(style: TextStyle<'_>, w: u32, h: u32, cx: f64, cy: f64) -> String {
    // Baseline sits below the visual center by roughly the x-height.
    let baseline = cy + style.font_size * 0.35;
    let opacity = f64::from(style.color.a) / 255.0;
    format!(
        concat!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            r#"<text x="{cx}" y="{baseline}" font-family="sans-serif" font-size="{size}" "#,
            r#"font-weight="{weight}" text-anchor="middle" fill="{fill}" fill-opacity="{opacity}">"#,
            "{text}</text></svg>"
        ),
        w = w,
        h = h,
        cx = cx,
        baseline = baseline,
        size = style.font_size,
        weight = style.weight,
        fill = style.color.css(),
        opacity = opacity,
        text = escape_xml(style.text),
    )
}

pub(crate) fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c if c.is_control() => out.push(' '),
            c => out.push(c),
        }
    }
    out
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct PixelBox {
    x0: u32,
    y0: u32,
    /// Exclusive.
    x1: u32,
    /// Exclusive.
    y1: u32,
}

impl PixelBox {
    fn grow(self, by: u32, max_w: u32, max_h: u32) -> Self {
        Self {
            x0: self.x0.saturating_sub(by),
            y0: self.y0.saturating_sub(by),
            x1: self.x1.saturating_add(by).min(max_w),
            y1: self.y1.saturating_add(by).min(max_h),
        }
    }
}

fn alpha_bbox(data: &[u8], w: u32, h: u32) -> Option<PixelBox> {
    let mut bbox: Option<PixelBox> = None;
    for y in 0..h {
        for x in 0..w {
            let a = data[((y * w + x) as usize) * 4 + 3];
            if a == 0 {
                continue;
            }
            bbox = Some(match bbox {
                None => PixelBox {
                    x0: x,
                    y0: y,
                    x1: x + 1,
                    y1: y + 1,
                },
                Some(b) => PixelBox {
                    x0: b.x0.min(x),
                    y0: b.y0.min(y),
                    x1: b.x1.max(x + 1),
                    y1: b.y1.max(y + 1),
                },
            });
        }
    }
    bbox
}

fn crop(data: &[u8], stride_w: u32, b: PixelBox) -> Sprite {
    let w = b.x1 - b.x0;
    let h = b.y1 - b.y0;
    let mut out = Vec::with_capacity((w as usize) * (h as usize) * 4);
    for y in b.y0..b.y1 {
        let start = ((y * stride_w + b.x0) as usize) * 4;
        out.extend_from_slice(&data[start..start + (w as usize) * 4]);
    }
    Sprite {
        width: w,
        height: h,
        data: out,
    }
}

fn alpha_plane(rgba: &[u8]) -> Vec<u8> {
    rgba.chunks_exact(4).map(|px| px[3]).collect()
}

/// Premultiplied RGBA8 sprite of `color` with coverage `mask`.
fn tint_mask(mask: &[u8], color: Rgba8) -> Vec<u8> {
    let c = color.to_premul();
    let mut out = Vec::with_capacity(mask.len() * 4);
    for &a in mask {
        out.extend(c.map(|ch| crate::foundation::math::mul_div255_u8(u16::from(ch), u16::from(a))));
    }
    out
}

fn pick_sans_serif_family(db: &usvg::fontdb::Database) -> Option<String> {
    let families: Vec<&str> = db
        .faces()
        .flat_map(|face| face.families.iter().map(|(name, _)| name.as_str()))
        .collect();
    SANS_SERIF_CANDIDATES
        .iter()
        .find(|c| families.contains(*c))
        .map(|c| (*c).to_owned())
        .or_else(|| families.first().map(|f| (*f).to_owned()))
}

fn load_fonts_from_dir(db: &mut usvg::fontdb::Database, dir: &Path) {
    let Ok(rd) = std::fs::read_dir(dir) else {
        tracing::warn!(dir = %dir.display(), "font directory is not readable");
        return;
    };

    for entry in rd.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(ext) = path.extension().and_then(|s| s.to_str()) else {
            continue;
        };
        let ext = ext.to_ascii_lowercase();
        if ext != "ttf" && ext != "otf" && ext != "ttc" {
            continue;
        }
        if let Err(e) = db.load_font_file(&path) {
            tracing::warn!(path = %path.display(), error = %e, "skipping unreadable font");
        }
    }
}

pub(crate) mod blur;
pub(crate) mod composite;
pub mod cpu;
pub mod plan;
pub mod scene;
pub mod surface;
pub(crate) mod text;

use crate::foundation::error::{ReelError, ReelResult};
use crate::render::cpu::CpuRasterizer;
use crate::render::plan::ScenePlan;
use crate::render::surface::Surface;
use crate::scene::config::RenderConfig;
use std::path::Path;

/// The Scene Renderer: `(surface, time, config)` to pixels.
///
/// Output depends only on `time_ms` and `config`. The only state kept here is caches
/// (font database, text sprites, scratch buffers) that never change what gets drawn.
pub struct SceneRenderer {
    raster: CpuRasterizer,
}

impl SceneRenderer {
    /// Renderer using the system fonts.
    pub fn new() -> Self {
        Self::with_font_dirs(&[])
    }

    /// Renderer using the system fonts plus every font file found directly in `dirs`.
    pub fn with_font_dirs(dirs: &[&Path]) -> Self {
        Self {
            raster: CpuRasterizer::new(dirs),
        }
    }

    pub fn font_face_count(&self) -> usize {
        self.raster.font_face_count()
    }

    /// Draw the frame for `time_ms` onto `surface`, replacing its previous content.
    ///
    /// `time_ms` is absolute animation time; callers pass the host clock reading so background
    /// motion stays continuous across the whole run.
    #[tracing::instrument(level = "trace", skip(self, surface, config))]
    pub fn render(
        &mut self,
        surface: &mut Surface,
        time_ms: f64,
        config: &RenderConfig,
    ) -> ReelResult<ScenePlan> {
        if surface.canvas() != config.canvas() {
            return Err(ReelError::invalid_config(format!(
                "surface is {}x{} but the render config asks for {}x{}",
                surface.width(),
                surface.height(),
                config.width_px,
                config.height_px
            )));
        }
        let plan = scene::compose_scene(time_ms, config);
        self.raster.rasterize(&plan, surface)?;
        Ok(plan)
    }

    /// Execute an already composed plan.
    pub fn render_plan(&mut self, plan: &ScenePlan, surface: &mut Surface) -> ReelResult<()> {
        self.raster.rasterize(plan, surface)
    }
}

impl Default for SceneRenderer {
    fn default() -> Self {
        Self::new()
    }
}

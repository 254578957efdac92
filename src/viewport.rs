use crate::renderer::RenderTarget;
use glam::IVec2;
use winit::dpi::PhysicalSize;

/// Low-level surface a client draws into: size, DPI scale and the dirty
/// state the UI layer polls.
#[derive(Debug)]
pub struct SceneViewport {
    target: RenderTarget,
    dpi_scale: f32,
    hdr: bool,
    display_dirty: bool,
    hit_proxies_dirty: bool,
    draws: u64,
    skipped_draws: u64,
}

impl SceneViewport {
    pub fn new(size: PhysicalSize<u32>, dpi_scale: f32) -> Self {
        Self {
            target: RenderTarget::new(size),
            dpi_scale: sanitize_dpi(dpi_scale),
            hdr: false,
            display_dirty: true,
            hit_proxies_dirty: true,
            draws: 0,
            skipped_draws: 0,
        }
    }

    pub fn size(&self) -> PhysicalSize<u32> {
        self.target.size
    }

    pub fn size_xy(&self) -> IVec2 {
        IVec2::new(self.target.size.width as i32, self.target.size.height as i32)
    }

    pub fn render_target(&self) -> RenderTarget {
        self.target
    }

    pub fn resize(&mut self, size: PhysicalSize<u32>) {
        if self.target.size != size {
            self.target.size = size;
            self.invalidate();
        }
    }

    pub fn dpi_scale(&self) -> f32 {
        self.dpi_scale
    }

    pub fn set_dpi_scale(&mut self, dpi_scale: f32) {
        self.dpi_scale = sanitize_dpi(dpi_scale);
    }

    pub fn is_hdr(&self) -> bool {
        self.hdr
    }

    pub fn set_hdr(&mut self, hdr: bool) {
        self.hdr = hdr;
    }

    /// Marks both the displayed pixels and cached hit proxies stale.
    pub fn invalidate(&mut self) {
        self.hit_proxies_dirty = true;
        self.display_dirty = true;
    }

    pub fn invalidate_display(&mut self) {
        self.display_dirty = true;
    }

    pub fn needs_redraw(&self) -> bool {
        self.display_dirty
    }

    pub fn hit_proxies_dirty(&self) -> bool {
        self.hit_proxies_dirty
    }

    pub(crate) fn finish_draw(&mut self) {
        self.draws += 1;
        self.display_dirty = false;
        self.hit_proxies_dirty = false;
    }

    pub(crate) fn skip_draw(&mut self) {
        self.skipped_draws += 1;
    }

    pub fn draw_count(&self) -> u64 {
        self.draws
    }

    pub fn skipped_draw_count(&self) -> u64 {
        self.skipped_draws
    }
}

fn sanitize_dpi(dpi_scale: f32) -> f32 {
    if dpi_scale.is_finite() && dpi_scale > 0.0 {
        dpi_scale
    } else {
        1.0
    }
}

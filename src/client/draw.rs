use super::ViewportClient;
use crate::ecs::CachedViewInfo;
use crate::preview_world::PreviewWorld;
use crate::renderer::{FrameRecorder, RecorderLog, RenderSubmitter};
use crate::screen_percentage::ScreenPercentagePolicy;
use crate::show_flags::{apply_editor_overrides, apply_orthographic_overrides, ShowFlags, ViewMode};
use crate::stereo::StereoDevice;
use crate::time::{AppClock, GameTime};
use crate::view::SceneViewFamily;
use crate::view_extension::{ViewExtension, ViewExtensionContext, ViewExtensionRegistry};
use crate::visualization::VisualizationCategory;
use std::cell::RefCell;
use std::rc::Rc;

/// Engine-side collaborators a client draws through.
pub struct RenderServices {
    pub submitter: Box<dyn RenderSubmitter>,
    pub stereo: Option<Box<dyn StereoDevice>>,
    pub view_extensions: ViewExtensionRegistry,
    pub clock: AppClock,
}

impl RenderServices {
    pub fn new(submitter: impl RenderSubmitter + 'static) -> Self {
        Self {
            submitter: Box::new(submitter),
            stereo: None,
            view_extensions: ViewExtensionRegistry::default(),
            clock: AppClock::new(),
        }
    }

    /// Services backed by a [`FrameRecorder`], plus the shared log it fills.
    pub fn recording() -> (Self, Rc<RefCell<RecorderLog>>) {
        let recorder = FrameRecorder::new();
        let log = recorder.log();
        (Self::new(recorder), log)
    }

    pub fn with_stereo(mut self, device: impl StereoDevice + 'static) -> Self {
        self.stereo = Some(Box::new(device));
        self
    }

    pub fn with_view_extension(mut self, extension: Rc<dyn ViewExtension>) -> Self {
        self.view_extensions.register(extension);
        self
    }

    pub fn is_stereo_enabled(&self) -> bool {
        self.stereo.as_deref().is_some_and(|device| device.is_stereo_enabled())
    }
}

impl ViewportClient {
    /// Builds the view family for this frame and hands it to the submitter.
    /// Outside realtime mode the call blocks until the renderer has caught up.
    ///
    /// Returns `false` when no viewport is attached.
    pub fn draw(&mut self, mut scene: Option<&mut PreviewWorld>, services: &mut RenderServices) -> bool {
        let Some(viewport) = self.viewport.clone() else {
            log::warn!("[viewport] draw requested with no viewport attached");
            return false;
        };
        let (target, hdr) = {
            let viewport = viewport.borrow();
            (viewport.render_target(), viewport.is_hdr())
        };

        let app_seconds = services.clock.elapsed_seconds();
        let app_delta = self.last_app_seconds.map_or(0.0, |last| (app_seconds - last) as f32);
        self.last_app_seconds = Some(app_seconds);
        let time = match scene.as_deref() {
            Some(world) if !self.realtime => {
                let world_time = world.time();
                GameTime {
                    real_seconds: world_time.real_time_seconds,
                    world_seconds: world_time.time_seconds,
                    delta_seconds: world_time.delta_seconds,
                }
            }
            _ => GameTime::from_app(app_seconds, app_delta),
        };

        let stereo_rendering = services.is_stereo_enabled();
        let mut show_flags = self.show_flags;
        if let Some(apply) = &self.show_flags_override {
            apply(&mut show_flags);
        }
        let world_id = scene.as_deref().map(PreviewWorld::id);
        let mut family = SceneViewFamily::new(target, world_id, show_flags, time);
        family.realtime_update = self.realtime;
        family.view_mode_param =
            self.view_mode_param.map(|param| (param, self.view_mode_param_name.clone().unwrap_or_default()));
        family.debug_dpi_scale = self.dpi_scale();
        family.is_hdr = hdr;
        family.is_in_focus = false;
        if !family.show_flags.contains(ShowFlags::GAME) {
            family.show_flags.remove(ShowFlags::CAMERA_INTERPOLATION);
        }
        if !stereo_rendering {
            family.show_flags.remove(ShowFlags::SCREEN_PERCENTAGE);
        }

        let context = ViewExtensionContext { world: world_id, stereo_enabled: true };
        family.view_extensions = services.view_extensions.gather_active(&context);
        for extension in family.view_extensions.clone() {
            extension.setup_view_family(&mut family);
        }

        let view_mode = self.view_mode();
        family.view_mode = view_mode;
        let can_disable_tonemapper = (view_mode == ViewMode::VisualizeBuffer
            && self.visualization.is_set(VisualizationCategory::Buffer))
            || (view_mode == ViewMode::VisualizeGpuSkinCache
                && self.visualization.is_set(VisualizationCategory::GpuSkinCache));
        apply_editor_overrides(view_mode, &mut family.show_flags, can_disable_tonemapper);
        apply_orthographic_overrides(self.is_perspective(), &mut family.show_flags);
        self.update_lighting_show_flags(&mut family.show_flags, scene.as_deref());
        family.exposure = self.exposure;

        let view_count = match services.stereo.as_deref() {
            Some(device) if stereo_rendering => device.desired_view_count(),
            _ => 1,
        };
        let mut rendered = Vec::with_capacity(view_count);
        for eye in 0..view_count {
            let index = self.calc_scene_view(
                &mut family,
                scene.as_deref(),
                services.stereo.as_deref(),
                stereo_rendering.then_some(eye),
            );
            let show_flags = family.show_flags;
            let view = &mut family.views[index];
            self.setup_view_for_rendering(show_flags, view);
            view.camera_constrained_view_rect = view.unscaled_view_rect;
            rendered.push(CachedViewInfo {
                location: view.view_location,
                rotation: view.view_rotation.to_quat(),
                fov_degrees: view.fov_degrees,
                view_projection: view.matrices.view_projection,
            });
        }
        if let Some(world) = scene.as_deref_mut() {
            let now = world.time().time_seconds;
            world.record_rendered_views(rendered, now);
        }

        if family.screen_percentage.is_none() {
            let mut fraction = 1.0;
            if !stereo_rendering && self.supports_preview_resolution_fraction() && family.supports_screen_percentage()
            {
                fraction = self.preview_resolution_fraction.unwrap_or_else(|| self.default_resolution_fraction());
                family.show_flags.set(ShowFlags::SCREEN_PERCENTAGE, fraction != 1.0);
            }
            family.screen_percentage = Some(ScreenPercentagePolicy::Legacy { resolution_fraction: fraction });
        }

        services.submitter.begin_rendering_view_family(&family);

        if let Some(world) = scene.as_deref_mut() {
            if world.world_line_batchers_pending() {
                world.flush_world_line_batchers();
            }
        }

        if !self.realtime {
            services.submitter.flush_rendering_commands();
        }

        viewport.borrow_mut().finish_draw();
        self.needs_redraw = false;
        log::trace!("[viewport] submitted {} view(s) at {:.3}s", family.views.len(), time.world_seconds);
        true
    }
}

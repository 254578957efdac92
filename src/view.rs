//! Per-frame view data handed to the renderer.

use crate::math::{IntRect, Rotator};
use crate::renderer::RenderTarget;
use crate::screen_percentage::ScreenPercentagePolicy;
use crate::show_flags::{ShowFlags, ViewMode};
use crate::stereo::StereoPass;
use crate::time::GameTime;
use crate::view_extension::ViewExtension;
use crate::visualization::VisualizationModes;
use crate::ecs::WorldId;
use glam::{IVec2, Mat4, Vec2, Vec3, Vec4};
use smallvec::SmallVec;
use std::rc::Rc;

/// Optional post-process overrides; unset fields leave the current value alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostProcessSettings {
    pub exposure_compensation: Option<f32>,
    pub bloom_intensity: Option<f32>,
    pub vignette_intensity: Option<f32>,
    pub saturation: Option<f32>,
    pub contrast: Option<f32>,
    pub motion_blur_amount: Option<f32>,
    pub depth_of_field_focal_distance: Option<f32>,
    pub film_grain_intensity: Option<f32>,
    pub color_tint: Option<Vec4>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExposureSettings {
    pub fixed: bool,
    pub fixed_ev100: f32,
}

impl Default for ExposureSettings {
    fn default() -> Self {
        Self { fixed: false, fixed_ev100: 1.0 }
    }
}

/// Fully resolved post-process values for one view.
#[derive(Debug, Clone, PartialEq)]
pub struct FinalPostProcessSettings {
    pub exposure_compensation: f32,
    pub bloom_intensity: f32,
    pub vignette_intensity: f32,
    pub saturation: f32,
    pub contrast: f32,
    pub motion_blur_amount: f32,
    pub depth_of_field_focal_distance: f32,
    pub film_grain_intensity: f32,
    pub color_tint: Vec4,
    pub fixed_exposure_ev100: Option<f32>,
    blend_count: usize,
    closed: bool,
}

impl Default for FinalPostProcessSettings {
    fn default() -> Self {
        Self {
            exposure_compensation: 0.0,
            bloom_intensity: 0.675,
            vignette_intensity: 0.4,
            saturation: 1.0,
            contrast: 1.0,
            motion_blur_amount: 0.5,
            depth_of_field_focal_distance: 0.0,
            film_grain_intensity: 0.0,
            color_tint: Vec4::ONE,
            fixed_exposure_ev100: None,
            blend_count: 0,
            closed: false,
        }
    }
}

fn lerp(current: f32, target: f32, weight: f32) -> f32 {
    current + (target - current) * weight
}

impl FinalPostProcessSettings {
    /// Defaults with the scene's own settings applied at full weight.
    pub fn start(base: &PostProcessSettings) -> Self {
        let mut settings = Self::default();
        settings.blend(base, 1.0);
        settings.blend_count = 0;
        settings
    }

    /// Blends `overrides` in at `weight` (clamped to [0, 1]).
    ///
    /// Panics if the settings were already closed.
    pub fn blend(&mut self, overrides: &PostProcessSettings, weight: f32) {
        assert!(!self.closed, "post-process settings are closed; blend before end()");
        let weight = weight.clamp(0.0, 1.0);
        let mix = |current: &mut f32, value: Option<f32>| {
            if let Some(value) = value {
                *current = lerp(*current, value, weight);
            }
        };
        mix(&mut self.exposure_compensation, overrides.exposure_compensation);
        mix(&mut self.bloom_intensity, overrides.bloom_intensity);
        mix(&mut self.vignette_intensity, overrides.vignette_intensity);
        mix(&mut self.saturation, overrides.saturation);
        mix(&mut self.contrast, overrides.contrast);
        mix(&mut self.motion_blur_amount, overrides.motion_blur_amount);
        mix(&mut self.depth_of_field_focal_distance, overrides.depth_of_field_focal_distance);
        mix(&mut self.film_grain_intensity, overrides.film_grain_intensity);
        if let Some(tint) = overrides.color_tint {
            self.color_tint = self.color_tint.lerp(tint, weight);
        }
        self.blend_count += 1;
    }

    /// Finalizes the settings against the family's show flags and exposure.
    pub fn end(&mut self, show_flags: ShowFlags, exposure: &ExposureSettings) {
        if !show_flags.contains(ShowFlags::BLOOM) {
            self.bloom_intensity = 0.0;
        }
        if !show_flags.contains(ShowFlags::MOTION_BLUR) {
            self.motion_blur_amount = 0.0;
        }
        if !show_flags.contains(ShowFlags::DEPTH_OF_FIELD) {
            self.depth_of_field_focal_distance = 0.0;
        }
        self.fixed_exposure_ev100 = exposure.fixed.then_some(exposure.fixed_ev100);
        self.closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn blend_count(&self) -> usize {
        self.blend_count
    }
}

/// Persistent per-slot history used by temporal effects.
#[derive(Debug, Clone, Default)]
pub struct SceneViewState {
    frame_index: u32,
    previous_view_projection: Option<Mat4>,
}

impl SceneViewState {
    pub fn frame_index(&self) -> u32 {
        self.frame_index
    }

    /// Records this frame's matrix and returns the one from the frame before.
    pub fn advance(&mut self, view_projection: Mat4) -> Option<Mat4> {
        self.frame_index = self.frame_index.wrapping_add(1);
        self.previous_view_projection.replace(view_projection)
    }
}

/// Camera and target parameters used to build a [`SceneView`].
#[derive(Debug, Clone)]
pub struct ViewInitOptions {
    pub view_origin: Vec3,
    pub view_rotation_matrix: Mat4,
    pub projection_matrix: Mat4,
    pub view_rect: IntRect,
    pub stereo_pass: StereoPass,
    pub stereo_view_index: Option<usize>,
    pub world_to_meters: f32,
    pub background_color: Vec4,
    pub cursor_pos: IVec2,
    pub fov_degrees: f32,
    pub near_clip_plane: f32,
    pub far_clip_plane_override: Option<f32>,
    pub use_faux_ortho_view_pos: bool,
}

impl Default for ViewInitOptions {
    fn default() -> Self {
        Self {
            view_origin: Vec3::ZERO,
            view_rotation_matrix: Mat4::IDENTITY,
            projection_matrix: Mat4::IDENTITY,
            view_rect: IntRect::from_size(IVec2::ONE),
            stereo_pass: StereoPass::Full,
            stereo_view_index: None,
            world_to_meters: 100.0,
            background_color: Vec4::new(0.0, 0.0, 0.0, 1.0),
            cursor_pos: IVec2::splat(-1),
            fov_degrees: 90.0,
            near_clip_plane: 10.0,
            far_clip_plane_override: None,
            use_faux_ortho_view_pos: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewMatrices {
    pub view_rotation: Mat4,
    pub view: Mat4,
    pub projection: Mat4,
    pub view_projection: Mat4,
}

impl ViewMatrices {
    pub fn new(origin: Vec3, view_rotation: Mat4, projection: Mat4) -> Self {
        let view = view_rotation * Mat4::from_translation(-origin);
        Self { view_rotation, view, projection, view_projection: projection * view }
    }

    pub fn is_perspective(&self) -> bool {
        self.projection.w_axis.w < 1.0
    }
}

/// One rendered eye/camera within a family.
#[derive(Debug, Clone)]
pub struct SceneView {
    pub view_rect: IntRect,
    pub unscaled_view_rect: IntRect,
    pub camera_constrained_view_rect: IntRect,
    pub view_origin: Vec3,
    pub view_location: Vec3,
    pub view_rotation: Rotator,
    pub matrices: ViewMatrices,
    pub fov_degrees: f32,
    pub near_clip_plane: f32,
    pub far_clip_plane_override: Option<f32>,
    pub stereo_pass: StereoPass,
    pub stereo_view_index: Option<usize>,
    pub view_state_index: usize,
    pub temporal_frame_index: u32,
    pub prev_view_projection: Option<Mat4>,
    pub world_to_meters: f32,
    pub background_color: Vec4,
    pub cursor_pos: IVec2,
    pub use_faux_ortho_view_pos: bool,
    pub diffuse_override: Vec4,
    pub specular_override: Vec4,
    pub normal_override: Vec4,
    pub roughness_override: Vec2,
    pub visualization: VisualizationModes,
    pub post_process: FinalPostProcessSettings,
}

impl SceneView {
    pub fn new(init: &ViewInitOptions) -> Self {
        Self {
            view_rect: init.view_rect,
            unscaled_view_rect: init.view_rect,
            camera_constrained_view_rect: init.view_rect,
            view_origin: init.view_origin,
            view_location: init.view_origin,
            view_rotation: Rotator::ZERO,
            matrices: ViewMatrices::new(init.view_origin, init.view_rotation_matrix, init.projection_matrix),
            fov_degrees: init.fov_degrees,
            near_clip_plane: init.near_clip_plane,
            far_clip_plane_override: init.far_clip_plane_override,
            stereo_pass: init.stereo_pass,
            stereo_view_index: init.stereo_view_index,
            view_state_index: 0,
            temporal_frame_index: 0,
            prev_view_projection: None,
            world_to_meters: init.world_to_meters,
            background_color: init.background_color,
            cursor_pos: init.cursor_pos,
            use_faux_ortho_view_pos: init.use_faux_ortho_view_pos,
            diffuse_override: Vec4::new(0.0, 0.0, 0.0, 1.0),
            specular_override: Vec4::new(0.0, 0.0, 0.0, 1.0),
            normal_override: Vec4::new(0.0, 0.0, 0.0, 1.0),
            roughness_override: Vec2::new(0.0, 1.0),
            visualization: VisualizationModes::default(),
            post_process: FinalPostProcessSettings::default(),
        }
    }
}

/// Everything submitted to the renderer for one frame of one viewport.
pub struct SceneViewFamily {
    pub render_target: RenderTarget,
    pub world: Option<WorldId>,
    pub show_flags: ShowFlags,
    pub time: GameTime,
    pub realtime_update: bool,
    pub view_mode: ViewMode,
    pub view_mode_param: Option<(i32, String)>,
    pub debug_dpi_scale: f32,
    pub is_hdr: bool,
    pub is_in_focus: bool,
    pub exposure: ExposureSettings,
    pub view_extensions: Vec<Rc<dyn ViewExtension>>,
    pub screen_percentage: Option<ScreenPercentagePolicy>,
    pub views: SmallVec<[SceneView; 2]>,
}

impl SceneViewFamily {
    pub fn new(render_target: RenderTarget, world: Option<WorldId>, show_flags: ShowFlags, time: GameTime) -> Self {
        Self {
            render_target,
            world,
            show_flags,
            time,
            realtime_update: false,
            view_mode: ViewMode::Lit,
            view_mode_param: None,
            debug_dpi_scale: 1.0,
            is_hdr: false,
            is_in_focus: false,
            exposure: ExposureSettings::default(),
            view_extensions: Vec::new(),
            screen_percentage: None,
            views: SmallVec::new(),
        }
    }

    /// Whether the family as a whole may be rendered below native resolution.
    pub fn supports_screen_percentage(&self) -> bool {
        !self.show_flags.intersects(ShowFlags::WIREFRAME | ShowFlags::PATH_TRACING)
    }

    pub fn resolution_fraction(&self) -> f32 {
        self.screen_percentage.as_ref().map_or(1.0, ScreenPercentagePolicy::resolution_fraction)
    }
}

/// Camera description a view modifier may rewrite before the view is built.
#[derive(Debug, Clone, PartialEq)]
pub struct MinimalViewInfo {
    pub location: Vec3,
    pub rotation: Rotator,
    pub fov_degrees: f32,
    pub post_process_settings: PostProcessSettings,
    pub post_process_blend_weight: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewModifierParams {
    pub view_info: MinimalViewInfo,
    post_process_blends: Vec<(PostProcessSettings, f32)>,
}

impl ViewModifierParams {
    pub fn new(view_info: MinimalViewInfo) -> Self {
        Self { view_info, post_process_blends: Vec::new() }
    }

    pub fn add_post_process_blend(&mut self, settings: PostProcessSettings, weight: f32) {
        self.post_process_blends.push((settings, weight));
    }

    pub fn post_process_blends(&self) -> &[(PostProcessSettings, f32)] {
        &self.post_process_blends
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blends_apply_in_call_order() {
        let mut settings = FinalPostProcessSettings::start(&PostProcessSettings::default());
        let first = PostProcessSettings { saturation: Some(0.0), ..Default::default() };
        let second = PostProcessSettings { saturation: Some(2.0), ..Default::default() };
        settings.blend(&first, 1.0);
        settings.blend(&second, 0.5);
        assert!((settings.saturation - 1.0).abs() < 1e-6);
        assert_eq!(settings.blend_count(), 2);
    }

    #[test]
    fn unset_fields_are_untouched() {
        let mut settings = FinalPostProcessSettings::start(&PostProcessSettings::default());
        let vignette = settings.vignette_intensity;
        settings.blend(&PostProcessSettings { contrast: Some(0.2), ..Default::default() }, 1.0);
        assert_eq!(settings.vignette_intensity, vignette);
    }

    #[test]
    #[should_panic(expected = "closed")]
    fn blending_after_end_is_a_contract_violation() {
        let mut settings = FinalPostProcessSettings::start(&PostProcessSettings::default());
        settings.end(ShowFlags::all(), &ExposureSettings::default());
        settings.blend(&PostProcessSettings::default(), 1.0);
    }

    #[test]
    fn end_respects_disabled_features() {
        let mut settings = FinalPostProcessSettings::start(&PostProcessSettings::default());
        settings.end(ShowFlags::empty(), &ExposureSettings { fixed: true, fixed_ev100: 3.0 });
        assert_eq!(settings.bloom_intensity, 0.0);
        assert_eq!(settings.fixed_exposure_ev100, Some(3.0));
        assert!(settings.is_closed());
    }

    #[test]
    fn view_state_remembers_previous_frame() {
        let mut state = SceneViewState::default();
        assert_eq!(state.advance(Mat4::IDENTITY), None);
        let scaled = Mat4::from_scale(Vec3::splat(2.0));
        assert_eq!(state.advance(scaled), Some(Mat4::IDENTITY));
        assert_eq!(state.frame_index(), 2);
    }

    #[test]
    fn view_matrix_moves_origin_to_zero() {
        let matrices = ViewMatrices::new(Vec3::new(5.0, 0.0, 0.0), Mat4::IDENTITY, Mat4::IDENTITY);
        let at_origin = matrices.view.transform_point3(Vec3::new(5.0, 0.0, 0.0));
        assert!(at_origin.length() < 1e-6);
    }
}

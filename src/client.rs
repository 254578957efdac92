//! Viewport client: camera state, view-mode and show-flag selection, and
//! the per-frame view construction handed to the renderer.

mod draw;
mod scene_view;

pub use draw::RenderServices;

use crate::camera::{CameraTransform, ViewportType, ORTHO_ROTATION_ORDER};
use crate::ecs::WorldId;
use crate::math::{srgb_to_linear, Rotator};
use crate::preview_world::PreviewWorld;
use crate::screen_percentage::{
    fraction_to_percentage, ScreenPercentageSettings, StaticResolutionFractionHeuristic, MAX_RESOLUTION_FRACTION,
    MIN_RESOLUTION_FRACTION,
};
use crate::show_flags::{apply_view_mode, ShowFlagInitMode, ShowFlags, ViewMode};
use crate::view::{ExposureSettings, SceneView, SceneViewState, ViewModifierParams};
use crate::viewport::SceneViewport;
use crate::visualization::{VisualizationCategory, VisualizationModes};
use glam::{IVec2, Vec3, Vec4};
use serde::Deserialize;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Asset paths of the calibration materials a view may overlay.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CalibrationMaterials {
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub grayscale: Option<String>,
    #[serde(default)]
    pub custom: Option<String>,
}

/// Construction-time settings for a [`ViewportClient`].
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub fov_degrees: f32,
    pub near_clip_plane: f32,
    pub initial_look_at_distance: f32,
    pub reversed_z: bool,
    pub realtime: bool,
    pub background_color: Vec4,
    pub lighting_only_brightness: Vec3,
    pub calibration: CalibrationMaterials,
    pub screen_percentage: ScreenPercentageSettings,
    pub dpi_scale: f32,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            fov_degrees: 90.0,
            near_clip_plane: 10.0,
            initial_look_at_distance: 1024.0,
            reversed_z: true,
            realtime: false,
            background_color: srgb_to_linear([55, 55, 55]),
            lighting_only_brightness: Vec3::splat(0.3),
            calibration: CalibrationMaterials::default(),
            screen_percentage: ScreenPercentageSettings::default(),
            dpi_scale: 1.0,
        }
    }
}

type Predicate = Box<dyn Fn() -> bool>;
type ShowFlagsOverride = Box<dyn Fn(&mut ShowFlags)>;
type ViewModifier = Box<dyn Fn(&mut ViewModifierParams)>;
type PostProcessOverride = Box<dyn Fn(&mut SceneView)>;

pub struct ViewportClient {
    viewport: Option<Rc<RefCell<SceneViewport>>>,
    settings: ClientSettings,
    viewport_type: ViewportType,
    ortho_rotation_cursor: usize,
    perspective_transform: CameraTransform,
    orthographic_transform: CameraTransform,
    view_state: SceneViewState,
    stereo_view_states: Vec<Option<SceneViewState>>,
    show_flags: ShowFlags,
    last_show_flags: ShowFlags,
    exposure: ExposureSettings,
    visualization: VisualizationModes,
    view_fov: f32,
    perspective_view_mode: ViewMode,
    orthographic_view_mode: ViewMode,
    view_mode_param: Option<i32>,
    view_mode_param_name: Option<String>,
    view_mode_param_names: HashMap<i32, String>,
    near_plane: Option<f32>,
    far_plane: Option<f32>,
    forcing_unlit_for_new_map: bool,
    in_game_view: bool,
    realtime: bool,
    needs_redraw: bool,
    time_for_force_redraw: f32,
    cursor_pos: IVec2,
    preview_resolution_fraction: Option<f32>,
    main_world: Option<WorldId>,
    last_app_seconds: Option<f64>,
    visibility: Option<Predicate>,
    immersive: Option<Predicate>,
    show_flags_override: Option<ShowFlagsOverride>,
    view_modifiers: Vec<ViewModifier>,
    post_process_override: Option<PostProcessOverride>,
}

impl ViewportClient {
    pub fn new(settings: ClientSettings) -> Self {
        let mut show_flags = ShowFlags::for_mode(ShowFlagInitMode::Editor);
        show_flags.remove(ShowFlags::MOTION_BLUR);
        show_flags.insert(ShowFlags::SNAP);
        let mut client = Self {
            viewport: None,
            view_fov: settings.fov_degrees,
            realtime: settings.realtime,
            settings,
            viewport_type: ViewportType::Perspective,
            ortho_rotation_cursor: 0,
            perspective_transform: CameraTransform::default(),
            orthographic_transform: CameraTransform::default(),
            view_state: SceneViewState::default(),
            stereo_view_states: Vec::new(),
            show_flags,
            last_show_flags: ShowFlags::for_mode(ShowFlagInitMode::Game),
            exposure: ExposureSettings::default(),
            visualization: VisualizationModes::default(),
            perspective_view_mode: ViewMode::Lit,
            orthographic_view_mode: ViewMode::BrushWireframe,
            view_mode_param: None,
            view_mode_param_name: None,
            view_mode_param_names: HashMap::new(),
            near_plane: None,
            far_plane: None,
            forcing_unlit_for_new_map: false,
            in_game_view: false,
            needs_redraw: true,
            time_for_force_redraw: 0.0,
            cursor_pos: IVec2::splat(-1),
            preview_resolution_fraction: None,
            main_world: None,
            last_app_seconds: None,
            visibility: None,
            immersive: None,
            show_flags_override: None,
            view_modifiers: Vec::new(),
            post_process_override: None,
        };
        client.set_view_mode(client.view_mode());
        client
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    pub fn viewport(&self) -> Option<&Rc<RefCell<SceneViewport>>> {
        self.viewport.as_ref()
    }

    pub fn set_viewport(&mut self, viewport: Option<Rc<RefCell<SceneViewport>>>) {
        self.viewport = viewport;
    }

    /// World treated as the main scene for lighting auto-detection.
    pub fn set_main_world(&mut self, world: Option<WorldId>) {
        self.main_world = world;
    }

    pub fn set_visibility_delegate(&mut self, delegate: impl Fn() -> bool + 'static) {
        self.visibility = Some(Box::new(delegate));
    }

    /// Unbound visibility reads as not visible.
    pub fn is_visible(&self) -> bool {
        self.visibility.as_ref().is_some_and(|delegate| delegate())
    }

    pub fn set_immersive_delegate(&mut self, delegate: impl Fn() -> bool + 'static) {
        self.immersive = Some(Box::new(delegate));
    }

    pub fn is_immersive(&self) -> bool {
        self.immersive.as_ref().is_some_and(|delegate| delegate())
    }

    pub fn set_show_flags_override(&mut self, apply: impl Fn(&mut ShowFlags) + 'static) {
        self.show_flags_override = Some(Box::new(apply));
    }

    pub fn clear_show_flags_override(&mut self) {
        self.show_flags_override = None;
    }

    pub fn add_view_modifier(&mut self, modifier: impl Fn(&mut ViewModifierParams) + 'static) {
        self.view_modifiers.push(Box::new(modifier));
    }

    /// Hook run on each view right after its post-process settings are
    /// started and before any blend is applied.
    pub fn set_post_process_override(&mut self, apply: impl Fn(&mut SceneView) + 'static) {
        self.post_process_override = Some(Box::new(apply));
    }

    pub fn viewport_type(&self) -> ViewportType {
        self.viewport_type
    }

    pub fn is_perspective(&self) -> bool {
        self.viewport_type.is_perspective()
    }

    pub fn is_ortho(&self) -> bool {
        !self.is_perspective()
    }

    pub fn view_transform(&self) -> &CameraTransform {
        if self.is_perspective() {
            &self.perspective_transform
        } else {
            &self.orthographic_transform
        }
    }

    pub fn view_transform_mut(&mut self) -> &mut CameraTransform {
        if self.is_perspective() {
            &mut self.perspective_transform
        } else {
            &mut self.orthographic_transform
        }
    }

    pub fn view_location(&self) -> Vec3 {
        self.view_transform().location()
    }

    pub fn set_view_location(&mut self, location: Vec3) {
        self.view_transform_mut().set_location(location);
    }

    pub fn view_rotation(&self) -> Rotator {
        self.view_transform().rotation()
    }

    pub fn set_view_rotation(&mut self, rotation: Rotator) {
        self.view_transform_mut().set_rotation(rotation);
    }

    pub fn look_at_location(&self) -> Vec3 {
        self.view_transform().look_at()
    }

    pub fn set_look_at_location(&mut self, look_at: Vec3, recalculate: bool) {
        self.view_transform_mut().set_look_at(look_at, recalculate);
    }

    /// Places both cameras and sets their pivots a fixed distance ahead.
    pub fn set_initial_view_transform(&mut self, location: Vec3, rotation: Rotator) {
        let distance = self.settings.initial_look_at_distance;
        self.perspective_transform.set_initial(location, rotation, distance);
        self.orthographic_transform.set_initial(location, rotation, distance);
    }

    pub fn ortho_zoom(&self) -> f32 {
        self.orthographic_transform.ortho_zoom()
    }

    pub fn set_ortho_zoom(&mut self, zoom: f32) {
        self.orthographic_transform.set_ortho_zoom(zoom);
    }

    /// World units covered by one pixel of the current orthographic view.
    pub fn ortho_units_per_pixel(&self) -> f32 {
        let width = self.viewport_size().x;
        crate::projection::ortho_units_per_pixel(width, self.ortho_zoom())
    }

    pub fn view_fov(&self) -> f32 {
        self.view_fov
    }

    pub fn set_view_fov(&mut self, fov_degrees: f32) {
        self.view_fov = fov_degrees;
        self.invalidate(true);
    }

    pub fn near_clip_plane(&self) -> f32 {
        self.near_plane.unwrap_or(self.settings.near_clip_plane)
    }

    /// Negative values restore the default near plane.
    pub fn override_near_clip_plane(&mut self, near: f32) {
        self.near_plane = (near >= 0.0).then_some(near);
    }

    pub fn far_clip_plane_override(&self) -> Option<f32> {
        self.far_plane
    }

    /// Non-positive values remove the override.
    pub fn override_far_clip_plane(&mut self, far: f32) {
        self.far_plane = (far > 0.0).then_some(far);
    }

    pub fn cursor_pos(&self) -> IVec2 {
        self.cursor_pos
    }

    pub fn set_cursor_pos(&mut self, pos: IVec2) {
        self.cursor_pos = pos;
    }

    pub fn background_color(&self) -> Vec4 {
        self.settings.background_color
    }

    pub fn set_background_color(&mut self, color: Vec4) {
        self.settings.background_color = color;
        self.invalidate(false);
    }

    pub fn set_viewport_type(&mut self, viewport_type: ViewportType) {
        self.viewport_type = viewport_type;
        apply_view_mode(self.view_mode(), self.is_perspective(), &mut self.show_flags);
        self.invalidate(true);
    }

    /// Steps through the fixed ring of axis-aligned orthographic views,
    /// regardless of the current type.
    pub fn rotate_viewport_type(&mut self) {
        self.viewport_type = ViewportType::Ortho(ORTHO_ROTATION_ORDER[self.ortho_rotation_cursor]);
        apply_view_mode(self.view_mode(), self.is_perspective(), &mut self.show_flags);
        self.invalidate(true);
        self.ortho_rotation_cursor = (self.ortho_rotation_cursor + 1) % ORTHO_ROTATION_ORDER.len();
    }

    pub fn is_active_viewport_type_in_rotation(&self) -> bool {
        self.viewport_type == ViewportType::Ortho(ORTHO_ROTATION_ORDER[self.ortho_rotation_cursor])
    }

    pub fn view_mode(&self) -> ViewMode {
        if self.is_perspective() {
            self.perspective_view_mode
        } else {
            self.orthographic_view_mode
        }
    }

    pub fn is_view_mode_enabled(&self, mode: ViewMode) -> bool {
        self.view_mode() == mode
    }

    pub fn set_view_mode(&mut self, mode: ViewMode) {
        self.view_mode_param = None;
        self.view_mode_param_name = None;
        self.view_mode_param_names.clear();
        if self.is_perspective() {
            self.perspective_view_mode = mode;
            self.forcing_unlit_for_new_map = false;
        } else {
            self.orthographic_view_mode = mode;
        }
        apply_view_mode(mode, self.is_perspective(), &mut self.show_flags);
        self.invalidate(true);
    }

    pub fn set_view_modes(&mut self, perspective: ViewMode, orthographic: ViewMode) {
        self.perspective_view_mode = perspective;
        self.orthographic_view_mode = orthographic;
        apply_view_mode(self.view_mode(), self.is_perspective(), &mut self.show_flags);
        self.invalidate(true);
    }

    pub fn perspective_view_mode(&self) -> ViewMode {
        self.perspective_view_mode
    }

    pub fn orthographic_view_mode(&self) -> ViewMode {
        self.orthographic_view_mode
    }

    pub fn view_mode_param(&self) -> Option<i32> {
        self.view_mode_param
    }

    pub fn view_mode_param_name(&self) -> Option<&str> {
        self.view_mode_param_name.as_deref()
    }

    /// Records the display name bound to a view-mode parameter value.
    pub fn bind_view_mode_param_name(&mut self, param: i32, name: impl Into<String>) {
        self.view_mode_param_names.insert(param, name.into());
    }

    pub fn set_view_mode_param(&mut self, param: i32) {
        self.view_mode_param = Some(param);
        self.view_mode_param_name = self.view_mode_param_names.get(&param).cloned();
        self.invalidate(true);
    }

    pub fn is_view_mode_param(&self, param: i32) -> bool {
        let Some(current) = self.view_mode_param else {
            return false;
        };
        let expected = self.view_mode_param_names.get(&current);
        current == param && self.view_mode_param_name.as_ref() == expected
    }

    pub fn set_force_unlit_for_new_map(&mut self, force: bool) {
        self.forcing_unlit_for_new_map = force;
    }

    pub fn is_forcing_unlit_for_new_map(&self) -> bool {
        self.forcing_unlit_for_new_map
    }

    pub fn change_visualization_mode(&mut self, category: VisualizationCategory, name: &str) {
        self.set_view_mode(category.view_mode());
        self.visualization.set(category, name);
    }

    pub fn is_visualization_mode_selected(&self, category: VisualizationCategory, name: &str) -> bool {
        self.is_view_mode_enabled(category.view_mode()) && self.visualization.get(category) == name
    }

    /// Display name of the selected mode. Calling this while the category's
    /// view mode is inactive is a contract violation.
    pub fn current_visualization_display_name(&self, category: VisualizationCategory) -> String {
        assert!(
            self.is_view_mode_enabled(category.view_mode()),
            "{category:?} visualization queried while view mode is {}",
            self.view_mode()
        );
        category.display_name(self.visualization.get(category))
    }

    pub fn visualization_modes(&self) -> &VisualizationModes {
        &self.visualization
    }

    pub fn is_visualize_calibration_material_enabled(&self) -> bool {
        let calibration = &self.settings.calibration;
        (self.show_flags.contains(ShowFlags::VISUALIZE_CALIBRATION_COLOR) && calibration.color.is_some())
            || (self.show_flags.contains(ShowFlags::VISUALIZE_CALIBRATION_GRAYSCALE)
                && calibration.grayscale.is_some())
            || (self.show_flags.contains(ShowFlags::VISUALIZE_CALIBRATION_CUSTOM) && calibration.custom.is_some())
    }

    pub fn show_flags(&self) -> ShowFlags {
        self.show_flags
    }

    pub fn show_flags_mut(&mut self) -> &mut ShowFlags {
        &mut self.show_flags
    }

    pub fn handle_toggle_show_flag(&mut self, flag: ShowFlags) {
        self.show_flags.toggle(flag);
        self.invalidate(true);
    }

    pub fn is_show_flag_enabled(&self, flag: ShowFlags) -> bool {
        self.show_flags.contains(flag)
    }

    pub fn set_show_aspect_ratio_bars(&mut self, show: bool) {
        self.show_flags.set(ShowFlags::CAMERA_ASPECT_RATIO_BARS, show);
        self.invalidate(false);
    }

    pub fn set_show_safe_frames(&mut self, show: bool) {
        self.show_flags.set(ShowFlags::CAMERA_SAFE_FRAMES, show);
        self.invalidate(false);
    }

    pub fn is_in_game_view(&self) -> bool {
        self.in_game_view
    }

    /// Swaps between the editor and game flag sets, keeping composite
    /// editor primitives as they were.
    pub fn set_game_view(&mut self, enable: bool) {
        let composite = self.show_flags.contains(ShowFlags::COMPOSITE_EDITOR_PRIMITIVES);
        let (mut game, mut editor) =
            (ShowFlags::for_mode(ShowFlagInitMode::Game), ShowFlags::for_mode(ShowFlagInitMode::Editor));
        if self.show_flags.contains(ShowFlags::GAME) {
            game = self.show_flags;
            editor = self.last_show_flags;
        } else if self.last_show_flags.contains(ShowFlags::GAME) {
            game = self.last_show_flags;
            editor = self.show_flags;
        }
        if enable {
            self.show_flags = game;
            self.last_show_flags = editor;
        } else {
            self.show_flags = editor;
            self.last_show_flags = game;
        }
        self.show_flags.set(ShowFlags::COMPOSITE_EDITOR_PRIMITIVES, composite);
        self.last_show_flags.set(ShowFlags::COMPOSITE_EDITOR_PRIMITIVES, composite);
        if enable {
            self.show_flags.remove(ShowFlags::MODE_WIDGETS | ShowFlags::SELECTION);
        }
        self.show_flags.remove(ShowFlags::SELECTION_OUTLINE);
        apply_view_mode(self.view_mode(), self.is_perspective(), &mut self.show_flags);
        self.in_game_view = enable;
        self.invalidate(true);
    }

    /// Turns lighting off while the main scene has no lights and back on
    /// once one appears. Once lights have been seen the check stops for good.
    pub fn update_lighting_show_flags(&mut self, flags: &mut ShowFlags, scene: Option<&PreviewWorld>) -> bool {
        if !self.forcing_unlit_for_new_map || !self.is_perspective() || self.in_game_view {
            return false;
        }
        let Some(scene) = scene.filter(|scene| Some(scene.id()) == self.main_world) else {
            return false;
        };
        let has_lights = scene.has_any_lights();
        let changed = flags.contains(ShowFlags::LIGHTING) != has_lights;
        flags.set(ShowFlags::LIGHTING, has_lights);
        if has_lights {
            self.forcing_unlit_for_new_map = false;
        }
        changed
    }

    pub fn exposure(&self) -> &ExposureSettings {
        &self.exposure
    }

    pub fn set_exposure(&mut self, exposure: ExposureSettings) {
        self.exposure = exposure;
        self.invalidate(false);
    }

    pub fn dpi_scale(&self) -> f32 {
        self.viewport.as_ref().map_or(self.settings.dpi_scale, |viewport| viewport.borrow().dpi_scale())
    }

    pub fn handle_dpi_scale_changed(&mut self, dpi_scale: f32) {
        self.settings.dpi_scale = dpi_scale;
        if let Some(viewport) = &self.viewport {
            viewport.borrow_mut().set_dpi_scale(dpi_scale);
        }
        self.invalidate(true);
    }

    pub fn supports_preview_resolution_fraction(&self) -> bool {
        self.view_mode().supports_resolution_fraction()
            && !self.show_flags.intersects(
                ShowFlags::VISUALIZE_BUFFER | ShowFlags::VISUALIZE_NANITE | ShowFlags::VISUALIZE_VIRTUAL_SHADOW_MAP,
            )
            && !self.is_visualize_calibration_material_enabled()
    }

    pub fn default_resolution_fraction(&self) -> f32 {
        let size = self.viewport_size();
        let pixels = (i64::from(size.x) * i64::from(size.y)).max(1) as u64;
        StaticResolutionFractionHeuristic::new(self.settings.screen_percentage.clone(), pixels, self.dpi_scale())
            .resolve_resolution_fraction()
    }

    pub fn preview_resolution_fraction(&self) -> Option<f32> {
        self.preview_resolution_fraction
    }

    pub fn preview_screen_percentage(&self) -> i32 {
        let fraction = self.preview_resolution_fraction.unwrap_or_else(|| self.default_resolution_fraction());
        fraction_to_percentage(fraction)
    }

    /// Keeps an explicit override only when it is in range and differs from
    /// the automatic value; anything else returns to automatic.
    pub fn set_preview_screen_percentage(&mut self, percentage: i32) {
        let auto = fraction_to_percentage(self.default_resolution_fraction());
        let fraction = percentage as f32 / 100.0;
        if (MIN_RESOLUTION_FRACTION..=MAX_RESOLUTION_FRACTION).contains(&fraction) && percentage != auto {
            self.preview_resolution_fraction = Some(fraction);
        } else {
            self.preview_resolution_fraction = None;
        }
    }

    pub fn is_realtime(&self) -> bool {
        self.realtime
    }

    pub fn set_realtime(&mut self, realtime: bool) {
        self.realtime = realtime;
    }

    pub fn needs_redraw(&self) -> bool {
        self.needs_redraw
    }

    /// Forces a full redraw once `seconds` of ticks have elapsed.
    pub fn request_delayed_redraw(&mut self, seconds: f32) {
        self.time_for_force_redraw = seconds;
    }

    pub fn tick(&mut self, delta_seconds: f32) {
        if self.time_for_force_redraw > 0.0 {
            self.time_for_force_redraw -= delta_seconds;
            if self.time_for_force_redraw < 0.0 {
                self.time_for_force_redraw = 0.0;
                self.invalidate(true);
            }
        }
    }

    pub fn invalidate(&mut self, invalidate_hit_proxies: bool) {
        self.needs_redraw = true;
        if let Some(viewport) = &self.viewport {
            let mut viewport = viewport.borrow_mut();
            if invalidate_hit_proxies {
                viewport.invalidate();
            } else {
                viewport.invalidate_display();
            }
        }
    }

    pub fn view_state(&self) -> &SceneViewState {
        &self.view_state
    }

    pub fn stereo_view_state(&self, index: usize) -> Option<&SceneViewState> {
        self.stereo_view_states.get(index).and_then(Option::as_ref)
    }

    pub fn allocated_stereo_view_states(&self) -> usize {
        self.stereo_view_states.iter().filter(|slot| slot.is_some()).count()
    }

    pub(crate) fn viewport_size(&self) -> IVec2 {
        self.viewport.as_ref().map_or(IVec2::ZERO, |viewport| viewport.borrow().size_xy())
    }
}

impl Drop for ViewportClient {
    fn drop(&mut self) {
        if self.viewport.is_some() && !std::thread::panicking() {
            panic!("viewport client dropped while still attached to a viewport");
        }
    }
}

macro_rules! visualization_accessors {
    ($($category:ident => $change:ident, $selected:ident, $display:ident;)*) => {
        impl ViewportClient {
            $(
                pub fn $change(&mut self, name: &str) {
                    self.change_visualization_mode(VisualizationCategory::$category, name);
                }

                pub fn $selected(&self, name: &str) -> bool {
                    self.is_visualization_mode_selected(VisualizationCategory::$category, name)
                }

                pub fn $display(&self) -> String {
                    self.current_visualization_display_name(VisualizationCategory::$category)
                }
            )*
        }
    };
}

visualization_accessors! {
    Buffer => change_buffer_visualization_mode, is_buffer_visualization_mode_selected, current_buffer_visualization_mode_display_name;
    Nanite => change_nanite_visualization_mode, is_nanite_visualization_mode_selected, current_nanite_visualization_mode_display_name;
    Lumen => change_lumen_visualization_mode, is_lumen_visualization_mode_selected, current_lumen_visualization_mode_display_name;
    Strata => change_strata_visualization_mode, is_strata_visualization_mode_selected, current_strata_visualization_mode_display_name;
    Groom => change_groom_visualization_mode, is_groom_visualization_mode_selected, current_groom_visualization_mode_display_name;
    VirtualShadowMap => change_virtual_shadow_map_visualization_mode, is_virtual_shadow_map_visualization_mode_selected, current_virtual_shadow_map_visualization_mode_display_name;
    RayTracingDebug => change_ray_tracing_debug_visualization_mode, is_ray_tracing_debug_visualization_mode_selected, current_ray_tracing_debug_visualization_mode_display_name;
    GpuSkinCache => change_gpu_skin_cache_visualization_mode, is_gpu_skin_cache_visualization_mode_selected, current_gpu_skin_cache_visualization_mode_display_name;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor_class::{ActorClassRegistry, ClassResolver, SoftClassRef};
    use crate::camera::OrthoView;
    use crate::preview_world::PreviewWorldOptions;
    use winit::dpi::PhysicalSize;

    fn attached(size: (u32, u32)) -> (ViewportClient, Rc<RefCell<SceneViewport>>) {
        let viewport = Rc::new(RefCell::new(SceneViewport::new(PhysicalSize::new(size.0, size.1), 1.0)));
        let mut client = ViewportClient::new(ClientSettings::default());
        client.set_viewport(Some(Rc::clone(&viewport)));
        (client, viewport)
    }

    #[test]
    fn construction_defaults() {
        let client = ViewportClient::new(ClientSettings::default());
        assert!(client.is_perspective());
        assert_eq!(client.view_mode(), ViewMode::Lit);
        assert_eq!(client.orthographic_view_mode(), ViewMode::BrushWireframe);
        assert!(!client.show_flags().contains(ShowFlags::MOTION_BLUR));
        assert!(client.show_flags().contains(ShowFlags::SNAP));
        assert_eq!(client.cursor_pos(), IVec2::splat(-1));
        assert!(!client.is_visible());
        assert!(!client.is_immersive());
    }

    #[test]
    fn rotation_cycles_through_six_axes_and_wraps() {
        let mut client = ViewportClient::new(ClientSettings::default());
        let mut seen = Vec::new();
        for _ in 0..7 {
            client.rotate_viewport_type();
            seen.push(client.viewport_type());
        }
        assert_eq!(seen[0], ViewportType::Ortho(OrthoView::Front));
        assert_eq!(seen[6], seen[0]);
        assert_eq!(client.view_mode(), ViewMode::BrushWireframe);
        assert!(client.show_flags().contains(ShowFlags::WIREFRAME));
    }

    #[test]
    fn view_modes_are_remembered_per_projection_group() {
        let mut client = ViewportClient::new(ClientSettings::default());
        client.set_view_mode(ViewMode::Unlit);
        client.set_viewport_type(ViewportType::Ortho(OrthoView::Top));
        assert_eq!(client.view_mode(), ViewMode::BrushWireframe);
        client.set_view_mode(ViewMode::Wireframe);
        client.set_viewport_type(ViewportType::Perspective);
        assert_eq!(client.view_mode(), ViewMode::Unlit);
        assert_eq!(client.orthographic_view_mode(), ViewMode::Wireframe);
    }

    #[test]
    fn view_mode_param_names_are_cleared_by_mode_changes() {
        let mut client = ViewportClient::new(ClientSettings::default());
        client.bind_view_mode_param_name(3, "Roughness");
        client.set_view_mode_param(3);
        assert!(client.is_view_mode_param(3));
        assert_eq!(client.view_mode_param_name(), Some("Roughness"));
        client.set_view_mode(ViewMode::Lit);
        assert_eq!(client.view_mode_param(), None);
        assert!(!client.is_view_mode_param(3));
    }

    #[test]
    fn only_the_active_visualization_reports_selected() {
        let mut client = ViewportClient::new(ClientSettings::default());
        client.change_buffer_visualization_mode("BaseColor");
        assert!(client.is_buffer_visualization_mode_selected("BaseColor"));
        client.change_nanite_visualization_mode("Triangles");
        assert!(!client.is_buffer_visualization_mode_selected("BaseColor"));
        assert!(client.is_nanite_visualization_mode_selected("Triangles"));
        assert_eq!(client.current_nanite_visualization_mode_display_name(), "Triangles");
    }

    #[test]
    #[should_panic(expected = "visualization queried")]
    fn inactive_display_name_query_asserts() {
        let client = ViewportClient::new(ClientSettings::default());
        let _ = client.current_lumen_visualization_mode_display_name();
    }

    #[test]
    fn screen_percentage_override_clears_at_auto_value() {
        let (mut client, _viewport) = attached((1280, 720));
        assert_eq!(client.preview_screen_percentage(), 100);
        client.set_preview_screen_percentage(50);
        assert_eq!(client.preview_resolution_fraction(), Some(0.5));
        assert_eq!(client.preview_screen_percentage(), 50);
        client.set_preview_screen_percentage(100);
        assert_eq!(client.preview_resolution_fraction(), None);
        client.set_preview_screen_percentage(500);
        assert_eq!(client.preview_resolution_fraction(), None);
        client.set_preview_screen_percentage(10);
        assert_eq!(client.preview_screen_percentage(), 100);
        client.set_viewport(None);
    }

    #[test]
    fn wireframe_and_buffer_modes_do_not_support_preview_fraction() {
        let mut client = ViewportClient::new(ClientSettings::default());
        assert!(client.supports_preview_resolution_fraction());
        client.set_view_mode(ViewMode::Wireframe);
        assert!(!client.supports_preview_resolution_fraction());
        client.change_buffer_visualization_mode("");
        assert!(!client.supports_preview_resolution_fraction());
    }

    #[test]
    fn calibration_material_needs_flag_and_path() {
        let mut settings = ClientSettings::default();
        settings.calibration.grayscale = Some("/Engine/Calibration/Gray".into());
        let mut client = ViewportClient::new(settings);
        client.show_flags_mut().insert(ShowFlags::VISUALIZE_CALIBRATION_COLOR);
        assert!(!client.is_visualize_calibration_material_enabled());
        client.show_flags_mut().insert(ShowFlags::VISUALIZE_CALIBRATION_GRAYSCALE);
        assert!(client.is_visualize_calibration_material_enabled());
        assert!(!client.supports_preview_resolution_fraction());
    }

    #[test]
    fn game_view_swaps_flag_sets_and_keeps_composite() {
        let mut client = ViewportClient::new(ClientSettings::default());
        client.show_flags_mut().remove(ShowFlags::COMPOSITE_EDITOR_PRIMITIVES);
        client.set_game_view(true);
        assert!(client.is_in_game_view());
        assert!(client.show_flags().contains(ShowFlags::GAME));
        assert!(!client.show_flags().intersects(ShowFlags::MODE_WIDGETS | ShowFlags::SELECTION));
        assert!(!client.show_flags().contains(ShowFlags::COMPOSITE_EDITOR_PRIMITIVES));
        client.set_game_view(false);
        assert!(!client.show_flags().contains(ShowFlags::GAME));
        assert!(client.show_flags().contains(ShowFlags::SNAP));
        assert!(!client.show_flags().contains(ShowFlags::COMPOSITE_EDITOR_PRIMITIVES));
    }

    #[test]
    fn forced_unlit_clears_once_lights_appear() {
        let mut world = PreviewWorld::new(&PreviewWorldOptions::default());
        let mut client = ViewportClient::new(ClientSettings::default());
        client.set_main_world(Some(world.id()));
        client.set_force_unlit_for_new_map(true);

        let mut flags = client.show_flags();
        assert!(client.update_lighting_show_flags(&mut flags, Some(&world)));
        assert!(!flags.contains(ShowFlags::LIGHTING));
        assert!(client.is_forcing_unlit_for_new_map());

        let registry = ActorClassRegistry::with_builtin_classes();
        let light = registry.load_synchronous(&SoftClassRef::new("PointLight")).expect("builtin");
        let actor = world
            .spawn_actor(light.as_ref(), crate::math::Transform::IDENTITY, &crate::entries::entry_spawn_parameters())
            .expect("spawn");
        assert!(client.update_lighting_show_flags(&mut flags, Some(&world)));
        assert!(flags.contains(ShowFlags::LIGHTING));
        assert!(!client.is_forcing_unlit_for_new_map());

        world.destroy_actor(actor);
        let mut later = client.show_flags();
        assert!(!client.update_lighting_show_flags(&mut later, Some(&world)));
        assert!(later.contains(ShowFlags::LIGHTING));
    }

    #[test]
    fn delayed_redraw_invalidates_after_countdown() {
        let (mut client, viewport) = attached((8, 8));
        viewport.borrow_mut().finish_draw();
        client.request_delayed_redraw(0.1);
        client.tick(0.05);
        assert!(!viewport.borrow().needs_redraw());
        client.tick(0.1);
        assert!(viewport.borrow().needs_redraw());
        client.set_viewport(None);
    }

    #[test]
    #[should_panic(expected = "still attached")]
    fn dropping_attached_client_is_fatal() {
        let (client, _viewport) = attached((8, 8));
        drop(client);
    }
}

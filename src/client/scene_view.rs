use super::ViewportClient;
use crate::camera::ViewportType;
use crate::math::IntRect;
use crate::preview_world::PreviewWorld;
use crate::projection::{
    aspect_multipliers, half_fov_radians, ortho_units_per_pixel, perspective_view_rotation, reversed_z_ortho,
    reversed_z_perspective, standard_perspective, HALF_WORLD_MAX,
};
use crate::show_flags::ShowFlags;
use crate::stereo::{StereoDevice, StereoPass};
use crate::view::{
    FinalPostProcessSettings, MinimalViewInfo, PostProcessSettings, SceneView, SceneViewFamily, SceneViewState,
    ViewInitOptions, ViewModifierParams,
};
use glam::{IVec2, Mat4, Vec2, Vec4};

impl ViewportClient {
    /// Builds the view for the mono camera or one stereo eye, appends it to
    /// `family` and returns its index there.
    ///
    /// A zero-sized viewport is treated as 1x1; the result never carries
    /// non-finite matrices for finite camera input.
    pub fn calc_scene_view(
        &mut self,
        family: &mut SceneViewFamily,
        scene: Option<&PreviewWorld>,
        stereo: Option<&dyn StereoDevice>,
        stereo_view_index: Option<usize>,
    ) -> usize {
        let eye = stereo_view_index.zip(stereo);
        let world_to_meters = scene.map_or(100.0, PreviewWorld::world_to_meters);

        let transform = self.view_transform();
        let mut modifier = ViewModifierParams::new(MinimalViewInfo {
            location: transform.location(),
            rotation: transform.rotation(),
            fov_degrees: self.view_fov,
            post_process_settings: PostProcessSettings::default(),
            post_process_blend_weight: 0.0,
        });
        for apply in &self.view_modifiers {
            apply(&mut modifier);
        }
        let mut location = modifier.view_info.location;
        let mut rotation = modifier.view_info.rotation;
        let fov_degrees = modifier.view_info.fov_degrees;

        let size = self.viewport_size().max(IVec2::ONE);
        let mut view_rect = IntRect::from_size(size);
        let near = self.near_clip_plane();
        let mut stereo_pass = StereoPass::Full;

        let (view_rotation, projection) = match self.viewport_type {
            ViewportType::Perspective => {
                if let Some((index, device)) = eye {
                    view_rect = device.adjust_view_rect(index, view_rect);
                    device.calculate_stereo_view_offset(index, &mut rotation, world_to_meters, &mut location);
                }
                let view_rotation = perspective_view_rotation(rotation);
                let projection = match eye {
                    Some((index, device)) => {
                        stereo_pass = device.view_pass(index);
                        device.stereo_projection_matrix(index)
                    }
                    None => self.perspective_projection(view_rect, fov_degrees, near),
                };
                (view_rotation, projection)
            }
            ViewportType::Ortho(axis) => {
                let z_scale = 0.5 / HALF_WORLD_MAX;
                let z_offset = HALF_WORLD_MAX;
                let units_per_pixel = ortho_units_per_pixel(size.x, self.ortho_zoom());
                let half_width = units_per_pixel * size.x as f32 / 2.0;
                let half_height = units_per_pixel * size.y as f32 / 2.0;
                (axis.view_rotation(), reversed_z_ortho(half_width, half_height, z_scale, z_offset))
            }
        };

        if !view_rect.is_valid() {
            log::debug!("[viewport] degenerate view rect {view_rect:?}; using 1x1");
            view_rect = IntRect::from_size(IVec2::ONE);
        }

        let state_index = stereo_view_index.unwrap_or(0);
        if eye.is_some() {
            if self.stereo_view_states.len() <= state_index {
                self.stereo_view_states.resize_with(state_index + 1, || None);
            }
            self.stereo_view_states[state_index].get_or_insert_with(SceneViewState::default);
        }

        let init = ViewInitOptions {
            view_origin: location,
            view_rotation_matrix: view_rotation,
            projection_matrix: projection,
            view_rect,
            stereo_pass,
            stereo_view_index,
            world_to_meters,
            background_color: self.settings.background_color,
            cursor_pos: self.cursor_pos,
            fov_degrees,
            near_clip_plane: near,
            far_clip_plane_override: self.far_plane,
            use_faux_ortho_view_pos: true,
        };
        let mut view = SceneView::new(&init);
        view.view_location = location;
        view.view_rotation = rotation;
        view.view_state_index = state_index;

        let state = match self.stereo_view_states.get_mut(state_index) {
            Some(Some(state)) if state_index != 0 => state,
            _ => &mut self.view_state,
        };
        view.prev_view_projection = state.advance(view.matrices.view_projection);
        view.temporal_frame_index = state.frame_index();

        let base = scene.map(|scene| scene.post_process_settings().clone()).unwrap_or_default();
        view.post_process = FinalPostProcessSettings::start(&base);
        if let Some(apply) = &self.post_process_override {
            apply(&mut view);
        }
        let info = &modifier.view_info;
        if info.post_process_blend_weight > 0.0 {
            view.post_process.blend(&info.post_process_settings, info.post_process_blend_weight);
        }
        for (settings, weight) in modifier.post_process_blends() {
            view.post_process.blend(settings, *weight);
        }
        view.post_process.end(family.show_flags, &family.exposure);

        let extensions = family.view_extensions.clone();
        for extension in &extensions {
            extension.setup_view(family, &mut view);
        }

        family.views.push(view);
        let index = family.views.len() - 1;
        debug_assert!(stereo_view_index.map_or(true, |eye| eye == index));
        index
    }

    fn perspective_projection(&self, view_rect: IntRect, fov_degrees: f32, near: f32) -> Mat4 {
        let half_fov = half_fov_radians(fov_degrees);
        let (mult_x, mult_y) = aspect_multipliers(view_rect.width(), view_rect.height());
        if self.settings.reversed_z {
            reversed_z_perspective(half_fov, half_fov, mult_x, mult_y, near, near)
        } else {
            standard_perspective(half_fov, half_fov, mult_x, mult_y, near, near)
        }
    }

    /// Material overrides for the lighting-debug modes. Wireframe wins over
    /// the override modes; the diffuse/specular show flags get the final word.
    pub fn setup_view_for_rendering(&self, show_flags: ShowFlags, view: &mut SceneView) {
        let brightness = self.settings.lighting_only_brightness;
        if show_flags.contains(ShowFlags::WIREFRAME) {
            view.diffuse_override = Vec4::ZERO;
            view.specular_override = Vec4::ZERO;
        } else if show_flags.contains(ShowFlags::OVERRIDE_DIFFUSE_AND_SPECULAR) {
            view.diffuse_override = brightness.extend(0.0);
            view.specular_override = Vec4::new(0.1, 0.1, 0.1, 0.0);
        } else if show_flags.contains(ShowFlags::LIGHTING_ONLY_OVERRIDE) {
            view.diffuse_override = brightness.extend(0.0);
            view.specular_override = Vec4::ZERO;
        } else if show_flags.contains(ShowFlags::REFLECTION_OVERRIDE) {
            view.diffuse_override = Vec4::ZERO;
            view.specular_override = Vec4::new(1.0, 1.0, 1.0, 0.0);
            view.normal_override = Vec4::new(0.0, 0.0, 1.0, 0.0);
            view.roughness_override = Vec2::ZERO;
        }
        if !show_flags.contains(ShowFlags::DIFFUSE) {
            view.diffuse_override = Vec4::ZERO;
        }
        if !show_flags.contains(ShowFlags::SPECULAR) {
            view.specular_override = Vec4::ZERO;
        }
        view.visualization = self.visualization.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::super::ClientSettings;
    use super::*;
    use crate::camera::OrthoView;
    use crate::math::{mat4_is_finite, Rotator};
    use crate::renderer::RenderTarget;
    use crate::stereo::SideBySideStereo;
    use crate::time::GameTime;
    use crate::viewport::SceneViewport;
    use glam::Vec3;
    use std::cell::RefCell;
    use std::rc::Rc;
    use winit::dpi::PhysicalSize;

    fn setup(width: u32, height: u32) -> (ViewportClient, Rc<RefCell<SceneViewport>>, SceneViewFamily) {
        let viewport = Rc::new(RefCell::new(SceneViewport::new(PhysicalSize::new(width, height), 1.0)));
        let mut client = ViewportClient::new(ClientSettings::default());
        client.set_viewport(Some(Rc::clone(&viewport)));
        let target = RenderTarget::new(PhysicalSize::new(width, height));
        let family = SceneViewFamily::new(target, None, client.show_flags(), GameTime::default());
        (client, viewport, family)
    }

    #[test]
    fn zero_sized_viewport_yields_finite_one_by_one_view() {
        let (mut client, _viewport, mut family) = setup(0, 0);
        for kind in ViewportType::ALL {
            client.set_viewport_type(kind);
            let index = client.calc_scene_view(&mut family, None, None, None);
            let view = &family.views[index];
            assert_eq!(view.view_rect.size(), IVec2::ONE);
            assert!(mat4_is_finite(&view.matrices.projection), "{kind}");
            assert!(mat4_is_finite(&view.matrices.view_projection), "{kind}");
        }
        client.set_viewport(None);
    }

    #[test]
    fn perspective_looks_down_camera_forward() {
        let (mut client, _viewport, mut family) = setup(800, 600);
        client.set_view_location(Vec3::new(-100.0, 0.0, 0.0));
        client.set_view_rotation(Rotator::ZERO);
        let index = client.calc_scene_view(&mut family, None, None, None);
        let view = &family.views[index];
        let ahead = view.matrices.view.transform_point3(Vec3::ZERO);
        assert!((ahead.z - 100.0).abs() < 1.0e-3);
        assert!(ahead.x.abs() < 1.0e-3 && ahead.y.abs() < 1.0e-3);
        assert!(view.use_faux_ortho_view_pos);
        client.set_viewport(None);
    }

    #[test]
    fn ortho_half_extents_follow_units_per_pixel() {
        let (mut client, _viewport, mut family) = setup(500, 250);
        client.set_viewport_type(ViewportType::Ortho(OrthoView::Top));
        let index = client.calc_scene_view(&mut family, None, None, None);
        let projection = family.views[index].matrices.projection;
        let units = ortho_units_per_pixel(500, 1.0);
        assert!((projection.x_axis.x - 1.0 / (units * 250.0)).abs() < 1.0e-6);
        assert!((projection.y_axis.y - 1.0 / (units * 125.0)).abs() < 1.0e-6);
        client.set_viewport(None);
    }

    #[test]
    fn stereo_eyes_get_their_own_state_slots() {
        let (mut client, _viewport, mut family) = setup(1280, 720);
        let device = SideBySideStereo::default();
        for eye in 0..2 {
            let index = client.calc_scene_view(&mut family, None, Some(&device), Some(eye));
            assert_eq!(index, eye);
        }
        assert_eq!(client.allocated_stereo_view_states(), 2);
        assert_eq!(family.views[1].stereo_pass, StereoPass::Secondary);
        assert_eq!(family.views[1].view_state_index, 1);
        assert_ne!(family.views[0].view_origin, family.views[1].view_origin);
        assert_eq!(client.view_state().frame_index(), 1);
        assert_eq!(client.stereo_view_state(1).map(SceneViewState::frame_index), Some(1));
        client.set_viewport(None);
    }

    #[test]
    fn post_process_blends_apply_in_queue_order_and_close() {
        let (mut client, _viewport, mut family) = setup(64, 64);
        client.add_view_modifier(|params| {
            params.view_info.post_process_settings.saturation = Some(0.0);
            params.view_info.post_process_blend_weight = 1.0;
            params.add_post_process_blend(PostProcessSettings { saturation: Some(2.0), ..Default::default() }, 1.0);
            params.add_post_process_blend(PostProcessSettings { saturation: Some(0.5), ..Default::default() }, 0.5);
        });
        let index = client.calc_scene_view(&mut family, None, None, None);
        let post = &family.views[index].post_process;
        assert!(post.is_closed());
        assert_eq!(post.blend_count(), 3);
        assert!((post.saturation - 1.25).abs() < 1.0e-5);
        client.set_viewport(None);
    }

    #[test]
    fn wireframe_zeroes_material_overrides() {
        let (mut client, _viewport, mut family) = setup(8, 8);
        let index = client.calc_scene_view(&mut family, None, None, None);
        let view = &mut family.views[index];
        client.setup_view_for_rendering(ShowFlags::WIREFRAME | ShowFlags::DIFFUSE | ShowFlags::SPECULAR, view);
        assert_eq!(view.diffuse_override, Vec4::ZERO);
        client.setup_view_for_rendering(ShowFlags::REFLECTION_OVERRIDE | ShowFlags::SPECULAR, view);
        assert_eq!(view.specular_override, Vec4::new(1.0, 1.0, 1.0, 0.0));
        assert_eq!(view.roughness_override, Vec2::ZERO);
        client.set_viewport(None);
    }
}

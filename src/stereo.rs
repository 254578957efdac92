use crate::math::{IntRect, Rotator};
use crate::projection::{half_fov_radians, reversed_z_perspective};
use glam::{IVec2, Mat4, Vec3};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StereoPass {
    Full,
    Primary,
    Secondary,
}

/// Head-mounted or emulated stereo output. Authoritative for per-eye
/// placement and projection while enabled.
pub trait StereoDevice {
    fn is_stereo_enabled(&self) -> bool;

    fn desired_view_count(&self) -> usize;

    fn adjust_view_rect(&self, view_index: usize, rect: IntRect) -> IntRect;

    /// Offsets `location` for the given eye; may also adjust `rotation`.
    fn calculate_stereo_view_offset(
        &self,
        view_index: usize,
        rotation: &mut Rotator,
        world_to_meters: f32,
        location: &mut Vec3,
    );

    fn stereo_projection_matrix(&self, view_index: usize) -> Mat4;

    fn view_pass(&self, view_index: usize) -> StereoPass {
        if view_index == 0 {
            StereoPass::Primary
        } else {
            StereoPass::Secondary
        }
    }
}

/// Two eyes rendered side by side into one target.
#[derive(Debug, Clone)]
pub struct SideBySideStereo {
    pub enabled: bool,
    pub interpupillary_distance_meters: f32,
    pub fov_degrees: f32,
    pub eye_size: IVec2,
    pub near_clip_plane: f32,
}

impl Default for SideBySideStereo {
    fn default() -> Self {
        Self {
            enabled: true,
            interpupillary_distance_meters: 0.064,
            fov_degrees: 90.0,
            eye_size: IVec2::new(640, 720),
            near_clip_plane: 10.0,
        }
    }
}

impl StereoDevice for SideBySideStereo {
    fn is_stereo_enabled(&self) -> bool {
        self.enabled
    }

    fn desired_view_count(&self) -> usize {
        2
    }

    fn adjust_view_rect(&self, view_index: usize, rect: IntRect) -> IntRect {
        let half_width = rect.width() / 2;
        let x = rect.min.x + half_width * view_index as i32;
        IntRect::new(IVec2::new(x, rect.min.y), IVec2::new(x + half_width, rect.max.y))
    }

    fn calculate_stereo_view_offset(
        &self,
        view_index: usize,
        rotation: &mut Rotator,
        world_to_meters: f32,
        location: &mut Vec3,
    ) {
        let half_separation = self.interpupillary_distance_meters * 0.5 * world_to_meters;
        let sign = if view_index == 0 { -1.0 } else { 1.0 };
        *location += rotation.right() * (sign * half_separation);
    }

    fn stereo_projection_matrix(&self, _view_index: usize) -> Mat4 {
        let half = half_fov_radians(self.fov_degrees);
        let width = self.eye_size.x.max(1) as f32;
        let height = self.eye_size.y.max(1) as f32;
        let (mult_x, mult_y) = if width > height { (1.0, width / height) } else { (height / width, 1.0) };
        reversed_z_perspective(half, half, mult_x, mult_y, self.near_clip_plane, self.near_clip_plane)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eyes_split_the_viewport_horizontally() {
        let device = SideBySideStereo::default();
        let full = IntRect::from_size(IVec2::new(1280, 720));
        let left = device.adjust_view_rect(0, full);
        let right = device.adjust_view_rect(1, full);
        assert_eq!(left, IntRect::new(IVec2::ZERO, IVec2::new(640, 720)));
        assert_eq!(right, IntRect::new(IVec2::new(640, 0), IVec2::new(1280, 720)));
    }

    #[test]
    fn eye_offsets_are_symmetric_about_the_camera() {
        let device = SideBySideStereo::default();
        let mut rotation = Rotator::ZERO;
        let mut left = Vec3::ZERO;
        let mut right = Vec3::ZERO;
        device.calculate_stereo_view_offset(0, &mut rotation, 100.0, &mut left);
        device.calculate_stereo_view_offset(1, &mut rotation, 100.0, &mut right);
        assert!((left + right).length() < 1e-5);
        assert!(((right - left).length() - 6.4).abs() < 1e-4);
    }
}

use crate::math::{engine_matrix, Rotator};
use glam::{Mat4, Vec3};
use std::fmt;

/// Axis-aligned parallel projections plus the free-look orthographic camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrthoView {
    Free,
    Top,
    Front,
    Left,
    Bottom,
    Back,
    Right,
}

/// Order used when cycling through the axis-aligned orthographic views.
pub const ORTHO_ROTATION_ORDER: [OrthoView; 6] =
    [OrthoView::Front, OrthoView::Back, OrthoView::Top, OrthoView::Bottom, OrthoView::Left, OrthoView::Right];

impl OrthoView {
    /// View rotation as engine row planes. Each is a signed permutation that
    /// maps world axes onto view space (X right, Y up, Z into the screen).
    pub const fn view_rotation_rows(self) -> [[f32; 4]; 4] {
        match self {
            OrthoView::Top => [[1.0, 0.0, 0.0, 0.0], [0.0, -1.0, 0.0, 0.0], [0.0, 0.0, -1.0, 0.0], [0.0, 0.0, 0.0, 1.0]],
            OrthoView::Front => {
                [[1.0, 0.0, 0.0, 0.0], [0.0, 0.0, -1.0, 0.0], [0.0, 1.0, 0.0, 0.0], [0.0, 0.0, 0.0, 1.0]]
            }
            OrthoView::Left | OrthoView::Free => {
                [[0.0, 0.0, 1.0, 0.0], [1.0, 0.0, 0.0, 0.0], [0.0, 1.0, 0.0, 0.0], [0.0, 0.0, 0.0, 1.0]]
            }
            OrthoView::Bottom => {
                [[-1.0, 0.0, 0.0, 0.0], [0.0, -1.0, 0.0, 0.0], [0.0, 0.0, 1.0, 0.0], [0.0, 0.0, 0.0, 1.0]]
            }
            OrthoView::Back => {
                [[-1.0, 0.0, 0.0, 0.0], [0.0, 0.0, 1.0, 0.0], [0.0, 1.0, 0.0, 0.0], [0.0, 0.0, 0.0, 1.0]]
            }
            OrthoView::Right => {
                [[0.0, 0.0, -1.0, 0.0], [-1.0, 0.0, 0.0, 0.0], [0.0, 1.0, 0.0, 0.0], [0.0, 0.0, 0.0, 1.0]]
            }
        }
    }

    pub fn view_rotation(self) -> Mat4 {
        engine_matrix(self.view_rotation_rows())
    }

    /// World-space direction the view looks along.
    pub fn view_direction(self) -> Vec3 {
        match self {
            OrthoView::Top => Vec3::NEG_Z,
            OrthoView::Front => Vec3::NEG_Y,
            OrthoView::Left | OrthoView::Free => Vec3::X,
            OrthoView::Bottom => Vec3::Z,
            OrthoView::Back => Vec3::Y,
            OrthoView::Right => Vec3::NEG_X,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewportType {
    Perspective,
    Ortho(OrthoView),
}

impl ViewportType {
    pub const ALL: [ViewportType; 8] = [
        ViewportType::Ortho(OrthoView::Top),
        ViewportType::Ortho(OrthoView::Front),
        ViewportType::Ortho(OrthoView::Left),
        ViewportType::Perspective,
        ViewportType::Ortho(OrthoView::Free),
        ViewportType::Ortho(OrthoView::Bottom),
        ViewportType::Ortho(OrthoView::Back),
        ViewportType::Ortho(OrthoView::Right),
    ];

    pub fn is_perspective(self) -> bool {
        matches!(self, ViewportType::Perspective)
    }

    pub fn label(self) -> &'static str {
        match self {
            ViewportType::Perspective => "perspective",
            ViewportType::Ortho(OrthoView::Free) => "ortho_free",
            ViewportType::Ortho(OrthoView::Top) => "top",
            ViewportType::Ortho(OrthoView::Front) => "front",
            ViewportType::Ortho(OrthoView::Left) => "left",
            ViewportType::Ortho(OrthoView::Bottom) => "bottom",
            ViewportType::Ortho(OrthoView::Back) => "back",
            ViewportType::Ortho(OrthoView::Right) => "right",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.label().eq_ignore_ascii_case(label))
    }
}

impl fmt::Display for ViewportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Camera placement for one projection group.
///
/// `look_at` is only consulted by orbit computations; moving the camera does
/// not update it.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraTransform {
    location: Vec3,
    rotation: Rotator,
    look_at: Vec3,
    ortho_zoom: f32,
}

impl Default for CameraTransform {
    fn default() -> Self {
        Self { location: Vec3::ZERO, rotation: Rotator::ZERO, look_at: Vec3::ZERO, ortho_zoom: 1.0 }
    }
}

impl CameraTransform {
    pub fn location(&self) -> Vec3 {
        self.location
    }

    pub fn rotation(&self) -> Rotator {
        self.rotation
    }

    pub fn look_at(&self) -> Vec3 {
        self.look_at
    }

    pub fn ortho_zoom(&self) -> f32 {
        self.ortho_zoom
    }

    pub fn set_location(&mut self, location: Vec3) {
        self.location = location;
    }

    pub fn set_rotation(&mut self, rotation: Rotator) {
        self.rotation = rotation;
    }

    pub fn set_ortho_zoom(&mut self, zoom: f32) {
        self.ortho_zoom = zoom.max(f32::EPSILON);
    }

    /// Stores a new orbit pivot. With `recalculate`, the camera is re-placed
    /// on its orbit so that it faces the pivot at the current distance.
    pub fn set_look_at(&mut self, look_at: Vec3, recalculate: bool) {
        self.look_at = look_at;
        if recalculate {
            let camera_to_world = self.compute_orbit_matrix().inverse();
            self.rotation = Rotator::from_matrix(&camera_to_world);
            self.location = camera_to_world.w_axis.truncate();
        }
    }

    /// Places the camera and puts the pivot `distance` units ahead of it.
    pub fn set_initial(&mut self, location: Vec3, rotation: Rotator, distance: f32) {
        self.location = location;
        self.rotation = rotation;
        self.look_at = location + rotation.forward() * distance;
    }

    /// World-to-orbit matrix: pivot at the origin, yaw then pitch about the
    /// pivot, pushed back along the orbit radius.
    pub fn compute_orbit_matrix(&self) -> Mat4 {
        let distance = (self.location - self.look_at).length();
        let to_pivot = Mat4::from_translation(-self.look_at);
        let yaw = Rotator::new(0.0, self.rotation.yaw, 0.0).to_matrix();
        let pitch = Rotator::new(0.0, 0.0, self.rotation.pitch).to_matrix();
        let radius = Mat4::from_translation(Vec3::new(0.0, distance, 0.0));
        let face_pivot = Rotator::new(0.0, 90.0, 0.0).to_inverse_matrix();
        face_pivot * radius * pitch * yaw * to_pivot
    }
}

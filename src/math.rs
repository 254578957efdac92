//! Engine-space math helpers.
//!
//! World space is X forward, Y right, Z up. Matrices written in the engine's
//! row-vector notation (`v * M`) are stored as glam column-vector matrices by
//! turning each engine row into a glam column, so `m.transform_point3(v)`
//! matches `v * M` and the engine product `A * B` becomes `B * A` here.

use bytemuck::{Pod, Zeroable};
use glam::{IVec2, Mat4, Quat, Vec3, Vec4};
use serde::{Deserialize, Serialize};

pub const KINDA_SMALL_NUMBER: f32 = 1.0e-4;

/// Builds a glam matrix from four engine row planes.
pub fn engine_matrix(rows: [[f32; 4]; 4]) -> Mat4 {
    Mat4::from_cols_array_2d(&rows)
}

/// Pitch/yaw/roll in degrees, engine order (yaw about Z, pitch about Y, roll about X).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rotator {
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
}

impl Rotator {
    pub const ZERO: Rotator = Rotator { pitch: 0.0, yaw: 0.0, roll: 0.0 };

    pub const fn new(pitch: f32, yaw: f32, roll: f32) -> Self {
        Self { pitch, yaw, roll }
    }

    /// Rotation matrix whose columns are the rotated local X/Y/Z axes.
    pub fn to_matrix(self) -> Mat4 {
        let (sp, cp) = self.pitch.to_radians().sin_cos();
        let (sy, cy) = self.yaw.to_radians().sin_cos();
        let (sr, cr) = self.roll.to_radians().sin_cos();
        engine_matrix([
            [cp * cy, cp * sy, sp, 0.0],
            [sr * sp * cy - cr * sy, sr * sp * sy + cr * cy, -sr * cp, 0.0],
            [-(cr * sp * cy + sr * sy), cy * sr - cr * sp * sy, cr * cp, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// Inverse of [`Rotator::to_matrix`]; rotations are orthonormal so this is the transpose.
    pub fn to_inverse_matrix(self) -> Mat4 {
        self.to_matrix().transpose()
    }

    pub fn to_quat(self) -> Quat {
        let half = std::f32::consts::PI / 360.0;
        let (sp, cp) = (self.pitch * half).sin_cos();
        let (sy, cy) = (self.yaw * half).sin_cos();
        let (sr, cr) = (self.roll * half).sin_cos();
        Quat::from_xyzw(
            cr * sp * sy - sr * cp * cy,
            -cr * sp * cy - sr * cp * sy,
            cr * cp * sy - sr * sp * cy,
            cr * cp * cy + sr * sp * sy,
        )
    }

    pub fn from_quat(q: Quat) -> Self {
        let singularity_test = q.z * q.x - q.w * q.y;
        let yaw_y = 2.0 * (q.w * q.z + q.x * q.y);
        let yaw_x = 1.0 - 2.0 * (q.y * q.y + q.z * q.z);
        const THRESHOLD: f32 = 0.499_999_5;
        let yaw = yaw_y.atan2(yaw_x).to_degrees();
        if singularity_test < -THRESHOLD {
            let roll = normalize_axis(-yaw - 2.0 * q.x.atan2(q.w).to_degrees());
            Rotator::new(-90.0, yaw, roll)
        } else if singularity_test > THRESHOLD {
            let roll = normalize_axis(yaw - 2.0 * q.x.atan2(q.w).to_degrees());
            Rotator::new(90.0, yaw, roll)
        } else {
            let pitch = (2.0 * singularity_test).clamp(-1.0, 1.0).asin().to_degrees();
            let roll = (-2.0 * (q.w * q.x + q.y * q.z)).atan2(1.0 - 2.0 * (q.x * q.x + q.y * q.y)).to_degrees();
            Rotator::new(pitch, yaw, roll)
        }
    }

    /// Extracts the rotation from a matrix whose first three columns are the local axes.
    pub fn from_matrix(m: &Mat4) -> Self {
        let x_axis = m.x_axis.truncate();
        let y_axis = m.y_axis.truncate();
        let z_axis = m.z_axis.truncate();
        let pitch = x_axis.z.atan2((x_axis.x * x_axis.x + x_axis.y * x_axis.y).sqrt()).to_degrees();
        let yaw = x_axis.y.atan2(x_axis.x).to_degrees();
        let sy_axis = Rotator::new(pitch, yaw, 0.0).to_matrix().y_axis.truncate();
        let roll = z_axis.dot(sy_axis).atan2(y_axis.dot(sy_axis)).to_degrees();
        Rotator::new(pitch, yaw, roll)
    }

    pub fn forward(self) -> Vec3 {
        self.to_matrix().x_axis.truncate()
    }

    pub fn right(self) -> Vec3 {
        self.to_matrix().y_axis.truncate()
    }

    pub fn normalized(self) -> Self {
        Rotator::new(normalize_axis(self.pitch), normalize_axis(self.yaw), normalize_axis(self.roll))
    }

    pub fn is_nearly_equal(self, other: Rotator, tolerance: f32) -> bool {
        let a = self.normalized();
        let b = other.normalized();
        normalize_axis(a.pitch - b.pitch).abs() <= tolerance
            && normalize_axis(a.yaw - b.yaw).abs() <= tolerance
            && normalize_axis(a.roll - b.roll).abs() <= tolerance
    }
}

/// Wraps an angle in degrees into (-180, 180].
pub fn normalize_axis(degrees: f32) -> f32 {
    let mut angle = degrees % 360.0;
    if angle > 180.0 {
        angle -= 360.0;
    } else if angle <= -180.0 {
        angle += 360.0;
    }
    angle
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct TransformBits {
    translation: [f32; 3],
    rotation: [f32; 4],
    scale: [f32; 3],
}

/// Translation, rotation and scale applied scale-first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform { translation: Vec3::ZERO, rotation: Quat::IDENTITY, scale: Vec3::ONE };

    pub fn from_translation(translation: Vec3) -> Self {
        Self { translation, ..Self::IDENTITY }
    }

    pub fn from_rotator_translation(rotator: Rotator, translation: Vec3) -> Self {
        Self { translation, rotation: rotator.to_quat(), scale: Vec3::ONE }
    }

    pub fn rotator(&self) -> Rotator {
        Rotator::from_quat(self.rotation)
    }

    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    /// Hash of the exact component bits. Two transforms hash equal only if every
    /// float matches bit for bit.
    pub fn value_hash(&self) -> u64 {
        let bits = TransformBits {
            translation: self.translation.to_array(),
            rotation: self.rotation.to_array(),
            scale: self.scale.to_array(),
        };
        let digest = blake3::hash(bytemuck::bytes_of(&bits));
        let mut head = [0u8; 8];
        head.copy_from_slice(&digest.as_bytes()[..8]);
        u64::from_le_bytes(head)
    }
}

/// Serialized form of a [`Transform`]; rotation is pitch/yaw/roll in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransformData {
    #[serde(default)]
    pub translation: [f32; 3],
    #[serde(default)]
    pub rotation: [f32; 3],
    #[serde(default = "TransformData::default_scale")]
    pub scale: [f32; 3],
}

impl TransformData {
    fn default_scale() -> [f32; 3] {
        [1.0, 1.0, 1.0]
    }
}

impl Default for TransformData {
    fn default() -> Self {
        Self { translation: [0.0; 3], rotation: [0.0; 3], scale: Self::default_scale() }
    }
}

impl From<TransformData> for Transform {
    fn from(data: TransformData) -> Self {
        let [pitch, yaw, roll] = data.rotation;
        Transform {
            translation: Vec3::from_array(data.translation),
            rotation: Rotator::new(pitch, yaw, roll).to_quat(),
            scale: Vec3::from_array(data.scale),
        }
    }
}

impl From<&Transform> for TransformData {
    fn from(transform: &Transform) -> Self {
        let rotator = transform.rotator();
        TransformData {
            translation: transform.translation.to_array(),
            rotation: [rotator.pitch, rotator.yaw, rotator.roll],
            scale: transform.scale.to_array(),
        }
    }
}

/// Half-open integer pixel rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IntRect {
    pub min: IVec2,
    pub max: IVec2,
}

impl IntRect {
    pub const fn new(min: IVec2, max: IVec2) -> Self {
        Self { min, max }
    }

    pub fn from_size(size: IVec2) -> Self {
        Self { min: IVec2::ZERO, max: size }
    }

    pub fn width(&self) -> i32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> i32 {
        self.max.y - self.min.y
    }

    pub fn size(&self) -> IVec2 {
        self.max - self.min
    }

    pub fn area(&self) -> i64 {
        i64::from(self.width()) * i64::from(self.height())
    }

    /// A rectangle is usable downstream only when it covers at least one pixel.
    pub fn is_valid(&self) -> bool {
        self.min.x >= 0 && self.min.y >= 0 && self.width() > 0 && self.height() > 0
    }
}

/// Linear-space color converted from 8-bit sRGB.
pub fn srgb_to_linear(rgb: [u8; 3]) -> Vec4 {
    let convert = |channel: u8| {
        let c = f32::from(channel) / 255.0;
        if c <= 0.040_45 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    };
    Vec4::new(convert(rgb[0]), convert(rgb[1]), convert(rgb[2]), 1.0)
}

pub fn mat4_is_finite(m: &Mat4) -> bool {
    m.to_cols_array().iter().all(|v| v.is_finite())
}

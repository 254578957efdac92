//! Projection matrix construction and orthographic scale helpers.

use crate::math::{engine_matrix, Rotator, KINDA_SMALL_NUMBER};
use glam::Mat4;

/// Half extent of the world used to size the orthographic depth range.
pub const HALF_WORLD_MAX: f32 = 1_048_576.0;
pub const ORTHO_ZOOM_DIVISOR: f32 = 15.0;
pub const ORTHO_REFERENCE_WIDTH: f32 = 500.0;
pub const MIN_FOV_DEGREES: f32 = 0.001;

/// Converts engine world axes (X forward, Y right, Z up) into view axes
/// (X right, Y up, Z forward).
pub fn view_axis_swap() -> Mat4 {
    engine_matrix([[0.0, 0.0, 1.0, 0.0], [1.0, 0.0, 0.0, 0.0], [0.0, 1.0, 0.0, 0.0], [0.0, 0.0, 0.0, 1.0]])
}

/// World-to-view rotation for a perspective camera.
pub fn perspective_view_rotation(rotation: Rotator) -> Mat4 {
    view_axis_swap() * rotation.to_inverse_matrix()
}

/// Per-axis multipliers that keep the wider axis at the requested FOV.
pub fn aspect_multipliers(width: i32, height: i32) -> (f32, f32) {
    let (w, h) = (width.max(1) as f32, height.max(1) as f32);
    if width > height {
        (1.0, w / h)
    } else {
        (h / w, 1.0)
    }
}

pub fn half_fov_radians(fov_degrees: f32) -> f32 {
    fov_degrees.max(MIN_FOV_DEGREES) * std::f32::consts::PI / 360.0
}

/// Reversed-Z perspective. With `min_z == max_z` the far plane is at infinity.
pub fn reversed_z_perspective(
    half_fov_x: f32,
    half_fov_y: f32,
    mult_x: f32,
    mult_y: f32,
    min_z: f32,
    max_z: f32,
) -> Mat4 {
    let infinite = min_z == max_z;
    let zz = if infinite { 0.0 } else { min_z / (min_z - max_z) };
    let zw = if infinite { min_z } else { -max_z * min_z / (min_z - max_z) };
    engine_matrix([
        [mult_x / half_fov_x.tan(), 0.0, 0.0, 0.0],
        [0.0, mult_y / half_fov_y.tan(), 0.0, 0.0],
        [0.0, 0.0, zz, 1.0],
        [0.0, 0.0, zw, 0.0],
    ])
}

/// Conventional perspective mapping the near plane to depth 0.
pub fn standard_perspective(
    half_fov_x: f32,
    half_fov_y: f32,
    mult_x: f32,
    mult_y: f32,
    min_z: f32,
    max_z: f32,
) -> Mat4 {
    let zz = if min_z == max_z { 1.0 - f32::EPSILON } else { max_z / (max_z - min_z) };
    engine_matrix([
        [mult_x / half_fov_x.tan(), 0.0, 0.0, 0.0],
        [0.0, mult_y / half_fov_y.tan(), 0.0, 0.0],
        [0.0, 0.0, zz, 1.0],
        [0.0, 0.0, -min_z * zz, 0.0],
    ])
}

/// Reversed-Z orthographic projection over half extents `width`/`height`.
pub fn reversed_z_ortho(width: f32, height: f32, z_scale: f32, z_offset: f32) -> Mat4 {
    let x = if width != 0.0 { 1.0 / width } else { 1.0 };
    let y = if height != 0.0 { 1.0 / height } else { 1.0 };
    engine_matrix([
        [x, 0.0, 0.0, 0.0],
        [0.0, y, 0.0, 0.0],
        [0.0, 0.0, -z_scale, 0.0],
        [0.0, 0.0, 1.0 - z_offset * z_scale, 1.0],
    ])
}

/// World units covered by one pixel of an orthographic viewport `width` pixels wide.
pub fn ortho_units_per_pixel(width: i32, zoom: f32) -> f32 {
    let width = width.max(1) as f32;
    (zoom / (width * ORTHO_ZOOM_DIVISOR)) * (width / ORTHO_REFERENCE_WIDTH)
}

/// Renders a distance in world units (centimetres) as a short readable
/// string, e.g. `"5cm"`, `"1m"`, `"~1.2m"`. Values are cut to two
/// significant figures; a `~` prefix marks a truncated value.
pub fn format_world_units(units: f32) -> String {
    const UNITS: [&str; 3] = ["cm", "m", "km"];

    let millimetres = units * 10.0;
    let order = if millimetres > 0.0 { millimetres.log10().trunc() as i32 } else { 0 };
    let exponent = (order - 6) / 3;
    let order_of_thousand = order / 3;

    let mut scaled = millimetres;
    if order_of_thousand != 0 {
        scaled /= 1000f32.powi(order_of_thousand);
    }

    let mut prefix = "";
    let scaled_order = order % (order_of_thousand.max(1) * 3);
    let divisor = 10f32.powi(scaled_order) / 10.0;
    let truncated = (scaled / divisor).trunc() * divisor;
    if scaled - truncated > KINDA_SMALL_NUMBER {
        scaled = truncated;
        prefix = "~";
    }

    if order <= 2 {
        scaled /= 10.0;
    }

    let suffix = if exponent > 0 { format!("e+{}", exponent * 3) } else { String::new() };
    let unit = UNITS[order_of_thousand.clamp(0, 2) as usize];
    if scaled % 1.0 > KINDA_SMALL_NUMBER {
        format!("{prefix}{scaled:.1}{suffix}{unit}")
    } else {
        format!("{prefix}{}{suffix}{unit}", scaled.trunc() as i64)
    }
}

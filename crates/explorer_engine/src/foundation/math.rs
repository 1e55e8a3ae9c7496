//! Math utilities and types
//!
//! Thin aliases over `nalgebra` plus the matrix builders used by the
//! transform component. Column vectors throughout: a matrix product `A * B`
//! applies `B` first.

pub use nalgebra::{Matrix4, Vector3, Vector4};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// 2 * Pi
    pub const TAU: f32 = 2.0 * PI;
}

/// Math utility functions
pub mod utils {
    use super::constants;

    /// Wrap an angle in radians into `[0, TAU)`
    pub fn wrap_angle(radians: f32) -> f32 {
        radians.rem_euclid(constants::TAU)
    }
}

/// Extension trait for Mat4 with the builders the engine needs
pub trait Mat4Ext {
    /// Create a rotation matrix around the X axis
    fn rotation_x(angle: f32) -> Mat4;

    /// Create a rotation matrix around the Y axis
    fn rotation_y(angle: f32) -> Mat4;

    /// Create a rotation matrix around the Z axis
    fn rotation_z(angle: f32) -> Mat4;

    /// Euler rotation from a `(pitch, yaw, roll)` vector.
    ///
    /// `angles.x` is pitch about X, `angles.y` is yaw about Y and `angles.z`
    /// is roll about Z. The result is `Ry(yaw) * Rx(pitch) * Rz(roll)`: roll is
    /// applied first, yaw last. Subject to gimbal lock at pitch = ±90°.
    fn yaw_pitch_roll(angles: &Vec3) -> Mat4;

    /// Compose `T(position) * R(rotation) * S(scale)`.
    fn translation_rotation_scale(position: &Vec3, rotation: &Vec3, scale: &Vec3) -> Mat4;
}

impl Mat4Ext for Mat4 {
    fn rotation_x(angle: f32) -> Mat4 {
        Mat4::from_axis_angle(&Vec3::x_axis(), angle)
    }

    fn rotation_y(angle: f32) -> Mat4 {
        Mat4::from_axis_angle(&Vec3::y_axis(), angle)
    }

    fn rotation_z(angle: f32) -> Mat4 {
        Mat4::from_axis_angle(&Vec3::z_axis(), angle)
    }

    fn yaw_pitch_roll(angles: &Vec3) -> Mat4 {
        Mat4::rotation_y(angles.y) * Mat4::rotation_x(angles.x) * Mat4::rotation_z(angles.z)
    }

    fn translation_rotation_scale(position: &Vec3, rotation: &Vec3, scale: &Vec3) -> Mat4 {
        // Built up from identity by right-multiplication: scale first, translation last
        let mut matrix = Mat4::identity();
        matrix = Mat4::new_translation(position) * matrix;
        matrix *= Mat4::yaw_pitch_roll(rotation);
        matrix *= Mat4::new_nonuniform_scaling(scale);
        matrix
    }
}

//! Transform component
//!
//! Position, Euler rotation and scale of a game object, composed into a world
//! matrix as `T * R * S` on every update. Rotation is `(pitch, yaw, roll)` in
//! radians; see [`Mat4Ext::yaw_pitch_roll`].

use std::any::Any;

use crate::foundation::math::{utils, Mat4, Mat4Ext, Vec3};
use crate::render::GraphicsApi;
use crate::scene::{Component, ComponentError};

/// Local TRS state and the matrix derived from it
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    position: Vec3,
    rotation: Vec3,
    scale: Vec3,
    world: Mat4,
    dirty: bool,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Vec3::zeros(),
            scale: Vec3::new(1.0, 1.0, 1.0),
            world: Mat4::identity(),
            dirty: false,
        }
    }
}

impl Transform {
    /// Identity transform
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the translation; applied on the next update
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.dirty = true;
    }

    /// Set the `(pitch, yaw, roll)` rotation in radians; applied on the next update
    pub fn set_rotation(&mut self, rotation: Vec3) {
        self.rotation = rotation;
        self.dirty = true;
    }

    /// Set the per-axis scale; applied on the next update
    pub fn set_scale(&mut self, scale: Vec3) {
        self.scale = scale;
        self.dirty = true;
    }

    /// Offset the position by `delta`
    pub fn translate(&mut self, delta: Vec3) {
        self.set_position(self.position + delta);
    }

    /// Add `delta` to the rotation, wrapping each angle into `[0, 2π)`
    pub fn rotate(&mut self, delta: Vec3) {
        let rotation = (self.rotation + delta).map(utils::wrap_angle);
        self.set_rotation(rotation);
    }

    /// Current translation
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Current rotation
    pub fn rotation(&self) -> Vec3 {
        self.rotation
    }

    /// Current scale
    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    /// World matrix from the last update
    pub fn transform_matrix(&self) -> Mat4 {
        self.world
    }

    /// Whether a setter ran since the last update
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Recompute the world matrix from the current TRS values
    pub fn recompute(&mut self) {
        self.world = Mat4::translation_rotation_scale(&self.position, &self.rotation, &self.scale);
        self.dirty = false;
    }
}

impl Component for Transform {
    fn initialize(&mut self, _api: &mut dyn GraphicsApi) -> Result<(), ComponentError> {
        self.world = Mat4::identity();
        Ok(())
    }

    fn update(&mut self, _delta_time: f32) {
        self.recompute();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{Translation3, UnitQuaternion};

    const EPSILON: f32 = 1e-5;

    /// Same composition built from nalgebra's own primitives
    fn reference(position: Vec3, rotation: Vec3, scale: Vec3) -> Mat4 {
        let yaw = UnitQuaternion::from_axis_angle(&Vec3::y_axis(), rotation.y);
        let pitch = UnitQuaternion::from_axis_angle(&Vec3::x_axis(), rotation.x);
        let roll = UnitQuaternion::from_axis_angle(&Vec3::z_axis(), rotation.z);
        Translation3::from(position).to_homogeneous()
            * (yaw * pitch * roll).to_homogeneous()
            * Mat4::new_nonuniform_scaling(&scale)
    }

    fn updated(position: Vec3, rotation: Vec3, scale: Vec3) -> Transform {
        let mut transform = Transform::new();
        transform.set_position(position);
        transform.set_rotation(rotation);
        transform.set_scale(scale);
        transform.update(0.0);
        transform
    }

    #[test]
    fn test_identity() {
        let mut api = crate::render::HeadlessApi::new();
        let mut transform = Transform::new();
        transform.initialize(&mut api).unwrap();
        transform.update(0.0);

        assert_relative_eq!(transform.transform_matrix(), Mat4::identity(), epsilon = EPSILON);
    }

    #[test]
    fn test_matches_reference_composition() {
        let cases = [
            (Vec3::new(1.0, 2.0, 3.0), Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0)),
            (Vec3::zeros(), Vec3::new(0.3, 0.0, 0.0), Vec3::new(2.0, 2.0, 2.0)),
            (Vec3::new(-4.0, 0.5, 10.0), Vec3::new(0.4, 1.2, -0.7), Vec3::new(1.0, 3.0, 0.5)),
            (Vec3::new(0.0, -1.0, 0.0), Vec3::new(-1.5, 2.5, 0.25), Vec3::new(0.1, 0.2, 0.3)),
        ];

        for (position, rotation, scale) in cases {
            let transform = updated(position, rotation, scale);
            assert_relative_eq!(transform.transform_matrix(), reference(position, rotation, scale), epsilon = EPSILON);
        }
    }

    #[test]
    fn test_scale_applies_before_translation() {
        let transform = updated(Vec3::new(10.0, 0.0, 0.0), Vec3::zeros(), Vec3::new(2.0, 2.0, 2.0));
        let corner = transform.transform_matrix().transform_point(&nalgebra::Point3::new(0.5, 0.5, 0.5));

        assert_relative_eq!(corner.coords, Vec3::new(11.0, 1.0, 1.0), epsilon = EPSILON);
    }

    #[test]
    fn test_matrix_is_stale_until_update() {
        let mut transform = Transform::new();
        transform.update(0.0);
        transform.set_position(Vec3::new(1.0, 0.0, 0.0));

        assert!(transform.is_dirty());
        assert_relative_eq!(transform.transform_matrix(), Mat4::identity(), epsilon = EPSILON);

        transform.update(0.0);
        assert!(!transform.is_dirty());
        assert_relative_eq!(transform.transform_matrix(), Mat4::new_translation(&Vec3::new(1.0, 0.0, 0.0)), epsilon = EPSILON);
    }

    #[test]
    fn test_rotate_wraps_angles() {
        let mut transform = Transform::new();
        transform.rotate(Vec3::new(7.0, -1.0, 0.0));

        assert_relative_eq!(transform.rotation().x, 7.0 - std::f32::consts::TAU, epsilon = EPSILON);
        assert_relative_eq!(transform.rotation().y, std::f32::consts::TAU - 1.0, epsilon = EPSILON);
    }
}

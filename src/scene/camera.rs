use glam::{Mat4, Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};

use super::raycast::Ray;

/// Perspective camera looking at a target point, Y up.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerspectiveCamera {
    pub position: Vec3,
    pub target: Vec3,
    /// Vertical field of view in degrees.
    pub fov_y: f32,
    /// Width over height of the surface the camera renders to.
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        Self {
            position: Vec3::new(8.0, 13.0, 15.0),
            target: Vec3::new(-2.0, 0.0, 0.0),
            fov_y: 75.0,
            aspect: 1.0,
            near: 0.1,
            far: 2000.0,
        }
    }
}

impl PerspectiveCamera {
    #[must_use]
    pub fn looking_at(position: Vec3, target: Vec3) -> Self {
        Self {
            position,
            target,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    #[must_use]
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov_y.to_radians(), self.aspect, self.near, self.far)
    }

    #[must_use]
    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Ray from the eye through a point in normalized device coordinates.
    #[must_use]
    pub fn ray_through(&self, ndc: Vec2) -> Ray {
        let inverse = self.view_projection().inverse();
        let unproject = |z: f32| {
            let p = inverse * Vec4::new(ndc.x, ndc.y, z, 1.0);
            p.truncate() / p.w
        };
        let near = unproject(-1.0);
        let far = unproject(1.0);
        Ray::new(self.position, far - near)
    }

    /// Rotates the eye around the target by yaw (about Y) and pitch, in degrees.
    pub fn orbit(&mut self, yaw: f32, pitch: f32) {
        let offset = self.position - self.target;
        let distance = offset.length();
        if distance <= f32::EPSILON {
            return;
        }
        let current_yaw = offset.x.atan2(offset.z);
        let current_pitch = (offset.y / distance).clamp(-1.0, 1.0).asin();

        let yaw = current_yaw + yaw.to_radians();
        let pitch = (current_pitch + pitch.to_radians()).clamp(-1.5, 1.5);

        self.position = self.target
            + Vec3::new(
                distance * pitch.cos() * yaw.sin(),
                distance * pitch.sin(),
                distance * pitch.cos() * yaw.cos(),
            );
    }

    /// Moves the eye towards the target. `factor` below 1 zooms in.
    pub fn zoom(&mut self, factor: f32) {
        let offset = (self.position - self.target) * factor;
        if offset.length() > self.near {
            self.position = self.target + offset;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn center_ray_points_at_target() {
        let camera = PerspectiveCamera::looking_at(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO);
        let ray = camera.ray_through(Vec2::ZERO);
        assert_relative_eq!(ray.origin.z, 10.0);
        assert_relative_eq!(ray.direction.z, -1.0, epsilon = 1e-5);
        assert_relative_eq!(ray.direction.x, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn ndc_corners_diverge_symmetrically() {
        let camera = PerspectiveCamera::looking_at(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO);
        let top_left = camera.ray_through(Vec2::new(-1.0, 1.0));
        let bottom_right = camera.ray_through(Vec2::new(1.0, -1.0));
        assert!(top_left.direction.x < 0.0 && top_left.direction.y > 0.0);
        assert_relative_eq!(top_left.direction.x, -bottom_right.direction.x, epsilon = 1e-5);
    }

    #[test]
    fn orbit_keeps_distance() {
        let mut camera = PerspectiveCamera::looking_at(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO);
        camera.orbit(90.0, 0.0);
        assert_relative_eq!(camera.position.length(), 10.0, epsilon = 1e-4);
        assert_relative_eq!(camera.position.x, 10.0, epsilon = 1e-4);
    }

    #[test]
    fn zoom_scales_distance() {
        let mut camera = PerspectiveCamera::looking_at(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO);
        camera.zoom(0.5);
        assert_relative_eq!(camera.position.z, 5.0, epsilon = 1e-5);
    }
}

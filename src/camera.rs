// camera.rs — orbit camera around the body centre

use glam::{Mat4, Vec3};

/// Default VTK view angle, degrees.
const BASE_FOV_DEG: f32 = 30.0;
/// Initial zoom applied to the base view angle.
const INITIAL_ZOOM: f32 = 1.5;
const START_DISTANCE: f32 = 4.0;
const MIN_DISTANCE: f32 = 1.2;
const MAX_DISTANCE: f32 = 50.0;
const MAX_ELEVATION_DEG: f32 = 89.0;

/// Camera orbiting a target with +z up. Angles are degrees; `distance` is in
/// body radii so the same interaction feels identical at any scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitCamera {
    pub body_radius: f32,
    pub far_radius: f32,
    pub azimuth: f32,
    pub elevation: f32,
    pub distance: f32,
    pub fov_deg: f32,
    pub sensitivity: f32,
}

impl OrbitCamera {
    /// Eye at `(0, 4r, 0)` looking at the origin, up `(0, 0, 1)`, zoom 1.5.
    pub fn initial(body_radius: f32, far_radius: f32) -> Self {
        Self {
            body_radius,
            far_radius,
            azimuth: 90.0,
            elevation: 0.0,
            distance: START_DISTANCE,
            fov_deg: BASE_FOV_DEG / INITIAL_ZOOM,
            sensitivity: 0.25,
        }
    }

    pub fn reset(&mut self) {
        *self = Self {
            sensitivity: self.sensitivity,
            ..Self::initial(self.body_radius, self.far_radius)
        };
    }

    pub fn eye(&self) -> Vec3 {
        let az = self.azimuth.to_radians();
        let el = self.elevation.to_radians();
        let d = self.distance * self.body_radius;
        Vec3::new(d * el.cos() * az.cos(), d * el.cos() * az.sin(), d * el.sin())
    }

    /// Drag by `(dx, dy)` pixels.
    pub fn orbit(&mut self, dx: f32, dy: f32) {
        self.azimuth = (self.azimuth - dx * self.sensitivity).rem_euclid(360.0);
        self.elevation = (self.elevation + dy * self.sensitivity)
            .clamp(-MAX_ELEVATION_DEG, MAX_ELEVATION_DEG);
    }

    /// Positive `scroll` moves closer.
    pub fn zoom(&mut self, scroll: f32) {
        self.distance = (self.distance * 0.9f32.powf(scroll)).clamp(MIN_DISTANCE, MAX_DISTANCE);
    }

    pub fn near(&self) -> f32 {
        0.05 * self.body_radius
    }

    pub fn far(&self) -> f32 {
        (self.far_radius * 2.0).max(200.0 * self.body_radius)
    }

    pub fn view_proj(&self, aspect: f32) -> Mat4 {
        let view = Mat4::look_at_rh(self.eye(), Vec3::ZERO, Vec3::Z);
        let proj = Mat4::perspective_rh(self.fov_deg.to_radians(), aspect, self.near(), self.far());
        proj * view
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const R: f32 = 1_737_400.0;

    #[test]
    fn initial_pose() {
        let cam = OrbitCamera::initial(R, 100.0 * R);
        let eye = cam.eye();
        assert_abs_diff_eq!(eye.x / R, 0.0, epsilon = 1e-5);
        assert_abs_diff_eq!(eye.y / R, 4.0, epsilon = 1e-5);
        assert_abs_diff_eq!(eye.z / R, 0.0, epsilon = 1e-5);
        assert_abs_diff_eq!(cam.fov_deg, 20.0, epsilon = 1e-5);
    }

    #[test]
    fn target_projects_to_clip_centre() {
        let cam = OrbitCamera::initial(R, 100.0 * R);
        let clip = cam.view_proj(16.0 / 9.0) * glam::Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert_abs_diff_eq!(clip.x / clip.w, 0.0, epsilon = 1e-5);
        assert_abs_diff_eq!(clip.y / clip.w, 0.0, epsilon = 1e-5);
        let depth = clip.z / clip.w;
        assert!((0.0..1.0).contains(&depth), "depth = {}", depth);
    }

    #[test]
    fn north_pole_appears_above_centre() {
        let cam = OrbitCamera::initial(R, 100.0 * R);
        let clip = cam.view_proj(1.0) * glam::Vec4::new(0.0, 0.0, R, 1.0);
        assert!(clip.y / clip.w > 0.0);
    }

    #[test]
    fn star_sphere_inside_far_plane() {
        let cam = OrbitCamera::initial(R, 100.0 * R);
        assert!(cam.far() > 104.0 * R);
    }

    #[test]
    fn elevation_and_distance_are_clamped() {
        let mut cam = OrbitCamera::initial(R, 100.0 * R);
        cam.orbit(0.0, 10_000.0);
        assert_abs_diff_eq!(cam.elevation, 89.0);
        cam.orbit(0.0, -100_000.0);
        assert_abs_diff_eq!(cam.elevation, -89.0);

        cam.zoom(1000.0);
        assert_abs_diff_eq!(cam.distance, 1.2);
        cam.zoom(-1000.0);
        assert_abs_diff_eq!(cam.distance, 50.0);
    }

    #[test]
    fn reset_restores_initial_pose() {
        let mut cam = OrbitCamera::initial(R, 100.0 * R);
        cam.orbit(123.0, 45.0);
        cam.zoom(3.0);
        cam.reset();
        assert_eq!(cam, OrbitCamera::initial(R, 100.0 * R));
    }
}

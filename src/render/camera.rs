//! Orbit camera shared by the extruded adapter (picking) and the raster
//! renderer (drawing), so both agree on which pixel sees which box.

use glam::Vec3;

/// Camera parameters for interactive 3D navigation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraParams {
    /// Horizontal orbit angle in radians (0 = looking from +z)
    pub azimuth: f32,
    /// Vertical orbit angle in radians (0 = level, positive = looking down)
    pub elevation: f32,
    /// Distance from the camera to the target point
    pub distance: f32,
    /// Target point the camera looks at [x, y, z]
    pub target: [f32; 3],
    /// Vertical field of view in degrees
    pub fov_deg: f32,
}

impl Default for CameraParams {
    fn default() -> Self {
        Self::framing(100.0)
    }
}

impl CameraParams {
    const MIN_ELEVATION: f32 = 0.05;
    const MAX_ELEVATION: f32 = 1.5;

    /// Three-quarter view that fits a map of side `extent`.
    pub fn framing(extent: f32) -> Self {
        Self {
            azimuth: 0.4,
            elevation: 0.7,
            distance: extent * 1.35,
            target: [0.0, 0.0, 0.0],
            fov_deg: 50.0,
        }
    }

    pub fn eye(&self) -> Vec3 {
        Vec3::from(self.target)
            + Vec3::new(
                self.distance * self.azimuth.sin() * self.elevation.cos(),
                self.distance * self.elevation.sin(),
                self.distance * self.azimuth.cos() * self.elevation.cos(),
            )
    }

    /// Rotate by a drag delta (radians). Elevation stays above the ground.
    pub fn orbit(&mut self, d_azimuth: f32, d_elevation: f32) {
        self.azimuth = (self.azimuth + d_azimuth).rem_euclid(std::f32::consts::TAU);
        self.elevation = (self.elevation + d_elevation).clamp(Self::MIN_ELEVATION, Self::MAX_ELEVATION);
    }

    /// Multiply the distance by `factor` (scroll zoom).
    pub fn zoom(&mut self, factor: f32, min: f32, max: f32) {
        if factor.is_finite() && factor > 0.0 {
            self.distance = (self.distance * factor).clamp(min, max);
        }
    }

    pub fn camera(&self) -> Camera {
        Camera::look_at(self.eye(), Vec3::from(self.target), self.fov_deg)
    }
}

/// A resolved pinhole camera.
#[derive(Debug, Clone, Copy)]
pub struct Camera {
    pub origin: Vec3,
    forward: Vec3,
    right: Vec3,
    up: Vec3,
    fov_factor: f32,
}

impl Camera {
    pub fn look_at(eye: Vec3, target: Vec3, fov_deg: f32) -> Self {
        let forward = (target - eye).normalize();
        let world_up = Vec3::Y;
        let right = forward.cross(world_up).normalize();
        let up = right.cross(forward);
        let fov_factor = (fov_deg.to_radians() * 0.5).tan();
        Self {
            origin: eye,
            forward,
            right,
            up,
            fov_factor,
        }
    }

    /// Ray direction for normalized device coords `u, v ∈ [-1, 1]` (v up).
    pub fn ray(&self, u: f32, v: f32, aspect: f32) -> Vec3 {
        (self.forward + self.right * (u * self.fov_factor * aspect) + self.up * (v * self.fov_factor)).normalize()
    }

    /// Ray direction through the center of pixel `(px, py)` of a `width × height` image.
    pub fn ray_through_pixel(&self, px: f32, py: f32, width: f32, height: f32) -> Vec3 {
        let u = px / width * 2.0 - 1.0;
        let v = -(py / height * 2.0 - 1.0);
        self.ray(u, v, width / height)
    }

    /// Pixel position of a world point and its depth along the view axis,
    /// or `None` when the point is behind the camera.
    pub fn project(&self, point: Vec3, width: f32, height: f32) -> Option<([f32; 2], f32)> {
        let d = point - self.origin;
        let z = d.dot(self.forward);
        if z <= 1e-4 {
            return None;
        }
        let aspect = width / height;
        let u = d.dot(self.right) / (z * self.fov_factor * aspect);
        let v = d.dot(self.up) / (z * self.fov_factor);
        Some(([(u + 1.0) * 0.5 * width, (1.0 - v) * 0.5 * height], z))
    }

    /// Pixels covered by one scene unit at view depth `z`.
    pub fn pixels_per_unit(&self, z: f32, height: f32) -> f32 {
        height / (2.0 * z * self.fov_factor)
    }
}

/// Nearest positive hit distance of a ray against an axis-aligned box
/// (slab test), or `None` on a miss.
pub fn ray_box(origin: Vec3, dir: Vec3, min: Vec3, max: Vec3) -> Option<f32> {
    let inv = dir.recip();
    let t0 = (min - origin) * inv;
    let t1 = (max - origin) * inv;
    let t_near = t0.min(t1).max_element();
    let t_far = t0.max(t1).min_element();
    if t_far < 0.0 || t_near > t_far || t_near.is_nan() {
        return None;
    }
    Some(if t_near >= 0.0 { t_near } else { t_far })
}

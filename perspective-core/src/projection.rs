/// Camera and projection utilities
use nalgebra::{Matrix4, Point3, Vector3, Vector4};

use crate::ray::Ray;

/// View volume of an orthographic camera, in view space units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrthoBounds {
    pub left: f32,
    pub right: f32,
    pub bottom: f32,
    pub top: f32,
}

impl OrthoBounds {
    /// Bounds spanning a `width` x `height` rectangle centred on the view axis
    pub fn centered(width: f32, height: f32) -> Self {
        Self {
            left: -width / 2.0,
            right: width / 2.0,
            bottom: -height / 2.0,
            top: height / 2.0,
        }
    }
}

/// Projection mode for rendering
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProjectionMode {
    Orthographic(OrthoBounds),
    Perspective,
}

/// A vertex after the projection stage
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectedPoint {
    /// Pixel coordinates, origin at the top-left corner
    pub x: f32,
    pub y: f32,
    /// Normalized device depth in [-1, 1]
    pub depth: f32,
    /// Reciprocal of the clip-space w, for perspective-correct interpolation
    pub inv_w: f32,
}

/// Camera configuration for 3D rendering
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub mode: ProjectionMode,
}

impl Camera {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            position: Point3::new(0.0, 0.0, 5.0),
            target: Point3::new(0.0, 0.0, 0.0),
            up: Vector3::new(0.0, 1.0, 0.0),
            fov: 75f32.to_radians(),
            aspect: width.max(1) as f32 / height.max(1) as f32,
            near: 0.1,
            far: 1000.0,
            mode: ProjectionMode::Perspective,
        }
    }

    /// Orthographic camera looking down -Z from `z`, spanning `bounds` exactly
    pub fn orthographic(bounds: OrthoBounds, z: f32, near: f32, far: f32) -> Self {
        Self {
            position: Point3::new(0.0, 0.0, z),
            target: Point3::new(0.0, 0.0, 0.0),
            up: Vector3::new(0.0, 1.0, 0.0),
            fov: 0.0,
            aspect: (bounds.right - bounds.left) / (bounds.top - bounds.bottom),
            near,
            far,
            mode: ProjectionMode::Orthographic(bounds),
        }
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.aspect = width.max(1) as f32 / height.max(1) as f32;
    }

    /// Create the view matrix (camera transformation)
    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(&self.position, &self.target, &self.up)
    }

    /// Create the projection matrix
    pub fn projection_matrix(&self) -> Matrix4<f32> {
        match self.mode {
            ProjectionMode::Perspective => {
                Matrix4::new_perspective(self.aspect, self.fov, self.near, self.far)
            }
            ProjectionMode::Orthographic(b) => {
                Matrix4::new_orthographic(b.left, b.right, b.bottom, b.top, self.near, self.far)
            }
        }
    }

    pub fn view_projection(&self) -> Matrix4<f32> {
        self.projection_matrix() * self.view_matrix()
    }

    /// Project a world-space point with a precomputed view-projection matrix.
    ///
    /// Returns `None` for points behind the near plane.
    pub fn project_with(
        view_projection: &Matrix4<f32>,
        point: &Point3<f32>,
        width: u32,
        height: u32,
    ) -> Option<ProjectedPoint> {
        let clip: Vector4<f32> = view_projection * point.to_homogeneous();

        // Prevent division by near-zero depth values
        if clip.w < 1e-6 {
            return None;
        }

        let inv_w = 1.0 / clip.w;
        let ndc_x = clip.x * inv_w;
        let ndc_y = clip.y * inv_w;

        Some(ProjectedPoint {
            x: (ndc_x + 1.0) * 0.5 * width as f32,
            y: (1.0 - ndc_y) * 0.5 * height as f32,
            depth: clip.z * inv_w,
            inv_w,
        })
    }

    /// Project a 3D point to 2D screen space
    pub fn project_to_screen(
        &self,
        point: &Point3<f32>,
        model_matrix: &Matrix4<f32>,
        width: u32,
        height: u32,
    ) -> Option<ProjectedPoint> {
        let world = model_matrix.transform_point(point);
        Self::project_with(&self.view_projection(), &world, width, height)
    }

    /// Ray from the camera through a point in normalized device coordinates
    pub fn ray_through_ndc(&self, ndc_x: f32, ndc_y: f32) -> Option<Ray> {
        let inverse = self.view_projection().try_inverse()?;
        let unproject = |z: f32| {
            let p = inverse * Vector4::new(ndc_x, ndc_y, z, 1.0);
            (p.w.abs() > 1e-9).then(|| Point3::from(p.xyz() / p.w))
        };
        let near = unproject(-1.0)?;
        let far = unproject(1.0)?;
        Ray::between(near, far)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(800, 600)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_camera_creation() {
        let camera = Camera::new(800, 600);
        assert_eq!(camera.mode, ProjectionMode::Perspective);
        assert!((camera.aspect - 800.0 / 600.0).abs() < 1e-6);
    }

    #[test]
    fn test_view_matrix() {
        let camera = Camera::new(800, 600);
        let view = camera.view_matrix();
        // View matrix should be non-zero
        assert!(view.norm() > 0.0);
    }

    #[test]
    fn test_orthographic_bounds_map_to_buffer_edges() {
        let camera = Camera::orthographic(OrthoBounds::centered(4.0, 2.5), 1.0, 0.1, 10.0);
        let vp = camera.view_projection();
        let corner = Camera::project_with(&vp, &Point3::new(-2.0, 1.25, 0.0), 400, 250).unwrap();
        assert_relative_eq!(corner.x, 0.0, epsilon = 1e-3);
        assert_relative_eq!(corner.y, 0.0, epsilon = 1e-3);
        let centre = Camera::project_with(&vp, &Point3::origin(), 400, 250).unwrap();
        assert_relative_eq!(centre.x, 200.0, epsilon = 1e-3);
        assert_relative_eq!(centre.y, 125.0, epsilon = 1e-3);
        assert_relative_eq!(centre.inv_w, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_points_behind_camera_are_rejected() {
        let camera = Camera::new(800, 600);
        let behind = camera.project_to_screen(&Point3::new(0.0, 0.0, 10.0), &Matrix4::identity(), 800, 600);
        assert!(behind.is_none());
    }

    #[test]
    fn test_centre_ray_points_at_target() {
        let camera = Camera::new(800, 600);
        let ray = camera.ray_through_ndc(0.0, 0.0).unwrap();
        assert_relative_eq!(ray.direction, Vector3::new(0.0, 0.0, -1.0), epsilon = 1e-4);
        assert_relative_eq!(ray.origin.x, 0.0, epsilon = 1e-4);
    }
}

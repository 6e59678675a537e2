/// Rays for pointer picking
use nalgebra::{Matrix4, Point3, Vector3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Point3<f32>,
    /// Unit direction
    pub direction: Vector3<f32>,
}

impl Ray {
    pub fn new(origin: Point3<f32>, direction: Vector3<f32>) -> Option<Self> {
        let direction = direction.try_normalize(1e-12)?;
        Some(Self { origin, direction })
    }

    pub fn between(from: Point3<f32>, to: Point3<f32>) -> Option<Self> {
        Self::new(from, to - from)
    }

    pub fn at(&self, t: f32) -> Point3<f32> {
        self.origin + self.direction * t
    }

    /// Express the ray in the local space of an object with the given model matrix
    pub fn to_local(&self, model: &Matrix4<f32>) -> Option<Self> {
        let inverse = model.try_inverse()?;
        Self::new(
            inverse.transform_point(&self.origin),
            inverse.transform_vector(&self.direction),
        )
    }

    /// Hit distance against the plane `z = plane_z`, from either side.
    /// Rays within f32 rounding of parallel to the plane miss.
    pub fn intersect_z_plane(&self, plane_z: f32) -> Option<f32> {
        if self.direction.z.abs() < 1e-6 {
            return None;
        }
        let t = (plane_z - self.origin.z) / self.direction.z;
        (t >= 0.0).then_some(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::RotationState;
    use approx::assert_relative_eq;

    #[test]
    fn test_zero_direction_is_rejected() {
        assert!(Ray::new(Point3::origin(), Vector3::zeros()).is_none());
    }

    #[test]
    fn test_plane_hit_in_front_only() {
        let ray = Ray::new(Point3::new(0.0, 0.0, 5.0), -Vector3::z()).unwrap();
        let t = ray.intersect_z_plane(1.0).unwrap();
        assert_relative_eq!(t, 4.0);
        assert!(ray.intersect_z_plane(6.0).is_none());
    }

    #[test]
    fn test_local_ray_follows_model_rotation() {
        let rotation = RotationState::new(0.0, std::f32::consts::FRAC_PI_2);
        let model = rotation.matrix();
        let ray = Ray::new(Point3::new(0.0, 0.0, 5.0), -Vector3::z()).unwrap();
        let local = ray.to_local(&model).unwrap();
        // Yawed a quarter turn, the camera looks along the card's local +X axis
        assert_relative_eq!(local.direction, Vector3::x(), epsilon = 1e-5);
        assert!(local.intersect_z_plane(0.0).is_none());
    }

    #[test]
    fn test_grazing_ray_misses_plane() {
        let ray = Ray::new(Point3::new(-5.0, 0.0, 0.0), Vector3::new(1.0, 0.0, 4.4e-8)).unwrap();
        assert!(ray.intersect_z_plane(0.0).is_none());
        let steep = Ray::new(Point3::new(-5.0, 0.0, 1.0), Vector3::new(1.0, 0.0, -0.01)).unwrap();
        assert!(steep.intersect_z_plane(0.0).is_some());
    }
}

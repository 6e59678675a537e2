/// Card orientation
use nalgebra::{Matrix4, Vector3};

/// Pitch and yaw of the card in radians. The card never rolls.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RotationState {
    pub pitch: f32,
    pub yaw: f32,
}

impl RotationState {
    pub fn new(pitch: f32, yaw: f32) -> Self {
        Self { pitch, yaw }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    /// Accumulate yaw freely and pitch within `[-max_pitch, max_pitch]`
    pub fn rotate_clamped(&mut self, d_pitch: f32, d_yaw: f32, max_pitch: f32) {
        self.yaw += d_yaw;
        self.pitch = (self.pitch + d_pitch).clamp(-max_pitch, max_pitch);
    }

    /// Model matrix: yaw about Y first, then pitch about X
    pub fn matrix(&self) -> Matrix4<f32> {
        Matrix4::new_rotation(Vector3::new(self.pitch, 0.0, 0.0))
            * Matrix4::new_rotation(Vector3::new(0.0, self.yaw, 0.0))
    }
}

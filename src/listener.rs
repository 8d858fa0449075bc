use glam::{Mat3, Quat, Vec3};

/// Listener placement in the 3D scene: position plus forward and up vectors.
/// The vectors are forwarded as given; no orthogonality validation is done.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ListenerTransform {
    pub position: [f32; 3],
    pub forward: [f32; 3],
    pub up: [f32; 3],
}

impl ListenerTransform {
    pub fn new(position: [f32; 3], forward: [f32; 3], up: [f32; 3]) -> Self {
        Self {
            position,
            forward,
            up,
        }
    }

    /// Orientation as a rotation from the middleware's reference frame
    /// (looking down -Z, +Y up).
    pub fn orientation(&self) -> Quat {
        let forward = Vec3::from_array(self.forward).normalize_or_zero();
        let up = Vec3::from_array(self.up).normalize_or_zero();
        if forward == Vec3::ZERO || up == Vec3::ZERO {
            return Quat::IDENTITY;
        }
        let right = forward.cross(up).normalize_or_zero();
        if right == Vec3::ZERO {
            // Degenerate forward/up pair, fall back to an unrotated frame.
            return Quat::IDENTITY;
        }
        Quat::from_mat3(&Mat3::from_cols(right, up, -forward)).normalize()
    }
}

impl Default for ListenerTransform {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0, -1.0],
            forward: [0.0, 0.0, 1.0],
            up: [0.0, 1.0, 0.0],
        }
    }
}

//! Fixed-point quaternion encoding.
//!
//! Rotations are stored as four signed 16-bit integers. X, Y and Z are scaled
//! by `32767`; W is scaled by `-32767`. The negated W is part of the format and
//! files written without it decode to the conjugate rotation.

use glam::Quat;

/// Scale applied to X, Y and Z.
pub const QUAT_SCALE: f32 = 32767.0;

/// Scale applied to W.
pub const QUAT_W_SCALE: f32 = -32767.0;

/// A quaternion as stored on disk.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Quat16 {
    pub x: i16,
    pub y: i16,
    pub z: i16,
    pub w: i16,
}

impl Quat16 {
    /// Identity rotation in stored form.
    pub const IDENTITY: Self = Self { x: 0, y: 0, z: 0, w: -32767 };

    /// Quantize a rotation.
    pub fn encode(q: Quat) -> Self {
        Self {
            x: quantize(q.x, QUAT_SCALE),
            y: quantize(q.y, QUAT_SCALE),
            z: quantize(q.z, QUAT_SCALE),
            w: quantize(q.w, QUAT_W_SCALE),
        }
    }

    /// Expand back to floating point. Lossy by about `1 / 32767` per component.
    pub fn decode(self) -> Quat {
        Quat::from_xyzw(
            self.x as f32 / QUAT_SCALE,
            self.y as f32 / QUAT_SCALE,
            self.z as f32 / QUAT_SCALE,
            self.w as f32 / QUAT_W_SCALE,
        )
    }

    /// Components in wire order.
    #[inline]
    pub fn to_array(self) -> [i16; 4] {
        [self.x, self.y, self.z, self.w]
    }

    /// Build from components in wire order.
    #[inline]
    pub fn from_array([x, y, z, w]: [i16; 4]) -> Self {
        Self { x, y, z, w }
    }
}

#[inline]
fn quantize(value: f32, scale: f32) -> i16 {
    (value * scale).round().clamp(i16::MIN as f32, i16::MAX as f32) as i16
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: Quat, b: Quat) {
        for (x, y) in a.to_array().iter().zip(b.to_array().iter()) {
            assert!((x - y).abs() < 1e-4, "{a:?} vs {b:?}");
        }
    }

    #[test]
    fn test_identity_w_is_negated() {
        assert_eq!(Quat16::encode(Quat::IDENTITY), Quat16::IDENTITY);
        assert_eq!(Quat16::IDENTITY.decode(), Quat::IDENTITY);
    }

    #[test]
    fn test_quantization_bound() {
        let rotations = [
            Quat::from_rotation_x(0.3),
            Quat::from_rotation_y(-2.1),
            Quat::from_rotation_z(3.1),
            Quat::from_axis_angle(glam::Vec3::new(1.0, 2.0, -0.5).normalize(), 1.234),
            Quat::from_xyzw(0.5, 0.5, 0.5, 0.5),
        ];
        for q in rotations {
            assert_close(Quat16::encode(q).decode(), q);
        }
    }

    #[test]
    fn test_rounds_instead_of_truncating() {
        // 0.99999 * 32767 = 32766.67, which rounds up
        let q = Quat16::encode(Quat::from_xyzw(0.99999, 0.0, 0.0, 0.0));
        assert_eq!(q.x, 32767);
        let q = Quat16::encode(Quat::from_xyzw(-1.0, 0.0, 0.0, -1.0));
        assert_eq!(q.x, -32767);
        assert_eq!(q.w, 32767);
    }

    #[test]
    fn test_requantize_is_stable() {
        let q = Quat16 { x: 123, y: -4567, z: 30000, w: -9 };
        assert_eq!(Quat16::encode(q.decode()), q);
    }
}

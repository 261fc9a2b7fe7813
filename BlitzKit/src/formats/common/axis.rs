//! Coordinate-system conversion for B3D data
//!
//! B3D content is authored Y-up with Z and Y exchanged relative to the
//! consumers this crate feeds. Every position, scale and rotation read from
//! a model goes through these helpers exactly once.

use glam::{Quat, Vec3};

/// Swap the Y and Z components of a vector.
#[inline]
#[must_use]
pub fn flip_vec3(v: Vec3) -> Vec3 {
    Vec3::new(v.x, v.z, v.y)
}

/// Swap the Y and Z components of a quaternion, keeping W.
#[inline]
#[must_use]
pub fn flip_quat(q: Quat) -> Quat {
    Quat::from_xyzw(q.x, q.z, q.y, q.w)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flip_vec3() {
        assert_eq!(flip_vec3(Vec3::new(1.0, 2.0, 3.0)), Vec3::new(1.0, 3.0, 2.0));
    }

    #[test]
    fn test_flip_quat_keeps_w() {
        let q = flip_quat(Quat::from_xyzw(0.1, 0.2, 0.3, 0.4));
        assert_eq!(q.to_array(), [0.1, 0.3, 0.2, 0.4]);
    }

    #[test]
    fn test_flip_is_involution() {
        let v = Vec3::new(-4.0, 5.5, 0.25);
        assert_eq!(flip_vec3(flip_vec3(v)), v);
    }
}

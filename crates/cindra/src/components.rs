//! Built-in component vocabulary.
//!
//! Components are plain data with no behavior; systems give them meaning.
//! Everything here serializes with serde so scene loaders can populate a
//! registry directly from data files.

use serde::{Deserialize, Serialize};

use crate::math::{Vec2, Vec3};

/// Spatial placement of an entity.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// World-space position.
    pub position: Vec3,
    /// Euler rotation in radians.
    pub rotation: Vec3,
    /// Per-axis scale factors.
    pub scale: Vec3,
}

impl Transform {
    /// Unrotated, unscaled transform at the origin.
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Vec3::ZERO,
        scale: Vec3::ONE,
    };

    /// Identity transform at a position.
    #[must_use]
    pub const fn from_position(position: Vec3) -> Self {
        Self {
            position,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Linear and angular velocity, integrated by the movement system.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Velocity {
    /// Units per second.
    pub linear: Vec3,
    /// Radians per second around each axis.
    pub angular: Vec3,
}

impl Velocity {
    /// No motion.
    pub const ZERO: Self = Self {
        linear: Vec3::ZERO,
        angular: Vec3::ZERO,
    };

    /// Linear-only velocity.
    #[must_use]
    pub const fn linear(linear: Vec3) -> Self {
        Self {
            linear,
            angular: Vec3::ZERO,
        }
    }
}

/// A textured quad to draw at the entity's transform.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sprite {
    /// Handle into the renderer's texture table.
    pub texture: u32,
    /// RGBA tint, each channel in `0.0..=1.0`.
    pub color: [f32; 4],
    /// Quad size in world units.
    pub size: Vec2,
    /// Draw-order layer; higher draws on top.
    pub layer: i32,
    /// Skipped by the render phase when false.
    pub visible: bool,
}

impl Default for Sprite {
    fn default() -> Self {
        Self {
            texture: 0,
            color: [1.0, 1.0, 1.0, 1.0],
            size: Vec2::ONE,
            layer: 0,
            visible: true,
        }
    }
}

/// Orthographic camera. The render phase uses the active camera with the
/// highest priority.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    /// Half-height of the view volume in world units.
    pub ortho_size: f32,
    /// Near clip plane.
    pub near: f32,
    /// Far clip plane.
    pub far: f32,
    /// Whether this camera renders at all.
    pub active: bool,
    /// Tie-breaker between active cameras.
    pub priority: i32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            ortho_size: 5.0,
            near: 0.1,
            far: 1000.0,
            active: false,
            priority: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform_identity() {
        let t = Transform::default();
        assert_eq!(t, Transform::IDENTITY);
        assert_eq!(t.scale, Vec3::ONE);
        assert_eq!(
            Transform::from_position(Vec3::X).position,
            Vec3::new(1.0, 0.0, 0.0)
        );
    }

    #[test]
    fn test_velocity_constructors() {
        assert_eq!(Velocity::default(), Velocity::ZERO);
        let v = Velocity::linear(Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(v.linear.x, 2.0);
        assert_eq!(v.angular, Vec3::ZERO);
    }

    #[test]
    fn test_sprite_defaults_visible() {
        let s = Sprite::default();
        assert!(s.visible);
        assert_eq!(s.color, [1.0, 1.0, 1.0, 1.0]);
        assert_eq!(s.layer, 0);
    }

    #[test]
    fn test_components_roundtrip_through_serde() {
        let t = Transform::from_position(Vec3::new(1.0, 2.0, 3.0));
        let json = serde_json::to_string(&t).unwrap();
        assert_eq!(serde_json::from_str::<Transform>(&json).unwrap(), t);

        let c = Camera {
            active: true,
            priority: 3,
            ..Camera::default()
        };
        let json = serde_json::to_string(&c).unwrap();
        assert_eq!(serde_json::from_str::<Camera>(&json).unwrap(), c);
    }
}

//! # Entity Identity
//!
//! Entities are lightweight identifiers consisting of:
//! - An index into the registry's slot tables
//! - A generation counter for detecting stale handles after reuse

use std::fmt;

/// Opaque identifier for an entity.
///
/// The handle is split into two parts:
/// - Lower 32 bits: index into the registry's slot tables
/// - Upper 32 bits: generation counter, bumped when the slot is destroyed
///
/// A handle is valid only while its generation matches the live generation
/// stored at its index, so handles held across a destroy never alias a
/// recycled entity.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Entity(u64);

impl Entity {
    /// Null/invalid entity handle.
    pub const NULL: Self = Self(u64::MAX);

    /// Creates an entity handle from index and generation.
    #[inline]
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self(((generation as u64) << 32) | (index as u64))
    }

    /// Returns the index portion of the handle.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0 as u32
    }

    /// Returns the generation portion of the handle.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Checks whether this handle is the null sentinel.
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == u64::MAX
    }

    /// Returns the raw 64-bit representation.
    #[inline]
    #[must_use]
    pub const fn to_bits(self) -> u64 {
        self.0
    }

    /// Reconstructs a handle from its raw 64-bit representation.
    #[inline]
    #[must_use]
    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }
}

impl Default for Entity {
    fn default() -> Self {
        Self::NULL
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "Entity(null)")
        } else {
            write!(f, "Entity({}v{})", self.index(), self.generation())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_roundtrip() {
        let e = Entity::new(12345, 67890);
        assert_eq!(e.index(), 12345);
        assert_eq!(e.generation(), 67890);
        assert_eq!(Entity::from_bits(e.to_bits()), e);
    }

    #[test]
    fn test_null_entity() {
        assert!(Entity::NULL.is_null());
        assert!(!Entity::new(0, 0).is_null());
        assert_eq!(Entity::default(), Entity::NULL);
    }

    #[test]
    fn test_same_index_different_generation() {
        let a = Entity::new(7, 0);
        let b = Entity::new(7, 1);
        assert_ne!(a, b);
        assert_eq!(a.index(), b.index());
    }

    #[test]
    fn test_debug_format() {
        assert_eq!(format!("{:?}", Entity::new(3, 2)), "Entity(3v2)");
        assert_eq!(format!("{:?}", Entity::NULL), "Entity(null)");
    }
}

//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects have no identity and are never mutated in place: an amount of
/// money or a member's line in a fee split is fully described by its fields.
/// To "change" one, build a new value.
///
/// Contrast with [`crate::entity::Entity`], where two instances with the same
/// id are the same thing even if their fields differ.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}

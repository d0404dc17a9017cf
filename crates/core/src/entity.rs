//! Entity trait: identity + continuity across state changes.

use crate::change_status::ChangeStatus;

/// Entity marker + minimal interface.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}

/// An entity whose persistence is differential: the gateway inspects the
/// change-status to decide between insert, update, delete and no-op.
pub trait Tracked: Entity {
    fn change_status(&self) -> ChangeStatus;

    /// Called by a gateway after the entity was written successfully.
    fn mark_persisted(&mut self) -> crate::DomainResult<()>;
}

//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug + core::fmt::Display;

    /// Entity name used in `NotFound` errors and log fields.
    const KIND: &'static str;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}

/// Turn an optional lookup result into the entity or a `NotFound` naming it.
pub fn require<E: Entity>(found: Option<E>, id: &E::Id) -> crate::CoreResult<E> {
    found.ok_or_else(|| crate::CoreError::not_found(E::KIND, id))
}

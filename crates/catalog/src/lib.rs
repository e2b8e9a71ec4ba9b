//! Catalog domain module: items, warehouse locations and users.
//!
//! This crate contains business rules for the catalog, implemented purely as
//! deterministic domain logic (no IO, no HTTP, no storage).

pub mod item;
pub mod location;
pub mod user;

pub use item::{Batch, Item, ItemFilter, ItemPatch, NewItem, DEFAULT_UNIT};
pub use location::{Location, NewLocation};
pub use user::{NewUser, Role, User};

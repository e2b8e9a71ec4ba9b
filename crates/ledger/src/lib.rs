//! Movement ledger domain module.
//!
//! Append-only records of item relocations and the ordering rules used when the
//! history of an item is read back. Pure domain logic (no IO, no storage).

pub mod movement;

pub use movement::{History, Movement, NewMovement};

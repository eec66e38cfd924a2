//! Storage collaborator boundary.
//!
//! The engine reads and writes plain records through [`FuelStore`]. It assumes no
//! transactions across calls: inventory writes are compare-and-swap on a version, and
//! every other write is an idempotent upsert by natural key.

mod in_memory;
mod r#trait;

pub use in_memory::InMemoryFuelStore;
pub use r#trait::{FuelStore, StoreError, StoreResult};

//! Repository modules implementing deck and card operations.
//!
//! Each module adds methods to `ForgeService` via `impl ForgeService` blocks.
//! Every mutation is a single versioned write through the entity's
//! Version Control Manager.

pub mod card;
pub mod deck;

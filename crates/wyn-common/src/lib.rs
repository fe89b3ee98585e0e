//! # Wyn Common
//!
//! Common types shared by the Wyn gameplay crates.
//!
//! This crate provides the leaf types every other crate builds on:
//! - `Vec2` for positions and velocities
//! - ID types (`EntityId`, `BodyId`)
//! - Common error types
//! - Prelude for convenient imports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod coords;
pub mod error;
pub mod ids;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::coords::*;
    pub use crate::error::*;
    pub use crate::ids::*;
}

pub use prelude::*;

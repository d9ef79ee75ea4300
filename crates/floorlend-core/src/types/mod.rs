//! # Type Definitions
//!
//! Principal identifiers and event types shared across components.

pub mod address;
pub mod events;

pub use address::*;
pub use events::*;

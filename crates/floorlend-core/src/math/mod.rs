//! # Mathematical Functions
//!
//! Checked arithmetic and 256-bit helpers shared by every component.

pub mod big_int;
pub mod safe_math;

pub use big_int::*;
pub use safe_math::*;

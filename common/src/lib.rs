//! FXDesk Common Types
//!
//! This crate contains shared types used across FXDesk, including
//! currency codes, display rounding, amount parsing, session identifiers
//! and the injectable clock.

pub mod identifiers;
pub mod monetary;
pub mod error;
pub mod time;

pub use identifiers::*;
pub use monetary::*;
pub use error::*;
pub use time::*;

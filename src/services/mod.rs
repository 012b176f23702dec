//! Services
//!
//! Business logic for insight panels.

pub mod insight;

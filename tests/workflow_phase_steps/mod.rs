//! Step definitions for workflow phase enforcement scenarios.

pub mod given;
pub mod then;
pub mod when;
pub mod world;

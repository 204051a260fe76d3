//! Step definitions for sprint synchronisation scenarios.

pub mod given;
pub mod then;
pub mod when;
pub mod world;

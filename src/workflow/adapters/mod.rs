//! Adapter implementations for workflow ports.

pub mod fs;
pub mod memory;

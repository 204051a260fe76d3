//! Adapter implementations for sprint ports.

pub mod fs;
pub mod memory;
pub mod retry;

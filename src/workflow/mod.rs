//! Workflow phase enforcement for Shipwright.
//!
//! A work item moves through a fixed sequence of phases (investigation,
//! planning, implementation, validation, publication and monitoring). This
//! module refuses to start a phase before its prerequisites hold and refuses
//! to record a phase as complete until the submitted outputs, and the
//! evidence backing them, check out. The module follows hexagonal
//! architecture:
//!
//! - Domain types and phase rules in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;

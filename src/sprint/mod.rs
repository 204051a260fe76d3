//! Bidirectional synchronisation between a sprint plan and an issue tracker.
//!
//! A sprint plan ([`domain::TaskModel`]) lists phases and their tasks. The
//! sync engine makes the tracker reflect that plan: it creates missing
//! issues, maps phase status onto issue state, reconciles sprint-owned labels
//! in batched calls and closes issues whose task left the plan. It hands the
//! plan back with tracker ids filled in. The module follows hexagonal
//! architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;

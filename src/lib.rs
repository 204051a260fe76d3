//! Shipwright: delivery workflow guard rails for agent-driven development.
//!
//! This crate keeps two pieces of delivery bookkeeping honest:
//!
//! - work items move through investigation, planning, implementation,
//!   validation, publication and monitoring in order, and no phase counts as
//!   done until its outputs are backed by evidence;
//! - a sprint plan and the issue tracker agree on which tasks exist, what
//!   state they are in and which sprint labels they carry.
//!
//! # Architecture
//!
//! Shipwright follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (files, memory, retries)
//!
//! # Modules
//!
//! - [`workflow`]: Phase state machine and its enforcement
//! - [`sprint`]: Sprint plan to issue tracker synchronisation
//! - [`record_file`]: Checksummed JSON records backing the file stores
//! - [`keyed_locks`]: Per-key async locks serialising passes and saves

pub mod keyed_locks;
pub mod record_file;
pub mod sprint;
pub mod workflow;

#![forbid(unsafe_code)]

//! Ballot runtime
//!
//! Wraps the ballot kernel with persistence, replay, snapshots,
//! session management and drift detection.
//!
//! No ballot rules live here. All transitions and invariants
//! are delegated to the kernel.

pub mod command_log;
pub mod config;
pub mod drift;
pub mod error;
pub mod logging;
pub mod proto_bridge;
pub mod proto_types;
pub mod replay;
pub mod session;
pub mod snapshot;
pub mod snapshot_codec;

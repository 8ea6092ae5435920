#![forbid(unsafe_code)]

/// Ballot kernel v1. Behavioral changes require a new kernel version.
pub const KERNEL_VERSION: u32 = 1;

pub mod domain;
pub mod error;
pub mod events;
pub mod state;
pub mod transitions;
pub mod invariants;
pub mod hashing;
pub mod engine;

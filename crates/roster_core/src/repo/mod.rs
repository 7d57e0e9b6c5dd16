//! Persistence of run audit trails.
//!
//! # Responsibility
//! - Define the contract for recording and reading back resolution runs.
//! - Keep SQL details out of the engine and the service layer.
//!
//! # Invariants
//! - A run, its change log and its review items are written atomically.
//! - Read paths reject malformed persisted rows instead of masking them.

pub mod audit_repo;

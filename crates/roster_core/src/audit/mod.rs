//! Audit artifacts produced alongside the cleaned panel.
//!
//! # Responsibility
//! - Record before/after name rewrites per pass for manual inspection.
//! - Collect ambiguous cases that were deferred instead of guessed.
//!
//! # Invariants
//! - Logs are append-only within one run.
//! - Nothing ambiguous is silently dropped: it is either resolved by an
//!   injected resolver or exported as a review item.

mod change_log;
mod review;

pub use change_log::{ChangeEntry, ChangeLog};
pub use review::{ReviewItem, ReviewKind, ReviewQueue};

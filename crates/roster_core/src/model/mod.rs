//! Person-period domain model.
//!
//! # Responsibility
//! - Define the observation record every cleaning pass reads and rewrites.
//! - Define the organizational unit hierarchy codes used for disambiguation.
//!
//! # Invariants
//! - A full name is the `(surname, given_names)` pair compared by string
//!   equality after normalization, never by object identity.
//! - A `person_id` denotes at most one unit per time bucket once overlap
//!   resolution has run.

pub mod observation;
pub mod unit;

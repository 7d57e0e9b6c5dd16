//! Use-case orchestration over the engine and the audit store.

pub mod resolution_service;

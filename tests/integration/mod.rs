//! Integration Tests Module
//!
//! End-to-end tests for Interrogation Room. Tests drive whole sessions
//! against scripted providers, the sidecar parser through its public API,
//! gateway failover and on-disk persistence.

// Shared scripted provider and builders
mod support;

// Session flows against scripted suspects
mod session_test;

// Sidecar parsing of realistic replies
mod sidecar_test;

// Endpoint failover and offline fallback
mod gateway_test;

// Config and progress persistence
mod storage_test;

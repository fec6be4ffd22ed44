//! Shared helpers for integration tests.

#![allow(dead_code)]

#[path = "../../src/test_support/ds_store.rs"]
pub mod ds_store;
#[path = "../../src/test_support/socket_guard.rs"]
pub mod socket_guard;

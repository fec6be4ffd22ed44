//! Test-only helpers shared by unit tests and, via `#[path]`, the integration tests.

pub mod ds_store;
pub mod socket_guard;

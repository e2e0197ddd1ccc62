//! Shared test utilities

pub mod fixtures;
pub mod mock_store;
pub mod mock_sync;

//! ff-submit - fast-forward submit strategies
//!
//! Integrates an approved batch of reviewed commits onto a destination
//! branch by fast-forward, optionally mirroring every commit to an external
//! legacy repository through a hook before the branch moves past it.
//!
//! The entry point is [`strategy::SubmitStrategy`]; [`strategy::integrate`]
//! also moves the destination ref.

pub mod commit;
pub mod config;
pub mod credentials;
pub mod error;
pub mod graph;
pub mod outcome;
pub mod store;
pub mod strategy;
pub mod sync;
pub mod types;

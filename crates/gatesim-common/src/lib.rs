//! Common functionality for `gatesim`.
//!
//! This crate provides the bookkeeping primitives shared by the simulation crates: a
//! sequence counter and a delay queue over a logical clock.
//!
//! This crate does not know anything about logic gates, see `gatesim-circuits` for that.

#![deny(
    unsafe_code,
    missing_docs,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all
)]

mod id;
pub mod queue;

pub use id::Counter;
pub use queue::DelayQueue;

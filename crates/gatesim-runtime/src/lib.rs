//! Drives a [`Simulation`](gatesim_core::Simulation) from wall-clock time.
//!
//! [`Runtime::spawn`] moves a simulation onto its own tokio task, which advances the
//! logical clock by the real time elapsed since spawning on every tick. All access
//! goes through the returned [`SimulationHandle`], closures sent through it run on
//! the owning task in the order they were sent, each after the clock has caught up.
//!
//! # Example
//!
//! ```
//! use gatesim_core::{Simulation, OutputId};
//! use gatesim_runtime::{Runtime, RuntimeConfig};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let handle = Runtime::spawn(Simulation::default(), RuntimeConfig::default());
//!
//! let switch = handle.call(|sim| sim.add_switch(true)).await.unwrap();
//! handle.call(move |sim| sim.update(switch)).await.unwrap().unwrap();
//!
//! let levels = handle.snapshot_outputs(switch).await.unwrap();
//! assert_eq!(levels, vec![(OutputId { circuit: switch, slot: 0 }, true)]);
//!
//! handle.shutdown().await.unwrap();
//! # }
//! ```

#![deny(missing_docs, unreachable_pub, unused_must_use)]

mod config;
mod runtime;

pub use config::{RuntimeConfig, RuntimeConfigBuilder, RuntimeConfigBuilderError};
pub use runtime::{Runtime, RuntimeError, SimulationHandle};

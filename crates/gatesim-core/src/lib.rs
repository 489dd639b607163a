//! Event driven logic circuit simulation.
//!
//! A [`Simulation`] holds a graph of gates joined by connections. Changing a level
//! re-evaluates the affected gate immediately, but the new output levels only reach
//! downstream gates once the logical clock advances by one clock tick. Composite
//! circuits are flattened into their gates on placement.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//!
//! use gatesim_circuits::GateType;
//! use gatesim_core::{InputId, OutputId, Simulation};
//!
//! let mut sim = Simulation::default();
//!
//! let switch = sim.add_switch(true);
//! let not = sim.add_gate(GateType::Not);
//! sim.update(switch).unwrap();
//! sim.update(not).unwrap();
//!
//! let input = InputId { circuit: not, slot: 0 };
//! let output = OutputId { circuit: not, slot: 0 };
//!
//! sim.connect(input, OutputId { circuit: switch, slot: 0 }).unwrap();
//! assert!(!sim.output_powered(output).unwrap());
//!
//! // The new level reaches the NOT gate one clock tick later.
//! sim.set_switch(switch, false).unwrap();
//! assert!(sim.input_powered(input).unwrap());
//!
//! sim.advance_by(Duration::from_millis(100));
//! assert!(sim.output_powered(output).unwrap());
//! ```

#![deny(missing_docs, unreachable_pub, unused_must_use)]

pub(crate) mod circuit;
mod composite;
mod config;
mod connection;
mod error;
mod ids;
mod observer;
pub mod scheduler;
mod simulation;
mod snapshot;

pub use config::{ConnectPolicy, SimulationConfig, SimulationConfigBuilder, SimulationConfigBuilderError};
pub use connection::Connection;
pub use error::{CircuitError, ErrorKind};
pub use ids::{CircuitId, ConnectionId, InputId, OutputId};
pub use observer::{EventLog, NoopObserver, TerminalEvent, TerminalObserver};
pub use scheduler::{Batch, Scheduler, UpdateCall};
pub use simulation::Simulation;

use core::fmt;

use slotmap::{new_key_type, Key};

new_key_type! {
    /// Identifies a circuit in a [`Simulation`](crate::Simulation).
    ///
    /// The id of a destroyed circuit stays unknown, also after
    /// [`Simulation::clear`](crate::Simulation::clear).
    pub struct CircuitId;

    /// Identifies a connection in a [`Simulation`](crate::Simulation).
    pub struct ConnectionId;
}

impl fmt::Display for CircuitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Circuit({:?})", self.data())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Connection({:?})", self.data())
    }
}

/// Identifies an input terminal.
///
/// The circuit is always the gate which owns the terminal, also when the terminal is
/// exposed at the boundary of a composite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InputId {
    /// Owning gate.
    pub circuit: CircuitId,
    /// Position on the owning gate.
    pub slot: usize,
}

impl fmt::Display for InputId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Input({:?}.{})", self.circuit.data(), self.slot)
    }
}

/// Identifies an output terminal.
///
/// See [`InputId`] for which circuit is referenced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OutputId {
    /// Owning gate.
    pub circuit: CircuitId,
    /// Position on the owning gate.
    pub slot: usize,
}

impl fmt::Display for OutputId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Output({:?}.{})", self.circuit.data(), self.slot)
    }
}

pub(crate) mod gate;

use std::{fmt::Display, marker::PhantomData};

/// Marker for a pin which drives a signal (a gate output).
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub struct Source;

/// Marker for a pin which receives a signal (a gate input).
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub struct Sink;

/// A reference to a gate added to a [`TemplateBuilder`](crate::TemplateBuilder).
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub struct GateRef(pub(crate) usize);

impl GateRef {
    /// Returns the position of the gate in the template.
    pub fn index(&self) -> usize {
        self.0
    }

    /// Returns the input pin at `slot`.
    pub fn input(&self, slot: usize) -> Pin<Sink> {
        Pin::new(self.0, slot)
    }

    /// Returns the output pin at `slot`.
    pub fn output(&self, slot: usize) -> Pin<Source> {
        Pin::new(self.0, slot)
    }
}

/// A terminal of a gate in a template under construction.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub struct Pin<T> {
    pub(crate) gate: usize,
    pub(crate) slot: usize,
    _pd: PhantomData<T>,
}

impl<T> Pin<T> {
    #[inline(always)]
    pub(crate) fn new(gate: usize, slot: usize) -> Self {
        Self {
            gate,
            slot,
            _pd: PhantomData,
        }
    }

    /// Returns the gate the pin belongs to.
    pub fn gate(&self) -> GateRef {
        GateRef(self.gate)
    }

    /// Returns the slot of the pin on its gate.
    pub fn slot(&self) -> usize {
        self.slot
    }
}

impl Display for Pin<Source> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Source({}.{})", self.gate, self.slot)
    }
}

impl Display for Pin<Sink> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Sink({}.{})", self.gate, self.slot)
    }
}

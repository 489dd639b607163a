//! Circuit graph nodes.

use gatesim_circuits::GateType;

use crate::{CircuitId, ConnectionId, InputId, OutputId};

/// Input terminal state.
#[derive(Debug, Clone, Default)]
pub(crate) struct Input {
    pub(crate) powered: bool,
    pub(crate) connection: Option<ConnectionId>,
    /// The output currently driving this input.
    ///
    /// Mirrors `connection` once settled, and is what scheduled updates are checked
    /// against before they are applied.
    pub(crate) parent_output: Option<OutputId>,
}

/// Output terminal state.
#[derive(Debug, Clone, Default)]
pub(crate) struct Output {
    pub(crate) powered: bool,
    /// Level last reported to the observer, `None` if never reported.
    pub(crate) rendered: Option<bool>,
    pub(crate) connections: Vec<ConnectionId>,
    /// Inputs reached via `connections`, in connection order.
    pub(crate) child_inputs: Vec<InputId>,
}

/// A built-in gate.
#[derive(Debug, Clone)]
pub(crate) struct Gate {
    pub(crate) ty: GateType,
    /// Stored level of an `INPUT` gate.
    pub(crate) switch: bool,
    pub(crate) inputs: Vec<Input>,
    pub(crate) outputs: Vec<Output>,
    /// Outputs reported as changed by the last recompute.
    pub(crate) changed: Vec<usize>,
}

impl Gate {
    pub(crate) fn new(ty: GateType, switch: bool) -> Self {
        Self {
            ty,
            switch,
            inputs: vec![Input::default(); ty.input_count()],
            outputs: vec![Output::default(); ty.output_count()],
            changed: Vec::new(),
        }
    }

    /// Runs the gate kernel, returning the slots of the outputs whose level changed
    /// or whose level was never reported.
    pub(crate) fn recompute(&mut self) -> Vec<usize> {
        let levels: Vec<bool> = self.inputs.iter().map(|input| input.powered).collect();
        let mut next = vec![false; self.outputs.len()];

        self.ty.evaluate(&levels, self.switch, &mut next);

        self.outputs
            .iter_mut()
            .zip(next)
            .enumerate()
            .filter_map(|(slot, (output, powered))| {
                let changed = output.powered != powered || output.rendered != Some(powered);
                output.powered = powered;
                changed.then_some(slot)
            })
            .collect()
    }
}

/// A composite circuit flattened from a template.
#[derive(Debug, Clone, Default)]
pub(crate) struct Composite {
    pub(crate) children: Vec<CircuitId>,
    pub(crate) inputs: Vec<InputId>,
    pub(crate) outputs: Vec<OutputId>,
    pub(crate) input_labels: Vec<String>,
    pub(crate) output_labels: Vec<String>,
    /// Connections wired from this composite's template.
    pub(crate) connections: Vec<ConnectionId>,
    /// Set once teardown starts, scheduled updates addressed to the interior are
    /// dropped from then on.
    pub(crate) should_dereference: bool,
}

#[derive(Debug, Clone)]
pub(crate) enum CircuitKind {
    Gate(Gate),
    Composite(Composite),
}

/// A node of the circuit graph.
#[derive(Debug, Clone)]
pub(crate) struct Circuit {
    pub(crate) name: String,
    pub(crate) kind: CircuitKind,
    /// Composite this circuit was flattened into.
    pub(crate) custom_parent: Option<CircuitId>,
}

impl Circuit {
    pub(crate) fn gate(ty: GateType, switch: bool, custom_parent: Option<CircuitId>) -> Self {
        Self {
            name: ty.name().to_string(),
            kind: CircuitKind::Gate(Gate::new(ty, switch)),
            custom_parent,
        }
    }

    pub(crate) fn as_gate(&self) -> Option<&Gate> {
        match &self.kind {
            CircuitKind::Gate(gate) => Some(gate),
            CircuitKind::Composite(_) => None,
        }
    }

    pub(crate) fn as_gate_mut(&mut self) -> Option<&mut Gate> {
        match &mut self.kind {
            CircuitKind::Gate(gate) => Some(gate),
            CircuitKind::Composite(_) => None,
        }
    }

    pub(crate) fn as_composite(&self) -> Option<&Composite> {
        match &self.kind {
            CircuitKind::Composite(composite) => Some(composite),
            CircuitKind::Gate(_) => None,
        }
    }

    pub(crate) fn as_composite_mut(&mut self) -> Option<&mut Composite> {
        match &mut self.kind {
            CircuitKind::Composite(composite) => Some(composite),
            CircuitKind::Gate(_) => None,
        }
    }
}

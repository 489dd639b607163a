//! Capturing circuits into templates and restoring them.

use std::collections::{HashMap, HashSet};

use gatesim_circuits::{
    BoundaryTerminal, GateDescriptor, GateType, Resolved, Template, Wire,
};
use tracing::debug;

use crate::{
    circuit::{Circuit, CircuitKind},
    CircuitError, CircuitId, ErrorKind, Simulation, TerminalObserver,
};

impl<O: TerminalObserver> Simulation<O> {
    /// Captures a selection of top-level circuits into a template.
    ///
    /// Connections between selected circuits become wires, every other terminal is
    /// exposed at the boundary. The result can be stored in the library to be placed
    /// as a composite, or handed to [`Simulation::restore`].
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::NotTopLevel`] if a circuit is part of a composite, and
    /// [`ErrorKind::InvalidTemplate`] if the selection is empty.
    pub fn capture(&self, name: &str, circuits: &[CircuitId]) -> Result<Template, CircuitError> {
        let mut seen = HashSet::new();
        let mut selection = Vec::with_capacity(circuits.len());
        for &id in circuits {
            if seen.insert(id) {
                selection.push(id);
            }
        }

        let mut gates = Vec::with_capacity(selection.len());
        let mut inputs = Vec::new();
        let mut output_index = HashMap::new();

        for &id in &selection {
            let circuit = self.circuit(id)?;
            if circuit.custom_parent.is_some() {
                return Err(CircuitError::new(ErrorKind::NotTopLevel));
            }

            gates.push(descriptor(circuit));
            inputs.extend(self.inputs(id)?);
            for output in self.outputs(id)? {
                let index = output_index.len();
                output_index.insert(output, index);
            }
        }

        let mut wires = Vec::new();
        let mut wired_outputs = HashSet::new();
        let mut boundary_inputs = Vec::new();

        for (index, input) in inputs.iter().enumerate() {
            let source = self
                .input_connection(*input)?
                .and_then(|connection| self.connections.get(connection))
                .and_then(|connection| output_index.get(&connection.output));

            match source {
                Some(&output) => {
                    wires.push(Wire { output, input: index });
                    wired_outputs.insert(output);
                }
                None => boundary_inputs.push(BoundaryTerminal {
                    index,
                    label: format!("in{}", boundary_inputs.len()),
                }),
            }
        }

        let mut boundary_outputs = Vec::new();
        for index in 0..output_index.len() {
            if !wired_outputs.contains(&index) {
                boundary_outputs.push(BoundaryTerminal {
                    index,
                    label: format!("out{}", boundary_outputs.len()),
                });
            }
        }

        let template = Template::new(name, gates, wires, boundary_inputs, boundary_outputs);
        template.validate(&self.library, self.config.max_template_depth)?;

        debug!(
            name,
            gates = template.gates().len(),
            wires = template.wires().len(),
            "captured template"
        );

        Ok(template)
    }

    /// Places the gates of a template as independent top-level circuits and connects
    /// its wires, returning the circuits in template order.
    ///
    /// Nothing is placed if the template fails validation or references an unknown
    /// template.
    #[tracing::instrument(skip_all, fields(template = template.name()))]
    pub fn restore(&mut self, template: &Template) -> Result<Vec<CircuitId>, CircuitError> {
        template.validate(&self.library, self.config.max_template_depth)?;

        let mut placed = Vec::with_capacity(template.gates().len());
        if let Err(err) = self.restore_into(template, &mut placed) {
            for id in placed {
                self.teardown(id);
            }
            return Err(err);
        }

        debug!(circuits = placed.len(), "restored template");

        Ok(placed)
    }

    fn restore_into(&mut self, template: &Template, placed: &mut Vec<CircuitId>) -> Result<(), CircuitError> {
        let mut inputs = Vec::new();
        let mut outputs = Vec::new();

        for gate in template.gates() {
            let nested = match self.library.resolve(gate)? {
                Resolved::Builtin(_) => None,
                Resolved::Custom(nested) => Some(nested.clone()),
            };

            let id = match (nested, gate.gate_type()) {
                (Some(nested), _) => self.instantiate(&nested, None)?,
                (None, Some(GateType::Input)) => self.add_switch(gate.switch),
                (None, Some(ty)) => self.add_gate(ty),
                (None, None) => {
                    return Err(CircuitError::new(ErrorKind::InvalidCircuitDescriptor))
                }
            };

            placed.push(id);
            inputs.extend(self.inputs(id)?);
            outputs.extend(self.outputs(id)?);
        }

        for wire in template.wires() {
            let (Some(&input), Some(&output)) = (inputs.get(wire.input), outputs.get(wire.output)) else {
                return Err(CircuitError::new(ErrorKind::InvalidTemplate));
            };

            self.connect(input, output)?;
        }

        Ok(())
    }
}

fn descriptor(circuit: &Circuit) -> GateDescriptor {
    match &circuit.kind {
        CircuitKind::Gate(gate) if gate.ty == GateType::Input => GateDescriptor::input(gate.switch),
        CircuitKind::Gate(gate) => GateDescriptor::builtin(gate.ty),
        CircuitKind::Composite(_) => GateDescriptor::custom(circuit.name.clone()),
    }
}

#[cfg(test)]
mod tests {
    use crate::{InputId, OutputId};

    use super::*;

    #[test]
    fn test_capture_exposes_unwired_terminals() {
        let mut sim = Simulation::default();
        let switch = sim.add_switch(true);
        let and = sim.add_gate(GateType::And);
        sim.connect(
            InputId {
                circuit: and,
                slot: 1,
            },
            OutputId {
                circuit: switch,
                slot: 0,
            },
        )
        .unwrap();

        let template = sim.capture("HALF", &[switch, and, switch]).unwrap();

        assert_eq!(
            template.gates(),
            &[
                GateDescriptor::input(true),
                GateDescriptor::builtin(GateType::And)
            ]
        );
        assert_eq!(template.wires(), &[Wire { output: 0, input: 1 }]);
        assert_eq!(
            template.boundary_inputs(),
            &[BoundaryTerminal {
                index: 0,
                label: "in0".to_string()
            }]
        );
        assert_eq!(
            template.boundary_outputs(),
            &[BoundaryTerminal {
                index: 1,
                label: "out0".to_string()
            }]
        );
    }

    #[test]
    fn test_capture_of_nothing_is_rejected() {
        let sim = Simulation::default();

        assert_eq!(
            sim.capture("EMPTY", &[]).unwrap_err().kind(),
            &ErrorKind::InvalidTemplate
        );
    }

    #[test]
    fn test_restore_of_unknown_template_places_nothing() {
        let mut sim = Simulation::default();
        let template = Template::new(
            "BROKEN",
            vec![
                GateDescriptor::builtin(GateType::Not),
                GateDescriptor::custom("MISSING"),
            ],
            Vec::new(),
            Vec::new(),
            Vec::new(),
        );

        let err = sim.restore(&template).unwrap_err();

        assert_eq!(err.kind(), &ErrorKind::InvalidCircuitDescriptor);
        assert_eq!(sim.circuit_count(), 0);
    }
}

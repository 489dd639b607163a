//! Flattening templates into the circuit graph.
//!
//! A composite owns no logic of its own. Instantiating a template places every gate
//! it describes as a real circuit whose `custom_parent` is the composite, wires them
//! up, and exposes the boundary terminals of those gates as the composite's inputs
//! and outputs. Connections to a composite therefore attach directly to the inner
//! gates and updates never route through the composite itself.

use gatesim_circuits::{GateType, Resolved, Template, TemplateError};
use tracing::debug;

use crate::{
    circuit::{Circuit, CircuitKind, Composite},
    scheduler::UpdateCall,
    CircuitError, CircuitId, ConnectionId, ErrorKind, Simulation, TerminalObserver,
};

enum Child {
    Builtin(GateType, bool),
    Custom(Template),
}

impl<O: TerminalObserver> Simulation<O> {
    /// Instantiates the template with the given name from the library.
    ///
    /// The inner gates are evaluated immediately, the levels along internal wires
    /// settle one clock tick later.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidCircuitDescriptor`] if no such template exists or
    /// it references an unknown gate, and [`ErrorKind::InvalidTemplate`] if it fails
    /// validation.
    pub fn add_custom(&mut self, name: &str) -> Result<CircuitId, CircuitError> {
        let template = self
            .library
            .get(name)
            .cloned()
            .ok_or_else(|| TemplateError::InvalidCircuitDescriptor(name.to_string()))?;

        self.add_template(&template)
    }

    /// Instantiates a template which need not be stored in the library.
    ///
    /// Nested templates are still resolved from the library.
    pub fn add_template(&mut self, template: &Template) -> Result<CircuitId, CircuitError> {
        template.validate(&self.library, self.config.max_template_depth)?;

        let id = self.instantiate(template, None)?;
        debug!(circuit = %id, name = template.name(), "placed composite");

        Ok(id)
    }

    /// Returns the circuits a composite was flattened into, in template order.
    ///
    /// Gates have no children.
    pub fn children(&self, id: CircuitId) -> Result<&[CircuitId], CircuitError> {
        Ok(self
            .circuit(id)?
            .as_composite()
            .map(|composite| composite.children.as_slice())
            .unwrap_or_default())
    }

    /// Returns the connections internal to a composite, including those of nested
    /// composites.
    pub fn internal_connections(&self, id: CircuitId) -> Result<Vec<ConnectionId>, CircuitError> {
        let Some(composite) = self.circuit(id)?.as_composite() else {
            return Ok(Vec::new());
        };

        let mut connections = composite.connections.clone();
        for child in &composite.children {
            connections.extend(self.internal_connections(*child)?);
        }

        Ok(connections)
    }

    /// Returns the labels of a composite's boundary inputs.
    pub fn input_labels(&self, id: CircuitId) -> Result<&[String], CircuitError> {
        Ok(self
            .circuit(id)?
            .as_composite()
            .map(|composite| composite.input_labels.as_slice())
            .unwrap_or_default())
    }

    /// Returns the labels of a composite's boundary outputs.
    pub fn output_labels(&self, id: CircuitId) -> Result<&[String], CircuitError> {
        Ok(self
            .circuit(id)?
            .as_composite()
            .map(|composite| composite.output_labels.as_slice())
            .unwrap_or_default())
    }

    /// Instantiates a validated template, tearing down anything placed if it fails.
    pub(crate) fn instantiate(
        &mut self,
        template: &Template,
        parent: Option<CircuitId>,
    ) -> Result<CircuitId, CircuitError> {
        let id = self.circuits.insert(Circuit {
            name: template.name().to_string(),
            kind: CircuitKind::Composite(Composite::default()),
            custom_parent: parent,
        });

        if let Err(err) = self.flatten(id, template) {
            self.teardown(id);
            return Err(err);
        }

        Ok(id)
    }

    fn flatten(&mut self, id: CircuitId, template: &Template) -> Result<(), CircuitError> {
        let mut inputs = Vec::new();
        let mut outputs = Vec::new();

        for gate in template.gates() {
            let child = match self.library.resolve(gate)? {
                Resolved::Builtin(ty) => Child::Builtin(ty, gate.switch),
                Resolved::Custom(nested) => Child::Custom(nested.clone()),
            };

            let child = match child {
                Child::Builtin(ty, switch) => {
                    let child = self.circuits.insert(Circuit::gate(ty, switch, Some(id)));
                    self.update_gate(child);
                    child
                }
                Child::Custom(nested) => self.instantiate(&nested, Some(id))?,
            };

            self.composite_mut(id)?.children.push(child);
            inputs.extend(self.inputs(child)?);
            outputs.extend(self.outputs(child)?);
        }

        let mut batch = Vec::with_capacity(template.wires().len());
        for wire in template.wires() {
            let input = *inputs
                .get(wire.input)
                .ok_or(TemplateError::InputOutOfRange {
                    index: wire.input,
                    count: inputs.len(),
                })?;
            let output = *outputs
                .get(wire.output)
                .ok_or(TemplateError::OutputOutOfRange {
                    index: wire.output,
                    count: outputs.len(),
                })?;

            let connection = self.link(input, output, Some(id));
            self.composite_mut(id)?.connections.push(connection);

            batch.push(UpdateCall {
                powered: self.output_powered(output)?,
                input,
                output,
            });
        }

        let composite = self.composite_mut(id)?;
        for terminal in template.boundary_inputs() {
            let input = *inputs
                .get(terminal.index)
                .ok_or(TemplateError::InputOutOfRange {
                    index: terminal.index,
                    count: inputs.len(),
                })?;
            composite.inputs.push(input);
            composite.input_labels.push(terminal.label.clone());
        }
        for terminal in template.boundary_outputs() {
            let output = *outputs
                .get(terminal.index)
                .ok_or(TemplateError::OutputOutOfRange {
                    index: terminal.index,
                    count: outputs.len(),
                })?;
            composite.outputs.push(output);
            composite.output_labels.push(terminal.label.clone());
        }

        self.scheduler.initiate(batch);

        Ok(())
    }

    fn composite_mut(&mut self, id: CircuitId) -> Result<&mut Composite, CircuitError> {
        self.circuits
            .get_mut(id)
            .and_then(Circuit::as_composite_mut)
            .ok_or_else(|| CircuitError::new(ErrorKind::UnknownCircuit))
    }
}

//! Stored blueprints of composite circuits.

use std::collections::HashSet;

use crate::{GateType, Resolved, TemplateLibrary};

/// Default limit on how deeply templates may nest inside each other.
pub const DEFAULT_MAX_DEPTH: usize = 16;

/// An error that can occur when validating or resolving a template.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[allow(missing_docs)]
pub enum TemplateError {
    #[error("invalid circuit descriptor: {0:?}")]
    InvalidCircuitDescriptor(String),
    #[error("template {0:?} has no gates")]
    EmptyTemplate(String),
    #[error("input index {index} out of range, template has {count} inputs")]
    InputOutOfRange { index: usize, count: usize },
    #[error("output index {index} out of range, template has {count} outputs")]
    OutputOutOfRange { index: usize, count: usize },
    #[error("input {0} is wired more than once")]
    InputWiredTwice(usize),
    #[error("input {0} is exposed more than once")]
    DuplicateBoundaryInput(usize),
    #[error("output {0} is exposed more than once")]
    DuplicateBoundaryOutput(usize),
    #[error("input {0} is exposed but wired internally")]
    BoundaryInputWired(usize),
    #[error("output {0} is exposed but wired internally")]
    BoundaryOutputWired(usize),
    #[error("input {0} is neither wired nor exposed")]
    UnexposedInput(usize),
    #[error("output {0} is neither wired nor exposed")]
    UnexposedOutput(usize),
    #[error("template {0:?} contains itself")]
    RecursiveTemplate(String),
    #[error("template {name:?} nests deeper than {max} levels")]
    NestingTooDeep { name: String, max: usize },
    #[error("template name {0:?} is reserved for a built-in gate")]
    ReservedName(String),
    #[error("template {0:?} already exists")]
    DuplicateTemplate(String),
    #[error("template {name:?} is still used by {user:?}")]
    TemplateInUse { name: String, user: String },
}

/// Describes one gate of a template.
///
/// The name is either the name of a built-in [`GateType`] or the name of another
/// template in the same [`TemplateLibrary`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GateDescriptor {
    /// Gate type or template name.
    pub name: String,
    /// Stored level of an `INPUT` gate.
    #[cfg_attr(feature = "serde", serde(default))]
    pub switch: bool,
}

impl GateDescriptor {
    /// Creates a descriptor for a built-in gate.
    pub fn builtin(ty: GateType) -> Self {
        Self {
            name: ty.name().to_string(),
            switch: false,
        }
    }

    /// Creates a descriptor for an `INPUT` gate with the given level.
    pub fn input(powered: bool) -> Self {
        Self {
            name: GateType::Input.name().to_string(),
            switch: powered,
        }
    }

    /// Creates a descriptor for a nested template.
    pub fn custom(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            switch: false,
        }
    }

    /// Returns the built-in gate type, if the descriptor names one.
    pub fn gate_type(&self) -> Option<GateType> {
        self.name.parse().ok()
    }
}

/// An internal wire of a template, from a flat output index to a flat input index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Wire {
    /// Flat index of the driving output.
    pub output: usize,
    /// Flat index of the driven input.
    pub input: usize,
}

/// A terminal a template exposes at its boundary.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BoundaryTerminal {
    /// Flat index of the terminal.
    pub index: usize,
    /// User assigned label.
    pub label: String,
}

/// A stored blueprint of a composite circuit.
///
/// Terminals are addressed by flat index: the inputs of all gates concatenated in
/// gate order, and likewise for outputs. A nested template contributes only its own
/// boundary terminals to the flat pools.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Template {
    pub(crate) name: String,
    pub(crate) gates: Vec<GateDescriptor>,
    pub(crate) wires: Vec<Wire>,
    pub(crate) boundary_inputs: Vec<BoundaryTerminal>,
    pub(crate) boundary_outputs: Vec<BoundaryTerminal>,
}

impl Template {
    /// Creates a new template without validating it.
    ///
    /// See [`Template::validate`].
    pub fn new(
        name: impl Into<String>,
        gates: Vec<GateDescriptor>,
        wires: Vec<Wire>,
        boundary_inputs: Vec<BoundaryTerminal>,
        boundary_outputs: Vec<BoundaryTerminal>,
    ) -> Self {
        Self {
            name: name.into(),
            gates,
            wires,
            boundary_inputs,
            boundary_outputs,
        }
    }

    /// Returns the name of the template.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the gates of the template.
    pub fn gates(&self) -> &[GateDescriptor] {
        &self.gates
    }

    /// Returns the internal wires of the template.
    pub fn wires(&self) -> &[Wire] {
        &self.wires
    }

    /// Returns the exposed inputs, in display order.
    pub fn boundary_inputs(&self) -> &[BoundaryTerminal] {
        &self.boundary_inputs
    }

    /// Returns the exposed outputs, in display order.
    pub fn boundary_outputs(&self) -> &[BoundaryTerminal] {
        &self.boundary_outputs
    }

    /// Returns the number of inputs a composite built from this template exposes.
    pub fn input_count(&self) -> usize {
        self.boundary_inputs.len()
    }

    /// Returns the number of outputs a composite built from this template exposes.
    pub fn output_count(&self) -> usize {
        self.boundary_outputs.len()
    }

    /// Returns the names of the templates this template nests directly.
    pub fn dependencies(&self) -> impl Iterator<Item = &str> + '_ {
        self.gates
            .iter()
            .filter(|gate| gate.gate_type().is_none())
            .map(|gate| gate.name.as_str())
    }

    /// Computes the flat terminal layout of the template.
    pub fn layout(&self, library: &TemplateLibrary) -> Result<Layout, TemplateError> {
        let mut layout = Layout::default();

        for gate in &self.gates {
            let (inputs, outputs) = match library.resolve(gate)? {
                Resolved::Builtin(ty) => (ty.input_count(), ty.output_count()),
                Resolved::Custom(template) => (template.input_count(), template.output_count()),
            };

            layout.gates.push(GateLayout {
                input_offset: layout.input_count,
                input_count: inputs,
                output_offset: layout.output_count,
                output_count: outputs,
            });

            layout.input_count += inputs;
            layout.output_count += outputs;
        }

        Ok(layout)
    }

    /// Validates the template against the templates it nests.
    ///
    /// # Arguments
    ///
    /// * `library` - Library used to resolve nested templates.
    /// * `max_depth` - Maximum nesting depth, counting this template as one level.
    pub fn validate(&self, library: &TemplateLibrary, max_depth: usize) -> Result<(), TemplateError> {
        if self.gates.is_empty() {
            return Err(TemplateError::EmptyTemplate(self.name.clone()));
        }

        let mut stack = vec![self.name.as_str()];
        self.check_nesting(library, &mut stack, max_depth)?;

        self.check_terminals(library)
    }

    /// Checks wires and boundary terminals against the flat terminal layout.
    fn check_terminals(&self, library: &TemplateLibrary) -> Result<(), TemplateError> {
        let layout = self.layout(library)?;

        let mut wired_inputs = HashSet::new();
        let mut wired_outputs = HashSet::new();
        for wire in &self.wires {
            layout.check_input(wire.input)?;
            layout.check_output(wire.output)?;

            if !wired_inputs.insert(wire.input) {
                return Err(TemplateError::InputWiredTwice(wire.input));
            }
            wired_outputs.insert(wire.output);
        }

        let mut exposed = HashSet::new();
        for terminal in &self.boundary_inputs {
            layout.check_input(terminal.index)?;

            if wired_inputs.contains(&terminal.index) {
                return Err(TemplateError::BoundaryInputWired(terminal.index));
            }
            if !exposed.insert(terminal.index) {
                return Err(TemplateError::DuplicateBoundaryInput(terminal.index));
            }
        }
        if let Some(index) =
            (0..layout.input_count).find(|idx| !wired_inputs.contains(idx) && !exposed.contains(idx))
        {
            return Err(TemplateError::UnexposedInput(index));
        }

        exposed.clear();
        for terminal in &self.boundary_outputs {
            layout.check_output(terminal.index)?;

            if wired_outputs.contains(&terminal.index) {
                return Err(TemplateError::BoundaryOutputWired(terminal.index));
            }
            if !exposed.insert(terminal.index) {
                return Err(TemplateError::DuplicateBoundaryOutput(terminal.index));
            }
        }
        if let Some(index) = (0..layout.output_count)
            .find(|idx| !wired_outputs.contains(idx) && !exposed.contains(idx))
        {
            return Err(TemplateError::UnexposedOutput(index));
        }

        Ok(())
    }

    fn check_nesting<'a>(
        &'a self,
        library: &'a TemplateLibrary,
        stack: &mut Vec<&'a str>,
        max_depth: usize,
    ) -> Result<(), TemplateError> {
        if stack.len() > max_depth {
            return Err(TemplateError::NestingTooDeep {
                name: stack[0].to_string(),
                max: max_depth,
            });
        }

        for gate in &self.gates {
            let Resolved::Custom(nested) = library.resolve(gate)? else {
                continue;
            };

            if stack.contains(&nested.name()) {
                return Err(TemplateError::RecursiveTemplate(nested.name.clone()));
            }

            if nested.gates.is_empty() {
                return Err(TemplateError::EmptyTemplate(nested.name.clone()));
            }

            stack.push(nested.name());
            nested.check_nesting(library, stack, max_depth)?;
            stack.pop();

            nested.check_terminals(library)?;
        }

        Ok(())
    }
}

/// Position of one gate's terminals in the flat terminal pools of a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateLayout {
    /// Flat index of the first input of the gate.
    pub input_offset: usize,
    /// Number of inputs of the gate.
    pub input_count: usize,
    /// Flat index of the first output of the gate.
    pub output_offset: usize,
    /// Number of outputs of the gate.
    pub output_count: usize,
}

/// Flat terminal layout of a template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Layout {
    gates: Vec<GateLayout>,
    input_count: usize,
    output_count: usize,
}

impl Layout {
    /// Returns the layout of each gate, in gate order.
    pub fn gates(&self) -> &[GateLayout] {
        &self.gates
    }

    /// Returns the total number of inputs.
    pub fn input_count(&self) -> usize {
        self.input_count
    }

    /// Returns the total number of outputs.
    pub fn output_count(&self) -> usize {
        self.output_count
    }

    /// Returns the flat index of input `slot` of `gate`.
    pub fn input_index(&self, gate: usize, slot: usize) -> Option<usize> {
        let layout = self.gates.get(gate)?;
        (slot < layout.input_count).then_some(layout.input_offset + slot)
    }

    /// Returns the flat index of output `slot` of `gate`.
    pub fn output_index(&self, gate: usize, slot: usize) -> Option<usize> {
        let layout = self.gates.get(gate)?;
        (slot < layout.output_count).then_some(layout.output_offset + slot)
    }

    fn check_input(&self, index: usize) -> Result<(), TemplateError> {
        if index >= self.input_count {
            return Err(TemplateError::InputOutOfRange {
                index,
                count: self.input_count,
            });
        }
        Ok(())
    }

    fn check_output(&self, index: usize) -> Result<(), TemplateError> {
        if index >= self.output_count {
            return Err(TemplateError::OutputOutOfRange {
                index,
                count: self.output_count,
            });
        }
        Ok(())
    }
}

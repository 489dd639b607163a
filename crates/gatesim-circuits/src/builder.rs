use std::collections::HashSet;

use crate::{
    components::{GateRef, Pin, Sink, Source},
    BoundaryTerminal, GateDescriptor, GateType, Template, TemplateError, TemplateLibrary, Wire,
};

/// Assembles a collection of gates into a [`Template`].
///
/// Terminals left unwired and not exposed explicitly are exposed on build, after the
/// explicitly exposed ones, in flat index order with the default labels `in{n}` and
/// `out{n}`.
#[derive(Debug)]
pub struct TemplateBuilder {
    name: String,
    gates: Vec<GateDescriptor>,
    wires: Vec<(Pin<Source>, Pin<Sink>)>,
    inputs: Vec<(Pin<Sink>, String)>,
    outputs: Vec<(Pin<Source>, String)>,
}

impl TemplateBuilder {
    /// Creates a new template builder.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            gates: Vec::new(),
            wires: Vec::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// Adds a built-in gate to the template.
    pub fn add_gate(&mut self, ty: GateType) -> GateRef {
        self.push(GateDescriptor::builtin(ty))
    }

    /// Adds an `INPUT` gate with the given level to the template.
    pub fn add_switch(&mut self, powered: bool) -> GateRef {
        self.push(GateDescriptor::input(powered))
    }

    /// Adds a nested template to the template.
    pub fn add_custom(&mut self, name: impl Into<String>) -> GateRef {
        self.push(GateDescriptor::custom(name))
    }

    /// Wires an output to an input.
    pub fn connect(&mut self, output: Pin<Source>, input: Pin<Sink>) {
        self.wires.push((output, input));
    }

    /// Exposes an input at the boundary with the given label.
    pub fn expose_input(&mut self, input: Pin<Sink>, label: impl Into<String>) {
        self.inputs.push((input, label.into()));
    }

    /// Exposes an output at the boundary with the given label.
    pub fn expose_output(&mut self, output: Pin<Source>, label: impl Into<String>) {
        self.outputs.push((output, label.into()));
    }

    /// Builds the template.
    ///
    /// # Arguments
    ///
    /// * `library` - Library used to resolve nested templates.
    pub fn build(self, library: &TemplateLibrary) -> Result<Template, TemplateError> {
        let template = Template::new(self.name, self.gates, Vec::new(), Vec::new(), Vec::new());
        let layout = template.layout(library)?;

        let input_index = |pin: &Pin<Sink>| {
            layout
                .input_index(pin.gate, pin.slot)
                .ok_or(TemplateError::InputOutOfRange {
                    index: pin.slot,
                    count: layout.gates().get(pin.gate).map_or(0, |gate| gate.input_count),
                })
        };
        let output_index = |pin: &Pin<Source>| {
            layout
                .output_index(pin.gate, pin.slot)
                .ok_or(TemplateError::OutputOutOfRange {
                    index: pin.slot,
                    count: layout
                        .gates()
                        .get(pin.gate)
                        .map_or(0, |gate| gate.output_count),
                })
        };

        let wires = self
            .wires
            .iter()
            .map(|(output, input)| {
                Ok(Wire {
                    output: output_index(output)?,
                    input: input_index(input)?,
                })
            })
            .collect::<Result<Vec<_>, TemplateError>>()?;

        let mut boundary_inputs = self
            .inputs
            .iter()
            .map(|(pin, label)| {
                Ok(BoundaryTerminal {
                    index: input_index(pin)?,
                    label: label.clone(),
                })
            })
            .collect::<Result<Vec<_>, TemplateError>>()?;

        let mut boundary_outputs = self
            .outputs
            .iter()
            .map(|(pin, label)| {
                Ok(BoundaryTerminal {
                    index: output_index(pin)?,
                    label: label.clone(),
                })
            })
            .collect::<Result<Vec<_>, TemplateError>>()?;

        let wired_inputs: HashSet<_> = wires.iter().map(|wire| wire.input).collect();
        let wired_outputs: HashSet<_> = wires.iter().map(|wire| wire.output).collect();

        expose_remaining(&mut boundary_inputs, layout.input_count(), &wired_inputs, "in");
        expose_remaining(&mut boundary_outputs, layout.output_count(), &wired_outputs, "out");

        let template = Template {
            wires,
            boundary_inputs,
            boundary_outputs,
            ..template
        };

        template.validate(library, library.max_depth())?;

        Ok(template)
    }

    fn push(&mut self, gate: GateDescriptor) -> GateRef {
        self.gates.push(gate);
        GateRef(self.gates.len() - 1)
    }
}

fn expose_remaining(
    boundary: &mut Vec<BoundaryTerminal>,
    count: usize,
    wired: &HashSet<usize>,
    prefix: &str,
) {
    let exposed: HashSet<_> = boundary.iter().map(|terminal| terminal.index).collect();

    for index in (0..count).filter(|idx| !wired.contains(idx) && !exposed.contains(idx)) {
        let label = format!("{prefix}{}", boundary.len());
        boundary.push(BoundaryTerminal { index, label });
    }
}

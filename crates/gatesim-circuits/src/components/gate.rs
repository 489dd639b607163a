//! Built-in gate kernels.

use core::fmt;
use std::str::FromStr;

use crate::TemplateError;

/// Number of pins on a display gate.
pub const DISPLAY_PINS: usize = 8;

/// The type of a built-in gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "UPPERCASE"))]
pub enum GateType {
    /// AND gate.
    And,
    /// OR gate.
    Or,
    /// NAND gate.
    Nand,
    /// NOR gate.
    Nor,
    /// XOR gate.
    Xor,
    /// Inverter gate.
    Not,
    /// Buffer gate, republishes its input.
    Buffer,
    /// User toggled switch, has no inputs.
    Input,
    /// Eight pin display, has no outputs.
    Display,
}

impl GateType {
    /// Every built-in gate type.
    pub const ALL: [GateType; 9] = [
        GateType::And,
        GateType::Or,
        GateType::Nand,
        GateType::Nor,
        GateType::Xor,
        GateType::Not,
        GateType::Buffer,
        GateType::Input,
        GateType::Display,
    ];

    /// Returns the display name of the gate type.
    pub fn name(&self) -> &'static str {
        match self {
            GateType::And => "AND",
            GateType::Or => "OR",
            GateType::Nand => "NAND",
            GateType::Nor => "NOR",
            GateType::Xor => "XOR",
            GateType::Not => "NOT",
            GateType::Buffer => "BUFFER",
            GateType::Input => "INPUT",
            GateType::Display => "DISPLAY",
        }
    }

    /// Returns the number of inputs of the gate.
    pub fn input_count(&self) -> usize {
        match self {
            GateType::And | GateType::Or | GateType::Nand | GateType::Nor | GateType::Xor => 2,
            GateType::Not | GateType::Buffer => 1,
            GateType::Input => 0,
            GateType::Display => DISPLAY_PINS,
        }
    }

    /// Returns the number of outputs of the gate.
    pub fn output_count(&self) -> usize {
        match self {
            GateType::Display => 0,
            _ => 1,
        }
    }

    /// Evaluates the gate.
    ///
    /// # Arguments
    ///
    /// * `inputs` - The input levels, one per input of the gate.
    /// * `switch` - The stored level of an [`GateType::Input`] gate, ignored otherwise.
    /// * `outputs` - Receives the output levels, one per output of the gate.
    ///
    /// # Panics
    ///
    /// Panics if `inputs` or `outputs` is shorter than the arity of the gate.
    #[inline]
    pub fn evaluate(&self, inputs: &[bool], switch: bool, outputs: &mut [bool]) {
        match self {
            GateType::And => outputs[0] = inputs[0] && inputs[1],
            GateType::Or => outputs[0] = inputs[0] || inputs[1],
            GateType::Nand => outputs[0] = !(inputs[0] && inputs[1]),
            GateType::Nor => outputs[0] = !(inputs[0] || inputs[1]),
            GateType::Xor => outputs[0] = (inputs[0] && !inputs[1]) || (!inputs[0] && inputs[1]),
            GateType::Not => outputs[0] = !inputs[0],
            GateType::Buffer => outputs[0] = inputs[0],
            GateType::Input => outputs[0] = switch,
            GateType::Display => {}
        }
    }
}

impl fmt::Display for GateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for GateType {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GateType::ALL
            .into_iter()
            .find(|ty| ty.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| TemplateError::InvalidCircuitDescriptor(s.to_string()))
    }
}

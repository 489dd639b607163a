//! This crate provides the engine independent description of logic circuits: the
//! built-in gate kernels and the templates composite circuits are flattened from.
//!
//! # Example
//!
//! ```
//! use gatesim_circuits::{GateType, TemplateBuilder, TemplateLibrary};
//!
//! let mut library = TemplateLibrary::new();
//!
//! let mut builder = TemplateBuilder::new("NAND2");
//! let and = builder.add_gate(GateType::And);
//! let not = builder.add_gate(GateType::Not);
//! builder.connect(and.output(0), not.input(0));
//! builder.expose_input(and.input(0), "a");
//! builder.expose_input(and.input(1), "b");
//! builder.expose_output(not.output(0), "q");
//!
//! let template = builder.build(&library).unwrap();
//! assert_eq!(template.input_count(), 2);
//! assert_eq!(template.output_count(), 1);
//!
//! library.insert(template).unwrap();
//! ```

#![deny(missing_docs, unreachable_pub, unused_must_use)]

mod builder;
pub(crate) mod components;
mod library;
pub mod template;

pub use builder::TemplateBuilder;
pub use components::{
    gate::{GateType, DISPLAY_PINS},
    GateRef, Pin, Sink, Source,
};
pub use library::{Resolved, TemplateLibrary};
pub use template::{BoundaryTerminal, GateDescriptor, Layout, Template, TemplateError, Wire};

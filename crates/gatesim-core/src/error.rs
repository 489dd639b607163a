use core::fmt;

use gatesim_circuits::TemplateError;

/// An error that can occur when operating on a [`Simulation`](crate::Simulation).
#[derive(Debug, thiserror::Error)]
#[error("circuit error: {kind}")]
pub struct CircuitError {
    kind: ErrorKind,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl CircuitError {
    pub(crate) fn new(kind: ErrorKind) -> Self {
        Self { kind, source: None }
    }

    pub(crate) fn new_with_source<E: Into<Box<dyn std::error::Error + Send + Sync>>>(
        kind: ErrorKind,
        source: E,
    ) -> Self {
        Self {
            kind,
            source: Some(source.into()),
        }
    }

    /// Returns the kind of the error.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }
}

impl From<TemplateError> for CircuitError {
    fn from(err: TemplateError) -> Self {
        let kind = match &err {
            TemplateError::InvalidCircuitDescriptor(_) => ErrorKind::InvalidCircuitDescriptor,
            _ => ErrorKind::InvalidTemplate,
        };

        Self::new_with_source(kind, err)
    }
}

/// The kind of a [`CircuitError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A template names a gate which is neither built in nor a known template.
    InvalidCircuitDescriptor,
    /// A template failed validation.
    InvalidTemplate,
    /// The input already has a connection.
    InputAlreadyConnected,
    /// The circuit does not exist.
    UnknownCircuit,
    /// The connection does not exist.
    UnknownConnection,
    /// The terminal does not exist.
    UnknownTerminal,
    /// The terminal or connection is internal to a composite.
    InternalTerminal,
    /// The circuit is not an `INPUT` gate.
    NotASwitch,
    /// The circuit is not a `DISPLAY` gate.
    NotADisplay,
    /// The circuit is part of a composite.
    NotTopLevel,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::InvalidCircuitDescriptor => write!(f, "invalid circuit descriptor"),
            ErrorKind::InvalidTemplate => write!(f, "invalid template"),
            ErrorKind::InputAlreadyConnected => write!(f, "input already connected"),
            ErrorKind::UnknownCircuit => write!(f, "unknown circuit"),
            ErrorKind::UnknownConnection => write!(f, "unknown connection"),
            ErrorKind::UnknownTerminal => write!(f, "unknown terminal"),
            ErrorKind::InternalTerminal => write!(f, "terminal is internal to a composite"),
            ErrorKind::NotASwitch => write!(f, "circuit is not an input gate"),
            ErrorKind::NotADisplay => write!(f, "circuit is not a display gate"),
            ErrorKind::NotTopLevel => write!(f, "circuit is part of a composite"),
        }
    }
}

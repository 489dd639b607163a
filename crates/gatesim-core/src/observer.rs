//! Terminal status notifications.

use crate::{InputId, OutputId};

/// Receives terminal level changes, e.g. to drive visuals.
///
/// Inputs are reported whenever an update is applied to them, outputs whenever a
/// recompute reports them as changed.
pub trait TerminalObserver {
    /// Called after an input has been set.
    fn input_changed(&mut self, input: InputId, powered: bool) {
        let _ = (input, powered);
    }

    /// Called after an output has been recomputed to a new or unrendered level.
    fn output_changed(&mut self, output: OutputId, powered: bool) {
        let _ = (output, powered);
    }
}

/// An observer which ignores all notifications.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl TerminalObserver for NoopObserver {}

/// A notification recorded by an [`EventLog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalEvent {
    /// An input was set.
    Input(InputId, bool),
    /// An output changed.
    Output(OutputId, bool),
}

/// An observer which records every notification.
#[derive(Debug, Default, Clone)]
pub struct EventLog {
    events: Vec<TerminalEvent>,
}

impl EventLog {
    /// Returns the recorded events.
    pub fn events(&self) -> &[TerminalEvent] {
        &self.events
    }

    /// Removes and returns the recorded events.
    pub fn drain(&mut self) -> Vec<TerminalEvent> {
        std::mem::take(&mut self.events)
    }
}

impl TerminalObserver for EventLog {
    fn input_changed(&mut self, input: InputId, powered: bool) {
        self.events.push(TerminalEvent::Input(input, powered));
    }

    fn output_changed(&mut self, output: OutputId, powered: bool) {
        self.events.push(TerminalEvent::Output(output, powered));
    }
}

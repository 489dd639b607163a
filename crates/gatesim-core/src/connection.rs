//! Wires between terminals.

use tracing::debug;

use crate::{
    CircuitError, CircuitId, ConnectPolicy, ConnectionId, ErrorKind, InputId, OutputId,
    Simulation, TerminalObserver,
};

/// A wire from an output to an input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Connection {
    /// Driven input.
    pub input: InputId,
    /// Driving output.
    pub output: OutputId,
    /// Composite the connection is internal to.
    pub owner: Option<CircuitId>,
}

impl<O: TerminalObserver> Simulation<O> {
    /// Connects an output to an input.
    ///
    /// The input takes the output's level immediately, its gate is re-evaluated and
    /// the cascade is scheduled. Terminals of a composite must be on its boundary.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InputAlreadyConnected`] if the input has a connection and
    /// the connect policy is [`ConnectPolicy::Reject`].
    pub fn connect(&mut self, input: InputId, output: OutputId) -> Result<ConnectionId, CircuitError> {
        self.check_input_exposed(input)?;
        self.check_output_exposed(output)?;

        let existing = self.input_state(input).and_then(|state| state.connection);
        if let Some(existing) = existing {
            match self.config.connect_policy {
                ConnectPolicy::Reject => {
                    return Err(CircuitError::new(ErrorKind::InputAlreadyConnected))
                }
                ConnectPolicy::Replace => {
                    debug!(connection = %existing, "replacing connection");
                    self.unlink(existing, true);
                }
            }
        }

        let powered = self
            .output_state(output)
            .map(|state| state.powered)
            .unwrap_or_default();
        self.update_circuit(powered, input, Some(output));

        let id = self.link(input, output, None);
        debug!(connection = %id, %input, %output, "connected");

        Ok(id)
    }

    /// Removes a connection.
    ///
    /// The input is unpowered immediately, its gate is re-evaluated and the cascade
    /// is scheduled. Updates still in flight along the connection are dropped.
    pub fn disconnect(&mut self, id: ConnectionId) -> Result<(), CircuitError> {
        let connection = self.connection(id)?;
        if connection
            .owner
            .is_some_and(|owner| self.circuits.contains_key(owner))
        {
            return Err(CircuitError::new(ErrorKind::InternalTerminal));
        }

        self.unlink(id, true);
        debug!(connection = %id, "disconnected");

        Ok(())
    }

    /// Returns a connection.
    pub fn connection(&self, id: ConnectionId) -> Result<&Connection, CircuitError> {
        self.connections
            .get(id)
            .ok_or_else(|| CircuitError::new(ErrorKind::UnknownConnection))
    }

    /// Returns the connection of an input.
    pub fn input_connection(&self, input: InputId) -> Result<Option<ConnectionId>, CircuitError> {
        self.input_state(input)
            .map(|state| state.connection)
            .ok_or_else(|| CircuitError::new(ErrorKind::UnknownTerminal))
    }

    /// Returns the connections of an output, in connection order.
    pub fn output_connections(&self, output: OutputId) -> Result<&[ConnectionId], CircuitError> {
        self.output_state(output)
            .map(|state| state.connections.as_slice())
            .ok_or_else(|| CircuitError::new(ErrorKind::UnknownTerminal))
    }

    /// Returns every connection touching the terminals a circuit exposes.
    pub fn connections_of(&self, id: CircuitId) -> Result<Vec<ConnectionId>, CircuitError> {
        let mut connections = Vec::new();
        for input in self.inputs(id)? {
            connections.extend(self.input_connection(input)?);
        }
        for output in self.outputs(id)? {
            connections.extend_from_slice(self.output_connections(output)?);
        }

        Ok(connections)
    }

    /// Registers a connection on both terminals without updating anything.
    pub(crate) fn link(&mut self, input: InputId, output: OutputId, owner: Option<CircuitId>) -> ConnectionId {
        let id = self.connections.insert(Connection {
            input,
            output,
            owner,
        });

        if let Some(state) = self.input_state_mut(input) {
            state.connection = Some(id);
            state.parent_output = Some(output);
        }

        if let Some(state) = self.output_state_mut(output) {
            state.connections.push(id);
            state.child_inputs.push(input);
        }

        id
    }

    /// Removes a connection from both terminals.
    ///
    /// With `propagate` the input is updated as unpowered, otherwise its state is
    /// reset without re-evaluating its gate.
    pub(crate) fn unlink(&mut self, id: ConnectionId, propagate: bool) -> Option<Connection> {
        let connection = self.connections.remove(id)?;

        if let Some(state) = self.output_state_mut(connection.output) {
            state.connections.retain(|c| *c != id);
            if let Some(pos) = state
                .child_inputs
                .iter()
                .position(|input| *input == connection.input)
            {
                state.child_inputs.remove(pos);
            }
        }

        if let Some(owner) = connection
            .owner
            .and_then(|owner| self.circuits.get_mut(owner))
            .and_then(|circuit| circuit.as_composite_mut())
        {
            owner.connections.retain(|c| *c != id);
        }

        if let Some(state) = self.input_state_mut(connection.input) {
            if state.connection == Some(id) {
                state.connection = None;
            }

            if propagate {
                self.update_circuit(false, connection.input, None);
            } else {
                state.powered = false;
                state.parent_output = None;
            }
        }

        Some(connection)
    }

    fn check_input_exposed(&self, input: InputId) -> Result<(), CircuitError> {
        if self.input_state(input).is_none() {
            return Err(CircuitError::new(ErrorKind::UnknownTerminal));
        }

        let owner = self.top_level_owner(input.circuit)?;
        if owner != input.circuit && !self.inputs(owner)?.contains(&input) {
            return Err(CircuitError::new(ErrorKind::InternalTerminal));
        }

        Ok(())
    }

    fn check_output_exposed(&self, output: OutputId) -> Result<(), CircuitError> {
        if self.output_state(output).is_none() {
            return Err(CircuitError::new(ErrorKind::UnknownTerminal));
        }

        let owner = self.top_level_owner(output.circuit)?;
        if owner != output.circuit && !self.outputs(owner)?.contains(&output) {
            return Err(CircuitError::new(ErrorKind::InternalTerminal));
        }

        Ok(())
    }
}

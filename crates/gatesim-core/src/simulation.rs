//! The simulation session.

use std::time::Duration;

use gatesim_circuits::{GateType, TemplateLibrary, DISPLAY_PINS};
use slotmap::SlotMap;
use tracing::{debug, trace};

use crate::{
    circuit::{Circuit, CircuitKind, Input, Output},
    connection::Connection,
    scheduler::{Batch, Scheduler, UpdateCall},
    CircuitError, CircuitId, ConnectionId, ErrorKind, InputId, NoopObserver, OutputId,
    SimulationConfig, TerminalObserver,
};

/// Why a scheduled update was dropped instead of applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Staleness {
    /// The input's gate no longer exists.
    Deleted,
    /// The input is no longer driven by the output the update came from.
    Disconnected,
    /// The input's gate is inside a composite which is being torn down.
    Dereferenced,
}

/// A circuit graph together with its scheduler.
///
/// All mutation and all application of scheduled updates happens through `&mut self`,
/// so the graph is only ever touched by one logical thread. See `gatesim-runtime` for
/// driving a simulation from wall-clock time.
#[derive(Debug)]
pub struct Simulation<O = NoopObserver> {
    pub(crate) config: SimulationConfig,
    pub(crate) library: TemplateLibrary,
    pub(crate) circuits: SlotMap<CircuitId, Circuit>,
    pub(crate) connections: SlotMap<ConnectionId, Connection>,
    pub(crate) scheduler: Scheduler,
    pub(crate) observer: O,
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new(SimulationConfig::default())
    }
}

impl Simulation {
    /// Creates a new simulation without an observer.
    pub fn new(config: SimulationConfig) -> Self {
        Self::with_observer(config, NoopObserver)
    }
}

impl<O: TerminalObserver> Simulation<O> {
    /// Creates a new simulation which reports terminal changes to `observer`.
    pub fn with_observer(config: SimulationConfig, observer: O) -> Self {
        Self {
            scheduler: Scheduler::new(config.clock_speed),
            library: TemplateLibrary::new().with_max_depth(config.max_template_depth),
            circuits: SlotMap::with_key(),
            connections: SlotMap::with_key(),
            config,
            observer,
        }
    }

    /// Replaces the template library.
    ///
    /// The library adopts the configured nesting limit.
    pub fn with_library(mut self, library: TemplateLibrary) -> Self {
        self.library = library.with_max_depth(self.config.max_template_depth);
        self
    }

    /// Returns the configuration.
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Returns the template library composites are instantiated from.
    pub fn library(&self) -> &TemplateLibrary {
        &self.library
    }

    /// Returns a mutable reference to the template library.
    pub fn library_mut(&mut self) -> &mut TemplateLibrary {
        &mut self.library
    }

    /// Returns the observer.
    pub fn observer(&self) -> &O {
        &self.observer
    }

    /// Returns a mutable reference to the observer.
    pub fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }

    /// Places a built-in gate.
    ///
    /// The gate is not evaluated until [`Simulation::update`] is called.
    pub fn add_gate(&mut self, ty: GateType) -> CircuitId {
        let id = self.circuits.insert(Circuit::gate(ty, false, None));
        debug!(circuit = %id, gate = %ty, "placed gate");
        id
    }

    /// Places an `INPUT` gate with the given stored level.
    pub fn add_switch(&mut self, powered: bool) -> CircuitId {
        let id = self
            .circuits
            .insert(Circuit::gate(GateType::Input, powered, None));
        debug!(circuit = %id, powered, "placed switch");
        id
    }

    /// Returns `true` if the circuit exists.
    pub fn contains(&self, id: CircuitId) -> bool {
        self.circuits.contains_key(id)
    }

    /// Returns the number of circuits, including the gates composites are flattened into.
    pub fn circuit_count(&self) -> usize {
        self.circuits.len()
    }

    /// Returns the number of connections, including internal ones.
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Returns the circuits which are not part of a composite.
    pub fn top_level(&self) -> Vec<CircuitId> {
        self.circuits
            .iter()
            .filter(|(_, circuit)| circuit.custom_parent.is_none())
            .map(|(id, _)| id)
            .collect()
    }

    /// Returns the display name of a circuit.
    pub fn circuit_name(&self, id: CircuitId) -> Result<&str, CircuitError> {
        Ok(&self.circuit(id)?.name)
    }

    /// Returns the gate type of a circuit, `None` for composites.
    pub fn gate_type(&self, id: CircuitId) -> Result<Option<GateType>, CircuitError> {
        Ok(self.circuit(id)?.as_gate().map(|gate| gate.ty))
    }

    /// Returns the inputs of a circuit.
    ///
    /// For a composite these are its boundary inputs in display order.
    pub fn inputs(&self, id: CircuitId) -> Result<Vec<InputId>, CircuitError> {
        Ok(match &self.circuit(id)?.kind {
            CircuitKind::Gate(gate) => (0..gate.inputs.len())
                .map(|slot| InputId { circuit: id, slot })
                .collect(),
            CircuitKind::Composite(composite) => composite.inputs.clone(),
        })
    }

    /// Returns the outputs of a circuit.
    ///
    /// For a composite these are its boundary outputs in display order.
    pub fn outputs(&self, id: CircuitId) -> Result<Vec<OutputId>, CircuitError> {
        Ok(match &self.circuit(id)?.kind {
            CircuitKind::Gate(gate) => (0..gate.outputs.len())
                .map(|slot| OutputId { circuit: id, slot })
                .collect(),
            CircuitKind::Composite(composite) => composite.outputs.clone(),
        })
    }

    /// Returns the level of an input.
    pub fn input_powered(&self, input: InputId) -> Result<bool, CircuitError> {
        self.input_state(input)
            .map(|state| state.powered)
            .ok_or_else(|| CircuitError::new(ErrorKind::UnknownTerminal))
    }

    /// Returns the level of an output.
    pub fn output_powered(&self, output: OutputId) -> Result<bool, CircuitError> {
        self.output_state(output)
            .map(|state| state.powered)
            .ok_or_else(|| CircuitError::new(ErrorKind::UnknownTerminal))
    }

    /// Returns the output currently driving an input.
    pub fn input_source(&self, input: InputId) -> Result<Option<OutputId>, CircuitError> {
        self.input_state(input)
            .map(|state| state.parent_output)
            .ok_or_else(|| CircuitError::new(ErrorKind::UnknownTerminal))
    }

    /// Returns the stored level of an `INPUT` gate.
    pub fn switch_level(&self, id: CircuitId) -> Result<bool, CircuitError> {
        match self.circuit(id)?.as_gate() {
            Some(gate) if gate.ty == GateType::Input => Ok(gate.switch),
            _ => Err(CircuitError::new(ErrorKind::NotASwitch)),
        }
    }

    /// Returns the pins of a `DISPLAY` gate as a byte, input 0 being the least
    /// significant bit.
    pub fn display_value(&self, id: CircuitId) -> Result<u8, CircuitError> {
        match self.circuit(id)?.as_gate() {
            Some(gate) if gate.ty == GateType::Display => Ok(gate
                .inputs
                .iter()
                .take(DISPLAY_PINS)
                .enumerate()
                .fold(0u8, |value, (bit, input)| value | (u8::from(input.powered) << bit))),
            _ => Err(CircuitError::new(ErrorKind::NotADisplay)),
        }
    }

    /// Returns the composite a circuit was flattened into.
    pub fn custom_parent(&self, id: CircuitId) -> Result<Option<CircuitId>, CircuitError> {
        Ok(self.circuit(id)?.custom_parent)
    }

    /// Returns the outermost composite containing a circuit, or the circuit itself if
    /// it is not part of a composite.
    pub fn top_level_owner(&self, id: CircuitId) -> Result<CircuitId, CircuitError> {
        let mut current = id;
        while let Some(parent) = self.circuit(current)?.custom_parent {
            current = parent;
        }
        Ok(current)
    }

    /// Re-evaluates a circuit.
    ///
    /// A gate runs its kernel and remembers which outputs changed for
    /// [`Simulation::update_children`]. A composite instead resets its unconnected
    /// boundary inputs, its logic lives in the gates it was flattened into.
    pub fn update(&mut self, id: CircuitId) -> Result<(), CircuitError> {
        match &self.circuit(id)?.kind {
            CircuitKind::Gate(_) => self.update_gate(id),
            CircuitKind::Composite(composite) => {
                let dangling: Vec<InputId> = composite
                    .inputs
                    .iter()
                    .copied()
                    .filter(|input| {
                        self.input_state(*input)
                            .is_some_and(|state| state.connection.is_none())
                    })
                    .collect();

                for input in dangling {
                    self.update_circuit(false, input, None);
                }
            }
        }

        Ok(())
    }

    /// Schedules the cascade of the outputs the last [`Simulation::update`] reported
    /// as changed.
    ///
    /// Composites never report changes themselves, this is a no-op for them.
    pub fn update_children(&mut self, id: CircuitId) -> Result<(), CircuitError> {
        self.circuit(id)?;
        self.update_gate_children(id);
        Ok(())
    }

    /// Sets the stored level of an `INPUT` gate and propagates it.
    pub fn set_switch(&mut self, id: CircuitId, powered: bool) -> Result<(), CircuitError> {
        match self
            .circuits
            .get_mut(id)
            .ok_or_else(|| CircuitError::new(ErrorKind::UnknownCircuit))?
            .as_gate_mut()
        {
            Some(gate) if gate.ty == GateType::Input => gate.switch = powered,
            _ => return Err(CircuitError::new(ErrorKind::NotASwitch)),
        }

        debug!(circuit = %id, powered, "switch set");

        self.update_gate(id);
        self.update_gate_children(id);

        Ok(())
    }

    /// Flips the stored level of an `INPUT` gate, returning the new level.
    pub fn toggle_switch(&mut self, id: CircuitId) -> Result<bool, CircuitError> {
        let powered = !self.switch_level(id)?;
        self.set_switch(id, powered)?;
        Ok(powered)
    }

    /// Returns the scheduler.
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Returns the current logical time.
    pub fn now(&self) -> Duration {
        self.scheduler.now()
    }

    /// Returns the number of batches waiting to be applied.
    pub fn pending_batches(&self) -> usize {
        self.scheduler.pending()
    }

    /// Schedules a batch of update calls to be applied `delay` from now.
    pub fn schedule(&mut self, delay: Duration, batch: Batch) {
        self.scheduler.schedule(delay, batch);
    }

    /// Schedules a batch of update calls to be applied one clock tick from now.
    pub fn initiate_update_calls(&mut self, batch: Batch) {
        self.scheduler.initiate(batch);
    }

    /// Applies every batch due at or before `now`, returning how many were applied.
    ///
    /// Batches scheduled while applying are timed from the due time of the batch
    /// being applied, and are applied in the same call if they fall due by `now`.
    #[tracing::instrument(level = "trace", skip(self))]
    pub fn advance_to(&mut self, now: Duration) -> usize {
        let mut applied = 0;
        while let Some(batch) = self.scheduler.pop_due(now) {
            self.apply_batch(batch);
            applied += 1;
        }
        self.scheduler.set_now(now);

        applied
    }

    /// Advances the clock by `elapsed`, see [`Simulation::advance_to`].
    pub fn advance_by(&mut self, elapsed: Duration) -> usize {
        let now = self.scheduler.now().saturating_add(elapsed);
        self.advance_to(now)
    }

    /// Advances the clock to the next due batch and applies it, returning `false` if
    /// nothing was pending.
    pub fn step(&mut self) -> bool {
        match self.scheduler.next_due() {
            Some(due) => self.advance_to(due) > 0,
            None => false,
        }
    }

    /// Steps until no batches are pending or `max_batches` have been applied.
    ///
    /// Circuits with feedback loops may never become idle, hence the limit.
    pub fn run_until_idle(&mut self, max_batches: usize) -> usize {
        let mut applied = 0;
        while applied < max_batches {
            let Some(due) = self.scheduler.next_due() else {
                break;
            };
            applied += self.advance_to(due);
        }

        applied
    }

    /// Destroys a top-level circuit, disconnecting every terminal it owns.
    ///
    /// Circuits inside a composite cannot be destroyed individually.
    pub fn destroy(&mut self, id: CircuitId) -> Result<(), CircuitError> {
        let circuit = self.circuit(id)?;
        if circuit.custom_parent.is_some() {
            return Err(CircuitError::new(ErrorKind::NotTopLevel));
        }

        debug!(circuit = %id, name = %circuit.name, "destroying circuit");
        self.teardown(id);

        Ok(())
    }

    /// Destroys every circuit and drops every pending batch.
    ///
    /// Ids issued before clearing stay unknown afterwards.
    pub fn clear(&mut self) {
        debug!(circuits = self.circuits.len(), "clearing simulation");
        self.circuits.clear();
        self.connections.clear();
        self.scheduler.clear();
    }

    pub(crate) fn teardown(&mut self, id: CircuitId) {
        let Some(circuit) = self.circuits.get_mut(id) else {
            return;
        };

        match &mut circuit.kind {
            CircuitKind::Composite(composite) => {
                composite.should_dereference = true;
                let children = composite.children.clone();

                for child in children {
                    self.teardown(child);
                }
            }
            CircuitKind::Gate(gate) => {
                let downstream: Vec<ConnectionId> = gate
                    .outputs
                    .iter()
                    .flat_map(|output| output.connections.iter().copied())
                    .collect();
                let upstream: Vec<ConnectionId> = gate
                    .inputs
                    .iter()
                    .filter_map(|input| input.connection)
                    .collect();

                for connection in downstream {
                    let propagate = self
                        .connections
                        .get(connection)
                        .is_some_and(|c| c.input.circuit != id && !self.is_dereferenced(c.input.circuit));
                    self.unlink(connection, propagate);
                }

                for connection in upstream {
                    self.unlink(connection, false);
                }
            }
        }

        self.circuits.remove(id);
    }

    /// Sets an input and re-evaluates its gate, scheduling the resulting cascade.
    pub(crate) fn update_circuit(&mut self, powered: bool, input: InputId, output: Option<OutputId>) {
        let Some(state) = self.input_state_mut(input) else {
            return;
        };

        state.powered = powered;
        state.parent_output = output;
        self.observer.input_changed(input, powered);

        self.update_gate(input.circuit);
        self.update_gate_children(input.circuit);
    }

    pub(crate) fn update_gate(&mut self, id: CircuitId) {
        let Some(gate) = self.circuits.get_mut(id).and_then(Circuit::as_gate_mut) else {
            return;
        };

        let changed = gate.recompute();
        for &slot in &changed {
            let output = &mut gate.outputs[slot];
            output.rendered = Some(output.powered);
            self.observer
                .output_changed(OutputId { circuit: id, slot }, output.powered);
        }
        gate.changed = changed;
    }

    pub(crate) fn update_gate_children(&mut self, id: CircuitId) {
        let Some(gate) = self.circuits.get(id).and_then(Circuit::as_gate) else {
            return;
        };

        let batch: Batch = gate
            .changed
            .iter()
            .flat_map(|&slot| {
                let output = &gate.outputs[slot];
                let source = OutputId { circuit: id, slot };
                output.child_inputs.iter().map(move |&input| UpdateCall {
                    powered: output.powered,
                    input,
                    output: source,
                })
            })
            .collect();

        self.scheduler.initiate(batch);
    }

    fn apply_batch(&mut self, batch: Batch) {
        for call in batch {
            if let Some(reason) = self.staleness(&call) {
                trace!(input = %call.input, output = %call.output, ?reason, "dropped stale update");
                continue;
            }

            trace!(input = %call.input, output = %call.output, powered = call.powered, "applying update");
            self.update_circuit(call.powered, call.input, Some(call.output));
        }
    }

    fn staleness(&self, call: &UpdateCall) -> Option<Staleness> {
        let Some(input) = self.input_state(call.input) else {
            return Some(Staleness::Deleted);
        };

        if input.parent_output != Some(call.output) {
            return Some(Staleness::Disconnected);
        }

        if self.is_dereferenced(call.input.circuit) {
            return Some(Staleness::Dereferenced);
        }

        None
    }

    /// Returns `true` if the circuit or any composite containing it is gone or
    /// tombstoned.
    pub(crate) fn is_dereferenced(&self, id: CircuitId) -> bool {
        let mut current = id;
        loop {
            let Some(circuit) = self.circuits.get(current) else {
                return true;
            };

            if circuit
                .as_composite()
                .is_some_and(|composite| composite.should_dereference)
            {
                return true;
            }

            match circuit.custom_parent {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    pub(crate) fn circuit(&self, id: CircuitId) -> Result<&Circuit, CircuitError> {
        self.circuits
            .get(id)
            .ok_or_else(|| CircuitError::new(ErrorKind::UnknownCircuit))
    }

    pub(crate) fn input_state(&self, input: InputId) -> Option<&Input> {
        self.circuits
            .get(input.circuit)?
            .as_gate()?
            .inputs
            .get(input.slot)
    }

    pub(crate) fn input_state_mut(&mut self, input: InputId) -> Option<&mut Input> {
        self.circuits
            .get_mut(input.circuit)?
            .as_gate_mut()?
            .inputs
            .get_mut(input.slot)
    }

    pub(crate) fn output_state(&self, output: OutputId) -> Option<&Output> {
        self.circuits
            .get(output.circuit)?
            .as_gate()?
            .outputs
            .get(output.slot)
    }

    pub(crate) fn output_state_mut(&mut self, output: OutputId) -> Option<&mut Output> {
        self.circuits
            .get_mut(output.circuit)?
            .as_gate_mut()?
            .outputs
            .get_mut(output.slot)
    }
}

#[cfg(test)]
mod tests {
    use gatesim_circuits::TemplateBuilder;

    use crate::{EventLog, TerminalEvent};

    use super::*;

    const TICK: Duration = Duration::from_millis(100);

    #[test]
    fn test_update_notifies_outputs_once() {
        let mut sim = Simulation::with_observer(SimulationConfig::default(), EventLog::default());
        let not = sim.add_gate(GateType::Not);
        let out = OutputId {
            circuit: not,
            slot: 0,
        };

        sim.update(not).unwrap();
        sim.update(not).unwrap();

        assert_eq!(sim.observer().events(), &[TerminalEvent::Output(out, true)]);
    }

    #[test]
    fn test_update_children_without_connections_schedules_nothing() {
        let mut sim = Simulation::default();
        let switch = sim.add_switch(true);

        sim.update(switch).unwrap();
        sim.update_children(switch).unwrap();

        assert_eq!(sim.pending_batches(), 0);
    }

    #[test]
    fn test_switch_api_rejects_other_gates() {
        let mut sim = Simulation::default();
        let and = sim.add_gate(GateType::And);

        assert_eq!(
            sim.set_switch(and, true).unwrap_err().kind(),
            &ErrorKind::NotASwitch
        );
        assert_eq!(
            sim.display_value(and).unwrap_err().kind(),
            &ErrorKind::NotADisplay
        );
    }

    #[test]
    fn test_toggle_switch() {
        let mut sim = Simulation::default();
        let switch = sim.add_switch(false);

        assert!(sim.toggle_switch(switch).unwrap());
        assert!(sim.switch_level(switch).unwrap());
        assert!(sim
            .output_powered(OutputId {
                circuit: switch,
                slot: 0
            })
            .unwrap());
        assert!(!sim.toggle_switch(switch).unwrap());
    }

    #[test]
    fn test_clock_advances_without_batches() {
        let mut sim = Simulation::default();

        assert_eq!(sim.advance_by(TICK), 0);
        assert_eq!(sim.advance_by(TICK), 0);
        assert_eq!(sim.now(), 2 * TICK);
        assert!(!sim.step());
    }

    #[test]
    fn test_ids_stay_unknown_after_clear() {
        let mut sim = Simulation::default();
        let old = sim.add_gate(GateType::And);

        sim.clear();
        let new = sim.add_switch(true);

        assert_ne!(old, new);
        assert!(!sim.contains(old));
        assert_eq!(
            sim.circuit_name(old).unwrap_err().kind(),
            &ErrorKind::UnknownCircuit
        );
        assert_eq!(sim.circuit_name(new).unwrap(), "INPUT");
    }

    #[test]
    fn test_updates_into_tombstoned_composite_are_dropped() {
        let mut sim = Simulation::default();
        let mut builder = TemplateBuilder::new("BUFFER_PAIR");
        let first = builder.add_gate(GateType::Buffer);
        let second = builder.add_gate(GateType::Buffer);
        builder.connect(first.output(0), second.input(0));
        let template = builder.build(sim.library()).unwrap();

        let composite = sim.add_template(&template).unwrap();
        let children = sim.children(composite).unwrap().to_vec();
        let call = UpdateCall {
            powered: true,
            input: InputId {
                circuit: children[1],
                slot: 0,
            },
            output: OutputId {
                circuit: children[0],
                slot: 0,
            },
        };
        assert_eq!(sim.staleness(&call), None);

        sim.circuits
            .get_mut(composite)
            .and_then(Circuit::as_composite_mut)
            .unwrap()
            .should_dereference = true;

        assert_eq!(sim.staleness(&call), Some(Staleness::Dereferenced));
        sim.apply_batch(vec![call]);
        assert!(!sim.input_powered(call.input).unwrap());
    }

    #[test]
    fn test_library_adopts_configured_depth() {
        let config = SimulationConfig::builder()
            .max_template_depth(1)
            .build()
            .unwrap();
        let mut library = TemplateLibrary::new();

        let mut builder = TemplateBuilder::new("INNER");
        builder.add_gate(GateType::Not);
        library.insert(builder.build(&library).unwrap()).unwrap();

        let sim = Simulation::new(config).with_library(library);

        let mut builder = TemplateBuilder::new("OUTER");
        builder.add_custom("INNER");
        assert!(builder.build(sim.library()).is_err());
    }

    #[test]
    fn test_destroyed_circuit_is_unknown() {
        let mut sim = Simulation::default();
        let and = sim.add_gate(GateType::And);

        sim.destroy(and).unwrap();

        assert!(!sim.contains(and));
        assert_eq!(
            sim.destroy(and).unwrap_err().kind(),
            &ErrorKind::UnknownCircuit
        );
        assert_eq!(sim.circuit_count(), 0);
    }
}

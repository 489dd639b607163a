use gatesim_circuits::{GateType, TemplateBuilder, TemplateLibrary};
use gatesim_core::{
    CircuitId, ConnectPolicy, ErrorKind, InputId, OutputId, Simulation, SimulationConfig,
};
use pretty_assertions::assert_eq;

fn output(circuit: CircuitId) -> OutputId {
    OutputId { circuit, slot: 0 }
}

fn library() -> TemplateLibrary {
    let mut library = TemplateLibrary::new();

    let mut builder = TemplateBuilder::new("NAND2");
    let and = builder.add_gate(GateType::And);
    let not = builder.add_gate(GateType::Not);
    builder.connect(and.output(0), not.input(0));
    builder.expose_input(and.input(0), "a");
    builder.expose_input(and.input(1), "b");
    builder.expose_output(not.output(0), "q");
    library.insert(builder.build(&library).unwrap()).unwrap();

    let mut builder = TemplateBuilder::new("NOT_FROM_NAND");
    let fan = builder.add_gate(GateType::Buffer);
    let nand = builder.add_custom("NAND2");
    builder.connect(fan.output(0), nand.input(0));
    builder.connect(fan.output(0), nand.input(1));
    builder.expose_input(fan.input(0), "a");
    builder.expose_output(nand.output(0), "q");
    library.insert(builder.build(&library).unwrap()).unwrap();

    library
}

fn simulation() -> Simulation {
    Simulation::default().with_library(library())
}

fn switch(sim: &mut Simulation) -> CircuitId {
    let id = sim.add_switch(false);
    sim.update(id).unwrap();
    id
}

#[test]
fn test_composite_behaves_like_its_gates() {
    let mut sim = simulation();
    let composite = sim.add_custom("NAND2").unwrap();
    let nand = sim.add_gate(GateType::Nand);
    sim.update(nand).unwrap();

    assert_eq!(sim.inputs(composite).unwrap().len(), 2);
    assert_eq!(sim.outputs(composite).unwrap().len(), 1);
    assert_eq!(sim.circuit_name(composite).unwrap(), "NAND2");
    assert_eq!(sim.gate_type(composite).unwrap(), None);

    let a = switch(&mut sim);
    let b = switch(&mut sim);
    let composite_inputs = sim.inputs(composite).unwrap();
    sim.connect(composite_inputs[0], output(a)).unwrap();
    sim.connect(composite_inputs[1], output(b)).unwrap();
    sim.connect(InputId { circuit: nand, slot: 0 }, output(a)).unwrap();
    sim.connect(InputId { circuit: nand, slot: 1 }, output(b)).unwrap();

    let q = sim.outputs(composite).unwrap()[0];
    for (la, lb) in [(false, false), (false, true), (true, false), (true, true)] {
        sim.set_switch(a, la).unwrap();
        sim.set_switch(b, lb).unwrap();
        sim.run_until_idle(100);

        assert_eq!(
            sim.output_powered(q).unwrap(),
            sim.output_powered(output(nand)).unwrap(),
            "NAND2({la}, {lb})"
        );
    }
}

#[test]
fn test_nested_composite_flattens_recursively() {
    let mut sim = simulation();
    let not = sim.add_custom("NOT_FROM_NAND").unwrap();
    sim.run_until_idle(100);

    // The composite, its buffer, the nested composite and its two gates.
    assert_eq!(sim.circuit_count(), 5);
    assert_eq!(sim.internal_connections(not).unwrap().len(), 3);
    assert_eq!(sim.input_labels(not).unwrap(), ["a".to_string()]);

    let source = switch(&mut sim);
    let a = sim.inputs(not).unwrap()[0];
    let q = sim.outputs(not).unwrap()[0];
    sim.connect(a, output(source)).unwrap();
    sim.run_until_idle(100);
    assert!(sim.output_powered(q).unwrap());

    sim.set_switch(source, true).unwrap();
    sim.run_until_idle(100);
    assert!(!sim.output_powered(q).unwrap());

    let nested = sim.children(not).unwrap()[1];
    assert_eq!(sim.custom_parent(nested).unwrap(), Some(not));
    assert_eq!(sim.top_level_owner(q.circuit).unwrap(), not);
}

#[test]
fn test_teardown_severs_everything() {
    let mut sim = simulation();
    let composite = sim.add_custom("NOT_FROM_NAND").unwrap();
    let source = switch(&mut sim);
    let sink = sim.add_gate(GateType::Buffer);
    sim.update(sink).unwrap();

    sim.connect(sim.inputs(composite).unwrap()[0], output(source)).unwrap();
    sim.connect(
        InputId {
            circuit: sink,
            slot: 0,
        },
        sim.outputs(composite).unwrap()[0],
    )
    .unwrap();
    sim.run_until_idle(100);
    assert!(sim.output_powered(output(sink)).unwrap());

    // Leave updates in flight towards the interior.
    sim.set_switch(source, true).unwrap();
    sim.destroy(composite).unwrap();

    assert_eq!(sim.connection_count(), 0);
    assert_eq!(sim.circuit_count(), 2);
    assert!(!sim.output_powered(output(sink)).unwrap());
    assert!(sim.output_connections(output(source)).unwrap().is_empty());

    sim.run_until_idle(100);
    assert_eq!(sim.pending_batches(), 0);
    assert!(!sim.output_powered(output(sink)).unwrap());
}

#[test]
fn test_destroy_before_internal_levels_settle() {
    let mut sim = simulation();
    let composite = sim.add_custom("NAND2").unwrap();
    assert_eq!(sim.pending_batches(), 1);

    sim.destroy(composite).unwrap();

    assert_eq!(sim.run_until_idle(100), 1);
    assert_eq!(sim.circuit_count(), 0);
    assert_eq!(sim.connection_count(), 0);
}

#[test]
fn test_inner_circuits_cannot_be_destroyed() {
    let mut sim = simulation();
    let composite = sim.add_custom("NAND2").unwrap();
    let inner = sim.children(composite).unwrap()[0];

    let err = sim.destroy(inner).unwrap_err();

    assert_eq!(err.kind(), &ErrorKind::NotTopLevel);
    assert!(sim.contains(inner));
}

#[test]
fn test_internal_terminals_are_hidden() {
    let mut sim = simulation();
    let composite = sim.add_custom("NAND2").unwrap();
    let source = switch(&mut sim);
    let not = sim.children(composite).unwrap()[1];

    let err = sim
        .connect(InputId { circuit: not, slot: 0 }, output(source))
        .unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::InternalTerminal);

    let internal = sim.internal_connections(composite).unwrap()[0];
    let err = sim.disconnect(internal).unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::InternalTerminal);
}

#[test]
fn test_double_connect_follows_policy() {
    let mut sim = simulation();
    let composite = sim.add_custom("NAND2").unwrap();
    let a = switch(&mut sim);
    let b = switch(&mut sim);
    let input = sim.inputs(composite).unwrap()[0];

    sim.connect(input, output(a)).unwrap();
    let err = sim.connect(input, output(b)).unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::InputAlreadyConnected);

    let config = SimulationConfig::builder()
        .connect_policy(ConnectPolicy::Replace)
        .build()
        .unwrap();
    let mut sim = Simulation::new(config).with_library(library());
    let composite = sim.add_custom("NAND2").unwrap();
    let a = switch(&mut sim);
    let b = switch(&mut sim);
    let input = sim.inputs(composite).unwrap()[0];

    sim.connect(input, output(a)).unwrap();
    let replacement = sim.connect(input, output(b)).unwrap();

    assert_eq!(sim.input_connection(input).unwrap(), Some(replacement));
    assert!(sim.output_connections(output(a)).unwrap().is_empty());
}

#[test]
fn test_update_resets_dangling_boundary_inputs() {
    let mut sim = simulation();
    let composite = sim.add_custom("NAND2").unwrap();
    let source = switch(&mut sim);
    let inputs = sim.inputs(composite).unwrap();
    let (a, b) = (inputs[0], inputs[1]);
    sim.connect(a, output(source)).unwrap();

    sim.update(composite).unwrap();
    sim.update_children(composite).unwrap();

    assert_eq!(sim.input_source(b).unwrap(), None);
    assert!(!sim.input_powered(b).unwrap());
    assert_eq!(sim.input_source(a).unwrap(), Some(output(source)));
}

#[test]
fn test_template_in_use_cannot_be_removed() {
    let mut sim = simulation();

    assert!(sim.library_mut().remove("NAND2").is_err());
    assert!(sim.library_mut().remove("NOT_FROM_NAND").is_ok());
    assert!(sim.library_mut().remove("NAND2").is_ok());
    assert_eq!(
        sim.add_custom("NAND2").unwrap_err().kind(),
        &ErrorKind::InvalidCircuitDescriptor
    );
}

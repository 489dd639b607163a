use criterion::{black_box, criterion_group, criterion_main, Criterion};
use gatesim_circuits::{GateType, TemplateBuilder, TemplateLibrary};
use gatesim_core::{CircuitId, InputId, OutputId, Simulation};

fn chain(length: usize) -> (Simulation, CircuitId) {
    let mut sim = Simulation::default();
    let source = sim.add_switch(false);
    sim.update(source).unwrap();

    let mut previous = source;
    for _ in 0..length {
        let not = sim.add_gate(GateType::Not);
        sim.update(not).unwrap();
        sim.connect(
            InputId {
                circuit: not,
                slot: 0,
            },
            OutputId {
                circuit: previous,
                slot: 0,
            },
        )
        .unwrap();
        previous = not;
    }
    sim.run_until_idle(usize::MAX);

    (sim, source)
}

fn adder_library() -> TemplateLibrary {
    let mut library = TemplateLibrary::new();

    let mut builder = TemplateBuilder::new("HALF_ADDER");
    let a = builder.add_gate(GateType::Buffer);
    let b = builder.add_gate(GateType::Buffer);
    let xor = builder.add_gate(GateType::Xor);
    let and = builder.add_gate(GateType::And);
    builder.connect(a.output(0), xor.input(0));
    builder.connect(b.output(0), xor.input(1));
    builder.connect(a.output(0), and.input(0));
    builder.connect(b.output(0), and.input(1));
    library.insert(builder.build(&library).unwrap()).unwrap();

    library
}

fn criterion_benchmark(c: &mut Criterion) {
    let length = 1024;

    c.bench_function("toggle_not_chain", move |bench| {
        let (mut sim, source) = chain(length);
        bench.iter(|| {
            sim.toggle_switch(source).unwrap();
            black_box(sim.run_until_idle(usize::MAX))
        })
    });

    let library = adder_library();
    c.bench_function("place_and_destroy_composite", move |bench| {
        let mut sim = Simulation::default().with_library(library.clone());
        bench.iter(|| {
            let id = sim.add_custom("HALF_ADDER").unwrap();
            sim.run_until_idle(usize::MAX);
            sim.destroy(id).unwrap();
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);

use std::time::Duration;

use futures::channel::oneshot;
use gatesim_core::{
    CircuitError, CircuitId, ConnectionId, InputId, NoopObserver, OutputId, Simulation,
    TerminalObserver,
};
use tokio::{
    sync::mpsc,
    task::{JoinError, JoinHandle},
    time::{self, Instant, MissedTickBehavior},
};
use tracing::{debug, trace};

use crate::RuntimeConfig;

type Call<O> = Box<dyn FnOnce(&mut Simulation<O>) + Send>;

enum Message<O> {
    Call(Call<O>),
    Shutdown,
}

/// An error that can occur when talking to a running simulation.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// The simulation task is gone.
    #[error("simulation task is closed")]
    Closed,
    /// The simulation task panicked or was cancelled.
    #[error("simulation task failed: {0}")]
    Task(#[from] JoinError),
    /// The simulation rejected the operation.
    #[error(transparent)]
    Circuit(#[from] CircuitError),
}

/// Spawns simulations onto the tokio runtime.
#[derive(Debug)]
pub struct Runtime;

impl Runtime {
    /// Moves a simulation onto a new task and returns a handle to it.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a tokio runtime.
    pub fn spawn<O>(simulation: Simulation<O>, config: RuntimeConfig) -> SimulationHandle<O>
    where
        O: TerminalObserver + Send + 'static,
    {
        let (sender, receiver) = mpsc::unbounded_channel();
        let task = tokio::spawn(run(simulation, config, receiver));

        SimulationHandle { sender, task }
    }
}

async fn run<O: TerminalObserver>(
    mut simulation: Simulation<O>,
    config: RuntimeConfig,
    mut receiver: mpsc::UnboundedReceiver<Message<O>>,
) -> Simulation<O> {
    let start = Instant::now();
    let origin = simulation.now();

    let mut interval = time::interval(config.tick);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    debug!(tick = ?config.tick, "simulation task started");

    loop {
        tokio::select! {
            biased;
            _ = interval.tick() => catch_up(&mut simulation, origin + start.elapsed()),
            message = receiver.recv() => match message {
                Some(Message::Call(call)) => {
                    // Closures always see the clock caught up, also while calls keep
                    // the tick from being polled.
                    catch_up(&mut simulation, origin + start.elapsed());
                    call(&mut simulation)
                }
                Some(Message::Shutdown) | None => break,
            },
        }
    }

    debug!(now = ?simulation.now(), "simulation task stopped");

    simulation
}

fn catch_up<O: TerminalObserver>(simulation: &mut Simulation<O>, now: Duration) {
    let applied = simulation.advance_to(now);
    if applied > 0 {
        trace!(applied, now = ?simulation.now(), "advanced simulation");
    }
}

/// A handle to a simulation running on its own task.
#[derive(Debug)]
pub struct SimulationHandle<O = NoopObserver> {
    sender: mpsc::UnboundedSender<Message<O>>,
    task: JoinHandle<Simulation<O>>,
}

impl<O> SimulationHandle<O>
where
    O: TerminalObserver + Send + 'static,
{
    /// Runs a closure on the simulation task and returns its output.
    pub async fn call<F, R>(&self, f: F) -> Result<R, RuntimeError>
    where
        F: FnOnce(&mut Simulation<O>) -> R + Send + 'static,
        R: Send + 'static,
    {
        let (sender, receiver) = oneshot::channel();
        self.sender
            .send(Message::Call(Box::new(move |simulation| {
                _ = sender.send(f(simulation));
            })))
            .map_err(|_| RuntimeError::Closed)?;

        receiver.await.map_err(|_| RuntimeError::Closed)
    }

    /// Connects an output to an input, see [`Simulation::connect`].
    pub async fn connect(&self, input: InputId, output: OutputId) -> Result<ConnectionId, RuntimeError> {
        Ok(self
            .call(move |simulation| simulation.connect(input, output))
            .await??)
    }

    /// Removes a connection, see [`Simulation::disconnect`].
    pub async fn disconnect(&self, id: ConnectionId) -> Result<(), RuntimeError> {
        Ok(self
            .call(move |simulation| simulation.disconnect(id))
            .await??)
    }

    /// Sets the level of an `INPUT` gate, see [`Simulation::set_switch`].
    pub async fn set_switch(&self, id: CircuitId, powered: bool) -> Result<(), RuntimeError> {
        Ok(self
            .call(move |simulation| simulation.set_switch(id, powered))
            .await??)
    }

    /// Returns the current level of every output of a circuit.
    pub async fn snapshot_outputs(&self, id: CircuitId) -> Result<Vec<(OutputId, bool)>, RuntimeError> {
        Ok(self
            .call(move |simulation| {
                simulation
                    .outputs(id)?
                    .into_iter()
                    .map(|output| Ok((output, simulation.output_powered(output)?)))
                    .collect::<Result<Vec<_>, CircuitError>>()
            })
            .await??)
    }

    /// Stops the simulation task and returns the simulation.
    ///
    /// Closures sent before the shutdown still run.
    pub async fn shutdown(self) -> Result<Simulation<O>, RuntimeError> {
        // The task may already be gone, awaiting it reports why.
        _ = self.sender.send(Message::Shutdown);

        Ok(self.task.await?)
    }
}

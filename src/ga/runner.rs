//! Evolution engine.
//!
//! [`Engine`] owns the configuration, the random generator and, while
//! running, the live [`Population`]. It moves through
//! `Initializing → Running → (Completed | Cancelled | Failed)`:
//!
//! - **Initializing**: build the city map and `pop_cap` random tours, rank
//! - **Running**: evolve one generation, emit a snapshot of the best tour on
//!   stat periods, sleep for the configured delay, repeat
//! - **Completed**: emit the sentinel snapshot once
//! - **Cancelled**: cancellation seen while emitting; no sentinel
//! - **Failed**: a corrupt tour halted the run
//!
//! The current state is published through the snapshot exchange
//! ([`EngineHandle::state`]); the terminal one is also reported by
//! [`RunOutcome`]. Only clones of tours ever leave the engine.

use super::config::GeneConfig;
use super::population::Population;
use super::stream::{snapshot_channel, CancelToken, SnapshotSender, SnapshotStream};
use crate::error::{ConfigError, EngineError, EvolveResult, TourError};
use crate::random::{rng_from_seed, EvolveRng};
use crate::tsp::{CityMap, Tour};
use rand::Rng;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info, instrument, trace};

/// Name of the background thread started by [`Engine::spawn`].
pub const ENGINE_THREAD_NAME: &str = "tsp-evolve-engine";

/// Snapshot of the best tour after a generation.
#[derive(Debug, Clone)]
pub struct GenerationStats {
    /// Zero-based generation index, or [`SENTINEL`](Self::SENTINEL) for the
    /// final snapshot of a completed run.
    pub generation: i64,

    /// Independent copy of the best tour.
    ///
    /// For the sentinel this is the best tour of the final generation.
    pub best: Tour,
}

impl GenerationStats {
    /// Generation index marking the end of a completed run.
    pub const SENTINEL: i64 = -1;

    pub fn is_sentinel(&self) -> bool {
        self.generation == Self::SENTINEL
    }
}

/// Lifecycle state of an [`Engine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineState {
    #[default]
    Initializing,
    Running,
    Completed,
    Cancelled,
    Failed,
}

/// Summary of a finished (completed or cancelled) run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// [`EngineState::Completed`] or [`EngineState::Cancelled`].
    pub state: EngineState,

    /// Number of generations fully executed.
    pub generations: usize,

    /// Best tour of the last executed generation.
    pub best: Tour,

    /// Cost of `best`.
    pub best_cost: f64,
}

/// Runs the genetic algorithm for one configuration.
///
/// # Usage
///
/// ```
/// use tsp_evolve::ga::{Engine, GeneConfig};
///
/// let config = GeneConfig::circle()
///     .with_city_count(6)
///     .with_pop_cap(20)
///     .with_max_generations(10)
///     .with_stat_period(0)
///     .with_seed(42);
///
/// let handle = Engine::new(config).unwrap().spawn().unwrap();
/// let generations: Vec<i64> = handle.stream.iter().map(|s| s.generation).collect();
/// assert_eq!(generations.len(), 11);
/// assert_eq!(generations.last(), Some(&-1));
/// ```
#[derive(Debug)]
pub struct Engine<R: Rng = EvolveRng> {
    config: GeneConfig,
    rng: R,
}

impl Engine {
    /// Validates `config` and seeds the generator from `config.seed`.
    pub fn new(config: GeneConfig) -> Result<Self, ConfigError> {
        let rng = rng_from_seed(config.seed);
        Self::with_rng(config, rng)
    }
}

impl<R: Rng> Engine<R> {
    /// Validates `config` and uses `rng` for every random decision.
    pub fn with_rng(config: GeneConfig, rng: R) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config, rng })
    }

    pub fn config(&self) -> &GeneConfig {
        &self.config
    }

    /// Runs the generation loop on the calling thread.
    ///
    /// Snapshots and state changes go through `sender`; cancellation is
    /// observed whenever a snapshot is emitted. The sender is dropped on
    /// return, which ends the consumer's stream.
    ///
    /// # Errors
    ///
    /// [`EngineError::Tour`] if a corrupt tour is detected. The run stops
    /// immediately and no sentinel is emitted.
    #[instrument(
        level = "info",
        skip_all,
        fields(
            cities = self.config.city_count,
            population = self.config.pop_cap,
            layout = ?self.config.layout(),
        )
    )]
    pub fn run(mut self, sender: SnapshotSender) -> EvolveResult<RunOutcome> {
        match self.evolve(&sender) {
            Ok(outcome) => {
                info!(
                    state = ?outcome.state,
                    generations = outcome.generations,
                    best_cost = outcome.best_cost,
                    "evolution finished"
                );
                Ok(outcome)
            }
            Err(err) => {
                sender.set_state(EngineState::Failed);
                error!(error = %err, "evolution halted");
                Err(err.into())
            }
        }
    }

    fn evolve(&mut self, sender: &SnapshotSender) -> Result<RunOutcome, TourError> {
        sender.set_state(EngineState::Initializing);
        let config = self.config.clone();

        let cities = CityMap::generate(config.layout(), config.city_count, &mut self.rng);
        let mut population = Population::random(cities, config.pop_cap, &mut self.rng);
        population.rank()?;

        info!(
            generations = config.max_generations,
            stat_period = config.stat_period,
            "evolution started"
        );
        sender.set_state(EngineState::Running);

        let mut generations = 0;
        for generation in 0..config.max_generations {
            population.evolve(&config, &mut self.rng)?;
            let best = best_of(&population);
            trace!(generation, cost = ?best.cached_cost(), "generation evolved");

            if config.emits_at(generation) {
                let stats = GenerationStats {
                    generation: generation as i64,
                    best: best.clone(),
                };
                debug!(generation, cost = ?best.cached_cost(), "emitting snapshot");
                if sender.send(stats).is_err() {
                    sender.set_state(EngineState::Cancelled);
                    return outcome(EngineState::Cancelled, generations, &population);
                }
            }

            if !config.delay.is_zero() {
                thread::sleep(config.delay);
            }
            generations += 1;
        }

        sender.set_state(EngineState::Completed);
        let sentinel = GenerationStats {
            generation: GenerationStats::SENTINEL,
            best: best_of(&population).clone(),
        };
        if sender.send(sentinel).is_err() {
            debug!("sentinel not delivered: consumer cancelled or left");
        }
        outcome(EngineState::Completed, generations, &population)
    }
}

impl<R: Rng + Send + 'static> Engine<R> {
    /// Starts the run on a background thread.
    ///
    /// # Errors
    ///
    /// [`EngineError::Spawn`] if the thread cannot be created.
    pub fn spawn(self) -> EvolveResult<EngineHandle> {
        let (sender, stream, cancel) = snapshot_channel();
        let join = thread::Builder::new()
            .name(ENGINE_THREAD_NAME.to_string())
            .spawn(move || self.run(sender))?;
        Ok(EngineHandle {
            stream,
            cancel,
            join,
        })
    }
}

/// Caller side of a spawned run.
#[derive(Debug)]
pub struct EngineHandle {
    /// Snapshots in increasing generation order.
    pub stream: SnapshotStream,

    /// Cancels the run at its next snapshot emission.
    pub cancel: CancelToken,

    join: JoinHandle<Result<RunOutcome, EngineError>>,
}

impl EngineHandle {
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Lifecycle state last published by the engine thread.
    pub fn state(&self) -> EngineState {
        self.stream.engine_state()
    }

    /// Whether the engine thread has exited.
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Closes the stream and waits for the engine thread.
    ///
    /// A run that is still going stops at its next snapshot emission and
    /// reports [`EngineState::Cancelled`]. Consume the stream first to let a
    /// run complete.
    ///
    /// # Errors
    ///
    /// The run's own error, or [`EngineError::TaskPanicked`].
    pub fn join(self) -> EvolveResult<RunOutcome> {
        let Self { stream, join, .. } = self;
        drop(stream);
        join.join().map_err(|_| EngineError::TaskPanicked)?
    }

    /// Splits the handle into its stream, cancellation token and thread.
    pub fn into_parts(
        self,
    ) -> (
        SnapshotStream,
        CancelToken,
        JoinHandle<Result<RunOutcome, EngineError>>,
    ) {
        (self.stream, self.cancel, self.join)
    }
}

/// Validates `config`, starts a detached run and returns its stream and
/// cancellation token.
pub fn run_genetic(config: GeneConfig) -> EvolveResult<(SnapshotStream, CancelToken)> {
    let (stream, cancel, _detached) = Engine::new(config)?.spawn()?.into_parts();
    Ok((stream, cancel))
}

fn best_of(population: &Population) -> &Tour {
    // A validated run never holds fewer than `pop_cap >= 2` tours.
    &population.tours()[0]
}

fn outcome(
    state: EngineState,
    generations: usize,
    population: &Population,
) -> Result<RunOutcome, TourError> {
    let mut best = best_of(population).clone();
    let best_cost = best.cost()?;
    Ok(RunOutcome {
        state,
        generations,
        best,
        best_cost,
    })
}

// ============================================================================
// Tests
// ============================================================================

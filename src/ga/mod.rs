//! Genetic algorithm over tours.
//!
//! # Key Types
//!
//! - [`GeneConfig`]: run parameters, builder and validation
//! - [`Population`]: tours plus the genetic operators (rank, cull, shuffle,
//!   recombine, mutate)
//! - [`Engine`]: the generation loop and its lifecycle
//! - [`SnapshotStream`] / [`CancelToken`]: the only objects a running engine
//!   shares with its caller
//!
//! # Submodules
//!
//! - [`operators`]: permutation-level splice, repair and swap mutation
//!
//! # Pipeline
//!
//! Every generation runs `rank → cull → shuffle → recombine → mutate → rank`
//! and leaves exactly `pop_cap` tours behind.

mod config;
pub mod operators;
mod population;
mod runner;
mod stream;

pub use config::GeneConfig;
pub use population::{elite_count, reprieve_count, Population};
pub use runner::{
    run_genetic, Engine, EngineHandle, EngineState, GenerationStats, RunOutcome,
    ENGINE_THREAD_NAME,
};
pub use stream::{
    snapshot_channel, CancelToken, Cancelled, IntoIter, Iter, SnapshotSender, SnapshotStream,
};

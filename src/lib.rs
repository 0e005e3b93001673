//! Genetic algorithm engine for the Euclidean Traveling Salesman Problem.
//!
//! Evolves a population of candidate tours and streams periodic snapshots of
//! the best tour to a consumer, which may cancel the run at any time.
//!
//! - **Geometry**: [`geometry::Point`], the 2D value type cities live on.
//! - **City model**: [`tsp::CityMap`], a shared, immutable set of cities laid
//!   out on a unit circle or uniformly at random.
//! - **Tour**: [`tsp::Tour`], a permutation of city identities with a lazily
//!   cached cyclic path cost.
//! - **Genetic operators**: [`ga::Population`] carries rank, cull, shuffle,
//!   recombine (splice crossover with repair) and swap mutation.
//! - **Engine**: [`ga::Engine`] runs the generation loop on a background
//!   thread and hands out a [`ga::SnapshotStream`] and a [`ga::CancelToken`].
//!
//! # Example
//!
//! ```no_run
//! use tsp_evolve::ga::{Engine, GeneConfig};
//!
//! let config = GeneConfig::circle()
//!     .with_city_count(20)
//!     .with_max_generations(2_000)
//!     .with_seed(7);
//!
//! let handle = Engine::new(config).unwrap().spawn().unwrap();
//! for mut stats in handle.stream.iter() {
//!     if stats.is_sentinel() {
//!         break;
//!     }
//!     println!("{} | {:.3}", stats.generation, stats.best.cost().unwrap());
//!     if stats.best.is_converged().unwrap() {
//!         handle.cancel.cancel();
//!     }
//! }
//! ```
//!
//! # Randomness
//!
//! Every random decision draws from an explicitly passed generator. Seeding
//! [`ga::GeneConfig::seed`] (or calling [`random::create_rng`]) makes runs
//! reproducible.

pub mod error;
pub mod ga;
pub mod geometry;
pub mod random;
pub mod tsp;

pub use error::{ConfigError, EngineError, EvolveResult, TourError};

//! Euclidean TSP instance model.
//!
//! - [`CityMap`]: immutable, shared set of [`City`] values produced by one of
//!   the [`CityLayout`] generators
//! - [`Tour`]: a cyclic visiting order over a [`CityMap`] with a cached cost

mod city;
mod tour;

pub use city::{City, CityLayout, CityMap};
pub use tour::{Tour, CONVERGENCE_TOLERANCE};

//! Tours: candidate solutions over a [`CityMap`].

use super::city::{City, CityMap};
use crate::error::TourError;
use rand::seq::SliceRandom;
use rand::Rng;
use std::cell::OnceCell;

/// Maximum distance between a tour's cost and its reference cost for the
/// tour to count as converged.
pub const CONVERGENCE_TOLERANCE: f64 = 1e-3;

/// A cyclic visiting order over the cities of a [`CityMap`].
///
/// The order is expected to be a permutation of `0..cities.len()`. The total
/// path length is computed on demand and cached; every mutation made through
/// this type invalidates the cache.
///
/// # Examples
///
/// ```
/// use tsp_evolve::tsp::{CityMap, Tour};
///
/// let cities = CityMap::circle(4);
/// let mut square = Tour::from_order(cities.clone(), vec![0, 1, 2, 3]);
/// let mut crossed = Tour::from_order(cities, vec![1, 3, 0, 2]);
/// assert!(square.cost().unwrap() < crossed.cost().unwrap());
/// ```
#[derive(Debug, Clone)]
pub struct Tour {
    order: Vec<usize>,
    cities: CityMap,
    cost: f64,
    cost_valid: bool,
    reference_cost: OnceCell<f64>,
}

impl Tour {
    /// Creates a tour with the given order. The cost starts invalid.
    ///
    /// The order is not checked here; a malformed order is reported by
    /// [`cost`](Self::cost).
    pub fn from_order(cities: CityMap, order: Vec<usize>) -> Self {
        Self {
            order,
            cities,
            cost: 0.0,
            cost_valid: false,
            reference_cost: OnceCell::new(),
        }
    }

    /// Creates a tour visiting the cities in a uniformly random order.
    pub fn random<R: Rng>(cities: CityMap, rng: &mut R) -> Self {
        let mut order: Vec<usize> = (0..cities.len()).collect();
        order.shuffle(rng);
        Self::from_order(cities, order)
    }

    /// Total cyclic path length.
    ///
    /// Returns the cached value when valid, otherwise recomputes and caches
    /// it.
    ///
    /// # Errors
    ///
    /// [`TourError`] when the order does not match the city map. This is an
    /// invariant violation and the tour must not be used further.
    pub fn cost(&mut self) -> Result<f64, TourError> {
        if !self.cost_valid {
            self.cost = self.compute_cost()?;
            self.cost_valid = true;
        }
        Ok(self.cost)
    }

    /// The cached cost, if it is currently valid.
    pub fn cached_cost(&self) -> Option<f64> {
        self.cost_valid.then_some(self.cost)
    }

    /// Heuristic tour length used as a convergence target.
    ///
    /// Computed once as `distance(city[1], city[0]) * N`. This equals the
    /// optimal tour length only for the circle layout; for other layouts it
    /// has no meaning as a bound. Maps with fewer than two cities yield 0.
    pub fn reference_cost(&self) -> f64 {
        *self.reference_cost.get_or_init(|| {
            let cities = self.cities.as_slice();
            if cities.len() < 2 {
                return 0.0;
            }
            cities[1].position.distance(cities[0].position) * cities.len() as f64
        })
    }

    /// Whether the cost is within [`CONVERGENCE_TOLERANCE`] of the reference
    /// cost.
    ///
    /// Only meaningful for tours over a circle layout.
    pub fn is_converged(&mut self) -> Result<bool, TourError> {
        let cost = self.cost()?;
        Ok((self.reference_cost() - cost).abs() < CONVERGENCE_TOLERANCE)
    }

    pub fn order(&self) -> &[usize] {
        &self.order
    }

    pub fn into_order(self) -> Vec<usize> {
        self.order
    }

    pub fn cities(&self) -> &CityMap {
        &self.cities
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Replaces the order and invalidates the cost.
    pub fn set_order(&mut self, order: Vec<usize>) {
        self.order = order;
        self.invalidate();
    }

    /// Mutates the order in place and invalidates the cost.
    pub fn with_order_mut<T>(&mut self, f: impl FnOnce(&mut Vec<usize>) -> T) -> T {
        self.invalidate();
        f(&mut self.order)
    }

    /// Swaps the cities at two positions and invalidates the cost.
    pub fn swap(&mut self, i: usize, j: usize) {
        self.order.swap(i, j);
        self.invalidate();
    }

    /// Replaces the order with a fresh random permutation.
    pub fn shuffle<R: Rng>(&mut self, rng: &mut R) {
        self.order.shuffle(rng);
        self.invalidate();
    }

    /// Marks the cached cost as stale.
    pub fn invalidate(&mut self) {
        self.cost_valid = false;
    }

    /// Cities in visiting order. Identities missing from the map are skipped.
    pub fn ordered_cities(&self) -> impl Iterator<Item = &City> + '_ {
        self.order.iter().filter_map(|&id| self.cities.get(id))
    }

    /// Consecutive city pairs along the tour, including the closing leg from
    /// the last city back to the first.
    pub fn legs(&self) -> impl Iterator<Item = (&City, &City)> + '_ {
        let n = self.order.len();
        (0..n).filter_map(move |i| {
            let from = self.cities.get(self.order[i])?;
            let to = self.cities.get(self.order[(i + 1) % n])?;
            Some((from, to))
        })
    }

    fn compute_cost(&self) -> Result<f64, TourError> {
        let expected = self.cities.len();
        if self.order.len() != expected {
            return Err(TourError::Corrupt {
                expected,
                actual: self.order.len(),
            });
        }
        if let Some(&identity) = self.order.iter().find(|&&id| id >= expected) {
            return Err(TourError::UnknownCity {
                identity,
                city_count: expected,
            });
        }
        Ok(self
            .legs()
            .map(|(from, to)| from.position.distance(to.position))
            .sum())
    }
}

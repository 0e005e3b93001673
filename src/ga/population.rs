//! Populations of tours and the generation pipeline.
//!
//! A [`Population`] is an ordered collection of [`Tour`]s over one shared
//! [`CityMap`]. Each generation runs, in order:
//!
//! 1. [`cull`](Population::cull): keep elites plus a random reprieve
//! 2. [`shuffle`](Population::shuffle): randomize breeding pairs
//! 3. [`recombine`](Population::recombine): splice adjacent pairs, repair
//!    and append the children
//! 4. [`mutate`](Population::mutate): refill to capacity with swap-mutated
//!    clones
//! 5. [`rank`](Population::rank): sort ascending by cost
//!
//! The population shrinks under culling, grows under recombination and is
//! topped back up to exactly the capacity by mutation.

use super::config::GeneConfig;
use super::operators::{
    mutation_swap_count, normalize, random_splice, sample_mutation_rate, swap_pairs,
};
use crate::error::TourError;
use crate::tsp::{CityMap, Tour};
use rand::seq::{index, SliceRandom};
use rand::Rng;

/// Relative slack absorbed when flooring a rate times a capacity.
const COUNT_TOLERANCE: f64 = 1e-9;

/// Number of tours kept by rank alone: `floor((1 - cull_rate) * capacity)`.
pub fn elite_count(capacity: usize, cull_rate: f64) -> usize {
    floor_count(1.0 - cull_rate, capacity)
}

/// Number of culled tours spared at random: `floor(cull_reprieve * capacity)`.
pub fn reprieve_count(capacity: usize, cull_reprieve: f64) -> usize {
    floor_count(cull_reprieve, capacity)
}

// `0.2 * 1000.0` lands on 199.99999999999997; a product within the tolerance
// below a whole number counts as that number.
fn floor_count(fraction: f64, capacity: usize) -> usize {
    let exact = fraction * capacity as f64;
    (exact + COUNT_TOLERANCE * exact.abs().max(1.0))
        .floor()
        .max(0.0) as usize
}

/// An ordered collection of tours sharing one city map.
#[derive(Debug, Clone)]
pub struct Population {
    tours: Vec<Tour>,
    cities: CityMap,
}

impl Population {
    /// Creates `capacity` tours with uniformly random orders. Unranked.
    pub fn random<R: Rng>(cities: CityMap, capacity: usize, rng: &mut R) -> Self {
        let tours = (0..capacity)
            .map(|_| Tour::random(cities.clone(), rng))
            .collect();
        Self { tours, cities }
    }

    /// Wraps existing tours. They are expected to share `cities`.
    pub fn from_tours(cities: CityMap, tours: Vec<Tour>) -> Self {
        Self { tours, cities }
    }

    pub fn len(&self) -> usize {
        self.tours.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tours.is_empty()
    }

    pub fn cities(&self) -> &CityMap {
        &self.cities
    }

    pub fn tours(&self) -> &[Tour] {
        &self.tours
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Tour> {
        self.tours.iter()
    }

    pub fn into_tours(self) -> Vec<Tour> {
        self.tours
    }

    /// The first tour, which is the fittest after [`rank`](Self::rank).
    pub fn best(&self) -> Option<&Tour> {
        self.tours.first()
    }

    /// Evaluates every tour and stably sorts ascending by cost.
    ///
    /// # Errors
    ///
    /// Propagates the first [`TourError`] met; the order of the population
    /// is then unspecified.
    pub fn rank(&mut self) -> Result<(), TourError> {
        for tour in &mut self.tours {
            tour.cost()?;
        }
        self.tours.sort_by(|a, b| {
            let a = a.cached_cost().unwrap_or(f64::INFINITY);
            let b = b.cached_cost().unwrap_or(f64::INFINITY);
            a.total_cmp(&b)
        });
        Ok(())
    }

    /// Culls a ranked population.
    ///
    /// Keeps the first [`elite_count`] tours, then a uniform random sample
    /// without replacement of [`reprieve_count`] tours from the rest. The
    /// reprieve is clamped to the number of tours left after the elites.
    /// Survivors keep their relative order.
    pub fn cull<R: Rng>(&mut self, capacity: usize, cull_rate: f64, cull_reprieve: f64, rng: &mut R) {
        let elites = elite_count(capacity, cull_rate).min(self.tours.len());
        let remainder = self.tours.split_off(elites);
        let reprieved = reprieve_count(capacity, cull_reprieve).min(remainder.len());
        if reprieved == 0 {
            return;
        }

        let mut spared = vec![false; remainder.len()];
        for i in index::sample(rng, remainder.len(), reprieved).into_vec() {
            spared[i] = true;
        }
        self.tours.extend(
            remainder
                .into_iter()
                .zip(spared)
                .filter_map(|(tour, keep)| keep.then_some(tour)),
        );
    }

    /// Randomizes the order of the tours (Fisher–Yates).
    pub fn shuffle<R: Rng>(&mut self, rng: &mut R) {
        self.tours.shuffle(rng);
    }

    /// Breeds adjacent pairs `(0, 1), (2, 3), ...` by splice crossover.
    ///
    /// Each pair yields two children, repaired into valid permutations and
    /// appended after all parents. A trailing odd tour is not bred.
    pub fn recombine<R: Rng>(&mut self, rng: &mut R) {
        let mut children = Vec::with_capacity(self.tours.len() / 2 * 2);
        for pair in self.tours.chunks_exact(2) {
            let (mut ab, mut ba) = random_splice(pair[0].order(), pair[1].order(), rng);
            normalize(&mut ab, rng);
            normalize(&mut ba, rng);
            children.push(Tour::from_order(self.cities.clone(), ab));
            children.push(Tour::from_order(self.cities.clone(), ba));
        }
        self.tours.append(&mut children);
    }

    /// Refills the population to `capacity` with mutated clones.
    ///
    /// Each new tour copies the order of a uniformly chosen existing tour and
    /// swaps [`mutation_swap_count`] disjoint position pairs, using a rate
    /// sampled as `mutate_rate + uniform(-1, 1) * mutate_deviation`. Existing
    /// tours are not modified. An empty population is refilled with random
    /// tours.
    ///
    /// When recombination overshot the capacity, the newest tours are
    /// dropped instead, so the population always ends at exactly `capacity`.
    pub fn mutate<R: Rng>(&mut self, capacity: usize, mutate_rate: f64, mutate_deviation: f64, rng: &mut R) {
        let existing = self.tours.len();
        if existing >= capacity {
            self.tours.truncate(capacity);
            return;
        }
        let needed = capacity - existing;
        if existing == 0 {
            self.tours
                .extend((0..needed).map(|_| Tour::random(self.cities.clone(), rng)));
            return;
        }

        let city_count = self.cities.len();
        let mut mutants = Vec::with_capacity(needed);
        for _ in 0..needed {
            let parent = &self.tours[rng.random_range(0..existing)];
            let mut order = parent.order().to_vec();

            let rate = sample_mutation_rate(mutate_rate, mutate_deviation, rng);
            let swaps = mutation_swap_count(rate, city_count);
            if swaps > 0 {
                swap_pairs(&mut order, swaps, rng);
            }
            mutants.push(Tour::from_order(self.cities.clone(), order));
        }
        self.tours.append(&mut mutants);
    }

    /// Runs one generation on a ranked population:
    /// cull → shuffle → recombine → mutate → rank.
    ///
    /// Afterwards the population holds exactly `config.pop_cap` tours.
    pub fn evolve<R: Rng>(&mut self, config: &GeneConfig, rng: &mut R) -> Result<(), TourError> {
        self.cull(config.pop_cap, config.cull_rate, config.cull_reprieve, rng);
        self.shuffle(rng);
        self.recombine(rng);
        self.mutate(config.pop_cap, config.mutate_rate, config.mutate_deviation, rng);
        self.rank()
    }
}

impl<'a> IntoIterator for &'a Population {
    type Item = &'a Tour;
    type IntoIter = std::slice::Iter<'a, Tour>;

    fn into_iter(self) -> Self::IntoIter {
        self.tours.iter()
    }
}

// ============================================================================
// Tests
// ============================================================================

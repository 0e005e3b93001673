//! Cities and city layouts.

use crate::geometry::Point;
use rand::Rng;
use std::f64::consts::PI;
use std::ops::Index;
use std::sync::Arc;

/// Lower-left corner of the square random cities are placed in.
const RANDOM_REGION_MIN: Point = Point { x: -1.0, y: -1.0 };

/// Extent of the square random cities are placed in.
const RANDOM_REGION_SIZE: Point = Point { x: 2.0, y: 2.0 };

/// A city: a fixed position tagged with its index in the owning [`CityMap`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct City {
    pub position: Point,
    pub identity: usize,
}

/// How a [`CityMap`] was generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CityLayout {
    /// Evenly spaced on the unit circle.
    ///
    /// The optimal tour visits the cities in identity order, so the
    /// reference cost of a tour is a good convergence target.
    #[default]
    Circle,

    /// Uniformly random inside the square `[-1, 1) x [-1, 1)`.
    Random,

    /// Explicit positions supplied by the caller.
    Custom,
}

/// An immutable set of cities shared by every tour of a run.
///
/// Cloning is cheap: the cities live behind an [`Arc`].
#[derive(Debug, Clone)]
pub struct CityMap {
    cities: Arc<[City]>,
    layout: CityLayout,
}

impl CityMap {
    /// Places `count` cities evenly on the unit circle.
    ///
    /// City `i` sits at angle `i * 2π / count`. Deterministic.
    pub fn circle(count: usize) -> Self {
        let step = if count == 0 {
            0.0
        } else {
            2.0 * PI / count as f64
        };
        let cities = (0..count)
            .map(|i| {
                let angle = step * i as f64;
                City {
                    position: Point::new(angle.cos(), angle.sin()),
                    identity: i,
                }
            })
            .collect();
        Self {
            cities,
            layout: CityLayout::Circle,
        }
    }

    /// Places `count` cities uniformly at random in a square centered at the
    /// origin.
    pub fn random<R: Rng>(count: usize, rng: &mut R) -> Self {
        let cities = (0..count)
            .map(|i| City {
                position: Point::random_in_range(RANDOM_REGION_MIN, RANDOM_REGION_SIZE, rng),
                identity: i,
            })
            .collect();
        Self {
            cities,
            layout: CityLayout::Random,
        }
    }

    /// Generates a map with the given layout.
    ///
    /// [`CityLayout::Custom`] has no generator and yields the circle layout.
    pub fn generate<R: Rng>(layout: CityLayout, count: usize, rng: &mut R) -> Self {
        match layout {
            CityLayout::Random => Self::random(count, rng),
            CityLayout::Circle | CityLayout::Custom => Self::circle(count),
        }
    }

    /// Builds a map from explicit positions, assigning identities in order.
    pub fn from_points<I: IntoIterator<Item = Point>>(points: I) -> Self {
        let cities = points
            .into_iter()
            .enumerate()
            .map(|(identity, position)| City { position, identity })
            .collect();
        Self {
            cities,
            layout: CityLayout::Custom,
        }
    }

    pub fn len(&self) -> usize {
        self.cities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }

    pub fn layout(&self) -> CityLayout {
        self.layout
    }

    pub fn get(&self, identity: usize) -> Option<&City> {
        self.cities.get(identity)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, City> {
        self.cities.iter()
    }

    pub fn as_slice(&self) -> &[City] {
        &self.cities
    }

    /// Whether both handles point at the same backing cities.
    pub fn ptr_eq(&self, other: &CityMap) -> bool {
        Arc::ptr_eq(&self.cities, &other.cities)
    }
}

impl Index<usize> for CityMap {
    type Output = City;

    fn index(&self, identity: usize) -> &City {
        &self.cities[identity]
    }
}

impl<'a> IntoIterator for &'a CityMap {
    type Item = &'a City;
    type IntoIter = std::slice::Iter<'a, City>;

    fn into_iter(self) -> Self::IntoIter {
        self.cities.iter()
    }
}

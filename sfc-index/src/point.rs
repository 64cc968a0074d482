#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A fixed-dimension signed coordinate tuple.
///
/// `D` is 2 or 3 in this crate, but the type itself is generic over any
/// dimensionality a caller cares to instantiate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Point<const D: usize> {
    coords: [i64; D],
}

impl<const D: usize> Point<D> {
    pub fn new(coords: [i64; D]) -> Self {
        Self { coords }
    }

    pub fn coords(&self) -> &[i64; D] {
        &self.coords
    }

    pub fn get(&self, dim: usize) -> i64 {
        self.coords[dim]
    }

    /// Squared Euclidean distance, widened to `u128` so that a single
    /// dimension's difference on the full `i64` range never overflows while
    /// squaring. The running sum saturates rather than panics if extreme
    /// coordinates in 3 dimensions push the total past `u128::MAX`, an
    /// edge case far outside any realistic coordinate range.
    pub fn sqr_dist(&self, other: &Self) -> u128 {
        let mut acc: u128 = 0;
        for i in 0..D {
            let diff = (self.coords[i] as i128 - other.coords[i] as i128).unsigned_abs();
            acc = acc.saturating_add(diff * diff);
        }
        acc
    }
}

pub type Point2 = Point<2>;
pub type Point3 = Point<3>;

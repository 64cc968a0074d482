//! The OPEN→SEALED builder/holder that sits between raw ingestion and the
//! immutable [`SfcIndex`].

use crate::error::IndexStateError;
use crate::index::SfcIndex;
use crate::point::Point;

type Attributes = Vec<String>;

enum State<const D: usize> {
    Open {
        points: Vec<Point<D>>,
        attrs: Vec<Attributes>,
    },
    Sealed {
        index: SfcIndex<D>,
        attrs: Vec<Attributes>,
    },
}

/// A named point store. Starts `OPEN` and accepts [`PointData::add`]; once
/// [`PointData::lock`] is called it becomes `SEALED` and only
/// [`PointData::get_nn`] is valid. The transition is one-shot and checked at
/// runtime, matching the source's `Add`/`Lock`/`GetNN` triad.
pub struct PointData<const D: usize> {
    state: State<D>,
}

impl<const D: usize> Default for PointData<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const D: usize> PointData<D> {
    pub fn new() -> Self {
        Self {
            state: State::Open {
                points: Vec::new(),
                attrs: Vec::new(),
            },
        }
    }

    /// Number of points accumulated (OPEN) or held (SEALED).
    pub fn len(&self) -> usize {
        match &self.state {
            State::Open { points, .. } => points.len(),
            State::Sealed { attrs, .. } => attrs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_sealed(&self) -> bool {
        matches!(self.state, State::Sealed { .. })
    }

    /// Appends a point with its attribute row. Valid only while OPEN.
    pub fn add(&mut self, point: Point<D>, attributes: Attributes) -> Result<(), IndexStateError> {
        match &mut self.state {
            State::Open { points, attrs } => {
                points.push(point);
                attrs.push(attributes);
                Ok(())
            }
            State::Sealed { .. } => Err(IndexStateError::AlreadySealed),
        }
    }

    /// Freezes the builder: sorts the accumulated points into a Morton
    /// order `SfcIndex` and fixes the attribute table. One-shot.
    pub fn lock(&mut self) -> Result<(), IndexStateError> {
        match &self.state {
            State::Sealed { .. } => Err(IndexStateError::DoubleLock),
            State::Open { .. } => {
                // Temporarily swap in a placeholder so we can move the
                // accumulated vectors out of the enum by value.
                let prev = std::mem::replace(
                    &mut self.state,
                    State::Open {
                        points: Vec::new(),
                        attrs: Vec::new(),
                    },
                );
                let State::Open { points, attrs } = prev else {
                    unreachable!("checked above")
                };
                let ids: Vec<u64> = (0..points.len() as u64).collect();
                let index = SfcIndex::build(points, ids);
                self.state = State::Sealed { index, attrs };
                Ok(())
            }
        }
    }

    /// k-nearest-neighbor lookup. Valid only while SEALED. Reports
    /// rounded-up integer Euclidean distance (`ceil(sqrt(d^2))`) per point,
    /// paired with that point's attribute row.
    pub fn get_nn(
        &self,
        query: &Point<D>,
        k: usize,
        eps: f64,
    ) -> Result<Vec<(u64, u64, Attributes)>, IndexStateError> {
        match &self.state {
            State::Open { .. } => Err(IndexStateError::NotSealed),
            State::Sealed { index, attrs } => Ok(index
                .ksearch(query, k, eps)
                .into_iter()
                .map(|(id, d_sq)| (id, ceil_sqrt(d_sq), attrs[id as usize].clone()))
                .collect()),
        }
    }
}

fn ceil_sqrt(d_sq: u128) -> u64 {
    if d_sq == 0 {
        return 0;
    }
    let approx = (d_sq as f64).sqrt().ceil() as u64;
    // Guard the f64 rounding against being off by one near perfect squares.
    let mut candidate = approx.saturating_sub(1);
    while (candidate as u128) * (candidate as u128) < d_sq {
        candidate += 1;
    }
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::Point2;

    #[test]
    fn open_state_rejects_get_nn() {
        let pd: PointData<2> = PointData::new();
        assert_eq!(
            pd.get_nn(&Point2::new([0, 0]), 1, 0.0).unwrap_err(),
            IndexStateError::NotSealed
        );
    }

    #[test]
    fn sealed_state_rejects_add_and_relock() {
        let mut pd: PointData<2> = PointData::new();
        pd.add(Point2::new([1, 1]), vec!["a".into()]).unwrap();
        pd.lock().unwrap();
        assert_eq!(
            pd.add(Point2::new([2, 2]), vec!["b".into()]).unwrap_err(),
            IndexStateError::AlreadySealed
        );
        assert_eq!(pd.lock().unwrap_err(), IndexStateError::DoubleLock);
    }

    #[test]
    fn get_nn_reports_rounded_up_distance_and_attributes() {
        let mut pd: PointData<2> = PointData::new();
        pd.add(Point2::new([3, 4]), vec!["a".into()]).unwrap();
        pd.lock().unwrap();
        let res = pd.get_nn(&Point2::new([0, 0]), 3, 0.0).unwrap();
        assert_eq!(res, vec![(0, 5, vec!["a".to_string()])]);
    }

    #[test]
    fn ceil_sqrt_rounds_up_non_perfect_squares() {
        assert_eq!(ceil_sqrt(25), 5);
        assert_eq!(ceil_sqrt(50), 8); // sqrt(50) ~= 7.07
        assert_eq!(ceil_sqrt(0), 0);
        assert_eq!(ceil_sqrt(1), 1);
    }
}

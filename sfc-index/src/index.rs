//! Immutable, Morton-ordered parallel array index with bounded, box-pruned
//! kNN search, translated from STANN's `sfcdata_work` recursion.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use rayon::slice::ParallelSliceMut;

use crate::morton::{dist_sq_to_box, z_less};
use crate::point::Point;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Candidate {
    dist: u128,
    id: u64,
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.dist.cmp(&other.dist)
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A max-heap bounded to `cap` entries: the worst of the `k` best candidates
/// seen so far sits at the top, ready to be evicted by anything closer.
struct BoundedHeap {
    cap: usize,
    heap: BinaryHeap<Candidate>,
}

impl BoundedHeap {
    fn new(cap: usize) -> Self {
        Self {
            cap,
            heap: BinaryHeap::with_capacity(cap),
        }
    }

    /// Inserts `(dist, id)` if it belongs among the `cap` closest seen so
    /// far. Returns whether the heap's contents (and therefore its top
    /// distance) changed.
    fn update(&mut self, dist: u128, id: u64) -> bool {
        if self.heap.len() < self.cap {
            self.heap.push(Candidate { dist, id });
            true
        } else if let Some(top) = self.heap.peek() {
            if dist < top.dist {
                self.heap.pop();
                self.heap.push(Candidate { dist, id });
                true
            } else {
                false
            }
        } else {
            false
        }
    }

    /// Current pruning radius: `u128::MAX` while the heap has not yet
    /// filled, so that recursion never prunes before it has `cap` real
    /// candidates to compare against.
    fn top_dist(&self) -> u128 {
        if self.heap.len() < self.cap {
            u128::MAX
        } else {
            self.heap.peek().map(|c| c.dist).unwrap_or(u128::MAX)
        }
    }

    fn into_sorted(self) -> Vec<(u64, u128)> {
        self.heap
            .into_sorted_vec()
            .into_iter()
            .map(|c| (c.id, c.dist))
            .collect()
    }
}

/// A Morton-ordered, immutable snapshot of `points` paired with their
/// original insertion `ids`. Built once via [`SfcIndex::build`]; every query
/// afterwards is read-only.
#[derive(Debug)]
pub struct SfcIndex<const D: usize> {
    points: Vec<Point<D>>,
    ids: Vec<u64>,
}

impl<const D: usize> SfcIndex<D> {
    /// Sorts `(points, ids)` jointly under `z_less`, keeping both arrays in
    /// lockstep (a zipped / pair-iterator sort).
    pub fn build(points: Vec<Point<D>>, ids: Vec<u64>) -> Self {
        assert_eq!(points.len(), ids.len(), "points/ids length mismatch");
        let mut pairs: Vec<(Point<D>, u64)> = points.into_iter().zip(ids).collect();
        pairs.par_sort_unstable_by(|a, b| {
            if z_less(&a.0, &b.0) {
                Ordering::Less
            } else if z_less(&b.0, &a.0) {
                Ordering::Greater
            } else {
                Ordering::Equal
            }
        });
        let (points, ids) = pairs.into_iter().unzip();
        Self { points, ids }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Position `q` would occupy in the sorted array.
    fn locate(&self, q: &Point<D>) -> usize {
        self.points.partition_point(|p| z_less(p, q))
    }

    fn bounding_box(&self, q: &Point<D>, r_sq: u128, eps: f64) -> (Point<D>, Point<D>) {
        let half = if r_sq == u128::MAX {
            i64::MAX
        } else {
            ((r_sq as f64 * (1.0 + eps)).sqrt().ceil() as i64).max(0)
        };
        let mut lo = [0i64; D];
        let mut hi = [0i64; D];
        for i in 0..D {
            lo[i] = q.get(i).saturating_sub(half);
            hi[i] = q.get(i).saturating_add(half);
        }
        (Point::new(lo), Point::new(hi))
    }

    #[allow(clippy::too_many_arguments)]
    fn recurse(
        &self,
        s: usize,
        n: usize,
        q: &Point<D>,
        eps: f64,
        heap: &mut BoundedHeap,
        bl: &mut Point<D>,
        bu: &mut Point<D>,
        lo: usize,
        hi: usize,
    ) {
        if n == 0 {
            return;
        }
        if n < 4 {
            let mut updated = false;
            for i in s..s + n {
                if i >= lo && i < hi {
                    continue;
                }
                if heap.update(q.sqr_dist(&self.points[i]), self.ids[i]) {
                    updated = true;
                }
            }
            if updated {
                let (nbl, nbu) = self.bounding_box(q, heap.top_dist(), eps);
                *bl = nbl;
                *bu = nbu;
            }
            return;
        }

        let m = s + n / 2;
        if !(m >= lo && m < hi) && heap.update(q.sqr_dist(&self.points[m]), self.ids[m]) {
            let (nbl, nbu) = self.bounding_box(q, heap.top_dist(), eps);
            *bl = nbl;
            *bu = nbu;
        }

        if dist_sq_to_box(q, &self.points[s], &self.points[s + n - 1]) > heap.top_dist() {
            return;
        }

        if z_less(q, &self.points[m]) {
            self.recurse(s, n / 2, q, eps, heap, bl, bu, lo, hi);
            if z_less(&self.points[m], bu) {
                self.recurse(m + 1, n - n / 2 - 1, q, eps, heap, bl, bu, lo, hi);
            }
        } else {
            self.recurse(m + 1, n - n / 2 - 1, q, eps, heap, bl, bu, lo, hi);
            if z_less(bl, &self.points[m]) {
                self.recurse(s, n / 2, q, eps, heap, bl, bu, lo, hi);
            }
        }
    }

    /// Bounded kNN search: the `k` points closest to `q` by squared
    /// distance, ascending. `k` is clamped to the index size; `eps` loosens
    /// the pruning radius for faster, approximate results (`0.0` is exact).
    pub fn ksearch(&self, q: &Point<D>, k: usize, eps: f64) -> Vec<(u64, u128)> {
        let n = self.points.len();
        let k = k.min(n);
        if k == 0 {
            return Vec::new();
        }

        let pos = self.locate(q);
        let lo = pos.saturating_sub(k);
        let hi = (pos + k + 1).min(n);

        let mut heap = BoundedHeap::new(k);
        for i in lo..hi {
            heap.update(q.sqr_dist(&self.points[i]), self.ids[i]);
        }

        let (mut bl, mut bu) = self.bounding_box(q, heap.top_dist(), eps);

        if hi > 0 && z_less(&bu, &self.points[hi - 1]) && z_less(&self.points[lo], &bl) {
            return heap.into_sorted();
        }

        self.recurse(0, n, q, eps, &mut heap, &mut bl, &mut bu, lo, hi);
        heap.into_sorted()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::Point2;
    use std::collections::HashSet;

    fn brute_force<const D: usize>(points: &[Point<D>], q: &Point<D>, k: usize) -> Vec<u128> {
        let mut dists: Vec<u128> = points.iter().map(|p| q.sqr_dist(p)).collect();
        dists.sort_unstable();
        dists.truncate(k.min(points.len()));
        dists
    }

    #[test]
    fn empty_index_returns_empty() {
        let idx: SfcIndex<2> = SfcIndex::build(vec![], vec![]);
        assert_eq!(idx.ksearch(&Point2::new([0, 0]), 5, 0.0), vec![]);
    }

    #[test]
    fn single_point() {
        let idx = SfcIndex::build(vec![Point2::new([3, 4])], vec![0]);
        let res = idx.ksearch(&Point2::new([0, 0]), 3, 0.0);
        assert_eq!(res, vec![(0, 25)]);
    }

    #[test]
    fn exact_match_wins_at_k1() {
        let pts = vec![
            Point2::new([0, 0]),
            Point2::new([10, 0]),
            Point2::new([0, 10]),
            Point2::new([10, 10]),
        ];
        let idx = SfcIndex::build(pts, vec![0, 1, 2, 3]);
        let res = idx.ksearch(&Point2::new([0, 0]), 1, 0.0);
        assert_eq!(res, vec![(0, 0)]);
    }

    #[test]
    fn k_exceeding_n_clamps_to_n() {
        let pts = vec![Point2::new([0, 0]), Point2::new([1, 1]), Point2::new([2, 2])];
        let idx = SfcIndex::build(pts, vec![0, 1, 2]);
        let res = idx.ksearch(&Point2::new([0, 0]), 10, 0.0);
        assert_eq!(res.len(), 3);
        let dists: Vec<u128> = res.iter().map(|(_, d)| *d).collect();
        let mut sorted = dists.clone();
        sorted.sort_unstable();
        assert_eq!(dists, sorted);
    }

    #[test]
    fn three_dimensional_cube_corners() {
        // Adjacent corners of a unit cube, excluding the query corner itself.
        let pts = vec![
            Point::<3>::new([1, 0, 0]),
            Point::<3>::new([0, 1, 0]),
            Point::<3>::new([0, 0, 1]),
            Point::<3>::new([1, 1, 1]),
        ];
        let idx = SfcIndex::build(pts, vec![0, 1, 2, 3]);
        let res = idx.ksearch(&Point::<3>::new([0, 0, 0]), 3, 0.0);
        assert_eq!(res.len(), 3);
        let dists: HashSet<u128> = res.iter().map(|(_, d)| *d).collect();
        assert_eq!(dists, HashSet::from([1]));
        for (id, _) in &res {
            assert!(*id <= 2, "expected the three axis-adjacent corners, got id {id}");
        }
    }

    #[test]
    fn ksearch_matches_brute_force_on_random_like_grid() {
        let mut pts = Vec::new();
        let mut ids = Vec::new();
        let mut id = 0u64;
        for x in -5..5 {
            for y in -5..5 {
                pts.push(Point2::new([x * 3, y * 7]));
                ids.push(id);
                id += 1;
            }
        }
        let idx = SfcIndex::build(pts.clone(), ids);
        for q in [
            Point2::new([0, 0]),
            Point2::new([100, -100]),
            Point2::new([-7, 2]),
        ] {
            let got = idx.ksearch(&q, 5, 0.0);
            let mut got_dists: Vec<u128> = got.iter().map(|(_, d)| *d).collect();
            got_dists.sort_unstable();
            let expected = brute_force(&pts, &q, 5);
            assert_eq!(got_dists, expected);
        }
    }

    #[test]
    fn idempotent_across_repeated_calls() {
        let pts = vec![Point2::new([0, 0]), Point2::new([4, 4]), Point2::new([-2, 9])];
        let idx = SfcIndex::build(pts, vec![0, 1, 2]);
        let q = Point2::new([1, 1]);
        let first = idx.ksearch(&q, 2, 0.0);
        for _ in 0..20 {
            assert_eq!(idx.ksearch(&q, 2, 0.0), first);
        }
    }
}

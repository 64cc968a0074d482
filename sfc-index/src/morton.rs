//! Morton (Z-order) comparator and the quad/oct-box distance bound used to
//! prune the recursive kNN search in [`crate::index`].
//!
//! The comparator never materializes an interleaved bit string. Instead it
//! finds, across the `D` coordinates, the dimension whose pair of values has
//! the most significant differing bit (the "x_j xor y_j" trick described by
//! Connor & Kumar), then compares the two points along that single
//! dimension. This gives a total order equivalent to full bit-interleaving
//! in O(D) per comparison instead of O(D * bits).

use crate::point::Point;

/// Maps a signed coordinate onto an unsigned one that preserves ordering.
/// Because this is a constant shift (by `1 << 63`), differences between two
/// biased values equal the differences between the original signed values,
/// so the biased domain can be used directly for distance arithmetic too.
#[inline]
fn bias(v: i64) -> u64 {
    (v as u64) ^ 0x8000_0000_0000_0000
}

/// True if `x`'s highest set bit is lower-order than `y`'s, i.e. `y`
/// dominates `x` under the "most significant differing bit" ordering used to
/// pick the leading dimension without computing bit lengths directly.
#[inline]
fn less_msb(x: u64, y: u64) -> bool {
    x < y && x < (x ^ y)
}

/// Finds the leading dimension (the one holding the overall most significant
/// differing bit between `p` and `q`) plus the xor of that dimension's
/// biased coordinates. Returns `None` if `p == q` in every dimension.
fn leading_dim<const D: usize>(p_biased: &[u64; D], q_biased: &[u64; D]) -> Option<(usize, u64)> {
    let mut j = 0;
    let mut x = p_biased[0] ^ q_biased[0];
    for i in 1..D {
        let y = p_biased[i] ^ q_biased[i];
        if less_msb(x, y) {
            j = i;
            x = y;
        }
    }
    if x == 0 {
        None
    } else {
        Some((j, x))
    }
}

fn biased_coords<const D: usize>(p: &Point<D>) -> [u64; D] {
    let mut out = [0u64; D];
    for i in 0..D {
        out[i] = bias(p.get(i));
    }
    out
}

/// Strict total order over points equivalent to Morton/Z-order.
pub fn z_less<const D: usize>(p: &Point<D>, q: &Point<D>) -> bool {
    let pb = biased_coords(p);
    let qb = biased_coords(q);
    match leading_dim(&pb, &qb) {
        None => false,
        Some((j, _)) => pb[j] < qb[j],
    }
}

fn highest_set_bit(x: u64) -> u32 {
    63 - x.leading_zeros()
}

/// Lower bound on the squared distance from `q` to any point whose Morton
/// code lies between `a`'s and `b`'s (inclusive), where `a` and `b` are
/// Z-order-sorted (`a` precedes `b`).
///
/// The true quad/oct-box narrows each dimension to the bit level implied by
/// that specific dimension's position relative to the overall leading
/// differing bit; this implementation uses the coarser, uniform split level
/// (the leading bit plus one) for every dimension, which only ever widens
/// the box. A wider box is still a superset of the curve interval, so the
/// resulting distance remains a valid lower bound. It prunes slightly less
/// aggressively than the tightest possible box, never incorrectly.
pub fn dist_sq_to_box<const D: usize>(q: &Point<D>, a: &Point<D>, b: &Point<D>) -> u128 {
    let ab = biased_coords(a);
    let bb = biased_coords(b);
    let qb = biased_coords(q);

    let (lo, hi) = match leading_dim(&ab, &bb) {
        None => (ab, ab),
        Some((j, xor)) => {
            let bit = highest_set_bit(xor);
            let mut lo = [0u64; D];
            let mut hi = [0u64; D];
            for i in 0..D {
                let base = ab[i].min(bb[i]);
                if bit == 63 {
                    lo[i] = 0;
                    hi[i] = u64::MAX;
                } else {
                    let span = 1u64 << (bit + 1);
                    lo[i] = (base >> (bit + 1)) << (bit + 1);
                    hi[i] = lo[i] + (span - 1);
                }
            }
            let _ = j;
            (lo, hi)
        }
    };

    let mut acc: u128 = 0;
    for i in 0..D {
        let q_i = qb[i];
        let lo_i = lo[i];
        let hi_i = hi[i];
        let diff = if q_i < lo_i {
            (lo_i - q_i) as u128
        } else if q_i > hi_i {
            (q_i - hi_i) as u128
        } else {
            0
        };
        // diff fits in u64, so diff*diff fits in u128; the cross-dimension
        // sum can still exceed u128::MAX (see Point::sqr_dist), hence saturating.
        acc = acc.saturating_add(diff * diff);
    }
    acc
}

//! Bracket search along a single sorted grid axis.
//!
//! Every continuous axis is searched independently. Out-of-range queries are
//! not rejected here: they are assigned the nearest edge cell and their
//! interpolation fraction is held to `[0, 1]`, so they evaluate to the edge
//! value. Range enforcement belongs to input validation.

use ndarray::ArrayView1;

/// The pair of neighbouring samples enclosing a query, and the query's
/// relative position between them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisBracket {
    pub lower: usize,
    pub upper: usize,
    /// Position between `lower` (0.0) and `upper` (1.0).
    pub fraction: f64,
}

/// Index of the lower sample of the cell that `value` falls in.
///
/// - `value <= axis[0]` gives `0`
/// - `value >= axis[n - 1]` gives `n - 2`, so `n - 1` is still a valid neighbour
/// - otherwise the largest `i` with `axis[i] <= value < axis[i + 1]`
///
/// `axis` must be non-empty and strictly increasing.
pub fn lower_index(axis: ArrayView1<'_, f64>, value: f64) -> usize {
    let n = axis.len();
    if n < 2 || value <= axis[0] {
        return 0;
    }
    if value >= axis[n - 1] {
        return n - 2;
    }

    // axis[lo] <= value < axis[hi] holds throughout.
    let mut lo = 0;
    let mut hi = n - 1;
    while hi - lo > 1 {
        let mid = lo + (hi - lo) / 2;
        if axis[mid] <= value {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    lo
}

/// Locates `value` on `axis` and computes its interpolation fraction.
pub fn bracket(axis: ArrayView1<'_, f64>, value: f64) -> AxisBracket {
    let last = axis.len().saturating_sub(1);
    let lower = lower_index(axis, value);
    let upper = (lower + 1).min(last);

    let fraction = if upper == lower {
        0.0
    } else {
        ((value - axis[lower]) / (axis[upper] - axis[lower])).clamp(0.0, 1.0)
    };

    AxisBracket {
        lower,
        upper,
        fraction,
    }
}

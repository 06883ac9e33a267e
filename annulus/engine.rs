//! # Interpolation Engine
//!
//! Maps a validated patient query onto the grid and produces the interpolated
//! mean and standard deviation.
//!
//! 1. Transform: `x = ln(kg)`, `y = sqrt(cm)`, `z = ln(years + 1)`.
//! 2. Locate: each continuous axis is bracketed independently
//!    (see [`crate::axis`]); sex selects the value plane.
//! 3. Blend: the 8 surrounding vertices are combined along weight, then
//!    height, then age.
//!
//! A query is located once and the same [`GridCell`] drives both statistics,
//! so mean and standard deviation always share interpolation weights.

use crate::axis::{AxisBracket, bracket};
use crate::grid::{AadGrid, GridAxis};
use crate::stats::Prediction;
use crate::types::{PredictionQuery, Sex, Statistic};
use std::sync::Arc;

/// A query expressed on the grid's transformed axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformedPoint {
    pub log_weight: f64,
    pub sqrt_height: f64,
    pub log_age_plus_1: f64,
}

impl TransformedPoint {
    pub fn from_query(query: &PredictionQuery) -> Self {
        Self {
            log_weight: GridAxis::Weight.transform(query.weight_kg),
            sqrt_height: GridAxis::Height.transform(query.height_cm),
            log_age_plus_1: GridAxis::Age.transform(query.age_years),
        }
    }

    pub fn coordinate(&self, axis: GridAxis) -> f64 {
        match axis {
            GridAxis::Weight => self.log_weight,
            GridAxis::Height => self.sqrt_height,
            GridAxis::Age => self.log_age_plus_1,
        }
    }
}

/// The grid cell enclosing a query, with per-axis fractions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridCell {
    pub weight: AxisBracket,
    pub height: AxisBracket,
    pub age: AxisBracket,
    pub sex: Sex,
}

#[inline]
fn lerp(low: f64, high: f64, t: f64) -> f64 {
    low * (1.0 - t) + high * t
}

/// Answers point queries against a loaded grid.
#[derive(Debug, Clone)]
pub struct InterpolationEngine {
    grid: Arc<AadGrid>,
}

impl InterpolationEngine {
    pub fn new(grid: Arc<AadGrid>) -> Self {
        Self { grid }
    }

    pub fn grid(&self) -> &AadGrid {
        &self.grid
    }

    /// Finds the cell that `query` falls in.
    pub fn locate(&self, query: &PredictionQuery) -> GridCell {
        let point = TransformedPoint::from_query(query);
        let search = |axis: GridAxis| bracket(self.grid.axis(axis), point.coordinate(axis));
        GridCell {
            weight: search(GridAxis::Weight),
            height: search(GridAxis::Height),
            age: search(GridAxis::Age),
            sex: query.sex,
        }
    }

    /// Trilinear blend of one statistic over the 8 corners of `cell`.
    pub fn interpolate(&self, statistic: Statistic, cell: &GridCell) -> f64 {
        let (w, h, a) = (cell.weight, cell.height, cell.age);
        let vertex = |i: usize, j: usize, k: usize| self.grid.value(statistic, i, j, k, cell.sex);

        // Along weight: one line per (height, age) corner pair.
        let along_weight =
            |j: usize, k: usize| lerp(vertex(w.lower, j, k), vertex(w.upper, j, k), w.fraction);
        let c00 = along_weight(h.lower, a.lower);
        let c10 = along_weight(h.upper, a.lower);
        let c01 = along_weight(h.lower, a.upper);
        let c11 = along_weight(h.upper, a.upper);

        // Along height.
        let c0 = lerp(c00, c10, h.fraction);
        let c1 = lerp(c01, c11, h.fraction);

        // Along age.
        lerp(c0, c1, a.fraction)
    }

    /// Interpolated mean, standard deviation and normal range for `query`.
    ///
    /// The query must already be validated; out-of-grid values evaluate to the
    /// nearest edge of the grid rather than failing.
    pub fn predict(&self, query: &PredictionQuery) -> Prediction {
        let cell = self.locate(query);
        let mean = self.interpolate(Statistic::Mean, &cell);
        let std_dev = self.interpolate(Statistic::StdDev, &cell);
        log::trace!(
            "AAD query {query:?}: mean={mean:.4} sd={std_dev:.4} from w={}..{} h={}..{} a={}..{}",
            cell.weight.lower,
            cell.weight.upper,
            cell.height.lower,
            cell.height.upper,
            cell.age.lower,
            cell.age.upper
        );
        Prediction::from_statistics(mean, std_dev)
    }
}

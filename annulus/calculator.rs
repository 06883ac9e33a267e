//! Caller-facing entry point: validation, readiness and prediction in one place.

use crate::engine::InterpolationEngine;
use crate::grid::{AadGrid, GridError};
use crate::loader::GridSlot;
use crate::stats::Prediction;
use crate::types::{PredictionQuery, Sex};
use crate::validation::{DomainLimits, ValidationError};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Failures a prediction request can run into.
#[derive(Error, Debug, Clone)]
pub enum CalculatorError {
    /// The grid has not finished loading. Retry once it has.
    #[error("The AAD model is still loading; retry once loading completes.")]
    NotReady,
    /// The grid failed to load or was malformed. No calculation is possible.
    #[error("The AAD model is unavailable: {0}")]
    ModelUnavailable(Arc<GridError>),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Validates patient inputs and answers them from the grid once it is loaded.
#[derive(Debug, Default)]
pub struct Calculator {
    slot: GridSlot,
    limits: DomainLimits,
}

impl Calculator {
    /// A calculator whose grid is still to be loaded.
    pub fn new(limits: DomainLimits) -> Self {
        Self {
            slot: GridSlot::new(),
            limits,
        }
    }

    /// A calculator that is ready immediately.
    pub fn with_grid(grid: AadGrid, limits: DomainLimits) -> Self {
        Self {
            slot: GridSlot::ready(grid),
            limits,
        }
    }

    pub fn slot(&self) -> &GridSlot {
        &self.slot
    }

    pub fn limits(&self) -> &DomainLimits {
        &self.limits
    }

    pub async fn load(&self, path: &Path) -> Result<(), CalculatorError> {
        self.slot.load_from_path(path).await.map(|_| ())
    }

    /// An engine over the loaded grid.
    pub fn engine(&self) -> Result<InterpolationEngine, CalculatorError> {
        self.slot.grid().map(InterpolationEngine::new)
    }

    /// Predicts the annulus diameter for a typed query.
    pub fn predict(
        &self,
        age_years: f64,
        weight_kg: f64,
        height_cm: f64,
        sex: Sex,
    ) -> Result<Prediction, CalculatorError> {
        let engine = self.engine()?;
        let query = PredictionQuery::new(age_years, weight_kg, height_cm, sex);
        self.limits.validate(&query)?;
        Ok(engine.predict(&query))
    }

    /// Same as [`Calculator::predict`], with sex given as free text.
    pub fn predict_labeled(
        &self,
        age_years: f64,
        weight_kg: f64,
        height_cm: f64,
        sex_label: &str,
    ) -> Result<Prediction, CalculatorError> {
        let engine = self.engine()?;
        let query = self
            .limits
            .parse_query(age_years, weight_kg, height_cm, sex_label)?;
        Ok(engine.predict(&query))
    }
}

//! # Input Validation
//!
//! Rejects out-of-domain patient inputs before they reach the interpolation
//! engine. Unlike a fail-fast validator, every check runs on every call and
//! all violations are returned together, so a caller can show the complete
//! list of corrections at once.
//!
//! The default limits are the documented domain of the grid:
//! age 0-59 years, weight 1.34-352.27 kg and height 30.48-236.22 cm.

use crate::types::{PredictionQuery, Sex};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Inclusive range of acceptable values for one input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// True for finite values inside `[min, max]`.
    pub fn contains(&self, value: f64) -> bool {
        value.is_finite() && (self.min..=self.max).contains(&value)
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}

pub const DEFAULT_AGE_YEARS: Bounds = Bounds::new(0.0, 59.0);
pub const DEFAULT_WEIGHT_KG: Bounds = Bounds::new(1.34, 352.27);
pub const DEFAULT_HEIGHT_CM: Bounds = Bounds::new(30.48, 236.22);

/// Accepted ranges for the three continuous inputs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DomainLimits {
    pub age_years: Bounds,
    pub weight_kg: Bounds,
    pub height_cm: Bounds,
}

impl Default for DomainLimits {
    fn default() -> Self {
        Self {
            age_years: DEFAULT_AGE_YEARS,
            weight_kg: DEFAULT_WEIGHT_KG,
            height_cm: DEFAULT_HEIGHT_CM,
        }
    }
}

/// The query field a violation refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Age,
    Weight,
    Height,
    Sex,
}

impl Field {
    pub fn describe(self) -> &'static str {
        match self {
            Self::Age => "age",
            Self::Weight => "weight",
            Self::Height => "height",
            Self::Sex => "sex",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldViolation {
    pub field: Field,
    pub message: String,
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Every problem found with one patient query.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    violations: Vec<FieldViolation>,
}

impl ValidationError {
    pub fn violations(&self) -> &[FieldViolation] {
        &self.violations
    }

    pub fn fields(&self) -> Vec<Field> {
        self.violations.iter().map(|v| v.field).collect()
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid patient input ({} problem{}): {}",
            self.violations.len(),
            if self.violations.len() == 1 { "" } else { "s" },
            self.violations.iter().join("; ")
        )
    }
}

impl std::error::Error for ValidationError {}

impl DomainLimits {
    /// Checks the numeric fields of an already-typed query.
    pub fn validate(&self, query: &PredictionQuery) -> Result<(), ValidationError> {
        let violations = self.numeric_violations(query.age_years, query.weight_kg, query.height_cm);
        if violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { violations })
        }
    }

    /// Validates raw inputs, including the sex label, and builds a query.
    pub fn parse_query(
        &self,
        age_years: f64,
        weight_kg: f64,
        height_cm: f64,
        sex_label: &str,
    ) -> Result<PredictionQuery, ValidationError> {
        let mut violations = self.numeric_violations(age_years, weight_kg, height_cm);
        let sex = match sex_label.parse::<Sex>() {
            Ok(sex) => Some(sex),
            Err(err) => {
                violations.push(FieldViolation {
                    field: Field::Sex,
                    message: err.to_string(),
                });
                None
            }
        };

        match sex {
            Some(sex) if violations.is_empty() => {
                Ok(PredictionQuery::new(age_years, weight_kg, height_cm, sex))
            }
            _ => Err(ValidationError { violations }),
        }
    }

    fn numeric_violations(
        &self,
        age_years: f64,
        weight_kg: f64,
        height_cm: f64,
    ) -> Vec<FieldViolation> {
        [
            (Field::Age, age_years, self.age_years, "years"),
            (Field::Weight, weight_kg, self.weight_kg, "kg"),
            (Field::Height, height_cm, self.height_cm, "cm"),
        ]
        .into_iter()
        .filter(|(_, value, bounds, _)| !bounds.contains(*value))
        .map(|(field, value, bounds, unit)| FieldViolation {
            field,
            message: format!("{value} {unit} is outside {bounds} {unit}"),
        })
        .collect()
    }
}

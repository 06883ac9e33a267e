use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Patient sex. Selects one of the two value planes of the grid; it is never
/// treated as a continuous coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub const ALL: [Sex; 2] = [Sex::Male, Sex::Female];

    /// Index of this sex's plane in the flattened value arrays.
    pub fn plane(self) -> usize {
        match self {
            Self::Male => 0,
            Self::Female => 1,
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// Returned when a sex label is not one of the recognised spellings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSex(pub String);

impl fmt::Display for UnknownSex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' is not a recognised sex (use male or female)", self.0)
    }
}

impl std::error::Error for UnknownSex {}

impl FromStr for Sex {
    type Err = UnknownSex;

    fn from_str(label: &str) -> Result<Self, Self::Err> {
        match label {
            "male" => Ok(Self::Male),
            "female" => Ok(Self::Female),
            _ => Err(UnknownSex(label.to_string())),
        }
    }
}

/// The two statistics stored per grid vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Statistic {
    Mean,
    StdDev,
}

impl Statistic {
    pub fn describe(self) -> &'static str {
        match self {
            Self::Mean => "mean_aad",
            Self::StdDev => "std_dev",
        }
    }
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// A single patient query in raw clinical units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionQuery {
    pub age_years: f64,
    pub weight_kg: f64,
    pub height_cm: f64,
    pub sex: Sex,
}

impl PredictionQuery {
    pub fn new(age_years: f64, weight_kg: f64, height_cm: f64, sex: Sex) -> Self {
        Self {
            age_years,
            weight_kg,
            height_cm,
            sex,
        }
    }
}

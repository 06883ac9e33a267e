//! # Grid Store
//!
//! Owns the precomputed population grid the calculator interpolates in. The
//! grid has three continuous axes, each stored in a transformed scale:
//!
//! - weight as `ln(kg)`
//! - height as `sqrt(cm)`
//! - age as `ln(years + 1)`
//!
//! and a discrete sex selector with exactly two planes. Mean and standard
//! deviation are stored as one flat array each, with the weight index varying
//! fastest, then height, then age, then sex:
//!
//! `index = i + j·nW + k·nW·nH + s·nW·nH·nA`
//!
//! This layout is the contract with the grid data file and is implemented in
//! exactly one place, [`GridDimensions::flat_index`].
//!
//! A grid is validated once when it is built and is read-only afterwards.

use crate::types::{Sex, Statistic};
use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;
use thiserror::Error;

/// Number of sex planes every grid must carry.
pub const SEX_PLANES: usize = 2;

// --- Wire format ---
// These structs mirror the serialized grid resource exactly. Unknown fields are
// ignored so that metadata carried alongside the grid does not break loading.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridFile {
    pub grid_axes: GridAxes,
    pub dimensions: DeclaredDimensions,
    pub predictions: GridPredictions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridAxes {
    pub log_weight: Vec<f64>,
    pub sqrt_height: Vec<f64>,
    pub log_age_plus_1: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclaredDimensions {
    pub n_weight: usize,
    pub n_height: usize,
    pub n_age: usize,
    pub n_sex: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridPredictions {
    pub mean_aad: Vec<f64>,
    pub std_dev: Vec<f64>,
}

/// The three continuous axes of the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GridAxis {
    Weight,
    Height,
    Age,
}

impl GridAxis {
    pub const ALL: [GridAxis; 3] = [GridAxis::Weight, GridAxis::Height, GridAxis::Age];

    /// Field name of this axis in the grid file.
    pub fn field_name(self) -> &'static str {
        match self {
            Self::Weight => "log_weight",
            Self::Height => "sqrt_height",
            Self::Age => "log_age_plus_1",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Self::Weight => "kg",
            Self::Height => "cm",
            Self::Age => "years",
        }
    }

    /// Maps a raw clinical value onto this axis' sampling scale.
    pub fn transform(self, raw: f64) -> f64 {
        match self {
            Self::Weight => raw.ln(),
            Self::Height => raw.sqrt(),
            Self::Age => (raw + 1.0).ln(),
        }
    }

    /// Inverse of [`GridAxis::transform`].
    pub fn to_raw(self, transformed: f64) -> f64 {
        match self {
            Self::Weight => transformed.exp(),
            Self::Height => transformed * transformed,
            Self::Age => transformed.exp() - 1.0,
        }
    }
}

impl fmt::Display for GridAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}

/// Axis lengths of a validated grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridDimensions {
    pub n_weight: usize,
    pub n_height: usize,
    pub n_age: usize,
}

impl GridDimensions {
    /// Vertices in one sex plane.
    pub fn plane_len(&self) -> usize {
        self.n_weight * self.n_height * self.n_age
    }

    /// Required length of each flattened statistic array.
    pub fn value_len(&self) -> usize {
        self.plane_len() * SEX_PLANES
    }

    /// Flat offset of vertex `(i, j, k)` in the plane selected by `sex`.
    #[inline]
    pub fn flat_index(&self, i: usize, j: usize, k: usize, sex: Sex) -> usize {
        i + j * self.n_weight
            + k * self.n_weight * self.n_height
            + sex.plane() * self.plane_len()
    }

    pub fn axis_len(&self, axis: GridAxis) -> usize {
        match axis {
            GridAxis::Weight => self.n_weight,
            GridAxis::Height => self.n_height,
            GridAxis::Age => self.n_age,
        }
    }
}

/// Sampled extent of one axis, reported in both scales.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisSummary {
    pub axis: GridAxis,
    pub samples: usize,
    pub first: f64,
    pub last: f64,
}

impl AxisSummary {
    pub fn raw_range(&self) -> (f64, f64) {
        (self.axis.to_raw(self.first), self.axis.to_raw(self.last))
    }
}

impl fmt::Display for AxisSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (low, high) = self.raw_range();
        write!(
            f,
            "{}: {} samples, {:.2}-{:.2} {} ({:.4}..{:.4} transformed)",
            self.axis,
            self.samples,
            low,
            high,
            self.axis.unit(),
            self.first,
            self.last
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GridSummary {
    pub axes: [AxisSummary; 3],
    pub vertices: usize,
}

impl fmt::Display for GridSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Grid with {} vertices per statistic", self.vertices)?;
        for axis in &self.axes {
            writeln!(f, "  {axis}")?;
        }
        write!(f, "  sex: {SEX_PLANES} planes (male, female)")
    }
}

/// Data-integrity failures raised while reading or validating a grid.
#[derive(Error, Debug)]
pub enum GridError {
    #[error("Failed to read or write grid file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse or write JSON grid: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Failed to parse TOML grid: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Failed to serialize grid to TOML format: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    #[error("Unsupported grid file '{0}'; expected a .json or .toml extension")]
    UnsupportedFormat(String),
    #[error("Grid axis '{axis}' has no samples")]
    EmptyAxis { axis: GridAxis },
    #[error("Grid axis '{axis}' holds a non-finite sample at index {index}")]
    NonFiniteAxisSample { axis: GridAxis, index: usize },
    #[error(
        "Grid axis '{axis}' is not strictly increasing at index {index} ({previous} then {current})"
    )]
    AxisNotIncreasing {
        axis: GridAxis,
        index: usize,
        previous: f64,
        current: f64,
    },
    #[error("Grid declares {declared} samples for axis '{axis}', but the axis holds {actual}")]
    DimensionMismatch {
        axis: GridAxis,
        declared: usize,
        actual: usize,
    },
    #[error("Grid declares n_sex = {0}; exactly 2 sex planes (male, female) are required")]
    SexPlaneCount(usize),
    #[error("Statistic '{statistic}' has {found} values, but the axes require {expected}")]
    ValueCountMismatch {
        statistic: Statistic,
        expected: usize,
        found: usize,
    },
}

/// Serialization formats a grid can be stored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridFormat {
    Json,
    Toml,
}

impl GridFormat {
    pub fn from_path(path: &Path) -> Result<Self, GridError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("json") => Ok(Self::Json),
            Some("toml") => Ok(Self::Toml),
            _ => Err(GridError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// The validated, immutable aortic annulus diameter grid.
#[derive(Debug, Clone, PartialEq)]
pub struct AadGrid {
    log_weight: Array1<f64>,
    sqrt_height: Array1<f64>,
    log_age_plus_1: Array1<f64>,
    mean_aad: Array1<f64>,
    std_dev: Array1<f64>,
    dims: GridDimensions,
}

impl AadGrid {
    /// Validates a deserialized grid description and takes ownership of its data.
    pub fn from_grid_file(file: GridFile) -> Result<Self, GridError> {
        let GridFile {
            grid_axes,
            dimensions,
            predictions,
        } = file;

        if dimensions.n_sex != SEX_PLANES {
            return Err(GridError::SexPlaneCount(dimensions.n_sex));
        }

        let log_weight =
            validated_axis(GridAxis::Weight, grid_axes.log_weight, dimensions.n_weight)?;
        let sqrt_height =
            validated_axis(GridAxis::Height, grid_axes.sqrt_height, dimensions.n_height)?;
        let log_age_plus_1 =
            validated_axis(GridAxis::Age, grid_axes.log_age_plus_1, dimensions.n_age)?;

        let dims = GridDimensions {
            n_weight: log_weight.len(),
            n_height: sqrt_height.len(),
            n_age: log_age_plus_1.len(),
        };

        let mean_aad = validated_values(Statistic::Mean, predictions.mean_aad, &dims)?;
        let std_dev = validated_values(Statistic::StdDev, predictions.std_dev, &dims)?;

        Ok(Self {
            log_weight,
            sqrt_height,
            log_age_plus_1,
            mean_aad,
            std_dev,
            dims,
        })
    }

    pub fn from_json_str(text: &str) -> Result<Self, GridError> {
        let file: GridFile = serde_json::from_str(text)?;
        Self::from_grid_file(file)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, GridError> {
        let file: GridFile = toml::from_str(text)?;
        Self::from_grid_file(file)
    }

    /// Loads a grid from disk. The format is chosen from the file extension.
    pub fn load(path: &Path) -> Result<Self, GridError> {
        let format = GridFormat::from_path(path)?;
        let text = fs::read_to_string(path)?;
        let grid = match format {
            GridFormat::Json => Self::from_json_str(&text)?,
            GridFormat::Toml => Self::from_toml_str(&text)?,
        };
        log::debug!(
            "Read grid from {} ({} vertices per statistic)",
            path.display(),
            grid.dims.value_len()
        );
        Ok(grid)
    }

    /// Writes the grid back out, in the format implied by the file extension.
    pub fn save(&self, path: &Path) -> Result<(), GridError> {
        let format = GridFormat::from_path(path)?;
        let file = self.to_grid_file();
        let text = match format {
            GridFormat::Json => serde_json::to_string_pretty(&file)?,
            GridFormat::Toml => toml::to_string_pretty(&file)?,
        };
        let mut writer = BufWriter::new(fs::File::create(path)?);
        writer.write_all(text.as_bytes())?;
        writer.flush()?;
        Ok(())
    }

    /// Rebuilds the wire representation of this grid.
    pub fn to_grid_file(&self) -> GridFile {
        GridFile {
            grid_axes: GridAxes {
                log_weight: self.log_weight.to_vec(),
                sqrt_height: self.sqrt_height.to_vec(),
                log_age_plus_1: self.log_age_plus_1.to_vec(),
            },
            dimensions: DeclaredDimensions {
                n_weight: self.dims.n_weight,
                n_height: self.dims.n_height,
                n_age: self.dims.n_age,
                n_sex: SEX_PLANES,
            },
            predictions: GridPredictions {
                mean_aad: self.mean_aad.to_vec(),
                std_dev: self.std_dev.to_vec(),
            },
        }
    }

    pub fn dimensions(&self) -> GridDimensions {
        self.dims
    }

    pub fn axis(&self, axis: GridAxis) -> ArrayView1<'_, f64> {
        match axis {
            GridAxis::Weight => self.log_weight.view(),
            GridAxis::Height => self.sqrt_height.view(),
            GridAxis::Age => self.log_age_plus_1.view(),
        }
    }

    /// Value of `statistic` at vertex `(i, j, k)` of the `sex` plane.
    ///
    /// Indices are not range-checked here beyond slice indexing; the engine only
    /// hands out indices inside `[0, n - 1]` for each axis.
    #[inline]
    pub fn value(&self, statistic: Statistic, i: usize, j: usize, k: usize, sex: Sex) -> f64 {
        let index = self.dims.flat_index(i, j, k, sex);
        match statistic {
            Statistic::Mean => self.mean_aad[index],
            Statistic::StdDev => self.std_dev[index],
        }
    }

    pub fn summary(&self) -> GridSummary {
        let axes = GridAxis::ALL.map(|axis| {
            let samples = self.axis(axis);
            AxisSummary {
                axis,
                samples: samples.len(),
                first: samples[0],
                last: samples[samples.len() - 1],
            }
        });
        GridSummary {
            axes,
            vertices: self.dims.value_len(),
        }
    }
}

fn validated_axis(
    axis: GridAxis,
    samples: Vec<f64>,
    declared: usize,
) -> Result<Array1<f64>, GridError> {
    if samples.is_empty() {
        return Err(GridError::EmptyAxis { axis });
    }
    if samples.len() != declared {
        return Err(GridError::DimensionMismatch {
            axis,
            declared,
            actual: samples.len(),
        });
    }
    if let Some(index) = samples.iter().position(|v| !v.is_finite()) {
        return Err(GridError::NonFiniteAxisSample { axis, index });
    }
    if let Some(offset) = samples.windows(2).position(|pair| pair[1] <= pair[0]) {
        return Err(GridError::AxisNotIncreasing {
            axis,
            index: offset + 1,
            previous: samples[offset],
            current: samples[offset + 1],
        });
    }
    Ok(Array1::from_vec(samples))
}

fn validated_values(
    statistic: Statistic,
    values: Vec<f64>,
    dims: &GridDimensions,
) -> Result<Array1<f64>, GridError> {
    let expected = dims.value_len();
    if values.len() != expected {
        return Err(GridError::ValueCountMismatch {
            statistic,
            expected,
            found: values.len(),
        });
    }
    Ok(Array1::from_vec(values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    /// A 3 × 2 × 2 grid whose values encode their own (i, j, k, s) coordinates,
    /// so any addressing mistake shows up as a wrong digit.
    fn coordinate_grid() -> GridFile {
        let (nw, nh, na) = (3, 2, 2);
        let mut mean_aad = Vec::new();
        let mut std_dev = Vec::new();
        for s in 0..SEX_PLANES {
            for k in 0..na {
                for j in 0..nh {
                    for i in 0..nw {
                        let code = (1000 * s + 100 * k + 10 * j + i) as f64;
                        mean_aad.push(code);
                        std_dev.push(code / 1000.0);
                    }
                }
            }
        }
        GridFile {
            grid_axes: GridAxes {
                log_weight: vec![0.5, 1.5, 2.5],
                sqrt_height: vec![6.0, 9.0],
                log_age_plus_1: vec![0.0, 2.0],
            },
            dimensions: DeclaredDimensions {
                n_weight: nw,
                n_height: nh,
                n_age: na,
                n_sex: 2,
            },
            predictions: GridPredictions { mean_aad, std_dev },
        }
    }

    #[test]
    fn flat_index_varies_weight_fastest() {
        let dims = GridDimensions {
            n_weight: 4,
            n_height: 3,
            n_age: 2,
        };
        assert_eq!(dims.flat_index(0, 0, 0, Sex::Male), 0);
        assert_eq!(dims.flat_index(1, 0, 0, Sex::Male), 1);
        assert_eq!(dims.flat_index(0, 1, 0, Sex::Male), 4);
        assert_eq!(dims.flat_index(0, 0, 1, Sex::Male), 12);
        assert_eq!(dims.flat_index(0, 0, 0, Sex::Female), 24);
        assert_eq!(dims.flat_index(3, 2, 1, Sex::Female), 47);
        assert_eq!(dims.value_len(), 48);
    }

    #[test]
    fn lookup_follows_the_file_layout() {
        let grid = AadGrid::from_grid_file(coordinate_grid()).unwrap();
        for sex in Sex::ALL {
            for k in 0..2 {
                for j in 0..2 {
                    for i in 0..3 {
                        let expected = (1000 * sex.plane() + 100 * k + 10 * j + i) as f64;
                        assert_eq!(grid.value(Statistic::Mean, i, j, k, sex), expected);
                        assert_eq!(
                            grid.value(Statistic::StdDev, i, j, k, sex),
                            expected / 1000.0
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn rejects_value_arrays_of_the_wrong_length() {
        let mut file = coordinate_grid();
        file.predictions.std_dev.pop();
        match AadGrid::from_grid_file(file) {
            Err(GridError::ValueCountMismatch {
                statistic,
                expected,
                found,
            }) => {
                assert_eq!(statistic, Statistic::StdDev);
                assert_eq!(expected, 24);
                assert_eq!(found, 23);
            }
            other => panic!("expected ValueCountMismatch, got {other:?}"),
        }
    }

    #[test]
    fn rejects_axes_that_are_not_strictly_increasing() {
        let mut file = coordinate_grid();
        file.grid_axes.log_weight = vec![0.5, 0.5, 2.5];
        assert!(matches!(
            AadGrid::from_grid_file(file),
            Err(GridError::AxisNotIncreasing {
                axis: GridAxis::Weight,
                index: 1,
                ..
            })
        ));

        let mut file = coordinate_grid();
        file.grid_axes.log_age_plus_1 = vec![2.0, 0.0];
        assert!(matches!(
            AadGrid::from_grid_file(file),
            Err(GridError::AxisNotIncreasing {
                axis: GridAxis::Age,
                ..
            })
        ));
    }

    #[test]
    fn rejects_inconsistent_declared_dimensions() {
        let mut file = coordinate_grid();
        file.dimensions.n_height = 3;
        assert!(matches!(
            AadGrid::from_grid_file(file),
            Err(GridError::DimensionMismatch {
                axis: GridAxis::Height,
                declared: 3,
                actual: 2,
            })
        ));

        let mut file = coordinate_grid();
        file.dimensions.n_sex = 1;
        assert!(matches!(
            AadGrid::from_grid_file(file),
            Err(GridError::SexPlaneCount(1))
        ));
    }

    #[test]
    fn rejects_empty_and_non_finite_axes() {
        let mut file = coordinate_grid();
        file.grid_axes.sqrt_height.clear();
        file.dimensions.n_height = 0;
        assert!(matches!(
            AadGrid::from_grid_file(file),
            Err(GridError::EmptyAxis {
                axis: GridAxis::Height
            })
        ));

        let mut file = coordinate_grid();
        file.grid_axes.log_weight[2] = f64::INFINITY;
        assert!(matches!(
            AadGrid::from_grid_file(file),
            Err(GridError::NonFiniteAxisSample {
                axis: GridAxis::Weight,
                index: 2
            })
        ));
    }

    #[test]
    fn missing_fields_fail_to_parse() {
        let text = r#"{
            "grid_axes": { "log_weight": [0.0, 1.0], "sqrt_height": [1.0, 2.0] },
            "dimensions": { "n_weight": 2, "n_height": 2, "n_age": 1, "n_sex": 2 },
            "predictions": { "mean_aad": [], "std_dev": [] }
        }"#;
        assert!(matches!(
            AadGrid::from_json_str(text),
            Err(GridError::Json(_))
        ));
    }

    #[test]
    fn json_and_toml_files_load_identically() {
        let dir = tempdir().expect("temporary directory");
        let grid = AadGrid::from_grid_file(coordinate_grid()).unwrap();

        let json_path = dir.path().join("grid.json");
        let toml_path = dir.path().join("grid.toml");
        grid.save(&json_path).expect("save json grid");
        grid.save(&toml_path).expect("save toml grid");

        let from_json = AadGrid::load(&json_path).expect("load json grid");
        let from_toml = AadGrid::load(&toml_path).expect("load toml grid");
        assert_eq!(from_json, grid);
        assert_eq!(from_toml, grid);
    }

    #[test]
    fn unknown_extensions_are_rejected() {
        let dir = tempdir().expect("temporary directory");
        let path = dir.path().join("grid.csv");
        fs::write(&path, "not a grid").unwrap();
        assert!(matches!(
            AadGrid::load(&path),
            Err(GridError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn summary_reports_raw_ranges() {
        let grid = AadGrid::from_grid_file(coordinate_grid()).unwrap();
        let summary = grid.summary();
        assert_eq!(summary.vertices, 24);

        let height = summary.axes[1];
        assert_eq!(height.axis, GridAxis::Height);
        assert_eq!(height.samples, 2);
        let (low, high) = height.raw_range();
        assert!((low - 36.0).abs() < 1e-12);
        assert!((high - 81.0).abs() < 1e-12);

        let (age_low, age_high) = summary.axes[2].raw_range();
        assert!(age_low.abs() < 1e-12);
        assert!((age_high - (2.0_f64.exp() - 1.0)).abs() < 1e-12);
    }

    #[test]
    fn axis_transforms_round_trip() {
        for axis in GridAxis::ALL {
            for raw in [1.5, 30.48, 70.0, 236.22] {
                let back = axis.to_raw(axis.transform(raw));
                assert!((back - raw).abs() < 1e-9, "{axis}: {raw} became {back}");
            }
        }
    }
}

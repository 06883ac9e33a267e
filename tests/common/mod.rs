use annulus::grid::{AadGrid, DeclaredDimensions, GridAxes, GridAxis, GridFile, GridPredictions};
use annulus::types::Sex;
use itertools::iproduct;

// Raw clinical sample points, unevenly spaced on purpose.
pub const WEIGHT_KG: [f64; 5] = [2.0, 10.0, 40.0, 90.0, 200.0];
pub const HEIGHT_CM: [f64; 4] = [45.0, 100.0, 160.0, 210.0];
pub const AGE_YEARS: [f64; 5] = [0.0, 1.0, 10.0, 30.0, 59.0];

/// Mean at vertex `(i, j, k)` of `sex`; no two vertices share a value.
pub fn vertex_mean(i: usize, j: usize, k: usize, sex: Sex) -> f64 {
    8.0 + 1.7 * i as f64 + 0.9 * j as f64 + 0.35 * k as f64 + 0.013 * (i * j * k) as f64
        + 2.5 * sex.plane() as f64
}

pub fn vertex_sd(i: usize, j: usize, k: usize, sex: Sex) -> f64 {
    0.6 + 0.11 * i as f64 + 0.07 * j as f64 + 0.05 * k as f64 + 0.2 * sex.plane() as f64
}

pub fn fixture_file() -> GridFile {
    let (nw, nh, na) = (WEIGHT_KG.len(), HEIGHT_CM.len(), AGE_YEARS.len());
    let mut mean_aad = Vec::with_capacity(nw * nh * na * 2);
    let mut std_dev = Vec::with_capacity(nw * nh * na * 2);
    // Weight varies fastest, sex slowest.
    for (sex, k, j, i) in iproduct!(Sex::ALL, 0..na, 0..nh, 0..nw) {
        mean_aad.push(vertex_mean(i, j, k, sex));
        std_dev.push(vertex_sd(i, j, k, sex));
    }

    GridFile {
        grid_axes: GridAxes {
            log_weight: WEIGHT_KG.iter().map(|&v| GridAxis::Weight.transform(v)).collect(),
            sqrt_height: HEIGHT_CM.iter().map(|&v| GridAxis::Height.transform(v)).collect(),
            log_age_plus_1: AGE_YEARS.iter().map(|&v| GridAxis::Age.transform(v)).collect(),
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

pub fn fixture_grid() -> AadGrid {
    AadGrid::from_grid_file(fixture_file()).expect("fixture grid is valid")
}

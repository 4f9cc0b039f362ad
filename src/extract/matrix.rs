//! Reshaping a column into a grid for contour plots.

use crate::error::{Error, Result};

/// Reshape `z` into a `(y.len(), x.len())` grid.
///
/// `x` and `y` are usually the unique values of the two swept parameters.
/// The grid is flipped vertically, rotated clockwise `orientation` times,
/// and flipped back.
pub fn create_matrix(x: &[f64], y: &[f64], z: &[f64], orientation: usize) -> Result<Vec<Vec<f64>>> {
    let expected = x.len() * y.len();
    if z.len() != expected {
        return Err(Error::ShapeMismatch {
            expected,
            actual: z.len(),
        });
    }
    if expected == 0 {
        return Ok(Vec::new());
    }

    let mut grid: Vec<Vec<f64>> = z.chunks(x.len()).map(|row| row.to_vec()).collect();
    grid.reverse();
    for _ in 0..orientation % 4 {
        grid = rotate_clockwise(&grid);
    }
    grid.reverse();
    Ok(grid)
}

/// Rotate a rectangular grid 90 degrees clockwise.
pub fn rotate_clockwise(grid: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let rows = grid.len();
    let cols = grid.first().map_or(0, |r| r.len());
    (0..cols)
        .map(|c| (0..rows).map(|r| grid[rows - 1 - r][c]).collect())
        .collect()
}

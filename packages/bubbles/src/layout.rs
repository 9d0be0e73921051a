//! Serpentine grid layout.
//!
//! Columns are fixed at `ceil(n / row_count)`. Cells are visited row by
//! row, alternating direction (row 0 left to right, row 1 right to left,
//! ...), so consecutive ranks stay spatially adjacent across row breaks.

use chile_dashboard_bubbles_models::{GridLayout, LayoutCell, LayoutConfig};

/// Errors that can occur while computing a layout.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum LayoutError {
    /// Container dimensions are non-finite or not positive.
    #[error("Invalid container size {width}x{height}")]
    InvalidContainer {
        /// Requested width.
        width: f64,
        /// Requested height.
        height: f64,
    },

    /// A row count of zero was requested.
    #[error("Row count must be at least 1")]
    InvalidRowCount,

    /// Cells would be smaller than the configured minimum.
    #[error(
        "Insufficient space: cells would be {cell_width:.1}x{cell_height:.1}, minimum is {minimum}"
    )]
    InsufficientSpace {
        /// Cell width the container allows.
        cell_width: f64,
        /// Cell height the container allows.
        cell_height: f64,
        /// Configured minimum side.
        minimum: f64,
    },
}

/// Columns and rows for `n` records with a target of `row_count` rows.
///
/// An empty record set still gets a single-cell shape so cell sizes stay
/// positive.
const fn grid_shape(n: usize, row_count: usize) -> (usize, usize) {
    if n == 0 {
        return (1, 1);
    }
    let columns = n.div_ceil(row_count);
    (columns, n.div_ceil(columns))
}

#[allow(clippy::cast_precision_loss)]
fn cell_extent(extent: f64, padding: f64, gap: f64, count: usize) -> f64 {
    let count = count as f64;
    (2.0f64.mul_add(-padding, extent) - gap * (count - 1.0)) / count
}

fn check_inputs(width: f64, height: f64, row_count: usize) -> Result<(), LayoutError> {
    if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
        return Err(LayoutError::InvalidContainer { width, height });
    }
    if row_count == 0 {
        return Err(LayoutError::InvalidRowCount);
    }
    Ok(())
}

#[allow(clippy::cast_precision_loss)]
fn place(
    n: usize,
    columns: usize,
    cell_width: f64,
    cell_height: f64,
    config: &LayoutConfig,
) -> Vec<LayoutCell> {
    (0..n)
        .map(|index| {
            let row = index / columns;
            let offset = index % columns;
            let column = if row % 2 == 0 {
                offset
            } else {
                columns - 1 - offset
            };

            LayoutCell {
                index,
                column,
                row,
                center_x: (column as f64).mul_add(cell_width + config.gap_x, config.padding_x)
                    + cell_width / 2.0,
                center_y: (row as f64).mul_add(cell_height + config.gap_y, config.padding_y)
                    + cell_height / 2.0,
            }
        })
        .collect()
}

/// Computes cell centers for `n` records inside a `width` x `height`
/// container, using the padding, gaps and minimum cell size of `config`.
///
/// Deterministic: identical inputs always give identical centers.
///
/// # Errors
///
/// Returns [`LayoutError::InvalidContainer`] or
/// [`LayoutError::InvalidRowCount`] for unusable inputs, and
/// [`LayoutError::InsufficientSpace`] when a cell side would fall below
/// `config.min_cell_size`.
pub fn compute_layout(
    n: usize,
    width: f64,
    height: f64,
    row_count: usize,
    config: &LayoutConfig,
) -> Result<GridLayout, LayoutError> {
    check_inputs(width, height, row_count)?;

    let (columns, rows) = grid_shape(n, row_count);
    let cell_width = cell_extent(width, config.padding_x, config.gap_x, columns);
    let cell_height = cell_extent(height, config.padding_y, config.gap_y, rows);

    if cell_width < config.min_cell_size || cell_height < config.min_cell_size {
        return Err(LayoutError::InsufficientSpace {
            cell_width,
            cell_height,
            minimum: config.min_cell_size,
        });
    }

    Ok(GridLayout {
        cells: place(n, columns, cell_width, cell_height, config),
        columns,
        rows,
        cell_width,
        cell_height,
        overflow: false,
    })
}

/// Like [`compute_layout`], but cells that would be too small are grown
/// to `config.min_cell_size` and the grid is allowed to extend past the
/// container. The result is flagged with `overflow = true` when that
/// happened.
///
/// # Errors
///
/// Returns [`LayoutError::InvalidContainer`] or
/// [`LayoutError::InvalidRowCount`] for unusable inputs.
pub fn compute_layout_overflowing(
    n: usize,
    width: f64,
    height: f64,
    row_count: usize,
    config: &LayoutConfig,
) -> Result<GridLayout, LayoutError> {
    check_inputs(width, height, row_count)?;

    let (columns, rows) = grid_shape(n, row_count);
    let fitted_width = cell_extent(width, config.padding_x, config.gap_x, columns);
    let fitted_height = cell_extent(height, config.padding_y, config.gap_y, rows);

    let cell_width = fitted_width.max(config.min_cell_size);
    let cell_height = fitted_height.max(config.min_cell_size);
    let overflow = cell_width > fitted_width || cell_height > fitted_height;

    Ok(GridLayout {
        cells: place(n, columns, cell_width, cell_height, config),
        columns,
        rows,
        cell_width,
        cell_height,
        overflow,
    })
}

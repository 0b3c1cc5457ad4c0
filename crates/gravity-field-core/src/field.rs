//! Grid-sampled potential field.
//!
//! The grid has `ceil(width / resolution) + 1` columns and
//! `ceil(height / resolution) + 1` rows; column `c` sits at world
//! `x = c / (columns - 1) * width`, so the outer grid lines lie exactly on the
//! world edges. Every `rebuild` recomputes all cells from scratch, costing
//! `O(columns * rows * sources)`. Continuous queries are bilinear over the grid.

use crate::config::{ConfigError, FieldConfig};
use crate::constants::GRADIENT_EPSILON;
use crate::emitter::PotentialSource;
use crate::vector::Vec2;
use rayon::prelude::*;

#[derive(Clone, Debug)]
pub struct PotentialField {
    config: FieldConfig,
    columns: usize,
    rows: usize,
    grid: Vec<f64>,
    min_potential: f64,
    max_potential: f64,
}

impl PotentialField {
    pub fn new(config: FieldConfig) -> Self {
        Self::try_new(config).unwrap_or_else(|e| panic!("{e}"))
    }

    pub fn try_new(config: FieldConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let (columns, rows) = config.grid_dimensions();
        Ok(Self {
            config,
            columns,
            rows,
            grid: vec![config.baseline; columns * rows],
            min_potential: config.baseline,
            max_potential: config.baseline,
        })
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// World extent `[width, height]`.
    pub fn size(&self) -> Vec2 {
        [self.config.width, self.config.height]
    }

    pub fn resolution(&self) -> f64 {
        self.config.resolution
    }

    pub fn baseline(&self) -> f64 {
        self.config.baseline
    }

    /// Takes effect on the next `rebuild`; the grid is not touched.
    pub fn set_baseline(&mut self, value: f64) {
        self.config.baseline = value;
    }

    /// Row-major cell values from the last rebuild.
    pub fn values(&self) -> &[f64] {
        &self.grid
    }

    /// `(min, max)` over all cells of the last rebuild.
    pub fn potential_range(&self) -> (f64, f64) {
        (self.min_potential, self.max_potential)
    }

    /// World coordinates of grid node `(col, row)`.
    pub fn grid_point(&self, col: usize, row: usize) -> Vec2 {
        [
            col as f64 / (self.columns - 1) as f64 * self.config.width,
            row as f64 / (self.rows - 1) as f64 * self.config.height,
        ]
    }

    pub fn rebuild<S: PotentialSource>(&mut self, sources: &[S]) {
        let columns = self.columns;
        let mut grid = std::mem::take(&mut self.grid);
        for (row, cells) in grid.chunks_mut(columns).enumerate() {
            self.fill_row(row, cells, sources);
        }
        self.grid = grid;
        self.update_range();
    }

    /// Same result as [`PotentialField::rebuild`], with rows filled in parallel.
    pub fn rebuild_par<S: PotentialSource + Sync>(&mut self, sources: &[S]) {
        let columns = self.columns;
        let mut grid = std::mem::take(&mut self.grid);
        {
            let this = &*self;
            grid.par_chunks_mut(columns)
                .enumerate()
                .for_each(|(row, cells)| this.fill_row(row, cells, sources));
        }
        self.grid = grid;
        self.update_range();
    }

    fn fill_row<S: PotentialSource>(&self, row: usize, cells: &mut [f64], sources: &[S]) {
        let baseline = self.config.baseline;
        for (col, cell) in cells.iter_mut().enumerate() {
            let point = self.grid_point(col, row);
            let mut total = baseline;
            for source in sources {
                total += source.potential_at(point);
            }
            *cell = total;
        }
    }

    fn update_range(&mut self) {
        let (min, max) = self
            .grid
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        if min.is_finite() && max.is_finite() {
            self.min_potential = min;
            self.max_potential = max;
        } else {
            self.min_potential = self.config.baseline;
            self.max_potential = self.config.baseline;
        }
    }

    /// Bilinear interpolation at a world point.
    ///
    /// Base cell indices are clamped to the grid, so points outside the world
    /// extrapolate linearly from the nearest edge cell and the result is
    /// continuous across the boundary.
    pub fn sample_potential(&self, point: Vec2) -> f64 {
        let gx = point[0] / self.config.width * (self.columns - 1) as f64;
        let gy = point[1] / self.config.height * (self.rows - 1) as f64;
        let x0 = Self::base_index(gx, self.columns);
        let y0 = Self::base_index(gy, self.rows);
        let x1 = x0 + 1;
        let y1 = y0 + 1;
        let sx = gx - x0 as f64;
        let sy = gy - y0 as f64;

        let at = |x: usize, y: usize| self.grid[y * self.columns + x];
        let top = at(x0, y0) * (1.0 - sx) + at(x1, y0) * sx;
        let bottom = at(x0, y1) * (1.0 - sx) + at(x1, y1) * sx;
        top * (1.0 - sy) + bottom * sy
    }

    // Lower corner of the interpolation cell; `len` is always at least 2.
    fn base_index(g: f64, len: usize) -> usize {
        let max = (len - 2) as f64;
        if g.is_nan() {
            return 0;
        }
        g.floor().clamp(0.0, max) as usize
    }

    /// Finite-difference gradient `[d/dx, d/dy]` of the sampled potential.
    ///
    /// Uses a central difference with step `resolution`. The query point is
    /// clamped into the world, and each probe is clamped to the world edge, in
    /// which case the difference becomes one-sided and is divided by the
    /// actual probe span (floored at `GRADIENT_EPSILON`).
    pub fn gradient(&self, point: Vec2) -> Vec2 {
        let h = self.config.resolution;
        let [width, height] = self.size();
        let x = point[0].clamp(0.0, width);
        let y = point[1].clamp(0.0, height);

        let left = (x - h).max(0.0);
        let right = (x + h).min(width);
        let up = (y - h).max(0.0);
        let down = (y + h).min(height);

        let dx = (self.sample_potential([right, y]) - self.sample_potential([left, y]))
            / (right - left).max(GRADIENT_EPSILON);
        let dy = (self.sample_potential([x, down]) - self.sample_potential([x, up]))
            / (down - up).max(GRADIENT_EPSILON);
        [dx, dy]
    }

    /// Cell values rescaled to `[0, 1]` against the last rebuild's range.
    pub fn normalized_values(&self) -> impl Iterator<Item = f64> + '_ {
        let range = (self.max_potential - self.min_potential).max(GRADIENT_EPSILON);
        let min = self.min_potential;
        self.grid.iter().map(move |&v| (v - min) / range)
    }
}

use ndarray::Array2;

/// Source of ground elevation (metres above sea level).
///
/// `None` means no data for that point; callers treat it as unmasked.
pub trait ElevationProvider: Send + Sync {
    fn elevation_at(&self, lat_deg: f64, lon_deg: f64) -> Option<f64>;
}

/// Provider with no coverage anywhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoElevationData;

impl ElevationProvider for NoElevationData {
    fn elevation_at(&self, _lat_deg: f64, _lon_deg: f64) -> Option<f64> {
        None
    }
}

/// Constant-height terrain.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatTerrain {
    pub elevation_m: f64,
}

impl ElevationProvider for FlatTerrain {
    fn elevation_at(&self, _lat_deg: f64, _lon_deg: f64) -> Option<f64> {
        Some(self.elevation_m)
    }
}

/// Regular lat/lon elevation grid. Row 0 is the southern edge, column 0 the western edge.
#[derive(Debug, Clone)]
pub struct ElevationGrid {
    origin_lat_deg: f64,
    origin_lon_deg: f64,
    spacing_deg: f64,
    heights: Array2<f64>,
    nodata: f64,
}

impl ElevationGrid {
    pub fn new(
        origin_lat_deg: f64,
        origin_lon_deg: f64,
        spacing_deg: f64,
        heights: Array2<f64>,
        nodata: f64,
    ) -> Self {
        Self {
            origin_lat_deg,
            origin_lon_deg,
            spacing_deg,
            heights,
            nodata,
        }
    }

    fn cell(&self, row: usize, col: usize) -> Option<f64> {
        let value = *self.heights.get((row, col))?;
        if value.is_nan() || value == self.nodata {
            None
        } else {
            Some(value)
        }
    }
}

impl ElevationProvider for ElevationGrid {
    /// Bilinear interpolation; any missing corner makes the point missing.
    fn elevation_at(&self, lat_deg: f64, lon_deg: f64) -> Option<f64> {
        let (rows, cols) = self.heights.dim();
        if rows == 0 || cols == 0 || self.spacing_deg <= 0.0 {
            return None;
        }

        let row_f = (lat_deg - self.origin_lat_deg) / self.spacing_deg;
        let col_f = (lon_deg - self.origin_lon_deg) / self.spacing_deg;
        if row_f < 0.0 || col_f < 0.0 || row_f > (rows - 1) as f64 || col_f > (cols - 1) as f64 {
            return None;
        }

        let r0 = row_f.floor() as usize;
        let c0 = col_f.floor() as usize;
        let r1 = (r0 + 1).min(rows - 1);
        let c1 = (c0 + 1).min(cols - 1);
        let fr = row_f - r0 as f64;
        let fc = col_f - c0 as f64;

        let south = self.cell(r0, c0)? * (1.0 - fc) + self.cell(r0, c1)? * fc;
        let north = self.cell(r1, c0)? * (1.0 - fc) + self.cell(r1, c1)? * fc;
        Some(south * (1.0 - fr) + north * fr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn grid_interpolates_bilinearly() {
        let grid = ElevationGrid::new(0.0, 0.0, 1.0, array![[0.0, 10.0], [20.0, 30.0]], -9999.0);
        assert_eq!(grid.elevation_at(0.0, 0.0), Some(0.0));
        assert_eq!(grid.elevation_at(0.5, 0.5), Some(15.0));
        assert_eq!(grid.elevation_at(1.0, 1.0), Some(30.0));
    }

    #[test]
    fn grid_reports_gaps() {
        let grid = ElevationGrid::new(0.0, 0.0, 1.0, array![[0.0, -9999.0], [20.0, 30.0]], -9999.0);
        assert_eq!(grid.elevation_at(0.5, 0.5), None);
        assert_eq!(grid.elevation_at(-0.1, 0.5), None);
        assert_eq!(grid.elevation_at(0.5, 1.5), None);
        assert_eq!(grid.elevation_at(1.0, 0.0), Some(20.0));
    }

    #[test]
    fn trivial_providers() {
        assert_eq!(NoElevationData.elevation_at(1.0, 2.0), None);
        assert_eq!(FlatTerrain { elevation_m: 42.0 }.elevation_at(1.0, 2.0), Some(42.0));
    }
}

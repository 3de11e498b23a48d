//! Cartesian voxel mesh: an immutable grid descriptor.
//!
//! Grounded on `original_source/reactions-diffusion/biofvm/src/mesh.cpp`:
//! `grid_shape[i] = ceil((max_i - min_i) / voxel_shape_i)`, and
//! `voxel_center(idx) = min_i + (idx_i + 0.5) * h_i`.

use crate::errors::CalcError;

/// A Cartesian mesh over up to three axes. Dimensionality below three is
/// represented by setting the unused axes' bounds to a single voxel of
/// width 1 so that index arithmetic never has to special-case `dims`.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CartesianMesh {
    dims: usize,
    bounding_box_min: [f64; 3],
    bounding_box_max: [f64; 3],
    voxel_shape: [f64; 3],
    grid_shape: [usize; 3],
}

impl CartesianMesh {
    /// Builds a mesh from a bounding box and per-axis voxel size.
    ///
    /// `dims` must be 1, 2 or 3. Axes at or beyond `dims` are padded with
    /// a single voxel of width 1 spanning `[0, 1)` so that `voxel_count`
    /// and indexing never need to branch on dimensionality.
    pub fn new(
        dims: usize,
        bounding_box_min: &[f64],
        bounding_box_max: &[f64],
        voxel_shape: &[f64],
    ) -> Result<Self, CalcError> {
        if !(1..=3).contains(&dims) {
            return Err(CalcError(format!("unsupported mesh dimensionality {dims}")));
        }
        if bounding_box_min.len() < dims || bounding_box_max.len() < dims || voxel_shape.len() < dims {
            return Err(CalcError("bounding box / voxel shape shorter than dims".into()));
        }

        let mut min = [0.0f64; 3];
        let mut max = [1.0f64; 3];
        let mut shape = [1.0f64; 3];
        for i in 0..dims {
            if voxel_shape[i] <= 0.0 {
                return Err(CalcError(format!("voxel_shape[{i}] must be positive")));
            }
            if bounding_box_max[i] <= bounding_box_min[i] {
                return Err(CalcError(format!("bounding_box_max[{i}] must exceed bounding_box_min[{i}]")));
            }
            min[i] = bounding_box_min[i];
            max[i] = bounding_box_max[i];
            shape[i] = voxel_shape[i];
        }

        let mut grid_shape = [1usize; 3];
        for i in 0..dims {
            let extent = max[i] - min[i];
            grid_shape[i] = ((extent + shape[i] - 1.0) / shape[i]).ceil() as usize;
            grid_shape[i] = grid_shape[i].max(1);
        }

        Ok(Self {
            dims,
            bounding_box_min: min,
            bounding_box_max: max,
            voxel_shape: shape,
            grid_shape,
        })
    }

    pub fn dims(&self) -> usize {
        self.dims
    }

    pub fn grid_shape(&self) -> [usize; 3] {
        self.grid_shape
    }

    pub fn bounding_box_min(&self) -> [f64; 3] {
        self.bounding_box_min
    }

    pub fn bounding_box_max(&self) -> [f64; 3] {
        self.bounding_box_max
    }

    pub fn voxel_shape(&self) -> [f64; 3] {
        self.voxel_shape
    }

    pub fn voxel_count(&self) -> usize {
        self.grid_shape.iter().product()
    }

    pub fn voxel_volume(&self) -> f64 {
        self.voxel_shape[..self.dims].iter().product()
    }

    /// Maps a continuous position to the integer voxel index along each
    /// axis. Always returns three components; axes at or beyond `dims`
    /// are 0. Components may be negative (or beyond `grid_shape`) when
    /// `position` lies outside the bounding box: this function performs
    /// no clamping, by design.
    pub fn voxel_position(&self, position: &[f64]) -> [i64; 3] {
        let mut out = [0i64; 3];
        for i in 0..self.dims {
            let p = position.get(i).copied().unwrap_or(0.0);
            let rel = (p - self.bounding_box_min[i]) / self.voxel_shape[i];
            out[i] = rel.floor() as i64;
        }
        out
    }

    /// Center of voxel `idx` along each axis (only the first `dims`
    /// entries are meaningful).
    pub fn voxel_center(&self, idx: [usize; 3]) -> [f64; 3] {
        let mut out = [0.0f64; 3];
        for i in 0..self.dims {
            out[i] = self.bounding_box_min[i] + (idx[i] as f64 + 0.5) * self.voxel_shape[i];
        }
        out
    }

    /// Row-major flat index of voxel `idx`, with x varying fastest.
    pub fn voxel_flat_index(&self, idx: [usize; 3]) -> usize {
        idx[0] + self.grid_shape[0] * (idx[1] + self.grid_shape[1] * idx[2])
    }

    /// Iterates all voxel indices in row-major order.
    pub fn iter_voxels(&self) -> impl Iterator<Item = [usize; 3]> + '_ {
        let gs = self.grid_shape;
        (0..gs[2]).flat_map(move |z| {
            (0..gs[1]).flat_map(move |y| (0..gs[0]).map(move |x| [x, y, z]))
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn grid_shape_matches_bulk_solver_fixture() {
        // mesh(3, {0,0,0}, {100,100,100}, {20,20,20}) -> 5x5x5
        let mesh = CartesianMesh::new(3, &[0.0, 0.0, 0.0], &[100.0, 100.0, 100.0], &[20.0, 20.0, 20.0]).unwrap();
        assert_eq!(mesh.grid_shape(), [5, 5, 5]);
        assert_eq!(mesh.voxel_count(), 125);
        assert_eq!(mesh.voxel_volume(), 8000.0);
    }

    #[test]
    fn voxel_center_round_trip_within_half_voxel() {
        let mesh = CartesianMesh::new(3, &[0.0, 0.0, 0.0], &[100.0, 100.0, 100.0], &[20.0, 20.0, 20.0]).unwrap();
        let p = [37.2, 61.9, 4.4];
        let idx = mesh.voxel_position(&p);
        let idx_usize = [idx[0] as usize, idx[1] as usize, idx[2] as usize];
        let center = mesh.voxel_center(idx_usize);
        for i in 0..3 {
            assert!((center[i] - p[i]).abs() <= mesh.voxel_shape()[i] / 2.0);
        }
    }

    #[test]
    fn one_dimensional_mesh_pads_trailing_axes_with_zero() {
        let mesh = CartesianMesh::new(1, &[0.0], &[10.0], &[2.0]).unwrap();
        assert_eq!(mesh.grid_shape(), [5, 1, 1]);
        let idx = mesh.voxel_position(&[4.5]);
        assert_eq!(idx, [2, 0, 0]);
    }

    #[test]
    fn rejects_non_positive_voxel_shape() {
        assert!(CartesianMesh::new(2, &[0.0, 0.0], &[10.0, 10.0], &[0.0, 1.0]).is_err());
    }
}

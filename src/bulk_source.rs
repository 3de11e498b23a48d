//! Per-voxel bulk supply/uptake update.
//!
//! Grounded on `original_source/reactions-diffusion/biofvm/kernels/cpu_solver/src/bulk_solver.cpp`:
//! one implicit Euler step of `dρ/dt = S*(T - ρ) - U*ρ`, applied per
//! voxel per substrate between diffusion substeps. Test values are
//! reproduced from `kernels/openmp_solver/tests/test_bulk_solver.cpp`.

use rayon::prelude::*;

use crate::substrate_grid::SubstrateGrid;

/// Supplies `(supply_rate, supply_target, uptake_rate)` for a given
/// `(substrate, voxel)`. Implemented by the caller; when absent, the
/// bulk update step is skipped entirely.
pub trait BulkSource: Sync {
    fn rates(&self, substrate: usize, voxel: usize) -> (f64, f64, f64);
}

/// A bulk source that is the same constant triple everywhere, convenient
/// for tests and simple scenarios.
pub struct UniformBulkSource {
    pub supply_rate: f64,
    pub supply_target: f64,
    pub uptake_rate: f64,
}

impl BulkSource for UniformBulkSource {
    fn rates(&self, _substrate: usize, _voxel: usize) -> (f64, f64, f64) {
        (self.supply_rate, self.supply_target, self.uptake_rate)
    }
}

/// Applies one bulk-source implicit Euler step to every voxel and
/// substrate of `grid`, in place. Parallelizes over voxels.
pub fn apply_bulk_source(grid: &mut SubstrateGrid, source: &dyn BulkSource, dt: f64) {
    let substrates_count = grid.substrates_count;
    grid.densities
        .par_chunks_mut(substrates_count)
        .enumerate()
        .for_each(|(voxel, span)| {
            for substrate in 0..substrates_count {
                let (s, t, u) = source.rates(substrate, voxel);
                let rho = span[substrate];
                span[substrate] = (rho + dt * s * t) / (1.0 + dt * (u + s));
            }
        });
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::mesh::CartesianMesh;

    struct PointSource {
        target_voxel: usize,
        s: f64,
        t: f64,
        u: f64,
    }

    impl BulkSource for PointSource {
        fn rates(&self, substrate: usize, voxel: usize) -> (f64, f64, f64) {
            if substrate == 0 && voxel == self.target_voxel {
                (self.s, self.t, self.u)
            } else {
                (0.0, 0.0, 0.0)
            }
        }
    }

    #[test]
    fn matches_reference_bulk_solver_fixture() {
        let mesh = CartesianMesh::new(3, &[0.0, 0.0, 0.0], &[100.0, 100.0, 100.0], &[20.0, 20.0, 20.0]).unwrap();
        let mut grid = SubstrateGrid::new(&mesh, 2);
        grid.initial_conditions = vec![10.0, 1.0];
        grid.apply_initial_conditions();

        let target = mesh.voxel_flat_index([1, 1, 1]);
        let source = PointSource {
            target_voxel: target,
            s: 5.0,
            t: 6.0,
            u: 7.0,
        };
        apply_bulk_source(&mut grid, &source, 0.01);

        assert!((grid.density(0, target) - 9.19643).abs() < 1e-4);
        for voxel in 0..grid.voxel_count {
            assert_eq!(grid.density(1, voxel), 1.0);
            if voxel != target {
                assert_eq!(grid.density(0, voxel), 10.0);
            }
        }
    }

    #[test]
    fn steady_state_is_a_fixed_point() {
        let mesh = CartesianMesh::new(1, &[0.0], &[10.0], &[10.0]).unwrap();
        let mut grid = SubstrateGrid::new(&mesh, 1);
        grid.initial_conditions = vec![6.0]; // rho == target T
        grid.apply_initial_conditions();
        let source = UniformBulkSource {
            supply_rate: 3.0,
            supply_target: 6.0,
            uptake_rate: 0.0,
        };
        apply_bulk_source(&mut grid, &source, 0.01);
        assert!((grid.density(0, 0) - 6.0).abs() < 1e-12);
    }
}

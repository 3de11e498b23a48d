//! Operator-split reaction-diffusion solver: one implicit-Euler
//! tri-diagonal (Thomas algorithm) solve per axis per substrate per
//! step, in a fixed x/y/z order, with decay folded into the diagonal and
//! LU factors cached at `initialize` time since the matrix is constant
//! for the whole run. `biofvm::solver`'s abstract interface names this
//! shape (`initialize`/`solve`/`get_substrate_density`/
//! `reinitialize_dirichlet`) without giving a concrete solver body.

use crate::errors::CalcError;
use crate::mesh::CartesianMesh;
use crate::substrate_grid::SubstrateGrid;

/// Cached Thomas-algorithm coefficients for one 1-D tridiagonal system.
/// The system itself (sub/diag/super-diagonal) never changes after
/// `initialize`, so only the right-hand side varies per solve.
#[derive(Clone, Debug)]
struct TridiagFactors {
    n: usize,
    sub: Vec<f64>,       // sub[i] for i in 1..n
    c_prime: Vec<f64>,   // modified super-diagonal, c_prime[i] for i in 0..n-1
    inv_pivot: Vec<f64>, // 1 / m_i, used when eliminating the rhs
}

impl TridiagFactors {
    fn build(n: usize, alpha: f64, decay_frac: f64) -> Result<Self, CalcError> {
        if n == 0 {
            return Err(CalcError("tridiagonal system of size 0".into()));
        }
        let mut diag = vec![0.0; n];
        let mut sub = vec![0.0; n];
        let mut sup = vec![0.0; n];
        for i in 0..n {
            let has_left = i > 0;
            let has_right = i + 1 < n;
            let neighbor_count = has_left as i32 as f64 + has_right as i32 as f64;
            diag[i] = 1.0 + neighbor_count * alpha + decay_frac;
            if has_left {
                sub[i] = -alpha;
            }
            if has_right {
                sup[i] = -alpha;
            }
        }

        let mut c_prime = vec![0.0; n];
        let mut inv_pivot = vec![0.0; n];
        if diag[0] == 0.0 {
            return Err(CalcError("singular tridiagonal matrix at row 0".into()));
        }
        inv_pivot[0] = 1.0 / diag[0];
        c_prime[0] = sup[0] * inv_pivot[0];
        for i in 1..n {
            let m = diag[i] - sub[i] * c_prime[i - 1];
            if m.abs() < 1e-14 {
                return Err(CalcError(format!("singular tridiagonal matrix at row {i}")));
            }
            inv_pivot[i] = 1.0 / m;
            c_prime[i] = sup[i] * inv_pivot[i];
        }

        Ok(Self {
            n,
            sub,
            c_prime,
            inv_pivot,
        })
    }

    /// Solves `A x = rhs` in place using the cached factorization.
    fn solve_in_place(&self, rhs: &mut [f64]) {
        let n = self.n;
        let mut d_prime = vec![0.0; n];
        d_prime[0] = rhs[0] * self.inv_pivot[0];
        for i in 1..n {
            d_prime[i] = (rhs[i] - self.sub[i] * d_prime[i - 1]) * self.inv_pivot[i];
        }
        rhs[n - 1] = d_prime[n - 1];
        for i in (0..n - 1).rev() {
            rhs[i] = d_prime[i] - self.c_prime[i] * rhs[i + 1];
        }
    }
}

/// Operator-split implicit diffusion/decay solver, owning one cached
/// factorization per `(substrate, axis)` pair.
pub struct DiffusionSolver {
    mesh: CartesianMesh,
    dt: f64,
    substrates_count: usize,
    /// factors[substrate][axis], axis in 0..dims
    factors: Vec<Vec<TridiagFactors>>,
    dirichlet: Vec<Option<f64>>, // voxel * substrates_count + substrate
}

impl DiffusionSolver {
    /// Builds cached factorizations for every `(substrate, axis)` pair
    /// and fills `grid` with its initial conditions.
    pub fn initialize(
        mesh: &CartesianMesh,
        grid: &mut SubstrateGrid,
        dt: f64,
    ) -> Result<Self, CalcError> {
        if dt <= 0.0 {
            return Err(CalcError("diffusion timestep must be positive".into()));
        }
        let dims = mesh.dims();
        let grid_shape = mesh.grid_shape();
        let voxel_shape = mesh.voxel_shape();
        let substrates_count = grid.substrates_count;

        let mut factors = Vec::with_capacity(substrates_count);
        for s in 0..substrates_count {
            let d = grid.diffusion_coefficients[s];
            let decay = grid.decay_rates[s];
            let mut per_axis = Vec::with_capacity(dims);
            for axis in 0..dims {
                let h = voxel_shape[axis];
                let alpha = d * dt / (h * h);
                let decay_frac = decay * dt / dims as f64;
                per_axis.push(TridiagFactors::build(grid_shape[axis], alpha, decay_frac)?);
            }
            factors.push(per_axis);
        }

        grid.apply_initial_conditions();

        Ok(Self {
            mesh: mesh.clone(),
            dt,
            substrates_count,
            factors,
            dirichlet: vec![None; mesh.voxel_count() * substrates_count],
        })
    }

    /// Marks `(substrate, voxel)` as a Dirichlet (fixed-value) site.
    pub fn set_dirichlet(&mut self, substrate: usize, voxel: usize, value: f64) {
        self.dirichlet[voxel * self.substrates_count + substrate] = Some(value);
    }

    /// Reapplies every registered Dirichlet value onto `grid`, overriding
    /// whatever the diffusion/bulk steps last wrote there.
    pub fn reinitialize_dirichlet(&self, grid: &mut SubstrateGrid) {
        for (i, value) in self.dirichlet.iter().enumerate() {
            if let Some(v) = value {
                grid.densities[i] = *v;
            }
        }
    }

    pub fn get_substrate_density(&self, grid: &SubstrateGrid, substrate: usize, x: usize, y: usize, z: usize) -> f64 {
        let voxel = self.mesh.voxel_flat_index([x, y, z]);
        grid.density(substrate, voxel)
    }

    /// Advances `grid` by `iterations` substeps of `dt`, sweeping axes in
    /// a fixed x, y, z order within each substep.
    pub fn solve(&self, grid: &mut SubstrateGrid, iterations: usize) {
        let grid_shape = self.mesh.grid_shape();
        let dims = self.mesh.dims();

        for _ in 0..iterations {
            for axis in 0..dims {
                let other_axes: Vec<usize> = (0..3).filter(|a| *a != axis).collect();
                let extent_a = grid_shape[other_axes[0]];
                let extent_b = grid_shape[other_axes[1]];
                let n = grid_shape[axis];

                for s in 0..self.substrates_count {
                    let fac = &self.factors[s][axis];
                    for ia in 0..extent_a {
                        for ib in 0..extent_b {
                            let mut line = vec![0.0; n];
                            let mut idx = [0usize; 3];
                            idx[other_axes[0]] = ia;
                            idx[other_axes[1]] = ib;
                            for k in 0..n {
                                idx[axis] = k;
                                let voxel = self.mesh.voxel_flat_index(idx);
                                line[k] = grid.density(s, voxel);
                            }
                            fac.solve_in_place(&mut line);
                            for k in 0..n {
                                idx[axis] = k;
                                let voxel = self.mesh.voxel_flat_index(idx);
                                *grid.density_mut(s, voxel) = line[k];
                            }
                        }
                    }
                }
            }
            self.reinitialize_dirichlet(grid);
        }
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }
}

//! The shared substrate concentration grid.
//!
//! Layout follows `original_source/reactions-diffusion/biofvm/include/biofvm/agent_generic_storage.h`'s
//! convention of one contiguous span per voxel, indexed
//! `[voxel * substrates_count .. (voxel+1) * substrates_count]`.

use crate::mesh::CartesianMesh;

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct SubstrateGrid {
    pub substrates_count: usize,
    pub voxel_count: usize,
    pub densities: Vec<f64>,
    pub diffusion_coefficients: Vec<f64>,
    pub decay_rates: Vec<f64>,
    pub initial_conditions: Vec<f64>,
}

impl SubstrateGrid {
    pub fn new(mesh: &CartesianMesh, substrates_count: usize) -> Self {
        let voxel_count = mesh.voxel_count();
        Self {
            substrates_count,
            voxel_count,
            densities: vec![0.0; voxel_count * substrates_count],
            diffusion_coefficients: vec![0.0; substrates_count],
            decay_rates: vec![0.0; substrates_count],
            initial_conditions: vec![0.0; substrates_count],
        }
    }

    /// Fills every voxel with `initial_conditions`.
    pub fn apply_initial_conditions(&mut self) {
        for voxel in 0..self.voxel_count {
            let start = voxel * self.substrates_count;
            self.densities[start..start + self.substrates_count]
                .copy_from_slice(&self.initial_conditions);
        }
    }

    pub fn density(&self, substrate: usize, voxel: usize) -> f64 {
        self.densities[voxel * self.substrates_count + substrate]
    }

    pub fn density_mut(&mut self, substrate: usize, voxel: usize) -> &mut f64 {
        &mut self.densities[voxel * self.substrates_count + substrate]
    }

    pub fn voxel_span(&self, voxel: usize) -> &[f64] {
        let start = voxel * self.substrates_count;
        &self.densities[start..start + self.substrates_count]
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn initial_conditions_fill_every_voxel() {
        let mesh = CartesianMesh::new(3, &[0.0, 0.0, 0.0], &[100.0, 100.0, 100.0], &[20.0, 20.0, 20.0]).unwrap();
        let mut grid = SubstrateGrid::new(&mesh, 2);
        grid.initial_conditions = vec![10.0, 1.0];
        grid.apply_initial_conditions();
        for voxel in 0..grid.voxel_count {
            assert_eq!(grid.density(0, voxel), 10.0);
            assert_eq!(grid.density(1, voxel), 1.0);
        }
    }
}

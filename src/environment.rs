//! The step driver composing mesh, agents, and the three solvers.
//!
//! Grounded on `original_source/mechanics/physicell/src/environment.cpp`:
//! an environment owns the agent container and the solvers and drives
//! `run_single_timestep`/serialization; a missing solver or serializer is
//! a legal no-op, not an error.

use crate::agent_container::AgentContainer;
use crate::bulk_source::BulkSource;
use crate::diffusion::DiffusionSolver;
use crate::mechanics::{self, AdhesionAffinity};
use crate::mesh::CartesianMesh;
use crate::neighbor_index;
use crate::substrate_grid::SubstrateGrid;

/// Invoked by `Environment::run_single_timestep` after the mechanics and
/// diffusion phases complete, with the current simulated time. Opaque to
/// the core: the actual storage format is the caller's concern.
pub trait Serializer {
    fn serialize(&mut self, time: f64, agents: &AgentContainer, substrates: &SubstrateGrid);
}

/// Boundary and spring parameters that are not per-agent columns.
#[derive(Clone, Debug)]
pub struct MechanicsParams {
    pub basement_membrane_strength: f64,
    pub spring_rest_length: f64,
}

impl Default for MechanicsParams {
    fn default() -> Self {
        Self {
            basement_membrane_strength: 0.0,
            spring_rest_length: 0.0,
        }
    }
}

/// Composes the mesh, the agent container, the substrate grid, and the
/// three solvers (micromechanics is built in, diffusion and bulk source
/// are pluggable) into one steppable simulation.
pub struct Environment {
    pub mesh: CartesianMesh,
    pub agents: AgentContainer,
    pub substrates: SubstrateGrid,
    pub affinity: AdhesionAffinity,
    pub mechanics_params: MechanicsParams,
    pub dt_mechanics: f64,
    pub dt_diffusion_substeps: usize,
    diffusion: Option<DiffusionSolver>,
    bulk_source: Option<Box<dyn BulkSource>>,
    serializer: Option<Box<dyn Serializer>>,
    time: f64,
}

impl Environment {
    pub fn new(
        mesh: CartesianMesh,
        agents: AgentContainer,
        substrates: SubstrateGrid,
        affinity: AdhesionAffinity,
        dt_mechanics: f64,
    ) -> Self {
        Self {
            mesh,
            agents,
            substrates,
            affinity,
            mechanics_params: MechanicsParams::default(),
            dt_mechanics,
            dt_diffusion_substeps: 1,
            diffusion: None,
            bulk_source: None,
            serializer: None,
            time: 0.0,
        }
    }

    pub fn with_diffusion_solver(mut self, solver: DiffusionSolver) -> Self {
        self.diffusion = Some(solver);
        self
    }

    pub fn with_bulk_source(mut self, source: Box<dyn BulkSource>) -> Self {
        self.bulk_source = Some(source);
        self
    }

    pub fn with_serializer(mut self, serializer: Box<dyn Serializer>) -> Self {
        self.serializer = Some(serializer);
        self
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    /// Executes one full time step: clear accumulators, rebuild
    /// neighbors, accumulate forces (pairwise, motility, boundary,
    /// springs) into `force`, fold `force` into `velocity`, integrate
    /// positions, apply the bulk source, then run the diffusion solver.
    /// A missing diffusion solver or bulk source is a legal no-op; the
    /// serializer, if present, is invoked last.
    pub fn run_single_timestep(&mut self) {
        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!("run_single_timestep", time = self.time).entered();

        let data = self.agents.data_mut();

        mechanics::clear_step_accumulators(data);
        neighbor_index::rebuild_bucketed(data, &self.mesh);
        mechanics::solve_pairwise_forces(data, &self.affinity);
        mechanics::apply_motility(data);
        mechanics::apply_basement_membrane(
            data,
            &self.mesh.bounding_box_min()[..self.mesh.dims()],
            &self.mesh.bounding_box_max()[..self.mesh.dims()],
            self.mechanics_params.basement_membrane_strength,
        );
        mechanics::apply_spring_attachments(data, self.mechanics_params.spring_rest_length);
        mechanics::fold_force_into_velocity(data);
        mechanics::integrate_positions(data, self.dt_mechanics);

        if let Some(bulk_source) = &self.bulk_source {
            if let Some(diffusion) = &self.diffusion {
                crate::bulk_source::apply_bulk_source(
                    &mut self.substrates,
                    bulk_source.as_ref(),
                    diffusion.dt(),
                );
            }
        }

        if let Some(diffusion) = &self.diffusion {
            diffusion.solve(&mut self.substrates, self.dt_diffusion_substeps);
        }

        self.time += self.dt_mechanics;

        if let Some(serializer) = &mut self.serializer {
            serializer.serialize(self.time, &self.agents, &self.substrates);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::bulk_source::UniformBulkSource;

    fn build_environment() -> Environment {
        let mesh = CartesianMesh::new(3, &[0.0, 0.0, 0.0], &[100.0, 100.0, 100.0], &[20.0, 20.0, 20.0]).unwrap();
        let mut agents = AgentContainer::new(3, 1);
        let a = agents.create();
        let b = agents.create();
        let ia = agents.resolve(a).unwrap();
        let ib = agents.resolve(b).unwrap();
        agents.data_mut().position_mut(ia).copy_from_slice(&[40.0, 40.0, 40.0]);
        agents.data_mut().position_mut(ib).copy_from_slice(&[47.0, 40.0, 40.0]);
        for i in [ia, ib] {
            agents.data_mut().radius[i] = 5.0;
            agents.data_mut().cell_cell_repulsion_strength[i] = 1.0;
            agents.data_mut().relative_maximum_adhesion_distance[i] = 1.5;
            agents.data_mut().cell_cell_adhesion_strength[i] = 0.5;
        }

        let mut substrates = SubstrateGrid::new(&mesh, 1);
        substrates.diffusion_coefficients = vec![4.0];
        substrates.decay_rates = vec![5.0];
        substrates.initial_conditions = vec![10.0];
        let diffusion = DiffusionSolver::initialize(&mesh, &mut substrates, 0.01).unwrap();

        let affinity = AdhesionAffinity::uniform(1, 1.0);

        Environment::new(mesh, agents, substrates, affinity, 0.01)
            .with_diffusion_solver(diffusion)
            .with_bulk_source(Box::new(UniformBulkSource {
                supply_rate: 0.0,
                supply_target: 0.0,
                uptake_rate: 0.0,
            }))
    }

    #[test]
    fn run_single_timestep_advances_time_and_moves_overlapping_agents_apart() {
        let mut env = build_environment();
        let before = env.agents.data().position(0)[0];
        env.run_single_timestep();
        let after = env.agents.data().position(0)[0];
        assert!((env.time() - 0.01).abs() < 1e-12);
        assert_ne!(before, after);
    }

    #[test]
    fn missing_diffusion_and_bulk_source_is_a_legal_no_op() {
        let mesh = CartesianMesh::new(3, &[0.0, 0.0, 0.0], &[10.0, 10.0, 10.0], &[5.0, 5.0, 5.0]).unwrap();
        let agents = AgentContainer::new(3, 0);
        let substrates = SubstrateGrid::new(&mesh, 0);
        let affinity = AdhesionAffinity::uniform(1, 1.0);
        let mut env = Environment::new(mesh, agents, substrates, affinity, 0.01);
        env.run_single_timestep();
        assert!((env.time() - 0.01).abs() < 1e-12);
    }
}

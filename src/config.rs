//! Configuration document for domain, substrate, and cell-definition data.
//!
//! The crate itself mandates no input format; this module ships a thin
//! `serde_json` convenience loader on top of a plain `serde` data model,
//! in the same spirit as `cellular_raza-examples/autophagy/src/main.rs`'s
//! `SimulationMetaParams` building its simulation parameters from
//! ordinary structs.

use serde::{Deserialize, Serialize};

use crate::agent_container::{AgentContainer, AgentHandle};
use crate::diffusion::DiffusionSolver;
use crate::environment::Environment;
use crate::errors::ConfigError;
use crate::mechanics::AdhesionAffinity;
use crate::mesh::CartesianMesh;
use crate::substrate_grid::SubstrateGrid;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DomainConfig {
    pub dims: usize,
    pub bounding_box_min: Vec<f64>,
    pub bounding_box_max: Vec<f64>,
    pub voxel_shape: Vec<f64>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SubstrateConfig {
    pub name: String,
    pub diffusion_coefficient: f64,
    pub decay_rate: f64,
    pub initial_condition: f64,
    #[serde(default)]
    pub dirichlet_value: Option<f64>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CellDefinitionConfig {
    pub name: String,
    pub agent_type_index: usize,
    pub radius: f64,
    pub cell_cell_repulsion_strength: f64,
    pub cell_cell_adhesion_strength: f64,
    pub relative_maximum_adhesion_distance: f64,
    #[serde(default)]
    pub spring_constant: f64,
    #[serde(default)]
    pub is_motile: bool,
    #[serde(default)]
    pub motility_speed: f64,
    /// This definition's row of the adhesion affinity matrix, indexed by
    /// `agent_type_index` across every definition in the same document.
    /// Empty means "affine to everything": `build_environment` leaves the
    /// matrix's default of `1.0` in place for this row.
    #[serde(default)]
    pub affinity_row: Vec<f64>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub domain: DomainConfig,
    pub dt_mechanics: f64,
    pub dt_diffusion: f64,
    pub max_time: f64,
    #[serde(default)]
    pub substrates: Vec<SubstrateConfig>,
    #[serde(default)]
    pub cell_definitions: Vec<CellDefinitionConfig>,
    #[serde(default)]
    pub random_seed: u64,
}

impl SimulationConfig {
    /// Parses a configuration document from a JSON string. Deserialization
    /// failures are reported whole; no `Environment` is ever built from a
    /// partially-parsed document.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Assembles a runnable `Environment` from this document: the mesh,
    /// the substrate grid (with a diffusion solver if any substrates are
    /// present), and the adhesion affinity matrix built from each cell
    /// definition's `affinity_row`. No agents are created here; call
    /// `spawn_agent` against the returned environment's `agents` once it
    /// exists.
    pub fn build_environment(&self) -> Result<Environment, ConfigError> {
        let mesh = CartesianMesh::new(
            self.domain.dims,
            &self.domain.bounding_box_min,
            &self.domain.bounding_box_max,
            &self.domain.voxel_shape,
        )
        .map_err(|e| ConfigError(e.0))?;

        let substrates_count = self.substrates.len();
        let mut grid = SubstrateGrid::new(&mesh, substrates_count);
        for (s, substrate) in self.substrates.iter().enumerate() {
            grid.diffusion_coefficients[s] = substrate.diffusion_coefficient;
            grid.decay_rates[s] = substrate.decay_rate;
            grid.initial_conditions[s] = substrate.initial_condition;
        }

        let agent_types_count = self
            .cell_definitions
            .iter()
            .map(|d| d.agent_type_index + 1)
            .max()
            .unwrap_or(1)
            .max(1);
        let mut affinity = AdhesionAffinity::uniform(agent_types_count, 1.0);
        for defn in &self.cell_definitions {
            if defn.affinity_row.is_empty() {
                continue;
            }
            if defn.affinity_row.len() != agent_types_count {
                return Err(ConfigError(format!(
                    "cell_definitions[{}] affinity_row has {} entries, expected {agent_types_count}",
                    defn.name,
                    defn.affinity_row.len()
                )));
            }
            let row = defn.agent_type_index;
            for (col, value) in defn.affinity_row.iter().enumerate() {
                affinity.matrix[row * agent_types_count + col] = *value;
            }
        }

        let agents = AgentContainer::new(self.domain.dims, substrates_count);

        let env = if substrates_count > 0 {
            let diffusion = DiffusionSolver::initialize(&mesh, &mut grid, self.dt_diffusion)
                .map_err(|e| ConfigError(e.0))?;
            Environment::new(mesh, agents, grid, affinity, self.dt_mechanics).with_diffusion_solver(diffusion)
        } else {
            Environment::new(mesh, agents, grid, affinity, self.dt_mechanics)
        };
        Ok(env)
    }

    /// Creates one agent in `agents` from `cell_definitions[definition_index]`,
    /// placed at `position`, with its mechanics columns populated from
    /// that definition (including `agent_type_index`, which rows
    /// `build_environment`'s affinity matrix by the same index).
    pub fn spawn_agent(
        &self,
        agents: &mut AgentContainer,
        definition_index: usize,
        position: &[f64],
    ) -> Result<AgentHandle, ConfigError> {
        let defn = self.cell_definitions.get(definition_index).ok_or_else(|| {
            ConfigError(format!("no cell definition at index {definition_index}"))
        })?;
        let handle = agents.create();
        let idx = agents.resolve(handle).expect("just-created handle always resolves");
        let data = agents.data_mut();
        data.position_mut(idx).copy_from_slice(position);
        data.radius[idx] = defn.radius;
        data.agent_type_index[idx] = defn.agent_type_index;
        data.cell_cell_repulsion_strength[idx] = defn.cell_cell_repulsion_strength;
        data.cell_cell_adhesion_strength[idx] = defn.cell_cell_adhesion_strength;
        data.relative_maximum_adhesion_distance[idx] = defn.relative_maximum_adhesion_distance;
        data.spring_constant[idx] = defn.spring_constant;
        data.is_motile[idx] = defn.is_motile;
        data.motility_speed[idx] = defn.motility_speed;
        Ok(handle)
    }
}

//! Structure-of-arrays cell mechanics and reaction-diffusion core.
//!
//! Two coupled subsystems share one agent population and one Cartesian
//! voxel mesh: a pairwise micromechanics solver (see [`mechanics`]) that
//! moves agents, and an operator-split finite-volume diffusion/decay
//! solver (see [`diffusion`]) that advances chemical substrate fields.
//! [`environment::Environment`] composes both into a single steppable
//! simulation.

pub mod agent_container;
pub mod agent_data;
pub mod bulk_source;
pub mod config;
pub mod diffusion;
pub mod environment;
pub mod errors;
pub mod mechanics;
pub mod mesh;
pub mod neighbor_index;
pub mod registry;
pub mod rng;
pub mod substrate_grid;

pub use agent_container::{AgentContainer, AgentHandle};
pub use environment::Environment;
pub use mesh::CartesianMesh;

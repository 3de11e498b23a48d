//! Pairwise mechanical forces, motility, boundary, springs, and the
//! position integrator.
//!
//! `cell_forces.cpp`'s body was stripped down to two constants
//! (`MIN_DISTANCE`, `SIMPLE_PRESSURE_COEFFICIENT`) and its call signature
//! lives on in `solve_pair_interface.h`; the force shapes below are
//! reconstructed from those constants and from the repulsion/adhesion
//! behavior described for this kind of pairwise solver. The two-step
//! Adams-Bashforth position update follows the integrator pattern in
//! `src/concepts/domain.rs`.

use rayon::prelude::*;

use crate::agent_data::AgentData;

/// Distances below this are treated as coincident to avoid dividing by
/// (near) zero when normalizing the direction vector between two agents.
pub const MIN_DISTANCE: f64 = 1e-5;

/// Coefficient applied when accumulating the simple-pressure metric.
pub const SIMPLE_PRESSURE_COEFFICIENT: f64 = 1.0;

/// A `agent_types_count x agent_types_count` row-major affinity matrix.
/// Need not be symmetric; `solve_pair` reads one entry from each side.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct AdhesionAffinity {
    pub agent_types_count: usize,
    pub matrix: Vec<f64>,
}

impl AdhesionAffinity {
    pub fn uniform(agent_types_count: usize, value: f64) -> Self {
        Self {
            agent_types_count,
            matrix: vec![value; agent_types_count * agent_types_count],
        }
    }

    pub fn get(&self, from_type: usize, to_type: usize) -> f64 {
        self.matrix[from_type * self.agent_types_count + to_type]
    }
}

/// Clears the `force`/`simple_pressure` accumulators ahead of a
/// mechanics step. `velocity` and `previous_velocity` are left alone:
/// `velocity` is overwritten wholesale by `fold_force_into_velocity`,
/// and `previous_velocity` only changes inside `integrate_positions`.
pub fn clear_step_accumulators(data: &mut AgentData) {
    data.force.iter_mut().for_each(|f| *f = 0.0);
    data.simple_pressure.iter_mut().for_each(|p| *p = 0.0);
}

/// Accumulates pairwise repulsion/adhesion/simple-pressure contributions
/// from `data.neighbors` into `data.force` and `data.simple_pressure`.
/// Each agent only ever writes its own slot, so this parallelizes safely
/// over agents as the outer index.
pub fn solve_pairwise_forces(data: &mut AgentData, affinity: &AdhesionAffinity) {
    let dims = data.dims;
    let n = data.agents_count();
    let positions = data.positions.clone();
    let radius = data.radius.clone();
    let agent_type_index = data.agent_type_index.clone();
    let repulsion_strength = data.cell_cell_repulsion_strength.clone();
    let adhesion_strength = data.cell_cell_adhesion_strength.clone();
    let rel_max_adh = data.relative_maximum_adhesion_distance.clone();
    let neighbors = data.neighbors.clone();
    let is_movable = data.is_movable.clone();

    let updates: Vec<(Vec<f64>, f64)> = (0..n)
        .into_par_iter()
        .map(|i| {
            let mut dv = vec![0.0; dims];
            let mut pressure = 0.0;
            if !is_movable[i] {
                return (dv, pressure);
            }
            for &j in &neighbors[i] {
                let pi = &positions[i * dims..(i + 1) * dims];
                let pj = &positions[j * dims..(j + 1) * dims];
                let mut r = vec![0.0; dims];
                let mut dist_sq = 0.0;
                for a in 0..dims {
                    r[a] = pj[a] - pi[a];
                    dist_sq += r[a] * r[a];
                }
                let dist = dist_sq.sqrt();
                if dist < MIN_DISTANCE {
                    continue;
                }
                let dir: Vec<f64> = r.iter().map(|x| x / dist).collect();

                let repulsion_reach = radius[i] + radius[j];
                if dist < repulsion_reach {
                    let shape = (1.0 - dist / repulsion_reach).powi(2);
                    let f_rep = repulsion_strength[i] * shape;
                    for a in 0..dims {
                        dv[a] -= f_rep * dir[a];
                    }
                    pressure += SIMPLE_PRESSURE_COEFFICIENT * shape;
                }

                let adhesion_reach = rel_max_adh[i] * radius[i] + rel_max_adh[j] * radius[j];
                if adhesion_reach > 0.0 && dist <= adhesion_reach {
                    let affinity_scale =
                        (affinity.get(agent_type_index[i], agent_type_index[j])
                            * affinity.get(agent_type_index[j], agent_type_index[i]))
                        .max(0.0)
                        .sqrt();
                    let shape = (1.0 - dist / adhesion_reach).powi(2);
                    let f_adh = adhesion_strength[i] * affinity_scale * shape;
                    for a in 0..dims {
                        dv[a] += f_adh * dir[a];
                    }
                }
            }
            (dv, pressure)
        })
        .collect();

    for (i, (dv, pressure)) in updates.into_iter().enumerate() {
        let f = data.force_mut(i);
        for a in 0..dims {
            f[a] += dv[a];
        }
        data.simple_pressure[i] += pressure;
    }
}

/// Adds a persistence term along `motility_direction`, scaled by
/// `is_motile` and each agent's own `motility_speed`, into `data.force`.
pub fn apply_motility(data: &mut AgentData) {
    let dims = data.dims;
    for i in 0..data.agents_count() {
        if !data.is_motile[i] {
            continue;
        }
        let speed = data.motility_speed[i];
        let dir = data.motility_direction[i * dims..(i + 1) * dims].to_vec();
        let f = data.force_mut(i);
        for a in 0..dims {
            f[a] += speed * dir[a];
        }
    }
}

/// Adds a boundary repulsion term for agents near the faces of
/// `bounding_box_min..bounding_box_max` into `data.force`, pushing
/// agents back inside.
pub fn apply_basement_membrane(
    data: &mut AgentData,
    bounding_box_min: &[f64],
    bounding_box_max: &[f64],
    strength: f64,
) {
    let dims = data.dims;
    for i in 0..data.agents_count() {
        if !data.is_movable[i] {
            continue;
        }
        let r = data.radius[i];
        let p = data.position(i).to_vec();
        let f = data.force_mut(i);
        for a in 0..dims {
            let dist_to_min = p[a] - bounding_box_min[a];
            if dist_to_min < r {
                f[a] += strength * (r - dist_to_min).max(0.0);
            }
            let dist_to_max = bounding_box_max[a] - p[a];
            if dist_to_max < r {
                f[a] -= strength * (r - dist_to_max).max(0.0);
            }
        }
    }
}

/// Hookean spring force between attached pairs listed in
/// `data.spring_attachments`, with a shared rest length, accumulated
/// into `data.force`.
pub fn apply_spring_attachments(data: &mut AgentData, rest_length: f64) {
    let dims = data.dims;
    let positions = data.positions.clone();
    let spring_constant = data.spring_constant.clone();
    let attachments = data.spring_attachments.clone();
    let n = data.agents_count();

    let mut delta = vec![0.0; n * dims];
    for i in 0..n {
        for &j in &attachments[i] {
            let pi = &positions[i * dims..(i + 1) * dims];
            let pj = &positions[j * dims..(j + 1) * dims];
            let mut r = vec![0.0; dims];
            let mut dist_sq = 0.0;
            for a in 0..dims {
                r[a] = pj[a] - pi[a];
                dist_sq += r[a] * r[a];
            }
            let dist = dist_sq.sqrt();
            if dist < MIN_DISTANCE {
                continue;
            }
            let stretch = dist - rest_length;
            for a in 0..dims {
                delta[i * dims + a] += spring_constant[i] * stretch * (r[a] / dist);
            }
        }
    }
    for i in 0..n {
        let f = data.force_mut(i);
        for a in 0..dims {
            f[a] += delta[i * dims + a];
        }
    }
}

/// Copies the accumulated `force` of every agent into `velocity`,
/// the handoff between the force-accumulation kernels and the position
/// integrator (unit mobility: velocity tracks force directly, as in the
/// original `solve_pair` interface's velocity-only signature).
pub fn fold_force_into_velocity(data: &mut AgentData) {
    for i in 0..data.agents_count() {
        let f = data.force(i).to_vec();
        data.velocity_mut(i).copy_from_slice(&f);
    }
}

/// Two-step Adams–Bashforth position update:
/// `x += dt * (1.5 v - 0.5 v_prev)`, then `v_prev = v`, `v = 0`.
/// Immovable agents are skipped entirely.
pub fn integrate_positions(data: &mut AgentData, dt: f64) {
    let dims = data.dims;
    for i in 0..data.agents_count() {
        if !data.is_movable[i] {
            continue;
        }
        let v = data.velocity(i).to_vec();
        let v_prev = data.previous_velocity[i * dims..(i + 1) * dims].to_vec();
        let p = data.position_mut(i);
        for a in 0..dims {
            p[a] += dt * (1.5 * v[a] - 0.5 * v_prev[a]);
        }
        data.previous_velocity[i * dims..(i + 1) * dims].copy_from_slice(&v);
        data.velocity_mut(i).iter_mut().for_each(|x| *x = 0.0);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn symmetric_pair(distance: f64) -> AgentData {
        let mut data = AgentData::new(3, 0);
        let a = data.add();
        let b = data.add();
        data.position_mut(a).copy_from_slice(&[0.0, 0.0, 0.0]);
        data.position_mut(b).copy_from_slice(&[distance, 0.0, 0.0]);
        for k in [a, b] {
            data.radius[k] = 5.0;
            data.cell_cell_repulsion_strength[k] = 1.0;
            data.cell_cell_adhesion_strength[k] = 0.5;
            data.relative_maximum_adhesion_distance[k] = 1.5;
        }
        data.neighbors[a].push(b);
        data.neighbors[b].push(a);
        data
    }

    #[test]
    fn symmetric_parameters_cancel_to_round_off() {
        let mut data = symmetric_pair(7.0);
        let affinity = AdhesionAffinity::uniform(1, 1.0);
        solve_pairwise_forces(&mut data, &affinity);

        let dims = data.dims;
        let f0 = data.force(0).to_vec();
        let f1 = data.force(1).to_vec();
        for a in 0..dims {
            assert!((f0[a] + f1[a]).abs() < 1e-6, "axis {a}: {} + {}", f0[a], f1[a]);
        }
    }

    #[test]
    fn repulsion_pushes_overlapping_agents_apart() {
        let mut data = symmetric_pair(3.0); // radii sum to 10, overlapping at distance 3
        let affinity = AdhesionAffinity::uniform(1, 0.0);
        solve_pairwise_forces(&mut data, &affinity);
        // agent 0 should be pushed in -x, agent 1 in +x
        assert!(data.force(0)[0] < 0.0);
        assert!(data.force(1)[0] > 0.0);
    }

    #[test]
    fn adhesion_pulls_separated_but_reachable_agents_together() {
        let mut data = symmetric_pair(12.0); // beyond repulsion (10) but within adhesion (15)
        let affinity = AdhesionAffinity::uniform(1, 1.0);
        solve_pairwise_forces(&mut data, &affinity);
        assert!(data.force(0)[0] > 0.0);
        assert!(data.force(1)[0] < 0.0);
    }

    #[test]
    fn fold_force_into_velocity_copies_then_clear_step_accumulators_zeroes_force() {
        let mut data = symmetric_pair(3.0);
        let affinity = AdhesionAffinity::uniform(1, 0.0);
        solve_pairwise_forces(&mut data, &affinity);

        let f0 = data.force(0).to_vec();
        fold_force_into_velocity(&mut data);
        assert_eq!(data.velocity(0), f0.as_slice());

        clear_step_accumulators(&mut data);
        assert_eq!(data.force(0), &[0.0, 0.0, 0.0]);
        // velocity is untouched by clear_step_accumulators
        assert_eq!(data.velocity(0), f0.as_slice());
    }

    #[test]
    fn adams_bashforth_uses_current_and_previous_velocity() {
        let mut data = AgentData::new(1, 0);
        let a = data.add();
        data.position_mut(a).copy_from_slice(&[0.0]);
        data.previous_velocity[a] = 2.0;
        data.velocity_mut(a)[0] = 4.0;

        integrate_positions(&mut data, 1.0);

        // x += 1.5*4 - 0.5*2 = 5.0
        assert!((data.position(a)[0] - 5.0).abs() < 1e-12);
        assert_eq!(data.previous_velocity[a], 4.0);
        assert_eq!(data.velocity(a)[0], 0.0);
    }

    #[test]
    fn immovable_agent_does_not_move() {
        let mut data = AgentData::new(1, 0);
        let a = data.add();
        data.is_movable[a] = false;
        data.velocity_mut(a)[0] = 100.0;
        integrate_positions(&mut data, 1.0);
        assert_eq!(data.position(a)[0], 0.0);
    }
}

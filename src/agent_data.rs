//! Structure-of-arrays storage for per-agent fields.
//!
//! Grounded on `original_source/reactions-diffusion/biofvm/src/agent_data.cpp`:
//! `add()` appends a default slot to every column; `remove_at(i)` swaps
//! the last slot into `i` and shrinks every column, in O(column_count)
//! time regardless of agent count.

/// Columnar storage for every per-agent field used by the mechanics and
/// reaction-diffusion solvers. Indices into these columns are *not*
/// stable across `remove_at` calls; `agent_container::AgentContainer`
/// layers stable handles on top.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct AgentData {
    pub dims: usize,
    pub substrates_count: usize,
    agents_count: usize,

    // base columns
    pub positions: Vec<f64>, // agents_count * dims

    // mechanics columns
    pub radius: Vec<f64>,
    pub agent_type_index: Vec<usize>,
    pub is_movable: Vec<bool>,
    pub is_motile: Vec<bool>,
    pub cell_id: Vec<i64>,
    pub cell_cell_repulsion_strength: Vec<f64>,
    pub cell_cell_adhesion_strength: Vec<f64>,
    pub relative_maximum_adhesion_distance: Vec<f64>,
    pub spring_constant: Vec<f64>,
    pub motility_speed: Vec<f64>,
    pub simple_pressure: Vec<f64>,
    pub velocity: Vec<f64>,          // agents_count * dims
    pub previous_velocity: Vec<f64>, // agents_count * dims
    pub force: Vec<f64>,             // agents_count * dims
    pub motility_direction: Vec<f64>, // agents_count * dims
    pub neighbors: Vec<Vec<usize>>,
    pub spring_attachments: Vec<Vec<usize>>,

    // reaction-diffusion columns (agents_count * substrates_count, row-major per agent)
    pub secretion_rates: Vec<f64>,
    pub saturation_densities: Vec<f64>,
    pub uptake_rates: Vec<f64>,
    pub net_export_rates: Vec<f64>,
    pub internalized_substrates: Vec<f64>,
    pub fraction_released_at_death: Vec<f64>,
    pub fraction_transferred_when_ingested: Vec<f64>,
    pub volumes: Vec<f64>,
}

impl AgentData {
    pub fn new(dims: usize, substrates_count: usize) -> Self {
        Self {
            dims,
            substrates_count,
            ..Default::default()
        }
    }

    pub fn agents_count(&self) -> usize {
        self.agents_count
    }

    /// Appends one default-initialized agent slot to every column.
    /// Returns the new slot's index.
    pub fn add(&mut self) -> usize {
        let idx = self.agents_count;
        self.positions.extend(std::iter::repeat(0.0).take(self.dims));

        self.radius.push(0.0);
        self.agent_type_index.push(0);
        self.is_movable.push(true);
        self.is_motile.push(false);
        self.cell_id.push(-1);
        self.cell_cell_repulsion_strength.push(0.0);
        self.cell_cell_adhesion_strength.push(0.0);
        self.relative_maximum_adhesion_distance.push(1.0);
        self.spring_constant.push(0.0);
        self.motility_speed.push(0.0);
        self.simple_pressure.push(0.0);
        self.velocity.extend(std::iter::repeat(0.0).take(self.dims));
        self.previous_velocity.extend(std::iter::repeat(0.0).take(self.dims));
        self.force.extend(std::iter::repeat(0.0).take(self.dims));
        self.motility_direction.extend(std::iter::repeat(0.0).take(self.dims));
        self.neighbors.push(Vec::new());
        self.spring_attachments.push(Vec::new());

        let s = self.substrates_count;
        self.secretion_rates.extend(std::iter::repeat(0.0).take(s));
        self.saturation_densities.extend(std::iter::repeat(0.0).take(s));
        self.uptake_rates.extend(std::iter::repeat(0.0).take(s));
        self.net_export_rates.extend(std::iter::repeat(0.0).take(s));
        self.internalized_substrates.extend(std::iter::repeat(0.0).take(s));
        self.fraction_released_at_death.extend(std::iter::repeat(0.0).take(s));
        self.fraction_transferred_when_ingested.extend(std::iter::repeat(0.0).take(s));
        self.volumes.push(0.0);

        self.agents_count += 1;
        idx
    }

    /// Removes the slot at `i` by swapping the last slot's data into it,
    /// then shrinking every column by one. A no-op contract violation in
    /// release builds if `i >= agents_count()`; panics in debug builds.
    pub fn remove_at(&mut self, i: usize) {
        debug_assert!(i < self.agents_count, "remove_at: index {i} out of range");
        if i >= self.agents_count {
            return;
        }
        let last = self.agents_count - 1;

        swap_remove_scalar(&mut self.radius, i, last);
        swap_remove_scalar(&mut self.agent_type_index, i, last);
        swap_remove_scalar(&mut self.is_movable, i, last);
        swap_remove_scalar(&mut self.is_motile, i, last);
        swap_remove_scalar(&mut self.cell_id, i, last);
        swap_remove_scalar(&mut self.cell_cell_repulsion_strength, i, last);
        swap_remove_scalar(&mut self.cell_cell_adhesion_strength, i, last);
        swap_remove_scalar(&mut self.relative_maximum_adhesion_distance, i, last);
        swap_remove_scalar(&mut self.spring_constant, i, last);
        swap_remove_scalar(&mut self.motility_speed, i, last);
        swap_remove_scalar(&mut self.simple_pressure, i, last);
        swap_remove_scalar(&mut self.neighbors, i, last);
        swap_remove_scalar(&mut self.spring_attachments, i, last);
        swap_remove_scalar(&mut self.volumes, i, last);

        swap_remove_block(&mut self.positions, i, last, self.dims);
        swap_remove_block(&mut self.velocity, i, last, self.dims);
        swap_remove_block(&mut self.previous_velocity, i, last, self.dims);
        swap_remove_block(&mut self.force, i, last, self.dims);
        swap_remove_block(&mut self.motility_direction, i, last, self.dims);

        let s = self.substrates_count;
        swap_remove_block(&mut self.secretion_rates, i, last, s);
        swap_remove_block(&mut self.saturation_densities, i, last, s);
        swap_remove_block(&mut self.uptake_rates, i, last, s);
        swap_remove_block(&mut self.net_export_rates, i, last, s);
        swap_remove_block(&mut self.internalized_substrates, i, last, s);
        swap_remove_block(&mut self.fraction_released_at_death, i, last, s);
        swap_remove_block(&mut self.fraction_transferred_when_ingested, i, last, s);

        self.agents_count -= 1;
    }

    pub fn position(&self, i: usize) -> &[f64] {
        &self.positions[i * self.dims..(i + 1) * self.dims]
    }

    pub fn position_mut(&mut self, i: usize) -> &mut [f64] {
        &mut self.positions[i * self.dims..(i + 1) * self.dims]
    }

    pub fn velocity(&self, i: usize) -> &[f64] {
        &self.velocity[i * self.dims..(i + 1) * self.dims]
    }

    pub fn velocity_mut(&mut self, i: usize) -> &mut [f64] {
        &mut self.velocity[i * self.dims..(i + 1) * self.dims]
    }

    pub fn force(&self, i: usize) -> &[f64] {
        &self.force[i * self.dims..(i + 1) * self.dims]
    }

    pub fn force_mut(&mut self, i: usize) -> &mut [f64] {
        &mut self.force[i * self.dims..(i + 1) * self.dims]
    }

    pub fn secretion_rates(&self, i: usize) -> &[f64] {
        let s = self.substrates_count;
        &self.secretion_rates[i * s..(i + 1) * s]
    }
}

fn swap_remove_scalar<T: Copy>(col: &mut Vec<T>, i: usize, last: usize) {
    col[i] = col[last];
    col.truncate(last);
}

fn swap_remove_block<T: Copy>(col: &mut Vec<T>, i: usize, last: usize, width: usize) {
    if width == 0 {
        return;
    }
    let (dst_start, src_start) = (i * width, last * width);
    for w in 0..width {
        col[dst_start + w] = col[src_start + w];
    }
    col.truncate(last * width);
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn add_increases_agents_count_and_column_lengths() {
        let mut data = AgentData::new(2, 1);
        let idx = data.add();
        assert_eq!(idx, 0);
        assert_eq!(data.agents_count(), 1);
        assert_eq!(data.positions.len(), 2);
        assert_eq!(data.secretion_rates.len(), 1);
        assert!(data.is_movable[0]);
    }

    #[test]
    fn remove_at_swaps_last_into_freed_slot() {
        let mut data = AgentData::new(2, 0);
        let a = data.add();
        let b = data.add();
        let c = data.add();
        data.position_mut(a).copy_from_slice(&[1.0, 1.0]);
        data.position_mut(b).copy_from_slice(&[2.0, 2.0]);
        data.position_mut(c).copy_from_slice(&[3.0, 3.0]);
        data.cell_id[a] = 10;
        data.cell_id[b] = 20;
        data.cell_id[c] = 30;

        data.remove_at(a);

        assert_eq!(data.agents_count(), 2);
        // slot 0 now holds what was the last agent (cell_id 30)
        assert_eq!(data.cell_id[0], 30);
        assert_eq!(data.position(0), &[3.0, 3.0]);
        // the other untouched agent is unaffected
        assert_eq!(data.cell_id[1], 20);
        assert_eq!(data.position(1), &[2.0, 2.0]);
    }

    #[test]
    fn remove_last_slot_is_plain_shrink() {
        let mut data = AgentData::new(1, 0);
        data.add();
        data.add();
        data.remove_at(1);
        assert_eq!(data.agents_count(), 1);
    }
}

//! Per-step neighbor list rebuild.
//!
//! Grounded on `original_source/mechanics/physicell/kernels/openmp_solver/src/cell_neighbors.cpp`:
//! clear every agent's neighbor list, then for each movable agent sum the
//! two partners' `relative_maximum_adhesion_distance * radius`, skip the
//! pair if that sum is non-positive, and otherwise compare distance
//! against it with an inclusive `<=`.

use itertools::Itertools;

use crate::agent_data::AgentData;
use crate::mesh::CartesianMesh;

/// Rebuilds `data.neighbors` from scratch using a naive O(N^2) scan. Kept
/// as the cross-check reference for `rebuild_bucketed`; legal as a
/// standalone implementation for small agent counts.
pub fn rebuild_naive(data: &mut AgentData) {
    for list in data.neighbors.iter_mut() {
        list.clear();
    }
    let n = data.agents_count();
    for i in 0..n {
        if !data.is_movable[i] {
            continue;
        }
        for j in 0..n {
            if i == j {
                continue;
            }
            if let Some(()) = adhesion_reach(data, i, j) {
                data.neighbors[i].push(j);
            }
        }
    }
}

/// Clamps a raw (possibly out-of-bounds) voxel index into `[0,
/// grid_shape)` per axis. `CartesianMesh::voxel_position` intentionally
/// performs no clamping of its own (positions outside the bounding box
/// are legal, e.g. for agents that have drifted past a boundary before
/// the boundary force has had a chance to act); callers that bucket by
/// voxel are exactly the ones responsible for clamping before indexing.
fn clamp_voxel(raw: [i64; 3], grid_shape: [usize; 3]) -> [i64; 3] {
    let mut out = [0i64; 3];
    for axis in 0..3 {
        out[axis] = raw[axis].clamp(0, grid_shape[axis] as i64 - 1);
    }
    out
}

/// Rebuilds `data.neighbors` using mesh bucketing: candidates are drawn
/// only from the 3x3(x3) block of voxels around the agent's own voxel,
/// which is sufficient because the adhesion distance of any pair is
/// bounded by design to stay within one voxel width. Every voxel index
/// used as a bucket key is clamped into the mesh's grid shape first, so
/// agents outside the bounding box still land in (and are looked up
/// from) the nearest real bucket instead of being dropped.
pub fn rebuild_bucketed(data: &mut AgentData, mesh: &CartesianMesh) {
    for list in data.neighbors.iter_mut() {
        list.clear();
    }
    let n = data.agents_count();
    if n == 0 {
        return;
    }

    let grid_shape = mesh.grid_shape();
    let mut buckets: std::collections::HashMap<[i64; 3], Vec<usize>> = std::collections::HashMap::new();
    for k in 0..n {
        let voxel = clamp_voxel(mesh.voxel_position(data.position(k)), grid_shape);
        buckets.entry(voxel).or_default().push(k);
    }

    for i in 0..n {
        if !data.is_movable[i] {
            continue;
        }
        let voxel = clamp_voxel(mesh.voxel_position(data.position(i)), grid_shape);
        let offsets: Vec<i64> = (-1..=1).collect();
        // Clamping can fold several of the 27 raw offsets onto the same
        // real bucket (e.g. near a mesh edge, or when the mesh is only
        // one voxel wide on some axis); dedupe so a candidate is never
        // tested against agent `i` more than once.
        let mut seen_buckets = std::collections::HashSet::new();
        for (dx, dy, dz) in offsets.iter().cartesian_product(offsets.iter()).cartesian_product(offsets.iter()).map(|((a, b), c)| (*a, *b, *c))
        {
            let nb = clamp_voxel([voxel[0] + dx, voxel[1] + dy, voxel[2] + dz], grid_shape);
            if !seen_buckets.insert(nb) {
                continue;
            }
            if let Some(candidates) = buckets.get(&nb) {
                for &j in candidates {
                    if i == j {
                        continue;
                    }
                    if adhesion_reach(data, i, j).is_some() {
                        data.neighbors[i].push(j);
                    }
                }
            }
        }
    }
}

/// `Some(())` if `i` and `j` are within each other's adhesion reach.
fn adhesion_reach(data: &AgentData, i: usize, j: usize) -> Option<()> {
    let adhesion_distance = data.relative_maximum_adhesion_distance[i] * data.radius[i]
        + data.relative_maximum_adhesion_distance[j] * data.radius[j];
    if adhesion_distance <= 0.0 {
        return None;
    }
    let dims = data.dims;
    let pi = data.position(i);
    let pj = data.position(j);
    let mut sq = 0.0;
    for a in 0..dims {
        let d = pj[a] - pi[a];
        sq += d * d;
    }
    if sq.sqrt() <= adhesion_distance {
        Some(())
    } else {
        None
    }
}

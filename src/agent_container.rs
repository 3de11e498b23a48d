//! Handle-stable container wrapping `AgentData`.
//!
//! Grounded on `original_source/mechanics/micromechanics/tests/test_agent_container.cpp`:
//! a handle obtained from `create()` must keep resolving to the same
//! logical agent across unrelated removals, even though the underlying
//! storage is compacted with swap-with-last.

use crate::agent_data::AgentData;

/// A stable reference to an agent. Survives removal of *other* agents;
/// using a handle after its own agent has been removed is a contract
/// violation (debug: panics; release: accessors return `None`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct AgentHandle {
    slot: usize,
}

/// Owns one `AgentData` plus the indirection table that makes
/// `AgentHandle`s stable across swap-removal.
#[derive(Clone, Debug)]
pub struct AgentContainer {
    data: AgentData,
    /// handle slot -> live data index, or `None` if the handle was freed.
    handle_to_index: Vec<Option<usize>>,
    /// live data index -> owning handle slot.
    index_to_handle: Vec<usize>,
    free_handle_slots: Vec<usize>,
}

impl AgentContainer {
    pub fn new(dims: usize, substrates_count: usize) -> Self {
        Self {
            data: AgentData::new(dims, substrates_count),
            handle_to_index: Vec::new(),
            index_to_handle: Vec::new(),
            free_handle_slots: Vec::new(),
        }
    }

    pub fn data(&self) -> &AgentData {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut AgentData {
        &mut self.data
    }

    pub fn size(&self) -> usize {
        self.data.agents_count()
    }

    /// Creates a new agent and returns a handle to it.
    pub fn create(&mut self) -> AgentHandle {
        let index = self.data.add();
        let slot = match self.free_handle_slots.pop() {
            Some(slot) => {
                self.handle_to_index[slot] = Some(index);
                slot
            }
            None => {
                self.handle_to_index.push(Some(index));
                self.handle_to_index.len() - 1
            }
        };
        self.index_to_handle.push(slot);
        AgentHandle { slot }
    }

    /// Resolves a handle to its current data index, if live.
    pub fn resolve(&self, handle: AgentHandle) -> Option<usize> {
        self.handle_to_index.get(handle.slot).copied().flatten()
    }

    pub fn get_agent_at(&self, index: usize) -> Option<usize> {
        if index < self.data.agents_count() {
            Some(index)
        } else {
            debug_assert!(false, "get_agent_at: index {index} out of range");
            None
        }
    }

    /// Removes the agent referenced by `handle`. No-op if already removed.
    pub fn remove_agent(&mut self, handle: AgentHandle) {
        if let Some(index) = self.resolve(handle) {
            self.remove_at(index);
        }
    }

    /// Removes the agent currently at data index `i`, rebinding the
    /// handle of the moved (formerly last) agent to slot `i`.
    pub fn remove_at(&mut self, i: usize) {
        debug_assert!(i < self.data.agents_count(), "remove_at: index {i} out of range");
        if i >= self.data.agents_count() {
            return;
        }
        let last = self.data.agents_count() - 1;

        let removed_handle_slot = self.index_to_handle[i];
        self.handle_to_index[removed_handle_slot] = None;
        self.free_handle_slots.push(removed_handle_slot);

        if i != last {
            let moved_handle_slot = self.index_to_handle[last];
            self.handle_to_index[moved_handle_slot] = Some(i);
            self.index_to_handle[i] = moved_handle_slot;
        }
        self.index_to_handle.truncate(last);

        self.data.remove_at(i);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn create_increases_size() {
        let mut c = AgentContainer::new(2, 0);
        assert_eq!(c.size(), 0);
        c.create();
        assert_eq!(c.size(), 1);
        c.create();
        assert_eq!(c.size(), 2);
    }

    #[test]
    fn handle_survives_removal_of_other_agent() {
        let mut c = AgentContainer::new(1, 0);
        let h0 = c.create();
        let h1 = c.create();
        let h2 = c.create();
        c.data_mut().cell_id[c.resolve(h0).unwrap()] = 0;
        c.data_mut().cell_id[c.resolve(h1).unwrap()] = 1;
        c.data_mut().cell_id[c.resolve(h2).unwrap()] = 2;

        c.remove_agent(h0);

        assert_eq!(c.size(), 2);
        // h1 and h2 still resolve to their own agent's cell_id
        let idx1 = c.resolve(h1).unwrap();
        let idx2 = c.resolve(h2).unwrap();
        assert_eq!(c.data().cell_id[idx1], 1);
        assert_eq!(c.data().cell_id[idx2], 2);
        // h0 is now dead
        assert_eq!(c.resolve(h0), None);
    }

    #[test]
    fn removing_last_agent_by_handle_is_plain_shrink() {
        let mut c = AgentContainer::new(1, 0);
        let h0 = c.create();
        let h1 = c.create();
        c.remove_agent(h1);
        assert_eq!(c.size(), 1);
        assert!(c.resolve(h0).is_some());
    }

    #[test]
    fn get_agent_at_bounds_checked() {
        let mut c = AgentContainer::new(1, 0);
        c.create();
        assert_eq!(c.get_agent_at(0), Some(0));
        assert_eq!(c.get_agent_at(1), None);
    }
}

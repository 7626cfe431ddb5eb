//! Facility × facility distance memoisation.
//!
//! # Layout
//!
//! Positions get compact indices: facilities first (stable for the whole
//! match), then up to one slot per owned agent (re-registered every step as
//! agents move).  Two 256-entry id→index maps exist because the planner asks
//! about both layouts: `id_to_index1` reflects positions as registered this
//! step, `id_to_index2` starts as a copy and is patched by
//! [`move_to`](DistCache::move_to) when the planner reasons about an agent
//! that will have relocated.
//!
//! The dense `u16` matrix holds distances in the graph unit divided by 1000
//! (metres), filled lazily: through the per-facility lookup tables when one
//! end is a facility, by full bidirectional A* otherwise.

use fleet_core::{NameId, Pos, AGENTS_PER_TEAM};

use crate::error::GraphResult;
use crate::lookup::LookupTable;
use crate::network::Graph;
use crate::position::GraphPos;

const NO_INDEX: u8 = 0xff;
const UNFILLED: u16 = u16::MAX;

pub struct DistCache {
    facility_count: usize,
    size_max: usize,
    size: usize,
    id_to_index1: [u8; 256],
    id_to_index2: [u8; 256],
    positions: Vec<GraphPos>,
    /// Row-major `size_max × size_max`, `UNFILLED` = not yet computed.
    distances: Vec<u16>,
    lookups: LookupTable,
}

impl DistCache {
    /// A cache for `facility_count` facilities plus one slot per owned agent.
    pub fn new(facility_count: usize) -> Self {
        let size_max = facility_count + AGENTS_PER_TEAM;
        DistCache {
            facility_count,
            size_max,
            size: 0,
            id_to_index1: [NO_INDEX; 256],
            id_to_index2: [NO_INDEX; 256],
            positions: Vec::with_capacity(size_max),
            distances: vec![UNFILLED; size_max * size_max],
            lookups: LookupTable::new(),
        }
    }

    pub fn facility_count(&self) -> usize {
        self.facility_count
    }

    /// Snap `pos` and bind `id` to its compact index.  Identical snapped
    /// positions share one index.
    pub fn register_pos(&mut self, graph: &Graph, id: NameId, pos: Pos) {
        let gp = graph.snap(pos);
        let index = match self.positions[..self.size].iter().position(|&p| p == gp) {
            Some(i) => i,
            None => {
                assert!(self.size < self.size_max, "distance cache position overflow");
                let i = self.size;
                if self.positions.len() == i {
                    self.positions.push(gp);
                } else {
                    self.positions[i] = gp;
                }
                self.size += 1;
                i
            }
        };
        self.id_to_index1[id.index()] = index as u8;
    }

    /// Warm the single-source lookup tables for every registered facility.
    /// Call once after all facilities are registered.
    ///
    /// Facilities whose snapped positions coincide share one index, so the
    /// facility block may end up smaller than the registration count; the
    /// block boundary is fixed here.
    pub fn calc_facilities(&mut self, graph: &Graph) {
        assert!(self.size <= self.facility_count, "register all facilities first");
        self.facility_count = self.size;
        for i in 0..self.size {
            self.lookups.add_lookup(graph, self.positions[i]);
        }
    }

    /// Start the step's moved-position layout from the registered one.
    pub fn load_positions(&mut self) {
        self.id_to_index2 = self.id_to_index1;
    }

    /// Record that `id` will sit at `to_id`'s position from now on.
    pub fn move_to(&mut self, id: NameId, to_id: NameId) {
        self.id_to_index2[id.index()] = self.id_to_index2[to_id.index()];
    }

    /// Distance between two registered ids in the moved layout, lazily
    /// computed, in metres.
    pub fn lookup(&mut self, graph: &Graph, a_id: NameId, b_id: NameId) -> GraphResult<u16> {
        let a = self.id_to_index2[a_id.index()];
        let b = self.id_to_index2[b_id.index()];
        self.fill(graph, a, b)
    }

    /// Like [`lookup`](Self::lookup) but against the original layout.
    pub fn lookup_old(&mut self, graph: &Graph, a_id: NameId, b_id: NameId) -> GraphResult<u16> {
        let a = self.id_to_index1[a_id.index()];
        let b = self.id_to_index1[b_id.index()];
        self.fill(graph, a, b)
    }

    fn fill(&mut self, graph: &Graph, a: u8, b: u8) -> GraphResult<u16> {
        assert!(a != NO_INDEX && b != NO_INDEX, "id not registered in distance cache");
        let cell = a as usize * self.size_max + b as usize;
        if self.distances[cell] == UNFILLED {
            let dist = if a == b {
                0
            } else {
                let s = self.positions[a as usize];
                let t = self.positions[b as usize];
                match self.lookups.lookup_between(graph, s, t) {
                    Some(d) => d,
                    None => graph.dist_road(s, t)?,
                }
            };
            self.distances[cell] = (dist / 1000).min((UNFILLED - 1) as u32) as u16;
        }
        Ok(self.distances[cell])
    }

    /// Evict everything outside the facility block: agent positions, agent
    /// rows/columns of the matrix, and agent id bindings.
    pub fn reset(&mut self) {
        for a in 0..self.facility_count {
            for b in self.facility_count..self.size_max {
                self.distances[a * self.size_max + b] = UNFILLED;
            }
        }
        for a in self.facility_count..self.size_max {
            for b in 0..self.size_max {
                self.distances[a * self.size_max + b] = UNFILLED;
            }
        }
        self.size = self.facility_count;
        for i in self.id_to_index1.iter_mut() {
            if *i != NO_INDEX && (*i as usize) >= self.facility_count {
                *i = NO_INDEX;
            }
        }
        self.positions.truncate(self.facility_count);
    }
}

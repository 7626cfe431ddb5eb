//! Per-position single-source distance cache.
//!
//! The planner asks for tens of thousands of distances per pass, almost all
//! of them anchored at a facility.  Instead of running bidirectional A* for
//! each pair, a facility gets **one** forward and one backward Dijkstra over
//! the whole (pruned) graph; any later query touching that position is then
//! a table read plus an edge refinement.  Queries between two uncached
//! positions fall back to [`Graph::dist_road`].

use std::collections::BTreeSet;

use fleet_core::NodeId;

use crate::network::{Edge, Graph};
use crate::position::GraphPos;

const DIST_INVALID: u32 = u32::MAX;

/// Node-distance tables anchored at one graph position.
pub struct LookupSlot {
    /// Shortest distance from the anchor to every node (forward edges).
    pub fwd: Vec<u32>,
    /// Shortest distance from every node to the anchor (reverse edges).
    pub bwd: Vec<u32>,
}

/// Sorted collection of [`LookupSlot`]s keyed by anchor position.
#[derive(Default)]
pub struct LookupTable {
    /// `(anchor, slot index)`, sorted by anchor for binary search.
    keys: Vec<(GraphPos, u32)>,
    slots: Vec<LookupSlot>,
}

impl LookupTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Run both single-source passes from `pos` and store the tables.
    /// A second registration of the same anchor is a no-op.
    pub fn add_lookup(&mut self, graph: &Graph, pos: GraphPos) {
        if self.get(pos).is_some() {
            return;
        }
        let slot = LookupSlot {
            fwd: single_source(graph, pos, false),
            bwd: single_source(graph, pos, true),
        };
        let idx = self.slots.len() as u32;
        self.slots.push(slot);
        let at = self.keys.partition_point(|&(p, _)| p < pos);
        self.keys.insert(at, (pos, idx));
    }

    /// The tables anchored at `pos`, if registered.
    pub fn get(&self, pos: GraphPos) -> Option<&LookupSlot> {
        self.keys
            .binary_search_by_key(&pos, |&(p, _)| p)
            .ok()
            .map(|i| &self.slots[self.keys[i].1 as usize])
    }

    /// Distance `s → t` through a cached anchor, if either end has one.
    ///
    /// Tries the forward table of `s` refined onto `t`, then the backward
    /// table of `t` refined onto `s`.  `None` means neither end is cached
    /// and the caller must route the pair itself.
    pub fn lookup_between(&self, graph: &Graph, s: GraphPos, t: GraphPos) -> Option<u32> {
        if let Some(slot) = self.get(s) {
            return Some(refine(graph, &slot.fwd, t, false));
        }
        if let Some(slot) = self.get(t) {
            return Some(refine(graph, &slot.bwd, s, true));
        }
        None
    }
}

/// Extend a node-distance table onto an arbitrary graph position.
///
/// For a forward table the remaining stretch runs *onto* `target`'s edge;
/// for a backward table (`reversed`) it runs *off* it, which swaps the
/// direction bits.
fn refine(graph: &Graph, table: &[u32], target: GraphPos, reversed: bool) -> u32 {
    if target.is_node() {
        return table[target.node_id().index()];
    }
    let e = graph.edge(target.edge_id());
    let (bit_a, bit_b) = if reversed {
        (Edge::BWD, Edge::FWD)
    } else {
        (Edge::FWD, Edge::BWD)
    };
    let mut dist = DIST_INVALID;
    if e.flags & bit_a != 0 {
        dist = table[e.node_a.index()]
            .saturating_add((target.edge_frac() * e.dist as f32) as u32);
    }
    if e.flags & bit_b != 0 {
        let d = table[e.node_b.index()]
            .saturating_add(((1.0 - target.edge_frac()) * e.dist as f32) as u32);
        dist = dist.min(d);
    }
    dist
}

/// Plain Dijkstra from `pos` over forward (`!backward`) or reverse edges.
fn single_source(graph: &Graph, pos: GraphPos, backward: bool) -> Vec<u32> {
    let n = graph.node_count();
    let mut dist = vec![DIST_INVALID; n];
    let mut ring: BTreeSet<(u32, NodeId)> = BTreeSet::new();

    if pos.is_edge() {
        let e = graph.edge(pos.edge_id());
        // Leaving the edge towards an endpoint needs the matching direction
        // bit; the backward pass arrives instead, which mirrors the bits.
        let (bit_a, bit_b) = if backward {
            (Edge::FWD, Edge::BWD)
        } else {
            (Edge::BWD, Edge::FWD)
        };
        if e.flags & bit_a != 0 {
            let d = (pos.edge_frac() * e.dist as f32) as u32;
            dist[e.node_a.index()] = d;
            ring.insert((d, e.node_a));
        }
        if e.flags & bit_b != 0 {
            let d = ((1.0 - pos.edge_frac()) * e.dist as f32) as u32;
            dist[e.node_b.index()] = d;
            ring.insert((d, e.node_b));
        }
    } else {
        dist[pos.node_id().index()] = 0;
        ring.insert((0, pos.node_id()));
    }

    while let Some((d, node)) = ring.pop_first() {
        for er in graph.out_iter(node) {
            let e = graph.edge(er.id);
            let bit = match (backward, er.at_node_a) {
                (false, true) => Edge::FWD,
                (false, false) => Edge::BWD,
                (true, true) => Edge::BWD,
                (true, false) => Edge::FWD,
            };
            if e.flags & bit == 0 {
                continue;
            }
            let other = graph.other_end(er);
            let newdist = d.saturating_add(e.dist);
            if newdist < dist[other.index()] {
                if dist[other.index()] != DIST_INVALID {
                    ring.remove(&(dist[other.index()], other));
                }
                ring.insert((newdist, other));
                dist[other.index()] = newdist;
            }
        }
    }
    dist
}

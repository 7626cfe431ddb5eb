//! Shortest-path routing: bidirectional A* with early termination.
//!
//! # Algorithm
//!
//! Two best-first searches run in lockstep, one from the source over forward
//! edges and one from the target over reversed edges.  Ring entries are keyed
//! by `g(n) + h(n)` where the heuristic is the straight-line distance in
//! metres·10³ minus a safety margin, clamped at zero — an admissible
//! underestimate, so the first incumbent that beats both ring tops is
//! optimal.  Whenever one search settles a node the other has already
//! settled, the joined length `g_f(n) + g_b(n)` becomes the incumbent and
//! the node the candidate meeting point; the search stops when either ring's
//! top key reaches the incumbent.
//!
//! Both searches honour the one-way flags: leaving `node_a` requires bit 0,
//! leaving `node_b` bit 1, mirrored for the backward direction.
//!
//! # Degenerate queries
//!
//! Same node → 0.  Both positions on one edge with a compatible direction →
//! the arc-length difference, no node traversal at all.

use std::collections::BTreeSet;

use tracing::warn;

use fleet_core::NodeId;

use crate::error::{GraphError, GraphResult};
use crate::network::Graph;
use crate::position::GraphPos;

/// Heuristic safety margin in metres·10³, absorbing quantisation error so
/// the straight-line estimate never overestimates a road distance.
pub const DIST_MARGIN: f32 = 1000.0;

const DIST_INVALID: u32 = u32::MAX;

impl Graph {
    /// Length of the shortest route between two graph positions, in
    /// metres·10³.
    pub fn dist_road(&self, s: GraphPos, t: GraphPos) -> GraphResult<u32> {
        self.dist_road_route(s, t, None)
    }

    /// Like [`dist_road`](Self::dist_road), optionally writing the sequence
    /// of traversed tower nodes into `route`.
    pub fn dist_road_route(
        &self,
        s: GraphPos,
        t: GraphPos,
        route: Option<&mut Vec<NodeId>>,
    ) -> GraphResult<u32> {
        // ── Degenerate cases ──────────────────────────────────────────────
        if s.is_node() && t.is_node() && s.node_id() == t.node_id() {
            if let Some(route) = route {
                route.clear();
                route.push(s.node_id());
            }
            return Ok(0);
        }
        if s.is_edge() && t.is_edge() && s.edge_id() == t.edge_id() {
            let edge = self.edge(s.edge_id());
            let with = s.edge_pos_raw() <= t.edge_pos_raw() && edge.flags & crate::Edge::FWD != 0;
            let against = s.edge_pos_raw() >= t.edge_pos_raw() && edge.flags & crate::Edge::BWD != 0;
            if with || against {
                if let Some(route) = route {
                    route.clear();
                }
                return Ok(((s.edge_frac() - t.edge_frac()).abs() * edge.dist as f32) as u32);
            }
        }

        let spos = self.lattice_pos(s);
        let tpos = self.lattice_pos(t);
        let est_f = |g: &Graph, n: NodeId| -> u32 {
            let d = g.dist_air(tpos, g.node(n).pos) * 1000.0 - DIST_MARGIN;
            if d < 0.0 { 0 } else { d as u32 }
        };
        let est_b = |g: &Graph, n: NodeId| -> u32 {
            let d = g.dist_air(spos, g.node(n).pos) * 1000.0 - DIST_MARGIN;
            if d < 0.0 { 0 } else { d as u32 }
        };

        let n = self.node_count();
        let mut dist_f = vec![DIST_INVALID; n];
        let mut dist_b = vec![DIST_INVALID; n];
        let mut prev = vec![NodeId::INVALID; n];
        let mut next = vec![NodeId::INVALID; n];
        let mut visited_f = vec![false; n];
        let mut visited_b = vec![false; n];

        // Rings hold (g + h, node); BTreeSet doubles as a mutable best-first
        // queue with deterministic tie-breaking on the node id.
        let mut ring_f: BTreeSet<(u32, NodeId)> = BTreeSet::new();
        let mut ring_b: BTreeSet<(u32, NodeId)> = BTreeSet::new();

        if s.is_edge() {
            let e = self.edge(s.edge_id());
            debug_assert!(e.node_a != NodeId::INVALID && e.node_b != NodeId::INVALID);
            if e.flags & crate::Edge::BWD != 0 {
                let d = (s.edge_frac() * e.dist as f32) as u32;
                dist_f[e.node_a.index()] = d;
                ring_f.insert((d.saturating_add(est_f(self, e.node_a)), e.node_a));
            }
            if e.flags & crate::Edge::FWD != 0 {
                let d = ((1.0 - s.edge_frac()) * e.dist as f32) as u32;
                dist_f[e.node_b.index()] = d;
                ring_f.insert((d.saturating_add(est_f(self, e.node_b)), e.node_b));
            }
        } else {
            dist_f[s.node_id().index()] = 0;
            ring_f.insert((est_f(self, s.node_id()), s.node_id()));
        }

        if t.is_edge() {
            let e = self.edge(t.edge_id());
            debug_assert!(e.node_a != NodeId::INVALID && e.node_b != NodeId::INVALID);
            if e.flags & crate::Edge::FWD != 0 {
                let d = (t.edge_frac() * e.dist as f32) as u32;
                dist_b[e.node_a.index()] = d;
                ring_b.insert((d.saturating_add(est_b(self, e.node_a)), e.node_a));
            }
            if e.flags & crate::Edge::BWD != 0 {
                let d = ((1.0 - t.edge_frac()) * e.dist as f32) as u32;
                dist_b[e.node_b.index()] = d;
                ring_b.insert((d.saturating_add(est_b(self, e.node_b)), e.node_b));
            }
        } else {
            dist_b[t.node_id().index()] = 0;
            ring_b.insert((est_b(self, t.node_id()), t.node_id()));
        }

        // ── Main loop: alternate one forward and one backward settle ──────
        let mut midnode = NodeId::INVALID;
        let mut inc = DIST_INVALID;
        loop {
            // Forward half.
            let Some(&(key, node)) = ring_f.first() else { break };
            if key >= inc {
                break;
            }
            ring_f.pop_first();
            if visited_b[node.index()] {
                debug_assert_ne!(dist_b[node.index()], DIST_INVALID);
                let d = dist_f[node.index()].saturating_add(dist_b[node.index()]);
                if d < inc {
                    midnode = node;
                    inc = d;
                    if t.is_node() && t.node_id() == node {
                        break;
                    }
                }
            } else {
                visited_f[node.index()] = true;
                for er in self.out_iter(node) {
                    let e = self.edge(er.id);
                    if !e.passable_from(er.at_node_a) {
                        continue;
                    }
                    let other = self.other_end(er);
                    let newdist = dist_f[node.index()].saturating_add(e.dist);
                    if newdist < dist_f[other.index()] {
                        let est = est_f(self, other);
                        if newdist.saturating_add(est) < inc {
                            if dist_f[other.index()] == DIST_INVALID {
                                ring_f.insert((newdist.saturating_add(est), other));
                            }
                            dist_f[other.index()] = newdist;
                            prev[other.index()] = node;
                        }
                    }
                }
            }

            // Backward half.
            let Some(&(key, node)) = ring_b.first() else { break };
            if key >= inc {
                break;
            }
            ring_b.pop_first();
            if visited_f[node.index()] {
                debug_assert_ne!(dist_f[node.index()], DIST_INVALID);
                let d = dist_f[node.index()].saturating_add(dist_b[node.index()]);
                if d < inc {
                    midnode = node;
                    inc = d;
                    if s.is_node() && s.node_id() == node {
                        break;
                    }
                }
            } else {
                visited_b[node.index()] = true;
                for er in self.out_iter(node) {
                    let e = self.edge(er.id);
                    // Reverse traversal: the edge must be passable *towards*
                    // this node.
                    let bit = if er.at_node_a { crate::Edge::BWD } else { crate::Edge::FWD };
                    if e.flags & bit == 0 {
                        continue;
                    }
                    let other = self.other_end(er);
                    let newdist = dist_b[node.index()].saturating_add(e.dist);
                    if newdist < dist_b[other.index()] {
                        let est = est_b(self, other);
                        if newdist.saturating_add(est) < inc {
                            if dist_b[other.index()] == DIST_INVALID {
                                ring_b.insert((newdist.saturating_add(est), other));
                            }
                            dist_b[other.index()] = newdist;
                            next[other.index()] = node;
                        }
                    }
                }
            }
        }

        if inc == DIST_INVALID {
            warn!(from = ?s, to = ?t, "no path found in bidirectional A*");
            return Err(GraphError::NoPath { from: s, to: t });
        }

        // ── Route reconstruction ──────────────────────────────────────────
        if let Some(route) = route {
            route.clear();
            let mut cur = prev[midnode.index()];
            while cur != NodeId::INVALID {
                route.push(cur);
                cur = prev[cur.index()];
            }
            route.reverse();
            let mut cur = midnode;
            while cur != NodeId::INVALID {
                route.push(cur);
                cur = next[cur.index()];
            }
        }
        Ok(inc)
    }
}

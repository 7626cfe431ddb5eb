//! Snapping a lattice point onto the road graph.
//!
//! # Algorithm
//!
//! 1. Query the R-tree for the `K = 8` nearest live tower nodes; the nearest
//!    of them is the initial candidate.
//! 2. Restrict the edge search to edges incident on any of those K nodes.
//! 3. For each candidate edge, walk its pillar polyline: every interior
//!    pillar competes with its direct distance, and every straight segment
//!    competes with the perpendicular-foot distance, both plus a small
//!    [`EDGE_PENALTY`] that pushes near-ties onto real tower nodes.
//! 4. The winner becomes a node position (`edge_pos = 0`) or an edge
//!    position with the fractional arc length of the winning point.
//!
//! The penalty is in metres; with a typical node spacing of tens of metres
//! it only decides genuine ties.

use fleet_core::{EdgeId, NodeId, Pos};

use crate::network::Graph;
use crate::position::GraphPos;

/// Metres added to edge-interior candidates so ties snap to tower nodes.
pub const EDGE_PENALTY: f32 = 2.0;

/// How many nearest tower nodes seed the candidate edge set.
pub const SNAP_NEAREST: usize = 8;

impl Graph {
    /// Snap a lattice point to the nearest node or edge of the live network.
    ///
    /// # Panics
    /// Panics if the graph has no live nodes.
    pub fn snap(&self, pos: Pos) -> GraphPos {
        let near = self.k_nearest_nodes(pos, SNAP_NEAREST);
        assert!(!near.is_empty(), "cannot snap onto an empty network");

        // Nearest tower node is the baseline candidate.
        let mut min = f32::MAX;
        let mut best_node = NodeId::INVALID;
        for &n in &near {
            let d = self.dist_air(pos, self.node(n).pos);
            if d < min {
                min = d;
                best_node = n;
            }
        }
        let mut best_edge = EdgeId::INVALID;
        let mut best_frac = 0.0f32;

        // Candidate edges: all edges incident on any of the K seed nodes.
        let mut candidates: Vec<EdgeId> = Vec::with_capacity(SNAP_NEAREST * 4);
        for &n in &near {
            for er in self.out_iter(n) {
                candidates.push(er.id);
            }
        }
        candidates.sort_unstable();
        candidates.dedup();

        for edge_id in candidates {
            let pts = self.edge_polyline(edge_id);
            let n = pts.len();

            // Cumulative arc length along the polyline.
            let mut cum = Vec::with_capacity(n);
            cum.push(0.0f32);
            let mut total = 0.0;
            for w in pts.windows(2) {
                total += self.dist_air(w[0], w[1]);
                cum.push(total);
            }
            if total <= 0.0 {
                continue;
            }

            // Interior pillars.
            for i in 1..n - 1 {
                let d = self.dist_air(pos, pts[i]) + EDGE_PENALTY;
                if d < min {
                    min = d;
                    best_edge = edge_id;
                    best_frac = cum[i] / total;
                }
            }

            // Perpendicular feet on each straight segment.
            for i in 1..n {
                let (a, b) = (pts[i - 1], pts[i]);
                let dlat = (b.lat as i32 - a.lat as i32) as f32 * self.bounds.scale_lat;
                let dlon = (b.lon as i32 - a.lon as i32) as f32 * self.bounds.scale_lon;
                let dplat = (pos.lat as i32 - a.lat as i32) as f32 * self.bounds.scale_lat;
                let dplon = (pos.lon as i32 - a.lon as i32) as f32 * self.bounds.scale_lon;
                // Project along the dominant axis to avoid dividing by a
                // near-zero component.
                let steep = dlat.abs() > dlon.abs();
                let r = if steep {
                    (dplat + dplon * dlon / dlat) / (dlat + dlon * dlon / dlat)
                } else {
                    (dplon + dplat * dlat / dlon) / (dlon + dlat * dlat / dlon)
                };
                if r > 0.0 && r < 1.0 {
                    let seg = self.dist_air(a, b);
                    let d = (if steep { (dplon - dlon * r) / dlat } else { (dplat - dlat * r) / dlon })
                        .abs()
                        * seg
                        + EDGE_PENALTY;
                    if d < min {
                        min = d;
                        best_edge = edge_id;
                        best_frac = (cum[i - 1] + r * (cum[i] - cum[i - 1])) / total;
                    }
                }
            }
        }

        if best_edge == EdgeId::INVALID {
            GraphPos::node(best_node)
        } else {
            GraphPos::on_edge(best_edge, best_frac.clamp(0.0, 1.0))
        }
    }
}

//! `GraphPos` — a unified coordinate on the road graph.
//!
//! A position is either a tower node (`edge_pos == 0`) or a point along an
//! edge, where the byte `edge_pos` encodes the fractional arc position
//! `(edge_pos − 0.5) / 255` from `node_a` towards `node_b`.  The id is kept
//! below 24 bits so a position always packs into four bytes; distance-cache
//! keys and lookup tables rely on the compact total order this gives.

use fleet_core::{EdgeId, NodeId};

/// A snapped position: a node, or an edge plus a fractional arc position.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct GraphPos {
    id: u32,
    edge_pos: u8,
}

impl GraphPos {
    /// Position exactly on a tower node.
    pub fn node(id: NodeId) -> Self {
        assert!(id.0 < 1 << 24, "node id exceeds 24 bits");
        GraphPos { id: id.0, edge_pos: 0 }
    }

    /// Position on an edge at fraction `frac ∈ [0, 1]` along `node_a → node_b`.
    pub fn on_edge(id: EdgeId, frac: f32) -> Self {
        assert!(id.0 < 1 << 24, "edge id exceeds 24 bits");
        assert!((0.0..=1.0).contains(&frac));
        let mut edge_pos = (frac * 255.0).floor() as u8;
        if edge_pos < 255 {
            edge_pos += 1;
        }
        GraphPos { id: id.0, edge_pos }
    }

    #[inline]
    pub fn is_node(self) -> bool {
        self.edge_pos == 0
    }

    #[inline]
    pub fn is_edge(self) -> bool {
        self.edge_pos != 0
    }

    /// The node this position denotes.
    ///
    /// # Panics
    /// Panics if the position is on an edge.
    #[inline]
    pub fn node_id(self) -> NodeId {
        assert!(self.is_node());
        NodeId(self.id)
    }

    /// The edge this position lies on.
    ///
    /// # Panics
    /// Panics if the position is a node.
    #[inline]
    pub fn edge_id(self) -> EdgeId {
        assert!(self.is_edge());
        EdgeId(self.id)
    }

    /// Fractional arc position along the edge, in `(0, 1)`.
    ///
    /// # Panics
    /// Panics if the position is a node.
    #[inline]
    pub fn edge_frac(self) -> f32 {
        assert!(self.is_edge());
        (self.edge_pos as f32 - 0.5) / 255.0
    }

    /// The raw byte encoding of the arc position (0 for nodes).
    #[inline]
    pub fn edge_pos_raw(self) -> u8 {
        self.edge_pos
    }
}

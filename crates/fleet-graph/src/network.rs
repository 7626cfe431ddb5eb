//! Road network representation.
//!
//! # Data layout
//!
//! Nodes and edges live in flat vectors indexed by `NodeId` / `EdgeId`.  Each
//! node heads an **intrusive doubly-linked adjacency list**: `Edge.link_a` is
//! the next edge incident on `Edge.node_a`, `link_b` the next incident on
//! `node_b`.  Iterating a node's edges is the small state machine
//! `(edge, at_node_a)` implemented by [`EdgeIter`] — no per-node edge vector
//! exists, which is what lets SCC pruning splice dead nodes out in place.
//!
//! Edge **geometry** (the pillar points between two tower nodes) is stored as
//! embedded variable-length arrays in one arena; `Edge.geo` is the record
//! reference in the road file's native 4-byte units, which by construction
//! equals half the record's byte offset in the arena.
//!
//! # Spatial index
//!
//! An R-tree over all live tower nodes answers the K-nearest queries that
//! seed position snapping.
//!
//! # One-way flags
//!
//! `Edge.flags` bit 0 permits travel `node_a → node_b`, bit 1 the reverse.

use rstar::{PointDistance, RTree, RTreeObject, AABB};

use fleet_core::arena::{Arena, Flat, FlatArray};
use fleet_core::{EdgeId, MapBounds, NodeId, Pos};

/// Size in bytes of one geometry arena unit (see [`Graph::geometry`]).
pub(crate) const GEO_UNIT: u32 = 2;

// ── Records ───────────────────────────────────────────────────────────────────

/// A tower node.  `edge_head == EdgeId::INVALID` marks a pruned node.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Node {
    pub edge_head: EdgeId,
    pub pos: Pos,
}

/// A road segment between two tower nodes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Edge {
    pub node_a: NodeId,
    pub node_b: NodeId,
    /// Next edge incident on `node_a`.
    pub link_a: EdgeId,
    /// Next edge incident on `node_b`.
    pub link_b: EdgeId,
    /// Length in metres·10³.
    pub dist: u32,
    /// Bit 0: a→b allowed.  Bit 1: b→a allowed.
    pub flags: u32,
    /// Geometry record reference (0 = straight line, no pillars).
    pub geo: u32,
    /// Street-name reference (unused by the planner, kept from the file).
    pub name: u32,
}

impl Edge {
    pub const FWD: u32 = 1;
    pub const BWD: u32 = 2;

    /// May this edge be traversed leaving from the given endpoint?
    #[inline]
    pub fn passable_from(&self, at_node_a: bool) -> bool {
        let bit = if at_node_a { Edge::FWD } else { Edge::BWD };
        self.flags & bit != 0
    }
}

// SAFETY: both records are `Copy` structs of 4-byte fields with no padding.
unsafe impl Flat for Node {}
unsafe impl Flat for Edge {}

// ── R-tree entry ──────────────────────────────────────────────────────────────

/// Entry in the spatial index: a lattice point plus its `NodeId`.
#[derive(Clone)]
pub(crate) struct NodeEntry {
    point: [f32; 2], // [lat, lon] in metre-scaled lattice units
    pub(crate) id: NodeId,
}

impl NodeEntry {
    pub(crate) fn new(point: [f32; 2], id: NodeId) -> Self {
        NodeEntry { point, id }
    }
}

impl RTreeObject for NodeEntry {
    type Envelope = AABB<[f32; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for NodeEntry {
    /// Squared Euclidean distance in metre-scaled coordinates, so nearest
    /// queries agree with [`MapBounds::dist_air`].
    fn distance_2(&self, point: &[f32; 2]) -> f32 {
        let dlat = self.point[0] - point[0];
        let dlon = self.point[1] - point[1];
        dlat * dlat + dlon * dlon
    }
}

// ── EdgeIter ──────────────────────────────────────────────────────────────────

/// One step of adjacency iteration: which edge, and from which endpoint.
#[derive(Copy, Clone, Debug)]
pub struct EdgeRef {
    pub id: EdgeId,
    /// `true` if the iterated node is this edge's `node_a`.
    pub at_node_a: bool,
}

/// Iterator over all edges incident on one node, following the intrusive
/// `link_a` / `link_b` chain.
pub struct EdgeIter<'g> {
    graph: &'g Graph,
    node: NodeId,
    edge: EdgeId,
}

impl Iterator for EdgeIter<'_> {
    type Item = EdgeRef;

    fn next(&mut self) -> Option<EdgeRef> {
        if self.edge == EdgeId::INVALID {
            return None;
        }
        let e = self.graph.edge(self.edge);
        let at_node_a = e.node_a == self.node;
        let current = EdgeRef { id: self.edge, at_node_a };
        self.edge = if at_node_a { e.link_a } else { e.link_b };
        Some(current)
    }
}

// ── Graph ─────────────────────────────────────────────────────────────────────

/// The pruned road network: nodes, edges, geometry arena, map bounds, and
/// the spatial index over live nodes.
///
/// Construct via [`crate::loader::load`] (road files) or
/// [`crate::GraphBuilder`] (synthetic networks).
pub struct Graph {
    pub name: String,
    pub(crate) nodes: Vec<Node>,
    pub(crate) edges: Vec<Edge>,
    pub(crate) geometry: Arena,
    pub bounds: MapBounds,
    pub(crate) spatial_idx: RTree<NodeEntry>,
}

impl Graph {
    // ── Dimensions & record access ────────────────────────────────────────

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    #[inline]
    pub fn edge(&self, id: EdgeId) -> &Edge {
        &self.edges[id.index()]
    }

    /// `true` if the node survived SCC pruning.
    #[inline]
    pub fn node_live(&self, id: NodeId) -> bool {
        self.nodes[id.index()].edge_head != EdgeId::INVALID
    }

    // ── Adjacency ─────────────────────────────────────────────────────────

    /// Iterate all edges incident on `node` (both directions; callers apply
    /// the one-way flags).
    pub fn out_iter(&self, node: NodeId) -> EdgeIter<'_> {
        EdgeIter { graph: self, node, edge: self.nodes[node.index()].edge_head }
    }

    /// The endpoint of `edge` opposite to the iterated side.
    #[inline]
    pub fn other_end(&self, er: EdgeRef) -> NodeId {
        let e = self.edge(er.id);
        if er.at_node_a { e.node_b } else { e.node_a }
    }

    // ── Geometry ──────────────────────────────────────────────────────────

    /// Pillar points of the geometry record `geo_ref` (the edge's `geo`
    /// field).  Record 0 is the reserved empty record.
    pub fn geometry(&self, geo_ref: u32) -> FlatArray<Pos, u8, u8> {
        FlatArray::at(geo_ref * GEO_UNIT)
    }

    /// Full pillar polyline of an edge: `node_a`, interior pillars, `node_b`.
    pub fn edge_polyline(&self, id: EdgeId) -> Vec<Pos> {
        let e = self.edge(id);
        let mut pts = Vec::new();
        pts.push(self.node(e.node_a).pos);
        if e.geo != 0 {
            pts.extend(self.geometry(e.geo).iter(&self.geometry));
        }
        pts.push(self.node(e.node_b).pos);
        pts
    }

    // ── Coordinates ───────────────────────────────────────────────────────

    /// Straight-line distance between two lattice points in metres.
    #[inline]
    pub fn dist_air(&self, a: Pos, b: Pos) -> f32 {
        self.bounds.dist_air(a, b)
    }

    /// Metre-scaled `[lat, lon]` for spatial-index queries.
    #[inline]
    pub(crate) fn scaled_point(&self, pos: Pos) -> [f32; 2] {
        [
            pos.lat as f32 * self.bounds.scale_lat,
            pos.lon as f32 * self.bounds.scale_lon,
        ]
    }

    /// Up to `k` nearest live tower nodes to `pos`, ascending by distance.
    pub fn k_nearest_nodes(&self, pos: Pos, k: usize) -> Vec<NodeId> {
        self.spatial_idx
            .nearest_neighbor_iter(&self.scaled_point(pos))
            .take(k)
            .map(|e| e.id)
            .collect()
    }

    /// The lattice point of a graph position.  For edge positions the point
    /// is interpolated along the pillar polyline at the arc fraction.
    pub fn lattice_pos(&self, gp: crate::GraphPos) -> Pos {
        if gp.is_node() {
            return self.node(gp.node_id()).pos;
        }
        let pts = self.edge_polyline(gp.edge_id());
        let mut cum = Vec::with_capacity(pts.len());
        cum.push(0.0f32);
        let mut total = 0.0;
        for w in pts.windows(2) {
            total += self.dist_air(w[0], w[1]);
            cum.push(total);
        }
        let d = total * gp.edge_frac();
        let mut i = 1;
        while i + 1 < cum.len() && cum[i] < d {
            i += 1;
        }
        let (a, b) = (pts[i - 1], pts[i]);
        let span = cum[i] - cum[i - 1];
        let r = if span > 0.0 { (d - cum[i - 1]) / span } else { 0.0 };
        let s = 1.0 - r;
        Pos {
            lat: (a.lat as f32 * s + b.lat as f32 * r) as u16,
            lon: (a.lon as f32 * s + b.lon as f32 * r) as u16,
        }
    }
}

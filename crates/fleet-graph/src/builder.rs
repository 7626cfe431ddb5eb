//! Incremental construction of synthetic networks.
//!
//! The road files cover real cities; tests and demos need small hand-crafted
//! graphs with known distances.  `GraphBuilder` accepts nodes and edges in
//! any order, maintains the intrusive adjacency lists as it goes, and runs
//! the same SCC pruning pass as the file loader so a built graph satisfies
//! every routing invariant.
//!
//! # Example
//!
//! ```
//! use fleet_core::{MapBounds, Pos};
//! use fleet_graph::GraphBuilder;
//!
//! let bounds = MapBounds::new(51.46, 51.55, -0.20, -0.03);
//! let mut b = GraphBuilder::new("test", bounds);
//! let n0 = b.add_node(Pos::new(10_000, 10_000));
//! let n1 = b.add_node(Pos::new(10_000, 20_000));
//! b.add_road(n0, n1, 1_200_000); // 1.2 km in metres·10³
//! let g = b.build();
//! assert_eq!(g.node_count(), 2);
//! ```

use rstar::RTree;

use fleet_core::arena::{Arena, FlatArray};
use fleet_core::{EdgeId, MapBounds, NodeId, Pos};

use crate::network::{Edge, Graph, Node, NodeEntry};
use crate::scc;

pub struct GraphBuilder {
    name: String,
    bounds: MapBounds,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    geometry: Arena,
}

impl GraphBuilder {
    pub fn new(name: impl Into<String>, bounds: MapBounds) -> Self {
        let mut geometry = Arena::new();
        // Reserve record 0 so `geo == 0` can keep meaning "no pillars".
        let _empty: FlatArray<Pos, u8, u8> = FlatArray::emplace(&mut geometry);
        GraphBuilder {
            name: name.into(),
            bounds,
            nodes: Vec::new(),
            edges: Vec::new(),
            geometry,
        }
    }

    /// Add a tower node and return its id (sequential from 0).
    pub fn add_node(&mut self, pos: Pos) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node { edge_head: EdgeId::INVALID, pos });
        id
    }

    pub fn node_pos(&self, id: NodeId) -> Pos {
        self.nodes[id.index()].pos
    }

    /// Add a two-way road of `dist` metres·10³.
    pub fn add_road(&mut self, a: NodeId, b: NodeId, dist: u32) -> EdgeId {
        self.add_edge(a, b, dist, Edge::FWD | Edge::BWD, &[])
    }

    /// Add a one-way road passable only `a → b`.
    pub fn add_one_way(&mut self, a: NodeId, b: NodeId, dist: u32) -> EdgeId {
        self.add_edge(a, b, dist, Edge::FWD, &[])
    }

    /// Add a two-way road with interior pillar points.
    pub fn add_road_with_geometry(
        &mut self,
        a: NodeId,
        b: NodeId,
        dist: u32,
        pillars: &[Pos],
    ) -> EdgeId {
        self.add_edge(a, b, dist, Edge::FWD | Edge::BWD, pillars)
    }

    /// Add an edge with explicit one-way `flags`.
    pub fn add_edge(
        &mut self,
        a: NodeId,
        b: NodeId,
        dist: u32,
        flags: u32,
        pillars: &[Pos],
    ) -> EdgeId {
        assert_ne!(a, b, "self-loop edges are not representable");
        let geo = if pillars.is_empty() {
            0
        } else {
            let ofs = self.geometry.len() as u32;
            debug_assert_eq!(ofs % crate::network::GEO_UNIT, 0);
            let arr: FlatArray<Pos, u8, u8> = FlatArray::emplace(&mut self.geometry);
            for &p in pillars {
                arr.push(&mut self.geometry, p);
            }
            ofs / crate::network::GEO_UNIT
        };
        let id = EdgeId(self.edges.len() as u32);
        self.edges.push(Edge {
            node_a: a,
            node_b: b,
            link_a: self.nodes[a.index()].edge_head,
            link_b: self.nodes[b.index()].edge_head,
            dist,
            flags,
            geo,
            name: 0,
        });
        self.nodes[a.index()].edge_head = id;
        self.nodes[b.index()].edge_head = id;
        id
    }

    /// Prune to the main component, build the spatial index, and finish.
    pub fn build(mut self) -> Graph {
        scc::prune_to_main_component(&mut self.nodes, &mut self.edges);
        let spatial_idx = build_spatial_index(&self.nodes, &self.bounds);
        Graph {
            name: self.name,
            nodes: self.nodes,
            edges: self.edges,
            geometry: self.geometry,
            bounds: self.bounds,
            spatial_idx,
        }
    }
}

/// Bulk-load the R-tree over live nodes (O(n log n), faster than n inserts).
pub(crate) fn build_spatial_index(nodes: &[Node], bounds: &MapBounds) -> RTree<NodeEntry> {
    let entries: Vec<NodeEntry> = nodes
        .iter()
        .enumerate()
        .filter(|(_, n)| n.edge_head != EdgeId::INVALID)
        .map(|(i, n)| NodeEntry::new(
            [
                n.pos.lat as f32 * bounds.scale_lat,
                n.pos.lon as f32 * bounds.scale_lon,
            ],
            NodeId(i as u32),
        ))
        .collect();
    RTree::bulk_load(entries)
}

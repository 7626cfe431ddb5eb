//! The demo city: a hand-built road ring with one facility of each kind.

use std::sync::Arc;

use fleet_core::{MapBounds, NameId, Pos};
use fleet_graph::{Graph, GraphBuilder};

pub const SHOP: NameId = NameId(20);
pub const STORAGE: NameId = NameId(21);
pub const WORKSHOP: NameId = NameId(22);
pub const STATION: NameId = NameId(23);

pub fn bounds() -> MapBounds {
    MapBounds::new(51.4625, 51.5475, -0.1978, -0.0354)
}

fn cell(a: u16, b: u16) -> Pos {
    Pos::new(10_000 + a * 5_000, 10_000 + b * 5_000)
}

pub fn shop_pos() -> Pos {
    cell(0, 0)
}
pub fn storage_pos() -> Pos {
    cell(0, 2)
}
pub fn workshop_pos() -> Pos {
    cell(2, 0)
}
pub fn station_pos() -> Pos {
    cell(2, 2)
}

/// Four facilities on a ring plus one diagonal, all two-way.
pub fn build_city() -> Arc<Graph> {
    let b = bounds();
    let mut gb = GraphBuilder::new("citysim", b.clone());
    let nodes = [
        gb.add_node(shop_pos()),
        gb.add_node(storage_pos()),
        gb.add_node(station_pos()),
        gb.add_node(workshop_pos()),
    ];
    for (x, y) in [(0, 1), (1, 2), (2, 3), (3, 0), (0, 2)] {
        let d = (b.dist_air(gb.node_pos(nodes[x]), gb.node_pos(nodes[y])) * 1_100.0) as u32;
        gb.add_road(nodes[x], nodes[y], d);
    }
    Arc::new(gb.build())
}

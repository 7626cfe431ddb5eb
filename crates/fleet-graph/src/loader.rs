//! Binary road-file loader.
//!
//! # File format
//!
//! Three files share a 100-byte header whose leading words are big-endian:
//! a version word, the magic `"GH"` (0x4748), the file length, and a format
//! word, followed by per-file fields.  Record sections start at byte 100 and
//! are little-endian:
//!
//! | File     | Record                                                     |
//! |----------|------------------------------------------------------------|
//! | nodes    | 12 bytes: `edge_ref, lat, lon` (each `i32`)                |
//! | edges    | 32 bytes: `node_a, node_b, link_a, link_b, dist, flags, geo, name` |
//! | geometry | `count: i32`, then `count × (lat, lon): i32`               |
//!
//! Degrees are fixed-point: `raw / (i32::MAX / 400)`.  Geometry references
//! count in 4-byte file units; one unit maps to [`GEO_UNIT`] arena bytes, so
//! an edge's `geo` field indexes the arena without any translation table.
//!
//! The geometry arena is sized from the header's data length and parsed with
//! the reallocation trap armed — a malformed file fails loudly instead of
//! silently invalidating embedded offsets.

use std::path::Path;

use tracing::info;

use fleet_core::arena::{Arena, FlatArray};
use fleet_core::{EdgeId, MapBounds, NodeId, Pos};

use crate::builder::build_spatial_index;
use crate::error::{GraphError, GraphResult};
use crate::network::{Edge, Graph, Node, GEO_UNIT};
use crate::scc;

/// Fixed-point degree conversion factor.
const INT_DEG_FAC: f64 = i32::MAX as f64 / 400.0;

/// Offset of the record section in every file.
const RECORDS_AT: usize = 100;

const MAGIC_GH: u16 = 0x4748;

// ── Cursor over one file's bytes ──────────────────────────────────────────────

struct Cursor<'a> {
    bytes: &'a [u8],
    at: usize,
    file: &'static str,
}

impl<'a> Cursor<'a> {
    fn new(bytes: &'a [u8], file: &'static str) -> Self {
        Cursor { bytes, at: 0, file }
    }

    fn take(&mut self, n: usize) -> GraphResult<&'a [u8]> {
        if self.at + n > self.bytes.len() {
            return Err(GraphError::Truncated { file: self.file, at: self.at });
        }
        let s = &self.bytes[self.at..self.at + n];
        self.at += n;
        Ok(s)
    }

    fn be_u16(&mut self) -> GraphResult<u16> {
        Ok(u16::from_be_bytes(self.take(2)?.try_into().unwrap()))
    }

    fn be_i32(&mut self) -> GraphResult<i32> {
        Ok(i32::from_be_bytes(self.take(4)?.try_into().unwrap()))
    }

    fn be_u64(&mut self) -> GraphResult<u64> {
        Ok(u64::from_be_bytes(self.take(8)?.try_into().unwrap()))
    }

    fn le_i32(&mut self) -> GraphResult<i32> {
        Ok(i32::from_le_bytes(self.take(4)?.try_into().unwrap()))
    }

    /// Parse the shared basic header: version, magic, file length, format.
    fn basic_header(&mut self) -> GraphResult<()> {
        let _version = self.be_u16()?;
        let magic = self.be_u16()?;
        if magic != MAGIC_GH {
            return Err(GraphError::BadHeader {
                file: self.file,
                reason: format!("bad magic {magic:#06x}"),
            });
        }
        let _file_len = self.be_u64()?;
        let _format = self.be_i32()?;
        Ok(())
    }

    fn seek(&mut self, to: usize) {
        self.at = to;
    }
}

// ── Loader ────────────────────────────────────────────────────────────────────

/// Load a road network from its three binary files.
pub fn load(
    name: impl Into<String>,
    node_path: &Path,
    edge_path: &Path,
    geometry_path: &Path,
) -> GraphResult<Graph> {
    let node_bytes = std::fs::read(node_path)?;
    let edge_bytes = std::fs::read(edge_path)?;
    let geo_bytes = std::fs::read(geometry_path)?;

    // ── Nodes header: count, bounding box ─────────────────────────────────
    let mut c = Cursor::new(&node_bytes, "nodes");
    c.basic_header()?;
    let _header_word = c.be_i32()?;
    let elem_len = c.be_i32()?;
    if elem_len != 12 {
        return Err(GraphError::BadHeader {
            file: "nodes",
            reason: format!("node record length {elem_len}, expected 12"),
        });
    }
    let node_count = c.be_i32()? as usize;
    let min_lon = c.be_i32()? as f64 / INT_DEG_FAC;
    let max_lon = c.be_i32()? as f64 / INT_DEG_FAC;
    let min_lat = c.be_i32()? as f64 / INT_DEG_FAC;
    let max_lat = c.be_i32()? as f64 / INT_DEG_FAC;
    let bounds = MapBounds::new(min_lat, max_lat, min_lon, max_lon);

    // ── Node records ──────────────────────────────────────────────────────
    c.seek(RECORDS_AT);
    let mut nodes = Vec::with_capacity(node_count);
    for _ in 0..node_count {
        let edge_ref = c.le_i32()?;
        let lat = c.le_i32()?;
        let lon = c.le_i32()?;
        nodes.push(Node {
            edge_head: EdgeId(edge_ref as u32),
            pos: decode_pos(&bounds, lat, lon),
        });
    }

    // ── Edges header + records ────────────────────────────────────────────
    let mut c = Cursor::new(&edge_bytes, "edges");
    c.basic_header()?;
    let elem_len = c.be_i32()?;
    if elem_len != 32 {
        return Err(GraphError::BadHeader {
            file: "edges",
            reason: format!("edge record length {elem_len}, expected 32"),
        });
    }
    let edge_count = c.be_i32()? as usize;
    c.seek(RECORDS_AT);
    let mut edges = Vec::with_capacity(edge_count);
    for _ in 0..edge_count {
        let node_a = c.le_i32()? as u32;
        let node_b = c.le_i32()? as u32;
        let link_a = c.le_i32()? as u32;
        let link_b = c.le_i32()? as u32;
        let dist = c.le_i32()? as u32;
        let flags = c.le_i32()? as u32;
        let geo = c.le_i32()? as u32;
        let name = c.le_i32()? as u32;
        edges.push(Edge {
            // Out-of-range endpoints (removed by the exporter) become
            // INVALID here so SCC pruning treats the edge as dead.
            node_a: if (node_a as usize) < node_count { NodeId(node_a) } else { NodeId::INVALID },
            node_b: if (node_b as usize) < node_count { NodeId(node_b) } else { NodeId::INVALID },
            link_a: EdgeId(link_a),
            link_b: EdgeId(link_b),
            dist,
            flags,
            geo,
            name,
        });
    }

    // ── Geometry header + records ─────────────────────────────────────────
    let mut c = Cursor::new(&geo_bytes, "geometry");
    c.basic_header()?;
    let geo_len_units = {
        let lo = c.be_i32()? as u64;
        let hi = c.be_i32()? as u64;
        lo + (hi << 32)
    };
    c.seek(RECORDS_AT);
    let mut geometry = Arena::new();
    geometry.reserve(geo_len_units as usize * GEO_UNIT as usize + 16);
    geometry.set_trap_alloc(true);
    let mut units = 0u64;
    while units < geo_len_units {
        let count = c.le_i32()?;
        units += 1;
        if count < 0 || count > u8::MAX as i32 {
            return Err(GraphError::BadHeader {
                file: "geometry",
                reason: format!("pillar count {count} out of range"),
            });
        }
        let arr: FlatArray<Pos, u8, u8> = FlatArray::emplace(&mut geometry);
        for _ in 0..count {
            let lat = c.le_i32()?;
            let lon = c.le_i32()?;
            units += 2;
            arr.push(&mut geometry, decode_pos(&bounds, lat, lon));
        }
    }
    geometry.set_trap_alloc(false);

    // ── Prune and index ───────────────────────────────────────────────────
    let pruned = scc::prune_to_main_component(&mut nodes, &mut edges);
    let spatial_idx = build_spatial_index(&nodes, &bounds);

    let name = name.into();
    info!(
        graph = %name,
        nodes = node_count,
        edges = edge_count,
        pruned,
        "road network loaded"
    );

    Ok(Graph { name, nodes, edges, geometry, bounds, spatial_idx })
}

/// Decode a fixed-point degree pair onto the lattice.
fn decode_pos(bounds: &MapBounds, lat: i32, lon: i32) -> Pos {
    bounds.pos(lat as f64 / INT_DEG_FAC, lon as f64 / INT_DEG_FAC)
}

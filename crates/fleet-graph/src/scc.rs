//! Strongly-connected-component pruning.
//!
//! Road exports routinely contain islands: parking lots joined by a one-way
//! ramp, ferry stubs, disconnected service roads.  Routing between two
//! positions is only guaranteed to succeed when every live node can reach
//! every other, so after loading we keep exactly the largest strongly
//! connected component and splice everything else out of the adjacency
//! lists.
//!
//! Tarjan's algorithm is run with an explicit frame stack — road graphs are
//! deep enough to overflow the call stack with naive recursion.

use fleet_core::{EdgeId, NodeId};
use tracing::info;

use crate::network::{Edge, Node};

/// Per-node DFS frame for the iterative Tarjan walk.
struct Frame {
    node: u32,
    /// Cursor into the node's intrusive adjacency list.
    cursor: EdgeId,
    /// Child whose lowlink must be folded in when the frame resumes.
    pending_child: u32,
}

/// Mark every node outside the largest SCC as pruned and splice its edges
/// out of the network in place.  Returns the number of pruned nodes.
pub fn prune_to_main_component(nodes: &mut [Node], edges: &mut [Edge]) -> usize {
    let n = nodes.len();
    if n == 0 {
        return 0;
    }

    // ── Tarjan (iterative) ────────────────────────────────────────────────
    const UNSET: u32 = u32::MAX;
    let mut index = vec![UNSET; n];
    let mut lowlink = vec![UNSET; n];
    let mut comp = vec![UNSET; n];
    let mut on_stack = vec![false; n];
    let mut stack: Vec<u32> = Vec::new();
    let mut frames: Vec<Frame> = Vec::new();
    let mut next_index = 0u32;
    let mut comp_count = 0u32;
    let mut comp_sizes: Vec<u32> = Vec::new();

    // Successor cursor step: next outgoing edge reference from `node` at or
    // after `cursor`, honouring one-way flags and skipping edges whose far
    // endpoint is invalid.
    let step = |node: u32, cursor: &mut EdgeId, edges: &[Edge]| -> Option<u32> {
        while *cursor != EdgeId::INVALID {
            let e = &edges[cursor.index()];
            let at_a = e.node_a == NodeId(node);
            let next = if at_a { e.link_a } else { e.link_b };
            let passable = e.passable_from(at_a);
            let other = if at_a { e.node_b } else { e.node_a };
            *cursor = next;
            if passable && other != NodeId::INVALID {
                return Some(other.0);
            }
        }
        None
    };

    for root in 0..n as u32 {
        if index[root as usize] != UNSET {
            continue;
        }
        index[root as usize] = next_index;
        lowlink[root as usize] = next_index;
        next_index += 1;
        stack.push(root);
        on_stack[root as usize] = true;
        frames.push(Frame {
            node: root,
            cursor: nodes[root as usize].edge_head,
            pending_child: UNSET,
        });

        while let Some(frame) = frames.last_mut() {
            let v = frame.node;
            if frame.pending_child != UNSET {
                let c = frame.pending_child as usize;
                frame.pending_child = UNSET;
                lowlink[v as usize] = lowlink[v as usize].min(lowlink[c]);
            }
            match step(v, &mut frame.cursor, edges) {
                Some(w) => {
                    if index[w as usize] == UNSET {
                        frame.pending_child = w;
                        index[w as usize] = next_index;
                        lowlink[w as usize] = next_index;
                        next_index += 1;
                        stack.push(w);
                        on_stack[w as usize] = true;
                        frames.push(Frame {
                            node: w,
                            cursor: nodes[w as usize].edge_head,
                            pending_child: UNSET,
                        });
                    } else if on_stack[w as usize] {
                        lowlink[v as usize] = lowlink[v as usize].min(index[w as usize]);
                    }
                }
                None => {
                    if lowlink[v as usize] == index[v as usize] {
                        let mut size = 0u32;
                        loop {
                            let u = stack.pop().expect("tarjan stack underflow");
                            on_stack[u as usize] = false;
                            comp[u as usize] = comp_count;
                            size += 1;
                            if u == v {
                                break;
                            }
                        }
                        comp_sizes.push(size);
                        comp_count += 1;
                    }
                    frames.pop();
                }
            }
        }
    }

    // ── Select the main component ─────────────────────────────────────────
    let main = comp_sizes
        .iter()
        .enumerate()
        .max_by_key(|&(i, &s)| (s, std::cmp::Reverse(i)))
        .map(|(i, _)| i as u32)
        .unwrap_or(0);

    // ── Splice dead edges out of live adjacency lists ─────────────────────
    //
    // An edge dies when either endpoint is outside the main component.  Live
    // nodes' lists are rewired around dead edges first; only then are the
    // dead edges' endpoints invalidated (the links must stay intact while
    // any list still routes through them).
    let is_dead_edge = |e: &Edge, comp: &[u32]| {
        e.node_a == NodeId::INVALID
            || e.node_b == NodeId::INVALID
            || comp[e.node_a.index()] != main
            || comp[e.node_b.index()] != main
    };

    for v in 0..n {
        if comp[v] != main {
            continue;
        }
        // prev == None means we are rewriting the node's edge_head.
        let mut prev: Option<EdgeId> = None;
        let mut cur = nodes[v].edge_head;
        while cur != EdgeId::INVALID {
            let at_a = edges[cur.index()].node_a == NodeId(v as u32);
            let next = if at_a { edges[cur.index()].link_a } else { edges[cur.index()].link_b };
            if is_dead_edge(&edges[cur.index()], &comp) {
                match prev {
                    None => nodes[v].edge_head = next,
                    Some(p) => {
                        let p_at_a = edges[p.index()].node_a == NodeId(v as u32);
                        if p_at_a {
                            edges[p.index()].link_a = next;
                        } else {
                            edges[p.index()].link_b = next;
                        }
                    }
                }
            } else {
                prev = Some(cur);
            }
            cur = next;
        }
    }

    let mut pruned_edges = 0usize;
    for e in edges.iter_mut() {
        if is_dead_edge(e, &comp) {
            e.node_a = NodeId::INVALID;
            e.node_b = NodeId::INVALID;
            pruned_edges += 1;
        }
    }

    let mut pruned_nodes = 0usize;
    for (v, node) in nodes.iter_mut().enumerate() {
        if comp[v] != main {
            node.edge_head = EdgeId::INVALID;
            pruned_nodes += 1;
        }
    }

    if pruned_nodes > 0 {
        info!(
            pruned_nodes,
            pruned_edges,
            components = comp_count,
            "pruned road network to its main component"
        );
    }
    pruned_nodes
}

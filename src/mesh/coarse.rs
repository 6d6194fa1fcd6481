//! Level-of-detail reduction for wireframe previews.
//!
//! Each level is derived from the previous one by a greedy matching edge
//! collapse:
//!
//! - edges are visited from the shortest to the longest,
//! - an edge collapses when both its ends are still unmatched, belong to the
//!   same surface, and either the edge lies on a boundary or none of its ends
//!   do (outlines only shrink along themselves),
//! - a collapsed pair becomes a single node at the middle of the edge,
//! - remapped edges that became points are dropped, duplicates are merged
//!   and their flags OR-ed.
//!
//! At most one collapse touches each node per level, so a level has at least
//! half the nodes of the previous one.

use super::Edge;
use super::Node;
use std::collections::HashMap;

/// Edge of a coarse level. Coarse edges are not tied to triangles.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CoarseEdge {
    /// Lowest node index first.
    pub nodes: [usize; 2],
    pub surface_id: i32,
    pub is_kutta: bool,
    pub is_boundary: bool,
}

impl From<&Edge> for CoarseEdge {
    fn from(edge: &Edge) -> Self {
        Self {
            nodes: edge.nodes,
            surface_id: edge.surface_id,
            is_kutta: edge.is_kutta,
            is_boundary: edge.is_boundary,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CoarseLevel {
    /// 1 for the first level derived from the fine mesh.
    pub level: usize,
    pub nodes: Vec<Node>,
    pub edges: Vec<CoarseEdge>,
}

pub fn build_coarse_level(level: usize, nodes: &[Node], edges: &[CoarseEdge]) -> CoarseLevel {
    let span = tracing::debug_span!("build_coarse_level", level, edge_count = edges.len());
    let _enter = span.enter();

    let mut on_boundary = vec![false; nodes.len()];
    for edge in edges.iter().filter(|e| e.is_boundary) {
        for n in edge.nodes {
            on_boundary[n] = true;
        }
    }

    let length = |e: &CoarseEdge| (nodes[e.nodes[1]].position - nodes[e.nodes[0]].position).norm();
    let mut order: Vec<usize> = (0..edges.len()).collect();
    order.sort_by(|a, b| length(&edges[*a]).total_cmp(&length(&edges[*b])));

    const UNMAPPED: usize = usize::MAX;
    let mut map = vec![UNMAPPED; nodes.len()];
    let mut coarse_nodes: Vec<Node> = Vec::with_capacity(nodes.len() / 2 + 1);

    for e in order {
        let edge = &edges[e];
        let [a, b] = edge.nodes;
        let collapsible = map[a] == UNMAPPED
            && map[b] == UNMAPPED
            && a != b
            && nodes[a].surface_id == nodes[b].surface_id
            && (edge.is_boundary || (!on_boundary[a] && !on_boundary[b]));
        if !collapsible {
            continue;
        }
        let position = nalgebra::center(&nodes[a].position, &nodes[b].position);
        map[a] = coarse_nodes.len();
        map[b] = coarse_nodes.len();
        coarse_nodes.push(Node {
            position,
            surface_id: nodes[a].surface_id,
        });
    }

    for (n, node) in nodes.iter().enumerate() {
        if map[n] == UNMAPPED {
            map[n] = coarse_nodes.len();
            coarse_nodes.push(*node);
        }
    }

    let mut coarse_edges: Vec<CoarseEdge> = Vec::with_capacity(edges.len() / 2 + 1);
    let mut seen: HashMap<[usize; 2], usize> = HashMap::with_capacity(coarse_edges.capacity());
    for edge in edges {
        let [a, b] = edge.nodes.map(|n| map[n]);
        if a == b {
            continue;
        }
        let key = [a.min(b), a.max(b)];
        match seen.get(&key) {
            Some(idx) => {
                let merged = &mut coarse_edges[*idx];
                merged.is_kutta |= edge.is_kutta;
                merged.is_boundary |= edge.is_boundary;
            }
            None => {
                seen.insert(key, coarse_edges.len());
                coarse_edges.push(CoarseEdge {
                    nodes: key,
                    ..*edge
                });
            }
        }
    }

    tracing::debug!(
        node_count = coarse_nodes.len(),
        edge_count = coarse_edges.len(),
        "coarse level ready"
    );

    CoarseLevel {
        level,
        nodes: coarse_nodes,
        edges: coarse_edges,
    }
}

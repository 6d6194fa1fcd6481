use super::Edge;
use super::Node;
use super::Triangle;
use crate::geometry::Vector;
use std::collections::HashMap;

/// Decides which boundary edges shed a wake.
#[derive(Clone, Debug, PartialEq)]
pub enum KuttaRule {
    /// No edge is a Kutta edge.
    None,
    /// Both ends must be flagged trailing-edge nodes. Indexed by node.
    Nodes(Vec<bool>),
    /// The edge must sit on the downstream side of its triangle and be
    /// roughly perpendicular to `direction`: `|cos(edge, direction)|` must not
    /// exceed `tolerance`.
    Trailing { direction: Vector, tolerance: f64 },
}

impl Default for KuttaRule {
    /// Free stream along +x, edges within 60 degrees of the span-wise
    /// direction.
    fn default() -> Self {
        KuttaRule::Trailing {
            direction: Vector::x(),
            tolerance: 0.5,
        }
    }
}

impl KuttaRule {
    /// Builds a [`KuttaRule::Nodes`] from a list of flagged node indices.
    /// Indices outside `[0, node_count)` are ignored.
    pub fn from_node_list<I>(nodes: I, node_count: usize) -> Self
    where
        I: IntoIterator<Item = usize>,
    {
        let mut flags = vec![false; node_count];
        for node in nodes {
            if let Some(flag) = flags.get_mut(node) {
                *flag = true;
            }
        }
        KuttaRule::Nodes(flags)
    }

    fn is_kutta(&self, edge: &Edge, triangle: &Triangle, nodes: &[Node]) -> bool {
        match self {
            KuttaRule::None => false,
            KuttaRule::Nodes(flags) => edge
                .nodes
                .iter()
                .all(|n| flags.get(*n).copied().unwrap_or(false)),
            KuttaRule::Trailing {
                direction,
                tolerance,
            } => {
                let direction = match direction.try_normalize(f64::EPSILON) {
                    Some(v) => v,
                    None => return false,
                };
                let [p0, p1] = edge.nodes.map(|n| nodes[n].position);
                let along = match (p1 - p0).try_normalize(f64::EPSILON) {
                    Some(v) => v,
                    None => return false,
                };
                let [a, b, c] = triangle.nodes.map(|n| nodes[n].position.coords);
                let centroid = (a + b + c) / 3.0;
                let midpoint = (p0.coords + p1.coords) / 2.0;
                let downstream = 0.0 < (midpoint - centroid).dot(&direction);
                downstream && along.dot(&direction).abs() <= *tolerance
            }
        }
    }
}

/// Builds the edge list of a triangle soup and fills `Triangle::edges`.
///
/// Candidate edges are merged on their unordered node pair through a hash
/// map, so the cost is linear in the number of triangles. An edge owned by a
/// single triangle is a boundary edge; boundary edges are then classified
/// with `kutta`.
///
/// Edges shared by more than two triangles (non-manifold) are split: every
/// pair of owners gets its own edge record, so that each edge is referenced
/// by one or two triangles.
///
/// Node indices must be valid, see [`super::Mesh::new`].
pub fn build_adjacency(triangles: &mut [Triangle], nodes: &[Node], kutta: &KuttaRule) -> Vec<Edge> {
    let span = tracing::info_span!("build_adjacency", triangle_count = triangles.len());
    let _enter = span.enter();

    let mut edges: Vec<Edge> = Vec::with_capacity(triangles.len() * 3 / 2 + 1);
    // Maps a node pair to the last edge created for it.
    let mut open: HashMap<(usize, usize), usize> = HashMap::with_capacity(edges.capacity());
    let mut non_manifold = 0;

    for (t, triangle) in triangles.iter_mut().enumerate() {
        let [n0, n1, n2] = triangle.nodes;
        for (slot, (a, b)) in [(n0, n1), (n1, n2), (n2, n0)].into_iter().enumerate() {
            let key = if a < b { (a, b) } else { (b, a) };
            let existing = open
                .get(&key)
                .copied()
                .filter(|e| edges[*e].tri2.is_none() && edges[*e].tri1 != t);
            let e = match existing {
                Some(e) => {
                    edges[e].tri2 = Some(t);
                    e
                }
                None => {
                    if open.contains_key(&key) {
                        non_manifold += 1;
                    }
                    let e = edges.len();
                    edges.push(Edge {
                        nodes: [key.0, key.1],
                        tri1: t,
                        tri2: None,
                        surface_id: triangle.surface_id,
                        is_kutta: false,
                        is_boundary: false,
                    });
                    open.insert(key, e);
                    e
                }
            };
            triangle.edges[slot] = e;
        }
    }

    for edge in &mut edges {
        edge.is_boundary = edge.tri2.is_none();
        if edge.is_boundary {
            edge.is_kutta = kutta.is_kutta(edge, &triangles[edge.tri1], nodes);
        }
    }

    if non_manifold != 0 {
        tracing::warn!(
            non_manifold,
            "edges shared by more than two triangles were split"
        );
    }
    tracing::debug!(
        edge_count = edges.len(),
        boundary_edge_count = edges.iter().filter(|e| e.is_boundary).count(),
    );

    edges
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn nodes(n: usize) -> Vec<Node> {
        (0..n)
            .map(|i| Node::new(i as f64, (i * i % 7) as f64, 0.0, 1))
            .collect()
    }

    fn kutta_edges(edges: &[Edge]) -> Vec<[usize; 2]> {
        edges
            .iter()
            .filter(|e| e.is_kutta)
            .map(|e| e.nodes)
            .collect()
    }

    #[test]
    fn two_triangles_sharing_an_edge() {
        let nodes = nodes(4);
        let mut triangles = vec![
            Triangle::new([0, 1, 2], 1, 5),
            Triangle::new([1, 2, 3], 1, 5),
        ];
        let edges = build_adjacency(&mut triangles, &nodes, &KuttaRule::None);

        assert_eq!(edges.len(), 5);
        let interior: Vec<&Edge> = edges.iter().filter(|e| !e.is_boundary).collect();
        assert_eq!(interior.len(), 1);
        assert_eq!(interior[0].nodes, [1, 2]);
        assert_eq!(interior[0].tri1, 0);
        assert_eq!(interior[0].tri2, Some(1));
        assert_eq!(edges.iter().filter(|e| e.is_boundary).count(), 4);

        let shared = triangles[0].edges[1];
        assert_eq!(triangles[1].edges[0], shared);
    }

    #[test]
    fn kutta_nodes() {
        // Unit square split along its diagonal, trailing edge at x = 1.
        let nodes = vec![
            Node::new(0.0, 0.0, 0.0, 1),
            Node::new(1.0, 0.0, 0.0, 1),
            Node::new(0.0, 1.0, 0.0, 1),
            Node::new(1.0, 1.0, 0.0, 1),
        ];
        let triangles = vec![
            Triangle::new([0, 1, 2], 1, 5),
            Triangle::new([1, 3, 2], 1, 5),
        ];

        let rule = KuttaRule::from_node_list([1, 3, 42], nodes.len());
        let edges = build_adjacency(&mut triangles.clone(), &nodes, &rule);
        assert_eq!(kutta_edges(&edges), [[1, 3]]);

        let edges = build_adjacency(&mut triangles.clone(), &nodes, &KuttaRule::default());
        assert_eq!(kutta_edges(&edges), [[1, 3]]);

        let upstream = KuttaRule::Trailing {
            direction: -Vector::x(),
            tolerance: 0.5,
        };
        let edges = build_adjacency(&mut triangles.clone(), &nodes, &upstream);
        assert_eq!(kutta_edges(&edges), [[0, 2]]);
    }

    #[test]
    fn non_manifold_edges_are_split() {
        let nodes = nodes(5);
        let mut triangles = vec![
            Triangle::new([0, 1, 2], 1, 5),
            Triangle::new([1, 0, 3], 1, 5),
            Triangle::new([0, 1, 4], 1, 5),
        ];
        let edges = build_adjacency(&mut triangles, &nodes, &KuttaRule::None);
        let on_pair: Vec<&Edge> = edges.iter().filter(|e| e.nodes == [0, 1]).collect();
        assert_eq!(on_pair.len(), 2);
        assert_eq!(on_pair[0].tri2, Some(1));
        assert!(on_pair[1].is_boundary);
    }

    proptest!(
        /// Every edge is listed by one or two triangles, and boundary edges
        /// by exactly one.
        #[test]
        fn edges_have_one_or_two_owners(
            raw in (3..40usize).prop_flat_map(|node_count| {
                prop::collection::vec(
                    prop::array::uniform3(0..node_count)
                        .prop_filter("degenerate", |[a, b, c]| a != b && b != c && a != c),
                    1..60,
                )
                .prop_map(move |tris| (node_count, tris))
            })
        ) {
            let (node_count, tris) = raw;
            let nodes = nodes(node_count);
            let mut triangles: Vec<Triangle> =
                tris.iter().map(|t| Triangle::new(*t, 1, 5)).collect();
            let edges = build_adjacency(&mut triangles, &nodes, &KuttaRule::default());

            let mut owners = vec![0usize; edges.len()];
            for triangle in &triangles {
                prop_assert!(triangle.has_edges());
                for (slot, e) in triangle.edges.iter().enumerate() {
                    let a = triangle.nodes[slot];
                    let b = triangle.nodes[(slot + 1) % 3];
                    prop_assert_eq!(edges[*e].nodes, [a.min(b), a.max(b)]);
                    owners[*e] += 1;
                }
            }
            for (edge, owner_count) in edges.iter().zip(owners) {
                prop_assert!(owner_count == 1 || owner_count == 2);
                prop_assert_eq!(edge.is_boundary, owner_count == 1);
                prop_assert_eq!(edge.triangles().count(), owner_count);
                prop_assert!(!edge.is_kutta || edge.is_boundary);
            }
        }
    );
}

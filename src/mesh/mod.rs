//! Surface mesh of a solution database.
//!
//! The mesh is built once per loaded file: raw triangles are validated, their
//! areas computed, edges merged into an adjacency list, and a few coarse
//! levels derived for fast wireframe previews.

use crate::geometry::triangle_area;
use crate::geometry::BoundingBox;
use crate::geometry::Point;
use crate::geometry::Vector;
use crate::Error;
use crate::Result;
use adb_io::RawNode;
use adb_io::RawTriangle;
use rayon::iter::IntoParallelRefMutIterator as _;
use rayon::iter::ParallelIterator as _;

mod adjacency;
mod coarse;
mod normals;

pub use adjacency::build_adjacency;
pub use adjacency::KuttaRule;
pub use coarse::build_coarse_level;
pub use coarse::CoarseEdge;
pub use coarse::CoarseLevel;
pub use normals::nodal_normals;
pub use normals::triangle_normals;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Node {
    pub position: Point,
    pub surface_id: i32,
}

impl Node {
    pub fn new(x: f64, y: f64, z: f64, surface_id: i32) -> Self {
        Self {
            position: Point::new(x, y, z),
            surface_id,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Triangle {
    pub nodes: [usize; 3],
    /// Filled by [`build_adjacency`], [`Triangle::NO_EDGE`] before that.
    ///
    /// `edges[i]` joins `nodes[i]` and `nodes[(i + 1) % 3]`.
    pub edges: [usize; 3],
    pub surface_id: i32,
    /// Discretization kind, as reported by the solver.
    pub surface_type: i32,
    pub area: f64,
}

impl Triangle {
    pub const NO_EDGE: usize = usize::MAX;

    pub fn new(nodes: [usize; 3], surface_id: i32, surface_type: i32) -> Self {
        Self {
            nodes,
            edges: [Self::NO_EDGE; 3],
            surface_id,
            surface_type,
            area: 0.0,
        }
    }

    pub fn has_edges(&self) -> bool {
        self.edges.iter().all(|e| *e != Self::NO_EDGE)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Edge {
    /// Lowest node index first.
    pub nodes: [usize; 2],
    pub tri1: usize,
    pub tri2: Option<usize>,
    pub surface_id: i32,
    /// Trailing edge from which the wake is shed.
    pub is_kutta: bool,
    /// Only one triangle uses this edge.
    pub is_boundary: bool,
}

impl Edge {
    pub fn triangles(&self) -> impl Iterator<Item = usize> {
        std::iter::once(self.tri1).chain(self.tri2)
    }
}

/// Tuning knobs for [`Mesh::new`].
#[derive(Clone, Debug)]
pub struct MeshOptions {
    pub kutta: KuttaRule,
    /// Maximum number of coarse levels to derive.
    pub coarse_levels: usize,
}

impl Default for MeshOptions {
    fn default() -> Self {
        Self {
            kutta: KuttaRule::default(),
            coarse_levels: 4,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Mesh {
    nodes: Vec<Node>,
    triangles: Vec<Triangle>,
    edges: Vec<Edge>,
    coarse_levels: Vec<CoarseLevel>,
    normals: Vec<Vector>,
    nodal_normals: Vec<Vector>,
    bounding_box: Option<BoundingBox>,
}

impl Mesh {
    /// Builds a mesh and all its derived data.
    ///
    /// Fails with [`Error::CorruptGeometry`] if a triangle references a node
    /// that does not exist.
    pub fn new(
        nodes: Vec<Node>,
        mut triangles: Vec<Triangle>,
        options: &MeshOptions,
    ) -> Result<Self> {
        let node_count = nodes.len();
        for (t, triangle) in triangles.iter().enumerate() {
            if let Some(node) = triangle.nodes.iter().find(|n| node_count <= **n) {
                return Err(Error::CorruptGeometry {
                    triangle: t,
                    node: *node as i64,
                    node_count,
                });
            }
        }

        let span = tracing::info_span!("build mesh", node_count, triangle_count = triangles.len());
        let _enter = span.enter();

        triangles.par_iter_mut().for_each(|triangle| {
            let [a, b, c] = triangle.nodes.map(|n| nodes[n].position);
            triangle.area = triangle_area(&a, &b, &c);
        });

        let edges = build_adjacency(&mut triangles, &nodes, &options.kutta);

        let mut coarse_levels: Vec<CoarseLevel> = Vec::new();
        for level in 1..=options.coarse_levels {
            let next = match coarse_levels.last() {
                Some(prev) => build_coarse_level(level, &prev.nodes, &prev.edges),
                None => {
                    let fine_edges: Vec<CoarseEdge> = edges.iter().map(CoarseEdge::from).collect();
                    build_coarse_level(level, &nodes, &fine_edges)
                }
            };
            let prev_edge_count = coarse_levels.last().map_or(edges.len(), |l| l.edges.len());
            if next.edges.len() == prev_edge_count {
                tracing::debug!(level, "coarsening stalled");
                break;
            }
            coarse_levels.push(next);
        }

        let normals = triangle_normals(&triangles, &nodes);
        let nodal_normals = nodal_normals(&triangles, &normals, nodes.len());
        let bounding_box = BoundingBox::from_points(nodes.iter().map(|n| n.position));

        tracing::info!(
            edge_count = edges.len(),
            kutta_edge_count = edges.iter().filter(|e| e.is_kutta).count(),
            coarse_level_count = coarse_levels.len(),
            "mesh ready"
        );

        Ok(Self {
            nodes,
            triangles,
            edges,
            coarse_levels,
            normals,
            nodal_normals,
            bounding_box,
        })
    }

    /// Converts on-disk geometry, then calls [`Mesh::new`].
    pub fn from_raw(
        raw_nodes: &[RawNode],
        raw_triangles: &[RawTriangle],
        options: &MeshOptions,
    ) -> Result<Self> {
        let node_count = raw_nodes.len();
        let nodes = raw_nodes
            .iter()
            .map(|n| {
                let [x, y, z] = n.xyz.map(f64::from);
                Node::new(x, y, z, n.surface_id)
            })
            .collect();
        let triangles = raw_triangles
            .iter()
            .enumerate()
            .map(|(t, raw)| -> Result<Triangle> {
                let mut nodes = [0; 3];
                for (node, raw_node) in nodes.iter_mut().zip(raw.nodes) {
                    *node = usize::try_from(raw_node)
                        .ok()
                        .filter(|n| *n < node_count)
                        .ok_or(Error::CorruptGeometry {
                            triangle: t,
                            node: raw_node as i64,
                            node_count,
                        })?;
                }
                Ok(Triangle::new(nodes, raw.surface_id, raw.surface_type))
            })
            .collect::<Result<_>>()?;
        Mesh::new(nodes, triangles, options)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Coarse levels, from the finest (level 1) to the coarsest.
    pub fn coarse_levels(&self) -> &[CoarseLevel] {
        &self.coarse_levels
    }

    /// Returns the coarse level with the given 1-based number.
    pub fn coarse_level(&self, level: usize) -> Option<&CoarseLevel> {
        level
            .checked_sub(1)
            .and_then(|idx| self.coarse_levels.get(idx))
    }

    /// Unit normal of each triangle.
    pub fn normals(&self) -> &[Vector] {
        &self.normals
    }

    /// Area-weighted unit normal of each node.
    pub fn nodal_normals(&self) -> &[Vector] {
        &self.nodal_normals
    }

    pub fn bounding_box(&self) -> Option<BoundingBox> {
        self.bounding_box
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn kutta_edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter().filter(|e| e.is_kutta)
    }

    pub fn boundary_edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter().filter(|e| e.is_boundary)
    }

    /// Positions of the three corners of a triangle.
    pub fn corners(&self, triangle: &Triangle) -> [Point; 3] {
        triangle.nodes.map(|n| self.nodes[n].position)
    }
}

use super::Node;
use super::Triangle;
use crate::geometry::triangle_normal;
use crate::geometry::Vector;
use rayon::iter::IntoParallelRefIterator as _;
use rayon::iter::ParallelIterator as _;

pub fn triangle_normals(triangles: &[Triangle], nodes: &[Node]) -> Vec<Vector> {
    triangles
        .par_iter()
        .map(|triangle| {
            let [a, b, c] = triangle.nodes.map(|n| nodes[n].position);
            triangle_normal(&a, &b, &c)
        })
        .collect()
}

/// Per-node normals, averaged over incident triangles and weighted by their
/// area. Nodes without incident triangles get the zero vector.
pub fn nodal_normals(triangles: &[Triangle], normals: &[Vector], node_count: usize) -> Vec<Vector> {
    let mut sums = vec![Vector::zeros(); node_count];
    for (triangle, normal) in triangles.iter().zip(normals) {
        for n in triangle.nodes {
            sums[n] += *normal * triangle.area;
        }
    }
    for sum in &mut sums {
        *sum = sum
            .try_normalize(f64::EPSILON)
            .unwrap_or_else(Vector::zeros);
    }
    sums
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn folded_sheet() {
        // Two unit right triangles folded at a right angle along x = 0.
        let nodes = vec![
            Node::new(0.0, 0.0, 0.0, 1),
            Node::new(0.0, 1.0, 0.0, 1),
            Node::new(1.0, 0.0, 0.0, 1),
            Node::new(0.0, 0.0, 1.0, 1),
        ];
        let mut triangles = vec![
            Triangle::new([0, 2, 1], 1, 5),
            Triangle::new([0, 1, 3], 1, 5),
        ];
        for triangle in &mut triangles {
            triangle.area = 0.5;
        }

        let normals = triangle_normals(&triangles, &nodes);
        assert_relative_eq!(normals[0], Vector::new(0.0, 0.0, 1.0));
        assert_relative_eq!(normals[1], Vector::new(1.0, 0.0, 0.0));

        let nodal = nodal_normals(&triangles, &normals, nodes.len());
        let diagonal = Vector::new(1.0, 0.0, 1.0).normalize();
        assert_relative_eq!(nodal[0], diagonal);
        assert_relative_eq!(nodal[1], diagonal);
        assert_relative_eq!(nodal[2], normals[0]);
        assert_relative_eq!(nodal[3], normals[1]);
    }
}

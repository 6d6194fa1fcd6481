use itertools::Itertools as _;
use itertools::MinMaxResult;
use nalgebra::Point3;
use nalgebra::Vector3;

pub type Point = Point3<f64>;
pub type Vector = Vector3<f64>;

/// Axis-aligned box around a set of points.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BoundingBox {
    pub p_min: Point,
    pub p_max: Point,
}

impl BoundingBox {
    /// Returns `None` when `points` is empty.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Point>,
        I::IntoIter: Clone,
    {
        let points = points.into_iter();
        let mut p_min = Point::origin();
        let mut p_max = Point::origin();
        for dim in 0..3 {
            let (min, max) = match points.clone().map(|p| p[dim]).minmax() {
                MinMaxResult::NoElements => return None,
                MinMaxResult::OneElement(v) => (v, v),
                MinMaxResult::MinMax(min, max) => (min, max),
            };
            p_min[dim] = min;
            p_max[dim] = max;
        }
        Some(Self { p_min, p_max })
    }

    pub fn center(&self) -> Point {
        nalgebra::center(&self.p_min, &self.p_max)
    }

    /// Length of the longest side.
    pub fn size(&self) -> f64 {
        (self.p_max - self.p_min).max()
    }

    pub fn diagonal(&self) -> f64 {
        (self.p_max - self.p_min).norm()
    }
}

/// Area of the triangle `abc`.
pub fn triangle_area(a: &Point, b: &Point, c: &Point) -> f64 {
    0.5 * (b - a).cross(&(c - a)).norm()
}

/// Unit normal of the triangle `abc`, following the right-hand rule.
///
/// Degenerate triangles get the zero vector.
pub fn triangle_normal(a: &Point, b: &Point, c: &Point) -> Vector {
    (b - a)
        .cross(&(c - a))
        .try_normalize(f64::EPSILON)
        .unwrap_or_else(Vector::zeros)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_ulps_eq;

    #[test]
    fn bb_from_points() {
        let points = [
            Point::new(-1.0, 2.0, 0.5),
            Point::new(3.0, -4.0, 0.5),
            Point::new(0.0, 0.0, 1.5),
        ];
        let bb = BoundingBox::from_points(points).unwrap();
        assert_eq!(bb.p_min, Point::new(-1.0, -4.0, 0.5));
        assert_eq!(bb.p_max, Point::new(3.0, 2.0, 1.5));
        assert_eq!(bb.center(), Point::new(1.0, -1.0, 1.0));
        assert_ulps_eq!(bb.size(), 6.0);

        assert!(BoundingBox::from_points(std::iter::empty()).is_none());
    }

    #[test]
    fn area_and_normal() {
        let a = Point::new(0.0, 0.0, 0.0);
        let b = Point::new(2.0, 0.0, 0.0);
        let c = Point::new(0.0, 2.0, 0.0);
        assert_ulps_eq!(triangle_area(&a, &b, &c), 2.0);
        assert_eq!(triangle_normal(&a, &b, &c), Vector::z());
        assert_eq!(triangle_normal(&a, &b, &a), Vector::zeros());
    }
}

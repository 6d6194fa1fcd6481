//! Everything drawable that a database describes: the surface mesh, wakes,
//! propulsion elements and control surfaces.

use crate::geometry::Point;
use crate::geometry::Vector;
use crate::mesh::Mesh;
use crate::mesh::MeshOptions;
use crate::Result;
use adb_io::Header;
use adb_io::ModelType;
use adb_io::PropulsionKind;
use adb_io::Reference;
use adb_io::Surface;
use adb_io::Symmetry;
use nalgebra::Rotation3;
use nalgebra::Unit;

/// Default prolongation of wakes drawn to infinity, in model sizes.
const WAKE_LENGTH_FACTOR: f64 = 10.0;

fn point(xyz: [f32; 3]) -> Point {
    let [x, y, z] = xyz.map(f64::from);
    Point::new(x, y, z)
}

fn vector(xyz: [f32; 3]) -> Vector {
    let [x, y, z] = xyz.map(f64::from);
    Vector::new(x, y, z)
}

/// Mirror image of `p` across the symmetry plane, `None` without symmetry.
pub fn reflect(p: &Point, symmetry: Symmetry) -> Option<Point> {
    let mut mirrored = *p;
    match symmetry {
        Symmetry::None => return None,
        Symmetry::X => mirrored.x = -p.x,
        Symmetry::Y => mirrored.y = -p.y,
        Symmetry::Z => mirrored.z = -p.z,
    }
    Some(mirrored)
}

/// Vortex sheet trailing one Kutta node, as a polyline.
#[derive(Clone, Debug, PartialEq)]
pub struct Wake {
    pub points: Vec<Point>,
}

impl Wake {
    /// The wake with its last segment prolonged so that the added part is
    /// `length` long. Wakes with fewer than two distinct trailing points are
    /// returned unchanged.
    pub fn to_infinity(&self, length: f64) -> Vec<Point> {
        let mut points = self.points.clone();
        let tail = match points.as_slice() {
            [.., before, last] => (last - before)
                .try_normalize(f64::EPSILON)
                .map(|dir| *last + dir * length),
            _ => None,
        };
        points.extend(tail);
        points
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PropulsionElement {
    pub kind: PropulsionKind,
    pub origin: Point,
    /// Unit thrust axis.
    pub normal: Vector,
    pub radius: f64,
}

impl PropulsionElement {
    /// The disk rim, `segments` points evenly spread, first point not repeated.
    pub fn rim(&self, segments: usize) -> Vec<Point> {
        let normal = self.normal;
        // Any vector not parallel to the normal spans the disk with it.
        let seed = if normal.x.abs() < 0.9 {
            Vector::x()
        } else {
            Vector::y()
        };
        let u = match normal.cross(&seed).try_normalize(f64::EPSILON) {
            Some(u) => u,
            None => return Vec::new(),
        };
        let v = normal.cross(&u);
        (0..segments)
            .map(|i| {
                let angle = std::f64::consts::TAU * i as f64 / segments as f64;
                self.origin + (u * angle.cos() + v * angle.sin()) * self.radius
            })
            .collect()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ControlSurface {
    pub name: String,
    pub hinge: [Point; 2],
    /// Degrees, positive by the right-hand rule about `hinge[0] -> hinge[1]`.
    pub deflection: f64,
    pub outline: Vec<Point>,
}

impl ControlSurface {
    /// The outline rotated about the hinge line by the deflection angle.
    pub fn deflected_outline(&self) -> Vec<Point> {
        let [h0, h1] = self.hinge;
        let axis = match Unit::try_new(h1 - h0, f64::EPSILON) {
            Some(axis) => axis,
            None => return self.outline.clone(),
        };
        let rotation = Rotation3::from_axis_angle(&axis, self.deflection.to_radians());
        self.outline
            .iter()
            .map(|p| h0 + rotation * (*p - h0))
            .collect()
    }
}

/// A loaded database, minus the case payloads.
#[derive(Clone, Debug, Default)]
pub struct Scene {
    pub model_type: ModelType,
    pub symmetry: Symmetry,
    pub reference: Reference,
    pub surfaces: Vec<Surface>,
    pub mesh: Mesh,
    pub wakes: Vec<Wake>,
    pub propulsion: Vec<PropulsionElement>,
    pub control_surfaces: Vec<ControlSurface>,
    /// How far wakes are prolonged when drawn to infinity.
    pub wake_length: f64,
}

impl Scene {
    pub fn from_header(header: &Header, options: &MeshOptions) -> Result<Scene> {
        let mesh = Mesh::from_raw(&header.nodes, &header.triangles, options)?;

        let wakes = header
            .wakes
            .iter()
            .map(|w| Wake {
                points: w.iter().copied().map(point).collect(),
            })
            .collect();

        let propulsion = header
            .propulsion
            .iter()
            .map(|p| PropulsionElement {
                kind: p.kind,
                origin: point(p.origin),
                normal: vector(p.normal)
                    .try_normalize(f64::EPSILON)
                    .unwrap_or_else(Vector::x),
                radius: f64::from(p.radius),
            })
            .collect();

        let control_surfaces = header
            .control_surfaces
            .iter()
            .map(|c| ControlSurface {
                name: c.name.clone(),
                hinge: c.hinge.map(point),
                deflection: f64::from(c.deflection),
                outline: c.outline.iter().copied().map(point).collect(),
            })
            .collect();

        let wake_length = mesh
            .bounding_box()
            .map_or(0.0, |bb| WAKE_LENGTH_FACTOR * bb.size());

        Ok(Scene {
            model_type: header.model_type,
            symmetry: header.symmetry,
            reference: header.reference,
            surfaces: header.surfaces.clone(),
            mesh,
            wakes,
            propulsion,
            control_surfaces,
            wake_length,
        })
    }

    /// Center of gravity of the reference frame.
    pub fn cg(&self) -> Point {
        point(self.reference.cg)
    }

    pub fn surface_name(&self, surface_id: i32) -> Option<&str> {
        // Surface identifiers are 1-based.
        let idx = usize::try_from(surface_id).ok()?.checked_sub(1)?;
        self.surfaces.get(idx).map(|s| s.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use approx::assert_ulps_eq;

    #[test]
    fn wake_to_infinity() {
        let wake = Wake {
            points: vec![Point::new(1.0, 0.0, 0.0), Point::new(2.0, 0.0, 1.0)],
        };
        let points = wake.to_infinity(10.0);
        assert_eq!(points.len(), 3);
        let expected = Point::new(2.0, 0.0, 1.0) + Vector::new(1.0, 0.0, 1.0).normalize() * 10.0;
        assert_relative_eq!(points[2], expected);

        let short = Wake {
            points: vec![Point::origin()],
        };
        assert_eq!(short.to_infinity(10.0).len(), 1);
    }

    #[test]
    fn deflection_about_hinge() {
        // Flap behind a hinge along +y, deflected trailing edge down.
        let flap = ControlSurface {
            name: String::from("flap"),
            hinge: [Point::new(1.0, 0.0, 0.0), Point::new(1.0, 1.0, 0.0)],
            deflection: 90.0,
            outline: vec![Point::new(1.0, 0.5, 0.0), Point::new(2.0, 0.5, 0.0)],
        };
        let deflected = flap.deflected_outline();
        assert_relative_eq!(deflected[0], Point::new(1.0, 0.5, 0.0), epsilon = 1e-12);
        assert_relative_eq!(deflected[1], Point::new(1.0, 0.5, -1.0), epsilon = 1e-12);

        let degenerate = ControlSurface {
            hinge: [Point::origin(); 2],
            ..flap.clone()
        };
        assert_eq!(degenerate.deflected_outline(), flap.outline);
    }

    #[test]
    fn rotor_rim() {
        let rotor = PropulsionElement {
            kind: PropulsionKind::Rotor,
            origin: Point::new(0.0, 2.0, 0.0),
            normal: Vector::x(),
            radius: 0.5,
        };
        let rim = rotor.rim(16);
        assert_eq!(rim.len(), 16);
        for p in rim {
            assert_ulps_eq!(p.x, 0.0);
            assert_relative_eq!((p - rotor.origin).norm(), 0.5, epsilon = 1e-12);
        }
    }

    #[test]
    fn reflection() {
        let p = Point::new(1.0, 2.0, 3.0);
        assert_eq!(reflect(&p, Symmetry::None), None);
        assert_eq!(reflect(&p, Symmetry::Y), Some(Point::new(1.0, -2.0, 3.0)));
        assert_eq!(reflect(&p, Symmetry::Z), Some(Point::new(1.0, 2.0, -3.0)));
    }
}

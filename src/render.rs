//! Renderer-agnostic description of what to draw.
//!
//! [`render`] turns the loaded data and an immutable [`RenderConfig`] into a
//! [`Frame`]: world-space triangles with per-vertex colors and normals, and
//! polylines. Drawing the frame is left to the consumer.

use crate::case::Case;
use crate::colormap::surface_color;
use crate::colormap::ColorMap;
use crate::colormap::Rgb;
use crate::geometry::BoundingBox;
use crate::geometry::Point;
use crate::geometry::Vector;
use crate::mesh::CoarseLevel;
use crate::scene::reflect;
use crate::scene::Scene;
use crate::solution::FieldKind;
use crate::solution::FieldView;
use crate::solution::Range;
use crate::solution::Shading;
use crate::solution::SolutionStore;
use adb_io::Symmetry;

/// Segments used to draw propulsion disks.
const RIM_SEGMENTS: usize = 32;

const KUTTA_COLOR: Rgb = Rgb([1.0, 0.0, 1.0]);
const COARSE_COLOR: Rgb = Rgb([1.0, 1.0, 0.0]);

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum DisplayMode {
    /// Surfaces colored by region.
    #[default]
    Shaded,
    /// Surfaces colored by a scalar field.
    Field(FieldKind),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PlaneAxis {
    X,
    Y,
    Z,
}

impl PlaneAxis {
    fn index(self) -> usize {
        self as usize
    }
}

/// Everything that changes how a frame looks.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RenderConfig {
    pub mode: DisplayMode,
    pub shading: Shading,
    pub color_map: ColorMap,
    pub wireframe: bool,
    /// Overlay the edges and nodes of this coarse level. Independent of
    /// `wireframe`, which draws the fine edges.
    pub coarse_level: Option<usize>,
    pub legend: bool,
    pub label: bool,
    pub white_background: bool,
    pub cg: bool,
    pub axes: bool,
    pub wakes: bool,
    pub wakes_to_infinity: bool,
    pub propulsion: bool,
    pub control_surfaces: bool,
    pub deflected_control_surfaces: bool,
    /// Also draw the mirror image across the symmetry plane.
    pub reflected: bool,
    pub swap_normals: bool,
    /// Hides what lies beyond an axis-aligned plane through the middle of
    /// the model.
    pub cutting_plane: Option<PlaneAxis>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            mode: DisplayMode::Shaded,
            shading: Shading::Flat,
            color_map: ColorMap::Rainbow,
            wireframe: false,
            coarse_level: None,
            legend: true,
            label: true,
            white_background: false,
            cg: false,
            axes: false,
            wakes: false,
            wakes_to_infinity: false,
            propulsion: true,
            control_surfaces: false,
            deflected_control_surfaces: false,
            reflected: false,
            swap_normals: false,
            cutting_plane: None,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FrameTriangle {
    /// Index in the mesh triangle list.
    pub triangle: usize,
    pub corners: [Point; 3],
    pub normals: [Vector; 3],
    pub colors: [Rgb; 3],
    pub mirrored: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum LineKind {
    Edge,
    KuttaEdge,
    CoarseEdge,
    Wake,
    Propulsion,
    ControlSurface,
    Hinge,
    Axis,
    CuttingPlane,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FrameLine {
    pub kind: LineKind,
    pub points: Vec<Point>,
    pub color: Rgb,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Legend {
    pub title: String,
    pub range: Range,
    pub color_map: ColorMap,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    pub background: Rgb,
    pub foreground: Rgb,
    /// The mode actually drawn.
    pub mode: DisplayMode,
    /// Set when the requested field is missing from the current case.
    pub unavailable: Option<FieldKind>,
    pub triangles: Vec<FrameTriangle>,
    pub lines: Vec<FrameLine>,
    /// Nodes of the displayed coarse level.
    pub coarse_nodes: Vec<Point>,
    /// Center of gravity marker.
    pub cg: Option<Point>,
    pub legend: Option<Legend>,
    pub label: Option<String>,
    pub bounding_box: Option<BoundingBox>,
}

/// Human-readable description of a flow condition.
pub fn case_label(case: &Case) -> String {
    let mut label = format!(
        "Mach: {:.3}  Beta: {:.3}  Alpha: {:.3}",
        case.mach, case.beta, case.alpha,
    );
    if !case.comment.is_empty() {
        label.push_str("  ");
        label.push_str(&case.comment);
    }
    label
}

struct Clip {
    axis: usize,
    at: f64,
}

impl Clip {
    fn hides(&self, p: &Point) -> bool {
        self.at < p[self.axis]
    }
}

fn mirrored_line(line: &FrameLine, symmetry: Symmetry) -> Option<FrameLine> {
    let points = line
        .points
        .iter()
        .map(|p| reflect(p, symmetry))
        .collect::<Option<Vec<Point>>>()?;
    Some(FrameLine {
        points,
        ..line.clone()
    })
}

fn mirrored_vector(v: &Vector, symmetry: Symmetry) -> Vector {
    let mut v = *v;
    match symmetry {
        Symmetry::None => {}
        Symmetry::X => v.x = -v.x,
        Symmetry::Y => v.y = -v.y,
        Symmetry::Z => v.z = -v.z,
    }
    v
}

fn surface_triangles(
    scene: &Scene,
    field: Option<&FieldView<'_>>,
    config: &RenderConfig,
    clip: Option<&Clip>,
) -> Vec<FrameTriangle> {
    let mesh = &scene.mesh;
    let sign = if config.swap_normals { -1.0 } else { 1.0 };
    let mut out = Vec::with_capacity(mesh.triangle_count());

    for (t, triangle) in mesh.triangles().iter().enumerate() {
        let corners = mesh.corners(triangle);
        if let Some(clip) = clip {
            if corners.iter().all(|p| clip.hides(p)) {
                continue;
            }
        }
        let normals = match config.shading {
            Shading::Flat => [mesh.normals()[t] * sign; 3],
            Shading::Smooth => triangle.nodes.map(|n| mesh.nodal_normals()[n] * sign),
        };
        let colors = match field {
            Some(field) => {
                let Range { min, max } = field.displayed;
                let color = |v: f64| config.color_map.map(v, min, max);
                match field.shading {
                    Shading::Flat => [color(field.values[t]); 3],
                    Shading::Smooth => triangle.nodes.map(|n| color(field.values[n])),
                }
            }
            None => [surface_color(triangle.surface_id); 3],
        };
        out.push(FrameTriangle {
            triangle: t,
            corners,
            normals,
            colors,
            mirrored: false,
        });
    }

    if config.reflected && scene.symmetry != Symmetry::None {
        let symmetry = scene.symmetry;
        let mirrored: Vec<FrameTriangle> = out
            .iter()
            .filter_map(|ft| {
                let [a, b, c] = ft.corners.map(|p| reflect(&p, symmetry));
                let [na, nb, nc] = ft.normals.map(|n| mirrored_vector(&n, symmetry));
                let [ca, cb, cc] = ft.colors;
                // Mirroring flips orientation, swap two corners to restore it.
                Some(FrameTriangle {
                    triangle: ft.triangle,
                    corners: [a?, c?, b?],
                    normals: [na, nc, nb],
                    colors: [ca, cc, cb],
                    mirrored: true,
                })
            })
            .collect();
        out.extend(mirrored);
    }

    out
}

fn edge_lines(scene: &Scene, foreground: Rgb) -> Vec<FrameLine> {
    let nodes = scene.mesh.nodes();
    scene
        .mesh
        .edges()
        .iter()
        .map(|e| FrameLine {
            kind: if e.is_kutta {
                LineKind::KuttaEdge
            } else {
                LineKind::Edge
            },
            points: e.nodes.map(|n| nodes[n].position).to_vec(),
            color: if e.is_kutta { KUTTA_COLOR } else { foreground },
        })
        .collect()
}

fn coarse_lines(level: &CoarseLevel) -> Vec<FrameLine> {
    level
        .edges
        .iter()
        .map(|e| FrameLine {
            kind: LineKind::CoarseEdge,
            points: e.nodes.map(|n| level.nodes[n].position).to_vec(),
            color: if e.is_kutta { KUTTA_COLOR } else { COARSE_COLOR },
        })
        .collect()
}

fn extra_lines(scene: &Scene, config: &RenderConfig, foreground: Rgb) -> Vec<FrameLine> {
    let mut lines = Vec::new();

    if config.wakes {
        for wake in &scene.wakes {
            let points = if config.wakes_to_infinity {
                wake.to_infinity(scene.wake_length)
            } else {
                wake.points.clone()
            };
            lines.push(FrameLine {
                kind: LineKind::Wake,
                points,
                color: Rgb([0.2, 0.6, 1.0]),
            });
        }
    }

    if config.propulsion {
        let color = Rgb([1.0, 0.5, 0.0]);
        for element in &scene.propulsion {
            let mut rim = element.rim(RIM_SEGMENTS);
            if let Some(first) = rim.first().copied() {
                rim.push(first);
            }
            lines.push(FrameLine {
                kind: LineKind::Propulsion,
                points: rim,
                color,
            });
            lines.push(FrameLine {
                kind: LineKind::Propulsion,
                points: vec![
                    element.origin,
                    element.origin + element.normal * element.radius,
                ],
                color,
            });
        }
    }

    if config.control_surfaces {
        let color = Rgb([0.0, 0.8, 0.3]);
        for surface in &scene.control_surfaces {
            let mut outline = if config.deflected_control_surfaces {
                surface.deflected_outline()
            } else {
                surface.outline.clone()
            };
            if let Some(first) = outline.first().copied() {
                outline.push(first);
            }
            lines.push(FrameLine {
                kind: LineKind::ControlSurface,
                points: outline,
                color,
            });
            lines.push(FrameLine {
                kind: LineKind::Hinge,
                points: surface.hinge.to_vec(),
                color: foreground,
            });
        }
    }

    lines
}

fn axis_lines(bb: &BoundingBox) -> Vec<FrameLine> {
    let length = bb.size() / 4.0;
    let origin = bb.p_min;
    [
        (Vector::x(), Rgb([1.0, 0.0, 0.0])),
        (Vector::y(), Rgb([0.0, 1.0, 0.0])),
        (Vector::z(), Rgb([0.0, 0.0, 1.0])),
    ]
    .into_iter()
    .map(|(dir, color)| FrameLine {
        kind: LineKind::Axis,
        points: vec![origin, origin + dir * length],
        color,
    })
    .collect()
}

fn plane_outline(bb: &BoundingBox, axis: PlaneAxis, at: f64, color: Rgb) -> FrameLine {
    let a = axis.index();
    let (u, v) = ((a + 1) % 3, (a + 2) % 3);
    let corner = |cu: f64, cv: f64| {
        let mut p = Point::origin();
        p[a] = at;
        p[u] = cu;
        p[v] = cv;
        p
    };
    let (min, max) = (bb.p_min, bb.p_max);
    FrameLine {
        kind: LineKind::CuttingPlane,
        points: vec![
            corner(min[u], min[v]),
            corner(max[u], min[v]),
            corner(max[u], max[v]),
            corner(min[u], max[v]),
            corner(min[u], min[v]),
        ],
        color,
    }
}

/// Builds the frame for the given configuration.
///
/// A field mode whose field is missing from the current case is drawn
/// shaded, and the field is reported in [`Frame::unavailable`].
pub fn render(
    scene: &Scene,
    solution: &SolutionStore,
    case: Option<&Case>,
    config: &RenderConfig,
) -> Frame {
    let (background, foreground) = if config.white_background {
        (Rgb::WHITE, Rgb::BLACK)
    } else {
        (Rgb::BLACK, Rgb::WHITE)
    };

    let mut mode = config.mode;
    let mut unavailable = None;
    let field = match config.mode {
        DisplayMode::Shaded => None,
        DisplayMode::Field(kind) => match solution.view(kind, config.shading) {
            Ok(view) => Some(view),
            Err(err) => {
                tracing::warn!("{}, drawing shaded surfaces", err);
                mode = DisplayMode::Shaded;
                unavailable = Some(kind);
                None
            }
        },
    };

    let bounding_box = scene.mesh.bounding_box();
    let clip = config.cutting_plane.zip(bounding_box);
    let clip = clip.map(|(axis, bb)| Clip {
        axis: axis.index(),
        at: bb.center()[axis.index()],
    });

    let triangles = surface_triangles(scene, field.as_ref(), config, clip.as_ref());

    let mut lines = Vec::new();
    let mut coarse_nodes = Vec::new();
    if config.wireframe {
        lines.extend(edge_lines(scene, foreground));
    }
    if let Some(level) = config
        .coarse_level
        .and_then(|level| scene.mesh.coarse_level(level))
    {
        lines.extend(coarse_lines(level));
        coarse_nodes.extend(level.nodes.iter().map(|n| n.position));
    }
    lines.extend(extra_lines(scene, config, foreground));
    if let Some(clip) = &clip {
        lines.retain(|l| !l.points.iter().all(|p| clip.hides(p)));
        coarse_nodes.retain(|p| !clip.hides(p));
    }
    if config.reflected && scene.symmetry != Symmetry::None {
        let mirrored: Vec<FrameLine> = lines
            .iter()
            .filter_map(|l| mirrored_line(l, scene.symmetry))
            .collect();
        lines.extend(mirrored);
        let mirrored: Vec<Point> = coarse_nodes
            .iter()
            .filter_map(|p| reflect(p, scene.symmetry))
            .collect();
        coarse_nodes.extend(mirrored);
    }
    if let Some(bb) = &bounding_box {
        if config.axes {
            lines.extend(axis_lines(bb));
        }
        if let (Some(axis), Some(clip)) = (config.cutting_plane, &clip) {
            lines.push(plane_outline(bb, axis, clip.at, foreground));
        }
    }

    let legend = match (&field, config.legend) {
        (Some(view), true) => Some(Legend {
            title: view.kind.to_string(),
            range: view.displayed,
            color_map: config.color_map,
        }),
        _ => None,
    };

    Frame {
        background,
        foreground,
        mode,
        unavailable,
        triangles,
        lines,
        coarse_nodes,
        cg: config.cg.then(|| scene.cg()),
        legend,
        label: case.filter(|_| config.label).map(case_label),
        bounding_box,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::Mesh;
    use crate::mesh::MeshOptions;
    use crate::mesh::Node;
    use crate::mesh::Triangle;
    use adb_io::CaseData;
    use adb_io::Field;

    fn square_scene(symmetry: Symmetry) -> Scene {
        let nodes = vec![
            Node::new(0.0, 1.0, 0.0, 1),
            Node::new(1.0, 1.0, 0.0, 1),
            Node::new(0.0, 2.0, 0.0, 2),
            Node::new(1.0, 2.0, 0.0, 2),
        ];
        let triangles = vec![
            Triangle::new([0, 1, 2], 1, 5),
            Triangle::new([1, 3, 2], 2, 5),
        ];
        let mesh = Mesh::new(nodes, triangles, &MeshOptions::default()).unwrap();
        Scene {
            symmetry,
            mesh,
            ..Scene::default()
        }
    }

    fn solution(scene: &Scene) -> SolutionStore {
        let mut data = CaseData::default();
        data.set_field(Field::Cp, vec![-1.0, 1.0]);
        let mut store = SolutionStore::default();
        store.replace(0, data, &scene.mesh).unwrap();
        store
    }

    #[test]
    fn shaded_by_default() {
        let scene = square_scene(Symmetry::None);
        let config = RenderConfig::default();
        let frame = render(&scene, &SolutionStore::default(), None, &config);
        assert_eq!(frame.mode, DisplayMode::Shaded);
        assert_eq!(frame.triangles.len(), 2);
        assert_eq!(frame.triangles[0].colors[0], surface_color(1));
        assert_eq!(frame.triangles[1].colors[0], surface_color(2));
        assert!(frame.lines.is_empty());
        assert!(frame.legend.is_none());
        assert!(frame.label.is_none());
    }

    #[test]
    fn field_colors_and_legend() {
        let scene = square_scene(Symmetry::None);
        let store = solution(&scene);
        let config = RenderConfig {
            mode: DisplayMode::Field(FieldKind::Cp),
            ..RenderConfig::default()
        };
        let frame = render(&scene, &store, None, &config);
        assert_eq!(frame.mode, config.mode);
        assert_eq!(frame.unavailable, None);
        let low = config.color_map.map(0.0, 0.0, 1.0);
        let high = config.color_map.map(1.0, 0.0, 1.0);
        assert_eq!(frame.triangles[0].colors, [low; 3]);
        assert_eq!(frame.triangles[1].colors, [high; 3]);
        let legend = frame.legend.unwrap();
        assert_eq!(legend.title, "Cp");
        assert_eq!(legend.range, Range::new(-1.0, 1.0));
    }

    #[test]
    fn missing_field_falls_back_to_shaded() {
        let scene = square_scene(Symmetry::None);
        let store = solution(&scene);
        let config = RenderConfig {
            mode: DisplayMode::Field(FieldKind::CpUnsteady),
            ..RenderConfig::default()
        };
        let frame = render(&scene, &store, None, &config);
        assert_eq!(frame.mode, DisplayMode::Shaded);
        assert_eq!(frame.unavailable, Some(FieldKind::CpUnsteady));
        assert_eq!(frame.triangles.len(), 2);
        assert!(frame.legend.is_none());
    }

    #[test]
    fn reflection_and_wireframe() {
        let scene = square_scene(Symmetry::Y);
        let config = RenderConfig {
            wireframe: true,
            reflected: true,
            ..RenderConfig::default()
        };
        let frame = render(&scene, &SolutionStore::default(), None, &config);
        assert_eq!(frame.triangles.len(), 4);
        let mirrored = frame.triangles.iter().filter(|t| t.mirrored);
        for t in mirrored {
            assert!(t.corners.iter().all(|p| p.y < 0.0));
            // Winding is restored, so the normal still matches the corners.
            let [a, b, c] = t.corners;
            let n = (b - a).cross(&(c - a)).normalize();
            assert!(0.0 < n.dot(&t.normals[0]));
        }
        assert_eq!(frame.lines.len(), 2 * scene.mesh.edges().len());
    }

    #[test]
    fn coarse_overlay_without_wireframe() {
        let scene = square_scene(Symmetry::None);
        let config = RenderConfig {
            coarse_level: Some(1),
            ..RenderConfig::default()
        };
        let frame = render(&scene, &SolutionStore::default(), None, &config);
        let level = scene.mesh.coarse_level(1).unwrap();
        assert_eq!(frame.coarse_nodes.len(), level.nodes.len());
        assert_eq!(frame.lines.len(), level.edges.len());
        assert!(frame.lines.iter().all(|l| l.kind == LineKind::CoarseEdge));

        let config = RenderConfig {
            wireframe: true,
            ..config
        };
        let frame = render(&scene, &SolutionStore::default(), None, &config);
        let fine = frame
            .lines
            .iter()
            .filter(|l| l.kind != LineKind::CoarseEdge);
        assert_eq!(fine.count(), scene.mesh.edges().len());

        let config = RenderConfig {
            coarse_level: Some(9),
            ..config
        };
        let frame = render(&scene, &SolutionStore::default(), None, &config);
        assert!(frame.coarse_nodes.is_empty());
    }

    #[test]
    fn cutting_plane_hides_one_side() {
        let scene = square_scene(Symmetry::None);
        let config = RenderConfig {
            cutting_plane: Some(PlaneAxis::Y),
            ..RenderConfig::default()
        };
        let frame = render(&scene, &SolutionStore::default(), None, &config);
        // The plane goes through y = 1.5: both triangles straddle it.
        assert_eq!(frame.triangles.len(), 2);
        assert!(frame.lines.iter().any(|l| l.kind == LineKind::CuttingPlane));

        let mut scene = scene;
        scene.mesh = Mesh::new(
            vec![
                Node::new(0.0, 0.0, 0.0, 1),
                Node::new(1.0, 0.0, 0.0, 1),
                Node::new(0.0, 1.0, 0.0, 1),
                Node::new(0.0, 3.0, 0.0, 1),
                Node::new(1.0, 3.0, 0.0, 1),
                Node::new(0.0, 4.0, 0.0, 1),
            ],
            vec![
                Triangle::new([0, 1, 2], 1, 5),
                Triangle::new([3, 4, 5], 1, 5),
            ],
            &MeshOptions::default(),
        )
        .unwrap();
        let frame = render(&scene, &SolutionStore::default(), None, &config);
        assert_eq!(frame.triangles.len(), 1);
        assert_eq!(frame.triangles[0].triangle, 0);
    }

    #[test]
    fn label_follows_the_case() {
        let scene = square_scene(Symmetry::None);
        let case = Case {
            mach: 0.3,
            beta: 0.0,
            alpha: 2.0,
            comment: String::from("cruise"),
        };
        let config = RenderConfig::default();
        let frame = render(&scene, &SolutionStore::default(), Some(&case), &config);
        assert_eq!(
            frame.label.as_deref(),
            Some("Mach: 0.300  Beta: 0.000  Alpha: 2.000  cruise"),
        );
    }
}

use adb_io::CaseData;
use adb_io::CaseHeader;
use adb_io::Field;
use adb_io::FieldMask;
use adb_io::Header;
use adb_io::ModelType;
use adb_io::PropulsionKind;
use adb_io::RawControlSurface;
use adb_io::RawNode;
use adb_io::RawPropulsionElement;
use adb_io::RawTriangle;
use adb_io::Reference;
use adb_io::Surface;
use adb_io::SurfaceKind;
use adb_io::Symmetry;
use adbview::LoadOptions;
use adbview::Viewer;
use anyhow::Context as _;
use anyhow::Result;
use std::f32::consts::PI;
use std::fs;
use std::io;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;
use tracing_subscriber::Registry;
use tracing_tree::HierarchicalLayer;

/// Logs to stderr, filtered by the `LOG` environment variable.
pub fn set_up_logging() {
    Registry::default()
        .with(EnvFilter::from_env("LOG"))
        .with(
            HierarchicalLayer::new(4)
                .with_targets(true)
                .with_bracketed_fields(true),
        )
        .init();
}

/// Opens `path` for writing, or stdout if it is missing or `-`.
pub fn writer(path: Option<&String>) -> Result<Box<dyn io::Write>> {
    Ok(match path.map(String::as_str) {
        None | Some("-") => Box::new(io::BufWriter::new(io::stdout().lock())),
        Some(path) => {
            let file = fs::File::create(path)
                .with_context(|| format!("failed to create {:?}", path))?;
            Box::new(io::BufWriter::new(file))
        }
    })
}

/// Loads a database into a fresh viewer.
pub fn load(path: &str, options: LoadOptions) -> Result<Viewer> {
    let mut viewer = Viewer::new(options);
    viewer
        .load_mesh(path)
        .with_context(|| format!("failed to load {:?}", path))?;
    Ok(viewer)
}

/// Parameters of a synthetic trapezoidal half wing.
#[derive(Clone, Debug, PartialEq)]
pub struct WingSpec {
    pub span: f32,
    pub root_chord: f32,
    pub tip_chord: f32,
    /// Leading edge sweep, in degrees.
    pub sweep: f32,
    /// Number of panels along the chord.
    pub chordwise: usize,
    /// Number of panels along the half span.
    pub spanwise: usize,
    pub machs: Vec<f32>,
    /// Angles of attack, in degrees.
    pub alphas: Vec<f32>,
    /// Add a tractor rotor ahead of the wing.
    pub rotor: bool,
}

impl Default for WingSpec {
    fn default() -> Self {
        Self {
            span: 10.0,
            root_chord: 2.0,
            tip_chord: 1.0,
            sweep: 15.0,
            chordwise: 8,
            spanwise: 16,
            machs: vec![0.2, 0.5],
            alphas: vec![0.0, 2.0, 4.0, 6.0],
            rotor: true,
        }
    }
}

/// Sideslip of the extra case solved at the highest Mach number.
const SIDESLIP: f32 = 5.0;

/// Fraction of the chord ahead of the aileron hinge.
const HINGE_CHORD: f32 = 0.75;

impl WingSpec {
    fn chord(&self, eta: f32) -> f32 {
        self.root_chord + (self.tip_chord - self.root_chord) * eta
    }

    fn leading_edge(&self, eta: f32) -> [f32; 3] {
        let y = eta * self.span / 2.0;
        [y * self.sweep.to_radians().tan(), y, 0.0]
    }

    /// Point at chord fraction `xi` and half span fraction `eta`.
    fn point(&self, xi: f32, eta: f32) -> [f32; 3] {
        let [x, y, z] = self.leading_edge(eta);
        [x + xi * self.chord(eta), y, z]
    }

    fn node_id(&self, i: usize, j: usize) -> usize {
        j * (self.chordwise + 1) + i
    }
}

/// Loading of a flat plate: lifting pressure difference at chord fraction
/// `xi` and half span fraction `eta`, elliptic along the span.
fn delta_cp(xi: f32, eta: f32, mach: f32, alpha: f32, beta: f32) -> f32 {
    let compressibility = 1.0 / (1.0 - mach.min(0.95).powi(2)).sqrt();
    let xi = xi.clamp(1e-3, 1.0);
    4.0 * alpha.to_radians()
        * ((1.0 - xi) / xi).sqrt()
        * (1.0 - eta * eta).max(0.0).sqrt()
        * compressibility
        * beta.to_radians().cos()
}

/// Builds a database for a synthetic wing: geometry, wakes, one aileron, an
/// optional rotor, and a sparse set of solved cases.
pub fn wing(spec: &WingSpec) -> (Header, Vec<CaseData>) {
    let (nc, ns) = (spec.chordwise.max(1), spec.spanwise.max(1));
    // Cosine spacing, finer at the leading and trailing edges.
    let xis: Vec<f32> = (0..=nc)
        .map(|i| 0.5 * (1.0 - (PI * i as f32 / nc as f32).cos()))
        .collect();
    let etas: Vec<f32> = (0..=ns).map(|j| j as f32 / ns as f32).collect();
    let spec = WingSpec {
        chordwise: nc,
        spanwise: ns,
        ..spec.clone()
    };

    let nodes = etas
        .iter()
        .flat_map(|eta| xis.iter().map(move |xi| (*xi, *eta)))
        .map(|(xi, eta)| RawNode {
            xyz: spec.point(xi, eta),
            surface_id: 1,
        })
        .collect();

    let mut triangles = Vec::with_capacity(2 * nc * ns);
    // Centroid of each triangle, in chord and span fractions.
    let mut centroids = Vec::with_capacity(2 * nc * ns);
    for j in 0..ns {
        for i in 0..nc {
            let id = |i, j| spec.node_id(i, j) as i32;
            let quad = [id(i, j), id(i + 1, j), id(i + 1, j + 1), id(i, j + 1)];
            for (corners, fractions) in [
                ([quad[0], quad[1], quad[2]], [(i, j), (i + 1, j), (i + 1, j + 1)]),
                ([quad[0], quad[2], quad[3]], [(i, j), (i + 1, j + 1), (i, j + 1)]),
            ] {
                triangles.push(RawTriangle {
                    nodes: corners,
                    surface_id: 1,
                    surface_type: 1,
                });
                let xi = fractions.iter().map(|(i, _)| xis[*i]).sum::<f32>() / 3.0;
                let eta = fractions.iter().map(|(_, j)| etas[*j]).sum::<f32>() / 3.0;
                centroids.push((xi, eta));
            }
        }
    }

    let kutta_nodes = (0..=ns).map(|j| spec.node_id(nc, j) as i32).collect();

    let wake_length = 2.0 * spec.root_chord;
    let wakes = etas
        .iter()
        .map(|eta| {
            let [x, y, z] = spec.point(1.0, *eta);
            (0..=4)
                .map(|k| {
                    let t = k as f32 / 4.0;
                    [x + t * wake_length, y, z - 0.05 * t * t * wake_length]
                })
                .collect()
        })
        .collect();

    let (inboard, outboard) = (0.6, 0.9);
    let control_surfaces = vec![RawControlSurface {
        name: "aileron".to_string(),
        hinge: [
            spec.point(HINGE_CHORD, inboard),
            spec.point(HINGE_CHORD, outboard),
        ],
        deflection: 10.0,
        outline: vec![
            spec.point(HINGE_CHORD, inboard),
            spec.point(1.0, inboard),
            spec.point(1.0, outboard),
            spec.point(HINGE_CHORD, outboard),
        ],
    }];

    let propulsion = if spec.rotor {
        let [_, y, z] = spec.leading_edge(0.35);
        vec![RawPropulsionElement {
            kind: PropulsionKind::Rotor,
            origin: [-0.4 * spec.root_chord, y, z],
            normal: [-1.0, 0.0, 0.0],
            radius: 0.3 * spec.root_chord,
        }]
    } else {
        Vec::new()
    };

    let mut conditions: Vec<(f32, f32, f32, FieldMask)> = Vec::new();
    for mach in &spec.machs {
        for alpha in &spec.alphas {
            conditions.push((*mach, 0.0, *alpha, FieldMask::ALL));
        }
    }
    let last = spec.machs.last().zip(spec.alphas.last());
    if let Some((mach, alpha)) = last {
        let steady_only = [Field::Cp, Field::Gamma].into_iter().collect();
        conditions.push((*mach, SIDESLIP, *alpha, steady_only));
    }

    let mut cases = Vec::with_capacity(conditions.len());
    let mut payloads = Vec::with_capacity(conditions.len());
    for (mach, beta, alpha, fields) in conditions {
        let mut data = CaseData::default();
        let dcp: Vec<f32> = centroids
            .iter()
            .map(|(xi, eta)| delta_cp(*xi, *eta, mach, alpha, beta))
            .collect();
        let unsteady: Vec<f32> = centroids
            .iter()
            .zip(&dcp)
            .map(|((_, eta), dcp)| 0.05 * dcp * (PI * eta).sin())
            .collect();
        let cp: Vec<f32> = dcp.iter().map(|v| -v).collect();
        let steady: Vec<f32> = cp.iter().zip(&unsteady).map(|(cp, u)| cp + u).collect();
        let gamma: Vec<f32> = centroids
            .iter()
            .zip(&dcp)
            .map(|((_, eta), dcp)| 0.5 * dcp * spec.chord(*eta) / nc as f32)
            .collect();
        for field in fields.iter() {
            let values = match field {
                Field::Cp => cp.clone(),
                Field::CpSteady => steady.clone(),
                Field::CpUnsteady => unsteady.iter().map(|v| -v).collect(),
                Field::Gamma => gamma.clone(),
            };
            data.set_field(field, values);
        }
        cases.push(CaseHeader {
            mach,
            beta,
            alpha,
            fields,
            comment: format!("synthetic wing, M={} a={} b={}", mach, alpha, beta),
        });
        payloads.push(data);
    }

    let header = Header {
        model_type: ModelType::VortexLattice,
        symmetry: Symmetry::Y,
        reference: Reference {
            sref: spec.span * (spec.root_chord + spec.tip_chord) / 2.0,
            cref: (spec.root_chord + spec.tip_chord) / 2.0,
            bref: spec.span,
            cg: [0.25 * spec.root_chord, 0.0, 0.0],
        },
        surfaces: vec![Surface {
            kind: SurfaceKind::Wing,
            name: "WingGeom".to_string(),
        }],
        nodes,
        triangles,
        kutta_nodes,
        wakes,
        propulsion,
        control_surfaces,
        cases,
    };
    (header, payloads)
}

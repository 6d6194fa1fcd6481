//! The viewer core: one loaded database, its current case, the display
//! configuration and the camera.

use crate::camera::Camera;
use crate::case::Axis;
use crate::case::Case;
use crate::case::CaseIndex;
use crate::case::CaseSelection;
use crate::command::Command;
use crate::mesh::CoarseLevel;
use crate::mesh::Edge;
use crate::mesh::KuttaRule;
use crate::mesh::MeshOptions;
use crate::mesh::Triangle;
use crate::render::render;
use crate::render::Frame;
use crate::render::RenderConfig;
use crate::scene::Scene;
use crate::solution::FieldKind;
use crate::solution::FieldView;
use crate::solution::SolutionStore;
use crate::Error;
use crate::Result;
use adb_io::ByteOrder;
use std::fmt;
use std::fs::File;
use std::io;
use std::path::Path;

/// Any seekable byte source.
pub trait Source: io::Read + io::Seek {}

impl<T> Source for T where T: io::Read + io::Seek {}

/// How to interpret a database.
#[derive(Clone, Debug)]
pub struct LoadOptions {
    /// Byte order of the file relative to this machine.
    pub byte_order: ByteOrder,
    /// Overrides the Kutta edge rule. By default, the Kutta nodes listed in
    /// the file are used, or the trailing edge rule if there is none.
    pub kutta: Option<KuttaRule>,
    /// Maximum number of coarse levels to derive.
    pub coarse_levels: usize,
    /// Overrides the length by which wakes are prolonged when drawn to
    /// infinity.
    pub wake_length: Option<f64>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            byte_order: ByteOrder::Native,
            kutta: None,
            coarse_levels: MeshOptions::default().coarse_levels,
            wake_length: None,
        }
    }
}

struct Database {
    reader: adb_io::Reader<Box<dyn Source>>,
    scene: Scene,
    cases: CaseIndex,
}

#[derive(Default)]
pub struct Viewer {
    options: LoadOptions,
    database: Option<Database>,
    solution: SolutionStore,
    selection: CaseSelection,
    config: RenderConfig,
    camera: Camera,
}

impl fmt::Debug for Viewer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Viewer")
            .field("options", &self.options)
            .field("loaded", &self.database.is_some())
            .field("case", &self.solution.case())
            .field("config", &self.config)
            .field("camera", &self.camera)
            .finish()
    }
}

impl Viewer {
    pub fn new(options: LoadOptions) -> Viewer {
        Viewer {
            options,
            ..Viewer::default()
        }
    }

    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut LoadOptions {
        &mut self.options
    }

    /// Loads a database file, see [`Viewer::load_reader`].
    pub fn load_mesh(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => Error::FileNotFound(path.to_path_buf()),
            _ => Error::Io(err),
        })?;
        tracing::info!(path = %path.display(), "loading solution database");
        self.load_reader(io::BufReader::new(file))
    }

    /// Loads a database and its first case.
    ///
    /// On failure the viewer is left exactly as it was.
    pub fn load_reader<R>(&mut self, source: R) -> Result<()>
    where
        R: io::Read + io::Seek + 'static,
    {
        let span = tracing::info_span!("load");
        let _enter = span.enter();

        let source: Box<dyn Source> = Box::new(source);
        let mut reader = adb_io::Reader::new(source, self.options.byte_order)?;
        let header = reader.header();

        let kutta = match &self.options.kutta {
            Some(rule) => rule.clone(),
            None if header.kutta_nodes.is_empty() => KuttaRule::default(),
            None => KuttaRule::from_node_list(
                header
                    .kutta_nodes
                    .iter()
                    .filter_map(|n| usize::try_from(*n).ok()),
                header.nodes.len(),
            ),
        };
        let mesh_options = MeshOptions {
            kutta,
            coarse_levels: self.options.coarse_levels,
        };
        let mut scene = Scene::from_header(header, &mesh_options)?;
        if let Some(length) = self.options.wake_length {
            scene.wake_length = length;
        }
        let cases = CaseIndex::new(header.cases.iter().map(Case::from).collect());

        let mut solution = SolutionStore::default();
        if !cases.is_empty() {
            solution.load_case(0, &mut reader, &scene.mesh)?;
        }

        tracing::info!(
            node_count = scene.mesh.node_count(),
            triangle_count = scene.mesh.triangle_count(),
            case_count = cases.len(),
            "solution database loaded"
        );

        let mut selection = CaseSelection::default();
        if !cases.is_empty() {
            selection.settle(&cases, 0);
        }
        if let Some(bb) = scene.mesh.bounding_box() {
            self.camera.fit(&bb);
        }
        self.selection = selection;
        self.solution = solution;
        self.database = Some(Database {
            reader,
            scene,
            cases,
        });
        Ok(())
    }

    pub fn is_loaded(&self) -> bool {
        self.database.is_some()
    }

    fn database(&self) -> Result<&Database> {
        self.database.as_ref().ok_or(Error::NoMesh)
    }

    pub fn scene(&self) -> Option<&Scene> {
        self.database.as_ref().map(|db| &db.scene)
    }

    pub fn cases(&self) -> Option<&CaseIndex> {
        self.database.as_ref().map(|db| &db.cases)
    }

    /// Makes the given case resident.
    ///
    /// On failure the previous case stays resident.
    pub fn load_case(&mut self, index: usize) -> Result<()> {
        let db = self.database.as_mut().ok_or(Error::NoMesh)?;
        self.solution
            .load_case(index, &mut db.reader, &db.scene.mesh)?;
        self.selection.settle(&db.cases, index);
        Ok(())
    }

    /// Index of the resident case.
    pub fn current_case(&self) -> Option<usize> {
        self.solution.case()
    }

    pub fn solution(&self) -> &SolutionStore {
        &self.solution
    }

    pub fn set_legend_range(&mut self, kind: FieldKind, min: f64, max: f64) -> Result<()> {
        self.solution.set_legend_range(kind, min, max)
    }

    pub fn reset_legend_range(&mut self, kind: FieldKind) {
        self.solution.reset_legend_range(kind);
    }

    /// The given field of the resident case, shaded as configured.
    pub fn scalar_field(&self, kind: FieldKind) -> Result<FieldView<'_>> {
        self.solution.view(kind, self.config.shading)
    }

    pub fn triangles(&self) -> Result<&[Triangle]> {
        Ok(self.database()?.scene.mesh.triangles())
    }

    pub fn edges(&self) -> Result<&[Edge]> {
        Ok(self.database()?.scene.mesh.edges())
    }

    /// Coarse level `level`, 1-based. `None` if the mesh has fewer levels.
    pub fn coarse_level(&self, level: usize) -> Result<Option<&CoarseLevel>> {
        Ok(self.database()?.scene.mesh.coarse_level(level))
    }

    pub fn resolve_case(&self, mach: f64, beta: f64, alpha: f64) -> Result<Option<usize>> {
        Ok(self.database()?.cases.resolve(mach, beta, alpha))
    }

    pub fn selection(&self) -> &CaseSelection {
        &self.selection
    }

    /// Picks a value in the list of an axis.
    pub fn pick(&mut self, axis: Axis, index: usize) {
        self.selection.pick(axis, index);
    }

    /// Types a value for an axis.
    pub fn type_value(&mut self, axis: Axis, value: f64) {
        self.selection.type_value(axis, value);
    }

    /// Loads the case the selection points to.
    ///
    /// Returns `Ok(None)` and keeps the resident case when the selected
    /// combination was not solved.
    pub fn reload_selection(&mut self) -> Result<Option<usize>> {
        let db = self.database()?;
        let case = match self.selection.resolve(&db.cases) {
            Some(case) => case,
            None => {
                tracing::warn!("no solved case matches the selection");
                return Ok(None);
            }
        };
        self.load_case(case)?;
        Ok(Some(case))
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Applies a user action to the display configuration and camera.
    pub fn apply(&mut self, command: Command) {
        match command {
            Command::View(view) => self.camera.set_view(view),
            Command::ResetView => self.camera.reset(),
            _ => {}
        }
        self.config = self.config.apply(command);
    }

    pub fn frame(&self) -> Result<Frame> {
        let db = self.database()?;
        let case = self.solution.case().and_then(|i| db.cases.get(i));
        Ok(render(&db.scene, &self.solution, case, &self.config))
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }
}

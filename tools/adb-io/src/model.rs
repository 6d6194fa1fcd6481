use crate::Error;
use crate::Result;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum ModelType {
    #[default]
    VortexLattice,
    Panel,
}

impl ModelType {
    pub(crate) fn from_code(code: i32) -> Result<Self> {
        Ok(match code {
            1 => ModelType::VortexLattice,
            2 => ModelType::Panel,
            _ => return Err(Error::BadCode { what: "model type", code }),
        })
    }

    pub(crate) fn code(self) -> i32 {
        match self {
            ModelType::VortexLattice => 1,
            ModelType::Panel => 2,
        }
    }
}

/// Plane across which the solver assumed the geometry symmetric.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Symmetry {
    #[default]
    None,
    X,
    Y,
    Z,
}

impl Symmetry {
    pub(crate) fn from_code(code: i32) -> Result<Self> {
        Ok(match code {
            0 => Symmetry::None,
            1 => Symmetry::X,
            2 => Symmetry::Y,
            3 => Symmetry::Z,
            _ => return Err(Error::BadCode { what: "symmetry", code }),
        })
    }

    pub(crate) fn code(self) -> i32 {
        match self {
            Symmetry::None => 0,
            Symmetry::X => 1,
            Symmetry::Y => 2,
            Symmetry::Z => 3,
        }
    }
}

/// Reference quantities of the run.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Reference {
    pub sref: f32,
    pub cref: f32,
    pub bref: f32,
    pub cg: [f32; 3],
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SurfaceKind {
    Wing,
    Body,
    Cart3d,
}

impl SurfaceKind {
    pub(crate) fn from_code(code: i32) -> Result<Self> {
        Ok(match code {
            1 => SurfaceKind::Wing,
            2 => SurfaceKind::Body,
            3 => SurfaceKind::Cart3d,
            _ => return Err(Error::BadCode { what: "surface kind", code }),
        })
    }

    pub(crate) fn code(self) -> i32 {
        match self {
            SurfaceKind::Wing => 1,
            SurfaceKind::Body => 2,
            SurfaceKind::Cart3d => 3,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Surface {
    pub kind: SurfaceKind,
    pub name: String,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RawNode {
    pub xyz: [f32; 3],
    pub surface_id: i32,
}

/// Triangle as stored on disk. Node indices are not validated by the decoder.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RawTriangle {
    pub nodes: [i32; 3],
    pub surface_id: i32,
    pub surface_type: i32,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PropulsionKind {
    Rotor,
    Nozzle,
}

impl PropulsionKind {
    pub(crate) fn from_code(code: i32) -> Result<Self> {
        Ok(match code {
            1 => PropulsionKind::Rotor,
            2 => PropulsionKind::Nozzle,
            _ => return Err(Error::BadCode { what: "propulsion kind", code }),
        })
    }

    pub(crate) fn code(self) -> i32 {
        match self {
            PropulsionKind::Rotor => 1,
            PropulsionKind::Nozzle => 2,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RawPropulsionElement {
    pub kind: PropulsionKind,
    pub origin: [f32; 3],
    pub normal: [f32; 3],
    pub radius: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RawControlSurface {
    pub name: String,
    pub hinge: [[f32; 3]; 2],
    /// Degrees.
    pub deflection: f32,
    pub outline: Vec<[f32; 3]>,
}

/// The scalar fields a case may carry, in on-disk order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Field {
    Cp,
    CpSteady,
    CpUnsteady,
    Gamma,
}

impl Field {
    pub const ALL: [Field; 4] = [Field::Cp, Field::CpSteady, Field::CpUnsteady, Field::Gamma];

    fn bit(self) -> i32 {
        1 << self as i32
    }
}

/// Set of fields present in a case payload.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldMask(i32);

impl FieldMask {
    pub const ALL: FieldMask = FieldMask(0b1111);

    pub(crate) fn from_code(code: i32) -> Result<Self> {
        if code & !Self::ALL.0 != 0 {
            return Err(Error::BadCode { what: "field mask", code });
        }
        Ok(FieldMask(code))
    }

    pub(crate) fn code(self) -> i32 {
        self.0
    }

    pub fn with(self, field: Field) -> FieldMask {
        FieldMask(self.0 | field.bit())
    }

    pub fn contains(self, field: Field) -> bool {
        self.0 & field.bit() != 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = Field> {
        Field::ALL.into_iter().filter(move |f| self.contains(*f))
    }
}

impl FromIterator<Field> for FieldMask {
    fn from_iter<I: IntoIterator<Item = Field>>(iter: I) -> Self {
        iter.into_iter().fold(FieldMask::default(), FieldMask::with)
    }
}

/// A solved flow condition, without its payload.
#[derive(Clone, Debug, PartialEq)]
pub struct CaseHeader {
    pub mach: f32,
    pub beta: f32,
    pub alpha: f32,
    pub fields: FieldMask,
    pub comment: String,
}

/// Everything stored before the case payloads.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Header {
    pub model_type: ModelType,
    pub symmetry: Symmetry,
    pub reference: Reference,
    pub surfaces: Vec<Surface>,
    pub nodes: Vec<RawNode>,
    pub triangles: Vec<RawTriangle>,
    pub kutta_nodes: Vec<i32>,
    pub wakes: Vec<Vec<[f32; 3]>>,
    pub propulsion: Vec<RawPropulsionElement>,
    pub control_surfaces: Vec<RawControlSurface>,
    pub cases: Vec<CaseHeader>,
}

/// Per-triangle scalar payload of one case.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CaseData {
    fields: [Option<Vec<f32>>; 4],
}

impl CaseData {
    pub fn field(&self, field: Field) -> Option<&[f32]> {
        self.fields[field as usize].as_deref()
    }

    pub fn set_field(&mut self, field: Field, values: Vec<f32>) {
        self.fields[field as usize] = Some(values);
    }

    pub fn take_field(&mut self, field: Field) -> Option<Vec<f32>> {
        self.fields[field as usize].take()
    }

    pub fn mask(&self) -> FieldMask {
        Field::ALL
            .into_iter()
            .filter(|f| self.field(*f).is_some())
            .collect()
    }
}

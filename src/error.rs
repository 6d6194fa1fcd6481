use crate::solution::FieldKind;
use std::fmt;
use std::io;
use std::path::PathBuf;

#[derive(Debug)]
pub enum Error {
    FileNotFound(PathBuf),
    FormatVersionMismatch { found: i32, expected: i32 },
    /// A triangle references a node that does not exist.
    CorruptGeometry {
        triangle: usize,
        node: i64,
        node_count: usize,
    },
    CaseIndexOutOfRange { index: usize, count: usize },
    EmptyScalarField(FieldKind),
    /// A field does not hold one value per triangle.
    FieldLength {
        kind: FieldKind,
        found: usize,
        expected: usize,
    },
    InvalidLegendRange { min: f64, max: f64 },
    /// The operation needs a loaded database.
    NoMesh,
    Format(adb_io::Error),
    Io(io::Error),
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<adb_io::Error> for Error {
    fn from(err: adb_io::Error) -> Error {
        match err {
            adb_io::Error::UnsupportedVersion(found) => Error::FormatVersionMismatch {
                found,
                expected: adb_io::VERSION,
            },
            err => Error::Format(err),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::FileNotFound(path) => write!(f, "file not found: {}", path.display()),
            Error::FormatVersionMismatch { found, expected } => write!(
                f,
                "file format version {} is not supported (expected {})",
                found, expected,
            ),
            Error::CorruptGeometry {
                triangle,
                node,
                node_count,
            } => write!(
                f,
                "triangle #{} references node {} but the mesh has {} nodes",
                triangle, node, node_count,
            ),
            Error::CaseIndexOutOfRange { index, count } => {
                write!(f, "case index {} out of range (0..{})", index, count)
            }
            Error::EmptyScalarField(kind) => write!(f, "the current case has no {} field", kind),
            Error::FieldLength {
                kind,
                found,
                expected,
            } => write!(
                f,
                "{} field has {} values but the mesh has {} triangles",
                kind, found, expected,
            ),
            Error::InvalidLegendRange { min, max } => {
                write!(f, "invalid legend range [{}, {}]", min, max)
            }
            Error::NoMesh => write!(f, "no solution database loaded"),
            Error::Format(err) => write!(f, "malformed solution database: {}", err),
            Error::Io(_) => write!(f, "read error"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Format(err) => Some(err),
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

//! Aerodynamic solution database (ADB) encoder/decoder.
//!
//! An ADB file holds the surface mesh a solver ran on, per-surface metadata,
//! wakes, propulsion elements, control surfaces, and one scalar payload per
//! solved flow condition.
//!
//! Values are stored in the byte order of the machine that wrote the file.
//! Readers on a machine of the other endianness must enable byte swapping,
//! see [`ByteOrder`].

use std::fmt;
use std::io;

mod codec;
mod model;
mod reader;
mod writer;

pub use model::*;
pub use reader::Reader;
pub use writer::write;

/// File magic.
pub const MAGIC: &[u8; 4] = b"VADB";

/// The only file version this crate reads and writes.
pub const VERSION: i32 = 3;

/// Upper bound on string lengths, guards allocations against garbage input.
const MAX_STRING_LEN: usize = 1 << 20;

/// How multi-byte values are laid out in the file relative to the host.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum ByteOrder {
    #[default]
    Native,
    Swapped,
}

impl ByteOrder {
    pub fn from_swap_flag(swap: bool) -> ByteOrder {
        if swap {
            ByteOrder::Swapped
        } else {
            ByteOrder::Native
        }
    }

    pub fn is_swapped(self) -> bool {
        self == ByteOrder::Swapped
    }
}

#[derive(Debug)]
pub enum Error {
    BadHeader,
    UnsupportedVersion(i32),
    BadCount { what: &'static str, count: i64 },
    BadCode { what: &'static str, code: i32 },
    BadString,
    NoSuchCase { index: usize, count: usize },
    Io(io::Error),
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BadHeader => write!(f, "bad file header"),
            Error::UnsupportedVersion(v) => {
                write!(f, "unsupported file version {} (expected {})", v, VERSION)
            }
            Error::BadCount { what, count } => write!(f, "invalid {} count: {}", what, count),
            Error::BadCode { what, code } => write!(f, "invalid {} code: {}", what, code),
            Error::BadString => write!(f, "invalid string"),
            Error::NoSuchCase { index, count } => {
                write!(f, "no case #{} in a file of {} cases", index, count)
            }
            Error::Io(_) => write!(f, "read/write error"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

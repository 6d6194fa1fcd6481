//! Core of a viewer for aerodynamic solution databases (ADB).
//!
//! # Crate Layout
//!
//! A [`Viewer`] owns everything needed to show one database:
//!
//! - the [scene][scene::Scene]: surface [mesh][mesh::Mesh] with its edge
//!   adjacency and coarse preview levels, wakes, propulsion elements and
//!   control surfaces,
//! - the [case index][case::CaseIndex] of solved flow conditions and the
//!   user's [selection][case::CaseSelection] among them,
//! - the [scalar fields][solution::SolutionStore] of the resident case,
//! - the [display configuration][render::RenderConfig], changed through
//!   [commands][command::Command],
//! - a [camera][camera::Camera].
//!
//! [`Viewer::frame`] describes what to draw in a [`render::Frame`], leaving
//! the actual drawing to the caller.
//!
//! The file format itself is handled by the [`adb_io`] crate.

#![warn(
    missing_copy_implementations,
    missing_debug_implementations,
    rust_2018_idioms
)]

pub mod camera;
pub mod case;
pub mod colormap;
pub mod command;
mod error;
pub mod geometry;
pub mod mesh;
pub mod render;
pub mod scene;
pub mod solution;
mod viewer;


pub use crate::error::Error;
pub use crate::error::Result;
pub use crate::viewer::LoadOptions;
pub use crate::viewer::Source;
pub use crate::viewer::Viewer;

pub use adb_io;
pub use nalgebra;

use crate::codec::Encoder;
use crate::model::*;
use crate::ByteOrder;
use crate::Error;
use crate::Result;
use crate::MAGIC;
use crate::VERSION;
use itertools::Itertools as _;
use std::io;

fn invalid_input(msg: &'static str) -> Error {
    Error::Io(io::Error::new(io::ErrorKind::InvalidInput, msg))
}

/// Writes a complete ADB file.
///
/// `cases` must hold one payload per case of `header`, each carrying exactly
/// the fields announced by the case header and one value per triangle.
///
/// Wrapping `w` in a [`std::io::BufWriter`] is recommended.
pub fn write<W>(w: W, header: &Header, cases: &[CaseData], order: ByteOrder) -> Result<()>
where
    W: io::Write,
{
    if header.cases.len() != cases.len() {
        return Err(invalid_input("case header and payload counts differ"));
    }
    if !header.wakes.iter().map(Vec::len).all_equal() {
        return Err(invalid_input("wakes must all have the same point count"));
    }
    if header.wakes.iter().any(Vec::is_empty) {
        return Err(invalid_input("wakes must have at least one point"));
    }
    let triangle_count = header.triangles.len();
    for (case, data) in header.cases.iter().zip(cases) {
        if case.fields != data.mask() {
            return Err(invalid_input("case payload does not match its field mask"));
        }
        if case
            .fields
            .iter()
            .any(|f| data.field(f).map_or(0, <[f32]>::len) != triangle_count)
        {
            return Err(invalid_input("payload length differs from triangle count"));
        }
    }

    let mut e = Encoder::new(w, order);

    e.magic(MAGIC)?;
    e.i32(VERSION)?;
    e.i32(header.model_type.code())?;
    e.i32(header.symmetry.code())?;
    let reference = &header.reference;
    e.f32(reference.sref)?;
    e.f32(reference.cref)?;
    e.f32(reference.bref)?;
    e.xyz(reference.cg)?;

    e.count(header.surfaces.len())?;
    for surface in &header.surfaces {
        e.i32(surface.kind.code())?;
        e.string(&surface.name)?;
    }

    e.count(header.nodes.len())?;
    for node in &header.nodes {
        e.xyz(node.xyz)?;
        e.i32(node.surface_id)?;
    }

    e.count(header.triangles.len())?;
    for triangle in &header.triangles {
        triangle.nodes.iter().try_for_each(|n| e.i32(*n))?;
        e.i32(triangle.surface_id)?;
        e.i32(triangle.surface_type)?;
    }

    e.count(header.kutta_nodes.len())?;
    header.kutta_nodes.iter().try_for_each(|n| e.i32(*n))?;

    e.count(header.wakes.len())?;
    e.count(header.wakes.first().map_or(0, Vec::len))?;
    for point in header.wakes.iter().flatten() {
        e.xyz(*point)?;
    }

    e.count(header.propulsion.len())?;
    for element in &header.propulsion {
        e.i32(element.kind.code())?;
        e.xyz(element.origin)?;
        e.xyz(element.normal)?;
        e.f32(element.radius)?;
    }

    e.count(header.control_surfaces.len())?;
    for surface in &header.control_surfaces {
        e.string(&surface.name)?;
        e.xyz(surface.hinge[0])?;
        e.xyz(surface.hinge[1])?;
        e.f32(surface.deflection)?;
        e.count(surface.outline.len())?;
        for point in &surface.outline {
            e.xyz(*point)?;
        }
    }

    e.count(header.cases.len())?;
    for case in &header.cases {
        e.f32(case.mach)?;
        e.f32(case.beta)?;
        e.f32(case.alpha)?;
        e.i32(case.fields.code())?;
        e.string(&case.comment)?;
    }

    for (case, data) in header.cases.iter().zip(cases) {
        for field in case.fields.iter() {
            e.f32s(data.field(field).unwrap_or_default())?;
        }
    }

    Ok(())
}

use crate::codec::Decoder;
use crate::model::*;
use crate::ByteOrder;
use crate::Error;
use crate::Result;
use crate::MAGIC;
use crate::VERSION;
use std::io;

/// Reads the header of an ADB file eagerly and its case payloads on demand.
///
/// Wrapping the underlying file in a [`std::io::BufReader`] is recommended.
pub struct Reader<R> {
    decoder: Decoder<R>,
    header: Header,
    case_offsets: Vec<u64>,
}

impl<R> Reader<R>
where
    R: io::Read + io::Seek,
{
    pub fn new(mut r: R, order: ByteOrder) -> Result<Self> {
        let start = r.stream_position()?;
        let end = r.seek(io::SeekFrom::End(0))?;
        r.seek(io::SeekFrom::Start(start))?;

        let mut decoder = Decoder::new(r, order);
        let header = read_header(&mut decoder, end)?;

        let triangle_count = header.triangles.len() as u64;
        let mut offset = decoder.get_mut().stream_position()?;
        let case_offsets = header
            .cases
            .iter()
            .map(|case| {
                let start = offset;
                offset += case.fields.len() as u64 * triangle_count * 4;
                start
            })
            .collect();

        Ok(Self {
            decoder,
            header,
            case_offsets,
        })
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn case_count(&self) -> usize {
        self.header.cases.len()
    }

    /// Reads the scalar payload of the given case.
    pub fn read_case(&mut self, index: usize) -> Result<CaseData> {
        let count = self.case_count();
        let (offset, case) = match (self.case_offsets.get(index), self.header.cases.get(index)) {
            (Some(offset), Some(case)) => (*offset, case),
            _ => return Err(Error::NoSuchCase { index, count }),
        };
        let len = self.header.triangles.len();

        self.decoder.get_mut().seek(io::SeekFrom::Start(offset))?;
        let mut data = CaseData::default();
        for field in case.fields.iter() {
            data.set_field(field, self.decoder.f32s(len)?);
        }
        Ok(data)
    }

    pub fn into_header(self) -> Header {
        self.header
    }
}

/// Checks that `count` records of at least `record_size` bytes each fit in
/// what is left of the stream.
fn check_fits<R>(
    d: &mut Decoder<R>,
    end: u64,
    what: &'static str,
    count: usize,
    record_size: u64,
) -> Result<()>
where
    R: io::Read + io::Seek,
{
    let left = end.saturating_sub(d.get_mut().stream_position()?);
    if left < (count as u64).saturating_mul(record_size) {
        return Err(Error::BadCount {
            what,
            count: count as i64,
        });
    }
    Ok(())
}

/// Reads a count of records of at least `record_size` bytes each.
fn count<R>(d: &mut Decoder<R>, end: u64, what: &'static str, record_size: u64) -> Result<usize>
where
    R: io::Read + io::Seek,
{
    let count = d.count(what)?;
    check_fits(d, end, what, count, record_size)?;
    Ok(count)
}

fn read_header<R>(d: &mut Decoder<R>, end: u64) -> Result<Header>
where
    R: io::Read + io::Seek,
{
    if &d.magic()? != MAGIC {
        return Err(Error::BadHeader);
    }
    let version = d.i32()?;
    if version != VERSION {
        return Err(Error::UnsupportedVersion(version));
    }

    let model_type = ModelType::from_code(d.i32()?)?;
    let symmetry = Symmetry::from_code(d.i32()?)?;
    let reference = Reference {
        sref: d.f32()?,
        cref: d.f32()?,
        bref: d.f32()?,
        cg: d.xyz()?,
    };

    let surface_count = count(d, end, "surface", 8)?;
    let surfaces = (0..surface_count)
        .map(|_| -> Result<Surface> {
            Ok(Surface {
                kind: SurfaceKind::from_code(d.i32()?)?,
                name: d.string()?,
            })
        })
        .collect::<Result<_>>()?;

    let node_count = count(d, end, "node", 16)?;
    let nodes = (0..node_count)
        .map(|_| -> Result<RawNode> {
            Ok(RawNode {
                xyz: d.xyz()?,
                surface_id: d.i32()?,
            })
        })
        .collect::<Result<_>>()?;

    let triangle_count = count(d, end, "triangle", 20)?;
    let triangles = (0..triangle_count)
        .map(|_| -> Result<RawTriangle> {
            Ok(RawTriangle {
                nodes: [d.i32()?, d.i32()?, d.i32()?],
                surface_id: d.i32()?,
                surface_type: d.i32()?,
            })
        })
        .collect::<Result<_>>()?;

    let kutta_count = count(d, end, "kutta node", 4)?;
    let kutta_nodes = (0..kutta_count).map(|_| d.i32()).collect::<Result<_>>()?;

    let wake_count = d.count("wake")?;
    let wake_len = count(d, end, "wake point", 12)?;
    if 0 < wake_count && wake_len == 0 {
        return Err(Error::BadCount {
            what: "wake point",
            count: 0,
        });
    }
    check_fits(d, end, "wake", wake_count, wake_len as u64 * 12)?;
    let wakes = (0..wake_count)
        .map(|_| (0..wake_len).map(|_| d.xyz()).collect::<Result<_>>())
        .collect::<Result<_>>()?;

    let propulsion_count = count(d, end, "propulsion element", 32)?;
    let propulsion = (0..propulsion_count)
        .map(|_| -> Result<RawPropulsionElement> {
            Ok(RawPropulsionElement {
                kind: PropulsionKind::from_code(d.i32()?)?,
                origin: d.xyz()?,
                normal: d.xyz()?,
                radius: d.f32()?,
            })
        })
        .collect::<Result<_>>()?;

    let control_surface_count = count(d, end, "control surface", 36)?;
    let control_surfaces = (0..control_surface_count)
        .map(|_| -> Result<RawControlSurface> {
            let name = d.string()?;
            let hinge = [d.xyz()?, d.xyz()?];
            let deflection = d.f32()?;
            let point_count = count(d, end, "control surface point", 12)?;
            let outline = (0..point_count).map(|_| d.xyz()).collect::<Result<_>>()?;
            Ok(RawControlSurface {
                name,
                hinge,
                deflection,
                outline,
            })
        })
        .collect::<Result<_>>()?;

    let case_count = count(d, end, "case", 20)?;
    let cases = (0..case_count)
        .map(|_| -> Result<CaseHeader> {
            Ok(CaseHeader {
                mach: d.f32()?,
                beta: d.f32()?,
                alpha: d.f32()?,
                fields: FieldMask::from_code(d.i32()?)?,
                comment: d.string()?,
            })
        })
        .collect::<Result<_>>()?;

    Ok(Header {
        model_type,
        symmetry,
        reference,
        surfaces,
        nodes,
        triangles,
        kutta_nodes,
        wakes,
        propulsion,
        control_surfaces,
        cases,
    })
}

use adb_io::ByteOrder;
use adbview::case::Axis;
use adbview::solution::FieldKind;
use adbview::LoadOptions;
use adbview::Viewer;
use anyhow::Context as _;
use anyhow::Result;
use itertools::Itertools as _;
use std::env;
use std::io;
use std::io::Write as _;

const USAGE: &str = "Usage: adb-info [options] in.adb";

fn print_info<W>(mut w: W, viewer: &Viewer) -> Result<()>
where
    W: io::Write,
{
    let scene = viewer.scene().context("no database loaded")?;
    let mesh = &scene.mesh;
    let cases = viewer.cases().context("no database loaded")?;

    writeln!(
        w,
        "model:      {:?}, symmetry {:?}",
        scene.model_type, scene.symmetry
    )?;
    let r = &scene.reference;
    writeln!(
        w,
        "reference:  Sref {} Cref {} Bref {} CG ({}, {}, {})",
        r.sref, r.cref, r.bref, r.cg[0], r.cg[1], r.cg[2],
    )?;
    for (i, surface) in scene.surfaces.iter().enumerate() {
        writeln!(
            w,
            "surface {}:  {:?} {:?}",
            i + 1,
            surface.kind,
            surface.name
        )?;
    }
    writeln!(
        w,
        "mesh:       {} nodes, {} triangles, {} edges ({} boundary, {} Kutta)",
        mesh.node_count(),
        mesh.triangle_count(),
        mesh.edges().len(),
        mesh.boundary_edges().count(),
        mesh.kutta_edges().count(),
    )?;
    if let Some(bb) = mesh.bounding_box() {
        writeln!(
            w,
            "bounds:     ({:.4}, {:.4}, {:.4}) to ({:.4}, {:.4}, {:.4})",
            bb.p_min.x, bb.p_min.y, bb.p_min.z, bb.p_max.x, bb.p_max.y, bb.p_max.z,
        )?;
    }
    for level in mesh.coarse_levels() {
        writeln!(
            w,
            "level {}:    {} nodes, {} edges",
            level.level,
            level.nodes.len(),
            level.edges.len(),
        )?;
    }
    writeln!(
        w,
        "extras:     {} wakes, {} propulsion elements, {} control surfaces",
        scene.wakes.len(),
        scene.propulsion.len(),
        scene.control_surfaces.len(),
    )?;

    for axis in Axis::ALL {
        let values = cases.values(axis).iter().format(", ");
        writeln!(w, "{:<11} {}", format!("{}:", axis), values)?;
    }
    writeln!(w, "cases:")?;
    for (i, case) in cases.cases().iter().enumerate() {
        writeln!(
            w,
            "  #{:<4} Mach {:<8} Beta {:<8} Alpha {:<8} {}",
            i, case.mach, case.beta, case.alpha, case.comment,
        )?;
    }

    if let Some(case) = viewer.current_case() {
        writeln!(w, "case #{}:", case)?;
        for kind in FieldKind::ALL {
            match viewer.scalar_field(kind) {
                Ok(field) => writeln!(
                    w,
                    "  {:<14} min {:<12.6} max {:<12.6}",
                    kind.to_string(),
                    field.actual.min,
                    field.actual.max,
                )?,
                Err(_) => writeln!(w, "  {:<14} absent", kind.to_string())?,
            }
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    let mut options = getopts::Options::new();
    options.optflag("h", "help", "print this help menu");
    options.optopt("c", "case", "show the field ranges of this case", "INDEX");
    options.optopt(
        "k",
        "coarse-levels",
        "number of coarse levels to build",
        "COUNT",
    );
    options.optflag("", "swap", "read a file written in the opposite byte order");

    let matches = options.parse(env::args().skip(1))?;

    if matches.opt_present("h") {
        eprintln!("{}", options.usage(USAGE));
        return Ok(());
    }
    let path = match matches.free.as_slice() {
        [path] => path,
        _ => anyhow::bail!(
            "expected exactly one input file\n\n{}",
            options.usage(USAGE)
        ),
    };

    adbview_tools::set_up_logging();

    let mut load_options = LoadOptions {
        byte_order: ByteOrder::from_swap_flag(matches.opt_present("swap")),
        ..LoadOptions::default()
    };
    if let Some(levels) = matches.opt_str("k") {
        load_options.coarse_levels = levels.parse().context("invalid coarse level count")?;
    }

    let mut viewer = adbview_tools::load(path, load_options)?;
    if let Some(case) = matches.opt_str("c") {
        let case = case.parse().context("invalid case index")?;
        viewer.load_case(case).context("failed to load case")?;
    }

    let stdout = io::stdout();
    let mut stdout = io::BufWriter::new(stdout.lock());
    print_info(&mut stdout, &viewer)?;
    stdout.flush()?;

    Ok(())
}

use adb_io::ByteOrder;
use adbview::camera::Camera;
use adbview::case::Axis;
use adbview::command::Command;
use adbview::render::Frame;
use adbview::render::Legend;
use adbview::LoadOptions;
use anyhow::Context as _;
use anyhow::Result;
use itertools::Itertools as _;
use std::env;
use std::io;
use std::io::Write as _;

const USAGE: &str = "Usage: adb-svg [options] in.adb [out.svg] >out.svg";

const LEGEND_STEPS: usize = 32;
const AMBIENT: f32 = 0.3;

/// Escapes text taken from the database before it goes into the SVG.
fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            c => escaped.push(c),
        }
    }
    escaped
}

fn write_legend<W>(mut w: W, legend: &Legend, frame: &Frame, width: f64, height: f64) -> Result<()>
where
    W: io::Write,
{
    let bar_width = 20.0;
    let bar_height = height * 0.6;
    let x = width - bar_width - 60.0;
    let top = (height - bar_height) / 2.0;
    let step = bar_height / LEGEND_STEPS as f64;
    let foreground = frame.foreground.to_hex();

    // Top of the bar is the maximum.
    let ramp = legend.color_map.ramp(LEGEND_STEPS);
    for (i, color) in ramp.iter().rev().enumerate() {
        writeln!(
            w,
            r#"<rect x="{x}" y="{}" width="{bar_width}" height="{}" fill="{}"/>"#,
            top + i as f64 * step,
            step + 0.5,
            color.to_hex(),
        )?;
    }
    let text_x = x + bar_width + 5.0;
    writeln!(
        w,
        r#"<text x="{x}" y="{}" fill="{foreground}" font-size="14">{}</text>"#,
        top - 10.0,
        escape(&legend.title),
    )?;
    writeln!(
        w,
        r#"<text x="{text_x}" y="{}" fill="{foreground}" font-size="12">{:.4}</text>"#,
        top + 12.0,
        legend.range.max,
    )?;
    writeln!(
        w,
        r#"<text x="{text_x}" y="{}" fill="{foreground}" font-size="12">{:.4}</text>"#,
        top + bar_height,
        legend.range.min,
    )?;
    Ok(())
}

fn write_svg<W>(mut w: W, frame: &Frame, camera: &Camera, width: f64, height: f64) -> Result<()>
where
    W: io::Write,
{
    writeln!(
        w,
        r#"<svg viewBox="0 0 {width} {height}" xmlns="http://www.w3.org/2000/svg">"#,
    )?;
    writeln!(
        w,
        r#"<rect width="100%" height="100%" fill="{}"/>"#,
        frame.background.to_hex(),
    )?;

    let mut triangles: Vec<_> = frame
        .triangles
        .iter()
        .map(|t| {
            let corners = t.corners.map(|p| camera.project(&p, width, height));
            let depth = corners.iter().map(|c| c.depth).sum::<f64>() / 3.0;
            (t, corners, depth)
        })
        .collect();
    triangles.sort_by(|(_, _, a), (_, _, b)| a.total_cmp(b));

    for (t, corners, _) in triangles {
        let normal = t.normals.iter().sum::<adbview::geometry::Vector>();
        let facing = (camera.rotation * normal)
            .try_normalize(f64::EPSILON)
            .map_or(1.0, |n| n.z.abs() as f32);
        let color = t.colors.iter().fold([0.0; 3], |mut acc, c| {
            for (a, v) in acc.iter_mut().zip(c.0) {
                *a += v / 3.0;
            }
            acc
        });
        let color = adbview::colormap::Rgb(color)
            .scale(AMBIENT + (1.0 - AMBIENT) * facing);
        writeln!(
            w,
            r#"<polygon points="{}" fill="{hex}" stroke="{hex}" stroke-width="0.2"/>"#,
            corners
                .iter()
                .map(|c| format!("{:.2},{:.2}", c.x, c.y))
                .join(" "),
            hex = color.to_hex(),
        )?;
    }

    for line in &frame.lines {
        let points = line
            .points
            .iter()
            .map(|p| camera.project(p, width, height))
            .map(|c| format!("{:.2},{:.2}", c.x, c.y))
            .join(" ");
        writeln!(
            w,
            r#"<polyline points="{points}" fill="none" stroke="{}" stroke-width="1"/>"#,
            line.color.to_hex(),
        )?;
    }

    for node in &frame.coarse_nodes {
        let c = camera.project(node, width, height);
        writeln!(
            w,
            r#"<circle cx="{:.2}" cy="{:.2}" r="1.5" fill="{}"/>"#,
            c.x,
            c.y,
            frame.foreground.to_hex(),
        )?;
    }

    if let Some(cg) = frame.cg {
        let c = camera.project(&cg, width, height);
        writeln!(
            w,
            r#"<circle cx="{:.2}" cy="{:.2}" r="4" fill="{}"/>"#,
            c.x,
            c.y,
            frame.foreground.to_hex(),
        )?;
    }

    if let Some(legend) = &frame.legend {
        write_legend(&mut w, legend, frame, width, height)?;
    }
    if let Some(label) = &frame.label {
        writeln!(
            w,
            r#"<text x="10" y="{}" fill="{}" font-size="14">{}</text>"#,
            height - 10.0,
            frame.foreground.to_hex(),
            escape(label),
        )?;
    }

    writeln!(w, "</svg>")?;
    Ok(())
}

fn main() -> Result<()> {
    let mut options = getopts::Options::new();
    options.optflag("h", "help", "print this help menu");
    options.optmulti(
        "c",
        "command",
        "display command, eg. \"mode cp\", \"toggle wireframe\" or \"view top\"",
        "COMMAND",
    );
    options.optopt("", "case", "index of the case to display", "INDEX");
    options.optopt("", "mach", "Mach number of the case to display", "VALUE");
    options.optopt("", "beta", "sideslip angle of the case to display", "VALUE");
    options.optopt(
        "",
        "alpha",
        "angle of attack of the case to display",
        "VALUE",
    );
    options.optopt("W", "width", "width of the image (default: 800)", "PIXELS");
    options.optopt(
        "H",
        "height",
        "height of the image (default: 600)",
        "PIXELS",
    );
    options.optflag("", "swap", "read a file written in the opposite byte order");

    let matches = options.parse(env::args().skip(1))?;

    if matches.opt_present("h") {
        eprintln!("{}", options.usage(USAGE));
        return Ok(());
    }
    let (input, output) = match matches.free.as_slice() {
        [input] => (input, None),
        [input, output] => (input, Some(output)),
        _ => anyhow::bail!("expected an input file\n\n{}", options.usage(USAGE)),
    };

    let width: f64 = match matches.opt_str("W") {
        Some(w) => w.parse().context("invalid width")?,
        None => 800.0,
    };
    let height: f64 = match matches.opt_str("H") {
        Some(h) => h.parse().context("invalid height")?,
        None => 600.0,
    };

    adbview_tools::set_up_logging();

    let load_options = LoadOptions {
        byte_order: ByteOrder::from_swap_flag(matches.opt_present("swap")),
        ..LoadOptions::default()
    };
    let mut viewer = adbview_tools::load(input, load_options)?;

    if let Some(case) = matches.opt_str("case") {
        let case = case.parse().context("invalid case index")?;
        viewer.load_case(case).context("failed to load case")?;
    }
    let mut typed = false;
    for (axis, name) in Axis::ALL.into_iter().zip(["mach", "beta", "alpha"]) {
        if let Some(value) = matches.opt_str(name) {
            let value = value
                .parse()
                .with_context(|| format!("invalid value for --{}", name))?;
            viewer.type_value(axis, value);
            typed = true;
        }
    }
    if typed && viewer.reload_selection()?.is_none() {
        tracing::warn!(
            "no case matches the requested conditions, keeping the current one"
        );
    }

    for command in matches.opt_strs("c") {
        let command: Command = command.parse()?;
        viewer.apply(command);
    }

    let frame = viewer.frame()?;
    if let Some(kind) = frame.unavailable {
        tracing::warn!(%kind, "field is not available for this case");
    }

    let mut output = adbview_tools::writer(output)?;
    write_svg(&mut output, &frame, viewer.camera(), width, height)?;
    output.flush()?;

    Ok(())
}

use adb_io::ByteOrder;
use adbview_tools::WingSpec;
use anyhow::Context as _;
use anyhow::Result;
use std::env;
use std::io::Write as _;
use std::str::FromStr;

const USAGE: &str = "Usage: adb-gen [options] [out.adb] >out.adb";

fn parse_opt<T>(matches: &getopts::Matches, name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    Ok(match matches.opt_str(name) {
        Some(v) => v
            .parse()
            .with_context(|| format!("invalid value {:?} for option {:?}", v, name))?,
        None => default,
    })
}

fn parse_list(matches: &getopts::Matches, name: &str, default: Vec<f32>) -> Result<Vec<f32>> {
    match matches.opt_str(name) {
        Some(list) => list
            .split(',')
            .map(|v| {
                v.trim()
                    .parse()
                    .with_context(|| format!("invalid value {:?} for option {:?}", v, name))
            })
            .collect(),
        None => Ok(default),
    }
}

fn main() -> Result<()> {
    let mut options = getopts::Options::new();
    options.optflag("h", "help", "print this help menu");
    options.optopt("s", "span", "full wing span", "LENGTH");
    options.optopt("r", "root-chord", "chord at the root", "LENGTH");
    options.optopt("t", "tip-chord", "chord at the tip", "LENGTH");
    options.optopt("", "sweep", "leading edge sweep, in degrees", "ANGLE");
    options.optopt(
        "c",
        "chordwise",
        "number of panels along the chord",
        "COUNT",
    );
    options.optopt(
        "n",
        "spanwise",
        "number of panels along the half span",
        "COUNT",
    );
    options.optopt("m", "machs", "comma-separated Mach numbers", "LIST");
    options.optopt("a", "alphas", "comma-separated angles of attack", "LIST");
    options.optflag("", "no-rotor", "do not add a rotor");
    options.optflag("", "swap", "write in the opposite byte order");

    let matches = options.parse(env::args().skip(1))?;

    if matches.opt_present("h") {
        eprintln!("{}", options.usage(USAGE));
        return Ok(());
    }
    if matches.free.len() > 1 {
        anyhow::bail!("too many arguments\n\n{}", options.usage(USAGE));
    }

    adbview_tools::set_up_logging();

    let default = WingSpec::default();
    let spec = WingSpec {
        span: parse_opt(&matches, "s", default.span)?,
        root_chord: parse_opt(&matches, "r", default.root_chord)?,
        tip_chord: parse_opt(&matches, "t", default.tip_chord)?,
        sweep: parse_opt(&matches, "sweep", default.sweep)?,
        chordwise: parse_opt(&matches, "c", default.chordwise)?,
        spanwise: parse_opt(&matches, "n", default.spanwise)?,
        machs: parse_list(&matches, "m", default.machs)?,
        alphas: parse_list(&matches, "a", default.alphas)?,
        rotor: !matches.opt_present("no-rotor"),
    };
    let order = ByteOrder::from_swap_flag(matches.opt_present("swap"));

    let (header, cases) = adbview_tools::wing(&spec);
    tracing::info!(
        node_count = header.nodes.len(),
        triangle_count = header.triangles.len(),
        case_count = cases.len(),
        "generated wing"
    );

    let mut output = adbview_tools::writer(matches.free.first())?;
    adb_io::write(&mut output, &header, &cases, order).context("failed to write database")?;
    output.flush().context("failed to write database")?;

    Ok(())
}

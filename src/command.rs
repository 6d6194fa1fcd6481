//! User actions on the display.
//!
//! Each [`Command`] is a pure transition of [`RenderConfig`]. Commands also
//! have a one-line text form so that they can be scripted:
//!
//! ```text
//! mode cp             # shaded, cp, cp-steady, cp-unsteady, gamma
//! shading smooth      # flat, smooth
//! colormap coolwarm   # rainbow, coolwarm, grayscale
//! toggle wakes        # also: show wakes, hide wakes
//! coarse 2            # coarse off
//! plane y             # x, y, z, off
//! view top            # top, bottom, left, right, front, rear, iso-up, iso-down, reset
//! reset
//! ```

use crate::camera::View;
use crate::colormap::ColorMap;
use crate::render::DisplayMode;
use crate::render::PlaneAxis;
use crate::render::RenderConfig;
use crate::solution::FieldKind;
use crate::solution::Shading;
use std::fmt;
use std::str::FromStr;

/// On/off display options.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Flag {
    Wireframe,
    Legend,
    Label,
    WhiteBackground,
    Cg,
    Axes,
    Wakes,
    WakesToInfinity,
    Propulsion,
    ControlSurfaces,
    DeflectedControlSurfaces,
    Reflected,
    SwapNormals,
}

impl Flag {
    pub const ALL: [Flag; 13] = [
        Flag::Wireframe,
        Flag::Legend,
        Flag::Label,
        Flag::WhiteBackground,
        Flag::Cg,
        Flag::Axes,
        Flag::Wakes,
        Flag::WakesToInfinity,
        Flag::Propulsion,
        Flag::ControlSurfaces,
        Flag::DeflectedControlSurfaces,
        Flag::Reflected,
        Flag::SwapNormals,
    ];

    fn name(self) -> &'static str {
        match self {
            Flag::Wireframe => "wireframe",
            Flag::Legend => "legend",
            Flag::Label => "label",
            Flag::WhiteBackground => "white-background",
            Flag::Cg => "cg",
            Flag::Axes => "axes",
            Flag::Wakes => "wakes",
            Flag::WakesToInfinity => "wakes-to-infinity",
            Flag::Propulsion => "propulsion",
            Flag::ControlSurfaces => "control-surfaces",
            Flag::DeflectedControlSurfaces => "deflected-control-surfaces",
            Flag::Reflected => "reflected",
            Flag::SwapNormals => "swap-normals",
        }
    }

    fn slot(self, config: &mut RenderConfig) -> &mut bool {
        match self {
            Flag::Wireframe => &mut config.wireframe,
            Flag::Legend => &mut config.legend,
            Flag::Label => &mut config.label,
            Flag::WhiteBackground => &mut config.white_background,
            Flag::Cg => &mut config.cg,
            Flag::Axes => &mut config.axes,
            Flag::Wakes => &mut config.wakes,
            Flag::WakesToInfinity => &mut config.wakes_to_infinity,
            Flag::Propulsion => &mut config.propulsion,
            Flag::ControlSurfaces => &mut config.control_surfaces,
            Flag::DeflectedControlSurfaces => &mut config.deflected_control_surfaces,
            Flag::Reflected => &mut config.reflected,
            Flag::SwapNormals => &mut config.swap_normals,
        }
    }

    pub fn get(self, config: &RenderConfig) -> bool {
        let mut config = *config;
        *self.slot(&mut config)
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Command {
    Mode(DisplayMode),
    Shading(Shading),
    ColorMap(ColorMap),
    Toggle(Flag),
    Set(Flag, bool),
    Coarse(Option<usize>),
    CuttingPlane(Option<PlaneAxis>),
    /// Camera orientation. Leaves the configuration untouched.
    View(View),
    /// Camera back to its home position. Leaves the configuration untouched.
    ResetView,
    /// Back to the default configuration.
    Reset,
}

impl RenderConfig {
    pub fn apply(self, command: Command) -> RenderConfig {
        let mut next = self;
        match command {
            Command::Mode(mode) => next.mode = mode,
            Command::Shading(shading) => next.shading = shading,
            Command::ColorMap(color_map) => next.color_map = color_map,
            Command::Toggle(flag) => {
                let slot = flag.slot(&mut next);
                *slot = !*slot;
            }
            Command::Set(flag, on) => *flag.slot(&mut next) = on,
            Command::Coarse(level) => next.coarse_level = level.filter(|l| *l != 0),
            Command::CuttingPlane(axis) => next.cutting_plane = axis,
            Command::View(_) | Command::ResetView => {}
            Command::Reset => next = RenderConfig::default(),
        }
        next
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseError {
    pub input: String,
    pub reason: String,
}

impl ParseError {
    fn new(input: &str, reason: impl Into<String>) -> Self {
        Self {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.input, self.reason)
    }
}

impl std::error::Error for ParseError {}

fn parse_mode(s: &str) -> Option<DisplayMode> {
    Some(match s {
        "shaded" => DisplayMode::Shaded,
        "cp" => DisplayMode::Field(FieldKind::Cp),
        "cp-steady" => DisplayMode::Field(FieldKind::CpSteady),
        "cp-unsteady" => DisplayMode::Field(FieldKind::CpUnsteady),
        "gamma" => DisplayMode::Field(FieldKind::Gamma),
        _ => return None,
    })
}

fn parse_flag(s: &str) -> Option<Flag> {
    Flag::ALL.into_iter().find(|f| f.name() == s)
}

fn parse_plane(s: &str) -> Option<Option<PlaneAxis>> {
    Some(match s {
        "x" => Some(PlaneAxis::X),
        "y" => Some(PlaneAxis::Y),
        "z" => Some(PlaneAxis::Z),
        "off" | "none" => None,
        _ => return None,
    })
}

impl FromStr for Command {
    type Err = ParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let words: Vec<&str> = input.split_whitespace().collect();
        let (verb, arg) = match words.as_slice() {
            [verb] => (*verb, None),
            [verb, arg] => (*verb, Some(*arg)),
            [] => return Err(ParseError::new(input, "empty command")),
            _ => return Err(ParseError::new(input, "too many words")),
        };
        let arg = |what: &str| {
            arg.ok_or_else(|| ParseError::new(input, format!("missing {}", what)))
        };
        let invalid = |what: &str| ParseError::new(input, format!("invalid {}", what));

        Ok(match verb {
            "mode" => Command::Mode(parse_mode(arg("mode")?).ok_or_else(|| invalid("mode"))?),
            "shading" => Command::Shading(match arg("shading")? {
                "flat" => Shading::Flat,
                "smooth" => Shading::Smooth,
                _ => return Err(invalid("shading")),
            }),
            "colormap" => {
                let name = arg("color map")?;
                Command::ColorMap(name.parse().map_err(|_| invalid("color map"))?)
            }
            "toggle" | "show" | "hide" => {
                let flag = parse_flag(arg("option")?).ok_or_else(|| invalid("option"))?;
                match verb {
                    "show" => Command::Set(flag, true),
                    "hide" => Command::Set(flag, false),
                    _ => Command::Toggle(flag),
                }
            }
            "coarse" => Command::Coarse(match arg("level")? {
                "off" => None,
                level => Some(level.parse().map_err(|_| invalid("level"))?),
            }),
            "plane" => {
                Command::CuttingPlane(parse_plane(arg("plane")?).ok_or_else(|| invalid("plane"))?)
            }
            "view" => match arg("view")? {
                "reset" => Command::ResetView,
                view => Command::View(view.parse().map_err(|_| invalid("view"))?),
            },
            "reset" if words.len() == 1 => Command::Reset,
            _ => return Err(ParseError::new(input, "unknown command")),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> Command {
        s.parse().unwrap()
    }

    #[test]
    fn parsing() {
        assert_eq!(
            parse("mode cp"),
            Command::Mode(DisplayMode::Field(FieldKind::Cp))
        );
        assert_eq!(parse("mode shaded"), Command::Mode(DisplayMode::Shaded));
        assert_eq!(parse("  toggle   wakes "), Command::Toggle(Flag::Wakes));
        assert_eq!(parse("hide legend"), Command::Set(Flag::Legend, false));
        assert_eq!(parse("shading smooth"), Command::Shading(Shading::Smooth));
        assert_eq!(
            parse("colormap coolwarm"),
            Command::ColorMap(ColorMap::CoolWarm)
        );
        assert_eq!(parse("coarse 2"), Command::Coarse(Some(2)));
        assert_eq!(parse("coarse off"), Command::Coarse(None));
        assert_eq!(parse("plane y"), Command::CuttingPlane(Some(PlaneAxis::Y)));
        assert_eq!(parse("view iso-down"), Command::View(View::IsoDown));
        assert_eq!(parse("view reset"), Command::ResetView);
        assert_eq!(parse("reset"), Command::Reset);

        let bad_commands = [
            "",
            "mode",
            "mode pressure",
            "toggle nothing",
            "coarse -1",
            "plane w",
            "fly away",
            "mode cp now",
        ];
        for bad in bad_commands {
            assert!(bad.parse::<Command>().is_err(), "{bad:?} should not parse");
        }
        for flag in Flag::ALL {
            assert_eq!(parse(&format!("toggle {}", flag)), Command::Toggle(flag));
        }
    }

    #[test]
    fn apply_is_pure() {
        let config = RenderConfig::default();
        let next = config.apply(Command::Toggle(Flag::Wakes));
        assert!(!config.wakes);
        assert!(next.wakes);
        assert!(!next.apply(Command::Toggle(Flag::Wakes)).wakes);
        assert!(Flag::Wakes.get(&next));

        let next = next.apply(Command::Set(Flag::Wakes, true));
        assert!(next.wakes);
        assert_eq!(next.apply(Command::View(View::Top)), next);
        assert_eq!(next.apply(Command::Reset), RenderConfig::default());
    }

    #[test]
    fn cutting_planes_are_exclusive() {
        let config = RenderConfig::default()
            .apply(Command::CuttingPlane(Some(PlaneAxis::X)))
            .apply(Command::CuttingPlane(Some(PlaneAxis::Z)));
        assert_eq!(config.cutting_plane, Some(PlaneAxis::Z));
        assert_eq!(
            config.apply(Command::CuttingPlane(None)).cutting_plane,
            None
        );
    }

    #[test]
    fn coarse_zero_is_fine_mesh() {
        let config = RenderConfig::default().apply(Command::Coarse(Some(0)));
        assert_eq!(config.coarse_level, None);
    }
}

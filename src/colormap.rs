//! Mapping of scalar values to colors.

use std::fmt;
use std::str::FromStr;

/// Linear RGB color, each channel in `[0, 1]`.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Rgb(pub [f32; 3]);

impl Rgb {
    pub const BLACK: Rgb = Rgb([0.0, 0.0, 0.0]);
    pub const WHITE: Rgb = Rgb([1.0, 1.0, 1.0]);

    pub fn r(self) -> f32 {
        self.0[0]
    }

    pub fn g(self) -> f32 {
        self.0[1]
    }

    pub fn b(self) -> f32 {
        self.0[2]
    }

    fn lerp(self, other: Rgb, t: f32) -> Rgb {
        let mut out = [0.0; 3];
        for ((o, a), b) in out.iter_mut().zip(self.0).zip(other.0) {
            *o = a + (b - a) * t;
        }
        Rgb(out)
    }

    /// Multiplies every channel by `factor`, clamped to `[0, 1]`.
    pub fn scale(self, factor: f32) -> Rgb {
        Rgb(self.0.map(|c| (c * factor).clamp(0.0, 1.0)))
    }

    /// `#rrggbb` form, as used by SVG and HTML.
    pub fn to_hex(self) -> String {
        let [r, g, b] = self.0.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8);
        format!("#{:02x}{:02x}{:02x}", r, g, b)
    }
}

const RAINBOW: [Rgb; 5] = [
    Rgb([0.0, 0.0, 1.0]),
    Rgb([0.0, 1.0, 1.0]),
    Rgb([0.0, 1.0, 0.0]),
    Rgb([1.0, 1.0, 0.0]),
    Rgb([1.0, 0.0, 0.0]),
];

const COOL_WARM: [Rgb; 3] = [
    Rgb([0.230, 0.299, 0.754]),
    Rgb([0.865, 0.865, 0.865]),
    Rgb([0.706, 0.016, 0.150]),
];

const GRAYSCALE: [Rgb; 2] = [Rgb([0.0, 0.0, 0.0]), Rgb([1.0, 1.0, 1.0])];

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum ColorMap {
    /// Blue, cyan, green, yellow, red.
    #[default]
    Rainbow,
    /// Diverging blue to red through light gray.
    CoolWarm,
    Grayscale,
}

impl ColorMap {
    pub const ALL: [ColorMap; 3] = [ColorMap::Rainbow, ColorMap::CoolWarm, ColorMap::Grayscale];

    fn control_points(self) -> &'static [Rgb] {
        match self {
            ColorMap::Rainbow => &RAINBOW,
            ColorMap::CoolWarm => &COOL_WARM,
            ColorMap::Grayscale => &GRAYSCALE,
        }
    }

    /// Color at `t` in `[0, 1]` along the map.
    fn at(self, t: f64) -> Rgb {
        let points = self.control_points();
        let segments = points.len() - 1;
        let t = t.clamp(0.0, 1.0) * segments as f64;
        let i = usize::min(t.floor() as usize, segments - 1);
        points[i].lerp(points[i + 1], (t - i as f64) as f32)
    }

    /// Maps `value` to a color, `min` and `max` giving the ends of the map.
    ///
    /// Values outside the range saturate. An empty or non-finite range gives
    /// the middle color, a NaN value the low end.
    pub fn map(self, value: f64, min: f64, max: f64) -> Rgb {
        if !min.is_finite() || !max.is_finite() || max <= min {
            return self.at(0.5);
        }
        if value.is_nan() || value <= min {
            return self.at(0.0);
        }
        if max <= value {
            return self.at(1.0);
        }
        self.at((value - min) / (max - min))
    }

    /// `count` colors evenly spread from the low to the high end, for legends.
    pub fn ramp(self, count: usize) -> Vec<Rgb> {
        match count {
            0 => Vec::new(),
            1 => vec![self.at(0.5)],
            _ => (0..count)
                .map(|i| self.at(i as f64 / (count - 1) as f64))
                .collect(),
        }
    }
}

impl fmt::Display for ColorMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ColorMap::Rainbow => "rainbow",
            ColorMap::CoolWarm => "coolwarm",
            ColorMap::Grayscale => "grayscale",
        })
    }
}

impl FromStr for ColorMap {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "rainbow" => ColorMap::Rainbow,
            "coolwarm" | "cool-warm" => ColorMap::CoolWarm,
            "grayscale" | "greyscale" | "gray" | "grey" => ColorMap::Grayscale,
            _ => return Err(format!("unknown color map: {}", s)),
        })
    }
}

const PALETTE: [Rgb; 8] = [
    Rgb([0.80, 0.80, 0.80]),
    Rgb([0.55, 0.71, 0.94]),
    Rgb([0.95, 0.65, 0.45]),
    Rgb([0.60, 0.85, 0.55]),
    Rgb([0.90, 0.55, 0.75]),
    Rgb([0.95, 0.90, 0.50]),
    Rgb([0.60, 0.85, 0.90]),
    Rgb([0.75, 0.65, 0.90]),
];

/// Color of a surface region, cycling through a fixed palette.
pub fn surface_color(surface_id: i32) -> Rgb {
    PALETTE[surface_id.rem_euclid(PALETTE.len() as i32) as usize]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_ulps_eq;
    use proptest::prelude::*;

    #[test]
    fn rainbow_control_points() {
        let map = ColorMap::Rainbow;
        assert_eq!(map.map(0.0, 0.0, 4.0), RAINBOW[0]);
        assert_eq!(map.map(1.0, 0.0, 4.0), RAINBOW[1]);
        assert_eq!(map.map(2.0, 0.0, 4.0), RAINBOW[2]);
        assert_eq!(map.map(4.0, 0.0, 4.0), RAINBOW[4]);
        assert_eq!(map.map(-7.0, 0.0, 4.0), RAINBOW[0]);
        assert_eq!(map.map(9.0, 0.0, 4.0), RAINBOW[4]);

        let between = map.map(0.5, 0.0, 4.0);
        assert_ulps_eq!(between.g(), 0.5);
        assert_ulps_eq!(between.b(), 1.0);
    }

    #[test]
    fn degenerate_ranges() {
        for map in ColorMap::ALL {
            let middle = map.at(0.5);
            assert_eq!(map.map(1.0, 1.0, 1.0), middle);
            assert_eq!(map.map(1.0, 2.0, 1.0), middle);
            assert_eq!(map.map(1.0, f64::NAN, 1.0), middle);
            assert_eq!(map.map(1.0, 0.0, f64::INFINITY), middle);
            assert_eq!(map.map(f64::NAN, 0.0, 1.0), map.at(0.0));
        }
    }

    #[test]
    fn hex() {
        assert_eq!(Rgb::WHITE.to_hex(), "#ffffff");
        assert_eq!(Rgb([1.0, 0.5, 0.0]).to_hex(), "#ff8000");
        assert_eq!(Rgb([2.0, -1.0, 0.0]).to_hex(), "#ff0000");
    }

    #[test]
    fn names() {
        for map in ColorMap::ALL {
            assert_eq!(map.to_string().parse::<ColorMap>(), Ok(map));
        }
        assert!("viridis".parse::<ColorMap>().is_err());
    }

    #[test]
    fn surface_palette() {
        assert_eq!(surface_color(3), surface_color(3 + PALETTE.len() as i32));
        assert_eq!(surface_color(-1), PALETTE[PALETTE.len() - 1]);
        assert_ne!(surface_color(1), surface_color(2));
    }

    proptest!(
        #[test]
        fn channels_stay_in_unit_range(
            value in proptest::num::f64::ANY,
            min in -1e6..1e6f64,
            width in 0.0..1e6f64,
        ) {
            for map in ColorMap::ALL {
                let color = map.map(value, min, min + width);
                prop_assert_eq!(color, map.map(value, min, min + width));
                for c in color.0 {
                    prop_assert!((0.0..=1.0).contains(&c));
                }
            }
        }
    );
}

//! Orthographic camera with a virtual trackball.
//!
//! The camera looks along the view-space `-z` axis. `rotation` maps world
//! directions to view space, `center` is the world point at the middle of the
//! viewport, and `view_size / zoom` is the half-extent of the smallest
//! viewport side, in world units.

use crate::geometry::BoundingBox;
use crate::geometry::Point;
use crate::geometry::Vector;
use nalgebra::UnitQuaternion;
use std::fmt;
use std::str::FromStr;

/// Margin left around the model by [`Camera::fit`].
const FIT_PADDING: f64 = 1.1;

/// Radius of the virtual trackball, in normalized screen units.
const TRACKBALL_RADIUS: f64 = 0.8;

const MIN_ZOOM: f64 = 1e-3;
const MAX_ZOOM: f64 = 1e3;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum View {
    Top,
    Bottom,
    Left,
    Right,
    Front,
    Rear,
    /// Three-quarter view from above.
    IsoUp,
    /// Three-quarter view from below.
    IsoDown,
}

impl View {
    pub const ALL: [View; 8] = [
        View::Top,
        View::Bottom,
        View::Left,
        View::Right,
        View::Front,
        View::Rear,
        View::IsoUp,
        View::IsoDown,
    ];

    /// World direction the camera looks along, and the world direction shown
    /// upwards on screen.
    fn direction_and_up(self) -> (Vector, Vector) {
        match self {
            View::Top => (-Vector::z(), -Vector::x()),
            View::Bottom => (Vector::z(), -Vector::x()),
            View::Left => (Vector::y(), Vector::z()),
            View::Right => (-Vector::y(), Vector::z()),
            View::Front => (Vector::x(), Vector::z()),
            View::Rear => (-Vector::x(), Vector::z()),
            View::IsoUp => (Vector::new(1.0, 1.0, -1.0), Vector::z()),
            View::IsoDown => (Vector::new(1.0, 1.0, 1.0), Vector::z()),
        }
    }

    pub fn rotation(self) -> UnitQuaternion<f64> {
        let (dir, up) = self.direction_and_up();
        UnitQuaternion::look_at_rh(&dir, &up)
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            View::Top => "top",
            View::Bottom => "bottom",
            View::Left => "left",
            View::Right => "right",
            View::Front => "front",
            View::Rear => "rear",
            View::IsoUp => "iso-up",
            View::IsoDown => "iso-down",
        })
    }
}

impl FromStr for View {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        View::ALL
            .into_iter()
            .find(|v| v.to_string() == s)
            .ok_or_else(|| format!("unknown view: {}", s))
    }
}

/// Position of a projected point in the viewport, in pixels from the top-left
/// corner. Larger depths are closer to the viewer.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
    pub depth: f64,
}

/// Maps a point in normalized screen coordinates onto the trackball: a sphere
/// near the center, a hyperbolic sheet further out so that the surface stays
/// smooth.
fn trackball_point(x: f64, y: f64) -> Vector {
    let d = x.hypot(y);
    let r = TRACKBALL_RADIUS;
    let z = if d < r * std::f64::consts::FRAC_1_SQRT_2 {
        (r * r - d * d).sqrt()
    } else {
        r * r / (2.0 * d)
    };
    Vector::new(x, y, z)
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Camera {
    pub rotation: UnitQuaternion<f64>,
    pub center: Point,
    pub view_size: f64,
    pub zoom: f64,
    home_center: Point,
    home_size: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            rotation: View::IsoUp.rotation(),
            center: Point::origin(),
            view_size: 1.0,
            zoom: 1.0,
            home_center: Point::origin(),
            home_size: 1.0,
        }
    }
}

impl Camera {
    /// Centers the camera on the box and makes it fit in the viewport,
    /// whatever the orientation. The result becomes the home position.
    pub fn fit(&mut self, bb: &BoundingBox) {
        self.home_center = bb.center();
        self.home_size = f64::max(bb.diagonal() / 2.0 * FIT_PADDING, f64::EPSILON);
        self.center = self.home_center;
        self.view_size = self.home_size;
        self.zoom = 1.0;
    }

    /// Back to the home position, in the default orientation.
    pub fn reset(&mut self) {
        self.rotation = View::IsoUp.rotation();
        self.center = self.home_center;
        self.view_size = self.home_size;
        self.zoom = 1.0;
    }

    pub fn set_view(&mut self, view: View) {
        self.rotation = view.rotation();
        self.center = self.home_center;
        self.zoom = 1.0;
    }

    /// Rotates the model as if the cursor dragged the trackball from `from`
    /// to `to`, both in normalized screen coordinates (`[-1, 1]`, y up).
    pub fn drag(&mut self, from: [f64; 2], to: [f64; 2]) {
        let a = trackball_point(from[0], from[1]);
        let b = trackball_point(to[0], to[1]);
        if let Some(spin) = UnitQuaternion::rotation_between(&a, &b) {
            self.rotation = spin * self.rotation;
            self.rotation.renormalize();
        }
    }

    /// Moves the model by a screen-space offset, in normalized screen units.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        let half = self.view_size / self.zoom;
        let offset = Vector::new(dx, dy, 0.0) * half;
        self.center -= self.rotation.inverse_transform_vector(&offset);
    }

    /// Multiplies the zoom factor, within fixed bounds.
    pub fn zoom_by(&mut self, factor: f64) {
        if factor.is_finite() && 0.0 < factor {
            self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        }
    }

    /// View-space coordinates of a world point.
    pub fn to_view(&self, p: &Point) -> Vector {
        self.rotation * (p - self.center)
    }

    /// Orthographic projection onto a `width` by `height` viewport.
    pub fn project(&self, p: &Point, width: f64, height: f64) -> ScreenPoint {
        let v = self.to_view(p);
        let scale = f64::min(width, height) / 2.0 * self.zoom / self.view_size;
        ScreenPoint {
            x: width / 2.0 + v.x * scale,
            y: height / 2.0 - v.y * scale,
            depth: v.z,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use approx::assert_ulps_eq;

    #[test]
    fn views_look_along_their_direction() {
        for view in View::ALL {
            let (dir, up) = view.direction_and_up();
            let rotation = view.rotation();
            assert_relative_eq!(rotation * dir.normalize(), -Vector::z(), epsilon = 1e-12);
            // `up` lands in the upper half of the screen plane.
            assert!(0.0 < (rotation * up).y);
            assert_eq!(view.to_string().parse::<View>(), Ok(view));
        }
    }

    #[test]
    fn fit_and_project() {
        let bb = BoundingBox {
            p_min: Point::new(-1.0, -2.0, 0.0),
            p_max: Point::new(3.0, 2.0, 0.0),
        };
        let mut camera = Camera::default();
        camera.fit(&bb);
        camera.set_view(View::Top);

        let center = camera.project(&bb.center(), 200.0, 100.0);
        assert_ulps_eq!(center.x, 100.0);
        assert_ulps_eq!(center.y, 50.0);

        // Every corner stays inside the viewport.
        for p in [bb.p_min, bb.p_max] {
            let s = camera.project(&p, 200.0, 100.0);
            assert!((0.0..=200.0).contains(&s.x));
            assert!((0.0..=100.0).contains(&s.y));
        }

        // Top view: the nose (-x) points up the screen.
        let nose = camera.project(&Point::new(-1.0, 0.0, 0.0), 200.0, 100.0);
        assert!(nose.y < center.y);
    }

    #[test]
    fn pan_zoom_reset() {
        let mut camera = Camera::default();
        camera.fit(&BoundingBox {
            p_min: Point::new(0.0, 0.0, 0.0),
            p_max: Point::new(2.0, 0.0, 0.0),
        });
        let before = camera.project(&Point::new(1.0, 0.0, 0.0), 100.0, 100.0);

        camera.pan(0.5, 0.0);
        let after = camera.project(&Point::new(1.0, 0.0, 0.0), 100.0, 100.0);
        assert_relative_eq!(after.x - before.x, 25.0, epsilon = 1e-9);
        assert_relative_eq!(after.y, before.y, epsilon = 1e-9);

        camera.zoom_by(2.0);
        camera.zoom_by(-1.0);
        assert_ulps_eq!(camera.zoom, 2.0);

        camera.drag([0.0, 0.0], [0.3, 0.1]);
        camera.reset();
        assert_eq!(
            camera.project(&Point::new(1.0, 0.0, 0.0), 100.0, 100.0),
            before
        );
    }

    #[test]
    fn drag_rotates_towards_the_cursor() {
        let mut camera = Camera::default();
        camera.set_view(View::Top);
        camera.drag([0.0, 0.0], [0.5, 0.0]);
        // What faced the viewer moves right.
        let moved = camera.rotation * View::Top.rotation().inverse_transform_vector(&Vector::z());
        assert!(0.0 < moved.x);

        // Dragging outside the sphere uses the hyperbolic sheet.
        let far = trackball_point(2.0, 0.0);
        assert_ulps_eq!(far.z, TRACKBALL_RADIUS * TRACKBALL_RADIUS / 4.0);
        let near = trackball_point(0.0, 0.0);
        assert_ulps_eq!(near.z, TRACKBALL_RADIUS);
    }
}

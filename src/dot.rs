use std::f32::consts::{FRAC_PI_2, PI, TAU};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::math::{self, wrap_angle, Vector, EPSILON};
use crate::sector_index::Sector;

// Steering applied when the slope geometry degenerates.
pub const AVOIDANCE_NUDGE: f32 = FRAC_PI_2;
// Fixed offset of the second avoidance line, in multiples of the dot radius.
const AVOIDANCE_LOOKAHEAD_RADII: f32 = 3.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DotId(pub u32);

impl fmt::Display for DotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FillColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl FillColor {
    pub fn css(&self) -> String {
        format!("rgba({},{},{},{})", self.r, self.g, self.b, self.a)
    }
}

impl Default for FillColor {
    fn default() -> Self {
        Self {
            r: 150,
            g: 150,
            b: 150,
            a: crate::config::DEFAULT_FILL_ALPHA,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// How far a dot's centre sits outside its usable region on each axis.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Overshoot {
    pub x: f32,
    pub y: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Edge {
    MaxX,
    MinX,
    MaxY,
    MinY,
}

impl Edge {
    fn correction(self) -> f32 {
        match self {
            Self::MaxX => FRAC_PI_2,
            Self::MinX => -FRAC_PI_2,
            Self::MaxY => 0.0,
            Self::MinY => -PI,
        }
    }
}

/// Initial state for a dot created through `Simulation::spawn`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DotSpec {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub direction: f32,
    pub speed: f32,
    #[serde(default)]
    pub fill: FillColor,
}

#[derive(Clone, Debug)]
pub struct Dot {
    pub id: DotId,
    pub x: f32,
    pub y: f32,
    radius: f32,
    safe_range: f32,
    direction: f32,
    speed: f32,
    vector: Vector,
    pub fill: FillColor,
    pub show_vector: bool,
    pub show_info: bool,
    pub avoid_each_other: bool,
    pub(crate) sectors: Vec<Sector>,
}

impl Dot {
    pub fn new(id: DotId, spec: DotSpec) -> Self {
        let mut dot = Self {
            id,
            x: spec.x,
            y: spec.y,
            radius: spec.radius,
            safe_range: spec.radius * 2.0,
            direction: wrap_angle(spec.direction),
            speed: spec.speed,
            vector: Vector::default(),
            fill: spec.fill,
            show_vector: false,
            show_info: false,
            avoid_each_other: false,
            sectors: Vec::with_capacity(5),
        };
        dot.set_vector();
        dot
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn safe_range(&self) -> f32 {
        self.safe_range
    }

    pub fn direction(&self) -> f32 {
        self.direction
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn vector(&self) -> Vector {
        self.vector
    }

    pub fn sectors(&self) -> &[Sector] {
        &self.sectors
    }

    pub fn set_vector(&mut self) {
        self.vector = Vector::from_heading(self.direction, self.speed);
    }

    pub fn rotate(&mut self, radians: f32) {
        self.direction = wrap_angle(self.direction + radians);
        self.set_vector();
    }

    pub fn rotate_to(&mut self, radians: f32) {
        self.direction = wrap_angle(radians);
        self.set_vector();
    }

    pub fn offset(&mut self, by: Vector) {
        self.x += by.x_off;
        self.y += by.y_off;
    }

    /// Point one unit-time step ahead with the heading turned by `quarter` right angles.
    pub fn lookahead(&self, quarter: u8) -> (f32, f32) {
        let heading = Vector::from_heading(
            self.direction + FRAC_PI_2 * f32::from(quarter),
            self.speed,
        );
        (self.x + heading.x_off, self.y + heading.y_off)
    }

    pub fn distance_to(&self, other: &Dot) -> f32 {
        math::distance(self.x, self.y, other.x, other.y)
    }

    /// Angle between the line towards `other` and the line towards a point
    /// offset from `other` by three radii on both axes.
    pub fn avoidance_angle(&self, other: &Dot) -> f32 {
        let dx = other.x - self.x;
        if dx.abs() <= EPSILON {
            return AVOIDANCE_NUDGE;
        }
        let m1 = (other.y - self.y) / dx;

        let reach = self.radius * AVOIDANCE_LOOKAHEAD_RADII;
        let dx2 = other.x + reach - self.x;
        if dx2.abs() <= EPSILON {
            return AVOIDANCE_NUDGE;
        }
        let m2 = (other.y + reach - self.y) / dx2;

        let numerator = m1 - m2;
        if numerator.abs() <= EPSILON {
            return AVOIDANCE_NUDGE;
        }
        let denominator = 1.0 - m1 * m2;
        if denominator.abs() <= EPSILON {
            return AVOIDANCE_NUDGE.copysign(numerator);
        }

        let angle = (numerator / denominator).atan();
        if angle.is_finite() {
            angle
        } else {
            AVOIDANCE_NUDGE
        }
    }

    pub fn out_of_bounds(&self, bounds: Bounds) -> Option<Overshoot> {
        let min_x = self.radius;
        let min_y = self.radius;
        let max_x = bounds.width - self.radius;
        let max_y = bounds.height - self.radius;

        if self.x >= min_x && self.x <= max_x && self.y >= min_y && self.y <= max_y {
            return None;
        }

        let mut overshoot = Overshoot::default();
        if self.x < min_x {
            overshoot.x = self.x - min_x;
        } else if self.x > max_x {
            overshoot.x = self.x - max_x;
        }
        if self.y < min_y {
            overshoot.y = self.y - min_y;
        } else if self.y > max_y {
            overshoot.y = self.y - max_y;
        }
        Some(overshoot)
    }

    /// Turns the dot away from the edge(s) it crossed.
    pub fn reflect(&mut self, overshoot: Overshoot) {
        if math::is_right_angle_multiple(self.direction) {
            self.rotate(PI);
            return;
        }

        let edge = match (sign(overshoot.x), sign(overshoot.y)) {
            (0, 0) => return,
            (x, y) if x != 0 && y != 0 => {
                self.rotate(PI);
                return;
            }
            (1, _) => Edge::MaxX,
            (-1, _) => Edge::MinX,
            (_, 1) => Edge::MaxY,
            _ => Edge::MinY,
        };

        let correction = edge.correction();
        let turned = (self.direction + correction).rem_euclid(TAU);
        self.rotate_to(TAU - turned - correction);
    }

    pub fn clamp_to(&mut self, bounds: Bounds) {
        let max_x = (bounds.width - self.radius).max(self.radius);
        let max_y = (bounds.height - self.radius).max(self.radius);
        self.x = math::clamp_finite(self.x, self.radius, max_x, self.radius);
        self.y = math::clamp_finite(self.y, self.radius, max_y, self.radius);
    }
}

fn sign(value: f32) -> i8 {
    if value > 0.0 {
        1
    } else if value < 0.0 {
        -1
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::{Bounds, Dot, DotId, DotSpec, FillColor, Overshoot, AVOIDANCE_NUDGE};
    use std::f32::consts::{PI, TAU};

    fn dot_at(x: f32, y: f32, direction: f32) -> Dot {
        Dot::new(
            DotId(1),
            DotSpec {
                x,
                y,
                radius: 5.0,
                direction,
                speed: 10.0,
                fill: FillColor::default(),
            },
        )
    }

    fn assert_vector_consistent(dot: &Dot) {
        let vector = dot.vector();
        assert!((vector.x_off - dot.speed() * dot.direction().cos()).abs() < 1.0e-4);
        assert!((vector.y_off - dot.speed() * dot.direction().sin()).abs() < 1.0e-4);
    }

    #[test]
    fn rotation_refreshes_vector_and_wraps() {
        let mut dot = dot_at(50.0, 50.0, 0.0);
        assert_eq!(dot.safe_range(), 10.0);
        dot.rotate(1.2);
        assert_vector_consistent(&dot);
        dot.rotate(-3.0);
        assert!(dot.direction() >= 0.0 && dot.direction() < TAU);
        assert_vector_consistent(&dot);
        dot.rotate_to(7.0);
        assert!((dot.direction() - (7.0 - TAU)).abs() < 1.0e-5);
        assert_vector_consistent(&dot);
    }

    #[test]
    fn avoidance_angle_follows_slope_formula() {
        let a = dot_at(100.0, 100.0, 0.0);
        let b = dot_at(102.0, 100.0, 0.0);
        let m2: f32 = 15.0 / 17.0;
        let expected = (-m2).atan();
        assert!((a.avoidance_angle(&b) - expected).abs() < 1.0e-5);
    }

    #[test]
    fn avoidance_angle_handles_degenerate_geometry() {
        let a = dot_at(100.0, 100.0, 0.0);
        let above = dot_at(100.0, 140.0, 0.0);
        let same = dot_at(100.0, 100.0, 0.0);
        let diagonal = dot_at(104.0, 104.0, 0.0);
        let lookahead_vertical = dot_at(85.0, 120.0, 0.0);

        assert_eq!(a.avoidance_angle(&above), AVOIDANCE_NUDGE);
        assert_eq!(a.avoidance_angle(&same), AVOIDANCE_NUDGE);
        assert_eq!(a.avoidance_angle(&diagonal), AVOIDANCE_NUDGE);
        assert_eq!(a.avoidance_angle(&lookahead_vertical), AVOIDANCE_NUDGE);
    }

    #[test]
    fn avoidance_angle_is_always_finite() {
        let a = dot_at(200.0, 200.0, 0.0);
        for ix in -20..=20 {
            for iy in -20..=20 {
                let b = dot_at(200.0 + ix as f32 * 0.5, 200.0 + iy as f32 * 0.5, 0.0);
                assert!(a.avoidance_angle(&b).is_finite(), "({ix}, {iy})");
            }
        }
    }

    #[test]
    fn out_of_bounds_reports_signed_overshoot() {
        let bounds = Bounds::new(400.0, 300.0);
        assert_eq!(dot_at(5.0, 150.0, 0.0).out_of_bounds(bounds), None);
        assert_eq!(
            dot_at(408.0, 2.0, 0.0).out_of_bounds(bounds),
            Some(Overshoot { x: 13.0, y: -3.0 })
        );
    }

    #[test]
    fn axis_aligned_heading_reverses() {
        let mut dot = dot_at(408.0, 150.0, 0.0);
        dot.reflect(Overshoot { x: 13.0, y: 0.0 });
        assert!((dot.direction() - PI).abs() < 1.0e-6);
        assert_vector_consistent(&dot);
    }

    #[test]
    fn single_axis_reflection_mirrors_heading() {
        let mut right = dot_at(0.0, 0.0, 0.3);
        right.reflect(Overshoot { x: 1.0, y: 0.0 });
        assert!((right.direction() - (PI - 0.3)).abs() < 1.0e-5);

        let mut bottom = dot_at(0.0, 0.0, 1.2);
        bottom.reflect(Overshoot { x: 0.0, y: 1.0 });
        assert!((bottom.direction() - (TAU - 1.2)).abs() < 1.0e-5);

        let mut left = dot_at(0.0, 0.0, 2.8);
        left.reflect(Overshoot { x: -1.0, y: 0.0 });
        assert!((left.direction() - (PI - 2.8)).abs() < 1.0e-5);

        let mut top = dot_at(0.0, 0.0, 4.0);
        top.reflect(Overshoot { x: 0.0, y: -1.0 });
        assert!((top.direction() - (TAU - 4.0)).abs() < 1.0e-5);
        assert_vector_consistent(&top);
    }

    #[test]
    fn corner_overshoot_reverses() {
        let mut dot = dot_at(0.0, 0.0, 0.7);
        dot.reflect(Overshoot { x: 2.0, y: -1.0 });
        assert!((dot.direction() - (0.7 + PI)).abs() < 1.0e-5);
    }

    #[test]
    fn lookahead_turns_by_quarters() {
        let dot = dot_at(50.0, 50.0, 0.0);
        let (x0, y0) = dot.lookahead(0);
        let (x1, y1) = dot.lookahead(1);
        assert!((x0 - 60.0).abs() < 1.0e-4 && (y0 - 50.0).abs() < 1.0e-4);
        assert!((x1 - 50.0).abs() < 1.0e-4 && (y1 - 60.0).abs() < 1.0e-4);
    }

    #[test]
    fn clamp_keeps_centre_in_usable_region() {
        let bounds = Bounds::new(400.0, 300.0);
        let mut dot = dot_at(-20.0, 900.0, 0.0);
        dot.clamp_to(bounds);
        assert_eq!((dot.x, dot.y), (5.0, 295.0));
        assert_eq!(FillColor::default().css(), "rgba(150,150,150,0.4)");
    }
}

use std::f32::consts::{FRAC_PI_2, TAU};
use std::ops::{Mul, Neg};

pub const EPSILON: f32 = 1.0e-6;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vector {
    pub x_off: f32,
    pub y_off: f32,
}

impl Vector {
    pub fn new(x_off: f32, y_off: f32) -> Self {
        Self { x_off, y_off }
    }

    // Per-unit-time displacement for a heading and speed.
    pub fn from_heading(direction: f32, speed: f32) -> Self {
        Self {
            x_off: speed * direction.cos(),
            y_off: speed * direction.sin(),
        }
    }
}

impl Mul<f32> for Vector {
    type Output = Vector;

    fn mul(self, rhs: f32) -> Vector {
        Vector::new(self.x_off * rhs, self.y_off * rhs)
    }
}

impl Neg for Vector {
    type Output = Vector;

    fn neg(self) -> Vector {
        Vector::new(-self.x_off, -self.y_off)
    }
}

/// Wraps an angle in radians into `[0, 2π)`.
pub fn wrap_angle(radians: f32) -> f32 {
    let wrapped = radians.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs.
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

pub fn is_right_angle_multiple(radians: f32) -> bool {
    radians % FRAC_PI_2 == 0.0
}

pub fn distance(ax: f32, ay: f32, bx: f32, by: f32) -> f32 {
    let dx = ax - bx;
    let dy = ay - by;
    (dx * dx + dy * dy).sqrt()
}

pub fn clamp_finite(value: f32, min: f32, max: f32, fallback: f32) -> f32 {
    if !value.is_finite() {
        return fallback;
    }
    value.clamp(min, max)
}

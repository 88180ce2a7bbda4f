//! Plain 2D value types. `Coord` is a place on the track, `Vector` is a
//! displacement (velocity or thrust impulse) with no position of its own.

use serde::{Deserialize, Serialize};

/// Track position. x grows to the right, y grows downwards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Coord {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector {
    pub x: f64,
    pub y: f64,
}

impl Coord {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Coord) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Displacement taking `self` onto `other`.
    pub fn vector_to(&self, other: &Coord) -> Vector {
        Vector::new(other.x - self.x, other.y - self.y)
    }

    pub fn displaced(&self, by: Vector) -> Coord {
        Coord::new(self.x + by.x, self.y + by.y)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Vector {
    pub const ZERO: Vector = Vector { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Unit vector pointing along `angle` (radians).
    pub fn from_angle(angle: f64) -> Self {
        Self::new(angle.cos(), angle.sin())
    }

    pub fn add(self, other: Vector) -> Vector {
        Vector::new(self.x + other.x, self.y + other.y)
    }

    pub fn scale(self, factor: f64) -> Vector {
        Vector::new(self.x * factor, self.y * factor)
    }

    pub fn norm(&self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Direction in radians; zero for the zero vector.
    pub fn angle(&self) -> f64 {
        if self.x == 0.0 && self.y == 0.0 {
            0.0
        } else {
            self.y.atan2(self.x)
        }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_is_symmetric() {
        let a = Coord::new(3000.0, 5000.0);
        let b = Coord::new(3000.0, 4399.0);
        assert_eq!(a.distance(&b), 601.0);
        assert_eq!(b.distance(&a), 601.0);
    }

    #[test]
    fn displacement_round_trip() {
        let a = Coord::new(-20.0, 40.0);
        let b = Coord::new(100.0, -5.0);
        assert_eq!(a.displaced(a.vector_to(&b)), b);
    }

    #[test]
    fn zero_vector_has_no_direction() {
        assert_eq!(Vector::ZERO.angle(), 0.0);
        assert_eq!(Vector::ZERO.norm(), 0.0);
        assert_eq!(Vector::new(3.0, 4.0).norm(), 5.0);
    }
}

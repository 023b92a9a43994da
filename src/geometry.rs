use std::ops::{Add, Mul, Sub};

use num_traits::{Num, ToPrimitive};

// Points
//------------------------------------------------------------------------------

/// Integer points address pixels, float points address sub-pixel sample
/// locations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point<T> {
    pub x: T,
    pub y: T,
}

pub type PointF = Point<f64>;
pub type PointI = Point<i32>;

impl<T> Point<T> {
    pub const fn new(x: T, y: T) -> Self {
        Self { x, y }
    }
}

impl<T: Num + Copy> Add for Point<T> {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl<T: Num + Copy> Sub for Point<T> {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl<T: Num + Copy> Mul<T> for Point<T> {
    type Output = Self;
    fn mul(self, rhs: T) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl<T: Num + ToPrimitive + Copy> Point<T> {
    pub fn to_f64(self) -> PointF {
        PointF::new(self.x.to_f64().unwrap(), self.y.to_f64().unwrap())
    }
}

impl PointF {
    pub fn distance(self, other: Self) -> f64 {
        let d = self - other;
        (d.x * d.x + d.y * d.y).sqrt()
    }

    pub fn cross(self, other: Self) -> f64 {
        self.x * other.y - self.y * other.x
    }

    pub fn to_i32(self) -> PointI {
        PointI::new(self.x.round() as i32, self.y.round() as i32)
    }
}

use serde::Deserialize;
use std::ops;

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct V3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// A ray with origin `x` and direction `d`. `d` is expected to be unit length.
#[derive(Clone, Copy, Debug)]
pub struct Ray {
    pub x: V3,
    pub d: V3,
}

impl Ray {
    /// Builds a ray, normalizing `d`.
    pub fn new(x: V3, d: V3) -> Self {
        Ray {
            x,
            d: normalize(&d),
        }
    }

    pub fn at(&self, t: f64) -> V3 {
        self.x + t * self.d
    }
}

pub fn v(x: f64, y: f64, z: f64) -> V3 {
    V3 { x, y, z }
}

pub fn splat(s: f64) -> V3 {
    v(s, s, s)
}

pub fn add(x: &V3, y: &V3) -> V3 {
    V3 {
        x: x.x + y.x,
        y: x.y + y.y,
        z: x.z + y.z,
    }
}

pub fn sub(x: &V3, y: &V3) -> V3 {
    V3 {
        x: x.x - y.x,
        y: x.y - y.y,
        z: x.z - y.z,
    }
}

pub fn mul(scalar: f64, x: &V3) -> V3 {
    V3 {
        x: x.x * scalar,
        y: x.y * scalar,
        z: x.z * scalar,
    }
}

pub fn dot(x: &V3, y: &V3) -> f64 {
    x.x * y.x + x.y * y.y + x.z * y.z
}

pub fn norm2(x: &V3) -> f64 {
    dot(x, x)
}

pub fn norm(x: &V3) -> f64 {
    norm2(x).sqrt()
}

pub fn dist(x: &V3, y: &V3) -> f64 {
    norm(&sub(x, y))
}

/// Unit vector in the direction of `x`, or `None` if `x` has zero (or
/// non-finite) length.
pub fn try_normalize(x: &V3) -> Option<V3> {
    let n = norm(x);
    if n > 0. && n.is_finite() {
        Some(mul(1. / n, x))
    } else {
        None
    }
}

/// Unit vector in the direction of `x`.
///
/// A zero-length input yields the zero vector `O` instead of NaNs. Callers
/// that must tell the two apart use [`try_normalize`].
pub fn normalize(x: &V3) -> V3 {
    try_normalize(x).unwrap_or(O)
}

/// Component-wise absolute value.
pub fn abs(x: &V3) -> V3 {
    v(x.x.abs(), x.y.abs(), x.z.abs())
}

/// Component-wise `max(component, s)`.
pub fn max_scalar(x: &V3, s: f64) -> V3 {
    v(x.x.max(s), x.y.max(s), x.z.max(s))
}

pub fn max_component(x: &V3) -> f64 {
    x.x.max(x.y).max(x.z)
}

/// Periodic remainder of `f` into `[0, m)`. `m` must be positive.
///
/// `rem_euclid` can round up to exactly `m` for tiny negative inputs, so
/// that case wraps to zero.
pub fn modulo(f: f64, m: f64) -> f64 {
    let r = f.rem_euclid(m);
    if r >= m {
        r - m
    } else {
        r
    }
}

/// [`modulo`] applied to every component.
pub fn modulo_v(x: &V3, m: f64) -> V3 {
    v(modulo(x.x, m), modulo(x.y, m), modulo(x.z, m))
}

impl ops::Add<V3> for V3 {
    type Output = V3;

    fn add(self, rhs: V3) -> V3 {
        add(&self, &rhs)
    }
}

impl ops::Sub<V3> for V3 {
    type Output = V3;

    fn sub(self, rhs: V3) -> V3 {
        sub(&self, &rhs)
    }
}

impl ops::Neg for V3 {
    type Output = V3;

    fn neg(self) -> V3 {
        mul(-1., &self)
    }
}

impl ops::Mul<V3> for f64 {
    type Output = V3;

    fn mul(self, rhs: V3) -> Self::Output {
        mul(self, &rhs)
    }
}

impl ops::Mul<f64> for V3 {
    type Output = V3;

    fn mul(self, rhs: f64) -> Self::Output {
        mul(rhs, &self)
    }
}

pub const B1: V3 = V3 {
    x: 1.,
    y: 0.,
    z: 0.,
};

pub const B2: V3 = V3 {
    x: 0.,
    y: 1.,
    z: 0.,
};

pub const B3: V3 = V3 {
    x: 0.,
    y: 0.,
    z: 1.,
};

pub const O: V3 = V3 {
    x: 0.,
    y: 0.,
    z: 0.,
};

use crate::math::{
    abs, dot, max_component, max_scalar, modulo_v, mul, norm, splat, try_normalize, v, Ray, B1,
    B2, B3, V3,
};
use serde::Deserialize;

/// A signed distance field. Negative inside, non-negative outside, and the
/// magnitude never overestimates the distance to the surface.
pub trait Renderable {
    fn sdf(&self, x: &V3) -> f64;
}

/// Infinite lattice of spheres, one per unit cell.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct TiledSphere {
    /// Center inside the unit cell.
    pub center: V3,
    pub radius: f64,
}

impl Default for TiledSphere {
    fn default() -> Self {
        TiledSphere {
            center: v(0.5, 0.5, 0.),
            radius: 0.25,
        }
    }
}

impl Renderable for TiledSphere {
    fn sdf(&self, x: &V3) -> f64 {
        norm(&(modulo_v(x, 1.) - self.center)) - self.radius
    }
}

/// Which distance expression [`TiledBox`] evaluates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoxFormula {
    /// `norm(max(q, 0)) + min(max_component(q), 0)`.
    #[default]
    Corrected,
    /// `(norm(max(q, 0)) + (m < 0)) ? m : 0` as a C-style ternary would
    /// parse it. This evaluates to `m` everywhere, a Chebyshev-style bound.
    PrecedenceBug,
}

/// Box mirrored into every octant by `abs(p)`, offset by `center`, with
/// half-extents `size`.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct TiledBox {
    pub center: V3,
    pub size: V3,
    pub formula: BoxFormula,
}

impl Default for TiledBox {
    fn default() -> Self {
        TiledBox {
            center: v(0.5, 0.5, 0.),
            size: splat(0.25),
            formula: BoxFormula::Corrected,
        }
    }
}

impl Renderable for TiledBox {
    fn sdf(&self, x: &V3) -> f64 {
        let q = abs(x) - self.center - self.size;
        let m = max_component(&q);
        let exterior = norm(&max_scalar(&q, 0.));
        match self.formula {
            BoxFormula::Corrected => exterior + m.min(0.),
            BoxFormula::PrecedenceBug => {
                let inside = if m < 0. { 1. } else { 0. };
                if exterior + inside != 0. {
                    m
                } else {
                    0.
                }
            }
        }
    }
}

/// Closed set of primitives a scene can trace.
#[derive(Clone, Copy, Debug)]
pub enum Shape {
    Sphere(TiledSphere),
    Box(TiledBox),
}

impl Renderable for Shape {
    fn sdf(&self, x: &V3) -> f64 {
        match self {
            Shape::Sphere(s) => s.sdf(x),
            Shape::Box(b) => b.sdf(x),
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct TraceParams {
    pub max_steps: usize,
    /// Fraction of the distance estimate advanced per step.
    pub step_scale: f64,
    pub min_step: f64,
}

impl Default for TraceParams {
    fn default() -> Self {
        TraceParams {
            max_steps: 128,
            step_scale: 0.1,
            min_step: 0.01,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Trace {
    /// First sampled position with a negative distance, and how many
    /// evaluations it took to get there.
    Hit { position: V3, steps: usize },
    Miss,
}

impl Trace {
    pub fn position(&self) -> Option<V3> {
        match self {
            Trace::Hit { position, .. } => Some(*position),
            Trace::Miss => None,
        }
    }
}

/// Marches `ray` through `r`, evaluating the field at most
/// `params.max_steps` times. The hit position is not refined, so it lies
/// up to one step past the surface.
pub fn trace(r: &impl Renderable, ray: &Ray, params: &TraceParams) -> Trace {
    let mut y = ray.x;
    for i in 0..params.max_steps {
        let d = r.sdf(&y);
        if d < 0. {
            return Trace::Hit {
                position: y,
                steps: i + 1,
            };
        }
        y = y + (d * params.step_scale).max(params.min_step) * ray.d;
    }
    Trace::Miss
}

/// Forward-difference gradient of `r` at `x`, normalized. `None` when the
/// gradient vanishes.
pub fn estimate_normal(r: &impl Renderable, x: &V3, eps: f64) -> Option<V3> {
    let d = r.sdf(x);
    let dx = r.sdf(&(*x + mul(eps, &B1))) - d;
    let dy = r.sdf(&(*x + mul(eps, &B2))) - d;
    let dz = r.sdf(&(*x + mul(eps, &B3))) - d;
    try_normalize(&v(dx, dy, dz))
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct Lighting {
    /// World position of the single point light.
    pub light: V3,
    /// Lower bound on the diffuse term.
    pub ambient: f64,
    pub surface: V3,
}

impl Default for Lighting {
    fn default() -> Self {
        Lighting {
            light: splat(10.),
            ambient: 0.4,
            surface: splat(1.),
        }
    }
}

impl Lighting {
    pub fn intensity(&self, hit: &V3, normal: &V3) -> f64 {
        let light_dir = crate::math::normalize(&(self.light - *hit));
        dot(&light_dir, normal).max(self.ambient)
    }

    pub fn shade(&self, hit: &V3, normal: &V3) -> V3 {
        self.intensity(hit, normal) * self.surface
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{dist, normalize, O};
    use std::cell::Cell;

    const TOL: f64 = 1e-9;

    #[test]
    fn sphere_sign() {
        let s = TiledSphere::default();
        assert!(s.sdf(&v(0.5, 0.5, 0.)) < 0.);
        assert!((s.sdf(&v(0.5, 0.5, 0.)) + 0.25).abs() < TOL);
        assert!(s.sdf(&v(0.6, 0.45, 0.1)) < 0.);
        // cell corner opposite the center
        assert!(s.sdf(&v(0., 0., 0.5)) > 0.);
        assert!(s.sdf(&v(0.99, 0.99, 0.5)) > 0.);
    }

    #[test]
    fn sphere_is_periodic() {
        let s = TiledSphere::default();
        for p in [v(0.3, 0.1, -0.7), v(-2.25, 5.5, 0.125), v(0.9, 0.6, 0.05)] {
            let d = s.sdf(&p);
            for step in [B1, B2, B3, -B1, 3. * B2 - B3] {
                assert!((s.sdf(&(p + step)) - d).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn box_surface_inside_outside() {
        let b = TiledBox::default();
        // face at x = center.x + size.x
        assert!(b.sdf(&v(0.75, 0., 0.)).abs() < TOL);
        assert!(b.sdf(&v(-0.75, 0.3, 0.1)).abs() < TOL);
        // straight out from a face
        assert!((b.sdf(&v(0., 0., 1.25)) - 1.).abs() < TOL);
        // off a corner
        let corner = v(0.75, 0.75, 0.25);
        let p = v(1.75, 1.75, 1.25);
        assert!((b.sdf(&p) - dist(&p, &corner)).abs() < TOL);
        // inside, nearest face is z = 0.25
        assert!((b.sdf(&v(0.1, 0.1, 0.05)) + 0.2).abs() < TOL);
    }

    #[test]
    fn box_precedence_bug_differs_outside_an_edge() {
        // q = abs(p) - center - size = (0.3, 0.4, -0.1). The corrected formula
        // reports the edge distance norm((0.3, 0.4, 0)) = 0.5; the misparsed
        // ternary collapses to max_component(q) = 0.4. Inside (all q < 0) the
        // exterior term is zero and the two agree, so the divergence is only
        // observable outside the box.
        let p = v(1.05, 1.15, 0.15);
        let fixed = TiledBox::default();
        let buggy = TiledBox {
            formula: BoxFormula::PrecedenceBug,
            ..TiledBox::default()
        };
        assert!((fixed.sdf(&p) - 0.5).abs() < TOL);
        assert!((buggy.sdf(&p) - 0.4).abs() < TOL);

        let inside = v(0.2, 0.3, 0.);
        assert!((fixed.sdf(&inside) - buggy.sdf(&inside)).abs() < TOL);
    }

    struct Counting<S> {
        inner: S,
        calls: Cell<usize>,
    }

    impl<S: Renderable> Renderable for Counting<S> {
        fn sdf(&self, x: &V3) -> f64 {
            self.calls.set(self.calls.get() + 1);
            self.inner.sdf(x)
        }
    }

    #[test]
    fn trace_hits_box_ahead() {
        let b = TiledBox::default();
        let ray = Ray::new(v(0.2, 0.2, 3.), -B3);
        let params = TraceParams::default();
        match trace(&b, &ray, &params) {
            Trace::Hit { position, steps } => {
                assert!(b.sdf(&position) < 0.);
                assert!(steps <= params.max_steps);
                assert!((position.z - 0.25).abs() < 0.02);
            }
            Trace::Miss => panic!("expected a hit"),
        }
    }

    #[test]
    fn trace_miss_uses_whole_budget() {
        let b = Counting {
            inner: TiledBox::default(),
            calls: Cell::new(0),
        };
        let ray = Ray::new(v(0.5, 0.5, 3.), B3);
        let params = TraceParams::default();
        assert_eq!(trace(&b, &ray, &params), Trace::Miss);
        assert_eq!(b.calls.get(), params.max_steps);
    }

    #[test]
    fn trace_starting_inside_hits_immediately() {
        let s = TiledSphere::default();
        let ray = Ray::new(v(0.5, 0.5, 0.), B1);
        assert_eq!(
            trace(&s, &ray, &TraceParams::default()),
            Trace::Hit {
                position: v(0.5, 0.5, 0.),
                steps: 1
            }
        );
    }

    #[test]
    fn trace_respects_min_step() {
        // step_scale 0 leaves only the floor, so one stride crosses the plane
        struct HalfSpace;
        impl Renderable for HalfSpace {
            fn sdf(&self, x: &V3) -> f64 {
                x.z
            }
        }
        let params = TraceParams {
            max_steps: 2,
            step_scale: 0.,
            min_step: 5.,
        };
        let ray = Ray::new(v(0., 0., 4.), -B3);
        assert_eq!(trace(&HalfSpace, &ray, &params).position(), Some(v(0., 0., -1.)));
    }

    #[test]
    fn normal_points_out_of_box_face() {
        let b = TiledBox::default();
        let n = estimate_normal(&b, &v(0.1, 0.1, 0.24), 0.1).unwrap();
        assert!(dist(&n, &B3) < 1e-9);
    }

    #[test]
    fn normal_of_sphere_is_roughly_radial() {
        let s = TiledSphere::default();
        let p = v(0.5, 0.5, 0.249);
        let n = estimate_normal(&s, &p, 1e-4).unwrap();
        assert!(dot(&n, &B3) > 0.99);
    }

    #[test]
    fn flat_field_has_no_normal() {
        struct Flat;
        impl Renderable for Flat {
            fn sdf(&self, _x: &V3) -> f64 {
                -1.
            }
        }
        assert!(estimate_normal(&Flat, &O, 0.1).is_none());
    }

    #[test]
    fn shading_is_floored_by_ambient() {
        let l = Lighting::default();
        let hit = O;
        let facing = normalize(&splat(1.));
        assert!((l.intensity(&hit, &facing) - 1.).abs() < TOL);
        assert_eq!(l.intensity(&hit, &-facing), 0.4);
        assert_eq!(l.shade(&hit, &-facing), splat(0.4));
    }
}

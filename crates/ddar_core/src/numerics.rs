//! Cartesian coordinate sanity filter (out-of-scope core collaborator,
//! spec §1; SPEC_FULL.md §4).
//!
//! Not a proof engine: a construction step that would produce a
//! degenerate configuration (three points claimed non-collinear that a
//! random realization places on one line, for instance) gets caught here
//! before the symbolic engines spend cycles on an inconsistent problem.
//! Grounded on the original's `Numerics/Cartesian.{hh,cpp}`.

use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const EPS: f64 = 1e-6;

fn is_close(a: f64, b: f64) -> bool {
    (a - b).abs() < EPS
}

/// The one static piece of global mutable state in the core (spec §5,
/// §9): a process-wide RNG for picking pseudo-random coordinates. Seeded
/// once, non-deterministically, on first use.
fn rng() -> &'static Mutex<StdRng> {
    static RNG: OnceLock<Mutex<StdRng>> = OnceLock::new();
    RNG.get_or_init(|| Mutex::new(StdRng::from_entropy()))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CartesianPoint {
    pub x: f64,
    pub y: f64,
}

impl CartesianPoint {
    pub fn new(x: f64, y: f64) -> CartesianPoint {
        CartesianPoint { x, y }
    }

    pub fn is_same(&self, other: &CartesianPoint) -> bool {
        is_close(self.x, other.x) && is_close(self.y, other.y)
    }

    pub fn distance(&self, other: &CartesianPoint) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

impl std::ops::Add for CartesianPoint {
    type Output = CartesianPoint;
    fn add(self, rhs: CartesianPoint) -> CartesianPoint {
        CartesianPoint::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for CartesianPoint {
    type Output = CartesianPoint;
    fn sub(self, rhs: CartesianPoint) -> CartesianPoint {
        CartesianPoint::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl std::ops::Mul<f64> for CartesianPoint {
    type Output = CartesianPoint;
    fn mul(self, scalar: f64) -> CartesianPoint {
        CartesianPoint::new(self.x * scalar, self.y * scalar)
    }
}

/// A line in implicit form `a*x + b*y + c = 0`.
#[derive(Debug, Clone, Copy)]
pub struct CartesianLine {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl CartesianLine {
    pub fn through(p1: CartesianPoint, p2: CartesianPoint) -> CartesianLine {
        CartesianLine { a: p2.y - p1.y, b: p1.x - p2.x, c: p2.x * p1.y - p1.x * p2.y }
    }

    /// The line through `p` sharing this line's direction.
    pub fn para_line(&self, p: CartesianPoint) -> CartesianLine {
        CartesianLine { a: self.a, b: self.b, c: -(self.a * p.x + self.b * p.y) }
    }

    /// The line through `p` perpendicular to this one.
    pub fn perp_line(&self, p: CartesianPoint) -> CartesianLine {
        CartesianLine { a: -self.b, b: self.a, c: self.b * p.x - self.a * p.y }
    }

    /// Anticlockwise angle of rotation from the y-axis, in `[0, pi)`.
    pub fn angle_of(&self) -> f64 {
        let mut theta = self.a.atan2(-self.b);
        if theta < 0.0 {
            theta += std::f64::consts::PI;
        }
        theta
    }

    pub fn angle_between(&self, other: &CartesianLine) -> f64 {
        let mut diff = other.angle_of() - self.angle_of();
        diff = diff.rem_euclid(std::f64::consts::PI);
        diff
    }

    fn contains(&self, p: CartesianPoint) -> bool {
        is_close(self.a * p.x + self.b * p.y + self.c, 0.0)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CartesianCircle {
    pub center: CartesianPoint,
    pub radius: f64,
}

impl CartesianCircle {
    pub fn through_three(p1: CartesianPoint, p2: CartesianPoint, p3: CartesianPoint) -> Option<CartesianCircle> {
        let ax = p1.x;
        let ay = p1.y;
        let d = 2.0 * (ax * (p2.y - p3.y) + p2.x * (p3.y - ay) + p3.x * (ay - p2.y));
        if is_close(d, 0.0) {
            return None;
        }
        let ux = ((ax * ax + ay * ay) * (p2.y - p3.y)
            + (p2.x * p2.x + p2.y * p2.y) * (p3.y - ay)
            + (p3.x * p3.x + p3.y * p3.y) * (ay - p2.y))
            / d;
        let uy = ((ax * ax + ay * ay) * (p3.x - p2.x)
            + (p2.x * p2.x + p2.y * p2.y) * (ax - p3.x)
            + (p3.x * p3.x + p3.y * p3.y) * (p2.x - ax))
            / d;
        let center = CartesianPoint::new(ux, uy);
        Some(CartesianCircle { center, radius: center.distance(&p1) })
    }
}

/// Intersects two lines; `None` if they are (numerically) parallel.
pub fn intersect_line_line(l1: &CartesianLine, l2: &CartesianLine) -> Option<CartesianPoint> {
    let det = l1.a * l2.b - l2.a * l1.b;
    if is_close(det, 0.0) {
        return None;
    }
    let x = (l2.b * -l1.c - l1.b * -l2.c) / det;
    let y = (l1.a * -l2.c - l2.a * -l1.c) / det;
    Some(CartesianPoint::new(x, y))
}

/// The two (possibly coincident or absent) intersections of a line and a
/// circle.
pub fn intersect_line_circle(l: &CartesianLine, c: &CartesianCircle) -> Option<(CartesianPoint, CartesianPoint)> {
    let norm = (l.a * l.a + l.b * l.b).sqrt();
    if is_close(norm, 0.0) {
        return None;
    }
    let dist = (l.a * c.center.x + l.b * c.center.y + l.c) / norm;
    if dist.abs() > c.radius + EPS {
        return None;
    }
    let foot = CartesianPoint::new(c.center.x - l.a * dist / norm, c.center.y - l.b * dist / norm);
    let half_chord = (c.radius * c.radius - dist * dist).max(0.0).sqrt();
    let dir = CartesianPoint::new(-l.b / norm, l.a / norm);
    Some((foot + dir * half_chord, foot - dir * half_chord))
}

pub fn random_point() -> CartesianPoint {
    let mut g = rng().lock().unwrap();
    CartesianPoint::new(g.gen_range(-10.0..10.0), g.gen_range(-10.0..10.0))
}

pub fn random_points(n: usize) -> Vec<CartesianPoint> {
    (0..n).map(|_| random_point()).collect()
}

/// One step of a construction's `<numerics>` block (spec §6): `outs = kind
/// args...`. Only the handful of kinds the seed scenarios (§8) need are
/// implemented; anything else is realized as independent free points so
/// the sanity filter degrades to "no opinion" rather than failing closed.
#[derive(Debug, Clone)]
pub struct NumericStep {
    pub outs: Vec<String>,
    pub kind: String,
    pub args: Vec<String>,
}

/// A realized (approximate) coordinate assignment for one construction
/// sequence.
#[derive(Default)]
pub struct CartesianModel {
    points: HashMap<String, CartesianPoint>,
}

impl CartesianModel {
    pub fn point(&self, name: &str) -> Option<CartesianPoint> {
        self.points.get(name).copied()
    }

    /// Realizes a sequence of numeric steps into concrete coordinates,
    /// picking pseudo-random positions for free points and deterministic
    /// formulas for everything derived (midpoint, intersection, ...).
    pub fn realize(steps: &[NumericStep]) -> CartesianModel {
        let mut model = CartesianModel::default();
        for step in steps {
            let args: Vec<CartesianPoint> = step.args.iter().filter_map(|a| model.points.get(a).copied()).collect();
            match step.kind.as_str() {
                "free" | "triangle" | "segment" => {
                    for out in &step.outs {
                        model.points.insert(out.clone(), random_point());
                    }
                }
                "midpoint" => {
                    if let (Some(&out), [p, q]) = (step.outs.first(), args.as_slice()) {
                        model.points.insert(out.clone(), (*p + *q) * 0.5);
                    }
                }
                "intersect_ll" => {
                    if let ([out], [a, b, c, d]) = (step.outs.as_slice(), args.as_slice()) {
                        let l1 = CartesianLine::through(*a, *b);
                        let l2 = CartesianLine::through(*c, *d);
                        if let Some(p) = intersect_line_line(&l1, &l2) {
                            model.points.insert(out.clone(), p);
                        }
                    }
                }
                "on_circle" => {
                    if let ([out], [center]) = (step.outs.as_slice(), args.as_slice()) {
                        let theta = rng().lock().unwrap().gen_range(0.0..std::f64::consts::TAU);
                        let radius = 1.0 + rng().lock().unwrap().gen_range(0.0..4.0);
                        model.points.insert(out.clone(), CartesianPoint::new(center.x + radius * theta.cos(), center.y + radius * theta.sin()));
                    }
                }
                "para_point" => {
                    // d s.t. AD || BC and AB || CD, given a, b, c.
                    if let ([out], [a, b, c]) = (step.outs.as_slice(), args.as_slice()) {
                        model.points.insert(out.clone(), *a + (*c - *b));
                    }
                }
                _ => {
                    for out in &step.outs {
                        model.points.insert(out.clone(), random_point());
                    }
                }
            }
        }
        model
    }

    /// Approximate truth check for the handful of predicate shapes the
    /// sanity filter cares about. Never used to prove anything (Non-goal:
    /// "no numeric proof") — only to flag a construction as likely
    /// inconsistent before the symbolic engines run on it.
    pub fn check_coll(&self, a: &str, b: &str, c: &str) -> Option<bool> {
        let (a, b, c) = (self.point(a)?, self.point(b)?, self.point(c)?);
        Some(CartesianLine::through(a, b).contains(c))
    }

    pub fn check_para(&self, a: &str, b: &str, c: &str, d: &str) -> Option<bool> {
        let (a, b, c, d) = (self.point(a)?, self.point(b)?, self.point(c)?, self.point(d)?);
        let l1 = CartesianLine::through(a, b);
        let l2 = CartesianLine::through(c, d);
        Some(is_close(l1.angle_between(&l2), 0.0))
    }

    pub fn check_perp(&self, a: &str, b: &str, c: &str, d: &str) -> Option<bool> {
        let (a, b, c, d) = (self.point(a)?, self.point(b)?, self.point(c)?, self.point(d)?);
        let l1 = CartesianLine::through(a, b);
        let l2 = CartesianLine::through(c, d);
        Some(is_close(l1.angle_between(&l2), std::f64::consts::FRAC_PI_2))
    }

    pub fn check_cong(&self, a: &str, b: &str, c: &str, d: &str) -> Option<bool> {
        let (a, b, c, d) = (self.point(a)?, self.point(b)?, self.point(c)?, self.point(d)?);
        Some(is_close(a.distance(&b), c.distance(&d)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intersect_line_line_finds_crossing_point() {
        let l1 = CartesianLine::through(CartesianPoint::new(0.0, 0.0), CartesianPoint::new(2.0, 2.0));
        let l2 = CartesianLine::through(CartesianPoint::new(0.0, 2.0), CartesianPoint::new(2.0, 0.0));
        let p = intersect_line_line(&l1, &l2).unwrap();
        assert!(p.is_same(&CartesianPoint::new(1.0, 1.0)));
    }

    #[test]
    fn midpoint_construction_realizes_exact_average() {
        let steps = vec![
            NumericStep { outs: vec!["a".into()], kind: "free".into(), args: vec![] },
            NumericStep { outs: vec!["b".into()], kind: "free".into(), args: vec![] },
            NumericStep { outs: vec!["m".into()], kind: "midpoint".into(), args: vec!["a".into(), "b".into()] },
        ];
        let model = CartesianModel::realize(&steps);
        let (a, b, m) = (model.point("a").unwrap(), model.point("b").unwrap(), model.point("m").unwrap());
        assert!(m.is_same(&((a + b) * 0.5)));
    }

    #[test]
    fn collinear_midpoints_satisfy_coll_check() {
        let steps = vec![
            NumericStep { outs: vec!["a".into()], kind: "free".into(), args: vec![] },
            NumericStep { outs: vec!["b".into()], kind: "free".into(), args: vec![] },
            NumericStep { outs: vec!["c".into()], kind: "free".into(), args: vec![] },
            NumericStep { outs: vec!["m".into()], kind: "midpoint".into(), args: vec!["a".into(), "b".into()] },
        ];
        let model = CartesianModel::realize(&steps);
        assert_eq!(model.check_coll("a", "m", "b"), Some(true));
    }
}

//! Per-predicate-kind matchers (§4.8.1).
//!
//! Each matcher takes a partially-bound argument tuple (`None` for a still
//! free hole) and yields every completion consistent with the current
//! state of the geometric graph. The fully-bound case is answered directly
//! against GG's `check_*` family (§4.6.5); the partial/unbound cases are
//! answered by generating the already-valid tuples from GG's structural
//! indices (directions, lengths, measures, ...) and filtering by the bound
//! positions — a enumerate-then-filter simplification of the "pivot on the
//! bound points" shape described in the spec, chosen because these
//! problems are small and the win from a fully pivoted indexed matcher
//! would not show up in any seed scenario (see DESIGN.md).

use crate::frac::Frac;
use crate::geometry::entities::{AngleId, DirectionId, LengthId, PointId, RatioId};
use crate::geometry::GeometricGraph;
use crate::predicate::PredicateKind;

pub type PredId = usize;
pub type Gg = GeometricGraph<PredId>;
pub type Pt = PointId<PredId>;

fn ordered_pairs(pts: &[Pt]) -> Vec<(Pt, Pt)> {
    let mut out = Vec::new();
    for &a in pts {
        for &b in pts {
            if a != b {
                out.push((a, b));
            }
        }
    }
    out
}

fn ordered_triples_on_line(gg: &mut Gg, l: crate::geometry::entities::LineId<PredId>) -> Vec<[Pt; 3]> {
    let pts = gg.line_points(l);
    let mut out = Vec::new();
    for &a in &pts {
        for &b in &pts {
            if b == a {
                continue;
            }
            for &c in &pts {
                if c == a || c == b {
                    continue;
                }
                out.push([a, b, c]);
            }
        }
    }
    out
}

fn direction_point_pairs(gg: &mut Gg, d: DirectionId<PredId>) -> Vec<(Pt, Pt)> {
    let lines = gg.direction_lines(d);
    let mut out = Vec::new();
    for l in lines {
        out.extend(ordered_pairs(&gg.line_points(l)));
    }
    out
}

fn length_point_pairs(gg: &mut Gg, len: LengthId<PredId>) -> Vec<(Pt, Pt)> {
    let segs = gg.length_segments(len);
    let mut out = Vec::new();
    for s in segs {
        let (p, q) = gg.segment_points(s);
        out.push((p, q));
        out.push((q, p));
    }
    out
}

fn angle_point_quads(gg: &mut Gg, a: AngleId<PredId>) -> Vec<[Pt; 4]> {
    let (d1, d2) = gg.angle_dirs(a);
    let lhs = direction_point_pairs(gg, d1);
    let rhs = direction_point_pairs(gg, d2);
    let mut out = Vec::new();
    for &(p1, p2) in &lhs {
        for &(p3, p4) in &rhs {
            out.push([p1, p2, p3, p4]);
        }
    }
    out
}

fn ratio_point_quads(gg: &mut Gg, r: RatioId<PredId>) -> Vec<[Pt; 4]> {
    let (l1, l2) = gg.ratio_lens(r);
    let lhs = length_point_pairs(gg, l1);
    let rhs = length_point_pairs(gg, l2);
    let mut out = Vec::new();
    for &(p1, p2) in &lhs {
        for &(p3, p4) in &rhs {
            out.push([p1, p2, p3, p4]);
        }
    }
    out
}

/// Direction of the line through `p1`,`p2`, if that line exists and has one.
fn direction_of(gg: &mut Gg, p1: Pt, p2: Pt) -> Option<DirectionId<PredId>> {
    let l = gg.try_get_line(p1, p2)?;
    gg.line_direction(l)
}

fn length_of(gg: &mut Gg, p1: Pt, p2: Pt) -> Option<LengthId<PredId>> {
    let s = gg.try_get_segment(p1, p2)?;
    gg.segment_length(s)
}

// -- verify: fully-bound fast path ---------------------------------------

pub fn verify_coll(gg: &mut Gg, a: Pt, b: Pt, c: Pt) -> bool {
    gg.check_coll(a, b, c)
}

pub fn verify_ncoll(gg: &mut Gg, a: Pt, b: Pt, c: Pt) -> bool {
    !gg.check_coll(a, b, c)
}

pub fn verify_neq(gg: &mut Gg, a: Pt, b: Pt) -> bool {
    gg.root_point(a) != gg.root_point(b)
}

pub fn verify_cyclic(gg: &mut Gg, pts: [Pt; 4]) -> bool {
    gg.check_cyclic(pts)
}

pub fn verify_para(gg: &mut Gg, a: Pt, b: Pt, c: Pt, d: Pt) -> bool {
    match (gg.try_get_line(a, b), gg.try_get_line(c, d)) {
        (Some(l1), Some(l2)) => gg.check_para(l1, l2),
        _ => false,
    }
}

pub fn verify_perp(gg: &mut Gg, a: Pt, b: Pt, c: Pt, d: Pt) -> bool {
    match (gg.try_get_line(a, b), gg.try_get_line(c, d)) {
        (Some(l1), Some(l2)) => gg.check_perp(l1, l2),
        _ => false,
    }
}

pub fn verify_cong(gg: &mut Gg, a: Pt, b: Pt, c: Pt, d: Pt) -> bool {
    gg.check_cong(a, b, c, d)
}

pub fn verify_eqangle(gg: &mut Gg, p: [Pt; 8]) -> bool {
    let dirs: Option<Vec<DirectionId<PredId>>> = [
        direction_of(gg, p[0], p[1]),
        direction_of(gg, p[2], p[3]),
        direction_of(gg, p[4], p[5]),
        direction_of(gg, p[6], p[7]),
    ]
    .into_iter()
    .collect();
    let Some(dirs) = dirs else { return false };
    let a1 = gg.get_or_add_angle(dirs[0], dirs[1]);
    let a2 = gg.get_or_add_angle(dirs[2], dirs[3]);
    gg.check_eqangle(a1, a2)
}

pub fn verify_eqratio(gg: &mut Gg, p: [Pt; 8]) -> bool {
    let lens: Option<Vec<LengthId<PredId>>> = [
        length_of(gg, p[0], p[1]),
        length_of(gg, p[2], p[3]),
        length_of(gg, p[4], p[5]),
        length_of(gg, p[6], p[7]),
    ]
    .into_iter()
    .collect();
    let Some(lens) = lens else { return false };
    let r1 = gg.get_or_add_ratio(lens[0], lens[1]);
    let r2 = gg.get_or_add_ratio(lens[2], lens[3]);
    gg.check_eqratio(r1, r2)
}

pub fn verify_midp(gg: &mut Gg, m: Pt, a: Pt, b: Pt) -> bool {
    gg.check_coll(m, a, b) && gg.check_cong(m, a, m, b)
}

/// `deg` is in degrees (0..360), matching the predicate's on-the-wire
/// convention; internally measures are stored in half-turn units (§4.9's
/// `pi` = 180° convention), so we compare against `deg/180`.
pub fn verify_constangle(gg: &mut Gg, a: Pt, b: Pt, c: Pt, d: Pt, deg: Frac) -> bool {
    let (Some(d1), Some(d2)) = (direction_of(gg, a, b), direction_of(gg, c, d)) else {
        return false;
    };
    let angle = gg.get_or_add_angle(d1, d2);
    let Some(measure) = gg.angle_measure(angle) else {
        return false;
    };
    match gg.measure_value(measure) {
        Some(v) => v == deg / Frac::new(180, 1),
        None => false,
    }
}

pub fn verify_constratio(gg: &mut Gg, a: Pt, b: Pt, c: Pt, d: Pt, val: Frac) -> bool {
    let (Some(l1), Some(l2)) = (length_of(gg, a, b), length_of(gg, c, d)) else {
        return false;
    };
    let ratio = gg.get_or_add_ratio(l1, l2);
    let Some(fraction) = gg.ratio_fraction(ratio) else {
        return false;
    };
    matches!(gg.fraction_value(fraction), Some(v) if v == val)
}

pub fn verify_contri(gg: &mut Gg, t1: [Pt; 3], t2: [Pt; 3]) -> bool {
    let (Some(a), Some(b)) = (gg.triangle_by_verts(t1), gg.triangle_by_verts(t2)) else {
        return false;
    };
    match (gg.triangle_dimension(a), gg.triangle_dimension(b)) {
        (Some(d1), Some(d2)) => gg.root_dimension(d1) == gg.root_dimension(d2),
        _ => false,
    }
}

pub fn verify_simtri(gg: &mut Gg, t1: [Pt; 3], t2: [Pt; 3]) -> bool {
    let (Some(a), Some(b)) = (gg.triangle_by_verts(t1), gg.triangle_by_verts(t2)) else {
        return false;
    };
    let (Some(d1), Some(d2)) = (gg.triangle_dimension(a), gg.triangle_dimension(b)) else {
        return false;
    };
    match (gg.dimension_shape(d1), gg.dimension_shape(d2)) {
        (Some(s1), Some(s2)) => gg.root_shape(s1) == gg.root_shape(s2),
        _ => false,
    }
}

// -- candidate generation for partial/unbound matching -------------------

fn all_valid_coll(gg: &mut Gg) -> Vec<Vec<Pt>> {
    let mut out = Vec::new();
    for l in gg.all_root_lines() {
        if gg.line_length(l) >= 3 {
            for t in ordered_triples_on_line(gg, l) {
                out.push(t.to_vec());
            }
        }
    }
    out
}

fn all_valid_cyclic(gg: &mut Gg) -> Vec<Vec<Pt>> {
    let mut out = Vec::new();
    for c in gg.all_root_circles() {
        let pts = gg.circle_points(c);
        if pts.len() < 4 {
            continue;
        }
        for &a in &pts {
            for &b in &pts {
                if b == a {
                    continue;
                }
                for &cc in &pts {
                    if cc == a || cc == b {
                        continue;
                    }
                    for &d in &pts {
                        if d == a || d == b || d == cc {
                            continue;
                        }
                        out.push(vec![a, b, cc, d]);
                    }
                }
            }
        }
    }
    out
}

fn all_valid_para(gg: &mut Gg) -> Vec<Vec<Pt>> {
    let mut out = Vec::new();
    for d in gg.all_root_directions() {
        let lines = gg.direction_lines(d);
        for i in 0..lines.len() {
            for j in 0..lines.len() {
                if i == j {
                    continue;
                }
                for (a, b) in ordered_pairs(&gg.line_points(lines[i])) {
                    for (c, dd) in ordered_pairs(&gg.line_points(lines[j])) {
                        out.push(vec![a, b, c, dd]);
                    }
                }
            }
        }
    }
    out
}

fn all_valid_perp(gg: &mut Gg) -> Vec<Vec<Pt>> {
    let mut out = Vec::new();
    for d1 in gg.all_root_directions() {
        // Probe each other root direction's representative line for the
        // perp relation via `check_perp` rather than reading `perp`
        // directly, since GG does not expose it outside the entity module.
        let lines1 = gg.direction_lines(d1);
        let Some(&rep1) = lines1.first() else { continue };
        for d2 in gg.all_root_directions() {
            if d2 == d1 {
                continue;
            }
            let lines2 = gg.direction_lines(d2);
            let Some(&rep2) = lines2.first() else { continue };
            if !gg.check_perp(rep1, rep2) {
                continue;
            }
            for (a, b) in ordered_pairs(&gg.line_points(rep1)) {
                for (c, d) in ordered_pairs(&gg.line_points(rep2)) {
                    out.push(vec![a, b, c, d]);
                }
            }
        }
    }
    out
}

fn all_valid_cong(gg: &mut Gg) -> Vec<Vec<Pt>> {
    let mut out = Vec::new();
    for len in gg.all_root_lengths() {
        let pairs = length_point_pairs(gg, len);
        for i in 0..pairs.len() {
            for j in 0..pairs.len() {
                if i == j {
                    continue;
                }
                let (a, b) = pairs[i];
                let (c, d) = pairs[j];
                out.push(vec![a, b, c, d]);
            }
        }
    }
    out
}

fn all_valid_eqangle(gg: &mut Gg) -> Vec<Vec<Pt>> {
    let mut out = Vec::new();
    for m in gg.all_root_measures() {
        let angles = gg.measure_angles(m);
        for i in 0..angles.len() {
            for j in 0..angles.len() {
                if i == j {
                    continue;
                }
                for q1 in angle_point_quads(gg, angles[i]) {
                    for q2 in angle_point_quads(gg, angles[j]) {
                        out.push(vec![q1[0], q1[1], q1[2], q1[3], q2[0], q2[1], q2[2], q2[3]]);
                    }
                }
            }
        }
    }
    out
}

fn all_valid_eqratio(gg: &mut Gg) -> Vec<Vec<Pt>> {
    let mut out = Vec::new();
    for f in gg.all_root_fractions() {
        let ratios = gg.fraction_ratios(f);
        for i in 0..ratios.len() {
            for j in 0..ratios.len() {
                if i == j {
                    continue;
                }
                for q1 in ratio_point_quads(gg, ratios[i]) {
                    for q2 in ratio_point_quads(gg, ratios[j]) {
                        out.push(vec![q1[0], q1[1], q1[2], q1[3], q2[0], q2[1], q2[2], q2[3]]);
                    }
                }
            }
        }
    }
    out
}

fn all_valid_midp(gg: &mut Gg) -> Vec<Vec<Pt>> {
    let mut out = Vec::new();
    for l in gg.all_root_lines() {
        if gg.line_length(l) < 3 {
            continue;
        }
        for t in ordered_triples_on_line(gg, l) {
            if verify_midp(gg, t[0], t[1], t[2]) {
                out.push(t.to_vec());
            }
        }
    }
    out
}

fn all_valid_constangle(gg: &mut Gg) -> Vec<(Vec<Pt>, Frac)> {
    let mut out = Vec::new();
    for m in gg.all_root_measures() {
        let Some(value) = gg.measure_value(m) else {
            continue;
        };
        let deg = value * Frac::new(180, 1);
        for a in gg.measure_angles(m) {
            for q in angle_point_quads(gg, a) {
                out.push((q.to_vec(), deg));
            }
        }
    }
    out
}

fn all_valid_constratio(gg: &mut Gg) -> Vec<(Vec<Pt>, Frac)> {
    let mut out = Vec::new();
    for f in gg.all_root_fractions() {
        let Some(value) = gg.fraction_value(f) else {
            continue;
        };
        for r in gg.fraction_ratios(f) {
            for q in ratio_point_quads(gg, r) {
                out.push((q.to_vec(), value));
            }
        }
    }
    out
}

fn all_valid_contri(gg: &mut Gg) -> Vec<Vec<Pt>> {
    let mut out = Vec::new();
    for dim in gg.all_root_dimensions() {
        let tris = gg.dimension_triangles(dim);
        for i in 0..tris.len() {
            for j in 0..tris.len() {
                if i == j {
                    continue;
                }
                let v1 = gg.triangle_verts(tris[i]);
                let v2 = gg.triangle_verts(tris[j]);
                out.push(vec![v1[0], v1[1], v1[2], v2[0], v2[1], v2[2]]);
            }
        }
    }
    out
}

fn all_valid_simtri(gg: &mut Gg) -> Vec<Vec<Pt>> {
    let mut out = Vec::new();
    for shape in gg.all_root_shapes() {
        let dims = gg.shape_dimensions(shape);
        for i in 0..dims.len() {
            for j in 0..dims.len() {
                if i == j {
                    continue;
                }
                let t1 = gg.dimension_triangles(dims[i]);
                let t2 = gg.dimension_triangles(dims[j]);
                let (Some(&a), Some(&b)) = (t1.first(), t2.first()) else {
                    continue;
                };
                let v1 = gg.triangle_verts(a);
                let v2 = gg.triangle_verts(b);
                out.push(vec![v1[0], v1[1], v1[2], v2[0], v2[1], v2[2]]);
            }
        }
    }
    out
}

fn matches_bound(bound: &[Option<Pt>], candidate: &[Pt]) -> bool {
    bound.iter().zip(candidate).all(|(b, &p)| b.map_or(true, |bp| bp == p))
}

/// Point arity of a kind's matcher slots — for `ConstAngle`/`ConstRatio`
/// this is the 4 point holes, the trailing rational is handled separately.
pub fn point_arity(kind: PredicateKind) -> usize {
    match kind {
        PredicateKind::Coll | PredicateKind::NColl | PredicateKind::Midp => 3,
        PredicateKind::Neq => 2,
        PredicateKind::Para
        | PredicateKind::Perp
        | PredicateKind::Cyclic
        | PredicateKind::Cong
        | PredicateKind::ConstAngle
        | PredicateKind::ConstRatio => 4,
        PredicateKind::EqAngle | PredicateKind::EqRatio => 8,
        PredicateKind::Contri | PredicateKind::SimTri => 6,
        PredicateKind::SameSide => 6,
        PredicateKind::Convex => 4,
    }
}

/// Enumerates every completion of `bound` (point holes only) that the
/// current graph state satisfies for `kind`. `ConstAngle`/`ConstRatio`
/// additionally take the (already-bound, rule-literal) rational value.
pub fn enumerate(gg: &mut Gg, kind: PredicateKind, bound: &[Option<Pt>]) -> Vec<Vec<Pt>> {
    if bound.iter().all(Option::is_some) {
        let tup: Vec<Pt> = bound.iter().map(|b| b.unwrap()).collect();
        return if verify_fully_bound(gg, kind, &tup) { vec![tup] } else { vec![] };
    }
    let all = match kind {
        PredicateKind::Coll => all_valid_coll(gg),
        PredicateKind::Cyclic => all_valid_cyclic(gg),
        PredicateKind::Para => all_valid_para(gg),
        PredicateKind::Perp => all_valid_perp(gg),
        PredicateKind::Cong => all_valid_cong(gg),
        PredicateKind::EqAngle => all_valid_eqangle(gg),
        PredicateKind::EqRatio => all_valid_eqratio(gg),
        PredicateKind::Midp => all_valid_midp(gg),
        PredicateKind::Contri => all_valid_contri(gg),
        PredicateKind::SimTri => all_valid_simtri(gg),
        _ => Vec::new(),
    };
    all.into_iter().filter(|c| matches_bound(bound, c)).collect()
}

/// As [`enumerate`], for the two kinds (`ConstAngle`/`ConstRatio`) whose
/// fifth hole is the rational constant rather than a point.
pub fn enumerate_with_value(
    gg: &mut Gg,
    kind: PredicateKind,
    bound: &[Option<Pt>],
    value: Option<Frac>,
) -> Vec<(Vec<Pt>, Frac)> {
    if bound.iter().all(Option::is_some) {
        let tup: Vec<Pt> = bound.iter().map(|b| b.unwrap()).collect();
        let Some(v) = value else { return Vec::new() };
        let ok = match kind {
            PredicateKind::ConstAngle => verify_constangle(gg, tup[0], tup[1], tup[2], tup[3], v),
            PredicateKind::ConstRatio => verify_constratio(gg, tup[0], tup[1], tup[2], tup[3], v),
            _ => false,
        };
        return if ok { vec![(tup, v)] } else { vec![] };
    }
    let all = match kind {
        PredicateKind::ConstAngle => all_valid_constangle(gg),
        PredicateKind::ConstRatio => all_valid_constratio(gg),
        _ => Vec::new(),
    };
    all.into_iter()
        .filter(|(c, v)| matches_bound(bound, c) && value.map_or(true, |want| want == *v))
        .collect()
}

fn verify_fully_bound(gg: &mut Gg, kind: PredicateKind, t: &[Pt]) -> bool {
    match kind {
        PredicateKind::Coll => verify_coll(gg, t[0], t[1], t[2]),
        PredicateKind::NColl => verify_ncoll(gg, t[0], t[1], t[2]),
        PredicateKind::Neq => verify_neq(gg, t[0], t[1]),
        PredicateKind::Cyclic => verify_cyclic(gg, [t[0], t[1], t[2], t[3]]),
        PredicateKind::Para => verify_para(gg, t[0], t[1], t[2], t[3]),
        PredicateKind::Perp => verify_perp(gg, t[0], t[1], t[2], t[3]),
        PredicateKind::Cong => verify_cong(gg, t[0], t[1], t[2], t[3]),
        PredicateKind::EqAngle => verify_eqangle(gg, [t[0], t[1], t[2], t[3], t[4], t[5], t[6], t[7]]),
        PredicateKind::EqRatio => verify_eqratio(gg, [t[0], t[1], t[2], t[3], t[4], t[5], t[6], t[7]]),
        PredicateKind::Midp => verify_midp(gg, t[0], t[1], t[2]),
        PredicateKind::Contri => verify_contri(gg, [t[0], t[1], t[2]], [t[3], t[4], t[5]]),
        PredicateKind::SimTri => verify_simtri(gg, [t[0], t[1], t[2]], [t[3], t[4], t[5]]),
        PredicateKind::ConstAngle | PredicateKind::ConstRatio | PredicateKind::SameSide | PredicateKind::Convex => {
            false
        }
    }
}

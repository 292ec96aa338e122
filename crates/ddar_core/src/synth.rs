//! Synthesises geometric-graph structure from newly-posted predicates
//! (spec §4.10, step "b"/"c": "GG.synthesise_from_recent(AR)").
//!
//! The DD/AR engines only ever *read* incidence and equivalence structure
//! out of [`GeometricGraph`] (via `check_*`/`get_or_add_*`); something has
//! to turn a freshly-derived `para a b c d` predicate into an actual shared
//! `Direction` node before the next round's matchers can see it. That
//! something is this module. It also feeds the newly-formed angle/ratio
//! facts into [`ArEngine`] so the algebraic table grows in lockstep with
//! the graph, per §4.9.

use crate::ar::ArEngine;
use crate::dd::matchers::{Gg, PredId, Pt};
use crate::error::{Error, GGraphError};
use crate::predicate::{Arg, Predicate, PredicateKind};

fn pt(gg: &Gg, arg: &Arg) -> Option<Pt> {
    gg.point_by_name(arg.as_node()?)
}

fn pts<const N: usize>(gg: &Gg, pred: &Predicate) -> Option<[Pt; N]> {
    let mut v = Vec::with_capacity(N);
    for i in 0..N {
        v.push(pt(gg, &pred.args[i])?);
    }
    v.try_into().ok()
}

/// Applies one newly-posted predicate's structural consequences to `gg`,
/// and registers any angle/ratio equality it implies with `ar`. `id` is the
/// predicate's own id, used as the `why` witness for the structural
/// updates it causes.
pub fn synthesize(gg: &mut Gg, ar: &mut ArEngine, id: PredId, pred: &Predicate) -> Result<(), Error> {
    match pred.kind {
        PredicateKind::Coll => synth_coll(gg, id, pred).map_err(Error::from),
        PredicateKind::Cyclic => synth_cyclic(gg, id, pred).map_err(Error::from),
        PredicateKind::Para => synth_para(gg, ar, id, pred).map_err(Error::from),
        PredicateKind::Perp => synth_perp(gg, ar, id, pred),
        PredicateKind::Cong => synth_cong(gg, ar, id, pred).map_err(Error::from),
        PredicateKind::EqAngle => synth_eqangle(gg, ar, id, pred).map_err(Error::from),
        PredicateKind::EqRatio => synth_eqratio(gg, ar, id, pred).map_err(Error::from),
        PredicateKind::Midp => synth_midp(gg, ar, id, pred).map_err(Error::from),
        PredicateKind::ConstAngle => synth_const_angle(gg, ar, id, pred).map_err(Error::from),
        PredicateKind::ConstRatio => synth_const_ratio(gg, ar, id, pred).map_err(Error::from),
        PredicateKind::Contri => synth_contri(gg, id, pred).map_err(Error::from),
        PredicateKind::SimTri => synth_simtri(gg, id, pred).map_err(Error::from),
        // Guards carry no structure of their own; `sameside`/`convex` are
        // not among the required matchers (§4.8.1) and are not synthesised.
        PredicateKind::Neq | PredicateKind::NColl | PredicateKind::SameSide | PredicateKind::Convex => Ok(()),
    }
}

fn synth_coll(gg: &mut Gg, id: PredId, pred: &Predicate) -> Result<(), GGraphError> {
    let Some([a, b, c]) = pts::<3>(gg, pred) else { return Ok(()) };
    let l1 = gg.get_or_add_line(a, b, id);
    let l2 = gg.get_or_add_line(a, c, id);
    gg.merge_lines(l1, l2, id)
}

fn synth_cyclic(gg: &mut Gg, id: PredId, pred: &Predicate) -> Result<(), GGraphError> {
    let Some(quad) = pts::<4>(gg, pred) else { return Ok(()) };
    gg.get_or_add_circle(&quad, id);
    Ok(())
}

fn ensure_line_direction(gg: &mut Gg, line: crate::geometry::entities::LineId<PredId>, why: PredId) -> crate::geometry::entities::DirectionId<PredId> {
    if let Some(d) = gg.line_direction(line) {
        return d;
    }
    let d = gg.new_direction();
    gg.set_line_direction(line, d, why);
    d
}

fn ensure_segment_length(gg: &mut Gg, a: Pt, b: Pt, why: PredId) -> crate::geometry::entities::LengthId<PredId> {
    let seg = gg.get_or_add_segment(a, b);
    if let Some(l) = gg.segment_length(seg) {
        return l;
    }
    let l = gg.new_length();
    gg.set_segment_length(seg, l, why);
    l
}

fn synth_para(gg: &mut Gg, ar: &mut ArEngine, id: PredId, pred: &Predicate) -> Result<(), GGraphError> {
    let Some([a, b, c, d]) = pts::<4>(gg, pred) else { return Ok(()) };
    let l1 = gg.get_or_add_line(a, b, id);
    let l2 = gg.get_or_add_line(c, d, id);
    let d1 = ensure_line_direction(gg, l1, id);
    gg.set_line_direction(l2, d1, id);
    let d1 = gg.root_direction(d1);
    let d2 = gg.line_direction(l2).unwrap();
    ar.add_para(gg, d1, d2, id);
    Ok(())
}

fn synth_perp(gg: &mut Gg, ar: &mut ArEngine, id: PredId, pred: &Predicate) -> Result<(), Error> {
    let Some([a, b, c, d]) = pts::<4>(gg, pred) else { return Ok(()) };
    let l1 = gg.get_or_add_line(a, b, id);
    let l2 = gg.get_or_add_line(c, d, id);
    let d1 = ensure_line_direction(gg, l1, id);
    let d2 = ensure_line_direction(gg, l2, id);
    // `set_perp` errors if `d1`/`d2` already share a root, i.e. a prior
    // `para` already merged these two lines' directions (seed scenario S5).
    gg.set_perp(d1, d2, id)?;
    let d1 = gg.root_direction(d1);
    let d2 = gg.root_direction(d2);
    ar.add_perp(gg, d1, d2, id);
    Ok(())
}

fn synth_cong(gg: &mut Gg, ar: &mut ArEngine, id: PredId, pred: &Predicate) -> Result<(), GGraphError> {
    let Some([a, b, c, d]) = pts::<4>(gg, pred) else { return Ok(()) };
    let l1 = ensure_segment_length(gg, a, b, id);
    let l2 = ensure_segment_length(gg, c, d, id);
    gg.set_segment_length(gg.get_or_add_segment(c, d), l1, id);
    let l1 = gg.root_length(l1);
    let l2 = gg.root_length(l2);
    ar.add_cong(gg, l1, l2, id);
    Ok(())
}

fn synth_eqangle(gg: &mut Gg, ar: &mut ArEngine, id: PredId, pred: &Predicate) -> Result<(), GGraphError> {
    let Some(p) = pts::<8>(gg, pred) else { return Ok(()) };
    let l1 = gg.get_or_add_line(p[0], p[1], id);
    let l2 = gg.get_or_add_line(p[2], p[3], id);
    let l3 = gg.get_or_add_line(p[4], p[5], id);
    let l4 = gg.get_or_add_line(p[6], p[7], id);
    let d1 = ensure_line_direction(gg, l1, id);
    let d2 = ensure_line_direction(gg, l2, id);
    let d3 = ensure_line_direction(gg, l3, id);
    let d4 = ensure_line_direction(gg, l4, id);
    let a1 = gg.get_or_add_angle(d1, d2);
    let a2 = gg.get_or_add_angle(d3, d4);
    let measure = match gg.angle_measure(a1) {
        Some(m) => m,
        None => gg.new_measure(None),
    };
    gg.set_angle_measure(a1, measure, id);
    gg.set_angle_measure(a2, measure, id);
    ar.add_eqangle(gg, d1, d2, d3, d4, id);
    Ok(())
}

fn synth_eqratio(gg: &mut Gg, ar: &mut ArEngine, id: PredId, pred: &Predicate) -> Result<(), GGraphError> {
    let Some(p) = pts::<8>(gg, pred) else { return Ok(()) };
    let l1 = ensure_segment_length(gg, p[0], p[1], id);
    let l2 = ensure_segment_length(gg, p[2], p[3], id);
    let l3 = ensure_segment_length(gg, p[4], p[5], id);
    let l4 = ensure_segment_length(gg, p[6], p[7], id);
    let r1 = gg.get_or_add_ratio(l1, l2);
    let r2 = gg.get_or_add_ratio(l3, l4);
    let fraction = match gg.ratio_fraction(r1) {
        Some(f) => f,
        None => gg.new_fraction(None),
    };
    gg.set_ratio_fraction(r1, fraction, id);
    gg.set_ratio_fraction(r2, fraction, id);
    ar.add_eqratio(gg, l1, l2, l3, l4, id);
    Ok(())
}

fn synth_midp(gg: &mut Gg, ar: &mut ArEngine, id: PredId, pred: &Predicate) -> Result<(), GGraphError> {
    let Some([m, a, b]) = pts::<3>(gg, pred) else { return Ok(()) };
    let l1 = gg.get_or_add_line(a, b, id);
    let l2 = gg.get_or_add_line(m, a, id);
    gg.merge_lines(l1, l2, id)?;
    let la = ensure_segment_length(gg, m, a, id);
    let lb = ensure_segment_length(gg, m, b, id);
    gg.set_segment_length(gg.get_or_add_segment(m, b), la, id);
    let la = gg.root_length(la);
    let lb = gg.root_length(lb);
    ar.add_cong(gg, la, lb, id);
    Ok(())
}

fn synth_const_angle(gg: &mut Gg, ar: &mut ArEngine, id: PredId, pred: &Predicate) -> Result<(), GGraphError> {
    let Some([a, b, c, d]) = pts::<4>(gg, pred) else { return Ok(()) };
    let Arg::Rational(deg) = pred.args[4] else { return Ok(()) };
    let l1 = gg.get_or_add_line(a, b, id);
    let l2 = gg.get_or_add_line(c, d, id);
    let d1 = ensure_line_direction(gg, l1, id);
    let d2 = ensure_line_direction(gg, l2, id);
    let angle = gg.get_or_add_angle(d1, d2);
    let value = deg / crate::frac::Frac::new(180, 1);
    let measure = gg.angle_measure(angle).unwrap_or_else(|| gg.new_measure(Some(value)));
    gg.set_angle_measure(angle, measure, id);
    let (d1, d2) = (gg.root_direction(d1), gg.root_direction(d2));
    ar.add_const_angle(gg, d1, d2, deg, id);
    Ok(())
}

fn synth_const_ratio(gg: &mut Gg, ar: &mut ArEngine, id: PredId, pred: &Predicate) -> Result<(), GGraphError> {
    let Some([a, b, c, d]) = pts::<4>(gg, pred) else { return Ok(()) };
    let Arg::Rational(value) = pred.args[4] else { return Ok(()) };
    let l1 = ensure_segment_length(gg, a, b, id);
    let l2 = ensure_segment_length(gg, c, d, id);
    let ratio = gg.get_or_add_ratio(l1, l2);
    let fraction = gg.ratio_fraction(ratio).unwrap_or_else(|| gg.new_fraction(Some(value)));
    gg.set_ratio_fraction(ratio, fraction, id);
    let (l1, l2) = (gg.root_length(l1), gg.root_length(l2));
    ar.add_const_ratio(gg, l1, l2, value, id);
    Ok(())
}

fn synth_contri(gg: &mut Gg, id: PredId, pred: &Predicate) -> Result<(), GGraphError> {
    let Some(p) = pts::<6>(gg, pred) else { return Ok(()) };
    let t1 = gg.triangle_by_verts([p[0], p[1], p[2]]).unwrap_or_else(|| gg.add_triangle(format!("tri-{id}-1"), [p[0], p[1], p[2]]));
    let t2 = gg.triangle_by_verts([p[3], p[4], p[5]]).unwrap_or_else(|| gg.add_triangle(format!("tri-{id}-2"), [p[3], p[4], p[5]]));
    let dim = gg.triangle_dimension(t1).unwrap_or_else(|| {
        let d = gg.new_dimension();
        gg.set_triangle_dimension(t1, d, id);
        d
    });
    gg.set_triangle_dimension(t2, dim, id);
    Ok(())
}

fn synth_simtri(gg: &mut Gg, id: PredId, pred: &Predicate) -> Result<(), GGraphError> {
    let Some(p) = pts::<6>(gg, pred) else { return Ok(()) };
    let t1 = gg.triangle_by_verts([p[0], p[1], p[2]]).unwrap_or_else(|| gg.add_triangle(format!("tri-{id}-1"), [p[0], p[1], p[2]]));
    let t2 = gg.triangle_by_verts([p[3], p[4], p[5]]).unwrap_or_else(|| gg.add_triangle(format!("tri-{id}-2"), [p[3], p[4], p[5]]));
    let dim1 = gg.triangle_dimension(t1).unwrap_or_else(|| {
        let d = gg.new_dimension();
        gg.set_triangle_dimension(t1, d, id);
        d
    });
    let dim2 = gg.triangle_dimension(t2).unwrap_or_else(|| {
        let d = gg.new_dimension();
        gg.set_triangle_dimension(t2, d, id);
        d
    });
    let shape = gg.dimension_shape(dim1).unwrap_or_else(|| gg.new_shape());
    gg.set_dimension_shape(dim1, shape, id);
    gg.set_dimension_shape(dim2, shape, id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::GeometricGraph;

    #[test]
    fn coll_synthesis_puts_points_on_one_line() {
        let mut gg: Gg = GeometricGraph::new();
        let a = gg.add_point("a");
        let b = gg.add_point("b");
        let c = gg.add_point("c");
        let mut ar = ArEngine::new();

        let pred = Predicate::new(
            PredicateKind::Coll,
            vec![Arg::Node("a".into()), Arg::Node("b".into()), Arg::Node("c".into())],
            vec![],
        );
        synthesize(&mut gg, &mut ar, 0, &pred).unwrap();
        assert!(gg.check_coll(a, b, c));
    }

    #[test]
    fn para_synthesis_shares_a_direction() {
        let mut gg: Gg = GeometricGraph::new();
        for n in ["a", "b", "c", "d"] {
            gg.add_point(n);
        }
        let (a, b, c, d) = (
            gg.point_by_name("a").unwrap(),
            gg.point_by_name("b").unwrap(),
            gg.point_by_name("c").unwrap(),
            gg.point_by_name("d").unwrap(),
        );
        let mut ar = ArEngine::new();
        let pred = Predicate::new(
            PredicateKind::Para,
            vec![Arg::Node("a".into()), Arg::Node("b".into()), Arg::Node("c".into()), Arg::Node("d".into())],
            vec![],
        );
        synthesize(&mut gg, &mut ar, 0, &pred).unwrap();
        let l1 = gg.get_or_add_line(a, b, 0);
        let l2 = gg.get_or_add_line(c, d, 0);
        assert!(gg.check_para(l1, l2));
    }
}

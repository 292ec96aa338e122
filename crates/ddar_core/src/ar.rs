//! Algebraic reasoning engine (C9).
//!
//! Thin orchestration over the symbolic [`Table`]s in [`crate::table`]: maps
//! angle/ratio facts coming out of GG onto two tables (`angle_table`, whose
//! distinguished constant conceptually represents a straight angle — 1 unit
//! = 180°; `ratio_table`, whose constant represents the unit ratio), and
//! turns newly-derived table consequences back into predicates for the DD
//! engine to uniquify (§4.9).

use std::collections::BTreeMap;

use crate::error::ArInternalError;
use crate::expr::{one, Expr, Var};
use crate::frac::Frac;
use crate::geometry::entities::{DirectionId, LengthId};
use crate::lp::LinearProgram;
use crate::predicate::{Arg, Predicate, PredicateKind};
use crate::table::Table;
use crate::dd::matchers::{Gg, PredId};

/// One fact ready to be posted into the DD engine: its kind, point
/// arguments (and trailing rational for the two constant kinds), and the
/// supporting predicates the LP witness turned up.
pub struct Derived {
    pub kind: PredicateKind,
    pub points: Vec<crate::dd::matchers::Pt>,
    pub value: Option<Frac>,
    pub why: Vec<PredId>,
}

pub struct ArEngine {
    angle_table: Table<PredId>,
    ratio_table: Table<PredId>,
    var_to_direction: BTreeMap<Var, DirectionId<PredId>>,
    direction_to_var: BTreeMap<DirectionId<PredId>, Var>,
    var_to_length: BTreeMap<Var, LengthId<PredId>>,
    length_to_var: BTreeMap<LengthId<PredId>, Var>,
}

impl Default for ArEngine {
    fn default() -> Self {
        ArEngine::new()
    }
}

impl ArEngine {
    pub fn new() -> ArEngine {
        ArEngine {
            angle_table: Table::new(),
            ratio_table: Table::new(),
            var_to_direction: BTreeMap::new(),
            direction_to_var: BTreeMap::new(),
            var_to_length: BTreeMap::new(),
            length_to_var: BTreeMap::new(),
        }
    }

    fn var_for_direction(&mut self, gg: &mut Gg, d: DirectionId<PredId>) -> Var {
        let d = gg.root_direction(d);
        if let Some(v) = self.direction_to_var.get(&d) {
            return v.clone();
        }
        let var = Var::new(gg.direction_name(d));
        self.var_to_direction.insert(var.clone(), d);
        self.direction_to_var.insert(d, var.clone());
        self.angle_table.add_free(var.clone());
        var
    }

    fn var_for_length(&mut self, gg: &mut Gg, l: LengthId<PredId>) -> Var {
        let l = gg.root_length(l);
        if let Some(v) = self.length_to_var.get(&l) {
            return v.clone();
        }
        let var = Var::new(gg.length_name(l));
        self.var_to_length.insert(var.clone(), l);
        self.length_to_var.insert(l, var.clone());
        self.ratio_table.add_free(var.clone());
        var
    }

    // -- adapter API (§4.9) ----------------------------------------------

    pub fn add_para(&mut self, gg: &mut Gg, d1: DirectionId<PredId>, d2: DirectionId<PredId>, pred: PredId) -> bool {
        let (v1, v2) = (self.var_for_direction(gg, d1), self.var_for_direction(gg, d2));
        self.angle_table.add_eq_3(&v1, &v2, Frac::ZERO, pred)
    }

    pub fn add_perp(&mut self, gg: &mut Gg, d1: DirectionId<PredId>, d2: DirectionId<PredId>, pred: PredId) -> bool {
        let (v1, v2) = (self.var_for_direction(gg, d1), self.var_for_direction(gg, d2));
        self.angle_table.add_eq_3(&v1, &v2, Frac::new(1, 2), pred)
    }

    /// `degrees` is in the predicate's on-the-wire convention (0..360); the
    /// table stores the half-turn fraction `degrees/180`.
    pub fn add_const_angle(&mut self, gg: &mut Gg, d1: DirectionId<PredId>, d2: DirectionId<PredId>, degrees: Frac, pred: PredId) -> bool {
        let (v1, v2) = (self.var_for_direction(gg, d1), self.var_for_direction(gg, d2));
        self.angle_table.add_eq_3(&v1, &v2, degrees / Frac::new(180, 1), pred)
    }

    pub fn add_eqangle(
        &mut self,
        gg: &mut Gg,
        d1: DirectionId<PredId>,
        d2: DirectionId<PredId>,
        d3: DirectionId<PredId>,
        d4: DirectionId<PredId>,
        pred: PredId,
    ) -> bool {
        let (v1, v2, v3, v4) = (
            self.var_for_direction(gg, d1),
            self.var_for_direction(gg, d2),
            self.var_for_direction(gg, d3),
            self.var_for_direction(gg, d4),
        );
        self.angle_table.add_eq_4(&v1, &v2, &v3, &v4, pred)
    }

    pub fn add_cong(&mut self, gg: &mut Gg, l1: LengthId<PredId>, l2: LengthId<PredId>, pred: PredId) -> bool {
        let (v1, v2) = (self.var_for_length(gg, l1), self.var_for_length(gg, l2));
        self.ratio_table.add_eq_3(&v1, &v2, Frac::ZERO, pred)
    }

    pub fn add_const_ratio(&mut self, gg: &mut Gg, l1: LengthId<PredId>, l2: LengthId<PredId>, value: Frac, pred: PredId) -> bool {
        let (v1, v2) = (self.var_for_length(gg, l1), self.var_for_length(gg, l2));
        self.ratio_table.add_eq_3(&v1, &v2, value, pred)
    }

    pub fn add_eqratio(
        &mut self,
        gg: &mut Gg,
        l1: LengthId<PredId>,
        l2: LengthId<PredId>,
        l3: LengthId<PredId>,
        l4: LengthId<PredId>,
        pred: PredId,
    ) -> bool {
        let (v1, v2, v3, v4) = (
            self.var_for_length(gg, l1),
            self.var_for_length(gg, l2),
            self.var_for_length(gg, l3),
            self.var_for_length(gg, l4),
        );
        self.ratio_table.add_eq_4(&v1, &v2, &v3, &v4, pred)
    }

    // -- derivation --------------------------------------------------------

    /// Runs `get_all_eqs` on both tables, turns each new consequence into a
    /// concrete point-level fact (picking a representative line/segment for
    /// each direction/length involved), and computes its `why` witness.
    /// Consequences whose direction/length has no representative incidence
    /// yet are dropped (nothing concrete to name the points with).
    pub fn derive(&mut self, gg: &mut Gg, solver: &dyn LinearProgram) -> Result<Vec<Derived>, ArInternalError> {
        let mut out = Vec::new();

        let angle_eqs = self.angle_table.get_all_eqs();
        for (v1, v2) in angle_eqs.eq_2s {
            if let Some(d) = self.para_fact(gg, &v1, &v2, PredicateKind::Para, Frac::ZERO, None, solver)? {
                out.push(d);
            }
        }
        for (v1, v2, f) in angle_eqs.eq_3s {
            // Directions have period 1 unit (180°): a residual that is an
            // integer number of whole turns is really a `para` fact, and
            // one a half-turn off of that is `perp` — reduce before
            // classifying.
            let residual = frac_mod_one(f);
            let kind = if residual == Frac::ZERO {
                PredicateKind::Para
            } else if residual == Frac::new(1, 2) {
                PredicateKind::Perp
            } else {
                PredicateKind::ConstAngle
            };
            let value = if kind == PredicateKind::ConstAngle { Some(residual * Frac::new(180, 1)) } else { None };
            if let Some(d) = self.para_fact(gg, &v1, &v2, kind, f, value, solver)? {
                out.push(d);
            }
        }
        for (v1, v2, v3, v4) in angle_eqs.eq_4s {
            if let Some(d) = self.eqangle_fact(gg, &v1, &v2, &v3, &v4, solver)? {
                out.push(d);
            }
        }

        let ratio_eqs = self.ratio_table.get_all_eqs();
        for (v1, v2) in ratio_eqs.eq_2s {
            if let Some(d) = self.cong_fact(gg, &v1, &v2, PredicateKind::Cong, None, solver)? {
                out.push(d);
            }
        }
        for (v1, v2, f) in ratio_eqs.eq_3s {
            if let Some(d) = self.cong_fact(gg, &v1, &v2, PredicateKind::ConstRatio, Some(f), solver)? {
                out.push(d);
            }
        }
        for (v1, v2, v3, v4) in ratio_eqs.eq_4s {
            if let Some(d) = self.eqratio_fact(gg, &v1, &v2, &v3, &v4, solver)? {
                out.push(d);
            }
        }

        Ok(out)
    }

    fn representative_line_points(&self, gg: &mut Gg, d: DirectionId<PredId>) -> Option<(crate::dd::matchers::Pt, crate::dd::matchers::Pt)> {
        let line = *gg.direction_lines(d).first()?;
        let pts = gg.line_points(line);
        Some((*pts.first()?, *pts.get(1)?))
    }

    fn representative_segment_points(&self, gg: &mut Gg, l: LengthId<PredId>) -> Option<(crate::dd::matchers::Pt, crate::dd::matchers::Pt)> {
        let seg = *gg.length_segments(l).first()?;
        Some(gg.segment_points(seg))
    }

    fn para_fact(
        &self,
        gg: &mut Gg,
        v1: &Var,
        v2: &Var,
        kind: PredicateKind,
        table_f: Frac,
        value: Option<Frac>,
        solver: &dyn LinearProgram,
    ) -> Result<Option<Derived>, ArInternalError> {
        let (&d1, &d2) = match (self.var_to_direction.get(v1), self.var_to_direction.get(v2)) {
            (Some(a), Some(b)) => (a, b),
            _ => return Ok(None),
        };
        let Some((a, b)) = self.representative_line_points(gg, d1) else { return Ok(None) };
        let Some((c, d)) = self.representative_line_points(gg, d2) else { return Ok(None) };
        let why = self.angle_table.why(&expr_eq3(v1, v2, table_f), solver)?;
        Ok(Some(Derived { kind, points: vec![a, b, c, d], value, why }))
    }

    fn eqangle_fact(
        &self,
        gg: &mut Gg,
        v1: &Var,
        v2: &Var,
        v3: &Var,
        v4: &Var,
        solver: &dyn LinearProgram,
    ) -> Result<Option<Derived>, ArInternalError> {
        let dirs: Option<Vec<DirectionId<PredId>>> = [v1, v2, v3, v4]
            .into_iter()
            .map(|v| self.var_to_direction.get(v).copied())
            .collect();
        let Some(dirs) = dirs else { return Ok(None) };
        let mut pts = Vec::with_capacity(8);
        for &d in &dirs {
            let Some((a, b)) = self.representative_line_points(gg, d) else { return Ok(None) };
            pts.push(a);
            pts.push(b);
        }
        let why = self.angle_table.why(&expr_eq4(v1, v2, v3, v4), solver)?;
        Ok(Some(Derived { kind: PredicateKind::EqAngle, points: pts, value: None, why }))
    }

    fn cong_fact(
        &self,
        gg: &mut Gg,
        v1: &Var,
        v2: &Var,
        kind: PredicateKind,
        value: Option<Frac>,
        solver: &dyn LinearProgram,
    ) -> Result<Option<Derived>, ArInternalError> {
        let (&l1, &l2) = match (self.var_to_length.get(v1), self.var_to_length.get(v2)) {
            (Some(a), Some(b)) => (a, b),
            _ => return Ok(None),
        };
        let Some((a, b)) = self.representative_segment_points(gg, l1) else { return Ok(None) };
        let Some((c, d)) = self.representative_segment_points(gg, l2) else { return Ok(None) };
        let why = self.ratio_table.why(&expr_eq3(v1, v2, value.unwrap_or(Frac::ZERO)), solver)?;
        Ok(Some(Derived { kind, points: vec![a, b, c, d], value, why }))
    }

    fn eqratio_fact(
        &self,
        gg: &mut Gg,
        v1: &Var,
        v2: &Var,
        v3: &Var,
        v4: &Var,
        solver: &dyn LinearProgram,
    ) -> Result<Option<Derived>, ArInternalError> {
        let lens: Option<Vec<LengthId<PredId>>> = [v1, v2, v3, v4]
            .into_iter()
            .map(|v| self.var_to_length.get(v).copied())
            .collect();
        let Some(lens) = lens else { return Ok(None) };
        let mut pts = Vec::with_capacity(8);
        for &l in &lens {
            let Some((a, b)) = self.representative_segment_points(gg, l) else { return Ok(None) };
            pts.push(a);
            pts.push(b);
        }
        let why = self.ratio_table.why(&expr_eq4(v1, v2, v3, v4), solver)?;
        Ok(Some(Derived { kind: PredicateKind::EqRatio, points: pts, value: None, why }))
    }
}

/// Reduces `f` to its residue in `[0, 1)` — directions repeat every whole
/// turn (1 unit = 180°) so only the residue tells you para vs perp vs a
/// genuine constant angle.
fn frac_mod_one(f: Frac) -> Frac {
    let floor_units = f.numer().div_euclid(f.denom());
    f - Frac::int(floor_units)
}

fn expr_eq3(v1: &Var, v2: &Var, f: Frac) -> Expr {
    let mut e = Expr::new();
    e.set(v1.clone(), Frac::ONE);
    e.set(v2.clone(), -Frac::ONE);
    e.set(one(), -f);
    e
}

fn expr_eq4(v1: &Var, v2: &Var, v3: &Var, v4: &Var) -> Expr {
    let mut e = Expr::new();
    e.set(v1.clone(), Frac::ONE);
    e.set(v2.clone(), -Frac::ONE);
    e.set(v3.clone(), -Frac::ONE);
    e.set(v4.clone(), Frac::ONE);
    e
}

/// Turns a [`Derived`] fact into a concrete [`Predicate`] over root point
/// names, ready for `DdEngine::insert_predicate`.
pub fn to_predicate(gg: &mut Gg, d: &Derived) -> Predicate {
    let mut args: Vec<Arg> = d
        .points
        .iter()
        .map(|&p| {
            let root = gg.root_point(p);
            Arg::Node(gg.point_name(root).to_string())
        })
        .collect();
    if matches!(d.kind, PredicateKind::ConstAngle | PredicateKind::ConstRatio) {
        if let Some(v) = d.value {
            args.push(Arg::Rational(v));
        }
    }
    Predicate::new(d.kind, args, d.why.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::GeometricGraph;
    use crate::lp::SimplexLp;

    #[test]
    fn perp_transitivity_surfaces_as_para() {
        let mut gg: Gg = GeometricGraph::new();
        let a = gg.add_point("a");
        let b = gg.add_point("b");
        let c = gg.add_point("c");
        let d = gg.add_point("d");
        let e = gg.add_point("e");
        let f = gg.add_point("f");

        let l_ab = gg.get_or_add_line(a, b, 0);
        let l_cd = gg.get_or_add_line(c, d, 0);
        let l_ef = gg.get_or_add_line(e, f, 0);

        let dir_ab = gg.add_direction("dir-ab");
        let dir_cd = gg.add_direction("dir-cd");
        let dir_ef = gg.add_direction("dir-ef");
        gg.set_line_direction(l_ab, dir_ab, 0);
        gg.set_line_direction(l_cd, dir_cd, 0);
        gg.set_line_direction(l_ef, dir_ef, 0);

        let mut ar = ArEngine::new();
        // perp(a,b,c,d) and perp(c,d,e,f)
        assert!(ar.add_perp(&mut gg, dir_ab, dir_cd, 1));
        assert!(ar.add_perp(&mut gg, dir_cd, dir_ef, 2));

        let solver = SimplexLp::new();
        let derived = ar.derive(&mut gg, &solver).unwrap();
        assert!(derived.iter().any(|d| d.kind == PredicateKind::Para));
    }
}

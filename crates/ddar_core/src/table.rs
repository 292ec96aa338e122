//! Symbolic linear-equality table — the AR core (C4).
//!
//! A [`Table`] maintains a set of linear equalities over [`Expr`]
//! variables in row-reduced form, derives consequences, and can explain any
//! derived equality by solving a small linear program over the predicates
//! that fed it (§4.4 `why`). It is generic over the witness type `W`
//! attached to each registered expression — callers needing predicate
//! identity instantiate `Table<PredId>`; tests can use `Table<&'static str>`.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::ArInternalError;
use crate::expr::{one, Expr, Var};
use crate::frac::Frac;
use crate::lp::LinearProgram;
use crate::matrix::SparseMatrix;

/// Column capacity per witness row; generous for the small systems AR
/// produces, and `SparseMatrix::set` errors loudly if it is ever exceeded.
const WITNESS_ROW_CAPACITY: usize = 64;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EqClasses {
    pub eq_2s: Vec<(Var, Var)>,
    pub eq_3s: Vec<(Var, Var, Frac)>,
    pub eq_4s: Vec<(Var, Var, Var, Var)>,
}

#[derive(Debug, Clone)]
pub struct Table<W> {
    var_to_expr: BTreeMap<Var, Expr>,
    /// Row-major record of every registered witness expression, for the
    /// `why` LP: row `i` is `expr_rows[i]`, `deps[i]` is its witness.
    expr_rows: Vec<Expr>,
    deps: Vec<W>,
    matrix: SparseMatrix,
    cost: Vec<f64>,
    var_row: BTreeMap<Var, usize>,
    eq_2s_seen: BTreeSet<(Var, Var)>,
    eq_3s_seen: BTreeSet<(Var, Var)>,
    eq_4s_seen: BTreeSet<(Var, Var, Var, Var)>,
    /// Equivalence classes of `eq_4` residual expressions already merged,
    /// keyed by a canonical representative pair.
    equal_groups: Vec<Vec<(Var, Var, Var, Var)>>,
}

impl<W: Clone> Default for Table<W> {
    fn default() -> Self {
        Table::new()
    }
}

impl<W: Clone> Table<W> {
    pub fn new() -> Table<W> {
        Table {
            var_to_expr: BTreeMap::new(),
            expr_rows: Vec::new(),
            deps: Vec::new(),
            matrix: SparseMatrix::new(0, 0, WITNESS_ROW_CAPACITY),
            cost: Vec::new(),
            var_row: BTreeMap::new(),
            eq_2s_seen: BTreeSet::new(),
            eq_3s_seen: BTreeSet::new(),
            eq_4s_seen: BTreeSet::new(),
            equal_groups: Vec::new(),
        }
    }

    pub fn contains(&self, v: &Var) -> bool {
        self.var_to_expr.contains_key(v)
    }

    pub fn expr_of(&self, v: &Var) -> Option<&Expr> {
        self.var_to_expr.get(v)
    }

    pub fn add_free(&mut self, v: Var) -> bool {
        if self.var_to_expr.contains_key(&v) {
            return false;
        }
        self.var_to_expr.insert(v.clone(), Expr::single(v, Frac::ONE));
        true
    }

    /// Incorporates `e = 0` into the row-reduced system, per spec §4.4.
    pub fn add_expr(&mut self, e: &Expr) -> bool {
        let (known, new): (Vec<Var>, Vec<Var>) = e
            .vars()
            .cloned()
            .filter(|v| *v != one())
            .partition(|v| self.var_to_expr.contains_key(v));

        let mut r = e.clone();
        for v in &known {
            let coeff = e.get(v);
            let substituted = self.var_to_expr[v].scale(coeff);
            r = r.sub(&Expr::single(v.clone(), coeff)).add(&substituted);
        }
        let r = r.strip().fix();

        if new.is_empty() {
            if r.all_zeroes() {
                return false;
            }
            let Some((subject, solved)) = r.get_subject(&one()) else {
                return false;
            };
            self.replace_everywhere(&subject, &solved);
            self.var_to_expr.insert(subject, solved);
            return true;
        }

        if new.len() == 1 {
            let v = new[0].clone();
            let d = r.get(&v);
            let mut rest = r.clone();
            rest.set(v.clone(), Frac::ZERO);
            let solved = rest.div(-d);
            self.var_to_expr.insert(v, solved);
            return true;
        }

        let dep = new[0].clone();
        let mut r2 = r;
        for free in &new[1..] {
            self.add_free(free.clone());
        }
        let d = r2.get(&dep);
        r2.set(dep.clone(), Frac::ZERO);
        let solved = r2.div(-d);
        self.var_to_expr.insert(dep, solved);
        true
    }

    /// Substitutes `subject` by `solved` in every existing row, keeping
    /// I-Table intact (every remaining row only mentions variables lexically
    /// before it).
    fn replace_everywhere(&mut self, subject: &Var, solved: &Expr) {
        let keys: Vec<Var> = self.var_to_expr.keys().cloned().collect();
        for k in keys {
            if let Some(expr) = self.var_to_expr.get(&k) {
                if expr.contains(subject) {
                    let replaced = expr.replace(subject, solved);
                    self.var_to_expr.insert(k, replaced);
                }
            }
        }
    }

    /// Asserts `m*v1 - n*v2 = 0`.
    pub fn add_eq_2(&mut self, v1: &Var, v2: &Var, m: Frac, n: Frac, pred: W) -> bool {
        let mut e = Expr::new();
        e.set(v1.clone(), m);
        e.set(v2.clone(), -n);
        self.register_expr(&e, pred);
        self.add_expr(&e)
    }

    /// Asserts `v1 - v2 = f`.
    pub fn add_eq_3(&mut self, v1: &Var, v2: &Var, f: Frac, pred: W) -> bool {
        let mut e = Expr::new();
        e.set(v1.clone(), Frac::ONE);
        e.set(v2.clone(), -Frac::ONE);
        e.set(one(), -f);
        self.register_expr(&e, pred);
        self.add_expr(&e)
    }

    /// Asserts `v1 - v2 = v3 - v4`.
    pub fn add_eq_4(&mut self, v1: &Var, v2: &Var, v3: &Var, v4: &Var, pred: W) -> bool {
        let mut e = Expr::new();
        e.set(v1.clone(), Frac::ONE);
        e.set(v2.clone(), -Frac::ONE);
        e.set(v3.clone(), -Frac::ONE);
        e.set(v4.clone(), Frac::ONE);
        self.register_expr(&e, pred);
        self.add_expr(&e)
    }

    fn row_for(&mut self, v: &Var) -> usize {
        if let Some(&row) = self.var_row.get(v) {
            return row;
        }
        let row = self.matrix.rows();
        self.matrix.extend_rows(1);
        self.var_row.insert(v.clone(), row);
        row
    }

    /// Appends `+e` and `-e` as two columns to the witness matrix, with
    /// `pred` recorded as the supporting predicate for both.
    fn register_expr(&mut self, e: &Expr, pred: W) {
        let rows: Vec<(Var, Frac)> = e.iter().map(|(v, c)| (v.clone(), *c)).collect();
        for (v, _) in &rows {
            self.row_for(v);
        }
        for sign in [1.0, -1.0] {
            self.matrix.extend_columns(1);
            let col = self.matrix.cols() - 1;
            for (v, c) in &rows {
                let row = self.var_row[v];
                let _ = self.matrix.set(row, col, sign * c.to_f64());
            }
            self.cost.push(1.0);
            self.deps.push(pred.clone());
        }
        self.expr_rows.push(e.clone());
    }

    /// Explains `e = 0` as a non-negative combination of registered
    /// expressions, returning the supporting predicates, or an empty
    /// witness if the LP is infeasible (not an AR consequence).
    pub fn why(&self, e: &Expr, solver: &dyn LinearProgram) -> Result<Vec<W>, ArInternalError> {
        if self.matrix.cols() == 0 {
            return Ok(Vec::new());
        }
        let m = self.matrix.rows();
        let mut b = vec![0.0; m];
        for (v, c) in e.iter() {
            let &row = self.var_row.get(v).ok_or_else(|| {
                ArInternalError::UnknownVariable(v.as_str().to_string())
            })?;
            b[row] += c.to_f64();
        }
        let Some(x) = solver.solve(&self.matrix, &b, &self.cost) else {
            return Ok(Vec::new());
        };
        let mut witness = Vec::new();
        for (i, &xi) in x.iter().enumerate() {
            if xi.abs() > 1e-7 {
                witness.push(self.deps[i].clone());
            }
        }
        Ok(witness)
    }

    /// Enumerates derived consequences among all known (non-`one`)
    /// variables, classifying by the residual's support, and returns only
    /// newly-surfaced links (the "seen" contract).
    pub fn get_all_eqs(&mut self) -> EqClasses {
        let vars: Vec<Var> = self
            .var_to_expr
            .keys()
            .filter(|v| **v != one())
            .cloned()
            .collect();

        let mut out = EqClasses::default();
        let mut by_residual: BTreeMap<String, Vec<(Var, Var)>> = BTreeMap::new();

        for i in 0..vars.len() {
            for j in (i + 1)..vars.len() {
                let (v1, v2) = (vars[i].clone(), vars[j].clone());
                let diff = self.var_to_expr[&v1].sub(&self.var_to_expr[&v2]).strip().fix();

                if diff.all_zeroes() {
                    let key = (v1.clone(), v2.clone());
                    if self.eq_2s_seen.insert(key.clone()) {
                        out.eq_2s.push(key);
                    }
                    continue;
                }

                let only_const = diff.vars().all(|v| *v == one());
                if only_const {
                    let key = (v1.clone(), v2.clone());
                    if self.eq_3s_seen.insert(key.clone()) {
                        out.eq_3s.push((v1, v2, diff.get(&one())));
                    }
                    continue;
                }

                let residual_key = format!("{diff}");
                by_residual.entry(residual_key).or_default().push((v1, v2));
            }
        }

        let links = self.update_equal_groups(by_residual);
        out.eq_4s = links;
        out
    }

    /// Merges newly-found pairs sharing a residual expression into existing
    /// equivalence groups (keyed by residual), returning a minimal
    /// spanning-tree set of quadruples that triangulates each group —
    /// i.e. for a residual shared by pairs `(a,b), (c,d), (e,f), ...` it
    /// emits `(a,b,c,d), (a,b,e,f), ...` rather than the full O(n²) set.
    fn update_equal_groups(
        &mut self,
        by_residual: BTreeMap<String, Vec<(Var, Var)>>,
    ) -> Vec<(Var, Var, Var, Var)> {
        let mut emitted = Vec::new();

        for (_residual, mut pairs) in by_residual {
            let group = self
                .equal_groups
                .iter_mut()
                .find(|g| g.first().map(|(a, b, _, _)| (a, b)) == pairs.first().map(|(a, b)| (a, b)));

            let anchor = if let Some(group) = group {
                group.first().map(|(a, b, _, _)| (a.clone(), b.clone()))
            } else {
                None
            };

            let (anchor_a, anchor_b) = anchor.unwrap_or_else(|| pairs[0].clone());
            if anchor.is_none() {
                pairs.remove(0);
                self.equal_groups.push(Vec::new());
            }

            for (c, d) in pairs {
                if (c == anchor_a && d == anchor_b) || (c == anchor_b && d == anchor_a) {
                    continue;
                }
                let quad = (anchor_a.clone(), anchor_b.clone(), c.clone(), d.clone());
                let canon = canonical_eq4(&quad);
                if self.eq_4s_seen.insert(canon) {
                    emitted.push(quad.clone());
                }
                if let Some(group) = self
                    .equal_groups
                    .iter_mut()
                    .find(|g| g.first().map(|(a, b, _, _)| (a, b)) == Some((&anchor_a, &anchor_b)))
                {
                    group.push(quad);
                } else {
                    self.equal_groups.push(vec![quad]);
                }
            }
        }

        emitted
    }
}

/// Canonicalizes an `eq_4` tuple under its 4 symmetry variants so the seen
/// check treats `(v1,v2,v3,v4)`, `(v2,v1,v4,v3)`, `(v3,v4,v1,v2)`, and
/// `(v4,v3,v2,v1)` as one fact.
fn canonical_eq4(q: &(Var, Var, Var, Var)) -> (Var, Var, Var, Var) {
    let (a, b, c, d) = q.clone();
    let variants = [
        (a.clone(), b.clone(), c.clone(), d.clone()),
        (b.clone(), a.clone(), d.clone(), c.clone()),
        (c.clone(), d.clone(), a.clone(), b.clone()),
        (d, c, b, a),
    ];
    variants.into_iter().min().unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lp::SimplexLp;

    fn v(s: &str) -> Var {
        Var::new(s)
    }

    #[test]
    fn add_free_then_eq_2_unifies_variables() {
        let mut t: Table<&'static str> = Table::new();
        t.add_free(v("a"));
        t.add_free(v("b"));
        assert!(t.add_eq_2(&v("a"), &v("b"), Frac::ONE, Frac::ONE, "cong"));
        let classes = t.get_all_eqs();
        assert_eq!(classes.eq_2s, vec![(v("a"), v("b"))]);
    }

    #[test]
    fn add_eq_3_records_constant_difference() {
        let mut t: Table<&'static str> = Table::new();
        t.add_free(v("a"));
        t.add_free(v("b"));
        t.add_eq_3(&v("a"), &v("b"), Frac::new(1, 2), "constangle");
        let classes = t.get_all_eqs();
        assert_eq!(classes.eq_3s, vec![(v("a"), v("b"), Frac::new(1, 2))]);
    }

    #[test]
    fn seen_sets_suppress_redundant_reemission() {
        let mut t: Table<&'static str> = Table::new();
        t.add_free(v("a"));
        t.add_free(v("b"));
        t.add_eq_2(&v("a"), &v("b"), Frac::ONE, Frac::ONE, "cong");
        let first = t.get_all_eqs();
        assert_eq!(first.eq_2s.len(), 1);
        let second = t.get_all_eqs();
        assert!(second.eq_2s.is_empty());
    }

    #[test]
    fn why_finds_supporting_predicate() {
        let mut t: Table<&'static str> = Table::new();
        t.add_free(v("a"));
        t.add_free(v("b"));
        t.add_eq_2(&v("a"), &v("b"), Frac::ONE, Frac::ONE, "cong-ab");

        let mut goal = Expr::new();
        goal.set(v("a"), Frac::ONE);
        goal.set(v("b"), -Frac::ONE);

        let solver = SimplexLp::new();
        let witness = t.why(&goal, &solver).unwrap();
        assert!(witness.contains(&"cong-ab"));
    }

    #[test]
    fn why_is_empty_for_an_untouched_table() {
        // No expression has ever been registered, so `why` short-circuits
        // on the `cols() == 0` base case (§4.4) rather than running the LP.
        let t: Table<&'static str> = Table::new();
        let mut goal = Expr::new();
        goal.set(v("ghost"), Frac::ONE);
        let solver = SimplexLp::new();
        assert!(t.why(&goal, &solver).unwrap().is_empty());
    }

    #[test]
    fn why_errors_on_a_variable_the_table_never_saw() {
        let mut t: Table<&'static str> = Table::new();
        t.add_free(v("a"));
        t.add_free(v("b"));
        t.add_eq_2(&v("a"), &v("b"), Frac::ONE, Frac::ONE, "cong-ab");

        let mut goal = Expr::new();
        goal.set(v("ghost"), Frac::ONE);
        let solver = SimplexLp::new();
        assert_eq!(t.why(&goal, &solver), Err(ArInternalError::UnknownVariable("ghost".to_string())));
    }
}

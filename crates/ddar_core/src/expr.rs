//! Linear expression algebra over named variables (C3).
//!
//! An [`Expr`] is a sparse linear combination `Σ vᵢ·cᵢ` with rational
//! coefficients. Variables sort lexicographically by name, which is the
//! ordering [`Table`](crate::table::Table) relies on to pick a subject
//! when row-reducing (I-Table).

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::frac::{Frac, TOL};

/// A cheaply-clonable interned variable name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Var(Rc<str>);

impl Var {
    pub fn new(name: impl AsRef<str>) -> Var {
        Var(Rc::from(name.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Var {
    fn from(s: &str) -> Var {
        Var::new(s)
    }
}

/// The distinguished constant variable, always present in a well-formed
/// equality; stands for the literal `1`.
pub fn one() -> Var {
    Var::new("one")
}

/// A sparse linear combination, keyed by variable name in sorted order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Expr(BTreeMap<Var, Frac>);

impl Expr {
    pub fn new() -> Expr {
        Expr(BTreeMap::new())
    }

    pub fn single(v: Var, c: Frac) -> Expr {
        let mut e = Expr::new();
        e.set(v, c);
        e
    }

    pub fn get(&self, v: &Var) -> Frac {
        self.0.get(v).copied().unwrap_or(Frac::ZERO)
    }

    pub fn set(&mut self, v: Var, c: Frac) {
        if c.is_zero() {
            self.0.remove(&v);
        } else {
            self.0.insert(v, c);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Var, &Frac)> {
        self.0.iter()
    }

    pub fn vars(&self) -> impl Iterator<Item = &Var> {
        self.0.keys()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, v: &Var) -> bool {
        self.0.contains_key(v)
    }

    /// Removes entries whose coefficient magnitude is below [`TOL`].
    pub fn strip(&self) -> Expr {
        let mut out = Expr::new();
        for (v, c) in &self.0 {
            if c.to_f64().abs() >= TOL {
                out.0.insert(v.clone(), *c);
            }
        }
        out
    }

    /// Snaps every coefficient to its nearest fraction within [`TOL`].
    pub fn fix(&self) -> Expr {
        let mut out = Expr::new();
        for (v, c) in &self.0 {
            if let Ok(snapped) = Frac::from_f64(c.to_f64()) {
                if !snapped.is_zero() {
                    out.0.insert(v.clone(), snapped);
                }
            }
        }
        out
    }

    pub fn all_zeroes(&self) -> bool {
        self.0.values().all(|c| c.to_f64().abs() < TOL)
    }

    pub fn add(&self, other: &Expr) -> Expr {
        let mut out = self.clone();
        for (v, c) in &other.0 {
            let new_c = out.get(v) + *c;
            out.set(v.clone(), new_c);
        }
        out
    }

    pub fn sub(&self, other: &Expr) -> Expr {
        let mut out = self.clone();
        for (v, c) in &other.0 {
            let new_c = out.get(v) - *c;
            out.set(v.clone(), new_c);
        }
        out
    }

    pub fn scale(&self, k: Frac) -> Expr {
        let mut out = Expr::new();
        for (v, c) in &self.0 {
            out.set(v.clone(), *c * k);
        }
        out
    }

    pub fn div(&self, k: Frac) -> Expr {
        let mut out = Expr::new();
        for (v, c) in &self.0 {
            out.set(v.clone(), *c / k);
        }
        out
    }

    /// Substitutes `v` in `self` by `replacement`, i.e. `v`'s coefficient
    /// is dropped and `coeff(v) * replacement` is added in its place.
    pub fn replace(&self, v: &Var, replacement: &Expr) -> Expr {
        let coeff = self.get(v);
        if coeff.is_zero() {
            return self.clone();
        }
        let mut out = self.clone();
        out.0.remove(v);
        out.add(&replacement.scale(coeff))
    }

    /// Given `Σ vᵢ·cᵢ = 0`, returns the lexicographically largest variable
    /// other than `excl` (the designated constant), with the expression
    /// divided through so that variable's coefficient becomes `-1` (i.e.
    /// solved for): `subject = (e without v) / -coeff(v)`.
    pub fn get_subject(&self, excl: &Var) -> Option<(Var, Expr)> {
        let v = self.0.keys().rev().find(|v| *v != excl)?.clone();
        let coeff = self.get(&v);
        let mut rest = self.clone();
        rest.0.remove(&v);
        Some((v, rest.div(-coeff)))
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "0");
        }
        let mut first = true;
        for (v, c) in &self.0 {
            if !first {
                write!(f, " + ")?;
            }
            write!(f, "{c}*{v}")?;
            first = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Var {
        Var::new(s)
    }

    #[test]
    fn strip_drops_small_coefficients() {
        let mut e = Expr::new();
        e.set(v("a"), Frac::new(1, 1));
        e.set(v("b"), Frac::try_new(0, 1).unwrap());
        assert_eq!(e.strip().vars().count(), 1);
    }

    #[test]
    fn add_sub_are_pointwise() {
        let mut a = Expr::new();
        a.set(v("x"), Frac::new(1, 1));
        let mut b = Expr::new();
        b.set(v("x"), Frac::new(2, 1));
        b.set(v("y"), Frac::new(3, 1));

        let sum = a.add(&b);
        assert_eq!(sum.get(&v("x")), Frac::new(3, 1));
        assert_eq!(sum.get(&v("y")), Frac::new(3, 1));

        let diff = a.sub(&b);
        assert_eq!(diff.get(&v("x")), Frac::new(-1, 1));
        assert_eq!(diff.get(&v("y")), Frac::new(-3, 1));
    }

    #[test]
    fn replace_substitutes_and_scales() {
        let mut e = Expr::new();
        e.set(v("a"), Frac::new(2, 1));
        e.set(v("b"), Frac::new(1, 1));

        let mut sub = Expr::new();
        sub.set(v("c"), Frac::new(1, 1));
        sub.set(one(), Frac::new(5, 1));

        let replaced = e.replace(&v("a"), &sub);
        assert_eq!(replaced.get(&v("a")), Frac::ZERO);
        assert_eq!(replaced.get(&v("c")), Frac::new(2, 1));
        assert_eq!(replaced.get(&one()), Frac::new(10, 1));
        assert_eq!(replaced.get(&v("b")), Frac::new(1, 1));
    }

    #[test]
    fn get_subject_picks_lex_largest_excluding_constant() {
        let mut e = Expr::new();
        e.set(v("alpha"), Frac::new(1, 1));
        e.set(v("zed"), Frac::new(2, 1));
        e.set(one(), Frac::new(-4, 1));

        let (subject, rest) = e.get_subject(&one()).unwrap();
        assert_eq!(subject, v("zed"));
        // zed = -(alpha - 4*one) / 2 = -alpha/2 + 2*one
        assert_eq!(rest.get(&v("alpha")), Frac::new(-1, 2));
        assert_eq!(rest.get(&one()), Frac::new(2, 1));
    }

    #[test]
    fn get_subject_empty_when_only_constant_present() {
        let mut e = Expr::new();
        e.set(one(), Frac::new(3, 1));
        assert!(e.get_subject(&one()).is_none());
    }
}

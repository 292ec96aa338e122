//! Predicate and template layer (C7).
//!
//! A [`Predicate`] names one of 16 fixed geometric facts plus its
//! argument tuple; its identity is a canonical hash string built from the
//! kind and the root-node names of its arguments. A [`Template`] is the
//! same shape with holes ([`Arg`]) still to be filled in by a matcher; a
//! [`Clause`] is an ordered list of templates sharing one argument
//! namespace (a rule's premises, or a construction's steps).

use std::fmt;

use crate::frac::Frac;

/// Stable identity of one of the 16 predicate kinds (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PredicateKind {
    Coll,
    Cyclic,
    Para,
    Perp,
    Cong,
    EqAngle,
    EqRatio,
    Contri,
    SimTri,
    Midp,
    ConstAngle,
    ConstRatio,
    Neq,
    NColl,
    SameSide,
    Convex,
}

impl PredicateKind {
    pub const ALL: [PredicateKind; 16] = [
        PredicateKind::Coll,
        PredicateKind::Cyclic,
        PredicateKind::Para,
        PredicateKind::Perp,
        PredicateKind::Cong,
        PredicateKind::EqAngle,
        PredicateKind::EqRatio,
        PredicateKind::Contri,
        PredicateKind::SimTri,
        PredicateKind::Midp,
        PredicateKind::ConstAngle,
        PredicateKind::ConstRatio,
        PredicateKind::Neq,
        PredicateKind::NColl,
        PredicateKind::SameSide,
        PredicateKind::Convex,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            PredicateKind::Coll => "coll",
            PredicateKind::Cyclic => "cyclic",
            PredicateKind::Para => "para",
            PredicateKind::Perp => "perp",
            PredicateKind::Cong => "cong",
            PredicateKind::EqAngle => "eqangle",
            PredicateKind::EqRatio => "eqratio",
            PredicateKind::Contri => "contri",
            PredicateKind::SimTri => "simtri",
            PredicateKind::Midp => "midp",
            PredicateKind::ConstAngle => "constangle",
            PredicateKind::ConstRatio => "constratio",
            PredicateKind::Neq => "neq",
            PredicateKind::NColl => "ncoll",
            PredicateKind::SameSide => "sameside",
            PredicateKind::Convex => "convex",
        }
    }

    pub fn from_name(name: &str) -> Option<PredicateKind> {
        PredicateKind::ALL.into_iter().find(|k| k.name() == name)
    }

    /// True for the two predicate kinds that act as negative guards
    /// during matching rather than being searched for positively (§4.8.1).
    pub fn is_guard(&self) -> bool {
        matches!(self, PredicateKind::Neq | PredicateKind::NColl)
    }

    /// Number of argument holes a fully-instantiated predicate of this
    /// kind carries.
    pub fn arity(&self) -> usize {
        match self {
            PredicateKind::Coll | PredicateKind::NColl => 3,
            PredicateKind::Para | PredicateKind::Perp => 4,
            PredicateKind::Cyclic => 4,
            PredicateKind::Cong => 4,
            PredicateKind::EqAngle | PredicateKind::EqRatio => 8,
            PredicateKind::Contri | PredicateKind::SimTri => 6,
            PredicateKind::Midp => 3,
            PredicateKind::ConstAngle => 5,
            PredicateKind::ConstRatio => 5,
            PredicateKind::Neq => 2,
            PredicateKind::SameSide => 6,
            PredicateKind::Convex => 4,
        }
    }
}

impl fmt::Display for PredicateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One argument slot: a node name, a rational constant, or a bare literal
/// (used by `constangle`/`constratio`'s trailing unit marker), or still
/// unbound.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Empty,
    Node(String),
    Rational(Frac),
    Literal(char),
}

impl Arg {
    pub fn is_empty(&self) -> bool {
        matches!(self, Arg::Empty)
    }

    pub fn as_node(&self) -> Option<&str> {
        match self {
            Arg::Node(n) => Some(n),
            _ => None,
        }
    }
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Empty => write!(f, "?"),
            Arg::Node(n) => write!(f, "{n}"),
            Arg::Rational(r) => write!(f, "{r}"),
            Arg::Literal(c) => write!(f, "{c}"),
        }
    }
}

/// Result of attempting to bind a template hole.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOutcome {
    /// The hole was empty and is now bound.
    Successful,
    /// The hole was already bound to an equal value; no-op.
    Unchanged,
    /// The hole was bound to a different value: unification failure.
    Unsuccessful,
}

/// Attempts to set `hole` to `value`, per the ternary contract of §4.7.
pub fn set_arg(hole: &mut Arg, value: Arg) -> SetOutcome {
    match hole {
        Arg::Empty => {
            *hole = value;
            SetOutcome::Successful
        }
        existing if *existing == value => SetOutcome::Unchanged,
        _ => SetOutcome::Unsuccessful,
    }
}

/// A fully (or partially) instantiated predicate.
///
/// Two predicates are equal iff their canonical `hash` strings are equal
/// (§4.7) — the derived `kind`/`args` are kept for display and for
/// matchers that need to inspect individual arguments.
#[derive(Debug, Clone)]
pub struct Predicate {
    pub kind: PredicateKind,
    pub args: Vec<Arg>,
    pub hash: String,
    /// Supporting predicate instances, by index into the engine's
    /// predicate table — an edge set in the implicit proof DAG.
    pub why: Vec<PredId>,
}

pub type PredId = usize;

impl Predicate {
    /// Builds a predicate from fully-bound root-node names, computing its
    /// canonical hash as `"<kind> <arg1> <arg2> ..."`.
    pub fn new(kind: PredicateKind, args: Vec<Arg>, why: Vec<PredId>) -> Predicate {
        let hash = canonical_hash(kind, &args);
        Predicate { kind, args, hash, why }
    }
}

impl PartialEq for Predicate {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
    }
}
impl Eq for Predicate {}

impl std::hash::Hash for Predicate {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.hash.hash(state);
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.hash)
    }
}

pub fn canonical_hash(kind: PredicateKind, args: &[Arg]) -> String {
    let mut s = kind.name().to_string();
    for a in args {
        s.push(' ');
        s.push_str(&a.to_string());
    }
    s
}

/// A template: a predicate kind with holes still to be filled, plus the
/// declared argument-variable name for each hole (how the rule file's
/// clause cross-references holes across premises).
#[derive(Debug, Clone)]
pub struct Template {
    pub kind: PredicateKind,
    pub holes: Vec<Arg>,
    pub hole_vars: Vec<String>,
}

impl Template {
    pub fn new(kind: PredicateKind, hole_vars: Vec<String>) -> Template {
        let holes = vec![Arg::Empty; hole_vars.len()];
        Template { kind, holes, hole_vars }
    }

    pub fn is_fully_bound(&self) -> bool {
        self.holes.iter().all(|h| !h.is_empty())
    }

    pub fn filled_mask(&self) -> Vec<bool> {
        self.holes.iter().map(|h| !h.is_empty()).collect()
    }

    /// Instantiates this template into a [`Predicate`] once fully bound.
    pub fn instantiate(&self, why: Vec<PredId>) -> Predicate {
        debug_assert!(self.is_fully_bound());
        Predicate::new(self.kind, self.holes.clone(), why)
    }
}

/// An ordered list of templates sharing one argument namespace: a rule's
/// premises, or a construction's steps.
#[derive(Debug, Clone)]
pub struct Clause {
    pub premises: Vec<Template>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predicate_identity_is_hash_based() {
        let p1 = Predicate::new(PredicateKind::Coll, vec![Arg::Node("a".into()), Arg::Node("b".into()), Arg::Node("c".into())], vec![]);
        let p2 = Predicate::new(PredicateKind::Coll, vec![Arg::Node("a".into()), Arg::Node("b".into()), Arg::Node("c".into())], vec![42]);
        assert_eq!(p1, p2);
        assert_eq!(p1.hash, "coll a b c");
    }

    #[test]
    fn set_arg_ternary_contract() {
        let mut hole = Arg::Empty;
        assert_eq!(set_arg(&mut hole, Arg::Node("p".into())), SetOutcome::Successful);
        assert_eq!(set_arg(&mut hole, Arg::Node("p".into())), SetOutcome::Unchanged);
        assert_eq!(set_arg(&mut hole, Arg::Node("q".into())), SetOutcome::Unsuccessful);
    }

    #[test]
    fn template_instantiate_requires_full_binding() {
        let mut t = Template::new(PredicateKind::Para, vec!["A".into(), "B".into(), "C".into(), "D".into()]);
        assert!(!t.is_fully_bound());
        for (i, name) in ["a", "b", "c", "d"].into_iter().enumerate() {
            set_arg(&mut t.holes[i], Arg::Node(name.into()));
        }
        assert!(t.is_fully_bound());
        let pred = t.instantiate(vec![]);
        assert_eq!(pred.hash, "para a b c d");
    }
}

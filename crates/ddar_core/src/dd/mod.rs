//! Deductive database engine (C8).
//!
//! Owns the rule/construction template store, the uniqued predicate table,
//! and the recursive rule-matching search described in spec §4.8. Matching
//! itself is delegated to [`matchers`]; this module is the CPS-style
//! recursive binder plus the predicate bookkeeping (uniquing, `by_kind`
//! index, the `recent_predicates` FIFO).

pub mod matchers;

use std::collections::{BTreeMap, HashMap, VecDeque};

use crate::frac::Frac;
use crate::predicate::{canonical_hash, Arg, Clause, PredId, Predicate, PredicateKind, Template};
use matchers::Gg;

/// A named theorem: a clause of premises (plus separately-tracked guard
/// premises, §4.8.1) and a conclusion template sharing one argument
/// namespace.
#[derive(Debug, Clone)]
pub struct Rule {
    pub name: String,
    pub premises: Vec<Template>,
    pub guards: Vec<Template>,
    pub conclusion: Template,
}

impl Rule {
    /// Splits a clause's templates into ordinary premises and guard
    /// premises (`ncoll`/`neq`), which are checked only after every
    /// ordinary premise has bound a value (§4.8.1).
    pub fn new(name: impl Into<String>, clause: Clause, conclusion: Template) -> Rule {
        let mut premises = Vec::new();
        let mut guards = Vec::new();
        for t in clause.premises {
            if t.kind.is_guard() {
                guards.push(t);
            } else {
                premises.push(t);
            }
        }
        Rule { name: name.into(), premises, guards, conclusion }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Binding {
    Point(matchers::Pt),
    Rational(Frac),
}

type Bindings = BTreeMap<String, Binding>;

pub struct DdEngine {
    rules: Vec<Rule>,
    predicates: Vec<Predicate>,
    hash_to_id: HashMap<String, PredId>,
    by_kind: HashMap<PredicateKind, Vec<PredId>>,
    recent: VecDeque<PredId>,
}

impl Default for DdEngine {
    fn default() -> Self {
        DdEngine::new()
    }
}

impl DdEngine {
    pub fn new() -> DdEngine {
        DdEngine {
            rules: Vec::new(),
            predicates: Vec::new(),
            hash_to_id: HashMap::new(),
            by_kind: HashMap::new(),
            recent: VecDeque::new(),
        }
    }

    pub fn load_rules(&mut self, rules: Vec<Rule>) {
        self.rules = rules;
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn predicate(&self, id: PredId) -> &Predicate {
        &self.predicates[id]
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn by_kind(&self, kind: PredicateKind) -> &[PredId] {
        self.by_kind.get(&kind).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Uniques `pred` by its canonical hash; returns `Some(id)` for a
    /// genuinely new fact, `None` if it already exists (§4.8, §8 property
    /// 7: predicate uniqueness).
    pub fn insert_predicate(&mut self, pred: Predicate) -> Option<PredId> {
        if self.hash_to_id.contains_key(&pred.hash) {
            return None;
        }
        let id = self.predicates.len();
        self.hash_to_id.insert(pred.hash.clone(), id);
        self.by_kind.entry(pred.kind).or_default().push(id);
        self.predicates.push(pred);
        self.recent.push_back(id);
        Some(id)
    }

    /// Drains the FIFO of predicates posted since the last drain (used by
    /// the driver to decide whether a round made progress and to feed GG
    /// synthesis, §4.10).
    pub fn drain_recent(&mut self) -> Vec<PredId> {
        self.recent.drain(..).collect()
    }

    fn lookup_hash(&self, hash: &str) -> Option<PredId> {
        self.hash_to_id.get(hash).copied()
    }

    /// Runs every rule's recursive match against `gg` once, posting newly
    /// derived predicates. Returns the ids of predicates actually added
    /// this pass.
    pub fn search(&mut self, gg: &mut Gg) -> Vec<PredId> {
        let mut newly = Vec::new();
        for i in 0..self.rules.len() {
            let rule = self.rules[i].clone();
            let mut bindings = Bindings::new();
            let mut supports = Vec::new();
            self.match_premise(gg, &rule, 0, &mut bindings, &mut supports, &mut newly);
        }
        newly
    }

    fn match_premise(
        &mut self,
        gg: &mut Gg,
        rule: &Rule,
        idx: usize,
        bindings: &mut Bindings,
        supports: &mut Vec<PredId>,
        newly: &mut Vec<PredId>,
    ) {
        if idx == rule.premises.len() {
            if self.guards_hold(gg, rule, bindings) {
                self.emit_conclusion(gg, rule, bindings, supports, newly);
            }
            return;
        }

        let template = &rule.premises[idx];
        let arity = matchers::point_arity(template.kind);
        let bound: Vec<Option<matchers::Pt>> = (0..arity)
            .map(|i| match bindings.get(&template.hole_vars[i]) {
                Some(Binding::Point(p)) => Some(*p),
                _ => None,
            })
            .collect();

        let completions = matchers::enumerate(gg, template.kind, &bound);
        for completion in completions {
            let mut newly_bound = Vec::new();
            for (i, &p) in completion.iter().enumerate() {
                let var = &template.hole_vars[i];
                if !bindings.contains_key(var) {
                    bindings.insert(var.clone(), Binding::Point(p));
                    newly_bound.push(var.clone());
                }
            }
            let support = self.support_for(gg, template.kind, &completion, None);
            let pushed = support.is_some();
            if let Some(id) = support {
                supports.push(id);
            }
            self.match_premise(gg, rule, idx + 1, bindings, supports, newly);
            if pushed {
                supports.pop();
            }
            for var in newly_bound {
                bindings.remove(&var);
            }
        }
    }

    /// `ncoll`/`neq` guards succeed trivially while unbound and are
    /// checked only once every ordinary premise has bound a value
    /// (§4.8.1).
    fn guards_hold(&self, gg: &mut Gg, rule: &Rule, bindings: &Bindings) -> bool {
        for guard in &rule.guards {
            let arity = matchers::point_arity(guard.kind);
            let pts: Option<Vec<matchers::Pt>> = (0..arity)
                .map(|i| match bindings.get(&guard.hole_vars[i]) {
                    Some(Binding::Point(p)) => Some(*p),
                    _ => None,
                })
                .collect();
            let Some(pts) = pts else { continue };
            let ok = match guard.kind {
                PredicateKind::NColl => matchers::verify_ncoll(gg, pts[0], pts[1], pts[2]),
                PredicateKind::Neq => matchers::verify_neq(gg, pts[0], pts[1]),
                _ => true,
            };
            if !ok {
                return false;
            }
        }
        true
    }

    /// Finds the already-posted predicate instance (if any) backing a
    /// matched premise, for the conclusion's `why` set.
    fn support_for(&self, gg: &mut Gg, kind: PredicateKind, pts: &[matchers::Pt], value: Option<Frac>) -> Option<PredId> {
        let args = point_args(gg, pts, kind, value);
        let hash = canonical_hash(kind, &args);
        self.lookup_hash(&hash)
    }

    fn emit_conclusion(
        &mut self,
        gg: &mut Gg,
        rule: &Rule,
        bindings: &Bindings,
        supports: &[PredId],
        newly: &mut Vec<PredId>,
    ) {
        let kind = rule.conclusion.kind;
        let arity = rule.conclusion.holes.len();
        let mut args = Vec::with_capacity(arity);
        for i in 0..arity {
            let var = &rule.conclusion.hole_vars[i];
            let arg = match &rule.conclusion.holes[i] {
                Arg::Rational(r) => Arg::Rational(*r),
                Arg::Literal(c) => Arg::Literal(*c),
                _ => match bindings.get(var) {
                    Some(Binding::Point(p)) => {
                        let root = gg.root_point(*p);
                        Arg::Node(gg.point_name(root).to_string())
                    }
                    Some(Binding::Rational(r)) => Arg::Rational(*r),
                    None => Arg::Empty,
                },
            };
            args.push(arg);
        }
        if args.iter().any(Arg::is_empty) {
            return; // conclusion references an argument never bound; skip
        }
        let pred = Predicate::new(kind, args, supports.to_vec());
        if let Some(id) = self.insert_predicate(pred) {
            newly.push(id);
        }
    }

    /// Checks whether `goal` (a fully-bound template over concrete point
    /// names) holds against `gg`, via the same matcher family used during
    /// search (§4.8.3).
    pub fn check_conclusion(&self, gg: &mut Gg, goal: &Template) -> bool {
        let arity = matchers::point_arity(goal.kind);
        let pts: Option<Vec<matchers::Pt>> = (0..arity)
            .map(|i| goal.holes[i].as_node().and_then(|n| gg.point_by_name(n)))
            .collect();
        let Some(pts) = pts else { return false };
        match goal.kind {
            PredicateKind::ConstAngle | PredicateKind::ConstRatio => {
                let Some(Arg::Rational(v)) = goal.holes.get(4) else { return false };
                let bound: Vec<Option<matchers::Pt>> = pts.iter().map(|&p| Some(p)).collect();
                !matchers::enumerate_with_value(gg, goal.kind, &bound, Some(*v)).is_empty()
            }
            _ => {
                let bound: Vec<Option<matchers::Pt>> = pts.iter().map(|&p| Some(p)).collect();
                !matchers::enumerate(gg, goal.kind, &bound).is_empty()
            }
        }
    }
}

/// Builds the root-name argument list for a point tuple (+ optional
/// trailing rational) in the canonical hash's format.
fn point_args(gg: &mut Gg, pts: &[matchers::Pt], kind: PredicateKind, value: Option<Frac>) -> Vec<Arg> {
    let mut args: Vec<Arg> = pts
        .iter()
        .map(|&p| {
            let root = gg.root_point(p);
            Arg::Node(gg.point_name(root).to_string())
        })
        .collect();
    if matches!(kind, PredicateKind::ConstAngle | PredicateKind::ConstRatio) {
        if let Some(v) = value {
            args.push(Arg::Rational(v));
        }
    }
    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicate::Arg as A;

    fn template(kind: PredicateKind, vars: &[&str]) -> Template {
        Template::new(kind, vars.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn insert_predicate_unique_by_hash() {
        let mut dd = DdEngine::new();
        let p1 = Predicate::new(PredicateKind::Coll, vec![A::Node("a".into()), A::Node("b".into()), A::Node("c".into())], vec![]);
        let p2 = Predicate::new(PredicateKind::Coll, vec![A::Node("a".into()), A::Node("b".into()), A::Node("c".into())], vec![]);
        assert!(dd.insert_predicate(p1).is_some());
        assert!(dd.insert_predicate(p2).is_none());
        assert_eq!(dd.predicates().len(), 1);
    }

    #[test]
    fn coll_rule_derives_new_fact() {
        // A trivial "coll(A,B,C) => ncoll-guarded noop" stand-in is not
        // useful; instead exercise the matcher plumbing with a rule whose
        // premise and conclusion are the same shape, so a successful match
        // of an existing `coll` fact posts its own predicate the first
        // time the engine runs.
        let mut gg: Gg = crate::geometry::GeometricGraph::new();
        let a = gg.add_point("a");
        let b = gg.add_point("b");
        let m = gg.add_point("m");

        let l_ab = gg.get_or_add_line(a, b, 0);
        let l_am = gg.get_or_add_line(a, m, 0);
        gg.merge_lines(l_ab, l_am, 0).unwrap();
        assert!(gg.check_coll(a, b, m));

        let prem1 = template(PredicateKind::Coll, &["A", "B", "M"]);
        let conclusion = template(PredicateKind::Coll, &["A", "B", "M"]);
        let rule = Rule::new("self", Clause { premises: vec![prem1] }, conclusion);

        let mut dd = DdEngine::new();
        dd.load_rules(vec![rule]);
        let added = dd.search(&mut gg);
        assert_eq!(added.len(), 1);
        assert_eq!(dd.predicate(added[0]).hash, "coll a b m");
    }
}

//! End-to-end scenarios driven through the real text formats: a rule
//! file and a construction file are parsed once, a problem file's named
//! section is parsed and applied stage by stage against a fresh
//! [`Solver`], and the goal is handed to `Solver::solve`. This is the
//! same wiring `ddar_cli` does, minus argument parsing and the numeric
//! sanity filter (out of scope for what these scenarios check).

use std::collections::HashMap;

use ddar_core::error::Error;
use ddar_core::parsers::{parse_construction_file, parse_problem_file, parse_rule_file, Construction};
use ddar_core::predicate::{set_arg, Arg, Predicate, Template};
use ddar_core::{Solver, Verdict};

const CONSTRUCTIONS: &str = "
triangle a b c :
ncoll a b c
ncoll a b c
a b c = triangle

segment a b :
neq a b
neq a b
a b = segment

midpoint m : a b
neq a b
midp m a b
m = midpoint a b

intersect_ll m : a b c d
neq a b
coll m a b, coll m c d
m = intersect_ll a b c d

para_point d : a b c
ncoll a b c
para a d b c, para a b c d, cong a d b c, cong a b c d
d = para_point a b c

on_circle_about e : c a b
neq e a, neq e b
cong c a c e
e = on_circle c

free_quad a b c d :
neq a b
neq a b
a b c d = free

assert_para : a b c d
neq a b
para a b c d
= given

assert_perp : a b c d
neq c d
perp a b c d
= given
";

/// Captures the median-concurrence theorem as one derivation step: the
/// three midpoints of a triangle's sides, together with the two lines
/// through opposite vertex/midpoint pairs, meet at a single point.
const MIDPOINT_RULE: &str = "A B C D E F G : midp D B C, midp E A C, midp F A B, coll G B E, coll G C F => coll G D A\n";

/// A parallelogram's diagonals bisect each other (ASA congruence of the
/// two triangles the diagonals cut, collapsed into one rule).
const PARALLELOGRAM_RULE: &str =
    "A B C D M : para A D B C, para A B C D, cong A D B C, coll M A C, coll M B D => midp M A C\n";

/// The inscribed-angle / Thales rule: a point on the circle whose
/// diameter is `A B`, seen from the circle's center as equidistant from
/// `A` and the point itself, subtends a right angle at `A B`.
const THALES_RULE: &str = "A B C E : midp C A B, cong C A C E => perp A E B E\n";

fn remap(binding: &HashMap<&str, String>, param: &str) -> String {
    binding.get(param).cloned().unwrap_or_else(|| param.to_string())
}

fn bind_template(template: &Template, binding: &HashMap<&str, String>) -> Predicate {
    let mut t = Template::new(template.kind, template.hole_vars.clone());
    for (i, (hole, var)) in template.holes.iter().zip(&template.hole_vars).enumerate() {
        let value = if hole.is_empty() { Arg::Node(remap(binding, var)) } else { hole.clone() };
        set_arg(&mut t.holes[i], value);
    }
    t.instantiate(vec![])
}

fn fully_bind(template: &Template) -> Template {
    let mut t = Template::new(template.kind, template.hole_vars.clone());
    for (i, (hole, var)) in template.holes.iter().zip(&template.hole_vars).enumerate() {
        let value = if hole.is_empty() { Arg::Node(var.clone()) } else { hole.clone() };
        set_arg(&mut t.holes[i], value);
    }
    t
}

/// Looks up one named construction, binds its parameters against a
/// stage's concrete point names, and feeds its postconditions through the
/// same `insert_predicate` + `synth::synthesize` pair the driver's own
/// `synthesize_all` uses.
fn apply_step<'a>(
    solver: &mut Solver,
    constructions: &[Construction],
    name: &str,
    existing_args: &[String],
    new_points: &mut std::slice::Iter<'a, String>,
) -> Result<(), Error> {
    let construction = constructions.iter().find(|c| c.name == name).unwrap_or_else(|| panic!("undefined construction '{name}'"));
    assert_eq!(construction.existing_args.len(), existing_args.len(), "construction '{name}' argument count mismatch");

    let mut binding: HashMap<&str, String> = HashMap::new();
    for (param, actual) in construction.existing_args.iter().zip(existing_args) {
        binding.insert(param.as_str(), actual.clone());
    }
    for param in &construction.new_args {
        let actual = new_points.next().expect("stage declares too few new points for its steps");
        if solver.gg.point_by_name(actual).is_none() {
            solver.gg.add_point(actual.clone());
        }
        binding.insert(param.as_str(), actual.clone());
    }

    for template in &construction.postconditions {
        let pred = bind_template(template, &binding);
        if let Some(id) = solver.dd.insert_predicate(pred) {
            let inserted = solver.dd.predicate(id).clone();
            ddar_core::synth::synthesize(&mut solver.gg, &mut solver.ar, id, &inserted)?;
        }
    }
    Ok(())
}

/// Parses all three file texts, applies `problem_name`'s stages to a
/// fresh solver, and runs `Solver::solve` against its goal.
fn run_problem(rules: &str, problem_name: &str, max_steps: usize) -> Result<Verdict, Error> {
    let rules = parse_rule_file(rules).unwrap();
    let constructions = parse_construction_file(CONSTRUCTIONS).unwrap();
    let problem = parse_problem_file(PROBLEMS, problem_name).unwrap();

    let mut solver = Solver::new();
    solver.load_rules(rules);

    for stage in &problem.stages {
        let mut new_points = stage.new_points.iter();
        for (name, args) in &stage.steps {
            apply_step(&mut solver, &constructions, name, args, &mut new_points)?;
        }
    }

    let goal = fully_bind(&problem.goal);
    solver.solve(&goal, max_steps)
}

const PROBLEMS: &str = "
midpoint_concurrence: a b c = triangle; d = midpoint b c; e = midpoint a c; f = midpoint a b; g = intersect_ll b e c f ? coll g d a
parallelogram_diagonals: a b c = triangle; d = para_point a b c; m = intersect_ll a c b d ? midp m a c
thales: a b = segment; c = midpoint a b; e = on_circle_about c a b ? perp a e b e
contradiction: a b c d = free_quad, assert_para a b c d, assert_perp a b c d ? perp a b c d
";

#[test]
fn midpoint_concurrence_is_proved() {
    let verdict = run_problem(MIDPOINT_RULE, "midpoint_concurrence", 5).unwrap();
    assert_eq!(verdict, Verdict::Proved);
}

#[test]
fn parallelogram_diagonals_bisect_each_other() {
    let verdict = run_problem(PARALLELOGRAM_RULE, "parallelogram_diagonals", 5).unwrap();
    assert_eq!(verdict, Verdict::Proved);
}

#[test]
fn thales_inscribed_angle_is_a_right_angle() {
    let verdict = run_problem(THALES_RULE, "thales", 5).unwrap();
    assert_eq!(verdict, Verdict::Proved);
}

#[test]
fn contradictory_para_and_perp_surface_as_a_contradiction() {
    let err = run_problem("", "contradiction", 5).unwrap_err();
    assert!(matches!(err, Error::Contradiction(_)), "expected a Contradiction, got {err:?}");
}

//! `ddar` — command-line driver for the geometry theorem prover.
//!
//! The binary is a thin wrapper: parse the rule/construction/problem
//! files, apply each construction stage to build up one
//! [`GeometricGraph`](ddar_core::dd::matchers::Gg), hand the goal to a
//! [`Solver`], and write the result to the output file. All the
//! interesting invariants live in `ddar_core`; this crate only owns
//! argument parsing and the text-file-to-graph wiring spec §6 describes.
//!
//! # Exit codes
//!
//! - `0` — success, regardless of whether the goal was proved
//! - `1` — missing required argument or parse error (message on stderr)

use std::collections::HashMap;
use std::error::Error as StdError;
use std::fs;
use std::path::PathBuf;

use clap::Parser;
use log::{info, warn};

use ddar_core::numerics::{CartesianModel, NumericStep};
use ddar_core::parsers::{parse_construction_file, parse_problem_file, parse_rule_file, Construction};
use ddar_core::predicate::{set_arg, Arg, Predicate, Template};
use ddar_core::{Solver, Verdict};

/// Argument surface from spec §6's CLI table.
#[derive(Parser, Debug)]
#[command(name = "ddar", about = "A symbolic ruler-and-compass theorem prover", version)]
struct Cli {
    /// Path to the problem file naming the construction/goal section to run.
    #[arg(short = 'f', long = "problem_file")]
    problem_file: PathBuf,

    /// Name of the section within `problem_file` to solve.
    #[arg(short = 'p', long = "problem_name")]
    problem_name: String,

    /// Path to the rule file (premises => conclusion templates).
    #[arg(short = 'r', long = "rule_file", default_value = "rules.txt")]
    rule_file: PathBuf,

    /// Path to the construction file (named construction recipes).
    #[arg(short = 'c', long = "construction_file", default_value = "constructions.txt")]
    construction_file: PathBuf,

    /// Where to write the `Problem:`/`Predicate:`/`Points:` report.
    #[arg(short = 'o', long = "output_file")]
    output_file: PathBuf,

    /// Bound on driver rounds (spec §5 requires some bound; its value is
    /// left to this layer).
    #[arg(long = "max_steps", default_value_t = 100)]
    max_steps: usize,
}

fn main() {
    env_logger::init();
    if let Err(e) = run() {
        eprintln!("ddar: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn StdError>> {
    let cli = Cli::parse();

    let rule_text = fs::read_to_string(&cli.rule_file)?;
    let construction_text = fs::read_to_string(&cli.construction_file)?;
    let problem_text = fs::read_to_string(&cli.problem_file)?;

    let rules = parse_rule_file(&rule_text)?;
    let constructions = parse_construction_file(&construction_text)?;
    let problem = parse_problem_file(&problem_text, &cli.problem_name)?;

    let mut solver = Solver::new();
    solver.load_rules(rules);

    let mut numerics: Vec<NumericStep> = Vec::new();
    let mut preconditions: Vec<Predicate> = Vec::new();
    for stage in &problem.stages {
        let mut new_points = stage.new_points.iter();
        for (name, args) in &stage.steps {
            apply_step(&mut solver, &constructions, name, args, &mut new_points, &mut numerics, &mut preconditions)?;
        }
        if new_points.next().is_some() {
            return Err("stage declares more new points than its construction steps produce".into());
        }
    }

    sanity_check(&preconditions, &numerics);

    let goal = fully_bind(&problem.goal);
    let verdict = solver.solve(&goal, cli.max_steps)?;
    info!("problem '{}': {verdict:?} in at most {} round(s)", problem.name, cli.max_steps);

    write_output(&cli.output_file, &problem.name, &mut solver, verdict)?;
    Ok(())
}

/// Looks up a construction recipe by name, applies its postconditions as
/// given facts against the newly-declared points, and records its numeric
/// steps (remapped from parameter names to concrete point names) for the
/// sanity filter.
fn apply_step<'a>(
    solver: &mut Solver,
    constructions: &[Construction],
    name: &str,
    existing_args: &[String],
    new_points: &mut std::slice::Iter<'a, String>,
    numerics: &mut Vec<NumericStep>,
    preconditions: &mut Vec<Predicate>,
) -> Result<(), Box<dyn StdError>> {
    let construction = constructions
        .iter()
        .find(|c| c.name == name)
        .ok_or_else(|| format!("undefined construction '{name}'"))?;
    if construction.existing_args.len() != existing_args.len() {
        return Err(format!(
            "construction '{name}' expects {} existing argument(s), got {}",
            construction.existing_args.len(),
            existing_args.len()
        )
        .into());
    }

    let mut binding: HashMap<&str, String> = HashMap::new();
    for (param, actual) in construction.existing_args.iter().zip(existing_args) {
        binding.insert(param.as_str(), actual.clone());
    }
    for param in &construction.new_args {
        let actual = new_points
            .next()
            .ok_or_else(|| format!("construction '{name}' needs {} new point(s), too few declared", construction.new_args.len()))?;
        if solver.gg.point_by_name(actual).is_none() {
            solver.gg.add_point(actual.clone());
        }
        binding.insert(param.as_str(), actual.clone());
    }

    for template in &construction.preconditions {
        preconditions.push(bind_template(template, &binding));
    }

    for template in &construction.postconditions {
        let pred = bind_template(template, &binding);
        if let Some(id) = solver.dd.insert_predicate(pred) {
            let inserted = solver.dd.predicate(id).clone();
            ddar_core::synth::synthesize(&mut solver.gg, &mut solver.ar, id, &inserted)?;
        }
    }

    for step in &construction.numerics {
        let outs = step.outs.iter().map(|o| remap(&binding, o)).collect();
        let args = step.args.iter().map(|a| remap(&binding, a)).collect();
        numerics.push(NumericStep { outs, kind: step.kind.clone(), args });
    }

    Ok(())
}

fn remap(binding: &HashMap<&str, String>, param: &str) -> String {
    binding.get(param).cloned().unwrap_or_else(|| param.to_string())
}

/// Instantiates a construction clause's holes against the caller's
/// parameter binding; holes already bound (a `constangle`/`constratio`
/// literal) are left alone.
fn bind_template(template: &Template, binding: &HashMap<&str, String>) -> Predicate {
    let mut t = Template::new(template.kind, template.hole_vars.clone());
    for (i, (hole, var)) in template.holes.iter().zip(&template.hole_vars).enumerate() {
        let value = if hole.is_empty() { Arg::Node(remap(binding, var)) } else { hole.clone() };
        set_arg(&mut t.holes[i], value);
    }
    t.instantiate(vec![])
}

/// A problem file's goal template names concrete points directly in
/// `hole_vars`; bind them as such before handing the goal to the solver
/// (mirrors how the construction clauses above bind against a parameter
/// map, except a goal's "parameters" are just the points themselves).
fn fully_bind(template: &Template) -> Template {
    let mut t = Template::new(template.kind, template.hole_vars.clone());
    for (i, (hole, var)) in template.holes.iter().zip(&template.hole_vars).enumerate() {
        let value = if hole.is_empty() { Arg::Node(var.clone()) } else { hole.clone() };
        set_arg(&mut t.holes[i], value);
    }
    t
}

/// Flags obviously-degenerate realizations of the accumulated numeric
/// steps against each construction's stated (and now point-bound)
/// preconditions. Logged, never fatal: spec's Non-goals exclude numeric
/// proof, so a "likely degenerate" reading is advisory only.
fn sanity_check(preconditions: &[Predicate], numerics: &[NumericStep]) {
    use ddar_core::predicate::PredicateKind;
    let model = CartesianModel::realize(numerics);
    for pred in preconditions {
        let names: Vec<&str> = pred.args.iter().filter_map(Arg::as_node).collect();
        let verdict = match (pred.kind, names.as_slice()) {
            (PredicateKind::Coll, [a, b, c]) => model.check_coll(a, b, c),
            (PredicateKind::Para, [a, b, c, d]) => model.check_para(a, b, c, d),
            (PredicateKind::Perp, [a, b, c, d]) => model.check_perp(a, b, c, d),
            (PredicateKind::Cong, [a, b, c, d]) => model.check_cong(a, b, c, d),
            _ => None,
        };
        if verdict == Some(false) {
            warn!("precondition '{}' looks numerically false", pred.hash);
        }
    }
}

fn write_output(path: &PathBuf, problem_name: &str, solver: &mut Solver, verdict: Verdict) -> std::io::Result<()> {
    let mut out = format!("Problem: {problem_name}\n");
    for pred in solver.dd.predicates() {
        out.push_str(&format!("Predicate: {}\n", pred.hash));
    }
    out.push_str("Points:\n");
    out.push_str(&solver.gg.describe_points());
    out.push('\n');
    info!("verdict for '{problem_name}': {verdict:?}");
    fs::write(path, out)
}

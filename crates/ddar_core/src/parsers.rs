//! Text-format parsers for rule, construction, and problem files (spec
//! §6). Deliberately simple line/token splitters rather than a
//! hand-rolled recursive-descent grammar with full error recovery,
//! consistent with their out-of-scope status (spec §1) — every malformed
//! line is rejected with an [`InvalidTextualInput`] naming its line
//! number rather than recovered from.

use crate::dd::Rule;
use crate::error::InvalidTextualInput;
use crate::frac::Frac;
use crate::numerics::NumericStep;
use crate::predicate::{Arg, Clause, PredicateKind, Template};

fn err(line: usize, message: impl Into<String>) -> InvalidTextualInput {
    InvalidTextualInput { line, message: message.into() }
}

fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(i) => &line[..i],
        None => line,
    }
}

/// Parses a `frac|int|decimal` numeric token, the only non-node argument
/// shape rule/construction/problem files carry (the trailing value of
/// `constangle`/`constratio`).
fn parse_frac_token(tok: &str) -> Option<Frac> {
    if let Some((n, d)) = tok.split_once('/') {
        let n: i64 = n.trim().parse().ok()?;
        let d: i64 = d.trim().parse().ok()?;
        return Frac::try_new(n, d).ok();
    }
    if let Ok(n) = tok.parse::<i64>() {
        return Some(Frac::int(n));
    }
    tok.parse::<f64>().ok().and_then(|d| Frac::from_f64(d).ok())
}

/// Parses one `pred arg arg ...` clause into a [`Template`]. Numeric
/// tokens become pre-bound `Arg::Rational` holes; everything else is
/// treated as a point-argument variable name, left unbound for the
/// matcher/binder to fill in.
fn parse_template(line_no: usize, tokens: &[&str]) -> Result<Template, InvalidTextualInput> {
    let (kind_tok, arg_toks) = tokens.split_first().ok_or_else(|| err(line_no, "empty predicate clause"))?;
    let kind = PredicateKind::from_name(kind_tok).ok_or_else(|| err(line_no, format!("unknown predicate kind: {kind_tok}")))?;
    if arg_toks.len() != kind.arity() {
        return Err(err(line_no, format!("{kind} expects {} argument(s), got {}", kind.arity(), arg_toks.len())));
    }
    let hole_vars: Vec<String> = arg_toks.iter().map(|t| t.to_string()).collect();
    let mut template = Template::new(kind, hole_vars);
    for (i, tok) in arg_toks.iter().enumerate() {
        if let Some(f) = parse_frac_token(tok) {
            template.holes[i] = Arg::Rational(f);
        }
    }
    Ok(template)
}

fn parse_clause(line_no: usize, text: &str) -> Result<Vec<Template>, InvalidTextualInput> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(Vec::new());
    }
    text.split(',')
        .map(|part| {
            let tokens: Vec<&str> = part.split_whitespace().collect();
            parse_template(line_no, &tokens)
        })
        .collect()
}

/// Parses `rules.txt`: `#`-prefixed lines are comments; each remaining
/// non-blank line is `<point-args> : <premises> => <conclusion>`.
pub fn parse_rule_file(text: &str) -> Result<Vec<Rule>, InvalidTextualInput> {
    let mut rules = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = strip_comment(raw).trim();
        if line.is_empty() {
            continue;
        }
        let (decl, rest) = line.split_once(':').ok_or_else(|| err(line_no, "missing ':' separating point-args from premises"))?;
        let point_args: Vec<&str> = decl.split_whitespace().collect();
        if point_args.is_empty() {
            return Err(err(line_no, "rule declares no point-args"));
        }
        let (premises_str, conclusion_str) = rest.split_once("=>").ok_or_else(|| err(line_no, "missing '=>' separating premises from conclusion"))?;
        let premises = parse_clause(line_no, premises_str)?;
        let conclusions = parse_clause(line_no, conclusion_str)?;
        let conclusion = conclusions.into_iter().next().ok_or_else(|| err(line_no, "rule has no conclusion"))?;
        for t in premises.iter().chain(std::iter::once(&conclusion)) {
            for (var, hole) in t.hole_vars.iter().zip(&t.holes) {
                if hole.is_empty() && !point_args.contains(&var.as_str()) {
                    return Err(err(line_no, format!("argument '{var}' not declared in point-args")));
                }
            }
        }
        rules.push(Rule::new(format!("rule-{line_no}"), Clause { premises }, conclusion));
    }
    Ok(rules)
}

/// One `name new-args : existing-args` / preconditions / postconditions /
/// numerics block from `constructions.txt`.
#[derive(Debug, Clone)]
pub struct Construction {
    pub name: String,
    pub new_args: Vec<String>,
    pub existing_args: Vec<String>,
    pub preconditions: Vec<Template>,
    pub postconditions: Vec<Template>,
    pub numerics: Vec<NumericStep>,
}

fn parse_numerics(line_no: usize, text: &str) -> Result<Vec<NumericStep>, InvalidTextualInput> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(Vec::new());
    }
    text.split(';')
        .map(|block| {
            let block = block.trim();
            let (outs_str, rhs) = block.split_once('=').ok_or_else(|| err(line_no, format!("malformed numeric block: {block}")))?;
            let outs: Vec<String> = outs_str.split_whitespace().map(str::to_string).collect();
            let mut rhs_toks = rhs.split_whitespace();
            let kind = rhs_toks.next().ok_or_else(|| err(line_no, format!("numeric block missing kind: {block}")))?.to_string();
            let args: Vec<String> = rhs_toks.map(str::to_string).collect();
            Ok(NumericStep { outs, kind, args })
        })
        .collect()
}

/// Parses `constructions.txt`: each construction occupies four
/// consecutive non-comment, non-blank lines (declaration, preconditions,
/// postconditions, numerics), per spec §6.
pub fn parse_construction_file(text: &str) -> Result<Vec<Construction>, InvalidTextualInput> {
    let lines: Vec<(usize, String)> = text
        .lines()
        .enumerate()
        .map(|(i, l)| (i + 1, strip_comment(l).trim().to_string()))
        .filter(|(_, l)| !l.is_empty())
        .collect();

    let mut constructions = Vec::new();
    let mut chunks = lines.chunks_exact(4);
    for chunk in &mut chunks {
        let [(decl_no, decl), (pre_no, pre), (post_no, post), (num_no, num)] = chunk else { unreachable!() };
        let (head, existing) = decl.split_once(':').ok_or_else(|| err(*decl_no, "missing ':' separating new-args from existing-args"))?;
        let mut head_toks = head.split_whitespace();
        let name = head_toks.next().ok_or_else(|| err(*decl_no, "construction declares no name"))?.to_string();
        let new_args: Vec<String> = head_toks.map(str::to_string).collect();
        let existing_args: Vec<String> = existing.split_whitespace().map(str::to_string).collect();
        let preconditions = parse_clause(*pre_no, pre)?;
        let postconditions = parse_clause(*post_no, post)?;
        let numerics = parse_numerics(*num_no, num)?;
        constructions.push(Construction { name, new_args, existing_args, preconditions, postconditions, numerics });
    }
    if !chunks.remainder().is_empty() {
        let (line_no, _) = chunks.remainder()[0].clone();
        return Err(err(line_no, "trailing construction block is missing lines (expected 4 per construction)"));
    }
    Ok(constructions)
}

/// One stage of a problem's construction sequence: `<new-points> = <name>
/// <args>, <name> <args>, ...`.
#[derive(Debug, Clone)]
pub struct ConstructionStage {
    pub new_points: Vec<String>,
    pub steps: Vec<(String, Vec<String>)>,
}

/// A fully parsed problem: its construction stages plus the goal
/// template to check at the end of a solve.
#[derive(Debug, Clone)]
pub struct Problem {
    pub name: String,
    pub stages: Vec<ConstructionStage>,
    pub goal: Template,
}

fn parse_stage(line_no: usize, text: &str) -> Result<ConstructionStage, InvalidTextualInput> {
    let (lhs, rhs) = text.split_once('=').ok_or_else(|| err(line_no, format!("malformed construction stage: {text}")))?;
    let new_points: Vec<String> = lhs.split_whitespace().map(str::to_string).collect();
    let mut steps = Vec::new();
    for step in rhs.split(',') {
        let mut toks = step.split_whitespace();
        let name = toks.next().ok_or_else(|| err(line_no, format!("empty construction step in stage: {text}")))?.to_string();
        let args: Vec<String> = toks.map(str::to_string).collect();
        steps.push((name, args));
    }
    Ok(ConstructionStage { new_points, steps })
}

/// Parses a problem file, returning the named section matching
/// `problem_name`. Sections are `<name>: <stage> ; <stage> ; ... ?
/// <goal-predicate>` one per (logical, comment-stripped) line.
pub fn parse_problem_file(text: &str, problem_name: &str) -> Result<Problem, InvalidTextualInput> {
    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = strip_comment(raw).trim();
        if line.is_empty() {
            continue;
        }
        let (name, body) = line.split_once(':').ok_or_else(|| err(line_no, "missing ':' separating problem name from body"))?;
        if name.trim() != problem_name {
            continue;
        }
        let (stages_str, goal_str) = body.split_once('?').ok_or_else(|| err(line_no, "missing '?' separating construction stages from goal"))?;
        let stages = stages_str
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| parse_stage(line_no, s))
            .collect::<Result<Vec<_>, _>>()?;
        let goal_tokens: Vec<&str> = goal_str.split_whitespace().collect();
        let goal = parse_template(line_no, &goal_tokens)?;
        return Ok(Problem { name: problem_name.to_string(), stages, goal });
    }
    Err(err(0, format!("no section named '{problem_name}' in problem file")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_simple_rule() {
        let rules = parse_rule_file("A B M : coll A B M => coll M A B\n").unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].premises.len(), 1);
        assert_eq!(rules[0].conclusion.kind, PredicateKind::Coll);
    }

    #[test]
    fn rejects_undeclared_argument() {
        let err = parse_rule_file("A B : coll A B C => coll A B C\n").unwrap_err();
        assert!(err.message.contains("C"));
    }

    #[test]
    fn parses_construction_block() {
        let text = "midpoint m : a b\nncoll a b m\nmidp m a b\nm = midpoint a b\n";
        let cs = parse_construction_file(text).unwrap();
        assert_eq!(cs.len(), 1);
        assert_eq!(cs[0].name, "midpoint");
        assert_eq!(cs[0].new_args, vec!["m"]);
        assert_eq!(cs[0].numerics[0].kind, "midpoint");
    }

    #[test]
    fn parses_problem_section_and_goal() {
        let text = "sample: d e f = triangle a b c ? perp a b c d\n";
        let problem = parse_problem_file(text, "sample").unwrap();
        assert_eq!(problem.stages.len(), 1);
        assert_eq!(problem.goal.kind, PredicateKind::Perp);
    }
}

//! Linear-program back-end for witness reconstruction (§4.4 `why`).
//!
//! The table never needs an LP solver for its own row-reduction — only to
//! explain a derived equality after the fact. That explanation step is
//! abstracted behind [`LinearProgram`] so the row-reduction code and the
//! solver can vary independently, matching the original's treatment of the
//! LP as an external black box.

use crate::matrix::SparseMatrix;

/// Solves `min cᵀx subject to A·x = b, x ≥ 0`.
///
/// Returns `None` if the system is infeasible.
pub trait LinearProgram {
    fn solve(&self, a: &SparseMatrix, b: &[f64], c: &[f64]) -> Option<Vec<f64>>;
}

const EPS: f64 = 1e-7;

/// Dense two-phase primal simplex. Adequate for the small systems the AR
/// engine's witness reconstruction produces — this is not meant to be a
/// production-grade solver.
#[derive(Debug, Default, Clone, Copy)]
pub struct SimplexLp;

impl SimplexLp {
    pub fn new() -> SimplexLp {
        SimplexLp
    }

    fn dense(a: &SparseMatrix) -> Vec<Vec<f64>> {
        let mut rows = vec![vec![0.0; a.cols()]; a.rows()];
        for j in 0..a.cols() {
            for (i, v) in a.column_entries(j) {
                rows[i][j] = v;
            }
        }
        rows
    }

    /// Runs the simplex tableau method on an explicit `[A | b]` tableau
    /// with objective row `obj`, pivoting until no negative reduced cost
    /// remains (or the problem is judged unbounded/infeasible).
    fn pivot(tableau: &mut Vec<Vec<f64>>, obj: &mut Vec<f64>, basis: &mut Vec<usize>) -> bool {
        let m = tableau.len();
        let n = obj.len() - 1;
        loop {
            let Some(pivot_col) = (0..n).find(|&j| obj[j] < -EPS) else {
                return true;
            };
            let mut pivot_row = None;
            let mut best_ratio = f64::INFINITY;
            for i in 0..m {
                if tableau[i][pivot_col] > EPS {
                    let ratio = tableau[i][n] / tableau[i][pivot_col];
                    if ratio < best_ratio - EPS {
                        best_ratio = ratio;
                        pivot_row = Some(i);
                    }
                }
            }
            let Some(pr) = pivot_row else {
                return false; // unbounded
            };
            let pivot_val = tableau[pr][pivot_col];
            for v in tableau[pr].iter_mut() {
                *v /= pivot_val;
            }
            for i in 0..m {
                if i == pr {
                    continue;
                }
                let factor = tableau[i][pivot_col];
                if factor.abs() > 0.0 {
                    for j in 0..=n {
                        tableau[i][j] -= factor * tableau[pr][j];
                    }
                }
            }
            let factor = obj[pivot_col];
            if factor.abs() > 0.0 {
                for j in 0..=n {
                    obj[j] -= factor * tableau[pr][j];
                }
            }
            basis[pr] = pivot_col;
        }
    }
}

impl LinearProgram for SimplexLp {
    fn solve(&self, a: &SparseMatrix, b: &[f64], c: &[f64]) -> Option<Vec<f64>> {
        let m = a.rows();
        let n = a.cols();
        if m == 0 {
            return Some(vec![0.0; n]);
        }
        let dense = Self::dense(a);

        // Phase 1: minimize sum of artificial variables to find a
        // feasible point. Flip rows with negative b so artificials start
        // non-negative.
        let mut tableau = vec![vec![0.0; n + m + 1]; m];
        for i in 0..m {
            let sign = if b[i] < 0.0 { -1.0 } else { 1.0 };
            for j in 0..n {
                tableau[i][j] = sign * dense[i][j];
            }
            tableau[i][n + i] = 1.0;
            tableau[i][n + m] = sign * b[i];
        }
        let mut basis: Vec<usize> = (0..m).map(|i| n + i).collect();
        let mut obj = vec![0.0; n + m + 1];
        for j in 0..(n + m) {
            obj[j] = -tableau.iter().map(|row| row[j]).sum::<f64>();
        }
        obj[n + m] = -tableau.iter().map(|row| row[n + m]).sum::<f64>();
        // zero out the basic (artificial) columns' reduced costs
        for (i, &bi) in basis.iter().enumerate() {
            let factor = obj[bi];
            if factor.abs() > 0.0 {
                for j in 0..=(n + m) {
                    obj[j] -= factor * tableau[i][j];
                }
            }
        }
        Self::pivot(&mut tableau, &mut obj, &mut basis);

        let phase1_value = -obj[n + m];
        if phase1_value.abs() > EPS {
            return None; // infeasible
        }
        // An artificial may remain in the basis at value 0 (a redundant
        // row); drive it out where a real column admits a pivot.
        for (i, &bi) in basis.clone().iter().enumerate() {
            if bi >= n {
                if let Some(j) = (0..n).find(|&j| tableau[i][j].abs() > EPS) {
                    let pivot_val = tableau[i][j];
                    for v in tableau[i].iter_mut() {
                        *v /= pivot_val;
                    }
                    basis[i] = j;
                }
            }
        }

        // Phase 2: minimize the real objective over the feasible tableau,
        // restricted to the original n columns.
        let mut obj2 = vec![0.0; n + 1];
        for (j, &ci) in c.iter().enumerate().take(n) {
            obj2[j] = ci;
        }
        for (i, &bi) in basis.iter().enumerate() {
            if bi < n {
                let factor = obj2[bi];
                if factor.abs() > 0.0 {
                    for j in 0..n {
                        obj2[j] -= factor * tableau[i][j];
                    }
                    obj2[n] -= factor * tableau[i][n + m];
                }
            }
        }
        let mut tableau2: Vec<Vec<f64>> = tableau
            .iter()
            .map(|row| {
                let mut r: Vec<f64> = row[0..n].to_vec();
                r.push(row[n + m]);
                r
            })
            .collect();
        if !Self::pivot(&mut tableau2, &mut obj2, &mut basis) {
            return None;
        }

        let mut x = vec![0.0; n];
        for (i, &bi) in basis.iter().enumerate() {
            if bi < n {
                x[bi] = tableau2[i][n];
            }
        }
        Some(x)
    }
}

/// Test double that looks up a pre-computed answer by approximately
/// matching `b`, per §9's guidance to keep LP-dependent tests deterministic
/// and independent of simplex internals.
#[derive(Debug, Default, Clone)]
pub struct FakeLp {
    answers: Vec<(Vec<f64>, Option<Vec<f64>>)>,
}

impl FakeLp {
    pub fn new() -> FakeLp {
        FakeLp { answers: Vec::new() }
    }

    pub fn expect(mut self, b: Vec<f64>, answer: Option<Vec<f64>>) -> FakeLp {
        self.answers.push((b, answer));
        self
    }
}

impl LinearProgram for FakeLp {
    fn solve(&self, _a: &SparseMatrix, b: &[f64], _c: &[f64]) -> Option<Vec<f64>> {
        self.answers
            .iter()
            .find(|(key, _)| key.len() == b.len() && key.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-6))
            .and_then(|(_, answer)| answer.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solves_simple_feasible_system() {
        // x0 + x1 = 1, minimize x0 + x1 -> any feasible point costs 1.
        let mut a = SparseMatrix::new(1, 2, 2);
        a.set(0, 0, 1.0).unwrap();
        a.set(0, 1, 1.0).unwrap();
        let solver = SimplexLp::new();
        let x = solver.solve(&a, &[1.0], &[1.0, 1.0]).expect("feasible");
        assert!((x[0] + x[1] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn reports_infeasible_as_none() {
        let mut a = SparseMatrix::new(1, 1, 1);
        a.set(0, 0, 0.0).unwrap();
        let solver = SimplexLp::new();
        assert!(solver.solve(&a, &[5.0], &[1.0]).is_none());
    }

    #[test]
    fn fake_lp_looks_up_by_b() {
        let fake = FakeLp::new().expect(vec![1.0, 0.0], Some(vec![1.0, 0.0]));
        let a = SparseMatrix::new(2, 2, 1);
        assert_eq!(fake.solve(&a, &[1.0, 0.0], &[0.0, 0.0]), Some(vec![1.0, 0.0]));
        assert_eq!(fake.solve(&a, &[9.0, 9.0], &[0.0, 0.0]), None);
    }
}

//! Error taxonomy for the deductive core.
//!
//! Each subsystem gets its own error kind, matching the failure modes
//! described for that subsystem; [`Error`] unifies them for callers that
//! cross subsystem boundaries (the driver, the CLI).

use std::fmt;

/// Fraction / rational-arithmetic failures (C1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NumericError {
    /// A fraction was constructed with a zero denominator.
    ZeroDenominator,
    /// `Frac::from_f64` could not find a denominator within the iteration cap.
    NonConvergentDecimal(f64),
}

impl fmt::Display for NumericError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumericError::ZeroDenominator => write!(f, "fraction denominator cannot be zero"),
            NumericError::NonConvergentDecimal(d) => {
                write!(f, "could not reduce {d} to a fraction within tolerance")
            }
        }
    }
}

impl std::error::Error for NumericError {}

/// Sparse-matrix failures (C2).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatrixError {
    /// `set` was asked to place a new, nonzero entry in a column that has
    /// no free slot and no existing entry at that row.
    ColumnFull { column: usize },
    /// An access was made outside the matrix's current (m, n) bounds.
    OutOfBounds { row: usize, col: usize },
}

impl fmt::Display for MatrixError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatrixError::ColumnFull { column } => write!(f, "column {column} has no free slot"),
            MatrixError::OutOfBounds { row, col } => {
                write!(f, "index ({row}, {col}) is out of bounds")
            }
        }
    }
}

impl std::error::Error for MatrixError {}

/// Algebraic-reasoning failures (C4/C9).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArInternalError {
    /// A `why` witness referenced a variable never registered in the table.
    UnknownVariable(String),
    /// The table's ordering invariant (I-Table) was violated.
    OrderingViolation { var: String },
}

impl fmt::Display for ArInternalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArInternalError::UnknownVariable(v) => write!(f, "unknown table variable: {v}"),
            ArInternalError::OrderingViolation { var } => {
                write!(f, "ordering invariant violated while reducing {var}")
            }
        }
    }
}

impl std::error::Error for ArInternalError {}

/// Geometric-graph invariant violations (C6).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GGraphError {
    /// Two triangles were merged whose direction pairs are incompatible.
    IncompatibleMerge { left: String, right: String },
    /// A triangle degenerated (two vertices collapsed onto each other)
    /// during a point merge.
    DegenerateTriangle { triangle: String },
}

impl fmt::Display for GGraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GGraphError::IncompatibleMerge { left, right } => {
                write!(f, "cannot merge {left} and {right}: incompatible directions")
            }
            GGraphError::DegenerateTriangle { triangle } => {
                write!(f, "triangle {triangle} degenerated during merge")
            }
        }
    }
}

impl std::error::Error for GGraphError {}

/// Deductive-database template/engine failures (C8).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DdInternalError {
    /// A rule or construction template referenced an argument name that
    /// was never declared in its point-args list.
    UndefinedArgument(String),
    /// A rule file used a predicate name outside the fixed 16-kind set.
    UnknownPredicateKind(String),
}

impl fmt::Display for DdInternalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DdInternalError::UndefinedArgument(a) => write!(f, "undefined argument: {a}"),
            DdInternalError::UnknownPredicateKind(k) => write!(f, "unknown predicate kind: {k}"),
        }
    }
}

impl std::error::Error for DdInternalError {}

/// A derivation produced a fact known to contradict an existing one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contradiction {
    pub message: String,
}

impl fmt::Display for Contradiction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "contradiction: {}", self.message)
    }
}

impl std::error::Error for Contradiction {}

/// Parse failures in rule/construction/problem files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidTextualInput {
    pub line: usize,
    pub message: String,
}

impl fmt::Display for InvalidTextualInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for InvalidTextualInput {}

/// Unified error type for callers that cross subsystem boundaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    Numeric(NumericError),
    Matrix(MatrixError),
    Ar(ArInternalError),
    GGraph(GGraphError),
    Dd(DdInternalError),
    Contradiction(Contradiction),
    InvalidInput(InvalidTextualInput),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Numeric(e) => e.fmt(f),
            Error::Matrix(e) => e.fmt(f),
            Error::Ar(e) => e.fmt(f),
            Error::GGraph(e) => e.fmt(f),
            Error::Dd(e) => e.fmt(f),
            Error::Contradiction(e) => e.fmt(f),
            Error::InvalidInput(e) => e.fmt(f),
        }
    }
}

impl std::error::Error for Error {}

macro_rules! from_err {
    ($variant:ident, $ty:ty) => {
        impl From<$ty> for Error {
            fn from(e: $ty) -> Self {
                Error::$variant(e)
            }
        }
    };
}

from_err!(Numeric, NumericError);
from_err!(Matrix, MatrixError);
from_err!(Ar, ArInternalError);
from_err!(GGraph, GGraphError);
from_err!(Dd, DdInternalError);
from_err!(Contradiction, Contradiction);
from_err!(InvalidInput, InvalidTextualInput);

pub type Result<T> = std::result::Result<T, Error>;

//! Atom mask language used to choose which atoms are imaged.
//!
//! Selectors address residues (`:`), atoms (`@`) or molecules (`^`) by 1-based
//! number, inclusive range or name, and combine with `&`, `|`, `!` and
//! parentheses. An empty mask selects every atom.
//!
//! ```ignore
//! use cellwrap::core::selection::AtomMask;
//!
//! let solvent_oxygens = AtomMask::parse(":WAT@O")?;
//! let indices = solvent_oxygens.select(&topology);
//! ```

pub mod ast;
pub mod error;
pub mod eval;
pub mod parser;
pub mod token;

pub use error::SelectionError;

use crate::core::models::topology::ProvidesTopology;
use ast::Expr;
use std::fmt;
use std::str::FromStr;

/// A parsed mask expression, ready to be evaluated against any topology.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtomMask {
    expression: String,
    expr: Expr,
}

impl AtomMask {
    pub fn parse(expression: &str) -> Result<Self, SelectionError> {
        Ok(Self {
            expression: expression.trim().to_string(),
            expr: parser::parse(expression)?,
        })
    }

    pub fn all() -> Self {
        Self {
            expression: String::new(),
            expr: Expr::All,
        }
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn selects_all(&self) -> bool {
        self.expr == Expr::All
    }

    /// One flag per atom of `topology`.
    pub fn flags<T>(&self, topology: &T) -> Vec<bool>
    where
        T: ProvidesTopology + ?Sized,
    {
        eval::evaluate(&self.expr, topology)
    }

    /// Sorted indices of the selected atoms.
    pub fn select<T>(&self, topology: &T) -> Vec<usize>
    where
        T: ProvidesTopology + ?Sized,
    {
        self.flags(topology)
            .into_iter()
            .enumerate()
            .filter_map(|(i, selected)| selected.then_some(i))
            .collect()
    }
}

impl Default for AtomMask {
    fn default() -> Self {
        Self::all()
    }
}

impl FromStr for AtomMask {
    type Err = SelectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for AtomMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.expression.is_empty() {
            write!(f, "*")
        } else {
            write!(f, "{}", self.expression)
        }
    }
}

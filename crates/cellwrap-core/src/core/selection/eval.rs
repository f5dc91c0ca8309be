use super::ast::{Expr, Item, Level};
use crate::core::models::topology::ProvidesTopology;

/// Evaluates an expression to one flag per atom of the topology.
pub fn evaluate<T>(expr: &Expr, topology: &T) -> Vec<bool>
where
    T: ProvidesTopology + ?Sized,
{
    let n_atoms = topology.atom_count();
    match expr {
        Expr::All => vec![true; n_atoms],
        Expr::Select { level, items } => select_level(*level, items, topology),
        Expr::Not(inner) => evaluate(inner, topology).into_iter().map(|f| !f).collect(),
        Expr::And(lhs, rhs) => combine(evaluate(lhs, topology), evaluate(rhs, topology), |a, b| a && b),
        Expr::Or(lhs, rhs) => combine(evaluate(lhs, topology), evaluate(rhs, topology), |a, b| a || b),
    }
}

fn combine(lhs: Vec<bool>, rhs: Vec<bool>, op: impl Fn(bool, bool) -> bool) -> Vec<bool> {
    lhs.into_iter().zip(rhs).map(|(a, b)| op(a, b)).collect()
}

fn any_item(items: &[Item], number: usize, name: &str) -> bool {
    items.iter().any(|item| item.matches(number, name))
}

fn select_level<T>(level: Level, items: &[Item], topology: &T) -> Vec<bool>
where
    T: ProvidesTopology + ?Sized,
{
    let mut flags = vec![false; topology.atom_count()];
    match level {
        Level::Atom => {
            for (atom, flag) in flags.iter_mut().enumerate() {
                *flag = any_item(items, atom + 1, topology.atom_name(atom));
            }
        }
        Level::Residue => {
            for residue in 0..topology.residue_count() {
                if any_item(items, residue + 1, topology.residue_name(residue)) {
                    flags[topology.residue_atoms(residue)].fill(true);
                }
            }
        }
        Level::Molecule => {
            for molecule in 0..topology.molecule_count() {
                if any_item(items, molecule + 1, "") {
                    flags[topology.molecule_atoms(molecule)].fill(true);
                }
            }
        }
    }
    flags
}

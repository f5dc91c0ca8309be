use super::config::ImageMode;
use crate::core::models::topology::ProvidesTopology;
use std::fmt;
use std::ops::Range;

/// A contiguous block of atoms `[first, last)` that is always translated as one rigid unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Entity {
    pub first: usize,
    pub last: usize,
}

impl Entity {
    pub fn atoms(&self) -> Range<usize> {
        self.first..self.last
    }

    pub fn len(&self) -> usize {
        self.last - self.first
    }

    pub fn is_empty(&self) -> bool {
        self.first >= self.last
    }
}

impl From<Range<usize>> for Entity {
    fn from(range: Range<usize>) -> Self {
        Self {
            first: range.start,
            last: range.end,
        }
    }
}

/// 1-based, inclusive atom numbers.
impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.first + 1, self.last)
    }
}

/// Groups the selected atoms into imaging units.
///
/// In residue and molecule mode a unit covers the whole residue or molecule as
/// soon as any of its atoms is selected. The result is ordered by first atom and
/// the ranges are pairwise disjoint.
pub fn build_entities<T>(topology: &T, mode: ImageMode, selected: &[usize]) -> Vec<Entity>
where
    T: ProvidesTopology + ?Sized,
{
    match mode {
        ImageMode::ByAtom => {
            let mut atoms = selected.to_vec();
            atoms.sort_unstable();
            atoms.dedup();
            atoms.into_iter().map(|i| Entity::from(i..i + 1)).collect()
        }
        ImageMode::ByResidue => expand_groups(
            topology.residue_count(),
            selected.iter().map(|&atom| topology.residue_of(atom)),
            |residue| topology.residue_atoms(residue),
        ),
        ImageMode::ByMolecule => expand_groups(
            topology.molecule_count(),
            selected.iter().map(|&atom| topology.molecule_of(atom)),
            |molecule| topology.molecule_atoms(molecule),
        ),
    }
}

fn expand_groups(
    group_count: usize,
    touched: impl Iterator<Item = usize>,
    atoms_of: impl Fn(usize) -> Range<usize>,
) -> Vec<Entity> {
    let mut hit = vec![false; group_count];
    for group in touched {
        hit[group] = true;
    }
    hit.iter()
        .enumerate()
        .filter(|&(_, &h)| h)
        .map(|(group, _)| Entity::from(atoms_of(group)))
        .filter(|entity| !entity.is_empty())
        .collect()
}

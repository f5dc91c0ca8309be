use crate::core::geometry::cell::{BoxType, SimulationBox};
use std::ops::Range;
use thiserror::Error;

/// Read-only view of a molecular topology as needed by imaging and mask selection.
///
/// Atoms are addressed by 0-based index. Residues and molecules each partition
/// the atoms into contiguous index ranges.
pub trait ProvidesTopology {
    fn name(&self) -> &str;
    fn atom_count(&self) -> usize;
    fn atom_name(&self, atom: usize) -> &str;
    fn mass(&self, atom: usize) -> f64;

    fn residue_count(&self) -> usize;
    fn residue_of(&self, atom: usize) -> usize;
    fn residue_name(&self, residue: usize) -> &str;
    fn residue_atoms(&self, residue: usize) -> Range<usize>;

    fn molecule_count(&self) -> usize;
    fn molecule_of(&self, atom: usize) -> usize;
    fn molecule_atoms(&self, molecule: usize) -> Range<usize>;

    /// Periodic box the topology was prepared with, if any.
    fn reference_box(&self) -> Option<&SimulationBox>;

    fn box_type(&self) -> BoxType {
        self.reference_box()
            .map(SimulationBox::box_type)
            .unwrap_or(BoxType::None)
    }

    fn masses(&self) -> Vec<f64> {
        (0..self.atom_count()).map(|i| self.mass(i)).collect()
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TopologyError {
    #[error("Atom '{atom}' was added before any residue was started")]
    NoOpenResidue { atom: String },

    #[error("Residue '{residue}' was added before any molecule was started")]
    NoOpenMolecule { residue: String },

    #[error("Atom '{atom}' has an invalid mass {mass}")]
    InvalidMass { atom: String, mass: f64 },

    #[error("Residue {index} ('{name}') contains no atoms")]
    EmptyResidue { index: usize, name: String },

    #[error("Molecule {index} contains no residues")]
    EmptyMolecule { index: usize },
}

#[derive(Debug, Clone, PartialEq)]
struct ResidueRecord {
    name: String,
    atoms: Range<usize>,
}

/// Index-based topology with contiguous residues nested inside contiguous molecules.
#[derive(Debug, Clone, PartialEq)]
pub struct Topology {
    name: String,
    atom_names: Vec<String>,
    masses: Vec<f64>,
    atom_residue: Vec<usize>,
    atom_molecule: Vec<usize>,
    residues: Vec<ResidueRecord>,
    molecules: Vec<Range<usize>>,
    reference_box: Option<SimulationBox>,
}

impl Topology {
    pub fn builder(name: &str) -> TopologyBuilder {
        TopologyBuilder::new(name)
    }

    pub fn set_reference_box(&mut self, cell: Option<SimulationBox>) {
        self.reference_box = cell;
    }

    pub fn with_reference_box(mut self, cell: SimulationBox) -> Self {
        self.reference_box = Some(cell);
        self
    }
}

impl ProvidesTopology for Topology {
    fn name(&self) -> &str {
        &self.name
    }

    fn atom_count(&self) -> usize {
        self.atom_names.len()
    }

    fn atom_name(&self, atom: usize) -> &str {
        &self.atom_names[atom]
    }

    fn mass(&self, atom: usize) -> f64 {
        self.masses[atom]
    }

    fn residue_count(&self) -> usize {
        self.residues.len()
    }

    fn residue_of(&self, atom: usize) -> usize {
        self.atom_residue[atom]
    }

    fn residue_name(&self, residue: usize) -> &str {
        &self.residues[residue].name
    }

    fn residue_atoms(&self, residue: usize) -> Range<usize> {
        self.residues[residue].atoms.clone()
    }

    fn molecule_count(&self) -> usize {
        self.molecules.len()
    }

    fn molecule_of(&self, atom: usize) -> usize {
        self.atom_molecule[atom]
    }

    fn molecule_atoms(&self, molecule: usize) -> Range<usize> {
        self.molecules[molecule].clone()
    }

    fn reference_box(&self) -> Option<&SimulationBox> {
        self.reference_box.as_ref()
    }

    fn masses(&self) -> Vec<f64> {
        self.masses.clone()
    }
}

/// Incremental builder that appends molecules, residues and atoms in index order.
///
/// ```ignore
/// let mut builder = Topology::builder("water box");
/// builder.begin_molecule();
/// builder.add_residue("WAT")?;
/// builder.add_atom("O", 15.999)?;
/// builder.add_atom("H1", 1.008)?;
/// builder.add_atom("H2", 1.008)?;
/// let topology = builder.build()?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct TopologyBuilder {
    name: String,
    atom_names: Vec<String>,
    masses: Vec<f64>,
    atom_residue: Vec<usize>,
    atom_molecule: Vec<usize>,
    residues: Vec<ResidueRecord>,
    molecule_starts: Vec<usize>,
    molecule_first_residue: Vec<usize>,
    reference_box: Option<SimulationBox>,
}

impl TopologyBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn reference_box(&mut self, cell: SimulationBox) -> &mut Self {
        self.reference_box = Some(cell);
        self
    }

    /// Starts a new molecule; the next residue is its first residue.
    pub fn begin_molecule(&mut self) -> usize {
        self.molecule_starts.push(self.atom_names.len());
        self.molecule_first_residue.push(self.residues.len());
        self.molecule_starts.len() - 1
    }

    pub fn add_residue(&mut self, name: &str) -> Result<usize, TopologyError> {
        if self.molecule_starts.is_empty() {
            return Err(TopologyError::NoOpenMolecule {
                residue: name.to_string(),
            });
        }
        let start = self.atom_names.len();
        self.residues.push(ResidueRecord {
            name: name.to_string(),
            atoms: start..start,
        });
        Ok(self.residues.len() - 1)
    }

    pub fn add_atom(&mut self, name: &str, mass: f64) -> Result<usize, TopologyError> {
        if !mass.is_finite() || mass < 0.0 {
            return Err(TopologyError::InvalidMass {
                atom: name.to_string(),
                mass,
            });
        }
        let molecule_index = self.molecule_starts.len().checked_sub(1);
        let residue_index = self
            .residues
            .len()
            .checked_sub(1)
            .filter(|&r| molecule_index.is_some_and(|m| r >= self.molecule_first_residue[m]));
        let (Some(residue_index), Some(molecule_index)) = (residue_index, molecule_index) else {
            return Err(TopologyError::NoOpenResidue {
                atom: name.to_string(),
            });
        };

        let index = self.atom_names.len();
        self.atom_names.push(name.to_string());
        self.masses.push(mass);
        self.atom_residue.push(residue_index);
        self.atom_molecule.push(molecule_index);
        self.residues[residue_index].atoms.end = index + 1;
        Ok(index)
    }

    pub fn build(self) -> Result<Topology, TopologyError> {
        if let Some((index, residue)) = self
            .residues
            .iter()
            .enumerate()
            .find(|(_, r)| r.atoms.is_empty())
        {
            return Err(TopologyError::EmptyResidue {
                index,
                name: residue.name.clone(),
            });
        }

        let atom_count = self.atom_names.len();
        let mut molecules = Vec::with_capacity(self.molecule_starts.len());
        for (index, &start) in self.molecule_starts.iter().enumerate() {
            let end = self
                .molecule_starts
                .get(index + 1)
                .copied()
                .unwrap_or(atom_count);
            if start == end {
                return Err(TopologyError::EmptyMolecule { index });
            }
            molecules.push(start..end);
        }

        Ok(Topology {
            name: self.name,
            atom_names: self.atom_names,
            masses: self.masses,
            atom_residue: self.atom_residue,
            atom_molecule: self.atom_molecule,
            residues: self.residues,
            molecules,
            reference_box: self.reference_box,
        })
    }
}

//! # Elemental Composition
//!
//! Atomic fractions (count / total atoms) and mass fractions (element mass / formula mass)
//! for parsed formulas, plus molar masses and the element composition matrix of a set of formulas.
//!
//! Atomic fractions need no mass data, so `atomic_fractions` is infallible. Anything involving
//! masses fails with `StoichError::UnknownElement` when the table has no entry for a symbol;
//! a missing mass is never replaced by zero.
use crate::Stoichiometry::atomic_masses::AtomicMassLookup;
use crate::Stoichiometry::errors::StoichError;
use crate::Stoichiometry::formula_parser::{ElementCounts, parse_formula};
use log::debug;
use nalgebra::DMatrix;
use prettytable::{Cell, Row, Table};
use serde::{Deserialize, Serialize};

/// composition entry of one element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementalComposition {
    pub element: String,
    pub atomic_fraction: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mass_fraction: Option<f64>,
}

/// Calculator with an optional mass table: without one only atomic fractions are produced
pub struct CompositionCalculator<'a> {
    mass_table: Option<&'a dyn AtomicMassLookup>,
}

impl<'a> CompositionCalculator<'a> {
    pub fn atomic_only() -> Self {
        Self { mass_table: None }
    }

    pub fn with_masses(mass_table: &'a dyn AtomicMassLookup) -> Self {
        Self {
            mass_table: Some(mass_table),
        }
    }

    pub fn computes_mass_fractions(&self) -> bool {
        self.mass_table.is_some()
    }

    pub fn compute(&self, counts: &ElementCounts) -> Result<Vec<ElementalComposition>, StoichError> {
        match self.mass_table {
            Some(table) => compute_composition(counts, table),
            None => Ok(atomic_fractions(counts)),
        }
    }
}

/// count / total for every element; empty input gives an empty result
pub fn atomic_fractions(counts: &ElementCounts) -> Vec<ElementalComposition> {
    let total = counts.total();
    if total == 0 {
        return Vec::new();
    }
    counts
        .iter()
        .map(|entry| ElementalComposition {
            element: entry.symbol.clone(),
            atomic_fraction: entry.count as f64 / total as f64,
            mass_fraction: None,
        })
        .collect()
}

/// mass of every element in one formula unit, input order
pub fn mass_contributions<T: AtomicMassLookup + ?Sized>(
    counts: &ElementCounts,
    table: &T,
) -> Result<Vec<(String, f64)>, StoichError> {
    counts
        .iter()
        .map(|entry| {
            let atomic_mass = table
                .atomic_mass(&entry.symbol)
                .ok_or_else(|| StoichError::UnknownElement(entry.symbol.clone()))?;
            Ok((entry.symbol.clone(), atomic_mass * entry.count as f64))
        })
        .collect()
}

/// Atomic and mass fractions for every element, in input order.
///
/// # Examples
/// ```
/// use FabStoich::Stoichiometry::atomic_masses::CustomMassTable;
/// use FabStoich::Stoichiometry::composition::compute_composition;
/// use FabStoich::Stoichiometry::formula_parser::parse_formula;
/// let table = CustomMassTable::from_pairs("rounded", &[("Al", 26.98), ("O", 16.00)]).unwrap();
/// let composition = compute_composition(&parse_formula("Al2O3"), &table).unwrap();
/// assert!((composition[0].atomic_fraction - 0.4).abs() < 1e-12);
/// assert!((composition[0].mass_fraction.unwrap() - 0.5292).abs() < 1e-3);
/// ```
pub fn compute_composition<T: AtomicMassLookup + ?Sized>(
    counts: &ElementCounts,
    table: &T,
) -> Result<Vec<ElementalComposition>, StoichError> {
    let mut composition = atomic_fractions(counts);
    if composition.is_empty() {
        return Ok(composition);
    }
    let masses = mass_contributions(counts, table)?;
    let total_mass: f64 = masses.iter().map(|(_, mass)| mass).sum();
    for (entry, (_, mass)) in composition.iter_mut().zip(masses.iter()) {
        entry.mass_fraction = Some(mass / total_mass);
    }
    debug!("composition computed: {:?}", composition);
    Ok(composition)
}

pub fn molar_mass<T: AtomicMassLookup + ?Sized>(
    counts: &ElementCounts,
    table: &T,
) -> Result<f64, StoichError> {
    Ok(mass_contributions(counts, table)?
        .iter()
        .map(|(_, mass)| mass)
        .sum())
}

// Function to calculate the molar mass of a substance given its chemical formula
pub fn calculate_molar_mass<T: AtomicMassLookup + ?Sized>(
    formula: &str,
    table: &T,
) -> Result<(f64, ElementCounts), StoichError> {
    let counts = parse_formula(formula);
    let molar_mass = molar_mass(&counts, table)?;
    Ok((molar_mass, counts))
}

// Function to calculate the molar mass of a vector of chemical formulas
pub fn molar_masses_of<T: AtomicMassLookup + ?Sized>(
    formulas: &[&str],
    table: &T,
) -> Result<Vec<f64>, StoichError> {
    formulas
        .iter()
        .map(|formula| calculate_molar_mass(formula, table).map(|(molar_mass, _)| molar_mass))
        .collect()
}

/// Element composition matrix: one row per formula, one column per element.
/// Columns follow the order in which elements first appear across the formulas.
pub fn composition_matrix(formulas: &[&str]) -> (DMatrix<f64>, Vec<String>) {
    let compositions: Vec<ElementCounts> = formulas.iter().map(|f| parse_formula(f)).collect();
    let mut elements: Vec<String> = Vec::new();
    for counts in compositions.iter() {
        for symbol in counts.symbols() {
            if !elements.iter().any(|e| e == symbol) {
                elements.push(symbol.to_string());
            }
        }
    }
    let mut matrix = DMatrix::zeros(compositions.len(), elements.len());
    for (i, counts) in compositions.iter().enumerate() {
        for (j, element) in elements.iter().enumerate() {
            if let Some(count) = counts.get(element) {
                matrix[(i, j)] = count as f64;
            }
        }
    }
    (matrix, elements)
}

pub fn composition_table(composition: &[ElementalComposition]) -> Table {
    let mut table = Table::new();
    table.add_row(Row::new(vec![
        Cell::new("Element"),
        Cell::new("Atomic fraction"),
        Cell::new("Mass fraction"),
    ]));
    for entry in composition {
        let mass_fraction = entry
            .mass_fraction
            .map(|m| format!("{:.4}", m))
            .unwrap_or_else(|| "-".to_string());
        table.add_row(Row::new(vec![
            Cell::new(&entry.element),
            Cell::new(&format!("{:.4}", entry.atomic_fraction)),
            Cell::new(&mass_fraction),
        ]));
    }
    table
}

pub fn print_composition(composition: &[ElementalComposition]) {
    composition_table(composition).printstd();
}

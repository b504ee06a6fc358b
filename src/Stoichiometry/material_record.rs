//! Catalogue record of a fabrication material (precursor, target, substrate, wafer film ...)
//! owning a chemical formula and the elemental composition derived from it.
use crate::Stoichiometry::atomic_masses::default_mass_table;
use crate::Stoichiometry::composition::{CompositionCalculator, ElementalComposition};
use crate::Stoichiometry::errors::StoichError;
use crate::Stoichiometry::formula_parser::FormulaParser;
use log::{info, warn};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MaterialRecord {
    pub name: String,
    pub chemical_formula: Option<String>,
    #[serde(default)]
    pub elemental_composition: Vec<ElementalComposition>,
}

impl MaterialRecord {
    pub fn new(name: &str, chemical_formula: &str) -> Self {
        Self {
            name: name.to_string(),
            chemical_formula: Some(chemical_formula.to_string()),
            elemental_composition: Vec::new(),
        }
    }
    /// normalization against the process-wide default mass table
    pub fn normalize(&mut self) -> Result<(), StoichError> {
        let table = default_mass_table();
        self.normalize_with(&FormulaParser::new(), &CompositionCalculator::with_masses(table))
    }

    /// Recomputes the elemental composition from the chemical formula.
    ///
    /// - no formula: nothing to do, composition is left as it is
    /// - formula without elements: composition becomes empty, a warning is logged
    /// - unknown element: error is returned and the previous composition is kept
    /// - otherwise the composition is replaced as a whole
    pub fn normalize_with(
        &mut self,
        parser: &FormulaParser,
        calculator: &CompositionCalculator,
    ) -> Result<(), StoichError> {
        let Some(formula) = self.chemical_formula.as_deref() else {
            return Ok(());
        };
        let counts = parser.parse(formula);
        if counts.total() == 0 {
            warn!(
                "{}: formula '{}' contains no elements, elemental composition not set",
                self.name, formula
            );
            self.elemental_composition = Vec::new();
            return Ok(());
        }
        let composition = calculator.compute(&counts)?;
        info!(
            "{}: elemental composition of {} updated ({} elements)",
            self.name,
            formula,
            composition.len()
        );
        self.elemental_composition = composition;
        Ok(())
    }

    pub fn element_fraction(&self, element: &str) -> Option<&ElementalComposition> {
        self.elemental_composition
            .iter()
            .find(|entry| entry.element == element)
    }
}

/// Normalizes every record, returning the per-record outcome in the same order
pub fn normalize_records(
    records: &mut [MaterialRecord],
    calculator: &CompositionCalculator,
) -> Vec<Result<(), StoichError>> {
    let parser = FormulaParser::new();
    records
        .iter_mut()
        .map(|record| record.normalize_with(&parser, calculator))
        .collect()
}

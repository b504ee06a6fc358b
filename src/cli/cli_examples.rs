use super::cli_main::{get_user_input, prompt};
use crate::Stoichiometry::atomic_masses::{CustomMassTable, PeriodicTable};
use crate::Stoichiometry::composition::{
    CompositionCalculator, composition_matrix, molar_masses_of, print_composition,
};
use crate::Stoichiometry::formula_parser::{ChemicalGroups, ElementCounts, FormulaParser};
use crate::Stoichiometry::material_record::MaterialRecord;
use log::error;

/// (name, formula) of typical cleanroom materials
pub const FAB_MATERIALS: &[(&str, &str)] = &[
    ("thermal oxide", "SiO2"),
    ("LPCVD nitride", "Si3N4"),
    ("ALD alumina", "Al2O3"),
    ("high-k gate dielectric", "HfO2"),
    ("TDMAHf precursor", "Hf(N(CH3)2)4"),
    ("TTIP precursor", "Ti(OC3H7)4"),
    ("TMGa precursor", "Ga(CH3)3"),
    ("III-V substrate", "GaAs"),
    ("copper plating salt", "CuSO4·5H2O"),
    ("silicic acid", "Si(OH)4"),
];

pub fn examples_menu() {
    loop {
        println!("\n=== Examples ===");
        println!("1. Composition of fabrication materials");
        println!("2. Precursors written with group abbreviations");
        println!("3. Element composition matrix");
        println!("4. Custom atomic mass table");
        println!("0. Back to main menu");
        prompt("Enter your choice: ");

        let choice = get_user_input();
        match choice.trim() {
            "1" => fab_materials_example(),
            "2" => groups_example(),
            "3" => matrix_example(),
            "4" => custom_table_example(),
            "0" => break,
            _ => println!("Invalid choice. Please try again."),
        }
    }
}

pub fn fab_materials_example() {
    let formulas: Vec<&str> = FAB_MATERIALS.iter().map(|(_, formula)| *formula).collect();
    match molar_masses_of(&formulas, &PeriodicTable) {
        Ok(masses) => {
            for ((name, formula), mass) in FAB_MATERIALS.iter().zip(masses) {
                println!("{:<24} {:<14} {:>10.3} g/mol", name, formula, mass);
            }
        }
        Err(e) => error!("{}", e),
    }
    for (name, formula) in FAB_MATERIALS {
        let mut record = MaterialRecord::new(name, formula);
        match record.normalize() {
            Ok(()) => {
                println!("\n{} ({})", name, formula);
                print_composition(&record.elemental_composition);
            }
            Err(e) => error!("{}: {}", name, e),
        }
    }
}

pub fn metal_organic_groups() -> ChemicalGroups {
    ChemicalGroups::from([
        ("Me".to_string(), ElementCounts::from_pairs(&[("C", 1), ("H", 3)])),
        ("Et".to_string(), ElementCounts::from_pairs(&[("C", 2), ("H", 5)])),
        ("Cp".to_string(), ElementCounts::from_pairs(&[("C", 5), ("H", 5)])),
    ])
}

pub fn groups_example() {
    let parser = FormulaParser::with_groups(metal_organic_groups());
    let calculator = CompositionCalculator::with_masses(&PeriodicTable);
    for formula in ["GaMe3", "AlMe3", "ZnEt2", "MgCp2", "Hf(NMeEt)4"] {
        let counts = parser.parse(formula);
        println!("\n{} -> {:?}", formula, counts.to_hashmap());
        match calculator.compute(&counts) {
            Ok(composition) => print_composition(&composition),
            Err(e) => error!("{}: {}", formula, e),
        }
    }
}

pub fn matrix_example() {
    let formulas = vec!["SiH4", "NH3", "Si3N4", "H2"];
    let (matrix, elements) = composition_matrix(&formulas);
    println!("formulas: {:?}", formulas);
    println!("elements: {:?}", elements);
    println!("{}", matrix);
}

pub fn custom_table_example() {
    let table = match CustomMassTable::from_pairs("rounded", &[("Al", 26.98), ("O", 16.00)]) {
        Ok(table) => table,
        Err(e) => {
            error!("{}", e);
            return;
        }
    };
    let calculator = CompositionCalculator::with_masses(&table);
    let parser = FormulaParser::new();
    for formula in ["Al2O3", "SiO2"] {
        let mut record = MaterialRecord::new(formula, formula);
        match record.normalize_with(&parser, &calculator) {
            Ok(()) => print_composition(&record.elemental_composition),
            Err(e) => println!("{}: {}", formula, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Stoichiometry::atomic_masses::AtomicMassLookup;
    use crate::Stoichiometry::formula_parser::parse_formula;

    #[test]
    fn test_fab_materials_parse() {
        for (name, formula) in FAB_MATERIALS {
            let counts = parse_formula(formula);
            assert!(!counts.is_empty(), "{}", name);
            assert!(counts.symbols().iter().all(|s| PeriodicTable.atomic_mass(s).is_some()));
        }
    }

    #[test]
    fn test_metal_organic_groups() {
        let parser = FormulaParser::with_groups(metal_organic_groups());
        let temah = parser.parse("Hf(NMeEt)4");
        assert_eq!(
            temah,
            ElementCounts::from_pairs(&[("Hf", 1), ("N", 4), ("C", 12), ("H", 32)])
        );
        let counts = parser.parse("MgCp2");
        assert_eq!(counts, ElementCounts::from_pairs(&[("Mg", 1), ("C", 10), ("H", 10)]));
    }
}

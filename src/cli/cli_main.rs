use super::cli_examples::examples_menu;
use crate::Stoichiometry::atomic_masses::{AtomicMassLookup, default_mass_table};
use crate::Stoichiometry::composition::{
    CompositionCalculator, calculate_molar_mass, composition_table,
};
use crate::Stoichiometry::errors::StoichError;
use crate::Stoichiometry::formula_parser::{parse_formula, validate_formula};
use crate::Stoichiometry::material_record::normalize_records;
use crate::Utils::load_from_file::load_materials_from_file;
use crate::library_manager::with_library_manager_mut;
use log::warn;
use std::io::{self, Write};

pub fn run_interactive_menu() {
    loop {
        show_main_menu();
        let choice = get_user_input();

        match choice.trim() {
            "1" => formula_prompt(parse_report),
            "2" => formula_prompt(|formula| composition_report(formula, default_mass_table())),
            "3" => formula_prompt(|formula| molar_mass_report(formula, default_mass_table())),
            "4" => file_prompt(),
            "5" => mass_library_prompt(),
            "6" => examples_menu(),
            "0" => {
                println!("Goodbye!");
                break;
            }
            _ => println!("Invalid choice. Please try again."),
        }
    }
}
/* colors
Blue (\x1b[34m) - Welcome header text

Yellow (\x1b[33m) - Menu options

Cyan (\x1b[36m) - "Enter ...:" prompts

Reset (\x1b[0m) - Returns to normal color after each colored section
*/
fn show_main_menu() {
    println!(
        "\x1b[34m\n Welcome to FabStoich: formulas and elemental composition\n
    of semiconductor fabrication materials \n \x1b[0m"
    );
    println!("\x1b[33m1. Parse formula\x1b[0m");
    println!("\x1b[33m2. Elemental composition\x1b[0m");
    println!("\x1b[33m3. Molar mass\x1b[0m");
    println!("\x1b[33m4. Materials from file\x1b[0m");
    println!("\x1b[33m5. Atomic mass library\x1b[0m");
    println!("\x1b[33m6. Examples\x1b[0m");
    println!("\x1b[33m0. Exit\x1b[0m");
    prompt("Enter your choice: ");
}

pub(crate) fn prompt(text: &str) {
    print!("\x1b[36m{}\x1b[0m", text);
    if let Err(e) = io::stdout().flush() {
        warn!("failed to flush stdout: {}", e);
    }
}

pub(crate) fn get_user_input() -> String {
    let mut input = String::new();
    if let Err(e) = io::stdin().read_line(&mut input) {
        warn!("failed to read input: {}", e);
    }
    input
}

fn formula_prompt<F>(report: F)
where
    F: Fn(&str) -> Result<String, StoichError>,
{
    prompt("Enter formula: ");
    let formula = get_user_input();
    match report(formula.trim()) {
        Ok(text) => println!("{}", text),
        Err(e) => println!("\x1b[31mError: {}\x1b[0m", e),
    }
}

/// element counts of a formula, with the problems a strict check finds
pub fn parse_report(formula: &str) -> Result<String, StoichError> {
    let counts = parse_formula(formula);
    let mut report = String::new();
    if let Err(e) = validate_formula(formula) {
        report.push_str(&format!("warning: {}\n", e));
    }
    if counts.is_empty() {
        return Err(StoichError::EmptyFormula);
    }
    let listed: Vec<String> = counts
        .iter()
        .map(|entry| format!("{}: {}", entry.symbol, entry.count))
        .collect();
    report.push_str(&format!("{} -> {}", formula, listed.join(", ")));
    Ok(report)
}

pub fn composition_report(
    formula: &str,
    table: &dyn AtomicMassLookup,
) -> Result<String, StoichError> {
    let counts = parse_formula(formula);
    if counts.total() == 0 {
        return Err(StoichError::EmptyFormula);
    }
    let composition = CompositionCalculator::with_masses(table).compute(&counts)?;
    Ok(composition_table(&composition).to_string())
}

pub fn molar_mass_report(
    formula: &str,
    table: &dyn AtomicMassLookup,
) -> Result<String, StoichError> {
    let (molar_mass, counts) = calculate_molar_mass(formula, table)?;
    if counts.is_empty() {
        return Err(StoichError::EmptyFormula);
    }
    Ok(format!("{}: {:.4} g/mol", formula, molar_mass))
}

fn file_prompt() {
    prompt("Enter path to materials file: ");
    let path = get_user_input();
    match materials_report(path.trim(), default_mass_table()) {
        Ok(text) => println!("{}", text),
        Err(e) => println!("\x1b[31mError: {}\x1b[0m", e),
    }
}

/// normalizes every material listed in a file and renders their compositions
pub fn materials_report(
    file_name: &str,
    table: &dyn AtomicMassLookup,
) -> Result<String, StoichError> {
    let mut records = load_materials_from_file(file_name)?;
    let calculator = CompositionCalculator::with_masses(table);
    let outcomes = normalize_records(&mut records, &calculator);
    let mut report = String::new();
    for (record, outcome) in records.iter().zip(outcomes) {
        let formula = record.chemical_formula.as_deref().unwrap_or_default();
        report.push_str(&format!("\n{} ({})\n", record.name, formula));
        match outcome {
            Ok(()) if record.elemental_composition.is_empty() => {
                report.push_str("no elements found\n")
            }
            Ok(()) => report.push_str(&composition_table(&record.elemental_composition).to_string()),
            Err(e) => report.push_str(&format!("error: {}\n", e)),
        }
    }
    Ok(report)
}

fn mass_library_prompt() {
    println!("\x1b[33m1. Use JSON mass table file\x1b[0m");
    println!("\x1b[33m2. Use built-in periodic table\x1b[0m");
    prompt("Enter your choice: ");
    let result = match get_user_input().trim() {
        "1" => {
            prompt("Enter path to mass table: ");
            let path = get_user_input();
            with_library_manager_mut(|manager| manager.set_mass_table_file(path.trim()))
        }
        "2" => with_library_manager_mut(|manager| manager.reset_to_defaults()),
        _ => {
            println!("Invalid choice.");
            return;
        }
    };
    match result {
        Ok(()) => println!("Mass library updated, it takes effect on the next start."),
        Err(e) => println!("\x1b[31mError: {}\x1b[0m", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Stoichiometry::atomic_masses::{CustomMassTable, PeriodicTable};
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_report() {
        let report = parse_report("Ca3(PO4)2").unwrap();
        assert!(report.ends_with("Ca: 3, P: 2, O: 8"));
        assert!(!report.contains("warning"));

        let report = parse_report("CuSO4·5NH3").unwrap();
        assert!(report.contains("warning"));
        assert!(matches!(parse_report("123"), Err(StoichError::EmptyFormula)));
    }

    #[test]
    fn test_composition_report() {
        let table = CustomMassTable::from_pairs("rounded", &[("Al", 26.98), ("O", 16.00)]).unwrap();
        let report = composition_report("Al2O3", &table).unwrap();
        assert!(report.contains("0.4000"));
        assert!(report.contains("0.5292"));
        assert!(matches!(
            composition_report("SiO2", &table),
            Err(StoichError::UnknownElement(_))
        ));
        assert!(matches!(
            composition_report("", &table),
            Err(StoichError::EmptyFormula)
        ));
    }

    #[test]
    fn test_molar_mass_report() {
        let report = molar_mass_report("NaCl", &PeriodicTable).unwrap();
        assert_eq!(report, "NaCl: 58.4400 g/mol");
    }

    #[test]
    fn test_materials_report() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "nitride: Si3N4").unwrap();
        writeln!(file, "blank: ???").unwrap();
        writeln!(file, "bogus: Qq").unwrap();
        let report = materials_report(file.path().to_str().unwrap(), &PeriodicTable).unwrap();
        assert!(report.contains("nitride (Si3N4)"));
        assert!(report.contains("no elements found"));
        assert!(report.contains("error: Unknown element: 'Qq'"));
    }
}

use crate::Stoichiometry::atomic_masses::{AtomicMassLookup, PeriodicTable};
use crate::Stoichiometry::errors::StoichError;
use crate::Stoichiometry::formula_parser::parse_formula;
use crate::Stoichiometry::material_record::MaterialRecord;
use log::{error, info, warn};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::Path;

pub struct LoadData {
    pub file_name: String,
}

impl LoadData {
    pub fn new(file_name: String) -> Self {
        LoadData { file_name }
    }
    pub fn load_mass_table(&self) -> Result<HashMap<String, f64>, StoichError> {
        load_mass_table_from_file(&self.file_name)
    }
    pub fn load_materials(&self) -> Result<Vec<MaterialRecord>, StoichError> {
        load_materials_from_file(&self.file_name)
    }
}

/// Reads a JSON object mapping element symbols to atomic masses, e.g. {"Al": 26.98, "O": 16.0}
pub fn load_mass_table_from_file(file_name: &str) -> Result<HashMap<String, f64>, StoichError> {
    let path = Path::new(file_name);
    if !path.exists() {
        return Err(StoichError::FileNotFound(file_name.to_string()));
    }
    let content = fs::read_to_string(path)?;
    match serde_json::from_str::<HashMap<String, f64>>(&content) {
        Ok(masses) => {
            if masses.is_empty() {
                warn!("mass table '{}' is empty", file_name);
            }
            info!(
                "Successfully loaded {} atomic masses from file '{}'",
                masses.len(),
                file_name
            );
            Ok(masses)
        }
        Err(e) => {
            error!(
                "Error parsing mass table '{}' at line {}, column {}: {}",
                file_name,
                e.line(),
                e.column(),
                e
            );
            Err(e.into())
        }
    }
}

/// An all-uppercase line that is not a formula of known elements, e.g. "EQUIPMENT" (no element E)
/// but not "BN" or "HF"
fn is_section_header(line: &str) -> bool {
    if line.is_empty() || !line.chars().all(|c| c.is_ascii_uppercase() || c == '_') {
        return false;
    }
    let counts = parse_formula(line);
    counts.is_empty()
        || counts
            .symbols()
            .iter()
            .any(|symbol| PeriodicTable.atomic_mass(symbol).is_none())
}

/// Loads material records from a text file.
///
/// Every non-empty line is either `name: formula` or a bare formula (the formula is then used
/// as the name as well). Lines starting with `#` are comments. If the file contains a
/// `MATERIALS` header only the lines after it are read, up to the next section header.
pub fn load_materials_from_file(file_name: &str) -> Result<Vec<MaterialRecord>, StoichError> {
    let path = Path::new(file_name);
    if !path.exists() {
        return Err(StoichError::FileNotFound(file_name.to_string()));
    }
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let lines: Vec<String> = reader.lines().collect::<Result<_, _>>()?;

    let start_index = lines
        .iter()
        .position(|line| line.trim().eq_ignore_ascii_case("MATERIALS"))
        .map(|i| i + 1)
        .unwrap_or(0);
    let mut end_index = lines.len();
    if start_index > 0 {
        for (i, line) in lines.iter().enumerate().skip(start_index) {
            let trimmed = line.trim();
            if is_section_header(trimmed) {
                end_index = i;
                break;
            }
        }
    }

    let mut records = Vec::new();
    for line in lines[start_index..end_index].iter() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let record = match trimmed.split_once(':') {
            Some((name, formula)) => MaterialRecord::new(name.trim(), formula.trim()),
            None => MaterialRecord::new(trimmed, trimmed),
        };
        records.push(record);
    }
    info!("Loaded {} materials from file '{}'", records.len(), file_name);
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_mass_table() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "{{\"Si\": 28.09, \"O\": 16.0}}").unwrap();
        let data = LoadData::new(temp_file.path().to_str().unwrap().to_string());
        let masses = data.load_mass_table().unwrap();
        assert_eq!(masses.len(), 2);
        assert_eq!(masses["Si"], 28.09);
    }

    #[test]
    fn test_load_mass_table_errors() {
        let result = load_mass_table_from_file("definitely_missing_masses.json");
        assert!(matches!(result, Err(StoichError::FileNotFound(_))));

        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "{{\"Si\": \"heavy\"}}").unwrap();
        let result = load_mass_table_from_file(temp_file.path().to_str().unwrap());
        assert!(matches!(result, Err(StoichError::Json(_))));
    }

    #[test]
    fn test_load_materials_plain_list() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "# deposition targets").unwrap();
        writeln!(temp_file, "alumina: Al2O3").unwrap();
        writeln!(temp_file).unwrap();
        writeln!(temp_file, "GaAs").unwrap();
        let records = load_materials_from_file(temp_file.path().to_str().unwrap()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "alumina");
        assert_eq!(records[0].chemical_formula.as_deref(), Some("Al2O3"));
        assert_eq!(records[1].name, "GaAs");
        assert!(records[1].elemental_composition.is_empty());
    }

    #[test]
    fn test_load_materials_with_header() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "Process notes, not formulas").unwrap();
        writeln!(temp_file, "MATERIALS").unwrap();
        writeln!(temp_file, "gate oxide: HfO2").unwrap();
        writeln!(temp_file, "precursor: Hf(N(CH3)2)4").unwrap();
        writeln!(temp_file, "EQUIPMENT").unwrap();
        writeln!(temp_file, "ALD chamber").unwrap();
        let records = load_materials_from_file(temp_file.path().to_str().unwrap()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].chemical_formula.as_deref(), Some("Hf(N(CH3)2)4"));
    }

    #[test]
    fn test_uppercase_formulas_inside_materials_section() {
        let mut temp_file = NamedTempFile::new().unwrap();
        for line in ["MATERIALS", "SiO2", "BN", "HF", "Al2O3", "NOTES", "CO"] {
            writeln!(temp_file, "{}", line).unwrap();
        }
        let records = load_materials_from_file(temp_file.path().to_str().unwrap()).unwrap();
        let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["SiO2", "BN", "HF", "Al2O3"]);
    }

    #[test]
    fn test_is_section_header() {
        assert!(is_section_header("EQUIPMENT"));
        assert!(is_section_header("END_OF_LIST"));
        assert!(is_section_header("___"));
        assert!(!is_section_header("BN"));
        assert!(!is_section_header("KF"));
        assert!(!is_section_header("CO"));
        assert!(!is_section_header("SiO2"));
        assert!(!is_section_header(""));
    }

    #[test]
    fn test_load_materials_missing_file() {
        let result = LoadData::new("no_such_list.txt".to_string()).load_materials();
        assert!(matches!(result, Err(StoichError::FileNotFound(_))));
    }
}
